pub mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "freshet")]
#[command(about = "Watch pages and feeds for new links", long_about = None)]
pub struct Cli {
    /// Path to the configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Limit on sources checked at the same time
    #[arg(short, long, global = true)]
    pub workers: Option<usize>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Check every source and print new items
    Check,
    /// Mark an item as read
    Read {
        /// URL of the item
        url: String,
    },
    /// Mark all unread items as read
    ReadAll,
    /// List unread items
    Unread {
        /// Only items of this source
        #[arg(long)]
        source: Option<String>,
    },
    /// List recently read items, newest first
    History {
        /// Number of items to show
        #[arg(short = 'n', long, default_value_t = 20)]
        limit: usize,

        /// Only items of this source
        #[arg(long)]
        source: Option<String>,
    },
    /// List configured sources
    Sources,
    /// Import read items from a JSON state file
    Import {
        /// Path to the JSON file
        path: PathBuf,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_history_defaults() {
        let cli = Cli::parse_from(["freshet", "history"]);
        match cli.command {
            Commands::History { limit, source } => {
                assert_eq!(limit, 20);
                assert!(source.is_none());
            }
            _ => panic!("expected history"),
        }
    }

    #[test]
    fn test_global_options_after_subcommand() {
        let cli = Cli::parse_from(["freshet", "check", "--workers", "4", "-c", "my.toml"]);
        assert!(matches!(cli.command, Commands::Check));
        assert_eq!(cli.workers, Some(4));
        assert_eq!(cli.config, Some(PathBuf::from("my.toml")));
    }

    #[test]
    fn test_read_requires_url() {
        assert!(Cli::try_parse_from(["freshet", "read"]).is_err());
        let cli = Cli::parse_from(["freshet", "read", "https://ex.test/a"]);
        assert!(matches!(cli.command, Commands::Read { url } if url == "https://ex.test/a"));
    }
}
