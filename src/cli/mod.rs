//! CLI module for Pagewise.

pub mod commands;
mod output;
pub mod preflight;

pub use output::Output;

use clap::{Parser, Subcommand};

/// Pagewise - chat with your documents
///
/// Load a PDF or text file and ask questions answered only from its content.
#[derive(Parser, Debug)]
#[command(name = "pagewise")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v for info, -vv for debug, -vvv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// API key for the model provider (defaults to the variable named by provider.api_key_env)
    #[arg(long, global = true)]
    pub api_key: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Ask a single question about a document
    Ask {
        /// PDF or text file to read
        file: String,

        /// The question to ask
        question: String,
    },

    /// Start an interactive chat about a document
    Chat {
        /// PDF or text file to read
        file: String,
    },

    /// Start HTTP API server with a single shared session
    Serve {
        /// Host to bind to
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Port to bind to
        #[arg(short, long, default_value = "3000")]
        port: u16,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Write the default configuration file if it does not exist
    Init,

    /// Show configuration file path
    Path,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_ask() {
        let cli = Cli::parse_from(["pagewise", "-vv", "ask", "report.pdf", "What is the total?"]);
        assert_eq!(cli.verbose, 2);
        match cli.command {
            Commands::Ask { file, question } => {
                assert_eq!(file, "report.pdf");
                assert_eq!(question, "What is the total?");
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_global_api_key_after_subcommand() {
        let cli = Cli::parse_from(["pagewise", "chat", "notes.txt", "--api-key", "secret"]);
        assert_eq!(cli.api_key.as_deref(), Some("secret"));
    }
}
