//! Command-line interface argument parsing
//!
//! Defines all CLI commands and their arguments using Clap.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Shopping samples - exercise the Content API for Shopping from the command line
#[derive(Parser, Debug)]
#[command(name = "shopping-samples")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Command-line samples for the Content API for Shopping")]
#[command(long_about = concat!(
    "Shopping samples (v", env!("CARGO_PKG_VERSION"), ")\n",
    "Command-line samples for the Content API for Shopping.\n\n",
    "Resource paths are relative to the API base URL; {merchantId} is replaced with\n",
    "the configured merchant. Use --log-file to record every HTTP exchange."
))]
pub struct Cli {
    /// Enable verbose output for debugging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Configuration directory (default: ~/shopping-samples)
    #[arg(long, global = true, value_name = "PATH")]
    pub config_path: Option<PathBuf>,

    /// Do not read any configuration from disk
    #[arg(long, global = true, conflicts_with = "config_path")]
    pub noconfig: bool,

    /// Write every HTTP request and response to this file as JSON, replacing
    /// any previous contents
    #[arg(long, global = true, value_name = "FILE")]
    pub log_file: Option<PathBuf>,

    /// API base URL (overrides GOOGLE_SHOPPING_SAMPLES_ENDPOINT)
    #[arg(long, global = true, value_name = "URL")]
    pub endpoint: Option<String>,

    /// Request timeout in seconds
    #[arg(long, global = true, value_name = "SECS")]
    pub timeout: Option<u64>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show the accounts the current credentials can access
    ///
    /// Example:
    ///   shopping-samples whoami
    ///   shopping-samples whoami --save
    #[command(display_order = 1)]
    Whoami {
        /// Write the resolved merchant details to merchant-info.json
        #[arg(long)]
        save: bool,
    },

    /// Fetch a resource and pretty-print it
    ///
    /// Examples:
    ///   shopping-samples get '{merchantId}/products/online:en:US:book123'
    ///   shopping-samples get '{merchantId}/accounttax/{merchantId}'
    #[command(display_order = 2)]
    Get {
        /// Resource path relative to the API base URL
        path: String,
    },

    /// Walk every page of a list and print one line per resource
    ///
    /// Examples:
    ///   shopping-samples list '{merchantId}/products'
    ///   shopping-samples list '{merchantId}/accounts' --max-results 50
    #[command(display_order = 3)]
    List {
        /// Collection path relative to the API base URL
        path: String,

        /// Page size requested from the API
        #[arg(long)]
        max_results: Option<u32>,
    },

    /// Create a resource from a JSON file (POST)
    ///
    /// Example:
    ///   shopping-samples insert '{merchantId}/products' --body product.json
    #[command(display_order = 4)]
    Insert {
        /// Collection path relative to the API base URL
        path: String,

        /// JSON file with the request body
        #[arg(long, value_name = "FILE")]
        body: PathBuf,
    },

    /// Replace a resource from a JSON file (PUT)
    ///
    /// Example:
    ///   shopping-samples update '{merchantId}/accounttax/{merchantId}' --body tax.json
    #[command(display_order = 5)]
    Update {
        /// Resource path relative to the API base URL
        path: String,

        /// JSON file with the request body
        #[arg(long, value_name = "FILE")]
        body: PathBuf,
    },

    /// Change selected fields of a resource from a JSON file (PATCH)
    ///
    /// Example:
    ///   shopping-samples patch '{merchantId}/accounts/123' --body changes.json
    #[command(display_order = 6)]
    Patch {
        /// Resource path relative to the API base URL
        path: String,

        /// JSON file with the request body
        #[arg(long, value_name = "FILE")]
        body: PathBuf,
    },

    /// Delete a resource
    ///
    /// Example:
    ///   shopping-samples delete '{merchantId}/products/online:en:US:book123'
    #[command(display_order = 7)]
    Delete {
        /// Resource path relative to the API base URL
        path: String,
    },

    /// Poll a resource with exponential backoff until it can be read
    ///
    /// Useful right after creating a sub-account, which may take a while to
    /// become visible.
    ///
    /// Example:
    ///   shopping-samples wait '{merchantId}/accounts/123456'
    #[command(display_order = 8)]
    Wait {
        /// Resource path relative to the API base URL
        path: String,
    },
}

impl Cli {
    /// Parse command-line arguments
    ///
    /// # Returns
    ///
    /// Parsed CLI arguments
    pub fn parse_args() -> Self {
        <Self as Parser>::parse()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn verify_cli() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "shopping-samples",
            "list",
            "{merchantId}/products",
            "--max-results",
            "25",
            "--log-file",
            "exchanges.json",
            "-v",
        ])
        .unwrap();

        assert!(cli.verbose);
        assert_eq!(cli.log_file, Some(PathBuf::from("exchanges.json")));
        assert!(matches!(
            cli.command,
            Commands::List { ref path, max_results: Some(25) } if path == "{merchantId}/products"
        ));
    }

    #[test]
    fn test_noconfig_conflicts_with_config_path() {
        let result = Cli::try_parse_from([
            "shopping-samples",
            "--noconfig",
            "--config-path",
            "/tmp/x",
            "whoami",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_log_file_help_describes_replacement() {
        use clap::CommandFactory;
        let command = Cli::command();
        let arg = command
            .get_arguments()
            .find(|a| a.get_id() == "log_file")
            .unwrap();
        let help = arg.get_help().unwrap().to_string();
        assert!(help.starts_with("Write every HTTP request"));
        assert!(help.contains("replacing"));
        assert!(!help.contains("Append"));
    }

    #[test]
    fn test_insert_requires_body() {
        assert!(Cli::try_parse_from(["shopping-samples", "insert", "{merchantId}/products"]).is_err());
    }
}
