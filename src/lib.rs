#![warn(missing_docs)]
#![forbid(unsafe_code)]
#![doc = include_str!("../README.md")]

//! # Shopping samples
//!
//! Command-line samples for the Content API for Shopping, with an optional
//! transport that records every HTTP exchange.
//!
//! ## Architecture
//!
//! - **[`transport`]** - The [`Transport`](transport::Transport) seam, the
//!   reqwest-backed delegate and the exchange-logging decorator
//! - **[`client`]** - JSON client for the Content API, including pagination
//! - **[`config`]** - Config directory, merchant info and access tokens
//! - **[`retry`]** - Exponential backoff for eventually-consistent reads
//! - **[`commands`]** - Command implementations
//! - **[`error`]** - Error types and exit codes
//!
//! ## Quick Start
//!
//! ```bash
//! shopping-samples whoami
//! shopping-samples --log-file exchanges.json list '{merchantId}/products'
//! ```

pub mod cli;
pub mod client;
pub mod commands;
pub mod config;
pub mod error;
pub mod logging;
pub mod retry;
pub mod transport;

/// Error type alias for convenience
pub use error::{CliError, Result};

/// Configuration type alias for convenience
pub use config::Config;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = "shopping-samples";
