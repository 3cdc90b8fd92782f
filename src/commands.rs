//! Command implementations
//!
//! A [`Session`] ties the resolved configuration to a [`ContentClient`] and
//! runs one parsed command against it, writing human-readable output to the
//! given writer.

use std::fs;
use std::io::Write;
use std::path::Path;

use console::style;
use futures::TryStreamExt;
use serde_json::Value;

use crate::cli::Commands;
use crate::client::{describe_resource, AuthInfo, ContentClient, Page, MERCHANT_ID_PLACEHOLDER};
use crate::config::Config;
use crate::error::{CliError, Result};
use crate::retry::{retry_notify, ExponentialBackoff};
use crate::transport::Transport;

/// A configured client plus the settings commands need
#[derive(Debug)]
pub struct Session<T> {
    client: ContentClient<T>,
    config: Config,
    backoff: ExponentialBackoff,
}

impl<T: Transport> Session<T> {
    /// Create a session; `wait` uses the eventual-consistency backoff
    pub fn new(client: ContentClient<T>, config: Config) -> Self {
        Self {
            client,
            config,
            backoff: ExponentialBackoff::eventual_consistency(),
        }
    }

    /// Replace the backoff used by `wait`
    #[must_use]
    pub fn with_backoff(mut self, backoff: ExponentialBackoff) -> Self {
        self.backoff = backoff;
        self
    }

    /// The client
    pub const fn client(&self) -> &ContentClient<T> {
        &self.client
    }

    /// The configuration, including anything filled in from `authinfo`
    pub const fn config(&self) -> &Config {
        &self.config
    }

    /// Run one command
    pub async fn run<W: Write>(&mut self, command: Commands, out: &mut W) -> Result<()> {
        match command {
            Commands::Whoami { save } => self.handle_whoami(save, out).await,
            Commands::Get { path } => {
                self.prepare(&path).await?;
                self.handle_get(&path, out).await
            }
            Commands::List { path, max_results } => {
                self.prepare(&path).await?;
                self.handle_list(&path, max_results, out).await
            }
            Commands::Insert { path, body } => {
                let body = read_body(&body)?;
                self.prepare(&path).await?;
                let created: Value = self.client.insert(&path, &body).await?;
                writeln!(out, "{} Created {}", style("✓").green(), describe_resource(&created))?;
                Ok(())
            }
            Commands::Update { path, body } => {
                let body = read_body(&body)?;
                self.prepare(&path).await?;
                let updated: Value = self.client.update(&path, &body).await?;
                writeln!(out, "{} Updated {}", style("✓").green(), describe_resource(&updated))?;
                Ok(())
            }
            Commands::Patch { path, body } => {
                let body = read_body(&body)?;
                self.prepare(&path).await?;
                let patched: Value = self.client.patch(&path, &body).await?;
                writeln!(out, "{} Patched {}", style("✓").green(), describe_resource(&patched))?;
                Ok(())
            }
            Commands::Delete { path } => {
                self.prepare(&path).await?;
                self.client.delete(&path).await?;
                writeln!(out, "{} Deleted {path}", style("✓").green())?;
                Ok(())
            }
            Commands::Wait { path } => {
                self.prepare(&path).await?;
                self.handle_wait(&path, out).await
            }
        }
    }

    /// Make sure the merchant ID is known before resolving `path`
    async fn prepare(&mut self, path: &str) -> Result<()> {
        if !path.contains(MERCHANT_ID_PLACEHOLDER) {
            return Ok(());
        }
        if self.config.merchant.merchant_id.filter(|id| *id != 0).is_none() {
            self.fetch_authinfo().await?;
        }
        if let Some(id) = self.config.merchant.merchant_id {
            self.client.set_merchant_id(id);
            tracing::info!(merchant_id = id, "Using Merchant Center account");
        }
        Ok(())
    }

    async fn fetch_authinfo(&mut self) -> Result<AuthInfo> {
        let info = self.client.authinfo().await?;
        let merchant_id = self.config.apply_authinfo(&info)?;
        self.client.set_merchant_id(merchant_id);
        Ok(info)
    }

    async fn handle_whoami<W: Write>(&mut self, save: bool, out: &mut W) -> Result<()> {
        let info = self.fetch_authinfo().await?;
        let merchant = &self.config.merchant;
        let merchant_id = merchant.merchant_id.unwrap_or_default();

        writeln!(
            out,
            "Using Merchant Center {} for running samples.",
            style(merchant_id).bold()
        )?;
        if merchant.is_mca {
            writeln!(out, "Merchant Center {merchant_id} is a multi-client account.")?;
        }

        writeln!(out, "{}", style("Accessible accounts:").bold())?;
        for account in &info.account_identifiers {
            match (account.merchant_id, account.aggregator_id) {
                (Some(id), Some(aggregator)) => {
                    writeln!(out, "  - {id} (sub-account of {aggregator})")?;
                }
                (Some(id), None) => writeln!(out, "  - {id}")?,
                (None, Some(aggregator)) => {
                    writeln!(out, "  - {aggregator} (multi-client account)")?;
                }
                (None, None) => {}
            }
        }

        if save {
            let path = self.config.save_merchant_info()?;
            writeln!(
                out,
                "{} Merchant info saved to {}",
                style("✓").green(),
                path.display()
            )?;
        }
        Ok(())
    }

    async fn handle_get<W: Write>(&self, path: &str, out: &mut W) -> Result<()> {
        let resource: Value = self.client.get(path).await?;
        let pretty = serde_json::to_string_pretty(&resource)
            .map_err(|e| CliError::SerializationError(e.to_string()))?;
        writeln!(out, "{pretty}")?;
        Ok(())
    }

    async fn handle_list<W: Write>(
        &self,
        path: &str,
        max_results: Option<u32>,
        out: &mut W,
    ) -> Result<()> {
        let mut pages = std::pin::pin!(self.client.pages::<Value>(path, max_results));
        let mut total = 0usize;
        let mut page_count = 0usize;

        while let Some(page) = pages.try_next().await? {
            let Page { resources, .. } = page;
            page_count += 1;
            for resource in &resources {
                writeln!(out, "{}", describe_resource(resource))?;
            }
            total += resources.len();
        }

        if total == 0 {
            writeln!(out, "{} No resources found.", style("!").yellow())?;
        } else {
            writeln!(
                out,
                "{} {total} resources in {page_count} pages",
                style("✓").green()
            )?;
        }
        Ok(())
    }

    async fn handle_wait<W: Write>(&self, path: &str, out: &mut W) -> Result<()> {
        let client = &self.client;
        let resource: Value = retry_notify(
            &self.backoff,
            || client.get::<Value>(path),
            CliError::is_retryable,
            |_err: &CliError, delay| {
                // Notices are best-effort; a closed stdout surfaces on the final write
                let _ = writeln!(
                    out,
                    "Failed to retrieve resource, will retry after {delay:?}."
                );
            },
        )
        .await?;

        writeln!(
            out,
            "{} Resource available: {}",
            style("✓").green(),
            describe_resource(&resource)
        )?;
        Ok(())
    }
}

/// Read a JSON request body from a file
fn read_body(path: &Path) -> Result<Value> {
    let contents = fs::read_to_string(path).map_err(|e| CliError::FileError {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    serde_json::from_str(&contents)
        .map_err(|e| CliError::InvalidArgument(format!("{} is not valid JSON: {e}", path.display())))
}
