//! Shopping samples - command-line samples for the Content API for Shopping
//!
//! Runs one API command, optionally recording every HTTP exchange to a log file.

use std::io::{self, Write};
use std::path::Path;
use std::time::Duration;

use console::style;
use shopping_samples::cli::{Cli, Commands};
use shopping_samples::client::ContentClient;
use shopping_samples::commands::Session;
use shopping_samples::config::{self, load_token, Config, ENDPOINT_ENV_VAR, USER_AGENT};
use shopping_samples::logging::init_logging;
use shopping_samples::transport::{
    create_http_client, LogSink, LoggingTransport, ReqwestTransport, Transport,
};
use shopping_samples::{CliError, Result};

fn main() {
    let exit_code = run();
    std::process::exit(exit_code);
}

/// Main application entry point
fn run() -> i32 {
    let cli = Cli::parse_args();
    init_logging(cli.verbose);

    match execute(cli) {
        Ok(()) => 0,
        Err(err) => {
            eprintln!("{} {err}", style("Error:").red().bold());
            err.exit_code()
        }
    }
}

/// Execute the requested command
fn execute(cli: Cli) -> Result<()> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| CliError::Internal(format!("failed to start async runtime: {e}")))?;

    runtime.block_on(run_command(cli))
}

async fn run_command(cli: Cli) -> Result<()> {
    let config = load_config(&cli)?;
    config.validate()?;
    let token = load_token(config.content_dir.as_deref())?;
    if token.is_none() {
        tracing::warn!("No access token found; requests will be sent unauthenticated");
    }

    let http = create_http_client(
        USER_AGENT,
        Duration::from_secs(config.timeout_secs),
        Duration::from_secs(config.connect_timeout_secs),
    )?;
    let delegate = ReqwestTransport::new(http);

    match cli.log_file {
        Some(path) => {
            let sink = LogSink::create(&path).map_err(|e| CliError::LogFile {
                path: path.clone(),
                reason: e.to_string(),
            })?;
            let transport = LoggingTransport::new(delegate, sink.clone());
            let result = run_session(transport, config, token, cli.command).await;
            report_sink(&sink, &path);
            result
        }
        None => run_session(delegate, config, token, cli.command).await,
    }
}

async fn run_session<T: Transport>(
    transport: T,
    config: Config,
    token: Option<String>,
    command: Commands,
) -> Result<()> {
    let client = ContentClient::new(transport, config.endpoint.clone()).with_token(token);
    let mut session = Session::new(client, config);
    let mut stdout = io::stdout();
    session.run(command, &mut stdout).await?;
    stdout.flush()?;
    Ok(())
}

/// Resolve configuration from the global flags
fn load_config(cli: &Cli) -> Result<Config> {
    let mut config = if cli.noconfig {
        Config::unconfigured()?
    } else {
        let dir = match &cli.config_path {
            Some(path) => path.clone(),
            None => Config::default_config_dir()?,
        };
        let config = Config::load(&dir)?;
        if !config.merchant_info_loaded {
            eprintln!(
                "{} No {} found in {}; using account information from the API.",
                style("!").yellow(),
                config::MERCHANT_INFO_FILE,
                dir.join(config::CONTENT_DIR_NAME).display()
            );
        }
        config
    };

    let env_endpoint = std::env::var(ENDPOINT_ENV_VAR).ok();
    config.endpoint = config::resolve_endpoint(cli.endpoint.as_deref(), env_endpoint.as_deref())?;
    if let Some(timeout) = cli.timeout {
        config.timeout_secs = timeout;
    }
    tracing::debug!(endpoint = %config.endpoint, "Resolved configuration");
    Ok(config)
}

fn report_sink(sink: &LogSink<std::fs::File>, path: &Path) {
    if let Err(e) = sink.flush() {
        tracing::warn!(path = %path.display(), error = %e, "Failed to flush exchange log");
    }
    let failures = sink.write_failures();
    if failures > 0 {
        eprintln!(
            "{} {failures} exchanges could not be written to {}",
            style("!").yellow(),
            path.display()
        );
    }
}
