use crate::cli::args::{Args, Command, ConfigCommand, ServerArgs};
use crate::cli::output::{ConsoleWriter, OutputWriter};
use crate::core::protocol::{DEFAULT_BIND_HOST, DEFAULT_HOST, DEFAULT_PORT};
use crate::domain::config::{EchoConfig, GlobalConfig};
use crate::domain::error::{EchoError, EchoResult};
use crate::infrastructure::config::ConfigManager;
use crate::infrastructure::logging::init_logging;
use crate::infrastructure::tcp::{EchoClient, EchoServer, SessionLimit};
use std::path::PathBuf;
use tokio::io::BufReader;
use tracing::{debug, error, warn};

/// Execute CLI command
pub async fn execute_command(args: Args) -> EchoResult<()> {
    let writer = ConsoleWriter::new(args.output.clone());

    let config_manager = ConfigManager::new()?;
    let config = if let Some(config_path) = &args.config {
        config_manager.load_config_from_path(config_path.as_ref())?
    } else {
        config_manager.load_config()?
    };

    if !args.quiet {
        setup_logging(&config.global, args.verbose)?;
    }

    match args.command {
        Command::Server(server_args) => execute_server_command(server_args, &writer, &config).await,
        Command::Client => execute_client_command(&writer).await,
        Command::Config(config_args) => {
            execute_config_command(config_args.command, &writer, &config, &config_manager)
        }
        Command::Version => {
            writer.write_message(&format!("echoline {}", env!("CARGO_PKG_VERSION")))?;
            Ok(())
        }
    }
}

async fn execute_server_command(
    args: ServerArgs,
    writer: &ConsoleWriter,
    config: &EchoConfig,
) -> EchoResult<()> {
    let max_sessions = args.max_sessions.unwrap_or(config.server.max_sessions);
    let bind_addr = format!("{}:{}", DEFAULT_BIND_HOST, DEFAULT_PORT);

    let server = EchoServer::bind(&bind_addr).await?;

    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    let report = server
        .serve(SessionLimit::from_max_sessions(max_sessions), shutdown)
        .await?;
    debug!("Served {} sessions", report.sessions.len());

    writer.write_server_report(&report)?;
    Ok(())
}

async fn execute_client_command(writer: &ConsoleWriter) -> EchoResult<()> {
    // Connection failures are fatal and propagate before any prompt is shown
    let client = EchoClient::connect(DEFAULT_HOST, DEFAULT_PORT).await?;

    let input = BufReader::new(tokio::io::stdin());
    let mut console = std::io::stdout();

    if let Err(e) = client.run(input, &mut console).await {
        error!("Client session failed: {:?}", e);
        writer.write_error(&e.to_string())?;
    }

    Ok(())
}

fn execute_config_command(
    command: ConfigCommand,
    writer: &ConsoleWriter,
    config: &EchoConfig,
    config_manager: &ConfigManager,
) -> EchoResult<()> {
    match command {
        ConfigCommand::Show => {
            writer.write_config(config)?;
        }
        ConfigCommand::Init { output, global } => {
            if global {
                let path = config_manager.init_global_config()?;
                writer.write_message(&format!(
                    "Global configuration initialized at '{}'",
                    path.display()
                ))?;
            } else {
                let dir = match output {
                    Some(dir) => PathBuf::from(dir),
                    None => std::env::current_dir()?,
                };
                let path = config_manager.init_project_config(&dir)?;
                writer.write_message(&format!(
                    "Project configuration initialized at '{}'",
                    path.display()
                ))?;
            }
        }
        ConfigCommand::Path => {
            writer.write_message(&format!(
                "Global configuration: {}",
                config_manager.get_global_config_path_ref().display()
            ))?;
            match config_manager.get_project_config_path() {
                Some(path) => writer.write_message(&format!("Project configuration: {}", path.display()))?,
                None => writer.write_message("Project configuration: none")?,
            }
        }
    }
    Ok(())
}

fn setup_logging(config: &GlobalConfig, verbose: bool) -> EchoResult<()> {
    let level = if verbose {
        "debug"
    } else {
        match config.log_level.as_str() {
            level @ ("error" | "warn" | "info" | "debug" | "trace") => level,
            other => {
                return Err(EchoError::Config {
                    message: format!("Unknown log level '{}'", other),
                })
            }
        }
    };

    init_logging(level)
}
