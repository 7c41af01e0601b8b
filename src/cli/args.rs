use clap::{Args as ClapArgs, Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};

/// Command line arguments for echoline
#[derive(Parser, Debug)]
#[command(
    name = "echoline",
    version = env!("CARGO_PKG_VERSION"),
    about = "Line echo server and interactive client over TCP",
    long_about = "A line-oriented TCP demo: the server answers every line with '<line> - accepted', the client sends lines typed at the prompt. Sending 'close' ends the session."
)]
pub struct Args {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable logging
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Configuration file path
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    pub output: OutputFormat,

    /// Command to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the echo server on port 30333
    Server(ServerArgs),
    /// Connect to the echo server on localhost:30333 and send lines typed at the prompt
    Client,
    /// Configuration management commands
    Config(ConfigArgs),
    /// Display version information
    Version,
}

/// Output format options
#[derive(ValueEnum, Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutputFormat {
    /// Human-readable text output
    #[default]
    Text,
    /// JSON output
    Json,
    /// Table output
    Table,
}

/// Echo server arguments
#[derive(ClapArgs, Debug)]
pub struct ServerArgs {
    /// Connections to serve before exiting, 0 for no limit (overrides config)
    #[arg(short, long)]
    pub max_sessions: Option<usize>,
}

/// Configuration management arguments
#[derive(ClapArgs, Debug)]
pub struct ConfigArgs {
    /// Configuration subcommand
    #[command(subcommand)]
    pub command: ConfigCommand,
}

/// Configuration management subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Show current configuration
    Show,
    /// Create default configuration
    Init {
        /// Directory to create the project configuration in
        #[arg(short, long)]
        output: Option<String>,
        /// Global configuration
        #[arg(short, long)]
        global: bool,
    },
    /// Show configuration file locations
    Path,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Table => write!(f, "table"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_args_definition_is_valid() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_parse_server() {
        let args = Args::try_parse_from(["echoline", "server", "--max-sessions", "3"]).unwrap();
        match args.command {
            Command::Server(server) => assert_eq!(server.max_sessions, Some(3)),
            other => panic!("unexpected command: {:?}", other),
        }
        assert_eq!(args.output, OutputFormat::Text);
    }

    #[test]
    fn test_parse_client_with_globals() {
        let args = Args::try_parse_from(["echoline", "client", "-v", "-c", "echo.toml"]).unwrap();
        assert!(matches!(args.command, Command::Client));
        assert!(args.verbose);
        assert_eq!(args.config.as_deref(), Some("echo.toml"));
    }

    #[test]
    fn test_parse_config_init() {
        let args = Args::try_parse_from(["echoline", "-o", "json", "config", "init", "--global"]).unwrap();
        assert_eq!(args.output, OutputFormat::Json);
        match args.command {
            Command::Config(ConfigArgs {
                command: ConfigCommand::Init { output, global },
            }) => {
                assert!(global);
                assert!(output.is_none());
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_host_and_port_are_not_options() {
        assert!(Args::try_parse_from(["echoline", "client", "--port", "8080"]).is_err());
        assert!(Args::try_parse_from(["echoline", "server", "--bind", "127.0.0.1"]).is_err());
    }

    #[test]
    fn test_output_format_display() {
        assert_eq!(OutputFormat::Text.to_string(), "text");
        assert_eq!(OutputFormat::Json.to_string(), "json");
        assert_eq!(OutputFormat::Table.to_string(), "table");
    }
}
