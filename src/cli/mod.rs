pub mod commands;
pub mod utils;
pub mod view;

use clap::{Args, Parser, Subcommand};
use serde::{Deserialize, Serialize};

#[derive(Parser)]
#[command(name = "whodis")]
#[command(about = "Who Dis? CLI - Session timeout monitor and session settings")]
#[command(version)]
pub struct Cli {
    #[arg(long, global = true, help = "Output in human-readable text format")]
    pub text: bool,

    #[arg(long, global = true, help = "Output in JSON format")]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Log in and watch the session for inactivity (stdin lines count as activity)")]
    Monitor(commands::monitor::MonitorArgs),

    #[command(about = "Inspect or edit the session timeout configuration")]
    Config {
        #[command(subcommand)]
        cmd: commands::config::ConfigCommands,
    },
}

/// Which session service to talk to and who to log in as
#[derive(Args, Debug, Clone)]
pub struct TargetArgs {
    #[arg(long, default_value = "http://localhost:3000", help = "Session service base URL")]
    pub server: String,

    #[arg(long, help = "Username for the development login")]
    pub user: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    pub fn from_cli(cli: &Cli) -> Self {
        if cli.json {
            OutputFormat::Json
        } else {
            OutputFormat::Text
        }
    }
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let output_format = OutputFormat::from_cli(&cli);

    match cli.command {
        Commands::Monitor(args) => commands::monitor::handle(args, output_format).await,
        Commands::Config { cmd } => commands::config::handle(cmd, output_format).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_monitor_command() {
        let cli = Cli::parse_from([
            "whodis", "--json", "monitor", "--server", "http://127.0.0.1:4000", "--user", "alice", "--path", "/users",
        ]);
        assert!(matches!(OutputFormat::from_cli(&cli), OutputFormat::Json));
        match cli.command {
            Commands::Monitor(args) => {
                assert_eq!(args.target.server, "http://127.0.0.1:4000");
                assert_eq!(args.target.user, "alice");
                assert_eq!(args.path, "/users");
            }
            _ => panic!("expected monitor command"),
        }
    }

    #[test]
    fn test_parse_config_set() {
        let cli = Cli::parse_from(["whodis", "config", "set", "--user", "bob", "--warning-minutes", "3"]);
        assert!(matches!(OutputFormat::from_cli(&cli), OutputFormat::Text));
        match cli.command {
            Commands::Config {
                cmd: commands::config::ConfigCommands::Set { target, update },
            } => {
                assert_eq!(target.server, "http://localhost:3000");
                assert_eq!(update.warning_minutes, Some(3));
                assert_eq!(update.timeout_minutes, None);
            }
            _ => panic!("expected config set"),
        }
    }
}
