use anyhow::Context;
use clap::{Args, Subcommand};

use crate::cli::utils::output_config;
use crate::cli::{OutputFormat, TargetArgs};
use crate::monitor::{ConfigUpdate, HttpSessionApi, SessionApi};

#[derive(Subcommand)]
pub enum ConfigCommands {
    #[command(about = "Show the current timeout settings")]
    Show {
        #[command(flatten)]
        target: TargetArgs,
    },

    #[command(about = "Change one or more timeout settings")]
    Set {
        #[command(flatten)]
        target: TargetArgs,

        #[command(flatten)]
        update: ConfigFields,
    },
}

#[derive(Args, Debug, Clone, Default)]
pub struct ConfigFields {
    #[arg(long, help = "Minutes of inactivity before the session ends")]
    pub timeout_minutes: Option<u32>,

    #[arg(long, help = "Minutes before timeout at which the warning appears")]
    pub warning_minutes: Option<u32>,

    #[arg(long, help = "Seconds between session checks")]
    pub check_interval_seconds: Option<u32>,
}

impl From<ConfigFields> for ConfigUpdate {
    fn from(fields: ConfigFields) -> Self {
        ConfigUpdate {
            timeout_minutes: fields.timeout_minutes,
            warning_minutes: fields.warning_minutes,
            check_interval_seconds: fields.check_interval_seconds,
        }
    }
}

async fn login(target: &TargetArgs) -> anyhow::Result<HttpSessionApi> {
    let api = HttpSessionApi::from_config(&target.server)
        .with_context(|| format!("invalid server URL '{}'", target.server))?;
    api.login(&target.user)
        .await
        .with_context(|| format!("login as '{}' failed", target.user))?;
    Ok(api)
}

pub async fn handle(cmd: ConfigCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    match cmd {
        ConfigCommands::Show { target } => {
            let api = login(&target).await?;
            let config = api.fetch_config().await.context("failed to fetch session config")?;
            output_config(&output_format, "Session timeout configuration", &config)
        }
        ConfigCommands::Set { target, update } => {
            let update = ConfigUpdate::from(update);
            if update.is_empty() {
                anyhow::bail!("nothing to change: pass --timeout-minutes, --warning-minutes or --check-interval-seconds");
            }

            let api = login(&target).await?;
            let config = api
                .update_config(&update)
                .await
                .context("failed to update session config")?;
            output_config(&output_format, "Session timeout configuration updated", &config)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fields_convert_to_update() {
        let update = ConfigUpdate::from(ConfigFields {
            timeout_minutes: Some(30),
            ..Default::default()
        });
        assert_eq!(update.timeout_minutes, Some(30));
        assert!(update.warning_minutes.is_none());
        assert!(!update.is_empty());
        assert!(ConfigUpdate::from(ConfigFields::default()).is_empty());
    }
}
