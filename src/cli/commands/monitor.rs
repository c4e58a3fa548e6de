use std::sync::Arc;

use anyhow::Context;
use clap::Args;
use serde_json::json;
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::cli::utils::output_success;
use crate::cli::view::{TerminalNavigator, TerminalView};
use crate::cli::{OutputFormat, TargetArgs};
use crate::config::config;
use crate::monitor::{spawn, ActivityKind, HttpSessionApi, MonitorDeps, MonitorOutcome};

#[derive(Args, Debug, Clone)]
pub struct MonitorArgs {
    #[command(flatten)]
    pub target: TargetArgs,

    #[arg(long, default_value = "/", help = "Page path the monitor runs on")]
    pub path: String,
}

/// What a line typed on stdin means to the monitor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Input {
    Continue,
    Logout,
    Activity,
}

fn parse_input(line: &str) -> Input {
    match line.trim() {
        "c" | "continue" => Input::Continue,
        "q" | "quit" | "logout" => Input::Logout,
        _ => Input::Activity,
    }
}

pub async fn handle(args: MonitorArgs, output_format: OutputFormat) -> anyhow::Result<()> {
    let target = args.target;
    let api = HttpSessionApi::from_config(&target.server)
        .with_context(|| format!("invalid server URL '{}'", target.server))?;
    let login = api
        .login(&target.user)
        .await
        .with_context(|| format!("login as '{}' failed", target.user))?;
    output_success(
        &output_format,
        &format!("Logged in as {}", login.username),
        Some(json!({ "username": login.username })),
    )?;

    let deps = MonitorDeps::new(
        Arc::new(api),
        Arc::new(TerminalView::new(output_format)),
        Arc::new(TerminalNavigator::new(target.server.clone())),
    );
    let handle = spawn(deps, config().client.login_path.clone(), args.path);
    let control = handle.control();
    let mut state = handle.state();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            line = lines.next_line() => match line.context("failed to read stdin")? {
                Some(line) => match parse_input(&line) {
                    Input::Continue => control.continue_session(),
                    Input::Logout => control.logout(),
                    Input::Activity => control.record_activity(ActivityKind::Key),
                },
                None => {
                    tracing::debug!("stdin closed, stopping monitor");
                    control.shutdown();
                    break;
                }
            },
            changed = state.changed() => {
                if changed.is_err() || state.borrow().is_terminal() {
                    break;
                }
            }
        }
    }
    drop(control);

    match handle.join().await {
        MonitorOutcome::Redirected(location) => output_success(
            &output_format,
            &format!("Session ended, redirected to {}", location),
            Some(json!({ "location": location })),
        ),
        MonitorOutcome::Disabled => output_success(&output_format, "Session monitoring disabled", None),
        MonitorOutcome::Stopped => output_success(&output_format, "Session monitor stopped", None),
    }
}
