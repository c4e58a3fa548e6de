use std::sync::Arc;

use futures::future::BoxFuture;
use futures::stream::{FuturesUnordered, StreamExt};
use futures::FutureExt;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

use super::client::SessionApi;
use super::clock::{self, Clock, MonotonicClock};
use super::config::SessionTimeoutConfig;
use super::error::{MonitorError, MonitorResult};
use super::machine::{Action, SessionMonitor};
use super::state::{ActivityKind, MonitorOutcome, MonitorState};
use super::view::{Navigator, WarningView};
use crate::types::CheckResponse;

/// Collaborators the driver executes actions against
#[derive(Clone)]
pub struct MonitorDeps {
    pub api: Arc<dyn SessionApi>,
    pub view: Arc<dyn WarningView>,
    pub navigator: Arc<dyn Navigator>,
    pub clock: Arc<dyn Clock>,
}

impl MonitorDeps {
    pub fn new(
        api: Arc<dyn SessionApi>,
        view: Arc<dyn WarningView>,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        Self {
            api,
            view,
            navigator,
            clock: Arc::new(MonotonicClock::new()),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }
}

#[derive(Debug)]
enum Command {
    Activity(ActivityKind),
    Continue,
    Logout,
    Shutdown,
}

enum Completion {
    Check(MonitorResult<CheckResponse>),
    Extend(MonitorResult<()>),
}

enum Event {
    Command(Option<Command>),
    Completed(Completion),
    TimerDue,
}

/// Cloneable sender for user input into a running monitor
#[derive(Debug, Clone)]
pub struct MonitorControl {
    commands: mpsc::UnboundedSender<Command>,
}

impl MonitorControl {
    fn send(&self, command: Command) {
        if self.commands.send(command).is_err() {
            tracing::debug!("Session monitor already finished, input dropped");
        }
    }

    pub fn record_activity(&self, kind: ActivityKind) {
        self.send(Command::Activity(kind));
    }

    /// The "Continue Session" button
    pub fn continue_session(&self) {
        self.send(Command::Continue);
    }

    /// The "Logout Now" button
    pub fn logout(&self) {
        self.send(Command::Logout);
    }

    /// Page unload
    pub fn shutdown(&self) {
        self.send(Command::Shutdown);
    }
}

/// Handle to a spawned monitor task. Dropping it unloads the monitor.
pub struct MonitorHandle {
    control: MonitorControl,
    state: watch::Receiver<MonitorState>,
    task: JoinHandle<MonitorOutcome>,
}

impl MonitorHandle {
    pub fn control(&self) -> MonitorControl {
        self.control.clone()
    }

    pub fn record_activity(&self, kind: ActivityKind) {
        self.control.record_activity(kind);
    }

    pub fn continue_session(&self) {
        self.control.continue_session();
    }

    pub fn logout(&self) {
        self.control.logout();
    }

    pub fn state(&self) -> watch::Receiver<MonitorState> {
        self.state.clone()
    }

    pub fn current_state(&self) -> MonitorState {
        *self.state.borrow()
    }

    /// Cancels every timer and waits for the task to finish
    pub async fn shutdown(self) -> MonitorOutcome {
        self.control.shutdown();
        self.join().await
    }

    /// Waits for the monitor to finish on its own
    pub async fn join(self) -> MonitorOutcome {
        let MonitorHandle { control, task, .. } = self;
        let outcome = match task.await {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::error!("Session monitor task failed: {}", e);
                MonitorOutcome::Stopped
            }
        };
        drop(control);
        outcome
    }
}

/// Spawns the monitor for one page. Must be called inside a tokio runtime.
pub fn spawn(
    deps: MonitorDeps,
    login_path: impl Into<String>,
    current_path: impl Into<String>,
) -> MonitorHandle {
    let machine = SessionMonitor::new(SessionTimeoutConfig::default(), login_path, current_path);
    let (command_tx, command_rx) = mpsc::unbounded_channel();
    let (state_tx, state_rx) = watch::channel(machine.state());

    let driver = MonitorDriver {
        machine,
        deps,
        commands: command_rx,
        state: state_tx,
        in_flight: FuturesUnordered::new(),
    };
    let task = tokio::spawn(driver.run());

    MonitorHandle {
        control: MonitorControl { commands: command_tx },
        state: state_rx,
        task,
    }
}

/// Owns the state machine and its timers for the lifetime of one task
struct MonitorDriver {
    machine: SessionMonitor,
    deps: MonitorDeps,
    commands: mpsc::UnboundedReceiver<Command>,
    state: watch::Sender<MonitorState>,
    in_flight: FuturesUnordered<BoxFuture<'static, Completion>>,
}

impl MonitorDriver {
    async fn run(mut self) -> MonitorOutcome {
        if !self.bootstrap().await {
            self.publish();
            return MonitorOutcome::Disabled;
        }
        self.publish();

        loop {
            let wait = self
                .machine
                .next_deadline()
                .map(|deadline| clock::until(self.deps.clock.as_ref(), deadline));
            let timer = async move {
                match wait {
                    Some(duration) => tokio::time::sleep(duration).await,
                    None => std::future::pending::<()>().await,
                }
            };

            // User input always runs before a timer that became due meanwhile
            let event = tokio::select! {
                biased;
                command = self.commands.recv() => Event::Command(command),
                Some(completion) = self.in_flight.next(), if !self.in_flight.is_empty() => {
                    Event::Completed(completion)
                }
                _ = timer => Event::TimerDue,
            };

            let now = self.deps.clock.now();
            let actions = match event {
                Event::Command(Some(Command::Activity(kind))) => {
                    tracing::trace!("Activity: {:?}", kind);
                    self.machine.record_activity(now, kind)
                }
                Event::Command(Some(Command::Continue)) => self.machine.continue_session(),
                Event::Command(Some(Command::Logout)) => self.machine.logout(),
                Event::Command(Some(Command::Shutdown)) | Event::Command(None) => {
                    self.machine.shutdown();
                    self.publish();
                    tracing::debug!("Session monitor unloaded, timers cancelled");
                    return MonitorOutcome::Stopped;
                }
                Event::Completed(Completion::Check(result)) => {
                    self.machine.on_check_response(now, result)
                }
                Event::Completed(Completion::Extend(result)) => {
                    self.machine.on_extend_response(now, result)
                }
                Event::TimerDue => self.machine.on_timer(now),
            };

            if let Some(outcome) = self.execute(actions).await {
                return outcome;
            }
        }
    }

    /// Disabled → Active requires a config and a successful trial check
    async fn bootstrap(&mut self) -> bool {
        if self.machine.on_login_page() {
            tracing::debug!("On the login page, session monitoring disabled");
            return false;
        }

        let config = match self.deps.api.fetch_config().await {
            Ok(config) => config,
            Err(MonitorError::Unauthorized) => {
                tracing::debug!("Not authenticated, session monitoring disabled");
                return false;
            }
            Err(e) => {
                tracing::warn!("Could not load session timeout config, monitoring disabled: {}", e);
                return false;
            }
        };
        if let Err(e) = self.machine.apply_config(config) {
            tracing::warn!("Server sent an unusable session config, monitoring disabled: {}", e);
            return false;
        }

        match self.deps.api.check(self.deps.clock.now().timestamp()).await {
            Ok(response) if response.valid => {}
            Ok(_) | Err(MonitorError::Unauthorized) => {
                tracing::debug!("Trial session check unauthenticated, monitoring disabled");
                return false;
            }
            Err(e) => {
                tracing::warn!("Trial session check failed, monitoring disabled: {}", e);
                return false;
            }
        }

        self.machine.start(self.deps.clock.now());
        true
    }

    async fn execute(&mut self, actions: Vec<Action>) -> Option<MonitorOutcome> {
        let mut redirected = None;

        for action in actions {
            match action {
                Action::SendCheck { last_activity } => {
                    let api = self.deps.api.clone();
                    self.in_flight.push(
                        async move { Completion::Check(api.check(last_activity).await) }.boxed(),
                    );
                }
                Action::SendExtend => {
                    let api = self.deps.api.clone();
                    self.in_flight
                        .push(async move { Completion::Extend(api.extend().await) }.boxed());
                }
                Action::ShowWarning { remaining_seconds } => {
                    self.deps.view.show_warning(remaining_seconds)
                }
                Action::UpdateCountdown { remaining_seconds } => {
                    self.deps.view.update_countdown(remaining_seconds)
                }
                Action::HideWarning => self.deps.view.hide_warning(),
                Action::Notify { level, message } => self.deps.view.notify(level, &message),
                Action::SendLogout => {
                    if let Err(e) = self.deps.api.logout().await {
                        tracing::warn!("Logout request failed, redirecting anyway: {}", e);
                    }
                }
                Action::Redirect { location } => {
                    self.deps.navigator.navigate(&location);
                    redirected = Some(location);
                }
            }
        }

        self.publish();

        if let Some(location) = redirected {
            return Some(MonitorOutcome::Redirected(location));
        }
        if self.machine.state() == MonitorState::Disabled {
            return Some(MonitorOutcome::Disabled);
        }
        None
    }

    fn publish(&self) {
        let state = self.machine.state();
        self.state.send_if_modified(|current| {
            if *current == state {
                false
            } else {
                *current = state;
                true
            }
        });
    }
}
