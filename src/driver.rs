//! Core monitoring state machine for Chargeguard
//!
//! The driver owns the single current-state slot and repeatedly polls the
//! session provider, feeding each snapshot to the pure transition logic and
//! sleeping between polls. Decision logic lives in [`MonitorState::evaluate`]
//! and never touches the clock or the network, so it is synchronously
//! testable; the driver owns timing and provider calls.

use crate::config::MonitorConfig;
use crate::error::{ChargeGuardError, Result};
use crate::logging::get_logger;
use crate::provider::SessionProvider;
use crate::session::SessionSnapshot;
use std::time::Duration;
use tokio::sync::watch;

/// Monitoring state.
///
/// A closed set of variants, each carrying only the data it needs. A state
/// value is consumed exactly once by evaluating it; a transition always
/// yields a new value.
#[derive(Debug, Clone, PartialEq)]
pub enum MonitorState {
    /// Waiting for a session worth monitoring to appear
    WaitToMonitor,

    /// Watching power draw of one tracked session
    MonitorPowerUsage {
        /// The session being tracked
        session: SessionSnapshot,
        /// Consecutive polls with low power draw
        low_power_count: u32,
    },

    /// About to issue a stop command for the session
    StopCharging { session: SessionSnapshot },

    /// Waiting for the current session to be replaced by a new one
    WaitForNewSession { session: SessionSnapshot },
}

/// Outcome of evaluating a state against a snapshot
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    /// Remain in the state (counters may have advanced); the driver sleeps
    /// the state's poll interval before the next fetch
    Stay(MonitorState),

    /// Move to a new state without sleeping
    Transition(MonitorState),
}

impl MonitorState {
    /// Poll cadence while looping in this state
    pub fn poll_interval(&self, config: &MonitorConfig) -> Duration {
        match self {
            Self::MonitorPowerUsage { .. } => {
                Duration::from_secs(config.active_poll_interval_secs)
            }
            _ => Duration::from_secs(config.idle_poll_interval_secs),
        }
    }

    /// Decide the successor state for the latest snapshot.
    ///
    /// Pure in (state, snapshot, config); all carried data lives in the
    /// state itself. `StopCharging` is the one variant that does not poll,
    /// so it never reaches this function - the driver issues the stop
    /// command instead.
    pub fn evaluate(self, snapshot: &SessionSnapshot, config: &MonitorConfig) -> Result<Step> {
        match self {
            Self::WaitToMonitor => {
                if !snapshot.is_active {
                    return Ok(Step::Stay(Self::WaitToMonitor));
                }
                if !snapshot.is_paid {
                    // Free sessions are not worth stopping
                    return Ok(Step::Transition(Self::WaitForNewSession {
                        session: snapshot.clone(),
                    }));
                }
                if config.company_name_whitelist.is_some() && snapshot.company_name.is_empty() {
                    return Err(ChargeGuardError::validation(
                        "company_name",
                        "Active session reports no operator name while a whitelist is configured",
                    ));
                }
                if !config.company_allowed(&snapshot.company_name) {
                    return Ok(Step::Transition(Self::WaitForNewSession {
                        session: snapshot.clone(),
                    }));
                }
                Ok(Step::Transition(Self::MonitorPowerUsage {
                    session: snapshot.clone(),
                    low_power_count: 0,
                }))
            }

            Self::MonitorPowerUsage {
                session,
                low_power_count,
            } => {
                if snapshot.session_id != session.session_id {
                    // A different session is now current; abandon tracking
                    return Ok(Step::Transition(Self::WaitToMonitor));
                }
                if !snapshot.is_active {
                    return Ok(Step::Transition(Self::WaitToMonitor));
                }

                let low_power_count = if snapshot.is_low_power(config.low_power_threshold_kw) {
                    low_power_count + 1
                } else {
                    0
                };

                if low_power_count >= config.low_power_streak_threshold {
                    return Ok(Step::Transition(Self::StopCharging {
                        session: snapshot.clone(),
                    }));
                }
                if snapshot.is_fully_charged {
                    return Ok(Step::Transition(Self::StopCharging {
                        session: snapshot.clone(),
                    }));
                }

                Ok(Step::Stay(Self::MonitorPowerUsage {
                    session,
                    low_power_count,
                }))
            }

            Self::StopCharging { .. } => Err(ChargeGuardError::generic(
                "StopCharging does not poll; the driver must issue the stop command",
            )),

            Self::WaitForNewSession { session } => {
                if snapshot.session_id != session.session_id {
                    return Ok(Step::Transition(Self::WaitToMonitor));
                }
                Ok(Step::Stay(Self::WaitForNewSession { session }))
            }
        }
    }
}

impl std::fmt::Display for MonitorState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MonitorPowerUsage {
                session,
                low_power_count,
            } => write!(f, "MonitorPowerUsage({}, {})", session.session_id, low_power_count),
            Self::StopCharging { session } => write!(f, "StopCharging({})", session.session_id),
            Self::WaitForNewSession { session } => {
                write!(f, "WaitForNewSession({})", session.session_id)
            }
            Self::WaitToMonitor => write!(f, "WaitToMonitor"),
        }
    }
}

/// Drives the monitoring state machine against a session provider.
///
/// Single logical thread of control: one fetch, one decision, one sleep per
/// iteration; no overlapping requests, no snapshot buffering. Provider
/// errors are fatal to the run - any retry policy belongs to an outer
/// supervisor.
pub struct Driver {
    provider: Box<dyn SessionProvider>,
    config: MonitorConfig,
    state: MonitorState,
    authenticated: bool,
    shutdown: watch::Receiver<bool>,
    logger: crate::logging::StructuredLogger,
}

impl Driver {
    /// Create a new driver in the initial state
    pub fn new(
        provider: Box<dyn SessionProvider>,
        config: MonitorConfig,
        shutdown: watch::Receiver<bool>,
    ) -> Self {
        let logger = get_logger("driver");
        Self {
            provider,
            config,
            state: MonitorState::WaitToMonitor,
            authenticated: false,
            shutdown,
            logger,
        }
    }

    /// Current state of the machine
    pub fn state(&self) -> &MonitorState {
        &self.state
    }

    /// Run forever, or until shutdown is signalled or a provider call fails
    pub async fn run(&mut self) -> Result<()> {
        self.run_until(|_| false).await
    }

    /// Run until the predicate over the current state becomes true.
    ///
    /// Used by tests to observe intermediate states without running
    /// forever; `run` is this with an always-false predicate.
    pub async fn run_until<F>(&mut self, predicate: F) -> Result<()>
    where
        F: Fn(&MonitorState) -> bool,
    {
        if !self.authenticated {
            self.provider.authenticate().await?;
            self.authenticated = true;
        }

        loop {
            if predicate(&self.state) {
                return Ok(());
            }
            if self.shutdown_requested() {
                self.logger.info("Shutdown requested, stopping monitor");
                return Ok(());
            }
            self.step().await?;
        }
    }

    /// Execute one iteration: stop command, or fetch-decide-sleep
    async fn step(&mut self) -> Result<()> {
        self.logger.debug(&format!("Running {}", self.state));

        let state = std::mem::replace(&mut self.state, MonitorState::WaitToMonitor);
        match state {
            MonitorState::StopCharging { session } => {
                self.logger.info("Attempting to stop charging");
                self.provider.stop_session(&session).await?;
                self.logger.info("Stopped charging successfully");
                self.state = MonitorState::WaitForNewSession { session };
            }
            state => {
                let snapshot = self.provider.fetch_current_session().await?;
                match state.evaluate(&snapshot, &self.config)? {
                    Step::Stay(next) => {
                        self.logger
                            .debug(&format!("Staying in {} after seeing {}", next, snapshot));
                        let interval = next.poll_interval(&self.config);
                        self.state = next;
                        self.idle(interval).await;
                    }
                    Step::Transition(next) => {
                        self.logger
                            .info(&format!("Transition to {} after seeing {}", next, snapshot));
                        self.state = next;
                    }
                }
            }
        }
        Ok(())
    }

    /// Sleep between polls, waking early if shutdown is signalled
    async fn idle(&mut self, duration: Duration) {
        tokio::select! {
            _ = tokio::time::sleep(duration) => {}
            changed = self.shutdown.changed() => {
                if changed.is_err() {
                    // Sender gone; nothing can signal shutdown anymore
                    tokio::time::sleep(duration).await;
                }
            }
        }
    }

    fn shutdown_requested(&self) -> bool {
        *self.shutdown.borrow()
    }
}
