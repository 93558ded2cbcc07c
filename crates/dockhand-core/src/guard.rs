//! Timeout guard state machine
//!
//! The guard races the child's exit against a timer. Both feed a single
//! `select!`, which resolves exactly once per iteration; the losing future is
//! dropped, so a late timer never fires and an abandoned wait has no effect.
//! The select is biased towards the exit: when both are ready in the same
//! poll, the timer did not elapse strictly before completion.

use dockhand_host_api::{ForwardedSignal, ProcessHandle};
use dockhand_util::MonotonicInstant;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::{TerminationOutcome, TimeoutPolicy};

/// Receiving side of relayed operator signals
pub type SignalReceiver = mpsc::UnboundedReceiver<ForwardedSignal>;

/// Deadline used when the configured timeout does not fit the clock
const FAR_FUTURE: Duration = Duration::from_secs(86400 * 365 * 30);

/// Guard lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardState {
    /// Not armed; also the final state when the policy is disabled
    Idle,
    /// Timer running alongside the wait
    Armed,
    /// Timer elapsed first; the child was terminated
    Fired,
    /// Child exited first; the timer was dropped
    Disarmed,
}

enum RaceEvent<T> {
    Exited(T),
    Expired,
    Signal(ForwardedSignal),
    SignalsClosed,
}

/// Bounds one child's runtime
#[derive(Debug)]
pub struct TimeoutGuard {
    policy: TimeoutPolicy,
    state: GuardState,
    armed_at: Option<MonotonicInstant>,
}

impl TimeoutGuard {
    pub fn new(policy: TimeoutPolicy) -> Self {
        Self {
            policy,
            state: GuardState::Idle,
            armed_at: None,
        }
    }

    pub fn state(&self) -> GuardState {
        self.state
    }

    pub fn policy(&self) -> TimeoutPolicy {
        self.policy
    }

    /// Supervise a started process until it exits or is killed.
    ///
    /// With a disabled policy this is a plain wait (plus signal relay).
    /// `signals` is drained while waiting; each signal is relayed to the
    /// child and does not move the deadline.
    pub async fn supervise<H: ProcessHandle>(
        &mut self,
        handle: &mut H,
        signals: &mut Option<SignalReceiver>,
    ) -> TerminationOutcome {
        let deadline = self.arm();
        let armed = deadline.is_some();

        let timer = tokio::time::sleep_until(deadline.unwrap_or_else(Instant::now));
        tokio::pin!(timer);

        loop {
            let event = tokio::select! {
                biased;

                result = handle.wait() => RaceEvent::Exited(result),
                _ = &mut timer, if armed => RaceEvent::Expired,
                signal = next_signal(signals) => match signal {
                    Some(signal) => RaceEvent::Signal(signal),
                    None => RaceEvent::SignalsClosed,
                },
            };

            match event {
                RaceEvent::Exited(Ok(status)) => {
                    self.disarm();
                    debug!(pid = ?handle.pid(), status = ?status, "Child exited before timeout");
                    return TerminationOutcome::NormalExit(status);
                }
                RaceEvent::Exited(Err(e)) => {
                    self.disarm();
                    warn!(pid = ?handle.pid(), error = %e, "Waiting on child failed");
                    return TerminationOutcome::WaitFailed(e);
                }
                RaceEvent::Expired => {
                    return self.fire(handle).await;
                }
                RaceEvent::Signal(signal) => {
                    info!(pid = ?handle.pid(), signal = %signal, "Relaying signal to child");
                    if let Err(e) = handle.signal(signal) {
                        warn!(signal = %signal, error = %e, "Signal relay failed");
                    }
                }
                RaceEvent::SignalsClosed => {
                    debug!("Signal source closed, no further relaying");
                    *signals = None;
                }
            }
        }
    }

    /// Start the timer; `None` leaves the guard idle
    fn arm(&mut self) -> Option<Instant> {
        let limit = self.policy.limit()?;
        let now = MonotonicInstant::now();
        let Some(deadline) = now
            .checked_add(limit)
            .or_else(|| now.checked_add(FAR_FUTURE))
        else {
            warn!(timeout = %self.policy, "Timeout exceeds the clock range, not enforced");
            return None;
        };

        self.state = GuardState::Armed;
        self.armed_at = Some(now);
        debug!(timeout = %self.policy, "Timeout armed");
        Some(Instant::from_std(deadline.into_std()))
    }

    fn disarm(&mut self) {
        if self.state == GuardState::Armed {
            self.state = GuardState::Disarmed;
        }
    }

    async fn fire<H: ProcessHandle>(&mut self, handle: &mut H) -> TerminationOutcome {
        self.state = GuardState::Fired;
        let elapsed_ms = self
            .armed_at
            .map(|t| t.elapsed().as_millis())
            .unwrap_or_default();
        info!(
            pid = ?handle.pid(),
            timeout = %self.policy,
            elapsed_ms = elapsed_ms,
            "Timeout elapsed, terminating child"
        );

        match handle.terminate() {
            Ok(sent) => {
                if !sent {
                    debug!(pid = ?handle.pid(), "Child was already gone when the timer fired");
                }
                let status = match handle.wait().await {
                    Ok(status) => Some(status),
                    Err(e) => {
                        warn!(error = %e, "Could not reap terminated child");
                        None
                    }
                };
                TerminationOutcome::TimedOut {
                    timeout: self.policy,
                    status,
                    kill_error: None,
                }
            }
            Err(e) => {
                // The process may still be running; do not block on it
                warn!(pid = ?handle.pid(), error = %e, "Kill signal could not be delivered");
                let status = handle.try_wait().ok().flatten();
                TerminationOutcome::TimedOut {
                    timeout: self.policy,
                    status,
                    kill_error: Some(e.to_string()),
                }
            }
        }
    }
}

async fn next_signal(signals: &mut Option<SignalReceiver>) -> Option<ForwardedSignal> {
    match signals {
        Some(rx) => rx.recv().await,
        None => std::future::pending().await,
    }
}
