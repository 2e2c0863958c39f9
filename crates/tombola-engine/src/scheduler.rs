//! Clock-driven phase firing and missed-tick reconciliation.
//!
//! One periodic pass covers both the primary cron-style firing and the
//! watchdog: a phase fires when the lifecycle is positioned for it (`close`
//! needs an open window, `announce` a drawn result), the current local time
//! is at or past its weekly slot, and the state's recorded week key for that
//! phase differs from the current ISO week. Keys are written by the phase
//! operations themselves only after their side effects succeed, so a failed
//! phase is retried on the next pass and a completed one is never re-run
//! within the same week.
//!
//! A cycle carried over from an earlier week (the process was down across
//! its close or announce slot) is finished at the start of the pass: those
//! slots are long past, and the same-week checks would never reach them.
//! Close and announce stamp the week their cycle was opened in, so a
//! carry-over finished late does not consume the current week's slots.
//! After downtime within a single week the pass compresses naturally and
//! can run open, close, and announce back to back.

use crate::lifecycle::{LotteryLifecycle, OpenOutcome};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tombola_core::{Phase, WeekKey};
use tracing::{debug, warn};

/// Periodic trigger source for the lifecycle. Carries no business logic:
/// every decision beyond "is it time" lives in [`LotteryLifecycle`].
pub struct Scheduler {
    lifecycle: Arc<LotteryLifecycle>,
}

/// Which phases a single reconciliation pass fired.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TickReport {
    /// `open` fired this pass.
    pub opened: bool,
    /// `close` fired this pass.
    pub closed: bool,
    /// `announce` fired this pass.
    pub announced: bool,
}

impl Scheduler {
    /// Create a scheduler driving the given lifecycle.
    pub fn new(lifecycle: Arc<LotteryLifecycle>) -> Self {
        Self { lifecycle }
    }

    /// Run until `shutdown` flips to `true`, performing one reconciliation
    /// pass per configured interval. Phase failures are logged and do not
    /// stop the loop.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        let interval = Duration::from_secs(self.lifecycle.config().watchdog_interval_secs);
        loop {
            tokio::select! {
                _ = tokio::time::sleep(interval) => {
                    self.tick().await;
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        debug!("scheduler shutting down");
                        return;
                    }
                }
            }
        }
    }

    /// One reconciliation pass. Public so tests (and a hosting process that
    /// owns its own timer) can drive the scheduler manually.
    pub async fn tick(&self) -> TickReport {
        let mut report = TickReport::default();
        let config = self.lifecycle.config();
        let now_utc = self.lifecycle.clock().now_utc().await;
        if let Some(start_at) = config.start_at {
            if now_utc < start_at {
                return report;
            }
        }

        let now_local = now_utc.with_timezone(&config.offset());
        let week = WeekKey::of(now_local);
        let schedule = config.schedule;

        let mut state = self.lifecycle.state_snapshot().await;

        // A cycle carried over from an earlier week has its remaining slots
        // long past; finish it before gating on this week's slots.
        if state.last_open_week != Some(week) && state.phase != Phase::Idle {
            match state.phase {
                Phase::Open => match self.lifecycle.close(true).await {
                    Ok(_) => {
                        report.closed = true;
                        report.announced = true;
                    }
                    Err(e) => {
                        warn!(error = %e, %week, "carry-over close failed, will retry");
                        return report;
                    }
                },
                Phase::Closed => match self.lifecycle.announce().await {
                    Ok(_) => report.announced = true,
                    Err(e) => {
                        warn!(error = %e, %week, "carry-over announce failed, will retry");
                        return report;
                    }
                },
                Phase::Idle => {}
            }
            state = self.lifecycle.state_snapshot().await;
        }

        if Self::due(&schedule.open, now_local, week, state.last_open_week) {
            match self.lifecycle.open(false).await {
                Ok(OpenOutcome::Opened { .. }) => report.opened = true,
                Ok(OpenOutcome::AlreadyOpen) => {}
                Err(e) => {
                    warn!(error = %e, %week, "scheduled open failed, will retry");
                    return report;
                }
            }
            state = self.lifecycle.state_snapshot().await;
        }

        if state.phase == Phase::Open
            && Self::due(&schedule.close, now_local, week, state.last_close_week)
        {
            match self.lifecycle.close(false).await {
                Ok(_) => report.closed = true,
                Err(e) => {
                    warn!(error = %e, %week, "scheduled close failed, will retry");
                    return report;
                }
            }
            state = self.lifecycle.state_snapshot().await;
        }

        if state.phase == Phase::Closed
            && Self::due(&schedule.announce, now_local, week, state.last_announce_week)
        {
            match self.lifecycle.announce().await {
                Ok(_) => report.announced = true,
                Err(e) => warn!(error = %e, %week, "scheduled announce failed, will retry"),
            }
        }

        report
    }

    /// A slot is due when its weekly instant has passed and its phase has
    /// not yet completed for this week.
    fn due(
        slot: &tombola_core::Slot,
        now_local: chrono::DateTime<chrono::FixedOffset>,
        week: WeekKey,
        last_run: Option<WeekKey>,
    ) -> bool {
        slot.has_passed_within_week(now_local) && last_run != Some(week)
    }
}
