//! The lifecycle state machine.
//!
//! `open` → `close` → `announce`, each idempotent under duplicate trigger
//! delivery and each persisting the state record before its lock is
//! released. One `tokio::sync::Mutex` guards the whole
//! load-mutate-persist-send sequence, so a scheduled firing and a manual
//! override can never interleave and double-draw a winner or double-bump the
//! edition counter.
//!
//! Mutations follow a commit discipline: phase operations mutate a working
//! copy of the record, persist it, and only then replace the in-memory
//! record. A failed save therefore leaves the engine exactly where it was,
//! and the next scheduled or watchdog pass retries cleanly.

use crate::config::{EngineConfig, SelectionPolicy};
use crate::messages;
use chrono::{DateTime, FixedOffset};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::collections::BTreeSet;
use std::sync::Arc;
use tokio::sync::Mutex;
use tombola_core::ledger::{BONUS_REWARDS, BONUS_VETERAN_EXTRA};
use tombola_core::{
    collect_participants, derive_last_win, record_bonus_win, record_win, selector, BonusRecord,
    ChatEffects, Clock, LotteryState, Phase, PrizeTier, Result, StateStore, UserId, WeekKey,
    WinRecord,
};
use tracing::{debug, info, warn};

/// Result of an `open` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenOutcome {
    /// A new entry window was opened under this edition label.
    Opened {
        /// Edition label on the announcement just posted.
        edition: u64,
    },
    /// The previous entry announcement still resolves; nothing was done.
    AlreadyOpen,
}

/// Result of a `close` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CloseOutcome {
    /// Distinct non-bot entrants collected.
    pub participant_count: usize,
    /// Winner drawn, absent when nobody entered.
    pub winner: Option<UserId>,
}

/// Result of an `announce` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnnounceOutcome {
    /// Winner announced, absent for the no-winner notice.
    pub winner: Option<UserId>,
}

#[derive(Debug, Clone, Copy)]
enum DrawKind {
    Regular(WinRecord),
    Bonus(BonusRecord),
}

/// Draw details carried from `close` to `announce` within one process life.
/// Not persisted: after a restart the announcement is reconstructed from the
/// state record (see `derive_last_win`).
#[derive(Debug, Clone, Copy)]
struct PendingDraw {
    winner: UserId,
    kind: DrawKind,
}

struct Inner {
    state: LotteryState,
    rng: StdRng,
    pending_draw: Option<PendingDraw>,
}

/// The lifecycle orchestrator. Sole owner of the state record.
pub struct LotteryLifecycle {
    chat: Arc<dyn ChatEffects>,
    store: Arc<dyn StateStore>,
    clock: Arc<dyn Clock>,
    config: EngineConfig,
    inner: Mutex<Inner>,
}

impl LotteryLifecycle {
    /// Validate the configuration, load the persisted record (or the default
    /// one), and take ownership of it.
    pub async fn bootstrap(
        chat: Arc<dyn ChatEffects>,
        store: Arc<dyn StateStore>,
        clock: Arc<dyn Clock>,
        config: EngineConfig,
    ) -> Result<Self> {
        Self::bootstrap_inner(chat, store, clock, config, StdRng::from_entropy()).await
    }

    /// [`bootstrap`](Self::bootstrap) with a seeded RNG for deterministic
    /// draws in tests.
    pub async fn bootstrap_seeded(
        chat: Arc<dyn ChatEffects>,
        store: Arc<dyn StateStore>,
        clock: Arc<dyn Clock>,
        config: EngineConfig,
        seed: u64,
    ) -> Result<Self> {
        Self::bootstrap_inner(chat, store, clock, config, StdRng::seed_from_u64(seed)).await
    }

    async fn bootstrap_inner(
        chat: Arc<dyn ChatEffects>,
        store: Arc<dyn StateStore>,
        clock: Arc<dyn Clock>,
        config: EngineConfig,
        rng: StdRng,
    ) -> Result<Self> {
        config.validate()?;
        let state = store.load().await?;
        info!(edition = state.edition, phase = ?state.phase, "lifecycle bootstrapped");
        Ok(Self {
            chat,
            store,
            clock,
            config,
            inner: Mutex::new(Inner {
                state,
                rng,
                pending_draw: None,
            }),
        })
    }

    /// Engine configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Clock handle, shared with the scheduler.
    pub fn clock(&self) -> Arc<dyn Clock> {
        Arc::clone(&self.clock)
    }

    pub(crate) fn chat(&self) -> &dyn ChatEffects {
        self.chat.as_ref()
    }

    /// Copy of the current state record.
    pub async fn state_snapshot(&self) -> LotteryState {
        self.inner.lock().await.state.clone()
    }

    async fn now_local(&self) -> DateTime<FixedOffset> {
        self.clock.now_utc().await.with_timezone(&self.config.offset())
    }

    /// Open the weekly entry window.
    ///
    /// Idempotent: if the entry window is open and its announcement still
    /// resolves, the call is a no-op, so overlapping scheduler/watchdog
    /// firings cannot stack entry windows. A drawn result still awaiting
    /// announcement is published first, completing the previous cycle before
    /// the new one starts. `special` forces bonus-edition flavor regardless
    /// of the configured bonus edition list.
    pub async fn open(&self, special: bool) -> Result<OpenOutcome> {
        let mut inner = self.inner.lock().await;
        self.do_open(&mut inner, special).await
    }

    async fn do_open(&self, inner: &mut Inner, special: bool) -> Result<OpenOutcome> {
        if inner.state.phase == Phase::Closed {
            // A drawn-but-unannounced result blocks a new window; publish
            // it so the previous cycle completes before this one starts.
            self.do_announce(inner).await?;
        }
        if let Some(entry) = inner.state.open_entry_ref {
            if self.chat.fetch_message(entry).await?.is_some() {
                debug!(?entry, "entry window already open, skipping");
                return Ok(OpenOutcome::AlreadyOpen);
            }
            warn!(?entry, "recorded entry announcement is gone, reopening");
        }

        let week = WeekKey::of(self.now_local().await);
        let edition = inner.state.edition;
        let bonus = special || self.config.is_bonus_edition(edition);
        let content = messages::entry_announcement(edition, &self.config.reaction_marker, bonus);
        let entry = self.chat.send_message(self.config.channel, &content).await?;

        let mut next = inner.state.clone();
        next.participants.clear();
        next.pending_winner = None;
        next.open_entry_ref = Some(entry);
        next.phase = Phase::Open;
        next.edition = edition + 1;
        next.last_open_week = Some(week);
        self.store.save(&next).await?;

        inner.state = next;
        inner.pending_draw = None;
        info!(edition, %week, "entry window opened");
        Ok(OpenOutcome::Opened { edition })
    }

    /// Lock entries, collect participants, and draw the winner.
    ///
    /// Idempotent: a repeat invocation while entries are already closed
    /// returns the recorded outcome without redrawing; the prize is issued
    /// exactly once per edition. Tolerates a stale entry reference (zero
    /// participants). A week with no entrants is a valid outcome: the
    /// lifecycle still advances and no retry is attempted. With
    /// `announce_now` the announcement step runs inline, which is what the
    /// compressed manual test cycle uses.
    pub async fn close(&self, announce_now: bool) -> Result<CloseOutcome> {
        let mut inner = self.inner.lock().await;
        let outcome = self.do_close(&mut inner).await?;
        if announce_now {
            self.do_announce(&mut inner).await?;
        }
        Ok(outcome)
    }

    async fn do_close(&self, inner: &mut Inner) -> Result<CloseOutcome> {
        if inner.state.phase == Phase::Closed {
            debug!("entries already closed, keeping the existing draw");
            return Ok(CloseOutcome {
                participant_count: inner.state.participants.len(),
                winner: inner.state.pending_winner,
            });
        }

        let now_local = self.now_local().await;
        let now_ts = now_local.timestamp();
        let week = WeekKey::of(now_local);

        let participants = match inner.state.open_entry_ref {
            Some(entry) => {
                collect_participants(self.chat.as_ref(), entry, &self.config.reaction_marker)
                    .await?
            }
            None => BTreeSet::new(),
        };

        let mut next = inner.state.clone();
        let mut pending_draw = None;
        next.participants = participants.clone();
        if next.open_entry_ref.is_some() {
            next.phase = Phase::Closed;
        }

        let winner = if participants.is_empty() {
            debug!(%week, "no valid participants this week");
            None
        } else {
            let winner = self.draw_winner(&next, &participants, now_ts, &mut inner.rng);
            // The edition counter already points at the next edition; the
            // cycle being closed carries the previous label.
            let closing_edition = next.edition.saturating_sub(1);
            let kind = if self.config.is_bonus_edition(closing_edition) {
                DrawKind::Bonus(record_bonus_win(&mut next, winner, now_ts, &mut inner.rng))
            } else {
                DrawKind::Regular(record_win(&mut next, winner, now_ts))
            };
            next.pending_winner = Some(winner);
            pending_draw = Some(PendingDraw { winner, kind });
            Some(winner)
        };
        // Keyed to the week the window opened, so a carry-over close
        // finished late does not consume the current week's close slot.
        next.last_close_week = next.last_open_week;

        let summary = messages::closing_summary(participants.len());
        self.chat.send_message(self.config.channel, &summary).await?;
        self.store.save(&next).await?;

        inner.state = next;
        inner.pending_draw = pending_draw;
        info!(
            participants = participants.len(),
            winner = winner.map(|w| w.0),
            %week,
            "entry window closed"
        );
        Ok(CloseOutcome {
            participant_count: participants.len(),
            winner,
        })
    }

    fn draw_winner(
        &self,
        state: &LotteryState,
        participants: &BTreeSet<UserId>,
        now_ts: i64,
        rng: &mut StdRng,
    ) -> UserId {
        match self.config.selection {
            SelectionPolicy::Uniform => selector::pick_one(participants, rng),
            SelectionPolicy::Weighted => {
                let cap = self.config.staleness_cap_weeks;
                let lowest = selector::lowest_level(state, participants);
                let weight = |user: UserId| {
                    let staleness = selector::staleness_weight(
                        state.last_win_at.get(&user).copied(),
                        now_ts,
                        cap,
                    );
                    let boost = if state.level_of(user) == lowest {
                        selector::LOWEST_LEVEL_MULTIPLIER
                    } else {
                        1.0
                    };
                    staleness * boost
                };
                selector::pick_weighted(participants, weight, rng)
            }
        }
    }

    /// Publish the pending result and reset the cycle to `Idle`.
    ///
    /// With no pending winner (empty week, or a repeat invocation after the
    /// clear) this posts the no-winner notice — accepted behavior, not an
    /// error; the scheduler dedupes by week key rather than by state.
    pub async fn announce(&self) -> Result<AnnounceOutcome> {
        let mut inner = self.inner.lock().await;
        self.do_announce(&mut inner).await
    }

    async fn do_announce(&self, inner: &mut Inner) -> Result<AnnounceOutcome> {
        let now_local = self.now_local().await;
        let week = WeekKey::of(now_local);
        let mut next = inner.state.clone();
        let winner = next.pending_winner;

        match winner {
            None => {
                self.chat
                    .send_message(self.config.channel, &messages::no_winner_notice())
                    .await?;
            }
            Some(user) => {
                let handle = self.display_handle(user).await;
                let announced_edition = next.edition.saturating_sub(1);
                let kind = match inner.pending_draw {
                    Some(draw) if draw.winner == user => draw.kind,
                    // Restarted between close and announce: rebuild from the
                    // persisted record.
                    _ => self.reconstruct_draw(&next, user, announced_edition, &mut inner.rng),
                };

                let content = match kind {
                    DrawKind::Regular(record) => {
                        let flagged = if record.tier == PrizeTier::Medium {
                            self.flagged_status(user).await
                        } else {
                            false
                        };
                        messages::winner_announcement(announced_edition, &handle, &record, flagged)
                    }
                    DrawKind::Bonus(record) => {
                        messages::bonus_winner_announcement(announced_edition, &handle, &record)
                    }
                };
                self.chat.send_message(self.config.channel, &content).await?;

                if let DrawKind::Regular(record) = kind {
                    let register = messages::quick_register(announced_edition, &handle, &record);
                    if let Err(e) = self.chat.send_message(self.config.channel, &register).await {
                        warn!(error = %e, "quick-register line not delivered");
                    }
                }
            }
        }

        next.pending_winner = None;
        next.open_entry_ref = None;
        next.phase = Phase::Idle;
        next.participants.clear();
        // Chained from the close key for the same reason close chains from
        // the open key: a late announcement belongs to its own cycle's week.
        next.last_announce_week = next.last_close_week;
        self.store.save(&next).await?;

        inner.state = next;
        inner.pending_draw = None;
        info!(winner = winner.map(|w| w.0), %week, "result announced");
        Ok(AnnounceOutcome { winner })
    }

    fn reconstruct_draw(
        &self,
        state: &LotteryState,
        winner: UserId,
        edition: u64,
        rng: &mut StdRng,
    ) -> DrawKind {
        if self.config.is_bonus_edition(edition) {
            // The drawn magnitude was not persisted; redraw it. `close`
            // already counted this win, so "veteran" means more than one.
            #[allow(clippy::unwrap_used)]
            let reward = *BONUS_REWARDS.choose(rng).unwrap();
            DrawKind::Bonus(BonusRecord {
                reward,
                veteran_extra: if state.wins_of(winner) > 1 {
                    BONUS_VETERAN_EXTRA
                } else {
                    0
                },
            })
        } else {
            DrawKind::Regular(derive_last_win(state, winner))
        }
    }

    async fn display_handle(&self, user: UserId) -> String {
        match self.chat.resolve_user(user).await {
            Ok(Some(handle)) => handle,
            Ok(None) => user.mention(),
            Err(e) => {
                warn!(error = %e, %user, "handle lookup failed, using raw mention");
                user.mention()
            }
        }
    }

    async fn flagged_status(&self, user: UserId) -> bool {
        match self.chat.has_flagged_status(user).await {
            Ok(flagged) => flagged,
            Err(e) => {
                warn!(error = %e, %user, "flagged-status lookup failed, assuming unflagged");
                false
            }
        }
    }

    /// Post the service-online notice with the next scheduled opening.
    /// Failure to deliver is logged and swallowed; startup must not abort
    /// over a missed courtesy message.
    pub async fn startup_notice(&self) {
        let next_open = self.config.schedule.open.next_occurrence(self.now_local().await);
        let content = messages::startup_notice(next_open);
        if let Err(e) = self.chat.send_message(self.config.channel, &content).await {
            warn!(error = %e, "startup notice not delivered");
        }
    }

    // ----- admin overrides ------------------------------------------------
    //
    // Direct state edits outside the normal transition path. Authorization
    // happens in `admin::handle_admin`; these primitives assume the caller
    // is already cleared and still validate their inputs.

    /// Set the next edition number. Rejects zero.
    pub async fn set_edition(&self, edition: u64) -> Result<()> {
        if edition == 0 {
            return Err(tombola_core::LotteryError::InvalidEdition(edition));
        }
        let mut inner = self.inner.lock().await;
        let mut next = inner.state.clone();
        next.edition = edition;
        self.store.save(&next).await?;
        inner.state = next;
        info!(edition, "edition counter overridden");
        Ok(())
    }

    /// Set a user's progression level. Rejects levels outside 1..=3.
    pub async fn set_level(&self, user: UserId, level: u8) -> Result<()> {
        if !(1..=3).contains(&level) {
            return Err(tombola_core::LotteryError::InvalidLevel(level));
        }
        let mut inner = self.inner.lock().await;
        let mut next = inner.state.clone();
        next.levels.insert(user, level);
        self.store.save(&next).await?;
        inner.state = next;
        info!(%user, level, "level overridden");
        Ok(())
    }

    /// Record a win outside a draw (prize handed out manually).
    pub async fn record_manual_win(&self, user: UserId) -> Result<WinRecord> {
        let now_ts = self.clock.now_utc().await.timestamp();
        let mut inner = self.inner.lock().await;
        let mut next = inner.state.clone();
        let record = record_win(&mut next, user, now_ts);
        self.store.save(&next).await?;
        inner.state = next;
        info!(%user, level = record.previous_level, "manual win recorded");
        Ok(record)
    }

    /// Erase a user's history entirely.
    pub async fn remove_user_history(&self, user: UserId) -> Result<()> {
        let mut inner = self.inner.lock().await;
        if !inner.state.levels.contains_key(&user)
            && !inner.state.total_wins.contains_key(&user)
        {
            return Err(tombola_core::LotteryError::UnknownUser(user));
        }
        let mut next = inner.state.clone();
        next.remove_user_history(user);
        self.store.save(&next).await?;
        inner.state = next;
        info!(%user, "user history removed");
        Ok(())
    }

    /// Reinitialize the lifecycle; `keep_history` preserves the win maps.
    pub async fn reset(&self, keep_history: bool) -> Result<()> {
        let mut inner = self.inner.lock().await;
        let mut next = inner.state.clone();
        next.reset(keep_history);
        self.store.save(&next).await?;
        inner.state = next;
        inner.pending_draw = None;
        info!(keep_history, "lottery reset");
        Ok(())
    }

    /// Level standings, sorted by level then lifetime wins, both descending.
    pub async fn level_standings(&self) -> Vec<(UserId, u8, u64)> {
        let inner = self.inner.lock().await;
        let mut rows: Vec<(UserId, u8, u64)> = inner
            .state
            .levels
            .iter()
            .map(|(&user, &level)| (user, level, inner.state.wins_of(user)))
            .collect();
        rows.sort_by(|a, b| (b.1, b.2).cmp(&(a.1, a.2)));
        rows
    }
}
