//! Admin command surface.
//!
//! Thin dispatch over the lifecycle's override primitives. Every command is
//! authorization-checked first and rejected outright — no partial mutation —
//! when the caller lacks administrator privilege. Replies are plain strings
//! for the hosting process to relay back to the caller.

use crate::lifecycle::LotteryLifecycle;
use crate::messages;
use tombola_core::{LotteryError, Result, UserId};
use tracing::info;

/// Commands exposed to guild administrators.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdminCommand {
    /// Open an entry window outside the schedule.
    ForceOpen {
        /// Use bonus-edition flavor regardless of the configured list.
        special: bool,
    },
    /// Close the entry window outside the schedule.
    ForceClose {
        /// Run the announcement step immediately after closing.
        announce_now: bool,
    },
    /// Publish the pending result outside the schedule.
    ForceAnnounce,
    /// Override the next edition number.
    SetEdition(u64),
    /// Override a user's progression level.
    SetLevel(UserId, u8),
    /// Record a win handed out manually.
    RecordManualWin(UserId),
    /// Erase a user's history.
    RemoveUserHistory(UserId),
    /// Render the level standings.
    ShowLevels,
    /// Reinitialize the lifecycle, keeping win history.
    ResetSoft,
    /// Reinitialize everything, history included.
    ResetHard,
    /// Compressed open → close → announce cycle for smoke-testing a guild.
    RunTestCycle,
}

/// Authorize and execute an admin command, returning the reply text.
pub async fn handle_admin(
    lifecycle: &LotteryLifecycle,
    caller: UserId,
    command: AdminCommand,
) -> Result<String> {
    if !lifecycle.chat().is_administrator(caller).await? {
        return Err(LotteryError::Unauthorized);
    }
    info!(%caller, ?command, "admin command accepted");

    match command {
        AdminCommand::ForceOpen { special } => {
            let outcome = lifecycle.open(special).await?;
            Ok(match outcome {
                crate::lifecycle::OpenOutcome::Opened { edition } => {
                    format!("Entry window opened, edition n°{edition}.")
                }
                crate::lifecycle::OpenOutcome::AlreadyOpen => {
                    "Entry window is already open.".to_string()
                }
            })
        }
        AdminCommand::ForceClose { announce_now } => {
            let outcome = lifecycle.close(announce_now).await?;
            Ok(format!(
                "Entries closed: {} participant(s){}.",
                outcome.participant_count,
                if announce_now { ", result announced" } else { "" }
            ))
        }
        AdminCommand::ForceAnnounce => {
            let outcome = lifecycle.announce().await?;
            Ok(match outcome.winner {
                Some(winner) => format!("Result announced, winner {}.", winner.mention()),
                None => "No pending winner; no-winner notice posted.".to_string(),
            })
        }
        AdminCommand::SetEdition(edition) => {
            lifecycle.set_edition(edition).await?;
            Ok(format!("Edition counter set to {edition}."))
        }
        AdminCommand::SetLevel(user, level) => {
            lifecycle.set_level(user, level).await?;
            Ok(format!("Level of {} set to {level}.", user.mention()))
        }
        AdminCommand::RecordManualWin(user) => {
            let record = lifecycle.record_manual_win(user).await?;
            Ok(format!(
                "Manual win recorded for {}: level {} -> {}{}.",
                user.mention(),
                record.previous_level,
                record.new_level,
                if record.completed_cycle {
                    " (cycle completed)"
                } else {
                    ""
                }
            ))
        }
        AdminCommand::RemoveUserHistory(user) => {
            lifecycle.remove_user_history(user).await?;
            Ok(format!("History of {} removed.", user.mention()))
        }
        AdminCommand::ShowLevels => {
            let standings = lifecycle.level_standings().await;
            let mut rows = Vec::with_capacity(standings.len());
            for (user, level, wins) in standings {
                let handle = match lifecycle.chat().resolve_user(user).await? {
                    Some(handle) => handle,
                    None => user.mention(),
                };
                rows.push((handle, level, wins));
            }
            Ok(messages::leaderboard(&rows))
        }
        AdminCommand::ResetSoft => {
            lifecycle.reset(true).await?;
            Ok("Soft reset done: edition back to 1, win history kept.".to_string())
        }
        AdminCommand::ResetHard => {
            lifecycle.reset(false).await?;
            Ok("Hard reset done: state and win history cleared.".to_string())
        }
        AdminCommand::RunTestCycle => {
            lifecycle.open(false).await?;
            let outcome = lifecycle.close(true).await?;
            Ok(format!(
                "Test cycle complete: {} participant(s), winner {}.",
                outcome.participant_count,
                outcome
                    .winner
                    .map(|w| w.mention())
                    .unwrap_or_else(|| "none".to_string())
            ))
        }
    }
}
