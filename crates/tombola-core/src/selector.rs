//! Winner selection policies.
//!
//! Base policy is an unbiased uniform draw. The weighted policy scores each
//! participant by how stale their last win is (never-won users score the
//! cap) optionally boosted for participants sitting at the lowest current
//! level, and supports a without-replacement double draw.
//!
//! All functions require a non-empty participant set; `close` guards the
//! empty case before calling in.

use crate::state::{LotteryState, UserId};
use rand::Rng;
use std::collections::BTreeSet;

/// Seconds per week, used by the staleness weight.
const WEEK_SECS: i64 = 7 * 24 * 60 * 60;

/// Multiplier applied to participants at the lowest current level among the
/// pool when the lowest-level boost is enabled.
pub const LOWEST_LEVEL_MULTIPLIER: f64 = 2.0;

/// Uniform draw over the participant set.
pub fn pick_one<R: Rng>(participants: &BTreeSet<UserId>, rng: &mut R) -> UserId {
    debug_assert!(!participants.is_empty(), "selector called with empty pool");
    let index = rng.gen_range(0..participants.len());
    // Index is in range by construction.
    #[allow(clippy::unwrap_used)]
    let picked = *participants.iter().nth(index).unwrap();
    picked
}

/// Draw proportional to `weight_fn`. Non-positive weights are treated as
/// zero; if every weight is zero the draw degrades to uniform.
pub fn pick_weighted<R, F>(participants: &BTreeSet<UserId>, weight_fn: F, rng: &mut R) -> UserId
where
    R: Rng,
    F: Fn(UserId) -> f64,
{
    debug_assert!(!participants.is_empty(), "selector called with empty pool");
    let weights: Vec<(UserId, f64)> = participants
        .iter()
        .map(|&u| (u, weight_fn(u).max(0.0)))
        .collect();
    let total: f64 = weights.iter().map(|(_, w)| w).sum();
    if total <= 0.0 {
        return pick_one(participants, rng);
    }

    let mut target = rng.gen_range(0.0..total);
    for (user, weight) in &weights {
        if target < *weight {
            return *user;
        }
        target -= weight;
    }
    // Floating point accumulation can land target on the boundary; the last
    // entry with non-zero weight takes it.
    weights
        .iter()
        .rev()
        .find(|(_, w)| *w > 0.0)
        .map(|(u, _)| *u)
        .unwrap_or_else(|| pick_one(participants, rng))
}

/// Without-replacement double draw: the second winner is drawn from the pool
/// minus the first, `None` when the pool had a single entrant.
pub fn pick_two_distinct<R, F>(
    participants: &BTreeSet<UserId>,
    weight_fn: F,
    rng: &mut R,
) -> (UserId, Option<UserId>)
where
    R: Rng,
    F: Fn(UserId) -> f64,
{
    let first = pick_weighted(participants, &weight_fn, rng);
    let mut rest = participants.clone();
    rest.remove(&first);
    if rest.is_empty() {
        (first, None)
    } else {
        (first, Some(pick_weighted(&rest, &weight_fn, rng)))
    }
}

/// Staleness factor: grows by one per full week since the user's last win,
/// capped at `cap_weeks`. Never-won users score the cap, so long-time
/// entrants and newcomers are favored alike.
pub fn staleness_weight(last_win_at: Option<i64>, now: i64, cap_weeks: u32) -> f64 {
    let weeks = match last_win_at {
        None => i64::from(cap_weeks),
        Some(last) => ((now - last).max(0) / WEEK_SECS).min(i64::from(cap_weeks)),
    };
    1.0 + weeks as f64
}

/// Lowest current level among the given participants.
pub fn lowest_level(state: &LotteryState, participants: &BTreeSet<UserId>) -> u8 {
    participants
        .iter()
        .map(|&u| state.level_of(u))
        .min()
        .unwrap_or(1)
}
