//! Announcement text rendering.
//!
//! Pure string builders; the exact prose is flavor, but each message must
//! carry its load-bearing facts (edition label, prize table, participant
//! count, level and reward of the winner).

use chrono::{DateTime, FixedOffset};
use tombola_core::{BonusRecord, PrizeTier, WinRecord};

/// Entry announcement posted by `open`. Entrants react to this message.
pub fn entry_announcement(edition: u64, marker: &str, bonus: bool) -> String {
    let mut text = format!(
        "[ WEEKLY RAFFLE — edition n°{edition} ]\n\n\
         The raffle is officially open! React with {marker} to this message \
         to enter the draw.\n\n\
         Prizes:\n\
         - 1st win: 100,000 Kama\n\
         - 2nd win: Guild Shield (already owned? 250,000 Kama instead)\n\
         - 3rd win: 500,000 Kama (levels reset)\n"
    );
    if bonus {
        text.push_str(
            "\nBonus edition: levels are untouched this week, the reward is \
             drawn from the bonus pool instead.\n",
        );
    }
    text.push_str("\nGood luck!");
    text
}

/// Closing summary posted by `close`.
pub fn closing_summary(participant_count: usize) -> String {
    match participant_count {
        0 => "RAFFLE CLOSED — no valid participants this week.".to_string(),
        n => format!(
            "RAFFLE CLOSED — {n} ticket{} collected. The winner will be \
             announced at the usual time.",
            if n == 1 { "" } else { "s" }
        ),
    }
}

/// Reward copy for a regular win.
pub fn reward_copy(record: &WinRecord, has_flagged_status: bool) -> String {
    match record.tier {
        PrizeTier::Small => "100,000 Kama".to_string(),
        PrizeTier::Medium if has_flagged_status => {
            "250,000 Kama (Guild Shield already owned)".to_string()
        }
        PrizeTier::Medium => "Guild Shield".to_string(),
        PrizeTier::Large => "500,000 Kama (levels reset)".to_string(),
    }
}

/// Winner announcement posted by `announce` for a regular edition.
pub fn winner_announcement(
    edition: u64,
    handle: &str,
    record: &WinRecord,
    has_flagged_status: bool,
) -> String {
    format!(
        "[ OFFICIAL DRAW — edition n°{edition} ]\n\n\
         Winner: {handle}\n\
         Level: {}\n\
         Reward: {}\n\n\
         Next draw opens Wednesday at midnight!",
        record.previous_level,
        reward_copy(record, has_flagged_status)
    )
}

/// Winner announcement for a bonus edition.
pub fn bonus_winner_announcement(edition: u64, handle: &str, record: &BonusRecord) -> String {
    let extra = if record.veteran_extra > 0 {
        format!(" (+{} veteran bonus)", record.veteran_extra)
    } else {
        String::new()
    };
    format!(
        "[ BONUS DRAW — edition n°{edition} ]\n\n\
         Winner: {handle}\n\
         Reward: {} Kama{extra}\n\n\
         Levels were untouched this week. Next draw opens Wednesday at midnight!",
        record.total()
    )
}

/// Posted when `announce` finds no pending winner.
pub fn no_winner_notice() -> String {
    "No valid participants this week — no winner drawn. Back on Wednesday!".to_string()
}

/// One-line audit trail posted after the winner announcement.
pub fn quick_register(edition: u64, handle: &str, record: &WinRecord) -> String {
    format!(
        "Register — edition n°{edition} | winner: {handle} | level {} -> {}",
        record.previous_level, record.new_level
    )
}

/// Service-online notice posted at startup.
pub fn startup_notice(next_open: DateTime<FixedOffset>) -> String {
    format!(
        "Raffle service online. Next scheduled opening: {}.",
        next_open.format("%a %d/%m %H:%M")
    )
}

/// Leaderboard rendered by the show-levels admin command.
///
/// `entries` is (handle, level, total wins), already sorted.
pub fn leaderboard(entries: &[(String, u8, u64)]) -> String {
    if entries.is_empty() {
        return "No levels recorded yet.".to_string();
    }
    let mut text = String::from("Current levels:\n");
    for (handle, level, wins) in entries {
        text.push_str(&format!("{handle} — level {level} ({wins} wins)\n"));
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use tombola_core::PrizeTier;

    fn record(tier: PrizeTier, previous: u8) -> WinRecord {
        WinRecord {
            previous_level: previous,
            new_level: if previous == 3 { 1 } else { previous + 1 },
            tier,
            completed_cycle: previous == 3,
        }
    }

    #[test]
    fn entry_announcement_carries_edition_label() {
        let text = entry_announcement(5, "\u{2705}", false);
        assert!(text.contains("edition n°5"));
        assert!(!text.contains("Bonus edition"));
        assert!(entry_announcement(5, "\u{2705}", true).contains("Bonus edition"));
    }

    #[test]
    fn reward_copy_follows_tier_and_status() {
        assert_eq!(reward_copy(&record(PrizeTier::Small, 1), false), "100,000 Kama");
        assert_eq!(reward_copy(&record(PrizeTier::Medium, 2), false), "Guild Shield");
        assert!(reward_copy(&record(PrizeTier::Medium, 2), true).contains("250,000"));
        assert!(reward_copy(&record(PrizeTier::Large, 3), false).contains("500,000"));
    }

    #[test]
    fn closing_summary_counts() {
        assert!(closing_summary(0).contains("no valid participants"));
        assert!(closing_summary(1).contains("1 ticket"));
        assert!(closing_summary(3).contains("3 tickets"));
    }
}
