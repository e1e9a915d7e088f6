use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const EASY_XP_REWARD: i32 = 10;
pub const MEDIUM_XP_REWARD: i32 = 20;
pub const HARD_XP_REWARD: i32 = 30;

const EASY_POOL: &[&str] = &[
    "Send an opener to a new match",
    "Reply to a message within ten minutes",
    "Update one photo on your profile",
    "Ask an open-ended question in a chat",
    "React to a story instead of just liking it",
];

const MEDIUM_POOL: &[&str] = &[
    "Turn a dry conversation around with a playful tease",
    "Get a conversation past twenty messages",
    "Suggest moving a chat off the app",
    "Revive a conversation that went quiet for two days",
];

const HARD_POOL: &[&str] = &[
    "Propose a concrete date with day, time and place",
    "Get a voice message exchange going",
    "Land a date confirmation",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub fn xp_reward(self) -> i32 {
        match self {
            Difficulty::Easy => EASY_XP_REWARD,
            Difficulty::Medium => MEDIUM_XP_REWARD,
            Difficulty::Hard => HARD_XP_REWARD,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quest {
    pub id: String,
    pub title: String,
    pub difficulty: Difficulty,
    pub xp_reward: i32,
    pub completed: bool,
}

/// Builds the daily triple, one quest per difficulty. Selection is
/// deterministic in the day of month (`day % pool.len()`), so every load on
/// the same day yields the same titles; ids are fresh per generated set.
pub fn generate_daily_quests(day_of_month: u32) -> Vec<Quest> {
    let pick = |pool: &[&str], difficulty: Difficulty| {
        let title = pool[day_of_month as usize % pool.len()];
        Quest {
            id: Uuid::new_v4().to_string(),
            title: title.to_string(),
            difficulty,
            xp_reward: difficulty.xp_reward(),
            completed: false,
        }
    };

    vec![
        pick(EASY_POOL, Difficulty::Easy),
        pick(MEDIUM_POOL, Difficulty::Medium),
        pick(HARD_POOL, Difficulty::Hard),
    ]
}

/// A stored set is only reusable for the day it was generated on.
pub fn set_is_current(stored_date: Option<&str>, today: &str, quests: &[Quest]) -> bool {
    stored_date == Some(today) && !quests.is_empty()
}

/// Marks a quest complete and returns its XP reward. Missing ids and quests
/// already completed return None, so a double tap never grants twice.
pub fn complete_quest(quests: &mut [Quest], quest_id: &str) -> Option<i32> {
    let quest = quests.iter_mut().find(|q| q.id == quest_id)?;
    if quest.completed {
        return None;
    }
    quest.completed = true;
    Some(quest.xp_reward)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_daily_set_has_one_quest_per_difficulty() {
        let quests = generate_daily_quests(26);
        assert_eq!(quests.len(), 3);
        assert_eq!(quests[0].difficulty, Difficulty::Easy);
        assert_eq!(quests[1].difficulty, Difficulty::Medium);
        assert_eq!(quests[2].difficulty, Difficulty::Hard);
        assert!(quests.iter().all(|q| !q.completed));
        assert!(quests.iter().all(|q| q.xp_reward > 0));
    }

    #[test]
    fn test_same_day_yields_same_titles() {
        let a = generate_daily_quests(14);
        let b = generate_daily_quests(14);
        for (qa, qb) in a.iter().zip(&b) {
            assert_eq!(qa.title, qb.title);
            // ids are fresh per set
            assert_ne!(qa.id, qb.id);
        }
    }

    #[test]
    fn test_rewards_ordered_by_difficulty() {
        assert!(EASY_XP_REWARD < MEDIUM_XP_REWARD);
        assert!(MEDIUM_XP_REWARD < HARD_XP_REWARD);
    }

    #[test]
    fn test_complete_quest_grants_once() {
        let mut quests = generate_daily_quests(3);
        let id = quests[1].id.clone();

        assert_eq!(complete_quest(&mut quests, &id), Some(MEDIUM_XP_REWARD));
        assert!(quests[1].completed);
        assert_eq!(complete_quest(&mut quests, &id), None);
    }

    #[test]
    fn test_complete_unknown_quest_is_noop() {
        let mut quests = generate_daily_quests(3);
        assert_eq!(complete_quest(&mut quests, "no-such-id"), None);
        assert!(quests.iter().all(|q| !q.completed));
    }

    #[test]
    fn test_stored_set_reused_only_for_today() {
        let quests = generate_daily_quests(26);
        assert!(set_is_current(Some("2026-08-26"), "2026-08-26", &quests));
        assert!(!set_is_current(Some("2026-08-25"), "2026-08-26", &quests));
        assert!(!set_is_current(None, "2026-08-26", &quests));
        assert!(!set_is_current(Some("2026-08-26"), "2026-08-26", &[]));
    }

    #[test]
    fn test_quest_serializes_camel_case_and_screaming_difficulty() {
        let quests = generate_daily_quests(1);
        let json = serde_json::to_value(&quests[2]).unwrap();
        assert_eq!(json["difficulty"], "HARD");
        assert!(json.get("xpReward").is_some());
    }
}
