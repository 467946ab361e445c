//! Per-shortcut attempt counters and the session score.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::config::DEFAULT_SUCCESS_REWARD;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShortcutProgress {
    pub shortcut_id: String,
    pub attempts: u32,
    /// Never exceeds `attempts`.
    pub successes: u32,
    pub last_attempt_ms: Option<u64>,
}

impl ShortcutProgress {
    fn new(shortcut_id: &str) -> Self {
        Self {
            shortcut_id: shortcut_id.to_string(),
            attempts: 0,
            successes: 0,
            last_attempt_ms: None,
        }
    }

    /// `successes / attempts`, or `0.0` before the first attempt.
    pub fn mastery_ratio(&self) -> f64 {
        if self.attempts == 0 {
            0.0
        } else {
            f64::from(self.successes) / f64::from(self.attempts)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressTracker {
    entries: BTreeMap<String, ShortcutProgress>,
    score: u64,
    success_reward: u64,
}

impl Default for ProgressTracker {
    fn default() -> Self {
        Self::new(DEFAULT_SUCCESS_REWARD)
    }
}

impl ProgressTracker {
    pub fn new(success_reward: u64) -> Self {
        Self {
            entries: BTreeMap::new(),
            score: 0,
            success_reward,
        }
    }

    /// Records one attempt at `shortcut_id`, creating its entry on first use.
    ///
    /// Successful attempts also add the fixed reward to the score.
    pub fn record_attempt(
        &mut self,
        shortcut_id: &str,
        success: bool,
        at_ms: u64,
    ) -> &ShortcutProgress {
        if success {
            self.score = self.score.saturating_add(self.success_reward);
        }

        let entry = self
            .entries
            .entry(shortcut_id.to_string())
            .or_insert_with(|| ShortcutProgress::new(shortcut_id));
        entry.attempts = entry.attempts.saturating_add(1);
        if success && entry.successes < entry.attempts {
            entry.successes += 1;
        }
        entry.last_attempt_ms = Some(at_ms);
        entry
    }

    pub fn progress(&self, shortcut_id: &str) -> Option<&ShortcutProgress> {
        self.entries.get(shortcut_id)
    }

    pub fn mastery_ratio(&self, shortcut_id: &str) -> f64 {
        self.entries
            .get(shortcut_id)
            .map(ShortcutProgress::mastery_ratio)
            .unwrap_or(0.0)
    }

    /// All recorded entries, ordered by shortcut id.
    pub fn entries(&self) -> impl Iterator<Item = &ShortcutProgress> {
        self.entries.values()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn score(&self) -> u64 {
        self.score
    }

    /// Clears every entry and zeroes the score.
    pub fn reset(&mut self) {
        self.entries.clear();
        self.score = 0;
    }
}
