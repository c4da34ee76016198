//! Score, cleared-row count and gravity period

use crate::settings::GameplaySettings;

/// Scoring and speed-up policy
#[derive(Debug, Clone, PartialEq)]
pub struct ScorePolicy {
    pub points_per_row: u64,
    pub rows_per_speedup: u32,
    pub start_period_ms: f64,
    pub min_period_ms: f64,
    pub period_step_ms: f64,
}

impl From<&GameplaySettings> for ScorePolicy {
    fn from(settings: &GameplaySettings) -> Self {
        Self {
            points_per_row: settings.points_per_row,
            rows_per_speedup: settings.rows_per_speedup,
            start_period_ms: settings.fall_period_ms,
            min_period_ms: settings.min_period_ms,
            period_step_ms: settings.period_step_ms,
        }
    }
}

impl Default for ScorePolicy {
    fn default() -> Self {
        Self::from(&GameplaySettings::default())
    }
}

/// Scoring state
#[derive(Debug, Clone)]
pub struct Score {
    /// Current score
    pub points: u64,
    /// Total rows cleared this game
    pub rows_cleared: u32,
    /// Gravity period in milliseconds
    pub fall_period: f64,
    /// Best score seen, including this game
    pub high_score: u64,
    policy: ScorePolicy,
}

impl Default for Score {
    fn default() -> Self {
        Self::new(ScorePolicy::default())
    }
}

impl Score {
    pub fn new(policy: ScorePolicy) -> Self {
        Self {
            points: 0,
            rows_cleared: 0,
            fall_period: policy.start_period_ms,
            high_score: 0,
            policy,
        }
    }

    /// Credit one cleared row. Every `rows_per_speedup` rows the gravity
    /// period shortens by one step, never below the minimum.
    pub fn credit_row(&mut self) {
        self.points += self.policy.points_per_row;
        self.rows_cleared += 1;

        if self.policy.rows_per_speedup > 0 && self.rows_cleared % self.policy.rows_per_speedup == 0 {
            self.fall_period = (self.fall_period - self.policy.period_step_ms).max(self.policy.min_period_ms);
            tracing::debug!(period = self.fall_period, "gravity sped up");
        }

        self.high_score = self.high_score.max(self.points);
    }

    /// Period to use this tick; soft drop runs at the minimum period
    pub fn effective_period(&self, soft_drop: bool) -> f64 {
        if soft_drop {
            self.policy.min_period_ms
        } else {
            self.fall_period
        }
    }

    pub fn reset_period(&mut self) {
        self.fall_period = self.policy.start_period_ms;
    }

    /// Fresh game; the high score survives
    pub fn reset(&mut self) {
        self.points = 0;
        self.rows_cleared = 0;
        self.reset_period();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_row() {
        let mut score = Score::default();
        score.credit_row();
        assert_eq!(score.points, 40);
        assert_eq!(score.rows_cleared, 1);
        assert_eq!(score.fall_period, 1000.0);
        assert_eq!(score.high_score, 40);
    }

    #[test]
    fn test_speed_up_every_fourth_row() {
        let mut score = Score::default();
        for _ in 0..3 {
            score.credit_row();
        }
        assert_eq!(score.fall_period, 1000.0);
        score.credit_row();
        assert_eq!(score.fall_period, 950.0);
        for _ in 0..4 {
            score.credit_row();
        }
        assert_eq!(score.fall_period, 900.0);
        assert_eq!(score.points, 8 * 40);
    }

    #[test]
    fn test_period_floor() {
        let mut score = Score::default();
        for _ in 0..400 {
            score.credit_row();
        }
        assert_eq!(score.fall_period, 50.0);
    }

    #[test]
    fn test_soft_drop_period() {
        let score = Score::default();
        assert_eq!(score.effective_period(true), 50.0);
        assert_eq!(score.effective_period(false), 1000.0);
    }

    #[test]
    fn test_reset_keeps_high_score() {
        let mut score = Score::default();
        score.high_score = 500;
        for _ in 0..4 {
            score.credit_row();
        }
        score.reset();
        assert_eq!(score.points, 0);
        assert_eq!(score.rows_cleared, 0);
        assert_eq!(score.fall_period, 1000.0);
        assert_eq!(score.high_score, 500);
    }
}
