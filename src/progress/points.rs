use serde::Serialize;

use crate::constants::{
    POINTS_PER_LEVEL_STEP, SESSION_BASE_POINTS, SESSION_NOTES_BONUS, SESSION_RATING_BONUS,
    SESSION_TIME_BONUS_CAP, SESSION_TIME_BONUS_MINUTES,
};

fn isqrt(n: u64) -> u64 {
    let mut root = (n as f64).sqrt() as u64;
    while root * root > n {
        root -= 1;
    }
    while (root + 1) * (root + 1) <= n {
        root += 1;
    }
    root
}

/// `floor(sqrt(points / 25)) + 1`, negative points count as zero.
pub fn level_for_points(points: i64) -> u32 {
    let steps = points.max(0) as u64 / POINTS_PER_LEVEL_STEP as u64;
    isqrt(steps) as u32 + 1
}

/// Smallest point total that reaches `level`, saturating at `i64::MAX`.
pub fn points_for_level(level: u32) -> i64 {
    let n = level.saturating_sub(1) as i64;
    POINTS_PER_LEVEL_STEP.saturating_mul(n).saturating_mul(n)
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LevelProgress {
    pub points: i64,
    pub level: u32,
    pub level_floor: i64,
    pub next_level_at: i64,
    /// Share of the way from the current level to the next, `0.0..1.0`.
    pub progress: f64,
}

impl LevelProgress {
    pub fn from_points(points: i64) -> Self {
        let points = points.max(0);
        let level = level_for_points(points);
        let level_floor = points_for_level(level);
        let next_level_at = points_for_level(level.saturating_add(1));
        let span = next_level_at - level_floor;
        let progress = if span > 0 {
            ((points - level_floor) as f64 / span as f64).clamp(0.0, 1.0)
        } else {
            1.0
        };

        Self {
            points,
            level,
            level_floor,
            next_level_at,
            progress,
        }
    }
}

/// Points awarded for logging one cooking session.
pub fn session_points(rated: bool, has_notes: bool, time_spent: i32) -> i64 {
    let time_bonus =
        (time_spent.max(0) as i64 / SESSION_TIME_BONUS_MINUTES).min(SESSION_TIME_BONUS_CAP);

    SESSION_BASE_POINTS
        + if rated { SESSION_RATING_BONUS } else { 0 }
        + if has_notes { SESSION_NOTES_BONUS } else { 0 }
        + time_bonus
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn huge_totals_saturate() {
        let progress = LevelProgress::from_points(i64::MAX);
        assert!(progress.level > 1);
        assert!(progress.level_floor <= progress.points);
        assert!(progress.next_level_at >= progress.level_floor);
        assert!((0.0..=1.0).contains(&progress.progress));
        assert_eq!(points_for_level(u32::MAX), i64::MAX);
    }

    #[test]
    fn closed_form_samples() {
        assert_eq!(level_for_points(0), 1);
        assert_eq!(level_for_points(24), 1);
        assert_eq!(level_for_points(25), 2);
        assert_eq!(level_for_points(99), 2);
        assert_eq!(level_for_points(100), 3);
        assert_eq!(level_for_points(225), 4);
        assert_eq!(level_for_points(2500), 11);
    }

    #[test]
    fn negative_points_clamp() {
        assert_eq!(level_for_points(-500), 1);
        assert_eq!(LevelProgress::from_points(-3).points, 0);
    }

    #[test]
    fn monotonic() {
        let mut last = 0;
        for points in 0..5000 {
            let level = level_for_points(points);
            assert!(level >= last);
            last = level;
        }
    }

    #[test]
    fn thresholds_match_levels() {
        for level in 1..40 {
            let at = points_for_level(level);
            assert_eq!(level_for_points(at), level);
            if at > 0 {
                assert_eq!(level_for_points(at - 1), level - 1);
            }
        }
    }

    #[test]
    fn progress_between_levels() {
        let progress = LevelProgress::from_points(62);
        assert_eq!(progress.level, 2);
        assert_eq!(progress.level_floor, 25);
        assert_eq!(progress.next_level_at, 100);
        assert!((progress.progress - 37.0 / 75.0).abs() < 1e-9);
    }

    #[test]
    fn session_awards() {
        assert_eq!(session_points(false, false, 0), 10);
        assert_eq!(session_points(true, true, 25), 22);
        assert_eq!(session_points(false, false, 600), 20);
        assert_eq!(session_points(false, false, -5), 10);
    }
}
