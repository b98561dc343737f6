use serde::Serialize;

use super::{points::level_for_points, streak::Streak};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Badge {
    FirstCook,
    HomeCook,
    SeasonedChef,
    Critic,
    WeekStreak,
    RisingStar,
}

const BADGES: &[(Badge, &str, &str)] = &[
    (Badge::FirstCook, "First cook", "Cook your first recipe"),
    (Badge::HomeCook, "Home cook", "Cook 10 recipes"),
    (Badge::SeasonedChef, "Seasoned chef", "Cook 50 recipes"),
    (Badge::Critic, "Critic", "Rate 10 cooking sessions"),
    (Badge::WeekStreak, "On a roll", "Cook 7 days in a row"),
    (Badge::RisingStar, "Rising star", "Reach level 5"),
];

impl Badge {
    pub fn title(&self) -> &'static str {
        self.lookup().1
    }

    pub fn description(&self) -> &'static str {
        self.lookup().2
    }

    fn lookup(&self) -> &'static (Badge, &'static str, &'static str) {
        BADGES
            .iter()
            .find(|(badge, _, _)| badge == self)
            .unwrap_or(&BADGES[0])
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CookingTotals {
    pub sessions: i64,
    pub rated_sessions: i64,
    pub points: i64,
}

pub fn earned_badges(totals: &CookingTotals, streak: &Streak) -> Vec<Badge> {
    let checks = [
        (Badge::FirstCook, totals.sessions >= 1),
        (Badge::HomeCook, totals.sessions >= 10),
        (Badge::SeasonedChef, totals.sessions >= 50),
        (Badge::Critic, totals.rated_sessions >= 10),
        (Badge::WeekStreak, streak.longest >= 7),
        (Badge::RisingStar, level_for_points(totals.points) >= 5),
    ];

    checks
        .into_iter()
        .filter_map(|(badge, earned)| earned.then_some(badge))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nothing_for_new_user() {
        assert!(earned_badges(&CookingTotals::default(), &Streak::default()).is_empty());
    }

    #[test]
    fn thresholds() {
        let totals = CookingTotals {
            sessions: 12,
            rated_sessions: 3,
            points: 400,
        };
        let streak = Streak {
            current: 2,
            longest: 7,
        };

        assert_eq!(
            earned_badges(&totals, &streak),
            vec![
                Badge::FirstCook,
                Badge::HomeCook,
                Badge::WeekStreak,
                Badge::RisingStar
            ]
        );
    }

    #[test]
    fn every_badge_has_a_title() {
        assert_eq!(Badge::Critic.title(), "Critic");
        assert_eq!(Badge::WeekStreak.description(), "Cook 7 days in a row");
    }
}
