use std::collections::BTreeSet;

use chrono::NaiveDate;
use serde::Serialize;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Streak {
    pub current: u32,
    pub longest: u32,
}

/// Runs of consecutive cooking days.
///
/// The current streak stays alive through `today` if the last cooking day
/// was yesterday, so it doesn't reset before the user had a chance to cook.
pub fn streak<I>(days: I, today: NaiveDate) -> Streak
where
    I: IntoIterator<Item = NaiveDate>,
{
    let days: BTreeSet<NaiveDate> = days.into_iter().filter(|day| *day <= today).collect();

    let mut longest = 0;
    let mut run = 0;
    let mut previous: Option<NaiveDate> = None;
    for day in &days {
        run = match previous {
            Some(prev) if prev.succ_opt() == Some(*day) => run + 1,
            _ => 1,
        };
        longest = longest.max(run);
        previous = Some(*day);
    }

    let yesterday = today.pred_opt();
    let current = match previous {
        Some(last) if last == today || Some(last) == yesterday => run,
        _ => 0,
    };

    Streak { current, longest }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, d).unwrap()
    }

    #[test]
    fn empty_history() {
        assert_eq!(streak(vec![], day(10)), Streak::default());
    }

    #[test]
    fn current_run_through_today() {
        let s = streak(vec![day(8), day(9), day(10), day(10)], day(10));
        assert_eq!(s, Streak { current: 3, longest: 3 });
    }

    #[test]
    fn yesterday_keeps_streak() {
        let s = streak(vec![day(7), day(8), day(9)], day(10));
        assert_eq!(s.current, 3);
    }

    #[test]
    fn gap_breaks_current_but_keeps_longest() {
        let s = streak(vec![day(1), day(2), day(3), day(4), day(7)], day(10));
        assert_eq!(s, Streak { current: 0, longest: 4 });
    }

    #[test]
    fn unordered_input() {
        let s = streak(vec![day(10), day(8), day(9), day(2)], day(10));
        assert_eq!(s, Streak { current: 3, longest: 3 });
    }
}
