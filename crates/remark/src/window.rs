use std::fmt;

use crate::DayId;

/// An inclusive range of days kept fresh by a live subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Window {
    start: DayId,
    end: DayId,
}

impl Window {
    /// Endpoints may be given in either order.
    pub fn new(a: DayId, b: DayId) -> Self {
        if a <= b {
            Self { start: a, end: b }
        } else {
            Self { start: b, end: a }
        }
    }

    /// The `days` most recent days ending at `today`. A zero length still
    /// covers `today`.
    pub fn trailing(today: DayId, days: u32) -> Self {
        let back = u64::from(days.saturating_sub(1));
        let start = today
            .checked_days_ago(back)
            .unwrap_or_else(DayId::earliest);
        Self { start, end: today }
    }

    pub fn start(&self) -> DayId {
        self.start
    }

    pub fn end(&self) -> DayId {
        self.end
    }

    pub fn contains(&self, id: DayId) -> bool {
        self.start <= id && id <= self.end
    }

    /// Smallest window covering both.
    pub fn hull(&self, other: &Window) -> Window {
        Window {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }

    /// Every day in the window, oldest first.
    pub fn days(&self) -> impl Iterator<Item = DayId> {
        let end = self.end;
        std::iter::successors(Some(self.start), |id| id.next()).take_while(move |id| *id <= end)
    }

    pub fn num_days(&self) -> i64 {
        (self.end.date() - self.start.date()).num_days() + 1
    }
}

impl fmt::Display for Window {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.start, self.end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(s: &str) -> DayId {
        s.parse().unwrap()
    }

    #[test]
    fn trailing_window_ends_today() {
        let w = Window::trailing(day("2024-06-30"), 120);
        assert_eq!(w.end(), day("2024-06-30"));
        assert_eq!(w.start(), day("2024-03-03"));
        assert_eq!(w.num_days(), 120);
        assert!(w.contains(day("2024-06-01")));
        assert!(!w.contains(day("2024-03-02")));
        assert!(!w.contains(day("2024-07-01")));
    }

    #[test]
    fn days_walk_the_window_oldest_first() {
        let w = Window::new(day("2024-03-01"), day("2024-02-27"));
        let days: Vec<DayId> = w.days().collect();
        assert_eq!(
            days,
            vec![
                day("2024-02-27"),
                day("2024-02-28"),
                day("2024-02-29"),
                day("2024-03-01"),
            ]
        );
        assert_eq!(days.len() as i64, w.num_days());
    }

    #[test]
    fn zero_length_covers_today() {
        let w = Window::trailing(day("2024-06-30"), 0);
        assert_eq!(w.num_days(), 1);
    }

    #[test]
    fn new_orders_endpoints_and_hull_covers_both() {
        let a = Window::new(day("2024-05-10"), day("2024-05-01"));
        assert_eq!(a.start(), day("2024-05-01"));
        let b = Window::new(day("2024-04-01"), day("2024-05-05"));
        let h = a.hull(&b);
        assert_eq!(h, Window::new(day("2024-04-01"), day("2024-05-10")));
        assert_eq!(h.to_string(), "[2024-04-01, 2024-05-10]");
    }
}
