//! Horizontal swipe between neighbouring days on the detail view.

use crate::DayId;

/// Horizontal travel before a drag is claimed as a day swipe.
pub const CLAIM_DX: f32 = 20.0;
/// Travel that completes a swipe on release.
pub const SWIPE_DX: f32 = 60.0;
/// Release velocity, in px/ms, that completes a swipe regardless of travel.
pub const SWIPE_VX: f32 = 0.25;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwipeDirection {
    /// Finger moved left: the day before.
    Prev,
    Next,
}

impl SwipeDirection {
    pub fn delta(self) -> i64 {
        match self {
            SwipeDirection::Prev => -1,
            SwipeDirection::Next => 1,
        }
    }
}

/// Should a drag with this much travel so far be treated as a day swipe?
/// Mostly-vertical drags belong to the scroll view.
pub fn claims_drag(dx: f32, dy: f32) -> bool {
    dx.abs() > CLAIM_DX && dx.abs() > dy.abs()
}

/// Classify a released drag by total travel `dx` and velocity `vx`.
pub fn classify_release(dx: f32, vx: f32) -> Option<SwipeDirection> {
    if dx <= -SWIPE_DX || vx <= -SWIPE_VX {
        Some(SwipeDirection::Prev)
    } else if dx >= SWIPE_DX || vx >= SWIPE_VX {
        Some(SwipeDirection::Next)
    } else {
        None
    }
}

/// The day a swipe lands on. Swiping into the future is refused the same way
/// future calendar cells are not navigable.
pub fn swipe_target(current: DayId, direction: SwipeDirection, today: DayId) -> Option<DayId> {
    let target = current.checked_shift(direction.delta())?;
    if target.is_future(today) {
        return None;
    }
    Some(target)
}
