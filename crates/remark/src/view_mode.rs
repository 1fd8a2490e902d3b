//! Which renderer consumes the day sequence, and the pinch gesture that
//! switches between them.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::debug;

/// Distance change, in pixels, a pinch needs before it switches modes.
pub const DEFAULT_PINCH_THRESHOLD: f32 = 30.0;

/// Ordered from the widest unit of display to the narrowest.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum ViewMode {
    Calendar,
    #[default]
    Grid,
    List,
}

impl ViewMode {
    pub const ALL: [ViewMode; 3] = [ViewMode::Calendar, ViewMode::Grid, ViewMode::List];

    /// One step narrower. `None` at [`ViewMode::List`].
    pub fn inward(self) -> Option<Self> {
        match self {
            ViewMode::Calendar => Some(ViewMode::Grid),
            ViewMode::Grid => Some(ViewMode::List),
            ViewMode::List => None,
        }
    }

    /// One step wider. `None` at [`ViewMode::Calendar`].
    pub fn outward(self) -> Option<Self> {
        match self {
            ViewMode::List => Some(ViewMode::Grid),
            ViewMode::Grid => Some(ViewMode::Calendar),
            ViewMode::Calendar => None,
        }
    }

    /// The manual cycle, which wraps around.
    pub fn cycled(self) -> Self {
        self.inward().unwrap_or(ViewMode::Calendar)
    }

    pub fn name(self) -> &'static str {
        match self {
            ViewMode::Calendar => "Calendar",
            ViewMode::Grid => "Grid",
            ViewMode::List => "List",
        }
    }
}

impl fmt::Display for ViewMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ViewMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ViewMode::ALL
            .into_iter()
            .find(|mode| mode.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown view mode '{s}'"))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionDirection {
    /// Towards a narrower mode
    Forward,
    Backward,
}

impl TransitionDirection {
    pub fn between(from: ViewMode, to: ViewMode) -> Self {
        if to > from {
            TransitionDirection::Forward
        } else {
            TransitionDirection::Backward
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModeTransition {
    pub from: ViewMode,
    pub to: ViewMode,
    pub direction: TransitionDirection,
}

impl ModeTransition {
    fn new(from: ViewMode, to: ViewMode) -> Self {
        Self {
            from,
            to,
            direction: TransitionDirection::between(from, to),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TouchPoint {
    pub x: f32,
    pub y: f32,
}

impl TouchPoint {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn distance(&self, other: &TouchPoint) -> f32 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

/// Raw touch input, as the host's gesture recognizer reports it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GestureEvent<'a> {
    /// The active touch points moved.
    Move(&'a [TouchPoint]),
    /// Fingers lifted.
    Release,
    /// Something else took the gesture over.
    Terminate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PinchStep {
    In,
    Out,
}

/// Latched-baseline pinch detector.
///
/// The first sample of a gesture becomes the baseline. A sample that moves
/// more than `threshold` away from it produces a step and clears the
/// baseline, so the sample after that starts a fresh measurement.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PinchTracker {
    threshold: f32,
    start_dist: Option<f32>,
}

impl Default for PinchTracker {
    fn default() -> Self {
        Self::new(DEFAULT_PINCH_THRESHOLD)
    }
}

impl PinchTracker {
    pub fn new(threshold: f32) -> Self {
        Self {
            threshold: threshold.abs(),
            start_dist: None,
        }
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    pub fn baseline(&self) -> Option<f32> {
        self.start_dist
    }

    pub fn clear(&mut self) {
        self.start_dist = None;
    }

    pub fn sample(&mut self, dist: f32) -> Option<PinchStep> {
        let Some(start) = self.start_dist else {
            self.start_dist = Some(dist);
            return None;
        };

        let delta = dist - start;
        let step = if delta > self.threshold {
            PinchStep::In
        } else if delta < -self.threshold {
            PinchStep::Out
        } else {
            return None;
        };

        self.start_dist = None;
        Some(step)
    }
}

/// The calendar / grid / list mode state machine.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewModeMachine {
    mode: ViewMode,
    pinch: PinchTracker,
}

impl Default for ViewModeMachine {
    fn default() -> Self {
        Self::new(ViewMode::default(), DEFAULT_PINCH_THRESHOLD)
    }
}

impl ViewModeMachine {
    pub fn new(mode: ViewMode, pinch_threshold: f32) -> Self {
        Self {
            mode,
            pinch: PinchTracker::new(pinch_threshold),
        }
    }

    pub fn mode(&self) -> ViewMode {
        self.mode
    }

    pub fn pinch(&self) -> &PinchTracker {
        &self.pinch
    }

    /// Feed one gesture event. Only two-finger moves can switch modes; any
    /// other touch count interrupts the pinch like a release does.
    pub fn handle_gesture(&mut self, event: GestureEvent<'_>) -> Option<ModeTransition> {
        let points = match event {
            GestureEvent::Move(points) => points,
            GestureEvent::Release | GestureEvent::Terminate => {
                self.pinch.clear();
                return None;
            }
        };

        let [a, b] = points else {
            self.pinch.clear();
            return None;
        };

        // a step at either end of the order is swallowed, its baseline is
        // already gone
        let next = match self.pinch.sample(a.distance(b))? {
            PinchStep::In => self.mode.inward(),
            PinchStep::Out => self.mode.outward(),
        };

        self.transition_to(next?)
    }

    /// The header button: Calendar, Grid, List, then back to Calendar.
    pub fn cycle(&mut self) -> ModeTransition {
        let to = self.mode.cycled();
        let from = self.mode;
        self.pinch.clear();
        self.mode = to;
        debug!("ViewModeMachine::cycle: {:?} => {:?}", from, to);
        ModeTransition::new(from, to)
    }

    /// What the manual cycle button should read: the mode it switches to.
    pub fn button_label(&self) -> &'static str {
        self.mode.cycled().name()
    }

    fn transition_to(&mut self, to: ViewMode) -> Option<ModeTransition> {
        self.pinch.clear();
        if to == self.mode {
            return None;
        }

        let transition = ModeTransition::new(self.mode, to);
        debug!("ViewModeMachine: {:?} => {:?}", self.mode, to);
        self.mode = to;
        Some(transition)
    }
}
