//! Gesture interpreter: finger state -> drawing action.
//!
//! The mapping is a table of rules checked in order; the first rule whose
//! finger set matches exactly wins. Adding a gesture means adding a
//! [`GestureKind`] and a row in [`GESTURE_RULES`].
//!
//! | Fingers extended        | Gesture |
//! |-------------------------|---------|
//! | thumb + index           | Draw    |
//! | thumb + index + middle  | Pause   |
//! | thumb + middle          | Erase   |
//! | thumb + pinky           | Clear   |
//! | index + middle          | Analyze |

use tracing::trace;

use crate::canvas::{CanvasDelta, StrokeStyle};
use crate::types::{Finger, FingerState, HandLandmarks, Point, landmark};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum GestureKind {
    /// Pen down at the index tip.
    Draw,
    /// Pen lifted; hand can move without drawing.
    Pause,
    /// Wide background-colored stroke at the middle tip.
    Erase,
    /// Wipe the whole canvas.
    Clear,
    /// Ask the model to interpret the canvas.
    Analyze,
    None,
}

impl GestureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draw => "DRAW",
            Self::Pause => "MOVE",
            Self::Erase => "ERASE",
            Self::Clear => "CLEAR",
            Self::Analyze => "ANALYZE",
            Self::None => "IDLE",
        }
    }
}

/// A gesture fires when exactly the listed fingers are extended.
pub struct GestureRule {
    pub kind: GestureKind,
    pub fingers: &'static [Finger],
}

impl GestureRule {
    pub fn matches(&self, state: &FingerState) -> bool {
        state.count() == self.fingers.len() && self.fingers.iter().all(|&f| state.is_extended(f))
    }
}

/// Checked top to bottom.
pub const GESTURE_RULES: &[GestureRule] = &[
    GestureRule { kind: GestureKind::Draw, fingers: &[Finger::Thumb, Finger::Index] },
    GestureRule { kind: GestureKind::Pause, fingers: &[Finger::Thumb, Finger::Index, Finger::Middle] },
    GestureRule { kind: GestureKind::Erase, fingers: &[Finger::Thumb, Finger::Middle] },
    GestureRule { kind: GestureKind::Clear, fingers: &[Finger::Thumb, Finger::Pinky] },
    GestureRule { kind: GestureKind::Analyze, fingers: &[Finger::Index, Finger::Middle] },
];

/// First matching rule, or `GestureKind::None`.
pub fn recognize(state: &FingerState) -> GestureKind {
    GESTURE_RULES
        .iter()
        .find(|rule| rule.matches(state))
        .map(|rule| rule.kind)
        .unwrap_or(GestureKind::None)
}

/// What to do with the pen anchor when no hand is in the frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum HandLossPolicy {
    /// Forget the anchor; the next stroke starts fresh.
    #[default]
    LiftPen,
    /// Keep the anchor; a returning hand continues the old stroke.
    Keep,
}

/// Result of one interpreter step.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GestureAction {
    pub kind: GestureKind,
    pub delta: Option<CanvasDelta>,
}

impl GestureAction {
    fn idle() -> Self {
        Self { kind: GestureKind::None, delta: None }
    }

    pub fn wants_analysis(&self) -> bool {
        self.kind == GestureKind::Analyze
    }
}

/// Holds the cursor anchor between frames.
pub struct GestureInterpreter {
    anchor: Option<Point>,
    draw_style: StrokeStyle,
    erase_style: StrokeStyle,
    hand_loss: HandLossPolicy,
}

impl GestureInterpreter {
    pub fn new(hand_loss: HandLossPolicy) -> Self {
        Self {
            anchor: None,
            draw_style: StrokeStyle::DRAW,
            erase_style: StrokeStyle::ERASE,
            hand_loss,
        }
    }

    pub fn anchor(&self) -> Option<Point> {
        self.anchor
    }

    /// Advance one frame. `hand` is None when nothing was detected.
    pub fn step(&mut self, hand: Option<(&HandLandmarks, &FingerState)>) -> GestureAction {
        let Some((hand, state)) = hand else {
            if self.hand_loss == HandLossPolicy::LiftPen {
                self.anchor = None;
            }
            return GestureAction::idle();
        };

        let kind = recognize(state);
        let delta = match kind {
            GestureKind::Draw => self.stroke_to(hand.point(landmark::INDEX_TIP), self.draw_style),
            GestureKind::Erase => self.stroke_to(hand.point(landmark::MIDDLE_TIP), self.erase_style),
            GestureKind::Pause => {
                self.anchor = None;
                None
            }
            GestureKind::Clear => Some(CanvasDelta::Clear),
            GestureKind::Analyze | GestureKind::None => None,
        };
        trace!(gesture = kind.as_str(), anchor = ?self.anchor, "gesture step");
        GestureAction { kind, delta }
    }

    // First point of a stroke only sets the anchor.
    fn stroke_to(&mut self, tip: Point, style: StrokeStyle) -> Option<CanvasDelta> {
        let from = self.anchor.replace(tip)?;
        Some(CanvasDelta::Segment { from, to: tip, style })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fingers::{classify, tests::hand_with};

    fn step_with(interp: &mut GestureInterpreter, pts: &[(i32, i32); 21]) -> GestureAction {
        let hand = HandLandmarks::from_pixels(pts).expect("hand");
        let state = classify(&hand);
        interp.step(Some((&hand, &state)))
    }

    fn moved_tip(mut pts: [(i32, i32); 21], tip: usize, to: (i32, i32)) -> [(i32, i32); 21] {
        pts[tip] = to;
        pts
    }

    #[test]
    fn table_covers_each_pattern() {
        let cases = [
            ([1, 1, 0, 0, 0], GestureKind::Draw),
            ([1, 1, 1, 0, 0], GestureKind::Pause),
            ([1, 0, 1, 0, 0], GestureKind::Erase),
            ([1, 0, 0, 0, 1], GestureKind::Clear),
            ([0, 1, 1, 0, 0], GestureKind::Analyze),
            ([0, 1, 0, 0, 0], GestureKind::None),
            ([1, 1, 1, 1, 1], GestureKind::None),
            ([0, 0, 0, 0, 0], GestureKind::None),
            ([1, 1, 0, 0, 1], GestureKind::None),
        ];
        for (bits, expected) in cases {
            assert_eq!(recognize(&FingerState::from_bits(bits)), expected, "{bits:?}");
        }
    }

    #[test]
    fn draw_sets_anchor_then_draws_one_segment() {
        let mut interp = GestureInterpreter::new(HandLossPolicy::LiftPen);
        let first = hand_with([1, 1, 0, 0, 0]);
        let a = step_with(&mut interp, &first);
        assert_eq!(a.kind, GestureKind::Draw);
        assert_eq!(a.delta, None);
        let start = Point::new(first[landmark::INDEX_TIP].0, first[landmark::INDEX_TIP].1);
        assert_eq!(interp.anchor(), Some(start));

        let second = moved_tip(first, landmark::INDEX_TIP, (150, 90));
        let b = step_with(&mut interp, &second);
        assert_eq!(
            b.delta,
            Some(CanvasDelta::Segment { from: start, to: Point::new(150, 90), style: StrokeStyle::DRAW })
        );
        assert_eq!(interp.anchor(), Some(Point::new(150, 90)));
    }

    #[test]
    fn pause_always_lifts_pen() {
        let mut interp = GestureInterpreter::new(HandLossPolicy::Keep);
        step_with(&mut interp, &hand_with([1, 1, 0, 0, 0]));
        assert!(interp.anchor().is_some());
        let a = step_with(&mut interp, &hand_with([1, 1, 1, 0, 0]));
        assert_eq!(a.kind, GestureKind::Pause);
        assert_eq!(interp.anchor(), None);
        step_with(&mut interp, &hand_with([1, 1, 1, 0, 0]));
        assert_eq!(interp.anchor(), None);
    }

    #[test]
    fn erase_chains_at_middle_tip_with_wide_stroke() {
        let mut interp = GestureInterpreter::new(HandLossPolicy::LiftPen);
        let first = hand_with([1, 0, 1, 0, 0]);
        step_with(&mut interp, &first);
        let second = moved_tip(first, landmark::MIDDLE_TIP, (40, 40));
        match step_with(&mut interp, &second).delta {
            Some(CanvasDelta::Segment { to, style, .. }) => {
                assert_eq!(to, Point::new(40, 40));
                assert_eq!(style, StrokeStyle::ERASE);
            }
            other => panic!("expected erase segment, got {other:?}"),
        }
    }

    #[test]
    fn clear_leaves_anchor_alone() {
        let mut interp = GestureInterpreter::new(HandLossPolicy::LiftPen);
        step_with(&mut interp, &hand_with([1, 1, 0, 0, 0]));
        let before = interp.anchor();
        let a = step_with(&mut interp, &hand_with([1, 0, 0, 0, 1]));
        assert_eq!(a.delta, Some(CanvasDelta::Clear));
        assert_eq!(interp.anchor(), before);
    }

    #[test]
    fn analyze_does_not_touch_canvas_or_anchor() {
        let mut interp = GestureInterpreter::new(HandLossPolicy::LiftPen);
        step_with(&mut interp, &hand_with([1, 1, 0, 0, 0]));
        let before = interp.anchor();
        let a = step_with(&mut interp, &hand_with([0, 1, 1, 0, 0]));
        assert!(a.wants_analysis());
        assert_eq!(a.delta, None);
        assert_eq!(interp.anchor(), before);
    }

    #[test]
    fn unknown_gesture_keeps_anchor() {
        let mut interp = GestureInterpreter::new(HandLossPolicy::LiftPen);
        step_with(&mut interp, &hand_with([1, 1, 0, 0, 0]));
        let before = interp.anchor();
        let a = step_with(&mut interp, &hand_with([1, 1, 1, 1, 1]));
        assert_eq!(a, GestureAction::idle());
        assert_eq!(interp.anchor(), before);
    }

    #[test]
    fn hand_loss_policy_decides_anchor_fate() {
        let mut lift = GestureInterpreter::new(HandLossPolicy::LiftPen);
        step_with(&mut lift, &hand_with([1, 1, 0, 0, 0]));
        lift.step(None);
        assert_eq!(lift.anchor(), None);

        let mut keep = GestureInterpreter::new(HandLossPolicy::Keep);
        step_with(&mut keep, &hand_with([1, 1, 0, 0, 0]));
        let before = keep.anchor();
        assert_eq!(keep.step(None), GestureAction::idle());
        assert_eq!(keep.anchor(), before);
    }
}
