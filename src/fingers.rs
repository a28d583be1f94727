//! Finger state classifier.
//!
//! Purely geometric and frame-local: each fingertip is compared with the
//! landmark two joints back on the same finger. There is no smoothing, so a
//! finger held right at the threshold can flip between frames.

use crate::types::{Finger, FingerState, HandLandmarks, Point};

/// Classify which fingers are extended.
///
/// * Thumb: extended when the tip is left of its MCP joint (x smaller). The
///   feed is mirrored, so this reads as "thumb sticking out" for a right hand.
/// * Other fingers: extended when the tip is above its PIP joint (y smaller).
pub fn classify(hand: &HandLandmarks) -> FingerState {
    let mut state = [false; 5];
    for finger in Finger::ALL {
        let tip_id = finger.tip();
        let tip = hand.point(tip_id);
        let base = hand.point(tip_id - 2);
        state[finger as usize] = match finger {
            Finger::Thumb => tip.x < base.x,
            _ => tip.y < base.y,
        };
    }
    FingerState(state)
}

/// Tip positions of the extended fingers, for the on-frame markers.
pub fn extended_tips(hand: &HandLandmarks, state: &FingerState) -> Vec<Point> {
    Finger::ALL
        .iter()
        .filter(|&&f| state.is_extended(f))
        .map(|&f| hand.point(f.tip()))
        .collect()
}
