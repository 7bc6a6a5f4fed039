//! Touch gesture disambiguation for the payment calendar.
//!
//! Consumes raw touch-start/move/end sequences and decides, at touch-end,
//! whether the interaction was a horizontal swipe (month navigation) or a
//! two-finger pinch (visual zoom only). Pure state machine with no browser
//! types so it runs identically under wasm and in native tests.

use serde::{Deserialize, Serialize};

/// One contact point, in CSS pixels
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TouchPoint {
    pub x: f64,
    pub y: f64,
}

/// Discrete action emitted at touch-end
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GestureAction {
    /// Rightward swipe: show the previous month
    NavigatePrevious,
    /// Leftward swipe: show the next month
    NavigateNext,
    /// Pinch finished; reset any visual scale transform back to 1
    PinchEnded,
}

/// Movement thresholds for gesture disambiguation.
///
/// The two-tier swipe check (horizontal minimum plus vertical maximum)
/// prevents accidental navigation from small jitters and diagonal drags
/// while the user scrolls.
#[derive(Debug, Clone, PartialEq)]
pub struct GestureConfig {
    /// Displacement on either axis that confirms a swipe is underway
    pub swipe_track_threshold: f64,
    /// Horizontal displacement required to commit a navigation at touch-end
    pub swipe_commit_threshold: f64,
    /// Vertical drift above which a drag is treated as a scroll, not a swipe
    pub vertical_drift_limit: f64,
    /// Visual zoom clamp
    pub min_pinch_scale: f64,
    pub max_pinch_scale: f64,
}

impl Default for GestureConfig {
    fn default() -> Self {
        Self {
            swipe_track_threshold: 30.0,
            swipe_commit_threshold: 60.0,
            vertical_drift_limit: 40.0,
            min_pinch_scale: 0.8,
            max_pinch_scale: 1.5,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum GestureState {
    Idle,
    SingleTouch {
        origin: TouchPoint,
        current: TouchPoint,
        confirmed: bool,
    },
    PinchActive {
        initial_distance: f64,
        scale: f64,
    },
}

/// Tracks one in-progress touch sequence.
///
/// Reset to neutral at every touch-start and cleared at touch-end; never
/// persisted. Extremely slow swipes past the distance threshold still count
/// (no velocity requirement here, unlike the navigation drawer gesture).
#[derive(Debug, Clone, PartialEq)]
pub struct GestureClassifier {
    state: GestureState,
    config: GestureConfig,
}

impl GestureClassifier {
    pub fn new() -> Self {
        Self::with_config(GestureConfig::default())
    }

    pub fn with_config(config: GestureConfig) -> Self {
        Self {
            state: GestureState::Idle,
            config,
        }
    }

    /// Begin tracking a touch sequence.
    ///
    /// Two simultaneous contact points go straight to pinch tracking. A
    /// finger joining an active pinch is ignored; the machine only
    /// distinguishes one versus two contacts at the start of a sequence.
    pub fn touch_start(&mut self, points: &[TouchPoint]) {
        if matches!(self.state, GestureState::PinchActive { .. }) {
            return;
        }

        match points {
            [] => {}
            [single] => {
                self.state = GestureState::SingleTouch {
                    origin: *single,
                    current: *single,
                    confirmed: false,
                };
            }
            [a, b, ..] => {
                let initial_distance = distance(*a, *b).max(f64::EPSILON);
                self.state = GestureState::PinchActive {
                    initial_distance,
                    scale: 1.0,
                };
            }
        }
    }

    /// Track movement. Returns the current visual zoom scale while pinching.
    pub fn touch_move(&mut self, points: &[TouchPoint]) -> Option<f64> {
        match &mut self.state {
            GestureState::SingleTouch {
                origin,
                current,
                confirmed,
            } => {
                if let Some(point) = points.first() {
                    *current = *point;
                    let dx = (current.x - origin.x).abs();
                    let dy = (current.y - origin.y).abs();
                    if dx > self.config.swipe_track_threshold
                        || dy > self.config.swipe_track_threshold
                    {
                        *confirmed = true;
                    }
                }
                None
            }
            GestureState::PinchActive {
                initial_distance,
                scale,
            } => {
                if let [a, b, ..] = points {
                    let raw = distance(*a, *b) / *initial_distance;
                    *scale = raw
                        .max(self.config.min_pinch_scale)
                        .min(self.config.max_pinch_scale);
                }
                Some(*scale)
            }
            GestureState::Idle => None,
        }
    }

    /// Finish the sequence, emitting at most one action and resetting to idle
    pub fn touch_end(&mut self) -> Option<GestureAction> {
        let state = std::mem::replace(&mut self.state, GestureState::Idle);
        match state {
            GestureState::SingleTouch {
                origin,
                current,
                confirmed: true,
            } => {
                let dx = current.x - origin.x;
                let dy = (current.y - origin.y).abs();
                if dx.abs() > self.config.swipe_commit_threshold
                    && dy < self.config.vertical_drift_limit
                {
                    if dx > 0.0 {
                        Some(GestureAction::NavigatePrevious)
                    } else {
                        Some(GestureAction::NavigateNext)
                    }
                } else {
                    None
                }
            }
            GestureState::PinchActive { .. } => Some(GestureAction::PinchEnded),
            _ => None,
        }
    }

    /// Current visual zoom scale, while a pinch is active
    pub fn pinch_scale(&self) -> Option<f64> {
        match self.state {
            GestureState::PinchActive { scale, .. } => Some(scale),
            _ => None,
        }
    }

    pub fn is_idle(&self) -> bool {
        self.state == GestureState::Idle
    }
}

impl Default for GestureClassifier {
    fn default() -> Self {
        Self::new()
    }
}

fn distance(a: TouchPoint, b: TouchPoint) -> f64 {
    ((a.x - b.x).powi(2) + (a.y - b.y).powi(2)).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(x: f64, y: f64) -> TouchPoint {
        TouchPoint { x, y }
    }

    #[test]
    fn test_horizontal_swipe_left_navigates_next() {
        let mut classifier = GestureClassifier::new();

        // Start (100, 200), end (20, 210): dx = -80, dy = 10
        classifier.touch_start(&[p(100.0, 200.0)]);
        classifier.touch_move(&[p(60.0, 205.0)]);
        classifier.touch_move(&[p(20.0, 210.0)]);

        assert_eq!(classifier.touch_end(), Some(GestureAction::NavigateNext));
        assert!(classifier.is_idle());
    }

    #[test]
    fn test_horizontal_swipe_right_navigates_previous() {
        let mut classifier = GestureClassifier::new();

        classifier.touch_start(&[p(40.0, 300.0)]);
        classifier.touch_move(&[p(130.0, 310.0)]);

        assert_eq!(
            classifier.touch_end(),
            Some(GestureAction::NavigatePrevious)
        );
    }

    #[test]
    fn test_vertical_dominant_drag_does_not_navigate() {
        let mut classifier = GestureClassifier::new();

        // Horizontal displacement clears 60px but vertical drift is 50px
        classifier.touch_start(&[p(100.0, 100.0)]);
        classifier.touch_move(&[p(180.0, 150.0)]);

        assert_eq!(classifier.touch_end(), None);
    }

    #[test]
    fn test_small_jitter_never_navigates() {
        let mut classifier = GestureClassifier::new();

        classifier.touch_start(&[p(100.0, 100.0)]);
        classifier.touch_move(&[p(110.0, 102.0)]);

        assert_eq!(classifier.touch_end(), None);
    }

    #[test]
    fn test_slow_swipe_still_counts() {
        let mut classifier = GestureClassifier::new();

        classifier.touch_start(&[p(200.0, 100.0)]);
        // Many tiny moves; total displacement is what matters
        for i in 1..=70 {
            classifier.touch_move(&[p(200.0 - i as f64, 100.0)]);
        }

        assert_eq!(classifier.touch_end(), Some(GestureAction::NavigateNext));
    }

    #[test]
    fn test_two_finger_touch_never_navigates() {
        let mut classifier = GestureClassifier::new();

        classifier.touch_start(&[p(100.0, 100.0), p(200.0, 100.0)]);
        // Large horizontal movement while pinching
        classifier.touch_move(&[p(20.0, 100.0), p(120.0, 100.0)]);

        assert_eq!(classifier.touch_end(), Some(GestureAction::PinchEnded));
    }

    #[test]
    fn test_pinch_scale_tracks_distance_ratio() {
        let mut classifier = GestureClassifier::new();

        classifier.touch_start(&[p(100.0, 100.0), p(200.0, 100.0)]);
        let scale = classifier.touch_move(&[p(90.0, 100.0), p(210.0, 100.0)]);

        // 120 / 100 apart
        assert_eq!(scale, Some(1.2));
        assert_eq!(classifier.pinch_scale(), Some(1.2));
    }

    #[test]
    fn test_pinch_scale_is_clamped() {
        let mut classifier = GestureClassifier::new();

        classifier.touch_start(&[p(100.0, 100.0), p(200.0, 100.0)]);

        let zoomed = classifier.touch_move(&[p(0.0, 100.0), p(400.0, 100.0)]);
        assert_eq!(zoomed, Some(1.5));

        let shrunk = classifier.touch_move(&[p(140.0, 100.0), p(150.0, 100.0)]);
        assert_eq!(shrunk, Some(0.8));
    }

    #[test]
    fn test_third_finger_mid_pinch_is_ignored() {
        let mut classifier = GestureClassifier::new();

        classifier.touch_start(&[p(100.0, 100.0), p(200.0, 100.0)]);
        // Third finger lands; the new start must not reset pinch tracking
        classifier.touch_start(&[p(100.0, 100.0), p(200.0, 100.0), p(150.0, 300.0)]);

        let scale = classifier.touch_move(&[p(90.0, 100.0), p(210.0, 100.0)]);
        assert_eq!(scale, Some(1.2));
        assert_eq!(classifier.touch_end(), Some(GestureAction::PinchEnded));
    }

    #[test]
    fn test_second_finger_during_single_touch_becomes_pinch() {
        let mut classifier = GestureClassifier::new();

        classifier.touch_start(&[p(100.0, 100.0)]);
        classifier.touch_move(&[p(170.0, 100.0)]);
        // Second finger lands before the first lifts
        classifier.touch_start(&[p(170.0, 100.0), p(270.0, 100.0)]);

        assert_eq!(classifier.touch_end(), Some(GestureAction::PinchEnded));
    }

    #[test]
    fn test_state_resets_between_sequences() {
        let mut classifier = GestureClassifier::new();

        classifier.touch_start(&[p(100.0, 100.0)]);
        classifier.touch_move(&[p(20.0, 100.0)]);
        assert_eq!(classifier.touch_end(), Some(GestureAction::NavigateNext));

        // A fresh tap with no movement emits nothing
        classifier.touch_start(&[p(50.0, 50.0)]);
        assert_eq!(classifier.touch_end(), None);
        assert!(classifier.is_idle());
    }
}
