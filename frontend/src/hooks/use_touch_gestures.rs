use shared::gestures::{GestureAction, GestureClassifier, TouchPoint};
use web_sys::TouchEvent;
use yew::prelude::*;

use crate::services::logging::Logger;

/// Callbacks the gesture surface fires when a gesture commits
#[derive(Clone, PartialEq)]
pub struct TouchGestureHandlers {
    pub on_navigate_previous: Callback<()>,
    pub on_navigate_next: Callback<()>,
    pub on_activity: Callback<()>,
}

pub struct UseTouchGesturesResult {
    pub ontouchstart: Callback<TouchEvent>,
    pub ontouchmove: Callback<TouchEvent>,
    pub ontouchend: Callback<TouchEvent>,
    /// Current pinch zoom factor, 1.0 when no pinch is active
    pub pinch_scale: f64,
}

fn touch_points(event: &TouchEvent) -> Vec<TouchPoint> {
    let touches = event.touches();
    let mut points = Vec::with_capacity(touches.length() as usize);
    for i in 0..touches.length() {
        if let Some(touch) = touches.get(i) {
            points.push(TouchPoint {
                x: touch.client_x() as f64,
                y: touch.client_y() as f64,
            });
        }
    }
    points
}

/// Hook wiring DOM touch events into the gesture classifier.
///
/// Horizontal swipes emit month navigation, pinches adjust the zoom factor
/// and every touch counts as session activity.
#[hook]
pub fn use_touch_gestures(handlers: TouchGestureHandlers) -> UseTouchGesturesResult {
    let classifier = use_mut_ref(GestureClassifier::new);
    let pinch_scale = use_state(|| 1.0f64);

    let ontouchstart = {
        let classifier = classifier.clone();
        let on_activity = handlers.on_activity.clone();
        Callback::from(move |event: TouchEvent| {
            let points = touch_points(&event);
            classifier.borrow_mut().touch_start(&points);
            on_activity.emit(());
        })
    };

    let ontouchmove = {
        let classifier = classifier.clone();
        let pinch_scale = pinch_scale.clone();
        let on_activity = handlers.on_activity.clone();
        Callback::from(move |event: TouchEvent| {
            let points = touch_points(&event);
            if let Some(scale) = classifier.borrow_mut().touch_move(&points) {
                pinch_scale.set(scale);
            }
            on_activity.emit(());
        })
    };

    let ontouchend = {
        let classifier = classifier.clone();
        let pinch_scale = pinch_scale.clone();
        let on_navigate_previous = handlers.on_navigate_previous.clone();
        let on_navigate_next = handlers.on_navigate_next.clone();
        let on_activity = handlers.on_activity.clone();
        Callback::from(move |_event: TouchEvent| {
            match classifier.borrow_mut().touch_end() {
                Some(GestureAction::NavigatePrevious) => {
                    Logger::debug_with_component("touch-gestures", "Swipe right, previous month");
                    on_navigate_previous.emit(());
                }
                Some(GestureAction::NavigateNext) => {
                    Logger::debug_with_component("touch-gestures", "Swipe left, next month");
                    on_navigate_next.emit(());
                }
                Some(GestureAction::PinchEnded) => {
                    pinch_scale.set(1.0);
                }
                None => {}
            }
            on_activity.emit(());
        })
    };

    UseTouchGesturesResult {
        ontouchstart,
        ontouchmove,
        ontouchend,
        pinch_scale: *pinch_scale,
    }
}
