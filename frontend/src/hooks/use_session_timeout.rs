use std::cell::Cell;
use std::rc::Rc;

use chrono::Utc;
use gloo::timers::future::TimeoutFuture;
use shared::session::{SessionPhase, SessionTracker};
use wasm_bindgen_futures::spawn_local;
use yew::prelude::*;

use crate::services::logging::Logger;

pub struct UseSessionTimeoutResult {
    pub warning_visible: bool,
    pub expired: bool,
    /// Emit on any user interaction to reset the idle budget
    pub record_activity: Callback<()>,
}

/// Hook polling the session tracker once a second.
///
/// The tracker itself owns the budget math; this hook only feeds it wall
/// clock readings and mirrors the phase into component state.
#[hook]
pub fn use_session_timeout() -> UseSessionTimeoutResult {
    let tracker = use_mut_ref(|| SessionTracker::new(Utc::now()));
    // Shared with the poll loop and the activity callback, which outlive any
    // single render
    let expired_flag = use_mut_ref(|| false);
    let warning_visible = use_state(|| false);
    let expired = use_state(|| false);

    let record_activity = {
        let tracker = tracker.clone();
        let expired_flag = expired_flag.clone();
        let warning_visible = warning_visible.clone();
        Callback::from(move |_| {
            // Activity after expiry does not revive the session
            if *expired_flag.borrow() {
                return;
            }
            tracker.borrow_mut().record_activity(Utc::now());
            warning_visible.set(false);
        })
    };

    // Poll loop with a cancellation flag flipped on unmount
    {
        let tracker = tracker.clone();
        let expired_flag = expired_flag.clone();
        let warning_visible = warning_visible.clone();
        let expired = expired.clone();

        use_effect_with((), move |_| {
            let cancelled = Rc::new(Cell::new(false));
            let cancel_flag = cancelled.clone();

            spawn_local(async move {
                let mut warned = false;
                loop {
                    TimeoutFuture::new(1_000).await;
                    if cancelled.get() {
                        break;
                    }

                    let phase = tracker.borrow_mut().phase(Utc::now());
                    match phase {
                        SessionPhase::Active => {
                            if warned {
                                warned = false;
                                warning_visible.set(false);
                            }
                        }
                        SessionPhase::Warning => {
                            if !warned {
                                warned = true;
                                Logger::info_with_component(
                                    "session-timeout",
                                    "Session expires in one minute",
                                );
                                warning_visible.set(true);
                            }
                        }
                        SessionPhase::Expired => {
                            Logger::warn_with_component(
                                "session-timeout",
                                "Session expired after 15 minutes of inactivity",
                            );
                            *expired_flag.borrow_mut() = true;
                            warning_visible.set(false);
                            expired.set(true);
                            break;
                        }
                    }
                }
            });

            move || {
                cancel_flag.set(true);
            }
        });
    }

    UseSessionTimeoutResult {
        warning_visible: *warning_visible,
        expired: *expired,
        record_activity,
    }
}
