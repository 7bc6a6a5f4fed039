use shared::{
    CalendarDayType, CalendarDayView, FeedbackSignal, MarkPaidOutcome, PaymentPriority,
    PaymentStatus,
};
use wasm_bindgen_futures::spawn_local;
use yew::prelude::*;

mod hooks;
mod services;

use hooks::use_touch_gestures::TouchGestureHandlers;
use hooks::{use_payment_calendar, use_session_timeout, use_touch_gestures};
use services::api::ApiClient;
use services::logging::Logger;

// Helper function to get month name from number
fn month_name(month: u32) -> &'static str {
    match month {
        1 => "January", 2 => "February", 3 => "March", 4 => "April",
        5 => "May", 6 => "June", 7 => "July", 8 => "August",
        9 => "September", 10 => "October", 11 => "November", 12 => "December",
        _ => "January",
    }
}

fn is_online() -> bool {
    web_sys::window()
        .map(|w| w.navigator().on_line())
        .unwrap_or(true)
}

fn play_feedback(feedback: FeedbackSignal) {
    let pattern = match feedback {
        FeedbackSignal::Success => 50,
        FeedbackSignal::Error => 200,
        FeedbackSignal::None => return,
    };
    if let Some(window) = web_sys::window() {
        let _ = window.navigator().vibrate_with_duration(pattern);
    }
}

#[function_component(App)]
fn app() -> Html {
    let api_client = ApiClient::new();

    let calendar = use_payment_calendar(&api_client);
    let session = use_session_timeout();
    let mark_paid_error = use_state(|| Option::<String>::None);

    let gestures = use_touch_gestures(TouchGestureHandlers {
        on_navigate_previous: calendar.actions.prev_month.clone(),
        on_navigate_next: calendar.actions.next_month.clone(),
        on_activity: session.record_activity.clone(),
    });

    // One-shot conflict sweep when the calendar first loads
    {
        let api_client = api_client.clone();
        let refresh_calendar = calendar.actions.refresh_calendar.clone();
        use_effect_with((), move |_| {
            spawn_local(async move {
                match api_client.resolve_conflicts(is_online()).await {
                    Ok(summary) => {
                        if summary.resolved > 0 || summary.failed > 0 {
                            Logger::info_with_component(
                                "app",
                                &format!(
                                    "Conflict sweep resolved {} payments, {} failed",
                                    summary.resolved, summary.failed
                                ),
                            );
                        }
                        if summary.resolved > 0 {
                            refresh_calendar.emit(());
                        }
                    }
                    Err(e) => {
                        Logger::warn_with_component(
                            "app",
                            &format!("Conflict sweep failed: {}", e),
                        );
                    }
                }
            });
            || ()
        });
    }

    let on_mark_paid = {
        let api_client = api_client.clone();
        let refresh_calendar = calendar.actions.refresh_calendar.clone();
        let record_activity = session.record_activity.clone();
        let mark_paid_error = mark_paid_error.clone();

        Callback::from(move |payment_id: String| {
            record_activity.emit(());

            let api_client = api_client.clone();
            let refresh_calendar = refresh_calendar.clone();
            let mark_paid_error = mark_paid_error.clone();

            spawn_local(async move {
                match api_client.mark_paid(&payment_id, is_online()).await {
                    Ok(response) => {
                        play_feedback(response.feedback);
                        match response.outcome {
                            MarkPaidOutcome::Applied { .. } => {
                                mark_paid_error.set(None);
                                refresh_calendar.emit(());
                            }
                            MarkPaidOutcome::QueuedOffline { .. } => {
                                mark_paid_error.set(Some(
                                    "Saved locally, will sync when back online".to_string(),
                                ));
                                refresh_calendar.emit(());
                            }
                            MarkPaidOutcome::Rejected { errors } => {
                                let detail = errors
                                    .iter()
                                    .map(|e| e.to_string())
                                    .collect::<Vec<_>>()
                                    .join("; ");
                                mark_paid_error
                                    .set(Some(format!("Payment update rejected: {}", detail)));
                            }
                            MarkPaidOutcome::RolledBack { payment } => {
                                Logger::error_with_component(
                                    "app",
                                    &format!(
                                        "Remote update failed for payment {}, change rolled back",
                                        payment.id
                                    ),
                                );
                                mark_paid_error.set(Some(
                                    "Update failed on the server, change was undone".to_string(),
                                ));
                                refresh_calendar.emit(());
                            }
                            MarkPaidOutcome::Superseded => {
                                // A newer edit won; just show the latest state
                                refresh_calendar.emit(());
                            }
                        }
                    }
                    Err(e) => {
                        Logger::error_with_component(
                            "app",
                            &format!("Mark-paid request failed: {}", e),
                        );
                        mark_paid_error.set(Some(e));
                    }
                }
            });
        })
    };

    let on_prev_click = {
        let prev_month = calendar.actions.prev_month.clone();
        let record_activity = session.record_activity.clone();
        Callback::from(move |_: MouseEvent| {
            record_activity.emit(());
            prev_month.emit(());
        })
    };

    let on_next_click = {
        let next_month = calendar.actions.next_month.clone();
        let record_activity = session.record_activity.clone();
        Callback::from(move |_: MouseEvent| {
            record_activity.emit(());
            next_month.emit(());
        })
    };

    let grid_style = format!("transform: scale({});", gestures.pinch_scale);

    html! {
        <>
            <header class="app-header">
                <h1>{"Payment Calendar"}</h1>
            </header>

            {if session.expired {
                html! {
                    <div class="session-overlay">
                        <div class="session-message">
                            {"Your session has expired. Please sign in again."}
                        </div>
                    </div>
                }
            } else { html! {} }}

            {if session.warning_visible {
                html! {
                    <div class="session-banner warning">
                        {"Your session will expire in one minute. Tap anywhere to stay signed in."}
                    </div>
                }
            } else { html! {} }}

            {if let Some(error) = (*mark_paid_error).as_ref() {
                html! {
                    <div class="form-message error">
                        {error}
                    </div>
                }
            } else { html! {} }}

            <main class="calendar-main"
                ontouchstart={gestures.ontouchstart.clone()}
                ontouchmove={gestures.ontouchmove.clone()}
                ontouchend={gestures.ontouchend.clone()}
            >
                <section class="calendar-section">
                    <div class="calendar-nav">
                        <button class="btn nav-btn" onclick={on_prev_click} disabled={session.expired}>
                            {"<"}
                        </button>
                        <h2>
                            {format!(
                                "{} {}",
                                month_name(calendar.state.current_month),
                                calendar.state.current_year
                            )}
                        </h2>
                        <button class="btn nav-btn" onclick={on_next_click} disabled={session.expired}>
                            {">"}
                        </button>
                    </div>

                    {if let Some(calendar_data) = calendar.state.calendar_data.as_ref() {
                        html! {
                            <div class="calendar" style={grid_style}>
                                <div class="calendar-weekdays">
                                    <div class="weekday">{"Sun"}</div>
                                    <div class="weekday">{"Mon"}</div>
                                    <div class="weekday">{"Tue"}</div>
                                    <div class="weekday">{"Wed"}</div>
                                    <div class="weekday">{"Thu"}</div>
                                    <div class="weekday">{"Fri"}</div>
                                    <div class="weekday">{"Sat"}</div>
                                </div>
                                <div class="calendar-grid">
                                    {for calendar_data.days.iter().map(|day| {
                                        render_day(day, &on_mark_paid, session.expired)
                                    })}
                                </div>
                            </div>
                        }
                    } else {
                        html! { <div class="loading">{"Loading calendar..."}</div> }
                    }}
                </section>
            </main>
        </>
    }
}

fn render_day(day: &CalendarDayView, on_mark_paid: &Callback<String>, locked: bool) -> Html {
    if day.day_type == CalendarDayType::PaddingBefore {
        return html! { <div class="calendar-day empty"></div> };
    }

    let mut day_class = String::from("calendar-day");
    if day.is_today {
        day_class.push_str(" today");
    }
    if day.has_overdue {
        day_class.push_str(" has-overdue");
    }
    if day.has_conflicts {
        day_class.push_str(" has-conflicts");
    }

    html! {
        <div class={day_class}>
            <div class="day-header">
                <div class="day-number">{day.day}</div>
                {if day.total_amount > 0.0 {
                    html! {
                        <div class="day-total-subtle">
                            {format!("${:.0}", day.total_amount)}
                        </div>
                    }
                } else { html! {} }}
            </div>

            <div class="day-payments">
                {for day.payments.iter().map(|payment| {
                    let mut chip_class = String::from("payment-chip");
                    match payment.status {
                        PaymentStatus::Paid => chip_class.push_str(" paid"),
                        PaymentStatus::Overdue => chip_class.push_str(" overdue"),
                        PaymentStatus::Pending | PaymentStatus::Upcoming => {
                            chip_class.push_str(" pending")
                        }
                    }
                    if payment.priority == PaymentPriority::Critical {
                        chip_class.push_str(" critical");
                    }
                    if payment.has_conflict() {
                        chip_class.push_str(" conflict");
                    }

                    let tooltip = format!(
                        "{}\n{} ${:.2}",
                        payment.title, payment.vendor.name, payment.amount
                    );

                    let onclick = {
                        let on_mark_paid = on_mark_paid.clone();
                        let payment_id = payment.id.clone();
                        let already_paid = payment.status == PaymentStatus::Paid;
                        Callback::from(move |_: MouseEvent| {
                            if locked || already_paid {
                                return;
                            }
                            on_mark_paid.emit(payment_id.clone());
                        })
                    };

                    html! {
                        <div class={chip_class} title={tooltip} {onclick}>
                            {format!("${:.0} {}", payment.amount, payment.title)}
                        </div>
                    }
                })}
            </div>
        </div>
    }
}

fn main() {
    yew::Renderer::<App>::new().render();
}
