use chrono::{Datelike, Local};
use shared::CalendarMonthView;
use wasm_bindgen_futures::spawn_local;
use yew::prelude::*;

use crate::services::api::ApiClient;
use crate::services::logging::Logger;

/// Month/year the calendar opens on, matching the backend's default focus
fn current_focus() -> (u32, u32) {
    let now = Local::now();
    (now.month(), now.year() as u32)
}

#[derive(Clone, PartialEq)]
pub struct PaymentCalendarState {
    pub current_month: u32,
    pub current_year: u32,
    pub calendar_data: Option<CalendarMonthView>,
}

pub struct UsePaymentCalendarResult {
    pub state: PaymentCalendarState,
    pub actions: UsePaymentCalendarActions,
}

#[derive(Clone)]
pub struct UsePaymentCalendarActions {
    pub prev_month: Callback<()>,
    pub next_month: Callback<()>,
    pub refresh_calendar: Callback<()>,
}

#[hook]
pub fn use_payment_calendar(api_client: &ApiClient) -> UsePaymentCalendarResult {
    let (initial_month, initial_year) = current_focus();
    let current_month = use_state(|| initial_month);
    let current_year = use_state(|| initial_year);
    let calendar_data = use_state(|| Option::<CalendarMonthView>::None);

    // Refresh calendar callback; recreated when the displayed month moves so
    // it always fetches the month on screen
    let refresh_calendar = {
        let api_client = api_client.clone();
        let calendar_data = calendar_data.clone();

        use_callback((*current_month, *current_year), move |_, (month, year)| {
            let api_client = api_client.clone();
            let calendar_data = calendar_data.clone();
            let month = *month;
            let year = *year;

            spawn_local(async move {
                match api_client.get_calendar_month(month, year).await {
                    Ok(data) => {
                        calendar_data.set(Some(data));
                    }
                    Err(e) => {
                        Logger::error_with_component(
                            "payment-calendar",
                            &format!("Failed to fetch calendar data: {}", e),
                        );
                    }
                }
            });
        })
    };

    // Navigation also moves the backend focus date so month math lives in one
    // place. The local month/year state is updated from the response.
    let prev_month = {
        let api_client = api_client.clone();
        let current_month = current_month.clone();
        let current_year = current_year.clone();
        use_callback((), move |_: (), _| {
            let api_client = api_client.clone();
            let current_month = current_month.clone();
            let current_year = current_year.clone();

            spawn_local(async move {
                match api_client.navigate_previous_month().await {
                    Ok(response) => {
                        current_month.set(response.focus_date.month);
                        current_year.set(response.focus_date.year);
                    }
                    Err(e) => {
                        Logger::error_with_component(
                            "payment-calendar",
                            &format!("Failed to navigate to previous month: {}", e),
                        );
                    }
                }
            });
        })
    };

    let next_month = {
        let api_client = api_client.clone();
        let current_month = current_month.clone();
        let current_year = current_year.clone();
        use_callback((), move |_: (), _| {
            let api_client = api_client.clone();
            let current_month = current_month.clone();
            let current_year = current_year.clone();

            spawn_local(async move {
                match api_client.navigate_next_month().await {
                    Ok(response) => {
                        current_month.set(response.focus_date.month);
                        current_year.set(response.focus_date.year);
                    }
                    Err(e) => {
                        Logger::error_with_component(
                            "payment-calendar",
                            &format!("Failed to navigate to next month: {}", e),
                        );
                    }
                }
            });
        })
    };

    // Auto-refresh calendar when month/year changes
    use_effect_with((current_month.clone(), current_year.clone()), {
        let refresh_calendar = refresh_calendar.clone();
        move |_| {
            refresh_calendar.emit(());
            || ()
        }
    });

    let state = PaymentCalendarState {
        current_month: *current_month,
        current_year: *current_year,
        calendar_data: (*calendar_data).clone(),
    };

    let actions = UsePaymentCalendarActions {
        prev_month,
        next_month,
        refresh_calendar,
    };

    UsePaymentCalendarResult { state, actions }
}
