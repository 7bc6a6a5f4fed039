use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use shared::{
    LoadPaymentsRequest, LogRequest, MarkPaidRequest, PaymentListResponse,
    UpdateCalendarFocusRequest, UpdateCalendarFocusResponse,
};
use tracing::info;

use crate::domain::{CalendarService, PaymentError, PaymentService};

/// Years the calendar will render; keeps the grid math inside chrono's
/// supported date range
const VALID_YEARS: std::ops::RangeInclusive<u32> = 1970..=9999;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub calendar_service: CalendarService,
    pub payment_service: PaymentService,
}

impl AppState {
    pub fn new(calendar_service: CalendarService, payment_service: PaymentService) -> Self {
        Self {
            calendar_service,
            payment_service,
        }
    }
}

/// Query parameters for the calendar month endpoint; defaults to the
/// current focus date when omitted
#[derive(Deserialize, Debug)]
pub struct CalendarMonthQuery {
    pub month: Option<u32>,
    pub year: Option<u32>,
}

#[derive(Deserialize, Debug)]
pub struct ResolveConflictsBody {
    pub online: Option<bool>,
}

#[derive(Serialize, Debug)]
pub struct ReplayResponse {
    pub replayed: usize,
}

/// Axum handler for GET /api/calendar/month
pub async fn get_calendar_month(
    State(state): State<AppState>,
    Query(query): Query<CalendarMonthQuery>,
) -> impl IntoResponse {
    info!("GET /api/calendar/month - query: {:?}", query);

    let focus = state.calendar_service.get_focus_date();
    let month = query.month.unwrap_or(focus.month);
    let year = query.year.unwrap_or(focus.year);

    if !(1..=12).contains(&month) {
        return (StatusCode::BAD_REQUEST, "Invalid month").into_response();
    }
    if !VALID_YEARS.contains(&year) {
        return (StatusCode::BAD_REQUEST, "Invalid year").into_response();
    }

    let payments = state.payment_service.list_payments();
    let today = state.calendar_service.today();
    let view = state
        .calendar_service
        .generate_calendar_month(month, year, &payments, today);

    (StatusCode::OK, Json(view)).into_response()
}

/// Axum handler for GET /api/calendar/focus
pub async fn get_focus_date(State(state): State<AppState>) -> impl IntoResponse {
    info!("GET /api/calendar/focus");
    (StatusCode::OK, Json(state.calendar_service.get_focus_date())).into_response()
}

/// Axum handler for POST /api/calendar/focus
pub async fn set_focus_date(
    State(state): State<AppState>,
    Json(request): Json<UpdateCalendarFocusRequest>,
) -> impl IntoResponse {
    info!("POST /api/calendar/focus - request: {:?}", request);

    if !VALID_YEARS.contains(&request.year) {
        return (StatusCode::BAD_REQUEST, "Invalid year".to_string()).into_response();
    }

    match state
        .calendar_service
        .set_focus_date(request.month, request.year)
    {
        Ok(focus_date) => (
            StatusCode::OK,
            Json(UpdateCalendarFocusResponse { focus_date }),
        )
            .into_response(),
        Err(e) => (StatusCode::BAD_REQUEST, e).into_response(),
    }
}

/// Axum handler for POST /api/calendar/focus/previous
pub async fn navigate_previous_month(State(state): State<AppState>) -> impl IntoResponse {
    info!("POST /api/calendar/focus/previous");
    let focus_date = state.calendar_service.navigate_previous_month();
    (
        StatusCode::OK,
        Json(UpdateCalendarFocusResponse { focus_date }),
    )
        .into_response()
}

/// Axum handler for POST /api/calendar/focus/next
pub async fn navigate_next_month(State(state): State<AppState>) -> impl IntoResponse {
    info!("POST /api/calendar/focus/next");
    let focus_date = state.calendar_service.navigate_next_month();
    (
        StatusCode::OK,
        Json(UpdateCalendarFocusResponse { focus_date }),
    )
        .into_response()
}

/// Axum handler for GET /api/payments
pub async fn list_payments(State(state): State<AppState>) -> impl IntoResponse {
    info!("GET /api/payments");
    let payments = state.payment_service.list_payments();
    (StatusCode::OK, Json(PaymentListResponse { payments })).into_response()
}

/// Axum handler for PUT /api/payments - replace the working snapshot
pub async fn load_payments(
    State(state): State<AppState>,
    Json(request): Json<LoadPaymentsRequest>,
) -> impl IntoResponse {
    info!(
        "PUT /api/payments - wedding: {}, couple: {}, count: {}",
        request.wedding_id,
        request.couple_id,
        request.payments.len()
    );

    state.payment_service.load_snapshot(request.payments);
    StatusCode::NO_CONTENT.into_response()
}

/// Axum handler for POST /api/payments/:id/mark-paid
pub async fn mark_paid(
    State(state): State<AppState>,
    Path(payment_id): Path<String>,
    Json(request): Json<MarkPaidRequest>,
) -> impl IntoResponse {
    info!(
        "POST /api/payments/{}/mark-paid - online: {}",
        payment_id, request.online
    );

    match state
        .payment_service
        .mark_paid(&payment_id, request.online, Utc::now())
        .await
    {
        Ok(response) => (StatusCode::OK, Json(response)).into_response(),
        Err(e) => {
            if matches!(
                e.downcast_ref::<PaymentError>(),
                Some(PaymentError::UnknownPayment(_))
            ) {
                (StatusCode::NOT_FOUND, "Payment not found").into_response()
            } else {
                tracing::error!("Error marking payment paid: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Error marking payment paid",
                )
                    .into_response()
            }
        }
    }
}

/// Axum handler for POST /api/payments/conflicts/resolve
pub async fn resolve_conflicts(
    State(state): State<AppState>,
    Json(body): Json<ResolveConflictsBody>,
) -> impl IntoResponse {
    info!("POST /api/payments/conflicts/resolve - body: {:?}", body);

    let online = body.online.unwrap_or(true);
    match state
        .payment_service
        .resolve_conflicts(online, Utc::now())
        .await
    {
        Ok(summary) => (StatusCode::OK, Json(summary)).into_response(),
        Err(e) => {
            tracing::error!("Error resolving conflicts: {:?}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Error resolving conflicts").into_response()
        }
    }
}

/// Axum handler for POST /api/payments/replay - drain the offline queue
pub async fn replay_offline_actions(State(state): State<AppState>) -> impl IntoResponse {
    info!("POST /api/payments/replay");

    match state.payment_service.replay_offline_actions().await {
        Ok(replayed) => (StatusCode::OK, Json(ReplayResponse { replayed })).into_response(),
        Err(e) => {
            tracing::error!("Error replaying offline actions: {:?}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Error replaying offline actions",
            )
                .into_response()
        }
    }
}

/// Axum handler for POST /api/logs - frontend log sink
pub async fn log_message(Json(request): Json<LogRequest>) -> impl IntoResponse {
    let component = request.component.as_deref().unwrap_or("frontend");
    match request.level.as_str() {
        "error" => tracing::error!(component, "{}", request.message),
        "warn" => tracing::warn!(component, "{}", request.message),
        "debug" => tracing::debug!(component, "{}", request.message),
        _ => tracing::info!(component, "{}", request.message),
    }
    StatusCode::NO_CONTENT.into_response()
}
