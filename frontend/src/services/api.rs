use gloo::net::http::Request;
use shared::{
    CalendarMonthView, MarkPaidRequest, MarkPaidResponse, PaymentListResponse,
    ResolveConflictsResponse, UpdateCalendarFocusRequest, UpdateCalendarFocusResponse,
};

/// API client for communicating with the backend server
#[derive(Clone, PartialEq)]
pub struct ApiClient {
    base_url: String,
}

impl ApiClient {
    /// Create a new API client with the default base URL
    pub fn new() -> Self {
        Self {
            base_url: "http://localhost:3000".to_string(),
        }
    }

    /// Create a new API client with a custom base URL
    pub fn with_base_url(base_url: String) -> Self {
        Self { base_url }
    }

    /// Get calendar data for a specific month/year
    pub async fn get_calendar_month(
        &self,
        month: u32,
        year: u32,
    ) -> Result<CalendarMonthView, String> {
        let url = format!(
            "{}/api/calendar/month?month={}&year={}",
            self.base_url, month, year
        );

        match Request::get(&url).send().await {
            Ok(response) => match response.json::<CalendarMonthView>().await {
                Ok(data) => Ok(data),
                Err(e) => Err(format!("Failed to parse calendar data: {}", e)),
            },
            Err(e) => Err(format!("Failed to fetch calendar data: {}", e)),
        }
    }

    /// Get all payments currently loaded on the backend
    pub async fn get_payments(&self) -> Result<PaymentListResponse, String> {
        let url = format!("{}/api/payments", self.base_url);

        match Request::get(&url).send().await {
            Ok(response) => match response.json::<PaymentListResponse>().await {
                Ok(data) => Ok(data),
                Err(e) => Err(format!("Failed to parse payments: {}", e)),
            },
            Err(e) => Err(format!("Failed to fetch payments: {}", e)),
        }
    }

    /// Mark a payment as paid. `online` tells the backend whether to push the
    /// update to the remote service or queue it for later replay.
    pub async fn mark_paid(
        &self,
        payment_id: &str,
        online: bool,
    ) -> Result<MarkPaidResponse, String> {
        let url = format!("{}/api/payments/{}/mark-paid", self.base_url, payment_id);
        let request = MarkPaidRequest { online };

        match Request::post(&url)
            .json(&request)
            .map_err(|e| format!("Failed to serialize request: {}", e))?
            .send()
            .await
        {
            Ok(response) => {
                if response.ok() {
                    match response.json::<MarkPaidResponse>().await {
                        Ok(data) => Ok(data),
                        Err(e) => Err(format!("Failed to parse response: {}", e)),
                    }
                } else {
                    let error_text = response
                        .text()
                        .await
                        .unwrap_or_else(|_| "Unknown error".to_string());
                    Err(error_text)
                }
            }
            Err(e) => Err(format!("Network error: {}", e)),
        }
    }

    /// Ask the backend to resolve all payments flagged with conflicts
    pub async fn resolve_conflicts(
        &self,
        online: bool,
    ) -> Result<ResolveConflictsResponse, String> {
        let url = format!("{}/api/payments/conflicts/resolve", self.base_url);
        let body = serde_json::json!({ "online": online });

        match Request::post(&url)
            .json(&body)
            .map_err(|e| format!("Failed to serialize request: {}", e))?
            .send()
            .await
        {
            Ok(response) => match response.json::<ResolveConflictsResponse>().await {
                Ok(data) => Ok(data),
                Err(e) => Err(format!("Failed to parse response: {}", e)),
            },
            Err(e) => Err(format!("Network error: {}", e)),
        }
    }

    /// Move the backend focus date one month back and return the new focus
    pub async fn navigate_previous_month(&self) -> Result<UpdateCalendarFocusResponse, String> {
        self.post_focus_navigation("previous").await
    }

    /// Move the backend focus date one month forward and return the new focus
    pub async fn navigate_next_month(&self) -> Result<UpdateCalendarFocusResponse, String> {
        self.post_focus_navigation("next").await
    }

    /// Set the backend focus date to an explicit month/year
    pub async fn set_focus_date(
        &self,
        month: u32,
        year: u32,
    ) -> Result<UpdateCalendarFocusResponse, String> {
        let url = format!("{}/api/calendar/focus", self.base_url);
        let request = UpdateCalendarFocusRequest { month, year };

        match Request::post(&url)
            .json(&request)
            .map_err(|e| format!("Failed to serialize request: {}", e))?
            .send()
            .await
        {
            Ok(response) => {
                if response.ok() {
                    match response.json::<UpdateCalendarFocusResponse>().await {
                        Ok(data) => Ok(data),
                        Err(e) => Err(format!("Failed to parse response: {}", e)),
                    }
                } else {
                    let error_text = response
                        .text()
                        .await
                        .unwrap_or_else(|_| "Unknown error".to_string());
                    Err(error_text)
                }
            }
            Err(e) => Err(format!("Network error: {}", e)),
        }
    }

    async fn post_focus_navigation(
        &self,
        direction: &str,
    ) -> Result<UpdateCalendarFocusResponse, String> {
        let url = format!("{}/api/calendar/focus/{}", self.base_url, direction);

        match Request::post(&url).send().await {
            Ok(response) => match response.json::<UpdateCalendarFocusResponse>().await {
                Ok(data) => Ok(data),
                Err(e) => Err(format!("Failed to parse response: {}", e)),
            },
            Err(e) => Err(format!("Network error: {}", e)),
        }
    }
}

impl Default for ApiClient {
    fn default() -> Self {
        Self::new()
    }
}
