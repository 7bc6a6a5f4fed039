use serde::{Deserialize, Serialize};
use std::fmt;

pub mod gestures;
pub mod session;

/// One financial obligation owed to a wedding vendor.
///
/// Payments are created upstream and read into the calendar as a list; the
/// calendar only mutates them through the mark-paid path and never deletes
/// them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payment {
    pub id: String,
    /// Short human-readable label, e.g. "Florist final balance"
    pub title: String,
    /// Amount owed (currency units, positive)
    pub amount: f64,
    /// Calendar date the payment is due (ISO 8601, YYYY-MM-DD)
    pub due_date: String,
    pub status: PaymentStatus,
    pub vendor: VendorRef,
    pub priority: PaymentPriority,
    /// Set when and only when status is Paid (RFC 3339)
    pub paid_date: Option<String>,
    /// Set when and only when status is Paid
    pub paid_amount: Option<f64>,
    /// Present when the record was modified concurrently in two places
    pub conflict: Option<ConflictMetadata>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    Paid,
    Overdue,
    Upcoming,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentPriority {
    Low,
    Medium,
    High,
    Critical,
}

/// Reference to the vendor a payment belongs to
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VendorRef {
    pub id: String,
    pub name: String,
    pub category: String,
}

/// Flags and timestamps indicating a record was modified concurrently in two
/// places. The comparison/merge algorithm itself lives behind the backend's
/// resolver collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConflictMetadata {
    pub has_conflict: bool,
    /// RFC 3339 timestamp of the local modification
    pub local_updated_at: String,
    /// RFC 3339 timestamp of the remote modification
    pub remote_updated_at: String,
}

impl Payment {
    /// Produce the record as it should look after being marked paid.
    ///
    /// Pure derivation; the caller decides whether the result is ever
    /// applied (validation, connectivity and rollback are its problem).
    pub fn mark_paid(&self, now: chrono::DateTime<chrono::Utc>) -> Payment {
        Payment {
            status: PaymentStatus::Paid,
            paid_date: Some(now.to_rfc3339()),
            paid_amount: Some(self.amount),
            ..self.clone()
        }
    }

    /// Parse the due date into (year, month, day)
    pub fn due_ymd(&self) -> Option<(u32, u32, u32)> {
        let parts: Vec<&str> = self.due_date.split('-').collect();
        if parts.len() != 3 {
            return None;
        }
        match (
            parts[0].parse::<u32>(),
            parts[1].parse::<u32>(),
            parts[2].parse::<u32>(),
        ) {
            (Ok(year), Ok(month), Ok(day)) => Some((year, month, day)),
            _ => None,
        }
    }

    /// Structural/business-rule check applied before any update is accepted
    pub fn validate(&self) -> Vec<PaymentValidationError> {
        let mut errors = Vec::new();

        if self.title.trim().is_empty() {
            errors.push(PaymentValidationError::EmptyTitle);
        }
        if self.title.len() > 256 {
            errors.push(PaymentValidationError::TitleTooLong(self.title.len()));
        }
        if self.amount <= 0.0 {
            errors.push(PaymentValidationError::AmountNotPositive);
        }
        if self.due_ymd().is_none() {
            errors.push(PaymentValidationError::InvalidDueDate(self.due_date.clone()));
        }

        match self.status {
            PaymentStatus::Paid => {
                if self.paid_date.is_none() || self.paid_amount.is_none() {
                    errors.push(PaymentValidationError::MissingPaidFields);
                } else if let Some(paid) = self.paid_amount {
                    if paid <= 0.0 {
                        errors.push(PaymentValidationError::AmountNotPositive);
                    }
                }
            }
            _ => {
                // Historical paid fields are tolerated on non-paid statuses;
                // only a paid amount without any paid date is malformed.
                if self.paid_amount.is_some() && self.paid_date.is_none() {
                    errors.push(PaymentValidationError::MissingPaidFields);
                }
            }
        }

        errors
    }

    pub fn is_valid(&self) -> bool {
        self.validate().is_empty()
    }

    /// True when the record carries an unresolved concurrent-edit flag
    pub fn has_conflict(&self) -> bool {
        self.conflict
            .as_ref()
            .map(|c| c.has_conflict)
            .unwrap_or(false)
    }
}

/// Specific validation errors for payment updates
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PaymentValidationError {
    EmptyTitle,
    TitleTooLong(usize),
    AmountNotPositive,
    InvalidDueDate(String),
    MissingPaidFields,
}

impl fmt::Display for PaymentValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PaymentValidationError::EmptyTitle => write!(f, "Payment title is empty"),
            PaymentValidationError::TitleTooLong(len) => {
                write!(f, "Payment title too long ({} characters, max 256)", len)
            }
            PaymentValidationError::AmountNotPositive => {
                write!(f, "Payment amount must be positive")
            }
            PaymentValidationError::InvalidDueDate(date) => {
                write!(f, "Invalid due date: {}", date)
            }
            PaymentValidationError::MissingPaidFields => {
                write!(f, "Paid payments must carry a paid date and paid amount")
            }
        }
    }
}

impl std::error::Error for PaymentValidationError {}

/// Type of calendar day for explicit rendering logic
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum CalendarDayType {
    /// Empty padding cell before the first day of the month
    PaddingBefore,
    /// Actual day within the month
    MonthDay,
}

/// One entry per date in the displayed month; recomputed, never mutated
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CalendarDayView {
    /// Day of month, 0 for padding cells
    pub day: u32,
    /// ISO date (YYYY-MM-DD); None for padding cells
    pub date: Option<String>,
    /// Payments due on this date
    pub payments: Vec<Payment>,
    pub has_overdue: bool,
    pub has_critical: bool,
    pub has_conflicts: bool,
    /// Sum of amounts due this day
    pub total_amount: f64,
    pub is_today: bool,
    pub is_current_month: bool,
    pub day_type: CalendarDayType,
}

/// A displayed month with its per-day payment buckets
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CalendarMonthView {
    pub month: u32,
    pub year: u32,
    pub days: Vec<CalendarDayView>,
    pub first_day_of_week: u32, // 0 = Sunday, 1 = Monday, etc.
}

/// Current focus date for calendar navigation (month/year only)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CalendarFocusDate {
    pub month: u32,
    pub year: u32,
}

impl Default for CalendarFocusDate {
    fn default() -> Self {
        use chrono::Datelike;
        let now = chrono::Local::now();
        Self {
            month: now.month(),
            year: now.year() as u32,
        }
    }
}

/// Request to update the calendar focus date
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UpdateCalendarFocusRequest {
    pub month: u32,
    pub year: u32,
}

/// Response after updating calendar focus date
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UpdateCalendarFocusResponse {
    pub focus_date: CalendarFocusDate,
}

/// Replace the payment snapshot the calendar works from
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoadPaymentsRequest {
    pub payments: Vec<Payment>,
    /// Scoping identifiers from the surrounding app
    pub wedding_id: String,
    pub couple_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PaymentListResponse {
    pub payments: Vec<Payment>,
}

/// Request to mark a payment as paid
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MarkPaidRequest {
    /// Connectivity signal supplied by the client
    pub online: bool,
}

/// Haptic side-channel the UI should play for an outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedbackSignal {
    Success,
    Error,
    None,
}

/// Result of a mark-paid attempt
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MarkPaidOutcome {
    /// Applied locally and confirmed remotely
    Applied { payment: Payment },
    /// Applied locally and queued for replay (client offline)
    QueuedOffline { payment: Payment },
    /// Validation failed; nothing changed
    Rejected { errors: Vec<PaymentValidationError> },
    /// Remote update failed; local state restored to the pre-update value
    RolledBack { payment: Payment },
    /// A newer write superseded this one before it completed
    Superseded,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MarkPaidResponse {
    pub outcome: MarkPaidOutcome,
    pub feedback: FeedbackSignal,
}

/// Summary of a conflict-resolution sweep
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ResolveConflictsResponse {
    pub resolved: usize,
    pub failed: usize,
}

/// Frontend log line shipped to the backend log sink
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LogRequest {
    pub level: String,
    pub message: String,
    pub component: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample_payment() -> Payment {
        Payment {
            id: "payment::1".to_string(),
            title: "Florist final balance".to_string(),
            amount: 500.0,
            due_date: "2025-06-15".to_string(),
            status: PaymentStatus::Pending,
            vendor: VendorRef {
                id: "vendor::flora".to_string(),
                name: "Flora & Fern".to_string(),
                category: "florist".to_string(),
            },
            priority: PaymentPriority::Medium,
            paid_date: None,
            paid_amount: None,
            conflict: None,
        }
    }

    #[test]
    fn test_mark_paid_sets_paid_fields() {
        let payment = sample_payment();
        let now = chrono::Utc.with_ymd_and_hms(2025, 6, 10, 12, 0, 0).unwrap();

        let paid = payment.mark_paid(now);

        assert_eq!(paid.status, PaymentStatus::Paid);
        assert_eq!(paid.paid_amount, Some(500.0));
        assert_eq!(paid.paid_date, Some(now.to_rfc3339()));
        // Untouched fields carried over
        assert_eq!(paid.id, payment.id);
        assert_eq!(paid.due_date, payment.due_date);
    }

    #[test]
    fn test_paid_status_requires_paid_fields() {
        let mut payment = sample_payment();
        payment.status = PaymentStatus::Paid;

        let errors = payment.validate();
        assert!(errors.contains(&PaymentValidationError::MissingPaidFields));

        payment.paid_date = Some("2025-06-10T12:00:00+00:00".to_string());
        payment.paid_amount = Some(500.0);
        assert!(payment.is_valid());
    }

    #[test]
    fn test_validate_rejects_malformed_payments() {
        let mut payment = sample_payment();
        payment.title = "   ".to_string();
        payment.amount = 0.0;
        payment.due_date = "June 15th".to_string();

        let errors = payment.validate();
        assert!(errors.contains(&PaymentValidationError::EmptyTitle));
        assert!(errors.contains(&PaymentValidationError::AmountNotPositive));
        assert!(errors
            .iter()
            .any(|e| matches!(e, PaymentValidationError::InvalidDueDate(_))));
    }

    #[test]
    fn test_due_ymd_parsing() {
        let payment = sample_payment();
        assert_eq!(payment.due_ymd(), Some((2025, 6, 15)));

        let mut bad = sample_payment();
        bad.due_date = "not-a-date".to_string();
        assert_eq!(bad.due_ymd(), None);
    }

    #[test]
    fn test_has_conflict_flag() {
        let mut payment = sample_payment();
        assert!(!payment.has_conflict());

        payment.conflict = Some(ConflictMetadata {
            has_conflict: true,
            local_updated_at: "2025-06-10T12:00:00+00:00".to_string(),
            remote_updated_at: "2025-06-10T12:05:00+00:00".to_string(),
        });
        assert!(payment.has_conflict());

        payment.conflict.as_mut().unwrap().has_conflict = false;
        assert!(!payment.has_conflict());
    }

    #[test]
    fn test_mark_paid_outcome_serde_round_trip() {
        let outcome = MarkPaidOutcome::Rejected {
            errors: vec![PaymentValidationError::EmptyTitle],
        };
        let json = serde_json::to_string(&outcome).unwrap();
        assert!(json.contains("rejected"));
        let back: MarkPaidOutcome = serde_json::from_str(&json).unwrap();
        assert_eq!(back, outcome);
    }
}
