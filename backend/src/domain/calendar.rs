//! Calendar domain logic for the payment calendar.
//!
//! This module contains all business logic related to calendar operations:
//! day bucketing, derived per-day flags and totals, and month navigation.
//! The UI only handles presentation concerns; every calendar computation
//! lives here.

use chrono::{Datelike, Local, NaiveDate};
use shared::{
    CalendarDayType, CalendarDayView, CalendarFocusDate, CalendarMonthView, Payment, PaymentStatus,
    PaymentPriority,
};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tracing::debug;

/// Calendar service that handles all calendar-related business logic
#[derive(Clone)]
pub struct CalendarService {
    /// Current focus date for calendar navigation (month/year only).
    /// Kept in memory and never persisted.
    current_focus_date: Arc<Mutex<CalendarFocusDate>>,
}

impl CalendarService {
    pub fn new() -> Self {
        Self {
            current_focus_date: Arc::new(Mutex::new(CalendarFocusDate::default())),
        }
    }

    /// Generate a calendar month view with per-day payment buckets.
    ///
    /// Pure function of (payments, month, year, today): one pass over the
    /// input builds the date-keyed buckets, then each calendar day folds
    /// over its own bucket only. Payments due outside the displayed month
    /// are excluded here and appear when their own month is displayed.
    pub fn generate_calendar_month(
        &self,
        month: u32,
        year: u32,
        payments: &[Payment],
        today: NaiveDate,
    ) -> CalendarMonthView {
        let days_in_month = self.days_in_month(month, year);
        let first_day = self.first_day_of_month(month, year);

        debug!(month, year, days_in_month, first_day, "generating calendar month");

        let buckets = self.group_payments_by_date(month, year, payments);

        let mut calendar_days = Vec::with_capacity((first_day + days_in_month) as usize);

        // Empty cells before the first day of the month, for grid alignment
        for _ in 0..first_day {
            calendar_days.push(CalendarDayView {
                day: 0,
                date: None,
                payments: Vec::new(),
                has_overdue: false,
                has_critical: false,
                has_conflicts: false,
                total_amount: 0.0,
                is_today: false,
                is_current_month: false,
                day_type: CalendarDayType::PaddingBefore,
            });
        }

        for day in 1..=days_in_month {
            let date_key = format!("{:04}-{:02}-{:02}", year, month, day);
            let day_payments = buckets.get(&date_key).cloned().unwrap_or_default();

            let total_amount = day_payments.iter().map(|p| p.amount).sum();
            let has_overdue = day_payments
                .iter()
                .any(|p| p.status == PaymentStatus::Overdue);
            let has_critical = day_payments
                .iter()
                .any(|p| p.priority == PaymentPriority::Critical);
            let has_conflicts = day_payments.iter().any(|p| p.has_conflict());
            let is_today = today.year() as u32 == year
                && today.month() == month
                && today.day() == day;

            calendar_days.push(CalendarDayView {
                day,
                date: Some(date_key),
                payments: day_payments,
                has_overdue,
                has_critical,
                has_conflicts,
                total_amount,
                is_today,
                is_current_month: true,
                day_type: CalendarDayType::MonthDay,
            });
        }

        CalendarMonthView {
            month,
            year,
            days: calendar_days,
            first_day_of_week: first_day,
        }
    }

    /// Group payments by due date for a specific month and year.
    ///
    /// Single pass over the input (O(n) rather than re-filtering per day),
    /// keyed by the ISO due-date string for O(1) lookup during rendering.
    fn group_payments_by_date(
        &self,
        month: u32,
        year: u32,
        payments: &[Payment],
    ) -> HashMap<String, Vec<Payment>> {
        let mut buckets: HashMap<String, Vec<Payment>> = HashMap::new();

        for payment in payments {
            if let Some((p_year, p_month, p_day)) = payment.due_ymd() {
                if p_month == month && p_year == year {
                    // Key rebuilt from the parsed date; raw due-date strings
                    // may carry non-padded parts and would miss the lookup
                    let key = format!("{:04}-{:02}-{:02}", p_year, p_month, p_day);
                    buckets
                        .entry(key)
                        .or_insert_with(Vec::new)
                        .push(payment.clone());
                }
            }
        }

        buckets
    }

    /// Get the number of days in a given month and year
    pub fn days_in_month(&self, month: u32, year: u32) -> u32 {
        match month {
            2 => {
                if self.is_leap_year(year) {
                    29
                } else {
                    28
                }
            }
            4 | 6 | 9 | 11 => 30,
            _ => 31,
        }
    }

    /// Check if a year is a leap year
    pub fn is_leap_year(&self, year: u32) -> bool {
        year % 4 == 0 && (year % 100 != 0 || year % 400 == 0)
    }

    /// Get the first day of month (0 = Sunday, 1 = Monday, etc.)
    pub fn first_day_of_month(&self, month: u32, year: u32) -> u32 {
        if let Some(date) = NaiveDate::from_ymd_opt(year as i32, month, 1) {
            date.weekday().num_days_from_sunday()
        } else {
            0
        }
    }

    /// Get the human-readable name for a month number
    pub fn month_name(&self, month: u32) -> &'static str {
        match month {
            1 => "January",
            2 => "February",
            3 => "March",
            4 => "April",
            5 => "May",
            6 => "June",
            7 => "July",
            8 => "August",
            9 => "September",
            10 => "October",
            11 => "November",
            12 => "December",
            _ => "Invalid Month",
        }
    }

    /// Format a due date for human-readable display
    pub fn format_due_date_for_display(&self, payment: &Payment) -> String {
        if let Some((year, month, day)) = payment.due_ymd() {
            format!("{} {}, {}", self.month_name(month), day, year)
        } else {
            payment.due_date.clone()
        }
    }

    /// Today's calendar date in the server's local timezone
    pub fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }

    /// Navigate to the previous month
    pub fn previous_month(&self, current_month: u32, current_year: u32) -> (u32, u32) {
        if current_month == 1 {
            (12, current_year - 1)
        } else {
            (current_month - 1, current_year)
        }
    }

    /// Navigate to the next month
    pub fn next_month(&self, current_month: u32, current_year: u32) -> (u32, u32) {
        if current_month == 12 {
            (1, current_year + 1)
        } else {
            (current_month + 1, current_year)
        }
    }

    /// Get the current focus date for calendar navigation
    pub fn get_focus_date(&self) -> CalendarFocusDate {
        self.current_focus_date.lock().unwrap().clone()
    }

    /// Set the focus date for calendar navigation
    pub fn set_focus_date(&self, month: u32, year: u32) -> Result<CalendarFocusDate, String> {
        if !(1..=12).contains(&month) {
            return Err(format!("Invalid month: {}. Must be between 1 and 12", month));
        }

        let new_focus_date = CalendarFocusDate { month, year };

        {
            let mut focus_date = self.current_focus_date.lock().unwrap();
            *focus_date = new_focus_date.clone();
        }

        Ok(new_focus_date)
    }

    /// Navigate the focus date to the previous month
    pub fn navigate_previous_month(&self) -> CalendarFocusDate {
        let current_focus = self.get_focus_date();
        let (prev_month, prev_year) = self.previous_month(current_focus.month, current_focus.year);

        // Never fails since previous_month returns valid values
        self.set_focus_date(prev_month, prev_year).unwrap()
    }

    /// Navigate the focus date to the next month
    pub fn navigate_next_month(&self) -> CalendarFocusDate {
        let current_focus = self.get_focus_date();
        let (next_month, next_year) = self.next_month(current_focus.month, current_focus.year);

        // Never fails since next_month returns valid values
        self.set_focus_date(next_month, next_year).unwrap()
    }
}

impl Default for CalendarService {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::VendorRef;

    fn create_test_payment(
        id: &str,
        due_date: &str,
        amount: f64,
        status: PaymentStatus,
        priority: PaymentPriority,
    ) -> Payment {
        Payment {
            id: id.to_string(),
            title: format!("Payment {}", id),
            amount,
            due_date: due_date.to_string(),
            status,
            vendor: VendorRef {
                id: "vendor::test".to_string(),
                name: "Test Vendor".to_string(),
                category: "venue".to_string(),
            },
            priority,
            paid_date: None,
            paid_amount: None,
            conflict: None,
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 10).unwrap()
    }

    #[test]
    fn test_days_in_month() {
        let service = CalendarService::new();

        assert_eq!(service.days_in_month(1, 2025), 31); // January
        assert_eq!(service.days_in_month(4, 2025), 30); // April
        assert_eq!(service.days_in_month(2, 2025), 28); // February (non-leap)
        assert_eq!(service.days_in_month(2, 2024), 29); // February (leap year)
    }

    #[test]
    fn test_is_leap_year() {
        let service = CalendarService::new();

        assert!(!service.is_leap_year(2025)); // Regular year
        assert!(service.is_leap_year(2024)); // Divisible by 4
        assert!(!service.is_leap_year(1900)); // Divisible by 100 but not 400
        assert!(service.is_leap_year(2000)); // Divisible by 400
    }

    #[test]
    fn test_month_name() {
        let service = CalendarService::new();

        assert_eq!(service.month_name(1), "January");
        assert_eq!(service.month_name(6), "June");
        assert_eq!(service.month_name(12), "December");
        assert_eq!(service.month_name(13), "Invalid Month");
    }

    #[test]
    fn test_navigation() {
        let service = CalendarService::new();

        assert_eq!(service.previous_month(6, 2025), (5, 2025));
        assert_eq!(service.previous_month(1, 2025), (12, 2024));

        assert_eq!(service.next_month(6, 2025), (7, 2025));
        assert_eq!(service.next_month(12, 2025), (1, 2026));
    }

    #[test]
    fn test_same_day_payments_share_one_bucket() {
        let service = CalendarService::new();

        // Two payments due June 15: one pending $500, one overdue $300
        let payments = vec![
            create_test_payment(
                "1",
                "2025-06-15",
                500.0,
                PaymentStatus::Pending,
                PaymentPriority::Medium,
            ),
            create_test_payment(
                "2",
                "2025-06-15",
                300.0,
                PaymentStatus::Overdue,
                PaymentPriority::Low,
            ),
        ];

        let calendar = service.generate_calendar_month(6, 2025, &payments, today());

        let june_15 = calendar
            .days
            .iter()
            .find(|d| d.day == 15 && d.day_type == CalendarDayType::MonthDay)
            .unwrap();
        assert_eq!(june_15.payments.len(), 2);
        assert_eq!(june_15.total_amount, 800.0);
        assert!(june_15.has_overdue);
        assert!(!june_15.has_critical);
        assert!(!june_15.has_conflicts);
    }

    #[test]
    fn test_month_days_partition_the_months_payments() {
        let service = CalendarService::new();

        let payments = vec![
            create_test_payment(
                "1",
                "2025-06-01",
                100.0,
                PaymentStatus::Upcoming,
                PaymentPriority::Low,
            ),
            create_test_payment(
                "2",
                "2025-06-15",
                200.0,
                PaymentStatus::Pending,
                PaymentPriority::High,
            ),
            create_test_payment(
                "3",
                "2025-06-15",
                300.0,
                PaymentStatus::Pending,
                PaymentPriority::Medium,
            ),
            create_test_payment(
                "4",
                "2025-06-30",
                400.0,
                PaymentStatus::Overdue,
                PaymentPriority::Critical,
            ),
            // Adjacent months must not leak in
            create_test_payment(
                "5",
                "2025-05-31",
                999.0,
                PaymentStatus::Pending,
                PaymentPriority::Low,
            ),
            create_test_payment(
                "6",
                "2025-07-01",
                999.0,
                PaymentStatus::Pending,
                PaymentPriority::Low,
            ),
        ];

        let calendar = service.generate_calendar_month(6, 2025, &payments, today());

        let mut bucketed_ids: Vec<String> = calendar
            .days
            .iter()
            .flat_map(|d| d.payments.iter().map(|p| p.id.clone()))
            .collect();
        bucketed_ids.sort();

        // No loss, no duplication, no cross-month leakage
        assert_eq!(bucketed_ids, vec!["1", "2", "3", "4"]);
    }

    #[test]
    fn test_non_padded_due_date_still_bucketed() {
        let service = CalendarService::new();

        // Non-padded ISO variants parse, so validation accepts them; the
        // bucket key must not depend on the raw string form
        let payment = create_test_payment(
            "1",
            "2025-6-15",
            250.0,
            PaymentStatus::Pending,
            PaymentPriority::Low,
        );
        assert!(payment.is_valid());

        let calendar = service.generate_calendar_month(6, 2025, &[payment], today());

        let june_15 = calendar.days.iter().find(|d| d.day == 15).unwrap();
        assert_eq!(june_15.payments.len(), 1);
        assert_eq!(june_15.total_amount, 250.0);
    }

    #[test]
    fn test_empty_payment_list_yields_empty_buckets() {
        let service = CalendarService::new();

        let calendar = service.generate_calendar_month(6, 2025, &[], today());

        let month_days: Vec<_> = calendar
            .days
            .iter()
            .filter(|d| d.day_type == CalendarDayType::MonthDay)
            .collect();
        assert_eq!(month_days.len(), 30);
        assert!(month_days.iter().all(|d| d.payments.is_empty()));
        assert!(month_days.iter().all(|d| d.total_amount == 0.0));
    }

    #[test]
    fn test_every_month_day_present_with_padding() {
        let service = CalendarService::new();

        // June 2025 starts on a Sunday: no padding cells
        let june = service.generate_calendar_month(6, 2025, &[], today());
        assert_eq!(june.first_day_of_week, 0);
        assert_eq!(june.days.len(), 30);

        // July 2025 starts on a Tuesday: two padding cells
        let july = service.generate_calendar_month(7, 2025, &[], today());
        assert_eq!(july.first_day_of_week, 2);
        assert_eq!(july.days.len(), 33);
        assert!(july.days[..2]
            .iter()
            .all(|d| d.day_type == CalendarDayType::PaddingBefore && !d.is_current_month));
        assert_eq!(july.days[2].day, 1);
    }

    #[test]
    fn test_today_and_current_month_flags() {
        let service = CalendarService::new();

        let calendar = service.generate_calendar_month(6, 2025, &[], today());

        let todays: Vec<_> = calendar.days.iter().filter(|d| d.is_today).collect();
        assert_eq!(todays.len(), 1);
        assert_eq!(todays[0].day, 10);

        // Another month never flags today
        let july = service.generate_calendar_month(7, 2025, &[], today());
        assert!(july.days.iter().all(|d| !d.is_today));
    }

    #[test]
    fn test_conflict_and_critical_flags() {
        let service = CalendarService::new();

        let mut conflicted = create_test_payment(
            "1",
            "2025-06-20",
            750.0,
            PaymentStatus::Pending,
            PaymentPriority::Critical,
        );
        conflicted.conflict = Some(shared::ConflictMetadata {
            has_conflict: true,
            local_updated_at: "2025-06-09T10:00:00+00:00".to_string(),
            remote_updated_at: "2025-06-09T10:05:00+00:00".to_string(),
        });

        let calendar = service.generate_calendar_month(6, 2025, &[conflicted], today());

        let june_20 = calendar.days.iter().find(|d| d.day == 20).unwrap();
        assert!(june_20.has_critical);
        assert!(june_20.has_conflicts);
        assert!(!june_20.has_overdue);
    }

    #[test]
    fn test_malformed_due_date_is_skipped() {
        let service = CalendarService::new();

        let mut bad = create_test_payment(
            "1",
            "mid June",
            100.0,
            PaymentStatus::Pending,
            PaymentPriority::Low,
        );
        bad.due_date = "mid June".to_string();

        let calendar = service.generate_calendar_month(6, 2025, &[bad], today());
        assert!(calendar.days.iter().all(|d| d.payments.is_empty()));
    }

    #[test]
    fn test_format_due_date_for_display() {
        let service = CalendarService::new();

        let payment = create_test_payment(
            "1",
            "2025-06-13",
            100.0,
            PaymentStatus::Pending,
            PaymentPriority::Low,
        );
        assert_eq!(service.format_due_date_for_display(&payment), "June 13, 2025");

        let mut bad = payment.clone();
        bad.due_date = "invalid-date".to_string();
        assert_eq!(service.format_due_date_for_display(&bad), "invalid-date");
    }

    #[test]
    fn test_set_focus_date() {
        let service = CalendarService::new();

        let result = service.set_focus_date(6, 2025);
        assert!(result.is_ok());
        let focus_date = result.unwrap();
        assert_eq!(focus_date.month, 6);
        assert_eq!(focus_date.year, 2025);

        let retrieved = service.get_focus_date();
        assert_eq!(retrieved.month, 6);
        assert_eq!(retrieved.year, 2025);

        assert!(service.set_focus_date(13, 2025).is_err());
        assert!(service.set_focus_date(0, 2025).is_err());
    }

    #[test]
    fn test_navigate_focus_date() {
        let service = CalendarService::new();

        service.set_focus_date(6, 2025).unwrap();
        let focus_date = service.navigate_previous_month();
        assert_eq!(focus_date.month, 5);
        assert_eq!(focus_date.year, 2025);

        service.set_focus_date(1, 2025).unwrap();
        let focus_date = service.navigate_previous_month();
        assert_eq!(focus_date.month, 12);
        assert_eq!(focus_date.year, 2024);

        service.set_focus_date(12, 2025).unwrap();
        let focus_date = service.navigate_next_month();
        assert_eq!(focus_date.month, 1);
        assert_eq!(focus_date.year, 2026);
    }
}
