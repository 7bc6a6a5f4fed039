pub mod use_payment_calendar;
pub mod use_session_timeout;
pub mod use_touch_gestures;

pub use use_payment_calendar::use_payment_calendar;
pub use use_session_timeout::use_session_timeout;
pub use use_touch_gestures::use_touch_gestures;
