pub mod service;
pub mod transitions;

pub use service::{BookingRequest, BookingService};
pub use transitions::check_transition;
