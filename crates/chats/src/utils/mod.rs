//! Internal utilities for the chat mutation core.

pub mod clock;
pub mod validation;

pub use clock::{Clock, ManualClock, SystemClock};
pub use validation::{LengthValidator, Validator};
