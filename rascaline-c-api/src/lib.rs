#![warn(clippy::all, clippy::pedantic)]

// disable some style lints
#![allow(clippy::needless_return, clippy::redundant_field_names, clippy::upper_case_acronyms)]
#![allow(clippy::missing_errors_doc, clippy::missing_safety_doc, clippy::missing_panics_doc)]
#![allow(clippy::must_use_candidate, clippy::module_name_repetitions)]

// Tests lints
#![cfg_attr(test, allow(clippy::float_cmp))]

mod utils;

#[macro_use]
mod status;
pub use self::status::{catch_unwind, rascal_status_t, rascal_last_error};

mod logging;
pub use self::logging::{rascal_logging_callback_t, rascal_set_logging_callback};

mod profiling;
pub use self::profiling::{rascal_profiling_clear, rascal_profiling_enable, rascal_profiling_get};

pub mod system;
pub mod descriptor;
pub mod calculator;
