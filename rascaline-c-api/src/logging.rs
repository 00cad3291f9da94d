use std::ffi::CString;
use std::os::raw::c_char;
use std::sync::Mutex;

use log::{Record, Metadata};
use once_cell::sync::Lazy;

use crate::{catch_unwind, rascal_status_t};

/// Callback function type for rascaline logging system. Such functions are
/// called when a log event is emitted in the code.
///
/// The first argument is the log level, one of `RASCAL_LOG_LEVEL_ERROR`,
/// `RASCAL_LOG_LEVEL_WARN` `RASCAL_LOG_LEVEL_INFO`, `RASCAL_LOG_LEVEL_DEBUG`,
/// or `RASCAL_LOG_LEVEL_TRACE`. The second argument is a NULL-terminated
/// string containing the message associated with the log event.
#[allow(non_camel_case_types)]
pub type rascal_logging_callback_t = Option<unsafe extern fn(level: i32, message: *const c_char)>;

/// The "error" level designates very serious errors
pub const RASCAL_LOG_LEVEL_ERROR: i32 = 1;
/// The "warn" level designates hazardous situations
pub const RASCAL_LOG_LEVEL_WARN: i32 = 2;
/// The "info" level designates useful information
pub const RASCAL_LOG_LEVEL_INFO: i32 = 3;
/// The "debug" level designates lower priority information
pub const RASCAL_LOG_LEVEL_DEBUG: i32 = 4;
/// The "trace" level designates very low priority, often extremely verbose,
/// information.
pub const RASCAL_LOG_LEVEL_TRACE: i32 = 5;

static GLOBAL_CALLBACK: Lazy<Mutex<rascal_logging_callback_t>> = Lazy::new(|| Mutex::new(None));

/// Implementation of `log::Log` that forward all log messages to the global
/// `rascal_logging_callback_t`.
struct RascalLogger;

impl log::Log for RascalLogger {
    fn enabled(&self, _: &Metadata) -> bool {
        return true;
    }

    fn log(&self, record: &Record) {
        let message = format!("{} -- {}", record.target(), record.args());
        let message = CString::new(message.replace('\0', "\\0")).unwrap_or_default();

        let level = match record.level() {
            log::Level::Error => RASCAL_LOG_LEVEL_ERROR,
            log::Level::Warn => RASCAL_LOG_LEVEL_WARN,
            log::Level::Info => RASCAL_LOG_LEVEL_INFO,
            log::Level::Debug => RASCAL_LOG_LEVEL_DEBUG,
            log::Level::Trace => RASCAL_LOG_LEVEL_TRACE,
        };

        // release the lock before calling the callback, which is allowed to
        // call `rascal_set_logging_callback`
        let callback = match GLOBAL_CALLBACK.lock() {
            Ok(guard) => *guard,
            Err(_) => return,
        };

        if let Some(callback) = callback {
            unsafe {
                callback(level, message.as_ptr());
            }
        }
    }

    fn flush(&self) {}
}

/// Set the given ``callback`` function as the global logging callback. This
/// function will be called on all log events. If a logging callback was
/// already set, it is replaced by the new one.
///
/// Passing a `NULL` callback silences all log events.
///
/// @param callback function to call on log events, or `NULL`
///
/// @returns The status code of this operation. If the status is not
///          `RASCAL_SUCCESS`, you can use `rascal_last_error()` to get the full
///          error message.
#[no_mangle]
pub unsafe extern fn rascal_set_logging_callback(callback: rascal_logging_callback_t) -> rascal_status_t {
    catch_unwind(|| {
        match GLOBAL_CALLBACK.lock() {
            Ok(mut guard) => *guard = callback,
            Err(_) => return Err(rascaline::Error::Internal(
                "the logging callback mutex was poisoned".into()
            )),
        }

        // the logger can only be set once, later calls only change the
        // callback it forwards to
        let _ = log::set_boxed_logger(Box::new(RascalLogger));

        if cfg!(debug_assertions) {
            log::set_max_level(log::LevelFilter::Debug);
        } else {
            log::set_max_level(log::LevelFilter::Info);
        }

        Ok(())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::CStr;
    use std::sync::atomic::{AtomicBool, Ordering};

    static MESSAGES: Lazy<Mutex<Vec<(i32, String)>>> = Lazy::new(|| Mutex::new(Vec::new()));

    unsafe extern fn record(level: i32, message: *const c_char) {
        let message = CStr::from_ptr(message).to_string_lossy().into_owned();
        MESSAGES.lock().unwrap().push((level, message));
    }

    static REPLACED: AtomicBool = AtomicBool::new(false);

    unsafe extern fn replace_itself(_: i32, _: *const c_char) {
        let status = rascal_set_logging_callback(Some(record));
        REPLACED.store(status.is_success(), Ordering::SeqCst);
    }

    #[test]
    fn forward_to_callback() {
        unsafe {
            assert!(rascal_set_logging_callback(Some(replace_itself)).is_success());
        }

        // the callback can change the global callback without deadlocking
        log::warn!("log-test-warn: replacing the callback");
        assert!(REPLACED.load(Ordering::SeqCst));

        log::warn!("log-test-warn: something happened");
        log::info!("log-test-info: some information");

        let messages = MESSAGES.lock().unwrap();
        assert!(messages.iter().any(|(level, message)| {
            *level == RASCAL_LOG_LEVEL_WARN && message.ends_with("-- log-test-warn: something happened")
        }));
        assert!(messages.iter().any(|(level, message)| {
            *level == RASCAL_LOG_LEVEL_INFO && message.ends_with("-- log-test-info: some information")
        }));
    }
}
