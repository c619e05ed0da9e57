//! Time and timestamp helpers.
//!
//! Schedules are wall-clock constructs ("07:00 means 07:00 on the wall"),
//! so the whole domain works in local naive time rather than UTC.

use chrono::NaiveDateTime;

/// Local wall-clock timestamp used for override windows, advance history,
/// and event times.
pub type Timestamp = NaiveDateTime;

/// Return the current local wall-clock time.
#[must_use]
pub fn now() -> Timestamp {
    chrono::Local::now().naive_local()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_return_current_local_time() {
        let before = chrono::Local::now().naive_local();
        let ts = now();
        let after = chrono::Local::now().naive_local();
        assert!(ts >= before);
        assert!(ts <= after);
    }
}
