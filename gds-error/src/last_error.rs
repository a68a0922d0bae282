//! Process-wide last-error text, read by binding layers after a failed call.

use parking_lot::Mutex;

static LAST_ERROR: Mutex<String> = parking_lot::const_mutex(String::new());

/// The text of the most recently recorded error, or an empty string.
pub fn last_error() -> String {
    LAST_ERROR.lock().clone()
}

/// Replace the recorded error text; `None` clears it.
pub fn set_last_error(msg: Option<&str>) {
    let mut slot = LAST_ERROR.lock();
    slot.clear();
    if let Some(msg) = msg {
        slot.push_str(msg);
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{GdsResult, RecordLastError, WRITE_ONLY_MSG, gds_err};

    // One test owns the global slot so parallel test threads do not race on it.
    #[test]
    fn record_set_and_clear() {
        set_last_error(Some("first"));
        assert_eq!(last_error(), "first");

        let failed: GdsResult<()> = Err(gds_err!(AllocRead: "{}", WRITE_ONLY_MSG));
        assert!(failed.record_last_error().is_err());
        assert_eq!(last_error(), WRITE_ONLY_MSG);

        let ok: GdsResult<u8> = Ok(3);
        assert_eq!(ok.record_last_error().ok(), Some(3));
        assert_eq!(last_error(), WRITE_ONLY_MSG);

        set_last_error(None);
        assert!(last_error().is_empty());
    }
}
