use crate::GdsResult;

/// Extension trait for GdsResult
pub trait ResultExt<T>: private::Sealed {
    /// Flatten a nested [`GdsResult`]. Helper function until <https://github.com/rust-lang/rust/issues/70142> is stabilized.
    fn flatten(self) -> GdsResult<T>;
}

mod private {
    use crate::GdsResult;

    pub trait Sealed {}

    impl<T> Sealed for GdsResult<T> {}
}

impl<T> ResultExt<T> for GdsResult<GdsResult<T>> {
    fn flatten(self) -> GdsResult<T> {
        match self {
            Ok(Ok(v)) => Ok(v),
            Ok(Err(e)) | Err(e) => Err(e),
        }
    }
}

/// Stores the text of a failed result as the process-wide last error.
pub trait RecordLastError: private::Sealed + Sized {
    /// Record the error text, if any, and hand the result back unchanged.
    fn record_last_error(self) -> Self;
}

impl<T> RecordLastError for GdsResult<T> {
    fn record_last_error(self) -> Self {
        if let Err(err) = &self {
            crate::set_last_error(Some(&err.to_string()));
        }
        self
    }
}
