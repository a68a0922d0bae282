#![deny(missing_docs)]

//! This crate defines error & result types for the GDS array storage engine.
//!
//! Every failure the engine can report is a [`GdsError`]. Errors carry a backtrace captured at the
//! point of construction, and are classified by [`GdsError::kind`] into the coarse categories a
//! binding layer translates into its own exception types.

mod ext;
mod last_error;

use std::backtrace::Backtrace;
use std::borrow::Cow;
use std::fmt::{Debug, Display, Formatter};
use std::ops::Deref;
use std::{env, fmt, io};

pub use ext::*;
pub use last_error::*;

/// Message shown when a write-only pipe is read before it was finalised.
pub const WRITE_ONLY_MSG: &str = "the array is write-only; call close_writer() before reading";

/// A string that can be used as an error message.
#[derive(Debug)]
pub struct ErrString(Cow<'static, str>);

#[allow(clippy::fallible_impl_from)]
impl<T> From<T> for ErrString
where
    T: Into<Cow<'static, str>>,
{
    #[allow(clippy::panic)]
    fn from(msg: T) -> Self {
        if env::var("GDS_PANIC_ON_ERR").as_deref().unwrap_or("") == "1" {
            panic!("{}\nBacktrace:\n{}", msg.into(), Backtrace::capture());
        } else {
            Self(msg.into())
        }
    }
}

impl AsRef<str> for ErrString {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Deref for ErrString {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl Display for ErrString {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Display::fmt(&self.0, f)
    }
}

/// The coarse category of a [`GdsError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// A start, length or selection lies outside the array, or the rank does not match.
    Bounds,
    /// The underlying stream failed, or the allocator is not bound to a stream.
    Allocator,
    /// Data was read from a stream that cannot be read (yet), or past its end.
    AllocRead,
    /// Data was written to a stream that cannot be written.
    AllocWrite,
    /// A value type cannot be produced from, or stored as, the requested type.
    Conversion,
    /// The array changed shape underneath a reader.
    Consistency,
    /// Any other invalid argument.
    InvalidArgument,
}

// Same type as `Backtrace`; spelled differently so `thiserror` does not emit the
// nightly-only `Error::provide` method for these fields on stable toolchains.
type CapturedBacktrace = Backtrace;

/// The top-level error type for the GDS storage engine.
#[derive(thiserror::Error)]
#[non_exhaustive]
pub enum GdsError {
    /// An index is out of bounds.
    #[error("index {0} out of bounds from {1} to {2}")]
    OutOfBounds(i64, i64, i64, CapturedBacktrace),
    /// A region or selection does not fit the array.
    #[error("{0}")]
    Bounds(ErrString, CapturedBacktrace),
    /// An invalid argument was provided.
    #[error("{0}")]
    InvalidArgument(ErrString, CapturedBacktrace),
    /// The allocator is unusable, eg. not bound to a stream.
    #[error("{0}")]
    Allocator(ErrString, CapturedBacktrace),
    /// Reading is not permitted, or ran past the end of the data.
    #[error("{0}")]
    AllocRead(ErrString, CapturedBacktrace),
    /// Writing is not permitted.
    #[error("{0}")]
    AllocWrite(ErrString, CapturedBacktrace),
    /// A type conversion is not supported.
    #[error("{0}")]
    Conversion(ErrString, CapturedBacktrace),
    /// State observed by a long-lived cursor no longer matches its array.
    #[error("{0}")]
    Consistency(ErrString, CapturedBacktrace),
    /// A wrapper for IO errors from the underlying stream.
    #[error("{0}")]
    IOError(io::Error, CapturedBacktrace),
    /// A wrapper for other errors, carrying additional context.
    #[error("{0}: {1}")]
    Context(ErrString, #[source] Box<GdsError>),
}

impl GdsError {
    /// Adds additional context to an error.
    pub fn with_context<T: Into<ErrString>>(self, msg: T) -> Self {
        GdsError::Context(msg.into(), Box::new(self))
    }

    /// The category of this error, looking through any context wrappers.
    pub fn kind(&self) -> ErrorKind {
        match self {
            GdsError::OutOfBounds(..) | GdsError::Bounds(..) => ErrorKind::Bounds,
            GdsError::InvalidArgument(..) => ErrorKind::InvalidArgument,
            GdsError::Allocator(..) | GdsError::IOError(..) => ErrorKind::Allocator,
            GdsError::AllocRead(..) => ErrorKind::AllocRead,
            GdsError::AllocWrite(..) => ErrorKind::AllocWrite,
            GdsError::Conversion(..) => ErrorKind::Conversion,
            GdsError::Consistency(..) => ErrorKind::Consistency,
            GdsError::Context(_, inner) => inner.kind(),
        }
    }

    /// The backtrace captured when the innermost error was created.
    pub fn backtrace(&self) -> &Backtrace {
        match self {
            GdsError::OutOfBounds(.., bt)
            | GdsError::Bounds(_, bt)
            | GdsError::InvalidArgument(_, bt)
            | GdsError::Allocator(_, bt)
            | GdsError::AllocRead(_, bt)
            | GdsError::AllocWrite(_, bt)
            | GdsError::Conversion(_, bt)
            | GdsError::Consistency(_, bt)
            | GdsError::IOError(_, bt) => bt,
            GdsError::Context(_, inner) => inner.backtrace(),
        }
    }
}

impl Debug for GdsError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}\nBacktrace:\n{}", self, self.backtrace())
    }
}

impl From<io::Error> for GdsError {
    fn from(err: io::Error) -> Self {
        if err.kind() == io::ErrorKind::UnexpectedEof {
            GdsError::AllocRead(
                format!("read past the end of the stream: {err}").into(),
                Backtrace::capture(),
            )
        } else {
            GdsError::IOError(err, Backtrace::capture())
        }
    }
}

/// A type alias for Results that return GdsErrors as their error type.
pub type GdsResult<T> = Result<T, GdsError>;

/// A trait for unwrapping a GdsResult.
pub trait GdsUnwrap {
    /// The type of the value being unwrapped.
    type Output;

    /// Returns the value of the result if it is Ok, otherwise panics with the error.
    /// Should be called only in contexts where the error condition represents a bug (programmer error).
    fn gds_unwrap(self) -> Self::Output;
}

impl<T, E> GdsUnwrap for Result<T, E>
where
    E: Into<GdsError>,
{
    type Output = T;

    #[inline(always)]
    fn gds_unwrap(self) -> Self::Output {
        self.map_err(|err| err.into())
            .unwrap_or_else(|err| gds_panic!(err))
    }
}

/// A trait for expect-ing a GdsResult or an Option.
pub trait GdsExpect {
    /// The type of the value being expected.
    type Output;

    /// Returns the value of the result if it is Ok, otherwise panics with the error.
    /// Should be called only in contexts where the error condition represents a bug (programmer error).
    fn gds_expect(self, msg: &str) -> Self::Output;
}

impl<T, E> GdsExpect for Result<T, E>
where
    E: Into<GdsError>,
{
    type Output = T;

    #[inline(always)]
    fn gds_expect(self, msg: &str) -> Self::Output {
        self.map_err(|err| err.into())
            .unwrap_or_else(|e| gds_panic!(e.with_context(msg.to_string())))
    }
}

impl<T> GdsExpect for Option<T> {
    type Output = T;

    #[inline(always)]
    fn gds_expect(self, msg: &str) -> Self::Output {
        self.unwrap_or_else(|| gds_panic!("{}", msg))
    }
}

/// A convenient macro for creating a GdsError.
#[macro_export]
macro_rules! gds_err {
    (OutOfBounds: $idx:expr, $start:expr, $stop:expr) => {{
        use std::backtrace::Backtrace;
        $crate::GdsError::OutOfBounds($idx as i64, $start as i64, $stop as i64, Backtrace::capture())
    }};
    (IOError: $err:expr) => {{
        use std::backtrace::Backtrace;
        $crate::GdsError::IOError($err, Backtrace::capture())
    }};
    (Context: $msg:literal, $err:expr) => {{
        $crate::GdsError::Context($msg.into(), Box::new($err))
    }};
    ($variant:ident: $fmt:literal $(, $arg:expr)* $(,)?) => {{
        use std::backtrace::Backtrace;
        $crate::GdsError::$variant(format!($fmt, $($arg),*).into(), Backtrace::capture())
    }};
    ($fmt:literal $(, $arg:expr)* $(,)?) => {
        $crate::gds_err!(InvalidArgument: $fmt, $($arg),*)
    };
}

/// A convenient macro for returning a GdsError.
#[macro_export]
macro_rules! gds_bail {
    ($($tt:tt)+) => {
        return Err($crate::gds_err!($($tt)+))
    };
}

/// A convenient macro for panicking with a GdsError in the presence of a programmer error
/// (e.g., an invariant has been violated).
#[macro_export]
macro_rules! gds_panic {
    (OutOfBounds: $idx:expr, $start:expr, $stop:expr) => {{
        $crate::gds_panic!($crate::gds_err!(OutOfBounds: $idx, $start, $stop))
    }};
    ($variant:ident: $fmt:literal $(, $arg:expr)* $(,)?) => {
        $crate::gds_panic!($crate::gds_err!($variant: $fmt, $($arg),*))
    };
    ($fmt:literal $(, $arg:expr)* $(,)?) => {
        $crate::gds_panic!($crate::gds_err!($fmt, $($arg),*))
    };
    ($err:expr) => {{
        #[allow(clippy::panic)]
        {
            let err: $crate::GdsError = $err;
            panic!("{}", err)
        }
    }};
}
