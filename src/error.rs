use crate::sys;

/// Portable classification of a socket failure.
///
/// The same set of kinds is reported on every platform; only the table that
/// maps raw OS codes onto it differs (see `sys::error_kind`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Unknown,
    BadDescriptor,
    InvalidArgument,
    MemoryFault,
    NotASocket,
    AccessDenied,
    PermissionDenied,
    ConnectionAborted,
    AddressInUse,
    OperationNotSupported,
    /// The operation would have blocked on a non-blocking socket.
    ///
    /// The one kind that is expected in normal operation: poll and retry.
    WouldBlock,
    /// Host name lookup failed or returned no entry for the family.
    Resolution,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Unknown => "unknown error",
            ErrorKind::BadDescriptor => "bad descriptor",
            ErrorKind::InvalidArgument => "invalid argument",
            ErrorKind::MemoryFault => "bad address",
            ErrorKind::NotASocket => "not a socket",
            ErrorKind::AccessDenied => "access denied",
            ErrorKind::PermissionDenied => "permission denied",
            ErrorKind::ConnectionAborted => "connection aborted",
            ErrorKind::AddressInUse => "address in use",
            ErrorKind::OperationNotSupported => "operation not supported",
            ErrorKind::WouldBlock => "operation would block",
            ErrorKind::Resolution => "name resolution failed",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A failed socket operation.
///
/// Carries the portable kind, the name of the operation that failed, the raw
/// platform code when there is one, and the message the OS produced for it.
/// The message is captured when the error is built, before any later call can
/// overwrite the thread's last-error slot.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{op} failed: {message}")]
pub struct SocketError {
    kind: ErrorKind,
    op: &'static str,
    code: Option<i32>,
    message: String,
}

pub type Result<T> = std::result::Result<T, SocketError>;

impl SocketError {
    /// Reads the thread's last OS error and translates it.
    pub fn last_os_error(op: &'static str) -> Self {
        Self::from_code(op, sys::last_error())
    }

    /// Translates a raw platform error code.
    pub fn from_code(op: &'static str, code: i32) -> Self {
        Self {
            kind: sys::error_kind(code),
            op,
            code: Some(code),
            message: os_message(code),
        }
    }

    /// A usage error detected before any OS call was made.
    pub fn invalid_argument(op: &'static str, reason: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::InvalidArgument,
            op,
            code: None,
            message: reason.into(),
        }
    }

    pub(crate) fn resolution(host: &str, reason: impl std::fmt::Display) -> Self {
        Self {
            kind: ErrorKind::Resolution,
            op: "getaddrinfo",
            code: None,
            message: format!("{host}: {reason}"),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// The operation that failed, e.g. `"bind"`.
    pub fn op(&self) -> &'static str {
        self.op
    }

    /// The raw platform code, if the failure came from the OS.
    pub fn raw_os_error(&self) -> Option<i32> {
        self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    #[inline]
    pub fn is_would_block(&self) -> bool {
        self.kind == ErrorKind::WouldBlock
    }
}

/// Message text from the platform's own facility (`strerror` on unix,
/// `FormatMessageW` on Windows), without the `(os error N)` suffix.
fn os_message(code: i32) -> String {
    let text = std::io::Error::from_raw_os_error(code).to_string();
    let suffix = format!(" (os error {code})");
    match text.strip_suffix(&suffix) {
        Some(message) => message.to_owned(),
        None => text,
    }
}

fn kind_to_io(kind: ErrorKind) -> std::io::ErrorKind {
    match kind {
        ErrorKind::InvalidArgument | ErrorKind::MemoryFault => std::io::ErrorKind::InvalidInput,
        ErrorKind::AccessDenied | ErrorKind::PermissionDenied => std::io::ErrorKind::PermissionDenied,
        ErrorKind::ConnectionAborted => std::io::ErrorKind::ConnectionAborted,
        ErrorKind::AddressInUse => std::io::ErrorKind::AddrInUse,
        ErrorKind::OperationNotSupported => std::io::ErrorKind::Unsupported,
        ErrorKind::WouldBlock => std::io::ErrorKind::WouldBlock,
        ErrorKind::Resolution => std::io::ErrorKind::NotFound,
        ErrorKind::Unknown | ErrorKind::BadDescriptor | ErrorKind::NotASocket => {
            std::io::ErrorKind::Other
        }
    }
}

impl From<SocketError> for std::io::Error {
    /// OS failures keep std's own classification of the raw code, so
    /// `Interrupted` reaches `read_exact`/`write_all` and is retried.
    fn from(err: SocketError) -> Self {
        let kind = match err.code {
            Some(code) => std::io::Error::from_raw_os_error(code).kind(),
            None => kind_to_io(err.kind),
        };
        std::io::Error::new(kind, err)
    }
}
