/*
 * Error type shared by every layer of the crate. Programming errors such as
 * creating a window twice or registering a handler after creation surface as
 * typed variants so callers can handle them at construction time; failed OS
 * calls carry the operation name and its arguments.
 */
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlatformError {
    InitializationFailed(String),
    OperationFailed(String),
    InvalidHandle(String),
    AlreadyCreated(String),
    Win32Call { operation: String, detail: String },
    Io(String),
}

impl PlatformError {
    pub(crate) fn win32_call(operation: impl Into<String>, detail: impl Into<String>) -> Self {
        PlatformError::Win32Call {
            operation: operation.into(),
            detail: detail.into(),
        }
    }
}

impl fmt::Display for PlatformError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlatformError::InitializationFailed(msg) => write!(f, "initialization failed: {msg}"),
            PlatformError::OperationFailed(msg) => write!(f, "operation failed: {msg}"),
            PlatformError::InvalidHandle(msg) => write!(f, "invalid handle: {msg}"),
            PlatformError::AlreadyCreated(msg) => write!(f, "already created: {msg}"),
            PlatformError::Win32Call { operation, detail } => {
                write!(f, "{operation} failed: {detail}")
            }
            PlatformError::Io(msg) => write!(f, "I/O error: {msg}"),
        }
    }
}

impl std::error::Error for PlatformError {}

#[cfg(target_os = "windows")]
impl From<windows::core::Error> for PlatformError {
    fn from(err: windows::core::Error) -> Self {
        PlatformError::Win32Call {
            operation: "Win32".to_string(),
            detail: format!("{} (HRESULT {:#010X})", err.message(), err.code().0),
        }
    }
}

pub type Result<T> = std::result::Result<T, PlatformError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn win32_call_display_names_operation_and_arguments() {
        let err = PlatformError::win32_call("CB_ADDSTRING", "item \"x\" rejected (CB_ERR)");
        assert_eq!(
            err.to_string(),
            "CB_ADDSTRING failed: item \"x\" rejected (CB_ERR)"
        );
    }

    #[test]
    fn already_created_is_distinct_from_operation_failed() {
        let a = PlatformError::AlreadyCreated("button 20001".to_string());
        let b = PlatformError::OperationFailed("button 20001".to_string());
        assert_ne!(a, b);
        assert!(a.to_string().starts_with("already created"));
    }
}
