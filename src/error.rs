//! Error types used by the gitglow runtime, its tasks and collaborators.
//!
//! - [`RuntimeError`]: failures of the orchestration runtime itself.
//! - [`TaskError`]: terminal outcome of a supervised task.
//! - [`ServiceError`]: failures reported by collaborators (remote client, display, hotspot).
//! - [`SettingsError`]: configuration load/save failures.
//!
//! Every enum provides `as_label()` for stable snake_case log fields.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// # Errors produced by the orchestration runtime.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// Shutdown grace period was exceeded; the listed tasks were aborted.
    #[error("shutdown timeout {grace:?} exceeded; stuck: {stuck:?}; forcing termination")]
    GraceExceeded {
        /// The configured grace duration.
        grace: Duration,
        /// Names of the tasks that did not stop in time.
        stuck: Vec<String>,
    },

    /// OS signal listeners could not be installed.
    #[error("failed to register signal handlers: {0}")]
    SignalRegistration(#[from] std::io::Error),
}

impl RuntimeError {
    /// Returns a short stable label (snake_case) for use in logs.
    ///
    /// # Example
    /// ```
    /// use gitglow::RuntimeError;
    /// use std::time::Duration;
    ///
    /// let err = RuntimeError::GraceExceeded { grace: Duration::from_secs(5), stuck: vec![] };
    /// assert_eq!(err.as_label(), "runtime_grace_exceeded");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            RuntimeError::GraceExceeded { .. } => "runtime_grace_exceeded",
            RuntimeError::SignalRegistration(_) => "runtime_signal_registration",
        }
    }
}

/// # Terminal outcome of a supervised task.
///
/// Poll loops never return `Fail`/`Timeout` to the supervisor: those are recovered inside the
/// loop. Anything other than [`TaskError::Canceled`] that reaches the supervisor is treated as
/// unrecoverable and triggers a full shutdown.
#[non_exhaustive]
#[derive(Error, Debug, Clone)]
pub enum TaskError {
    /// One attempt exceeded its timeout.
    #[error("timed out after {timeout:?}")]
    Timeout {
        /// The timeout duration that was exceeded.
        timeout: Duration,
    },

    /// Non-recoverable error (e.g. the web server could not bind its port).
    #[error("fatal error: {error}")]
    Fatal {
        /// The underlying error message.
        error: String,
    },

    /// One attempt failed but may succeed if retried.
    #[error("execution failed: {error}")]
    Fail {
        /// The underlying error message.
        error: String,
    },

    /// Task observed the shutdown signal and exited.
    #[error("context cancelled")]
    Canceled,
}

impl TaskError {
    /// Convenience constructor for [`TaskError::Fatal`].
    pub fn fatal(error: impl std::fmt::Display) -> Self {
        TaskError::Fatal {
            error: error.to_string(),
        }
    }

    /// Convenience constructor for [`TaskError::Fail`].
    pub fn fail(error: impl std::fmt::Display) -> Self {
        TaskError::Fail {
            error: error.to_string(),
        }
    }

    /// Returns a short stable label (snake_case) for use in logs.
    ///
    /// # Example
    /// ```
    /// use gitglow::TaskError;
    /// use std::time::Duration;
    ///
    /// let err = TaskError::Timeout { timeout: Duration::from_secs(1) };
    /// assert_eq!(err.as_label(), "task_timeout");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            TaskError::Timeout { .. } => "task_timeout",
            TaskError::Fatal { .. } => "task_fatal",
            TaskError::Fail { .. } => "task_failed",
            TaskError::Canceled => "task_canceled",
        }
    }
}

/// # Errors reported by external collaborators.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum ServiceError {
    /// Transport-level failure talking to the remote service.
    #[error("request failed: {0}")]
    Request(String),

    /// Remote answered with a non-success status.
    #[error("remote returned {status}: {message}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Response body or reason.
        message: String,
    },

    /// Remote rate limit exhausted.
    #[error("rate limited by remote service (reset at epoch {reset:?})")]
    RateLimited {
        /// Unix timestamp when the quota resets, if the remote reported it.
        reset: Option<u64>,
    },

    /// Response could not be interpreted.
    #[error("unexpected response: {0}")]
    Response(String),

    /// Display renderer failure.
    #[error("display error: {0}")]
    Display(String),

    /// Hotspot / network manager failure.
    #[error("network manager error: {0}")]
    Network(String),

    /// Required configuration value is missing.
    #[error("missing configuration: {0}")]
    Config(&'static str),

    /// Local I/O failure.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl ServiceError {
    /// Returns a short stable label (snake_case) for use in logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            ServiceError::Request(_) => "service_request",
            ServiceError::Status { .. } => "service_status",
            ServiceError::RateLimited { .. } => "service_rate_limited",
            ServiceError::Response(_) => "service_response",
            ServiceError::Display(_) => "service_display",
            ServiceError::Network(_) => "service_network",
            ServiceError::Config(_) => "service_config",
            ServiceError::Io(_) => "service_io",
        }
    }
}

impl From<reqwest::Error> for ServiceError {
    fn from(err: reqwest::Error) -> Self {
        ServiceError::Request(err.to_string())
    }
}

/// # Errors raised while loading or persisting settings.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum SettingsError {
    /// Reading or writing the settings file failed.
    #[error("settings io error at {path}: {source}")]
    Io {
        /// File the operation targeted.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// Settings file is not valid TOML for [`Settings`](crate::Settings).
    #[error("invalid settings file: {0}")]
    Parse(#[from] toml::de::Error),

    /// Settings could not be serialized.
    #[error("failed to serialize settings: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// A submitted value was rejected.
    #[error("invalid setting: {0}")]
    Invalid(String),
}

impl SettingsError {
    /// Returns a short stable label (snake_case) for use in logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            SettingsError::Io { .. } => "settings_io",
            SettingsError::Parse(_) => "settings_parse",
            SettingsError::Serialize(_) => "settings_serialize",
            SettingsError::Invalid(_) => "settings_invalid",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeout_reports_duration() {
        let err = TaskError::Timeout {
            timeout: Duration::from_secs(1),
        };
        assert_eq!(err.to_string(), "timed out after 1s");
        assert_eq!(TaskError::Canceled.as_label(), "task_canceled");
    }

    #[test]
    fn fatal_message_carries_cause() {
        let err = TaskError::fatal("address in use");
        assert_eq!(err.to_string(), "fatal error: address in use");
        assert_eq!(err.as_label(), "task_fatal");
    }

    #[test]
    fn rate_limit_label() {
        let err = ServiceError::RateLimited { reset: Some(42) };
        assert_eq!(err.as_label(), "service_rate_limited");
        assert!(err.to_string().contains("42"));
    }
}
