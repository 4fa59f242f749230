/// Result alias that carries the custom [`FlickerError`] type.
pub type Result<T> = std::result::Result<T, FlickerError>;

/// Common error type for the core crate.
#[derive(Debug, thiserror::Error)]
pub enum FlickerError {
    /// The payload contains a character that is not a hexadecimal digit.
    #[error("invalid payload: `{character}` at position {position} is not a hex digit")]
    InvalidPayload { position: usize, character: char },
    /// The payload has an odd number of digits, so the last digit has no
    /// partner to swap with.
    #[error("invalid payload: odd number of hex digits ({len})")]
    OddLengthPayload { len: usize },
    /// The preference storage facility is missing or refused the operation.
    #[error("preference storage unavailable: {0}")]
    StorageUnavailable(String),
    /// Configuration values that would make the timing model degenerate.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    /// Free-form message used by the host application.
    #[error("{0}")]
    Message(String),
    /// Wrapper around standard IO errors.
    #[error("{0}")]
    Io(#[from] std::io::Error),
    /// Wrapper around JSON (de)serialisation errors.
    #[error("{0}")]
    Json(#[from] serde_json::Error),
}

impl FlickerError {
    /// Creates a new error that simply wraps the provided message.
    pub fn msg<T: Into<String>>(msg: T) -> Self {
        Self::Message(msg.into())
    }

    /// True for every variant describing a payload that cannot be encoded.
    pub fn is_invalid_payload(&self) -> bool {
        matches!(
            self,
            Self::InvalidPayload { .. } | Self::OddLengthPayload { .. }
        )
    }
}

impl From<&str> for FlickerError {
    fn from(value: &str) -> Self {
        Self::msg(value)
    }
}

impl From<String> for FlickerError {
    fn from(value: String) -> Self {
        Self::Message(value)
    }
}
