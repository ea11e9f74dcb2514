use thiserror::Error;

/// Request-level failures. The `Display` text is exactly what the client receives;
/// the parser detail behind `Malformed` stays in the error source for logs.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("ERROR: Malformed request.")]
    Malformed(#[from] serde_json::Error),
    #[error("ERROR: No \"mode\" in request.")]
    MissingMode,
    #[error("ERROR: Value for \"mode\" unknown.")]
    UnknownMode(String),
    #[error("ERROR: No \"msg\" in request.")]
    MissingMsg,
    #[error("ERROR: Request exceeds {0} bytes.")]
    TooLong(usize),
    #[error("ERROR: Request is not valid UTF-8.")]
    NotUtf8,
}
