use thiserror::Error;

use crate::ai::GenerationError;

/// Why a submitted prompt did not produce a usable reply.
///
/// These never escape the conversation controller as panics; each one is
/// recorded as the last error and echoed into the transcript.
#[derive(Error, Debug)]
pub enum SubmitError {
    /// The call went through but the service sent nothing back
    #[error("API returned an empty response.")]
    EmptyResponse,

    /// A body arrived but it is not the JSON object we asked for
    #[error("Could not understand the response: {0}")]
    MalformedResponse(String),

    /// Network or provider failure
    #[error(transparent)]
    TransportFailure(#[from] GenerationError),
}

impl SubmitError {
    pub fn kind(&self) -> &'static str {
        match self {
            SubmitError::EmptyResponse => "empty_response",
            SubmitError::MalformedResponse(_) => "malformed_response",
            SubmitError::TransportFailure(_) => "transport_failure",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_failure_uses_source_message() {
        let err = SubmitError::from(GenerationError::Timeout);
        assert_eq!(err.kind(), "transport_failure");
        assert_eq!(err.to_string(), GenerationError::Timeout.to_string());
    }

    #[test]
    fn test_empty_response_message() {
        assert_eq!(SubmitError::EmptyResponse.to_string(), "API returned an empty response.");
    }
}
