use error_location::ErrorLocation;
use thiserror::Error;

/// Pipeline errors with source location tracking.
#[derive(Error, Debug)]
pub enum CaptureError {
    /// An actor's inbound channel is closed (the actor has shut down).
    #[error("Channel closed: {channel} {location}")]
    ChannelClosed {
        /// Name of the channel that was closed.
        channel: &'static str,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// An actor dropped the reply sender without answering.
    #[error("Response dropped: {request} {location}")]
    ResponseDropped {
        /// Name of the request whose reply was dropped.
        request: &'static str,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// An actor answered with an envelope of the wrong kind.
    #[error("Unexpected reply: expected {expected}, got {actual} {location}")]
    UnexpectedReply {
        /// Envelope kind that was expected.
        expected: &'static str,
        /// Envelope kind that arrived.
        actual: &'static str,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// The host's own capability failed. Wrappers pass this through untouched.
    #[error("Host capability failed: {reason} {location}")]
    HostCapability {
        /// Description supplied by the host.
        reason: String,
        /// Source location where error occurred.
        location: ErrorLocation,
    },
}

/// Result type alias using [`CaptureError`].
pub type Result<T> = std::result::Result<T, CaptureError>;
