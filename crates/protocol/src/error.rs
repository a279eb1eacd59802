//! Errors raised while exchanging batches with a peer.
//!
//! Malformed lines are not errors: decoders drop them with a warning and
//! keep going. Only transport failures and a missing batch header surface.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProtocolError {
    /// The connection failed for a reason other than a clean end-of-stream
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A rating batch ended without ever naming its target user
    #[error("rating batch has no `UserID:` header")]
    MissingTargetUser,
}

pub type Result<T> = std::result::Result<T, ProtocolError>;
