//! Error types and result types for facade operations.
//!
//! Every failure coming out of the wrapped engine keeps its category: a query the
//! engine rejected stays a [`FacadeError::QuerySubmission`], a failure while
//! iterating stays a [`FacadeError::CursorDrain`], and so on. Use
//! [`FacadeResult<T>`] as the return type for fallible operations.

use bson::error::Error as BsonError;
use thiserror::Error;

/// Represents all possible errors that can occur when going through the facade.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FacadeError {
    /// The engine could not be built or did not answer the reachability probe.
    #[error("Connection error: {0}")]
    Connection(String),
    /// The engine failed to tear down the connection.
    #[error("Disconnect error: {0}")]
    Disconnect(String),
    /// The engine rejected a query, pipeline or filter.
    #[error("Query submission error: {0}")]
    QuerySubmission(String),
    /// The engine failed while a cursor was being iterated.
    #[error("Cursor drain error: {0}")]
    CursorDrain(String),
    /// The engine failed to release a cursor after it was drained.
    #[error("Cursor release error: {0}")]
    CursorRelease(String),
    /// A document did not fit the shape of the requested destination type.
    #[error("Decode error: {0}")]
    Decode(String),
    /// A caller value could not be encoded into a document.
    #[error("Encode error: {0}")]
    Encode(String),
    /// A single-document lookup matched nothing in the given namespace.
    #[error("No document matched in {0}")]
    NotFound(String),
    /// An insert succeeded but the generated identifier has no string form.
    #[error("Identifier extraction error: {0}")]
    IdentifierExtraction(String),
    /// An option record was rejected before reaching the engine.
    #[error("Invalid options: {0}")]
    InvalidOptions(String),
    /// The engine rejected an insert, update, replace or delete.
    #[error("Write error: {0}")]
    Write(String),
    /// The engine rejected an administrative command.
    #[error("Command error: {0}")]
    Command(String),
}

impl FacadeError {
    /// Returns `true` when a lookup found nothing, as opposed to failing.
    pub fn is_not_found(&self) -> bool {
        matches!(self, FacadeError::NotFound(_))
    }

    /// Returns `true` when the stored data did not fit the destination type.
    pub fn is_decode(&self) -> bool {
        matches!(self, FacadeError::Decode(_))
    }
}

/// A specialized `Result` type for facade operations.
pub type FacadeResult<T> = Result<T, FacadeError>;

/// Maps a BSON error raised while turning a caller value into a document.
pub(crate) fn encode_error(err: BsonError) -> FacadeError {
    FacadeError::Encode(err.to_string())
}

/// Maps a BSON error raised while turning a stored document into a caller value.
pub(crate) fn decode_error(err: BsonError) -> FacadeError {
    FacadeError::Decode(err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_is_distinct_from_decode() {
        let missing = FacadeError::NotFound("db.users".into());
        let malformed = FacadeError::Decode("invalid type: string".into());

        assert!(missing.is_not_found());
        assert!(!missing.is_decode());
        assert!(malformed.is_decode());
        assert!(!malformed.is_not_found());
    }

    #[test]
    fn messages_name_the_category() {
        assert_eq!(
            FacadeError::CursorRelease("killCursors failed".into()).to_string(),
            "Cursor release error: killCursors failed",
        );
        assert_eq!(
            FacadeError::NotFound("db.users".into()).to_string(),
            "No document matched in db.users",
        );
    }
}
