//! Conversion between caller types and BSON documents.
//!
//! Filters, updates and stored records cross the engine boundary as
//! [`bson::Document`]s. Anything implementing `Serialize` can be written and
//! anything implementing `DeserializeOwned` can be a fetch destination; a shape
//! mismatch on the way out surfaces as [`FacadeError::Decode`].

use bson::{
    Document,
    de::deserialize_from_document,
    ser::serialize_to_document,
};
use serde::{Serialize, de::DeserializeOwned};

use crate::error::{FacadeError, FacadeResult, decode_error, encode_error};

/// Encodes a caller value into a BSON document.
///
/// # Errors
///
/// Returns [`FacadeError::Encode`] if the value does not serialize to a document
/// (for example a bare string or number).
pub fn to_document<T>(value: &T) -> FacadeResult<Document>
where
    T: Serialize + ?Sized,
{
    serialize_to_document(value).map_err(encode_error)
}

/// Encodes every value of a batch, failing on the first one that does not encode.
pub fn to_documents<T>(values: &[T]) -> FacadeResult<Vec<Document>>
where
    T: Serialize,
{
    values
        .iter()
        .map(to_document)
        .collect()
}

/// Decodes a stored document into the caller's destination type.
///
/// # Errors
///
/// Returns [`FacadeError::Decode`] if the document does not fit `T`.
pub fn from_document<T>(document: Document) -> FacadeResult<T>
where
    T: DeserializeOwned,
{
    deserialize_from_document(document).map_err(decode_error)
}

/// Rejects replacement documents that carry top-level update operators.
pub(crate) fn ensure_no_operators(document: &Document) -> FacadeResult<()> {
    match document.keys().find(|key| key.starts_with('$')) {
        Some(key) => Err(FacadeError::Encode(format!(
            "replacement document must not contain update operator '{key}'"
        ))),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::doc;
    use serde::Deserialize;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct User {
        name: String,
        age: i32,
    }

    #[test]
    fn decode_shape_mismatch_is_a_decode_error() {
        let err = from_document::<User>(doc! { "name": "Priya", "age": "twenty-two" }).unwrap_err();

        assert!(err.is_decode());
    }

    #[test]
    fn non_document_values_fail_to_encode() {
        let err = to_document(&42_i32).unwrap_err();

        assert!(matches!(err, FacadeError::Encode(_)));
    }

    #[test]
    fn encodes_structs_field_by_field() {
        let encoded = to_document(&User { name: "Shekhar".into(), age: 25 }).unwrap();

        assert_eq!(encoded, doc! { "name": "Shekhar", "age": 25 });
    }

    #[test]
    fn replacement_documents_reject_operators() {
        assert!(ensure_no_operators(&doc! { "name": "Priya" }).is_ok());
        assert!(ensure_no_operators(&doc! { "$set": { "name": "Priya" } }).is_err());
    }
}
