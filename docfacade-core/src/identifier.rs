//! Conversion of engine-generated identifiers into string handles.
//!
//! An insert has already been committed by the time these functions run, so a
//! failure here is a mapping failure, reported as
//! [`FacadeError::IdentifierExtraction`] and never replaced by an empty string.

use bson::Bson;

use crate::error::{FacadeError, FacadeResult};

/// Coerces an inserted identifier into its canonical string form.
///
/// Only `ObjectId` identifiers are coercible; their string form is the
/// 24-character lowercase hex encoding.
pub fn extract_inserted_id(id: &Bson) -> FacadeResult<String> {
    match id {
        Bson::ObjectId(oid) => Ok(oid.to_hex()),
        other => Err(FacadeError::IdentifierExtraction(format!(
            "inserted id is a {:?}, not an ObjectId",
            other.element_type(),
        ))),
    }
}

/// Coerces a batch of inserted identifiers, keeping their order.
///
/// Fails on the first identifier that is not coercible; no partial list is returned.
pub fn extract_inserted_ids(ids: &[Bson]) -> FacadeResult<Vec<String>> {
    ids.iter()
        .enumerate()
        .map(|(index, id)| {
            extract_inserted_id(id).map_err(|err| match err {
                FacadeError::IdentifierExtraction(reason) => {
                    FacadeError::IdentifierExtraction(format!("document {index}: {reason}"))
                }
                other => other,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::oid::ObjectId;

    #[test]
    fn object_ids_become_hex() {
        let oid = ObjectId::new();

        assert_eq!(extract_inserted_id(&Bson::ObjectId(oid)).unwrap(), oid.to_hex());
    }

    #[test]
    fn custom_ids_are_an_extraction_error() {
        let err = extract_inserted_id(&Bson::String("user-1".into())).unwrap_err();

        assert!(matches!(err, FacadeError::IdentifierExtraction(_)));
    }

    #[test]
    fn batch_keeps_input_order() {
        let oids = (0..5).map(|_| ObjectId::new()).collect::<Vec<_>>();
        let ids = oids.iter().copied().map(Bson::ObjectId).collect::<Vec<_>>();

        let extracted = extract_inserted_ids(&ids).unwrap();

        assert_eq!(extracted, oids.iter().map(|oid| oid.to_hex()).collect::<Vec<_>>());
    }

    #[test]
    fn batch_fails_as_a_whole_on_one_bad_id() {
        let mut ids = (0..5).map(|_| Bson::ObjectId(ObjectId::new())).collect::<Vec<_>>();
        ids[2] = Bson::Int32(3);

        let err = extract_inserted_ids(&ids).unwrap_err();

        match err {
            FacadeError::IdentifierExtraction(reason) => assert!(reason.starts_with("document 2:")),
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
