//! Materialization of engine results into caller destinations.
//!
//! A multi-document fetch acquires a cursor. From that point on the cursor is
//! released exactly once whatever happens: a clean drain, a drain failure or a
//! decode failure. When both the drain and the release fail, the caller sees
//! the drain failure; a release failure after a clean drain is returned as is.
//! Decoded values reach the destination only if the whole drain succeeded.

use bson::Document;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::{
    document::from_document,
    engine::{EngineCursor, Namespace},
    error::{FacadeError, FacadeResult},
};

/// Drains `cursor` into `destination`, returning the number of values appended.
pub(crate) async fn drain_into<C, T, D>(
    mut cursor: C,
    destination: &mut D,
    namespace: &Namespace,
) -> FacadeResult<usize>
where
    C: EngineCursor,
    T: DeserializeOwned,
    D: Extend<T> + ?Sized,
{
    let drained = drain::<C, T>(&mut cursor).await;
    let released = cursor.close().await;

    match (drained, released) {
        (Ok(values), Ok(())) => {
            let count = values.len();
            debug!(%namespace, count, "drained cursor");
            destination.extend(values);
            Ok(count)
        }
        (Ok(_), Err(release_err)) => Err(release_err),
        (Err(drain_err), Ok(())) => Err(drain_err),
        (Err(drain_err), Err(release_err)) => {
            warn!(%namespace, error = %release_err, "cursor release failed after drain failure");
            Err(drain_err)
        }
    }
}

async fn drain<C, T>(cursor: &mut C) -> FacadeResult<Vec<T>>
where
    C: EngineCursor,
    T: DeserializeOwned,
{
    let mut values = Vec::new();

    while let Some(document) = cursor.next().await? {
        values.push(from_document(document)?);
    }

    Ok(values)
}

/// Decodes the result of a single-document fetch.
///
/// An absent document is [`FacadeError::NotFound`], never a decode failure.
pub(crate) fn decode_one<T>(found: Option<Document>, namespace: &Namespace) -> FacadeResult<T>
where
    T: DeserializeOwned,
{
    match found {
        Some(document) => from_document(document),
        None => Err(FacadeError::NotFound(namespace.to_string())),
    }
}
