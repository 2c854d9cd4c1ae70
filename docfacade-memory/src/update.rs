//! Update operators and replacement for in-memory documents.
//!
//! Supported operators are `$set`, `$unset` and `$inc`. The `_id` field is
//! immutable, as it is on a server.

use bson::{Bson, Document};

use docfacade_core::error::{FacadeError, FacadeResult};


fn write_error(message: impl Into<String>) -> FacadeError {
    FacadeError::Write(message.into())
}

/// Applies an update document in place. Returns whether the document changed.
pub(crate) fn apply_update(document: &mut Document, update: &Document) -> FacadeResult<bool> {
    if update.is_empty() {
        return Err(write_error("update document must not be empty"));
    }

    let before = document.clone();

    for (operator, fields) in update {
        let fields = fields
            .as_document()
            .ok_or_else(|| write_error(format!("{operator} needs a document of fields")))?;

        for (path, value) in fields {
            if path == "_id" || path.starts_with("_id.") {
                return Err(write_error("the _id field is immutable"));
            }

            match operator.as_str() {
                "$set" => set_path(document, path, value.clone())?,
                "$unset" => unset_path(document, path),
                "$inc" => increment_path(document, path, value)?,
                other if other.starts_with('$') => {
                    return Err(write_error(format!("unsupported update operator: {other}")));
                }
                other => {
                    return Err(write_error(format!("update document requires operators, found field '{other}'")));
                }
            }
        }
    }

    Ok(*document != before)
}

/// Builds the stored form of a replacement, keeping the original `_id`.
pub(crate) fn replacement_for(original: &Document, replacement: Document) -> FacadeResult<Document> {
    let id = original.get("_id").cloned().unwrap_or(Bson::Null);

    if let Some(given) = replacement.get("_id") {
        if *given != id {
            return Err(write_error("the _id field is immutable"));
        }
    }

    let mut stored = Document::new();
    stored.insert("_id", id);

    for (key, value) in replacement {
        if key != "_id" {
            stored.insert(key, value);
        }
    }

    Ok(stored)
}

fn parent_of<'a>(document: &'a mut Document, path: &'a str, create: bool) -> FacadeResult<Option<(&'a mut Document, &'a str)>> {
    let (parents, leaf) = match path.rsplit_once('.') {
        Some((parents, leaf)) => (Some(parents), leaf),
        None => (None, path),
    };

    let mut current = document;

    if let Some(parents) = parents {
        for segment in parents.split('.') {
            if !current.contains_key(segment) {
                if !create {
                    return Ok(None);
                }
                current.insert(segment, Document::new());
            }

            current = match current.get_mut(segment) {
                Some(Bson::Document(child)) => child,
                _ if create => return Err(write_error(format!("cannot create field in non-document at '{segment}'"))),
                _ => return Ok(None),
            };
        }
    }

    Ok(Some((current, leaf)))
}

fn set_path(document: &mut Document, path: &str, value: Bson) -> FacadeResult<()> {
    if let Some((parent, leaf)) = parent_of(document, path, true)? {
        parent.insert(leaf, value);
    }

    Ok(())
}

fn unset_path(document: &mut Document, path: &str) {
    if let Ok(Some((parent, leaf))) = parent_of(document, path, false) {
        parent.remove(leaf);
    }
}

fn increment_path(document: &mut Document, path: &str, amount: &Bson) -> FacadeResult<()> {
    let Some((parent, leaf)) = parent_of(document, path, true)? else {
        return Ok(());
    };

    let current = parent.get(leaf).cloned().unwrap_or(Bson::Int32(0));
    let sum = add(&current, amount).ok_or_else(|| {
        write_error(format!("cannot apply $inc to '{path}': {current} + {amount}"))
    })?;

    parent.insert(leaf, sum);

    Ok(())
}

fn add(left: &Bson, right: &Bson) -> Option<Bson> {
    match (left, right) {
        (Bson::Int32(a), Bson::Int32(b)) => Some(
            a.checked_add(*b)
                .map(Bson::Int32)
                .unwrap_or(Bson::Int64(*a as i64 + *b as i64)),
        ),
        (Bson::Int32(a), Bson::Int64(b)) => Some(Bson::Int64(*a as i64 + b)),
        (Bson::Int64(a), Bson::Int32(b)) => Some(Bson::Int64(a + *b as i64)),
        (Bson::Int64(a), Bson::Int64(b)) => a.checked_add(*b).map(Bson::Int64),
        (Bson::Double(a), b) => as_f64(b).map(|b| Bson::Double(a + b)),
        (a, Bson::Double(b)) => as_f64(a).map(|a| Bson::Double(a + b)),
        _ => None,
    }
}

fn as_f64(value: &Bson) -> Option<f64> {
    match value {
        Bson::Int32(n) => Some(*n as f64),
        Bson::Int64(n) => Some(*n as f64),
        Bson::Double(n) => Some(*n),
        _ => None,
    }
}
