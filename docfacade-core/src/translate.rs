//! Translation of option records into engine query descriptors.
//!
//! The translator checks the parts of an option record the facade owns (sort
//! keys and limit) and projects them into the native shape: a filter document,
//! an ordered sort document and an optional limit. Filter contents are passed
//! through untouched, their meaning belongs to the engine.

use std::collections::HashSet;

use bson::{Document, doc};

use crate::{
    error::{FacadeError, FacadeResult},
    options::{FindOneOptions, FindOptions, Ordering},
};

/// Native descriptor for a single-document lookup.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FindOneQuery {
    pub filter: Document,
    /// Sort document in key precedence order, `None` for engine order.
    pub sort: Option<Document>,
    pub extra: Document,
}

/// Native descriptor for a multi-document lookup.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FindQuery {
    pub filter: Document,
    /// Sort document in key precedence order, `None` for engine order.
    pub sort: Option<Document>,
    /// Strictly positive limit, `None` when unbounded.
    pub limit: Option<i64>,
    pub extra: Document,
}

/// Builds the sort document for a sequence of orderings.
///
/// The output keeps the input order, since multi-key precedence is positional.
/// Returns `None` for an empty sequence.
///
/// # Errors
///
/// Returns [`FacadeError::InvalidOptions`] for an empty field name or for a
/// field that appears more than once.
pub fn sort_spec<O: Ordering>(orderings: &[O]) -> FacadeResult<Option<Document>> {
    if orderings.is_empty() {
        return Ok(None);
    }

    let mut seen = HashSet::with_capacity(orderings.len());
    let mut sort = Document::new();

    for ordering in orderings {
        let key = ordering.key();

        if key.is_empty() {
            return Err(FacadeError::InvalidOptions("sort field name must not be empty".into()));
        }
        if !seen.insert(key) {
            return Err(FacadeError::InvalidOptions(format!("sort field '{key}' appears more than once")));
        }

        sort.insert(key, ordering.order());
    }

    Ok(Some(sort))
}

/// Normalizes a requested limit: `None` or `0` is unbounded.
///
/// # Errors
///
/// Returns [`FacadeError::InvalidOptions`] for a negative limit.
pub fn limit_spec(limit: Option<i64>) -> FacadeResult<Option<i64>> {
    match limit {
        Some(n) if n < 0 => Err(FacadeError::InvalidOptions(format!("limit must not be negative, got {n}"))),
        Some(0) | None => Ok(None),
        Some(n) => Ok(Some(n)),
    }
}

/// Translates single-document lookup options.
pub fn translate_find_one(options: &FindOneOptions) -> FacadeResult<FindOneQuery> {
    Ok(FindOneQuery {
        filter: options.filter.clone(),
        sort: sort_spec(&options.sort_by)?,
        extra: options.extra.clone(),
    })
}

/// Translates multi-document lookup options.
pub fn translate_find(options: &FindOptions) -> FacadeResult<FindQuery> {
    Ok(FindQuery {
        filter: options.filter.clone(),
        sort: sort_spec(&options.sort_by)?,
        limit: limit_spec(options.limit)?,
        extra: options.extra.clone(),
    })
}

/// Builds the filter matching a single identifier.
pub(crate) fn id_filter(id: impl Into<bson::Bson>) -> Document {
    doc! { "_id": id.into() }
}
