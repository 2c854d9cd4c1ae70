//! Declarative lookup options: filter, ordering and limit.
//!
//! Option records are plain data. Building one performs no I/O and no
//! validation; the [`translate`](crate::translate) module checks them on the
//! way to the engine.
//!
//! ```ignore
//! use docfacade::options::{Asc, Desc, FindOptions};
//! use bson::doc;
//!
//! let options = FindOptions::builder()
//!     .filter(doc! { "active": true })
//!     .sort_by(Desc::new("age"))
//!     .sort_by(Asc::new("name"))
//!     .limit(10)
//!     .build();
//! ```

use bson::Document;

/// Sort direction of a single ordering key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SortDirection {
    /// Smallest values first.
    Ascending,
    /// Largest values first.
    Descending,
}

impl SortDirection {
    /// The direction sign understood by the engine: `1` or `-1`.
    pub fn sign(self) -> i32 {
        match self {
            SortDirection::Ascending => 1,
            SortDirection::Descending => -1,
        }
    }
}

/// One `(field, direction)` sort key.
pub trait Ordering {
    /// The field name being sorted on.
    fn key(&self) -> &str;

    /// The direction of this key.
    fn direction(&self) -> SortDirection;

    /// The direction sign: `1` for ascending, `-1` for descending.
    fn order(&self) -> i32 {
        self.direction().sign()
    }
}

/// Ascending ordering on a field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Asc(String);

impl Asc {
    pub fn new(field: impl Into<String>) -> Self {
        Self(field.into())
    }
}

impl Ordering for Asc {
    fn key(&self) -> &str {
        &self.0
    }

    fn direction(&self) -> SortDirection {
        SortDirection::Ascending
    }
}

/// Descending ordering on a field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Desc(String);

impl Desc {
    pub fn new(field: impl Into<String>) -> Self {
        Self(field.into())
    }
}

impl Ordering for Desc {
    fn key(&self) -> &str {
        &self.0
    }

    fn direction(&self) -> SortDirection {
        SortDirection::Descending
    }
}

/// A stored ordering key, as held by the option records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortKey {
    /// The field name to sort by.
    pub field: String,
    /// The sort direction.
    pub direction: SortDirection,
}

impl SortKey {
    pub fn new(field: impl Into<String>, direction: SortDirection) -> Self {
        Self { field: field.into(), direction }
    }

    pub fn asc(field: impl Into<String>) -> Self {
        Self::new(field, SortDirection::Ascending)
    }

    pub fn desc(field: impl Into<String>) -> Self {
        Self::new(field, SortDirection::Descending)
    }
}

impl Ordering for SortKey {
    fn key(&self) -> &str {
        &self.field
    }

    fn direction(&self) -> SortDirection {
        self.direction
    }
}

impl From<Asc> for SortKey {
    fn from(asc: Asc) -> Self {
        SortKey::asc(asc.0)
    }
}

impl From<Desc> for SortKey {
    fn from(desc: Desc) -> Self {
        SortKey::desc(desc.0)
    }
}

/// Options for a single-document lookup.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FindOneOptions {
    /// Documents must match this filter. Empty matches everything.
    pub filter: Document,
    /// Sort keys in precedence order; the first entry is the primary key.
    pub sort_by: Vec<SortKey>,
    /// Engine-specific options forwarded as-is.
    pub extra: Document,
}

impl FindOneOptions {
    /// Creates options that match any document in engine order.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates options matching the given filter.
    pub fn with_filter(filter: Document) -> Self {
        Self { filter, ..Self::default() }
    }

    pub fn builder() -> FindOneOptionsBuilder {
        FindOneOptionsBuilder::default()
    }
}

/// Options for a multi-document lookup.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FindOptions {
    /// Documents must match this filter. Empty matches everything.
    pub filter: Document,
    /// Sort keys in precedence order; the first entry is the primary key.
    pub sort_by: Vec<SortKey>,
    /// Maximum number of documents. `None` or `Some(0)` is unbounded.
    pub limit: Option<i64>,
    /// Engine-specific options forwarded as-is.
    pub extra: Document,
}

impl FindOptions {
    /// Creates options that return every document in engine order.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates options matching the given filter.
    pub fn with_filter(filter: Document) -> Self {
        Self { filter, ..Self::default() }
    }

    pub fn builder() -> FindOptionsBuilder {
        FindOptionsBuilder::default()
    }
}

#[derive(Debug, Clone, Default)]
pub struct FindOneOptionsBuilder {
    options: FindOneOptions,
}

impl FindOneOptionsBuilder {
    /// Sets the filter document.
    pub fn filter(mut self, filter: Document) -> Self {
        self.options.filter = filter;
        self
    }

    /// Appends a sort key after the ones already added.
    pub fn sort_by(mut self, ordering: impl Into<SortKey>) -> Self {
        self.options.sort_by.push(ordering.into());
        self
    }

    /// Sets the engine-specific passthrough options.
    pub fn extra(mut self, extra: Document) -> Self {
        self.options.extra = extra;
        self
    }

    pub fn build(self) -> FindOneOptions {
        self.options
    }
}

#[derive(Debug, Clone, Default)]
pub struct FindOptionsBuilder {
    options: FindOptions,
}

impl FindOptionsBuilder {
    /// Sets the filter document.
    pub fn filter(mut self, filter: Document) -> Self {
        self.options.filter = filter;
        self
    }

    /// Appends a sort key after the ones already added.
    pub fn sort_by(mut self, ordering: impl Into<SortKey>) -> Self {
        self.options.sort_by.push(ordering.into());
        self
    }

    /// Sets the maximum number of documents to return.
    pub fn limit(mut self, limit: i64) -> Self {
        self.options.limit = Some(limit);
        self
    }

    /// Sets the engine-specific passthrough options.
    pub fn extra(mut self, extra: Document) -> Self {
        self.options.extra = extra;
        self
    }

    pub fn build(self) -> FindOptions {
        self.options
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::doc;

    #[test]
    fn direction_signs() {
        assert_eq!(Asc::new("name").order(), 1);
        assert_eq!(Desc::new("age").order(), -1);
        assert_eq!(SortKey::from(Desc::new("age")).order(), -1);
    }

    #[test]
    fn builder_keeps_sort_keys_in_insertion_order() {
        let options = FindOptions::builder()
            .sort_by(Desc::new("age"))
            .sort_by(Asc::new("name"))
            .limit(10)
            .build();

        assert_eq!(
            options.sort_by,
            vec![SortKey::desc("age"), SortKey::asc("name")],
        );
        assert_eq!(options.limit, Some(10));
        assert!(options.filter.is_empty());
    }

    #[test]
    fn default_options_match_everything() {
        let options = FindOneOptions::new();

        assert!(options.filter.is_empty());
        assert!(options.sort_by.is_empty());
        assert_eq!(FindOneOptions::with_filter(doc! { "_id": 1 }).filter, doc! { "_id": 1 });
    }
}
