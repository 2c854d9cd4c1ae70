//! Filter and sort evaluation for in-memory documents.
//!
//! This module understands the subset of the MongoDB filter language used by
//! tests and development setups: implicit equality, comparison operators,
//! `$in`/`$nin`, `$exists`, `$not` and the logical combinators. Anything else is
//! rejected as a query submission error, the same way a server would reject it.
//!
//! Sorting follows the server's BSON order: values of different types order
//! by type, embedded documents compare field by field, and array fields sort
//! by their smallest or largest element depending on direction. Binary,
//! regex and other exotic values all share one rank and compare equal.

use std::cmp::Ordering;

use bson::{Bson, DateTime, Document, oid::ObjectId};

use docfacade_core::error::{FacadeError, FacadeResult};


/// Comparable view of a BSON value.
///
/// Numeric types are normalized to `f64` so that `Int32(3)` equals `Double(3.0)`.
#[derive(Debug)]
pub(crate) enum Comparable<'a> {
    Null,
    Number(f64),
    String(&'a str),
    Document(&'a Document),
    Array(&'a [Bson]),
    ObjectId(ObjectId),
    Bool(bool),
    DateTime(DateTime),
    /// Values with no meaningful order here (binary, regex, ...).
    Other(&'a Bson),
}

impl<'a> From<&'a Bson> for Comparable<'a> {
    fn from(bson: &'a Bson) -> Self {
        match bson {
            Bson::Null | Bson::Undefined => Comparable::Null,
            Bson::Int32(value) => Comparable::Number(*value as f64),
            Bson::Int64(value) => Comparable::Number(*value as f64),
            Bson::Double(value) => Comparable::Number(*value),
            Bson::String(value) => Comparable::String(value),
            Bson::Document(doc) => Comparable::Document(doc),
            Bson::Array(arr) => Comparable::Array(arr.as_slice()),
            Bson::ObjectId(oid) => Comparable::ObjectId(*oid),
            Bson::Boolean(value) => Comparable::Bool(*value),
            Bson::DateTime(value) => Comparable::DateTime(*value),
            other => Comparable::Other(other),
        }
    }
}

impl<'a> Comparable<'a> {
    /// Cross-type rank, following the server's BSON comparison order.
    fn rank(&self) -> u8 {
        match self {
            Comparable::Null => 1,
            Comparable::Number(_) => 2,
            Comparable::String(_) => 3,
            Comparable::Document(_) => 4,
            Comparable::Array(_) => 5,
            Comparable::Other(_) => 6,
            Comparable::ObjectId(_) => 7,
            Comparable::Bool(_) => 8,
            Comparable::DateTime(_) => 9,
        }
    }

    /// Total order used for sorting; values of different types order by rank.
    pub(crate) fn total_cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Comparable::Number(a), Comparable::Number(b)) => a.total_cmp(b),
            (Comparable::String(a), Comparable::String(b)) => a.cmp(b),
            (Comparable::ObjectId(a), Comparable::ObjectId(b)) => a.bytes().cmp(&b.bytes()),
            (Comparable::Bool(a), Comparable::Bool(b)) => a.cmp(b),
            (Comparable::DateTime(a), Comparable::DateTime(b)) => a.cmp(b),
            (Comparable::Document(a), Comparable::Document(b)) => a
                .iter()
                .zip(b.iter())
                .map(|((ka, va), (kb, vb))| {
                    let (va, vb) = (Comparable::from(va), Comparable::from(vb));

                    va.rank()
                        .cmp(&vb.rank())
                        .then_with(|| ka.cmp(kb))
                        .then_with(|| va.total_cmp(&vb))
                })
                .find(|ordering| ordering.is_ne())
                .unwrap_or_else(|| a.len().cmp(&b.len())),
            (Comparable::Array(a), Comparable::Array(b)) => a
                .iter()
                .map(Comparable::from)
                .zip(b.iter().map(Comparable::from))
                .map(|(x, y)| x.total_cmp(&y))
                .find(|ordering| ordering.is_ne())
                .unwrap_or_else(|| a.len().cmp(&b.len())),
            (left, right) if left.rank() != right.rank() => left.rank().cmp(&right.rank()),
            _ => Ordering::Equal,
        }
    }
}

impl<'a> PartialEq for Comparable<'a> {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Comparable::Null, Comparable::Null) => true,
            (Comparable::Number(a), Comparable::Number(b)) => a == b,
            (Comparable::String(a), Comparable::String(b)) => a == b,
            (Comparable::Document(a), Comparable::Document(b)) => a == b,
            (Comparable::Array(a), Comparable::Array(b)) => {
                a.len() == b.len()
                    && a.iter().zip(b.iter()).all(|(x, y)| Comparable::from(x) == Comparable::from(y))
            }
            (Comparable::ObjectId(a), Comparable::ObjectId(b)) => a == b,
            (Comparable::Bool(a), Comparable::Bool(b)) => a == b,
            (Comparable::DateTime(a), Comparable::DateTime(b)) => a == b,
            (Comparable::Other(a), Comparable::Other(b)) => a == b,
            _ => false,
        }
    }
}

impl<'a> PartialOrd for Comparable<'a> {
    /// Only values of the same type are ordered, as comparison operators require.
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (Comparable::Number(a), Comparable::Number(b)) => a.partial_cmp(b),
            (Comparable::String(a), Comparable::String(b)) => a.partial_cmp(b),
            (Comparable::ObjectId(a), Comparable::ObjectId(b)) => a.bytes().partial_cmp(&b.bytes()),
            (Comparable::Bool(a), Comparable::Bool(b)) => a.partial_cmp(b),
            (Comparable::DateTime(a), Comparable::DateTime(b)) => a.partial_cmp(b),
            _ => None,
        }
    }
}

/// Resolves a dotted path (`address.city`, `tags.0`) inside a document.
pub(crate) fn lookup<'a>(document: &'a Document, path: &str) -> Option<&'a Bson> {
    let mut segments = path.split('.');
    let mut current = document.get(segments.next()?)?;

    for segment in segments {
        current = match current {
            Bson::Document(doc) => doc.get(segment)?,
            Bson::Array(arr) => arr.get(segment.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }

    Some(current)
}

/// Reads a non-negative integral count (`$skip`, `$limit`, `skip`).
pub(crate) fn as_count(value: &Bson) -> Option<u64> {
    match value {
        Bson::Int32(n) if *n >= 0 => Some(*n as u64),
        Bson::Int64(n) if *n >= 0 => Some(*n as u64),
        Bson::Double(n) if *n >= 0.0 && n.fract() == 0.0 => Some(*n as u64),
        _ => None,
    }
}

fn submission_error(message: impl Into<String>) -> FacadeError {
    FacadeError::QuerySubmission(message.into())
}

/// Evaluates a filter document against one stored document.
pub(crate) struct FilterEvaluator<'a> {
    document: &'a Document,
}

impl<'a> FilterEvaluator<'a> {
    pub fn new(document: &'a Document) -> Self {
        Self { document }
    }

    /// Returns the documents matching `filter`, keeping their order.
    pub fn filter_documents(
        documents: impl IntoIterator<Item = &'a Document>,
        filter: &Document,
    ) -> FacadeResult<Vec<Document>> {
        let mut matched = Vec::new();

        for document in documents {
            if FilterEvaluator::new(document).matches(filter)? {
                matched.push(document.clone());
            }
        }

        Ok(matched)
    }

    /// Evaluates `filter`; an empty filter matches everything.
    pub fn matches(&self, filter: &Document) -> FacadeResult<bool> {
        for (key, condition) in filter {
            let matched = match key.as_str() {
                "$and" => self.all_of(condition)?,
                "$or" => self.any_of(condition)?,
                "$nor" => !self.any_of(condition)?,
                operator if operator.starts_with('$') => {
                    return Err(submission_error(format!("unknown top level operator: {operator}")));
                }
                path => self.matches_field(lookup(self.document, path), condition)?,
            };

            if !matched {
                return Ok(false);
            }
        }

        Ok(true)
    }

    fn clauses<'c>(condition: &'c Bson) -> FacadeResult<Vec<&'c Document>> {
        match condition {
            Bson::Array(items) if !items.is_empty() => items
                .iter()
                .map(|item| {
                    item.as_document()
                        .ok_or_else(|| submission_error("logical operator entries must be documents"))
                })
                .collect(),
            _ => Err(submission_error("logical operators require a non-empty array")),
        }
    }

    fn all_of(&self, condition: &Bson) -> FacadeResult<bool> {
        for clause in Self::clauses(condition)? {
            if !self.matches(clause)? {
                return Ok(false);
            }
        }

        Ok(true)
    }

    fn any_of(&self, condition: &Bson) -> FacadeResult<bool> {
        for clause in Self::clauses(condition)? {
            if self.matches(clause)? {
                return Ok(true);
            }
        }

        Ok(false)
    }

    fn matches_field(&self, value: Option<&Bson>, condition: &Bson) -> FacadeResult<bool> {
        match condition {
            Bson::Document(operators) if is_operator_document(operators) => {
                for (operator, operand) in operators {
                    if !Self::apply_operator(value, operator, operand)? {
                        return Ok(false);
                    }
                }

                Ok(true)
            }
            expected => Ok(equals(value, expected)),
        }
    }

    fn apply_operator(value: Option<&Bson>, operator: &str, operand: &Bson) -> FacadeResult<bool> {
        match operator {
            "$eq" => Ok(equals(value, operand)),
            "$ne" => Ok(!equals(value, operand)),
            "$gt" => Ok(compares(value, operand, |o| o == Ordering::Greater)),
            "$gte" => Ok(compares(value, operand, |o| o != Ordering::Less)),
            "$lt" => Ok(compares(value, operand, |o| o == Ordering::Less)),
            "$lte" => Ok(compares(value, operand, |o| o != Ordering::Greater)),
            "$in" => Ok(Self::candidates(operand, operator)?
                .iter()
                .any(|candidate| equals(value, candidate))),
            "$nin" => Ok(!Self::candidates(operand, operator)?
                .iter()
                .any(|candidate| equals(value, candidate))),
            "$exists" => Ok(value.is_some() == truthy(operand)),
            "$not" => match operand {
                Bson::Document(inner) if is_operator_document(inner) => {
                    for (operator, operand) in inner {
                        if !Self::apply_operator(value, operator, operand)? {
                            return Ok(true);
                        }
                    }

                    Ok(false)
                }
                _ => Err(submission_error("$not needs an operator document")),
            },
            unknown => Err(submission_error(format!("unknown operator: {unknown}"))),
        }
    }

    fn candidates<'c>(operand: &'c Bson, operator: &str) -> FacadeResult<&'c [Bson]> {
        match operand {
            Bson::Array(items) => Ok(items.as_slice()),
            _ => Err(submission_error(format!("{operator} needs an array"))),
        }
    }
}

fn is_operator_document(document: &Document) -> bool {
    document
        .keys()
        .next()
        .is_some_and(|key| key.starts_with('$'))
}

fn truthy(value: &Bson) -> bool {
    match value {
        Bson::Boolean(b) => *b,
        Bson::Null | Bson::Undefined => false,
        Bson::Int32(n) => *n != 0,
        Bson::Int64(n) => *n != 0,
        Bson::Double(n) => *n != 0.0,
        _ => true,
    }
}

/// Equality with array-element matching and null matching missing fields.
fn equals(value: Option<&Bson>, expected: &Bson) -> bool {
    let expected_cmp = Comparable::from(expected);

    match value {
        None => expected_cmp == Comparable::Null,
        Some(actual) => {
            let actual_cmp = Comparable::from(actual);

            if actual_cmp == expected_cmp {
                return true;
            }

            match actual {
                Bson::Array(items) => items
                    .iter()
                    .any(|item| Comparable::from(item) == expected_cmp),
                _ => false,
            }
        }
    }
}

fn compares(value: Option<&Bson>, operand: &Bson, accept: impl Fn(Ordering) -> bool) -> bool {
    let operand = Comparable::from(operand);
    let check = |candidate: &Bson| {
        Comparable::from(candidate)
            .partial_cmp(&operand)
            .is_some_and(&accept)
    };

    match value {
        Some(Bson::Array(items)) => items.iter().any(check),
        Some(actual) => check(actual),
        None => false,
    }
}

/// A parsed sort document.
#[derive(Debug, Clone)]
pub(crate) struct SortSpec {
    keys: Vec<(String, bool)>,
}

impl SortSpec {
    /// Parses a sort document; every direction must be `1` or `-1`.
    pub fn parse(sort: &Document) -> FacadeResult<Self> {
        let keys = sort
            .iter()
            .map(|(field, direction)| match direction {
                Bson::Int32(1) | Bson::Int64(1) => Ok((field.clone(), false)),
                Bson::Int32(-1) | Bson::Int64(-1) => Ok((field.clone(), true)),
                Bson::Double(d) if *d == 1.0 => Ok((field.clone(), false)),
                Bson::Double(d) if *d == -1.0 => Ok((field.clone(), true)),
                other => Err(submission_error(format!("invalid sort direction for '{field}': {other}"))),
            })
            .collect::<FacadeResult<Vec<_>>>()?;

        Ok(Self { keys })
    }

    /// Compares two documents key by key, in precedence order.
    ///
    /// An array sorts by its smallest element when ascending and its largest
    /// when descending. An empty array sorts like a missing field.
    pub fn compare(&self, left: &Document, right: &Document) -> Ordering {
        for (field, descending) in &self.keys {
            let left = sort_value(lookup(left, field), *descending);
            let right = sort_value(lookup(right, field), *descending);

            let ordering = if *descending {
                right.total_cmp(&left)
            } else {
                left.total_cmp(&right)
            };

            if ordering.is_ne() {
                return ordering;
            }
        }

        Ordering::Equal
    }

    /// Stable sort, so ties keep insertion order.
    pub fn sort(&self, documents: &mut [Document]) {
        documents.sort_by(|a, b| self.compare(a, b));
    }
}

fn sort_value(value: Option<&Bson>, descending: bool) -> Comparable<'_> {
    match value {
        Some(Bson::Array(items)) => {
            let items = items.iter().map(Comparable::from);
            let picked = if descending {
                items.max_by(|a, b| a.total_cmp(b))
            } else {
                items.min_by(|a, b| a.total_cmp(b))
            };

            picked.unwrap_or(Comparable::Null)
        }
        Some(value) => Comparable::from(value),
        None => Comparable::Null,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::doc;

    fn matches(document: Document, filter: Document) -> bool {
        FilterEvaluator::new(&document).matches(&filter).unwrap()
    }

    #[test]
    fn empty_filter_matches_everything() {
        assert!(matches(doc! { "name": "Priya" }, doc! {}));
    }

    #[test]
    fn implicit_equality_and_numeric_normalization() {
        assert!(matches(doc! { "age": 22 }, doc! { "age": 22.0 }));
        assert!(!matches(doc! { "age": 22 }, doc! { "age": 23 }));
        assert!(matches(doc! { "tags": ["a", "b"] }, doc! { "tags": "b" }));
    }

    #[test]
    fn null_matches_missing_fields() {
        assert!(matches(doc! { "name": "Priya" }, doc! { "age": null }));
        assert!(!matches(doc! { "name": "Priya" }, doc! { "age": { "$exists": true } }));
    }

    #[test]
    fn comparison_operators() {
        let document = doc! { "age": 30, "address": { "city": "Pune" } };

        assert!(matches(document.clone(), doc! { "age": { "$gt": 25, "$lte": 30 } }));
        assert!(!matches(document.clone(), doc! { "age": { "$lt": 30 } }));
        assert!(!matches(document.clone(), doc! { "age": { "$gt": "25" } }));
        assert!(matches(document.clone(), doc! { "address.city": { "$in": ["Pune", "Delhi"] } }));
        assert!(matches(document, doc! { "age": { "$not": { "$gt": 40 } } }));
    }

    #[test]
    fn logical_operators() {
        let document = doc! { "name": "Shekhar", "age": 25 };

        assert!(matches(document.clone(), doc! { "$or": [{ "age": 99 }, { "name": "Shekhar" }] }));
        assert!(!matches(document.clone(), doc! { "$and": [{ "age": 25 }, { "name": "Priya" }] }));
        assert!(matches(document, doc! { "$nor": [{ "age": 99 }] }));
    }

    #[test]
    fn unknown_operators_are_rejected() {
        let document = doc! { "age": 25 };

        let err = FilterEvaluator::new(&document)
            .matches(&doc! { "age": { "$near": 1 } })
            .unwrap_err();

        assert!(matches!(err, FacadeError::QuerySubmission(_)));
    }

    #[test]
    fn multi_key_sort_breaks_ties_in_order() {
        let spec = SortSpec::parse(&doc! { "age": -1, "name": 1 }).unwrap();
        let mut documents = vec![
            doc! { "name": "b", "age": 20 },
            doc! { "name": "c", "age": 30 },
            doc! { "name": "a", "age": 20 },
        ];

        spec.sort(&mut documents);

        let names = documents
            .iter()
            .map(|d| d.get_str("name").unwrap())
            .collect::<Vec<_>>();
        assert_eq!(names, vec!["c", "a", "b"]);
    }

    #[test]
    fn array_fields_sort_by_min_ascending_and_max_descending() {
        let mut documents = vec![
            doc! { "name": "wide", "scores": [1, 9] },
            doc! { "name": "mid", "scores": [3, 5] },
            doc! { "name": "flat", "scores": 4 },
        ];

        SortSpec::parse(&doc! { "scores": 1 }).unwrap().sort(&mut documents);
        let names = documents.iter().map(|d| d.get_str("name").unwrap()).collect::<Vec<_>>();
        assert_eq!(names, vec!["wide", "mid", "flat"]);

        SortSpec::parse(&doc! { "scores": -1 }).unwrap().sort(&mut documents);
        let names = documents.iter().map(|d| d.get_str("name").unwrap()).collect::<Vec<_>>();
        assert_eq!(names, vec!["wide", "mid", "flat"]);

        let mut documents = vec![
            doc! { "name": "low", "scores": [2, 3] },
            doc! { "name": "high", "scores": [1, 8] },
        ];
        SortSpec::parse(&doc! { "scores": -1 }).unwrap().sort(&mut documents);
        let names = documents.iter().map(|d| d.get_str("name").unwrap()).collect::<Vec<_>>();
        assert_eq!(names, vec!["high", "low"]);
    }

    #[test]
    fn empty_array_sorts_like_a_missing_field() {
        let mut documents = vec![
            doc! { "name": "one", "scores": [1] },
            doc! { "name": "empty", "scores": [] },
            doc! { "name": "missing" },
        ];

        SortSpec::parse(&doc! { "scores": 1 }).unwrap().sort(&mut documents);

        let names = documents.iter().map(|d| d.get_str("name").unwrap()).collect::<Vec<_>>();
        assert_eq!(names, vec!["empty", "missing", "one"]);
    }

    #[test]
    fn embedded_documents_order_field_by_field() {
        let mut documents = vec![
            doc! { "name": "longer", "address": { "city": "Oslo", "zip": 1 } },
            doc! { "name": "later", "address": { "city": "Rome" } },
            doc! { "name": "numeric", "address": { "city": 5 } },
            doc! { "name": "prefix", "address": { "city": "Oslo" } },
            doc! { "name": "key", "address": { "area": "Oslo" } },
        ];

        SortSpec::parse(&doc! { "address": 1 }).unwrap().sort(&mut documents);

        let names = documents.iter().map(|d| d.get_str("name").unwrap()).collect::<Vec<_>>();
        assert_eq!(names, vec!["numeric", "key", "prefix", "longer", "later"]);
    }

    #[test]
    fn invalid_sort_direction_is_rejected() {
        assert!(SortSpec::parse(&doc! { "age": 2 }).is_err());
    }
}
