//! The collection facade.
//!
//! Lookups go through the [`translate`](crate::translate) and
//! [`materialize`](crate::materialize) layers, inserts through the
//! [`identifier`](crate::identifier) extractor. Updates, deletes and counts are
//! forwarded to the engine unchanged.
//!
//! # Example
//!
//! ```ignore
//! use docfacade::prelude::*;
//! use serde::{Serialize, Deserialize};
//!
//! #[derive(Debug, Serialize, Deserialize)]
//! pub struct User {
//!     #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
//!     pub id: Option<bson::oid::ObjectId>,
//!     pub name: String,
//!     pub age: i32,
//! }
//!
//! # async fn example<E: Engine>(users: &Collection<'_, E>) -> FacadeResult<()> {
//! let id = users.insert_one(&User { id: None, name: "Subrato".into(), age: 30 }).await?;
//!
//! let oldest: Vec<User> = users
//!     .find(&FindOptions::builder().sort_by(Desc::new("age")).limit(10).build())
//!     .await?;
//! # Ok(()) }
//! ```

use bson::{Bson, Document};
use serde::{Serialize, de::DeserializeOwned};
use tracing::debug;

use crate::{
    database::Database,
    document::{ensure_no_operators, to_document, to_documents},
    engine::{DeleteOutcome, Engine, Namespace, UpdateOutcome},
    error::{FacadeError, FacadeResult},
    identifier::{extract_inserted_id, extract_inserted_ids},
    materialize::{decode_one, drain_into},
    options::{FindOneOptions, FindOptions},
    translate::{id_filter, translate_find, translate_find_one},
};

/// A named collection reached through a [`Database`].
///
/// Holds a non-owning reference to its database; the caller keeps the database
/// alive.
#[derive(Debug)]
pub struct Collection<'a, E: Engine> {
    namespace: Namespace,
    database: &'a Database<'a, E>,
}

impl<'a, E: Engine> Collection<'a, E> {
    pub(crate) fn new(namespace: Namespace, database: &'a Database<'a, E>) -> Self {
        Self { namespace, database }
    }

    /// Returns the name of this collection.
    pub fn name(&self) -> &str {
        &self.namespace.collection
    }

    /// Returns the database this collection belongs to.
    pub fn database(&self) -> &'a Database<'a, E> {
        self.database
    }

    /// Returns the fully qualified name of this collection.
    pub fn namespace(&self) -> &Namespace {
        &self.namespace
    }

    fn engine(&self) -> &'a E {
        self.database.client().engine()
    }

    /// Fetches the first document matching `options` and decodes it.
    ///
    /// # Errors
    ///
    /// - [`FacadeError::InvalidOptions`] if the sort keys are invalid
    /// - [`FacadeError::NotFound`] if nothing matches
    /// - [`FacadeError::Decode`] if the document does not fit `T`
    /// - the engine's own error if the query is rejected
    pub async fn find_one<T>(&self, options: &FindOneOptions) -> FacadeResult<T>
    where
        T: DeserializeOwned,
    {
        let query = translate_find_one(options)?;

        debug!(namespace = %self.namespace, ?query, "find_one");

        let found = self.engine().find_one(&self.namespace, query).await?;

        decode_one(found, &self.namespace)
    }

    /// Like [`find_one`](Self::find_one), writing into `destination`.
    ///
    /// `destination` is left untouched on any error, including `NotFound`.
    pub async fn find_one_into<T>(&self, options: &FindOneOptions, destination: &mut T) -> FacadeResult<()>
    where
        T: DeserializeOwned,
    {
        *destination = self.find_one(options).await?;

        Ok(())
    }

    /// Fetches every document matching `options`, in the requested order.
    ///
    /// No match is an empty vector, not an error.
    pub async fn find<T>(&self, options: &FindOptions) -> FacadeResult<Vec<T>>
    where
        T: DeserializeOwned,
    {
        let mut results = Vec::new();
        self.find_into(options, &mut results).await?;

        Ok(results)
    }

    /// Like [`find`](Self::find), appending to `destination`.
    ///
    /// Returns the number of values appended. Nothing is appended unless every
    /// document was fetched and decoded.
    pub async fn find_into<T, D>(&self, options: &FindOptions, destination: &mut D) -> FacadeResult<usize>
    where
        T: DeserializeOwned,
        D: Extend<T>,
    {
        let query = translate_find(options)?;

        debug!(namespace = %self.namespace, ?query, "find");

        let cursor = self.engine().find(&self.namespace, query).await?;

        drain_into(cursor, destination, &self.namespace).await
    }

    /// Runs an aggregation pipeline and decodes every output document.
    pub async fn aggregate<T>(&self, pipeline: Vec<Document>, extra: Document) -> FacadeResult<Vec<T>>
    where
        T: DeserializeOwned,
    {
        let mut results = Vec::new();
        self.aggregate_into(pipeline, extra, &mut results).await?;

        Ok(results)
    }

    /// Like [`aggregate`](Self::aggregate), appending to `destination`.
    pub async fn aggregate_into<T, D>(
        &self,
        pipeline: Vec<Document>,
        extra: Document,
        destination: &mut D,
    ) -> FacadeResult<usize>
    where
        T: DeserializeOwned,
        D: Extend<T>,
    {
        debug!(namespace = %self.namespace, stages = pipeline.len(), "aggregate");

        let cursor = self.engine().aggregate(&self.namespace, pipeline, extra).await?;

        drain_into(cursor, destination, &self.namespace).await
    }

    /// Inserts one document and returns its generated identifier as a string.
    ///
    /// # Errors
    ///
    /// Returns [`FacadeError::IdentifierExtraction`] if the document was stored
    /// but its identifier is not an `ObjectId`. The write is not rolled back.
    pub async fn insert_one<T>(&self, document: &T) -> FacadeResult<String>
    where
        T: Serialize + ?Sized,
    {
        let id = self
            .engine()
            .insert_one(&self.namespace, to_document(document)?)
            .await?;

        extract_inserted_id(&id)
    }

    /// Inserts documents and returns their identifiers in input order.
    ///
    /// If any identifier cannot be converted the whole call fails, even though
    /// every document was stored. An empty batch never reaches the engine and
    /// returns no identifiers.
    pub async fn insert_many<T>(&self, documents: &[T]) -> FacadeResult<Vec<String>>
    where
        T: Serialize,
    {
        if documents.is_empty() {
            return Ok(Vec::new());
        }

        let ids = self
            .engine()
            .insert_many(&self.namespace, to_documents(documents)?)
            .await?;

        if ids.len() != documents.len() {
            return Err(FacadeError::IdentifierExtraction(format!(
                "engine returned {} ids for {} documents",
                ids.len(),
                documents.len(),
            )));
        }

        extract_inserted_ids(&ids)
    }

    /// Applies `update` to the document with the given identifier.
    pub async fn update_by_id(&self, id: impl Into<Bson>, update: Document) -> FacadeResult<UpdateOutcome> {
        self.update_one(id_filter(id), update).await
    }

    pub async fn update_one(&self, filter: Document, update: Document) -> FacadeResult<UpdateOutcome> {
        self.engine()
            .update_one(&self.namespace, filter, update)
            .await
    }

    pub async fn update_many(&self, filter: Document, update: Document) -> FacadeResult<UpdateOutcome> {
        self.engine()
            .update_many(&self.namespace, filter, update)
            .await
    }

    /// Replaces the first document matching `filter` with `replacement`.
    pub async fn replace_one<T>(&self, filter: Document, replacement: &T) -> FacadeResult<UpdateOutcome>
    where
        T: Serialize + ?Sized,
    {
        let replacement = to_document(replacement)?;
        ensure_no_operators(&replacement)?;

        self.engine()
            .replace_one(&self.namespace, filter, replacement)
            .await
    }

    pub async fn delete_one(&self, filter: Document) -> FacadeResult<DeleteOutcome> {
        self.engine()
            .delete_one(&self.namespace, filter)
            .await
    }

    pub async fn delete_many(&self, filter: Document) -> FacadeResult<DeleteOutcome> {
        self.engine()
            .delete_many(&self.namespace, filter)
            .await
    }

    /// Removes the first document matching `filter` and returns it decoded.
    pub async fn find_one_and_delete<T>(&self, filter: Document) -> FacadeResult<T>
    where
        T: DeserializeOwned,
    {
        let removed = self
            .engine()
            .find_one_and_delete(&self.namespace, filter)
            .await?;

        decode_one(removed, &self.namespace)
    }

    /// Updates the first document matching `filter`.
    ///
    /// Returns [`FacadeError::NotFound`] if nothing matched.
    pub async fn find_one_and_update(&self, filter: Document, update: Document) -> FacadeResult<()> {
        self.engine()
            .find_one_and_update(&self.namespace, filter, update)
            .await?
            .map(|_| ())
            .ok_or_else(|| FacadeError::NotFound(self.namespace.to_string()))
    }

    /// Replaces the first document matching `filter`.
    ///
    /// Returns [`FacadeError::NotFound`] if nothing matched.
    pub async fn find_one_and_replace<T>(&self, filter: Document, replacement: &T) -> FacadeResult<()>
    where
        T: Serialize + ?Sized,
    {
        let replacement = to_document(replacement)?;
        ensure_no_operators(&replacement)?;

        self.engine()
            .find_one_and_replace(&self.namespace, filter, replacement)
            .await?
            .map(|_| ())
            .ok_or_else(|| FacadeError::NotFound(self.namespace.to_string()))
    }

    pub async fn count_documents(&self, filter: Document) -> FacadeResult<u64> {
        self.engine()
            .count_documents(&self.namespace, filter)
            .await
    }

    pub async fn estimated_document_count(&self) -> FacadeResult<u64> {
        self.engine()
            .estimated_document_count(&self.namespace)
            .await
    }

    /// Distinct values of `field` among the documents matching `filter`.
    pub async fn distinct(&self, field: &str, filter: Document) -> FacadeResult<Vec<Bson>> {
        self.engine()
            .distinct(&self.namespace, field, filter)
            .await
    }

    /// Drops this collection.
    pub async fn drop(&self) -> FacadeResult<()> {
        self.engine()
            .drop_collection(&self.namespace)
            .await
    }
}
