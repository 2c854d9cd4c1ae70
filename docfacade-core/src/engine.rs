//! The boundary between the facade and the wrapped document engine.
//!
//! The facade never talks to a driver directly. Every capability it needs is
//! declared on [`Engine`], so the surface it depends on is closed and can be
//! implemented by an in-process engine for tests or by a real driver adapter.
//!
//! # Traits
//!
//! - [`Engine`]: queries, writes and administration against one connection
//! - [`EngineCursor`]: a lazy, forward-only result sequence that must be released
//! - [`EngineConnector`]: builds an engine from its configuration
//!
//! # Error categories
//!
//! Implementations report failures with the [`FacadeError`](crate::error::FacadeError)
//! variant matching the phase that failed: `Connection` for building and
//! probing, `QuerySubmission` for rejected queries and pipelines, `CursorDrain`
//! and `CursorRelease` for cursor iteration and release, `Write` for inserts,
//! updates and deletes, `Command` for administrative calls and `Disconnect`
//! for teardown.

use std::fmt::{self, Debug, Display};

use async_trait::async_trait;
use bson::{Bson, Document};

use crate::{
    error::FacadeResult,
    translate::{FindOneQuery, FindQuery},
};

/// A fully qualified collection name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Namespace {
    pub database: String,
    pub collection: String,
}

impl Namespace {
    pub fn new(database: impl Into<String>, collection: impl Into<String>) -> Self {
        Self {
            database: database.into(),
            collection: collection.into(),
        }
    }
}

impl Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.database, self.collection)
    }
}

/// Result of an update or replace.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpdateOutcome {
    /// Number of documents matching the filter.
    pub matched_count: u64,
    /// Number of documents actually changed.
    pub modified_count: u64,
    /// Identifier of the document created by an upsert, if any.
    pub upserted_id: Option<Bson>,
}

/// Result of a delete.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeleteOutcome {
    /// Number of documents removed.
    pub deleted_count: u64,
}

/// A lazy, forward-only, single-pass sequence of result documents.
///
/// The materializer calls [`close`](EngineCursor::close) exactly once after
/// draining. A cursor that is dropped without being closed (for example
/// because the calling future was cancelled) must release its engine-side
/// resources from its `Drop` implementation.
#[async_trait]
pub trait EngineCursor: Send {
    /// Advances the cursor, returning `None` once it is exhausted.
    async fn next(&mut self) -> FacadeResult<Option<Document>>;

    /// Releases the cursor.
    async fn close(self) -> FacadeResult<()>;
}

/// Capabilities of a connected document engine.
///
/// Implementations must be usable concurrently from several tasks; the facade
/// adds no locking or ordering of its own.
#[async_trait]
pub trait Engine: Send + Sync + Debug {
    /// The cursor type returned by multi-document queries.
    type Cursor: EngineCursor;

    /// Reachability probe run once when a client connects.
    async fn ping(&self) -> FacadeResult<()>;

    /// Tears down the connection. Calling it twice is allowed to fail.
    async fn disconnect(&self) -> FacadeResult<()>;

    async fn list_database_names(&self) -> FacadeResult<Vec<String>>;

    async fn drop_database(&self, database: &str) -> FacadeResult<()>;

    /// Runs an administrative command against a database.
    async fn run_command(&self, database: &str, command: Document) -> FacadeResult<Document>;

    async fn create_collection(&self, namespace: &Namespace) -> FacadeResult<()>;

    async fn list_collection_names(&self, database: &str) -> FacadeResult<Vec<String>>;

    async fn drop_collection(&self, namespace: &Namespace) -> FacadeResult<()>;

    /// Submits a multi-document query and returns a cursor over its results.
    async fn find(&self, namespace: &Namespace, query: FindQuery) -> FacadeResult<Self::Cursor>;

    /// Submits a single-document query.
    async fn find_one(
        &self,
        namespace: &Namespace,
        query: FindOneQuery,
    ) -> FacadeResult<Option<Document>>;

    /// Submits an aggregation pipeline, forwarded without interpretation.
    async fn aggregate(
        &self,
        namespace: &Namespace,
        pipeline: Vec<Document>,
        extra: Document,
    ) -> FacadeResult<Self::Cursor>;

    /// Inserts one document and returns its engine identifier.
    async fn insert_one(&self, namespace: &Namespace, document: Document) -> FacadeResult<Bson>;

    /// Inserts documents and returns their identifiers in input order.
    async fn insert_many(
        &self,
        namespace: &Namespace,
        documents: Vec<Document>,
    ) -> FacadeResult<Vec<Bson>>;

    async fn update_one(
        &self,
        namespace: &Namespace,
        filter: Document,
        update: Document,
    ) -> FacadeResult<UpdateOutcome>;

    async fn update_many(
        &self,
        namespace: &Namespace,
        filter: Document,
        update: Document,
    ) -> FacadeResult<UpdateOutcome>;

    async fn replace_one(
        &self,
        namespace: &Namespace,
        filter: Document,
        replacement: Document,
    ) -> FacadeResult<UpdateOutcome>;

    async fn delete_one(&self, namespace: &Namespace, filter: Document) -> FacadeResult<DeleteOutcome>;

    async fn delete_many(&self, namespace: &Namespace, filter: Document) -> FacadeResult<DeleteOutcome>;

    /// Removes the first matching document and returns it.
    async fn find_one_and_delete(
        &self,
        namespace: &Namespace,
        filter: Document,
    ) -> FacadeResult<Option<Document>>;

    /// Updates the first matching document and returns it as it was before.
    async fn find_one_and_update(
        &self,
        namespace: &Namespace,
        filter: Document,
        update: Document,
    ) -> FacadeResult<Option<Document>>;

    /// Replaces the first matching document and returns it as it was before.
    async fn find_one_and_replace(
        &self,
        namespace: &Namespace,
        filter: Document,
        replacement: Document,
    ) -> FacadeResult<Option<Document>>;

    async fn count_documents(&self, namespace: &Namespace, filter: Document) -> FacadeResult<u64>;

    async fn estimated_document_count(&self, namespace: &Namespace) -> FacadeResult<u64>;

    /// Distinct values of `field` among documents matching `filter`.
    async fn distinct(
        &self,
        namespace: &Namespace,
        field: &str,
        filter: Document,
    ) -> FacadeResult<Vec<Bson>>;
}

/// Builds a connected engine from its configuration.
#[async_trait]
pub trait EngineConnector {
    type Engine: Engine;

    /// Establishes the connection. Reachability is checked separately by
    /// [`Client::connect`](crate::client::Client::connect) through [`Engine::ping`].
    async fn connect(self) -> FacadeResult<Self::Engine>;
}
