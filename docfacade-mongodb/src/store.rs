use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

use async_trait::async_trait;
use bson::{Bson, Document, doc};
use futures::TryStreamExt;
use mongodb::{
    Client, Collection as MongoCollection, Cursor, Database as MongoDatabase,
    results::{DeleteResult, UpdateResult},
};
use tracing::{debug, info};

use docfacade_core::{
    engine::{DeleteOutcome, Engine, EngineCursor, Namespace, UpdateOutcome},
    error::{FacadeError, FacadeResult},
    translate::{FindOneQuery, FindQuery},
};

use crate::options::{aggregate_options, find_one_options, find_options};


fn submission_error(e: mongodb::error::Error) -> FacadeError {
    FacadeError::QuerySubmission(e.to_string())
}

fn write_error(e: mongodb::error::Error) -> FacadeError {
    FacadeError::Write(e.to_string())
}

fn command_error(e: mongodb::error::Error) -> FacadeError {
    FacadeError::Command(e.to_string())
}

fn update_outcome(result: UpdateResult) -> UpdateOutcome {
    UpdateOutcome {
        matched_count: result.matched_count,
        modified_count: result.modified_count,
        upserted_id: result.upserted_id,
    }
}

fn delete_outcome(result: DeleteResult) -> DeleteOutcome {
    DeleteOutcome {
        deleted_count: result.deleted_count,
    }
}


/// A document engine backed by the official MongoDB driver.
///
/// Cheap to clone; clones share the driver's connection pool.
#[derive(Debug, Clone)]
pub struct MongoEngine {
    client: Client,
    connected: Arc<AtomicBool>,
}

impl MongoEngine {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            connected: Arc::new(AtomicBool::new(true)),
        }
    }

    /// The wrapped driver client.
    pub fn client(&self) -> &Client {
        &self.client
    }

    fn ensure_connected(&self) -> FacadeResult<()> {
        if !self.connected.load(Ordering::Acquire) {
            return Err(FacadeError::Connection("client is disconnected".to_string()));
        }

        Ok(())
    }

    fn database(&self, name: &str) -> FacadeResult<MongoDatabase> {
        self.ensure_connected()?;

        Ok(self.client.database(name))
    }

    fn collection(&self, namespace: &Namespace) -> FacadeResult<MongoCollection<Document>> {
        Ok(self.database(&namespace.database)?.collection(&namespace.collection))
    }
}


/// Wraps a driver cursor. Dropping it, or closing it, kills the server-side
/// cursor if it is still open.
pub struct MongoCursor {
    inner: Cursor<Document>,
}

#[async_trait]
impl EngineCursor for MongoCursor {
    async fn next(&mut self) -> FacadeResult<Option<Document>> {
        self.inner
            .try_next()
            .await
            .map_err(|e| FacadeError::CursorDrain(e.to_string()))
    }

    async fn close(self) -> FacadeResult<()> {
        drop(self.inner);

        Ok(())
    }
}


#[async_trait]
impl Engine for MongoEngine {
    type Cursor = MongoCursor;

    async fn ping(&self) -> FacadeResult<()> {
        self.database("admin")?
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(|e| FacadeError::Connection(e.to_string()))?;

        Ok(())
    }

    async fn disconnect(&self) -> FacadeResult<()> {
        if !self.connected.swap(false, Ordering::AcqRel) {
            return Err(FacadeError::Disconnect("client is already disconnected".to_string()));
        }

        self.client.clone().shutdown().await;

        info!("mongodb client shut down");

        Ok(())
    }

    async fn list_database_names(&self) -> FacadeResult<Vec<String>> {
        self.ensure_connected()?;

        self.client
            .list_database_names()
            .await
            .map_err(command_error)
    }

    async fn drop_database(&self, database: &str) -> FacadeResult<()> {
        self.database(database)?
            .drop()
            .await
            .map_err(command_error)
    }

    async fn run_command(&self, database: &str, command: Document) -> FacadeResult<Document> {
        self.database(database)?
            .run_command(command)
            .await
            .map_err(command_error)
    }

    async fn create_collection(&self, namespace: &Namespace) -> FacadeResult<()> {
        self.database(&namespace.database)?
            .create_collection(&namespace.collection)
            .await
            .map_err(command_error)
    }

    async fn list_collection_names(&self, database: &str) -> FacadeResult<Vec<String>> {
        self.database(database)?
            .list_collection_names()
            .await
            .map_err(command_error)
    }

    async fn drop_collection(&self, namespace: &Namespace) -> FacadeResult<()> {
        self.collection(namespace)?
            .drop()
            .await
            .map_err(command_error)
    }

    async fn find(&self, namespace: &Namespace, query: FindQuery) -> FacadeResult<MongoCursor> {
        let options = find_options(&query)?;

        debug!(%namespace, filter = %query.filter, "submitting find");

        let inner = self
            .collection(namespace)?
            .find(query.filter)
            .with_options(options)
            .await
            .map_err(submission_error)?;

        Ok(MongoCursor { inner })
    }

    async fn find_one(&self, namespace: &Namespace, query: FindOneQuery) -> FacadeResult<Option<Document>> {
        let options = find_one_options(&query)?;

        self.collection(namespace)?
            .find_one(query.filter)
            .with_options(options)
            .await
            .map_err(submission_error)
    }

    async fn aggregate(
        &self,
        namespace: &Namespace,
        pipeline: Vec<Document>,
        extra: Document,
    ) -> FacadeResult<MongoCursor> {
        let options = aggregate_options(&extra)?;

        let inner = self
            .collection(namespace)?
            .aggregate(pipeline)
            .with_options(options)
            .await
            .map_err(submission_error)?;

        Ok(MongoCursor { inner })
    }

    async fn insert_one(&self, namespace: &Namespace, document: Document) -> FacadeResult<Bson> {
        Ok(
            self.collection(namespace)?
                .insert_one(document)
                .await
                .map_err(write_error)?
                .inserted_id
        )
    }

    async fn insert_many(&self, namespace: &Namespace, documents: Vec<Document>) -> FacadeResult<Vec<Bson>> {
        let count = documents.len();

        let mut inserted = self
            .collection(namespace)?
            .insert_many(documents)
            .await
            .map_err(write_error)?
            .inserted_ids;

        // The driver reports ids keyed by input index.
        (0..count)
            .map(|index| {
                inserted
                    .remove(&index)
                    .ok_or_else(|| FacadeError::Write(format!("no inserted id reported for document {index}")))
            })
            .collect()
    }

    async fn update_one(&self, namespace: &Namespace, filter: Document, update: Document) -> FacadeResult<UpdateOutcome> {
        self.collection(namespace)?
            .update_one(filter, update)
            .await
            .map(update_outcome)
            .map_err(write_error)
    }

    async fn update_many(&self, namespace: &Namespace, filter: Document, update: Document) -> FacadeResult<UpdateOutcome> {
        self.collection(namespace)?
            .update_many(filter, update)
            .await
            .map(update_outcome)
            .map_err(write_error)
    }

    async fn replace_one(
        &self,
        namespace: &Namespace,
        filter: Document,
        replacement: Document,
    ) -> FacadeResult<UpdateOutcome> {
        self.collection(namespace)?
            .replace_one(filter, replacement)
            .await
            .map(update_outcome)
            .map_err(write_error)
    }

    async fn delete_one(&self, namespace: &Namespace, filter: Document) -> FacadeResult<DeleteOutcome> {
        self.collection(namespace)?
            .delete_one(filter)
            .await
            .map(delete_outcome)
            .map_err(write_error)
    }

    async fn delete_many(&self, namespace: &Namespace, filter: Document) -> FacadeResult<DeleteOutcome> {
        self.collection(namespace)?
            .delete_many(filter)
            .await
            .map(delete_outcome)
            .map_err(write_error)
    }

    async fn find_one_and_delete(&self, namespace: &Namespace, filter: Document) -> FacadeResult<Option<Document>> {
        self.collection(namespace)?
            .find_one_and_delete(filter)
            .await
            .map_err(write_error)
    }

    async fn find_one_and_update(
        &self,
        namespace: &Namespace,
        filter: Document,
        update: Document,
    ) -> FacadeResult<Option<Document>> {
        self.collection(namespace)?
            .find_one_and_update(filter, update)
            .await
            .map_err(write_error)
    }

    async fn find_one_and_replace(
        &self,
        namespace: &Namespace,
        filter: Document,
        replacement: Document,
    ) -> FacadeResult<Option<Document>> {
        self.collection(namespace)?
            .find_one_and_replace(filter, replacement)
            .await
            .map_err(write_error)
    }

    async fn count_documents(&self, namespace: &Namespace, filter: Document) -> FacadeResult<u64> {
        self.collection(namespace)?
            .count_documents(filter)
            .await
            .map_err(submission_error)
    }

    async fn estimated_document_count(&self, namespace: &Namespace) -> FacadeResult<u64> {
        self.collection(namespace)?
            .estimated_document_count()
            .await
            .map_err(submission_error)
    }

    async fn distinct(&self, namespace: &Namespace, field: &str, filter: Document) -> FacadeResult<Vec<Bson>> {
        self.collection(namespace)?
            .distinct(field, filter)
            .await
            .map_err(submission_error)
    }
}
