//! In-process document engine.
//!
//! Documents live in insertion order per collection, inside a map of
//! databases guarded by an async-aware read-write lock. Every query is a full
//! scan; there are no indexes.

use std::{
    collections::{HashMap, VecDeque},
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
};

use async_trait::async_trait;
use bson::{Bson, Document, doc, oid::ObjectId};
use mea::rwlock::RwLock;
use tracing::{debug, info};

use docfacade_core::{
    engine::{DeleteOutcome, Engine, EngineConnector, EngineCursor, Namespace, UpdateOutcome},
    error::{FacadeError, FacadeResult},
    translate::{FindOneQuery, FindQuery},
};

use crate::{
    evaluator::{FilterEvaluator, SortSpec, as_count, lookup},
    pipeline::{Projection, run_pipeline},
    update::{apply_update, replacement_for},
};

type CollectionMap = HashMap<String, Vec<Document>>;
type StoreMap = HashMap<String, CollectionMap>;


/// A document engine that keeps everything in memory.
///
/// Clones share the same data and the same connection state, so a clone kept
/// by a test can observe what a [`Client`](docfacade_core::client::Client)
/// wrote, or disconnect it.
///
/// # Example
///
/// ```ignore
/// use docfacade::{prelude::*, memory::{MemoryConnector, MemoryEngine}};
///
/// let engine = MemoryEngine::new();
/// let client = Client::connect(MemoryConnector::with_engine(engine.clone())).await?;
///
/// client.database("app").collection("users").insert_one(&doc! { "name": "Priya" }).await?;
/// ```
#[derive(Clone, Debug)]
pub struct MemoryEngine {
    /// database name -> (collection name -> documents)
    store: Arc<RwLock<StoreMap>>,
    connected: Arc<AtomicBool>,
}

impl MemoryEngine {
    /// Creates an empty, connected engine.
    pub fn new() -> Self {
        Self {
            store: Arc::new(RwLock::new(StoreMap::new())),
            connected: Arc::new(AtomicBool::new(true)),
        }
    }

    /// Whether [`disconnect`](Engine::disconnect) has been called.
    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Acquire)
    }

    fn ensure_connected(&self) -> FacadeResult<()> {
        if self.is_connected() {
            Ok(())
        } else {
            Err(FacadeError::Connection("client is disconnected".to_string()))
        }
    }
}

impl Default for MemoryEngine {
    fn default() -> Self {
        Self::new()
    }
}

fn collection<'s>(store: &'s StoreMap, namespace: &Namespace) -> &'s [Document] {
    store
        .get(&namespace.database)
        .and_then(|database| database.get(&namespace.collection))
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

fn collection_mut<'s>(store: &'s mut StoreMap, namespace: &Namespace) -> Option<&'s mut Vec<Document>> {
    store
        .get_mut(&namespace.database)?
        .get_mut(&namespace.collection)
}

fn first_match(documents: &[Document], filter: &Document) -> FacadeResult<Option<usize>> {
    for (index, document) in documents.iter().enumerate() {
        if FilterEvaluator::new(document).matches(filter)? {
            return Ok(Some(index));
        }
    }

    Ok(None)
}

fn all_matches(documents: &[Document], filter: &Document) -> FacadeResult<Vec<usize>> {
    let mut indices = Vec::new();

    for (index, document) in documents.iter().enumerate() {
        if FilterEvaluator::new(document).matches(filter)? {
            indices.push(index);
        }
    }

    Ok(indices)
}

/// Gives `document` an `ObjectId` as its first field if it has no `_id`.
fn assign_id(document: Document) -> (Bson, Document) {
    if let Some(id) = document.get("_id") {
        return (id.clone(), document);
    }

    let id = Bson::ObjectId(ObjectId::new());
    let mut stored = doc! { "_id": id.clone() };

    for (key, value) in document {
        stored.insert(key, value);
    }

    (id, stored)
}

fn duplicate_key(id: &Bson, namespace: &Namespace) -> FacadeError {
    FacadeError::Write(format!("duplicate key: _id {id} already exists in {namespace}"))
}

/// The subset of driver find options the in-memory engine understands.
///
/// `sort` and `limit` only apply when the translated query leaves them unset.
#[derive(Debug, Default)]
struct PassthroughOptions {
    skip: u64,
    limit: Option<i64>,
    sort: Option<Document>,
    projection: Option<Projection>,
}

impl PassthroughOptions {
    fn parse(extra: &Document) -> FacadeResult<Self> {
        let mut options = Self::default();

        for (key, value) in extra {
            match key.as_str() {
                "skip" => {
                    options.skip = as_count(value).ok_or_else(|| {
                        FacadeError::QuerySubmission(format!("skip must be a non-negative integer, got {value}"))
                    })?;
                }
                "limit" => {
                    options.limit = match value {
                        Bson::Int32(n) => Some(i64::from(*n)),
                        Bson::Int64(n) => Some(*n),
                        _ => {
                            return Err(FacadeError::QuerySubmission(format!("limit must be an integer, got {value}")));
                        }
                    };
                }
                "sort" => {
                    let sort = value.as_document().ok_or_else(|| {
                        FacadeError::QuerySubmission("sort must be a document".to_string())
                    })?;
                    options.sort = Some(sort.clone());
                }
                "projection" => {
                    let spec = value.as_document().ok_or_else(|| {
                        FacadeError::QuerySubmission("projection must be a document".to_string())
                    })?;
                    options.projection = Some(Projection::parse(spec)?);
                }
                other => debug!(option = other, "ignoring find option"),
            }
        }

        Ok(options)
    }
}

fn run_query(
    documents: &[Document],
    filter: &Document,
    sort: Option<&Document>,
    limit: Option<i64>,
    extra: &Document,
) -> FacadeResult<Vec<Document>> {
    let options = PassthroughOptions::parse(extra)?;
    let mut matched = FilterEvaluator::filter_documents(documents, filter)?;

    if let Some(sort) = sort.or(options.sort.as_ref()) {
        SortSpec::parse(sort)?.sort(&mut matched);
    }

    let limit = match limit.or(options.limit) {
        Some(n) if n != 0 => n.unsigned_abs() as usize,
        _ => usize::MAX,
    };

    Ok(
        matched
            .into_iter()
            .skip(options.skip as usize)
            .take(limit)
            .map(|document| match &options.projection {
                Some(projection) => projection.apply(&document),
                None => document,
            })
            .collect()
    )
}


/// Cursor over a materialized result set. Nothing is held engine-side, so
/// release cannot fail.
#[derive(Debug)]
pub struct MemoryCursor {
    documents: VecDeque<Document>,
}

#[async_trait]
impl EngineCursor for MemoryCursor {
    async fn next(&mut self) -> FacadeResult<Option<Document>> {
        Ok(self.documents.pop_front())
    }

    async fn close(self) -> FacadeResult<()> {
        Ok(())
    }
}

impl From<Vec<Document>> for MemoryCursor {
    fn from(documents: Vec<Document>) -> Self {
        Self {
            documents: documents.into(),
        }
    }
}


#[async_trait]
impl Engine for MemoryEngine {
    type Cursor = MemoryCursor;

    async fn ping(&self) -> FacadeResult<()> {
        self.ensure_connected()
    }

    async fn disconnect(&self) -> FacadeResult<()> {
        if !self.connected.swap(false, Ordering::AcqRel) {
            return Err(FacadeError::Disconnect("client is already disconnected".to_string()));
        }

        info!("in-memory engine disconnected");

        Ok(())
    }

    async fn list_database_names(&self) -> FacadeResult<Vec<String>> {
        self.ensure_connected()?;

        let mut names = self
            .store
            .read()
            .await
            .keys()
            .cloned()
            .collect::<Vec<_>>();
        names.sort();

        Ok(names)
    }

    async fn drop_database(&self, database: &str) -> FacadeResult<()> {
        self.ensure_connected()?;
        self.store.write().await.remove(database);

        Ok(())
    }

    async fn run_command(&self, database: &str, command: Document) -> FacadeResult<Document> {
        self.ensure_connected()?;

        let Some((name, argument)) = command.iter().next() else {
            return Err(FacadeError::Command("command document is empty".to_string()));
        };

        match name.as_str() {
            "ping" => Ok(doc! { "ok": 1.0 }),
            "count" => {
                let collection = argument
                    .as_str()
                    .ok_or_else(|| FacadeError::Command("count needs a collection name".to_string()))?;

                let filter = match command.get("query") {
                    Some(Bson::Document(query)) => query.clone(),
                    Some(_) => return Err(FacadeError::Command("count query must be a document".to_string())),
                    None => Document::new(),
                };

                let n = self
                    .count_documents(&Namespace::new(database, collection), filter)
                    .await?;

                Ok(doc! { "n": n as i64, "ok": 1.0 })
            }
            other => Err(FacadeError::Command(format!("no such command: '{other}'"))),
        }
    }

    async fn create_collection(&self, namespace: &Namespace) -> FacadeResult<()> {
        self.ensure_connected()?;

        let mut store = self.store.write().await;
        let database = store.entry(namespace.database.clone()).or_default();

        if database.contains_key(&namespace.collection) {
            return Err(FacadeError::Command(format!("collection already exists: {namespace}")));
        }

        database.insert(namespace.collection.clone(), Vec::new());

        Ok(())
    }

    async fn list_collection_names(&self, database: &str) -> FacadeResult<Vec<String>> {
        self.ensure_connected()?;

        let mut names = self
            .store
            .read()
            .await
            .get(database)
            .map(|collections| collections.keys().cloned().collect::<Vec<_>>())
            .unwrap_or_default();
        names.sort();

        Ok(names)
    }

    async fn drop_collection(&self, namespace: &Namespace) -> FacadeResult<()> {
        self.ensure_connected()?;

        if let Some(database) = self.store.write().await.get_mut(&namespace.database) {
            database.remove(&namespace.collection);
        }

        Ok(())
    }

    async fn find(&self, namespace: &Namespace, query: FindQuery) -> FacadeResult<MemoryCursor> {
        self.ensure_connected()?;

        let store = self.store.read().await;
        let results = run_query(
            collection(&store, namespace),
            &query.filter,
            query.sort.as_ref(),
            query.limit,
            &query.extra,
        )?;

        debug!(%namespace, count = results.len(), "find");

        Ok(results.into())
    }

    async fn find_one(&self, namespace: &Namespace, query: FindOneQuery) -> FacadeResult<Option<Document>> {
        self.ensure_connected()?;

        let store = self.store.read().await;
        let results = run_query(
            collection(&store, namespace),
            &query.filter,
            query.sort.as_ref(),
            Some(1),
            &query.extra,
        )?;

        Ok(results.into_iter().next())
    }

    async fn aggregate(
        &self,
        namespace: &Namespace,
        pipeline: Vec<Document>,
        extra: Document,
    ) -> FacadeResult<MemoryCursor> {
        self.ensure_connected()?;

        if !extra.is_empty() {
            debug!(?extra, "ignoring aggregate options");
        }

        let documents = collection(&*self.store.read().await, namespace).to_vec();

        Ok(run_pipeline(documents, &pipeline)?.into())
    }

    async fn insert_one(&self, namespace: &Namespace, document: Document) -> FacadeResult<Bson> {
        self.ensure_connected()?;

        let (id, document) = assign_id(document);

        let mut store = self.store.write().await;
        let documents = store
            .entry(namespace.database.clone())
            .or_default()
            .entry(namespace.collection.clone())
            .or_default();

        if documents.iter().any(|existing| existing.get("_id") == Some(&id)) {
            return Err(duplicate_key(&id, namespace));
        }

        documents.push(document);

        Ok(id)
    }

    async fn insert_many(&self, namespace: &Namespace, documents: Vec<Document>) -> FacadeResult<Vec<Bson>> {
        self.ensure_connected()?;

        let (ids, documents): (Vec<Bson>, Vec<Document>) = documents.into_iter().map(assign_id).unzip();

        let mut store = self.store.write().await;
        let stored = store
            .entry(namespace.database.clone())
            .or_default()
            .entry(namespace.collection.clone())
            .or_default();

        for (index, id) in ids.iter().enumerate() {
            let clashes = ids[..index].contains(id) || stored.iter().any(|existing| existing.get("_id") == Some(id));

            if clashes {
                return Err(duplicate_key(id, namespace));
            }
        }

        stored.extend(documents);

        debug!(%namespace, count = ids.len(), "insert_many");

        Ok(ids)
    }

    async fn update_one(&self, namespace: &Namespace, filter: Document, update: Document) -> FacadeResult<UpdateOutcome> {
        self.ensure_connected()?;

        let mut store = self.store.write().await;

        let Some(documents) = collection_mut(&mut store, namespace) else {
            return Ok(UpdateOutcome::default());
        };

        let Some(index) = first_match(documents, &filter)? else {
            return Ok(UpdateOutcome::default());
        };

        let mut updated = documents[index].clone();
        let changed = apply_update(&mut updated, &update)?;
        documents[index] = updated;

        Ok(UpdateOutcome {
            matched_count: 1,
            modified_count: changed as u64,
            upserted_id: None,
        })
    }

    async fn update_many(&self, namespace: &Namespace, filter: Document, update: Document) -> FacadeResult<UpdateOutcome> {
        self.ensure_connected()?;

        let mut store = self.store.write().await;

        let Some(documents) = collection_mut(&mut store, namespace) else {
            return Ok(UpdateOutcome::default());
        };

        let mut updates = Vec::new();

        for index in all_matches(documents, &filter)? {
            let mut updated = documents[index].clone();
            let changed = apply_update(&mut updated, &update)?;
            updates.push((index, updated, changed));
        }

        let matched_count = updates.len() as u64;
        let mut modified_count = 0;

        for (index, updated, changed) in updates {
            documents[index] = updated;
            modified_count += changed as u64;
        }

        Ok(UpdateOutcome {
            matched_count,
            modified_count,
            upserted_id: None,
        })
    }

    async fn replace_one(
        &self,
        namespace: &Namespace,
        filter: Document,
        replacement: Document,
    ) -> FacadeResult<UpdateOutcome> {
        self.ensure_connected()?;

        let mut store = self.store.write().await;

        let Some(documents) = collection_mut(&mut store, namespace) else {
            return Ok(UpdateOutcome::default());
        };

        let Some(index) = first_match(documents, &filter)? else {
            return Ok(UpdateOutcome::default());
        };

        let stored = replacement_for(&documents[index], replacement)?;
        let changed = stored != documents[index];
        documents[index] = stored;

        Ok(UpdateOutcome {
            matched_count: 1,
            modified_count: changed as u64,
            upserted_id: None,
        })
    }

    async fn delete_one(&self, namespace: &Namespace, filter: Document) -> FacadeResult<DeleteOutcome> {
        Ok(DeleteOutcome {
            deleted_count: self.find_one_and_delete(namespace, filter).await?.is_some() as u64,
        })
    }

    async fn delete_many(&self, namespace: &Namespace, filter: Document) -> FacadeResult<DeleteOutcome> {
        self.ensure_connected()?;

        let mut store = self.store.write().await;

        let Some(documents) = collection_mut(&mut store, namespace) else {
            return Ok(DeleteOutcome::default());
        };

        // Indices come back ascending, so one pass alongside `retain` suffices.
        let doomed = all_matches(documents, &filter)?;
        let mut pending = doomed.iter().copied().peekable();

        let mut position = 0;
        documents.retain(|_| {
            let remove = pending.next_if_eq(&position).is_some();
            position += 1;
            !remove
        });

        Ok(DeleteOutcome {
            deleted_count: doomed.len() as u64,
        })
    }

    async fn find_one_and_delete(&self, namespace: &Namespace, filter: Document) -> FacadeResult<Option<Document>> {
        self.ensure_connected()?;

        let mut store = self.store.write().await;

        let Some(documents) = collection_mut(&mut store, namespace) else {
            return Ok(None);
        };

        Ok(first_match(documents, &filter)?.map(|index| documents.remove(index)))
    }

    async fn find_one_and_update(
        &self,
        namespace: &Namespace,
        filter: Document,
        update: Document,
    ) -> FacadeResult<Option<Document>> {
        self.ensure_connected()?;

        let mut store = self.store.write().await;

        let Some(documents) = collection_mut(&mut store, namespace) else {
            return Ok(None);
        };

        let Some(index) = first_match(documents, &filter)? else {
            return Ok(None);
        };

        let mut updated = documents[index].clone();
        apply_update(&mut updated, &update)?;

        Ok(Some(std::mem::replace(&mut documents[index], updated)))
    }

    async fn find_one_and_replace(
        &self,
        namespace: &Namespace,
        filter: Document,
        replacement: Document,
    ) -> FacadeResult<Option<Document>> {
        self.ensure_connected()?;

        let mut store = self.store.write().await;

        let Some(documents) = collection_mut(&mut store, namespace) else {
            return Ok(None);
        };

        let Some(index) = first_match(documents, &filter)? else {
            return Ok(None);
        };

        let stored = replacement_for(&documents[index], replacement)?;

        Ok(Some(std::mem::replace(&mut documents[index], stored)))
    }

    async fn count_documents(&self, namespace: &Namespace, filter: Document) -> FacadeResult<u64> {
        self.ensure_connected()?;

        let store = self.store.read().await;

        Ok(all_matches(collection(&store, namespace), &filter)?.len() as u64)
    }

    async fn estimated_document_count(&self, namespace: &Namespace) -> FacadeResult<u64> {
        self.ensure_connected()?;

        Ok(collection(&*self.store.read().await, namespace).len() as u64)
    }

    async fn distinct(&self, namespace: &Namespace, field: &str, filter: Document) -> FacadeResult<Vec<Bson>> {
        self.ensure_connected()?;

        let store = self.store.read().await;
        let mut values: Vec<Bson> = Vec::new();

        for document in FilterEvaluator::filter_documents(collection(&store, namespace), &filter)? {
            let found = match lookup(&document, field) {
                Some(Bson::Array(items)) => items.clone(),
                Some(value) => vec![value.clone()],
                None => continue,
            };

            for value in found {
                if !values.contains(&value) {
                    values.push(value);
                }
            }
        }

        Ok(values)
    }
}


/// Connects a [`MemoryEngine`].
///
/// [`MemoryConnector::new`] starts from an empty engine;
/// [`MemoryConnector::with_engine`] reuses an existing one, sharing its data.
#[derive(Debug, Default)]
pub struct MemoryConnector {
    engine: Option<MemoryEngine>,
}

impl MemoryConnector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_engine(engine: MemoryEngine) -> Self {
        Self {
            engine: Some(engine),
        }
    }
}

#[async_trait]
impl EngineConnector for MemoryConnector {
    type Engine = MemoryEngine;

    async fn connect(self) -> FacadeResult<MemoryEngine> {
        Ok(self.engine.unwrap_or_default())
    }
}
