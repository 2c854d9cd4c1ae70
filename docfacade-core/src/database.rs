//! The database facade.

use bson::Document;

use crate::{
    client::Client,
    collection::Collection,
    engine::{Engine, Namespace},
    error::FacadeResult,
};

/// A named database reached through a [`Client`].
///
/// Cheap to create and stateless apart from the name and the client reference.
#[derive(Debug)]
pub struct Database<'a, E: Engine> {
    name: String,
    client: &'a Client<E>,
}

impl<'a, E: Engine> Database<'a, E> {
    pub(crate) fn new(name: String, client: &'a Client<E>) -> Self {
        Self { name, client }
    }

    /// Returns the name of this database.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the client this database belongs to.
    pub fn client(&self) -> &'a Client<E> {
        self.client
    }

    /// Returns a facade for the named collection. Performs no I/O.
    ///
    /// The collection borrows this database; keep the database alive for as
    /// long as the collection is used.
    pub fn collection(&self, name: &str) -> Collection<'_, E> {
        Collection::new(Namespace::new(self.name.as_str(), name), self)
    }

    /// Explicitly creates a collection.
    pub async fn create_collection(&self, name: &str) -> FacadeResult<()> {
        self.client
            .engine()
            .create_collection(&Namespace::new(self.name.as_str(), name))
            .await
    }

    /// Lists the collections of this database.
    pub async fn list_collection_names(&self) -> FacadeResult<Vec<String>> {
        self.client
            .engine()
            .list_collection_names(&self.name)
            .await
    }

    /// Runs an administrative command and returns the engine's reply.
    pub async fn run_command(&self, command: Document) -> FacadeResult<Document> {
        self.client
            .engine()
            .run_command(&self.name, command)
            .await
    }

    /// Drops the database and everything in it.
    pub async fn drop(&self) -> FacadeResult<()> {
        self.client
            .engine()
            .drop_database(&self.name)
            .await
    }
}
