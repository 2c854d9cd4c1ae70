//! The client facade, sole owner of the engine connection.
//!
//! # Example
//!
//! ```ignore
//! use docfacade::{prelude::*, memory::MemoryConnector};
//!
//! #[tokio::main]
//! async fn main() -> FacadeResult<()> {
//!     let client = Client::connect(MemoryConnector::new()).await?;
//!     let db = client.database("testdb");
//!     let users = db.collection("users");
//!
//!     users.insert_one(&bson::doc! { "name": "Subrato", "age": 30 }).await?;
//!
//!     client.disconnect().await
//! }
//! ```

use tracing::info;

use crate::{
    database::Database,
    engine::{Engine, EngineConnector},
    error::{FacadeError, FacadeResult},
};

/// A connected client.
///
/// Database and collection facades borrow the client, so the connection stays
/// open for as long as any of them is alive.
#[derive(Debug)]
pub struct Client<E: Engine> {
    engine: E,
}

impl<E: Engine> Client<E> {
    /// Builds the engine and checks that it is reachable.
    ///
    /// # Errors
    ///
    /// Returns [`FacadeError::Connection`] if the engine cannot be built or does
    /// not answer the reachability probe.
    pub async fn connect<C>(connector: C) -> FacadeResult<Self>
    where
        C: EngineConnector<Engine = E>,
    {
        let engine = connector.connect().await?;

        engine
            .ping()
            .await
            .map_err(|err| match err {
                FacadeError::Connection(_) => err,
                other => FacadeError::Connection(other.to_string()),
            })?;

        info!(engine = ?engine, "connected");

        Ok(Self { engine })
    }

    /// Closes the connection.
    ///
    /// Calling this more than once is not guaranteed to succeed; engines may
    /// report [`FacadeError::Disconnect`] on a second call.
    pub async fn disconnect(&self) -> FacadeResult<()> {
        self.engine.disconnect().await?;

        info!("disconnected");

        Ok(())
    }

    /// Returns a facade for the named database. Performs no I/O.
    pub fn database(&self, name: &str) -> Database<'_, E> {
        Database::new(name.to_string(), self)
    }

    /// Lists the databases known to the engine.
    pub async fn list_database_names(&self) -> FacadeResult<Vec<String>> {
        self.engine.list_database_names().await
    }

    /// The underlying engine handle.
    pub fn engine(&self) -> &E {
        &self.engine
    }
}
