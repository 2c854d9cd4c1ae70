//! A thin facade over document-database clients.
//!
//! This crate is the entry point for users of docfacade. It re-exports the
//! facade hierarchy from `docfacade-core` and gives access to the available
//! engines.
//!
//! # Features
//!
//! - **Narrow surface** - Client, database and collection objects expose a closed set of operations
//! - **Typed lookups** - Filters, ordering and limits as plain records; results decoded with Serde
//! - **Guaranteed release** - Multi-document cursors are always released, even when draining fails
//! - **String identifiers** - Inserted `ObjectId`s come back as hex strings
//!
//! # Quick Start
//!
//! ```ignore
//! use docfacade::{prelude::*, memory::MemoryConnector};
//! use serde::{Serialize, Deserialize};
//!
//! #[derive(Debug, Serialize, Deserialize)]
//! pub struct User {
//!     pub name: String,
//!     pub age: i32,
//! }
//!
//! #[tokio::main]
//! async fn main() -> FacadeResult<()> {
//!     let client = Client::connect(MemoryConnector::new()).await?;
//!     let db = client.database("testdb");
//!     let users = db.collection("users");
//!
//!     let id = users.insert_one(&User { name: "Subrato".into(), age: 30 }).await?;
//!     println!("inserted {id}");
//!
//!     let oldest: Vec<User> = users
//!         .find(
//!             &FindOptions::builder()
//!                 .filter(doc! { "age": { "$gte": 18 } })
//!                 .sort_by(Desc::new("age"))
//!                 .sort_by(Asc::new("name"))
//!                 .limit(10)
//!                 .build(),
//!         )
//!         .await?;
//!
//!     match users.find_one::<User>(&FindOneOptions::with_filter(doc! { "name": "nobody" })).await {
//!         Err(e) if e.is_not_found() => println!("no such user"),
//!         other => println!("{other:?}"),
//!     }
//!
//!     client.disconnect().await
//! }
//! ```
//!
//! # Engines
//!
//! - [`memory`] - In-process engine for development and testing
//! - [`mongodb`] - MongoDB driver adapter (requires the `mongodb` feature)

pub mod prelude;

pub use docfacade_core::{client, collection, database, document, engine, error, identifier, options, translate};

// Re-export BSON types for convenience
pub use bson;

/// In-process engine.
pub mod memory {
    pub use docfacade_memory::{MemoryConnector, MemoryCursor, MemoryEngine};
}

/// MongoDB engine.
///
/// This module is only available when the `mongodb` feature is enabled.
#[cfg(feature = "mongodb")]
pub mod mongodb {
    pub use docfacade_mongodb::{MongoConnector, MongoConnectorBuilder, MongoConnectorConfig, MongoCursor, MongoEngine};
}
