//! A thin facade over document-database clients.
//!
//! This crate is the core of the docfacade project and provides:
//!
//! - **Facade hierarchy** ([`client`], [`database`], [`collection`]) - Narrow client, database and collection objects
//! - **Engine boundary** ([`engine`]) - Traits a document engine implements to sit behind the facade
//! - **Lookup options** ([`options`]) - Filter, ordering and limit records
//! - **Query translation** ([`translate`]) - Conversion of option records into engine queries
//! - **Result materialization** ([`materialize`]) - Cursor draining with guaranteed release
//! - **Identifier extraction** ([`identifier`]) - Inserted identifiers as string handles
//! - **Document codec** ([`document`]) - Serde conversion between caller types and BSON
//! - **Error handling** ([`error`]) - Error taxonomy and result type
//!
//! # Example
//!
//! ```ignore
//! use docfacade::{prelude::*, memory::MemoryConnector};
//! use bson::doc;
//!
//! let client = Client::connect(MemoryConnector::new()).await?;
//! let db = client.database("testdb");
//! let users = db.collection("users");
//!
//! let id = users.insert_one(&doc! { "name": "Subrato", "age": 30 }).await?;
//! let found: bson::Document = users
//!     .find_one(&FindOneOptions::with_filter(doc! { "name": "Subrato" }))
//!     .await?;
//! ```

pub mod client;
pub mod collection;
pub mod database;
pub mod document;
pub mod engine;
pub mod error;
pub mod identifier;
pub mod materialize;
pub mod options;
pub mod translate;
