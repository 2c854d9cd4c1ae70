//! In-process document engine for docfacade.
//!
//! This crate implements the `Engine` boundary of `docfacade-core` without a
//! server. Documents are kept per database and collection behind an
//! async-aware read-write lock. It is meant for development and tests.
//!
//! # Features
//!
//! - **Filters** - `$eq`, `$ne`, `$gt`, `$gte`, `$lt`, `$lte`, `$in`, `$nin`,
//!   `$exists`, `$not`, `$and`, `$or`, `$nor` and dotted paths
//! - **Updates** - `$set`, `$unset` and `$inc`, plus whole-document replacement
//! - **Aggregation** - `$match`, `$sort`, `$skip`, `$limit` and `$project`
//! - **Commands** - `ping` and `count`
//!
//! # Quick Start
//!
//! ```ignore
//! use docfacade::{prelude::*, memory::MemoryConnector};
//!
//! #[tokio::main]
//! async fn main() -> FacadeResult<()> {
//!     let client = Client::connect(MemoryConnector::new()).await?;
//!     let users = client.database("app");
//!     let users = users.collection("users");
//!
//!     users.insert_one(&doc! { "name": "Subrato", "age": 30 }).await?;
//!
//!     Ok(())
//! }
//! ```

mod evaluator;
mod pipeline;
mod update;

pub mod store;

pub use store::{MemoryConnector, MemoryCursor, MemoryEngine};
