//! MongoDB engine for docfacade.
//!
//! This crate implements the `Engine` boundary of `docfacade-core` on top of
//! the official asynchronous MongoDB driver.
//!
//! To use it through the umbrella crate, enable the `mongodb` feature:
//!
//! ```toml
//! [dependencies]
//! docfacade = { version = "x.y.z", features = ["mongodb"] }
//! ```
//!
//! # Features
//!
//! - **Configuration** - Connection string or host and port, optional credentials and app name
//! - **Passthrough options** - Extra find and aggregate options are handed to the driver as is
//! - **Cursor release** - Driver cursors are killed when closed or dropped
//!
//! # Example
//!
//! ```ignore
//! use docfacade::{prelude::*, mongodb::MongoConnector};
//!
//! #[tokio::main]
//! async fn main() -> FacadeResult<()> {
//!     let client = Client::connect(MongoConnector::builder("mongodb://localhost:27017").build()).await?;
//!     let names = client.list_database_names().await?;
//!
//!     client.disconnect().await
//! }
//! ```

mod options;

pub mod connector;
pub mod store;

pub use connector::{MongoConnector, MongoConnectorBuilder, MongoConnectorConfig};
pub use store::{MongoCursor, MongoEngine};
