//! Convenient re-exports of commonly used types from docfacade.
//!
//! ```ignore
//! use docfacade::prelude::*;
//! ```

pub use bson::{Bson, Document, doc, oid::ObjectId};

pub use docfacade_core::{
    client::Client,
    database::Database,
    collection::Collection,
    engine::{Engine, EngineConnector, EngineCursor, Namespace, UpdateOutcome, DeleteOutcome},
    options::{Asc, Desc, Ordering, SortKey, SortDirection, FindOneOptions, FindOptions},
    error::{FacadeError, FacadeResult},
};
