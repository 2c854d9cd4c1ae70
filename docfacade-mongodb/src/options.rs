//! Conversion of translated queries into driver option records.
//!
//! Passthrough documents are deserialized into the driver's own option types,
//! then the translated sort and limit are laid over them.

use bson::Document;
use mongodb::options::{AggregateOptions, FindOneOptions, FindOptions};
use serde::de::DeserializeOwned;

use docfacade_core::{
    error::{FacadeError, FacadeResult},
    translate::{FindOneQuery, FindQuery},
};


fn passthrough<T>(extra: &Document) -> FacadeResult<T>
where
    T: DeserializeOwned + Default,
{
    if extra.is_empty() {
        return Ok(T::default());
    }

    bson::de::deserialize_from_document(extra.clone())
        .map_err(|e| FacadeError::InvalidOptions(format!("invalid passthrough options: {e}")))
}

pub(crate) fn find_options(query: &FindQuery) -> FacadeResult<FindOptions> {
    let mut options: FindOptions = passthrough(&query.extra)?;

    if let Some(sort) = &query.sort {
        options.sort = Some(sort.clone());
    }
    if let Some(limit) = query.limit {
        options.limit = Some(limit);
    }

    Ok(options)
}

pub(crate) fn find_one_options(query: &FindOneQuery) -> FacadeResult<FindOneOptions> {
    let mut options: FindOneOptions = passthrough(&query.extra)?;

    if let Some(sort) = &query.sort {
        options.sort = Some(sort.clone());
    }

    Ok(options)
}

pub(crate) fn aggregate_options(extra: &Document) -> FacadeResult<AggregateOptions> {
    passthrough(extra)
}
