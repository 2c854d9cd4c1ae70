//! Aggregation pipeline stages for in-memory documents.
//!
//! Supported stages: `$match`, `$sort`, `$skip`, `$limit` and `$project`.

use bson::{Bson, Document};

use docfacade_core::error::{FacadeError, FacadeResult};

use crate::evaluator::{FilterEvaluator, SortSpec, as_count, lookup};


fn submission_error(message: impl Into<String>) -> FacadeError {
    FacadeError::QuerySubmission(message.into())
}

/// Runs `pipeline` over `documents`, stage by stage.
pub(crate) fn run_pipeline(mut documents: Vec<Document>, pipeline: &[Document]) -> FacadeResult<Vec<Document>> {
    for stage in pipeline {
        let mut entries = stage.iter();

        let (name, argument) = match (entries.next(), entries.next()) {
            (Some(entry), None) => entry,
            _ => return Err(submission_error("a pipeline stage must have exactly one field")),
        };

        documents = match name.as_str() {
            "$match" => FilterEvaluator::filter_documents(&documents, stage_document(name, argument)?)?,
            "$sort" => {
                SortSpec::parse(stage_document(name, argument)?)?.sort(&mut documents);
                documents
            }
            "$skip" => documents
                .into_iter()
                .skip(stage_count(name, argument)? as usize)
                .collect(),
            "$limit" => match stage_count(name, argument)? {
                0 => return Err(submission_error("the $limit stage must be positive")),
                n => documents.into_iter().take(n as usize).collect(),
            },
            "$project" => {
                let projection = Projection::parse(stage_document(name, argument)?)?;
                documents.iter().map(|d| projection.apply(d)).collect()
            }
            other => return Err(submission_error(format!("unsupported pipeline stage: {other}"))),
        };
    }

    Ok(documents)
}

fn stage_document<'a>(name: &str, argument: &'a Bson) -> FacadeResult<&'a Document> {
    argument
        .as_document()
        .ok_or_else(|| submission_error(format!("the {name} stage needs a document")))
}

fn stage_count(name: &str, argument: &Bson) -> FacadeResult<u64> {
    as_count(argument).ok_or_else(|| submission_error(format!("the {name} stage needs a non-negative integer")))
}

/// A parsed `$project` specification (also used for the `projection` find option).
#[derive(Debug, Clone)]
pub(crate) struct Projection {
    fields: Vec<String>,
    include: bool,
    include_id: bool,
}

impl Projection {
    pub fn parse(spec: &Document) -> FacadeResult<Self> {
        let mut fields = Vec::new();
        let mut include = None;
        let mut include_id = true;

        for (field, flag) in spec {
            let flag = match flag {
                Bson::Boolean(b) => *b,
                Bson::Int32(n) => *n != 0,
                Bson::Int64(n) => *n != 0,
                Bson::Double(n) => *n != 0.0,
                _ => return Err(submission_error(format!("unsupported projection for '{field}'"))),
            };

            if field == "_id" {
                include_id = flag;
                continue;
            }

            match include {
                Some(mode) if mode != flag => {
                    return Err(submission_error("cannot mix inclusion and exclusion in a projection"));
                }
                _ => include = Some(flag),
            }

            fields.push(field.clone());
        }

        Ok(Self {
            fields,
            include: include.unwrap_or(false),
            include_id,
        })
    }

    pub fn apply(&self, document: &Document) -> Document {
        let mut projected = Document::new();

        if self.include_id {
            if let Some(id) = document.get("_id") {
                projected.insert("_id", id.clone());
            }
        }

        if self.include {
            for field in &self.fields {
                if let Some(value) = lookup(document, field) {
                    projected.insert(field.clone(), value.clone());
                }
            }
        } else {
            for (key, value) in document {
                if key != "_id" && !self.fields.contains(key) {
                    projected.insert(key.clone(), value.clone());
                }
            }
        }

        projected
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::doc;

    fn people() -> Vec<Document> {
        vec![
            doc! { "_id": 1, "name": "Subrato", "age": 30 },
            doc! { "_id": 2, "name": "Shekhar", "age": 25 },
            doc! { "_id": 3, "name": "Priya", "age": 22 },
        ]
    }

    #[test]
    fn match_sort_limit_project() {
        let output = run_pipeline(
            people(),
            &[
                doc! { "$match": { "age": { "$gte": 22 } } },
                doc! { "$sort": { "age": 1 } },
                doc! { "$skip": 1 },
                doc! { "$limit": 1 },
                doc! { "$project": { "name": 1, "_id": 0 } },
            ],
        )
        .unwrap();

        assert_eq!(output, vec![doc! { "name": "Shekhar" }]);
    }

    #[test]
    fn exclusion_projection() {
        let output = run_pipeline(people(), &[doc! { "$project": { "age": 0 } }]).unwrap();

        assert_eq!(output[0], doc! { "_id": 1, "name": "Subrato" });
    }

    #[test]
    fn unsupported_stage_is_a_submission_error() {
        let err = run_pipeline(people(), &[doc! { "$group": { "_id": "$age" } }]).unwrap_err();

        assert!(matches!(err, FacadeError::QuerySubmission(_)));
    }

    #[test]
    fn stages_need_exactly_one_field() {
        assert!(run_pipeline(people(), &[doc! { "$skip": 1, "$limit": 1 }]).is_err());
    }
}
