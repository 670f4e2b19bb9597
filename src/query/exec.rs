use crate::collection::Collection;
use crate::document::Document;
use bson::Document as BsonDocument;
use std::time::Instant;

use super::cursor::Cursor;
use super::eval::{compare_docs, eval_filter, get_path};
use super::types::{Filter, FindOptions, MAX_PROJECTION_FIELDS};

const QUERY_TARGET: &str = "students_marks::query";

/// Filters, sorts, slices and projects the documents of `col`.
#[must_use]
pub fn find_docs(col: &Collection, filter: &Filter, opts: &FindOptions) -> Cursor {
    let start_t = Instant::now();
    let mut docs: Vec<Document> = col.get_all_documents();
    docs.retain(|d| eval_filter(d.body(), filter));
    if let Some(specs) = &opts.sort {
        // stable, so equal keys keep ascending _id
        docs.sort_by(|a, b| compare_docs(a.body(), b.body(), specs));
    }
    let skip = opts.skip.unwrap_or(0);
    let limit = opts.limit.unwrap_or(usize::MAX);
    let mut out: Vec<Document> = docs.into_iter().skip(skip).take(limit).collect();
    if let Some(fields) = &opts.projection {
        let limited: Vec<String> = fields.iter().take(MAX_PROJECTION_FIELDS).cloned().collect();
        for d in &mut out {
            d.data.0 = project(d.body(), &limited);
        }
    }
    log::debug!(
        target: QUERY_TARGET,
        "find collection={} filter={} returned={} took_ms={}",
        col.name(),
        filter.type_name(),
        out.len(),
        start_t.elapsed().as_millis()
    );
    Cursor::new(out)
}

/// First match in ascending `_id` order, projected.
#[must_use]
pub fn find_one(col: &Collection, filter: &Filter, projection: Option<&[String]>) -> Option<Document> {
    let opts = FindOptions {
        projection: projection.map(<[String]>::to_vec),
        limit: Some(1),
        ..FindOptions::default()
    };
    find_docs(col, filter, &opts).next()
}

#[must_use]
pub fn count_docs(col: &Collection, filter: &Filter) -> usize {
    col.get_all_documents().iter().filter(|d| eval_filter(d.body(), filter)).count()
}

/// Keeps only `fields`; dotted paths are copied under their dotted name.
#[must_use]
pub(crate) fn project(doc: &BsonDocument, fields: &[String]) -> BsonDocument {
    let mut out = BsonDocument::new();
    for f in fields {
        if let Some(v) = get_path(doc, f) {
            out.insert(f.clone(), v.clone());
        }
    }
    out
}
