use crate::collection::Collection;
use crate::document::ID_FIELD;
use crate::errors::DbError;
use crate::query::{compare_docs, eval_filter, get_path, to_f64};
use bson::{Bson, Document as BsonDocument};
use std::collections::HashMap;
use std::time::Instant;

use super::stage::{Accumulator, Pipeline, Stage};

/// Runs `pipeline` over every document of `col` in ascending `_id` order.
///
/// # Errors
/// Returns `DbError::QueryError` for a malformed stage.
pub fn aggregate(col: &Collection, pipeline: &Pipeline) -> Result<Vec<BsonDocument>, DbError> {
    let start_t = Instant::now();
    let rows = col.get_all_documents().into_iter().map(crate::document::Document::into_body).collect();
    let out = run_pipeline(rows, pipeline)?;
    log::debug!(
        target: "students_marks::query",
        "aggregate collection={} stages={} returned={} took_ms={}",
        col.name(),
        pipeline.stages().len(),
        out.len(),
        start_t.elapsed().as_millis()
    );
    Ok(out)
}

/// Runs `pipeline` over in-memory rows.
///
/// # Errors
/// Returns `DbError::QueryError` for a malformed stage.
pub fn run_pipeline(mut rows: Vec<BsonDocument>, pipeline: &Pipeline) -> Result<Vec<BsonDocument>, DbError> {
    for stage in pipeline.stages() {
        rows = match stage {
            Stage::Match(filter) => rows.into_iter().filter(|r| eval_filter(r, filter)).collect(),
            Stage::Unwind { path, preserve_null_and_empty } => unwind(rows, path, *preserve_null_and_empty)?,
            Stage::Group { key, accumulators } => group(&rows, key, accumulators)?,
            Stage::Sort(specs) => {
                rows.sort_by(|a, b| compare_docs(a, b, specs));
                rows
            }
            Stage::Limit(n) => {
                rows.truncate(*n);
                rows
            }
            Stage::Project(fields) => rows
                .iter()
                .map(|r| {
                    let mut out = BsonDocument::new();
                    for (name, path) in fields {
                        if let Some(v) = get_path(r, path) {
                            out.insert(name.clone(), v.clone());
                        }
                    }
                    out
                })
                .collect(),
        };
    }
    Ok(rows)
}

fn unwind(rows: Vec<BsonDocument>, path: &str, preserve: bool) -> Result<Vec<BsonDocument>, DbError> {
    if path.contains('.') {
        return Err(DbError::QueryError(format!("unwind supports top-level fields only, got {path}")));
    }
    let mut out = Vec::with_capacity(rows.len());
    for row in rows {
        match row.get(path) {
            Some(Bson::Array(items)) if !items.is_empty() => {
                for item in items {
                    let mut r = row.clone();
                    r.insert(path, item.clone());
                    out.push(r);
                }
            }
            Some(Bson::Array(_) | Bson::Null) | None => {
                if preserve {
                    let mut r = row;
                    r.remove(path);
                    out.push(r);
                }
            }
            Some(_) => out.push(row),
        }
    }
    Ok(out)
}

#[derive(Debug)]
enum AccState {
    Sum { int: i64, float: f64, is_float: bool },
    Avg { total: f64, n: u64 },
    Count(i64),
}

impl AccState {
    const fn new(acc: &Accumulator) -> Self {
        match acc {
            Accumulator::Sum(_) => Self::Sum { int: 0, float: 0.0, is_float: false },
            Accumulator::Avg(_) => Self::Avg { total: 0.0, n: 0 },
            Accumulator::Count => Self::Count(0),
        }
    }

    #[allow(clippy::cast_precision_loss)]
    fn feed(&mut self, acc: &Accumulator, row: &BsonDocument) {
        match (self, acc) {
            (Self::Sum { int, float, is_float }, Accumulator::Sum(path)) => match get_path(row, path) {
                Some(Bson::Int32(v)) if !*is_float => *int = int.saturating_add(i64::from(*v)),
                Some(Bson::Int64(v)) if !*is_float => *int = int.saturating_add(*v),
                Some(v) => {
                    if let Some(f) = to_f64(v) {
                        if !*is_float {
                            *float = *int as f64;
                            *is_float = true;
                        }
                        *float += f;
                    }
                }
                None => {}
            },
            (Self::Avg { total, n }, Accumulator::Avg(path)) => {
                if let Some(f) = get_path(row, path).and_then(to_f64) {
                    *total += f;
                    *n += 1;
                }
            }
            (Self::Count(c), Accumulator::Count) => *c += 1,
            _ => {}
        }
    }

    #[allow(clippy::cast_precision_loss)]
    fn finish(self) -> Bson {
        match self {
            Self::Sum { float, is_float: true, .. } => Bson::Double(float),
            Self::Sum { int, .. } => Bson::Int64(int),
            Self::Avg { n: 0, .. } => Bson::Null,
            Self::Avg { total, n } => Bson::Double(total / n as f64),
            Self::Count(c) => Bson::Int64(c),
        }
    }
}

// Int32 and Int64 of equal value share a group.
fn group_key(v: &Bson) -> String {
    match v {
        Bson::Int32(i) => format!("int:{i}"),
        Bson::Int64(i) => format!("int:{i}"),
        other => format!("{other:?}"),
    }
}

fn group(
    rows: &[BsonDocument],
    key: &str,
    accumulators: &[(String, Accumulator)],
) -> Result<Vec<BsonDocument>, DbError> {
    if accumulators.iter().any(|(name, _)| name == ID_FIELD) {
        return Err(DbError::QueryError("accumulator may not be named _id".into()));
    }
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut groups: Vec<(Bson, Vec<AccState>)> = Vec::new();
    for row in rows {
        let k = get_path(row, key).cloned().unwrap_or(Bson::Null);
        let slot = *index.entry(group_key(&k)).or_insert_with(|| {
            groups.push((k.clone(), accumulators.iter().map(|(_, a)| AccState::new(a)).collect()));
            groups.len() - 1
        });
        for (state, (_, acc)) in groups[slot].1.iter_mut().zip(accumulators) {
            state.feed(acc, row);
        }
    }
    Ok(groups
        .into_iter()
        .map(|(k, states)| {
            let mut out = BsonDocument::new();
            out.insert(ID_FIELD, k);
            for (state, (name, _)) in states.into_iter().zip(accumulators) {
                out.insert(name.clone(), state.finish());
            }
            out
        })
        .collect())
}
