mod cursor;
mod eval;
mod exec;
mod types;

pub use cursor::Cursor;
pub use eval::{compare_docs, eval_filter};
pub(crate) use eval::{get_path, to_f64};
pub use exec::{count_docs, find_docs, find_one};
pub use types::{CmpOp, Filter, FindOptions, Order, SortSpec};
