//! Single-repository audit of a local checkout, without clone, cache or
//! report files.

pub mod exec;
pub mod output;

pub use exec::{exec, AnalyzeArgs};
pub use output::{output_json, output_ndjson, output_table};
