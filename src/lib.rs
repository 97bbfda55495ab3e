//! OmniSketch
//!
//! A multi-dimensional Count-Min sketch with per-bucket bottom-k ID sampling,
//! for estimating the cardinality of conjunctive equality predicates over
//! several columns without materializing per-record state. Rust
//! implementation of the core data structure from:
//!
//! Nikolaos Punter, Odysseas Papapetrou, and Minos Garofalakis. OmniSketch:
//! Learning How to Sketch (with) Multiple Attribute Streams. Proceedings of
//! the VLDB Endowment, 2023.
//!
//! A sketch is `C` independent `D x W` Count-Min matrices, one per predicate
//! column, sharing a single ingest counter. Each cell additionally retains a
//! bottom-`B` sample of the record IDs that hashed into it, prioritized by an
//! independent hash `H_s` of the ID. Querying a conjunction of per-column
//! equality predicates walks the matching cell in every row of every column,
//! intersects the visited cells' ID samples, and scales the surviving
//! fraction by the largest `total_count` seen along the way.

mod builder;
mod bucket;
mod combiner;
mod error;
mod estimator;
mod finalize;
mod hash;
mod layout;
mod sizing;
mod sketch;

pub use error::OmniSketchError;
pub use sketch::{combine, Sketch};
