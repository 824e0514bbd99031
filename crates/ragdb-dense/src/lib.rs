//! ragdb-dense
//!
//! LanceDB-backed implementation of the dense-vector backend: one table
//! per knowledge-base partition, batched ingest, cosine vector search.

pub mod backend;
pub mod schema;
pub mod writer;

pub use backend::LanceDenseBackend;
pub use writer::DenseWriter;
