//! # musicschool-backend
//!
//! Seams to the managed backend the application runs on: an
//! authentication provider and a document database. Both are async traits
//! so the client services never depend on a concrete vendor. An in-memory
//! implementation of each lives in [`memory`]; the SQLite-backed pair lives
//! in `musicschool-store`.

pub mod auth;
pub mod document;
pub mod memory;
pub mod query;

mod error;

pub use auth::{AuthError, AuthProvider};
pub use document::{server_timestamp, Document, DocumentStore};
pub use error::{BackendError, Result};
pub use memory::{MemoryAuthProvider, MemoryDocumentStore};
pub use query::{Direction, Filter, Query};
