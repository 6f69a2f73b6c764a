//! # musicschool-store
//!
//! Local persistence for the music school client, backed by SQLite.
//!
//! The crate exposes a synchronous [`Database`] handle that wraps a
//! `rusqlite::Connection` and provides typed helpers for every table, plus
//! the pieces built on top of it:
//!
//! - [`cache`]: the canonical key/value cache interface and its memory and
//!   SQLite implementations, with [`StudyCache`] as the typed view used by
//!   the study log service;
//! - [`backend`]: an embedded implementation of the document store and
//!   authentication traits, for running without a managed backend.

pub mod accounts;
pub mod backend;
pub mod cache;
pub mod database;
pub mod documents;
pub mod kv;
pub mod migrations;

mod error;

pub use backend::{SqliteAuthProvider, SqliteDocumentStore};
pub use cache::{KeyValueCache, MemoryCache, SqliteCache, StudyCache};
pub use database::{Database, SharedDatabase};
pub use error::{Result, StoreError};
