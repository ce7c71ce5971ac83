//! # aparte-store
//!
//! File-backed persistence for the Aparté core: per-peer chat history with
//! expiry semantics, the contact list, scalar settings, and the identity
//! key file. One JSON document per logical collection, each file fully
//! rewritten on every mutating operation — no append log, no partial
//! writes exposed to readers.
//!
//! Read failures degrade to empty/default results so a corrupt file never
//! hangs the application; write failures surface as [`StoreError::Write`]
//! so the caller can warn that data may not be durable.

pub mod contacts;
pub mod keys;
pub mod messages;
pub mod models;
pub mod settings;
pub mod store;

mod error;

pub use error::{Result, StoreError};
pub use models::*;
pub use store::Store;
