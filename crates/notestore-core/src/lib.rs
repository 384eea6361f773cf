//! # Notestore Core
//!
//! Pure primitives for notestore: the [`Note`] record, title validation, and
//! the fixed schema constants shared by every layer.
//!
//! This crate contains no I/O and no storage. The persistence driver lives in
//! `notestore-store`, the adapter in `notestore`.
//!
//! ## Key Types
//!
//! - [`Note`] - A single note, keyed by its title
//! - [`ValidationError`] - Rejections raised before any store access
//!
//! ## Schema
//!
//! - [`DATABASE_NAME`] - Name of the database and of its only object store
//! - [`SCHEMA_VERSION`] - Version the database is opened at
//! - [`KEY_PATH`] - Record field used as the store key

pub mod error;
pub mod note;
pub mod validation;

pub use error::ValidationError;
pub use note::Note;
pub use validation::validate_title;

/// Name of the database. The single object store shares this name.
pub const DATABASE_NAME: &str = "nuxtTodo";

/// Schema version the database is opened at.
pub const SCHEMA_VERSION: u32 = 4;

/// Field of a note record that acts as the store key.
pub const KEY_PATH: &str = "title";
