//! # Notestore Testkit
//!
//! Testing utilities for notestore.
//!
//! ## Overview
//!
//! This crate provides:
//!
//! - **Fixtures**: note stores over a shared memory provider or a temporary
//!   SQLite directory
//! - **Gate**: a provider wrapper that holds writes so tests can observe a
//!   `create` in flight
//! - **Generators**: Proptest strategies for titles
//!
//! ## Test Fixtures
//!
//! ```rust
//! use notestore_testkit::TestFixture;
//!
//! # tokio_test_block(async {
//! let fixture = TestFixture::new();
//! let store = fixture.ready_store().await;
//! store.create("Buy milk").await.unwrap();
//! # });
//! # fn tokio_test_block(f: impl std::future::Future<Output = ()>) {
//! #     tokio::runtime::Runtime::new().unwrap().block_on(f)
//! # }
//! ```
//!
//! ## Property Testing
//!
//! ```rust,ignore
//! use proptest::prelude::*;
//! use notestore_testkit::generators::title;
//!
//! proptest! {
//!     #[test]
//!     fn titles_validate(t in title()) {
//!         prop_assert!(notestore_core::validate_title(&t).is_ok());
//!     }
//! }
//! ```

pub mod fixtures;
pub mod gate;
pub mod generators;

pub use fixtures::{SqliteFixture, TestFixture};
pub use gate::{Gate, GatedProvider};
pub use generators::{blank_title, distinct_titles, title};
