//! Common test infrastructure
//!
//! Tests should only import from this module, not from internal submodules.
//!
//! # Example
//!
//! ```no_run
//! mod common;
//! use common::{TestBackend, TestNotifier};
//!
//! #[tokio::test]
//! async fn test_empty_backend() {
//!     let backend = TestBackend::spawn().await;
//!     let dir = tempfile::TempDir::new().unwrap();
//!     let notifier = TestNotifier::new(&backend.base_url, &dir);
//!
//!     assert_eq!(notifier.aggregator.poll().await.total, 0);
//! }
//! ```

mod constants;
mod fixtures;
mod notifier;
mod server;

// Public API - this is what tests import
pub use constants::*;
#[allow(unused_imports)]
pub use fixtures::{enveloped, list, message, timestamped};
pub use notifier::TestNotifier;
pub use server::TestBackend;
