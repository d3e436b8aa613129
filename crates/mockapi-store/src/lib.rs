#![deny(unsafe_code)]

//! # mockapi store
//!
//! Fixture persistence and expectation tracking for the mockapi server.
//!
//! ## Overview
//!
//! - [`FixtureStore`] writes declarations under their canonical key and
//!   resolves requests back to them, rendering templates on the way out
//! - [`ExpectationRegistry`] holds in-memory expectations that win over
//!   persisted fixtures and counts how often each is served
//! - [`FixtureBackend`] abstracts where bytes live ([`FsBackend`] for a data
//!   directory, [`MemoryBackend`] for tests)
//! - [`TemplateGateway`] abstracts the template engine
//!
//! ## Quick Start
//!
//! ```no_run
//! use mockapi_protocol::{TemplateModel, TestCase};
//! use mockapi_store::FixtureStore;
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let store = FixtureStore::open_dir("./mockData")?;
//!
//!     let tc = TestCase::new("GET", "api/Sample", json!({"Id": "x"}));
//!     let file_name = store.write(&tc).await?;
//!     println!("Stored {file_name}");
//!
//!     let model = TemplateModel::for_request("GET", "api/Sample", None);
//!     let fixture = store.read("GET", "api/Sample", None, &model).await?;
//!     println!("{:?}", fixture.content);
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

mod error;

pub mod backend;
pub mod content;
pub mod expectation;
pub mod store;
pub mod template;

// Re-exports
pub use backend::{FixtureBackend, FsBackend, MemoryBackend};
pub use content::{FixtureContent, FixtureKind, ResolvedFixture, content_type_for};
pub use error::{Result, StoreError};
pub use expectation::{Expectation, ExpectationRegistry, Verification};
pub use store::FixtureStore;
pub use template::{ModelTemplateRenderer, TemplateError, TemplateGateway};

/// Prelude module for convenient imports
///
/// Commonly used types and traits
pub mod prelude {
    pub use crate::{
        ExpectationRegistry, FixtureBackend, FixtureContent, FixtureStore, Result, StoreError,
        TemplateGateway,
    };
}
