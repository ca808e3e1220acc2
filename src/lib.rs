//! rsfulmen
//!
//! Base-layer helpers shared by the Fulmen libraries: offline reference
//! catalogs, string similarity, JSON Schema validation, correlation IDs and
//! process exit/signal metadata.
//!
//! ## Features
//!
//! - **Similarity**: Levenshtein, OSA, unrestricted Damerau, Jaro–Winkler and
//!   substring scoring over Unicode scalar values, plus "did you mean" ranking
//! - **Schema Catalog**: `<category>/<version>/<name>` index over JSON and YAML
//!   schemas, cached validators, merge/diff and provenance-tagged export
//! - **Offline Resolution**: metaschemas ship with the crate; `$ref`s never hit
//!   the network
//! - **Foundry Catalogs**: patterns, MIME types, HTTP statuses, countries,
//!   exit codes and signals
//! - **Correlation IDs**: UUIDv7 generation plus HTTP middleware
//!
//! ## Architecture
//!
//! ```text
//! assets/
//! ├── foundry/            # embedded reference catalogs (YAML)
//! └── similarity/         # cross-language fixture corpus
//! schemas/
//! ├── VERSION
//! ├── meta/               # draft-2020-12 and draft-07 metaschemas
//! └── <category>/<version>/<name>.schema.{json,yaml}
//! ```

mod assets;

pub mod checksum;
pub mod config;
pub mod correlation;
pub mod error;
pub mod foundry;
pub mod schema;
pub mod similarity;
pub mod telemetry;
pub mod timestamp;
pub mod version;

pub use checksum::Checksum;
pub use config::FulmenConfig;
pub use correlation::{CorrelationId, CorrelationMiddleware, CorrelationTransport, CORRELATION_HEADER};
pub use error::{FulmenError, Result};
pub use schema::{default_catalog, Diagnostic, SchemaCatalog, SchemaDescriptor, Severity, Validator};
pub use similarity::{distance, score, substring_match, suggest, Algorithm, SimilarityError, SuggestOptions, Suggestion};
pub use timestamp::NanoTimestamp;
pub use version::CatalogVersion;

/// Version of this library, recorded in export provenance
pub const LIBRARY_VERSION: &str = env!("CARGO_PKG_VERSION");
