//! Foundry reference catalogs
//!
//! Immutable lookup tables loaded from YAML compiled into the library:
//! regex/glob patterns, MIME types, HTTP status groups, ISO country codes,
//! exit codes and signal semantics. Each catalog is parsed once on first use
//! and shared for the life of the process.
//!
//! A catalog that fails to load is a build defect, not a runtime condition,
//! so loading panics with platform details instead of returning an error.

pub mod country;
pub mod exit_codes;
pub mod http_status;
pub mod mime;
pub mod patterns;
pub mod signals;

pub use country::{countries, country, Country, CountryCode};
pub use exit_codes::{exit_code_by_name, exit_code_info, map_to_simplified, supports_signal_exit_codes, ExitCodeInfo, SimplifiedMode};
pub use http_status::{group_for_code, reason_phrase, status_group, StatusGroup};
pub use mime::{detect_mime_type, detect_mime_type_from_file, mime_by_extension, mime_by_type, mime_type, MimeType};
pub use patterns::{pattern, Pattern, PatternKind};
pub use signals::{signal, signal_by_number, Signal, WindowsMapping};
