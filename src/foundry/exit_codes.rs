//! Standard process exit codes
//!
//! The constants mirror the embedded catalog; `test_constants_match_catalog`
//! keeps the two in step.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use serde::{Deserialize, Serialize};

use crate::assets;
use crate::error::{FulmenError, Result};

const CATALOG: &str = "foundry/exit-codes.yaml";

pub type ExitCode = i32;

pub const EXIT_SUCCESS: ExitCode = 0;
pub const EXIT_FAILURE: ExitCode = 1;

pub const EXIT_PORT_IN_USE: ExitCode = 10;
pub const EXIT_PORT_RANGE_EXHAUSTED: ExitCode = 11;
pub const EXIT_INSTANCE_ALREADY_RUNNING: ExitCode = 12;
pub const EXIT_NETWORK_UNREACHABLE: ExitCode = 13;
pub const EXIT_CONNECTION_REFUSED: ExitCode = 14;
pub const EXIT_CONNECTION_TIMEOUT: ExitCode = 15;

pub const EXIT_CONFIG_INVALID: ExitCode = 20;
pub const EXIT_MISSING_DEPENDENCY: ExitCode = 21;
pub const EXIT_SSOT_VERSION_MISMATCH: ExitCode = 22;
pub const EXIT_CONFIG_FILE_NOT_FOUND: ExitCode = 23;
pub const EXIT_ENVIRONMENT_INVALID: ExitCode = 24;

pub const EXIT_HEALTH_CHECK_FAILED: ExitCode = 30;
pub const EXIT_DATABASE_UNAVAILABLE: ExitCode = 31;
pub const EXIT_EXTERNAL_SERVICE_UNAVAILABLE: ExitCode = 32;
pub const EXIT_RESOURCE_EXHAUSTED: ExitCode = 33;
pub const EXIT_OPERATION_TIMEOUT: ExitCode = 34;

pub const EXIT_INVALID_ARGUMENT: ExitCode = 40;
pub const EXIT_MISSING_REQUIRED_ARGUMENT: ExitCode = 41;

pub const EXIT_PERMISSION_DENIED: ExitCode = 50;
pub const EXIT_FILE_NOT_FOUND: ExitCode = 51;
pub const EXIT_DIRECTORY_NOT_FOUND: ExitCode = 52;
pub const EXIT_FILE_WRITE_ERROR: ExitCode = 53;
pub const EXIT_FILE_READ_ERROR: ExitCode = 54;

pub const EXIT_DATA_INVALID: ExitCode = 60;
pub const EXIT_DATA_CORRUPT: ExitCode = 61;
pub const EXIT_PARSE_ERROR: ExitCode = 62;

pub const EXIT_AUTHENTICATION_FAILED: ExitCode = 70;
pub const EXIT_AUTHORIZATION_FAILED: ExitCode = 71;
pub const EXIT_SECURITY_VIOLATION: ExitCode = 72;
pub const EXIT_CERTIFICATE_INVALID: ExitCode = 73;

pub const EXIT_METRICS_UNAVAILABLE: ExitCode = 80;
pub const EXIT_TRACING_FAILED: ExitCode = 81;
pub const EXIT_LOGGING_FAILED: ExitCode = 82;
pub const EXIT_ALERT_SYSTEM_FAILED: ExitCode = 83;
pub const EXIT_STRUCTURED_LOGGING_FAILED: ExitCode = 84;

pub const EXIT_TEST_FAILURE: ExitCode = 91;
pub const EXIT_TEST_ERROR: ExitCode = 92;
pub const EXIT_TEST_INTERRUPTED: ExitCode = 93;
pub const EXIT_TEST_USAGE_ERROR: ExitCode = 94;
pub const EXIT_TEST_NO_TESTS_COLLECTED: ExitCode = 95;
pub const EXIT_COVERAGE_THRESHOLD_NOT_MET: ExitCode = 96;

pub const EXIT_SIGNAL_HUP: ExitCode = 129;
pub const EXIT_SIGNAL_INT: ExitCode = 130;
pub const EXIT_SIGNAL_QUIT: ExitCode = 131;
pub const EXIT_SIGNAL_KILL: ExitCode = 137;
pub const EXIT_SIGNAL_USR1: ExitCode = 138;
pub const EXIT_SIGNAL_USR2: ExitCode = 140;
pub const EXIT_SIGNAL_PIPE: ExitCode = 141;
pub const EXIT_SIGNAL_ALRM: ExitCode = 142;
pub const EXIT_SIGNAL_TERM: ExitCode = 143;

/// Range reserved for `128 + signal number`
pub const SIGNAL_EXIT_RANGE: std::ops::RangeInclusive<ExitCode> = 128..=165;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExitCodeInfo {
    pub code: ExitCode,
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub context: Option<String>,
    #[serde(default)]
    pub retry_hint: Option<String>,
    #[serde(default)]
    pub bsd_equivalent: Option<String>,
    /// Filled from the enclosing category at load
    #[serde(skip_deserializing)]
    pub category: String,
}

#[derive(Debug, Clone, Deserialize)]
struct Category {
    id: String,
    codes: Vec<ExitCodeInfo>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SimplifiedMode {
    Basic,
    Severity,
}

impl fmt::Display for SimplifiedMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SimplifiedMode::Basic => f.write_str("basic"),
            SimplifiedMode::Severity => f.write_str("severity"),
        }
    }
}

impl FromStr for SimplifiedMode {
    type Err = FulmenError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "basic" => Ok(SimplifiedMode::Basic),
            "severity" => Ok(SimplifiedMode::Severity),
            _ => Err(FulmenError::not_found("simplified mode", s)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimplifiedMapping {
    pub simplified_code: ExitCode,
    pub simplified_name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub maps_from: Vec<ExitCode>,
}

#[derive(Debug, Clone, Deserialize)]
struct ModeSpec {
    id: SimplifiedMode,
    mappings: Vec<SimplifiedMapping>,
}

#[derive(Debug, Deserialize)]
struct ExitCodeFile {
    version: String,
    categories: Vec<Category>,
    #[serde(default)]
    simplified_modes: Vec<ModeSpec>,
}

#[derive(Debug)]
pub struct ExitCodeCatalog {
    pub version: String,
    codes: Vec<ExitCodeInfo>,
    by_code: HashMap<ExitCode, usize>,
    by_name: HashMap<String, usize>,
    modes: HashMap<SimplifiedMode, Vec<SimplifiedMapping>>,
}

impl ExitCodeCatalog {
    fn build(file: ExitCodeFile) -> Self {
        let mut codes = Vec::new();
        for category in file.categories {
            for mut info in category.codes {
                info.category = category.id.clone();
                codes.push(info);
            }
        }
        codes.sort_by_key(|c| c.code);

        let mut by_code = HashMap::new();
        let mut by_name = HashMap::new();
        for (i, info) in codes.iter().enumerate() {
            if by_code.insert(info.code, i).is_some() {
                assets::load_failure(CATALOG, &format!("exit code {} listed twice", info.code));
            }
            if by_name.insert(info.name.to_ascii_uppercase(), i).is_some() {
                assets::load_failure(CATALOG, &format!("exit code name {} listed twice", info.name));
            }
        }

        let mut modes = HashMap::new();
        for mode in file.simplified_modes {
            for mapping in &mode.mappings {
                if let Some(unknown) = mapping.maps_from.iter().find(|c| !by_code.contains_key(c)) {
                    assets::load_failure(
                        CATALOG,
                        &format!("mode {} maps uncatalogued code {}", mode.id, unknown),
                    );
                }
            }
            modes.insert(mode.id, mode.mappings);
        }

        Self {
            version: file.version,
            codes,
            by_code,
            by_name,
            modes,
        }
    }

    /// All codes in ascending order
    pub fn codes(&self) -> &[ExitCodeInfo] {
        &self.codes
    }

    pub fn info(&self, code: ExitCode) -> Option<&ExitCodeInfo> {
        self.by_code.get(&code).map(|&i| &self.codes[i])
    }

    pub fn by_name(&self, name: &str) -> Option<&ExitCodeInfo> {
        let name = name.trim().to_ascii_uppercase();
        self.by_name
            .get(&name)
            .or_else(|| self.by_name.get(&format!("EXIT_{}", name)))
            .map(|&i| &self.codes[i])
    }

    pub fn simplify(&self, code: ExitCode, mode: SimplifiedMode) -> Option<&SimplifiedMapping> {
        self.modes
            .get(&mode)?
            .iter()
            .find(|m| m.maps_from.contains(&code))
    }
}

pub fn catalog() -> &'static ExitCodeCatalog {
    static CELL: OnceLock<ExitCodeCatalog> = OnceLock::new();
    CELL.get_or_init(|| {
        let catalog = ExitCodeCatalog::build(assets::load_yaml_catalog(CATALOG));
        tracing::debug!(codes = catalog.codes.len(), modes = catalog.modes.len(), "loaded exit code catalog");
        catalog
    })
}

pub fn exit_code_info(code: ExitCode) -> Option<&'static ExitCodeInfo> {
    catalog().info(code)
}

/// Accepts `EXIT_CONFIG_INVALID`, `exit_config_invalid` or `CONFIG_INVALID`
pub fn exit_code_by_name(name: &str) -> Option<&'static ExitCodeInfo> {
    catalog().by_name(name)
}

/// Collapse a detailed code into the reduced set of a simplified mode
pub fn map_to_simplified(code: ExitCode, mode: SimplifiedMode) -> Option<&'static SimplifiedMapping> {
    catalog().simplify(code, mode)
}

/// Whether `128 + n` exit codes are meaningful on this platform.
///
/// Always on Unix; on Windows only inside a WSL environment.
pub fn supports_signal_exit_codes() -> bool {
    if cfg!(windows) {
        running_under_wsl()
    } else {
        true
    }
}

fn running_under_wsl() -> bool {
    ["WSL_DISTRO_NAME", "WSL_INTEROP"]
        .iter()
        .any(|var| std::env::var_os(var).is_some_and(|v| !v.is_empty()))
}
