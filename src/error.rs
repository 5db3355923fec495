//! Application error types using thiserror
//!
//! Error hierarchy:
//! - LookupError: what a single dependency lookup can fail with
//!   - ConfigValidation: bad configuration, fatal for the whole run
//!   - ExternalHost: registry/network failures, the caller decides whether to retry
//!   - Internal: anything else; converted to `internal-error` by the engine
//! - RegistryError: Issues with package registry communication
//! - SettingsError: Issues with the settings file and CLI input files

use std::path::PathBuf;
use thiserror::Error;

/// Error returned by a dependency lookup
#[derive(Error, Debug)]
pub enum LookupError {
    /// Configuration that can never produce a valid lookup
    #[error("config validation failed: {message}")]
    ConfigValidation { message: String },

    /// Registry or network failure reported by a collaborator
    #[error(transparent)]
    ExternalHost(#[from] RegistryError),

    /// Unexpected failure inside the resolution pipeline
    #[error("internal error: {message}")]
    Internal { message: String },
}

impl LookupError {
    /// Creates a new ConfigValidation error
    pub fn config_validation(message: impl Into<String>) -> Self {
        LookupError::ConfigValidation {
            message: message.into(),
        }
    }

    /// Creates a new Internal error
    pub fn internal(message: impl Into<String>) -> Self {
        LookupError::Internal {
            message: message.into(),
        }
    }

    /// Returns true if this error must propagate to the caller instead of
    /// being folded into an `internal-error` skip reason
    pub fn is_propagated(&self) -> bool {
        matches!(
            self,
            LookupError::ConfigValidation { .. } | LookupError::ExternalHost(_)
        )
    }
}

/// Errors related to package registry communication
#[derive(Error, Debug)]
pub enum RegistryError {
    /// Package not found in registry
    #[error("package '{package}' not found in {registry} registry")]
    PackageNotFound { package: String, registry: String },

    /// Network request failed
    #[error("failed to fetch package '{package}' from {registry}: {message}")]
    NetworkError {
        package: String,
        registry: String,
        message: String,
    },

    /// Rate limit exceeded
    #[error("rate limit exceeded for {registry} registry")]
    RateLimitExceeded { registry: String },

    /// Invalid response from registry
    #[error("invalid response from {registry} for '{package}': {message}")]
    InvalidResponse {
        package: String,
        registry: String,
        message: String,
    },

    /// Timeout
    #[error("timeout while fetching '{package}' from {registry}")]
    Timeout { package: String, registry: String },
}

impl RegistryError {
    /// Creates a new PackageNotFound error
    pub fn package_not_found(package: impl Into<String>, registry: impl Into<String>) -> Self {
        RegistryError::PackageNotFound {
            package: package.into(),
            registry: registry.into(),
        }
    }

    /// Creates a new NetworkError
    pub fn network_error(
        package: impl Into<String>,
        registry: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        RegistryError::NetworkError {
            package: package.into(),
            registry: registry.into(),
            message: message.into(),
        }
    }

    /// Creates a new RateLimitExceeded error
    pub fn rate_limit_exceeded(registry: impl Into<String>) -> Self {
        RegistryError::RateLimitExceeded {
            registry: registry.into(),
        }
    }

    /// Creates a new Timeout error
    pub fn timeout(package: impl Into<String>, registry: impl Into<String>) -> Self {
        RegistryError::Timeout {
            package: package.into(),
            registry: registry.into(),
        }
    }
}

/// Errors related to the settings file and CLI input files
#[derive(Error, Debug)]
pub enum SettingsError {
    /// Failed to read an input file
    #[error("failed to read {path}: {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// TOML parsing error (settings file)
    #[error("failed to parse TOML in {path}: {message}")]
    TomlParseError { path: PathBuf, message: String },

    /// JSON parsing error (dependency list, release fixtures)
    #[error("failed to parse JSON in {path}: {message}")]
    JsonParseError { path: PathBuf, message: String },

    /// Invalid duration format
    #[error("invalid duration format '{value}': expected format like '12h', '2w', '10d', '1m'")]
    InvalidDuration { value: String },
}

impl SettingsError {
    /// Creates a new ReadError
    pub fn read_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        SettingsError::ReadError {
            path: path.into(),
            source,
        }
    }

    /// Creates a new TomlParseError
    pub fn toml_parse_error(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        SettingsError::TomlParseError {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Creates a new JsonParseError
    pub fn json_parse_error(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        SettingsError::JsonParseError {
            path: path.into(),
            message: message.into(),
        }
    }
}
