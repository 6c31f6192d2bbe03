//! Storage root selection.
//!
//! The root is chosen once at startup from explicit configuration first and
//! deployment-platform environment signals second. It never changes for the
//! lifetime of the process.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Environment variables set by platforms whose filesystem is read-only.
const READ_ONLY_PLATFORM_VARS: &[(&str, &str)] = &[
    ("VERCEL", "vercel"),
    ("AWS_LAMBDA_FUNCTION_NAME", "aws-lambda"),
    ("NETLIFY", "netlify"),
];

/// Environment variables set by platforms with a writable but ephemeral disk.
const EPHEMERAL_PLATFORM_VARS: &[(&str, &str)] = &[
    ("RENDER", "render"),
    ("DYNO", "heroku"),
    ("RAILWAY_ENVIRONMENT", "railway"),
];

/// Directory name used under the temp dir or the working directory.
const EPHEMERAL_DIR_NAME: &str = "lendstack-data";
const PERSISTENT_DIR_NAME: &str = "data";

/// Explicitly requested storage mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageMode {
    Persistent,
    Ephemeral,
    Memory,
}

impl FromStr for StorageMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "persistent" | "disk" => Ok(StorageMode::Persistent),
            "ephemeral" | "tmp" | "temp" => Ok(StorageMode::Ephemeral),
            "memory" | "memory-only" => Ok(StorageMode::Memory),
            other => Err(format!("unknown storage mode: {other}")),
        }
    }
}

/// Storage configuration supplied by the host process.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Forces a mode instead of detecting one.
    pub mode: Option<StorageMode>,
    /// Overrides the root directory for disk-backed modes.
    pub data_dir: Option<PathBuf>,
}

/// Deployment signals read from the environment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlatformSignals {
    /// Name of the detected read-only platform, if any.
    pub read_only_platform: Option<String>,
    /// Name of the detected ephemeral-disk platform, if any.
    pub ephemeral_platform: Option<String>,
}

impl PlatformSignals {
    /// Reads signals from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Reads signals through an arbitrary variable lookup.
    ///
    /// A variable counts as set when it is present and non-empty.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let detect = |table: &[(&str, &str)]| {
            table
                .iter()
                .find(|&&(var, _)| lookup(var).is_some_and(|v| !v.is_empty()))
                .map(|&(_, platform)| platform.to_string())
        };

        Self {
            read_only_platform: detect(READ_ONLY_PLATFORM_VARS),
            ephemeral_platform: detect(EPHEMERAL_PLATFORM_VARS),
        }
    }
}

/// Where the key-value store keeps its files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "root", rename_all = "kebab-case")]
pub enum StorageLocation {
    /// Durable directory under the working directory (or an override).
    Persistent(PathBuf),
    /// Writable directory that does not survive a redeploy.
    Ephemeral(PathBuf),
    /// No disk at all; the cache is the only tier.
    MemoryOnly,
}

impl StorageLocation {
    /// Detects the location for this process.
    pub fn detect(config: &StorageConfig) -> Self {
        let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        Self::resolve(
            config,
            &PlatformSignals::from_env(),
            &cwd,
            &std::env::temp_dir(),
        )
    }

    /// Pure resolution from explicit inputs.
    ///
    /// Precedence: explicit mode, then read-only platform, then ephemeral
    /// platform, then a persistent directory.
    pub fn resolve(
        config: &StorageConfig,
        signals: &PlatformSignals,
        cwd: &Path,
        temp_dir: &Path,
    ) -> Self {
        let ephemeral_root = || {
            config
                .data_dir
                .clone()
                .unwrap_or_else(|| temp_dir.join(EPHEMERAL_DIR_NAME))
        };
        let persistent_root = || {
            config
                .data_dir
                .clone()
                .unwrap_or_else(|| cwd.join(PERSISTENT_DIR_NAME))
        };

        match config.mode {
            Some(StorageMode::Memory) => return StorageLocation::MemoryOnly,
            Some(StorageMode::Ephemeral) => return StorageLocation::Ephemeral(ephemeral_root()),
            Some(StorageMode::Persistent) => {
                return StorageLocation::Persistent(persistent_root());
            }
            None => {}
        }

        if signals.read_only_platform.is_some() {
            StorageLocation::MemoryOnly
        } else if signals.ephemeral_platform.is_some() {
            StorageLocation::Ephemeral(ephemeral_root())
        } else {
            StorageLocation::Persistent(persistent_root())
        }
    }

    /// Root directory, or `None` when memory-only.
    pub fn root(&self) -> Option<&Path> {
        match self {
            StorageLocation::Persistent(root) | StorageLocation::Ephemeral(root) => Some(root),
            StorageLocation::MemoryOnly => None,
        }
    }

    /// Short label for status output.
    pub fn label(&self) -> &'static str {
        match self {
            StorageLocation::Persistent(_) => "persistent",
            StorageLocation::Ephemeral(_) => "ephemeral",
            StorageLocation::MemoryOnly => "memory-only",
        }
    }
}

impl fmt::Display for StorageLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.root() {
            Some(root) => write!(f, "{} ({})", self.label(), root.display()),
            None => f.write_str(self.label()),
        }
    }
}
