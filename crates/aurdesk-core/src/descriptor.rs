use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DESCRIPTOR_FILE_NAME: &str = "operation.json";
pub const DESCRIPTOR_SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationKind {
    Install,
    Remove,
}

impl OperationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Install => "install",
            Self::Remove => "remove",
        }
    }
}

/// The one persisted artifact of a handoff: written by the unprivileged
/// session immediately before invoking the helper, consumed and deleted by
/// the helper on every exit path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationDescriptor {
    pub version: u32,
    pub operation: OperationKind,
    pub root: PathBuf,
    #[serde(rename = "db-path")]
    pub db_path: PathBuf,
    #[serde(rename = "install-prefix", default, skip_serializing_if = "Option::is_none")]
    pub install_prefix: Option<PathBuf>,
    pub pkgs: Vec<String>,
}

#[derive(Debug, Error)]
pub enum DescriptorError {
    #[error("no operation descriptor at {path}")]
    Missing { path: PathBuf },

    #[error("failed to access operation descriptor {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("operation descriptor {path} is malformed: {reason}")]
    Malformed { path: PathBuf, reason: String },

    #[error("operation descriptor {path} has unsupported schema version {found}")]
    UnsupportedVersion { path: PathBuf, found: u32 },

    #[error("an operation descriptor is already claimed at {path}")]
    AlreadyClaimed { path: PathBuf },
}

pub fn descriptor_path(prefix: &Path) -> PathBuf {
    prefix.join(DESCRIPTOR_FILE_NAME)
}

impl OperationDescriptor {
    pub fn new(
        operation: OperationKind,
        root: impl Into<PathBuf>,
        db_path: impl Into<PathBuf>,
        install_prefix: Option<PathBuf>,
        pkgs: Vec<String>,
    ) -> Self {
        Self {
            version: DESCRIPTOR_SCHEMA_VERSION,
            operation,
            root: root.into(),
            db_path: db_path.into(),
            install_prefix,
            pkgs,
        }
    }

    fn validate(&self, path: &Path) -> Result<(), DescriptorError> {
        if self.version != DESCRIPTOR_SCHEMA_VERSION {
            return Err(DescriptorError::UnsupportedVersion {
                path: path.to_path_buf(),
                found: self.version,
            });
        }
        if self.pkgs.is_empty() {
            return Err(DescriptorError::Malformed {
                path: path.to_path_buf(),
                reason: "package list is empty".to_string(),
            });
        }
        if self.pkgs.iter().any(|name| name.trim().is_empty()) {
            return Err(DescriptorError::Malformed {
                path: path.to_path_buf(),
                reason: "package names must not be empty".to_string(),
            });
        }
        if self.operation == OperationKind::Install && self.install_prefix.is_none() {
            return Err(DescriptorError::Malformed {
                path: path.to_path_buf(),
                reason: "install descriptor is missing install-prefix".to_string(),
            });
        }
        Ok(())
    }
}

/// Claims the descriptor slot via exclusive create. A file already present
/// is reported as `AlreadyClaimed`; deciding whether it is a stale leftover
/// is the caller's call.
pub fn write_descriptor(
    prefix: &Path,
    descriptor: &OperationDescriptor,
) -> Result<PathBuf, DescriptorError> {
    let path = descriptor_path(prefix);
    descriptor.validate(&path)?;

    let payload =
        serde_json::to_vec_pretty(descriptor).map_err(|err| DescriptorError::Malformed {
            path: path.clone(),
            reason: err.to_string(),
        })?;

    let mut file = match fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&path)
    {
        Ok(file) => file,
        Err(err) if err.kind() == io::ErrorKind::AlreadyExists => {
            return Err(DescriptorError::AlreadyClaimed { path });
        }
        Err(err) => return Err(DescriptorError::Io { path, source: err }),
    };

    file.write_all(&payload)
        .and_then(|()| file.flush())
        .map_err(|err| DescriptorError::Io {
            path: path.clone(),
            source: err,
        })?;
    Ok(path)
}

pub fn read_descriptor(prefix: &Path) -> Result<OperationDescriptor, DescriptorError> {
    let path = descriptor_path(prefix);
    let raw = match fs::read_to_string(&path) {
        Ok(raw) => raw,
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            return Err(DescriptorError::Missing { path });
        }
        Err(err) => return Err(DescriptorError::Io { path, source: err }),
    };

    let descriptor: OperationDescriptor =
        serde_json::from_str(&raw).map_err(|err| DescriptorError::Malformed {
            path: path.clone(),
            reason: err.to_string(),
        })?;
    descriptor.validate(&path)?;
    Ok(descriptor)
}

/// Deletes the descriptor if present. Returns whether a file was removed.
pub fn remove_descriptor(prefix: &Path) -> Result<bool, DescriptorError> {
    let path = descriptor_path(prefix);
    match fs::remove_file(&path) {
        Ok(()) => Ok(true),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(err) => Err(DescriptorError::Io { path, source: err }),
    }
}
