pub mod memory;
pub mod mount;
pub mod pattern;

use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;

pub use memory::MemoryAssets;
pub use mount::{DEFAULT_PHASES, MountedPhase, PhaseMount};
pub use pattern::{GlobPattern, has_magic, normalize_logical};

#[derive(Debug, Error)]
pub enum AssetError {
    #[error("install directory {0} does not exist or is not a directory")]
    NotADirectory(PathBuf),
    #[error("no phase_* folders found under {root}")]
    NoPhases { root: PathBuf },
    #[error("invalid asset pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },
    #[error("asset pattern is empty")]
    EmptyPattern,
}

/// Resolves logical asset paths (`phase_4/models/char/...`) and expands
/// glob patterns over them.
pub trait AssetResolver {
    fn exists(&self, path: &str) -> bool;

    /// All logical paths matching `pattern`, sorted.
    fn glob(&self, pattern: &str) -> Result<Vec<String>, AssetError>;
}

impl<T: AssetResolver + ?Sized> AssetResolver for Arc<T> {
    fn exists(&self, path: &str) -> bool {
        (**self).exists(path)
    }

    fn glob(&self, pattern: &str) -> Result<Vec<String>, AssetError> {
        (**self).glob(pattern)
    }
}

impl<T: AssetResolver + ?Sized> AssetResolver for &T {
    fn exists(&self, path: &str) -> bool {
        (**self).exists(path)
    }

    fn glob(&self, pattern: &str) -> Result<Vec<String>, AssetError> {
        (**self).glob(pattern)
    }
}
