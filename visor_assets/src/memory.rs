use std::collections::BTreeSet;

use crate::pattern::{GlobPattern, normalize_logical};
use crate::{AssetError, AssetResolver};

/// Asset tree held entirely in memory. Used for dry runs and tests where no
/// install directory is available.
#[derive(Debug, Clone, Default)]
pub struct MemoryAssets {
    paths: BTreeSet<String>,
}

impl MemoryAssets {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, path: &str) {
        self.paths.insert(normalize_logical(path));
    }

    pub fn with_paths<I, S>(paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut assets = Self::new();
        for path in paths {
            assets.insert(path.as_ref());
        }
        assets
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

impl AssetResolver for MemoryAssets {
    fn exists(&self, path: &str) -> bool {
        self.paths.contains(&normalize_logical(path))
    }

    fn glob(&self, pattern: &str) -> Result<Vec<String>, AssetError> {
        let pattern = GlobPattern::new(pattern)?;
        Ok(self
            .paths
            .iter()
            .filter(|path| pattern.matches(path))
            .cloned()
            .collect())
    }
}
