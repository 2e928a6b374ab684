use std::path::{Path, PathBuf};

use serde::Serialize;
use walkdir::WalkDir;

use crate::pattern::{GlobPattern, normalize_logical};
use crate::{AssetError, AssetResolver};

/// Phase folders the game ships, in mount order.
pub const DEFAULT_PHASES: &[&str] = &[
    "3.5", "3", "4", "5", "5.5", "6", "7", "8", "9", "10", "11", "12", "13", "14",
];

#[derive(Debug, Clone, Serialize)]
pub struct MountedPhase {
    pub phase: String,
    pub dir_name: String,
    pub path: PathBuf,
}

/// Extracted `phase_<n>/` folders under an install directory, exposed as a
/// single logical tree (`phase_3.5/models/char/...`).
#[derive(Debug, Clone, Serialize)]
pub struct PhaseMount {
    root: PathBuf,
    mounted: Vec<MountedPhase>,
    missing: Vec<String>,
}

impl PhaseMount {
    pub fn open<P: AsRef<Path>>(root: P) -> Result<Self, AssetError> {
        Self::with_phases(root, DEFAULT_PHASES.iter().copied())
    }

    pub fn with_phases<P, I, S>(root: P, phases: I) -> Result<Self, AssetError>
    where
        P: AsRef<Path>,
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let root = root.as_ref().to_path_buf();
        if !root.is_dir() {
            return Err(AssetError::NotADirectory(root));
        }

        let mut mounted = Vec::new();
        let mut missing = Vec::new();
        for phase in phases {
            let phase = phase.as_ref();
            let dir_name = format!("phase_{phase}");
            let path = root.join(&dir_name);
            if path.is_dir() {
                mounted.push(MountedPhase {
                    phase: phase.to_string(),
                    dir_name,
                    path,
                });
            } else {
                missing.push(phase.to_string());
            }
        }

        if mounted.is_empty() {
            return Err(AssetError::NoPhases { root });
        }

        Ok(PhaseMount {
            root,
            mounted,
            missing,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn mounted(&self) -> &[MountedPhase] {
        &self.mounted
    }

    pub fn missing(&self) -> &[String] {
        &self.missing
    }

    fn is_mounted_dir(&self, name: &str) -> bool {
        self.mounted.iter().any(|phase| phase.dir_name == name)
    }

    /// Maps a logical path onto the filesystem when its phase is mounted.
    pub fn locate(&self, logical: &str) -> Option<PathBuf> {
        let normalized = normalize_logical(logical);
        let mut parts = normalized.split('/').filter(|part| !part.is_empty());
        let phase_dir = parts.next()?;
        if !self.is_mounted_dir(phase_dir) {
            return None;
        }
        let mut path = self.root.join(phase_dir);
        for part in parts {
            if part == ".." {
                return None;
            }
            path.push(part);
        }
        path.is_file().then_some(path)
    }
}

impl AssetResolver for PhaseMount {
    fn exists(&self, path: &str) -> bool {
        self.locate(path).is_some()
    }

    fn glob(&self, pattern: &str) -> Result<Vec<String>, AssetError> {
        let pattern = GlobPattern::new(pattern)?;
        let depth = pattern.depth();

        let walker = WalkDir::new(&self.root)
            .min_depth(1)
            .max_depth(depth)
            .follow_links(true)
            .into_iter()
            .filter_entry(|entry| {
                let Some(level) = entry.depth().checked_sub(1) else {
                    return true;
                };
                let Some(name) = entry.file_name().to_str() else {
                    return false;
                };
                if level == 0 && !self.is_mounted_dir(name) {
                    return false;
                }
                pattern.matches_component(level, name)
            });

        let mut matches = Vec::new();
        for entry in walker.filter_map(|res| res.ok()) {
            if entry.depth() != depth || !entry.file_type().is_file() {
                continue;
            }
            let Ok(relative) = entry.path().strip_prefix(&self.root) else {
                continue;
            };
            let logical: Vec<String> = relative
                .components()
                .map(|component| component.as_os_str().to_string_lossy().into_owned())
                .collect();
            matches.push(logical.join("/"));
        }
        matches.sort();
        Ok(matches)
    }
}
