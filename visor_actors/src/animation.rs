use std::collections::BTreeMap;

use visor_assets::{AssetError, AssetResolver};

/// Part name the engine gives single-model rigs.
pub const MODEL_ROOT: &str = "modelRoot";

/// Character models and animations live under `phase_*/models/char/`.
pub const CHAR_DIR_PATTERN: &str = "phase_*/models/char/";
const ANIMATION_SUFFIX: &str = ".bam";

/// Animation name → logical resource path for one rig part, ordered by name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnimationSet {
    clips: BTreeMap<String, String>,
}

impl AnimationSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Expands `phase_*/models/char/<prefix>*.bam` and names each match by
    /// stripping the prefix and extension, so `tt_a_ene_cga_walk.bam` under
    /// prefix `tt_a_ene_cga_` becomes `walk`.
    pub fn discover<R>(assets: &R, prefix: &str) -> Result<Self, AssetError>
    where
        R: AssetResolver + ?Sized,
    {
        let pattern = format!("{CHAR_DIR_PATTERN}{prefix}*{ANIMATION_SUFFIX}");
        let mut set = AnimationSet::new();
        for path in assets.glob(&pattern)? {
            let file_name = path.rsplit('/').next().unwrap_or(path.as_str());
            let Some(name) = file_name
                .strip_prefix(prefix)
                .and_then(|rest| rest.strip_suffix(ANIMATION_SUFFIX))
            else {
                continue;
            };
            if name.is_empty() {
                continue;
            }
            // first phase wins when two phases ship the same clip
            set.clips
                .entry(name.to_string())
                .or_insert_with(|| path.clone());
        }
        Ok(set)
    }

    pub fn insert(&mut self, name: impl Into<String>, path: impl Into<String>) {
        self.clips.insert(name.into(), path.into());
    }

    pub fn contains(&self, name: &str) -> bool {
        self.clips.contains_key(name)
    }

    pub fn path(&self, name: &str) -> Option<&str> {
        self.clips.get(name).map(String::as_str)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.clips.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.clips.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.clips.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clips.is_empty()
    }
}

impl<N: Into<String>, P: Into<String>> FromIterator<(N, P)> for AnimationSet {
    fn from_iter<T: IntoIterator<Item = (N, P)>>(iter: T) -> Self {
        let mut set = AnimationSet::new();
        for (name, path) in iter {
            set.insert(name, path);
        }
        set
    }
}
