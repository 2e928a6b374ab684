use thiserror::Error;
use visor_assets::AssetError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    Model,
    Texture,
    Animation,
}

impl std::fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            ResourceKind::Model => "model",
            ResourceKind::Texture => "texture",
            ResourceKind::Animation => "animation",
        };
        f.write_str(label)
    }
}

/// Errors reported by a scene backend.
#[derive(Debug, Error)]
pub enum SceneError {
    #[error("{kind} '{path}' could not be resolved")]
    MissingResource { kind: ResourceKind, path: String },
    #[error("actor rig declares no parts")]
    EmptyRig,
    #[error("actor #{0} is not loaded")]
    UnknownActor(u32),
    #[error("actor part '{0}' does not exist")]
    UnknownPart(String),
}

#[derive(Debug, Error)]
pub enum ActorError {
    /// A model, texture or animation the descriptor needs is missing. The
    /// rebuild is aborted and the previous actor stays in place.
    #[error("building '{descriptor}' failed: {source}")]
    ResourceResolution {
        descriptor: String,
        #[source]
        source: SceneError,
    },
    #[error("loading the shared shadow model failed: {0}")]
    Shadow(#[source] SceneError),
    #[error("roster JSON is malformed: {0}")]
    RosterFormat(#[from] serde_json::Error),
    #[error("roster entry '{name}' is invalid: {reason}")]
    RosterEntry { name: String, reason: String },
    #[error("discovering animations failed: {0}")]
    Assets(#[from] AssetError),
}
