use std::sync::Arc;

use crate::animation::AnimationSet;
use crate::scene::RigSpec;

/// A plain model plus the animations sharing a file prefix.
#[derive(Debug, Clone)]
pub struct GenericSpec {
    pub model: String,
    pub animations: Arc<AnimationSet>,
    pub scale: f32,
}

impl GenericSpec {
    pub fn rig(&self) -> RigSpec {
        RigSpec::single(&self.model, (*self.animations).clone())
    }
}
