//! Declarative actor descriptions. A descriptor knows which models, textures
//! and animations make up a character and how to dress a freshly loaded rig;
//! it never keeps the result.

pub mod boss;
pub mod cog;
pub mod generic;
pub mod goon;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::SceneError;
use crate::scene::{ActorId, NodeId, Rgba, RigSpec, SceneBackend};

pub use boss::{BossAnimations, BossSpec};
pub use cog::{CogSpec, SkelecogSpec, SuitType};
pub use generic::GenericSpec;
pub use goon::GoonSpec;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Department {
    Sell,
    Cash,
    Law,
    Boss,
}

impl Department {
    pub const ALL: [Department; 4] = [
        Department::Sell,
        Department::Cash,
        Department::Law,
        Department::Boss,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Department::Sell => "sell",
            Department::Cash => "cash",
            Department::Law => "law",
            Department::Boss => "boss",
        }
    }

    pub fn hand_color(self) -> Rgba {
        match self {
            Department::Sell => Rgba::new(0.95, 0.75, 0.95, 1.0),
            Department::Cash => Rgba::new(0.65, 0.95, 0.85, 1.0),
            Department::Law => Rgba::new(0.75, 0.75, 0.95, 1.0),
            Department::Boss => Rgba::new(0.95, 0.75, 0.75, 1.0),
        }
    }
}

/// Named structural roles a rig may expose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SpecialNode {
    Head,
    Shadow,
}

#[derive(Debug, Clone)]
pub enum ActorKind {
    Cog(CogSpec),
    Skelecog(SkelecogSpec),
    Boss(BossSpec),
    Goon(GoonSpec),
    Generic(GenericSpec),
}

#[derive(Debug, Clone)]
pub struct ActorDescriptor {
    name: String,
    kind: ActorKind,
}

impl ActorDescriptor {
    pub fn new(name: impl Into<String>, kind: ActorKind) -> Self {
        ActorDescriptor {
            name: name.into(),
            kind,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> &ActorKind {
        &self.kind
    }

    pub fn kind_label(&self) -> &'static str {
        match self.kind {
            ActorKind::Cog(_) => "cog",
            ActorKind::Skelecog(_) => "skelecog",
            ActorKind::Boss(_) => "boss",
            ActorKind::Goon(_) => "goon",
            ActorKind::Generic(_) => "generic",
        }
    }

    pub fn is_skeletal(&self) -> bool {
        matches!(self.kind, ActorKind::Skelecog(_))
    }

    /// Node path pattern for `role`, or `None` when this kind has no such
    /// node.
    pub fn special_node(&self, role: SpecialNode) -> Option<&'static str> {
        match (&self.kind, role) {
            (ActorKind::Cog(_) | ActorKind::Skelecog(_), SpecialNode::Head) => Some(cog::HEAD_NODE),
            (ActorKind::Cog(_) | ActorKind::Skelecog(_), SpecialNode::Shadow) => {
                Some(cog::SHADOW_NODE)
            }
            (ActorKind::Boss(_), SpecialNode::Head) => Some(boss::HEAD_JOINT_NODE),
            (ActorKind::Goon(_), SpecialNode::Shadow) => Some(goon::SHADOW_NODE),
            _ => None,
        }
    }

    /// Sorted animation names per part name.
    pub fn animation_names(&self) -> BTreeMap<String, Vec<String>> {
        self.rig()
            .parts
            .into_iter()
            .map(|part| {
                let names = part.animations.names().map(str::to_string).collect();
                (part.name, names)
            })
            .collect()
    }

    pub fn rig(&self) -> RigSpec {
        match &self.kind {
            ActorKind::Cog(spec) => spec.rig(),
            ActorKind::Skelecog(spec) => spec.rig(),
            ActorKind::Boss(spec) => spec.rig(),
            ActorKind::Goon(spec) => spec.rig(),
            ActorKind::Generic(spec) => spec.rig(),
        }
    }

    /// Loads and dresses a new actor. Nothing is left in the scene when any
    /// resource fails to resolve.
    pub fn generate<S>(&self, scene: &mut S) -> Result<ActorId, SceneError>
    where
        S: SceneBackend + ?Sized,
    {
        let actor = scene.load_actor(&self.rig())?;
        if let Err(err) = self.dress(scene, actor) {
            scene.cleanup_actor(actor);
            return Err(err);
        }
        Ok(actor)
    }

    /// X-ray form of a regular cog, sharing its suit animations.
    pub fn skeletal_variant(&self) -> Option<ActorDescriptor> {
        match &self.kind {
            ActorKind::Cog(spec) => Some(ActorDescriptor::new(
                self.name.clone(),
                ActorKind::Skelecog(spec.skeletal()),
            )),
            _ => None,
        }
    }

    fn dress<S>(&self, scene: &mut S, actor: ActorId) -> Result<(), SceneError>
    where
        S: SceneBackend + ?Sized,
    {
        let root = scene
            .actor_root(actor)
            .ok_or(SceneError::UnknownActor(actor.0))?;
        match &self.kind {
            ActorKind::Cog(spec) => spec.dress(scene, root),
            ActorKind::Skelecog(spec) => spec.dress(scene, root),
            ActorKind::Boss(spec) => spec.dress(scene, actor, root),
            ActorKind::Goon(spec) => {
                spec.dress(scene, root);
                Ok(())
            }
            ActorKind::Generic(spec) => {
                scene.set_scale(root, spec.scale);
                Ok(())
            }
        }
    }
}

/// Applies `apply` to the first node matching `pattern`, if any.
pub(crate) fn with_node<S, F>(scene: &mut S, root: NodeId, pattern: &str, apply: F)
where
    S: SceneBackend + ?Sized,
    F: FnOnce(&mut S, NodeId),
{
    match scene.find(root, pattern) {
        Some(node) => apply(scene, node),
        None => log::debug!("no node matches {pattern}"),
    }
}
