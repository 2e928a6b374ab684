use std::sync::Arc;

use visor_assets::{AssetError, AssetResolver};

use super::{with_node, Department};
use crate::animation::AnimationSet;
use crate::error::SceneError;
use crate::scene::{ActorId, NodeId, RigPart, RigSpec, SceneBackend};

pub const HEAD_PART: &str = "head";
pub const TORSO_PART: &str = "torso";
pub const LEG_PART: &str = "leg";

/// The head part hangs off this torso joint.
pub const HEAD_JOINT_NODE: &str = "**/joint34";
const HEAD_JOINT: &str = "joint34";
const PELVIS_JOINT: &str = "joint_pelvis";

const LEGS_MODEL: &str = "phase_9/models/char/bossCog-legs-zero.bam";
const TREADS_MODEL: &str = "phase_9/models/char/bossCog-treads.bam";
const AXLE_NODE: &str = "**/joint_axle";

const HEAD_PREFIX: &str = "bossCog-head-";
const TORSO_PREFIX: &str = "bossCog-torso-";
const LEGS_PREFIX: &str = "bossCog-legs-";

fn boss_model(department: Department, piece: &str) -> String {
    let (phase, stem) = match department {
        Department::Sell => (9, "sellbotBoss"),
        Department::Cash => (10, "cashbotBoss"),
        Department::Law => (11, "lawbotBoss"),
        Department::Boss => (12, "bossbotBoss"),
    };
    format!("phase_{phase}/models/char/{stem}-{piece}-zero.bam")
}

/// Animation sets of the three boss parts. All four bosses share them.
#[derive(Debug, Clone, Default)]
pub struct BossAnimations {
    pub head: AnimationSet,
    pub torso: AnimationSet,
    pub leg: AnimationSet,
}

impl BossAnimations {
    pub fn discover<R>(assets: &R) -> Result<Self, AssetError>
    where
        R: AssetResolver + ?Sized,
    {
        Ok(BossAnimations {
            head: AnimationSet::discover(assets, HEAD_PREFIX)?,
            torso: AnimationSet::discover(assets, TORSO_PREFIX)?,
            leg: AnimationSet::discover(assets, LEGS_PREFIX)?,
        })
    }
}

#[derive(Debug, Clone)]
pub struct BossSpec {
    pub department: Department,
    pub scale: f32,
    pub animations: Arc<BossAnimations>,
}

impl BossSpec {
    pub fn rig(&self) -> RigSpec {
        RigSpec {
            parts: vec![
                RigPart {
                    name: HEAD_PART.to_string(),
                    model: boss_model(self.department, "head"),
                    animations: self.animations.head.clone(),
                },
                RigPart {
                    name: TORSO_PART.to_string(),
                    model: boss_model(self.department, "torso"),
                    animations: self.animations.torso.clone(),
                },
                RigPart {
                    name: LEG_PART.to_string(),
                    model: LEGS_MODEL.to_string(),
                    animations: self.animations.leg.clone(),
                },
            ],
        }
    }

    pub(super) fn dress<S>(
        &self,
        scene: &mut S,
        actor: ActorId,
        root: NodeId,
    ) -> Result<(), SceneError>
    where
        S: SceneBackend + ?Sized,
    {
        scene.attach_part(actor, HEAD_PART, TORSO_PART, HEAD_JOINT)?;
        scene.attach_part(actor, TORSO_PART, LEG_PART, PELVIS_JOINT)?;

        let treads = scene.load_model(TREADS_MODEL)?;
        let mut mounted = false;
        with_node(scene, root, AXLE_NODE, |scene, axle| {
            scene.reparent(treads, Some(axle));
            mounted = true;
        });
        if !mounted {
            scene.remove_node(treads);
        }

        scene.set_scale(root, self.scale);
        Ok(())
    }
}
