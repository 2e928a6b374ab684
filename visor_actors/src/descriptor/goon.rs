use std::sync::Arc;

use super::with_node;
use crate::animation::AnimationSet;
use crate::scene::{NodeId, Rgba, RigSpec, SceneBackend};

pub const MODEL: &str = "phase_9/models/char/ttr_r_chr_ene_cogGoonie.bam";
pub const ANIMATION_PREFIX: &str = "ttr_a_chr_ene_cogGoonie_";
/// Goons carry the shadow on their first child.
pub const SHADOW_NODE: &str = "*";

const EYE_COLOR: Rgba = Rgba::new(1.0, 1.0, 0.0, 1.0);

#[derive(Debug, Clone)]
pub struct GoonSpec {
    pub hat_color: Rgba,
    pub scale: f32,
    /// Security goons wear the helmet instead of the hard hat.
    pub security: bool,
    pub animations: Arc<AnimationSet>,
}

impl GoonSpec {
    pub fn rig(&self) -> RigSpec {
        RigSpec::single(MODEL, (*self.animations).clone())
    }

    pub(super) fn dress<S>(&self, scene: &mut S, root: NodeId)
    where
        S: SceneBackend + ?Sized,
    {
        let hat_color = self.hat_color;
        if self.security {
            with_node(scene, root, "**/hard_hat", |scene, node| scene.hide(node));
            with_node(scene, root, "**/security_hat", |scene, node| {
                scene.set_color(node, hat_color)
            });
        } else {
            for node in scene.find_all(root, "**/security_hat*") {
                scene.hide(node);
            }
            with_node(scene, root, "**/hard_hat", |scene, node| {
                scene.set_color(node, hat_color)
            });
        }
        scene.set_scale(root, self.scale);
        with_node(scene, root, "**/eye", |scene, node| {
            scene.set_color(node, EYE_COLOR)
        });
    }
}
