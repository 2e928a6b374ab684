use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::{with_node, Department};
use crate::animation::AnimationSet;
use crate::error::SceneError;
use crate::scene::{NodeId, Rgba, RigSpec, SceneBackend, Transform};

pub const HEAD_NODE: &str = "**/def_head";
pub const SHADOW_NODE: &str = "**/def_shadow";

const COG_ICONS: &str = "phase_3/models/gui/ttr_m_gui_gen_cogIcons.bam";
const MEDALLION_ATTACH_NODE: &str = "**/def_joint_attachMeter";
const MEDALLION_TRANSFORM: Transform = Transform {
    pos: [0.02, 0.05, 0.04],
    hpr: [180.0, 0.0, 0.0],
    scale: [0.51, 0.51, 0.51],
};
const SUIT_MAPS: &str = "phase_3.5/maps/";
const SUPERVISOR_MAPS: &str = "phase_3.5/maps/ttr_t_ene_";

/// Cogs face away from the default camera unless turned around.
const FACING: f32 = 180.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SuitType {
    A,
    B,
    C,
}

impl SuitType {
    pub fn letter(self) -> char {
        match self {
            SuitType::A => 'a',
            SuitType::B => 'b',
            SuitType::C => 'c',
        }
    }

    pub fn model(self) -> String {
        format!(
            "phase_3.5/models/char/tt_a_ene_cg{}_zero.bam",
            self.letter()
        )
    }

    pub fn skelecog_model(self) -> String {
        format!("phase_5/models/char/tt_a_ene_sc{}_zero.bam", self.letter())
    }

    /// File prefix shared by every suit animation of this type.
    pub fn animation_prefix(self) -> String {
        format!("tt_a_ene_cg{}_", self.letter())
    }

    pub fn default_head_model(self) -> &'static str {
        match self {
            SuitType::A => "phase_4/models/char/suitA-heads.bam",
            SuitType::B => "phase_4/models/char/suitB-heads.bam",
            SuitType::C => "phase_3.5/models/char/suitC-heads.bam",
        }
    }

    /// Model height at scale 1, used to turn a target height into a scale.
    pub fn base_height(self) -> f32 {
        match self {
            SuitType::A => 6.06,
            SuitType::B => 5.29,
            SuitType::C => 4.14,
        }
    }
}

fn department_letter(department: Department) -> &'static str {
    match department {
        Department::Sell => "s",
        Department::Cash => "m",
        Department::Law => "l",
        Department::Boss => "c",
    }
}

fn supervisor_name(department: Department) -> &'static str {
    match department {
        Department::Sell => "sellbotForeman",
        Department::Cash => "cashbotAuditor",
        Department::Law => "lawbotClerk",
        Department::Boss => "bossbotClubPresident",
    }
}

fn medallion_node(department: Department) -> &'static str {
    match department {
        Department::Sell => "**/SalesIcon",
        Department::Cash => "**/MoneyIcon",
        Department::Law => "**/LegalIcon",
        Department::Boss => "**/CorpIcon",
    }
}

fn medallion_color(department: Department) -> Rgba {
    match department {
        Department::Boss => Rgba::new(0.863, 0.776, 0.769, 1.0),
        Department::Sell => Rgba::new(0.843, 0.745, 0.745, 1.0),
        Department::Law => Rgba::new(0.749, 0.776, 0.824, 1.0),
        Department::Cash => Rgba::new(0.749, 0.769, 0.749, 1.0),
    }
}

fn tie_texture(department: Department) -> &'static str {
    match department {
        Department::Sell => "phase_5/maps/cog_robot_tie_sales.jpg",
        Department::Cash => "phase_5/maps/cog_robot_tie_money.jpg",
        Department::Law => "phase_5/maps/cog_robot_tie_legal.jpg",
        Department::Boss => "phase_5/maps/cog_robot_tie_boss.jpg",
    }
}

#[derive(Debug, Clone)]
pub struct CogSpec {
    pub department: Department,
    pub suit: SuitType,
    pub scale: f32,
    pub hand_color: Rgba,
    pub head_model: String,
    /// Patterns copied out of the head model onto the suit's head joint.
    pub head_nodes: Vec<String>,
    pub head_color: Option<Rgba>,
    pub head_texture: Option<String>,
    pub supervisor: bool,
    pub animations: Arc<AnimationSet>,
}

impl CogSpec {
    /// Suit textures as `(node pattern, texture path)`.
    pub fn suit_textures(&self) -> [(&'static str, String); 3] {
        let (prefix, abbr) = if self.supervisor {
            (SUPERVISOR_MAPS, supervisor_name(self.department))
        } else {
            (SUIT_MAPS, department_letter(self.department))
        };
        [
            ("**/torso", format!("{prefix}{abbr}_blazer.jpg")),
            ("**/legs", format!("{prefix}{abbr}_leg.jpg")),
            ("**/arms", format!("{prefix}{abbr}_sleeve.jpg")),
        ]
    }

    pub fn rig(&self) -> RigSpec {
        RigSpec::single(&self.suit.model(), (*self.animations).clone())
    }

    pub fn skeletal(&self) -> SkelecogSpec {
        SkelecogSpec {
            department: self.department,
            suit: self.suit,
            scale: self.scale,
            animations: Arc::clone(&self.animations),
        }
    }

    pub(super) fn dress<S>(&self, scene: &mut S, root: NodeId) -> Result<(), SceneError>
    where
        S: SceneBackend + ?Sized,
    {
        for (pattern, path) in self.suit_textures() {
            let texture = scene.load_texture(&path)?;
            with_node(scene, root, pattern, |scene, node| {
                scene.set_texture(node, texture)
            });
        }

        let head_texture = match &self.head_texture {
            Some(path) => Some(scene.load_texture(path)?),
            None => None,
        };
        let head_model = scene.load_model(&self.head_model)?;
        if let Some(head_null) = scene.find(root, HEAD_NODE) {
            for pattern in &self.head_nodes {
                if let Some(source) = scene.find(head_model, pattern) {
                    scene.copy_to(source, head_null);
                }
            }
            if let Some(color) = self.head_color {
                scene.set_color(head_null, color);
            }
            if let Some(texture) = head_texture {
                scene.set_texture(head_null, texture);
            }
        }
        scene.remove_node(head_model);

        attach_medallion(scene, root, self.department)?;

        let hand_color = self.hand_color;
        with_node(scene, root, "**/hands", |scene, node| {
            scene.set_color(node, hand_color)
        });
        scene.set_scale(root, self.scale);
        scene.set_heading(root, FACING);
        Ok(())
    }
}

/// Robot-only form of a cog: no suit textures or head, a department tie.
#[derive(Debug, Clone)]
pub struct SkelecogSpec {
    pub department: Department,
    pub suit: SuitType,
    pub scale: f32,
    pub animations: Arc<AnimationSet>,
}

impl SkelecogSpec {
    pub fn rig(&self) -> RigSpec {
        RigSpec::single(&self.suit.skelecog_model(), (*self.animations).clone())
    }

    pub(super) fn dress<S>(&self, scene: &mut S, root: NodeId) -> Result<(), SceneError>
    where
        S: SceneBackend + ?Sized,
    {
        attach_medallion(scene, root, self.department)?;

        let tie = scene.load_texture(tie_texture(self.department))?;
        with_node(scene, root, "**/tie", |scene, node| {
            scene.set_texture(node, tie)
        });

        scene.set_scale(root, self.scale);
        scene.set_heading(root, FACING);
        Ok(())
    }
}

fn attach_medallion<S>(
    scene: &mut S,
    root: NodeId,
    department: Department,
) -> Result<(), SceneError>
where
    S: SceneBackend + ?Sized,
{
    let icons = scene.load_model(COG_ICONS)?;
    let chest = scene.find(root, MEDALLION_ATTACH_NODE);
    let icon = scene.find(icons, medallion_node(department));
    if let (Some(chest), Some(icon)) = (chest, icon) {
        if let Some(medallion) = scene.copy_to(icon, chest) {
            scene.set_transform(medallion, MEDALLION_TRANSFORM);
            scene.set_color(medallion, medallion_color(department));
        }
    }
    scene.remove_node(icons);
    Ok(())
}
