//! The rendering engine seen from the actor layer. Everything the viewer
//! needs from a scene graph with skinned actors goes through
//! [`SceneBackend`]; handles are plain ids so descriptors and the manager never
//! hold engine objects directly.

use serde::{Deserialize, Serialize};

use crate::animation::AnimationSet;
use crate::error::SceneError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ActorId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TextureId(pub u32);

/// Linear RGBA color, serialized as `[r, g, b, a]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rgba(pub [f32; 4]);

impl Rgba {
    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Rgba([r, g, b, a])
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub pos: [f32; 3],
    pub hpr: [f32; 3],
    pub scale: [f32; 3],
}

/// One independently animated piece of an actor.
#[derive(Debug, Clone)]
pub struct RigPart {
    pub name: String,
    pub model: String,
    pub animations: AnimationSet,
}

#[derive(Debug, Clone, Default)]
pub struct RigSpec {
    pub parts: Vec<RigPart>,
}

impl RigSpec {
    pub fn single(model: &str, animations: AnimationSet) -> Self {
        RigSpec {
            parts: vec![RigPart {
                name: crate::animation::MODEL_ROOT.to_string(),
                model: model.to_string(),
                animations,
            }],
        }
    }
}

pub trait SceneBackend {
    fn scene_root(&self) -> NodeId;
    fn camera(&self) -> NodeId;

    fn create_node(&mut self, name: &str, parent: Option<NodeId>) -> NodeId;
    fn load_model(&mut self, path: &str) -> Result<NodeId, SceneError>;
    fn load_texture(&mut self, path: &str) -> Result<TextureId, SceneError>;

    /// First node under `root` matching an engine search pattern such as
    /// `**/def_head`.
    fn find(&mut self, root: NodeId, pattern: &str) -> Option<NodeId>;
    fn find_all(&mut self, root: NodeId, pattern: &str) -> Vec<NodeId>;
    fn copy_to(&mut self, node: NodeId, parent: NodeId) -> Option<NodeId>;
    /// `None` parks the node outside the rendered scene.
    fn reparent(&mut self, node: NodeId, parent: Option<NodeId>);
    fn remove_node(&mut self, node: NodeId);

    fn set_color(&mut self, node: NodeId, color: Rgba);
    fn set_texture(&mut self, node: NodeId, texture: TextureId);
    fn set_scale(&mut self, node: NodeId, scale: f32);
    fn set_heading(&mut self, node: NodeId, degrees: f32);
    fn set_pitch(&mut self, node: NodeId, degrees: f32);
    fn set_roll(&mut self, node: NodeId, degrees: f32);
    fn set_transform(&mut self, node: NodeId, transform: Transform);
    fn show(&mut self, node: NodeId);
    /// Shows the node even when an ancestor is hidden.
    fn show_through(&mut self, node: NodeId);
    fn hide(&mut self, node: NodeId);

    fn load_actor(&mut self, rig: &RigSpec) -> Result<ActorId, SceneError>;
    fn actor_root(&self, actor: ActorId) -> Option<NodeId>;
    /// Parents `part` onto `joint` of `parent_part` for multi-part rigs.
    fn attach_part(
        &mut self,
        actor: ActorId,
        part: &str,
        parent_part: &str,
        joint: &str,
    ) -> Result<(), SceneError>;
    fn part_names(&self, actor: ActorId) -> Vec<String>;

    fn loop_animation(&mut self, actor: ActorId, part: &str, animation: &str);
    /// Plays `animation` once from `from_frame` to its last frame, then holds.
    fn play_once(&mut self, actor: ActorId, part: &str, animation: &str, from_frame: u32);
    fn pose(&mut self, actor: ActorId, part: &str, animation: &str, frame: u32);
    /// Animation the part is looping. Engines report nothing while a one-shot
    /// interval drives the part, so callers keep their own record.
    fn current_animation(&self, actor: ActorId, part: &str) -> Option<String>;
    fn current_frame(&self, actor: ActorId, part: &str, animation: &str) -> Option<u32>;
    fn num_frames(&self, actor: ActorId, part: &str, animation: &str) -> Option<u32>;
    fn frame_rate(&self, actor: ActorId, part: &str, animation: &str) -> Option<f32>;
    fn set_frame_blend(&mut self, actor: ActorId, enabled: bool);
    /// Releases the actor and its node tree.
    fn cleanup_actor(&mut self, actor: ActorId);

    /// Advances playback by `dt` seconds.
    fn advance(&mut self, dt: f32);
}
