//! In-process scene used when no renderer is attached. It checks every
//! resource against the mounted assets, keeps a node tree with visibility
//! state, and simulates skeletal playback closely enough to drive the actor
//! manager: looping, one-shot intervals, and static poses.
//!
//! Model contents are not parsed, so node lookups that find nothing
//! materialise an empty node with the requested name. A real engine answers
//! those lookups from the loaded model instead.

use std::collections::BTreeMap;
use std::sync::Arc;

use log::debug;
use visor_assets::{AssetResolver, GlobPattern};

use crate::animation::AnimationSet;
use crate::error::{ResourceKind, SceneError};
use crate::scene::{ActorId, NodeId, Rgba, RigSpec, SceneBackend, TextureId, Transform};

pub const DEFAULT_FRAME_COUNT: u32 = 24;
pub const DEFAULT_FRAME_RATE: f32 = 24.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Visibility {
    #[default]
    Inherit,
    Hidden,
    ShownThrough,
}

#[derive(Debug, Clone)]
pub struct HeadlessNode {
    pub name: String,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
    pub alive: bool,
    pub visibility: Visibility,
    pub color: Option<Rgba>,
    pub texture: Option<TextureId>,
    pub scale: f32,
    pub hpr: [f32; 3],
    pub transform: Option<Transform>,
}

impl HeadlessNode {
    fn new(name: &str, parent: Option<NodeId>) -> Self {
        HeadlessNode {
            name: name.to_string(),
            parent,
            children: Vec::new(),
            alive: true,
            visibility: Visibility::Inherit,
            color: None,
            texture: None,
            scale: 1.0,
            hpr: [0.0; 3],
            transform: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Playback {
    Stopped,
    Looping { animation: String, frame: f32 },
    Once { animation: String, frame: f32 },
    Held { animation: String, frame: u32 },
    Posed { animation: String, frame: u32 },
}

impl Playback {
    fn animation(&self) -> Option<&str> {
        match self {
            Playback::Stopped => None,
            Playback::Looping { animation, .. }
            | Playback::Once { animation, .. }
            | Playback::Held { animation, .. }
            | Playback::Posed { animation, .. } => Some(animation),
        }
    }

    fn frame(&self) -> u32 {
        match self {
            Playback::Stopped => 0,
            Playback::Looping { frame, .. } | Playback::Once { frame, .. } => frame.floor() as u32,
            Playback::Held { frame, .. } | Playback::Posed { frame, .. } => *frame,
        }
    }
}

#[derive(Debug, Clone)]
struct HeadlessPart {
    name: String,
    node: NodeId,
    animations: AnimationSet,
    playback: Playback,
}

#[derive(Debug, Clone)]
struct HeadlessActor {
    root: NodeId,
    parts: Vec<HeadlessPart>,
    frame_blend: bool,
}

pub struct HeadlessScene {
    assets: Arc<dyn AssetResolver>,
    nodes: Vec<HeadlessNode>,
    actors: Vec<Option<HeadlessActor>>,
    textures: Vec<String>,
    root: NodeId,
    camera: NodeId,
    frame_counts: BTreeMap<String, u32>,
    frame_rates: BTreeMap<String, f32>,
    default_frame_count: u32,
    default_frame_rate: f32,
    log: Vec<String>,
}

impl HeadlessScene {
    pub fn new(assets: Arc<dyn AssetResolver>) -> Self {
        let mut scene = HeadlessScene {
            assets,
            nodes: Vec::new(),
            actors: Vec::new(),
            textures: Vec::new(),
            root: NodeId(0),
            camera: NodeId(0),
            frame_counts: BTreeMap::new(),
            frame_rates: BTreeMap::new(),
            default_frame_count: DEFAULT_FRAME_COUNT,
            default_frame_rate: DEFAULT_FRAME_RATE,
            log: Vec::new(),
        };
        scene.root = scene.alloc("render", None);
        scene.camera = scene.alloc("camera", Some(scene.root));
        scene
    }

    pub fn with_default_timing(mut self, frame_count: u32, frame_rate: f32) -> Self {
        self.default_frame_count = frame_count;
        if frame_rate > 0.0 {
            self.default_frame_rate = frame_rate;
        }
        self
    }

    /// Overrides the frame count reported for one animation resource.
    pub fn set_frame_count(&mut self, animation_path: &str, frames: u32) {
        self.frame_counts.insert(animation_path.to_string(), frames);
    }

    pub fn set_frame_rate(&mut self, animation_path: &str, rate: f32) {
        self.frame_rates.insert(animation_path.to_string(), rate);
    }

    pub fn node(&self, id: NodeId) -> Option<&HeadlessNode> {
        self.nodes.get(id.0 as usize).filter(|node| node.alive)
    }

    pub fn live_actor_count(&self) -> usize {
        self.actors.iter().filter(|actor| actor.is_some()).count()
    }

    pub fn playback(&self, actor: ActorId, part: &str) -> Option<&Playback> {
        self.part(actor, part).map(|p| &p.playback)
    }

    pub fn frame_blend(&self, actor: ActorId) -> Option<bool> {
        self.actor(actor).map(|a| a.frame_blend)
    }

    /// Whether the node would be drawn: alive, connected to the scene root,
    /// and not hidden by itself or an ancestor unless shown through.
    pub fn is_rendered(&self, id: NodeId) -> bool {
        let mut hidden_decided: Option<bool> = None;
        let mut cursor = Some(id);
        let mut reached_root = false;
        while let Some(current) = cursor {
            let Some(node) = self.node(current) else {
                return false;
            };
            if hidden_decided.is_none() {
                match node.visibility {
                    Visibility::Hidden => hidden_decided = Some(true),
                    Visibility::ShownThrough => hidden_decided = Some(false),
                    Visibility::Inherit => {}
                }
            }
            if current == self.root {
                reached_root = true;
                break;
            }
            cursor = node.parent;
        }
        reached_root && !hidden_decided.unwrap_or(false)
    }

    pub fn log(&self) -> &[String] {
        &self.log
    }

    pub fn clear_log(&mut self) {
        self.log.clear();
    }

    fn record(&mut self, entry: String) {
        debug!("headless: {entry}");
        self.log.push(entry);
    }

    fn alloc(&mut self, name: &str, parent: Option<NodeId>) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(HeadlessNode::new(name, parent));
        if let Some(parent) = parent {
            if let Some(parent_node) = self.nodes.get_mut(parent.0 as usize) {
                parent_node.children.push(id);
            }
        }
        id
    }

    fn node_mut(&mut self, id: NodeId) -> Option<&mut HeadlessNode> {
        self.nodes.get_mut(id.0 as usize).filter(|node| node.alive)
    }

    fn detach(&mut self, id: NodeId) {
        let parent = self.node(id).and_then(|node| node.parent);
        if let Some(parent) = parent {
            if let Some(parent_node) = self.node_mut(parent) {
                parent_node.children.retain(|child| *child != id);
            }
        }
        if let Some(node) = self.node_mut(id) {
            node.parent = None;
        }
    }

    fn descendants(&self, root: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self
            .node(root)
            .map(|node| node.children.iter().rev().copied().collect())
            .unwrap_or_default();
        while let Some(id) = stack.pop() {
            if let Some(node) = self.node(id) {
                out.push(id);
                stack.extend(node.children.iter().rev().copied());
            }
        }
        out
    }

    fn matches(&self, root: NodeId, pattern: &str) -> (Vec<NodeId>, String) {
        let (candidates, name_pattern) = match pattern.strip_prefix("**/") {
            Some(rest) => (self.descendants(root), rest),
            None => (
                self.node(root)
                    .map(|node| node.children.clone())
                    .unwrap_or_default(),
                pattern,
            ),
        };
        let matcher = GlobPattern::new(name_pattern).ok();
        let hits = candidates
            .into_iter()
            .filter(|id| {
                let Some(node) = self.node(*id) else {
                    return false;
                };
                match matcher.as_ref() {
                    Some(matcher) => matcher.matches(&node.name),
                    None => node.name == name_pattern,
                }
            })
            .collect();
        (hits, name_pattern.to_string())
    }

    fn actor(&self, actor: ActorId) -> Option<&HeadlessActor> {
        self.actors.get(actor.0 as usize).and_then(Option::as_ref)
    }

    fn part(&self, actor: ActorId, part: &str) -> Option<&HeadlessPart> {
        self.actor(actor)?.parts.iter().find(|p| p.name == part)
    }

    fn part_mut(&mut self, actor: ActorId, part: &str) -> Option<&mut HeadlessPart> {
        self.actors
            .get_mut(actor.0 as usize)
            .and_then(Option::as_mut)?
            .parts
            .iter_mut()
            .find(|p| p.name == part)
    }

    fn clip_timing(&self, path: &str) -> (u32, f32) {
        let frames = self
            .frame_counts
            .get(path)
            .copied()
            .unwrap_or(self.default_frame_count);
        let rate = self
            .frame_rates
            .get(path)
            .copied()
            .unwrap_or(self.default_frame_rate);
        (frames, rate)
    }

    fn part_clip_timing(&self, actor: ActorId, part: &str, animation: &str) -> Option<(u32, f32)> {
        let path = self.part(actor, part)?.animations.path(animation)?;
        Some(self.clip_timing(path))
    }

    fn set_playback(
        &mut self,
        actor: ActorId,
        part: &str,
        animation: &str,
        playback: Playback,
    ) -> bool {
        let known = self
            .part(actor, part)
            .map(|p| p.animations.contains(animation))
            .unwrap_or(false);
        if !known {
            self.record(format!("ignored {part} {animation}"));
            return false;
        }
        if let Some(slot) = self.part_mut(actor, part) {
            slot.playback = playback;
        }
        true
    }

    fn require(&self, kind: ResourceKind, path: &str) -> Result<(), SceneError> {
        if self.assets.exists(path) {
            Ok(())
        } else {
            Err(SceneError::MissingResource {
                kind,
                path: path.to_string(),
            })
        }
    }
}

fn file_stem(path: &str) -> &str {
    let name = path.rsplit('/').next().unwrap_or(path);
    name.split('.').next().unwrap_or(name)
}

impl SceneBackend for HeadlessScene {
    fn scene_root(&self) -> NodeId {
        self.root
    }

    fn camera(&self) -> NodeId {
        self.camera
    }

    fn create_node(&mut self, name: &str, parent: Option<NodeId>) -> NodeId {
        self.alloc(name, parent)
    }

    fn load_model(&mut self, path: &str) -> Result<NodeId, SceneError> {
        self.require(ResourceKind::Model, path)?;
        let id = self.alloc(file_stem(path), None);
        self.record(format!("load_model {path}"));
        Ok(id)
    }

    fn load_texture(&mut self, path: &str) -> Result<TextureId, SceneError> {
        self.require(ResourceKind::Texture, path)?;
        if let Some(index) = self.textures.iter().position(|known| known == path) {
            return Ok(TextureId(index as u32));
        }
        self.textures.push(path.to_string());
        Ok(TextureId(self.textures.len() as u32 - 1))
    }

    fn find(&mut self, root: NodeId, pattern: &str) -> Option<NodeId> {
        self.node(root)?;
        let (hits, name) = self.matches(root, pattern);
        match hits.first() {
            Some(hit) => Some(*hit),
            None => Some(self.alloc(&name, Some(root))),
        }
    }

    fn find_all(&mut self, root: NodeId, pattern: &str) -> Vec<NodeId> {
        if self.node(root).is_none() {
            return Vec::new();
        }
        let (hits, name) = self.matches(root, pattern);
        if hits.is_empty() {
            vec![self.alloc(&name, Some(root))]
        } else {
            hits
        }
    }

    fn copy_to(&mut self, node: NodeId, parent: NodeId) -> Option<NodeId> {
        let source = self.node(node)?.clone();
        self.node(parent)?;
        let copy = self.alloc(&source.name, Some(parent));
        if let Some(target) = self.node_mut(copy) {
            target.visibility = source.visibility;
            target.color = source.color;
            target.texture = source.texture;
            target.scale = source.scale;
            target.hpr = source.hpr;
            target.transform = source.transform;
        }
        for child in source.children {
            self.copy_to(child, copy);
        }
        Some(copy)
    }

    fn reparent(&mut self, node: NodeId, parent: Option<NodeId>) {
        if self.node(node).is_none() {
            return;
        }
        self.detach(node);
        if let Some(parent) = parent {
            if self.node(parent).is_none() {
                return;
            }
            if let Some(child) = self.node_mut(node) {
                child.parent = Some(parent);
            }
            if let Some(parent_node) = self.node_mut(parent) {
                parent_node.children.push(node);
            }
        }
    }

    fn remove_node(&mut self, node: NodeId) {
        if self.node(node).is_none() {
            return;
        }
        self.detach(node);
        let mut doomed = self.descendants(node);
        doomed.push(node);
        for id in doomed {
            if let Some(entry) = self.nodes.get_mut(id.0 as usize) {
                entry.alive = false;
                entry.children.clear();
            }
        }
    }

    fn set_color(&mut self, node: NodeId, color: Rgba) {
        if let Some(node) = self.node_mut(node) {
            node.color = Some(color);
        }
    }

    fn set_texture(&mut self, node: NodeId, texture: TextureId) {
        if let Some(node) = self.node_mut(node) {
            node.texture = Some(texture);
        }
    }

    fn set_scale(&mut self, node: NodeId, scale: f32) {
        if let Some(node) = self.node_mut(node) {
            node.scale = scale;
        }
    }

    fn set_heading(&mut self, node: NodeId, degrees: f32) {
        if let Some(node) = self.node_mut(node) {
            node.hpr[0] = degrees;
        }
    }

    fn set_pitch(&mut self, node: NodeId, degrees: f32) {
        if let Some(node) = self.node_mut(node) {
            node.hpr[1] = degrees;
        }
    }

    fn set_roll(&mut self, node: NodeId, degrees: f32) {
        if let Some(node) = self.node_mut(node) {
            node.hpr[2] = degrees;
        }
    }

    fn set_transform(&mut self, node: NodeId, transform: Transform) {
        if let Some(node) = self.node_mut(node) {
            node.hpr = transform.hpr;
            node.transform = Some(transform);
        }
    }

    fn show(&mut self, node: NodeId) {
        if let Some(node) = self.node_mut(node) {
            node.visibility = Visibility::Inherit;
        }
    }

    fn show_through(&mut self, node: NodeId) {
        if let Some(node) = self.node_mut(node) {
            node.visibility = Visibility::ShownThrough;
        }
    }

    fn hide(&mut self, node: NodeId) {
        if let Some(node) = self.node_mut(node) {
            node.visibility = Visibility::Hidden;
        }
    }

    fn load_actor(&mut self, rig: &RigSpec) -> Result<ActorId, SceneError> {
        let first = rig.parts.first().ok_or(SceneError::EmptyRig)?;
        for part in &rig.parts {
            self.require(ResourceKind::Model, &part.model)?;
            for (_, path) in part.animations.iter() {
                self.require(ResourceKind::Animation, path)?;
            }
        }

        let root = self.alloc(&format!("actor:{}", file_stem(&first.model)), None);
        let mut parts = Vec::with_capacity(rig.parts.len());
        for part in &rig.parts {
            let node = self.alloc(&format!("__Actor_{}", part.name), Some(root));
            parts.push(HeadlessPart {
                name: part.name.clone(),
                node,
                animations: part.animations.clone(),
                playback: Playback::Stopped,
            });
        }

        let id = ActorId(self.actors.len() as u32);
        self.actors.push(Some(HeadlessActor {
            root,
            parts,
            frame_blend: false,
        }));
        self.record(format!("load_actor #{} {}", id.0, first.model));
        Ok(id)
    }

    fn actor_root(&self, actor: ActorId) -> Option<NodeId> {
        self.actor(actor).map(|a| a.root)
    }

    fn attach_part(
        &mut self,
        actor: ActorId,
        part: &str,
        parent_part: &str,
        joint: &str,
    ) -> Result<(), SceneError> {
        self.actor(actor).ok_or(SceneError::UnknownActor(actor.0))?;
        let child = self
            .part(actor, part)
            .map(|p| p.node)
            .ok_or_else(|| SceneError::UnknownPart(part.to_string()))?;
        let parent = self
            .part(actor, parent_part)
            .map(|p| p.node)
            .ok_or_else(|| SceneError::UnknownPart(parent_part.to_string()))?;
        let joint_node = self
            .find(parent, &format!("**/{joint}"))
            .ok_or_else(|| SceneError::UnknownPart(joint.to_string()))?;
        self.reparent(child, Some(joint_node));
        Ok(())
    }

    fn part_names(&self, actor: ActorId) -> Vec<String> {
        self.actor(actor)
            .map(|a| a.parts.iter().map(|p| p.name.clone()).collect())
            .unwrap_or_default()
    }

    fn loop_animation(&mut self, actor: ActorId, part: &str, animation: &str) {
        let playback = Playback::Looping {
            animation: animation.to_string(),
            frame: 0.0,
        };
        if self.set_playback(actor, part, animation, playback) {
            self.record(format!("loop {part} {animation}"));
        }
    }

    fn play_once(&mut self, actor: ActorId, part: &str, animation: &str, from_frame: u32) {
        let playback = Playback::Once {
            animation: animation.to_string(),
            frame: from_frame as f32,
        };
        if self.set_playback(actor, part, animation, playback) {
            self.record(format!("once {part} {animation} {from_frame}"));
        }
    }

    fn pose(&mut self, actor: ActorId, part: &str, animation: &str, frame: u32) {
        let last = self
            .part_clip_timing(actor, part, animation)
            .map(|(frames, _)| frames.saturating_sub(1))
            .unwrap_or(0);
        let frame = frame.min(last);
        let playback = Playback::Posed {
            animation: animation.to_string(),
            frame,
        };
        if self.set_playback(actor, part, animation, playback) {
            self.record(format!("pose {part} {animation} {frame}"));
        }
    }

    fn current_animation(&self, actor: ActorId, part: &str) -> Option<String> {
        match &self.part(actor, part)?.playback {
            Playback::Looping { animation, .. } => Some(animation.clone()),
            _ => None,
        }
    }

    fn current_frame(&self, actor: ActorId, part: &str, animation: &str) -> Option<u32> {
        let slot = self.part(actor, part)?;
        if !slot.animations.contains(animation) {
            return None;
        }
        if slot.playback.animation() == Some(animation) {
            Some(slot.playback.frame())
        } else {
            Some(0)
        }
    }

    fn num_frames(&self, actor: ActorId, part: &str, animation: &str) -> Option<u32> {
        self.part_clip_timing(actor, part, animation)
            .map(|(frames, _)| frames)
    }

    fn frame_rate(&self, actor: ActorId, part: &str, animation: &str) -> Option<f32> {
        self.part_clip_timing(actor, part, animation)
            .map(|(_, rate)| rate)
    }

    fn set_frame_blend(&mut self, actor: ActorId, enabled: bool) {
        if let Some(Some(entry)) = self.actors.get_mut(actor.0 as usize) {
            entry.frame_blend = enabled;
        }
    }

    fn cleanup_actor(&mut self, actor: ActorId) {
        let Some(entry) = self.actors.get_mut(actor.0 as usize).and_then(Option::take) else {
            return;
        };
        self.remove_node(entry.root);
        self.record(format!("cleanup #{}", actor.0));
    }

    fn advance(&mut self, dt: f32) {
        if dt <= 0.0 {
            return;
        }
        let mut timings: Vec<(usize, usize, u32, f32)> = Vec::new();
        for (actor_index, actor) in self.actors.iter().enumerate() {
            let Some(actor) = actor else { continue };
            for (part_index, part) in actor.parts.iter().enumerate() {
                let Some(animation) = part.playback.animation() else {
                    continue;
                };
                let Some(path) = part.animations.path(animation) else {
                    continue;
                };
                let (frames, rate) = self.clip_timing(path);
                timings.push((actor_index, part_index, frames, rate));
            }
        }

        for (actor_index, part_index, frames, rate) in timings {
            let Some(Some(actor)) = self.actors.get_mut(actor_index) else {
                continue;
            };
            let part = &mut actor.parts[part_index];
            let frames_f = frames.max(1) as f32;
            let step = dt * rate;
            let finished = match &mut part.playback {
                Playback::Looping { frame, .. } => {
                    *frame = (*frame + step) % frames_f;
                    None
                }
                Playback::Once { animation, frame } => {
                    *frame += step;
                    (*frame >= frames_f).then(|| animation.clone())
                }
                Playback::Stopped | Playback::Held { .. } | Playback::Posed { .. } => None,
            };
            if let Some(animation) = finished {
                part.playback = Playback::Held {
                    animation,
                    frame: frames.saturating_sub(1),
                };
            }
        }
    }
}
