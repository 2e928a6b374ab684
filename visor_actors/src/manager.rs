//! Owns the one live actor of the viewer and every piece of state the user
//! can change about it: visibility of head, body and shadow, per-part pose or
//! loop state, frame blending, head rotation and the skeletal toggle.
//!
//! Rebuilding swaps the underlying actor. The replacement is generated before
//! the old actor is released, so a descriptor whose resources do not resolve
//! leaves the viewer exactly as it was.

use std::collections::BTreeMap;
use std::sync::Arc;

use log::{debug, info};

use crate::chain::ChainState;
use crate::descriptor::{ActorDescriptor, ActorKind, SpecialNode};
use crate::error::{ActorError, SceneError};
use crate::part::{PartId, PartState, PartTable};
use crate::scene::{ActorId, NodeId, Rgba, SceneBackend};

pub const SHADOW_MODEL: &str = "phase_3/models/props/drop_shadow.bam";
pub const SHADOW_SCALE: f32 = 0.45;
pub const SHADOW_COLOR: Rgba = Rgba::new(0.0, 0.0, 0.0, 0.5);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Region {
    Head,
    Body,
    Shadow,
}

#[derive(Debug, Clone, Copy)]
struct RegionFlags {
    head: bool,
    body: bool,
    shadow: bool,
}

#[derive(Debug, Clone, Copy)]
struct Instance {
    actor: ActorId,
    root: NodeId,
}

pub struct ActorManager<S: SceneBackend> {
    scene: S,
    root: NodeId,
    shadow: NodeId,
    descriptor: Option<Arc<ActorDescriptor>>,
    instance: Option<Instance>,
    parts: PartTable,
    animations: BTreeMap<String, Vec<String>>,
    generation: u32,
    chain: ChainState,
    visible: RegionFlags,
    smoothing: bool,
    head_rotation: f32,
    skeletal: bool,
    skeletal_origin: Option<Arc<ActorDescriptor>>,
}

impl<S: SceneBackend> ActorManager<S> {
    /// Creates the manager node under the scene root and loads the shared
    /// drop shadow. No actor exists until [`Self::set_descriptor`].
    pub fn new(mut scene: S) -> Result<Self, ActorError> {
        let scene_root = scene.scene_root();
        let root = scene.create_node("ActorManager", Some(scene_root));
        let shadow = scene.load_model(SHADOW_MODEL).map_err(ActorError::Shadow)?;
        scene.set_scale(shadow, SHADOW_SCALE);
        scene.set_color(shadow, SHADOW_COLOR);
        Ok(ActorManager {
            scene,
            root,
            shadow,
            descriptor: None,
            instance: None,
            parts: PartTable::default(),
            animations: BTreeMap::new(),
            generation: 0,
            chain: ChainState::Idle,
            visible: RegionFlags {
                head: true,
                body: true,
                shadow: true,
            },
            smoothing: true,
            head_rotation: 0.0,
            skeletal: false,
            skeletal_origin: None,
        })
    }

    pub fn scene(&self) -> &S {
        &self.scene
    }

    pub fn scene_mut(&mut self) -> &mut S {
        &mut self.scene
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn shadow(&self) -> NodeId {
        self.shadow
    }

    pub fn actor(&self) -> Option<ActorId> {
        self.instance.map(|instance| instance.actor)
    }

    pub fn actor_root(&self) -> Option<NodeId> {
        self.instance.map(|instance| instance.root)
    }

    pub fn descriptor(&self) -> Option<&Arc<ActorDescriptor>> {
        self.descriptor.as_ref()
    }

    pub fn chain(&self) -> &ChainState {
        &self.chain
    }

    /// Replaces the live actor with one built from `descriptor`.
    ///
    /// While the skeletal mode is on, cogs are built in their skeletal form
    /// and `descriptor` is kept as the form to return to.
    pub fn set_descriptor(
        &mut self,
        descriptor: Arc<ActorDescriptor>,
        preserve_state: bool,
    ) -> Result<(), ActorError> {
        if self.skeletal {
            if let Some(variant) = descriptor.skeletal_variant() {
                self.rebuild(Arc::new(variant), preserve_state)?;
                self.skeletal_origin = Some(descriptor);
                return Ok(());
            }
        }
        self.rebuild(descriptor, preserve_state)?;
        self.skeletal_origin = None;
        Ok(())
    }

    /// Switches between a cog and its skeletal form, carrying part state
    /// over. Asking for the form already shown does nothing.
    pub fn toggle_skeletal_variant(&mut self, enabled: bool) -> Result<(), ActorError> {
        if enabled == self.skeletal {
            return Ok(());
        }
        let Some(current) = self.descriptor.clone() else {
            self.skeletal = enabled;
            return Ok(());
        };

        if enabled {
            if let Some(variant) = current.skeletal_variant() {
                self.rebuild(Arc::new(variant), true)?;
                self.skeletal_origin = Some(current);
            }
        } else if let Some(origin) = self.skeletal_origin.clone() {
            self.rebuild(origin, true)?;
            self.skeletal_origin = None;
        }
        self.skeletal = enabled;
        Ok(())
    }

    pub fn is_skeletal(&self) -> bool {
        self.skeletal
    }

    pub fn skeletal_origin(&self) -> Option<&Arc<ActorDescriptor>> {
        self.skeletal_origin.as_ref()
    }

    fn rebuild(
        &mut self,
        descriptor: Arc<ActorDescriptor>,
        preserve: bool,
    ) -> Result<(), ActorError> {
        let resolution = |source: SceneError| ActorError::ResourceResolution {
            descriptor: descriptor.name().to_string(),
            source,
        };
        let actor = descriptor.generate(&mut self.scene).map_err(resolution)?;
        let Some(actor_root) = self.scene.actor_root(actor) else {
            self.scene.cleanup_actor(actor);
            return Err(resolution(SceneError::UnknownActor(actor.0)));
        };

        let carried = if preserve {
            self.carried_states()
        } else {
            Vec::new()
        };
        self.chain = ChainState::Idle;

        self.scene.reparent(self.shadow, None);
        if let Some(previous) = self.instance.take() {
            self.scene.cleanup_actor(previous.actor);
        }
        self.scene.reparent(actor_root, Some(self.root));

        self.generation = self.generation.wrapping_add(1);
        self.parts = PartTable::new(self.generation, self.scene.part_names(actor));
        self.animations = descriptor.animation_names();
        self.instance = Some(Instance {
            actor,
            root: actor_root,
        });
        self.descriptor = Some(Arc::clone(&descriptor));

        if let Some(pattern) = descriptor.special_node(SpecialNode::Shadow) {
            if let Some(node) = self.scene.find(actor_root, pattern) {
                self.scene.reparent(self.shadow, Some(node));
            }
        }
        for region in [Region::Head, Region::Body, Region::Shadow] {
            self.apply_visibility(region);
        }
        self.scene.set_frame_blend(actor, self.smoothing);
        self.apply_head_rotation();

        // Only one chain runs at a time, so each restore cuts the previous
        // part's one-shot short: with several looping parts, only the last
        // one resumes from its carried frame and the others restart at zero.
        for (name, state) in carried {
            if let Some(part) = self.parts.resolve(&name) {
                self.restore_part(part, state);
            }
        }

        info!(
            "built {} '{}' with {} part(s)",
            descriptor.kind_label(),
            descriptor.name(),
            self.parts.len()
        );
        Ok(())
    }

    /// Part states by name, with the live frame of looping parts filled in.
    fn carried_states(&self) -> Vec<(String, PartState)> {
        let mut carried = self.parts.snapshot();
        for (part, (_, state)) in self.parts.ids().zip(carried.iter_mut()) {
            if !state.posed && state.animation.is_some() {
                state.frame = self.current_frame(part);
            }
        }
        carried
    }

    fn restore_part(&mut self, part: PartId, state: PartState) {
        let Some(animation) = state.animation else {
            return;
        };
        if !self.has_animation(part, &animation) {
            debug!("'{animation}' is not part of the new rig; part left idle");
            return;
        }
        if state.posed {
            let frame = match self.frame_count(part, &animation) {
                Some(frames) if frames > 0 => state.frame % frames,
                _ => state.frame,
            };
            if let Some(slot) = self.parts.state_mut(part) {
                slot.posed = true;
                slot.animation = Some(animation.clone());
                slot.frame = frame;
            }
            self.pose_now(part, &animation, frame);
        } else {
            self.start_loop(part, &animation, Some(state.frame));
        }
    }

    pub fn set_part_visibility(&mut self, region: Region, visible: bool) {
        match region {
            Region::Head => self.visible.head = visible,
            Region::Body => self.visible.body = visible,
            Region::Shadow => self.visible.shadow = visible,
        }
        self.apply_visibility(region);
    }

    pub fn toggle_part_visibility(&mut self, region: Region) {
        self.set_part_visibility(region, !self.part_visibility(region));
    }

    pub fn part_visibility(&self, region: Region) -> bool {
        match region {
            Region::Head => self.visible.head,
            Region::Body => self.visible.body,
            Region::Shadow => self.visible.shadow,
        }
    }

    fn apply_visibility(&mut self, region: Region) {
        let visible = self.part_visibility(region);
        let shadow = self.shadow;
        let node = match region {
            Region::Body => self.actor_root(),
            Region::Head => self.special_node(SpecialNode::Head),
            Region::Shadow => self.special_node(SpecialNode::Shadow).map(|_| shadow),
        };
        let Some(node) = node else {
            debug!("{region:?} visibility has no node on this actor");
            return;
        };
        match (region, visible) {
            (Region::Body, true) => self.scene.show(node),
            (_, true) => self.scene.show_through(node),
            (_, false) => self.scene.hide(node),
        }
    }

    fn special_node(&mut self, role: SpecialNode) -> Option<NodeId> {
        let pattern = self.descriptor.as_ref()?.special_node(role)?;
        let root = self.actor_root()?;
        self.scene.find(root, pattern)
    }

    pub fn set_animation_smoothing(&mut self, smooth: bool) {
        self.smoothing = smooth;
        if let Some(actor) = self.actor() {
            self.scene.set_frame_blend(actor, smooth);
        }
    }

    pub fn toggle_animation_smoothing(&mut self) {
        self.set_animation_smoothing(!self.smoothing);
    }

    pub fn is_animation_smoothed(&self) -> bool {
        self.smoothing
    }

    /// Turns the head node. Boss heads hang sideways off their joint, so
    /// they pitch instead.
    pub fn set_head_rotation(&mut self, degrees: f32) {
        self.head_rotation = degrees;
        self.apply_head_rotation();
    }

    pub fn head_rotation(&self) -> f32 {
        self.head_rotation
    }

    pub fn flip_head(&mut self) {
        let next = if self.head_rotation > 0.0 { 0.0 } else { 180.0 };
        self.set_head_rotation(next);
    }

    fn apply_head_rotation(&mut self) {
        let Some(head) = self.special_node(SpecialNode::Head) else {
            return;
        };
        let pitch = matches!(
            self.descriptor.as_deref().map(ActorDescriptor::kind),
            Some(ActorKind::Boss(_))
        );
        if pitch {
            self.scene.set_pitch(head, self.head_rotation);
        } else {
            self.scene.set_heading(head, self.head_rotation);
        }
    }

    pub fn parts(&self) -> &PartTable {
        &self.parts
    }

    pub fn part(&self, name: &str) -> Option<PartId> {
        self.parts.resolve(name)
    }

    pub fn first_part(&self) -> Option<PartId> {
        self.parts.first()
    }

    pub fn part_state(&self, part: PartId) -> Option<&PartState> {
        self.parts.state(part)
    }

    pub fn is_posed(&self, part: PartId) -> bool {
        self.parts.state(part).map(|s| s.posed).unwrap_or(false)
    }

    /// Animation names of the current rig for `part`.
    pub fn animation_names(&self, part: PartId) -> &[String] {
        self.parts
            .name(part)
            .and_then(|name| self.animations.get(name))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// The posed animation, else whatever the engine reports looping, else
    /// the last animation requested for the part.
    pub fn current_animation(&self, part: PartId) -> Option<String> {
        let state = self.parts.state(part)?;
        if state.posed {
            return state.animation.clone();
        }
        let (actor, name) = self.target(part)?;
        self.scene
            .current_animation(actor, name)
            .or_else(|| state.animation.clone())
    }

    pub fn current_frame(&self, part: PartId) -> u32 {
        let Some(state) = self.parts.state(part) else {
            return 0;
        };
        if state.posed {
            return state.frame;
        }
        let Some(animation) = self.current_animation(part) else {
            return 0;
        };
        let Some((actor, name)) = self.target(part) else {
            return 0;
        };
        self.scene
            .current_frame(actor, name, &animation)
            .unwrap_or(0)
    }

    /// Freezes the part on its current frame, or resumes looping from the
    /// frame it was frozen on.
    pub fn set_pose_mode(&mut self, posed: bool, part: PartId) {
        let Some(state) = self.parts.state(part) else {
            debug!("pose request for a part of a previous actor");
            return;
        };
        if state.posed == posed {
            return;
        }
        // read both before the flag flips; the queries depend on it
        let animation = self.current_animation(part);
        let frame = self.current_frame(part);

        self.finish_chain(Some(part));
        if let Some(slot) = self.parts.state_mut(part) {
            slot.posed = posed;
            slot.animation = animation.clone();
            slot.frame = frame;
        }
        let Some(animation) = animation else {
            return;
        };
        if posed {
            self.pose_now(part, &animation, frame);
        } else {
            self.start_loop(part, &animation, Some(frame));
        }
    }

    pub fn toggle_pose(&mut self, part: PartId) {
        let posed = self.is_posed(part);
        self.set_pose_mode(!posed, part);
    }

    /// Loops `animation` on `part`, leaving pose mode. With a non-zero
    /// `start_frame` the clip first plays once from that frame to its end.
    pub fn animate(&mut self, animation: &str, part: PartId, start_frame: Option<u32>) {
        if !self.has_animation(part, animation) {
            debug!("ignoring unknown animation '{animation}'");
            return;
        }
        if let Some(slot) = self.parts.state_mut(part) {
            slot.posed = false;
        }
        self.start_loop(part, animation, start_frame);
    }

    /// Steps a posed part by `delta` frames, wrapping both ways.
    pub fn increment_pose(&mut self, delta: i32, part: PartId) {
        let Some(state) = self.parts.state(part) else {
            return;
        };
        if !state.posed {
            return;
        }
        let Some(animation) = state.animation.clone() else {
            return;
        };
        let frames = match self.frame_count(part, &animation) {
            Some(frames) if frames > 0 => frames,
            _ => {
                debug!("'{animation}' reports no frames; pose step skipped");
                return;
            }
        };
        let stepped = i64::from(state.frame) + i64::from(delta);
        let frame = stepped.rem_euclid(i64::from(frames)) as u32;
        if let Some(slot) = self.parts.state_mut(part) {
            slot.frame = frame;
        }
        self.pose_now(part, &animation, frame);
    }

    /// Per-frame driver: advances engine playback, then hands a finished
    /// one-shot over to its loop.
    pub fn update(&mut self, dt: f32) {
        self.scene.advance(dt);
        if let Some(handoff) = self.chain.advance(dt) {
            self.loop_now(handoff.part, &handoff.animation);
        }
    }

    fn start_loop(&mut self, part: PartId, animation: &str, start_frame: Option<u32>) {
        self.finish_chain(Some(part));
        let Some((actor, name)) = self.target(part).map(|(a, n)| (a, n.to_string())) else {
            return;
        };
        let frames = self.scene.num_frames(actor, &name, animation).unwrap_or(0);
        let rate = self
            .scene
            .frame_rate(actor, &name, animation)
            .filter(|rate| *rate > 0.0);

        let mut frame = 0;
        match (start_frame, rate) {
            (Some(from), Some(rate)) if from > 0 && frames > 0 => {
                frame = from.min(frames - 1);
                self.scene.play_once(actor, &name, animation, frame);
                let remaining = (frames - frame) as f32 / rate;
                self.chain = ChainState::one_shot(part, animation, remaining);
            }
            _ => {
                self.scene.loop_animation(actor, &name, animation);
                self.chain = ChainState::Looping {
                    part,
                    animation: animation.to_string(),
                };
            }
        }
        if let Some(slot) = self.parts.state_mut(part) {
            slot.animation = Some(animation.to_string());
            slot.frame = frame;
        }
    }

    fn finish_chain(&mut self, commanded: Option<PartId>) {
        if let Some(handoff) = self.chain.finish(commanded) {
            self.loop_now(handoff.part, &handoff.animation);
        }
    }

    fn loop_now(&mut self, part: PartId, animation: &str) {
        if let Some((actor, name)) = self.target(part).map(|(a, n)| (a, n.to_string())) {
            self.scene.loop_animation(actor, &name, animation);
        }
    }

    fn pose_now(&mut self, part: PartId, animation: &str, frame: u32) {
        if let Some((actor, name)) = self.target(part).map(|(a, n)| (a, n.to_string())) {
            self.scene.pose(actor, &name, animation, frame);
        }
    }

    fn has_animation(&self, part: PartId, animation: &str) -> bool {
        self.animation_names(part)
            .iter()
            .any(|name| name == animation)
    }

    fn frame_count(&self, part: PartId, animation: &str) -> Option<u32> {
        let (actor, name) = self.target(part)?;
        self.scene.num_frames(actor, name, animation)
    }

    fn target(&self, part: PartId) -> Option<(ActorId, &str)> {
        let actor = self.actor()?;
        let name = self.parts.name(part)?;
        Some((actor, name))
    }
}
