//! Text front end for the viewer. Each input line is one key name (`space`,
//! `control-h`, `wheel_up`, ...) or a small command (`tick 0.5`,
//! `move 0.1 0`). Anything the user should read is queued as a notice and
//! printed by the caller.

use glam::Vec2;
use log::{debug, info, warn};
use serde::Serialize;
use thiserror::Error;
use visor_actors::{ActorKind, ActorManager, PartId, PartPhase, Region, Roster, SceneBackend};

use crate::camera::{CameraController, CameraPose, DragMode};

/// Clips meant for a different body type than the one they ship with.
const HIDDEN_COG_ANIMATIONS: &[&str] = &["lose", "lose_zero"];

#[derive(Debug, Error)]
pub enum ShellError {
    #[error("unknown command '{0}'")]
    UnknownCommand(String),
    #[error("'{command}' needs {argument}")]
    MissingArgument {
        command: &'static str,
        argument: &'static str,
    },
    #[error("'{command}' expects a number, got '{value}'")]
    InvalidNumber {
        command: &'static str,
        value: String,
    },
    #[error("no roster entry matches '{0}'")]
    UnknownActor(String),
    #[error("no actor in the roster could be built")]
    NothingBuilt,
    #[error("could not encode status: {0}")]
    Status(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

#[derive(Debug, Default)]
struct Picker {
    open: bool,
    items: Vec<String>,
    cursor: usize,
}

impl Picker {
    fn scroll(&mut self, delta: isize) {
        let last = self.items.len().saturating_sub(1);
        self.cursor = self.cursor.saturating_add_signed(delta).min(last);
    }

    fn highlighted(&self) -> Option<&str> {
        self.items.get(self.cursor).map(String::as_str)
    }
}

#[derive(Debug, Serialize)]
pub struct PartReport {
    pub name: String,
    /// `idle`, `looping` or `posed`.
    pub mode: &'static str,
    pub posed: bool,
    pub animation: Option<String>,
    pub frame: u32,
}

#[derive(Debug, Serialize)]
pub struct PickerReport {
    pub open: bool,
    pub items: Vec<String>,
    pub highlighted: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct StatusReport {
    pub actor: Option<String>,
    pub kind: Option<&'static str>,
    pub index: usize,
    pub roster_len: usize,
    pub skeletal: bool,
    pub selected_part: Option<String>,
    pub parts: Vec<PartReport>,
    pub head_visible: bool,
    pub body_visible: bool,
    pub shadow_visible: bool,
    pub smoothing: bool,
    pub head_rotation: f32,
    pub picker: PickerReport,
    pub camera_enabled: bool,
    pub camera_drag: Option<DragMode>,
    pub camera: CameraPose,
}

pub struct Shell<S: SceneBackend> {
    manager: ActorManager<S>,
    camera: CameraController,
    roster: Roster,
    index: usize,
    selected: Option<String>,
    picker: Picker,
    notices: Vec<String>,
}

impl<S: SceneBackend> Shell<S> {
    pub fn new(manager: ActorManager<S>, roster: Roster, camera: CameraController) -> Self {
        Shell {
            manager,
            camera,
            roster,
            index: 0,
            selected: None,
            picker: Picker::default(),
            notices: Vec::new(),
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn take_notices(&mut self) -> Vec<String> {
        std::mem::take(&mut self.notices)
    }

    /// Shows the first actor, by roster index or name. Entries that fail to
    /// build are reported and skipped in roster order.
    pub fn start(&mut self, start: Option<&str>) -> Result<(), ShellError> {
        let first = match start {
            None => 0,
            Some(key) => match key.parse::<usize>() {
                Ok(index) if index < self.roster.len() => index,
                _ => self
                    .roster
                    .position(key)
                    .ok_or_else(|| ShellError::UnknownActor(key.to_string()))?,
            },
        };
        let len = self.roster.len();
        for step in 0..len {
            if self.show((first + step) % len) {
                return Ok(());
            }
        }
        Err(ShellError::NothingBuilt)
    }

    pub fn handle(&mut self, line: &str) -> Result<Flow, ShellError> {
        let mut words = line.split_whitespace();
        let Some(command) = words.next() else {
            return Ok(Flow::Continue);
        };
        if command.starts_with('#') {
            return Ok(Flow::Continue);
        }

        match command {
            "space" => self.cycle(1),
            "shift-space" | "backspace" => self.cycle(-1),
            "s" => self.manager.toggle_part_visibility(Region::Shadow),
            "control-b" => self.manager.toggle_part_visibility(Region::Body),
            "control-h" => self.manager.toggle_part_visibility(Region::Head),
            "a" => self.set_picker_open(!self.picker.open),
            "p" => self.toggle_pose(),
            "b" => self.manager.toggle_animation_smoothing(),
            "k" => self.toggle_skeletal(),
            "f" => self.manager.flip_head(),
            "tab" => self.cycle_part(),
            "r" => {
                self.camera.reset_roll();
                self.sync_camera();
            }
            "control-z" => {
                self.camera.reset();
                self.sync_camera();
            }
            "wheel_up" => self.wheel(-1, 1),
            "wheel_down" => self.wheel(1, -1),
            "enter" => self.pick(),
            "play" => {
                let animation = words.next().ok_or(ShellError::MissingArgument {
                    command: "play",
                    argument: "an animation name",
                })?;
                let frame = words
                    .next()
                    .map(|value| parse_number::<u32>("play", value))
                    .transpose()?;
                if let Some(part) = self.selected_part() {
                    self.manager.animate(animation, part, frame);
                }
            }
            "tick" => {
                let seconds = words.next().ok_or(ShellError::MissingArgument {
                    command: "tick",
                    argument: "a duration in seconds",
                })?;
                let dt: f32 = parse_number("tick", seconds)?;
                self.manager.update(dt);
            }
            "mouse1" | "mouse2" | "mouse3" => {
                let mode = drag_mode(command);
                if !self.camera.begin_drag(mode) {
                    debug!("camera drag {mode:?} refused");
                }
            }
            "mouse1-up" | "mouse2-up" | "mouse3-up" => {
                let mode = drag_mode(command.trim_end_matches("-up"));
                self.camera.end_drag(mode);
            }
            "move" => {
                let (Some(dx), Some(dy)) = (words.next(), words.next()) else {
                    return Err(ShellError::MissingArgument {
                        command: "move",
                        argument: "an x and y offset",
                    });
                };
                let delta = Vec2::new(parse_number("move", dx)?, parse_number("move", dy)?);
                self.camera.drag(delta);
                self.sync_camera();
            }
            "status" => {
                let report = serde_json::to_string_pretty(&self.status())?;
                self.notices.push(report);
            }
            "quit" | "exit" | "escape" => return Ok(Flow::Quit),
            other => return Err(ShellError::UnknownCommand(other.to_string())),
        }
        Ok(Flow::Continue)
    }

    pub fn status(&self) -> StatusReport {
        let descriptor = self.manager.descriptor();
        let parts = self
            .manager
            .parts()
            .ids()
            .filter_map(|id| {
                let name = self.manager.parts().name(id)?.to_string();
                let state = self.manager.part_state(id)?;
                let mode = match state.phase() {
                    PartPhase::Idle => "idle",
                    PartPhase::Looping(_) => "looping",
                    PartPhase::Posed(..) => "posed",
                };
                Some(PartReport {
                    name,
                    mode,
                    posed: state.posed,
                    animation: self.manager.current_animation(id),
                    frame: self.manager.current_frame(id),
                })
            })
            .collect();

        StatusReport {
            actor: descriptor.map(|d| d.name().to_string()),
            kind: descriptor.map(|d| d.kind_label()),
            index: self.index,
            roster_len: self.roster.len(),
            skeletal: self.manager.is_skeletal(),
            selected_part: self
                .selected_part()
                .and_then(|id| self.manager.parts().name(id))
                .map(str::to_string),
            parts,
            head_visible: self.manager.part_visibility(Region::Head),
            body_visible: self.manager.part_visibility(Region::Body),
            shadow_visible: self.manager.part_visibility(Region::Shadow),
            smoothing: self.manager.is_animation_smoothed(),
            head_rotation: self.manager.head_rotation(),
            picker: PickerReport {
                open: self.picker.open,
                items: self.picker.items.clone(),
                highlighted: self.picker.highlighted().map(str::to_string),
            },
            camera_enabled: self.camera.is_enabled(),
            camera_drag: self.camera.drag_mode(),
            camera: self.camera.pose(),
        }
    }

    /// The selected part of the live actor, falling back to its first part.
    pub fn selected_part(&self) -> Option<PartId> {
        self.selected
            .as_deref()
            .and_then(|name| self.manager.part(name))
            .or_else(|| self.manager.first_part())
    }

    fn show(&mut self, index: usize) -> bool {
        let Some(descriptor) = self.roster.get(index).cloned() else {
            return false;
        };
        match self.manager.set_descriptor(descriptor, false) {
            Ok(()) => {
                self.index = index;
                self.refresh_picker();
                let name = self
                    .manager
                    .descriptor()
                    .map(|d| d.name().to_string())
                    .unwrap_or_default();
                self.notices
                    .push(format!("[{}/{}] {name}", index + 1, self.roster.len()));
                true
            }
            Err(err) => {
                warn!("{err}");
                self.notices.push(format!("Could not show actor: {err}"));
                false
            }
        }
    }

    fn cycle(&mut self, step: isize) {
        let len = self.roster.len();
        if len == 0 {
            return;
        }
        let next = (self.index as isize + step).rem_euclid(len as isize) as usize;
        self.show(next);
    }

    fn toggle_skeletal(&mut self) {
        let enabled = !self.manager.is_skeletal();
        match self.manager.toggle_skeletal_variant(enabled) {
            Ok(()) => {
                info!("skeletal mode {}", if enabled { "on" } else { "off" });
                self.refresh_picker();
            }
            Err(err) => {
                warn!("{err}");
                self.notices
                    .push(format!("Could not switch skeletal form: {err}"));
            }
        }
    }

    fn toggle_pose(&mut self) {
        let Some(part) = self.selected_part() else {
            return;
        };
        self.manager.toggle_pose(part);
        if self.manager.is_posed(part) {
            self.set_picker_open(false);
        }
    }

    fn cycle_part(&mut self) {
        let ids: Vec<PartId> = self.manager.parts().ids().collect();
        if ids.is_empty() {
            return;
        }
        let current = self
            .selected_part()
            .and_then(|id| ids.iter().position(|candidate| *candidate == id))
            .unwrap_or(0);
        let next = ids[(current + 1) % ids.len()];
        self.selected = self.manager.parts().name(next).map(str::to_string);
        if let Some(name) = &self.selected {
            self.notices.push(format!("Selected part {name}"));
        }
        self.refresh_picker();
    }

    fn set_picker_open(&mut self, open: bool) {
        self.picker.open = open;
        if open {
            self.camera.disable();
        } else {
            self.camera.enable();
        }
    }

    fn refresh_picker(&mut self) {
        let hide_lose = matches!(
            self.manager.descriptor().map(|d| d.kind()),
            Some(ActorKind::Cog(_) | ActorKind::Skelecog(_))
        );
        let items = match self.selected_part() {
            Some(part) => self
                .manager
                .animation_names(part)
                .iter()
                .filter(|name| !(hide_lose && HIDDEN_COG_ANIMATIONS.contains(&name.as_str())))
                .cloned()
                .collect(),
            None => Vec::new(),
        };
        self.picker.items = items;
        self.picker.cursor = 0;
    }

    /// Scrolls the picker when it is open, otherwise steps the pose.
    fn wheel(&mut self, scroll: isize, frames: i32) {
        if self.picker.open {
            self.picker.scroll(scroll);
        } else if let Some(part) = self.selected_part() {
            self.manager.increment_pose(frames, part);
        }
    }

    fn pick(&mut self) {
        if !self.picker.open {
            return;
        }
        let (Some(animation), Some(part)) = (
            self.picker.highlighted().map(str::to_string),
            self.selected_part(),
        ) else {
            return;
        };
        self.manager.animate(&animation, part, None);
    }

    fn sync_camera(&mut self) {
        self.camera.apply(self.manager.scene_mut());
    }
}

fn drag_mode(button: &str) -> DragMode {
    match button {
        "mouse1" => DragMode::Pan,
        "mouse2" => DragMode::Rotate,
        _ => DragMode::Zoom,
    }
}

fn parse_number<T: std::str::FromStr>(command: &'static str, value: &str) -> Result<T, ShellError> {
    value.parse().map_err(|_| ShellError::InvalidNumber {
        command,
        value: value.to_string(),
    })
}
