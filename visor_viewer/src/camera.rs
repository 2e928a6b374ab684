//! Mouse-driven orbit camera. The camera hangs off a pivot node: rotating
//! spins the pivot, zooming and panning slide the camera inside the pivot's
//! frame. Offsets fed to [`CameraController::drag`] are in normalized window
//! units (-1..1 across the window).

use glam::{Quat, Vec2, Vec3};
use serde::Serialize;
use visor_actors::{NodeId, SceneBackend, Transform};

pub const DEFAULT_PIVOT: Vec3 = Vec3::new(0.0, 0.0, 4.2);
pub const DEFAULT_OFFSET: Vec3 = Vec3::new(0.0, -20.0, 0.0);
pub const DEFAULT_WINDOW: [u32; 2] = [800, 600];

const ORBIT_DIVISOR: f32 = 10.0;
const TRAVEL_SPEED: f32 = 5.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DragMode {
    Pan,
    Rotate,
    Zoom,
}

#[derive(Debug, Clone, Serialize)]
pub struct CameraPose {
    pub position: [f32; 3],
    pub pivot: [f32; 3],
    pub hpr: [f32; 3],
}

#[derive(Debug)]
pub struct CameraController {
    pivot_node: NodeId,
    camera_node: NodeId,
    window: Vec2,
    pivot: Vec3,
    /// Heading, pitch, roll of the pivot in degrees.
    hpr: Vec3,
    offset: Vec3,
    enabled: bool,
    drag: Option<DragMode>,
}

impl CameraController {
    /// Parents the scene camera under a fresh pivot node and puts both at
    /// the default pose.
    pub fn attach<S: SceneBackend + ?Sized>(scene: &mut S, window: [u32; 2]) -> Self {
        let root = scene.scene_root();
        let pivot_node = scene.create_node("camera_pivot", Some(root));
        let camera_node = scene.camera();
        scene.reparent(camera_node, Some(pivot_node));

        let mut controller = CameraController {
            pivot_node,
            camera_node,
            window: Vec2::new(window[0] as f32, window[1] as f32),
            pivot: DEFAULT_PIVOT,
            hpr: Vec3::ZERO,
            offset: DEFAULT_OFFSET,
            enabled: true,
            drag: None,
        };
        controller.reset();
        controller.apply(scene);
        controller
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn enable(&mut self) {
        self.enabled = true;
    }

    /// Stops mouse control; an active drag ends with it.
    pub fn disable(&mut self) {
        self.enabled = false;
        self.drag = None;
    }

    pub fn drag_mode(&self) -> Option<DragMode> {
        self.drag
    }

    /// Starts a drag unless control is disabled or another drag is running.
    pub fn begin_drag(&mut self, mode: DragMode) -> bool {
        if !self.enabled || self.drag.is_some() {
            return false;
        }
        self.drag = Some(mode);
        true
    }

    pub fn end_drag(&mut self, mode: DragMode) {
        if self.drag == Some(mode) {
            self.drag = None;
        }
    }

    /// Applies one mouse movement to whichever drag is active.
    pub fn drag(&mut self, delta: Vec2) {
        match self.drag {
            Some(DragMode::Rotate) => {
                self.hpr.x -= delta.x * self.window.x / ORBIT_DIVISOR;
                self.hpr.y += delta.y * self.window.y / ORBIT_DIVISOR;
            }
            Some(DragMode::Zoom) => {
                self.offset += Vec3::Y * delta.y * TRAVEL_SPEED;
            }
            Some(DragMode::Pan) => {
                self.offset += Vec3::X * delta.x * TRAVEL_SPEED;
                self.offset += Vec3::Z * delta.y * TRAVEL_SPEED;
            }
            None => {}
        }
    }

    pub fn reset_roll(&mut self) {
        self.hpr.z = 0.0;
    }

    pub fn reset(&mut self) {
        self.pivot = DEFAULT_PIVOT;
        self.hpr = Vec3::ZERO;
        self.offset = DEFAULT_OFFSET;
    }

    pub fn orientation(&self) -> Quat {
        let yaw_z = Quat::from_rotation_z(self.hpr.x.to_radians());
        let pitch_x = Quat::from_rotation_x(self.hpr.y.to_radians());
        let roll_y = Quat::from_rotation_y(self.hpr.z.to_radians());
        yaw_z * pitch_x * roll_y
    }

    /// Camera position in world space.
    pub fn eye(&self) -> Vec3 {
        self.pivot + self.orientation() * self.offset
    }

    pub fn pose(&self) -> CameraPose {
        CameraPose {
            position: self.eye().to_array(),
            pivot: self.pivot.to_array(),
            hpr: self.hpr.to_array(),
        }
    }

    /// Pushes the current pose onto the pivot and camera nodes.
    pub fn apply<S: SceneBackend + ?Sized>(&self, scene: &mut S) {
        scene.set_transform(
            self.pivot_node,
            Transform {
                pos: self.pivot.to_array(),
                hpr: self.hpr.to_array(),
                scale: [1.0; 3],
            },
        );
        scene.set_transform(
            self.camera_node,
            Transform {
                pos: self.offset.to_array(),
                hpr: [0.0; 3],
                scale: [1.0; 3],
            },
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use visor_actors::HeadlessScene;
    use visor_assets::MemoryAssets;

    const EPSILON: f32 = 1e-4;

    fn approx_eq(a: Vec3, b: Vec3) {
        assert!((a - b).length() <= EPSILON, "{a} != {b}");
    }

    fn controller() -> (HeadlessScene, CameraController) {
        let mut scene = HeadlessScene::new(Arc::new(MemoryAssets::new()));
        let camera = CameraController::attach(&mut scene, DEFAULT_WINDOW);
        (scene, camera)
    }

    #[test]
    fn default_pose_looks_from_behind_the_pivot() {
        let (scene, camera) = controller();
        approx_eq(camera.eye(), Vec3::new(0.0, -20.0, 4.2));
        let node = scene.node(scene.camera()).unwrap();
        assert_eq!(node.transform.unwrap().pos, [0.0, -20.0, 0.0]);
    }

    #[test]
    fn rotate_scales_by_window_size() {
        let (_, mut camera) = controller();
        assert!(camera.begin_drag(DragMode::Rotate));
        camera.drag(Vec2::new(0.1, 0.05));
        let pose = camera.pose();
        assert!((pose.hpr[0] + 8.0).abs() < EPSILON);
        assert!((pose.hpr[1] - 3.0).abs() < EPSILON);
    }

    #[test]
    fn heading_orbits_around_the_pivot() {
        let (_, mut camera) = controller();
        camera.begin_drag(DragMode::Rotate);
        camera.drag(Vec2::new(-90.0 / 80.0, 0.0));
        approx_eq(camera.eye(), Vec3::new(20.0, 0.0, 4.2));
    }

    #[test]
    fn zoom_and_pan_move_the_camera_inside_the_pivot() {
        let (_, mut camera) = controller();
        camera.begin_drag(DragMode::Zoom);
        camera.drag(Vec2::new(0.3, 0.2));
        approx_eq(camera.eye(), Vec3::new(0.0, -19.0, 4.2));
        camera.end_drag(DragMode::Zoom);

        camera.begin_drag(DragMode::Pan);
        camera.drag(Vec2::new(0.2, -0.2));
        approx_eq(camera.eye(), Vec3::new(1.0, -19.0, 3.2));

        camera.reset();
        approx_eq(camera.eye(), Vec3::new(0.0, -20.0, 4.2));
    }

    #[test]
    fn one_drag_at_a_time_and_none_while_disabled() {
        let (_, mut camera) = controller();
        assert!(camera.begin_drag(DragMode::Pan));
        assert!(!camera.begin_drag(DragMode::Zoom));
        camera.end_drag(DragMode::Zoom);
        assert_eq!(camera.drag_mode(), Some(DragMode::Pan));

        camera.disable();
        assert_eq!(camera.drag_mode(), None);
        assert!(!camera.begin_drag(DragMode::Rotate));
        camera.enable();
        assert!(camera.begin_drag(DragMode::Rotate));
    }
}
