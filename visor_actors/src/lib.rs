//! Actor layer of the viewer: descriptors for every kind of character, the
//! roster that lists them, the scene interface they are built through, and
//! the manager that keeps one live actor and its animation state.

pub mod animation;
pub mod chain;
pub mod descriptor;
pub mod error;
pub mod headless;
pub mod manager;
pub mod part;
pub mod roster;
pub mod scene;

pub use animation::{AnimationSet, MODEL_ROOT};
pub use descriptor::{ActorDescriptor, ActorKind, Department, SpecialNode};
pub use error::{ActorError, ResourceKind, SceneError};
pub use headless::HeadlessScene;
pub use manager::{ActorManager, Region};
pub use part::{PartId, PartPhase, PartState};
pub use roster::{Roster, RosterGroup};
pub use scene::{ActorId, NodeId, Rgba, SceneBackend, TextureId, Transform};
