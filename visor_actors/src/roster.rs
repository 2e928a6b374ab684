//! The list of actors the viewer cycles through, read from JSON.
//!
//! Cog sizes are written as the in-game height and turned into a scale with
//! the suit's base height. Animation sets are discovered through the asset
//! resolver once per file prefix and shared between every descriptor that
//! uses them.

use std::collections::HashMap;
use std::sync::Arc;

use log::{debug, info};
use serde::Deserialize;
use visor_assets::AssetResolver;

use crate::animation::AnimationSet;
use crate::descriptor::{
    goon, ActorDescriptor, ActorKind, BossAnimations, BossSpec, CogSpec, Department, GenericSpec,
    GoonSpec, SuitType,
};
use crate::error::ActorError;
use crate::scene::Rgba;

const BUILTIN_ROSTER: &str = include_str!("../data/roster.json");
const DEFAULT_HEAD_NODES: &str = "*";

#[derive(Debug, Deserialize)]
struct RosterFile {
    groups: Vec<GroupEntry>,
}

#[derive(Debug, Deserialize)]
struct GroupEntry {
    name: String,
    entries: Vec<ActorEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum ActorEntry {
    Cog {
        name: String,
        department: Department,
        suit: SuitType,
        height: f32,
        hand_color: Option<Rgba>,
        head_model: Option<String>,
        head_nodes: Option<Vec<String>>,
        head_color: Option<Rgba>,
        head_texture: Option<String>,
        #[serde(default)]
        supervisor: bool,
    },
    Boss {
        name: String,
        department: Department,
        #[serde(default = "unit_scale")]
        scale: f32,
    },
    Goon {
        name: String,
        #[serde(default = "white")]
        hat_color: Rgba,
        #[serde(default = "unit_scale")]
        scale: f32,
        #[serde(default)]
        security: bool,
    },
    Generic {
        name: String,
        model: String,
        animation_prefix: String,
        #[serde(default = "unit_scale")]
        scale: f32,
    },
    /// Lists an actor declared earlier in another group.
    Alias { name: String },
}

fn unit_scale() -> f32 {
    1.0
}

fn white() -> Rgba {
    Rgba::new(1.0, 1.0, 1.0, 1.0)
}

#[derive(Debug, Clone)]
pub struct RosterGroup {
    pub name: String,
    pub actors: Vec<Arc<ActorDescriptor>>,
}

#[derive(Debug, Clone, Default)]
pub struct Roster {
    groups: Vec<RosterGroup>,
    order: Vec<Arc<ActorDescriptor>>,
}

impl Roster {
    /// The roster bundled with the viewer.
    pub fn builtin<R>(assets: &R) -> Result<Self, ActorError>
    where
        R: AssetResolver + ?Sized,
    {
        Self::from_json(BUILTIN_ROSTER, assets)
    }

    pub fn from_json<R>(json: &str, assets: &R) -> Result<Self, ActorError>
    where
        R: AssetResolver + ?Sized,
    {
        let file: RosterFile = serde_json::from_str(json)?;
        let mut builder = Builder::new(assets);
        let mut groups = Vec::with_capacity(file.groups.len());
        for group in file.groups {
            let mut actors = Vec::with_capacity(group.entries.len());
            for entry in group.entries {
                actors.push(builder.resolve(entry)?);
            }
            groups.push(RosterGroup {
                name: group.name,
                actors,
            });
        }
        let roster = Self::from_groups(groups);
        info!(
            "roster: {} actor(s) in {} group(s)",
            roster.len(),
            roster.groups.len()
        );
        Ok(roster)
    }

    /// Cycling order is every distinct actor in first-listed order.
    pub fn from_groups(groups: Vec<RosterGroup>) -> Self {
        let mut order: Vec<Arc<ActorDescriptor>> = Vec::new();
        for actor in groups.iter().flat_map(|group| group.actors.iter()) {
            if !order.iter().any(|known| Arc::ptr_eq(known, actor)) {
                order.push(Arc::clone(actor));
            }
        }
        Roster { groups, order }
    }

    pub fn groups(&self) -> &[RosterGroup] {
        &self.groups
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Arc<ActorDescriptor>> {
        self.order.get(index)
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.order.iter().position(|actor| actor.name() == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<ActorDescriptor>> {
        self.order.iter()
    }
}

struct Builder<'a, R: ?Sized> {
    assets: &'a R,
    declared: HashMap<String, Arc<ActorDescriptor>>,
    animations: HashMap<String, Arc<AnimationSet>>,
    boss_animations: Option<Arc<BossAnimations>>,
}

impl<'a, R> Builder<'a, R>
where
    R: AssetResolver + ?Sized,
{
    fn new(assets: &'a R) -> Self {
        Builder {
            assets,
            declared: HashMap::new(),
            animations: HashMap::new(),
            boss_animations: None,
        }
    }

    fn resolve(&mut self, entry: ActorEntry) -> Result<Arc<ActorDescriptor>, ActorError> {
        if let ActorEntry::Alias { name } = &entry {
            return self
                .declared
                .get(name)
                .cloned()
                .ok_or_else(|| ActorError::RosterEntry {
                    name: name.clone(),
                    reason: "alias to an actor that is not declared earlier".to_string(),
                });
        }

        let descriptor = Arc::new(self.build(entry)?);
        let name = descriptor.name().to_string();
        if self.declared.contains_key(&name) {
            return Err(ActorError::RosterEntry {
                name,
                reason: "declared twice; list it again with an alias".to_string(),
            });
        }
        self.declared.insert(name, Arc::clone(&descriptor));
        Ok(descriptor)
    }

    fn build(&mut self, entry: ActorEntry) -> Result<ActorDescriptor, ActorError> {
        let descriptor = match entry {
            ActorEntry::Cog {
                name,
                department,
                suit,
                height,
                hand_color,
                head_model,
                head_nodes,
                head_color,
                head_texture,
                supervisor,
            } => {
                if height.is_nan() || height <= 0.0 {
                    return Err(ActorError::RosterEntry {
                        name,
                        reason: format!("height must be positive, got {height}"),
                    });
                }
                let animations = self.animation_set(&suit.animation_prefix())?;
                let spec = CogSpec {
                    department,
                    suit,
                    scale: height / suit.base_height(),
                    hand_color: hand_color.unwrap_or_else(|| department.hand_color()),
                    head_model: head_model
                        .unwrap_or_else(|| suit.default_head_model().to_string()),
                    head_nodes: head_nodes
                        .filter(|nodes| !nodes.is_empty())
                        .unwrap_or_else(|| vec![DEFAULT_HEAD_NODES.to_string()]),
                    head_color,
                    head_texture,
                    supervisor,
                    animations,
                };
                ActorDescriptor::new(name, ActorKind::Cog(spec))
            }
            ActorEntry::Boss {
                name,
                department,
                scale,
            } => {
                let animations = self.boss_animations()?;
                ActorDescriptor::new(
                    name,
                    ActorKind::Boss(BossSpec {
                        department,
                        scale,
                        animations,
                    }),
                )
            }
            ActorEntry::Goon {
                name,
                hat_color,
                scale,
                security,
            } => {
                let animations = self.animation_set(goon::ANIMATION_PREFIX)?;
                ActorDescriptor::new(
                    name,
                    ActorKind::Goon(GoonSpec {
                        hat_color,
                        scale,
                        security,
                        animations,
                    }),
                )
            }
            ActorEntry::Generic {
                name,
                model,
                animation_prefix,
                scale,
            } => {
                let animations = self.animation_set(&animation_prefix)?;
                ActorDescriptor::new(
                    name,
                    ActorKind::Generic(GenericSpec {
                        model,
                        animations,
                        scale,
                    }),
                )
            }
            ActorEntry::Alias { name } => {
                return Err(ActorError::RosterEntry {
                    name,
                    reason: "alias cannot be built directly".to_string(),
                })
            }
        };
        Ok(descriptor)
    }

    fn animation_set(&mut self, prefix: &str) -> Result<Arc<AnimationSet>, ActorError> {
        if let Some(set) = self.animations.get(prefix) {
            return Ok(Arc::clone(set));
        }
        let set = Arc::new(AnimationSet::discover(self.assets, prefix)?);
        debug!("{} animation(s) under prefix {prefix}", set.len());
        self.animations.insert(prefix.to_string(), Arc::clone(&set));
        Ok(set)
    }

    fn boss_animations(&mut self) -> Result<Arc<BossAnimations>, ActorError> {
        if let Some(set) = &self.boss_animations {
            return Ok(Arc::clone(set));
        }
        let set = Arc::new(BossAnimations::discover(self.assets)?);
        self.boss_animations = Some(Arc::clone(&set));
        Ok(set)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use visor_assets::MemoryAssets;

    fn assets() -> MemoryAssets {
        MemoryAssets::with_paths([
            "phase_4/models/char/tt_a_ene_cgb_walk.bam",
            "phase_4/models/char/tt_a_ene_cgb_neutral.bam",
            "phase_9/models/char/bossCog-head-Ff_neutral.bam",
        ])
    }

    #[test]
    fn builtin_roster_parses_and_dedupes_aliases() {
        let roster = Roster::builtin(&assets()).unwrap();
        let names: Vec<&str> = roster.groups().iter().map(|g| g.name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "supervisors",
                "sellbots",
                "cashbots",
                "lawbots",
                "bossbots",
                "bosses",
                "misc",
            ]
        );
        let listed: usize = roster.groups().iter().map(|g| g.actors.len()).sum();
        assert!(roster.len() < listed);
        let foreman = roster.position("Factory Foreman (Neutral)").unwrap();
        assert_eq!(foreman, 0);
        assert_eq!(
            roster.get(roster.len() - 1).unwrap().name(),
            "Sellbot Field Office"
        );
    }

    #[test]
    fn cog_height_becomes_scale_and_animations_are_shared() {
        let json = r#"{"groups": [{"name": "test", "entries": [
            {"kind": "cog", "name": "Telemarketer", "department": "sell", "suit": "b",
             "height": 5.29, "head_nodes": ["**/telemarketer"]},
            {"kind": "cog", "name": "Bean Counter", "department": "cash", "suit": "b",
             "height": 4.4, "hand_color": [1.0, 0.5, 0.6, 1.0]}
        ]}]}"#;
        let roster = Roster::from_json(json, &assets()).unwrap();
        let (ActorKind::Cog(first), ActorKind::Cog(second)) =
            (roster.get(0).unwrap().kind(), roster.get(1).unwrap().kind())
        else {
            panic!("expected cogs");
        };
        assert!((first.scale - 1.0).abs() < 1e-6);
        assert_eq!(first.hand_color, Department::Sell.hand_color());
        assert_eq!(second.hand_color, Rgba::new(1.0, 0.5, 0.6, 1.0));
        assert_eq!(second.head_nodes, vec!["*".to_string()]);
        assert_eq!(second.head_model, "phase_4/models/char/suitB-heads.bam");
        assert!(Arc::ptr_eq(&first.animations, &second.animations));
        assert_eq!(
            roster.get(0).unwrap().animation_names()["modelRoot"],
            vec!["neutral".to_string(), "walk".to_string()]
        );
    }

    #[test]
    fn bad_entries_are_reported_by_name() {
        let unknown_alias = r#"{"groups": [{"name": "x", "entries": [
            {"kind": "alias", "name": "Nobody"}]}]}"#;
        assert!(matches!(
            Roster::from_json(unknown_alias, &assets()),
            Err(ActorError::RosterEntry { name, .. }) if name == "Nobody"
        ));

        let flat = r#"{"groups": [{"name": "x", "entries": [
            {"kind": "cog", "name": "Flat", "department": "law", "suit": "a", "height": 0}]}]}"#;
        assert!(matches!(
            Roster::from_json(flat, &assets()),
            Err(ActorError::RosterEntry { .. })
        ));

        assert!(matches!(
            Roster::from_json("{\"groups\": 3}", &assets()),
            Err(ActorError::RosterFormat(_))
        ));
    }
}
