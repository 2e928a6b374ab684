use serde::Serialize;

/// Validated handle to one part of the current actor instance.
///
/// Ids carry the generation of the instance they were resolved against, so a
/// handle kept across a rebuild stops matching instead of addressing
/// whichever part now sits at the same index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PartId {
    generation: u32,
    index: usize,
}

/// Per-part record owned by the manager. The engine's own playback queries
/// are unreliable mid one-shot, so this is the source of truth while posed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PartState {
    pub posed: bool,
    pub animation: Option<String>,
    pub frame: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PartPhase<'a> {
    Idle,
    Looping(&'a str),
    Posed(&'a str, u32),
}

impl PartState {
    pub fn phase(&self) -> PartPhase<'_> {
        match (&self.animation, self.posed) {
            (None, _) => PartPhase::Idle,
            (Some(animation), true) => PartPhase::Posed(animation, self.frame),
            (Some(animation), false) => PartPhase::Looping(animation),
        }
    }
}

#[derive(Debug, Clone)]
struct PartEntry {
    name: String,
    state: PartState,
}

/// Part names of one actor instance, resolved once when it is attached.
#[derive(Debug, Clone, Default)]
pub struct PartTable {
    generation: u32,
    entries: Vec<PartEntry>,
}

impl PartTable {
    pub fn new(generation: u32, names: impl IntoIterator<Item = String>) -> Self {
        let entries = names
            .into_iter()
            .map(|name| PartEntry {
                name,
                state: PartState::default(),
            })
            .collect();
        PartTable {
            generation,
            entries,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn resolve(&self, name: &str) -> Option<PartId> {
        self.entries
            .iter()
            .position(|entry| entry.name == name)
            .map(|index| self.id_at(index))
    }

    pub fn first(&self) -> Option<PartId> {
        (!self.entries.is_empty()).then(|| self.id_at(0))
    }

    pub fn ids(&self) -> impl Iterator<Item = PartId> + '_ {
        (0..self.entries.len()).map(|index| self.id_at(index))
    }

    pub fn name(&self, id: PartId) -> Option<&str> {
        self.entry(id).map(|entry| entry.name.as_str())
    }

    pub fn state(&self, id: PartId) -> Option<&PartState> {
        self.entry(id).map(|entry| &entry.state)
    }

    pub fn state_mut(&mut self, id: PartId) -> Option<&mut PartState> {
        if id.generation != self.generation {
            return None;
        }
        self.entries
            .get_mut(id.index)
            .map(|entry| &mut entry.state)
    }

    /// `(name, state)` pairs, used to carry state across a rebuild.
    pub fn snapshot(&self) -> Vec<(String, PartState)> {
        self.entries
            .iter()
            .map(|entry| (entry.name.clone(), entry.state.clone()))
            .collect()
    }

    fn id_at(&self, index: usize) -> PartId {
        PartId {
            generation: self.generation,
            index,
        }
    }

    fn entry(&self, id: PartId) -> Option<&PartEntry> {
        if id.generation != self.generation {
            return None;
        }
        self.entries.get(id.index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(generation: u32) -> PartTable {
        PartTable::new(
            generation,
            ["head", "torso", "leg"].into_iter().map(String::from),
        )
    }

    #[test]
    fn ids_from_an_older_generation_are_rejected() {
        let old = table(1);
        let id = old.resolve("torso").unwrap();
        let mut new = table(2);
        assert_eq!(new.name(id), None);
        assert!(new.state_mut(id).is_none());
        let fresh = new.resolve("torso").unwrap();
        assert_eq!(new.name(fresh), Some("torso"));
    }

    #[test]
    fn ids_address_every_entry_of_a_large_table() {
        let table = PartTable::new(1, (0..70_000).map(|i| format!("joint{i}")));
        let last = table.resolve("joint69999").unwrap();
        assert_eq!(table.name(last), Some("joint69999"));
        assert_eq!(table.ids().count(), 70_000);
        assert_ne!(last, table.resolve("joint4463").unwrap());
    }

    #[test]
    fn phase_follows_flags() {
        let mut state = PartState::default();
        assert_eq!(state.phase(), PartPhase::Idle);
        state.animation = Some("walk".into());
        assert_eq!(state.phase(), PartPhase::Looping("walk"));
        state.posed = true;
        state.frame = 7;
        assert_eq!(state.phase(), PartPhase::Posed("walk", 7));
    }
}
