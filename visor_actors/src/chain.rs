//! One-shot-then-loop playback. Starting an animation from a frame other than
//! zero plays the tail of the clip once and only then hands the part over to
//! a perpetual loop, because clip boundaries are authored for zero-start
//! loops. The manager owns a single chain slot and drives it from `update`.

use crate::part::PartId;

#[derive(Debug, Clone, PartialEq, Default)]
pub enum ChainState {
    #[default]
    Idle,
    PlayingOneShot {
        part: PartId,
        animation: String,
        remaining: f32,
    },
    Looping {
        part: PartId,
        animation: String,
    },
}

/// The part that must now loop `animation` from frame zero.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoopHandoff {
    pub part: PartId,
    pub animation: String,
}

impl ChainState {
    pub fn one_shot(part: PartId, animation: &str, remaining: f32) -> Self {
        ChainState::PlayingOneShot {
            part,
            animation: animation.to_string(),
            remaining: remaining.max(0.0),
        }
    }

    pub fn is_playing(&self) -> bool {
        matches!(self, ChainState::PlayingOneShot { .. })
    }

    pub fn advance(&mut self, dt: f32) -> Option<LoopHandoff> {
        let ChainState::PlayingOneShot {
            part,
            animation,
            remaining,
        } = self
        else {
            return None;
        };
        *remaining -= dt;
        if *remaining > 0.0 {
            return None;
        }
        let handoff = LoopHandoff {
            part: *part,
            animation: std::mem::take(animation),
        };
        *self = ChainState::Looping {
            part: handoff.part,
            animation: handoff.animation.clone(),
        };
        Some(handoff)
    }

    /// Ends the chain before a new command is issued. A one-shot still
    /// running on a part other than `commanded` is returned so it can be
    /// switched to its loop right away; one on the commanded part is dropped
    /// because the new command replaces it.
    pub fn finish(&mut self, commanded: Option<PartId>) -> Option<LoopHandoff> {
        let previous = std::mem::take(self);
        match previous {
            ChainState::PlayingOneShot {
                part, animation, ..
            } if Some(part) != commanded => Some(LoopHandoff { part, animation }),
            _ => None,
        }
    }
}
