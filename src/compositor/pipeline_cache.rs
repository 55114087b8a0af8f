use std::collections::HashMap;

use crate::{color::color_state::ColorState, gpu::backend::Pipeline};

/// Usage a cached pipeline was built for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PipelineSlot {
    Unmasked,
    UnmaskedTower,
    Masked,
    MaskedTower,
    Unblended,
    UnblendedTower,
}

impl PipelineSlot {
    pub const ALL: [PipelineSlot; 6] = [
        PipelineSlot::Unmasked,
        PipelineSlot::UnmaskedTower,
        PipelineSlot::Masked,
        PipelineSlot::MaskedTower,
        PipelineSlot::Unblended,
        PipelineSlot::UnblendedTower,
    ];

    pub fn blended(masked: bool, tower: bool) -> Self {
        match (masked, tower) {
            (false, false) => Self::Unmasked,
            (false, true) => Self::UnmaskedTower,
            (true, false) => Self::Masked,
            (true, true) => Self::MaskedTower,
        }
    }

    pub fn unblended(tower: bool) -> Self {
        if tower {
            Self::UnblendedTower
        } else {
            Self::Unblended
        }
    }

    /// Pipelines sampling the pre-converted mipmap level.
    pub fn is_tower(self) -> bool {
        matches!(
            self,
            Self::UnmaskedTower | Self::MaskedTower | Self::UnblendedTower
        )
    }

    pub fn is_masked(self) -> bool {
        matches!(self, Self::Masked | Self::MaskedTower)
    }

    pub fn is_unblended(self) -> bool {
        matches!(self, Self::Unblended | Self::UnblendedTower)
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Unmasked => "shaped-texture-unmasked",
            Self::UnmaskedTower => "shaped-texture-unmasked-tower",
            Self::Masked => "shaped-texture-masked",
            Self::MaskedTower => "shaped-texture-masked-tower",
            Self::Unblended => "shaped-texture-unblended",
            Self::UnblendedTower => "shaped-texture-unblended-tower",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PipelineKey {
    pub slot: PipelineSlot,
    pub source: ColorState,
    pub target: ColorState,
}

impl PipelineKey {
    pub fn new(slot: PipelineSlot, source: ColorState, target: ColorState) -> Self {
        Self {
            slot,
            source,
            target,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PipelineCacheStats {
    pub hits: u64,
    pub builds: u64,
    pub resets: u64,
}

/// Pipelines of one surface, keyed by usage slot and the color states they convert between.
///
/// Entries only leave through [`PipelineCache::reset`].
#[derive(Debug, Default)]
pub struct PipelineCache {
    entries: HashMap<PipelineKey, Pipeline>,
    stats: PipelineCacheStats,
}

impl PipelineCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &PipelineKey) -> Option<&Pipeline> {
        self.entries.get(key)
    }

    /// Returns the cached pipeline for `key`, building and storing it on a miss.
    pub fn get_or_build(&mut self, key: PipelineKey, build: impl FnOnce() -> Pipeline) -> Pipeline {
        if let Some(p) = self.entries.get(&key) {
            self.stats.hits = self.stats.hits.saturating_add(1);
            return p.clone();
        }
        let pipeline = build();
        tracing::debug!(slot = key.slot.name(), id = pipeline.id(), "built pipeline");
        self.stats.builds = self.stats.builds.saturating_add(1);
        self.entries.insert(key, pipeline.clone());
        pipeline
    }

    pub fn reset(&mut self) {
        if self.entries.is_empty() {
            return;
        }
        self.entries.clear();
        self.stats.resets = self.stats.resets.saturating_add(1);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn stats(&self) -> PipelineCacheStats {
        self.stats.clone()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/compositor/pipeline_cache.rs"]
mod tests;
