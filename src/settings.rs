use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::foundation::error::{TexcompError, TexcompResult};

/// Tunables for surface painting.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CompositorSettings {
    /// Sample a half-size level when a surface is drawn much smaller than its buffer.
    pub create_mipmaps: bool,
    /// Above this many blended rectangles the opaque/blended split is abandoned.
    pub max_blend_rects: usize,
    /// Smallest buffer edge, in pixels, that gets a mipmap.
    pub min_mipmap_size: u32,
    /// Downscale factor both axes must exceed before the mipmap is used.
    pub mipmap_downscale_threshold: f64,
    /// Damage rate above which a surface counts as fast-updating.
    pub max_mipmapping_fps: u32,
    /// Consecutive fast updates after which mipmapping pauses.
    pub min_fast_updates_before_unmipmap: u32,
}

impl Default for CompositorSettings {
    fn default() -> Self {
        Self {
            create_mipmaps: true,
            max_blend_rects: 16,
            min_mipmap_size: 8,
            mipmap_downscale_threshold: 2.0,
            max_mipmapping_fps: 5,
            min_fast_updates_before_unmipmap: 20,
        }
    }
}

impl CompositorSettings {
    pub fn from_json_str(s: &str) -> TexcompResult<Self> {
        let settings: Self = serde_json::from_str(s)
            .map_err(|e| TexcompError::serde(format!("settings JSON parse error: {e}")))?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn from_path(path: &Path) -> TexcompResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            TexcompError::Other(anyhow::Error::new(e).context(format!("read {}", path.display())))
        })?;
        Self::from_json_str(&text)
    }

    pub fn validate(&self) -> TexcompResult<()> {
        if self.max_blend_rects == 0 {
            return Err(TexcompError::validation("max_blend_rects must be > 0"));
        }
        if !self.mipmap_downscale_threshold.is_finite() || self.mipmap_downscale_threshold < 1.0 {
            return Err(TexcompError::validation(
                "mipmap_downscale_threshold must be finite and >= 1",
            ));
        }
        if self.max_mipmapping_fps == 0 {
            return Err(TexcompError::validation("max_mipmapping_fps must be > 0"));
        }
        Ok(())
    }

    /// Minimum interval between updates of a surface that is not fast-updating.
    pub fn min_update_interval(&self) -> std::time::Duration {
        std::time::Duration::from_micros(1_000_000 / u64::from(self.max_mipmapping_fps.max(1)))
    }
}

#[cfg(test)]
#[path = "../tests/unit/settings.rs"]
mod tests;
