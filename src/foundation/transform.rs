use serde::{Deserialize, Serialize};

/// One of the eight rotation/mirror combinations a buffer can be presented with.
///
/// A buffer with transform `T` was produced by applying `T` to the content the compositor should
/// show; sampling a destination point therefore maps it through `T` into buffer space.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MonitorTransform {
    #[default]
    Normal,
    Rotate90,
    Rotate180,
    Rotate270,
    Flipped,
    Flipped90,
    Flipped180,
    Flipped270,
}

impl MonitorTransform {
    pub const ALL: [MonitorTransform; 8] = [
        MonitorTransform::Normal,
        MonitorTransform::Rotate90,
        MonitorTransform::Rotate180,
        MonitorTransform::Rotate270,
        MonitorTransform::Flipped,
        MonitorTransform::Flipped90,
        MonitorTransform::Flipped180,
        MonitorTransform::Flipped270,
    ];

    /// Maps the wire enumeration (`normal, 90, 180, 270, flipped, flipped-90, ...`).
    pub fn from_index(v: u32) -> Option<Self> {
        Self::ALL.get(v as usize).copied()
    }

    /// True when the transform swaps width and height.
    pub fn is_rotated(self) -> bool {
        matches!(
            self,
            Self::Rotate90 | Self::Rotate270 | Self::Flipped90 | Self::Flipped270
        )
    }

    pub fn is_flipped(self) -> bool {
        matches!(
            self,
            Self::Flipped | Self::Flipped90 | Self::Flipped180 | Self::Flipped270
        )
    }

    pub fn invert(self) -> Self {
        match self {
            Self::Rotate90 => Self::Rotate270,
            Self::Rotate270 => Self::Rotate90,
            other => other,
        }
    }

    /// The transform acting on the unit square, as a point map `[0,1]^2 -> [0,1]^2`.
    pub fn unit_affine(self) -> kurbo::Affine {
        let coeffs = match self {
            Self::Normal => [1.0, 0.0, 0.0, 1.0, 0.0, 0.0],
            Self::Rotate90 => [0.0, -1.0, 1.0, 0.0, 0.0, 1.0],
            Self::Rotate180 => [-1.0, 0.0, 0.0, -1.0, 1.0, 1.0],
            Self::Rotate270 => [0.0, 1.0, -1.0, 0.0, 1.0, 0.0],
            Self::Flipped => [-1.0, 0.0, 0.0, 1.0, 1.0, 0.0],
            Self::Flipped90 => [0.0, 1.0, 1.0, 0.0, 0.0, 0.0],
            Self::Flipped180 => [1.0, 0.0, 0.0, -1.0, 0.0, 1.0],
            Self::Flipped270 => [0.0, -1.0, -1.0, 0.0, 1.0, 1.0],
        };
        kurbo::Affine::new(coeffs)
    }

    /// Dimensions of a `width` x `height` area after the transform.
    pub fn transformed_size<T>(self, width: T, height: T) -> (T, T) {
        if self.is_rotated() {
            (height, width)
        } else {
            (width, height)
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/transform.rs"]
mod tests;
