use serde::{Deserialize, Serialize};

use crate::foundation::transform::MonitorTransform;

/// How a fractional rectangle snaps onto the integer pixel grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoundingStrategy {
    /// Round the origin up and the size down.
    Shrink,
    /// Round the extents outward so the result covers every touched pixel.
    #[default]
    Grow,
    /// Round origin and size to the nearest integer independently.
    Round,
}

/// Integer rectangle in pixel units. Width and height are never negative for rectangles produced
/// by this module.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct IntRect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl IntRect {
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub const fn from_size(width: i32, height: i32) -> Self {
        Self::new(0, 0, width, height)
    }

    pub fn x2(self) -> i32 {
        self.x + self.width
    }

    pub fn y2(self) -> i32 {
        self.y + self.height
    }

    pub fn is_empty(self) -> bool {
        self.width <= 0 || self.height <= 0
    }

    pub fn area(self) -> i64 {
        if self.is_empty() {
            return 0;
        }
        i64::from(self.width) * i64::from(self.height)
    }

    pub fn intersect(self, other: IntRect) -> Option<IntRect> {
        let x1 = self.x.max(other.x);
        let y1 = self.y.max(other.y);
        let x2 = self.x2().min(other.x2());
        let y2 = self.y2().min(other.y2());
        if x2 <= x1 || y2 <= y1 {
            return None;
        }
        Some(IntRect::new(x1, y1, x2 - x1, y2 - y1))
    }

    /// Bounding box of both rectangles. Empty inputs are ignored.
    pub fn union(self, other: IntRect) -> IntRect {
        if self.is_empty() {
            return other;
        }
        if other.is_empty() {
            return self;
        }
        let x1 = self.x.min(other.x);
        let y1 = self.y.min(other.y);
        let x2 = self.x2().max(other.x2());
        let y2 = self.y2().max(other.y2());
        IntRect::new(x1, y1, x2 - x1, y2 - y1)
    }

    pub fn contains_rect(self, other: IntRect) -> bool {
        other.x >= self.x && other.y >= self.y && other.x2() <= self.x2() && other.y2() <= self.y2()
    }

    pub fn translate(self, dx: i32, dy: i32) -> IntRect {
        IntRect::new(self.x + dx, self.y + dy, self.width, self.height)
    }

    /// Grows the rectangle by `amount` on every side.
    pub fn pad(self, amount: i32) -> IntRect {
        IntRect::new(
            self.x - amount,
            self.y - amount,
            self.width + 2 * amount,
            self.height + 2 * amount,
        )
    }

    pub fn to_kurbo(self) -> kurbo::Rect {
        kurbo::Rect::new(
            f64::from(self.x),
            f64::from(self.y),
            f64::from(self.x2()),
            f64::from(self.y2()),
        )
    }

    pub fn from_kurbo(rect: kurbo::Rect, strategy: RoundingStrategy) -> IntRect {
        let rect = rect.abs();
        match strategy {
            RoundingStrategy::Shrink => IntRect::new(
                rect.x0.ceil() as i32,
                rect.y0.ceil() as i32,
                rect.width().floor() as i32,
                rect.height().floor() as i32,
            ),
            RoundingStrategy::Grow => {
                let x0 = rect.x0.floor() as i32;
                let y0 = rect.y0.floor() as i32;
                let x1 = rect.x1.ceil() as i32;
                let y1 = rect.y1.ceil() as i32;
                IntRect::new(x0, y0, x1 - x0, y1 - y0)
            }
            RoundingStrategy::Round => IntRect::new(
                rect.x0.round() as i32,
                rect.y0.round() as i32,
                rect.width().round() as i32,
                rect.height().round() as i32,
            ),
        }
    }

    /// Scales origin and size by `scale`, then snaps with `strategy`.
    pub fn scale_double(self, scale: f64, strategy: RoundingStrategy) -> IntRect {
        let r = self.to_kurbo();
        let scaled = kurbo::Rect::new(r.x0 * scale, r.y0 * scale, r.x1 * scale, r.y1 * scale);
        IntRect::from_kurbo(scaled, strategy)
    }

    /// Maps a rectangle given in a `dst_width` x `dst_height` space into the space `src` was
    /// cropped from: scale by `src.size / dst`, then offset by `src.origin`, growing outward.
    pub fn crop_and_scale(self, src: kurbo::Rect, dst_width: i32, dst_height: i32) -> IntRect {
        let sx = src.width() / f64::from(dst_width);
        let sy = src.height() / f64::from(dst_height);
        let r = self.to_kurbo();
        let mapped = kurbo::Rect::new(
            r.x0 * sx + src.x0,
            r.y0 * sy + src.y0,
            r.x1 * sx + src.x0,
            r.y1 * sy + src.y0,
        );
        IntRect::from_kurbo(mapped, RoundingStrategy::Grow)
    }

    /// Applies a dihedral transform to a rectangle living in a `width` x `height` space. The
    /// result lives in the transformed space, whose dimensions are swapped for 90/270 rotations.
    pub fn transform(self, transform: MonitorTransform, width: i32, height: i32) -> IntRect {
        let IntRect {
            x,
            y,
            width: w,
            height: h,
        } = self;
        match transform {
            MonitorTransform::Normal => self,
            MonitorTransform::Rotate90 => IntRect::new(y, width - (x + w), h, w),
            MonitorTransform::Rotate180 => {
                IntRect::new(width - (x + w), height - (y + h), w, h)
            }
            MonitorTransform::Rotate270 => IntRect::new(height - (y + h), x, h, w),
            MonitorTransform::Flipped => IntRect::new(width - (x + w), y, w, h),
            MonitorTransform::Flipped90 => IntRect::new(y, x, h, w),
            MonitorTransform::Flipped180 => IntRect::new(x, height - (y + h), w, h),
            MonitorTransform::Flipped270 => {
                IntRect::new(height - (y + h), width - (x + w), h, w)
            }
        }
    }
}

impl std::fmt::Display for IntRect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}+{}+{}", self.width, self.height, self.x, self.y)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/geometry.rs"]
mod tests;
