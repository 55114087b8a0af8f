use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::foundation::geometry::{IntRect, RoundingStrategy};

type Span = (i32, i32);
type Spans = SmallVec<[Span; 8]>;

#[derive(Clone, Copy, Debug)]
enum SetOp {
    Union,
    Intersect,
    Subtract,
}

/// Set of pixels stored as y-x banded, non-overlapping rectangles.
///
/// Rectangles are sorted by band and then by x; horizontally touching spans are merged and
/// vertically adjacent bands with identical spans are coalesced, so two regions covering the
/// same pixels compare equal.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<IntRect>", into = "Vec<IntRect>")]
pub struct Region {
    rects: SmallVec<[IntRect; 4]>,
}

impl Region {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_rect(rect: IntRect) -> Self {
        let mut rects = SmallVec::new();
        if !rect.is_empty() {
            rects.push(rect);
        }
        Self { rects }
    }

    pub fn from_rects(rects: impl IntoIterator<Item = IntRect>) -> Self {
        let input: Vec<IntRect> = rects.into_iter().collect();
        Self {
            rects: combine(&input, &[], SetOp::Union),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rects.is_empty()
    }

    pub fn num_rectangles(&self) -> usize {
        self.rects.len()
    }

    /// # Panics
    /// Panics if `i >= num_rectangles()`.
    pub fn rectangle(&self, i: usize) -> IntRect {
        self.rects[i]
    }

    pub fn rects(&self) -> &[IntRect] {
        &self.rects
    }

    /// Bounding box of the region; the empty rectangle when the region is empty.
    pub fn extents(&self) -> IntRect {
        self.rects
            .iter()
            .fold(IntRect::default(), |acc, r| acc.union(*r))
    }

    pub fn area(&self) -> i64 {
        self.rects.iter().map(|r| r.area()).sum()
    }

    pub fn contains_point(&self, x: i32, y: i32) -> bool {
        self.rects
            .iter()
            .any(|r| x >= r.x && x < r.x2() && y >= r.y && y < r.y2())
    }

    pub fn contains_rect(&self, rect: IntRect) -> bool {
        Region::from_rect(rect).subtract(self).is_empty()
    }

    pub fn union(&self, other: &Region) -> Region {
        Region {
            rects: combine(&self.rects, &other.rects, SetOp::Union),
        }
    }

    pub fn union_rect(&self, rect: IntRect) -> Region {
        self.union(&Region::from_rect(rect))
    }

    pub fn intersect(&self, other: &Region) -> Region {
        Region {
            rects: combine(&self.rects, &other.rects, SetOp::Intersect),
        }
    }

    pub fn intersect_rect(&self, rect: IntRect) -> Region {
        self.intersect(&Region::from_rect(rect))
    }

    pub fn subtract(&self, other: &Region) -> Region {
        Region {
            rects: combine(&self.rects, &other.rects, SetOp::Subtract),
        }
    }

    pub fn subtract_rect(&self, rect: IntRect) -> Region {
        self.subtract(&Region::from_rect(rect))
    }

    pub fn translate(&self, dx: i32, dy: i32) -> Region {
        Region {
            rects: self.rects.iter().map(|r| r.translate(dx, dy)).collect(),
        }
    }

    /// Scales every rectangle and re-bands the result.
    pub fn scale(&self, scale: f64, strategy: RoundingStrategy) -> Region {
        if scale == 1.0 {
            return self.clone();
        }
        Region::from_rects(self.rects.iter().map(|r| r.scale_double(scale, strategy)))
    }
}

impl From<IntRect> for Region {
    fn from(rect: IntRect) -> Self {
        Region::from_rect(rect)
    }
}

impl From<Vec<IntRect>> for Region {
    fn from(rects: Vec<IntRect>) -> Self {
        Region::from_rects(rects)
    }
}

impl From<Region> for Vec<IntRect> {
    fn from(region: Region) -> Self {
        region.rects.into_vec()
    }
}

fn combine(a: &[IntRect], b: &[IntRect], op: SetOp) -> SmallVec<[IntRect; 4]> {
    let mut ys: Vec<i32> = a
        .iter()
        .chain(b.iter())
        .filter(|r| !r.is_empty())
        .flat_map(|r| [r.y, r.y2()])
        .collect();
    ys.sort_unstable();
    ys.dedup();

    let mut bands: Vec<(i32, i32, Spans)> = Vec::new();
    for w in ys.windows(2) {
        let (y0, y1) = (w[0], w[1]);
        let sa = spans_at(a, y0, y1);
        let sb = spans_at(b, y0, y1);
        let spans = match op {
            SetOp::Union => union_spans(&sa, &sb),
            SetOp::Intersect => intersect_spans(&sa, &sb),
            SetOp::Subtract => subtract_spans(&sa, &sb),
        };
        if spans.is_empty() {
            continue;
        }
        if let Some(last) = bands.last_mut()
            && last.1 == y0
            && last.2 == spans
        {
            last.1 = y1;
            continue;
        }
        bands.push((y0, y1, spans));
    }

    bands
        .into_iter()
        .flat_map(|(y0, y1, spans)| {
            spans
                .into_iter()
                .map(move |(x0, x1)| IntRect::new(x0, y0, x1 - x0, y1 - y0))
        })
        .collect()
}

fn spans_at(rects: &[IntRect], y0: i32, y1: i32) -> Spans {
    let mut spans: Spans = rects
        .iter()
        .filter(|r| !r.is_empty() && r.y <= y0 && r.y2() >= y1)
        .map(|r| (r.x, r.x2()))
        .collect();
    spans.sort_unstable();
    merge_sorted(spans)
}

fn merge_sorted(spans: Spans) -> Spans {
    let mut out = Spans::new();
    for (x0, x1) in spans {
        if let Some(last) = out.last_mut()
            && x0 <= last.1
        {
            last.1 = last.1.max(x1);
            continue;
        }
        out.push((x0, x1));
    }
    out
}

fn union_spans(a: &Spans, b: &Spans) -> Spans {
    let mut all: Spans = a.iter().chain(b.iter()).copied().collect();
    all.sort_unstable();
    merge_sorted(all)
}

fn intersect_spans(a: &Spans, b: &Spans) -> Spans {
    let mut out = Spans::new();
    let (mut i, mut j) = (0, 0);
    while i < a.len() && j < b.len() {
        let lo = a[i].0.max(b[j].0);
        let hi = a[i].1.min(b[j].1);
        if lo < hi {
            out.push((lo, hi));
        }
        if a[i].1 < b[j].1 {
            i += 1;
        } else {
            j += 1;
        }
    }
    out
}

fn subtract_spans(a: &Spans, b: &Spans) -> Spans {
    let mut out = Spans::new();
    for &(x0, x1) in a {
        let mut cur = x0;
        for &(b0, b1) in b {
            if b1 <= cur {
                continue;
            }
            if b0 >= x1 {
                break;
            }
            if b0 > cur {
                out.push((cur, b0));
            }
            cur = cur.max(b1);
            if cur >= x1 {
                break;
            }
        }
        if cur < x1 {
            out.push((cur, x1));
        }
    }
    out
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/region.rs"]
mod tests;
