use super::{Point, NUM_AXES};

/// Axis-aligned extents of a set of [Point]s, grown one point at a time
///
/// An empty box has `min = +inf` and `max = -inf` on every axis, so the first inserted point becomes both corners.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoundingBox {
    pub min: [f64; NUM_AXES],
    pub max: [f64; NUM_AXES],
}

impl BoundingBox {
    pub const fn empty() -> Self {
        Self {
            min: [f64::INFINITY; NUM_AXES],
            max: [f64::NEG_INFINITY; NUM_AXES],
        }
    }

    pub fn is_empty(&self) -> bool {
        (0..NUM_AXES).any(|axis| self.min[axis] > self.max[axis])
    }

    /// Grow the box so that it contains `p`
    pub fn include(&mut self, p: &Point) {
        for axis in 0..NUM_AXES {
            if p[axis] < self.min[axis] {
                self.min[axis] = p[axis];
            }
            if p[axis] > self.max[axis] {
                self.max[axis] = p[axis];
            }
        }
    }

    /// Length of the box along `axis` (zero for an empty box)
    pub fn extent(&self, axis: usize) -> f64 {
        if self.is_empty() {
            0.0
        } else {
            self.max[axis] - self.min[axis]
        }
    }

    pub fn contains(&self, p: &Point) -> bool {
        (0..NUM_AXES).all(|axis| p[axis] >= self.min[axis] && p[axis] <= self.max[axis])
    }
}

impl Default for BoundingBox {
    fn default() -> Self {
        Self::empty()
    }
}
