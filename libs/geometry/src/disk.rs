use super::Point;

/// A circular region of the xy-plane
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Disk {
    pub center: Point,
    pub radius: f64,
}

impl Disk {
    pub const fn new(center: Point, radius: f64) -> Self {
        Self { center, radius }
    }

    /// Closed containment test on the xy-projection of `p` (points on the rim are inside)
    pub fn contains(&self, p: &Point) -> bool {
        self.center.planar_dist(p) <= self.radius
    }
}
