use std::fmt;
use std::ops::{Add, Div, Index, Sub};

/// A location in Real Space
///
/// Two dimensional meshes still carry three coordinates (the legacy mesh format always stores x, y and z); their z component is simply zero.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Point {
    inner: [f64; 3],
}

impl Point {
    pub const fn at(x: f64, y: f64, z: f64) -> Self {
        Self { inner: [x, y, z] }
    }

    pub const fn from([x, y, z]: [f64; 3]) -> Self {
        Self { inner: [x, y, z] }
    }

    pub const fn planar(x: f64, y: f64) -> Self {
        Self {
            inner: [x, y, 0.0],
        }
    }

    pub fn x(&self) -> f64 {
        self.inner[0]
    }

    pub fn y(&self) -> f64 {
        self.inner[1]
    }

    pub fn z(&self) -> f64 {
        self.inner[2]
    }

    pub fn coords(&self) -> [f64; 3] {
        self.inner
    }

    /// Projection onto the xy-plane (the z component is dropped)
    pub fn to_planar(self) -> Self {
        Self::planar(self.inner[0], self.inner[1])
    }

    /// Euclidean distance between the xy-projections of two points
    pub fn planar_dist(&self, other: &Self) -> f64 {
        let dx = self[0] - other[0];
        let dy = self[1] - other[1];
        (dx * dx + dy * dy).sqrt()
    }

    /// Arithmetic mean of a collection of points
    ///
    /// Returns `None` for an empty collection
    pub fn centroid<'a>(points: impl IntoIterator<Item = &'a Point>) -> Option<Self> {
        let (sum, count) = points
            .into_iter()
            .fold((Self::default(), 0_usize), |(acc, n), p| (acc + *p, n + 1));

        if count == 0 {
            None
        } else {
            Some(sum / count as f64)
        }
    }
}

impl Default for Point {
    fn default() -> Self {
        Self { inner: [0.0; 3] }
    }
}

impl Index<usize> for Point {
    type Output = f64;
    fn index(&self, index: usize) -> &Self::Output {
        &self.inner[index]
    }
}

impl Add for Point {
    type Output = Self;
    fn add(self, other: Self) -> Self {
        Self {
            inner: [
                self[0] + other[0],
                self[1] + other[1],
                self[2] + other[2],
            ],
        }
    }
}

impl Sub for Point {
    type Output = Self;
    fn sub(self, other: Self) -> Self {
        Self {
            inner: [
                self[0] - other[0],
                self[1] - other[1],
                self[2] - other[2],
            ],
        }
    }
}

impl Div<f64> for Point {
    type Output = Self;
    fn div(self, divisor: f64) -> Self {
        Self {
            inner: [self[0] / divisor, self[1] / divisor, self[2] / divisor],
        }
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "({}, {}, {})", self[0], self[1], self[2])
    }
}
