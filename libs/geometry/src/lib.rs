mod bounding_box;
mod disk;
mod point;

pub use bounding_box::BoundingBox;
pub use disk::Disk;
pub use point::Point;

/// Number of coordinate axes carried by every [Point]
pub const NUM_AXES: usize = 3;
