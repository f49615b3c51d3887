use geometry::BoundingBox;

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Extents and absolute limits of a model, consumed by homogenization post-processing
///
/// Serialized one value per line in this order:
/// `len_x, len_y, len_z, ep, max_x, min_x, max_y, min_y, max_z, min_z`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DimensionSummary {
    pub lengths: [f64; 3],
    pub envelope_thickness: f64,
    pub min: [f64; 3],
    pub max: [f64; 3],
}

impl DimensionSummary {
    /// Summarize a bounding box. An empty box summarizes to zeros.
    pub fn new(bbox: &BoundingBox, envelope_thickness: f64) -> Self {
        if bbox.is_empty() {
            return Self {
                lengths: [0.0; 3],
                envelope_thickness,
                min: [0.0; 3],
                max: [0.0; 3],
            };
        }

        Self {
            lengths: [bbox.extent(0), bbox.extent(1), bbox.extent(2)],
            envelope_thickness,
            min: bbox.min,
            max: bbox.max,
        }
    }

    /// The ten values in file order
    pub fn values(&self) -> [f64; 10] {
        [
            self.lengths[0],
            self.lengths[1],
            self.lengths[2],
            self.envelope_thickness,
            self.max[0],
            self.min[0],
            self.max[1],
            self.min[1],
            self.max[2],
            self.min[2],
        ]
    }

    pub fn render<W: Write>(&self, w: &mut W) -> std::io::Result<()> {
        for value in self.values() {
            writeln!(w, "{:?}", value)?;
        }
        Ok(())
    }

    pub fn write(&self, path: impl AsRef<Path>) -> std::io::Result<()> {
        let f = File::create(path.as_ref())?;
        let mut w = BufWriter::new(&f);
        self.render(&mut w)?;
        w.flush()
    }
}
