use crate::mesh::{element::Dimension, Mesh};

use std::collections::BTreeSet;
use std::fmt;

/// One face of a Mesh's bounding box
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Face {
    MinX,
    MaxX,
    MinY,
    MaxY,
    MinZ,
    MaxZ,
}

impl Face {
    pub const PLANAR: [Self; 4] = [Self::MinX, Self::MaxX, Self::MinY, Self::MaxY];
    pub const ALL: [Self; 6] = [
        Self::MinX,
        Self::MaxX,
        Self::MinY,
        Self::MaxY,
        Self::MinZ,
        Self::MaxZ,
    ];

    /// The Faces that exist for a given [Dimension] (in deck order)
    pub fn of(dimension: Dimension) -> &'static [Self] {
        match dimension {
            Dimension::Two => &Self::PLANAR,
            Dimension::Three => &Self::ALL,
        }
    }

    pub const fn axis(&self) -> usize {
        match self {
            Self::MinX | Self::MaxX => 0,
            Self::MinY | Self::MaxY => 1,
            Self::MinZ | Self::MaxZ => 2,
        }
    }

    pub const fn is_min(&self) -> bool {
        matches!(self, Self::MinX | Self::MinY | Self::MinZ)
    }

    /// Name of the node set holding this Face's Nodes in a solver deck
    pub const fn nset_name(&self) -> &'static str {
        match self {
            Self::MinX => "NMINX",
            Self::MaxX => "NMAXX",
            Self::MinY => "NMINY",
            Self::MaxY => "NMAXY",
            Self::MinZ => "NMINZ",
            Self::MaxZ => "NMAXZ",
        }
    }
}

impl fmt::Display for Face {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.nset_name())
    }
}

/// Node ids lying on each face of a Mesh's bounding box
///
/// A Node sits on a face when its coordinate along the face's axis is within an absolute tolerance of the bounding box
/// limit. Edge and corner Nodes belong to several sets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoundaryNodeSets {
    dimension: Dimension,
    sets: [BTreeSet<usize>; 6],
}

impl BoundaryNodeSets {
    /// Collect the boundary Nodes of `mesh`
    ///
    /// Faces along z are only extracted for three dimensional meshes
    pub fn extract(mesh: &Mesh, tolerance: f64) -> Self {
        let dimension = mesh.dimension();
        let faces = Face::of(dimension);
        let bbox = mesh.bbox();
        let mut sets: [BTreeSet<usize>; 6] = Default::default();

        for (id, point) in mesh.nodes() {
            for face in faces {
                let axis = face.axis();
                let limit = if face.is_min() {
                    bbox.min[axis]
                } else {
                    bbox.max[axis]
                };

                if (point[axis] - limit).abs() < tolerance {
                    sets[*face as usize].insert(id);
                }
            }
        }

        Self { dimension, sets }
    }

    pub fn dimension(&self) -> Dimension {
        self.dimension
    }

    /// Node ids on a face, ascending
    pub fn get(&self, face: Face) -> &BTreeSet<usize> {
        &self.sets[face as usize]
    }

    /// Iterate over the extracted faces and their Node ids
    pub fn iter(&self) -> impl Iterator<Item = (Face, &BTreeSet<usize>)> + '_ {
        Face::of(self.dimension)
            .iter()
            .map(move |face| (*face, self.get(*face)))
    }
}
