extern crate geometry;

/// Parallel annotation of every mesh file below a directory
pub mod batch;
/// Boundary node sets of a Mesh's bounding box
pub mod boundary;
/// Assignment of Elements to the Matrix, the Envelope or an inclusion
pub mod classify;
/// Explicit pipeline configuration and its defaults
pub mod config;
/// Abaqus input decks and their dimension-summary files
pub mod deck;
/// Parametric inclusion layouts of an RVE
pub mod layout;
/// Nodes, Elements and Element groups read from a mesh file
pub mod mesh;
/// The legacy line-oriented mesh format
pub mod unv;

pub use batch::{BatchReport, BatchRunner};
pub use boundary::{BoundaryNodeSets, Face};
pub use classify::{Classification, Classifier};
pub use config::PipelineConfig;
pub use deck::{write_model, DeckWriter, DimensionSummary};
pub use geometry::{BoundingBox, Disk, Point};
pub use layout::InclusionLayout;
pub use mesh::{region::Region, Mesh};
