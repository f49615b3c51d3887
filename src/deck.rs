/// Companion `.e2a` file with the model extents
pub mod dims;
/// Abaqus input deck rendering
pub mod inp;

pub use dims::DimensionSummary;
pub use inp::DeckWriter;

use crate::boundary::BoundaryNodeSets;
use crate::classify::Classification;
use crate::config::PipelineConfig;
use crate::mesh::Mesh;

use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

/// Extension of the dimension-summary file written next to every deck
pub const DIMENSIONS_EXTENSION: &str = "e2a";

#[derive(Debug, Error)]
pub enum DeckError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Cannot write a deck for a mesh without nodes")]
    EmptyMesh,
}

/// Paths of the files produced by [write_model]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelFiles {
    pub deck: PathBuf,
    pub dimensions: PathBuf,
}

/// Default deck location for a mesh file: `dir/name.unv` -> `dir/name-model.inp`
pub fn default_deck_path(mesh_path: &Path) -> PathBuf {
    let stem = mesh_path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    mesh_path.with_file_name(format!("{}-model.inp", stem))
}

/// Extract the boundary node sets of `mesh`, then write its deck to `deck_path` and its dimension summary next to it
pub fn write_model(
    mesh: &Mesh,
    classification: Option<&Classification>,
    config: &PipelineConfig,
    deck_path: impl AsRef<Path>,
) -> Result<ModelFiles, DeckError> {
    let deck = deck_path.as_ref().to_path_buf();
    let dimensions = deck.with_extension(DIMENSIONS_EXTENSION);

    let boundary = BoundaryNodeSets::extract(mesh, config.boundary_tolerance);
    DeckWriter::new(mesh, classification, &boundary, config)?.write(&deck)?;
    DimensionSummary::new(mesh.bbox(), config.envelope_thickness).write(&dimensions)?;

    info!(deck = %deck.display(), dimensions = %dimensions.display(), "wrote model");

    Ok(ModelFiles { deck, dimensions })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::unv::read_unv;
    use std::fs::{read, read_to_string};
    use tempfile::tempdir;

    #[test]
    fn deck_path_from_mesh_path() {
        assert_eq!(
            default_deck_path(Path::new("runs/RVE_model/rve_3.unv")),
            PathBuf::from("runs/RVE_model/rve_3-model.inp")
        );
    }

    #[test]
    fn model_files_are_byte_identical_across_runs() {
        let dir = tempdir().unwrap();
        let mesh = read_unv("./test_input/RVE_model/rve_2d.unv").unwrap();
        let cfg = PipelineConfig {
            envelope_thickness: 2.0,
            ..PipelineConfig::default()
        };

        let first = write_model(&mesh, None, &cfg, dir.path().join("a.inp")).unwrap();
        let second = write_model(&mesh, None, &cfg, dir.path().join("b.inp")).unwrap();

        assert_eq!(first.dimensions, dir.path().join("a.e2a"));
        assert_eq!(read(&first.deck).unwrap(), read(&second.deck).unwrap());
        assert_eq!(
            read_to_string(&first.dimensions).unwrap(),
            "14.0\n14.0\n0.0\n2.0\n12.0\n-2.0\n12.0\n-2.0\n0.0\n0.0\n"
        );
    }
}
