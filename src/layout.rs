use crate::config::PipelineConfig;
use crate::mesh::region::Region;

use geometry::{Disk, Point};
use json::JsonValue;
use std::ffi::OsString;
use std::fs::read_to_string;
use std::path::{Component, Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LayoutError {
    #[error("No inclusion layout for {}: expected {}", .mesh.display(), .expected.display())]
    MissingInclusionData { mesh: PathBuf, expected: PathBuf },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Unable to parse inclusion layout as JSON: {0}")]
    Json(#[from] json::Error),

    #[error("Invalid inclusion layout: {0}")]
    InvalidField(String),
}

/// Parametric description of an RVE: the edge length of the (unpadded) square and the circular inclusions inside it
///
/// Layout files store the particles as parallel arrays; `z` is optional:
/// ```JSON
/// {
///     "box_size": 10.0,
///     "particles": {
///         "x": [5.0, 8.5],
///         "y": [5.0, 8.5],
///         "radius": [2.0, 1.0]
///     }
/// }
/// ```
/// The position of a particle in the arrays defines its inclusion number (the first particle is `Inclusion_1`).
#[derive(Debug, Clone, PartialEq)]
pub struct InclusionLayout {
    pub box_size: f64,
    pub particles: Vec<Disk>,
}

impl InclusionLayout {
    pub fn new(box_size: f64, particles: Vec<Disk>) -> Self {
        Self {
            box_size,
            particles,
        }
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, LayoutError> {
        let contents = read_to_string(path.as_ref())?;
        Self::from_json(&json::parse(&contents)?)
    }

    /// Load the layout that belongs to a mesh file (see [layout_path_for])
    pub fn for_mesh(mesh_path: impl AsRef<Path>, config: &PipelineConfig) -> Result<Self, LayoutError> {
        let expected = layout_path_for(mesh_path.as_ref(), config);
        if !expected.is_file() {
            return Err(LayoutError::MissingInclusionData {
                mesh: mesh_path.as_ref().to_path_buf(),
                expected,
            });
        }
        Self::from_file(expected)
    }

    pub fn from_json(layout_json: &JsonValue) -> Result<Self, LayoutError> {
        let box_size = layout_json["box_size"]
            .as_f64()
            .filter(|b| b.is_finite() && *b > 0.0)
            .ok_or_else(|| {
                LayoutError::InvalidField(String::from("box_size must be a positive number"))
            })?;

        let particles_json = &layout_json["particles"];
        let xs = number_column(particles_json, "x")?;
        let ys = number_column(particles_json, "y")?;
        let radii = number_column(particles_json, "radius")?;
        let zs = if particles_json["z"].is_null() {
            vec![0.0; xs.len()]
        } else {
            number_column(particles_json, "z")?
        };

        if ys.len() != xs.len() || radii.len() != xs.len() || zs.len() != xs.len() {
            return Err(LayoutError::InvalidField(format!(
                "particle arrays must have equal lengths (x: {}, y: {}, radius: {}, z: {})",
                xs.len(),
                ys.len(),
                radii.len(),
                zs.len()
            )));
        }

        let particles = (0..xs.len())
            .map(|i| {
                if radii[i] < 0.0 {
                    Err(LayoutError::InvalidField(format!(
                        "particle {} has a negative radius",
                        i + 1
                    )))
                } else {
                    Ok(Disk::new(Point::at(xs[i], ys[i], zs[i]), radii[i]))
                }
            })
            .collect::<Result<Vec<Disk>, LayoutError>>()?;

        Ok(Self::new(box_size, particles))
    }

    pub fn num_inclusions(&self) -> usize {
        self.particles.len()
    }

    /// Is the xy-projection of `p` outside the closed square `[0, box_size] x [0, box_size]`?
    pub fn is_outside_box(&self, p: &Point) -> bool {
        !(0.0..=self.box_size).contains(&p.x()) || !(0.0..=self.box_size).contains(&p.y())
    }

    /// The first inclusion (in layout order) whose disk contains `p`
    ///
    /// Overlapping inclusions resolve to the lowest inclusion number.
    pub fn inclusion_containing(&self, p: &Point) -> Option<Region> {
        self.particles
            .iter()
            .position(|disk| disk.contains(p))
            .map(|idx| Region::Inclusion(idx + 1))
    }
}

/// Location of the layout file describing a mesh file
///
/// The extension is replaced by `config.layout_extension` and any directory named `config.model_dir_name` is swapped for
/// `config.definition_dir_name`, so `runs/RVE_model/a/rve_3.unv` maps onto `runs/RVE_definition/a/rve_3.json`.
pub fn layout_path_for(mesh_path: &Path, config: &PipelineConfig) -> PathBuf {
    let mut layout_path: PathBuf = mesh_path
        .components()
        .map(|component| match component {
            Component::Normal(name) if name == config.model_dir_name.as_str() => {
                Component::Normal(config.definition_dir_name.as_ref())
            }
            other => other,
        })
        .collect();

    layout_path.set_extension(OsString::from(&config.layout_extension));
    layout_path
}

fn number_column(particles_json: &JsonValue, key: &str) -> Result<Vec<f64>, LayoutError> {
    if !particles_json[key].is_array() {
        return Err(LayoutError::InvalidField(format!(
            "particles.{} must be an array",
            key
        )));
    }

    particles_json[key]
        .members()
        .map(|v| v.as_f64().filter(|v| v.is_finite()))
        .collect::<Option<Vec<f64>>>()
        .ok_or_else(|| LayoutError::InvalidField(format!("particles.{} must hold numbers", key)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::{create_dir_all, write};
    use tempfile::tempdir;

    const LAYOUT: &str = r#"{
        "box_size": 10.0,
        "particles": { "x": [5.0, 6.0], "y": [5.0, 5.0], "radius": [2.0, 2.0] }
    }"#;

    #[test]
    fn parse_layout() {
        let layout = InclusionLayout::from_json(&json::parse(LAYOUT).unwrap()).unwrap();
        assert_eq!(layout.box_size, 10.0);
        assert_eq!(layout.num_inclusions(), 2);
        assert_eq!(layout.particles[1].center, Point::at(6.0, 5.0, 0.0));
    }

    #[test]
    fn scenario_single_inclusion() {
        let layout = InclusionLayout::new(10.0, vec![Disk::new(Point::planar(5.0, 5.0), 2.0)]);

        assert_eq!(
            layout.inclusion_containing(&Point::planar(5.0, 5.0)),
            Some(Region::Inclusion(1))
        );
        assert_eq!(layout.inclusion_containing(&Point::planar(1.0, 1.0)), None);
        assert!(!layout.is_outside_box(&Point::planar(1.0, 1.0)));
        assert!(layout.is_outside_box(&Point::planar(15.0, 5.0)));
        assert!(!layout.is_outside_box(&Point::planar(10.0, 0.0)));
        assert!(layout.is_outside_box(&Point::planar(-1e-9, 5.0)));
    }

    #[test]
    fn overlapping_inclusions_pick_the_first() {
        let layout = InclusionLayout::from_json(&json::parse(LAYOUT).unwrap()).unwrap();
        assert_eq!(
            layout.inclusion_containing(&Point::planar(5.5, 5.0)),
            Some(Region::Inclusion(1))
        );
        assert_eq!(
            layout.inclusion_containing(&Point::planar(7.5, 5.0)),
            Some(Region::Inclusion(2))
        );
    }

    #[test]
    fn invalid_layouts() {
        for bad in [
            r#"{"particles": {"x": [], "y": [], "radius": []}}"#,
            r#"{"box_size": -1, "particles": {"x": [], "y": [], "radius": []}}"#,
            r#"{"box_size": 1, "particles": {"x": [1], "y": [], "radius": [1]}}"#,
            r#"{"box_size": 1, "particles": {"x": [1], "y": [1], "radius": [-1]}}"#,
            r#"{"box_size": 1, "particles": {"x": ["a"], "y": [1], "radius": [1]}}"#,
            r#"{"box_size": 1}"#,
        ] {
            assert!(
                matches!(
                    InclusionLayout::from_json(&json::parse(bad).unwrap()),
                    Err(LayoutError::InvalidField(_))
                ),
                "{} should be rejected",
                bad
            );
        }
    }

    #[test]
    fn path_mapping() {
        let cfg = PipelineConfig::default();
        assert_eq!(
            layout_path_for(Path::new("runs/RVE_model/a/rve_3.unv"), &cfg),
            PathBuf::from("runs/RVE_definition/a/rve_3.json")
        );
        assert_eq!(
            layout_path_for(Path::new("/data/rve_3.unv"), &cfg),
            PathBuf::from("/data/rve_3.json")
        );
    }

    #[test]
    fn missing_layout_is_reported() {
        let dir = tempdir().unwrap();
        let model_dir = dir.path().join("RVE_model");
        let definition_dir = dir.path().join("RVE_definition");
        create_dir_all(&model_dir).unwrap();
        create_dir_all(&definition_dir).unwrap();

        let cfg = PipelineConfig::default();
        let mesh_path = model_dir.join("rve_1.unv");
        match InclusionLayout::for_mesh(&mesh_path, &cfg) {
            Err(LayoutError::MissingInclusionData { expected, .. }) => {
                assert_eq!(expected, definition_dir.join("rve_1.json"))
            }
            other => panic!("expected a missing layout error, got {:?}", other),
        }

        write(definition_dir.join("rve_1.json"), LAYOUT).unwrap();
        assert_eq!(
            InclusionLayout::for_mesh(&mesh_path, &cfg)
                .unwrap()
                .num_inclusions(),
            2
        );
    }
}
