use crate::mesh::element::ElementType;

use json::JsonValue;
use std::fs::read_to_string;
use std::path::Path;
use thiserror::Error;

/// Absolute tolerance used to decide whether a Node sits on a face of the bounding box
pub const DEFAULT_BOUNDARY_TOLERANCE: f64 = 1e-6;

/// Number of ids written on each data line of a `*Elset` or `*Nset` block
pub const DEFAULT_IDS_PER_LINE: usize = 16;

/// Positions of the three reference nodes, as multiples of the model's x-extent measured from its minimum x
pub const DEFAULT_REFERENCE_POINT_OFFSETS: [f64; 3] = [1.2, 1.4, 1.6];

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Unable to read configuration file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Unable to parse configuration file as JSON: {0}")]
    Json(#[from] json::Error),

    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: &'static str, message: String },
}

/// Every tunable of the pipeline, passed explicitly into each entry point
///
/// `PipelineConfig::default()` gives the values the pipeline was designed around; a JSON file can override any subset of them:
/// ```JSON
/// {
///     "boundary_tolerance": 1e-6,
///     "envelope_thickness": 0.0,
///     "envelope_element_types": ["quadrilateral"],
///     "group_refinement": true,
///     "mesh_extension": "unv",
///     "layout_extension": "json",
///     "model_dir_name": "RVE_model",
///     "definition_dir_name": "RVE_definition",
///     "workers": 8,
///     "error_log_name": "processing_errors.log",
///     "ids_per_line": 16,
///     "reference_point_offsets": [1.2, 1.4, 1.6]
/// }
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    pub boundary_tolerance: f64,
    /// Thickness of the padding around the RVE (recorded in the dimension summary)
    pub envelope_thickness: f64,
    /// Element shapes that are only ever used to mesh the padding region
    pub envelope_element_types: Vec<ElementType>,
    /// Classify whole mesh-native groups through one representative Element
    pub group_refinement: bool,
    pub mesh_extension: String,
    pub layout_extension: String,
    pub model_dir_name: String,
    pub definition_dir_name: String,
    /// Size of the batch worker pool (`None`: one worker per available hardware thread)
    pub workers: Option<usize>,
    pub error_log_name: String,
    pub ids_per_line: usize,
    pub reference_point_offsets: [f64; 3],
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            boundary_tolerance: DEFAULT_BOUNDARY_TOLERANCE,
            envelope_thickness: 0.0,
            envelope_element_types: vec![ElementType::Quadrilateral],
            group_refinement: true,
            mesh_extension: String::from("unv"),
            layout_extension: String::from("json"),
            model_dir_name: String::from("RVE_model"),
            definition_dir_name: String::from("RVE_definition"),
            workers: None,
            error_log_name: String::from("processing_errors.log"),
            ids_per_line: DEFAULT_IDS_PER_LINE,
            reference_point_offsets: DEFAULT_REFERENCE_POINT_OFFSETS,
        }
    }
}

impl PipelineConfig {
    /// Load a configuration from a JSON file. Keys that are absent keep their default value
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = read_to_string(path.as_ref())?;
        Self::from_json(&json::parse(&contents)?)
    }

    pub fn from_json(cfg_json: &JsonValue) -> Result<Self, ConfigError> {
        let mut cfg = Self::default();

        if !cfg_json.is_object() {
            return Err(ConfigError::InvalidValue {
                key: "<root>",
                message: String::from("configuration must be a JSON object"),
            });
        }

        if let Some(tol) = optional_f64(cfg_json, "boundary_tolerance")? {
            if tol <= 0.0 {
                return Err(invalid("boundary_tolerance", "must be positive"));
            }
            cfg.boundary_tolerance = tol;
        }
        if let Some(ep) = optional_f64(cfg_json, "envelope_thickness")? {
            if ep < 0.0 {
                return Err(invalid("envelope_thickness", "must not be negative"));
            }
            cfg.envelope_thickness = ep;
        }
        if !cfg_json["envelope_element_types"].is_null() {
            let key = "envelope_element_types";
            if !cfg_json[key].is_array() {
                return Err(invalid(key, "must be an array of element type names"));
            }
            cfg.envelope_element_types = cfg_json[key]
                .members()
                .map(|name| {
                    name.as_str()
                        .and_then(ElementType::from_name)
                        .ok_or_else(|| invalid(key, &format!("unknown element type {}", name)))
                })
                .collect::<Result<_, _>>()?;
        }
        if !cfg_json["group_refinement"].is_null() {
            cfg.group_refinement = cfg_json["group_refinement"]
                .as_bool()
                .ok_or_else(|| invalid("group_refinement", "must be a boolean"))?;
        }
        if let Some(ext) = optional_str(cfg_json, "mesh_extension")? {
            cfg.mesh_extension = ext;
        }
        if let Some(ext) = optional_str(cfg_json, "layout_extension")? {
            cfg.layout_extension = ext;
        }
        if let Some(dir) = optional_str(cfg_json, "model_dir_name")? {
            cfg.model_dir_name = dir;
        }
        if let Some(dir) = optional_str(cfg_json, "definition_dir_name")? {
            cfg.definition_dir_name = dir;
        }
        if !cfg_json["workers"].is_null() {
            let workers = cfg_json["workers"]
                .as_usize()
                .filter(|w| *w > 0)
                .ok_or_else(|| invalid("workers", "must be a positive integer"))?;
            cfg.workers = Some(workers);
        }
        if let Some(name) = optional_str(cfg_json, "error_log_name")? {
            cfg.error_log_name = name;
        }
        if !cfg_json["ids_per_line"].is_null() {
            cfg.ids_per_line = cfg_json["ids_per_line"]
                .as_usize()
                .filter(|n| *n > 0)
                .ok_or_else(|| invalid("ids_per_line", "must be a positive integer"))?;
        }
        if !cfg_json["reference_point_offsets"].is_null() {
            let key = "reference_point_offsets";
            let offsets: Vec<f64> = cfg_json[key]
                .members()
                .map(|v| v.as_f64())
                .collect::<Option<_>>()
                .ok_or_else(|| invalid(key, "must contain numbers"))?;
            cfg.reference_point_offsets = offsets
                .try_into()
                .map_err(|_| invalid(key, "must contain exactly 3 numbers"))?;
        }

        Ok(cfg)
    }

    /// Number of workers the batch pool should use
    pub fn worker_count(&self) -> usize {
        self.workers.unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1)
        })
    }
}

fn invalid(key: &'static str, message: &str) -> ConfigError {
    ConfigError::InvalidValue {
        key,
        message: message.to_string(),
    }
}

fn optional_f64(cfg_json: &JsonValue, key: &'static str) -> Result<Option<f64>, ConfigError> {
    let value = &cfg_json[key];
    if value.is_null() {
        Ok(None)
    } else {
        value
            .as_f64()
            .filter(|v| v.is_finite())
            .map(Some)
            .ok_or_else(|| invalid(key, "must be a finite number"))
    }
}

fn optional_str(cfg_json: &JsonValue, key: &'static str) -> Result<Option<String>, ConfigError> {
    let value = &cfg_json[key];
    if value.is_null() {
        Ok(None)
    } else {
        value
            .as_str()
            .filter(|s| !s.is_empty())
            .map(|s| Some(s.to_string()))
            .ok_or_else(|| invalid(key, "must be a non-empty string"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_object_gives_defaults() {
        let cfg = PipelineConfig::from_json(&json::parse("{}").unwrap()).unwrap();
        assert_eq!(cfg, PipelineConfig::default());
    }

    #[test]
    fn overrides() {
        let cfg = PipelineConfig::from_json(
            &json::parse(
                r#"{
                    "boundary_tolerance": 1e-4,
                    "envelope_thickness": 2.5,
                    "envelope_element_types": ["quad", "hexahedron"],
                    "group_refinement": false,
                    "workers": 3,
                    "ids_per_line": 8,
                    "reference_point_offsets": [2.0, 3.0, 4.0]
                }"#,
            )
            .unwrap(),
        )
        .unwrap();

        assert_eq!(cfg.boundary_tolerance, 1e-4);
        assert_eq!(cfg.envelope_thickness, 2.5);
        assert_eq!(
            cfg.envelope_element_types,
            vec![ElementType::Quadrilateral, ElementType::Hexahedron]
        );
        assert!(!cfg.group_refinement);
        assert_eq!(cfg.worker_count(), 3);
        assert_eq!(cfg.ids_per_line, 8);
        assert_eq!(cfg.reference_point_offsets, [2.0, 3.0, 4.0]);
        assert_eq!(cfg.mesh_extension, "unv");
    }

    #[test]
    fn bad_values_are_reported() {
        for bad in [
            r#"{"boundary_tolerance": -1.0}"#,
            r#"{"boundary_tolerance": "small"}"#,
            r#"{"envelope_element_types": ["prism"]}"#,
            r#"{"group_refinement": 1}"#,
            r#"{"workers": 0}"#,
            r#"{"reference_point_offsets": [1.0, 2.0]}"#,
            r#"[1, 2, 3]"#,
        ] {
            let res = PipelineConfig::from_json(&json::parse(bad).unwrap());
            assert!(
                matches!(res, Err(ConfigError::InvalidValue { .. })),
                "{} should be rejected",
                bad
            );
        }
    }

    #[test]
    fn available_parallelism_is_positive() {
        assert!(PipelineConfig::default().worker_count() >= 1);
    }
}
