use smallvec::SmallVec;
use std::fmt;

/// Most Elements handled here have 8 or fewer nodes, so their connectivity lives on the stack
pub const EXPECTED_NODES_PER_ELEMENT: usize = 8;

/// Spatial dimension of a Mesh or of an Element type
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum Dimension {
    Two,
    Three,
}

impl Dimension {
    /// Number of coordinate axes that carry geometric information
    pub const fn num_axes(&self) -> usize {
        match self {
            Self::Two => 2,
            Self::Three => 3,
        }
    }
}

/// The closed set of Element shapes the pipeline understands, keyed by their numeric code in the legacy mesh format
///
/// Codes outside the set are kept as `Unknown(code)` instead of being coerced into a known shape.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ElementType {
    /// code 91: linear triangle
    Triangle,
    /// code 94: linear quadrilateral
    Quadrilateral,
    /// code 111: linear tetrahedron
    Tetrahedron,
    /// code 115: linear hexahedron
    Hexahedron,
    Unknown(u32),
}

impl ElementType {
    pub const fn from_code(code: u32) -> Self {
        match code {
            91 => Self::Triangle,
            94 => Self::Quadrilateral,
            111 => Self::Tetrahedron,
            115 => Self::Hexahedron,
            other => Self::Unknown(other),
        }
    }

    pub const fn code(&self) -> u32 {
        match self {
            Self::Triangle => 91,
            Self::Quadrilateral => 94,
            Self::Tetrahedron => 111,
            Self::Hexahedron => 115,
            Self::Unknown(code) => *code,
        }
    }

    pub const fn is_known(&self) -> bool {
        !matches!(self, Self::Unknown(_))
    }

    /// Number of nodes required by the shape (`None` for unknown shapes)
    pub const fn num_nodes(&self) -> Option<usize> {
        match self {
            Self::Triangle => Some(3),
            Self::Quadrilateral => Some(4),
            Self::Tetrahedron => Some(4),
            Self::Hexahedron => Some(8),
            Self::Unknown(_) => None,
        }
    }

    pub const fn dimension(&self) -> Option<Dimension> {
        match self {
            Self::Triangle | Self::Quadrilateral => Some(Dimension::Two),
            Self::Tetrahedron | Self::Hexahedron => Some(Dimension::Three),
            Self::Unknown(_) => None,
        }
    }

    /// Abaqus keyword used for the `*Element, type=` line
    ///
    /// 2D shapes map onto plane-stress continuum elements; the quadrilateral uses reduced integration.
    pub const fn abaqus_name(&self) -> Option<&'static str> {
        match self {
            Self::Triangle => Some("CPS3"),
            Self::Quadrilateral => Some("CPS4R"),
            Self::Tetrahedron => Some("C3D4"),
            Self::Hexahedron => Some("C3D8"),
            Self::Unknown(_) => None,
        }
    }

    /// Parse the lowercase names used in configuration files
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "triangle" => Some(Self::Triangle),
            "quadrilateral" | "quad" => Some(Self::Quadrilateral),
            "tetrahedron" | "tet" => Some(Self::Tetrahedron),
            "hexahedron" | "hex" => Some(Self::Hexahedron),
            _ => None,
        }
    }
}

impl fmt::Display for ElementType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Triangle => write!(f, "triangle"),
            Self::Quadrilateral => write!(f, "quadrilateral"),
            Self::Tetrahedron => write!(f, "tetrahedron"),
            Self::Hexahedron => write!(f, "hexahedron"),
            Self::Unknown(code) => write!(f, "unknown ({})", code),
        }
    }
}

/// A single Finite Element as read from a mesh file
#[derive(Clone, Debug, PartialEq)]
pub struct Element {
    pub id: usize,
    pub kind: ElementType,
    /// Node ids in the order given by the mesh file
    pub nodes: SmallVec<[usize; EXPECTED_NODES_PER_ELEMENT]>,
    /// The mesh generator's own partition id for this Element (if it assigned one)
    pub native_group: Option<usize>,
}

impl Element {
    pub fn new(
        id: usize,
        kind: ElementType,
        nodes: SmallVec<[usize; EXPECTED_NODES_PER_ELEMENT]>,
        native_group: Option<usize>,
    ) -> Self {
        Self {
            id,
            kind,
            nodes,
            native_group,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_round_trip() {
        for code in [91, 94, 111, 115, 11, 92] {
            assert_eq!(ElementType::from_code(code).code(), code);
        }
        assert_eq!(ElementType::from_code(92), ElementType::Unknown(92));
        assert!(!ElementType::from_code(11).is_known());
    }

    #[test]
    fn shapes() {
        assert_eq!(ElementType::Triangle.num_nodes(), Some(3));
        assert_eq!(ElementType::Hexahedron.num_nodes(), Some(8));
        assert_eq!(ElementType::Tetrahedron.dimension(), Some(Dimension::Three));
        assert_eq!(ElementType::Quadrilateral.abaqus_name(), Some("CPS4R"));
        assert_eq!(ElementType::Unknown(7).abaqus_name(), None);
        assert_eq!(ElementType::from_name(" Quad "), Some(ElementType::Quadrilateral));
        assert_eq!(ElementType::from_name("prism"), None);
    }
}
