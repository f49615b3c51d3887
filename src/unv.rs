//! The line-oriented legacy mesh format (I-DEAS universal files)
//!
//! A file is a flat sequence of sections. Every section is opened by a `-1` line followed by a line holding its numeric code,
//! and is closed by another `-1` line:
//! ```text
//!     -1
//!   2411
//!          1         1         1        11
//!    0.0000000000000000D+00   0.0000000000000000D+00   0.0000000000000000D+00
//!     -1
//! ```
//! Three section codes are understood: [NODE_SECTION], [ELEMENT_SECTION] and [GROUP_SECTION]. Every other section is skipped.

/// Fixed-width writer for group sections, used to persist classification results in the mesh file itself
pub mod groups;
/// Section-by-section parser producing a [Mesh](crate::mesh::Mesh)
pub mod reader;

pub use groups::{append_groups, format_group_section, GroupSection};
pub use reader::{parse_unv, read_unv};

use thiserror::Error;

/// Opening and closing delimiter of every section
pub const SENTINEL: &str = "-1";

/// Node coordinates (double precision)
pub const NODE_SECTION: u32 = 2411;

/// Element connectivity
pub const ELEMENT_SECTION: u32 = 2412;

/// Permanent groups of mesh entities
pub const GROUP_SECTION: u32 = 2477;

/// Entity type code identifying a finite element inside a group record
pub const GROUP_ENTITY_ELEMENT: usize = 8;

#[derive(Debug, Error)]
pub enum UnvError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// `line` is one-based
    #[error("Malformed mesh at line {line}: {message}")]
    Malformed { line: usize, message: String },
}

impl UnvError {
    /// Line number of a malformed entry (`None` for I/O errors)
    pub fn line(&self) -> Option<usize> {
        match self {
            Self::Malformed { line, .. } => Some(*line),
            Self::Io(_) => None,
        }
    }
}
