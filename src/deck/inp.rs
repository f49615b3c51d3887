use super::DeckError;
use crate::boundary::BoundaryNodeSets;
use crate::classify::Classification;
use crate::config::PipelineConfig;
use crate::mesh::{
    element::{Dimension, Element, ElementType},
    region::Region,
    Mesh,
};

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::{debug, warn};

/// Name of the single part holding the whole mesh
pub const PART_NAME: &str = "RVEPLUS";

/// Name of the instance of [PART_NAME] in the assembly
pub const INSTANCE_NAME: &str = "RVEPLUS-1";

/// Name of the generated element set covering every written Element
pub const ALL_ELEMENTS_SET: &str = "SET-1";

/// Width of every id field
const ID_WIDTH: usize = 8;

/// Renders a Mesh, its element sets and its boundary node sets as an Abaqus input deck
///
/// Output only depends on the inputs: Nodes, Elements and set members are always written by ascending id.
pub struct DeckWriter<'a> {
    mesh: &'a Mesh,
    boundary: &'a BoundaryNodeSets,
    elsets: Vec<(Region, Vec<usize>)>,
    ids_per_line: usize,
    reference_point_offsets: [f64; 3],
}

impl<'a> DeckWriter<'a> {
    /// Prepare a deck for `mesh`
    ///
    /// Element sets are taken from `classification` when one is given, otherwise from the groups stored in the mesh file.
    pub fn new(
        mesh: &'a Mesh,
        classification: Option<&Classification>,
        boundary: &'a BoundaryNodeSets,
        config: &PipelineConfig,
    ) -> Result<Self, DeckError> {
        if mesh.num_nodes() == 0 {
            return Err(DeckError::EmptyMesh);
        }

        let groups = match classification {
            Some(classification) => classification.groups(),
            None => mesh.groups(),
        };

        let mut elsets: Vec<(Region, Vec<usize>)> = groups
            .into_iter()
            .filter(|(_, members)| !members.is_empty())
            .collect();
        elsets.sort_by_key(|(region, _)| elset_order(region));

        Ok(Self {
            mesh,
            boundary,
            elsets,
            ids_per_line: config.ids_per_line.max(1),
            reference_point_offsets: config.reference_point_offsets,
        })
    }

    /// Write the deck to a file
    pub fn write(&self, path: impl AsRef<Path>) -> Result<(), DeckError> {
        let f = File::create(path.as_ref())?;
        let mut w = BufWriter::new(&f);
        self.render(&mut w)?;
        w.flush()?;

        debug!(path = %path.as_ref().display(), "wrote deck");
        Ok(())
    }

    pub fn render<W: Write>(&self, w: &mut W) -> std::io::Result<()> {
        let blocks = self.element_blocks();

        writeln!(w, "*Heading")?;
        writeln!(w, "** Job name: RVE Model name: Model-1")?;
        writeln!(w, "** Generated by: {} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"))?;
        writeln!(w, "*Preprint, echo=NO, model=NO, history=NO, contact=NO")?;
        writeln!(w, "**\n** PARTS\n**")?;

        // ---- part ----
        writeln!(w, "*Part, name={}", PART_NAME)?;
        self.render_nodes(w)?;

        for (kind, elements) in blocks.iter() {
            // only known types make it into a block
            if let Some(name) = kind.abaqus_name() {
                writeln!(w, "*Element, type={}", name)?;
                for element in elements {
                    writeln!(w, "{:>w$}, {}", element.id, join_ids(element.nodes.iter(), ID_WIDTH), w = ID_WIDTH)?;
                }
            }
        }

        for (region, members) in self.elsets.iter() {
            writeln!(w, "*Elset, elset={}", region.elset_name())?;
            self.render_id_lines(w, members)?;
        }

        let id_range = written_id_range(&blocks);
        if let Some([first, last]) = id_range {
            writeln!(w, "*Elset, elset={}, generate", ALL_ELEMENTS_SET)?;
            writeln!(w, "{:>w$}, {:>w$}, {:>w$}", first, last, 1, w = ID_WIDTH)?;
        }

        writeln!(w, "*End Part")?;
        writeln!(w, "**")?;

        // ---- assembly ----
        writeln!(w, "** ASSEMBLY\n**")?;
        writeln!(w, "*Assembly, name=Assembly")?;
        writeln!(w, "**")?;
        writeln!(w, "*Instance, name={}, part={}", INSTANCE_NAME, PART_NAME)?;
        writeln!(w, "*End Instance")?;
        writeln!(w, "**")?;

        self.render_reference_points(w)?;

        if let Some([first, last]) = id_range {
            writeln!(w, "*Elset, elset={}, instance={}, generate", ALL_ELEMENTS_SET, INSTANCE_NAME)?;
            writeln!(w, "{:>w$}, {:>w$}, {:>w$}", first, last, 1, w = ID_WIDTH)?;
        }

        for (face, nodes) in self.boundary.iter().filter(|(_, nodes)| !nodes.is_empty()) {
            writeln!(w, "*Nset, nset={}, instance={}", face.nset_name(), INSTANCE_NAME)?;
            self.render_id_lines(w, &nodes.iter().copied().collect::<Vec<_>>())?;
        }

        writeln!(w, "*End Assembly")?;

        Ok(())
    }

    fn render_nodes<W: Write>(&self, w: &mut W) -> std::io::Result<()> {
        let three_d = self.mesh.dimension() == Dimension::Three;

        writeln!(w, "*Node")?;
        for (id, p) in self.mesh.nodes() {
            if three_d {
                writeln!(w, "{:>8}, {:>12.6}, {:>12.6}, {:>12.6}", id, p.x(), p.y(), p.z())?;
            } else {
                writeln!(w, "{:>8}, {:>12.6}, {:>12.6}", id, p.x(), p.y())?;
            }
        }
        Ok(())
    }

    /// Three synthetic Nodes placed past the model along x, with one node set each
    fn render_reference_points<W: Write>(&self, w: &mut W) -> std::io::Result<()> {
        let bbox = self.mesh.bbox();
        let long = bbox.extent(0);
        let three_d = self.mesh.dimension() == Dimension::Three;

        writeln!(w, "*Node")?;
        for (i, factor) in self.reference_point_offsets.iter().enumerate() {
            let x = bbox.min[0] + factor * long;
            if three_d {
                writeln!(w, "{:>7}, {:>12.6}, {:>12.6}, {:>12.6}", i + 1, x, bbox.min[1], bbox.min[2])?;
            } else {
                writeln!(w, "{:>7}, {:>12.6}, {:>12.6}", i + 1, x, bbox.min[1])?;
            }
        }
        for i in 1..=self.reference_point_offsets.len() {
            writeln!(w, "*Nset, nset=REFMACRO{}", i)?;
            writeln!(w, "{:>w$}", i, w = ID_WIDTH)?;
        }
        Ok(())
    }

    fn render_id_lines<W: Write>(&self, w: &mut W, ids: &[usize]) -> std::io::Result<()> {
        for chunk in ids.chunks(self.ids_per_line) {
            writeln!(w, "{}", join_ids(chunk.iter(), ID_WIDTH))?;
        }
        Ok(())
    }

    /// Known-type Elements grouped by type, each block sorted by id
    fn element_blocks(&self) -> BTreeMap<ElementType, Vec<&'a Element>> {
        let mut blocks: BTreeMap<ElementType, Vec<&'a Element>> = BTreeMap::new();
        for element in self.mesh.elements() {
            if element.kind.abaqus_name().is_none() {
                warn!(element = element.id, code = element.kind.code(), "no deck keyword for element type; skipping");
                continue;
            }
            blocks.entry(element.kind).or_default().push(element);
        }

        for elements in blocks.values_mut() {
            elements.sort_by_key(|e| e.id);
        }
        blocks
    }
}

/// Deck order of element sets: `MATRIX`, `ENVELOPE`, then the inclusions
fn elset_order(region: &Region) -> (u8, usize) {
    match region {
        Region::Matrix => (0, 0),
        Region::Envelope => (1, 0),
        Region::Inclusion(k) => (2, *k),
    }
}

fn written_id_range(blocks: &BTreeMap<ElementType, Vec<&Element>>) -> Option<[usize; 2]> {
    let ids = blocks.values().flatten().map(|e| e.id);
    let first = ids.clone().min()?;
    let last = ids.max()?;
    Some([first, last])
}

fn join_ids<'i>(ids: impl Iterator<Item = &'i usize>, width: usize) -> String {
    ids.map(|id| format!("{:>w$}", id, w = width))
        .collect::<Vec<_>>()
        .join(", ")
}
