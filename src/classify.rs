use crate::config::PipelineConfig;
use crate::layout::InclusionLayout;
use crate::mesh::{
    element::{Element, ElementType},
    region::Region,
    Mesh,
};

use geometry::Point;
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::{debug, warn};

#[cfg(feature = "json_export")]
use json::{object, JsonValue};

/// Element-level problems. They exclude the Element from every group but never abort the classification of the others
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClassifyError {
    #[error("Element {element_id} references missing node {node_id}")]
    UnresolvedNode { element_id: usize, node_id: usize },

    #[error("Element {element_id} has unsupported type code {code}")]
    UnsupportedElementType { element_id: usize, code: u32 },
}

/// Assigns every Element of a [Mesh] to the Matrix, the Envelope, or one of the inclusions of an [InclusionLayout]
///
/// All tests use the Element centroid projected onto the xy-plane:
/// 1. Elements of an envelope type, or whose centroid lies outside `[0, box_size]²`, belong to the Envelope
/// 2. Otherwise the first inclusion whose disk contains the centroid wins
/// 3. Everything else is Matrix
///
/// With group refinement enabled, Elements that share a mesh-native group id are assumed to form one geometric body:
/// the centroid of the first such Element is tested on behalf of the whole group.
pub struct Classifier<'l> {
    layout: &'l InclusionLayout,
    envelope_types: Vec<ElementType>,
    group_refinement: bool,
}

/// Non-envelope Elements sharing a mesh-native group id
struct NativeGroup {
    representative: Point,
    members: Vec<usize>,
}

impl<'l> Classifier<'l> {
    pub fn new(layout: &'l InclusionLayout, config: &PipelineConfig) -> Self {
        Self {
            layout,
            envelope_types: config.envelope_element_types.clone(),
            group_refinement: config.group_refinement,
        }
    }

    pub fn classify(&self, mesh: &Mesh) -> Classification {
        let mut classification = Classification::new(self.layout.num_inclusions());
        let mut native_groups: BTreeMap<usize, NativeGroup> = BTreeMap::new();

        for element in mesh.elements() {
            if !element.kind.is_known() {
                warn!(element = element.id, code = element.kind.code(), "not classifying element of unsupported type");
                classification.issues.push(ClassifyError::UnsupportedElementType {
                    element_id: element.id,
                    code: element.kind.code(),
                });
                continue;
            }

            let centroid = match mesh.centroid(element) {
                Ok(c) => c.to_planar(),
                Err(node_id) => {
                    warn!(element = element.id, node = node_id, "element references a missing node");
                    classification.issues.push(ClassifyError::UnresolvedNode {
                        element_id: element.id,
                        node_id,
                    });
                    continue;
                }
            };

            if self.is_envelope(element, &centroid) {
                classification.assign(element.id, Region::Envelope);
                continue;
            }

            match element.native_group.filter(|_| self.group_refinement) {
                Some(group_id) => native_groups
                    .entry(group_id)
                    .or_insert_with(|| NativeGroup {
                        representative: centroid,
                        members: Vec::new(),
                    })
                    .members
                    .push(element.id),
                None => classification.assign(element.id, self.interior_region(&centroid)),
            }
        }

        for (group_id, group) in native_groups {
            let region = self.interior_region(&group.representative);
            debug!(group_id, members = group.members.len(), %region, "classified native group");
            for elem_id in group.members {
                classification.assign(elem_id, region);
            }
        }

        classification
    }

    fn is_envelope(&self, element: &Element, centroid: &Point) -> bool {
        self.envelope_types.contains(&element.kind) || self.layout.is_outside_box(centroid)
    }

    fn interior_region(&self, centroid: &Point) -> Region {
        self.layout
            .inclusion_containing(centroid)
            .unwrap_or(Region::Matrix)
    }
}

/// The result of classifying a [Mesh]: one [Region] per classifiable Element, plus the Element-level problems encountered
#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    assignment: BTreeMap<usize, Region>,
    issues: Vec<ClassifyError>,
    num_inclusions: usize,
}

impl Classification {
    fn new(num_inclusions: usize) -> Self {
        Self {
            assignment: BTreeMap::new(),
            issues: Vec::new(),
            num_inclusions,
        }
    }

    fn assign(&mut self, elem_id: usize, region: Region) {
        self.assignment.insert(elem_id, region);
    }

    /// Region of an Element (`None` if it was excluded)
    pub fn region(&self, elem_id: usize) -> Option<Region> {
        self.assignment.get(&elem_id).copied()
    }

    /// Iterate over (Element id, Region) pairs by ascending Element id
    pub fn assignments(&self) -> impl Iterator<Item = (usize, Region)> + '_ {
        self.assignment.iter().map(|(id, region)| (*id, *region))
    }

    pub fn issues(&self) -> &[ClassifyError] {
        &self.issues
    }

    /// Number of inclusions in the layout the Mesh was classified against
    pub fn num_inclusions(&self) -> usize {
        self.num_inclusions
    }

    /// Element ids per Region, each list sorted (empty Regions are absent)
    pub fn groups(&self) -> BTreeMap<Region, Vec<usize>> {
        let mut groups: BTreeMap<Region, Vec<usize>> = BTreeMap::new();
        for (elem_id, region) in self.assignments() {
            groups.entry(region).or_default().push(elem_id);
        }
        groups
    }

    /// Number of Elements per Region
    pub fn counts(&self) -> BTreeMap<Region, usize> {
        self.groups()
            .into_iter()
            .map(|(region, members)| (region, members.len()))
            .collect()
    }

    /// Produce a Json Object summarizing this Classification
    #[cfg(feature = "json_export")]
    pub fn to_json(&self) -> JsonValue {
        let mut groups = JsonValue::new_object();
        for (region, members) in self.groups() {
            groups[region.to_string()] = JsonValue::from(members);
        }

        object! {
            "num_inclusions": self.num_inclusions,
            "num_classified": self.assignment.len(),
            "groups": groups,
            "issues": JsonValue::from(self.issues.iter().map(|issue| issue.to_string()).collect::<Vec<_>>()),
        }
    }
}
