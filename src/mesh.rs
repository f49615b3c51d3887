/// Finite Elements, their shapes, and the legacy numeric shape codes
pub mod element;
/// Names of the material regions an Element can be assigned to
pub mod region;

use element::{Dimension, Element, EXPECTED_NODES_PER_ELEMENT};
use region::Region;

use geometry::{BoundingBox, Point};
use smallvec::SmallVec;
use std::collections::{BTreeMap, BTreeSet};

/// In-memory description of a mesh file: Nodes, Elements, named Element groups and the running bounding box of all Nodes
///
/// Nodes and groups are stored in ordered maps so every traversal is by ascending id.
/// Elements keep the order in which they were read.
#[derive(Debug, Clone)]
pub struct Mesh {
    nodes: BTreeMap<usize, Point>,
    elements: Vec<Element>,
    element_index: BTreeMap<usize, usize>,
    groups: BTreeMap<Region, BTreeSet<usize>>,
    bbox: BoundingBox,
}

impl Mesh {
    /// Construct a completely empty Mesh
    pub fn blank() -> Self {
        Self {
            nodes: BTreeMap::new(),
            elements: Vec::new(),
            element_index: BTreeMap::new(),
            groups: BTreeMap::new(),
            bbox: BoundingBox::empty(),
        }
    }

    /// Store a Node and grow the bounding box to include it
    ///
    /// Returns false (leaving the Mesh untouched) if `id` is already in use
    pub fn add_node(&mut self, id: usize, coords: Point) -> bool {
        if self.nodes.contains_key(&id) {
            return false;
        }
        self.bbox.include(&coords);
        self.nodes.insert(id, coords);
        true
    }

    /// Store an Element
    ///
    /// Returns false (leaving the Mesh untouched) if the Element's id is already in use
    pub fn add_element(&mut self, element: Element) -> bool {
        if self.element_index.contains_key(&element.id) {
            return false;
        }
        self.element_index.insert(element.id, self.elements.len());
        self.elements.push(element);
        true
    }

    /// Add an Element id to a named group (creating the group if needed)
    pub fn add_to_group(&mut self, region: Region, elem_id: usize) {
        self.groups.entry(region).or_default().insert(elem_id);
    }

    /// Remove all members of a group. Returns true if the group existed
    pub fn clear_group(&mut self, region: Region) -> bool {
        self.groups.remove(&region).is_some()
    }

    // ----------------------------------------------------------------------------------------------------
    // General Data Retrieval
    // ----------------------------------------------------------------------------------------------------

    pub fn node(&self, id: usize) -> Option<&Point> {
        self.nodes.get(&id)
    }

    /// Iterate over all Nodes by ascending id
    pub fn nodes(&self) -> impl Iterator<Item = (usize, &Point)> + '_ {
        self.nodes.iter().map(|(id, p)| (*id, p))
    }

    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    /// Iterate over all Elements in file order
    pub fn elements(&self) -> impl Iterator<Item = &Element> + '_ {
        self.elements.iter()
    }

    pub fn num_elements(&self) -> usize {
        self.elements.len()
    }

    pub fn element(&self, id: usize) -> Option<&Element> {
        self.element_index.get(&id).map(|idx| &self.elements[*idx])
    }

    /// Members of a group by ascending Element id (empty if the group doesn't exist)
    pub fn group(&self, region: Region) -> Vec<usize> {
        self.groups
            .get(&region)
            .map(|members| members.iter().copied().collect())
            .unwrap_or_default()
    }

    /// All groups in [Region] order, each sorted by Element id
    pub fn groups(&self) -> BTreeMap<Region, Vec<usize>> {
        self.groups
            .iter()
            .map(|(region, members)| (*region, members.iter().copied().collect()))
            .collect()
    }

    pub fn bbox(&self) -> &BoundingBox {
        &self.bbox
    }

    /// The Mesh is three dimensional if it holds at least one volumetric Element
    pub fn dimension(&self) -> Dimension {
        if self
            .elements
            .iter()
            .any(|e| e.kind.dimension() == Some(Dimension::Three))
        {
            Dimension::Three
        } else {
            Dimension::Two
        }
    }

    /// Smallest and largest Element id (`None` for a Mesh without Elements)
    pub fn element_id_range(&self) -> Option<[usize; 2]> {
        let first = self.element_index.keys().next()?;
        let last = self.element_index.keys().next_back()?;
        Some([*first, *last])
    }

    /// Get the [Point]s composing an [Element]
    ///
    /// Returns the first unknown Node id as an `Err` if the Element references a Node that isn't in the Mesh
    pub fn element_points(
        &self,
        element: &Element,
    ) -> Result<SmallVec<[Point; EXPECTED_NODES_PER_ELEMENT]>, usize> {
        element
            .nodes
            .iter()
            .map(|node_id| self.nodes.get(node_id).copied().ok_or(*node_id))
            .collect()
    }

    /// Arithmetic mean of an [Element]'s Node coordinates
    ///
    /// Returns the first unknown Node id as an `Err` (an Element without any Nodes reports Node 0)
    pub fn centroid(&self, element: &Element) -> Result<Point, usize> {
        let points = self.element_points(element)?;
        Point::centroid(points.iter()).ok_or(0)
    }
}

impl Default for Mesh {
    fn default() -> Self {
        Self::blank()
    }
}

#[cfg(test)]
mod tests {
    use super::element::ElementType;
    use super::*;
    use smallvec::smallvec;

    fn unit_square() -> Mesh {
        let mut mesh = Mesh::blank();
        assert!(mesh.add_node(4, Point::planar(0.0, 1.0)));
        assert!(mesh.add_node(1, Point::planar(0.0, 0.0)));
        assert!(mesh.add_node(2, Point::planar(1.0, 0.0)));
        assert!(mesh.add_node(3, Point::planar(1.0, 1.0)));
        assert!(mesh.add_element(Element::new(
            7,
            ElementType::Quadrilateral,
            smallvec![1, 2, 3, 4],
            None
        )));
        mesh
    }

    #[test]
    fn bbox_tracks_every_insertion() {
        let mut mesh = Mesh::blank();
        let points = [
            Point::at(0.5, 0.5, 0.0),
            Point::at(-1.0, 2.0, 0.0),
            Point::at(3.0, -4.0, 1.0),
        ];
        for (id, p) in points.iter().enumerate() {
            mesh.add_node(id + 1, *p);
            for (_, q) in mesh.nodes() {
                for axis in 0..3 {
                    assert!(mesh.bbox().min[axis] <= q[axis]);
                    assert!(mesh.bbox().max[axis] >= q[axis]);
                }
            }
        }
        assert_eq!(mesh.bbox().min, [-1.0, -4.0, 0.0]);
        assert_eq!(mesh.bbox().max, [3.0, 2.0, 1.0]);
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let mut mesh = unit_square();
        assert!(!mesh.add_node(1, Point::planar(50.0, 50.0)));
        assert_eq!(mesh.bbox().max, [1.0, 1.0, 0.0]);
        assert!(!mesh.add_element(Element::new(
            7,
            ElementType::Triangle,
            smallvec![1, 2, 3],
            None
        )));
        assert_eq!(mesh.num_elements(), 1);
    }

    #[test]
    fn nodes_iterate_by_id() {
        let mesh = unit_square();
        let ids: Vec<usize> = mesh.nodes().map(|(id, _)| id).collect();
        assert_eq!(ids, vec![1, 2, 3, 4]);
    }

    #[test]
    fn centroid_and_missing_nodes() {
        let mut mesh = unit_square();
        let c = mesh.centroid(mesh.element(7).unwrap()).unwrap();
        assert!((c.x() - 0.5).abs() < 1e-14);
        assert!((c.y() - 0.5).abs() < 1e-14);

        mesh.add_element(Element::new(
            8,
            ElementType::Triangle,
            smallvec![2, 3, 99],
            None,
        ));
        assert_eq!(mesh.centroid(mesh.element(8).unwrap()), Err(99));
        assert_eq!(mesh.element_id_range(), Some([7, 8]));
    }

    #[test]
    fn groups_and_dimension() {
        let mut mesh = unit_square();
        assert_eq!(mesh.dimension(), Dimension::Two);

        mesh.add_to_group(Region::Matrix, 9);
        mesh.add_to_group(Region::Matrix, 3);
        mesh.add_to_group(Region::Inclusion(1), 5);
        assert_eq!(mesh.group(Region::Matrix), vec![3, 9]);
        assert_eq!(
            mesh.groups().keys().copied().collect::<Vec<_>>(),
            vec![Region::Inclusion(1), Region::Matrix]
        );
        assert!(mesh.clear_group(Region::Matrix));
        assert!(mesh.group(Region::Matrix).is_empty());

        mesh.add_node(10, Point::at(0.0, 0.0, 1.0));
        mesh.add_element(Element::new(
            11,
            ElementType::Tetrahedron,
            smallvec![1, 2, 4, 10],
            None,
        ));
        assert_eq!(mesh.dimension(), Dimension::Three);
    }
}
