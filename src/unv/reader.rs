use super::{UnvError, ELEMENT_SECTION, GROUP_ENTITY_ELEMENT, GROUP_SECTION, NODE_SECTION, SENTINEL};
use crate::mesh::{
    element::{Element, ElementType, EXPECTED_NODES_PER_ELEMENT},
    region::Region,
    Mesh,
};

use geometry::Point;
use smallvec::SmallVec;
use std::fs::read_to_string;
use std::path::Path;
use std::str::FromStr;
use tracing::{debug, warn};

/// Element codes of the beam family. Their records carry an orientation line between the header and the node list
const BEAM_CODES: [usize; 5] = [11, 21, 22, 23, 24];

/// Number of fields in a node header: `node-id, export-code, display-code, color-code`
const NODE_HEADER_FIELDS: usize = 4;

/// Number of fields in an element header: `elem-id, type-code, physical-property, material-property, color-code, node-count`
const ELEMENT_HEADER_FIELDS: usize = 6;

/// Number of fields in a group header: `group-id`, six zero placeholders, and the entity count
const GROUP_HEADER_FIELDS: usize = 8;

/// Number of fields in one group record: `entity-type, entity-tag, 0, 0`
const GROUP_RECORD_FIELDS: usize = 4;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Section {
    Nodes,
    Elements,
    Groups,
    Other(u32),
}

impl Section {
    fn from_code(code: u32) -> Self {
        match code {
            NODE_SECTION => Self::Nodes,
            ELEMENT_SECTION => Self::Elements,
            GROUP_SECTION => Self::Groups,
            other => Self::Other(other),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum ParseState {
    /// Between sections: only delimiters (and blank lines) are expected
    Outside,
    /// A delimiter was just read: the next line holds a section code
    ExpectCode,
    Inside(Section),
}

/// Read a mesh file from disk. See [parse_unv]
pub fn read_unv(path: impl AsRef<Path>) -> Result<Mesh, UnvError> {
    let contents = read_to_string(path.as_ref())?;
    parse_unv(&contents)
}

/// Parse the contents of a mesh file into a [Mesh]
///
/// The parser is a state machine over the section structure of the file. Inside a section, each entry is handed to a
/// dedicated sub-parser which reports how many lines it consumed; the cursor is only ever advanced by that amount.
///
/// Any unparseable line fails the whole read with [UnvError::Malformed] pointing at the (one-based) offending line.
pub fn parse_unv(contents: &str) -> Result<Mesh, UnvError> {
    let lines: Vec<&str> = contents.lines().collect();
    let mut mesh = Mesh::blank();
    let mut state = ParseState::Outside;
    let mut cursor = 0;

    while cursor < lines.len() {
        let line = lines[cursor].trim();

        let consumed = match state {
            ParseState::Outside => {
                if line == SENTINEL {
                    state = ParseState::ExpectCode;
                } else if !line.is_empty() {
                    return Err(malformed(
                        cursor,
                        format!("expected a section delimiter, found '{}'", line),
                    ));
                }
                1
            }
            ParseState::ExpectCode => {
                if line.is_empty() || line == SENTINEL {
                    1
                } else {
                    let code: u32 = parse_field(line, cursor, "section code")?;
                    let section = Section::from_code(code);
                    debug!(line = cursor + 1, code, "entering section");
                    state = ParseState::Inside(section);

                    if section == Section::Groups {
                        1 + stray_delimiters(&lines, cursor + 1)
                    } else {
                        1
                    }
                }
            }
            ParseState::Inside(section) => {
                if line == SENTINEL {
                    state = ParseState::Outside;
                    1
                } else if line.is_empty() {
                    1
                } else {
                    match section {
                        Section::Nodes => parse_node_entry(&lines, cursor, &mut mesh)?,
                        Section::Elements => parse_element_entry(&lines, cursor, &mut mesh)?,
                        Section::Groups => parse_group_entry(&lines, cursor, &mut mesh)?,
                        Section::Other(_) => 1,
                    }
                }
            }
        };

        cursor += consumed;
    }

    // appending a section after an unterminated one would corrupt the file
    if let ParseState::Inside(section) = state {
        return Err(malformed(
            lines.len().saturating_sub(1),
            format!("file ends inside {:?} section without a closing delimiter", section),
        ));
    }

    debug!(
        nodes = mesh.num_nodes(),
        elements = mesh.num_elements(),
        "finished parsing mesh"
    );

    Ok(mesh)
}

// ----------------------------------------------------------------------------------------------------
// Entry sub-parsers (each returns the number of lines it consumed)
// ----------------------------------------------------------------------------------------------------

fn parse_node_entry(lines: &[&str], at: usize, mesh: &mut Mesh) -> Result<usize, UnvError> {
    let header = int_fields(lines[at], at, NODE_HEADER_FIELDS, "node header")?;
    let node_id = positive_id(header[0], at, "node")?;

    let coord_idx = at + 1;
    let coord_line = data_line(lines, coord_idx, "node coordinates")?;
    let coords: Vec<f64> = coord_line
        .split_whitespace()
        .map(|field| parse_float(field, coord_idx))
        .collect::<Result<_, _>>()?;

    let coords: [f64; 3] = coords.try_into().map_err(|c: Vec<f64>| {
        malformed(
            coord_idx,
            format!("expected 3 coordinates for node {}, found {}", node_id, c.len()),
        )
    })?;

    if !mesh.add_node(node_id, Point::from(coords)) {
        return Err(malformed(at, format!("duplicate node id {}", node_id)));
    }

    Ok(2)
}

fn parse_element_entry(lines: &[&str], at: usize, mesh: &mut Mesh) -> Result<usize, UnvError> {
    let header = int_fields(lines[at], at, ELEMENT_HEADER_FIELDS, "element header")?;
    let elem_id = positive_id(header[0], at, "element")?;
    let code = u32::try_from(header[1])
        .map_err(|_| malformed(at, format!("element type code {} is out of range", header[1])))?;
    let native_group = Some(header[2]).filter(|g| *g != 0);
    let node_count = header[5];
    let kind = ElementType::from_code(code);

    match kind.num_nodes() {
        Some(expected) if expected != node_count => {
            return Err(malformed(
                at,
                format!(
                    "element {} is a {} and needs {} nodes, not {}",
                    elem_id, kind, expected, node_count
                ),
            ));
        }
        Some(_) => (),
        None => debug!(elem_id, code, "keeping element of unrecognized type"),
    }

    let mut cursor = at + 1;
    if BEAM_CODES.contains(&header[1]) {
        data_line(lines, cursor, "beam orientation")?;
        cursor += 1;
    }

    // the announced count is untrusted until the ids are actually read
    let mut nodes: SmallVec<[usize; EXPECTED_NODES_PER_ELEMENT]> =
        SmallVec::with_capacity(node_count.min(EXPECTED_NODES_PER_ELEMENT));
    while nodes.len() < node_count {
        let conn_line = data_line(lines, cursor, "element connectivity")?;
        for field in conn_line.split_whitespace() {
            nodes.push(parse_field(field, cursor, "node id")?);
        }
        cursor += 1;
    }

    if nodes.len() != node_count {
        return Err(malformed(
            cursor - 1,
            format!(
                "element {} lists {} nodes but its header announces {}",
                elem_id,
                nodes.len(),
                node_count
            ),
        ));
    }

    if !mesh.add_element(Element::new(elem_id, kind, nodes, native_group)) {
        return Err(malformed(at, format!("duplicate element id {}", elem_id)));
    }

    Ok(cursor - at)
}

fn parse_group_entry(lines: &[&str], at: usize, mesh: &mut Mesh) -> Result<usize, UnvError> {
    let (group_id, announced) = group_header(lines[at]).ok_or_else(|| {
        malformed(
            at,
            format!("expected a group header, found '{}'", lines[at].trim()),
        )
    })?;

    let name = data_line(lines, at + 1, "group name")?;
    let region = Region::parse(name);

    // records run until the next group header or the end of the section
    let mut cursor = at + 2;
    let mut members = Vec::new();
    let mut num_records = 0;
    while cursor < lines.len() {
        let record_line = lines[cursor].trim();
        if record_line == SENTINEL || group_header(record_line).is_some() {
            break;
        }

        if region.is_some() {
            let fields = record_line.split_whitespace().collect::<Vec<&str>>();
            if fields.len() % GROUP_RECORD_FIELDS != 0 {
                return Err(malformed(
                    cursor,
                    format!(
                        "group records must have {} fields each, found {} fields",
                        GROUP_RECORD_FIELDS,
                        fields.len()
                    ),
                ));
            }

            for record in fields.chunks(GROUP_RECORD_FIELDS) {
                let entity_type: usize = parse_field(record[0], cursor, "group entity type")?;
                let tag: usize = parse_field(record[1], cursor, "group entity tag")?;
                if entity_type == GROUP_ENTITY_ELEMENT {
                    members.push(tag);
                }
                num_records += 1;
            }
        }

        cursor += 1;
    }

    match region {
        Some(region) => {
            if num_records != announced {
                warn!(
                    group = name,
                    announced,
                    found = num_records,
                    "group header announces a different number of entities"
                );
            }
            if mesh.clear_group(region) {
                debug!(group = name, "group redefined; keeping the latest definition");
            }
            for elem_id in members {
                mesh.add_to_group(region, elem_id);
            }
            debug!(line = at + 1, group_id, group = name, "read group");
        }
        None => debug!(line = at + 1, group_id, group = name, "skipping unrecognized group"),
    }

    Ok(cursor - at)
}

// ----------------------------------------------------------------------------------------------------
// Field helpers
// ----------------------------------------------------------------------------------------------------

/// Recognize a group header: eight integers, of which the 2nd through 7th are zero
///
/// Returns the group id and the number of entities it announces
fn group_header(line: &str) -> Option<(usize, usize)> {
    let fields = line
        .split_whitespace()
        .map(|f| f.parse::<usize>().ok())
        .collect::<Option<Vec<usize>>>()?;

    if fields.len() == GROUP_HEADER_FIELDS && fields[1..7].iter().all(|f| *f == 0) {
        Some((fields[0], fields[7]))
    } else {
        None
    }
}

/// Some writers emit extra delimiters between the group section code and its first header.
/// They are only treated as stray when a group header follows them (otherwise they close an empty section).
fn stray_delimiters(lines: &[&str], from: usize) -> usize {
    let num_delimiters = lines
        .iter()
        .skip(from)
        .take_while(|l| l.trim() == SENTINEL)
        .count();

    match lines.get(from + num_delimiters) {
        Some(next) if num_delimiters > 0 && group_header(next).is_some() => {
            debug!(line = from + 1, num_delimiters, "skipping stray delimiters");
            num_delimiters
        }
        _ => 0,
    }
}

/// Fetch the line at `idx`, which must exist and must not close the section
fn data_line<'l>(lines: &[&'l str], idx: usize, what: &str) -> Result<&'l str, UnvError> {
    match lines.get(idx).copied().map(str::trim) {
        None => Err(malformed(
            idx.saturating_sub(1),
            format!("unexpected end of file while reading {}", what),
        )),
        Some(SENTINEL) => Err(malformed(
            idx,
            format!("section ended while reading {}", what),
        )),
        Some(line) => Ok(line),
    }
}

fn int_fields(line: &str, idx: usize, expected: usize, what: &str) -> Result<Vec<usize>, UnvError> {
    let fields: Vec<usize> = line
        .split_whitespace()
        .map(|field| parse_field(field, idx, what))
        .collect::<Result<_, _>>()?;

    if fields.len() != expected {
        Err(malformed(
            idx,
            format!(
                "expected {} fields in {}, found {}",
                expected,
                what,
                fields.len()
            ),
        ))
    } else {
        Ok(fields)
    }
}

fn positive_id(id: usize, idx: usize, what: &str) -> Result<usize, UnvError> {
    if id == 0 {
        Err(malformed(idx, format!("{} ids must be positive", what)))
    } else {
        Ok(id)
    }
}

fn parse_field<T: FromStr>(field: &str, idx: usize, what: &str) -> Result<T, UnvError> {
    field
        .trim()
        .parse::<T>()
        .map_err(|_| malformed(idx, format!("invalid {}: '{}'", what, field.trim())))
}

/// Parse a floating point field, accepting the legacy `D` exponent marker (`1.5D+01`)
fn parse_float(field: &str, idx: usize) -> Result<f64, UnvError> {
    let normalized = field.trim().replace(['D', 'd'], "E");
    match normalized.parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(value),
        _ => Err(malformed(
            idx,
            format!("invalid coordinate: '{}'", field.trim()),
        )),
    }
}

fn malformed(idx: usize, message: String) -> UnvError {
    UnvError::Malformed {
        line: idx + 1,
        message,
    }
}
