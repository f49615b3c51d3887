use super::{GROUP_ENTITY_ELEMENT, GROUP_SECTION, SENTINEL};
use crate::mesh::region::Region;

use std::collections::BTreeMap;
use std::fmt;
use std::fs::OpenOptions;
use std::io::{BufWriter, Read, Seek, SeekFrom, Write};
use std::path::Path;
use tracing::debug;

/// Width of every numeric field in a group section
const FIELD_WIDTH: usize = 10;

/// Width of the (left aligned) group name line
const NAME_WIDTH: usize = 80;

/// Number of element records packed on one line
const RECORDS_PER_LINE: usize = 2;

/// A complete group section (delimiters included), rendered through [fmt::Display]
///
/// Groups are numbered with [Region::group_number] and written in that order, which is also the [Region] ordering.
/// Empty groups are left out.
pub struct GroupSection<'g> {
    groups: &'g BTreeMap<Region, Vec<usize>>,
    num_inclusions: usize,
}

impl<'g> GroupSection<'g> {
    /// Returns `None` if every group is empty
    pub fn new(groups: &'g BTreeMap<Region, Vec<usize>>, num_inclusions: usize) -> Option<Self> {
        if groups.values().all(|members| members.is_empty()) {
            None
        } else {
            Some(Self {
                groups,
                num_inclusions,
            })
        }
    }
}

impl fmt::Display for GroupSection<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{:>6}", SENTINEL)?;
        writeln!(f, "{:>6}", GROUP_SECTION)?;

        for (region, members) in self.groups.iter().filter(|(_, m)| !m.is_empty()) {
            writeln!(
                f,
                "{:>w$}{:>w$}{:>w$}{:>w$}{:>w$}{:>w$}{:>w$}{:>w$}",
                region.group_number(self.num_inclusions),
                0,
                0,
                0,
                0,
                0,
                0,
                members.len(),
                w = FIELD_WIDTH
            )?;
            writeln!(f, "{:<w$}", region.to_string(), w = NAME_WIDTH)?;

            for chunk in members.chunks(RECORDS_PER_LINE) {
                for elem_id in chunk {
                    write!(
                        f,
                        "{:>w$}{:>w$}{:>w$}{:>w$}",
                        GROUP_ENTITY_ELEMENT,
                        elem_id,
                        0,
                        0,
                        w = FIELD_WIDTH
                    )?;
                }
                writeln!(f)?;
            }
        }

        writeln!(f, "{:>6}", SENTINEL)
    }
}

/// Render a complete group section for the given groups. See [GroupSection]
///
/// Returns `None` if there is nothing to write.
pub fn format_group_section(
    groups: &BTreeMap<Region, Vec<usize>>,
    num_inclusions: usize,
) -> Option<String> {
    GroupSection::new(groups, num_inclusions).map(|section| section.to_string())
}

/// Append a group section to an existing mesh file
///
/// Prior content is never rewritten: the file is opened in append mode. A newline is inserted first if the file doesn't end with one.
/// Returns false if there was nothing to append.
pub fn append_groups(
    path: impl AsRef<Path>,
    groups: &BTreeMap<Region, Vec<usize>>,
    num_inclusions: usize,
) -> std::io::Result<bool> {
    let section = match GroupSection::new(groups, num_inclusions) {
        Some(section) => section,
        None => return Ok(false),
    };

    let mut f = OpenOptions::new().read(true).append(true).open(path.as_ref())?;

    let needs_newline = if f.seek(SeekFrom::End(0))? == 0 {
        false
    } else {
        let mut last = [0_u8; 1];
        f.seek(SeekFrom::End(-1))?;
        f.read_exact(&mut last)?;
        last[0] != b'\n'
    };

    let mut w = BufWriter::new(&f);
    if needs_newline {
        writeln!(w)?;
    }
    write!(w, "{}", section)?;
    w.flush()?;

    debug!(path = %path.as_ref().display(), groups = groups.len(), "appended group section");

    Ok(true)
}
