use std::fmt;

/// The material region an Element belongs to
///
/// The derived ordering (`Inclusion_1 < Inclusion_2 < ... < Matrix < Envelope`) is the order in which groups are numbered and serialized.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Region {
    /// One-based inclusion number
    Inclusion(usize),
    Matrix,
    Envelope,
}

impl Region {
    /// Parse a group name from a mesh file
    ///
    /// Only `Matrix`, `Envelope` and `Inclusion_<k>` (k >= 1) are recognized
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim() {
            "Matrix" => Some(Self::Matrix),
            "Envelope" => Some(Self::Envelope),
            other => other
                .strip_prefix("Inclusion_")
                .and_then(|k| k.parse::<usize>().ok())
                .filter(|k| *k > 0)
                .map(Self::Inclusion),
        }
    }

    /// Element-set name used in solver decks
    pub fn elset_name(&self) -> String {
        match self {
            Self::Inclusion(k) => format!("INCLUSION_{}", k),
            Self::Matrix => String::from("MATRIX"),
            Self::Envelope => String::from("ENVELOPE"),
        }
    }

    /// Group number used when the region is written back into a mesh file
    ///
    /// Inclusions keep their own number, the Matrix follows the last inclusion, and the Envelope comes after the Matrix
    pub fn group_number(&self, num_inclusions: usize) -> usize {
        match self {
            Self::Inclusion(k) => *k,
            Self::Matrix => num_inclusions + 1,
            Self::Envelope => num_inclusions + 2,
        }
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Inclusion(k) => write!(f, "Inclusion_{}", k),
            Self::Matrix => write!(f, "Matrix"),
            Self::Envelope => write!(f, "Envelope"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_names() {
        assert_eq!(Region::parse("Matrix"), Some(Region::Matrix));
        assert_eq!(Region::parse("  Envelope   "), Some(Region::Envelope));
        assert_eq!(Region::parse("Inclusion_12"), Some(Region::Inclusion(12)));
        assert_eq!(Region::parse("Inclusion_0"), None);
        assert_eq!(Region::parse("Inclusion_x"), None);
        assert_eq!(Region::parse("VOLUME2"), None);
        assert_eq!(Region::parse("matrix"), None);
    }

    #[test]
    fn ordering_and_numbers() {
        let mut regions = vec![
            Region::Envelope,
            Region::Inclusion(2),
            Region::Matrix,
            Region::Inclusion(1),
        ];
        regions.sort();
        assert_eq!(
            regions,
            vec![
                Region::Inclusion(1),
                Region::Inclusion(2),
                Region::Matrix,
                Region::Envelope
            ]
        );

        assert_eq!(Region::Inclusion(3).group_number(5), 3);
        assert_eq!(Region::Matrix.group_number(5), 6);
        assert_eq!(Region::Envelope.group_number(5), 7);
        assert_eq!(Region::Inclusion(3).to_string(), "Inclusion_3");
        assert_eq!(Region::Matrix.elset_name(), "MATRIX");
    }
}
