//! Object identifiers

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// BRIDGE-MIB::dot1dTpFdbPort, indexed by the six MAC octets
pub const DOT1D_TP_FDB_PORT: &[u32] = &[1, 3, 6, 1, 2, 1, 17, 4, 3, 1, 2];
/// BRIDGE-MIB::dot1dBasePortIfIndex, indexed by base port
pub const DOT1D_BASE_PORT_IF_INDEX: &[u32] = &[1, 3, 6, 1, 2, 1, 17, 1, 4, 1, 2];
/// IF-MIB::ifDescr, indexed by ifIndex
pub const IF_DESCR: &[u32] = &[1, 3, 6, 1, 2, 1, 2, 2, 1, 2];
/// IF-MIB::ifName, indexed by ifIndex
pub const IF_NAME: &[u32] = &[1, 3, 6, 1, 2, 1, 31, 1, 1, 1, 1];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid object identifier '{0}'")]
pub struct OidParseError(pub String);

/// An object identifier as a sequence of arcs.
///
/// Ordering is lexicographic over the arcs, which is the order an agent
/// walks its MIB in.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Oid(Vec<u32>);

impl Oid {
    pub fn new(arcs: Vec<u32>) -> Self {
        Self(arcs)
    }

    pub fn arcs(&self) -> &[u32] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// True if `self` lies strictly inside the subtree rooted at `root`.
    pub fn is_under(&self, root: &Oid) -> bool {
        self.0.len() > root.0.len() && self.0.starts_with(&root.0)
    }

    pub fn ends_with(&self, suffix: &[u32]) -> bool {
        self.0.ends_with(suffix)
    }

    pub fn last_arc(&self) -> Option<u32> {
        self.0.last().copied()
    }

    /// A new OID with `suffix` appended.
    pub fn child(&self, suffix: &[u32]) -> Oid {
        let mut arcs = Vec::with_capacity(self.0.len() + suffix.len());
        arcs.extend_from_slice(&self.0);
        arcs.extend_from_slice(suffix);
        Oid(arcs)
    }
}

impl FromStr for Oid {
    type Err = OidParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim().trim_start_matches('.');
        if trimmed.is_empty() {
            return Err(OidParseError(s.to_string()));
        }

        let arcs = trimmed
            .split('.')
            .map(|part| part.parse::<u32>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|_| OidParseError(s.to_string()))?;

        // BER needs at least two arcs and a first arc of 0, 1 or 2
        if arcs.len() < 2 || arcs[0] > 2 || (arcs[0] < 2 && arcs[1] >= 40) {
            return Err(OidParseError(s.to_string()));
        }

        Ok(Oid(arcs))
    }
}

impl fmt::Display for Oid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, arc) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            write!(f, "{}", arc)?;
        }
        Ok(())
    }
}

impl From<&[u32]> for Oid {
    fn from(arcs: &[u32]) -> Self {
        Oid(arcs.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_and_displays_dotted_form() {
        let oid: Oid = ".1.3.6.1.2.1.17.4.3.1.2".parse().unwrap();
        assert_eq!(oid, Oid::from(DOT1D_TP_FDB_PORT));
        assert_eq!(oid.to_string(), "1.3.6.1.2.1.17.4.3.1.2");
        assert_eq!(oid.len(), 11);
    }

    #[test]
    fn rejects_malformed_text() {
        assert!("".parse::<Oid>().is_err());
        assert!("1".parse::<Oid>().is_err());
        assert!("1.3.x".parse::<Oid>().is_err());
        assert!("3.1".parse::<Oid>().is_err());
        assert!("1.40".parse::<Oid>().is_err());
    }

    #[test]
    fn subtree_membership_excludes_the_root_itself() {
        let root = Oid::from(IF_NAME);
        assert!(root.child(&[7]).is_under(&root));
        assert!(!root.is_under(&root));
        assert!(!Oid::from(IF_DESCR).child(&[7]).is_under(&root));
    }

    #[test]
    fn orders_lexicographically() {
        let a: Oid = "1.3.6.1.2.1.2.2.1.2.10".parse().unwrap();
        let b: Oid = "1.3.6.1.2.1.2.2.1.2.9".parse().unwrap();
        let c: Oid = "1.3.6.1.2.1.2.2.1.3".parse().unwrap();
        assert!(b < a, "arcs compare numerically, not textually");
        assert!(a < c);
    }
}
