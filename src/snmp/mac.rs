//! Client hardware addresses as they appear in bridge forwarding tables

use std::fmt;
use std::str::FromStr;

use serde::{Serialize, Serializer};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MacParseError {
    #[error("MAC address '{input}' has {found} groups, expected 6")]
    WrongGroupCount { input: String, found: usize },

    #[error("MAC address '{input}' has an invalid group '{group}'")]
    InvalidGroup { input: String, group: String },
}

/// A six-octet MAC address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MacAddress([u8; 6]);

impl MacAddress {
    pub fn new(octets: [u8; 6]) -> Self {
        Self(octets)
    }

    pub fn octets(&self) -> [u8; 6] {
        self.0
    }

    /// The octets as OID arcs, e.g. `170.187.204.221.238.255` for
    /// `aa:bb:cc:dd:ee:ff`. dot1dTpFdbTable rows are indexed this way.
    pub fn oid_suffix(&self) -> [u32; 6] {
        self.0.map(u32::from)
    }

    pub fn is_zero(&self) -> bool {
        self.0 == [0; 6]
    }
}

impl FromStr for MacAddress {
    type Err = MacParseError;

    /// Accepts `:` or `-` between groups of one or two hex digits.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let input = s.trim();
        let groups: Vec<&str> = input.split([':', '-']).collect();
        if groups.len() != 6 {
            return Err(MacParseError::WrongGroupCount {
                input: input.to_string(),
                found: groups.len(),
            });
        }

        let mut octets = [0u8; 6];
        for (octet, group) in octets.iter_mut().zip(&groups) {
            let valid = (1..=2).contains(&group.len())
                && group.chars().all(|c| c.is_ascii_hexdigit());
            if !valid {
                return Err(MacParseError::InvalidGroup {
                    input: input.to_string(),
                    group: group.to_string(),
                });
            }
            *octet = u8::from_str_radix(group, 16).map_err(|_| MacParseError::InvalidGroup {
                input: input.to_string(),
                group: group.to_string(),
            })?;
        }

        Ok(Self(octets))
    }
}

impl fmt::Display for MacAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c, d, e, g] = self.0;
        // padded so table columns line up
        f.pad(&format!(
            "{:02x}:{:02x}:{:02x}:{:02x}:{:02x}:{:02x}",
            a, b, c, d, e, g
        ))
    }
}

impl Serialize for MacAddress {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}
