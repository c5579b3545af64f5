//! Version triples as declared in pack manifests (`[1, 0, 0]`).

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A `major.minor.patch` version. Ordering is lexicographic over the triple.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(from = "[u32; 3]", into = "[u32; 3]")]
pub struct PackVersion {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

impl PackVersion {
    #[must_use]
    pub const fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }
}

impl From<[u32; 3]> for PackVersion {
    fn from([major, minor, patch]: [u32; 3]) -> Self {
        Self::new(major, minor, patch)
    }
}

impl From<PackVersion> for [u32; 3] {
    fn from(v: PackVersion) -> Self {
        [v.major, v.minor, v.patch]
    }
}

impl fmt::Display for PackVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

impl FromStr for PackVersion {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.trim().split('.').collect();
        if parts.len() != 3 {
            return Err(crate::Error::InvalidVersion(s.to_string()));
        }
        let mut out = [0u32; 3];
        for (slot, part) in out.iter_mut().zip(&parts) {
            *slot = part
                .parse()
                .map_err(|_| crate::Error::InvalidVersion(s.to_string()))?;
        }
        Ok(Self::from(out))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_manifest_array() {
        let v: PackVersion = serde_json::from_str("[1, 20, 3]").unwrap();
        assert_eq!(v, PackVersion::new(1, 20, 3));
        assert_eq!(v.to_string(), "1.20.3");
    }

    #[test]
    fn rejects_short_array() {
        assert!(serde_json::from_str::<PackVersion>("[1, 2]").is_err());
    }

    #[test]
    fn ordering_is_lexicographic() {
        assert!(PackVersion::new(1, 2, 0) < PackVersion::new(1, 10, 0));
        assert!(PackVersion::new(2, 0, 0) > PackVersion::new(1, 99, 99));
    }

    #[test]
    fn from_str_requires_three_numeric_parts() {
        assert_eq!("0.1.2".parse::<PackVersion>().unwrap(), PackVersion::new(0, 1, 2));
        assert!("1.2".parse::<PackVersion>().is_err());
        assert!("1.x.2".parse::<PackVersion>().is_err());
    }
}
