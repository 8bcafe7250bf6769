//! The `(eid, varIndex)` pair identifying one template parameter slot.

use crate::error::{EtlError, Result};
use std::cmp::Ordering;
use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct VariableKey {
    pub eid: i64,
    pub var_index: i64,
}

impl VariableKey {
    pub fn new(eid: i64, var_index: i64) -> Self {
        Self { eid, var_index }
    }

    /// Parses `E<eid>_V<varIndex>`.
    pub fn parse(s: &str) -> Result<Self> {
        let rest = s.strip_prefix('E').ok_or_else(|| malformed(s))?;
        let (eid_str, var_str) = rest.split_once("_V").ok_or_else(|| malformed(s))?;
        let eid = eid_str.parse().map_err(|_| malformed(s))?;
        let var_index = var_str.parse().map_err(|_| malformed(s))?;
        Ok(Self { eid, var_index })
    }
}

fn malformed(s: &str) -> EtlError {
    EtlError::MalformedMetadata(format!("invalid variable key: {s:?}"))
}

impl fmt::Display for VariableKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "E{}_V{}", self.eid, self.var_index)
    }
}

impl PartialOrd for VariableKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for VariableKey {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.eid, self.var_index).cmp(&(other.eid, other.var_index))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_and_displays() {
        let k = VariableKey::parse("E12_V3").unwrap();
        assert_eq!(k, VariableKey::new(12, 3));
        assert_eq!(k.to_string(), "E12_V3");
    }

    #[test]
    fn rejects_malformed() {
        assert!(VariableKey::parse("E12V3").is_err());
        assert!(VariableKey::parse("X12_V3").is_err());
        assert!(VariableKey::parse("E12_Vx").is_err());
    }

    #[test]
    fn orders_lexicographically_on_eid_then_var_index() {
        let a = VariableKey::new(1, 9);
        let b = VariableKey::new(2, 0);
        let c = VariableKey::new(1, 10);
        assert!(a < b);
        assert!(a < c);
    }
}
