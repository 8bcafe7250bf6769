//! Loads per-chunk variable-tag metadata for one group.

use crate::config::DICTIONARY_TYPE;
use crate::error::{EtlError, Result};
use crate::path::Layout;
use crate::variable::VariableKey;
use std::collections::{BTreeSet, HashMap};
use std::fs;

#[derive(Debug, Default)]
pub struct GroupMetadata {
    pub variable_to_type: HashMap<VariableKey, u8>,
    pub chunk_variables: HashMap<usize, BTreeSet<VariableKey>>,
}

impl GroupMetadata {
    /// `eid -> [VariableKey]` in ascending `(eid, varIndex)` order, derived from the keys of
    /// `variable_to_type`.
    pub fn eid_to_variables(&self) -> HashMap<i64, Vec<VariableKey>> {
        let mut keys: Vec<VariableKey> = self.variable_to_type.keys().copied().collect();
        keys.sort();
        let mut out: HashMap<i64, Vec<VariableKey>> = HashMap::new();
        for key in keys {
            out.entry(key.eid).or_default().push(key);
        }
        out
    }

    /// `{0} ∪ image(variable_to_type)`.
    pub fn touched_types(&self) -> BTreeSet<u8> {
        let mut types: BTreeSet<u8> = self.variable_to_type.values().copied().collect();
        types.insert(DICTIONARY_TYPE);
        types
    }
}

/// Reads chunks `0..total_chunks` of `group`'s tag files. Every tag file must exist.
pub fn load(layout: &Layout, group: usize, total_chunks: usize) -> Result<GroupMetadata> {
    let mut meta = GroupMetadata::default();
    for chunk in 0..total_chunks {
        let tag_path = layout.variable_tag_file(group, chunk);
        let text = fs::read_to_string(&tag_path).map_err(|_| {
            EtlError::MissingInput(format!("tag file not found: {}", tag_path.display()))
        })?;

        let mut vars = BTreeSet::new();
        for line in text.lines() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let (key_str, type_str) = line
                .split_once(' ')
                .ok_or_else(|| EtlError::MalformedMetadata(format!("malformed tag line: {line:?}")))?;
            let key = VariableKey::parse(key_str)?;
            let ty: u8 = type_str
                .trim()
                .parse()
                .map_err(|_| EtlError::MalformedMetadata(format!("malformed type in tag line: {line:?}")))?;
            meta.variable_to_type.insert(key, ty);
            vars.insert(key);
        }
        meta.chunk_variables.insert(chunk, vars);
    }
    Ok(meta)
}
