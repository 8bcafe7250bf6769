//! Reads the first K existing per-chunk files for one variable.

use crate::error::Result;
use crate::path::Layout;
use crate::variable::VariableKey;
use std::collections::HashMap;
use std::fs;

/// Walks chunks `0, 1, …` until `k` chunks with an existing per-variable file are found,
/// returning their contents keyed by the 0-based index among the sampled chunks. Fewer than
/// `k` matching chunks is permitted.
pub fn sample_variable(
    layout: &Layout,
    group: usize,
    total_chunks: usize,
    key: VariableKey,
    k: usize,
) -> Result<HashMap<usize, Vec<String>>> {
    let mut out = HashMap::new();
    let mut found = 0;
    for chunk in 0..total_chunks {
        if found >= k {
            break;
        }
        let path = layout.variable_file(group, chunk, key);
        if !path.exists() {
            continue;
        }
        let text = fs::read_to_string(&path)?;
        let lines: Vec<String> = text.lines().map(str::to_owned).collect();
        out.insert(found, lines);
        found += 1;
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_variable(layout: &Layout, group: usize, chunk: usize, key: VariableKey, contents: &str) {
        let path = layout.variable_file(group, chunk, key);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, contents).unwrap();
    }

    #[test]
    fn samples_up_to_k_existing_chunks_in_order() {
        let dir = TempDir::new().unwrap();
        let layout = Layout::new(dir.path(), "idx");
        let key = VariableKey::new(0, 0);
        write_variable(&layout, 0, 0, key, "a\nb\n");
        write_variable(&layout, 0, 2, key, "c\n");
        write_variable(&layout, 0, 3, key, "d\n");

        let sampled = sample_variable(&layout, 0, 5, key, 2).unwrap();
        assert_eq!(sampled.len(), 2);
        assert_eq!(sampled[&0], vec!["a", "b"]);
        assert_eq!(sampled[&1], vec!["c"]);
    }

    #[test]
    fn fewer_than_k_matches_is_permitted() {
        let dir = TempDir::new().unwrap();
        let layout = Layout::new(dir.path(), "idx");
        let key = VariableKey::new(0, 0);
        write_variable(&layout, 0, 0, key, "");

        let sampled = sample_variable(&layout, 0, 1, key, 5).unwrap();
        assert_eq!(sampled.len(), 1);
        assert!(sampled[&0].is_empty());
    }

    #[test]
    fn no_matching_chunks_yields_an_empty_map() {
        let dir = TempDir::new().unwrap();
        let layout = Layout::new(dir.path(), "idx");
        let key = VariableKey::new(9, 9);
        let sampled = sample_variable(&layout, 0, 3, key, 5).unwrap();
        assert!(sampled.is_empty());
    }
}
