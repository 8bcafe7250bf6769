//! Bounded-window sort/dedup/merge compactor with outlier partitioning.

use crate::config::{CompactionConfig, DICTIONARY_TYPE};
use crate::error::Result;
use crate::path::Layout;
use std::collections::{BTreeSet, HashMap};
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;

#[derive(Default)]
struct TypeBucket {
    items: Vec<String>,
    lines: Vec<usize>,
}

/// Owns every compacted-type and outlier file handle for the whole run. Handles are opened
/// lazily on first dense flush for their type and released when this value is dropped.
pub struct TypeCompactor {
    layout: Layout,
    config: CompactionConfig,
    buckets: HashMap<u8, TypeBucket>,
    dense_files: HashMap<u8, File>,
    dense_lineno_files: HashMap<u8, File>,
    outlier_file: File,
    outlier_lineno_file: File,
}

impl TypeCompactor {
    pub fn create(layout: Layout, config: CompactionConfig) -> Result<Self> {
        let outlier_file = open_append(&layout.outlier_file())?;
        let outlier_lineno_file = open_append(&layout.outlier_lineno_file())?;
        Ok(Self {
            layout,
            config,
            buckets: HashMap::new(),
            dense_files: HashMap::new(),
            dense_lineno_files: HashMap::new(),
            outlier_file,
            outlier_lineno_file,
        })
    }

    pub fn record(&mut self, ty: u8, item: &str, row_group: usize) {
        let bucket = self.buckets.entry(ty).or_default();
        bucket.items.push(item.to_owned());
        bucket.lines.push(row_group);
    }

    pub fn maybe_flush(&mut self, ty: u8, force: bool) -> Result<()> {
        let should_flush = match self.buckets.get(&ty) {
            Some(b) if !b.items.is_empty() => b.items.len() > self.config.window || force,
            _ => false,
        };
        if !should_flush {
            return Ok(());
        }
        let bucket = self.buckets.remove(&ty).unwrap_or_default();
        self.compact_and_write(ty, bucket)
    }

    pub fn finalize_group(&mut self, touched_types: &BTreeSet<u8>) -> Result<()> {
        for &ty in touched_types {
            self.maybe_flush(ty, true)?;
        }
        Ok(())
    }

    fn compact_and_write(&mut self, ty: u8, bucket: TypeBucket) -> Result<()> {
        let mut paired: Vec<(String, usize)> = bucket.items.into_iter().zip(bucket.lines).collect();
        paired.sort_by(|a, b| a.0.cmp(&b.0).then(a.1.cmp(&b.1)));

        let mut compacted: Vec<(String, Vec<usize>)> = Vec::new();
        for (item, line) in paired {
            match compacted.last_mut() {
                Some((last_item, lines)) if *last_item == item => {
                    if lines.last() != Some(&line) {
                        lines.push(line);
                    }
                }
                _ => compacted.push((item, vec![line])),
            }
        }

        if compacted.len() > self.config.outlier_threshold {
            self.write_dense(ty, &compacted)
        } else {
            self.write_outlier(&compacted)
        }
    }

    fn write_dense(&mut self, ty: u8, compacted: &[(String, Vec<usize>)]) -> Result<()> {
        if !self.dense_files.contains_key(&ty) {
            self.dense_files
                .insert(ty, open_append(&self.layout.compacted_type_file(ty))?);
            if ty != DICTIONARY_TYPE {
                self.dense_lineno_files
                    .insert(ty, open_append(&self.layout.compacted_type_lineno_file(ty))?);
            }
        }
        for (item, lines) in compacted {
            writeln!(self.dense_files.get_mut(&ty).unwrap(), "{item}")?;
            if ty != DICTIONARY_TYPE {
                writeln!(self.dense_lineno_files.get_mut(&ty).unwrap(), "{}", format_lines(lines))?;
            }
        }
        Ok(())
    }

    fn write_outlier(&mut self, compacted: &[(String, Vec<usize>)]) -> Result<()> {
        for (item, lines) in compacted {
            writeln!(self.outlier_file, "{item}")?;
            writeln!(self.outlier_lineno_file, "{}", format_lines(lines))?;
        }
        Ok(())
    }
}

fn format_lines(lines: &[usize]) -> String {
    lines.iter().map(usize::to_string).collect::<Vec<_>>().join(" ")
}

fn open_append(path: &Path) -> Result<File> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    Ok(OpenOptions::new().create(true).append(true).open(path)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn layout() -> (TempDir, Layout) {
        let dir = TempDir::new().unwrap();
        let layout = Layout::new(dir.path(), "idx");
        (dir, layout)
    }

    #[test]
    fn dense_flush_writes_only_the_compacted_type_file() {
        let (_dir, layout) = layout();
        let config = CompactionConfig { window: 10, outlier_threshold: 1 };
        let mut c = TypeCompactor::create(layout.clone(), config).unwrap();
        for (item, rg) in [("a", 0), ("b", 0), ("a", 1)] {
            c.record(3, item, rg);
        }
        c.maybe_flush(3, true).unwrap();

        let dense = fs::read_to_string(layout.compacted_type_file(3)).unwrap();
        assert_eq!(dense.lines().collect::<Vec<_>>(), vec!["a", "b"]);
        let outlier = fs::read_to_string(layout.outlier_file()).unwrap();
        assert!(outlier.is_empty());
    }

    #[test]
    fn sparse_flush_routes_to_outlier_only() {
        let (_dir, layout) = layout();
        let config = CompactionConfig { window: 10, outlier_threshold: 1000 };
        let mut c = TypeCompactor::create(layout.clone(), config).unwrap();
        c.record(5, "x", 0);
        c.maybe_flush(5, true).unwrap();

        assert!(!layout.compacted_type_file(5).exists());
        let outlier = fs::read_to_string(layout.outlier_file()).unwrap();
        assert_eq!(outlier.trim(), "x");
    }

    #[test]
    fn type_zero_never_writes_a_lineno_file() {
        let (_dir, layout) = layout();
        let config = CompactionConfig { window: 10, outlier_threshold: 0 };
        let mut c = TypeCompactor::create(layout.clone(), config).unwrap();
        c.record(0, "dictword", 2);
        c.maybe_flush(0, true).unwrap();
        assert!(layout.compacted_type_file(0).exists());
        assert!(!layout.compacted_type_lineno_file(0).exists());
    }

    #[test]
    fn adjacent_duplicate_row_groups_are_deduped_within_an_entry() {
        let (_dir, layout) = layout();
        let config = CompactionConfig { window: 10, outlier_threshold: 0 };
        let mut c = TypeCompactor::create(layout.clone(), config).unwrap();
        c.record(2, "a", 0);
        c.record(2, "a", 0);
        c.record(2, "a", 1);
        c.maybe_flush(2, true).unwrap();
        let lineno = fs::read_to_string(layout.compacted_type_lineno_file(2)).unwrap();
        assert_eq!(lineno.trim(), "0 1");
    }

    #[test]
    fn repeated_flushes_append_separate_sorted_runs() {
        let (_dir, layout) = layout();
        let config = CompactionConfig { window: 10, outlier_threshold: 0 };
        let mut c = TypeCompactor::create(layout.clone(), config).unwrap();
        c.record(1, "z", 0);
        c.maybe_flush(1, true).unwrap();
        c.record(1, "z", 5);
        c.maybe_flush(1, true).unwrap();
        let dense = fs::read_to_string(layout.compacted_type_file(1)).unwrap();
        assert_eq!(dense.lines().filter(|l| *l == "z").count(), 2);
    }

    #[test]
    fn below_window_and_not_forced_does_not_flush() {
        let (_dir, layout) = layout();
        let config = CompactionConfig { window: 10, outlier_threshold: 0 };
        let mut c = TypeCompactor::create(layout.clone(), config).unwrap();
        c.record(1, "z", 0);
        c.maybe_flush(1, false).unwrap();
        assert!(!layout.compacted_type_file(1).exists());
    }
}
