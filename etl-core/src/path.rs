//! Canonical on-disk paths for the `compressed/` input tree and the pipeline's outputs.

use crate::variable::VariableKey;
use std::path::PathBuf;

/// Pure path mapping rooted at `root` — the process's working directory in production, a
/// temporary directory in tests. Never opens a file.
#[derive(Clone, Debug)]
pub struct Layout {
    root: PathBuf,
    index_name: String,
}

impl Layout {
    pub fn new(root: impl Into<PathBuf>, index_name: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            index_name: index_name.into(),
        }
    }

    pub fn group_dir(&self, group: usize) -> PathBuf {
        self.root.join("compressed").join(group.to_string())
    }

    pub fn chunk_eid_file(&self, group: usize, chunk: usize) -> PathBuf {
        self.group_dir(group).join(format!("chunk{chunk:04}.eid"))
    }

    pub fn variable_tag_file(&self, group: usize, chunk: usize) -> PathBuf {
        self.group_dir(group).join(format!("variable_{chunk}_tag.txt"))
    }

    pub fn variable_file(&self, group: usize, chunk: usize, key: VariableKey) -> PathBuf {
        self.group_dir(group)
            .join(format!("variable_{chunk}"))
            .join(key.to_string())
    }

    pub fn timestamp_file(&self, group: usize) -> PathBuf {
        self.group_dir(group).join("timestamp")
    }

    pub fn log_file(&self, group: usize) -> PathBuf {
        self.group_dir(group).join("log")
    }

    pub fn parquets_dir(&self) -> PathBuf {
        self.root.join("parquets")
    }

    pub fn parquet_file(&self, k: usize) -> PathBuf {
        self.parquets_dir().join(format!("{}{k}.parquet", self.index_name))
    }

    pub fn maui_file(&self) -> PathBuf {
        self.root.join(format!("{}.maui", self.index_name))
    }

    pub fn maui_offsets_file(&self) -> PathBuf {
        self.root.join(format!("{}.maui.offsets", self.index_name))
    }

    pub fn compacted_type_file(&self, t: u8) -> PathBuf {
        self.root.join("compressed").join(format!("compacted_type_{t}"))
    }

    pub fn compacted_type_lineno_file(&self, t: u8) -> PathBuf {
        self.root
            .join("compressed")
            .join(format!("compacted_type_{t}_lineno"))
    }

    pub fn outlier_file(&self) -> PathBuf {
        self.root.join("compressed").join("outlier")
    }

    pub fn outlier_lineno_file(&self) -> PathBuf {
        self.root.join("compressed").join("outlier_lineno")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layout() -> Layout {
        Layout::new("/root", "idx")
    }

    #[test]
    fn chunk_path_zero_pads_to_four_digits() {
        assert_eq!(
            layout().chunk_eid_file(3, 7),
            PathBuf::from("/root/compressed/3/chunk0007.eid")
        );
    }

    #[test]
    fn variable_path_uses_key_display_form() {
        let key = VariableKey::new(0, 0);
        assert_eq!(
            layout().variable_file(1, 2, key),
            PathBuf::from("/root/compressed/1/variable_2/E0_V0")
        );
    }

    #[test]
    fn parquet_files_are_indexed_under_the_index_name() {
        assert_eq!(
            layout().parquet_file(4),
            PathBuf::from("/root/parquets/idx4.parquet")
        );
    }

    #[test]
    fn type_zero_lineno_path_is_still_derivable_even_though_never_written() {
        assert_eq!(
            layout().compacted_type_lineno_file(0),
            PathBuf::from("/root/compressed/compacted_type_0_lineno")
        );
    }
}
