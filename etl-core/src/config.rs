//! Tunable constants for the ETL pipeline and their defaults.

pub const ROW_GROUP_SIZE: usize = 100_000;
pub const ROW_GROUPS_PER_FILE: usize = 10;
pub const COMPACTION_WINDOW: usize = 1_000_000;
pub const OUTLIER_THRESHOLD: usize = 1_000;

pub const DICT_SAMPLE_CHUNKS: usize = 5;
pub const DICT_CHUNK_RATIO_THRESHOLD: f64 = 0.6;
pub const DICT_GROUP_RATIO_THRESHOLD: f64 = 0.6;
/// Disabled by default. See [`DictionaryConfig::num_threshold`].
pub const DICT_NUM_THRESHOLD: usize = 100;

pub const ZSTD_LEVEL: i32 = 3;

/// Type id reserved for dictionary-matched items; always present in a group's touched-types set.
pub const DICTIONARY_TYPE: u8 = 0;

#[derive(Clone, Copy, Debug)]
pub struct DictionaryConfig {
    pub sample_chunks: usize,
    pub chunk_ratio_threshold: f64,
    pub group_ratio_threshold: f64,
    /// When `Some(n)`, additionally requires the raw occurrence count across the sample to
    /// exceed `n`. Disabled by default.
    pub num_threshold: Option<usize>,
}

impl Default for DictionaryConfig {
    fn default() -> Self {
        Self {
            sample_chunks: DICT_SAMPLE_CHUNKS,
            chunk_ratio_threshold: DICT_CHUNK_RATIO_THRESHOLD,
            group_ratio_threshold: DICT_GROUP_RATIO_THRESHOLD,
            num_threshold: None,
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub struct RowGroupConfig {
    pub row_group_size: usize,
    pub row_groups_per_file: usize,
}

impl Default for RowGroupConfig {
    fn default() -> Self {
        Self {
            row_group_size: ROW_GROUP_SIZE,
            row_groups_per_file: ROW_GROUPS_PER_FILE,
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub struct CompactionConfig {
    pub window: usize,
    pub outlier_threshold: usize,
}

impl Default for CompactionConfig {
    fn default() -> Self {
        Self {
            window: COMPACTION_WINDOW,
            outlier_threshold: OUTLIER_THRESHOLD,
        }
    }
}
