//! Orchestrates the two-pass ETL run and owns global line numbering.

use crate::columnar::ColumnarSink;
use crate::compactor::TypeCompactor;
use crate::config::{CompactionConfig, DictionaryConfig, RowGroupConfig, ZSTD_LEVEL};
use crate::dictionary;
use crate::error::{EtlError, Result};
use crate::metadata;
use crate::path::Layout;
use crate::varbuf::VariableBufferWriter;
use crate::variable::VariableKey;
use std::collections::{BTreeSet, HashMap};
use std::fs::{self, File};
use std::io::{BufRead, BufReader, Lines, Write};
use std::path::Path;

/// Every tunable the pipeline exposes, independent of the CLI.
#[derive(Clone, Debug)]
pub struct Config {
    pub row_group: RowGroupConfig,
    pub dictionary: DictionaryConfig,
    pub compaction: CompactionConfig,
    pub zstd_level: i32,
    pub clean_stale_outputs: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            row_group: RowGroupConfig::default(),
            dictionary: DictionaryConfig::default(),
            compaction: CompactionConfig::default(),
            zstd_level: ZSTD_LEVEL,
            clean_stale_outputs: true,
        }
    }
}

/// Runs the full two-pass pipeline rooted at `root`, writing all outputs under it.
pub fn run(root: impl Into<std::path::PathBuf>, index_name: &str, num_groups: usize, config: &Config) -> Result<()> {
    let layout = Layout::new(root.into(), index_name);

    let total_chunks: Vec<usize> = (0..num_groups).map(|g| count_chunks(&layout, g)).collect();

    if config.clean_stale_outputs {
        clean_stale_outputs(&layout)?;
    }

    eprintln!("building dictionary across {num_groups} group(s)...");
    let dict = dictionary::build(&layout, &total_chunks, &config.dictionary)?;
    eprintln!("dictionary built: {} item(s)", dict.len());

    let mut columnar = ColumnarSink::new(layout.clone(), config.row_group, config.zstd_level)?;
    let mut varbuf = VariableBufferWriter::create(&layout, config.row_group, config.zstd_level)?;
    let mut compactor = TypeCompactor::create(layout.clone(), config.compaction)?;
    let mut global_line_number: u64 = 0;

    for group in 0..num_groups {
        eprintln!("processing group {group}/{num_groups}...");
        let chunks = total_chunks[group];
        let meta = metadata::load(&layout, group, chunks)?;
        let eid_to_variables = meta.eid_to_variables();
        let touched_types = meta.touched_types();

        columnar.append_group_rows(group)?;

        for chunk in 0..chunks {
            let vars = meta.chunk_variables.get(&chunk).cloned().unwrap_or_default();
            let mut readers = open_variable_readers(&layout, group, chunk, &vars)?;

            let eids = read_eid_sequence(&layout.chunk_eid_file(group, chunk))?;
            for eid in eids {
                let row_group_id = (global_line_number / config.row_group.row_group_size as u64) as usize;

                if eid >= 0 {
                    if let Some(vars) = eid_to_variables.get(&eid) {
                        for &key in vars {
                            let reader = readers.get_mut(&key).ok_or_else(|| {
                                EtlError::MissingInput(format!("no open reader for {key}"))
                            })?;
                            let item = reader
                                .next()
                                .transpose()?
                                .ok_or_else(|| EtlError::MissingInput(format!("exhausted stream for {key}")))?;
                            varbuf.push_cell(&item);
                            let ty = if dict.contains(&item) { 0 } else { *meta.variable_to_type.get(&key).unwrap_or(&0) };
                            compactor.record(ty, &item, row_group_id);
                        }
                    }
                }

                varbuf.end_row()?;
                global_line_number += 1;
            }

            for &ty in &touched_types {
                compactor.maybe_flush(ty, false)?;
            }
        }

        compactor.finalize_group(&touched_types)?;
    }

    let offsets = varbuf.finalize()?;
    persist_offsets(&layout.maui_offsets_file(), &offsets)?;
    columnar.finalize()?;

    Ok(())
}

fn count_chunks(layout: &Layout, group: usize) -> usize {
    let mut chunks = 0;
    while layout.chunk_eid_file(group, chunks).exists() {
        chunks += 1;
    }
    chunks
}

fn clean_stale_outputs(layout: &Layout) -> Result<()> {
    let dir = layout.outlier_file().parent().unwrap().to_owned();
    if !dir.exists() {
        return Ok(());
    }
    for entry in fs::read_dir(&dir)? {
        let entry = entry?;
        let name = entry.file_name();
        let name = name.to_string_lossy();
        if name.starts_with("compacted_type_") || name.starts_with("outlier") {
            fs::remove_file(entry.path())?;
        }
    }
    Ok(())
}

fn read_eid_sequence(path: &Path) -> Result<Vec<i64>> {
    let text = fs::read_to_string(path)
        .map_err(|_| EtlError::MissingInput(format!("chunk eid file not found: {}", path.display())))?;
    text.lines()
        .map(|l| {
            l.trim()
                .parse()
                .map_err(|_| EtlError::MalformedMetadata(format!("malformed eid line: {l:?}")))
        })
        .collect()
}

fn open_variable_readers(
    layout: &Layout,
    group: usize,
    chunk: usize,
    vars: &BTreeSet<VariableKey>,
) -> Result<HashMap<VariableKey, Lines<BufReader<File>>>> {
    let mut readers = HashMap::new();
    for &key in vars {
        let path = layout.variable_file(group, chunk, key);
        let file = File::open(&path)
            .map_err(|_| EtlError::MissingInput(format!("variable file not found: {}", path.display())))?;
        readers.insert(key, BufReader::new(file).lines());
    }
    Ok(readers)
}

fn persist_offsets(path: &Path, offsets: &[u64]) -> Result<()> {
    let mut bytes = Vec::with_capacity(offsets.len() * 8);
    for &offset in offsets {
        bytes.extend_from_slice(&offset.to_le_bytes());
    }
    let mut file = File::create(path)?;
    file.write_all(&bytes)?;
    Ok(())
}
