//! Buffers `(timestamp, log)` rows and flushes row-group-aligned Parquet files.

use crate::config::RowGroupConfig;
use crate::error::{EtlError, Result};
use crate::path::Layout;
use arrow_array::{ArrayRef, RecordBatch, StringArray};
use arrow_schema::{DataType, Field, Schema};
use parquet::arrow::arrow_writer::ArrowWriter;
use parquet::basic::{Compression, ZstdLevel};
use parquet::file::properties::WriterProperties;
use std::fs::{self, File};
use std::io::{BufRead, BufReader};
use std::sync::Arc;

fn schema() -> Arc<Schema> {
    Arc::new(Schema::new(vec![
        Field::new("timestamp", DataType::Utf8, false),
        Field::new("log", DataType::Utf8, false),
    ]))
}

fn writer_properties(row_group_size: usize, zstd_level: i32) -> Result<WriterProperties> {
    let level = ZstdLevel::try_new(zstd_level)
        .map_err(|e| EtlError::ColumnarSink(format!("invalid zstd level: {e}")))?;
    Ok(WriterProperties::builder()
        .set_compression(Compression::ZSTD(level))
        .set_max_row_group_size(row_group_size)
        .build())
}

/// Accumulates `(timestamp, log)` rows across groups and flushes row-group-aligned
/// `<indexName><k>.parquet` files as soon as a full file's worth of rows is buffered.
pub struct ColumnarSink {
    layout: Layout,
    config: RowGroupConfig,
    zstd_level: i32,
    schema: Arc<Schema>,
    timestamps: Vec<String>,
    logs: Vec<String>,
    next_file: usize,
}

impl ColumnarSink {
    pub fn new(layout: Layout, config: RowGroupConfig, zstd_level: i32) -> Result<Self> {
        let dir = layout.parquets_dir();
        if dir.exists() {
            fs::remove_dir_all(&dir)?;
        }
        fs::create_dir_all(&dir)?;
        Ok(Self {
            layout,
            config,
            zstd_level,
            schema: schema(),
            timestamps: Vec::new(),
            logs: Vec::new(),
            next_file: 0,
        })
    }

    /// Reads `timestamp` and `log` of `group` line-by-line in lock-step and buffers the rows,
    /// flushing any row-group-aligned files that become ready.
    pub fn append_group_rows(&mut self, group: usize) -> Result<()> {
        let ts = BufReader::new(File::open(self.layout.timestamp_file(group))?);
        let lg = BufReader::new(File::open(self.layout.log_file(group))?);
        for (t, l) in ts.lines().zip(lg.lines()) {
            self.timestamps.push(t?);
            self.logs.push(l?);
        }
        self.flush_ready()
    }

    fn flush_ready(&mut self) -> Result<()> {
        let file_rows = self.config.row_group_size * self.config.row_groups_per_file;
        while self.timestamps.len() >= file_rows {
            let ts: Vec<String> = self.timestamps.drain(..file_rows).collect();
            let lg: Vec<String> = self.logs.drain(..file_rows).collect();
            self.write_file(ts, lg)?;
        }
        Ok(())
    }

    fn write_file(&mut self, timestamps: Vec<String>, logs: Vec<String>) -> Result<()> {
        let path = self.layout.parquet_file(self.next_file);
        self.next_file += 1;

        let file = File::create(&path)?;
        let props = writer_properties(self.config.row_group_size, self.zstd_level)?;
        let mut writer = ArrowWriter::try_new(file, self.schema.clone(), Some(props))
            .map_err(|e| EtlError::ColumnarSink(e.to_string()))?;

        let batch = RecordBatch::try_new(
            self.schema.clone(),
            vec![
                Arc::new(StringArray::from_iter_values(timestamps)) as ArrayRef,
                Arc::new(StringArray::from_iter_values(logs)) as ArrayRef,
            ],
        )
        .map_err(|e| EtlError::ColumnarSink(e.to_string()))?;

        writer.write(&batch).map_err(|e| EtlError::ColumnarSink(e.to_string()))?;
        writer.close().map_err(|e| EtlError::ColumnarSink(e.to_string()))?;
        Ok(())
    }

    /// Writes the remaining buffered rows as one final file, even if empty.
    pub fn finalize(mut self) -> Result<()> {
        let timestamps = std::mem::take(&mut self.timestamps);
        let logs = std::mem::take(&mut self.logs);
        self.write_file(timestamps, logs)
    }
}
