//! Block-compresses per-row concatenated variable text into the `.maui` side-channel.

use crate::config::RowGroupConfig;
use crate::error::{EtlError, Result};
use crate::path::Layout;
use std::fs::File;
use std::io::Write;

/// Owns the `.maui` file handle and the in-progress uncompressed buffer for the whole run.
pub struct VariableBufferWriter {
    file: File,
    row_group_size: usize,
    zstd_level: i32,
    buffer: Vec<u8>,
    rows_in_buffer: usize,
    offset: u64,
    offsets: Vec<u64>,
}

impl VariableBufferWriter {
    pub fn create(layout: &Layout, config: RowGroupConfig, zstd_level: i32) -> Result<Self> {
        let file = File::create(layout.maui_file())?;
        Ok(Self {
            file,
            row_group_size: config.row_group_size,
            zstd_level,
            buffer: Vec::new(),
            rows_in_buffer: 0,
            offset: 0,
            offsets: vec![0],
        })
    }

    pub fn push_cell(&mut self, text: &str) {
        self.buffer.extend_from_slice(text.as_bytes());
        self.buffer.push(b' ');
    }

    /// Ends the current row; flushes a compressed block whenever the logical row counter
    /// crosses a `row_group_size` boundary.
    pub fn end_row(&mut self) -> Result<()> {
        self.buffer.push(b'\n');
        self.rows_in_buffer += 1;
        if self.rows_in_buffer % self.row_group_size == 0 {
            self.flush_block()?;
        }
        Ok(())
    }

    fn flush_block(&mut self) -> Result<()> {
        let compressed = zstd::stream::encode_all(&self.buffer[..], self.zstd_level)
            .map_err(|e| EtlError::Codec(e.to_string()))?;
        self.file.write_all(&compressed)?;
        self.offset += compressed.len() as u64;
        self.offsets.push(self.offset);
        self.buffer.clear();
        self.rows_in_buffer = 0;
        Ok(())
    }

    /// Flushes any remaining partial block, closes the file, and returns the completed
    /// block-offset table.
    pub fn finalize(mut self) -> Result<Vec<u64>> {
        if self.rows_in_buffer > 0 {
            self.flush_block()?;
        }
        self.file.flush()?;
        Ok(self.offsets)
    }
}
