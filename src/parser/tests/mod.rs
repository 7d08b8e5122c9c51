//! Test utilities for the streaming registry parser

use super::ChunkReader;
use crate::models::Chunk;
use std::io::Cursor;


/// Build a reader over in-memory bytes
pub fn reader_over(bytes: &[u8], fields: usize, chunk_size: usize) -> ChunkReader<Cursor<Vec<u8>>> {
    ChunkReader::new(Cursor::new(bytes.to_vec()), fields, chunk_size).unwrap()
}

/// Drain a reader into its chunks, panicking on I/O errors
pub fn collect_chunks(bytes: &[u8], fields: usize, chunk_size: usize) -> Vec<Chunk> {
    reader_over(bytes, fields, chunk_size)
        .collect::<crate::Result<Vec<_>>>()
        .unwrap()
}

/// Flatten chunks into plain field vectors
pub fn rows_of(chunks: &[Chunk]) -> Vec<Vec<String>> {
    chunks
        .iter()
        .flat_map(|chunk| chunk.iter().map(|record| record.fields().to_vec()))
        .collect()
}
