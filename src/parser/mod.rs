//! Streaming parser for pipe-delimited registry files
//!
//! Turns a raw byte stream into a lazy sequence of bounded [`Chunk`]s.
//! Records split across physical lines are reassembled by counting field
//! delimiters; line groups that end up with too many delimiters are dropped
//! without aborting the stream.
//!
//! ## Architecture
//!
//! - [`reader`] - line reassembly, drop policy and chunk batching
//! - [`encoding`] - single-byte Latin decoding and encoding
//! - [`stats`] - counters for lines read, records parsed and groups dropped
//!
//! ## Usage
//!
//! ```rust,no_run
//! use padron_analyzer::models::Schema;
//! use padron_analyzer::parser::ChunkReader;
//!
//! # fn example() -> padron_analyzer::Result<()> {
//! let schema = Schema::emp();
//! let mut reader = ChunkReader::open("padrones/emp_2024.txt", schema.width(), 50_000)?;
//! for chunk in reader.by_ref() {
//!     let chunk = chunk?;
//!     println!("{} records", chunk.len());
//! }
//! println!("dropped {} line groups", reader.stats().groups_dropped);
//! # Ok(())
//! # }
//! ```
//!
//! [`Chunk`]: crate::models::Chunk

pub mod encoding;
pub mod reader;
pub mod stats;

#[cfg(test)]
pub mod tests;

pub use encoding::{decode_latin1, encode_latin1};
pub use reader::ChunkReader;
pub use stats::ParseStats;
