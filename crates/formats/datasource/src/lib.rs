//! Positioned, endian-aware binary I/O over files and byte buffers.
//!
//! - [`ByteSource`] / [`ByteSink`]: read and write capabilities. Fixed-width
//!   little- and big-endian integers, variable-width integers, raw bytes and
//!   bit-exact floats are provided on top of a handful of backend methods.
//! - Backends: [`StreamSource`] / [`StreamSink`] own a file handle,
//!   [`BufferSource`] / [`BufferSink`] borrow a slice, [`VecSink`] grows its
//!   own buffer. Every buffer access is bounds-checked.
//! - [`FlexArchive`]: the flex container format, built on the above.

pub mod buffer;
pub mod error;
pub mod flex;
pub mod sink;
pub mod source;
pub mod stream;

pub use buffer::{BufferSink, BufferSource, VecSink};
pub use error::{Error, Result};
pub use flex::{FlexArchive, FlexEntry};
pub use sink::ByteSink;
pub use source::ByteSource;
pub use stream::{StreamSink, StreamSource};
