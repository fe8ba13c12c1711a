// crates/lg_io/src/lib.rs

//! Lagrange IO 层
//!
//! 颗粒云持久化所用的带标签文本对象流。
//!
//! - [`stream`]: `StreamWriter` / `StreamReader`
//! - [`error`]: `StreamError`
//!
//! # 示例
//!
//! ```
//! use lg_io::{StreamReader, StreamWriter};
//!
//! let mut w = StreamWriter::new(Vec::new());
//! w.write_scalar_field("d", &[1e-3, 2e-3]).unwrap();
//! let bytes = w.into_inner();
//!
//! let mut r = StreamReader::new(&bytes[..]);
//! assert_eq!(r.read_scalar_field("d", Some(2)).unwrap(), vec![1e-3, 2e-3]);
//! ```

#![warn(clippy::all)]

pub mod error;
pub mod stream;

pub use error::{StreamError, StreamResult};
pub use stream::{StreamReader, StreamWriter, Token};
