// crates/lg_foundation/src/lib.rs

//! Lagrange Foundation Layer
//!
//! 颗粒追踪项目的基础层，提供跨 crate 共享的基础抽象。
//!
//! # 模块概览
//!
//! - [`index`]: 强类型索引（单元、面、边界片）
//! - [`error`]: 统一错误类型
//! - [`tolerance`]: 追踪几何容差
//!
//! # 示例
//!
//! ```
//! use lg_foundation::{
//!     index::{CellIndex, FaceIndex},
//!     error::{LgError, LgResult},
//! };
//!
//! let cell = CellIndex::new(3);
//! assert_eq!(cell.get(), 3);
//!
//! fn load() -> LgResult<()> {
//!     Err(LgError::format("origId", "标签不匹配"))
//! }
//! assert!(load().is_err());
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod index;
pub mod tolerance;

// 重导出常用类型
pub use error::{LgError, LgResult};
pub use index::{CellIndex, FaceIndex, Idx, IndexKind, PatchIndex};
pub use tolerance::TrackTolerance;

