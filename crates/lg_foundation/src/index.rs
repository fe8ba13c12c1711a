// crates/lg_foundation/src/index.rs

//! 强类型索引
//!
//! `Idx<K>` 用标记类型 `K` 在编译期区分单元、面和边界片编号。网格在追踪
//! 期间只读，编号就是一个 `u32`，`u32::MAX` 表示无效（例如移交途中尚未
//! 落到接收方单元的颗粒）。
//!
//! ```
//! use lg_foundation::index::{CellIndex, FaceIndex};
//!
//! let c = CellIndex::new(7);
//! assert!(c.is_valid());
//! assert_eq!(c.as_usize(), 7);
//! assert_eq!(format!("{:?}", c), "cell#7");
//! assert!(!FaceIndex::INVALID.is_valid());
//! ```

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;

/// 索引种类
pub trait IndexKind {
    /// 调试输出中的名称
    const NAME: &'static str;
}

/// 单元
#[derive(Debug, Clone, Copy)]
pub enum CellKind {}

/// 面
#[derive(Debug, Clone, Copy)]
pub enum FaceKind {}

/// 边界片
#[derive(Debug, Clone, Copy)]
pub enum PatchKindTag {}

impl IndexKind for CellKind {
    const NAME: &'static str = "cell";
}

impl IndexKind for FaceKind {
    const NAME: &'static str = "face";
}

impl IndexKind for PatchKindTag {
    const NAME: &'static str = "patch";
}

/// 单元编号
pub type CellIndex = Idx<CellKind>;
/// 面编号
pub type FaceIndex = Idx<FaceKind>;
/// 边界片编号
pub type PatchIndex = Idx<PatchKindTag>;

/// 强类型编号
#[derive(Serialize, Deserialize)]
#[serde(transparent, bound = "")]
#[repr(transparent)]
pub struct Idx<K> {
    raw: u32,
    #[serde(skip)]
    kind: PhantomData<fn() -> K>,
}

impl<K> Idx<K> {
    /// 无效编号
    pub const INVALID: Self = Self::new(u32::MAX);

    /// 由原始值创建
    #[inline]
    pub const fn new(raw: u32) -> Self {
        Self {
            raw,
            kind: PhantomData,
        }
    }

    /// 由 usize 创建
    #[inline]
    pub fn from_usize(index: usize) -> Self {
        debug_assert!(index < u32::MAX as usize, "编号超出 u32 范围");
        Self::new(index as u32)
    }

    /// 原始值
    #[inline]
    pub const fn get(self) -> u32 {
        self.raw
    }

    /// 作为数组下标
    #[inline]
    pub const fn as_usize(self) -> usize {
        self.raw as usize
    }

    /// 是否有效
    #[inline]
    pub const fn is_valid(self) -> bool {
        self.raw != u32::MAX
    }
}

// PhantomData<fn() -> K> 不要求 K 实现任何 trait，以下逐个手写

impl<K> Copy for Idx<K> {}

impl<K> Clone for Idx<K> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<K> Default for Idx<K> {
    fn default() -> Self {
        Self::INVALID
    }
}

impl<K> PartialEq for Idx<K> {
    fn eq(&self, other: &Self) -> bool {
        self.raw == other.raw
    }
}

impl<K> Eq for Idx<K> {}

impl<K> PartialOrd for Idx<K> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<K> Ord for Idx<K> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.raw.cmp(&other.raw)
    }
}

impl<K> Hash for Idx<K> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.raw.hash(state);
    }
}

impl<K: IndexKind> fmt::Debug for Idx<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_valid() {
            write!(f, "{}#{}", K::NAME, self.raw)
        } else {
            write!(f, "{}#-", K::NAME)
        }
    }
}

impl<K> fmt::Display for Idx<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_valid() {
            write!(f, "{}", self.raw)
        } else {
            f.write_str("-1")
        }
    }
}

impl<K> From<usize> for Idx<K> {
    #[inline]
    fn from(index: usize) -> Self {
        Self::from_usize(index)
    }
}

impl<K> From<Idx<K>> for usize {
    #[inline]
    fn from(idx: Idx<K>) -> usize {
        idx.as_usize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_default() {
        let face = FaceIndex::default();
        assert!(!face.is_valid());
        assert_eq!(face.to_string(), "-1");
        assert_eq!(format!("{:?}", face), "face#-");
    }

    #[test]
    fn test_usize_roundtrip() {
        let cell: CellIndex = 42usize.into();
        assert_eq!(usize::from(cell), 42);
        assert_eq!(cell.get(), 42);
    }

    #[test]
    fn test_debug_names_kind() {
        assert_eq!(format!("{:?}", PatchIndex::new(3)), "patch#3");
        assert_eq!(CellIndex::new(5).to_string(), "5");
    }

    #[test]
    fn test_ordering() {
        assert!(FaceIndex::new(1) < FaceIndex::new(2));
        assert_eq!(PatchIndex::new(3), PatchIndex::new(3));
    }

    #[test]
    fn test_serde_transparent() {
        let json = serde_json::to_string(&CellIndex::new(9)).unwrap();
        assert_eq!(json, "9");
    }
}
