// crates/lg_mesh/src/patch.rs

//! 边界片类型定义
//!
//! 边界片（patch）是一组共享同一边界条件类型的边界面。颗粒追踪按边界片类型
//! 分派处理：
//! - `Wall`: 固壁，颗粒反弹
//! - `Patch`: 封闭的普通边界，颗粒保留
//! - `Outflow`: 开边界，颗粒离开计算域
//! - `Processor`: 进程间边界，颗粒移交给相邻进程

use glam::{DMat3, DVec3};
use serde::{Deserialize, Serialize};

// ============================================================
// 进程边界变换
// ============================================================

/// 进程边界两侧之间的几何变换
///
/// 普通的区域分解两侧坐标一致（`None`）；周期或旋转分解时，颗粒移交到
/// 相邻进程后需要变换位置和速度。
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub enum PatchTransform {
    /// 无变换
    #[default]
    None,
    /// 平移：位置加上分离矢量，速度不变
    Separation(DVec3),
    /// 旋转：位置和速度都左乘变换张量
    Rotation(DMat3),
}

impl PatchTransform {
    /// 变换位置
    #[inline]
    pub fn transform_position(&self, p: DVec3) -> DVec3 {
        match self {
            Self::None => p,
            Self::Separation(s) => p + *s,
            Self::Rotation(t) => *t * p,
        }
    }

    /// 变换矢量型物理量（速度等）
    #[inline]
    pub fn transform_vector(&self, v: DVec3) -> DVec3 {
        match self {
            Self::None | Self::Separation(_) => v,
            Self::Rotation(t) => *t * v,
        }
    }
}

// ============================================================
// 边界片类型枚举
// ============================================================

/// 边界片类型
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub enum PatchKind {
    /// 固壁：法向速度反射（受恢复系数衰减），颗粒保留
    #[default]
    Wall,

    /// 普通封闭边界：颗粒保留，不改变速度
    Patch,

    /// 出流：开边界，颗粒离开计算域后从云中删除
    Outflow,

    /// 进程间边界
    Processor {
        /// 本进程编号
        my_rank: usize,
        /// 相邻进程编号
        neighbour_rank: usize,
        /// 两侧几何变换
        transform: PatchTransform,
    },
}

impl PatchKind {
    /// 是否为开边界
    #[inline]
    pub fn is_open(&self) -> bool {
        matches!(self, Self::Outflow)
    }

    /// 是否为固壁
    #[inline]
    pub fn is_wall(&self) -> bool {
        matches!(self, Self::Wall)
    }

    /// 是否为进程边界
    #[inline]
    pub fn is_processor(&self) -> bool {
        matches!(self, Self::Processor { .. })
    }

    /// 相邻进程编号（仅进程边界）
    #[inline]
    pub fn neighbour_rank(&self) -> Option<usize> {
        match self {
            Self::Processor { neighbour_rank, .. } => Some(*neighbour_rank),
            _ => None,
        }
    }
}

impl std::fmt::Display for PatchKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Wall => write!(f, "wall"),
            Self::Patch => write!(f, "patch"),
            Self::Outflow => write!(f, "outflow"),
            Self::Processor { my_rank, neighbour_rank, .. } => {
                write!(f, "processor({}->{})", my_rank, neighbour_rank)
            }
        }
    }
}

// ============================================================
// 边界片描述
// ============================================================

/// 边界片描述
///
/// 边界面在网格面数组中按边界片连续存放，`start..start+size` 即本边界片的面。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatchInfo {
    /// 边界片名称
    pub name: String,
    /// 类型
    pub kind: PatchKind,
    /// 起始面索引
    pub start: usize,
    /// 面数
    pub size: usize,
}

impl PatchInfo {
    /// 面是否属于本边界片
    #[inline]
    pub fn contains(&self, face: usize) -> bool {
        face >= self.start && face < self.start + self.size
    }

    /// 全局面索引转换为边界片内局部索引
    #[inline]
    pub fn local_index(&self, face: usize) -> Option<usize> {
        self.contains(face).then(|| face - self.start)
    }

    /// 边界片内局部索引转换为全局面索引
    #[inline]
    pub fn face_at(&self, local: usize) -> Option<usize> {
        (local < self.size).then(|| self.start + local)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_predicates() {
        assert!(PatchKind::Outflow.is_open());
        assert!(!PatchKind::Patch.is_open());
        assert!(PatchKind::Wall.is_wall());
        let proc = PatchKind::Processor {
            my_rank: 0,
            neighbour_rank: 1,
            transform: PatchTransform::None,
        };
        assert!(proc.is_processor());
        assert_eq!(proc.neighbour_rank(), Some(1));
        assert_eq!(proc.to_string(), "processor(0->1)");
    }

    #[test]
    fn test_patch_local_index() {
        let p = PatchInfo {
            name: "outlet".into(),
            kind: PatchKind::Outflow,
            start: 10,
            size: 4,
        };
        assert_eq!(p.local_index(12), Some(2));
        assert_eq!(p.local_index(14), None);
        assert_eq!(p.face_at(3), Some(13));
        assert_eq!(p.face_at(4), None);
    }

    #[test]
    fn test_transforms() {
        let sep = PatchTransform::Separation(DVec3::new(1.0, 0.0, 0.0));
        assert_eq!(sep.transform_position(DVec3::ZERO), DVec3::X);
        assert_eq!(sep.transform_vector(DVec3::Y), DVec3::Y);

        let rot = PatchTransform::Rotation(DMat3::from_rotation_z(std::f64::consts::FRAC_PI_2));
        let v = rot.transform_vector(DVec3::X);
        assert!((v - DVec3::Y).length() < 1e-12);
    }
}
