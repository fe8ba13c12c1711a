// crates/lg_mesh/src/traits.rs

//! 多面体网格抽象接口
//!
//! 定义颗粒追踪所需的网格只读访问契约。追踪核心只通过此 trait 访问网格，
//! 不依赖具体的网格存储。
//!
//! # 约定
//!
//! - 面法向量为单位向量，从 owner 单元指向外（内部面指向 neighbour）
//! - 面索引 `0..n_internal_faces()` 为内部面，其余为边界面，按边界片连续存放
//! - 所有实现必须是 `Send + Sync`，以便各进程分区并行追踪
//!
//! # 使用示例
//!
//! ```ignore
//! use lg_mesh::PolyMeshAccess;
//!
//! fn total_volume<M: PolyMeshAccess>(mesh: &M) -> f64 {
//!     (0..mesh.n_cells()).map(|c| mesh.cell_volume(c.into())).sum()
//! }
//! ```

use glam::DVec3;
use lg_foundation::{CellIndex, FaceIndex, PatchIndex};

use crate::patch::PatchInfo;

/// 多面体网格访问接口（只读）
pub trait PolyMeshAccess: Send + Sync {
    // ===== 基本计数 =====

    /// 单元总数
    fn n_cells(&self) -> usize;

    /// 面总数（内部面 + 边界面）
    fn n_faces(&self) -> usize;

    /// 内部面数量
    fn n_internal_faces(&self) -> usize;

    // ===== 几何查询 =====

    /// 单元中心
    fn cell_centre(&self, cell: CellIndex) -> DVec3;

    /// 单元体积
    fn cell_volume(&self, cell: CellIndex) -> f64;

    /// 面中心
    fn face_centre(&self, face: FaceIndex) -> DVec3;

    /// 面单位法向量（owner 指向外）
    fn face_normal(&self, face: FaceIndex) -> DVec3;

    /// 面面积
    fn face_area(&self, face: FaceIndex) -> f64;

    // ===== 拓扑查询 =====

    /// 单元的面索引列表
    fn cell_faces(&self, cell: CellIndex) -> &[u32];

    /// 面的 owner 单元
    fn face_owner(&self, face: FaceIndex) -> CellIndex;

    /// 面的 neighbour 单元（边界面返回 None）
    fn face_neighbour(&self, face: FaceIndex) -> Option<CellIndex>;

    /// 面是否为内部面
    #[inline]
    fn is_internal_face(&self, face: FaceIndex) -> bool {
        face.as_usize() < self.n_internal_faces()
    }

    // ===== 边界片 =====

    /// 全部边界片
    fn patches(&self) -> &[PatchInfo];

    /// 边界面所属边界片（内部面返回 None）
    fn face_patch(&self, face: FaceIndex) -> Option<PatchIndex> {
        if self.is_internal_face(face) {
            return None;
        }
        self.patches()
            .iter()
            .position(|p| p.contains(face.as_usize()))
            .map(PatchIndex::from_usize)
    }

    /// 按索引获取边界片
    #[inline]
    fn patch(&self, patch: PatchIndex) -> &PatchInfo {
        &self.patches()[patch.as_usize()]
    }

    /// 按名称查找边界片
    fn find_patch(&self, name: &str) -> Option<PatchIndex> {
        self.patches()
            .iter()
            .position(|p| p.name == name)
            .map(PatchIndex::from_usize)
    }

    // ===== 派生查询 =====

    /// 从指定单元看出去的面外法向量
    #[inline]
    fn outward_normal(&self, cell: CellIndex, face: FaceIndex) -> DVec3 {
        let n = self.face_normal(face);
        if self.face_owner(face) == cell {
            n
        } else {
            -n
        }
    }

    /// 穿过内部面后到达的单元
    #[inline]
    fn across(&self, cell: CellIndex, face: FaceIndex) -> Option<CellIndex> {
        let owner = self.face_owner(face);
        let neighbour = self.face_neighbour(face)?;
        if owner == cell {
            Some(neighbour)
        } else if neighbour == cell {
            Some(owner)
        } else {
            None
        }
    }

    /// 单元的面邻居列表
    fn cell_neighbours(&self, cell: CellIndex) -> Vec<CellIndex> {
        self.cell_faces(cell)
            .iter()
            .filter_map(|&f| self.across(cell, FaceIndex::new(f)))
            .collect()
    }
}
