// crates/lg_mesh/src/poly.rs

//! 多面体网格
//!
//! 只读的 SoA 布局网格，实现 [`PolyMeshAccess`]。
//!
//! # 设计要点
//!
//! 1. **SoA布局**: 面几何与拓扑按数组存放，单元到面使用压缩格式（offsets + indices）
//! 2. **只读**: 构建后不可修改，追踪过程中可在多个线程间共享
//! 3. **面排序**: 内部面在前，边界面按边界片连续存放
//!
//! 单元体积由散度定理从面几何计算，单元中心取面中心的面积加权平均
//! （对平行六面体精确）。

use glam::DVec3;
use lg_foundation::{CellIndex, FaceIndex, PatchIndex};
use serde::{Deserialize, Serialize};

use crate::error::{MeshError, MeshResult};
use crate::patch::{PatchInfo, PatchKind};
use crate::traits::PolyMeshAccess;

/// 构建网格用的面定义
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FaceDef {
    /// 面中心
    pub centre: DVec3,
    /// 法向量（owner 指向外，构建时归一化）
    pub normal: DVec3,
    /// 面积
    pub area: f64,
    /// owner 单元
    pub owner: u32,
    /// neighbour 单元（边界面为 None）
    pub neighbour: Option<u32>,
}

/// 构建网格用的边界片定义
#[derive(Debug, Clone)]
pub struct PatchDef {
    /// 名称
    pub name: String,
    /// 类型
    pub kind: PatchKind,
    /// 边界面
    pub faces: Vec<FaceDef>,
}

/// 多面体网格
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolyMesh {
    // ===== 单元数据 =====
    /// 单元数量
    pub n_cells: usize,
    /// 单元中心
    pub cell_centre: Vec<DVec3>,
    /// 单元体积
    pub cell_volume: Vec<f64>,
    /// 单元面索引偏移（长度 n_cells + 1）
    pub cell_face_offsets: Vec<usize>,
    /// 单元面索引列表
    pub cell_face_indices: Vec<u32>,

    // ===== 面数据 =====
    /// 内部面数量
    pub n_internal_faces: usize,
    /// 面中心
    pub face_centre: Vec<DVec3>,
    /// 面单位法向量
    pub face_normal: Vec<DVec3>,
    /// 面面积
    pub face_area: Vec<f64>,
    /// 面 owner
    pub face_owner: Vec<u32>,
    /// 面 neighbour（长度 n_internal_faces）
    pub face_neighbour: Vec<u32>,

    // ===== 边界数据 =====
    /// 边界片
    pub patches: Vec<PatchInfo>,
    /// 每个边界面所属的边界片（长度 n_faces - n_internal_faces）
    pub boundary_patch: Vec<u32>,
}

impl PolyMesh {
    /// 从面定义构建网格
    ///
    /// # 错误
    ///
    /// - 内部面缺少 neighbour 或边界面带有 neighbour
    /// - 单元索引越界、法向量退化
    /// - 单元体积非正（面定向错误或单元不封闭）
    pub fn from_parts(
        n_cells: usize,
        internal: Vec<FaceDef>,
        patches: Vec<PatchDef>,
    ) -> MeshResult<Self> {
        if n_cells == 0 {
            return Err(MeshError::invalid_topology("from_parts", "网格没有单元"));
        }

        let n_internal_faces = internal.len();
        let n_boundary: usize = patches.iter().map(|p| p.faces.len()).sum();
        let n_faces = n_internal_faces + n_boundary;

        let mut face_centre = Vec::with_capacity(n_faces);
        let mut face_normal = Vec::with_capacity(n_faces);
        let mut face_area = Vec::with_capacity(n_faces);
        let mut face_owner = Vec::with_capacity(n_faces);
        let mut face_neighbour = Vec::with_capacity(n_internal_faces);
        let mut boundary_patch = Vec::with_capacity(n_boundary);
        let mut patch_infos = Vec::with_capacity(patches.len());

        let mut push_face = |f: &FaceDef, id: usize| -> MeshResult<()> {
            if f.owner as usize >= n_cells {
                return Err(MeshError::invalid_topology(
                    "from_parts",
                    format!("面 {} 的 owner {} 超出单元数 {}", id, f.owner, n_cells),
                ));
            }
            let len = f.normal.length();
            if !len.is_finite() || len < 1e-300 || !(f.area > 0.0) {
                return Err(MeshError::invalid_topology(
                    "from_parts",
                    format!("面 {} 的法向量或面积退化", id),
                ));
            }
            face_centre.push(f.centre);
            face_normal.push(f.normal / len);
            face_area.push(f.area);
            face_owner.push(f.owner);
            Ok(())
        };

        for (i, f) in internal.iter().enumerate() {
            let neighbour = f.neighbour.ok_or_else(|| {
                MeshError::invalid_topology("from_parts", format!("内部面 {} 缺少 neighbour", i))
            })?;
            if neighbour as usize >= n_cells || neighbour == f.owner {
                return Err(MeshError::invalid_topology(
                    "from_parts",
                    format!("内部面 {} 的 neighbour {} 无效", i, neighbour),
                ));
            }
            push_face(f, i)?;
            face_neighbour.push(neighbour);
        }

        let mut start = n_internal_faces;
        for (pi, p) in patches.iter().enumerate() {
            for (j, f) in p.faces.iter().enumerate() {
                if f.neighbour.is_some() {
                    return Err(MeshError::invalid_topology(
                        "from_parts",
                        format!("边界片 {} 的第 {} 个面带有 neighbour", p.name, j),
                    ));
                }
                push_face(f, start + j)?;
                boundary_patch.push(pi as u32);
            }
            patch_infos.push(PatchInfo {
                name: p.name.clone(),
                kind: p.kind,
                start,
                size: p.faces.len(),
            });
            start += p.faces.len();
        }

        // 单元到面的压缩索引
        let mut counts = vec![0usize; n_cells];
        for (f, &o) in face_owner.iter().enumerate() {
            counts[o as usize] += 1;
            if f < n_internal_faces {
                counts[face_neighbour[f] as usize] += 1;
            }
        }
        let mut cell_face_offsets = Vec::with_capacity(n_cells + 1);
        cell_face_offsets.push(0);
        for c in &counts {
            let last = *cell_face_offsets.last().unwrap_or(&0);
            cell_face_offsets.push(last + c);
        }
        let mut fill = cell_face_offsets.clone();
        let mut cell_face_indices = vec![0u32; cell_face_offsets[n_cells]];
        for f in 0..n_faces {
            let o = face_owner[f] as usize;
            cell_face_indices[fill[o]] = f as u32;
            fill[o] += 1;
            if f < n_internal_faces {
                let nb = face_neighbour[f] as usize;
                cell_face_indices[fill[nb]] = f as u32;
                fill[nb] += 1;
            }
        }

        // 体积（散度定理）与中心（面积加权）
        let mut cell_volume = vec![0.0; n_cells];
        let mut cell_centre = vec![DVec3::ZERO; n_cells];
        let mut area_sum = vec![0.0; n_cells];
        for f in 0..n_faces {
            let a = face_area[f];
            let c = face_centre[f];
            let n = face_normal[f];
            let o = face_owner[f] as usize;
            cell_volume[o] += c.dot(n) * a / 3.0;
            cell_centre[o] += c * a;
            area_sum[o] += a;
            if f < n_internal_faces {
                let nb = face_neighbour[f] as usize;
                cell_volume[nb] -= c.dot(n) * a / 3.0;
                cell_centre[nb] += c * a;
                area_sum[nb] += a;
            }
        }
        for c in 0..n_cells {
            if !(cell_volume[c] > 0.0) || area_sum[c] <= 0.0 {
                return Err(MeshError::invalid_topology(
                    "from_parts",
                    format!("单元 {} 体积非正 ({:.3e})，面定向错误或单元不封闭", c, cell_volume[c]),
                ));
            }
            cell_centre[c] /= area_sum[c];
        }

        Ok(Self {
            n_cells,
            cell_centre,
            cell_volume,
            cell_face_offsets,
            cell_face_indices,
            n_internal_faces,
            face_centre,
            face_normal,
            face_area,
            face_owner,
            face_neighbour,
            patches: patch_infos,
            boundary_patch,
        })
    }

    /// 包围盒
    pub fn bounds(&self) -> (DVec3, DVec3) {
        self.face_centre.iter().fold(
            (DVec3::splat(f64::INFINITY), DVec3::splat(f64::NEG_INFINITY)),
            |(lo, hi), c| (lo.min(*c), hi.max(*c)),
        )
    }

    /// 特征长度（平均单元体积的立方根）
    pub fn length_scale(&self) -> f64 {
        let total: f64 = self.cell_volume.iter().sum();
        (total / self.n_cells as f64).cbrt()
    }
}

impl PolyMeshAccess for PolyMesh {
    #[inline]
    fn n_cells(&self) -> usize {
        self.n_cells
    }

    #[inline]
    fn n_faces(&self) -> usize {
        self.face_owner.len()
    }

    #[inline]
    fn n_internal_faces(&self) -> usize {
        self.n_internal_faces
    }

    #[inline]
    fn cell_centre(&self, cell: CellIndex) -> DVec3 {
        self.cell_centre[cell.as_usize()]
    }

    #[inline]
    fn cell_volume(&self, cell: CellIndex) -> f64 {
        self.cell_volume[cell.as_usize()]
    }

    #[inline]
    fn face_centre(&self, face: FaceIndex) -> DVec3 {
        self.face_centre[face.as_usize()]
    }

    #[inline]
    fn face_normal(&self, face: FaceIndex) -> DVec3 {
        self.face_normal[face.as_usize()]
    }

    #[inline]
    fn face_area(&self, face: FaceIndex) -> f64 {
        self.face_area[face.as_usize()]
    }

    #[inline]
    fn cell_faces(&self, cell: CellIndex) -> &[u32] {
        let c = cell.as_usize();
        &self.cell_face_indices[self.cell_face_offsets[c]..self.cell_face_offsets[c + 1]]
    }

    #[inline]
    fn face_owner(&self, face: FaceIndex) -> CellIndex {
        CellIndex::new(self.face_owner[face.as_usize()])
    }

    #[inline]
    fn face_neighbour(&self, face: FaceIndex) -> Option<CellIndex> {
        self.face_neighbour
            .get(face.as_usize())
            .map(|&n| CellIndex::new(n))
    }

    #[inline]
    fn patches(&self) -> &[PatchInfo] {
        &self.patches
    }

    #[inline]
    fn face_patch(&self, face: FaceIndex) -> Option<PatchIndex> {
        let f = face.as_usize();
        f.checked_sub(self.n_internal_faces)
            .and_then(|b| self.boundary_patch.get(b))
            .map(|&p| PatchIndex::new(p))
    }
}
