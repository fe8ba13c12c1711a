// crates/lg_mesh/src/decompose.rs

//! 区域分解
//!
//! 将全局网格沿 x 方向按等宽板块切分为若干子网格，每个子网格对应一个进程。
//! 被切开的内部面在两侧各生成一个进程边界片 `procBoundary{a}to{b}`，
//! 两侧的面顺序一致（按全局面编号排序），因此颗粒可以按边界片局部面号移交。

use lg_foundation::{CellIndex, FaceIndex};
use std::collections::BTreeMap;
use tracing::debug;

use crate::error::{MeshError, MeshResult};
use crate::patch::{PatchKind, PatchTransform};
use crate::poly::{FaceDef, PatchDef, PolyMesh};
use crate::traits::PolyMeshAccess;

/// 单个进程的子网格
#[derive(Debug, Clone)]
pub struct DecomposedMesh {
    /// 进程编号
    pub rank: usize,
    /// 子网格
    pub mesh: PolyMesh,
    /// 局部单元到全局单元的映射
    pub cell_proc_addressing: Vec<usize>,
}

impl DecomposedMesh {
    /// 全局单元编号
    #[inline]
    pub fn global_cell(&self, local: CellIndex) -> usize {
        self.cell_proc_addressing[local.as_usize()]
    }

    /// 全局单元对应的局部单元
    pub fn local_cell(&self, global: usize) -> Option<CellIndex> {
        self.cell_proc_addressing
            .binary_search(&global)
            .ok()
            .map(CellIndex::from_usize)
    }
}

/// 进程边界片名称
pub fn processor_patch_name(my_rank: usize, neighbour_rank: usize) -> String {
    format!("procBoundary{}to{}", my_rank, neighbour_rank)
}

/// 沿 x 方向等宽分解网格
///
/// # 错误
///
/// `n_parts` 为零，或某个进程分不到单元时返回错误。
pub fn decompose_x(mesh: &PolyMesh, n_parts: usize) -> MeshResult<Vec<DecomposedMesh>> {
    if n_parts == 0 {
        return Err(MeshError::Decomposition("分解数必须为正".into()));
    }

    let (lo, hi) = mesh.bounds();
    let width = (hi.x - lo.x) / n_parts as f64;
    let rank_of: Vec<usize> = (0..mesh.n_cells())
        .map(|c| {
            let x = mesh.cell_centre(CellIndex::from_usize(c)).x;
            (((x - lo.x) / width) as usize).min(n_parts - 1)
        })
        .collect();

    (0..n_parts)
        .map(|rank| extract_rank(mesh, &rank_of, rank))
        .collect()
}

fn extract_rank(mesh: &PolyMesh, rank_of: &[usize], rank: usize) -> MeshResult<DecomposedMesh> {
    let cell_proc_addressing: Vec<usize> = (0..mesh.n_cells())
        .filter(|&c| rank_of[c] == rank)
        .collect();
    if cell_proc_addressing.is_empty() {
        return Err(MeshError::Decomposition(format!("进程 {} 没有分到单元", rank)));
    }

    let mut global_to_local = vec![u32::MAX; mesh.n_cells()];
    for (local, &global) in cell_proc_addressing.iter().enumerate() {
        global_to_local[global] = local as u32;
    }

    let local_face = |f: usize, owner_side: bool| -> FaceDef {
        let fi = FaceIndex::from_usize(f);
        let n = mesh.face_normal(fi);
        let owner = if owner_side {
            mesh.face_owner(fi)
        } else {
            mesh.face_neighbour(fi).unwrap_or_default()
        };
        FaceDef {
            centre: mesh.face_centre(fi),
            normal: if owner_side { n } else { -n },
            area: mesh.face_area(fi),
            owner: global_to_local[owner.as_usize()],
            neighbour: None,
        }
    };

    // 内部面：两侧都在本进程的保留为内部面，跨进程的进入进程边界片
    let mut internal = Vec::new();
    let mut processor_faces: BTreeMap<usize, Vec<FaceDef>> = BTreeMap::new();
    for f in 0..mesh.n_internal_faces() {
        let fi = FaceIndex::from_usize(f);
        let owner = mesh.face_owner(fi).as_usize();
        let neighbour = mesh.face_neighbour(fi).unwrap_or_default().as_usize();
        match (rank_of[owner] == rank, rank_of[neighbour] == rank) {
            (true, true) => {
                let mut def = local_face(f, true);
                def.neighbour = Some(global_to_local[neighbour]);
                internal.push(def);
            }
            (true, false) => processor_faces
                .entry(rank_of[neighbour])
                .or_default()
                .push(local_face(f, true)),
            (false, true) => processor_faces
                .entry(rank_of[owner])
                .or_default()
                .push(local_face(f, false)),
            (false, false) => {}
        }
    }

    // 原边界片（可能为空）在前，进程边界片在后
    let mut patches: Vec<PatchDef> = mesh
        .patches
        .iter()
        .map(|p| PatchDef {
            name: p.name.clone(),
            kind: p.kind,
            faces: (p.start..p.start + p.size)
                .filter(|&f| rank_of[mesh.face_owner[f] as usize] == rank)
                .map(|f| local_face(f, true))
                .collect(),
        })
        .collect();

    for (neighbour_rank, faces) in processor_faces {
        debug!(
            "进程 {} -> {}: {} 个进程边界面",
            rank,
            neighbour_rank,
            faces.len()
        );
        patches.push(PatchDef {
            name: processor_patch_name(rank, neighbour_rank),
            kind: PatchKind::Processor {
                my_rank: rank,
                neighbour_rank,
                transform: PatchTransform::None,
            },
            faces,
        });
    }

    let local = PolyMesh::from_parts(cell_proc_addressing.len(), internal, patches)?;
    Ok(DecomposedMesh {
        rank,
        mesh: local,
        cell_proc_addressing,
    })
}
