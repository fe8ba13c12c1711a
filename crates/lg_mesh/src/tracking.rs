// crates/lg_mesh/src/tracking.rs

//! 单元内几何追踪
//!
//! 在凸多面体单元内沿直线位移求最先穿过的面。对每个满足
//! `n·Δx > parallel` 的面（`n` 为从当前单元看出去的外法向），
//!
//! ```text
//! λ = n·(Cf − x) / (n·Δx)
//! ```
//!
//! 取最小的 λ（下限截断为 0）。λ < 1 表示本段位移在到达终点前撞面。
//!
//! 固壁面按颗粒半径向单元内平移 `wall_offset`，使颗粒表面而不是中心接触壁面。

use glam::DVec3;
use lg_foundation::{CellIndex, FaceIndex, TrackTolerance};

use crate::error::{MeshError, MeshResult};
use crate::traits::PolyMeshAccess;

/// 单段追踪结果
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrackHit {
    /// 实际走过的位移分数 `[0, 1]`
    pub fraction: f64,
    /// 撞到的面（走完全程时为 None）
    pub face: Option<FaceIndex>,
    /// 终点位置
    pub position: DVec3,
}

impl TrackHit {
    /// 是否撞面
    #[inline]
    pub fn hit_face(&self) -> bool {
        self.face.is_some()
    }
}

/// 在单元内沿位移追踪到第一个面
///
/// # 参数
///
/// - `cell`: 当前单元
/// - `start`: 起点（应位于单元内）
/// - `displacement`: 本段全位移
/// - `wall_offset`: 固壁面向内平移距离（颗粒半径）
///
/// # 错误
///
/// 位移非有限值、单元越界或单元没有面时返回 [`MeshError::DegenerateTrack`]。
pub fn track_to_face<M: PolyMeshAccess + ?Sized>(
    mesh: &M,
    cell: CellIndex,
    start: DVec3,
    displacement: DVec3,
    wall_offset: f64,
    tol: &TrackTolerance,
) -> MeshResult<TrackHit> {
    if !cell.is_valid() || cell.as_usize() >= mesh.n_cells() {
        return Err(MeshError::degenerate_track(
            cell.as_usize(),
            format!("单元索引超出范围 (n_cells = {})", mesh.n_cells()),
        ));
    }
    if !displacement.is_finite() || !start.is_finite() {
        return Err(MeshError::degenerate_track(
            cell.as_usize(),
            format!("位置或位移非有限值: x={:?}, Δx={:?}", start, displacement),
        ));
    }
    let faces = mesh.cell_faces(cell);
    if faces.is_empty() {
        return Err(MeshError::degenerate_track(cell.as_usize(), "单元没有面"));
    }

    let mut best: Option<(f64, FaceIndex)> = None;
    for &f in faces {
        let face = FaceIndex::new(f);
        let n = mesh.outward_normal(cell, face);
        let rate = n.dot(displacement);
        if rate <= tol.parallel {
            continue;
        }
        let offset = match mesh.face_patch(face) {
            Some(p) if mesh.patch(p).kind.is_wall() => wall_offset,
            _ => 0.0,
        };
        let lambda = ((n.dot(mesh.face_centre(face) - start) - offset) / rate).max(0.0);
        if lambda < best.map_or(f64::INFINITY, |(l, _)| l) {
            best = Some((lambda, face));
        }
    }

    Ok(match best {
        Some((lambda, face)) if lambda < 1.0 => TrackHit {
            fraction: lambda,
            face: Some(face),
            position: start + displacement * lambda,
        },
        _ => TrackHit {
            fraction: 1.0,
            face: None,
            position: start + displacement,
        },
    })
}

/// 点是否位于凸单元内（含边界容差）
pub fn point_in_cell<M: PolyMeshAccess + ?Sized>(
    mesh: &M,
    cell: CellIndex,
    point: DVec3,
    tol: &TrackTolerance,
) -> bool {
    mesh.cell_faces(cell).iter().all(|&f| {
        let face = FaceIndex::new(f);
        mesh.outward_normal(cell, face)
            .dot(point - mesh.face_centre(face))
            <= tol.inside
    })
}

/// 查找包含点的单元（线性扫描）
pub fn find_cell<M: PolyMeshAccess + ?Sized>(
    mesh: &M,
    point: DVec3,
    tol: &TrackTolerance,
) -> Option<CellIndex> {
    (0..mesh.n_cells())
        .map(CellIndex::from_usize)
        .find(|&c| point_in_cell(mesh, c, point, tol))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::BlockMesh;
    use crate::patch::PatchKind;
    use crate::poly::PolyMesh;

    fn line() -> PolyMesh {
        // 4 个单元沿 x，固壁在 xMin，出流在 xMax
        BlockMesh::new(DVec3::ZERO, DVec3::new(4.0, 1.0, 1.0), [4, 1, 1])
            .with_side("xMax", PatchKind::Outflow)
            .build()
            .unwrap()
    }

    #[test]
    fn test_stays_inside() {
        let mesh = line();
        let tol = TrackTolerance::default();
        let hit = track_to_face(
            &mesh,
            CellIndex::new(1),
            DVec3::new(1.5, 0.5, 0.5),
            DVec3::new(0.2, 0.1, 0.0),
            0.0,
            &tol,
        )
        .unwrap();
        assert!(!hit.hit_face());
        assert_eq!(hit.fraction, 1.0);
        assert!((hit.position - DVec3::new(1.7, 0.6, 0.5)).length() < 1e-12);
    }

    #[test]
    fn test_hits_internal_face() {
        let mesh = line();
        let tol = TrackTolerance::default();
        let hit = track_to_face(
            &mesh,
            CellIndex::new(1),
            DVec3::new(1.5, 0.5, 0.5),
            DVec3::new(1.0, 0.0, 0.0),
            0.0,
            &tol,
        )
        .unwrap();
        assert!((hit.fraction - 0.5).abs() < 1e-12);
        let face = hit.face.unwrap();
        assert!(mesh.is_internal_face(face));
        assert_eq!(mesh.across(CellIndex::new(1), face), Some(CellIndex::new(2)));
    }

    #[test]
    fn test_wall_offset() {
        let mesh = line();
        let tol = TrackTolerance::default();
        let hit = track_to_face(
            &mesh,
            CellIndex::new(0),
            DVec3::new(0.5, 0.5, 0.5),
            DVec3::new(-1.0, 0.0, 0.0),
            0.1,
            &tol,
        )
        .unwrap();
        // 撞 xMin 固壁，颗粒中心停在 x = 0.1
        assert!((hit.position.x - 0.1).abs() < 1e-12);
        let p = mesh.face_patch(hit.face.unwrap()).unwrap();
        assert_eq!(mesh.patch(p).name, "xMin");
    }

    #[test]
    fn test_open_patch_not_offset() {
        let mesh = line();
        let tol = TrackTolerance::default();
        let hit = track_to_face(
            &mesh,
            CellIndex::new(3),
            DVec3::new(3.5, 0.5, 0.5),
            DVec3::new(1.0, 0.0, 0.0),
            0.1,
            &tol,
        )
        .unwrap();
        assert!((hit.position.x - 4.0).abs() < 1e-12);
    }

    #[test]
    fn test_degenerate_displacement() {
        let mesh = line();
        let tol = TrackTolerance::default();
        let err = track_to_face(
            &mesh,
            CellIndex::new(0),
            DVec3::splat(0.5),
            DVec3::new(f64::NAN, 0.0, 0.0),
            0.0,
            &tol,
        );
        assert!(matches!(err, Err(MeshError::DegenerateTrack { .. })));
    }

    #[test]
    fn test_find_cell() {
        let mesh = line();
        let tol = TrackTolerance::default();
        assert_eq!(
            find_cell(&mesh, DVec3::new(2.3, 0.2, 0.9), &tol),
            Some(CellIndex::new(2))
        );
        assert_eq!(find_cell(&mesh, DVec3::new(5.0, 0.5, 0.5), &tol), None);
        assert!(point_in_cell(&mesh, CellIndex::new(0), DVec3::new(1.0, 0.5, 0.5), &tol));
    }
}
