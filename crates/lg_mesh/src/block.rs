// crates/lg_mesh/src/block.rs

//! 块网格生成
//!
//! 生成轴对齐的六面体结构块网格，并以多面体网格的形式存储，
//! 供算例驱动和测试使用。六个侧面各为一个边界片，名称为
//! `xMin`, `xMax`, `yMin`, `yMax`, `zMin`, `zMax`。
//!
//! 单元编号 `c = i + nx * (j + ny * k)`。

use glam::DVec3;

use crate::error::{MeshError, MeshResult};
use crate::patch::PatchKind;
use crate::poly::{FaceDef, PatchDef, PolyMesh};

/// 侧面边界片名称，顺序与 [`BlockMesh::patch_kinds`] 一致
pub const SIDE_NAMES: [&str; 6] = ["xMin", "xMax", "yMin", "yMax", "zMin", "zMax"];

/// 块网格定义
#[derive(Debug, Clone)]
pub struct BlockMesh {
    /// 最小角点
    pub min: DVec3,
    /// 最大角点
    pub max: DVec3,
    /// 每个方向单元数
    pub divisions: [usize; 3],
    /// 六个侧面的边界类型
    pub patch_kinds: [PatchKind; 6],
}

impl BlockMesh {
    /// 创建全部侧面为固壁的块网格定义
    pub fn new(min: DVec3, max: DVec3, divisions: [usize; 3]) -> Self {
        Self {
            min,
            max,
            divisions,
            patch_kinds: [PatchKind::Wall; 6],
        }
    }

    /// 设置某个侧面的边界类型
    ///
    /// `side` 为 [`SIDE_NAMES`] 中的名称，未知名称被忽略。
    pub fn with_side(mut self, side: &str, kind: PatchKind) -> Self {
        if let Some(i) = SIDE_NAMES.iter().position(|&s| s == side) {
            self.patch_kinds[i] = kind;
        }
        self
    }

    /// 单元尺寸
    pub fn spacing(&self) -> DVec3 {
        let [nx, ny, nz] = self.divisions;
        (self.max - self.min) / DVec3::new(nx as f64, ny as f64, nz as f64)
    }

    /// 由 (i, j, k) 计算单元编号
    #[inline]
    pub fn cell_id(&self, i: usize, j: usize, k: usize) -> usize {
        let [nx, ny, _] = self.divisions;
        i + nx * (j + ny * k)
    }

    /// 生成多面体网格
    pub fn build(&self) -> MeshResult<PolyMesh> {
        let [nx, ny, nz] = self.divisions;
        if nx == 0 || ny == 0 || nz == 0 {
            return Err(MeshError::InvalidBlock(format!(
                "单元数必须为正: {:?}",
                self.divisions
            )));
        }
        let extent = self.max - self.min;
        if !(extent.x > 0.0 && extent.y > 0.0 && extent.z > 0.0) {
            return Err(MeshError::InvalidBlock(format!(
                "包围盒退化: min={:?}, max={:?}",
                self.min, self.max
            )));
        }

        let d = self.spacing();
        let centre = |i: usize, j: usize, k: usize| {
            self.min + DVec3::new(i as f64 + 0.5, j as f64 + 0.5, k as f64 + 0.5) * d
        };
        let area = [d.y * d.z, d.x * d.z, d.x * d.y];
        let axes = [DVec3::X, DVec3::Y, DVec3::Z];

        // 内部面：每个单元向 +x/+y/+z 方向的邻居
        let mut internal = Vec::new();
        for k in 0..nz {
            for j in 0..ny {
                for i in 0..nx {
                    let owner = self.cell_id(i, j, k) as u32;
                    let c = centre(i, j, k);
                    let steps = [(i + 1 < nx), (j + 1 < ny), (k + 1 < nz)];
                    for axis in 0..3 {
                        if !steps[axis] {
                            continue;
                        }
                        let (ni, nj, nk) = match axis {
                            0 => (i + 1, j, k),
                            1 => (i, j + 1, k),
                            _ => (i, j, k + 1),
                        };
                        internal.push(FaceDef {
                            centre: c + axes[axis] * (0.5 * d[axis]),
                            normal: axes[axis],
                            area: area[axis],
                            owner,
                            neighbour: Some(self.cell_id(ni, nj, nk) as u32),
                        });
                    }
                }
            }
        }

        // 边界面：按侧面分组
        let mut patches = Vec::with_capacity(6);
        for side in 0..6 {
            let axis = side / 2;
            let upper = side % 2 == 1;
            let sign = if upper { 1.0 } else { -1.0 };
            let mut faces = Vec::new();
            for k in 0..nz {
                for j in 0..ny {
                    for i in 0..nx {
                        let idx = [i, j, k];
                        let on_side = if upper {
                            idx[axis] + 1 == self.divisions[axis]
                        } else {
                            idx[axis] == 0
                        };
                        if !on_side {
                            continue;
                        }
                        faces.push(FaceDef {
                            centre: centre(i, j, k) + axes[axis] * (sign * 0.5 * d[axis]),
                            normal: axes[axis] * sign,
                            area: area[axis],
                            owner: self.cell_id(i, j, k) as u32,
                            neighbour: None,
                        });
                    }
                }
            }
            patches.push(PatchDef {
                name: SIDE_NAMES[side].to_string(),
                kind: self.patch_kinds[side],
                faces,
            });
        }

        PolyMesh::from_parts(nx * ny * nz, internal, patches)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::PolyMeshAccess;
    use lg_foundation::CellIndex;

    #[test]
    fn test_block_counts() {
        let mesh = BlockMesh::new(DVec3::ZERO, DVec3::new(3.0, 2.0, 1.0), [3, 2, 1])
            .build()
            .unwrap();
        assert_eq!(mesh.n_cells(), 6);
        // 内部面: x 方向 2*2*1 + y 方向 3*1*1
        assert_eq!(mesh.n_internal_faces(), 7);
        // 边界面: 2*(2*1) + 2*(3*1) + 2*(3*2)
        assert_eq!(mesh.n_faces() - mesh.n_internal_faces(), 22);
        assert_eq!(mesh.patches().len(), 6);
    }

    #[test]
    fn test_block_geometry() {
        let block = BlockMesh::new(DVec3::ZERO, DVec3::ONE, [4, 4, 4]);
        let mesh = block.build().unwrap();
        let total: f64 = (0..mesh.n_cells())
            .map(|c| mesh.cell_volume(CellIndex::from_usize(c)))
            .sum();
        assert!((total - 1.0).abs() < 1e-12);
        let c = mesh.cell_centre(CellIndex::from_usize(block.cell_id(1, 2, 3)));
        assert!((c - DVec3::new(0.375, 0.625, 0.875)).length() < 1e-12);
    }

    #[test]
    fn test_with_side() {
        let mesh = BlockMesh::new(DVec3::ZERO, DVec3::ONE, [2, 2, 2])
            .with_side("xMax", PatchKind::Outflow)
            .build()
            .unwrap();
        let p = mesh.find_patch("xMax").unwrap();
        assert!(mesh.patch(p).kind.is_open());
        assert_eq!(mesh.patch(p).size, 4);
    }

    #[test]
    fn test_invalid_block() {
        assert!(BlockMesh::new(DVec3::ZERO, DVec3::ONE, [0, 1, 1]).build().is_err());
        assert!(BlockMesh::new(DVec3::ONE, DVec3::ONE, [1, 1, 1]).build().is_err());
    }
}
