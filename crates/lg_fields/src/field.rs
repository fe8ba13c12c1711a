// crates/lg_fields/src/field.rs

//! 单元中心场
//!
//! [`VolField`] 存放每个单元一个值的连续相场（标量或矢量）。
//! [`CarrierFields`] 是一次追踪所用的连续相快照：速度、密度和运动粘度。
//! 追踪期间快照只读，由所有进程分区共享。
//!
//! 快照可以从对象流读入，流中依次是带标签数组 `U`、`rho`、`nu`，
//! 每个数组一个单元一个值：
//!
//! ```text
//! U
//! 4
//! (
//! (1 0 0)
//! ...
//! )
//! rho
//! ...
//! ```

use std::fmt::Debug;
use std::fs::File;
use std::io::{BufRead, BufReader, Write};
use std::ops::{Add, Mul, Sub};
use std::path::Path;

use glam::DVec3;
use lg_foundation::CellIndex;
use lg_io::{StreamError, StreamReader, StreamResult, StreamWriter};
use lg_mesh::PolyMeshAccess;
use tracing::info;
use serde::{Deserialize, Serialize};

use crate::error::{FieldError, FieldResult};

/// 可插值的场值类型
pub trait FieldValue:
    Copy
    + Debug
    + Send
    + Sync
    + 'static
    + Add<Output = Self>
    + Sub<Output = Self>
    + Mul<f64, Output = Self>
{
    /// 零值
    const ZERO: Self;

    /// 是否为有限值
    fn is_finite_value(&self) -> bool;
}

impl FieldValue for f64 {
    const ZERO: Self = 0.0;

    #[inline]
    fn is_finite_value(&self) -> bool {
        self.is_finite()
    }
}

impl FieldValue for DVec3 {
    const ZERO: Self = DVec3::ZERO;

    #[inline]
    fn is_finite_value(&self) -> bool {
        self.is_finite()
    }
}

/// 单元中心场
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VolField<T> {
    name: String,
    values: Vec<T>,
}

impl<T: FieldValue> VolField<T> {
    /// 由单元值创建
    pub fn new(name: impl Into<String>, values: Vec<T>) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }

    /// 均匀场
    pub fn uniform(name: impl Into<String>, n_cells: usize, value: T) -> Self {
        Self::new(name, vec![value; n_cells])
    }

    /// 由单元函数生成
    pub fn from_fn(name: impl Into<String>, n_cells: usize, f: impl Fn(usize) -> T) -> Self {
        Self::new(name, (0..n_cells).map(f).collect())
    }

    /// 场名
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// 单元数
    #[inline]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// 是否为空
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// 单元值
    #[inline]
    pub fn get(&self, cell: CellIndex) -> T {
        self.values[cell.as_usize()]
    }

    /// 全部值
    #[inline]
    pub fn values(&self) -> &[T] {
        &self.values
    }

    /// 可变访问（仅在追踪之外更新连续相时使用）
    #[inline]
    pub fn values_mut(&mut self) -> &mut [T] {
        &mut self.values
    }

    /// 检查场与网格一致且值有限
    pub fn check<M: PolyMeshAccess + ?Sized>(&self, mesh: &M) -> FieldResult<()> {
        if self.values.len() != mesh.n_cells() {
            return Err(FieldError::SizeMismatch {
                name: self.name.clone(),
                expected: mesh.n_cells(),
                actual: self.values.len(),
            });
        }
        if let Some(cell) = self.values.iter().position(|v| !v.is_finite_value()) {
            return Err(FieldError::NonFinite {
                name: self.name.clone(),
                cell,
            });
        }
        Ok(())
    }

    /// 提取子网格上的场
    pub fn restrict(&self, cell_addressing: &[usize]) -> Self {
        Self::new(
            self.name.clone(),
            cell_addressing.iter().map(|&c| self.values[c]).collect(),
        )
    }
}

/// 速度场标签
pub const LABEL_U: &str = "U";
/// 密度场标签
pub const LABEL_RHO: &str = "rho";
/// 运动粘度场标签
pub const LABEL_NU: &str = "nu";

/// 连续相快照
#[derive(Debug, Clone)]
pub struct CarrierFields {
    /// 速度 U [m/s]
    pub velocity: VolField<DVec3>,
    /// 密度 rho [kg/m³]
    pub density: VolField<f64>,
    /// 运动粘度 nu [m²/s]
    pub viscosity: VolField<f64>,
}

impl CarrierFields {
    /// 均匀连续相
    pub fn uniform(n_cells: usize, velocity: DVec3, density: f64, viscosity: f64) -> Self {
        Self {
            velocity: VolField::uniform(LABEL_U, n_cells, velocity),
            density: VolField::uniform(LABEL_RHO, n_cells, density),
            viscosity: VolField::uniform(LABEL_NU, n_cells, viscosity),
        }
    }

    /// 检查三个场与网格一致
    pub fn check<M: PolyMeshAccess + ?Sized>(&self, mesh: &M) -> FieldResult<()> {
        self.velocity.check(mesh)?;
        self.density.check(mesh)?;
        self.viscosity.check(mesh)
    }

    /// 提取子网格上的快照
    pub fn restrict(&self, cell_addressing: &[usize]) -> Self {
        Self {
            velocity: self.velocity.restrict(cell_addressing),
            density: self.density.restrict(cell_addressing),
            viscosity: self.viscosity.restrict(cell_addressing),
        }
    }

    /// 写出 `U`、`rho`、`nu` 三个带标签数组
    pub fn write<W: Write>(&self, w: &mut StreamWriter<W>) -> StreamResult<()> {
        w.write_vector_field(LABEL_U, self.velocity.values())?;
        w.write_scalar_field(LABEL_RHO, self.density.values())?;
        w.write_scalar_field(LABEL_NU, self.viscosity.values())
    }

    /// 从对象流读入，数组长度与网格单元数不符或值非有限时报错
    pub fn read<R: BufRead, M: PolyMeshAccess + ?Sized>(
        r: &mut StreamReader<R>,
        mesh: &M,
    ) -> FieldResult<Self> {
        let n = mesh.n_cells();
        let fields = Self {
            velocity: VolField::new(LABEL_U, r.read_vector_field(LABEL_U, Some(n))?),
            density: VolField::new(LABEL_RHO, r.read_scalar_field(LABEL_RHO, Some(n))?),
            viscosity: VolField::new(LABEL_NU, r.read_scalar_field(LABEL_NU, Some(n))?),
        };
        fields.check(mesh)?;
        Ok(fields)
    }

    /// 从文件读入
    pub fn read_file<M: PolyMeshAccess + ?Sized>(path: &Path, mesh: &M) -> FieldResult<Self> {
        let file = File::open(path).map_err(StreamError::from)?;
        let fields = Self::read(&mut StreamReader::new(BufReader::new(file)), mesh)?;
        info!("读入连续相场 {}: {} 个单元", path.display(), mesh.n_cells());
        Ok(fields)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lg_mesh::BlockMesh;

    #[test]
    fn test_uniform_and_check() {
        let mesh = BlockMesh::new(DVec3::ZERO, DVec3::ONE, [2, 2, 1]).build().unwrap();
        let fields = CarrierFields::uniform(4, DVec3::X, 1.2, 1.5e-5);
        assert!(fields.check(&mesh).is_ok());
        assert_eq!(fields.velocity.get(CellIndex::new(3)), DVec3::X);

        let short = VolField::uniform("rho", 3, 1.0);
        assert!(matches!(
            short.check(&mesh),
            Err(FieldError::SizeMismatch { expected: 4, actual: 3, .. })
        ));
    }

    #[test]
    fn test_non_finite_rejected() {
        let mesh = BlockMesh::new(DVec3::ZERO, DVec3::ONE, [2, 1, 1]).build().unwrap();
        let field = VolField::new("nu", vec![1.0, f64::NAN]);
        assert!(matches!(
            field.check(&mesh),
            Err(FieldError::NonFinite { cell: 1, .. })
        ));
    }

    #[test]
    fn test_stream_roundtrip_non_uniform() {
        let mesh = BlockMesh::new(DVec3::ZERO, DVec3::new(2.0, 1.0, 1.0), [2, 1, 1])
            .build()
            .unwrap();
        let fields = CarrierFields {
            velocity: VolField::new(LABEL_U, vec![DVec3::X, DVec3::new(3.0, 0.0, -0.5)]),
            density: VolField::new(LABEL_RHO, vec![1.2, 1.0]),
            viscosity: VolField::new(LABEL_NU, vec![1.5e-5, 2e-5]),
        };
        let mut w = StreamWriter::new(Vec::new());
        fields.write(&mut w).unwrap();
        let bytes = w.into_inner();

        let read = CarrierFields::read(&mut StreamReader::new(&bytes[..]), &mesh).unwrap();
        assert_eq!(read.velocity, fields.velocity);
        assert_eq!(read.density, fields.density);
        assert_eq!(read.viscosity, fields.viscosity);
    }

    #[test]
    fn test_stream_checked_against_mesh() {
        let mesh = BlockMesh::new(DVec3::ZERO, DVec3::ONE, [2, 1, 1]).build().unwrap();
        let short = "U 1 ( (1 0 0) ) rho 1 ( 1.2 ) nu 1 ( 1e-5 )";
        let err = CarrierFields::read(&mut StreamReader::new(short.as_bytes()), &mesh).unwrap_err();
        assert!(matches!(err, FieldError::Stream(StreamError::CountMismatch { .. })));

        let bad = "U 2 ( (1 0 0) (1 0 0) ) rho 2 ( 1.2 inf ) nu 2 ( 1e-5 1e-5 )";
        let err = CarrierFields::read(&mut StreamReader::new(bad.as_bytes()), &mesh).unwrap_err();
        assert!(matches!(err, FieldError::NonFinite { cell: 1, .. }));
    }

    #[test]
    fn test_restrict() {
        let field = VolField::from_fn("rho", 4, |c| c as f64);
        let sub = field.restrict(&[1, 3]);
        assert_eq!(sub.values(), &[1.0, 3.0]);
        assert_eq!(sub.name(), "rho");
    }
}
