// crates/lg_fields/src/interpolation.rs

//! 连续相插值
//!
//! 将单元中心场插值到颗粒位置。插值器借用场快照，追踪期间只读。
//!
//! # 方法
//!
//! - [`CellInterpolation`]: 取颗粒所在单元的值
//! - [`InverseDistanceInterpolation`]: 在所在单元及其面邻居的中心之间做反距离加权
//!
//! 两种方法在均匀场中都精确返回场值，颗粒不会因插值产生虚假加速度。

use glam::DVec3;
use lg_config::InterpolationScheme;
use lg_foundation::CellIndex;
use lg_mesh::PolyMeshAccess;
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::field::{FieldValue, VolField};

/// 插值接口
pub trait Interpolation<T: FieldValue>: Send + Sync {
    /// 在 `cell` 内的 `position` 处插值
    fn interpolate(&self, position: DVec3, cell: CellIndex) -> T;
}

// ============================================================
// 单元值
// ============================================================

/// 单元值插值（分片常数）
#[derive(Debug, Clone, Copy)]
pub struct CellInterpolation<'a, T> {
    field: &'a VolField<T>,
}

impl<'a, T: FieldValue> CellInterpolation<'a, T> {
    /// 创建
    pub fn new(field: &'a VolField<T>) -> Self {
        Self { field }
    }
}

impl<T: FieldValue> Interpolation<T> for CellInterpolation<'_, T> {
    #[inline]
    fn interpolate(&self, _position: DVec3, cell: CellIndex) -> T {
        self.field.get(cell)
    }
}

// ============================================================
// 反距离加权
// ============================================================

/// 反距离加权配置
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct IdwConfig {
    /// 距离指数，默认 2
    pub power: f64,
    /// 距离容差（小于此值视为在单元中心上）
    pub distance_tolerance: f64,
}

impl Default for IdwConfig {
    fn default() -> Self {
        Self {
            power: 2.0,
            distance_tolerance: 1e-12,
        }
    }
}

impl IdwConfig {
    /// 设置距离指数
    pub fn with_power(mut self, power: f64) -> Self {
        self.power = power;
        self
    }
}

/// 反距离加权插值
///
/// 采样点为所在单元中心及其面邻居中心。以所在单元值为基准累加加权差值，
/// 均匀场中差值全为零，结果与场值逐位相等。
pub struct InverseDistanceInterpolation<'a, M: ?Sized, T> {
    mesh: &'a M,
    field: &'a VolField<T>,
    config: IdwConfig,
}

impl<'a, M: PolyMeshAccess + ?Sized, T: FieldValue> InverseDistanceInterpolation<'a, M, T> {
    /// 使用默认配置创建
    pub fn new(mesh: &'a M, field: &'a VolField<T>) -> Self {
        Self::with_config(mesh, field, IdwConfig::default())
    }

    /// 使用指定配置创建
    pub fn with_config(mesh: &'a M, field: &'a VolField<T>, config: IdwConfig) -> Self {
        Self {
            mesh,
            field,
            config,
        }
    }

    /// 配置
    pub fn config(&self) -> &IdwConfig {
        &self.config
    }

    #[inline]
    fn weight(&self, distance: f64) -> f64 {
        1.0 / distance.powf(self.config.power)
    }
}

impl<M: PolyMeshAccess + ?Sized, T: FieldValue> Interpolation<T>
    for InverseDistanceInterpolation<'_, M, T>
{
    fn interpolate(&self, position: DVec3, cell: CellIndex) -> T {
        let base = self.field.get(cell);
        let d0 = (self.mesh.cell_centre(cell) - position).length();
        if d0 < self.config.distance_tolerance {
            return base;
        }

        let mut weight_sum = self.weight(d0);
        let mut correction = T::ZERO;
        for nb in self.mesh.cell_neighbours(cell) {
            let d = (self.mesh.cell_centre(nb) - position).length();
            if d < self.config.distance_tolerance {
                return self.field.get(nb);
            }
            let w = self.weight(d);
            weight_sum += w;
            correction = correction + (self.field.get(nb) - base) * w;
        }
        base + correction * (1.0 / weight_sum)
    }
}

/// 按配置的插值格式创建插值器
pub fn make_interpolator<'a, M, T>(
    scheme: InterpolationScheme,
    mesh: &'a M,
    field: &'a VolField<T>,
) -> Box<dyn Interpolation<T> + 'a>
where
    M: PolyMeshAccess + ?Sized,
    T: FieldValue,
{
    trace!("场 {} 使用 {:?} 插值", field.name(), scheme);
    match scheme {
        InterpolationScheme::Cell => Box::new(CellInterpolation::new(field)),
        InterpolationScheme::InverseDistance => {
            Box::new(InverseDistanceInterpolation::new(mesh, field))
        }
    }
}
