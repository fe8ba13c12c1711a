// crates/lg_foundation/src/tolerance.rs

//! 追踪几何容差
//!
//! 集中管理颗粒追踪中所有浮点判断的阈值，通过参数注入传递，不使用全局变量。

/// 追踪容差配置
///
/// 包含穿面计算、点在单元内判断和时间步剩余量判断使用的阈值。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrackTolerance {
    /// 点在单元内判断容差 [m]
    ///
    /// 点到面平面的有符号距离不超过此值时视为在单元内（闭单元）。
    pub inside: f64,
    /// 位移与面法向点积的最小值 [m]
    ///
    /// 小于此值的面视为与运动方向平行，不参与穿面计算。
    pub parallel: f64,
    /// 剩余时间步分数阈值
    ///
    /// 剩余分数低于此值时认为本步已走完。
    pub small_fraction: f64,
}

impl Default for TrackTolerance {
    fn default() -> Self {
        Self {
            inside: 1e-10,
            parallel: 1e-15,
            small_fraction: 1e-12,
        }
    }
}

impl TrackTolerance {
    /// 宽松容差（适用于粗网格或大尺度坐标）
    pub const RELAXED: Self = Self {
        inside: 1e-8,
        parallel: 1e-12,
        small_fraction: 1e-10,
    };

    /// 剩余分数是否可以忽略
    #[inline]
    pub fn is_exhausted(&self, fraction: f64) -> bool {
        fraction <= self.small_fraction
    }
}
