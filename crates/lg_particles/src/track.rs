// crates/lg_particles/src/track.rs

//! 追踪状态与追踪模式
//!
//! - [`TrackState`]: 每次追踪调用显式传递的可变结果（是否保留颗粒、是否移交）
//! - [`TrackMode`]: 追踪模式接口，决定子段内颗粒速度如何积分
//!   - [`TrackContext`]: 物理模式，插值连续相并计算曳力和重力
//!   - [`GeometricTrack`]: 几何模式，只做拓扑推进，速度不变

use glam::DVec3;
use lg_config::{CloudConfig, DragLaw, InterpolationScheme};
use lg_fields::{make_interpolator, CarrierFields, Interpolation};
use lg_foundation::FaceIndex;
use lg_mesh::PolyMeshAccess;

use crate::drag::drag_coefficient;
use crate::particle::Particle;

// ============================================================
// 追踪状态
// ============================================================

/// 单个颗粒一次推进的结果
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrackState {
    /// 颗粒是否留在云中（开边界置为 false）
    pub keep_particle: bool,
    /// 颗粒是否需要移交到相邻进程
    pub switch_processor: bool,
    /// 最后撞到的面
    pub face: Option<FaceIndex>,
}

impl Default for TrackState {
    fn default() -> Self {
        Self {
            keep_particle: true,
            switch_processor: false,
            face: None,
        }
    }
}

impl TrackState {
    /// 重置为初始状态
    #[inline]
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

// ============================================================
// 追踪模式
// ============================================================

/// 追踪模式
pub trait TrackMode: Send + Sync {
    /// 在时长 `dt` 内积分颗粒速度，返回子段末的速度
    fn integrate_velocity(&self, particle: &Particle, dt: f64) -> DVec3;

    /// 模式名称（日志用）
    fn name(&self) -> &'static str;
}

/// 物理追踪上下文
///
/// 持有连续相插值器、重力和颗粒物性，在一次追踪过程中只读。
pub struct TrackContext<'a> {
    velocity: Box<dyn Interpolation<DVec3> + 'a>,
    density: Box<dyn Interpolation<f64> + 'a>,
    viscosity: Box<dyn Interpolation<f64> + 'a>,
    gravity: DVec3,
    rho_p: f64,
    drag: DragLaw,
}

impl<'a> TrackContext<'a> {
    /// 由插值器创建
    pub fn new(
        velocity: Box<dyn Interpolation<DVec3> + 'a>,
        density: Box<dyn Interpolation<f64> + 'a>,
        viscosity: Box<dyn Interpolation<f64> + 'a>,
        gravity: DVec3,
        config: &CloudConfig,
    ) -> Self {
        Self {
            velocity,
            density,
            viscosity,
            gravity,
            rho_p: config.rho_p,
            drag: config.drag,
        }
    }

    /// 由连续相快照和插值格式创建
    pub fn from_fields<M: PolyMeshAccess + ?Sized>(
        mesh: &'a M,
        fields: &'a CarrierFields,
        scheme: InterpolationScheme,
        gravity: DVec3,
        config: &CloudConfig,
    ) -> Self {
        Self::new(
            make_interpolator(scheme, mesh, &fields.velocity),
            make_interpolator(scheme, mesh, &fields.density),
            make_interpolator(scheme, mesh, &fields.viscosity),
            gravity,
            config,
        )
    }

    /// 重力加速度
    pub fn gravity(&self) -> DVec3 {
        self.gravity
    }
}

impl TrackMode for TrackContext<'_> {
    /// 半隐式积分：
    ///
    /// `U₁ = U₀ + dt·(Dc·(Uc − U₀) + (1 − ρc/ρp)·g) / (1 + dt·Dc)`
    fn integrate_velocity(&self, particle: &Particle, dt: f64) -> DVec3 {
        let u0 = particle.velocity;
        if dt <= 0.0 {
            return u0;
        }
        let uc = self.velocity.interpolate(particle.position, particle.cell);
        let rho_c = self.density.interpolate(particle.position, particle.cell);
        let nu = self.viscosity.interpolate(particle.position, particle.cell);

        let ur = uc - u0;
        let dc = drag_coefficient(self.drag, ur.length(), particle.d, nu, rho_c, self.rho_p);
        let buoyant_g = self.gravity * (1.0 - rho_c / self.rho_p);
        u0 + (ur * dc + buoyant_g) * (dt / (1.0 + dt * dc))
    }

    fn name(&self) -> &'static str {
        "physical"
    }
}

/// 几何追踪模式：速度保持不变，只推进位置和拓扑
#[derive(Debug, Clone, Copy, Default)]
pub struct GeometricTrack;

impl TrackMode for GeometricTrack {
    #[inline]
    fn integrate_velocity(&self, particle: &Particle, _dt: f64) -> DVec3 {
        particle.velocity
    }

    fn name(&self) -> &'static str {
        "geometric"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lg_foundation::CellIndex;
    use lg_mesh::BlockMesh;

    fn particle(velocity: DVec3) -> Particle {
        Particle::new(DVec3::splat(0.5), CellIndex::new(0), 1e-4, velocity, 1)
    }

    #[test]
    fn test_state_reset() {
        let mut state = TrackState {
            keep_particle: false,
            switch_processor: true,
            face: Some(FaceIndex::new(2)),
        };
        state.reset();
        assert_eq!(state, TrackState::default());
    }

    #[test]
    fn test_equilibrium_no_acceleration() {
        let mesh = BlockMesh::new(DVec3::ZERO, DVec3::ONE, [1, 1, 1]).build().unwrap();
        let u = DVec3::new(0.7, -0.3, 0.1);
        let fields = CarrierFields::uniform(1, u, 1.2, 1.5e-5);
        let config = CloudConfig::default();
        let ctx = TrackContext::from_fields(
            &mesh,
            &fields,
            InterpolationScheme::InverseDistance,
            DVec3::ZERO,
            &config,
        );
        assert_eq!(ctx.integrate_velocity(&particle(u), 0.01), u);
    }

    #[test]
    fn test_relaxes_toward_carrier() {
        let mesh = BlockMesh::new(DVec3::ZERO, DVec3::ONE, [1, 1, 1]).build().unwrap();
        let fields = CarrierFields::uniform(1, DVec3::X, 1000.0, 1e-6);
        let config = CloudConfig {
            rho_p: 2650.0,
            drag: DragLaw::Stokes,
            ..Default::default()
        };
        let ctx = TrackContext::from_fields(
            &mesh,
            &fields,
            InterpolationScheme::Cell,
            DVec3::ZERO,
            &config,
        );
        let u1 = ctx.integrate_velocity(&particle(DVec3::ZERO), 1e-3);
        assert!(u1.x > 0.0 && u1.x < 1.0);
        // 大步长下半隐式格式不越过连续相速度
        let u_big = ctx.integrate_velocity(&particle(DVec3::ZERO), 1e3);
        assert!(u_big.x <= 1.0 && u_big.x > 0.99);
    }

    #[test]
    fn test_geometric_keeps_velocity() {
        let p = particle(DVec3::new(1.0, 2.0, 3.0));
        assert_eq!(GeometricTrack.integrate_velocity(&p, 10.0), p.velocity);
    }
}
