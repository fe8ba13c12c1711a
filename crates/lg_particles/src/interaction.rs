// crates/lg_particles/src/interaction.rs

//! 颗粒-边界交互
//!
//! 颗粒撞到边界面后，按边界片类型分派处理：
//!
//! 1. 通用首轮处理：开边界直接移出颗粒，不再分派
//! 2. 按类型分派：
//!    - `Wall`: 法向速度按恢复系数反射，切向速度按摩擦系数衰减
//!    - `Patch`: 封闭边界，颗粒保留
//!    - `Processor`: 标记移交
//!
//! 分派规则只读写颗粒和 [`TrackState`]，不读取连续相，
//! 物理模式和几何模式共用同一套规则。

use glam::DVec3;
use lg_config::CloudConfig;
use lg_mesh::{PatchInfo, PatchKind};
use tracing::trace;

use crate::particle::Particle;
use crate::track::TrackState;

/// 边界交互参数
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PatchInteraction {
    /// 法向恢复系数
    pub e: f64,
    /// 切向摩擦系数
    pub mu: f64,
}

impl Default for PatchInteraction {
    fn default() -> Self {
        Self { e: 1.0, mu: 0.0 }
    }
}

impl PatchInteraction {
    /// 创建
    pub fn new(e: f64, mu: f64) -> Self {
        Self { e, mu }
    }

    /// 从颗粒云配置创建
    pub fn from_config(config: &CloudConfig) -> Self {
        Self::new(config.e, config.mu)
    }

    /// 撞边界片
    ///
    /// `normal` 为撞击面从颗粒所在单元看出去的单位外法向。
    pub fn hit_patch(
        &self,
        particle: &mut Particle,
        patch: &PatchInfo,
        normal: DVec3,
        state: &mut TrackState,
    ) {
        if self.hit_any_patch(particle, patch, state) {
            return;
        }
        match patch.kind {
            PatchKind::Wall => self.hit_wall_patch(particle, normal, state),
            PatchKind::Patch => self.hit_closed_patch(particle, patch, state),
            PatchKind::Processor { .. } => self.hit_processor_patch(particle, patch, state),
            // 已由首轮处理
            PatchKind::Outflow => state.keep_particle = false,
        }
    }

    /// 通用首轮处理，返回是否已处理
    pub fn hit_any_patch(
        &self,
        particle: &mut Particle,
        patch: &PatchInfo,
        state: &mut TrackState,
    ) -> bool {
        if patch.kind.is_open() {
            trace!("颗粒 {} 经开边界 {} 离开计算域", particle.id, patch.name);
            state.keep_particle = false;
            return true;
        }
        false
    }

    /// 固壁反射
    ///
    /// `Un = U·n`, `Ut = U − Un·n`；`Un > 0` 时 `U −= (1+e)·Un·n`，然后 `U −= μ·Ut`。
    pub fn hit_wall_patch(&self, particle: &mut Particle, normal: DVec3, state: &mut TrackState) {
        let u = particle.velocity;
        let un = u.dot(normal);
        let ut = u - normal * un;
        let mut reflected = u;
        if un > 0.0 {
            reflected -= normal * ((1.0 + self.e) * un);
        }
        reflected -= ut * self.mu;
        particle.velocity = reflected;
        state.keep_particle = true;
    }

    /// 封闭普通边界：颗粒保留，速度不变
    pub fn hit_closed_patch(
        &self,
        particle: &mut Particle,
        patch: &PatchInfo,
        state: &mut TrackState,
    ) {
        trace!("颗粒 {} 停在封闭边界 {}", particle.id, patch.name);
        state.keep_particle = true;
    }

    /// 进程边界：标记移交
    pub fn hit_processor_patch(
        &self,
        particle: &mut Particle,
        patch: &PatchInfo,
        state: &mut TrackState,
    ) {
        trace!("颗粒 {} 到达进程边界 {}", particle.id, patch.name);
        state.switch_processor = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lg_foundation::CellIndex;
    use lg_mesh::PatchTransform;

    fn patch(kind: PatchKind) -> PatchInfo {
        PatchInfo {
            name: "p".into(),
            kind,
            start: 0,
            size: 1,
        }
    }

    fn particle(velocity: DVec3) -> Particle {
        Particle::new(DVec3::ZERO, CellIndex::new(0), 1e-3, velocity, 1)
    }

    #[test]
    fn test_wall_restitution() {
        let interaction = PatchInteraction::new(0.5, 0.0);
        let mut p = particle(DVec3::new(1.0, 0.0, -2.0));
        let mut state = TrackState::default();
        interaction.hit_patch(&mut p, &patch(PatchKind::Wall), DVec3::NEG_Z, &mut state);
        assert!((p.velocity - DVec3::new(1.0, 0.0, 1.0)).length() < 1e-15);
        assert!(state.keep_particle);
    }

    #[test]
    fn test_wall_friction() {
        let interaction = PatchInteraction::new(1.0, 0.25);
        let mut p = particle(DVec3::new(2.0, 0.0, -1.0));
        let mut state = TrackState::default();
        interaction.hit_wall_patch(&mut p, DVec3::NEG_Z, &mut state);
        assert!((p.velocity - DVec3::new(1.5, 0.0, 1.0)).length() < 1e-15);
    }

    #[test]
    fn test_wall_receding_particle_unchanged() {
        let interaction = PatchInteraction::default();
        let mut p = particle(DVec3::new(0.0, 0.0, 1.0));
        let mut state = TrackState::default();
        interaction.hit_wall_patch(&mut p, DVec3::NEG_Z, &mut state);
        assert_eq!(p.velocity, DVec3::Z);
    }

    #[test]
    fn test_outflow_removes() {
        let mut p = particle(DVec3::X);
        let mut state = TrackState::default();
        PatchInteraction::default().hit_patch(
            &mut p,
            &patch(PatchKind::Outflow),
            DVec3::X,
            &mut state,
        );
        assert!(!state.keep_particle);
        assert_eq!(p.velocity, DVec3::X);
    }

    #[test]
    fn test_closed_patch_and_processor() {
        let interaction = PatchInteraction::default();
        let mut p = particle(DVec3::X);
        let mut state = TrackState::default();
        interaction.hit_patch(&mut p, &patch(PatchKind::Patch), DVec3::X, &mut state);
        assert!(state.keep_particle && !state.switch_processor);
        assert_eq!(p.velocity, DVec3::X);

        let proc = PatchKind::Processor {
            my_rank: 0,
            neighbour_rank: 1,
            transform: PatchTransform::None,
        };
        interaction.hit_patch(&mut p, &patch(proc), DVec3::X, &mut state);
        assert!(state.keep_particle && state.switch_processor);
    }
}
