// crates/lg_particles/src/motion.rs

//! 颗粒运动积分
//!
//! 单个颗粒推进一个时间步的子段循环：
//!
//! ```text
//! while 保留 && 不移交 && 本步未走完:
//!     U₁ = 积分速度(剩余时长)
//!     Δx = ½(U₀ + U₁)·剩余时长
//!     λ  = 单元内追踪到第一个面
//!     按 λ·剩余时长 重新积分速度，位置前进 λ·Δx
//!     撞面: 内部面换单元，边界面交给边界交互
//! ```
//!
//! 停在保留型边界（固壁、封闭边界）上的颗粒，若下一段位移指向该面外侧，
//! 去掉位移和速度的外法向分量，使颗粒沿面滑动而不是原地反复撞面。
//! 子段数超过上限时报告拓扑错误。

use glam::DVec3;
use lg_config::CloudConfig;
use lg_foundation::{CellIndex, FaceIndex, TrackTolerance};
use lg_mesh::{track_to_face, PatchKind, PolyMeshAccess};
use tracing::trace;

use crate::error::{CloudError, CloudResult};
use crate::interaction::PatchInteraction;
use crate::particle::Particle;
use crate::track::{TrackMode, TrackState};

/// 运动积分器
///
/// 绑定网格、追踪模式和边界交互参数，对单个颗粒执行子段循环。
pub struct MotionIntegrator<'a, M: ?Sized, C: ?Sized> {
    mesh: &'a M,
    mode: &'a C,
    interaction: PatchInteraction,
    tolerance: TrackTolerance,
    max_segments: usize,
}

impl<'a, M, C> MotionIntegrator<'a, M, C>
where
    M: PolyMeshAccess + ?Sized,
    C: TrackMode + ?Sized,
{
    /// 创建
    pub fn new(mesh: &'a M, mode: &'a C, config: &CloudConfig) -> Self {
        Self {
            mesh,
            mode,
            interaction: PatchInteraction::from_config(config),
            tolerance: TrackTolerance::default(),
            max_segments: config.max_track_segments,
        }
    }

    /// 设置容差
    pub fn with_tolerance(mut self, tolerance: TrackTolerance) -> Self {
        self.tolerance = tolerance;
        self
    }
}

impl Particle {
    /// 推进一个时间步（从 `step_fraction` 处继续）
    ///
    /// 返回颗粒是否仍留在云中。`state.switch_processor` 为 true 时颗粒停在
    /// 进程边界面上，`state.face` 为该面，本步剩余部分由相邻进程完成。
    ///
    /// # 错误
    ///
    /// 所在单元不属于网格、追踪退化或子段数超过上限时返回
    /// [`CloudError::Topology`]。
    pub fn advance<M, C>(
        &mut self,
        integrator: &MotionIntegrator<'_, M, C>,
        state: &mut TrackState,
        dt: f64,
    ) -> CloudResult<bool>
    where
        M: PolyMeshAccess + ?Sized,
        C: TrackMode + ?Sized,
    {
        state.reset();
        let mesh = integrator.mesh;
        let tol = &integrator.tolerance;
        if !self.cell.is_valid() || self.cell.as_usize() >= mesh.n_cells() {
            return Err(CloudError::topology(
                self.id,
                self.cell.as_usize(),
                format!("单元 {} 超出网格单元数 {}", self.cell, mesh.n_cells()),
            ));
        }
        // 当前贴靠的保留型边界面
        let mut contacts: Vec<FaceIndex> = Vec::new();
        let mut segments = 0usize;

        while state.keep_particle && !state.switch_processor && !self.step_done(tol) {
            segments += 1;
            if segments > integrator.max_segments {
                return Err(CloudError::topology(
                    self.id,
                    self.cell.as_usize(),
                    format!(
                        "超过最大子段数 {}（已完成 {:.6}）",
                        integrator.max_segments, self.step_fraction
                    ),
                ));
            }

            let remaining = (1.0 - self.step_fraction) * dt;
            let u1 = integrator.mode.integrate_velocity(self, remaining);
            let mut dx = (self.velocity + u1) * (0.5 * remaining);

            // 贴靠约束：去掉指向贴靠面外侧的位移分量；离开贴靠面则解除
            contacts.retain(|&face| {
                let n = mesh.outward_normal(self.cell, face);
                let outward = dx.dot(n);
                if outward > 0.0 {
                    dx -= n * outward;
                    true
                } else {
                    outward > -tol.parallel
                }
            });

            let hit = track_to_face(
                mesh,
                self.cell,
                self.position,
                dx,
                self.wall_impact_distance(),
                tol,
            )
            .map_err(|e| CloudError::topology(self.id, self.cell.as_usize(), e.to_string()))?;

            let lambda = hit.fraction;
            let u_end = if lambda >= 1.0 {
                u1
            } else {
                integrator.mode.integrate_velocity(self, lambda * remaining)
            };
            self.velocity = constrain(u_end, mesh, self.cell, &contacts);
            self.position = hit.position;
            self.step_fraction = if lambda >= 1.0 {
                1.0
            } else {
                self.step_fraction + lambda * (1.0 - self.step_fraction)
            };

            let Some(face) = hit.face else {
                continue;
            };
            state.face = Some(face);

            if mesh.is_internal_face(face) {
                self.cell = mesh.across(self.cell, face).ok_or_else(|| {
                    CloudError::topology(
                        self.id,
                        self.cell.as_usize(),
                        format!("内部面 {} 不属于当前单元", face),
                    )
                })?;
                contacts.clear();
                trace!("颗粒 {} 穿过面 {} 进入单元 {}", self.id, face, self.cell);
                continue;
            }

            let patch = mesh.face_patch(face).ok_or_else(|| {
                CloudError::topology(
                    self.id,
                    self.cell.as_usize(),
                    format!("边界面 {} 不属于任何边界片", face),
                )
            })?;
            let info = mesh.patch(patch);
            let normal = mesh.outward_normal(self.cell, face);
            integrator.interaction.hit_patch(self, info, normal, state);

            if state.keep_particle
                && !state.switch_processor
                && matches!(info.kind, PatchKind::Wall | PatchKind::Patch)
                && !contacts.contains(&face)
            {
                contacts.push(face);
                self.velocity = constrain(self.velocity, mesh, self.cell, &contacts);
            }
        }

        Ok(state.keep_particle)
    }
}

/// 去掉速度指向贴靠面外侧的分量
fn constrain<M: PolyMeshAccess + ?Sized>(
    velocity: DVec3,
    mesh: &M,
    cell: CellIndex,
    contacts: &[FaceIndex],
) -> DVec3 {
    contacts.iter().fold(velocity, |u, &face| {
        let n = mesh.outward_normal(cell, face);
        let un = u.dot(n);
        if un > 0.0 {
            u - n * un
        } else {
            u
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::track::GeometricTrack;
    use lg_mesh::{BlockMesh, PolyMesh};

    fn channel() -> PolyMesh {
        BlockMesh::new(DVec3::ZERO, DVec3::new(4.0, 1.0, 1.0), [4, 1, 1])
            .with_side("xMax", PatchKind::Outflow)
            .build()
            .unwrap()
    }

    #[test]
    fn test_ballistic_crossing() {
        let mesh = channel();
        let config = CloudConfig::default();
        let integrator = MotionIntegrator::new(&mesh, &GeometricTrack, &config);
        let mut p = Particle::new(DVec3::new(0.5, 0.5, 0.5), CellIndex::new(0), 0.0, DVec3::X, 1);
        let mut state = TrackState::default();
        assert!(p.advance(&integrator, &mut state, 2.0).unwrap());
        assert_eq!(p.cell, CellIndex::new(2));
        assert!((p.position.x - 2.5).abs() < 1e-12);
        assert_eq!(p.step_fraction, 1.0);
    }

    #[test]
    fn test_outflow_exit() {
        let mesh = channel();
        let config = CloudConfig::default();
        let integrator = MotionIntegrator::new(&mesh, &GeometricTrack, &config);
        let mut p = Particle::new(DVec3::new(3.5, 0.5, 0.5), CellIndex::new(3), 0.0, DVec3::X, 1);
        let mut state = TrackState::default();
        assert!(!p.advance(&integrator, &mut state, 1.0).unwrap());
        assert!(!state.keep_particle);
    }

    #[test]
    fn test_wall_bounce() {
        let mesh = channel();
        let config = CloudConfig::default();
        let integrator = MotionIntegrator::new(&mesh, &GeometricTrack, &config);
        // xMin 为固壁
        let mut p = Particle::new(
            DVec3::new(0.5, 0.5, 0.5),
            CellIndex::new(0),
            0.0,
            DVec3::NEG_X,
            1,
        );
        let mut state = TrackState::default();
        assert!(p.advance(&integrator, &mut state, 1.0).unwrap());
        assert!((p.position.x - 0.5).abs() < 1e-12);
        assert!((p.velocity - DVec3::X).length() < 1e-15);
    }

    #[test]
    fn test_segment_guard() {
        let mesh = channel();
        let config = CloudConfig {
            max_track_segments: 2,
            ..Default::default()
        };
        let integrator = MotionIntegrator::new(&mesh, &GeometricTrack, &config);
        let mut p = Particle::new(DVec3::new(0.5, 0.5, 0.5), CellIndex::new(0), 0.0, DVec3::X, 9);
        let mut state = TrackState::default();
        let err = p.advance(&integrator, &mut state, 3.0).unwrap_err();
        assert!(matches!(err, CloudError::Topology { id: 9, .. }));
    }

    #[test]
    fn test_cell_outside_mesh() {
        let mesh = channel();
        let config = CloudConfig::default();
        let integrator = MotionIntegrator::new(&mesh, &GeometricTrack, &config);
        let mut p = Particle::new(DVec3::new(0.5, 0.5, 0.5), CellIndex::new(4), 1e-4, DVec3::X, 3);
        let mut state = TrackState::default();
        let err = p.advance(&integrator, &mut state, 1.0).unwrap_err();
        assert!(matches!(err, CloudError::Topology { id: 3, cell: 4, .. }));
        assert_eq!(p.position, DVec3::new(0.5, 0.5, 0.5));
    }
}
