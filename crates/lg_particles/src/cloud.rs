// crates/lg_particles/src/cloud.rs

//! 颗粒云
//!
//! 一个进程上同一种颗粒的集合。负责：
//!
//! - 分配身份编号（[`IdGenerator`]，由云持有）
//! - 按顺序推进全部颗粒，推进中删除或移出的颗粒不影响其它颗粒的遍历
//! - 收集需要移交的颗粒，接收相邻进程移交来的颗粒

use glam::DVec3;
use lg_config::{CloudConfig, ConfigError};
use lg_foundation::{CellIndex, FaceIndex, TrackTolerance};
use lg_mesh::{find_cell, processor_patch_name, PatchKind, PolyMeshAccess};
use tracing::{debug, warn};

use crate::error::{CloudError, CloudResult};
use crate::io::{LABEL_D, POSITIONS_STREAM};
use crate::motion::MotionIntegrator;
use crate::particle::Particle;
use crate::track::{GeometricTrack, TrackMode, TrackState};
use crate::transport::ParticleTransfer;

// ============================================================
// 身份编号
// ============================================================

/// 颗粒身份编号生成器
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IdGenerator {
    next: u64,
}

impl IdGenerator {
    /// 从 0 开始
    pub fn new() -> Self {
        Self::default()
    }

    /// 从指定编号开始
    pub fn starting_at(next: u64) -> Self {
        Self { next }
    }

    /// 分配一个新编号
    pub fn next_id(&mut self) -> u64 {
        let id = self.next;
        self.next += 1;
        id
    }

    /// 登记已存在的编号，保证之后分配的编号不与之重复
    pub fn observe(&mut self, id: u64) {
        self.next = self.next.max(id.saturating_add(1));
    }

    /// 下一个将分配的编号
    pub fn peek(&self) -> u64 {
        self.next
    }
}

// ============================================================
// 推进报告
// ============================================================

/// 一次推进的统计
#[derive(Debug, Default)]
pub struct EvolveReport {
    /// 参与推进的颗粒数
    pub tracked: usize,
    /// 经开边界离开计算域的颗粒数
    pub removed: usize,
    /// 因追踪失败丢弃的颗粒数
    pub dropped: usize,
    /// 需要移交的颗粒
    pub transfers: Vec<ParticleTransfer>,
}

impl EvolveReport {
    /// 合并另一次推进的统计（移交列表追加）
    pub fn merge(&mut self, other: EvolveReport) {
        self.tracked += other.tracked;
        self.removed += other.removed;
        self.dropped += other.dropped;
        self.transfers.extend(other.transfers);
    }
}

// ============================================================
// 颗粒云
// ============================================================

/// 颗粒云
#[derive(Debug, Clone)]
pub struct ParticleCloud {
    name: String,
    config: CloudConfig,
    tolerance: TrackTolerance,
    pub(crate) particles: Vec<Particle>,
    pub(crate) ids: IdGenerator,
}

impl ParticleCloud {
    /// 创建空颗粒云
    pub fn new(name: impl Into<String>, config: CloudConfig) -> Self {
        Self {
            name: name.into(),
            config,
            tolerance: TrackTolerance::default(),
            particles: Vec::new(),
            ids: IdGenerator::new(),
        }
    }

    /// 设置追踪容差
    pub fn with_tolerance(mut self, tolerance: TrackTolerance) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// 云名称
    pub fn name(&self) -> &str {
        &self.name
    }

    /// 配置
    pub fn config(&self) -> &CloudConfig {
        &self.config
    }

    /// 追踪容差
    pub fn tolerance(&self) -> &TrackTolerance {
        &self.tolerance
    }

    /// 颗粒数
    pub fn len(&self) -> usize {
        self.particles.len()
    }

    /// 是否为空
    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    /// 遍历颗粒
    pub fn iter(&self) -> std::slice::Iter<'_, Particle> {
        self.particles.iter()
    }

    /// 全部颗粒
    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    /// 身份编号生成器
    pub fn ids(&self) -> &IdGenerator {
        &self.ids
    }

    /// 按编号查找颗粒
    pub fn find(&self, id: u64) -> Option<&Particle> {
        self.particles.iter().find(|p| p.id == id)
    }

    // ===== 添加颗粒 =====

    /// 在指定单元添加颗粒，返回分配的编号
    ///
    /// 直径必须为有限正数。
    pub fn add_particle(
        &mut self,
        position: DVec3,
        cell: CellIndex,
        d: f64,
        velocity: DVec3,
    ) -> CloudResult<u64> {
        check_diameter(d)?;
        let id = self.ids.next_id();
        self.particles.push(Particle::new(position, cell, d, velocity, id));
        Ok(id)
    }

    /// 按位置定位单元后添加颗粒
    pub fn add_particle_at<M: PolyMeshAccess + ?Sized>(
        &mut self,
        mesh: &M,
        position: DVec3,
        d: f64,
        velocity: DVec3,
    ) -> CloudResult<u64> {
        let cell = find_cell(mesh, position, &self.tolerance).ok_or_else(|| {
            ConfigError::invalid("particles.position", format!("{:?}", position), "不在计算域内")
        })?;
        self.add_particle(position, cell, d, velocity)
    }

    /// 插入已有编号的颗粒
    pub fn insert(&mut self, particle: Particle) {
        self.ids.observe(particle.id);
        self.particles.push(particle);
    }

    /// 检查全部颗粒所在单元都属于网格
    ///
    /// 从流中读入的颗粒只有编号，推进前需要与网格核对。
    pub fn check_cells<M: PolyMeshAccess + ?Sized>(&self, mesh: &M) -> CloudResult<()> {
        let n_cells = mesh.n_cells();
        match self
            .particles
            .iter()
            .position(|p| !p.cell.is_valid() || p.cell.as_usize() >= n_cells)
        {
            Some(i) => Err(CloudError::format(
                POSITIONS_STREAM,
                format!(
                    "第 {} 个颗粒的单元 {} 超出网格单元数 {}",
                    i, self.particles[i].cell, n_cells
                ),
            )),
            None => Ok(()),
        }
    }

    // ===== 推进 =====

    /// 新时间步开始：全部颗粒的已完成分数归零
    pub fn begin_step(&mut self) {
        for p in &mut self.particles {
            p.step_fraction = 0.0;
        }
    }

    /// 推进一个完整时间步
    pub fn evolve<M, C>(&mut self, mesh: &M, mode: &C, dt: f64) -> CloudResult<EvolveReport>
    where
        M: PolyMeshAccess + ?Sized,
        C: TrackMode + ?Sized,
    {
        self.begin_step();
        self.track(mesh, mode, dt)
    }

    /// 几何模式推进一个时间步（速度不变，只解析拓扑）
    pub fn move_geometric<M: PolyMeshAccess + ?Sized>(
        &mut self,
        mesh: &M,
        dt: f64,
    ) -> CloudResult<EvolveReport> {
        self.evolve(mesh, &GeometricTrack, dt)
    }

    /// 推进本步尚未走完的颗粒
    ///
    /// 按云中顺序逐个推进，结果写入新的容器：离开计算域和追踪失败的颗粒
    /// 不再放回，需要移交的颗粒放入报告。
    pub fn track<M, C>(&mut self, mesh: &M, mode: &C, dt: f64) -> CloudResult<EvolveReport>
    where
        M: PolyMeshAccess + ?Sized,
        C: TrackMode + ?Sized,
    {
        let integrator =
            MotionIntegrator::new(mesh, mode, &self.config).with_tolerance(self.tolerance);
        let mut report = EvolveReport::default();
        let mut kept = Vec::with_capacity(self.particles.len());
        let mut state = TrackState::default();
        let mut pending = std::mem::take(&mut self.particles).into_iter();

        while let Some(mut p) = pending.next() {
            if p.step_done(&self.tolerance) {
                kept.push(p);
                continue;
            }
            report.tracked += 1;
            let outcome = p
                .advance(&integrator, &mut state, dt)
                .and_then(|keep| match (keep, state.switch_processor) {
                    (true, true) => make_transfer(mesh, &p, state.face).map(Some),
                    _ => Ok(None),
                });
            match outcome {
                Ok(Some(transfer)) => {
                    debug!(
                        "颗粒 {} 移交: 进程 {} -> {}",
                        p.id, transfer.from_rank, transfer.to_rank
                    );
                    report.transfers.push(transfer);
                }
                Ok(None) if state.keep_particle => kept.push(p),
                Ok(None) => {
                    debug!("颗粒 {} 离开计算域于 {:?}", p.id, p.position);
                    report.removed += 1;
                }
                Err(e) if !e.is_fatal() => {
                    warn!("丢弃颗粒: {}", e);
                    report.dropped += 1;
                }
                Err(e) => {
                    kept.push(p);
                    kept.extend(pending);
                    self.particles = kept;
                    return Err(e);
                }
            }
        }

        self.particles = kept;
        debug!(
            "云 {} ({}): 推进 {}, 离开 {}, 丢弃 {}, 移交 {}",
            self.name,
            mode.name(),
            report.tracked,
            report.removed,
            report.dropped,
            report.transfers.len()
        );
        Ok(report)
    }

    /// 接收相邻进程移交来的颗粒
    ///
    /// 颗粒放在本进程对应进程边界片上同一局部面号的面的 owner 单元，
    /// 位置和速度按本侧边界片的变换处理，编号和已完成分数保持不变。
    pub fn receive<M: PolyMeshAccess + ?Sized>(
        &mut self,
        mesh: &M,
        transfer: ParticleTransfer,
    ) -> CloudResult<()> {
        let ParticleTransfer {
            from_rank,
            to_rank,
            face,
            mut particle,
        } = transfer;
        let name = processor_patch_name(to_rank, from_rank);
        let patch = mesh.find_patch(&name).ok_or_else(|| {
            CloudError::migration(from_rank, to_rank, format!("接收方没有进程边界片 {}", name))
        })?;
        let info = mesh.patch(patch);
        let global = info.face_at(face).ok_or_else(|| {
            CloudError::migration(
                from_rank,
                to_rank,
                format!("局部面号 {} 超出边界片 {} 的面数 {}", face, name, info.size),
            )
        })?;
        if let PatchKind::Processor { transform, .. } = info.kind {
            particle.transform_properties(&transform);
        }
        particle.cell = mesh.face_owner(FaceIndex::from_usize(global));
        self.insert(particle);
        Ok(())
    }
}

/// 直径必须为有限正数
pub(crate) fn check_diameter(d: f64) -> CloudResult<()> {
    if d.is_finite() && d > 0.0 {
        Ok(())
    } else {
        Err(CloudError::format(LABEL_D, format!("直径 {} 不是有限正数", d)))
    }
}

/// 由停在进程边界面上的颗粒生成移交记录
fn make_transfer<M: PolyMeshAccess + ?Sized>(
    mesh: &M,
    particle: &Particle,
    face: Option<FaceIndex>,
) -> CloudResult<ParticleTransfer> {
    let unknown = |message: String| CloudError::migration(usize::MAX, usize::MAX, message);
    let face = face.ok_or_else(|| unknown(format!("颗粒 {} 移交时没有撞击面", particle.id)))?;
    let info = mesh
        .face_patch(face)
        .map(|p| mesh.patch(p))
        .ok_or_else(|| unknown(format!("面 {} 不在边界片上", face)))?;
    match info.kind {
        PatchKind::Processor {
            my_rank,
            neighbour_rank,
            ..
        } => {
            let local = info.local_index(face.as_usize()).ok_or_else(|| {
                CloudError::migration(my_rank, neighbour_rank, format!("面 {} 不属于 {}", face, info.name))
            })?;
            Ok(ParticleTransfer {
                from_rank: my_rank,
                to_rank: neighbour_rank,
                face: local,
                particle: particle.clone(),
            })
        }
        _ => Err(unknown(format!("边界片 {} 不是进程边界", info.name))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lg_mesh::{BlockMesh, PolyMesh};

    fn channel() -> PolyMesh {
        BlockMesh::new(DVec3::ZERO, DVec3::new(4.0, 1.0, 1.0), [4, 1, 1])
            .with_side("xMax", PatchKind::Outflow)
            .build()
            .unwrap()
    }

    #[test]
    fn test_id_generator() {
        let mut ids = IdGenerator::new();
        assert_eq!(ids.next_id(), 0);
        assert_eq!(ids.next_id(), 1);
        ids.observe(10);
        assert_eq!(ids.next_id(), 11);
        ids.observe(3);
        assert_eq!(ids.peek(), 12);
    }

    #[test]
    fn test_observe_max_id() {
        let mut ids = IdGenerator::new();
        ids.observe(u64::MAX);
        assert_eq!(ids.peek(), u64::MAX);
    }

    #[test]
    fn test_diameter_must_be_positive() {
        let mesh = channel();
        let mut cloud = ParticleCloud::new("cloud", CloudConfig::default());
        for d in [0.0, -0.4, f64::NAN, f64::INFINITY] {
            let err = cloud
                .add_particle(DVec3::new(0.5, 0.5, 0.5), CellIndex::new(0), d, DVec3::ZERO)
                .unwrap_err();
            assert!(matches!(err, CloudError::Format { ref field, .. } if field == LABEL_D));
            assert!(cloud
                .add_particle_at(&mesh, DVec3::new(0.5, 0.5, 0.5), d, DVec3::ZERO)
                .is_err());
        }
        assert!(cloud.is_empty());
        assert_eq!(cloud.ids().peek(), 0);
    }

    #[test]
    fn test_check_cells() {
        let mesh = channel();
        let mut cloud = ParticleCloud::new("cloud", CloudConfig::default());
        cloud
            .add_particle(DVec3::new(3.5, 0.5, 0.5), CellIndex::new(3), 1e-4, DVec3::ZERO)
            .unwrap();
        assert!(cloud.check_cells(&mesh).is_ok());

        cloud.insert(Particle::new(DVec3::splat(0.5), CellIndex::new(4), 1e-4, DVec3::ZERO, 9));
        let err = cloud.check_cells(&mesh).unwrap_err();
        assert!(matches!(err, CloudError::Format { ref field, .. } if field == POSITIONS_STREAM));
    }

    #[test]
    fn test_add_particle_at() {
        let mesh = channel();
        let mut cloud = ParticleCloud::new("cloud", CloudConfig::default());
        let id = cloud
            .add_particle_at(&mesh, DVec3::new(2.5, 0.5, 0.5), 1e-4, DVec3::ZERO)
            .unwrap();
        assert_eq!(cloud.find(id).unwrap().cell, CellIndex::new(2));
        assert!(cloud
            .add_particle_at(&mesh, DVec3::new(9.0, 0.5, 0.5), 1e-4, DVec3::ZERO)
            .is_err());
    }

    #[test]
    fn test_removal_keeps_order() {
        let mesh = channel();
        let mut cloud = ParticleCloud::new("cloud", CloudConfig::default());
        let a = cloud
            .add_particle(DVec3::new(0.5, 0.5, 0.5), CellIndex::new(0), 1e-4, DVec3::X)
            .unwrap();
        let b = cloud
            .add_particle(DVec3::new(3.5, 0.5, 0.5), CellIndex::new(3), 1e-4, DVec3::X)
            .unwrap();
        let c = cloud
            .add_particle(DVec3::new(1.5, 0.5, 0.5), CellIndex::new(1), 1e-4, DVec3::X)
            .unwrap();

        let report = cloud.move_geometric(&mesh, 1.0).unwrap();
        assert_eq!(report.tracked, 3);
        assert_eq!(report.removed, 1);
        let ids: Vec<u64> = cloud.iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![a, c]);
        assert!(cloud.find(b).is_none());
    }

    #[test]
    fn test_topology_error_drops_particle() {
        let mesh = channel();
        let config = CloudConfig {
            max_track_segments: 1,
            ..Default::default()
        };
        let mut cloud = ParticleCloud::new("cloud", config);
        cloud
            .add_particle(DVec3::new(0.5, 0.5, 0.5), CellIndex::new(0), 1e-4, DVec3::X * 2.0)
            .unwrap();
        cloud
            .add_particle(DVec3::new(0.5, 0.5, 0.5), CellIndex::new(0), 1e-4, DVec3::X * 0.1)
            .unwrap();

        let report = cloud.move_geometric(&mesh, 1.0).unwrap();
        assert_eq!(report.dropped, 1);
        assert_eq!(cloud.len(), 1);
        assert_eq!(cloud.particles()[0].id, 1);
    }
}
