// crates/lg_particles/src/parallel.rs

//! 分区并行推进
//!
//! 全局网格沿 x 分解为若干进程分区，每个分区持有子网格、连续相快照和
//! 颗粒云。一个时间步按轮次推进：
//!
//! 1. 各分区并行推进本步尚未走完的颗粒（rayon）
//! 2. 到达进程边界的颗粒序列化后发往相邻分区
//! 3. 同步点：全部发送完成后各分区接收
//! 4. 有颗粒移交则继续下一轮，直到没有移交
//!
//! 移交的颗粒在接收方从进程边界面继续走完本步剩余部分。

use std::collections::BTreeMap;
use std::path::Path;

use glam::DVec3;
use lg_config::{CloudConfig, ConfigError, InterpolationScheme};
use lg_fields::CarrierFields;
use lg_mesh::{decompose_x, find_cell, DecomposedMesh, PolyMesh};
use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, info};

use crate::cloud::{check_diameter, EvolveReport, IdGenerator, ParticleCloud};
use crate::error::{CloudError, CloudResult};
use crate::particle::Particle;
use crate::track::TrackContext;
use crate::transport::{InProcessTransport, ParticleTransfer, ParticleTransport};

/// 默认最大交换轮数
pub const DEFAULT_MAX_ROUNDS: usize = 64;

/// 单个进程分区
#[derive(Debug)]
pub struct RankDomain {
    /// 子网格与单元映射
    pub decomposed: DecomposedMesh,
    /// 连续相快照（子网格上）
    pub fields: CarrierFields,
    /// 颗粒云
    pub cloud: ParticleCloud,
}

impl RankDomain {
    /// 进程编号
    pub fn rank(&self) -> usize {
        self.decomposed.rank
    }

    /// 以物理模式推进本步尚未走完的颗粒
    fn track(
        &mut self,
        scheme: InterpolationScheme,
        gravity: DVec3,
        dt: f64,
    ) -> CloudResult<EvolveReport> {
        let config = self.cloud.config().clone();
        let ctx = TrackContext::from_fields(
            &self.decomposed.mesh,
            &self.fields,
            scheme,
            gravity,
            &config,
        );
        self.cloud.track(&self.decomposed.mesh, &ctx, dt)
    }
}

/// 一个时间步的全局统计
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct StepReport {
    /// 推进的颗粒段数（移交后继续推进的颗粒重复计数）
    pub tracked: usize,
    /// 离开计算域的颗粒数
    pub removed: usize,
    /// 丢弃的颗粒数
    pub dropped: usize,
    /// 移交次数
    pub migrated: usize,
    /// 交换轮数
    pub rounds: usize,
}

impl StepReport {
    /// 累加另一步的统计
    pub fn merge(&mut self, other: &StepReport) {
        self.tracked += other.tracked;
        self.removed += other.removed;
        self.dropped += other.dropped;
        self.migrated += other.migrated;
        self.rounds += other.rounds;
    }
}

/// 分区并行算例
pub struct DecomposedCase<T: ParticleTransport = InProcessTransport> {
    ranks: Vec<RankDomain>,
    transport: T,
    scheme: InterpolationScheme,
    gravity: DVec3,
    ids: IdGenerator,
    max_rounds: usize,
}

impl DecomposedCase<InProcessTransport> {
    /// 分解网格和连续相，建立空颗粒云，使用进程内传输
    pub fn new(
        mesh: &PolyMesh,
        fields: &CarrierFields,
        n_ranks: usize,
        cloud_name: &str,
        cloud_config: &CloudConfig,
        scheme: InterpolationScheme,
        gravity: DVec3,
    ) -> CloudResult<Self> {
        fields.check(mesh)?;
        let ranks = decompose_x(mesh, n_ranks)?
            .into_iter()
            .map(|decomposed| RankDomain {
                fields: fields.restrict(&decomposed.cell_proc_addressing),
                cloud: ParticleCloud::new(cloud_name, cloud_config.clone()),
                decomposed,
            })
            .collect::<Vec<_>>();
        for r in &ranks {
            debug!(
                "进程 {}: {} 个单元, {} 个边界片",
                r.rank(),
                r.decomposed.mesh.n_cells,
                r.decomposed.mesh.patches.len()
            );
        }
        Ok(Self::with_transport(
            ranks,
            InProcessTransport::new(n_ranks),
            scheme,
            gravity,
        ))
    }
}

impl<T: ParticleTransport> DecomposedCase<T> {
    /// 由已分解的分区和传输层创建
    pub fn with_transport(
        ranks: Vec<RankDomain>,
        transport: T,
        scheme: InterpolationScheme,
        gravity: DVec3,
    ) -> Self {
        Self {
            ranks,
            transport,
            scheme,
            gravity,
            ids: IdGenerator::new(),
            max_rounds: DEFAULT_MAX_ROUNDS,
        }
    }

    /// 设置最大交换轮数
    pub fn with_max_rounds(mut self, max_rounds: usize) -> Self {
        self.max_rounds = max_rounds;
        self
    }

    /// 分区数
    pub fn n_ranks(&self) -> usize {
        self.ranks.len()
    }

    /// 全部分区
    pub fn ranks(&self) -> &[RankDomain] {
        &self.ranks
    }

    /// 全部颗粒数
    pub fn n_particles(&self) -> usize {
        self.ranks.iter().map(|r| r.cloud.len()).sum()
    }

    /// 遍历全部颗粒及其所在进程
    pub fn particles(&self) -> impl Iterator<Item = (usize, &Particle)> {
        self.ranks
            .iter()
            .flat_map(|r| r.cloud.iter().map(move |p| (r.rank(), p)))
    }

    /// 按全局位置添加颗粒，返回 (进程, 编号)
    pub fn seed(&mut self, position: DVec3, d: f64, velocity: DVec3) -> CloudResult<(usize, u64)> {
        check_diameter(d)?;
        for domain in &mut self.ranks {
            let tol = *domain.cloud.tolerance();
            if let Some(cell) = find_cell(&domain.decomposed.mesh, position, &tol) {
                let id = self.ids.next_id();
                domain
                    .cloud
                    .insert(Particle::new(position, cell, d, velocity, id));
                return Ok((domain.decomposed.rank, id));
            }
        }
        Err(ConfigError::invalid("particles.position", format!("{:?}", position), "不在计算域内").into())
    }

    /// 推进一个时间步
    ///
    /// # 错误
    ///
    /// 移交失败或交换轮数超过上限时返回 [`CloudError::Migration`]，运行应终止。
    pub fn evolve(&mut self, dt: f64) -> CloudResult<StepReport> {
        for domain in &mut self.ranks {
            domain.cloud.begin_step();
        }

        let mut step = StepReport::default();
        let (scheme, gravity) = (self.scheme, self.gravity);

        while step.rounds < self.max_rounds {
            step.rounds += 1;
            let reports: Vec<CloudResult<EvolveReport>> = self
                .ranks
                .par_iter_mut()
                .map(|domain| domain.track(scheme, gravity, dt))
                .collect();

            let mut outgoing = 0;
            for (rank, report) in reports.into_iter().enumerate() {
                let report = report?;
                step.tracked += report.tracked;
                step.removed += report.removed;
                step.dropped += report.dropped;
                outgoing += report.transfers.len();
                self.send(rank, report.transfers)?;
            }
            if outgoing == 0 {
                return Ok(step);
            }
            step.migrated += outgoing;

            // 同步点：全部发送完成后统一接收
            for domain in &mut self.ranks {
                let rank = domain.rank();
                for transfer in self.transport.receive(rank)? {
                    domain.cloud.receive(&domain.decomposed.mesh, transfer)?;
                }
            }
            debug!("第 {} 轮交换: {} 个颗粒", step.rounds, outgoing);
        }

        Err(CloudError::migration(
            usize::MAX,
            usize::MAX,
            format!("交换轮数超过上限 {}", self.max_rounds),
        ))
    }

    /// 按目标进程分组发送
    fn send(&self, rank: usize, transfers: Vec<ParticleTransfer>) -> CloudResult<()> {
        let mut by_target: BTreeMap<usize, Vec<ParticleTransfer>> = BTreeMap::new();
        for t in transfers {
            if t.from_rank != rank {
                return Err(CloudError::migration(
                    rank,
                    t.to_rank,
                    format!("颗粒 {} 的源进程记录为 {}", t.particle.id, t.from_rank),
                ));
            }
            by_target.entry(t.to_rank).or_default().push(t);
        }
        for (to, batch) in by_target {
            self.transport.send(rank, to, &batch)?;
        }
        Ok(())
    }

    /// 写出全部分区到时间目录
    ///
    /// 单分区写到 `<time_dir>`，多分区写到 `<case>/processor<r>/<time>` 形式的
    /// `<time_dir>/processor<r>`。
    pub fn write(&self, time_dir: &Path) -> CloudResult<usize> {
        let mut written = 0;
        for domain in &self.ranks {
            let dir = if self.ranks.len() == 1 {
                time_dir.to_path_buf()
            } else {
                time_dir.join(format!("processor{}", domain.rank()))
            };
            if domain.cloud.write_to_dir(&dir)? {
                written += 1;
            }
        }
        info!("写出 {} 个分区, 共 {} 个颗粒", written, self.n_particles());
        Ok(written)
    }
}
