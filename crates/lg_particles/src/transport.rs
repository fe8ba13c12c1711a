// crates/lg_particles/src/transport.rs

//! 进程间颗粒移交
//!
//! 移交的颗粒先序列化为文本记录（见 [`Particle::write_transfer`]），
//! 由传输层送达目标进程，目标进程反序列化后重建颗粒。
//! 一轮交换中所有进程先发送，再统一接收。

use parking_lot::Mutex;
use tracing::trace;

use lg_io::{StreamReader, StreamWriter};

use crate::error::{CloudError, CloudResult};
use crate::particle::Particle;

/// 一个待移交的颗粒
#[derive(Debug, Clone, PartialEq)]
pub struct ParticleTransfer {
    /// 源进程
    pub from_rank: usize,
    /// 目标进程
    pub to_rank: usize,
    /// 源进程边界片上的局部面号（两侧面顺序一致）
    pub face: usize,
    /// 颗粒
    pub particle: Particle,
}

/// 进程间传输接口
pub trait ParticleTransport: Send + Sync {
    /// 进程数
    fn n_ranks(&self) -> usize;

    /// 发送一批颗粒（同一源、同一目标）
    fn send(&self, from: usize, to: usize, batch: &[ParticleTransfer]) -> CloudResult<()>;

    /// 取出发往 `rank` 的全部颗粒
    fn receive(&self, rank: usize) -> CloudResult<Vec<ParticleTransfer>>;
}

/// 序列化一批移交记录
pub fn encode_batch(batch: &[ParticleTransfer]) -> CloudResult<Vec<u8>> {
    let mut w = StreamWriter::new(Vec::new());
    w.begin_list(batch.len())?;
    for t in batch {
        t.particle.write_transfer(&mut w, t.face)?;
    }
    w.end_list()?;
    Ok(w.into_inner())
}

/// 反序列化一批移交记录
pub fn decode_batch(from: usize, to: usize, bytes: &[u8]) -> CloudResult<Vec<ParticleTransfer>> {
    let mut r = StreamReader::new(bytes);
    let count = r.begin_list("transfer", None)?;
    let mut batch = Vec::with_capacity(count);
    for _ in 0..count {
        let (particle, face) = Particle::read_transfer(&mut r)?;
        batch.push(ParticleTransfer {
            from_rank: from,
            to_rank: to,
            face,
            particle,
        });
    }
    r.expect_close()?;
    Ok(batch)
}

/// 进程内传输：每个进程一个邮箱
pub struct InProcessTransport {
    mailboxes: Vec<Mutex<Vec<(usize, Vec<u8>)>>>,
}

impl InProcessTransport {
    /// 创建 `n_ranks` 个邮箱
    pub fn new(n_ranks: usize) -> Self {
        Self {
            mailboxes: (0..n_ranks).map(|_| Mutex::new(Vec::new())).collect(),
        }
    }

    /// 所有邮箱是否为空
    pub fn is_idle(&self) -> bool {
        self.mailboxes.iter().all(|m| m.lock().is_empty())
    }
}

impl ParticleTransport for InProcessTransport {
    fn n_ranks(&self) -> usize {
        self.mailboxes.len()
    }

    fn send(&self, from: usize, to: usize, batch: &[ParticleTransfer]) -> CloudResult<()> {
        let mailbox = self.mailboxes.get(to).ok_or_else(|| {
            CloudError::migration(from, to, format!("目标进程不存在 (共 {} 个进程)", self.n_ranks()))
        })?;
        let bytes = encode_batch(batch)?;
        trace!("进程 {} -> {}: {} 个颗粒, {} 字节", from, to, batch.len(), bytes.len());
        mailbox.lock().push((from, bytes));
        Ok(())
    }

    fn receive(&self, rank: usize) -> CloudResult<Vec<ParticleTransfer>> {
        let mailbox = self.mailboxes.get(rank).ok_or_else(|| {
            CloudError::migration(rank, rank, format!("进程不存在 (共 {} 个进程)", self.n_ranks()))
        })?;
        let messages = std::mem::take(&mut *mailbox.lock());
        let mut received = Vec::new();
        for (from, bytes) in messages {
            received.extend(decode_batch(from, rank, &bytes)?);
        }
        Ok(received)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::DVec3;
    use lg_foundation::CellIndex;

    fn transfer(id: u64, face: usize) -> ParticleTransfer {
        let mut particle = Particle::new(
            DVec3::new(1.0, 0.25, 0.75),
            CellIndex::new(3),
            2e-4,
            DVec3::new(0.5, 0.0, -0.1),
            id,
        );
        particle.step_fraction = 0.6;
        ParticleTransfer {
            from_rank: 0,
            to_rank: 1,
            face,
            particle,
        }
    }

    #[test]
    fn test_send_receive() {
        let transport = InProcessTransport::new(2);
        transport.send(0, 1, &[transfer(5, 2), transfer(6, 0)]).unwrap();
        assert!(transport.receive(0).unwrap().is_empty());

        let received = transport.receive(1).unwrap();
        assert_eq!(received.len(), 2);
        assert_eq!(received[0].particle.id, 5);
        assert_eq!(received[0].face, 2);
        assert_eq!(received[1].particle.step_fraction, 0.6);
        assert_eq!(received[1].particle.velocity, DVec3::new(0.5, 0.0, -0.1));
        assert!(transport.is_idle());
    }

    #[test]
    fn test_unknown_destination() {
        let transport = InProcessTransport::new(2);
        let err = transport.send(0, 4, &[transfer(1, 0)]).unwrap_err();
        assert!(matches!(err, CloudError::Migration { from: 0, to: 4, .. }));
        assert!(err.is_fatal());
    }
}
