//! 运行统计与运行上下文

use crate::campaign::model::destination::Destination;

/// 运行统计
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunStats {
    /// 已发起的转账数
    pub attempted: u64,
    /// 成功数
    pub succeeded: u64,
    /// 失败数
    pub failed: u64,
    /// 重试次数（不含每笔的首次尝试）
    pub retries: u64,
}

/// 单次运行的上下文
///
/// 统计、失败列表和随机数生成器都挂在这里，由调用方持有并在结束时取回
#[derive(Debug)]
pub struct RunContext {
    pub stats: RunStats,
    failed: Vec<Destination>,
    rng: fastrand::Rng,
}

impl RunContext {
    pub fn new() -> Self {
        Self::with_rng(fastrand::Rng::new())
    }

    #[cfg(test)]
    pub fn with_seed(seed: u64) -> Self {
        Self::with_rng(fastrand::Rng::with_seed(seed))
    }

    fn with_rng(rng: fastrand::Rng) -> Self {
        Self {
            stats: RunStats::default(),
            failed: Vec::new(),
            rng,
        }
    }

    pub fn rng(&mut self) -> &mut fastrand::Rng {
        &mut self.rng
    }

    /// 记录一笔失败的地址，重复地址只保留第一次
    pub fn record_failed(&mut self, destination: &Destination) {
        if !self.failed.contains(destination) {
            self.failed.push(destination.clone());
        }
    }

    /// 失败地址（按首次出现顺序）
    pub fn failed(&self) -> &[Destination] {
        &self.failed
    }
}

impl Default for RunContext {
    fn default() -> Self {
        Self::new()
    }
}
