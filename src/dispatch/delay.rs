//! 随机等待区间

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// 以秒为单位的闭区间 `[min_secs, max_secs]`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DelayWindow {
    pub min_secs: u64,
    pub max_secs: u64,
}

impl DelayWindow {
    pub const fn new(min_secs: u64, max_secs: u64) -> Self {
        Self { min_secs, max_secs }
    }

    /// 区间上下界必须有序
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.min_secs > self.max_secs {
            anyhow::bail!(
                "最小值 {} 大于最大值 {}",
                self.min_secs,
                self.max_secs
            );
        }
        Ok(())
    }

    /// 在区间内均匀抽取整数秒
    pub fn sample(&self, rng: &mut fastrand::Rng) -> Duration {
        let (lo, hi) = if self.min_secs <= self.max_secs {
            (self.min_secs, self.max_secs)
        } else {
            (self.max_secs, self.min_secs)
        };
        Duration::from_secs(rng.u64(lo..=hi))
    }
}

impl std::fmt::Display for DelayWindow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{} 秒", self.min_secs, self.max_secs)
    }
}
