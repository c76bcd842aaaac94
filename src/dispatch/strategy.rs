//! 账号分配策略

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::campaign::model::account::Account;
use crate::campaign::model::destination::Destination;
use crate::campaign::model::transfer::TransferRequest;

/// 分配模式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum IterationMode {
    /// 按地址顺序，账号按下标取模轮换
    #[default]
    Sequential,
    /// 每个账号依次向全部地址转账
    RoundRobin,
    /// 每个地址随机挑选账号
    Random,
}

impl IterationMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sequential => "sequential",
            Self::RoundRobin => "round_robin",
            Self::Random => "random",
        }
    }

    /// 生成有序的转账计划
    ///
    /// `accounts` 或 `destinations` 为空时返回空计划
    pub fn plan<'a>(
        &self,
        accounts: &'a [Account],
        destinations: &'a [Destination],
        amount: f64,
        rng: &mut fastrand::Rng,
    ) -> Vec<TransferRequest<'a>> {
        if accounts.is_empty() || destinations.is_empty() {
            return Vec::new();
        }

        match self {
            Self::Sequential => destinations
                .iter()
                .enumerate()
                .map(|(i, dest)| TransferRequest::new(&accounts[i % accounts.len()], dest, amount))
                .collect(),
            Self::RoundRobin => accounts
                .iter()
                .flat_map(|account| {
                    destinations
                        .iter()
                        .map(move |dest| TransferRequest::new(account, dest, amount))
                })
                .collect(),
            Self::Random => destinations
                .iter()
                .map(|dest| {
                    let account = &accounts[rng.usize(..accounts.len())];
                    TransferRequest::new(account, dest, amount)
                })
                .collect(),
        }
    }
}

impl FromStr for IterationMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "sequential" => Ok(Self::Sequential),
            "round_robin" => Ok(Self::RoundRobin),
            "random" => Ok(Self::Random),
            other => Err(format!(
                "未知模式: {}（可选 sequential / round_robin / random）",
                other
            )),
        }
    }
}

impl std::fmt::Display for IterationMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
