//! 批量转账执行
//!
//! 依次执行转账计划，两笔之间按节奏区间随机等待，结束后输出汇总并写出失败地址

use anyhow::Context;
use chrono::Local;
use std::fs;
use std::path::{Path, PathBuf};

use crate::campaign::model::destination::Destination;
use crate::campaign::model::transfer::TransferRequest;
use crate::dispatch::delay::DelayWindow;
use crate::dispatch::transport::{SleepReason, Sleeper, TransferTransport};
use crate::dispatch::{Dispatcher, IterationMode, RunContext, RunStats, TransferOutcome};

const SEPARATOR: &str = "==================================================";

/// 批量执行参数
#[derive(Debug, Clone, Copy)]
pub struct RunSettings {
    pub amount: f64,
    pub mode: IterationMode,
    pub pacing: DelayWindow,
    pub max_attempts: u32,
}

/// 依次执行全部转账，返回每笔的结果
pub async fn run_transfers<T, S>(
    dispatcher: &Dispatcher<T, S>,
    ctx: &mut RunContext,
    requests: &[TransferRequest<'_>],
    settings: &RunSettings,
) -> Vec<TransferOutcome>
where
    T: TransferTransport,
    S: Sleeper,
{
    let total = requests.len();
    let mut outcomes = Vec::with_capacity(total);

    tracing::info!("共 {} 笔转账", total);
    tracing::info!("Amount: {}", settings.amount);
    tracing::info!("模式: {}", settings.mode);
    tracing::info!("间隔: {}", settings.pacing);
    tracing::info!("最大尝试次数: {}", settings.max_attempts);
    tracing::info!("{}", SEPARATOR);

    for (i, request) in requests.iter().enumerate() {
        tracing::info!("Transfer {}/{}", i + 1, total);
        tracing::info!("To: {} (账号 {})", request.destination, request.account.label());

        let outcome = dispatcher
            .dispatch(ctx, request, settings.max_attempts)
            .await;

        match &outcome {
            TransferOutcome::Success {
                hash,
                status,
                nonce,
            } => {
                tracing::info!("成功!");
                tracing::info!("Hash: {}", hash);
                tracing::info!("Status: {}", status);
                tracing::info!("Nonce: {}", nonce);
            }
            TransferOutcome::Failure { kind, reason } => {
                tracing::warn!("失败 [{}]: {}", kind, reason);
            }
        }
        outcomes.push(outcome);

        if i + 1 < total {
            let delay = settings.pacing.sample(ctx.rng());
            tracing::info!("等待 {} 秒", delay.as_secs());
            dispatcher.sleeper().sleep(SleepReason::Pacing, delay).await;
        }
    }

    outcomes
}

/// 输出运行汇总
pub fn log_summary(stats: &RunStats) {
    tracing::info!("{}", SEPARATOR);
    tracing::info!("SUMMARY");
    tracing::info!("Total: {}", stats.attempted);
    tracing::info!("成功: {}", stats.succeeded);
    tracing::info!("失败: {}", stats.failed);
    tracing::info!("重试: {}", stats.retries);
}

/// 将失败地址写入 `failed_<时间戳>.txt`，没有失败时不写文件
pub fn write_failure_report(
    dir: impl AsRef<Path>,
    failed: &[Destination],
) -> anyhow::Result<Option<PathBuf>> {
    if failed.is_empty() {
        return Ok(None);
    }

    let dir = dir.as_ref();
    fs::create_dir_all(dir).with_context(|| format!("创建输出目录失败: {:?}", dir))?;

    let path = dir.join(format!(
        "failed_{}.txt",
        Local::now().format("%Y%m%d_%H%M%S")
    ));
    let content: String = failed.iter().map(|d| format!("{}\n", d)).collect();
    fs::write(&path, content).with_context(|| format!("写入失败列表失败: {:?}", path))?;

    tracing::info!("失败地址已保存到: {}", path.display());
    Ok(Some(path))
}
