//! 活动批量转账工具
//!
//! # 用法
//!
//! ```bash
//! # 使用默认文件：config.json / accounts.json / adrs.txt / proxies.txt
//! camp-transfer
//!
//! # 每个账号都向全部地址转账
//! camp-transfer --mode round_robin --amount 0.002
//!
//! # 只查看有效地址
//! camp-transfer --list
//! ```

mod campaign;
mod dispatch;
mod http_client;
mod logging;
mod model;
mod runner;

use anyhow::Context;
use clap::Parser;

use campaign::model::account::Account;
use campaign::model::destination::{load_destinations, Destination};
use campaign::CampaignProvider;
use dispatch::classify::TransientPatterns;
use dispatch::transport::TokioSleeper;
use dispatch::{Dispatcher, RetryPolicy, RunContext};
use model::arg::Args;
use model::config::Config;
use runner::RunSettings;

/// `--list` 时最多展示的地址数量
const LIST_PREVIEW: usize = 10;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let config_path = args
        .config
        .as_deref()
        .unwrap_or(Config::default_config_path());
    let mut config = Config::load(config_path)?;
    config.override_from_env();

    if args.list {
        tracing_subscriber::fmt()
            .with_target(false)
            .without_time()
            .init();
        let list = load_destinations(&args.addresses)?;
        print_destinations(&list.accepted);
        return Ok(());
    }

    let log_path = logging::init(&config.output_dir)?;
    tracing::info!("日志文件: {}", log_path.display());

    let account_set = Account::load_with_env_fallback(&args.accounts)?;
    if let Some(amount) = account_set.default_amount {
        config.apply_legacy_amount(amount);
    }
    let accounts = account_set.accounts;
    tracing::info!("已加载 {} 个账号", accounts.len());

    if let Some(amount) = args.amount {
        config.amount = amount;
    }
    if let Some(mode) = args.mode {
        config.mode = mode;
    }
    if let Some(max_attempts) = args.max_attempts {
        config.max_attempts = max_attempts;
    }
    config.validate().context("配置无效")?;

    let destinations = load_destinations(&args.addresses)?;
    if destinations.accepted.is_empty() {
        anyhow::bail!("没有可用的收款地址: {}", args.addresses);
    }
    tracing::info!(
        "发现 {} 个有效地址（忽略 {} 个无效地址）",
        destinations.accepted.len(),
        destinations.rejected.len()
    );

    let proxies = http_client::load_proxies(&args.proxies)?;
    if !proxies.is_empty() {
        tracing::info!("已加载 {} 个代理", proxies.len());
    }

    let provider = CampaignProvider::new(&config, proxies)?;
    let dispatcher = Dispatcher::new(
        provider,
        TokioSleeper,
        RetryPolicy::from_config(&config),
        TransientPatterns::new(&config.transient_errors),
    );

    let mut ctx = RunContext::new();
    let requests = config
        .mode
        .plan(&accounts, &destinations.accepted, config.amount, ctx.rng());
    let settings = RunSettings {
        amount: config.amount,
        mode: config.mode,
        pacing: config.pacing,
        max_attempts: config.max_attempts,
    };

    let interrupted = tokio::select! {
        _ = runner::run_transfers(&dispatcher, &mut ctx, &requests, &settings) => false,
        _ = tokio::signal::ctrl_c() => true,
    };
    if interrupted {
        tracing::warn!("收到中断信号，终止运行");
        std::process::exit(130);
    }

    runner::log_summary(&ctx.stats);
    runner::write_failure_report(&config.output_dir, ctx.failed())?;

    Ok(())
}

fn print_destinations(destinations: &[Destination]) {
    if destinations.is_empty() {
        println!("没有有效地址");
        return;
    }

    println!("\n地址列表 ({}):", destinations.len());
    for (i, dest) in destinations.iter().take(LIST_PREVIEW).enumerate() {
        println!("{:3}. {}", i + 1, dest);
    }
    if destinations.len() > LIST_PREVIEW {
        println!("... 另有 {} 个", destinations.len() - LIST_PREVIEW);
    }
}
