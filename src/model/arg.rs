use clap::Parser;

use crate::campaign::model::account::Account;
use crate::dispatch::strategy::IterationMode;

/// 活动批量转账工具
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Args {
    /// 配置文件路径
    #[arg(short, long)]
    pub config: Option<String>,

    /// 账号文件路径（JSON 或 key=value 文本）
    #[arg(short, long, default_value = Account::default_accounts_path())]
    pub accounts: String,

    /// 收款地址文件路径（每行一个）
    #[arg(long, default_value = "adrs.txt")]
    pub addresses: String,

    /// 代理列表文件路径（可选，每行一个）
    #[arg(long, default_value = "proxies.txt")]
    pub proxies: String,

    /// 每笔转账金额，覆盖配置文件
    #[arg(long)]
    pub amount: Option<f64>,

    /// 账号分配模式: sequential / round_robin / random
    #[arg(short, long)]
    pub mode: Option<IterationMode>,

    /// 单笔最大尝试次数，覆盖配置文件
    #[arg(long)]
    pub max_attempts: Option<u32>,

    /// 只列出有效地址后退出
    #[arg(long)]
    pub list: bool,
}
