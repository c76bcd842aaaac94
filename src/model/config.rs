use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::Path;

use crate::dispatch::classify::TransientPattern;
use crate::dispatch::delay::DelayWindow;
use crate::dispatch::strategy::IterationMode;

/// 转账任务配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// 活动 API 域名
    #[serde(default = "default_api_host")]
    pub api_host: String,

    /// 请求头中的 origin（referer 由其派生）
    #[serde(default = "default_origin")]
    pub origin: String,

    /// 请求头中的 access-token
    #[serde(default = "default_access_token")]
    pub access_token: String,

    /// 每笔转账金额
    #[serde(default = "default_amount")]
    pub amount: f64,

    /// 账号分配模式
    #[serde(default)]
    pub mode: IterationMode,

    /// 单笔转账最大尝试次数
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// 单次请求超时（秒）
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// 两笔转账之间的随机间隔
    #[serde(default = "default_pacing")]
    pub pacing: DelayWindow,

    /// 重试前的随机退避
    #[serde(default = "default_retry_backoff")]
    pub retry_backoff: DelayWindow,

    /// 收到 429 后的额外等待
    #[serde(default = "default_rate_limit_backoff")]
    pub rate_limit_backoff: DelayWindow,

    /// 连接被拒绝/重置后的固定等待（秒）
    #[serde(default = "default_connection_cooldown_secs")]
    pub connection_cooldown_secs: u64,

    /// 可重试错误消息表（按顺序匹配，大小写不敏感）
    #[serde(default = "default_transient_errors")]
    pub transient_errors: Vec<TransientPattern>,

    /// 自定义 User-Agent 列表（为空时使用内置列表）
    #[serde(default)]
    pub user_agents: Vec<String>,

    /// 日志与失败列表的输出目录
    #[serde(default = "default_output_dir")]
    pub output_dir: String,
}

impl Config {
    /// 从环境变量覆盖配置
    pub fn override_from_env(&mut self) {
        if let Ok(host) = env::var("API_HOST") {
            self.api_host = host;
        }
        if let Some(amount) = env_amount() {
            self.amount = amount;
        }
        if let Ok(mode) = env::var("TRANSFER_MODE") {
            if let Ok(m) = mode.parse() {
                self.mode = m;
            }
        }
        if let Ok(attempts) = env::var("MAX_ATTEMPTS") {
            if let Ok(n) = attempts.parse() {
                self.max_attempts = n;
            }
        }
        if let Ok(timeout) = env::var("REQUEST_TIMEOUT") {
            if let Ok(t) = timeout.parse() {
                self.request_timeout_secs = t;
            }
        }
        if let Ok(dir) = env::var("OUTPUT_DIR") {
            self.output_dir = dir;
        }
    }

    /// 应用旧版账号文件中的默认金额
    ///
    /// 优先级高于配置文件，低于 `TRANSFER_AMOUNT` 和命令行参数
    pub fn apply_legacy_amount(&mut self, amount: f64) {
        self.set_legacy_amount(amount, env_amount().is_some());
    }

    fn set_legacy_amount(&mut self, amount: f64, env_overrides: bool) {
        if env_overrides {
            tracing::info!("TRANSFER_AMOUNT 已设置，忽略账号文件中的 amount={}", amount);
            return;
        }
        self.amount = amount;
    }

    /// 校验配置，任何错误都会在发起转账前终止运行
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.api_host.trim().is_empty() {
            anyhow::bail!("apiHost 不能为空");
        }
        if !self.amount.is_finite() || self.amount <= 0.0 {
            anyhow::bail!("转账金额必须大于 0: {}", self.amount);
        }
        if self.max_attempts == 0 {
            anyhow::bail!("maxAttempts 至少为 1");
        }
        if self.request_timeout_secs == 0 {
            anyhow::bail!("requestTimeoutSecs 必须大于 0");
        }
        if !(30..=60).contains(&self.request_timeout_secs) {
            tracing::warn!(
                "请求超时 {} 秒超出常用范围 30-60 秒",
                self.request_timeout_secs
            );
        }
        self.pacing.validate().context("pacing 配置无效")?;
        self.retry_backoff.validate().context("retryBackoff 配置无效")?;
        self.rate_limit_backoff
            .validate()
            .context("rateLimitBackoff 配置无效")?;
        Ok(())
    }

    /// 转账接口完整地址
    pub fn transfer_url(&self) -> String {
        format!("https://{}/api/v1/transaction/transfer", self.api_host)
    }
}

fn env_amount() -> Option<f64> {
    env::var("TRANSFER_AMOUNT").ok().and_then(|a| a.parse().ok())
}

fn default_api_host() -> String {
    "campapi.diamante.io".to_string()
}

fn default_origin() -> String {
    "https://campaign.diamante.io".to_string()
}

fn default_access_token() -> String {
    "key".to_string()
}

fn default_amount() -> f64 {
    0.001
}

fn default_max_attempts() -> u32 {
    10
}

fn default_request_timeout_secs() -> u64 {
    60
}

fn default_pacing() -> DelayWindow {
    DelayWindow::new(5, 15)
}

fn default_retry_backoff() -> DelayWindow {
    DelayWindow::new(10, 30)
}

fn default_rate_limit_backoff() -> DelayWindow {
    DelayWindow::new(30, 60)
}

fn default_connection_cooldown_secs() -> u64 {
    15
}

fn default_transient_errors() -> Vec<TransientPattern> {
    ["rate limit", "database", "internal", "timeout", "busy"]
        .into_iter()
        .map(TransientPattern::retryable)
        .collect()
}

fn default_output_dir() -> String {
    ".".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_host: default_api_host(),
            origin: default_origin(),
            access_token: default_access_token(),
            amount: default_amount(),
            mode: IterationMode::default(),
            max_attempts: default_max_attempts(),
            request_timeout_secs: default_request_timeout_secs(),
            pacing: default_pacing(),
            retry_backoff: default_retry_backoff(),
            rate_limit_backoff: default_rate_limit_backoff(),
            connection_cooldown_secs: default_connection_cooldown_secs(),
            transient_errors: default_transient_errors(),
            user_agents: Vec::new(),
            output_dir: default_output_dir(),
        }
    }
}

impl Config {
    /// 获取默认配置文件路径
    pub fn default_config_path() -> &'static str {
        "config.json"
    }

    /// 从文件加载配置
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            // 配置文件不存在，返回默认配置
            return Ok(Self::default());
        }

        let content =
            fs::read_to_string(path).with_context(|| format!("读取配置文件失败: {:?}", path))?;
        let config: Config = serde_json::from_str(&content)
            .with_context(|| format!("解析配置文件失败: {:?}", path))?;
        Ok(config)
    }
}
