//! 活动账号
//!
//! 支持从 JSON 账号文件、旧版 key=value 文本或环境变量加载

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::Path;

use reqwest::header::HeaderValue;

use crate::http_client::ProxyConfig;

/// 账号信息，运行期间只读
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// 用户 ID
    #[serde(alias = "userId")]
    pub user_id: String,

    /// 会话 Cookie
    pub cookie: String,

    /// 显示名称
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nickname: Option<String>,

    /// 账号专属代理
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proxy: Option<String>,
}

/// 账号文件解析结果
#[derive(Debug, Clone, PartialEq)]
pub struct AccountSet {
    pub accounts: Vec<Account>,
    /// 旧版文本中的 `amount=`，作为默认转账金额
    pub default_amount: Option<f64>,
}

/// 账号文件可以是数组，也可以是单个对象
#[derive(Deserialize)]
#[serde(untagged)]
enum AccountsFile {
    Many(Vec<Account>),
    One(Account),
}

impl Account {
    pub fn new(user_id: impl Into<String>, cookie: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            cookie: cookie.into(),
            nickname: None,
            proxy: None,
        }
    }

    #[cfg(test)]
    pub fn with_nickname(mut self, nickname: impl Into<String>) -> Self {
        self.nickname = Some(nickname.into());
        self
    }

    #[cfg(test)]
    pub fn with_proxy(mut self, proxy: impl Into<String>) -> Self {
        self.proxy = Some(proxy.into());
        self
    }

    /// 日志中使用的名称
    pub fn label(&self) -> &str {
        self.nickname.as_deref().unwrap_or(&self.user_id)
    }

    /// 账号专属代理配置
    pub fn proxy_config(&self) -> Option<ProxyConfig> {
        self.proxy.as_deref().and_then(ProxyConfig::parse)
    }

    /// 必填字段校验
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.user_id.trim().is_empty() {
            anyhow::bail!("账号缺少 user_id");
        }
        if self.cookie.trim().is_empty() {
            anyhow::bail!("账号 {} 缺少 cookie", self.user_id);
        }
        HeaderValue::from_str(&self.cookie)
            .with_context(|| format!("账号 {} 的 cookie 含有非法字符", self.user_id))?;
        if let Some(proxy) = &self.proxy {
            if ProxyConfig::parse(proxy).is_none() {
                anyhow::bail!("账号 {} 的代理格式无效: {}", self.user_id, proxy);
            }
        }
        Ok(())
    }

    /// 获取默认账号文件路径
    pub fn default_accounts_path() -> &'static str {
        "accounts.json"
    }

    /// 从环境变量加载单个账号
    pub fn from_env() -> Option<Self> {
        let user_id = env::var("USER_ID").ok()?;
        let cookie = env::var("COOKIE").ok()?;

        Some(Self {
            user_id,
            cookie,
            nickname: env::var("NICKNAME").ok(),
            proxy: env::var("ACCOUNT_PROXY").ok(),
        })
    }

    /// 解析账号文件内容
    ///
    /// 以 `[` 或 `{` 开头按 JSON 解析，否则按 `key=value` 文本解析
    pub fn parse_all(content: &str) -> anyhow::Result<AccountSet> {
        let trimmed = content.trim_start();
        let (accounts, default_amount) = if trimmed.starts_with('[') || trimmed.starts_with('{')
        {
            let accounts = match serde_json::from_str::<AccountsFile>(trimmed)
                .context("账号 JSON 格式错误")?
            {
                AccountsFile::Many(accounts) => accounts,
                AccountsFile::One(account) => vec![account],
            };
            (accounts, None)
        } else {
            let (account, amount) = Self::parse_key_value(content)?;
            (vec![account], amount)
        };

        if accounts.is_empty() {
            anyhow::bail!("账号列表为空");
        }
        for (i, account) in accounts.iter().enumerate() {
            account
                .validate()
                .with_context(|| format!("第 {} 个账号无效", i + 1))?;
        }
        Ok(AccountSet {
            accounts,
            default_amount,
        })
    }

    /// 解析 `key=value` 文本，支持 `#` 注释
    fn parse_key_value(content: &str) -> anyhow::Result<(Self, Option<f64>)> {
        let mut user_id = None;
        let mut amount = None;
        let mut cookie = None;
        let mut nickname = None;
        let mut proxy = None;

        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let Some((key, value)) = line.split_once('=') else {
                continue;
            };
            let value = value.trim().to_string();
            match key.trim() {
                "user_id" | "userId" => user_id = Some(value),
                "cookie" => cookie = Some(value),
                "nickname" => nickname = Some(value),
                "proxy" => proxy = Some(value),
                "amount" => {
                    let parsed: f64 = value
                        .parse()
                        .with_context(|| format!("amount 格式无效: {}", value))?;
                    if !parsed.is_finite() || parsed <= 0.0 {
                        anyhow::bail!("amount 必须大于 0: {}", value);
                    }
                    amount = Some(parsed);
                }
                _ => {}
            }
        }

        match (user_id, cookie) {
            (Some(user_id), Some(cookie)) => Ok((
                Self {
                    user_id,
                    cookie,
                    nickname,
                    proxy,
                },
                amount,
            )),
            _ => anyhow::bail!("账号文件缺少 user_id 或 cookie"),
        }
    }

    /// 从文件加载全部账号
    pub fn load_all<P: AsRef<Path>>(path: P) -> anyhow::Result<AccountSet> {
        let path = path.as_ref();
        let content =
            fs::read_to_string(path).with_context(|| format!("读取账号文件失败: {:?}", path))?;
        if content.trim().is_empty() {
            anyhow::bail!("账号文件为空: {:?}", path);
        }
        Self::parse_all(&content).with_context(|| format!("解析账号文件失败: {:?}", path))
    }

    /// 加载账号：文件存在时读取文件，否则回退到环境变量
    pub fn load_with_env_fallback<P: AsRef<Path>>(path: P) -> anyhow::Result<AccountSet> {
        let path = path.as_ref();
        if path.exists() {
            return Self::load_all(path);
        }

        if let Some(account) = Self::from_env() {
            tracing::info!("账号文件不存在，从环境变量加载账号");
            account.validate()?;
            return Ok(AccountSet {
                accounts: vec![account],
                default_amount: None,
            });
        }

        anyhow::bail!("账号文件不存在: {:?}，且未设置 USER_ID/COOKIE 环境变量", path)
    }
}
