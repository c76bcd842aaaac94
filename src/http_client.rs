//! HTTP Client 构建模块
//!
//! 提供统一的 HTTP Client 构建功能，以及代理列表的加载与解析

use anyhow::Context;
use reqwest::{Client, Proxy};
use std::fs;
use std::path::Path;
use std::time::Duration;

/// 代理配置
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProxyConfig {
    /// 代理地址，支持 http/https/socks5
    pub url: String,
    /// 代理认证用户名
    pub username: Option<String>,
    /// 代理认证密码
    pub password: Option<String>,
}

impl ProxyConfig {
    /// 从 url 创建代理配置
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            username: None,
            password: None,
        }
    }

    /// 设置认证信息
    pub fn with_auth(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self.password = Some(password.into());
        self
    }

    /// 解析单行代理配置
    ///
    /// 支持以下格式：
    /// - `scheme://[user:pass@]host:port`
    /// - `host:port`（按 http 处理）
    /// - `host:port:user:pass`
    pub fn parse(line: &str) -> Option<Self> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }

        if line.contains("://") {
            return Some(Self::new(line));
        }

        let parts: Vec<&str> = line.split(':').collect();
        match parts.as_slice() {
            [host, port] if !host.is_empty() && port.parse::<u16>().is_ok() => {
                Some(Self::new(format!("http://{}:{}", host, port)))
            }
            [host, port, user, pass] if !host.is_empty() && port.parse::<u16>().is_ok() => {
                Some(Self::new(format!("http://{}:{}", host, port)).with_auth(*user, *pass))
            }
            _ => None,
        }
    }
}

/// 从文件加载代理列表
///
/// 文件不存在时返回空列表；无法解析的行会被跳过并记录警告
pub fn load_proxies<P: AsRef<Path>>(path: P) -> anyhow::Result<Vec<ProxyConfig>> {
    let path = path.as_ref();
    if !path.exists() {
        return Ok(Vec::new());
    }

    let content =
        fs::read_to_string(path).with_context(|| format!("读取代理文件失败: {:?}", path))?;
    Ok(parse_proxies(&content))
}

/// 解析代理列表文本（每行一个）
pub fn parse_proxies(content: &str) -> Vec<ProxyConfig> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| match ProxyConfig::parse(line) {
            Some(proxy) => Some(proxy),
            None => {
                tracing::warn!("忽略无效代理: {}", line);
                None
            }
        })
        .collect()
}

/// 构建 HTTP Client
///
/// # Arguments
/// * `proxy` - 可选的代理配置
/// * `timeout_secs` - 超时时间（秒）
///
/// # Returns
/// 配置好的 reqwest::Client
pub fn build_client(proxy: Option<&ProxyConfig>, timeout_secs: u64) -> anyhow::Result<Client> {
    let mut builder = Client::builder().timeout(Duration::from_secs(timeout_secs));

    if let Some(proxy_config) = proxy {
        let mut proxy = Proxy::all(&proxy_config.url)?;

        // 设置代理认证
        if let (Some(username), Some(password)) = (&proxy_config.username, &proxy_config.password) {
            proxy = proxy.basic_auth(username, password);
        }

        builder = builder.proxy(proxy);
        tracing::debug!("HTTP Client 使用代理: {}", proxy_config.url);
    }

    Ok(builder.build()?)
}
