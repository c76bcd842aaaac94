//! 活动 API Provider
//!
//! 负责构建请求头并向转账接口发起请求，实现 [`TransferTransport`]

use reqwest::header::{
    HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, CONTENT_TYPE, COOKIE, HOST, ORIGIN, REFERER,
    USER_AGENT,
};
use reqwest::Client;
use std::io;

use crate::campaign::model::account::Account;
use crate::campaign::model::transfer::TransferRequest;
use crate::campaign::user_agent::UserAgentPool;
use crate::dispatch::transport::{RawResponse, TransferTransport, TransportError};
use crate::http_client::{build_client, ProxyConfig};
use crate::model::config::Config;

/// 活动 API Provider
pub struct CampaignProvider {
    client: Client,
    transfer_url: String,
    api_host: String,
    origin: String,
    access_token: String,
    timeout_secs: u64,
    proxies: Vec<ProxyConfig>,
    user_agents: UserAgentPool,
}

impl CampaignProvider {
    /// 创建 Provider，`proxies` 为可选的全局代理池
    pub fn new(config: &Config, proxies: Vec<ProxyConfig>) -> anyhow::Result<Self> {
        let client = build_client(None, config.request_timeout_secs)?;

        Ok(Self {
            client,
            transfer_url: config.transfer_url(),
            api_host: config.api_host.clone(),
            origin: config.origin.trim_end_matches('/').to_string(),
            access_token: config.access_token.clone(),
            timeout_secs: config.request_timeout_secs,
            proxies,
            user_agents: UserAgentPool::new(&config.user_agents),
        })
    }

    /// 构建请求头
    fn build_headers(&self, account: &Account, user_agent: &str) -> anyhow::Result<HeaderMap> {
        let mut headers = HeaderMap::new();

        headers.insert(HOST, HeaderValue::from_str(&self.api_host)?);
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/json, text/plain, */*"),
        );
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.6"));
        headers.insert("access-token", HeaderValue::from_str(&self.access_token)?);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(COOKIE, HeaderValue::from_str(&account.cookie)?);
        headers.insert(ORIGIN, HeaderValue::from_str(&self.origin)?);
        headers.insert(
            REFERER,
            HeaderValue::from_str(&format!("{}/", self.origin))?,
        );
        headers.insert("priority", HeaderValue::from_static("u=1, i"));
        headers.insert("sec-ch-ua-mobile", HeaderValue::from_static("?0"));
        headers.insert("sec-fetch-dest", HeaderValue::from_static("empty"));
        headers.insert("sec-fetch-mode", HeaderValue::from_static("cors"));
        headers.insert("sec-fetch-site", HeaderValue::from_static("same-site"));
        headers.insert("sec-gpc", HeaderValue::from_static("1"));
        headers.insert(USER_AGENT, HeaderValue::from_str(user_agent)?);

        Ok(headers)
    }

    /// 选择本次请求使用的代理：账号专属代理优先，否则从代理池随机挑选
    fn select_proxy(&self, account: &Account) -> Option<ProxyConfig> {
        if let Some(proxy) = account.proxy_config() {
            return Some(proxy);
        }
        if self.proxies.is_empty() {
            return None;
        }
        Some(self.proxies[fastrand::usize(..self.proxies.len())].clone())
    }

    fn client_for(&self, proxy: Option<&ProxyConfig>) -> Result<Client, TransportError> {
        match proxy {
            Some(proxy) => build_client(Some(proxy), self.timeout_secs)
                .map_err(|e| TransportError::Other(format!("创建代理客户端失败: {}", e))),
            None => Ok(self.client.clone()),
        }
    }
}

impl TransferTransport for CampaignProvider {
    async fn send(&self, request: &TransferRequest<'_>) -> Result<RawResponse, TransportError> {
        let headers = self
            .build_headers(request.account, self.user_agents.pick())
            .map_err(|e| TransportError::Other(format!("构建请求头失败: {}", e)))?;

        let proxy = self.select_proxy(request.account);
        let client = self.client_for(proxy.as_ref())?;

        let response = client
            .post(&self.transfer_url)
            .headers(headers)
            .json(&request.body())
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = response.status();
        let body = response.text().await.map_err(map_reqwest_error)?;

        Ok(RawResponse::new(status, body))
    }
}

fn map_reqwest_error(error: reqwest::Error) -> TransportError {
    if error.is_timeout() {
        TransportError::Timeout
    } else if error.is_connect() || has_connection_io_error(&error) {
        TransportError::Connection(error.to_string())
    } else {
        TransportError::Other(error.to_string())
    }
}

/// 沿错误链查找连接被拒绝/重置/中断的 io 错误
fn has_connection_io_error(error: &reqwest::Error) -> bool {
    let mut source = std::error::Error::source(error);
    while let Some(err) = source {
        if let Some(io_err) = err.downcast_ref::<io::Error>() {
            if is_connection_kind(io_err.kind()) {
                return true;
            }
        }
        source = err.source();
    }
    false
}

fn is_connection_kind(kind: io::ErrorKind) -> bool {
    matches!(
        kind,
        io::ErrorKind::ConnectionRefused
            | io::ErrorKind::ConnectionReset
            | io::ErrorKind::ConnectionAborted
    )
}
