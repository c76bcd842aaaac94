//! 传输层抽象
//!
//! 调度器只依赖这里的 trait，真实实现见 `campaign::provider`

use http::StatusCode;
use std::future::Future;
use std::time::Duration;

use crate::campaign::model::transfer::TransferRequest;

/// 原始 HTTP 响应（状态码 + 响应体文本）
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: StatusCode,
    pub body: String,
}

impl RawResponse {
    pub fn new(status: StatusCode, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }
}

/// 传输层错误
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// 请求超时
    Timeout,
    /// 连接被拒绝/重置/中断
    Connection(String),
    /// 其他错误
    Other(String),
}

impl std::fmt::Display for TransportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Timeout => write!(f, "请求超时"),
            Self::Connection(msg) => write!(f, "连接错误: {}", msg),
            Self::Other(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for TransportError {}

/// 发起一次转账请求
pub trait TransferTransport {
    fn send(
        &self,
        request: &TransferRequest<'_>,
    ) -> impl Future<Output = Result<RawResponse, TransportError>>;
}

/// 等待原因，便于日志与测试区分
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SleepReason {
    /// 重试前的常规退避
    RetryBackoff,
    /// 429 之后的额外等待
    RateLimit,
    /// 连接错误后的固定冷却
    ConnectionCooldown,
    /// 两笔转账之间的间隔
    Pacing,
}

/// 可替换的等待实现
pub trait Sleeper {
    fn sleep(&self, reason: SleepReason, duration: Duration) -> impl Future<Output = ()>;
}

/// 基于 tokio 定时器的等待
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

impl Sleeper for TokioSleeper {
    async fn sleep(&self, _reason: SleepReason, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}
