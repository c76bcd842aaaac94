//! 响应分类
//!
//! 将一次请求的结果归入三类：成功、可重试、终止失败。
//! 业务错误消息是否可重试由 [`TransientPatterns`] 决定，规则表来自配置。

use http::StatusCode;
use serde::{Deserialize, Serialize};

use super::outcome::ErrorKind;
use super::transport::{RawResponse, TransportError};
use crate::campaign::model::transfer::TransferResponse;

/// 错误消息匹配规则
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransientPattern {
    /// 子串（大小写不敏感）
    pub pattern: String,
    /// 命中后是否重试
    #[serde(default = "default_retryable")]
    pub retryable: bool,
}

fn default_retryable() -> bool {
    true
}

impl TransientPattern {
    pub fn retryable(pattern: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            retryable: true,
        }
    }

    #[cfg(test)]
    pub fn terminal(pattern: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            retryable: false,
        }
    }
}

/// 按顺序匹配的规则表，首个命中的规则生效，未命中视为不可重试
#[derive(Debug, Clone, Default)]
pub struct TransientPatterns {
    rules: Vec<(String, bool)>,
}

impl TransientPatterns {
    pub fn new(patterns: &[TransientPattern]) -> Self {
        Self {
            rules: patterns
                .iter()
                .filter(|p| !p.pattern.is_empty())
                .map(|p| (p.pattern.to_lowercase(), p.retryable))
                .collect(),
        }
    }

    /// 判断错误消息是否可重试
    pub fn is_retryable(&self, message: &str) -> bool {
        let message = message.to_lowercase();
        self.rules
            .iter()
            .find(|(pattern, _)| message.contains(pattern.as_str()))
            .map(|(_, retryable)| *retryable)
            .unwrap_or(false)
    }
}

/// 需要重试的原因
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryReason {
    /// HTTP 429
    RateLimited,
    /// HTTP 5xx
    ServerError(u16),
    /// 其他非预期状态码
    UnexpectedStatus { status: u16, body: String },
    /// 业务层可重试错误
    TransientMessage(String),
    /// 200 但响应体无法解析
    MalformedBody(String),
    /// 请求超时
    Timeout,
    /// 连接被拒绝/重置
    Connection(String),
    /// 其他传输错误
    Transport(String),
}

impl RetryReason {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::TransientMessage(_) => ErrorKind::TransientApplication,
            _ => ErrorKind::TransientTransport,
        }
    }
}

impl std::fmt::Display for RetryReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::RateLimited => write!(f, "Rate limit exceeded (429)"),
            Self::ServerError(status) => write!(f, "Server error {}", status),
            Self::UnexpectedStatus { status, body } => write!(f, "HTTP {}: {}", status, body),
            Self::TransientMessage(msg) => write!(f, "{}", msg),
            Self::MalformedBody(msg) => write!(f, "响应解析失败: {}", msg),
            Self::Timeout => write!(f, "请求超时"),
            Self::Connection(msg) => write!(f, "连接错误: {}", msg),
            Self::Transport(msg) => write!(f, "请求异常: {}", msg),
        }
    }
}

/// 单次尝试的判定结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Success {
        hash: String,
        status: String,
        nonce: String,
    },
    Retry(RetryReason),
    Terminal(String),
}

/// 分类 HTTP 响应
pub fn classify_response(response: &RawResponse, patterns: &TransientPatterns) -> Verdict {
    let status = response.status;

    if status == StatusCode::OK {
        let parsed = match TransferResponse::parse(&response.body) {
            Ok(parsed) => parsed,
            Err(e) => return Verdict::Retry(RetryReason::MalformedBody(e)),
        };

        if parsed.success {
            let data = parsed.transfer_data;
            return Verdict::Success {
                hash: data.hash,
                status: data.status,
                nonce: data.nonce,
            };
        }

        let message = parsed
            .message
            .unwrap_or_else(|| "Unknown error".to_string());
        if patterns.is_retryable(&message) {
            return Verdict::Retry(RetryReason::TransientMessage(message));
        }
        return Verdict::Terminal(message);
    }

    if status == StatusCode::TOO_MANY_REQUESTS {
        return Verdict::Retry(RetryReason::RateLimited);
    }

    if status.is_server_error() {
        return Verdict::Retry(RetryReason::ServerError(status.as_u16()));
    }

    Verdict::Retry(RetryReason::UnexpectedStatus {
        status: status.as_u16(),
        body: response.body.clone(),
    })
}

/// 分类传输层错误，传输错误一律可重试
pub fn classify_error(error: &TransportError) -> RetryReason {
    match error {
        TransportError::Timeout => RetryReason::Timeout,
        TransportError::Connection(msg) => RetryReason::Connection(msg.clone()),
        TransportError::Other(msg) => RetryReason::Transport(msg.clone()),
    }
}
