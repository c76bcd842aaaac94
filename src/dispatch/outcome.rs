//! 转账结果与错误分类

/// 错误类别
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// 超时、连接错误、429、5xx 以及未识别的状态码
    TransientTransport,
    /// 服务端返回可重试的错误消息
    TransientApplication,
    /// 服务端明确拒绝，不再重试
    TerminalApplication,
    /// 达到最大尝试次数
    ExhaustedRetries,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TransientTransport => "transient_transport",
            Self::TransientApplication => "transient_application",
            Self::TerminalApplication => "terminal_application",
            Self::ExhaustedRetries => "exhausted_retries",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 单笔转账的最终结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransferOutcome {
    Success {
        hash: String,
        status: String,
        nonce: String,
    },
    Failure {
        kind: ErrorKind,
        reason: String,
    },
}

impl TransferOutcome {
    /// 服务端拒绝
    pub fn rejected(reason: impl Into<String>) -> Self {
        Self::Failure {
            kind: ErrorKind::TerminalApplication,
            reason: reason.into(),
        }
    }

    /// 重试耗尽
    pub fn exhausted() -> Self {
        Self::Failure {
            kind: ErrorKind::ExhaustedRetries,
            reason: MAX_RETRIES_EXCEEDED.to_string(),
        }
    }

    #[cfg(test)]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }
}

/// 重试耗尽时的失败原因
pub const MAX_RETRIES_EXCEEDED: &str = "max retries exceeded";
