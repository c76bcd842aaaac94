//! 带重试的转账调度器
//!
//! 每笔转账最多发起 `max_attempts` 次请求：
//! - 第 2 次起，请求前先在退避区间内随机等待
//! - 429 额外等待一个限流区间，连接被拒绝/重置额外冷却固定时长
//! - 成功或不可重试的业务错误立即结束
//!
//! 所有错误都在这里被吸收，调用方只会拿到 [`TransferOutcome`]

use std::time::Duration;

use super::classify::{classify_error, classify_response, RetryReason, TransientPatterns, Verdict};
use super::delay::DelayWindow;
use super::outcome::TransferOutcome;
use super::stats::RunContext;
use super::transport::{SleepReason, Sleeper, TokioSleeper, TransferTransport};
use crate::campaign::model::transfer::TransferRequest;
use crate::model::config::Config;

/// 重试相关的等待参数
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub retry_backoff: DelayWindow,
    pub rate_limit_backoff: DelayWindow,
    pub connection_cooldown: Duration,
}

impl RetryPolicy {
    pub fn from_config(config: &Config) -> Self {
        Self {
            retry_backoff: config.retry_backoff,
            rate_limit_backoff: config.rate_limit_backoff,
            connection_cooldown: Duration::from_secs(config.connection_cooldown_secs),
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

/// 转账调度器
pub struct Dispatcher<T, S = TokioSleeper> {
    transport: T,
    sleeper: S,
    policy: RetryPolicy,
    patterns: TransientPatterns,
}

impl<T: TransferTransport, S: Sleeper> Dispatcher<T, S> {
    pub fn new(transport: T, sleeper: S, policy: RetryPolicy, patterns: TransientPatterns) -> Self {
        Self {
            transport,
            sleeper,
            policy,
            patterns,
        }
    }

    pub fn sleeper(&self) -> &S {
        &self.sleeper
    }

    /// 执行一笔转账直到得到最终结果
    pub async fn dispatch(
        &self,
        ctx: &mut RunContext,
        request: &TransferRequest<'_>,
        max_attempts: u32,
    ) -> TransferOutcome {
        let max_attempts = max_attempts.max(1);
        let destination = request.destination;
        let label = request.account.label();
        ctx.stats.attempted += 1;

        for attempt in 1..=max_attempts {
            if attempt > 1 {
                ctx.stats.retries += 1;
                let delay = self.policy.retry_backoff.sample(ctx.rng());
                tracing::info!(
                    "Retry {}/{} -> {}，等待 {} 秒",
                    attempt,
                    max_attempts,
                    destination,
                    delay.as_secs()
                );
                self.sleeper.sleep(SleepReason::RetryBackoff, delay).await;
            }

            tracing::info!(
                "[{}] 第 {}/{} 次尝试 -> {} ({})",
                label,
                attempt,
                max_attempts,
                destination,
                request.amount
            );

            let reason = match self.transport.send(request).await {
                Ok(response) => match classify_response(&response, &self.patterns) {
                    Verdict::Success {
                        hash,
                        status,
                        nonce,
                    } => {
                        ctx.stats.succeeded += 1;
                        tracing::info!(
                            "[{}] 转账成功 -> {}，hash={} status={} nonce={}",
                            label,
                            destination,
                            hash,
                            status,
                            nonce
                        );
                        return TransferOutcome::Success {
                            hash,
                            status,
                            nonce,
                        };
                    }
                    Verdict::Terminal(message) => {
                        ctx.stats.failed += 1;
                        ctx.record_failed(destination);
                        tracing::warn!("[{}] 转账被拒绝 -> {}: {}", label, destination, message);
                        return TransferOutcome::rejected(message);
                    }
                    Verdict::Retry(reason) => reason,
                },
                Err(e) => classify_error(&e),
            };

            tracing::warn!("[{}] {} ({})，将重试", label, reason, reason.kind());

            // 最后一次尝试之后不再额外等待
            if attempt < max_attempts {
                self.extra_wait(ctx, &reason).await;
            }
        }

        ctx.stats.failed += 1;
        ctx.record_failed(destination);
        tracing::error!(
            "[{}] 转账失败 -> {}：{} 次尝试后仍未成功",
            label,
            destination,
            max_attempts
        );
        TransferOutcome::exhausted()
    }

    async fn extra_wait(&self, ctx: &mut RunContext, reason: &RetryReason) {
        match reason {
            RetryReason::RateLimited => {
                let wait = self.policy.rate_limit_backoff.sample(ctx.rng());
                tracing::info!("触发限流，等待 {} 秒", wait.as_secs());
                self.sleeper.sleep(SleepReason::RateLimit, wait).await;
            }
            RetryReason::Connection(_) => {
                let wait = self.policy.connection_cooldown;
                tracing::info!("连接异常，冷却 {} 秒", wait.as_secs());
                self.sleeper
                    .sleep(SleepReason::ConnectionCooldown, wait)
                    .await;
            }
            _ => {}
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::campaign::model::account::Account;
    use crate::campaign::model::destination::Destination;
    use crate::dispatch::classify::TransientPattern;
    use crate::dispatch::outcome::ErrorKind;
    use crate::dispatch::transport::{RawResponse, TransportError};
    use http::StatusCode;
    use std::cell::{Cell, RefCell};
    use std::collections::VecDeque;

    type Reply = Result<RawResponse, TransportError>;

    /// 按脚本依次返回结果，脚本用尽后重复最后一条
    pub(crate) struct ScriptedTransport {
        replies: RefCell<VecDeque<Reply>>,
        last: RefCell<Option<Reply>>,
        calls: Cell<usize>,
    }

    impl ScriptedTransport {
        pub(crate) fn new(replies: Vec<Reply>) -> Self {
            Self {
                replies: RefCell::new(replies.into()),
                last: RefCell::new(None),
                calls: Cell::new(0),
            }
        }

        pub(crate) fn calls(&self) -> usize {
            self.calls.get()
        }
    }

    impl TransferTransport for ScriptedTransport {
        async fn send(&self, _request: &TransferRequest<'_>) -> Reply {
            self.calls.set(self.calls.get() + 1);
            let next = self.replies.borrow_mut().pop_front();
            match next {
                Some(reply) => {
                    *self.last.borrow_mut() = Some(reply.clone());
                    reply
                }
                None => self
                    .last
                    .borrow()
                    .clone()
                    .unwrap_or(Err(TransportError::Other("empty script".to_string()))),
            }
        }
    }

    #[derive(Default)]
    pub(crate) struct RecordingSleeper {
        pub(crate) sleeps: RefCell<Vec<(SleepReason, Duration)>>,
    }

    impl RecordingSleeper {
        pub(crate) fn count(&self, reason: SleepReason) -> usize {
            self.sleeps
                .borrow()
                .iter()
                .filter(|(r, _)| *r == reason)
                .count()
        }
    }

    impl Sleeper for RecordingSleeper {
        async fn sleep(&self, reason: SleepReason, duration: Duration) {
            self.sleeps.borrow_mut().push((reason, duration));
        }
    }

    pub(crate) fn ok(body: &str) -> Reply {
        Ok(RawResponse::new(StatusCode::OK, body))
    }

    pub(crate) fn status(code: StatusCode) -> Reply {
        Ok(RawResponse::new(code, ""))
    }

    pub(crate) const SUCCESS_BODY: &str =
        r#"{"success":true,"data":{"transferData":{"hash":"0xabc","status":"success","nonce":3}}}"#;

    fn dispatcher(transport: ScriptedTransport) -> Dispatcher<ScriptedTransport, RecordingSleeper> {
        let patterns: Vec<_> = ["rate limit", "database", "internal", "timeout", "busy"]
            .into_iter()
            .map(TransientPattern::retryable)
            .collect();
        Dispatcher::new(
            transport,
            RecordingSleeper::default(),
            RetryPolicy::default(),
            TransientPatterns::new(&patterns),
        )
    }

    fn fixtures() -> (Account, Destination) {
        let account = Account::new("u1", "session=abc");
        let destination = format!("0x{}", "1f".repeat(20)).parse().unwrap();
        (account, destination)
    }

    #[tokio::test]
    async fn test_success_first_attempt() {
        let (account, dest) = fixtures();
        let request = TransferRequest::new(&account, &dest, 0.001);
        let d = dispatcher(ScriptedTransport::new(vec![ok(SUCCESS_BODY)]));
        let mut ctx = RunContext::with_seed(1);

        let outcome = d.dispatch(&mut ctx, &request, 5).await;

        assert_eq!(
            outcome,
            TransferOutcome::Success {
                hash: "0xabc".into(),
                status: "success".into(),
                nonce: "3".into()
            }
        );
        assert_eq!(d.transport.calls(), 1);
        assert!(d.sleeper().sleeps.borrow().is_empty());
        assert_eq!(ctx.stats.succeeded, 1);
        assert_eq!(ctx.stats.retries, 0);
    }

    #[tokio::test]
    async fn test_reported_success_is_never_resent() {
        let (account, dest) = fixtures();
        let request = TransferRequest::new(&account, &dest, 0.001);

        for body in [
            r#"{"success":true,"data":{"transferData":{"hash":12345,"status":"success","nonce":3}}}"#,
            r#"{"success":true,"data":"queued"}"#,
        ] {
            let d = dispatcher(ScriptedTransport::new(vec![ok(body), ok(SUCCESS_BODY)]));
            let mut ctx = RunContext::with_seed(1);

            let outcome = d.dispatch(&mut ctx, &request, 3).await;

            assert!(outcome.is_success(), "body {} should succeed", body);
            assert_eq!(d.transport.calls(), 1);
            assert_eq!(ctx.stats.retries, 0);
            assert!(ctx.failed().is_empty());
        }
    }

    #[tokio::test]
    async fn test_rate_limit_message_retries() {
        let (account, dest) = fixtures();
        let request = TransferRequest::new(&account, &dest, 0.001);
        let d = dispatcher(ScriptedTransport::new(vec![
            ok(r#"{"success":false,"message":"RATE LIMIT hit"}"#),
            ok(SUCCESS_BODY),
        ]));
        let mut ctx = RunContext::with_seed(1);

        let outcome = d.dispatch(&mut ctx, &request, 3).await;

        assert!(outcome.is_success());
        assert_eq!(d.transport.calls(), 2);
        assert_eq!(d.sleeper().count(SleepReason::RetryBackoff), 1);
        assert_eq!(d.sleeper().count(SleepReason::RateLimit), 0);
        assert_eq!(ctx.stats.retries, 1);
    }

    #[tokio::test]
    async fn test_rate_limit_message_exhausts() {
        let (account, dest) = fixtures();
        let request = TransferRequest::new(&account, &dest, 0.001);
        let d = dispatcher(ScriptedTransport::new(vec![ok(
            r#"{"success":false,"message":"rate limit"}"#,
        )]));
        let mut ctx = RunContext::with_seed(1);

        let outcome = d.dispatch(&mut ctx, &request, 1).await;

        assert_eq!(outcome, TransferOutcome::exhausted());
        assert_eq!(d.transport.calls(), 1);
    }

    #[tokio::test]
    async fn test_terminal_message_never_retries() {
        let (account, dest) = fixtures();
        let request = TransferRequest::new(&account, &dest, 0.001);
        let d = dispatcher(ScriptedTransport::new(vec![ok(
            r#"{"success":false,"message":"Invalid address"}"#,
        )]));
        let mut ctx = RunContext::with_seed(1);

        let outcome = d.dispatch(&mut ctx, &request, 10).await;

        assert_eq!(
            outcome,
            TransferOutcome::Failure {
                kind: ErrorKind::TerminalApplication,
                reason: "Invalid address".into()
            }
        );
        assert_eq!(d.transport.calls(), 1);
        assert!(d.sleeper().sleeps.borrow().is_empty());
        assert_eq!(ctx.failed(), &[dest]);
    }

    #[tokio::test]
    async fn test_429_three_times_then_success() {
        let (account, dest) = fixtures();
        let request = TransferRequest::new(&account, &dest, 0.001);
        let d = dispatcher(ScriptedTransport::new(vec![
            status(StatusCode::TOO_MANY_REQUESTS),
            status(StatusCode::TOO_MANY_REQUESTS),
            status(StatusCode::TOO_MANY_REQUESTS),
            ok(SUCCESS_BODY),
        ]));
        let mut ctx = RunContext::with_seed(1);

        let outcome = d.dispatch(&mut ctx, &request, 10).await;

        assert!(outcome.is_success());
        assert_eq!(d.transport.calls(), 4);
        assert_eq!(d.sleeper().count(SleepReason::RateLimit), 3);
        assert_eq!(d.sleeper().count(SleepReason::RetryBackoff), 3);
        for (reason, duration) in d.sleeper().sleeps.borrow().iter() {
            let secs = duration.as_secs();
            match reason {
                SleepReason::RateLimit => assert!((30..=60).contains(&secs)),
                SleepReason::RetryBackoff => assert!((10..=30).contains(&secs)),
                other => panic!("unexpected sleep {:?}", other),
            }
        }
        assert_eq!(ctx.stats.retries, 3);
    }

    #[tokio::test]
    async fn test_always_503_exhausts_after_max_attempts() {
        let (account, dest) = fixtures();
        let request = TransferRequest::new(&account, &dest, 0.001);
        let d = dispatcher(ScriptedTransport::new(vec![status(
            StatusCode::SERVICE_UNAVAILABLE,
        )]));
        let mut ctx = RunContext::with_seed(1);

        let outcome = d.dispatch(&mut ctx, &request, 3).await;

        assert_eq!(
            outcome,
            TransferOutcome::Failure {
                kind: ErrorKind::ExhaustedRetries,
                reason: "max retries exceeded".into()
            }
        );
        assert_eq!(d.transport.calls(), 3);
        assert_eq!(ctx.stats.failed, 1);
        assert_eq!(ctx.stats.retries, 2);
    }

    #[tokio::test]
    async fn test_connection_error_adds_cooldown() {
        let (account, dest) = fixtures();
        let request = TransferRequest::new(&account, &dest, 0.001);
        let d = dispatcher(ScriptedTransport::new(vec![
            Err(TransportError::Connection("connection refused".into())),
            Err(TransportError::Timeout),
            Err(TransportError::Other("tls handshake".into())),
            ok(SUCCESS_BODY),
        ]));
        let mut ctx = RunContext::with_seed(1);

        let outcome = d.dispatch(&mut ctx, &request, 4).await;

        assert!(outcome.is_success());
        assert_eq!(d.transport.calls(), 4);
        let cooldowns: Vec<_> = d
            .sleeper()
            .sleeps
            .borrow()
            .iter()
            .filter(|(r, _)| *r == SleepReason::ConnectionCooldown)
            .map(|(_, d)| *d)
            .collect();
        assert_eq!(cooldowns, vec![Duration::from_secs(15)]);
    }

    #[tokio::test]
    async fn test_unexpected_status_and_bad_json_retry() {
        let (account, dest) = fixtures();
        let request = TransferRequest::new(&account, &dest, 0.001);
        let d = dispatcher(ScriptedTransport::new(vec![
            status(StatusCode::FORBIDDEN),
            ok("not json"),
            ok(SUCCESS_BODY),
        ]));
        let mut ctx = RunContext::with_seed(1);

        assert!(d.dispatch(&mut ctx, &request, 3).await.is_success());
        assert_eq!(d.transport.calls(), 3);
    }

    #[tokio::test]
    async fn test_call_count_bounded_by_max_attempts() {
        let (account, dest) = fixtures();
        let request = TransferRequest::new(&account, &dest, 0.001);
        for n in 1..=5 {
            let d = dispatcher(ScriptedTransport::new(vec![Err(TransportError::Timeout)]));
            let mut ctx = RunContext::with_seed(n as u64);
            d.dispatch(&mut ctx, &request, n).await;
            assert_eq!(d.transport.calls(), n as usize);
        }
    }

    #[tokio::test]
    async fn test_zero_max_attempts_treated_as_one() {
        let (account, dest) = fixtures();
        let request = TransferRequest::new(&account, &dest, 0.001);
        let d = dispatcher(ScriptedTransport::new(vec![status(StatusCode::BAD_GATEWAY)]));
        let mut ctx = RunContext::with_seed(1);

        assert_eq!(
            d.dispatch(&mut ctx, &request, 0).await,
            TransferOutcome::exhausted()
        );
        assert_eq!(d.transport.calls(), 1);
    }
}
