//! 转账调度模块
//!
//! 负责单笔转账的重试与结果分类，以及账号到地址的分配

pub mod classify;
pub mod delay;
pub mod dispatcher;
pub mod outcome;
pub mod stats;
pub mod strategy;
pub mod transport;

pub use dispatcher::{Dispatcher, RetryPolicy};
pub use outcome::TransferOutcome;
pub use stats::{RunContext, RunStats};
pub use strategy::IterationMode;
