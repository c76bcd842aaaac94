//! 活动服务数据模型
//!
//! - `account`: 账号与加载
//! - `destination`: 收款地址校验与加载
//! - `transfer`: 转账请求/响应

pub mod account;
pub mod destination;
pub mod transfer;
