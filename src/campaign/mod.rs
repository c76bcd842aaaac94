//! 活动服务客户端
//!
//! 包含账号/地址/转账的数据模型，以及发起转账请求的 Provider

pub mod model;
pub mod provider;
pub mod user_agent;

pub use provider::CampaignProvider;
