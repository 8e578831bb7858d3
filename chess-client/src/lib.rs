//! 国际象棋对弈客户端
//!
//! 包含:
//! - 单次请求应答的配对服务客户端
//! - 轮询式对局会话
//! - 走法挑选策略

pub mod client;
pub mod session;

pub use client::MatchClient;
pub use session::{MovePicker, RandomPicker, Session};
