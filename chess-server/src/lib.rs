//! 国际象棋配对服务端
//!
//! 包含:
//! - 服务端配置
//! - 在线用户管理
//! - 配对注册表与闲置清理
//! - 请求分发与监听循环

pub mod config;
pub mod matches;
pub mod server;
pub mod user;

pub use config::{ServerConfig, DEFAULT_CONFIG_PATH};
pub use matches::{sha256_hex, Match, MatchId, MatchRegistry, RegistryError};
pub use server::{ChessServer, RequestHandler};
pub use user::{User, UserManager, UserStatus};
