//! 协议常量定义

use std::time::Duration;

/// 棋盘边长
pub const BOARD_SIZE: usize = 8;

/// 用户 ID 最大长度（前缀之前先截断）
pub const MAX_ID_LEN: usize = 20;

/// 访客 ID 前缀
pub const GUEST_PREFIX: &str = "guest_";

/// 玩家 ID 前缀
pub const PLAYER_PREFIX: &str = "player_";

/// 默认单次请求读缓冲区大小（字节）
pub const DEFAULT_BUFFER_SIZE: usize = 8192;

/// 两次刷新之间的最小间隔（秒）
pub const MIN_REFRESH_INTERVAL_SECS: u64 = 3;

/// 用户最大闲置时间（秒）- 超过即被剔除
pub const MAX_IDLE_SECS: u64 = 30;

/// 连接超时（秒）
pub const CONNECT_TIMEOUT_SECS: u64 = 10;

/// 单次请求读取超时（秒）- 静默连接超时即丢弃
pub const READ_TIMEOUT_SECS: u64 = 10;

/// 客户端轮询间隔（秒）
pub const POLL_INTERVAL_SECS: u64 = 1;

/// 刷新最小间隔 Duration
pub const MIN_REFRESH_INTERVAL: Duration = Duration::from_secs(MIN_REFRESH_INTERVAL_SECS);

/// 最大闲置 Duration
pub const MAX_IDLE_TIME: Duration = Duration::from_secs(MAX_IDLE_SECS);

/// 连接超时 Duration
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(CONNECT_TIMEOUT_SECS);

/// 读取超时 Duration
pub const READ_TIMEOUT: Duration = Duration::from_secs(READ_TIMEOUT_SECS);

/// 轮询间隔 Duration
pub const POLL_INTERVAL: Duration = Duration::from_secs(POLL_INTERVAL_SECS);
