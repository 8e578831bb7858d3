//! 错误类型定义

use thiserror::Error;

/// 棋规错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ChessError {
    /// 无效的格子记谱
    #[error("Invalid square notation: {notation:?}")]
    InvalidSquare { notation: String },

    /// 非法走子（起点无子或不该此方走）
    #[error("Illegal move: {reason}")]
    IllegalMove { reason: String },

    /// 无效的 FEN 字符串
    #[error("Invalid FEN string: {reason}")]
    InvalidFen { reason: String },
}

/// 协议与传输错误
#[derive(Error, Debug)]
pub enum ProtocolError {
    /// IO 错误
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// 请求或响应帧格式错误
    #[error("Bad frame: {reason}")]
    BadFrame { reason: String },

    /// 未知指令
    #[error("Unknown verb: {verb}")]
    UnknownVerb { verb: String },

    /// 帧大小超限
    #[error("Frame too large: {size} bytes (max: {max})")]
    FrameTooLarge { size: usize, max: usize },

    /// 连接超时
    #[error("Connection timeout")]
    ConnectionTimeout,

    /// 连接已关闭
    #[error("Connection closed")]
    ConnectionClosed,

    /// 服务端返回的错误响应
    #[error("Server error: {0}")]
    Server(String),

    /// 棋规错误
    #[error("Chess error: {0}")]
    Chess(#[from] ChessError),
}

/// 协议操作结果类型
pub type Result<T> = std::result::Result<T, ProtocolError>;
