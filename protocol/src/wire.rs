//! 线协议帧编解码
//!
//! 请求帧 `VERB::user_id::arg1|arg2|...`，响应帧 `status::payload`。
//! 分隔符 `:` 与 `|` 不允许出现在用户 ID 内，见 [`sanitize_user_id`]。

use crate::constants::{MAX_ID_LEN, PLAYER_PREFIX};
use crate::error::ProtocolError;

/// 帧内段分隔符
pub const FRAME_SEPARATOR: &str = "::";
/// 参数列表分隔符
pub const ARG_SEPARATOR: char = '|';

/// 请求动词
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Verb {
    /// 加入匹配队列
    FindMatch,
    /// 查询匹配状态
    StatusMatch,
    /// 提交新的局面
    UpdateMatch,
    /// 远程停机
    Killswitch,
}

impl Verb {
    /// 线上形式
    pub fn as_str(&self) -> &'static str {
        match self {
            Verb::FindMatch => "FIND_MATCH",
            Verb::StatusMatch => "STATUS_MATCH",
            Verb::UpdateMatch => "UPDATE_MATCH",
            Verb::Killswitch => "KILLSWITCH",
        }
    }
}

impl std::fmt::Display for Verb {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Verb {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "FIND_MATCH" => Ok(Verb::FindMatch),
            "STATUS_MATCH" => Ok(Verb::StatusMatch),
            "UPDATE_MATCH" => Ok(Verb::UpdateMatch),
            "KILLSWITCH" => Ok(Verb::Killswitch),
            _ => Err(ProtocolError::UnknownVerb {
                verb: s.to_string(),
            }),
        }
    }
}

/// 客户端请求
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub verb: Verb,
    pub user_id: String,
    pub args: Vec<String>,
}

impl Request {
    /// 创建无参数请求
    pub fn new(verb: Verb, user_id: impl Into<String>) -> Self {
        Self {
            verb,
            user_id: user_id.into(),
            args: Vec::new(),
        }
    }

    /// 创建带参数请求
    pub fn with_args(verb: Verb, user_id: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            verb,
            user_id: user_id.into(),
            args,
        }
    }

    /// 编码为请求帧，参数段可为空
    pub fn encode(&self) -> String {
        format!(
            "{}{}{}{}{}",
            self.verb,
            FRAME_SEPARATOR,
            self.user_id,
            FRAME_SEPARATOR,
            self.args.join(&ARG_SEPARATOR.to_string())
        )
    }

    /// 从请求帧解析，参数段缺失视同为空
    pub fn parse(frame: &str) -> Result<Self, ProtocolError> {
        let mut parts = frame.splitn(3, FRAME_SEPARATOR);
        let verb = parts.next().unwrap_or_default();
        let user_id = parts.next().ok_or_else(|| ProtocolError::BadFrame {
            reason: "missing user id segment".to_string(),
        })?;
        if verb.is_empty() {
            return Err(ProtocolError::BadFrame {
                reason: "empty verb segment".to_string(),
            });
        }
        if user_id.is_empty() {
            return Err(ProtocolError::BadFrame {
                reason: "empty user id segment".to_string(),
            });
        }
        // 漏网的分隔符会破坏后续负载的解析，一律拒绝
        if user_id.contains(':') || user_id.contains('|') {
            return Err(ProtocolError::BadFrame {
                reason: format!("user id {user_id:?} contains delimiter characters"),
            });
        }

        let args = match parts.next() {
            None | Some("") => Vec::new(),
            Some(raw) => raw.split(ARG_SEPARATOR).map(str::to_string).collect(),
        };

        Ok(Self {
            verb: verb.parse()?,
            user_id: user_id.to_string(),
            args,
        })
    }
}

/// 响应状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseStatus {
    Success,
    Error,
}

impl ResponseStatus {
    /// 线上形式
    pub fn as_str(&self) -> &'static str {
        match self {
            ResponseStatus::Success => "success",
            ResponseStatus::Error => "error",
        }
    }
}

/// 服务端响应
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status: ResponseStatus,
    pub payload: String,
}

impl Response {
    /// 创建成功响应
    pub fn success(payload: impl Into<String>) -> Self {
        Self {
            status: ResponseStatus::Success,
            payload: payload.into(),
        }
    }

    /// 创建错误响应
    pub fn error(payload: impl Into<String>) -> Self {
        Self {
            status: ResponseStatus::Error,
            payload: payload.into(),
        }
    }

    /// 编码为响应帧
    pub fn encode(&self) -> String {
        format!("{}{}{}", self.status.as_str(), FRAME_SEPARATOR, self.payload)
    }

    /// 从响应帧解析
    pub fn parse(frame: &str) -> Result<Self, ProtocolError> {
        let (status, payload) =
            frame
                .split_once(FRAME_SEPARATOR)
                .ok_or_else(|| ProtocolError::BadFrame {
                    reason: "missing status segment".to_string(),
                })?;
        let status = match status {
            "success" => ResponseStatus::Success,
            "error" => ResponseStatus::Error,
            other => {
                return Err(ProtocolError::BadFrame {
                    reason: format!("unknown response status {other:?}"),
                })
            }
        };
        Ok(Self {
            status,
            payload: payload.to_string(),
        })
    }

    /// 提取负载，错误状态转为 [`ProtocolError::Server`]
    pub fn into_payload(self) -> Result<String, ProtocolError> {
        match self.status {
            ResponseStatus::Success => Ok(self.payload),
            ResponseStatus::Error => Err(ProtocolError::Server(self.payload)),
        }
    }
}

/// 匹配状态负载（`STATUS_MATCH` 的成功响应体）
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchStatus {
    /// 仍在队列中等待
    InQueue,
    /// 已配对
    InMatch {
        /// 当前局面
        fen: String,
        /// 白方用户 ID
        white_id: String,
        /// 黑方用户 ID
        black_id: String,
        /// 是否轮到查询者走子
        my_turn: bool,
    },
}

impl MatchStatus {
    /// 队列状态的字面负载
    pub const IN_QUEUE: &'static str = "in_queue";
    /// 配对状态的负载前缀
    pub const IN_MATCH: &'static str = "in_match";

    /// 编码为响应负载
    pub fn encode(&self) -> String {
        match self {
            MatchStatus::InQueue => Self::IN_QUEUE.to_string(),
            MatchStatus::InMatch {
                fen,
                white_id,
                black_id,
                my_turn,
            } => [
                Self::IN_MATCH,
                fen,
                white_id,
                black_id,
                if *my_turn { "1" } else { "0" },
            ]
            .join(&ARG_SEPARATOR.to_string()),
        }
    }

    /// 从响应负载解析
    pub fn parse(payload: &str) -> Result<Self, ProtocolError> {
        if payload == Self::IN_QUEUE {
            return Ok(MatchStatus::InQueue);
        }

        let parts: Vec<&str> = payload.split(ARG_SEPARATOR).collect();
        if parts.len() != 5 || parts[0] != Self::IN_MATCH {
            return Err(ProtocolError::BadFrame {
                reason: format!("malformed match status payload {payload:?}"),
            });
        }
        let my_turn = match parts[4] {
            "1" => true,
            "0" => false,
            other => {
                return Err(ProtocolError::BadFrame {
                    reason: format!("bad turn flag {other:?}"),
                })
            }
        };
        Ok(MatchStatus::InMatch {
            fen: parts[1].to_string(),
            white_id: parts[2].to_string(),
            black_id: parts[3].to_string(),
            my_turn,
        })
    }
}

/// 清洗用户自取的 ID 并加 `player_` 前缀
///
/// 去掉帧分隔符 `:` 和 `|`，空格换成下划线，截断到 [`MAX_ID_LEN`] 个字符。
pub fn sanitize_user_id(raw: &str) -> String {
    let cleaned: String = raw
        .chars()
        .filter(|c| *c != ':' && *c != '|')
        .map(|c| if c == ' ' { '_' } else { c })
        .take(MAX_ID_LEN)
        .collect();
    format!("{PLAYER_PREFIX}{cleaned}")
}
