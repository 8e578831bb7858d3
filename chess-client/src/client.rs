//! 配对服务客户端
//!
//! 每个操作独立完成一次请求应答，连接不复用。

use rand::distributions::Alphanumeric;
use rand::Rng;

use protocol::{
    sanitize_user_id, send_request, MatchStatus, Request, Result, Verb, GUEST_PREFIX,
};

/// 访客 ID 随机后缀长度
const GUEST_SUFFIX_LEN: usize = 6;

/// 配对服务客户端
#[derive(Debug, Clone)]
pub struct MatchClient {
    server_addr: String,
    user_id: String,
}

impl MatchClient {
    /// 以随机访客身份创建客户端
    pub fn guest(server_addr: impl Into<String>) -> Self {
        let suffix: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(GUEST_SUFFIX_LEN)
            .map(char::from)
            .collect();
        Self {
            server_addr: server_addr.into(),
            user_id: format!("{GUEST_PREFIX}{suffix}"),
        }
    }

    /// 以自取名字创建客户端，名字先清洗再加前缀
    pub fn named(server_addr: impl Into<String>, name: &str) -> Self {
        Self {
            server_addr: server_addr.into(),
            user_id: sanitize_user_id(name),
        }
    }

    /// 本客户端的用户 ID
    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    /// 服务端地址
    pub fn server_addr(&self) -> &str {
        &self.server_addr
    }

    /// 请求加入匹配队列
    pub async fn find_match(&self) -> Result<String> {
        self.exchange(Request::new(Verb::FindMatch, &self.user_id))
            .await
    }

    /// 查询匹配状态
    pub async fn status(&self) -> Result<MatchStatus> {
        let payload = self
            .exchange(Request::new(Verb::StatusMatch, &self.user_id))
            .await?;
        MatchStatus::parse(&payload)
    }

    /// 提交新的局面
    pub async fn update(&self, fen: &str) -> Result<String> {
        self.exchange(Request::with_args(
            Verb::UpdateMatch,
            &self.user_id,
            vec![fen.to_string()],
        ))
        .await
    }

    /// 请求远程停机，口令以明文随请求发送
    pub async fn kill_server(&self, password: &str) -> Result<String> {
        self.exchange(Request::with_args(
            Verb::Killswitch,
            &self.user_id,
            vec![password.to_string()],
        ))
        .await
    }

    async fn exchange(&self, request: Request) -> Result<String> {
        send_request(&self.server_addr, &request)
            .await?
            .into_payload()
    }
}
