//! 用户管理

use std::collections::HashMap;
use std::time::{Duration, Instant};

use crate::matches::MatchId;

/// 用户 ID
pub type UserId = String;

/// 用户状态
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserStatus {
    /// 排队等待配对
    InQueue,
    /// 对局中
    InMatch(MatchId),
}

/// 在线用户
#[derive(Debug, Clone)]
pub struct User {
    pub id: UserId,
    pub status: UserStatus,
    /// 最近一次请求的时间
    pub last_seen: Instant,
}

impl User {
    pub fn new(id: impl Into<UserId>) -> Self {
        Self {
            id: id.into(),
            status: UserStatus::InQueue,
            last_seen: Instant::now(),
        }
    }

    /// 刷新活跃时间
    pub fn touch(&mut self) {
        self.last_seen = Instant::now();
    }

    /// 距最近一次请求的时长
    pub fn idle_time(&self) -> Duration {
        self.last_seen.elapsed()
    }
}

/// 用户管理器
pub struct UserManager {
    /// 用户 ID -> 用户信息
    users: HashMap<UserId, User>,
}

impl UserManager {
    pub fn new() -> Self {
        Self {
            users: HashMap::new(),
        }
    }

    /// 新建排队用户
    pub fn insert_queued(&mut self, user_id: &str) {
        self.users
            .insert(user_id.to_string(), User::new(user_id));
    }

    /// 刷新用户活跃时间，未知用户忽略
    pub fn touch(&mut self, user_id: &str) {
        if let Some(user) = self.users.get_mut(user_id) {
            user.touch();
        }
    }

    /// 获取用户
    pub fn get(&self, user_id: &str) -> Option<&User> {
        self.users.get(user_id)
    }

    /// 将用户标记为对局中
    pub fn set_match(&mut self, user_id: &str, match_id: MatchId) {
        if let Some(user) = self.users.get_mut(user_id) {
            user.status = UserStatus::InMatch(match_id);
        }
    }

    /// 移除用户
    pub fn remove(&mut self, user_id: &str) -> Option<User> {
        self.users.remove(user_id)
    }

    /// 检查用户是否在线
    pub fn exists(&self, user_id: &str) -> bool {
        self.users.contains_key(user_id)
    }

    /// 遍历所有在线用户
    pub fn iter(&self) -> impl Iterator<Item = &User> {
        self.users.values()
    }

    /// 当前排队用户的 ID 列表
    pub fn queued_ids(&self) -> Vec<UserId> {
        self.users
            .values()
            .filter(|user| user.status == UserStatus::InQueue)
            .map(|user| user.id.clone())
            .collect()
    }

    /// 在线用户数量
    pub fn online_count(&self) -> usize {
        self.users.len()
    }
}

impl Default for UserManager {
    fn default() -> Self {
        Self::new()
    }
}
