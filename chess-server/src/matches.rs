//! 配对注册表
//!
//! 维护在线用户与进行中的对局，并负责周期性清理与随机配对。
//! 对局只存 FEN 字符串，规则校验全部交给客户端的走法生成器。

use std::collections::{HashMap, HashSet};
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use rand::Rng;
use sha2::{Digest, Sha256};
use thiserror::Error;
use tracing::{debug, error, info};

use protocol::{ChessError, Color, Fen, MatchStatus, INITIAL_FEN, MAX_IDLE_TIME, MIN_REFRESH_INTERVAL};

use crate::user::{UserManager, UserStatus};

/// 对局 ID（十六进制摘要）
pub type MatchId = String;

/// 计算字符串的 SHA-256 十六进制摘要
pub fn sha256_hex(value: &str) -> String {
    let digest = Sha256::digest(value.as_bytes());
    let mut out = String::with_capacity(digest.len() * 2);
    for byte in digest {
        use std::fmt::Write;
        let _ = write!(out, "{byte:02x}");
    }
    out
}

/// 由双方 ID 与创建时间戳导出对局 ID
///
/// 摘要原文以冒号连接；用户 ID 中不允许出现冒号，不同配对不会拼出同一原文。
fn derive_match_id(white_user_id: &str, black_user_id: &str, timestamp: i64) -> MatchId {
    sha256_hex(&format!("{white_user_id}:{black_user_id}:{timestamp}"))
}

/// 注册表状态违规，Display 文本即响应负载
#[derive(Debug, Error, PartialEq)]
pub enum RegistryError {
    /// 用户不在线
    #[error("user is not online")]
    UnknownUser,

    /// 用户已在队列中
    #[error("user is already in queue")]
    AlreadyQueued,

    /// 用户已在对局中
    #[error("user is already in match")]
    AlreadyInMatch,

    /// 用户不在对局中
    #[error("user not in match")]
    NotInMatch,

    /// 未轮到该用户走子
    #[error("not user turn yet")]
    WrongTurn,

    /// 提交的 FEN 无法解析
    #[error("invalid fen: {0}")]
    BadFen(#[from] ChessError),

    /// 停机口令错误
    #[error("incorrect server password")]
    BadAuth,
}

/// 进行中的对局
#[derive(Debug, Clone)]
pub struct Match {
    pub match_id: MatchId,
    pub white_user_id: String,
    pub black_user_id: String,
    /// 当前局面，按客户端提交原样保存
    pub fen: String,
    pub created_at: DateTime<Utc>,
}

impl Match {
    /// 创建新对局，先抽到的一方执白，局面取标准初始位置
    ///
    /// 对局 ID 由双方 ID 加创建时间戳的 SHA-256 摘要导出。
    pub fn create(white_user_id: &str, black_user_id: &str) -> Self {
        let created_at = Utc::now();
        let match_id =
            derive_match_id(white_user_id, black_user_id, created_at.timestamp_millis());
        Self {
            match_id,
            white_user_id: white_user_id.to_string(),
            black_user_id: black_user_id.to_string(),
            fen: INITIAL_FEN.to_string(),
            created_at,
        }
    }

    /// 用户在本局所执的颜色，非白方参战者视为黑方
    pub fn color_of(&self, user_id: &str) -> Color {
        if user_id == self.white_user_id {
            Color::White
        } else {
            Color::Black
        }
    }

    /// 是否轮到该用户走子
    pub fn is_turn_of(&self, user_id: &str) -> Result<bool, ChessError> {
        Ok(Fen::active_color(&self.fen)? == self.color_of(user_id))
    }
}

/// 配对注册表
pub struct MatchRegistry {
    users: UserManager,
    /// 对局 ID -> 对局
    matches: HashMap<MatchId, Match>,
    /// 停机口令的 SHA-256 摘要
    server_hash: String,
    last_refresh: Instant,
    min_refresh_interval: Duration,
    max_idle_time: Duration,
}

impl MatchRegistry {
    pub fn new(server_hash: String) -> Self {
        Self::with_timing(server_hash, MIN_REFRESH_INTERVAL, MAX_IDLE_TIME)
    }

    /// 自定义刷新间隔与闲置阈值
    pub fn with_timing(
        server_hash: String,
        min_refresh_interval: Duration,
        max_idle_time: Duration,
    ) -> Self {
        Self {
            users: UserManager::new(),
            matches: HashMap::new(),
            server_hash,
            last_refresh: Instant::now(),
            min_refresh_interval,
            max_idle_time,
        }
    }

    /// 刷新用户活跃时间，未知用户忽略
    pub fn touch(&mut self, user_id: &str) {
        self.users.touch(user_id);
    }

    /// 将用户加入匹配队列
    pub fn find_match(&mut self, user_id: &str) -> Result<(), RegistryError> {
        if let Some(user) = self.users.get(user_id) {
            return Err(match user.status {
                UserStatus::InQueue => RegistryError::AlreadyQueued,
                UserStatus::InMatch(_) => RegistryError::AlreadyInMatch,
            });
        }
        self.users.insert_queued(user_id);
        info!(%user_id, "User added to match queue");
        Ok(())
    }

    /// 查询用户的匹配状态
    pub fn status(&self, user_id: &str) -> Result<MatchStatus, RegistryError> {
        let user = self.users.get(user_id).ok_or(RegistryError::UnknownUser)?;
        match &user.status {
            UserStatus::InQueue => Ok(MatchStatus::InQueue),
            UserStatus::InMatch(match_id) => {
                let game = self.match_of(user_id, match_id)?;
                Ok(MatchStatus::InMatch {
                    fen: game.fen.clone(),
                    white_id: game.white_user_id.clone(),
                    black_id: game.black_user_id.clone(),
                    my_turn: game.is_turn_of(user_id)?,
                })
            }
        }
    }

    /// 替换对局的当前局面
    ///
    /// 只校验提交方的回合与 FEN 的格式，不做走法合法性复查。
    pub fn update(&mut self, user_id: &str, new_fen: &str) -> Result<(), RegistryError> {
        let match_id = {
            let user = self.users.get(user_id).ok_or(RegistryError::UnknownUser)?;
            match &user.status {
                UserStatus::InQueue => return Err(RegistryError::NotInMatch),
                UserStatus::InMatch(match_id) => match_id.clone(),
            }
        };

        let game = self.match_of(user_id, &match_id)?;
        if !game.is_turn_of(user_id)? {
            return Err(RegistryError::WrongTurn);
        }
        Fen::parse(new_fen)?;

        let game = self.match_of_mut(user_id, &match_id)?;
        game.fen = new_fen.to_string();
        info!(%user_id, %match_id, "Match fen updated");
        Ok(())
    }

    /// 距上次刷新超过最小间隔时执行一次刷新
    pub fn maybe_refresh(&mut self) {
        if self.last_refresh.elapsed() >= self.min_refresh_interval {
            self.last_refresh = Instant::now();
            self.refresh();
        }
    }

    /// 清理闲置用户并为队列中的用户随机配对
    ///
    /// 对局中任何一方闲置超限，双方连同对局一起移除。
    pub fn refresh(&mut self) {
        let mut users_to_remove: HashSet<String> = HashSet::new();
        let mut matches_to_remove: HashSet<MatchId> = HashSet::new();

        for user in self.users.iter() {
            if user.idle_time() < self.max_idle_time {
                continue;
            }
            match &user.status {
                UserStatus::InMatch(match_id) => match self.match_of(&user.id, match_id) {
                    Ok(game) => {
                        users_to_remove.insert(game.white_user_id.clone());
                        users_to_remove.insert(game.black_user_id.clone());
                        matches_to_remove.insert(match_id.clone());
                    }
                    Err(_) => {
                        users_to_remove.insert(user.id.clone());
                    }
                },
                UserStatus::InQueue => {
                    users_to_remove.insert(user.id.clone());
                }
            }
        }

        for match_id in &matches_to_remove {
            self.matches.remove(match_id);
            info!(%match_id, "Removed idle match");
        }
        for user_id in &users_to_remove {
            self.users.remove(user_id);
            info!(%user_id, "Removed idle user");
        }

        // 随机两两抽取，先抽到的执白
        let mut rng = rand::thread_rng();
        let mut queued = self.users.queued_ids();
        while queued.len() >= 2 {
            let white = queued.swap_remove(rng.gen_range(0..queued.len()));
            let black = queued.swap_remove(rng.gen_range(0..queued.len()));

            let game = Match::create(&white, &black);
            self.users.set_match(&white, game.match_id.clone());
            self.users.set_match(&black, game.match_id.clone());
            info!(match_id = %game.match_id, %white, %black, "Created match");
            self.matches.insert(game.match_id.clone(), game);
        }

        debug!(
            users = self.users.online_count(),
            matches = self.matches.len(),
            "Registry refreshed"
        );
    }

    /// 校验停机口令
    pub fn kill(&self, password: &str) -> Result<(), RegistryError> {
        if sha256_hex(password) == self.server_hash {
            Ok(())
        } else {
            Err(RegistryError::BadAuth)
        }
    }

    /// 在线用户数量
    pub fn user_count(&self) -> usize {
        self.users.online_count()
    }

    /// 进行中的对局数量
    pub fn match_count(&self) -> usize {
        self.matches.len()
    }

    /// 取用户所指向的对局
    ///
    /// 悬空引用属于编程错误，按用户不在线上报，残留条目留给下次刷新回收。
    fn match_of(&self, user_id: &str, match_id: &str) -> Result<&Match, RegistryError> {
        match self.matches.get(match_id) {
            Some(game) => Ok(game),
            None => {
                error!(%user_id, %match_id, "User references a missing match");
                Err(RegistryError::UnknownUser)
            }
        }
    }

    fn match_of_mut(&mut self, user_id: &str, match_id: &str) -> Result<&mut Match, RegistryError> {
        match self.matches.get_mut(match_id) {
            Some(game) => Ok(game),
            None => {
                error!(%user_id, %match_id, "User references a missing match");
                Err(RegistryError::UnknownUser)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const AFTER_E4: &str = "rnbqkbnr/pppppppp/8/8/4P3/8/8/RNBQKBNR b KQkq e3 0 1";
    const AFTER_E4_E5: &str = "rnbqkbnr/pppp1ppp/8/4p3/4P3/8/8/RNBQKBNR w KQkq e6 0 2";

    fn test_registry() -> MatchRegistry {
        MatchRegistry::with_timing(
            sha256_hex("test-secret"),
            Duration::ZERO,
            Duration::from_secs(30),
        )
    }

    /// 配好一局，返回（白方 ID，黑方 ID）
    fn paired_registry(registry: &mut MatchRegistry) -> (String, String) {
        registry.find_match("guest_one").unwrap();
        registry.find_match("guest_two").unwrap();
        registry.refresh();

        match registry.status("guest_one").unwrap() {
            MatchStatus::InMatch { white_id, black_id, .. } => (white_id, black_id),
            MatchStatus::InQueue => panic!("users were not paired"),
        }
    }

    #[test]
    fn test_create_match() {
        let game = Match::create("guest_one", "guest_two");

        assert_eq!(game.match_id.len(), 64);
        assert_eq!(game.fen, INITIAL_FEN);
        assert_eq!(game.color_of("guest_one"), Color::White);
        assert_eq!(game.color_of("guest_two"), Color::Black);
        // 初始局面轮到白方
        assert!(game.is_turn_of("guest_one").unwrap());
        assert!(!game.is_turn_of("guest_two").unwrap());

        let other = Match::create("guest_three", "guest_four");
        assert_ne!(game.match_id, other.match_id);
    }

    #[test]
    fn test_match_id_distinct_for_ambiguous_pairs() {
        // "ab"+"cd" 与 "a"+"bcd" 拼接结果相同，同一时间戳下 ID 仍须不同
        let timestamp = 1_724_300_000_000;
        assert_ne!(
            derive_match_id("ab", "cd", timestamp),
            derive_match_id("a", "bcd", timestamp)
        );

        // 同一批刷新内创建也不共享 ID
        let first = Match::create("ab", "cd");
        let second = Match::create("a", "bcd");
        assert_ne!(first.match_id, second.match_id);
    }

    #[test]
    fn test_find_match_rejects_duplicates() {
        let mut registry = test_registry();

        registry.find_match("guest_one").unwrap();
        assert_eq!(
            registry.find_match("guest_one"),
            Err(RegistryError::AlreadyQueued)
        );

        registry.find_match("guest_two").unwrap();
        registry.refresh();
        assert_eq!(
            registry.find_match("guest_one"),
            Err(RegistryError::AlreadyInMatch)
        );
    }

    #[test]
    fn test_status_unknown_user() {
        let registry = test_registry();
        assert_eq!(
            registry.status("guest_ghost"),
            Err(RegistryError::UnknownUser)
        );
    }

    #[test]
    fn test_status_with_missing_match_reports_offline() {
        let mut registry = test_registry();
        registry.users.insert_queued("guest_one");
        registry.users.set_match("guest_one", "no-such-match".to_string());

        assert_eq!(
            registry.status("guest_one"),
            Err(RegistryError::UnknownUser)
        );
    }

    #[test]
    fn test_refresh_pairs_two_users() {
        let mut registry = test_registry();

        registry.find_match("guest_one").unwrap();
        assert_eq!(registry.status("guest_one").unwrap(), MatchStatus::InQueue);

        registry.find_match("guest_two").unwrap();
        registry.refresh();

        // 配对恰好消耗两名排队用户
        assert_eq!(registry.user_count(), 2);
        assert_eq!(registry.match_count(), 1);

        let one = registry.status("guest_one").unwrap();
        let two = registry.status("guest_two").unwrap();
        let (fen_one, white, black, turn_one) = match one {
            MatchStatus::InMatch { fen, white_id, black_id, my_turn } => {
                (fen, white_id, black_id, my_turn)
            }
            MatchStatus::InQueue => panic!("guest_one still queued"),
        };
        let (fen_two, turn_two) = match two {
            MatchStatus::InMatch { fen, my_turn, .. } => (fen, my_turn),
            MatchStatus::InQueue => panic!("guest_two still queued"),
        };

        // 双方看到同一初始局面，颜色互补，轮次只属于白方
        assert_eq!(fen_one, INITIAL_FEN);
        assert_eq!(fen_one, fen_two);
        let mut ids = vec![white, black];
        ids.sort();
        assert_eq!(ids, vec!["guest_one", "guest_two"]);
        assert_ne!(turn_one, turn_two);
    }

    #[test]
    fn test_refresh_leaves_odd_user_queued() {
        let mut registry = test_registry();

        registry.find_match("guest_one").unwrap();
        registry.find_match("guest_two").unwrap();
        registry.find_match("guest_three").unwrap();
        registry.refresh();

        assert_eq!(registry.match_count(), 1);
        let queued = [
            registry.status("guest_one").unwrap(),
            registry.status("guest_two").unwrap(),
            registry.status("guest_three").unwrap(),
        ]
        .iter()
        .filter(|status| **status == MatchStatus::InQueue)
        .count();
        assert_eq!(queued, 1);
    }

    #[test]
    fn test_single_user_stays_queued() {
        let mut registry = test_registry();

        registry.find_match("guest_one").unwrap();
        registry.refresh();

        assert_eq!(registry.status("guest_one").unwrap(), MatchStatus::InQueue);
        assert_eq!(registry.match_count(), 0);
    }

    #[test]
    fn test_update_enforces_turn_order() {
        let mut registry = test_registry();
        let (white, black) = paired_registry(&mut registry);

        // 初始局面轮到白方，黑方提交被拒
        assert_eq!(
            registry.update(&black, AFTER_E4),
            Err(RegistryError::WrongTurn)
        );

        registry.update(&white, AFTER_E4).unwrap();
        match registry.status(&black).unwrap() {
            MatchStatus::InMatch { fen, my_turn, .. } => {
                assert_eq!(fen, AFTER_E4);
                assert!(my_turn);
            }
            MatchStatus::InQueue => panic!("black should be in match"),
        }

        // 白方连走两步被拒
        assert_eq!(
            registry.update(&white, AFTER_E4_E5),
            Err(RegistryError::WrongTurn)
        );

        registry.update(&black, AFTER_E4_E5).unwrap();
        match registry.status(&white).unwrap() {
            MatchStatus::InMatch { fen, my_turn, .. } => {
                assert_eq!(fen, AFTER_E4_E5);
                assert!(my_turn);
            }
            MatchStatus::InQueue => panic!("white should be in match"),
        }
    }

    #[test]
    fn test_update_requires_match() {
        let mut registry = test_registry();

        assert_eq!(
            registry.update("guest_ghost", AFTER_E4),
            Err(RegistryError::UnknownUser)
        );

        registry.find_match("guest_one").unwrap();
        assert_eq!(
            registry.update("guest_one", AFTER_E4),
            Err(RegistryError::NotInMatch)
        );
    }

    #[test]
    fn test_update_rejects_malformed_fen() {
        let mut registry = test_registry();
        let (white, _) = paired_registry(&mut registry);

        let result = registry.update(&white, "not a fen at all");
        assert!(matches!(result, Err(RegistryError::BadFen(_))));

        // 原局面保持不变
        match registry.status(&white).unwrap() {
            MatchStatus::InMatch { fen, .. } => assert_eq!(fen, INITIAL_FEN),
            MatchStatus::InQueue => panic!("white should be in match"),
        }
    }

    #[test]
    fn test_idle_eviction_removes_both_participants() {
        let mut registry = MatchRegistry::with_timing(
            sha256_hex("test-secret"),
            Duration::ZERO,
            Duration::from_millis(50),
        );
        let (white, black) = paired_registry(&mut registry);

        std::thread::sleep(Duration::from_millis(60));
        // 只有黑方闲置超限，白方刚刚活跃过
        registry.touch(&white);
        registry.refresh();

        // 对局连同双方一起移除
        assert_eq!(registry.match_count(), 0);
        assert_eq!(registry.user_count(), 0);
        assert_eq!(registry.status(&white), Err(RegistryError::UnknownUser));
        assert_eq!(registry.status(&black), Err(RegistryError::UnknownUser));
    }

    #[test]
    fn test_idle_eviction_in_queue() {
        let mut registry = MatchRegistry::with_timing(
            sha256_hex("test-secret"),
            Duration::ZERO,
            Duration::from_millis(50),
        );

        registry.find_match("guest_one").unwrap();
        std::thread::sleep(Duration::from_millis(60));
        registry.refresh();

        assert_eq!(registry.user_count(), 0);
    }

    #[test]
    fn test_maybe_refresh_is_gated() {
        // 默认间隔下，构造后立即调用不触发刷新
        let mut registry = MatchRegistry::new(sha256_hex("test-secret"));

        registry.find_match("guest_one").unwrap();
        registry.find_match("guest_two").unwrap();
        registry.maybe_refresh();

        assert_eq!(registry.status("guest_one").unwrap(), MatchStatus::InQueue);
        assert_eq!(registry.match_count(), 0);

        registry.refresh();
        assert_eq!(registry.match_count(), 1);
    }

    #[test]
    fn test_kill_requires_password() {
        let registry = test_registry();

        assert_eq!(registry.kill("wrong"), Err(RegistryError::BadAuth));
        assert!(registry.kill("test-secret").is_ok());
    }

    #[test]
    fn test_sha256_hex() {
        // 与 sha256sum 对照的已知摘要
        assert_eq!(
            sha256_hex("abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
        assert_eq!(sha256_hex("").len(), 64);
    }
}
