//! 对局会话
//!
//! 轮询服务端状态，轮到自己时从合法走法中挑一手提交。
//! 会话在无子可走、被闲置清理剔除或服务端报错时结束。

use std::time::Duration;

use anyhow::{Context, Result};
use rand::Rng;
use tracing::{debug, info, warn};

use protocol::{
    Color, Fen, MatchStatus, Move, MoveGenerator, ProtocolError, POLL_INTERVAL,
};

use crate::client::MatchClient;

/// 走法挑选策略
pub trait MovePicker {
    /// 从候选走法中挑一手，None 表示放弃本局
    fn pick(&mut self, moves: &[Move]) -> Option<Move>;
}

/// 均匀随机挑选
#[derive(Debug, Default)]
pub struct RandomPicker;

impl MovePicker for RandomPicker {
    fn pick(&mut self, moves: &[Move]) -> Option<Move> {
        if moves.is_empty() {
            return None;
        }
        Some(moves[rand::thread_rng().gen_range(0..moves.len())])
    }
}

/// 一名玩家从入队到对局结束的完整会话
pub struct Session<P> {
    client: MatchClient,
    picker: P,
    poll_interval: Duration,
}

impl<P: MovePicker> Session<P> {
    pub fn new(client: MatchClient, picker: P) -> Self {
        Self::with_poll_interval(client, picker, POLL_INTERVAL)
    }

    /// 自定义轮询间隔
    pub fn with_poll_interval(client: MatchClient, picker: P, poll_interval: Duration) -> Self {
        Self {
            client,
            picker,
            poll_interval,
        }
    }

    /// 入队并对弈，直到会话结束
    pub async fn run(mut self) -> Result<()> {
        let joined = self
            .client
            .find_match()
            .await
            .context("加入匹配队列失败")?;
        info!(user_id = %self.client.user_id(), reply = %joined, "Joined match queue");

        loop {
            match self.client.status().await {
                Ok(MatchStatus::InQueue) => {
                    debug!("Still waiting in queue");
                }
                Ok(MatchStatus::InMatch {
                    fen,
                    white_id,
                    black_id,
                    my_turn,
                }) => {
                    if my_turn {
                        let color = if self.client.user_id() == white_id {
                            Color::White
                        } else {
                            Color::Black
                        };
                        if !self.play_turn(&fen, color).await? {
                            info!("No move to play, leaving the match");
                            return Ok(());
                        }
                    } else {
                        debug!(%white_id, %black_id, "Waiting for the opponent");
                    }
                }
                // 被闲置清理剔除或对局已不存在，会话到此为止
                Err(ProtocolError::Server(message)) => {
                    warn!(%message, "Session ended by server");
                    return Ok(());
                }
                Err(error) => return Err(error).context("轮询匹配状态失败"),
            }
            tokio::time::sleep(self.poll_interval).await;
        }
    }

    /// 轮到自己时挑一手提交，返回是否走了棋
    async fn play_turn(&mut self, fen: &str, color: Color) -> Result<bool> {
        let mut state = Fen::parse(fen).context("服务端给出的局面无法解析")?;
        let moves = MoveGenerator::color_moves(&state, color);
        let Some(mv) = self.picker.pick(&moves) else {
            return Ok(false);
        };

        MoveGenerator::apply(&mut state, &mv).context("选中的走法无法应用")?;
        let reply = self
            .client
            .update(&Fen::to_string(&state))
            .await
            .context("提交局面失败")?;
        info!(%mv, reply = %reply, "Move submitted");
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use protocol::{read_frame, write_frame, Request, Response, Square, Verb, INITIAL_FEN};

    /// 永远弃权的挑选器
    struct Forfeit;

    impl MovePicker for Forfeit {
        fn pick(&mut self, _moves: &[Move]) -> Option<Move> {
            None
        }
    }

    /// 按脚本应答的假服务端，返回收到的所有请求
    async fn scripted_server(
        replies: Vec<String>,
    ) -> (String, tokio::task::JoinHandle<Vec<Request>>) {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        let handle = tokio::spawn(async move {
            let mut seen = Vec::new();
            for reply in replies {
                let (mut stream, _) = listener.accept().await.unwrap();
                let frame = read_frame(&mut stream).await.unwrap();
                seen.push(Request::parse(&frame).unwrap());
                write_frame(&mut stream, &reply).await.unwrap();
            }
            seen
        });
        (addr, handle)
    }

    fn in_match_payload(my_turn: bool) -> String {
        MatchStatus::InMatch {
            fen: INITIAL_FEN.to_string(),
            white_id: "player_tester".to_string(),
            black_id: "guest_opp".to_string(),
            my_turn,
        }
        .encode()
    }

    #[test]
    fn test_random_picker() {
        let mut picker = RandomPicker;
        assert!(picker.pick(&[]).is_none());

        let moves = vec![
            Move::normal(
                Square::from_notation("e2").unwrap(),
                Square::from_notation("e3").unwrap(),
            ),
            Move::normal(
                Square::from_notation("e2").unwrap(),
                Square::from_notation("e4").unwrap(),
            ),
        ];
        let picked = picker.pick(&moves).unwrap();
        assert!(moves.contains(&picked));
    }

    #[tokio::test]
    async fn test_session_plays_a_move_when_it_is_its_turn() {
        let replies = vec![
            Response::success("user added to match queue").encode(),
            Response::success(in_match_payload(true)).encode(),
            Response::success("fen has been updated").encode(),
            Response::error("user is not online").encode(),
        ];
        let (addr, server) = scripted_server(replies).await;

        let client = MatchClient::named(addr, "tester");
        let session = Session::with_poll_interval(client, RandomPicker, Duration::from_millis(1));
        session.run().await.unwrap();

        let seen = server.await.unwrap();
        assert_eq!(seen.len(), 4);
        assert_eq!(seen[0].verb, Verb::FindMatch);
        assert_eq!(seen[1].verb, Verb::StatusMatch);
        assert_eq!(seen[2].verb, Verb::UpdateMatch);
        assert_eq!(seen[3].verb, Verb::StatusMatch);

        // 提交的局面不再是初始局面，且轮到黑方
        let submitted = &seen[2].args[0];
        assert_ne!(submitted, INITIAL_FEN);
        assert_eq!(Fen::active_color(submitted).unwrap(), Color::Black);
    }

    #[tokio::test]
    async fn test_session_waits_when_not_its_turn() {
        let replies = vec![
            Response::success("user added to match queue").encode(),
            Response::success(in_match_payload(false)).encode(),
            Response::error("user is not online").encode(),
        ];
        let (addr, server) = scripted_server(replies).await;

        let client = MatchClient::named(addr, "tester");
        let session = Session::with_poll_interval(client, RandomPicker, Duration::from_millis(1));
        session.run().await.unwrap();

        let seen = server.await.unwrap();
        // 不该轮到自己时只轮询，不提交
        assert!(seen.iter().all(|r| r.verb != Verb::UpdateMatch));
    }

    #[tokio::test]
    async fn test_session_ends_when_picker_gives_up() {
        let replies = vec![
            Response::success("user added to match queue").encode(),
            Response::success(in_match_payload(true)).encode(),
        ];
        let (addr, server) = scripted_server(replies).await;

        let client = MatchClient::named(addr, "tester");
        let session = Session::with_poll_interval(client, Forfeit, Duration::from_millis(1));
        session.run().await.unwrap();

        let seen = server.await.unwrap();
        assert_eq!(seen.len(), 2);
    }
}
