use anyhow::Result;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use chess_client::{MatchClient, RandomPicker, Session};

/// 未指定时连接本机默认端口
const DEFAULT_SERVER_ADDR: &str = "127.0.0.1:8888";

#[tokio::main]
async fn main() -> Result<()> {
    // 初始化日志
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::from_default_env()
            .add_directive("chess_client=debug".parse()?))
        .init();

    // 参数: [服务端地址] [玩家名]，名字缺省时以随机访客身份对弈
    let mut args = std::env::args().skip(1);
    let server_addr = args
        .next()
        .unwrap_or_else(|| DEFAULT_SERVER_ADDR.to_string());
    let client = match args.next() {
        Some(name) => MatchClient::named(server_addr, &name),
        None => MatchClient::guest(server_addr),
    };

    info!(user_id = %client.user_id(), server = %client.server_addr(), "国际象棋客户端启动中...");
    Session::new(client, RandomPicker).run().await
}
