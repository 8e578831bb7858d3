//! 服务器主逻辑
//!
//! 单条接收循环：读请求、刷新注册表、分发处理、写响应、关连接。
//! 全程顺序执行，注册表不需要加锁。

use std::net::SocketAddr;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::net::{TcpListener, TcpStream};
use tokio::time::timeout;
use tracing::{info, warn};

use protocol::{
    read_frame_limited, write_frame, ProtocolError, Request, Response, ResponseStatus, Verb,
    READ_TIMEOUT,
};

use crate::config::ServerConfig;
use crate::matches::MatchRegistry;

/// 请求处理器
pub struct RequestHandler;

impl RequestHandler {
    /// 处理一条已解析的请求，返回响应
    ///
    /// 注册表的状态违规一律转为 error 响应，坏请求不许拖垮服务进程。
    pub fn handle(registry: &mut MatchRegistry, request: &Request) -> Response {
        registry.touch(&request.user_id);

        match request.verb {
            Verb::FindMatch => Self::handle_find_match(registry, request),
            Verb::StatusMatch => Self::handle_status_match(registry, request),
            Verb::UpdateMatch => Self::handle_update_match(registry, request),
            Verb::Killswitch => Self::handle_killswitch(registry, request),
        }
    }

    /// 处理入队请求
    fn handle_find_match(registry: &mut MatchRegistry, request: &Request) -> Response {
        match registry.find_match(&request.user_id) {
            Ok(()) => Response::success("user added to match queue"),
            Err(error) => Response::error(error.to_string()),
        }
    }

    /// 处理状态查询
    fn handle_status_match(registry: &mut MatchRegistry, request: &Request) -> Response {
        match registry.status(&request.user_id) {
            Ok(status) => Response::success(status.encode()),
            Err(error) => Response::error(error.to_string()),
        }
    }

    /// 处理局面提交，唯一参数为新 FEN
    fn handle_update_match(registry: &mut MatchRegistry, request: &Request) -> Response {
        let Some(fen) = request.args.first() else {
            return Response::error("missing fen argument");
        };
        match registry.update(&request.user_id, fen) {
            Ok(()) => Response::success("fen has been updated"),
            Err(error) => Response::error(error.to_string()),
        }
    }

    /// 处理停机指令，唯一参数为明文口令
    fn handle_killswitch(registry: &mut MatchRegistry, request: &Request) -> Response {
        let secret = request.args.first().map(String::as_str).unwrap_or_default();
        match registry.kill(secret) {
            Ok(()) => Response::success("killing server"),
            Err(error) => Response::error(error.to_string()),
        }
    }
}

/// 配对服务器
pub struct ChessServer {
    listener: TcpListener,
    registry: MatchRegistry,
    buffer_size: usize,
    read_timeout: Duration,
}

impl ChessServer {
    /// 按配置绑定监听地址
    pub async fn bind(config: &ServerConfig) -> Result<Self> {
        let addr = config.listen_addr();
        let listener = TcpListener::bind(&addr)
            .await
            .with_context(|| format!("无法绑定监听地址 {addr}"))?;
        Ok(Self {
            listener,
            registry: MatchRegistry::new(config.server_hash.clone()),
            buffer_size: config.buffer_size,
            read_timeout: READ_TIMEOUT,
        })
    }

    /// 用现成的监听器和注册表构造，测试时可自定义阈值
    pub fn with_registry(
        listener: TcpListener,
        registry: MatchRegistry,
        buffer_size: usize,
        read_timeout: Duration,
    ) -> Self {
        Self {
            listener,
            registry,
            buffer_size,
            read_timeout,
        }
    }

    /// 实际监听的本地地址
    pub fn local_addr(&self) -> Result<SocketAddr> {
        self.listener.local_addr().context("无法获取监听地址")
    }

    /// 顺序处理连接，直到收到通过鉴权的停机指令
    pub async fn run(mut self) -> Result<()> {
        info!(addr = %self.local_addr()?, "Server listening");

        loop {
            let (stream, peer) = self.listener.accept().await.context("接受连接失败")?;
            match self.serve_connection(stream).await {
                Ok(true) => {
                    info!("Killswitch accepted, shutting down");
                    break;
                }
                Ok(false) => {}
                // 单个连接的失败只记录，循环继续
                Err(error) => warn!(%peer, %error, "Connection failed"),
            }
        }
        Ok(())
    }

    /// 处理单个连接的一来一回，返回是否应当停机
    async fn serve_connection(&mut self, mut stream: TcpStream) -> protocol::Result<bool> {
        // 静默的对端不许拖住循环，超时即丢弃连接
        let frame = timeout(
            self.read_timeout,
            read_frame_limited(&mut stream, self.buffer_size),
        )
        .await
        .map_err(|_| ProtocolError::ConnectionTimeout)??;

        // 刷新先于请求处理，间隔门限由注册表把关
        self.registry.maybe_refresh();

        let (response, shutdown) = match Request::parse(&frame) {
            Ok(request) => {
                info!(verb = %request.verb, user_id = %request.user_id, "Request received");
                let response = RequestHandler::handle(&mut self.registry, &request);
                let shutdown = request.verb == Verb::Killswitch
                    && response.status == ResponseStatus::Success;
                (response, shutdown)
            }
            Err(ProtocolError::UnknownVerb { verb }) => {
                warn!(%verb, "Rejected unknown verb");
                (Response::error(format!("unknown verb {verb}")), false)
            }
            Err(error) => {
                warn!(%error, "Rejected malformed request frame");
                (Response::error("bad request frame"), false)
            }
        };

        write_frame(&mut stream, &response.encode()).await?;
        Ok(shutdown)
    }
}
