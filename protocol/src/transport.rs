//! 传输层
//!
//! 每个连接只承载一次请求应答：写入方写完帧后半关闭写端，
//! 读取方读到 EOF 即拿到完整帧。帧内不允许换行，长度受缓冲区上限约束。

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::timeout;

use crate::constants::{CONNECT_TIMEOUT, DEFAULT_BUFFER_SIZE, READ_TIMEOUT};
use crate::error::{ProtocolError, Result};
use crate::wire::{Request, Response};

/// 读取一帧文本，直到对端关闭写端，超出 max_len 字节即拒绝
pub async fn read_frame_limited<R>(reader: &mut R, max_len: usize) -> Result<String>
where
    R: AsyncRead + Unpin,
{
    let mut buffer = Vec::with_capacity(max_len.min(DEFAULT_BUFFER_SIZE));
    let mut limited = reader.take(max_len as u64 + 1);
    limited.read_to_end(&mut buffer).await.map_err(ProtocolError::Io)?;

    if buffer.len() > max_len {
        return Err(ProtocolError::FrameTooLarge {
            size: buffer.len(),
            max: max_len,
        });
    }
    if buffer.is_empty() {
        return Err(ProtocolError::ConnectionClosed);
    }

    String::from_utf8(buffer).map_err(|_| ProtocolError::BadFrame {
        reason: "frame is not valid UTF-8".to_string(),
    })
}

/// 以默认缓冲区上限读取一帧
pub async fn read_frame<R>(reader: &mut R) -> Result<String>
where
    R: AsyncRead + Unpin,
{
    read_frame_limited(reader, DEFAULT_BUFFER_SIZE).await
}

/// 写出一帧文本
pub async fn write_frame<W>(writer: &mut W, frame: &str) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    if frame.len() > DEFAULT_BUFFER_SIZE {
        return Err(ProtocolError::FrameTooLarge {
            size: frame.len(),
            max: DEFAULT_BUFFER_SIZE,
        });
    }
    writer.write_all(frame.as_bytes()).await?;
    writer.flush().await?;
    Ok(())
}

/// 完成一次完整的请求应答交换
///
/// 建立连接、写请求帧、半关闭写端、等响应帧，随后连接废弃。
pub async fn send_request(addr: &str, request: &Request) -> Result<Response> {
    let mut stream = timeout(CONNECT_TIMEOUT, TcpStream::connect(addr))
        .await
        .map_err(|_| ProtocolError::ConnectionTimeout)?
        .map_err(ProtocolError::Io)?;
    stream.set_nodelay(true)?;
    tracing::debug!(%addr, verb = %request.verb, user_id = %request.user_id, "Sending request");

    write_frame(&mut stream, &request.encode()).await?;
    // 半关闭写端，向服务端示意请求帧完结
    stream.shutdown().await?;

    let frame = timeout(READ_TIMEOUT, read_frame(&mut stream))
        .await
        .map_err(|_| ProtocolError::ConnectionTimeout)??;
    let response = Response::parse(&frame)?;
    tracing::debug!(status = response.status.as_str(), "Received response");
    Ok(response)
}
