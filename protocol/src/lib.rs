//! 国际象棋共享协议库
//!
//! 包含:
//! - 棋子、棋盘、格子等核心数据结构
//! - 走法生成和应用
//! - FEN 局面编解码
//! - 线协议帧类型 (Request, Response, MatchStatus)
//! - 单次请求应答的传输层

mod board;
mod constants;
mod error;
mod fen;
mod moves;
mod piece;
mod transport;
mod wire;

pub use board::{king_home, Board, BoardState, CastlingRights};
pub use constants::*;
pub use error::{ChessError, ProtocolError, Result};
pub use fen::{Fen, INITIAL_FEN};
pub use moves::{Move, MoveGenerator, MoveKind};
pub use piece::{Color, Piece, PieceType, Square};
pub use transport::{read_frame, read_frame_limited, send_request, write_frame};
pub use wire::{
    sanitize_user_id, MatchStatus, Request, Response, ResponseStatus, Verb,
    ARG_SEPARATOR, FRAME_SEPARATOR,
};
