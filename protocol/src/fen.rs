//! FEN 格式解析和生成
//!
//! 六个空格分隔的字段：
//! `<棋盘> <走子方> <易位权> <过路兵目标> <半回合数> <回合数>`
//!
//! 示例：
//! `rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1`

use crate::board::{Board, BoardState, CastlingRights};
use crate::constants::BOARD_SIZE;
use crate::error::ChessError;
use crate::piece::{Color, Piece, Square};

/// 初始局面 FEN
pub const INITIAL_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

/// FEN 格式处理
pub struct Fen;

impl Fen {
    /// 解析 FEN 字符串为棋盘状态
    pub fn parse(fen: &str) -> Result<BoardState, ChessError> {
        let parts: Vec<&str> = fen.split_whitespace().collect();
        if parts.len() != 6 {
            return Err(ChessError::InvalidFen {
                reason: format!("Expected 6 fields, got {}", parts.len()),
            });
        }

        // 解析棋盘
        let board = Self::parse_board(parts[0])?;

        // 解析走子方
        let active_color = match parts[1] {
            "w" => Color::White,
            "b" => Color::Black,
            other => {
                return Err(ChessError::InvalidFen {
                    reason: format!("Invalid active color: {:?}", other),
                });
            }
        };

        // 解析易位权
        let castling =
            CastlingRights::from_fen_field(parts[2]).ok_or_else(|| ChessError::InvalidFen {
                reason: format!("Invalid castling field: {:?}", parts[2]),
            })?;

        // 解析过路兵目标格
        let en_passant_target = if parts[3] == "-" {
            None
        } else {
            Some(Square::from_notation(parts[3])?)
        };

        // 解析半回合数
        let half_move_clock = parts[4].parse().map_err(|_| ChessError::InvalidFen {
            reason: format!("Invalid half-move clock: {:?}", parts[4]),
        })?;

        // 解析回合数
        let full_move_number = parts[5].parse().map_err(|_| ChessError::InvalidFen {
            reason: format!("Invalid full-move number: {:?}", parts[5]),
        })?;

        Ok(BoardState {
            board,
            active_color,
            castling,
            en_passant_target,
            half_move_clock,
            full_move_number,
        })
    }

    /// 解析棋盘部分
    fn parse_board(board_str: &str) -> Result<Board, ChessError> {
        let mut board = Board::empty();
        let ranks: Vec<&str> = board_str.split('/').collect();

        if ranks.len() != BOARD_SIZE {
            return Err(ChessError::InvalidFen {
                reason: format!("Expected 8 ranks, got {}", ranks.len()),
            });
        }

        // FEN 自上而下，即 row 0 到 row 7
        for (row, rank) in ranks.iter().enumerate() {
            let mut col = 0u8;

            for c in rank.chars() {
                if col as usize >= BOARD_SIZE {
                    return Err(ChessError::InvalidFen {
                        reason: format!("Rank {} has too many squares", row),
                    });
                }

                if let Some(d) = c.to_digit(10) {
                    // 空格数量，0 和 9 不合法
                    if !(1..=8).contains(&d) {
                        return Err(ChessError::InvalidFen {
                            reason: format!("Invalid empty-square digit: {}", c),
                        });
                    }
                    col += d as u8;
                } else if let Some(piece) = Piece::from_fen_char(c) {
                    board.set(Square::new_unchecked(row as u8, col), Some(piece));
                    col += 1;
                } else {
                    return Err(ChessError::InvalidFen {
                        reason: format!("Invalid piece character: {}", c),
                    });
                }
            }

            if col as usize != BOARD_SIZE {
                return Err(ChessError::InvalidFen {
                    reason: format!("Rank {} has {} squares, expected 8", row, col),
                });
            }
        }

        Ok(board)
    }

    /// 将棋盘状态转换为 FEN 字符串
    pub fn to_string(state: &BoardState) -> String {
        let en_passant = match state.en_passant_target {
            Some(square) => square.to_string(),
            None => "-".to_string(),
        };
        format!(
            "{} {} {} {} {} {}",
            Self::board_to_string(&state.board),
            state.active_color.to_fen_char(),
            state.castling.to_fen_field(),
            en_passant,
            state.half_move_clock,
            state.full_move_number
        )
    }

    /// 将棋盘转换为 FEN 棋盘部分
    pub fn board_to_string(board: &Board) -> String {
        let mut ranks = Vec::with_capacity(BOARD_SIZE);

        for row in 0..BOARD_SIZE {
            let mut rank = String::new();
            let mut empty_count = 0;

            for col in 0..BOARD_SIZE {
                if let Some(piece) = board.get(Square::new_unchecked(row as u8, col as u8)) {
                    if empty_count > 0 {
                        rank.push_str(&empty_count.to_string());
                        empty_count = 0;
                    }
                    rank.push(piece.to_fen_char());
                } else {
                    empty_count += 1;
                }
            }

            if empty_count > 0 {
                rank.push_str(&empty_count.to_string());
            }

            ranks.push(rank);
        }

        ranks.join("/")
    }

    /// 初始局面
    pub fn initial() -> BoardState {
        BoardState::initial()
    }

    /// 从 FEN 读取走子方字母，供只关心回合归属的调用方使用
    pub fn active_color(fen: &str) -> Result<Color, ChessError> {
        Ok(Self::parse(fen)?.active_color)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::piece::PieceType;

    #[test]
    fn test_parse_initial_fen() {
        let state = Fen::parse(INITIAL_FEN).unwrap();

        // 解析结果与程序构造的初始状态一致
        assert_eq!(state, BoardState::initial());

        assert_eq!(state.active_color, Color::White);
        assert_eq!(state.castling, CastlingRights::all());
        assert_eq!(state.en_passant_target, None);
        assert_eq!(state.half_move_clock, 0);
        assert_eq!(state.full_move_number, 1);

        let king = state.board.get(Square::from_notation("e1").unwrap());
        assert_eq!(king, Some(Piece::new(PieceType::King, Color::White)));

        let king = state.board.get(Square::from_notation("e8").unwrap());
        assert_eq!(king, Some(Piece::new(PieceType::King, Color::Black)));
    }

    #[test]
    fn test_fen_roundtrip() {
        // 初始局面：编码后再解析应得到同一状态
        let state = Fen::initial();
        let fen = Fen::to_string(&state);
        assert_eq!(fen, INITIAL_FEN);
        assert_eq!(Fen::parse(&fen).unwrap(), state);

        // 任一合法 FEN：解析后再编码应得到原字符串
        let mid_game = "r1bqkbnr/pppp1ppp/2n5/4p3/4P3/5N2/PPPP1PPP/RNBQKB1R w KQkq - 2 3";
        let state = Fen::parse(mid_game).unwrap();
        assert_eq!(Fen::to_string(&state), mid_game);
    }

    #[test]
    fn test_parse_custom_fen() {
        // 双王加一个有过路兵目标的局面
        let fen = "4k3/8/8/8/4Pp2/8/8/4K3 b - e3 0 42";
        let state = Fen::parse(fen).unwrap();

        assert_eq!(state.active_color, Color::Black);
        assert_eq!(state.castling, CastlingRights::none());
        assert_eq!(
            state.en_passant_target,
            Some(Square::from_notation("e3").unwrap())
        );
        assert_eq!(state.half_move_clock, 0);
        assert_eq!(state.full_move_number, 42);

        let pawn = state.board.get(Square::from_notation("f4").unwrap());
        assert_eq!(pawn, Some(Piece::new(PieceType::Pawn, Color::Black)));

        assert_eq!(Fen::to_string(&state), fen);
    }

    #[test]
    fn test_invalid_fen() {
        // 字段数不对
        assert!(Fen::parse("4k3/8/8/8/8/8/8/4K3 w KQkq").is_err());
        assert!(Fen::parse("").is_err());

        // 行数不对
        assert!(Fen::parse("4k3/8/8 w - - 0 1").is_err());

        // 行内格数不对
        assert!(Fen::parse("4k4/8/8/8/8/8/8/4K3 w - - 0 1").is_err());
        assert!(Fen::parse("4k2/8/8/8/8/8/8/4K3 w - - 0 1").is_err());

        // 无效字符
        assert!(Fen::parse("4x3/8/8/8/8/8/8/4K3 w - - 0 1").is_err());

        // 数字 0 和 9 不合法
        assert!(Fen::parse("4k30/8/8/8/8/8/8/4K3 w - - 0 1").is_err());
        assert!(Fen::parse("9/4k3/8/8/8/8/8/4K3 w - - 0 1").is_err());

        // 无效走子方
        assert!(Fen::parse("4k3/8/8/8/8/8/8/4K3 x - - 0 1").is_err());

        // 无效易位权字段
        assert!(Fen::parse("4k3/8/8/8/8/8/8/4K3 w KX - 0 1").is_err());

        // 无效过路兵目标
        assert!(Fen::parse("4k3/8/8/8/8/8/8/4K3 w - z9 0 1").is_err());

        // 无效计数
        assert!(Fen::parse("4k3/8/8/8/8/8/8/4K3 w - - x 1").is_err());
        assert!(Fen::parse("4k3/8/8/8/8/8/8/4K3 w - - 0 y").is_err());
    }

    #[test]
    fn test_active_color_helper() {
        assert_eq!(Fen::active_color(INITIAL_FEN).unwrap(), Color::White);
        let black_to_move = "4k3/8/8/8/8/8/8/4K3 b - - 0 1";
        assert_eq!(Fen::active_color(black_to_move).unwrap(), Color::Black);
        assert!(Fen::active_color("not a fen").is_err());
    }
}
