//! 棋盘状态

use crate::constants::BOARD_SIZE;
use crate::piece::{Color, Piece, PieceType, Square};

/// 白王初始格 e1
pub const WHITE_KING_HOME: Square = Square::new_unchecked(7, 4);
/// 白方后翼车初始格 a1
pub const WHITE_QUEENSIDE_ROOK_HOME: Square = Square::new_unchecked(7, 0);
/// 白方王翼车初始格 h1
pub const WHITE_KINGSIDE_ROOK_HOME: Square = Square::new_unchecked(7, 7);
/// 黑王初始格 e8
pub const BLACK_KING_HOME: Square = Square::new_unchecked(0, 4);
/// 黑方后翼车初始格 a8
pub const BLACK_QUEENSIDE_ROOK_HOME: Square = Square::new_unchecked(0, 0);
/// 黑方王翼车初始格 h8
pub const BLACK_KINGSIDE_ROOK_HOME: Square = Square::new_unchecked(0, 7);

/// 指定阵营的王初始格
pub fn king_home(color: Color) -> Square {
    match color {
        Color::White => WHITE_KING_HOME,
        Color::Black => BLACK_KING_HOME,
    }
}

/// 棋盘
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Board {
    /// 8x8 棋盘，索引为 row * 8 + col
    squares: Vec<Option<Piece>>,
}

impl Board {
    /// 创建空棋盘
    pub fn empty() -> Self {
        Self {
            squares: vec![None; BOARD_SIZE * BOARD_SIZE],
        }
    }

    /// 创建初始棋盘
    pub fn initial() -> Self {
        let mut board = Self::empty();

        // 底线：车马象后王象马车
        let back_rank = [
            PieceType::Rook,
            PieceType::Knight,
            PieceType::Bishop,
            PieceType::Queen,
            PieceType::King,
            PieceType::Bishop,
            PieceType::Knight,
            PieceType::Rook,
        ];
        for (col, &piece_type) in back_rank.iter().enumerate() {
            // 黑方在上（row 0），白方在下（row 7）
            board.set(
                Square::new_unchecked(0, col as u8),
                Some(Piece::new(piece_type, Color::Black)),
            );
            board.set(
                Square::new_unchecked(7, col as u8),
                Some(Piece::new(piece_type, Color::White)),
            );
        }

        // 兵线
        for col in 0..BOARD_SIZE {
            board.set(
                Square::new_unchecked(1, col as u8),
                Some(Piece::new(PieceType::Pawn, Color::Black)),
            );
            board.set(
                Square::new_unchecked(6, col as u8),
                Some(Piece::new(PieceType::Pawn, Color::White)),
            );
        }

        board
    }

    /// 获取指定格子的棋子
    pub fn get(&self, square: Square) -> Option<Piece> {
        self.squares[square.to_index()]
    }

    /// 设置指定格子的棋子
    pub fn set(&mut self, square: Square, piece: Option<Piece>) {
        self.squares[square.to_index()] = piece;
    }

    /// 移动棋子（不检查规则），返回被吃的棋子
    pub fn move_piece(&mut self, from: Square, to: Square) -> Option<Piece> {
        let piece = self.get(from);
        let captured = self.get(to);
        self.set(from, None);
        self.set(to, piece);
        captured
    }

    /// 获取指定阵营的所有棋子及其格子
    pub fn pieces(&self, color: Color) -> Vec<(Square, Piece)> {
        let mut result = Vec::new();
        for index in 0..BOARD_SIZE * BOARD_SIZE {
            if let Some(square) = Square::from_index(index) {
                if let Some(piece) = self.get(square) {
                    if piece.color == color {
                        result.push((square, piece));
                    }
                }
            }
        }
        result
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::initial()
    }
}

/// 王车易位权
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CastlingRights {
    pub white_kingside: bool,
    pub white_queenside: bool,
    pub black_kingside: bool,
    pub black_queenside: bool,
}

impl CastlingRights {
    /// 四项易位权齐全
    pub fn all() -> Self {
        Self {
            white_kingside: true,
            white_queenside: true,
            black_kingside: true,
            black_queenside: true,
        }
    }

    /// 无任何易位权
    pub fn none() -> Self {
        Self {
            white_kingside: false,
            white_queenside: false,
            black_kingside: false,
            black_queenside: false,
        }
    }

    pub fn is_empty(&self) -> bool {
        !(self.white_kingside || self.white_queenside || self.black_kingside || self.black_queenside)
    }

    /// 指定阵营是否还有王翼易位权
    pub fn has_kingside(&self, color: Color) -> bool {
        match color {
            Color::White => self.white_kingside,
            Color::Black => self.black_kingside,
        }
    }

    /// 指定阵营是否还有后翼易位权
    pub fn has_queenside(&self, color: Color) -> bool {
        match color {
            Color::White => self.white_queenside,
            Color::Black => self.black_queenside,
        }
    }

    /// 撤销指定阵营的全部易位权
    pub fn revoke_color(&mut self, color: Color) {
        match color {
            Color::White => {
                self.white_kingside = false;
                self.white_queenside = false;
            }
            Color::Black => {
                self.black_kingside = false;
                self.black_queenside = false;
            }
        }
    }

    /// 按起点格撤销易位权：王的初始格撤销该方全部，车的初始格只撤销对应一侧
    pub fn revoke_for_origin(&mut self, origin: Square) {
        if origin == WHITE_KING_HOME {
            self.revoke_color(Color::White);
        } else if origin == BLACK_KING_HOME {
            self.revoke_color(Color::Black);
        } else if origin == WHITE_KINGSIDE_ROOK_HOME {
            self.white_kingside = false;
        } else if origin == WHITE_QUEENSIDE_ROOK_HOME {
            self.white_queenside = false;
        } else if origin == BLACK_KINGSIDE_ROOK_HOME {
            self.black_kingside = false;
        } else if origin == BLACK_QUEENSIDE_ROOK_HOME {
            self.black_queenside = false;
        }
    }

    /// 序列化为 FEN 字段（KQkq 顺序，空集为 "-"）
    pub fn to_fen_field(&self) -> String {
        if self.is_empty() {
            return "-".to_string();
        }
        let mut field = String::new();
        if self.white_kingside {
            field.push('K');
        }
        if self.white_queenside {
            field.push('Q');
        }
        if self.black_kingside {
            field.push('k');
        }
        if self.black_queenside {
            field.push('q');
        }
        field
    }

    /// 从 FEN 字段解析
    pub fn from_fen_field(field: &str) -> Option<CastlingRights> {
        if field == "-" {
            return Some(Self::none());
        }
        if field.is_empty() {
            return None;
        }
        let mut rights = Self::none();
        for c in field.chars() {
            match c {
                'K' => rights.white_kingside = true,
                'Q' => rights.white_queenside = true,
                'k' => rights.black_kingside = true,
                'q' => rights.black_queenside = true,
                _ => return None,
            }
        }
        Some(rights)
    }
}

impl Default for CastlingRights {
    fn default() -> Self {
        Self::all()
    }
}

/// 完整的棋盘状态（棋盘加各项侧态字段）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoardState {
    /// 棋盘
    pub board: Board,
    /// 当前走子方
    pub active_color: Color,
    /// 易位权，整局只减不增
    pub castling: CastlingRights,
    /// 吃过路兵目标格（双步推进后对方可吃的那一格）
    pub en_passant_target: Option<Square>,
    /// 半回合计数
    pub half_move_clock: u32,
    /// 完整回合数，黑方走完后 +1
    pub full_move_number: u32,
}

impl BoardState {
    /// 创建初始状态
    pub fn initial() -> Self {
        Self {
            board: Board::initial(),
            active_color: Color::White,
            castling: CastlingRights::all(),
            en_passant_target: None,
            half_move_clock: 0,
            full_move_number: 1,
        }
    }

    /// 切换走子方
    pub fn switch_turn(&mut self) {
        self.active_color = self.active_color.opponent();
        if self.active_color == Color::White {
            self.full_move_number += 1;
        }
    }
}

impl Default for BoardState {
    fn default() -> Self {
        Self::initial()
    }
}
