//! 走法生成和应用

use crate::board::{king_home, Board, BoardState};
use crate::error::ChessError;
use crate::piece::{Color, PieceType, Square};

/// 走法类别，至多附带一个关联格子
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MoveKind {
    /// 普通走子
    Normal,
    /// 兵双步推进，关联被跳过的格子
    EnableEnPassant(Square),
    /// 吃过路兵，关联被吃的兵所在格
    EnPassant(Square),
    /// 王或车离开初始格，关联触发撤权的起点格
    DisableCastling(Square),
    /// 王车易位，关联王的落点格
    Castling(Square),
}

/// 走法
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Move {
    /// 起点
    pub from: Square,
    /// 落点
    pub to: Square,
    /// 类别与副作用
    pub kind: MoveKind,
}

impl Move {
    /// 创建普通走法
    pub fn normal(from: Square, to: Square) -> Self {
        Self {
            from,
            to,
            kind: MoveKind::Normal,
        }
    }
}

impl std::fmt::Display for Move {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} -> {}", self.from, self.to)
    }
}

/// 走法生成器
///
/// 只做逐子生成，不过滤送王入将的走法，王车易位也不检查路径是否被攻击。
pub struct MoveGenerator;

impl MoveGenerator {
    /// 生成指定格子上棋子的所有候选走法，空格返回空列表
    pub fn piece_moves(state: &BoardState, origin: Square) -> Vec<Move> {
        let mut moves = Vec::new();
        if let Some(piece) = state.board.get(origin) {
            match piece.piece_type {
                PieceType::Pawn => Self::generate_pawn_moves(state, origin, piece.color, &mut moves),
                PieceType::Knight => {
                    Self::generate_knight_moves(state, origin, piece.color, &mut moves)
                }
                PieceType::Bishop => {
                    Self::generate_bishop_moves(state, origin, piece.color, &mut moves)
                }
                PieceType::Rook => Self::generate_rook_moves(state, origin, piece.color, &mut moves),
                PieceType::Queen => {
                    Self::generate_queen_moves(state, origin, piece.color, &mut moves)
                }
                PieceType::King => Self::generate_king_moves(state, origin, piece.color, &mut moves),
            }
        }
        moves
    }

    /// 生成指定阵营的所有候选走法
    pub fn color_moves(state: &BoardState, color: Color) -> Vec<Move> {
        let mut moves = Vec::with_capacity(64);
        for (origin, _) in state.board.pieces(color) {
            moves.extend(Self::piece_moves(state, origin));
        }
        moves
    }

    /// 生成兵的走法
    fn generate_pawn_moves(state: &BoardState, origin: Square, color: Color, moves: &mut Vec<Move>) {
        let forward = match color {
            Color::White => -1i8,
            Color::Black => 1i8,
        };
        let home_row = match color {
            Color::White => 6,
            Color::Black => 1,
        };

        // 前进一格
        if let Some(one) = origin.offset(forward, 0) {
            if state.board.get(one).is_none() {
                moves.push(Move::normal(origin, one));

                // 初始横排可双步推进，记录被跳过的格子
                if origin.row == home_row {
                    if let Some(two) = one.offset(forward, 0) {
                        if state.board.get(two).is_none() {
                            moves.push(Move {
                                from: origin,
                                to: two,
                                kind: MoveKind::EnableEnPassant(one),
                            });
                        }
                    }
                }
            }
        }

        // 斜吃，含吃过路兵
        for dc in [-1i8, 1i8] {
            if let Some(to) = origin.offset(forward, dc) {
                if let Some(target) = state.board.get(to) {
                    if target.color != color {
                        moves.push(Move::normal(origin, to));
                    }
                } else if state.en_passant_target == Some(to) {
                    // 被吃的兵与目标格同列，在本兵所在横排
                    let captured = Square::new_unchecked(origin.row, to.col);
                    moves.push(Move {
                        from: origin,
                        to,
                        kind: MoveKind::EnPassant(captured),
                    });
                }
            }
        }
    }

    /// 生成马的走法
    fn generate_knight_moves(
        state: &BoardState,
        origin: Square,
        color: Color,
        moves: &mut Vec<Move>,
    ) {
        let offsets = [
            (-2, -1),
            (-2, 1),
            (-1, -2),
            (-1, 2),
            (1, -2),
            (1, 2),
            (2, -1),
            (2, 1),
        ];

        for (dr, dc) in offsets {
            if let Some(to) = origin.offset(dr, dc) {
                Self::try_add_move(&state.board, origin, to, color, moves);
            }
        }
    }

    /// 生成象的走法
    fn generate_bishop_moves(
        state: &BoardState,
        origin: Square,
        color: Color,
        moves: &mut Vec<Move>,
    ) {
        let directions = [(-1, -1), (-1, 1), (1, -1), (1, 1)];
        Self::generate_ray_moves(
            &state.board,
            origin,
            color,
            &directions,
            MoveKind::Normal,
            moves,
        );
    }

    /// 生成车的走法，每步都带撤权标记
    fn generate_rook_moves(state: &BoardState, origin: Square, color: Color, moves: &mut Vec<Move>) {
        let directions = [(-1, 0), (1, 0), (0, -1), (0, 1)];
        Self::generate_ray_moves(
            &state.board,
            origin,
            color,
            &directions,
            MoveKind::DisableCastling(origin),
            moves,
        );
    }

    /// 生成后的走法（车象合并，不带撤权标记）
    fn generate_queen_moves(
        state: &BoardState,
        origin: Square,
        color: Color,
        moves: &mut Vec<Move>,
    ) {
        let directions = [
            (-1, -1),
            (-1, 0),
            (-1, 1),
            (0, -1),
            (0, 1),
            (1, -1),
            (1, 0),
            (1, 1),
        ];
        Self::generate_ray_moves(
            &state.board,
            origin,
            color,
            &directions,
            MoveKind::Normal,
            moves,
        );
    }

    /// 生成王的走法，含王车易位
    fn generate_king_moves(state: &BoardState, origin: Square, color: Color, moves: &mut Vec<Move>) {
        let directions = [
            (-1, -1),
            (-1, 0),
            (-1, 1),
            (0, -1),
            (0, 1),
            (1, -1),
            (1, 0),
            (1, 1),
        ];

        // 普通王步一律带撤权标记
        for (dr, dc) in directions {
            if let Some(to) = origin.offset(dr, dc) {
                match state.board.get(to) {
                    Some(target) if target.color == color => {}
                    _ => moves.push(Move {
                        from: origin,
                        to,
                        kind: MoveKind::DisableCastling(origin),
                    }),
                }
            }
        }

        // 王车易位：权未失、王与车都在初始格、两者之间全空
        if origin != king_home(color) {
            return;
        }
        let row = origin.row;

        if state.castling.has_kingside(color)
            && Self::rook_at(&state.board, Square::new_unchecked(row, 7), color)
            && state.board.get(Square::new_unchecked(row, 5)).is_none()
            && state.board.get(Square::new_unchecked(row, 6)).is_none()
        {
            let to = Square::new_unchecked(row, 6);
            moves.push(Move {
                from: origin,
                to,
                kind: MoveKind::Castling(to),
            });
        }

        if state.castling.has_queenside(color)
            && Self::rook_at(&state.board, Square::new_unchecked(row, 0), color)
            && state.board.get(Square::new_unchecked(row, 1)).is_none()
            && state.board.get(Square::new_unchecked(row, 2)).is_none()
            && state.board.get(Square::new_unchecked(row, 3)).is_none()
        {
            let to = Square::new_unchecked(row, 2);
            moves.push(Move {
                from: origin,
                to,
                kind: MoveKind::Castling(to),
            });
        }
    }

    /// 沿指定方向滑行生成走法，遇子而止，敌子可吃
    fn generate_ray_moves(
        board: &Board,
        origin: Square,
        color: Color,
        directions: &[(i8, i8)],
        kind: MoveKind,
        moves: &mut Vec<Move>,
    ) {
        for &(dr, dc) in directions {
            let mut current = origin;
            while let Some(to) = current.offset(dr, dc) {
                if let Some(target) = board.get(to) {
                    if target.color != color {
                        moves.push(Move {
                            from: origin,
                            to,
                            kind,
                        });
                    }
                    break;
                }
                moves.push(Move {
                    from: origin,
                    to,
                    kind,
                });
                current = to;
            }
        }
    }

    /// 尝试添加走法（目标为空格或敌子时可走）
    fn try_add_move(board: &Board, from: Square, to: Square, color: Color, moves: &mut Vec<Move>) {
        match board.get(to) {
            Some(target) => {
                if target.color != color {
                    moves.push(Move::normal(from, to));
                }
            }
            None => moves.push(Move::normal(from, to)),
        }
    }

    /// 指定格子上是否是己方的车
    fn rook_at(board: &Board, square: Square, color: Color) -> bool {
        matches!(
            board.get(square),
            Some(piece) if piece.piece_type == PieceType::Rook && piece.color == color
        )
    }

    /// 应用走法，就地修改状态
    ///
    /// 只校验起点有子且归当前走子方，其余合法性由生成方保证。
    pub fn apply(state: &mut BoardState, mv: &Move) -> Result<(), ChessError> {
        let piece = state.board.get(mv.from).ok_or_else(|| ChessError::IllegalMove {
            reason: format!("no piece at {}", mv.from),
        })?;
        if piece.color != state.active_color {
            return Err(ChessError::IllegalMove {
                reason: format!("piece at {} does not belong to the side to move", mv.from),
            });
        }

        state.board.move_piece(mv.from, mv.to);

        match mv.kind {
            MoveKind::Normal | MoveKind::EnableEnPassant(_) => {}
            MoveKind::EnPassant(captured) => {
                state.board.set(captured, None);
            }
            MoveKind::Castling(king_dest) => {
                // 由王的落点搬动对应的车：短易位车落王左侧，长易位车落王右侧
                let row = king_dest.row;
                let (rook_from, rook_to) = if king_dest.col == 6 {
                    (Square::new_unchecked(row, 7), Square::new_unchecked(row, 5))
                } else {
                    (Square::new_unchecked(row, 0), Square::new_unchecked(row, 3))
                };
                state.board.move_piece(rook_from, rook_to);
                // 王已离开初始格，双侧易位权一并撤销
                state.castling.revoke_color(piece.color);
            }
            MoveKind::DisableCastling(origin) => {
                state.castling.revoke_for_origin(origin);
            }
        }

        // 过路兵窗口只保留一步
        state.en_passant_target = match mv.kind {
            MoveKind::EnableEnPassant(skipped) => Some(skipped),
            _ => None,
        };

        state.switch_turn();
        Ok(())
    }
}
