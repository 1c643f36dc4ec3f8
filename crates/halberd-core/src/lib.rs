//! Core chess types: board representation, move generation, and game rules.

pub mod attacks;
mod bitboard;
mod castling;
mod chess_move;
mod color;
mod draw;
mod error;
mod fen;
mod make_move;
pub mod movegen;
pub mod perft;
mod piece;
mod piece_kind;
mod position;
pub mod psqt;
mod square;
mod zobrist;

pub use bitboard::Bitboard;
pub use castling::{CastleRights, CastleSide};
pub use chess_move::{Move, MoveFlag};
pub use color::Color;
pub use error::{FenError, MoveParseError, PositionError};
pub use fen::STARTING_FEN;
pub use movegen::{MoveList, generate_all, generate_noisy, generate_quiet, legal_moves};
pub use perft::{divide, perft};
pub use piece::Piece;
pub use piece_kind::PieceKind;
pub use position::{MAX_HISTORY, Position};
pub use square::Square;
pub use zobrist::hash_from_scratch;
