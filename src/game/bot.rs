use super::Board;
use super::Side;
use crate::COLS;
use crate::Column;
use crate::ROWS;
use crate::SEARCH_DEPTH;
use rand::Rng;
use rand::SeedableRng;
use rand::rngs::SmallRng;

const WIN: i32 = 10_000;
const CENTER_WEIGHT: i32 = 3;
const SCORE_FOUR: i32 = 100;
const SCORE_THREE: i32 = 5;
const SCORE_TWO: i32 = 2;
const SCORE_OPPONENT_THREE: i32 = -4;

/// Adversarial opponent: immediate win, then immediate block, then
/// fixed-depth minimax with alpha-beta pruning. Deterministic for a
/// given position; all speculation runs on a private board clone.
#[derive(Clone, Copy, Debug)]
pub struct Bot {
    side: Side,
    depth: u32,
}

impl Bot {
    pub fn new(side: Side) -> Self {
        Self {
            side,
            depth: SEARCH_DEPTH,
        }
    }

    /// Picks a column for the bot's side. Returns None only when the
    /// board has no open column, which is already a finished game.
    pub fn best_move(&self, board: &Board) -> Option<Column> {
        let mut board = board.clone();
        let valid = board.valid_columns();

        // take any immediate win
        for &col in valid.iter() {
            board.drop_disc(col, self.side).expect("column is open");
            let won = board.check_win(self.side);
            board.undo(col);
            if won {
                return Some(col);
            }
        }

        // block any immediate loss
        for &col in valid.iter() {
            board.drop_disc(col, self.side.opponent()).expect("column is open");
            let loses = board.check_win(self.side.opponent());
            board.undo(col);
            if loses {
                return Some(col);
            }
        }

        // minimax over center-out ordering; strict > keeps the first
        // (most central) column on ties
        let mut best_score = i32::MIN;
        let mut best_col = None;
        for col in Self::ordered(&valid) {
            board.drop_disc(col, self.side).expect("column is open");
            let score = self.minimax(&mut board, self.depth - 1, i32::MIN, i32::MAX, false);
            board.undo(col);
            if score > best_score {
                best_score = score;
                best_col = Some(col);
            }
        }
        best_col.or_else(|| self.random(&valid))
    }

    /// Center column first, then alternating outward.
    fn ordered(valid: &[Column]) -> impl Iterator<Item = Column> + '_ {
        const ORDER: [Column; COLS] = [3, 2, 4, 1, 5, 0, 6];
        ORDER.into_iter().filter(|col| valid.contains(col))
    }

    fn minimax(&self, board: &mut Board, depth: u32, mut alpha: i32, mut beta: i32, maximizing: bool) -> i32 {
        if board.check_win(self.side) {
            return WIN + depth as i32; // faster wins score higher
        }
        if board.check_win(self.side.opponent()) {
            return -WIN - depth as i32;
        }
        if board.is_full() || depth == 0 {
            return self.evaluate(board);
        }
        let valid = board.valid_columns();
        if maximizing {
            let mut max = i32::MIN;
            for col in valid {
                board.drop_disc(col, self.side).expect("column is open");
                let score = self.minimax(board, depth - 1, alpha, beta, false);
                board.undo(col);
                max = max.max(score);
                alpha = alpha.max(score);
                if beta <= alpha {
                    break;
                }
            }
            max
        } else {
            let mut min = i32::MAX;
            for col in valid {
                board.drop_disc(col, self.side.opponent()).expect("column is open");
                let score = self.minimax(board, depth - 1, alpha, beta, true);
                board.undo(col);
                min = min.min(score);
                beta = beta.min(score);
                if beta <= alpha {
                    break;
                }
            }
            min
        }
    }

    /// Heuristic leaf score: center-column occupancy plus every
    /// 4-cell window in all four directions.
    fn evaluate(&self, board: &Board) -> i32 {
        let center = (0..ROWS)
            .filter(|&row| board.cell(row, COLS / 2) == Some(self.side))
            .count() as i32;
        center * CENTER_WEIGHT + self.windows(board)
    }

    fn windows(&self, board: &Board) -> i32 {
        let mut score = 0;
        for row in 0..ROWS {
            for col in 0..=COLS - 4 {
                score += self.window([
                    board.cell(row, col),
                    board.cell(row, col + 1),
                    board.cell(row, col + 2),
                    board.cell(row, col + 3),
                ]);
            }
        }
        for row in 0..=ROWS - 4 {
            for col in 0..COLS {
                score += self.window([
                    board.cell(row, col),
                    board.cell(row + 1, col),
                    board.cell(row + 2, col),
                    board.cell(row + 3, col),
                ]);
            }
        }
        for row in 0..=ROWS - 4 {
            for col in 0..=COLS - 4 {
                score += self.window([
                    board.cell(row, col),
                    board.cell(row + 1, col + 1),
                    board.cell(row + 2, col + 2),
                    board.cell(row + 3, col + 3),
                ]);
            }
        }
        for row in 3..ROWS {
            for col in 0..=COLS - 4 {
                score += self.window([
                    board.cell(row, col),
                    board.cell(row - 1, col + 1),
                    board.cell(row - 2, col + 2),
                    board.cell(row - 3, col + 3),
                ]);
            }
        }
        score
    }

    fn window(&self, cells: [Option<Side>; 4]) -> i32 {
        let own = cells.iter().filter(|&&c| c == Some(self.side)).count();
        let opp = cells.iter().filter(|&&c| c == Some(self.side.opponent())).count();
        let empty = cells.iter().filter(|c| c.is_none()).count();
        match (own, opp, empty) {
            (4, _, _) => SCORE_FOUR,
            (3, _, 1) => SCORE_THREE,
            (2, _, 2) => SCORE_TWO,
            (_, 3, 1) => SCORE_OPPONENT_THREE,
            _ => 0,
        }
    }

    /// Uniform fallback over open columns, for degenerate positions.
    fn random(&self, valid: &[Column]) -> Option<Column> {
        match valid.len() {
            0 => None,
            n => Some(valid[SmallRng::from_os_rng().random_range(0..n)]),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn takes_the_winning_column() {
        // three P2 discs in a row at the bottom; 3 completes it
        let mut board = Board::default();
        for col in 0..3 {
            board.drop_disc(col, Side::Two).unwrap();
            board.drop_disc(col, Side::One).unwrap();
        }
        let bot = Bot::new(Side::Two);
        assert_eq!(bot.best_move(&board), Some(3));
    }

    #[test]
    fn blocks_the_opponent_win() {
        // P1 threatens a vertical four in column 0
        let mut board = Board::default();
        for _ in 0..3 {
            board.drop_disc(0, Side::One).unwrap();
        }
        board.drop_disc(1, Side::Two).unwrap();
        let bot = Bot::new(Side::Two);
        assert_eq!(bot.best_move(&board), Some(0));
    }

    #[test]
    fn winning_beats_blocking() {
        // both sides have three in column: bot takes its own win
        let mut board = Board::default();
        for _ in 0..3 {
            board.drop_disc(0, Side::One).unwrap();
            board.drop_disc(6, Side::Two).unwrap();
        }
        let bot = Bot::new(Side::Two);
        assert_eq!(bot.best_move(&board), Some(6));
    }

    #[test]
    fn opens_in_the_center() {
        let board = Board::default();
        let bot = Bot::new(Side::Two);
        assert_eq!(bot.best_move(&board), Some(3));
    }

    #[test]
    fn deterministic_for_identical_positions() {
        let mut board = Board::default();
        board.drop_disc(3, Side::One).unwrap();
        board.drop_disc(3, Side::Two).unwrap();
        board.drop_disc(2, Side::One).unwrap();
        let bot = Bot::new(Side::Two);
        assert_eq!(bot.best_move(&board), bot.best_move(&board));
    }

    #[test]
    fn search_leaves_the_board_untouched() {
        let mut board = Board::default();
        board.drop_disc(3, Side::One).unwrap();
        let before = board.clone();
        Bot::new(Side::Two).best_move(&board);
        assert_eq!(board, before);
    }

    #[test]
    fn no_move_on_a_full_board() {
        let mut board = Board::default();
        // fill columns with a non-winning vertical pattern
        let starts = [1u8, 1, 2, 2, 1, 1, 2];
        for (col, &start) in starts.iter().enumerate() {
            for i in 0..crate::ROWS {
                let side = match (start == 1) == (i % 2 == 0) {
                    true => Side::One,
                    false => Side::Two,
                };
                board.drop_disc(col, side).unwrap();
            }
        }
        assert!(board.is_full());
        assert_eq!(Bot::new(Side::Two).best_move(&board), None);
    }

    #[test]
    fn center_ordering_is_center_out() {
        let valid: Vec<_> = (0..crate::COLS).collect();
        let order: Vec<_> = Bot::ordered(&valid).collect();
        assert_eq!(order, vec![3, 2, 4, 1, 5, 0, 6]);
        let order: Vec<_> = Bot::ordered(&[0, 3, 6]).collect();
        assert_eq!(order, vec![3, 0, 6]);
    }
}
