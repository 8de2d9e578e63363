use crate::COLS;
use crate::CONNECT;
use crate::Column;
use crate::ROWS;
use crate::Row;

/// One of the two turn-taking identities in a game.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Side {
    One,
    Two,
}

impl Side {
    pub fn opponent(self) -> Self {
        match self {
            Self::One => Self::Two,
            Self::Two => Self::One,
        }
    }
    /// Wire representation: player 1 or player 2.
    pub fn index(self) -> u8 {
        match self {
            Self::One => 1,
            Self::Two => 2,
        }
    }
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "P{}", self.index())
    }
}

impl serde::Serialize for Side {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_u8(self.index())
    }
}

/// The 6×7 grid. Row 0 is the top row; discs fall to the highest-index
/// empty row of their column. Invariant: no empty cell ever sits below
/// an occupied cell in the same column.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Board {
    cells: [[Option<Side>; COLS]; ROWS],
}

impl Board {
    pub fn cell(&self, row: Row, col: Column) -> Option<Side> {
        self.cells[row][col]
    }

    /// Drops a disc into the column, returning the row it landed in.
    pub fn drop_disc(&mut self, col: Column, side: Side) -> Result<Row, super::GameError> {
        if col >= COLS {
            return Err(super::GameError::InvalidColumn);
        }
        if !self.is_valid(col) {
            return Err(super::GameError::ColumnFull);
        }
        let row = (0..ROWS)
            .rev()
            .find(|&row| self.cells[row][col].is_none())
            .expect("open column has an empty cell");
        self.cells[row][col] = Some(side);
        Ok(row)
    }

    /// Removes the most recently dropped disc from the column.
    /// Exact inverse of [`Board::drop_disc`]; used for speculative search.
    pub fn undo(&mut self, col: Column) {
        for row in 0..ROWS {
            if self.cells[row][col].is_some() {
                self.cells[row][col] = None;
                return;
            }
        }
    }

    /// Scans every horizontal, vertical, and diagonal run of four cells.
    pub fn check_win(&self, side: Side) -> bool {
        let s = Some(side);
        // horizontal
        for row in 0..ROWS {
            for col in 0..=COLS - CONNECT {
                if (0..CONNECT).all(|i| self.cells[row][col + i] == s) {
                    return true;
                }
            }
        }
        // vertical
        for row in 0..=ROWS - CONNECT {
            for col in 0..COLS {
                if (0..CONNECT).all(|i| self.cells[row + i][col] == s) {
                    return true;
                }
            }
        }
        // diagonal (down-right)
        for row in 0..=ROWS - CONNECT {
            for col in 0..=COLS - CONNECT {
                if (0..CONNECT).all(|i| self.cells[row + i][col + i] == s) {
                    return true;
                }
            }
        }
        // diagonal (up-right)
        for row in CONNECT - 1..ROWS {
            for col in 0..=COLS - CONNECT {
                if (0..CONNECT).all(|i| self.cells[row - i][col + i] == s) {
                    return true;
                }
            }
        }
        false
    }

    /// A column is full exactly when its top cell is occupied.
    pub fn is_full(&self) -> bool {
        (0..COLS).all(|col| self.cells[0][col].is_some())
    }

    /// A column accepts a disc while in range and not full.
    pub fn is_valid(&self, col: Column) -> bool {
        col < COLS && self.cells[0][col].is_none()
    }

    /// Columns that can still accept a disc, in ascending order.
    pub fn valid_columns(&self) -> Vec<Column> {
        (0..COLS).filter(|&col| self.cells[0][col].is_none()).collect()
    }

    /// Row-major dump for serialization: 0 = empty, 1 = P1, 2 = P2.
    pub fn to_rows(&self) -> Vec<Vec<u8>> {
        self.cells
            .iter()
            .map(|row| row.iter().map(|c| c.map_or(0, Side::index)).collect())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn discs_stack_from_the_bottom() {
        let mut board = Board::default();
        assert_eq!(board.drop_disc(3, Side::One), Ok(ROWS - 1));
        assert_eq!(board.drop_disc(3, Side::Two), Ok(ROWS - 2));
        assert_eq!(board.cell(ROWS - 1, 3), Some(Side::One));
        assert_eq!(board.cell(ROWS - 2, 3), Some(Side::Two));
    }

    #[test]
    fn column_accepts_at_most_six_discs() {
        let mut board = Board::default();
        for _ in 0..ROWS {
            assert!(board.drop_disc(0, Side::One).is_ok());
        }
        assert_eq!(board.drop_disc(0, Side::One), Err(super::super::GameError::ColumnFull));
        assert!(!board.valid_columns().contains(&0));
    }

    #[test]
    fn out_of_range_column_rejected() {
        let mut board = Board::default();
        assert_eq!(
            board.drop_disc(COLS, Side::One),
            Err(super::super::GameError::InvalidColumn)
        );
    }

    #[test]
    fn undo_restores_prior_state() {
        let mut board = Board::default();
        board.drop_disc(2, Side::One).unwrap();
        board.drop_disc(2, Side::Two).unwrap();
        let before = board.clone();
        board.drop_disc(2, Side::One).unwrap();
        board.undo(2);
        assert_eq!(board, before);
    }

    #[test]
    fn empty_board_has_no_winner() {
        let board = Board::default();
        assert!(!board.check_win(Side::One));
        assert!(!board.check_win(Side::Two));
    }

    #[test]
    fn horizontal_win_detected() {
        let mut board = Board::default();
        for col in 0..4 {
            board.drop_disc(col, Side::One).unwrap();
        }
        assert!(board.check_win(Side::One));
        assert!(!board.check_win(Side::Two));
    }

    #[test]
    fn vertical_win_detected() {
        let mut board = Board::default();
        for _ in 0..4 {
            board.drop_disc(5, Side::Two).unwrap();
        }
        assert!(board.check_win(Side::Two));
        assert!(!board.check_win(Side::One));
    }

    #[test]
    fn diagonal_win_detected() {
        let mut board = Board::default();
        // staircase: P1 on the diagonal, P2 as filler underneath
        for (col, height) in (0..4).zip(0..4) {
            for _ in 0..height {
                board.drop_disc(col, Side::Two).unwrap();
            }
            board.drop_disc(col, Side::One).unwrap();
        }
        assert!(board.check_win(Side::One));
    }

    #[test]
    fn three_in_a_row_is_not_a_win() {
        let mut board = Board::default();
        for col in 0..3 {
            board.drop_disc(col, Side::One).unwrap();
        }
        assert!(!board.check_win(Side::One));
    }

    #[test]
    fn validity_tracks_range_and_fullness() {
        let mut board = Board::default();
        assert!(board.is_valid(0));
        assert!(!board.is_valid(COLS));
        for _ in 0..ROWS {
            board.drop_disc(0, Side::One).unwrap();
        }
        assert!(!board.is_valid(0));
        assert_eq!(board.drop_disc(0, Side::Two), Err(super::super::GameError::ColumnFull));
    }

    #[test]
    fn valid_columns_shrink_as_columns_fill() {
        let mut board = Board::default();
        assert_eq!(board.valid_columns(), (0..COLS).collect::<Vec<_>>());
        for _ in 0..ROWS {
            board.drop_disc(3, Side::One).unwrap();
        }
        assert_eq!(board.valid_columns(), vec![0, 1, 2, 4, 5, 6]);
        assert!(!board.is_full());
    }

    #[test]
    fn row_dump_uses_wire_values() {
        let mut board = Board::default();
        board.drop_disc(0, Side::One).unwrap();
        board.drop_disc(1, Side::Two).unwrap();
        let rows = board.to_rows();
        assert_eq!(rows[ROWS - 1][0], 1);
        assert_eq!(rows[ROWS - 1][1], 2);
        assert_eq!(rows[0][0], 0);
    }
}
