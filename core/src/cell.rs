use serde::{Deserialize, Serialize};

/// `solution` value marking a cell as a mine.
pub const MINE: i8 = -1;

/// Player-visible marking state of a single cell.
///
/// `Revealed` is terminal. The other three form the right-click cycle
/// `Hidden -> Flagged -> Questioned -> Hidden`.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum CellState {
    #[default]
    Hidden,
    Revealed,
    Flagged,
    Questioned,
}

impl CellState {
    pub const fn is_revealed(self) -> bool {
        matches!(self, Self::Revealed)
    }

    /// Whether a left click on a cell in this state is a no-op.
    /// Flags protect against accidental reveal; question marks do not.
    pub const fn blocks_reveal(self) -> bool {
        matches!(self, Self::Revealed | Self::Flagged)
    }

    /// Next state in the right-click cycle. `Revealed` never leaves.
    pub const fn next_mark(self) -> Self {
        match self {
            Self::Hidden => Self::Flagged,
            Self::Flagged => Self::Questioned,
            Self::Questioned => Self::Hidden,
            Self::Revealed => Self::Revealed,
        }
    }
}

/// One grid position: a solution value fixed at board generation plus the
/// mutable marking state.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cell {
    /// `-1` for a mine, otherwise the number of mines among the up-to-8
    /// neighbors (`0..=8`). Never changes after `Board` generation.
    pub solution: i8,
    pub state: CellState,
}

impl Cell {
    pub const fn is_mine(&self) -> bool {
        self.solution == MINE
    }

    /// Adjacent-mine count for a safe cell, `None` for a mine.
    pub const fn adjacent_mines(&self) -> Option<u8> {
        if self.solution >= 0 {
            Some(self.solution as u8)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mark_cycle_returns_to_hidden_after_three_steps() {
        let mut state = CellState::Hidden;
        state = state.next_mark();
        assert_eq!(state, CellState::Flagged);
        state = state.next_mark();
        assert_eq!(state, CellState::Questioned);
        state = state.next_mark();
        assert_eq!(state, CellState::Hidden);
    }

    #[test]
    fn revealed_is_terminal_under_marking() {
        assert_eq!(CellState::Revealed.next_mark(), CellState::Revealed);
    }

    #[test]
    fn only_revealed_and_flagged_block_reveal() {
        assert!(CellState::Revealed.blocks_reveal());
        assert!(CellState::Flagged.blocks_reveal());
        assert!(!CellState::Hidden.blocks_reveal());
        assert!(!CellState::Questioned.blocks_reveal());
    }

    #[test]
    fn mine_cell_has_no_adjacency_value() {
        let mine = Cell {
            solution: MINE,
            state: CellState::Hidden,
        };
        assert!(mine.is_mine());
        assert_eq!(mine.adjacent_mines(), None);

        let safe = Cell {
            solution: 3,
            state: CellState::Hidden,
        };
        assert_eq!(safe.adjacent_mines(), Some(3));
    }
}
