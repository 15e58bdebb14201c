use std::collections::VecDeque;

use rand::SeedableRng;
use rand::rngs::SmallRng;
use serde::{Deserialize, Serialize};

use crate::*;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionOutcome {
    Won,
    Lost,
}

/// Notification for the renderer/HUD, buffered in mutation order and
/// consumed with [`Session::drain_events`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionEvent {
    CellChanged {
        coords: Coord2,
        state: CellState,
        solution: i8,
    },
    Ended(SessionOutcome),
}

/// Outcome of a left click.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum RevealOutcome {
    NoChange,
    Revealed,
    HitMine,
    Won,
}

impl RevealOutcome {
    /// Whether this outcome could have caused an update to the game.
    pub const fn has_update(self) -> bool {
        !matches!(self, Self::NoChange)
    }
}

/// Outcome of a right click.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum MarkOutcome {
    NoChange,
    Changed,
}

impl MarkOutcome {
    pub const fn has_update(self) -> bool {
        matches!(self, Self::Changed)
    }
}

/// One game in progress: a board plus the reveal/mark counters and the
/// terminal flag. Input arriving after the game ended is ignored, so the
/// host never has to tear down its event wiring in lockstep.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Session {
    config: GameConfig,
    board: Board,
    revealed_count: CellCount,
    flagged_count: CellCount,
    questioned_count: CellCount,
    outcome: Option<SessionOutcome>,
    events: Vec<SessionEvent>,
}

impl Session {
    /// Fresh session with a randomly generated board.
    pub fn new(config: GameConfig) -> Result<Self> {
        Ok(Self::with_board(Board::generate(config, &mut rand::rng())?))
    }

    /// Deterministic session, for replays and tests.
    pub fn from_seed(config: GameConfig, seed: u64) -> Result<Self> {
        let mut rng = SmallRng::seed_from_u64(seed);
        Ok(Self::with_board(Board::generate(config, &mut rng)?))
    }

    /// Adopts an already-generated board.
    pub fn with_board(board: Board) -> Self {
        Self {
            config: GameConfig::new_unchecked(board.size(), board.mine_count()),
            board,
            revealed_count: 0,
            flagged_count: 0,
            questioned_count: 0,
            outcome: None,
            events: Vec::new(),
        }
    }

    /// Reveals the cell under the cursor.
    ///
    /// No-op on revealed and flagged cells; question-marked cells are fair
    /// game. A mine ends the game in a loss. A zero cell cascades through
    /// its whole zero region plus the first ring of numbered cells.
    pub fn left_click(&mut self, coords: Coord2) -> Result<RevealOutcome> {
        if self.outcome.is_some() {
            return Ok(RevealOutcome::NoChange);
        }
        let coords = self.board.validate_coords(coords)?;

        let cell = self.board[coords];
        if cell.state.blocks_reveal() {
            return Ok(RevealOutcome::NoChange);
        }
        if cell.state == CellState::Questioned {
            self.questioned_count -= 1;
        }
        self.set_revealed(coords);

        if cell.is_mine() {
            self.end(SessionOutcome::Lost);
            return Ok(RevealOutcome::HitMine);
        }

        self.revealed_count += 1;
        if cell.solution == 0 {
            self.cascade_from(coords);
        }

        if self.revealed_count == self.board.safe_cell_count() {
            self.end(SessionOutcome::Won);
            Ok(RevealOutcome::Won)
        } else {
            Ok(RevealOutcome::Revealed)
        }
    }

    /// Cycles the marking on the cell under the cursor:
    /// `Hidden -> Flagged -> Questioned -> Hidden`. No-op on revealed cells.
    pub fn right_click(&mut self, coords: Coord2) -> Result<MarkOutcome> {
        if self.outcome.is_some() {
            return Ok(MarkOutcome::NoChange);
        }
        let coords = self.board.validate_coords(coords)?;

        let state = self.board[coords].state;
        match state {
            CellState::Revealed => return Ok(MarkOutcome::NoChange),
            CellState::Hidden => self.flagged_count += 1,
            CellState::Flagged => {
                self.flagged_count -= 1;
                self.questioned_count += 1;
            }
            CellState::Questioned => self.questioned_count -= 1,
        }

        let cell = self.board.cell_mut(coords);
        cell.state = state.next_mark();
        let snapshot = *cell;
        self.events.push(SessionEvent::CellChanged {
            coords,
            state: snapshot.state,
            solution: snapshot.solution,
        });
        Ok(MarkOutcome::Changed)
    }

    /// Discards the board, counters, and pending events, and re-arms input
    /// with the same configuration.
    pub fn restart(&mut self) -> Result<()> {
        self.restart_with(self.config)
    }

    /// Same as [`Session::restart`] with new dimensions or mine count.
    pub fn restart_with(&mut self, config: GameConfig) -> Result<()> {
        *self = Self::with_board(Board::generate(config, &mut rand::rng())?);
        Ok(())
    }

    /// Takes the buffered notifications accumulated since the last drain.
    pub fn drain_events(&mut self) -> Vec<SessionEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn config(&self) -> GameConfig {
        self.config
    }

    pub fn cell_at(&self, coords: Coord2) -> Result<Cell> {
        self.board.cell_at(coords)
    }

    pub fn outcome(&self) -> Option<SessionOutcome> {
        self.outcome
    }

    pub fn is_finished(&self) -> bool {
        self.outcome.is_some()
    }

    pub fn revealed_count(&self) -> CellCount {
        self.revealed_count
    }

    pub fn flagged_count(&self) -> CellCount {
        self.flagged_count
    }

    pub fn questioned_count(&self) -> CellCount {
        self.questioned_count
    }

    /// Mines minus flags, the HUD's "remaining mines" counter. Negative
    /// when the player over-flags.
    pub fn mines_left(&self) -> isize {
        (self.board.mine_count() as isize) - (self.flagged_count as isize)
    }

    /// Breadth-first flood fill from a zero cell: every currently hidden
    /// neighbor is revealed (and counted) exactly once, and only zero cells
    /// are expanded further, so the fill stops at the first numbered ring
    /// while still revealing it.
    fn cascade_from(&mut self, start: Coord2) {
        let mut frontier = VecDeque::from([start]);
        while let Some(coords) = frontier.pop_front() {
            for pos in self.board.iter_neighbors(coords) {
                let cell = self.board[pos];
                if cell.state != CellState::Hidden {
                    continue;
                }
                self.set_revealed(pos);
                self.revealed_count += 1;
                if cell.solution == 0 {
                    frontier.push_back(pos);
                }
            }
        }
    }

    fn set_revealed(&mut self, coords: Coord2) {
        let cell = self.board.cell_mut(coords);
        cell.state = CellState::Revealed;
        let snapshot = *cell;
        self.events.push(SessionEvent::CellChanged {
            coords,
            state: snapshot.state,
            solution: snapshot.solution,
        });
    }

    fn end(&mut self, outcome: SessionOutcome) {
        self.outcome = Some(outcome);
        self.events.push(SessionEvent::Ended(outcome));
    }
}
