use std::ops::Index;

use ndarray::Array2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::*;

/// Rectangular grid of cells plus the mine layout baked into their
/// `solution` values. Mines are placed exactly once, at construction;
/// afterwards the board only answers coordinate-addressed queries and
/// lets the owning session flip cell states.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Board {
    cells: Array2<Cell>,
    mine_count: CellCount,
}

impl Board {
    fn blank(size: Coord2) -> Result<Self> {
        if size.0 == 0 || size.1 == 0 {
            return Err(GameError::InvalidDimensions);
        }
        Ok(Self {
            cells: Array2::default(size.to_nd_index()),
            mine_count: 0,
        })
    }

    /// Builds a board and places `config.mines` mines at random.
    ///
    /// Sparse boards use rejection sampling: draw a uniform cell, retry only
    /// when it already holds a mine. Past half density the expected retry
    /// count degrades, so placement switches to a uniform draw over the
    /// remaining free cells instead.
    pub fn generate(config: GameConfig, rng: &mut impl Rng) -> Result<Self> {
        config.validate()?;
        let mut board = Self::blank(config.size)?;

        if config.mines.saturating_mul(2) > board.total_cells() {
            board.place_mines_dense(config.mines, rng);
        } else {
            board.place_mines_sparse(config.mines, rng);
        }

        // double check mine count
        let planted = board.cells.iter().filter(|cell| cell.is_mine()).count();
        if planted != usize::from(config.mines) {
            log::warn!(
                "mine placement mismatch, planted {planted}, requested {}",
                config.mines
            );
        }

        board.mine_count = config.mines;
        Ok(board)
    }

    /// Builds a board with mines at the given coordinates. A coordinate
    /// listed twice is accepted once, same as the random draw's collision
    /// test; `mine_count` records what was actually planted.
    pub fn with_mines(size: Coord2, mine_coords: &[Coord2]) -> Result<Self> {
        let mut board = Self::blank(size)?;

        let mut planted: CellCount = 0;
        for &coords in mine_coords {
            board.validate_coords(coords)?;
            if board[coords].is_mine() {
                continue;
            }
            board.plant(coords);
            planted += 1;
        }

        if planted == 0 || planted >= board.total_cells() {
            return Err(GameError::InvalidMineCount);
        }
        board.mine_count = planted;
        Ok(board)
    }

    fn place_mines_sparse(&mut self, mines: CellCount, rng: &mut impl Rng) {
        let (columns, rows) = self.size();
        for _ in 0..mines {
            let coords = loop {
                let pick = (rng.random_range(0..columns), rng.random_range(0..rows));
                if !self[pick].is_mine() {
                    break pick;
                }
            };
            self.plant(coords);
        }
    }

    fn place_mines_dense(&mut self, mines: CellCount, rng: &mut impl Rng) {
        log::debug!("board is more than half mines, placing by free-cell scan");
        let mut free = self.total_cells();
        for _ in 0..mines {
            let coords = self.nth_free_cell(rng.random_range(0..free));
            self.plant(coords);
            free -= 1;
        }
    }

    fn nth_free_cell(&self, n: CellCount) -> Coord2 {
        let mut remaining = n;
        for ((x, y), cell) in self.cells.indexed_iter() {
            if cell.is_mine() {
                continue;
            }
            if remaining == 0 {
                return (x as Coord, y as Coord);
            }
            remaining -= 1;
        }
        unreachable!("free-cell index past the number of free cells")
    }

    /// Converts `coords` into a mine. The safe neighbors are incremented
    /// first and the cell is marked second, so two adjacent mines never
    /// count each other.
    fn plant(&mut self, coords: Coord2) {
        for pos in self.cells.iter_neighbors(coords) {
            let neighbor = &mut self.cells[pos.to_nd_index()];
            if neighbor.solution >= 0 {
                neighbor.solution += 1;
            }
        }
        self.cells[coords.to_nd_index()].solution = MINE;
    }

    pub fn size(&self) -> Coord2 {
        let dim = self.cells.dim();
        (dim.0.try_into().unwrap(), dim.1.try_into().unwrap())
    }

    pub fn columns(&self) -> Coord {
        self.size().0
    }

    pub fn rows(&self) -> Coord {
        self.size().1
    }

    pub fn mine_count(&self) -> CellCount {
        self.mine_count
    }

    pub fn total_cells(&self) -> CellCount {
        self.cells.len().try_into().unwrap()
    }

    pub fn safe_cell_count(&self) -> CellCount {
        self.total_cells() - self.mine_count
    }

    pub fn validate_coords(&self, coords: Coord2) -> Result<Coord2> {
        let size = self.size();
        if coords.0 < size.0 && coords.1 < size.1 {
            Ok(coords)
        } else {
            Err(GameError::OutOfBounds)
        }
    }

    /// Bounds-checked copy-out lookup.
    pub fn cell_at(&self, coords: Coord2) -> Result<Cell> {
        self.validate_coords(coords).map(|coords| self[coords])
    }

    pub(crate) fn cell_mut(&mut self, coords: Coord2) -> &mut Cell {
        &mut self.cells[coords.to_nd_index()]
    }

    pub fn iter_neighbors(&self, coords: Coord2) -> NeighborIter {
        self.cells.iter_neighbors(coords)
    }
}

impl Index<Coord2> for Board {
    type Output = Cell;

    fn index(&self, coords: Coord2) -> &Self::Output {
        &self.cells[coords.to_nd_index()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    fn generate(size: Coord2, mines: CellCount, seed: u64) -> Board {
        let config = GameConfig::new(size, mines).unwrap();
        Board::generate(config, &mut SmallRng::seed_from_u64(seed)).unwrap()
    }

    fn assert_layout_consistent(board: &Board) {
        let (columns, rows) = board.size();
        let mut mines = 0;
        for x in 0..columns {
            for y in 0..rows {
                let cell = board[(x, y)];
                if cell.is_mine() {
                    mines += 1;
                    continue;
                }
                let adjacent = board
                    .iter_neighbors((x, y))
                    .filter(|&pos| board[pos].is_mine())
                    .count();
                assert_eq!(
                    cell.solution as usize,
                    adjacent,
                    "bad adjacency at ({x}, {y})"
                );
            }
        }
        assert_eq!(mines, board.mine_count());
    }

    #[test]
    fn generated_boards_have_exact_counts_and_adjacency() {
        for seed in 0..8 {
            assert_layout_consistent(&generate((9, 9), 10, seed));
        }
    }

    #[test]
    fn dense_boards_use_the_scan_and_stay_consistent() {
        // 14 of 16 cells mined, well past the rejection-sampling threshold
        for seed in 0..8 {
            let board = generate((4, 4), 14, seed);
            assert_layout_consistent(&board);
            assert_eq!(board.safe_cell_count(), 2);
        }
    }

    #[test]
    fn generation_is_reproducible_from_a_seed() {
        assert_eq!(generate((16, 16), 40, 7), generate((16, 16), 40, 7));
    }

    #[test]
    fn center_mine_surrounds_itself_with_ones() {
        let board = Board::with_mines((3, 3), &[(1, 1)]).unwrap();
        for x in 0..3 {
            for y in 0..3 {
                if (x, y) == (1, 1) {
                    assert!(board[(x, y)].is_mine());
                } else {
                    assert_eq!(board[(x, y)].solution, 1);
                }
            }
        }
    }

    #[test]
    fn adjacent_mines_do_not_count_each_other() {
        let board = Board::with_mines((3, 1), &[(0, 0), (1, 0)]).unwrap();
        assert_eq!(board[(0, 0)].solution, MINE);
        assert_eq!(board[(1, 0)].solution, MINE);
        assert_eq!(board[(2, 0)].solution, 1);
    }

    #[test]
    fn duplicate_mine_coords_plant_once() {
        let board = Board::with_mines((3, 3), &[(1, 1), (1, 1)]).unwrap();
        assert_eq!(board.mine_count(), 1);
        assert_eq!(board[(0, 0)].solution, 1);
    }

    #[test]
    fn invalid_configs_are_rejected() {
        assert_eq!(
            GameConfig::new((0, 5), 1).unwrap_err(),
            GameError::InvalidDimensions
        );
        assert_eq!(
            GameConfig::new((3, 3), 0).unwrap_err(),
            GameError::InvalidMineCount
        );
        assert_eq!(
            GameConfig::new((3, 3), 9).unwrap_err(),
            GameError::InvalidMineCount
        );
        // a full board sneaks past new_unchecked but not past generate
        let config = GameConfig::new_unchecked((2, 2), 4);
        assert_eq!(
            Board::generate(config, &mut SmallRng::seed_from_u64(0)).unwrap_err(),
            GameError::InvalidMineCount
        );
    }

    #[test]
    fn lookups_outside_the_grid_fail() {
        let board = Board::with_mines((3, 3), &[(1, 1)]).unwrap();
        assert_eq!(board.cell_at((3, 0)).unwrap_err(), GameError::OutOfBounds);
        assert_eq!(board.cell_at((0, 3)).unwrap_err(), GameError::OutOfBounds);
        assert!(board.cell_at((2, 2)).is_ok());
    }
}
