use serde::Serialize;

use crate::blueprint::BuildingKind;
use crate::city::error::CityError;

pub const GRID_SIZE: usize = 10;

pub type Cell = Option<BuildingKind>;

/// A coordinate that is known to lie on the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Position {
    row: usize,
    col: usize,
}

impl Position {
    pub fn new(row: usize, col: usize) -> Result<Self, CityError> {
        if row >= GRID_SIZE || col >= GRID_SIZE {
            return Err(CityError::OutOfBounds { row, col });
        }
        Ok(Self { row, col })
    }

    pub fn row(&self) -> usize {
        self.row
    }

    pub fn col(&self) -> usize {
        self.col
    }

    pub fn all() -> impl Iterator<Item = Position> {
        (0..GRID_SIZE).flat_map(|row| (0..GRID_SIZE).map(move |col| Position { row, col }))
    }
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grid {
    cells: [[Cell; GRID_SIZE]; GRID_SIZE],
    selection: Option<Position>,
}

impl Grid {
    pub fn new() -> Self {
        Self {
            cells: [[None; GRID_SIZE]; GRID_SIZE],
            selection: None,
        }
    }

    /// Builds a grid from placements in order; a later placement on the same
    /// cell replaces the earlier one.
    pub fn from_placements(placements: impl IntoIterator<Item = (Position, BuildingKind)>) -> Self {
        let mut grid = Self::new();
        for (position, kind) in placements {
            grid.set(position, Some(kind));
        }
        grid
    }

    pub fn get(&self, position: Position) -> Cell {
        self.cells[position.row][position.col]
    }

    pub(crate) fn set(&mut self, position: Position, content: Cell) {
        self.cells[position.row][position.col] = content;
    }

    pub fn select(&mut self, position: Position) {
        self.selection = Some(position);
    }

    pub fn clear_selection(&mut self) {
        self.selection = None;
    }

    pub fn selection(&self) -> Option<Position> {
        self.selection
    }

    pub fn iter(&self) -> impl Iterator<Item = (Position, Cell)> + '_ {
        Position::all().map(|position| (position, self.get(position)))
    }

    pub fn occupied(&self) -> usize {
        self.iter().filter(|(_, cell)| cell.is_some()).count()
    }

    /// Row-major icons, `None` for empty cells.
    pub fn icons(&self) -> Vec<Vec<Option<&'static str>>> {
        self.cells
            .iter()
            .map(|row| row.iter().map(|cell| cell.map(BuildingKind::icon)).collect())
            .collect()
    }
}

impl Default for Grid {
    fn default() -> Self {
        Self::new()
    }
}
