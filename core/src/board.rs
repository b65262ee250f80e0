use std::collections::VecDeque;
use std::ops::{Index, IndexMut};

use hashbrown::HashSet;
use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::*;

/// Rectangular grid of tiles stored row-major.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Board {
    rows: Coord,
    cols: Coord,
    tiles: Array2<Tile>,
}

impl Board {
    /// All-hidden, mine-free board.
    pub fn new(rows: Coord, cols: Coord) -> Self {
        let tiles = Array2::from_shape_fn((usize::from(rows), usize::from(cols)), |(y, x)| {
            Tile::hidden((x as Coord, y as Coord))
        });
        Self { rows, cols, tiles }
    }

    pub fn rows(&self) -> Coord {
        self.rows
    }

    pub fn cols(&self) -> Coord {
        self.cols
    }

    /// `(cols, rows)`, the exclusive upper bound of `(x, y)` coordinates.
    pub fn bounds(&self) -> Coord2 {
        (self.cols, self.rows)
    }

    pub fn total_tiles(&self) -> CellCount {
        mult(self.rows, self.cols)
    }

    pub fn contains(&self, (x, y): Coord2) -> bool {
        x < self.cols && y < self.rows
    }

    pub fn get(&self, coords: Coord2) -> Option<&Tile> {
        self.tiles.get(coords.to_nd_index())
    }

    /// Tiles in row-major order.
    pub fn iter(&self) -> impl Iterator<Item = &Tile> {
        self.tiles.iter()
    }

    pub fn iter_neighbors(&self, coords: Coord2) -> NeighborIter {
        NeighborIter::new(coords, self.bounds())
    }

    pub fn mine_count(&self) -> CellCount {
        self.count_where(|tile| tile.is_mine)
    }

    /// Non-mine tiles that are still unrevealed; the game is won when this hits 0.
    pub fn hidden_safe_count(&self) -> CellCount {
        self.count_where(|tile| tile.is_hidden_safe())
    }

    pub fn adjacent_mine_count(&self, coords: Coord2) -> u8 {
        self.count_neighbors_where(coords, |tile| tile.is_mine)
    }

    pub fn flagged_neighbor_count(&self, coords: Coord2) -> u8 {
        self.count_neighbors_where(coords, |tile| tile.is_flagged)
    }

    /// First hidden, unflagged, non-mine tile in row-major order.
    pub fn first_openable_safe(&self) -> Option<Coord2> {
        self.tiles
            .iter()
            .find(|tile| !tile.is_mine && tile.is_openable())
            .map(|tile| tile.coords())
    }

    /// Marks the given tiles as mines and recomputes every adjacency count.
    pub(crate) fn lay_mines(&mut self, mines: impl IntoIterator<Item = Coord2>) {
        for coords in mines {
            self[coords].is_mine = true;
        }
        self.recompute_adjacency();
    }

    pub(crate) fn recompute_adjacency(&mut self) {
        for y in 0..self.rows {
            for x in 0..self.cols {
                let coords = (x, y);
                let count = if self[coords].is_mine {
                    0
                } else {
                    self.adjacent_mine_count(coords)
                };
                self[coords].adjacent_mines = count;
            }
        }
    }

    /// Breadth-first reveal starting at `start`, returns how many tiles were opened.
    ///
    /// Revealed and flagged tiles are skipped, zero tiles spread to all of their
    /// neighbors, numbered tiles are opened but stop the expansion.
    pub(crate) fn flood_reveal(&mut self, start: Coord2) -> CellCount {
        let bounds = self.bounds();
        let mut opened = 0;
        let mut visited = HashSet::new();
        visited.insert(start);
        let mut to_visit = VecDeque::from([start]);

        while let Some(coords) = to_visit.pop_front() {
            let tile = &mut self[coords];
            if tile.is_revealed || tile.is_flagged {
                log::trace!("Skipping tile at {:?}", coords);
                continue;
            }

            tile.is_revealed = true;
            opened += 1;
            log::trace!(
                "Flood opened tile at {:?}, mine count: {}",
                coords,
                tile.adjacent_mines
            );

            if !tile.is_mine && tile.adjacent_mines == 0 {
                for neighbor in NeighborIter::new(coords, bounds) {
                    if visited.insert(neighbor) {
                        to_visit.push_back(neighbor);
                    }
                }
            }
        }

        opened
    }

    /// Reveals every mine, leaving non-mine tiles untouched.
    pub(crate) fn reveal_all_mines(&mut self) {
        for tile in self.tiles.iter_mut().filter(|tile| tile.is_mine) {
            tile.is_revealed = true;
        }
    }

    fn count_where(&self, predicate: impl Fn(&Tile) -> bool) -> CellCount {
        self.tiles
            .iter()
            .filter(|tile| predicate(tile))
            .count()
            .try_into()
            .unwrap_or(CellCount::MAX)
    }

    fn count_neighbors_where(&self, coords: Coord2, predicate: impl Fn(&Tile) -> bool) -> u8 {
        self.iter_neighbors(coords)
            .filter(|&pos| predicate(&self[pos]))
            .count()
            .try_into()
            .unwrap_or(u8::MAX)
    }
}

impl Index<Coord2> for Board {
    type Output = Tile;

    fn index(&self, coords: Coord2) -> &Self::Output {
        &self.tiles[coords.to_nd_index()]
    }
}

impl IndexMut<Coord2> for Board {
    fn index_mut(&mut self, coords: Coord2) -> &mut Self::Output {
        &mut self.tiles[coords.to_nd_index()]
    }
}
