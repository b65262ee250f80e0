use crate::*;
pub use random::*;

mod random;

/// Source of the permutation used to pick mine positions.
///
/// Implementations must apply a uniform random permutation to `cells` for the
/// placement to be an unbiased sample. Tests may supply a scripted order to
/// pin an exact layout.
pub trait RandomSource: Send {
    fn shuffle(&mut self, cells: &mut [Coord2]);
}

impl<R: RandomSource + ?Sized> RandomSource for Box<R> {
    fn shuffle(&mut self, cells: &mut [Coord2]) {
        (**self).shuffle(cells)
    }
}

/// Lays `config.mines` mines on a fresh `board`, keeping `start` and its
/// neighbors clear, and recomputes adjacency counts.
///
/// `config` must have been validated, so the candidate set is always large
/// enough; on a shortfall every candidate becomes a mine.
pub fn place_mines(
    board: &mut Board,
    config: GameConfig,
    start: Coord2,
    source: &mut dyn RandomSource,
) -> CellCount {
    let excluded = safe_zone(start, board.bounds());
    let mut candidates: Vec<Coord2> = board
        .iter()
        .map(|tile| tile.coords())
        .filter(|coords| !excluded.contains(coords))
        .collect();

    let wanted = usize::try_from(config.mines).unwrap_or(usize::MAX);
    if wanted > candidates.len() {
        log::warn!(
            "Not enough room for mines, requested {} but only {} tiles are eligible",
            config.mines,
            candidates.len()
        );
    }

    source.shuffle(&mut candidates);
    candidates.truncate(wanted);
    board.lay_mines(candidates.iter().copied());

    let placed = board.mine_count();
    log::debug!(
        "Placed {} mines around safe start {:?} ({} tiles excluded)",
        placed,
        start,
        excluded.len()
    );
    placed
}
