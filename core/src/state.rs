use core::fmt;
use core::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::*;

/// Valid transitions:
/// - Ready -> Playing
/// - Playing -> Won
/// - Playing -> Lost
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameStatus {
    /// Board laid out, no mines placed yet
    #[default]
    Ready,
    /// Mines placed, clock running
    Playing,
    Won,
    Lost,
}

impl GameStatus {
    pub const fn is_ready(self) -> bool {
        matches!(self, Self::Ready)
    }

    pub const fn is_playing(self) -> bool {
        matches!(self, Self::Playing)
    }

    /// Indicates the game has ended and no moves can be made anymore
    pub const fn is_finished(self) -> bool {
        matches!(self, Self::Won | Self::Lost)
    }
}

#[derive(
    Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum Difficulty {
    #[default]
    Beginner,
    Intermediate,
    Expert,
    Custom,
}

impl Difficulty {
    pub const ALL: [Difficulty; 4] = [
        Self::Beginner,
        Self::Intermediate,
        Self::Expert,
        Self::Custom,
    ];

    /// Board for the named presets, `None` for `Custom`.
    pub const fn preset(self) -> Option<GameConfig> {
        match self {
            Self::Beginner => Some(GameConfig::BEGINNER),
            Self::Intermediate => Some(GameConfig::INTERMEDIATE),
            Self::Expert => Some(GameConfig::EXPERT),
            Self::Custom => None,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::Beginner => "Beginner",
            Self::Intermediate => "Intermediate",
            Self::Expert => "Expert",
            Self::Custom => "Custom",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Difficulty {
    type Err = GameError;

    fn from_str(s: &str) -> Result<Self> {
        let name = s.trim();
        Self::ALL
            .into_iter()
            .find(|difficulty| difficulty.name().eq_ignore_ascii_case(name))
            .ok_or_else(|| GameError::UnknownDifficulty(name.into()))
    }
}

/// Board dimensions and mine count, validated so a safe first click always exists.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameConfig {
    pub rows: Coord,
    pub cols: Coord,
    pub mines: CellCount,
}

impl GameConfig {
    pub const BEGINNER: Self = Self::new_unchecked(9, 9, 10);
    pub const INTERMEDIATE: Self = Self::new_unchecked(16, 16, 40);
    pub const EXPERT: Self = Self::new_unchecked(16, 30, 99);

    pub const fn new_unchecked(rows: Coord, cols: Coord, mines: CellCount) -> Self {
        Self { rows, cols, mines }
    }

    pub fn new(rows: Coord, cols: Coord, mines: CellCount) -> Result<Self> {
        if rows == 0 || cols == 0 {
            return Err(GameError::InvalidDimensions { rows, cols });
        }

        let max = max_mines(rows, cols);
        if mines > max {
            return Err(GameError::TooManyMines {
                requested: mines,
                max,
            });
        }

        Ok(Self::new_unchecked(rows, cols, mines))
    }

    pub const fn total_tiles(&self) -> CellCount {
        mult(self.rows, self.cols)
    }
}

/// Most mines a `rows`x`cols` board can hold while any first click keeps its
/// whole neighborhood clear.
pub const fn max_mines(rows: Coord, cols: Coord) -> CellCount {
    let zone_rows = if rows < 3 { rows } else { 3 };
    let zone_cols = if cols < 3 { cols } else { 3 };
    mult(rows, cols).saturating_sub(mult(zone_rows, zone_cols))
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub enum MarkOutcome {
    NoChange,
    Changed,
}

impl MarkOutcome {
    pub const fn has_update(self) -> bool {
        matches!(self, Self::Changed)
    }
}

/// Result of a reveal, chord or hint. Variants are ranked so that combining
/// the per-neighbor results of a chord keeps the most severe one.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum RevealOutcome {
    NoChange,
    Revealed,
    Won,
    HitMine,
}

impl RevealOutcome {
    pub const fn has_update(self) -> bool {
        !matches!(self, Self::NoChange)
    }
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub enum TickOutcome {
    /// Clock is running but the elapsed time did not move
    NoChange,
    Updated,
    /// The tick belongs to another game, or this game is not running
    Stale,
}

/// What a finished, won game hands to a best-time store.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Completion {
    pub difficulty: Difficulty,
    pub elapsed_ms: u64,
}

/// Full snapshot of one game at one point in time.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameState {
    board: Board,
    rows: Coord,
    cols: Coord,
    mines: CellCount,
    flags_placed: CellCount,
    mines_left: CellCount,
    status: GameStatus,
    first_click: bool,
    started_at: Option<DateTime<Utc>>,
    elapsed_ms: u64,
    difficulty: Difficulty,
    hints_left: u8,
    triggered_mine: Option<Coord2>,
    game_id: u64,
    version: u64,
}

impl GameState {
    pub(crate) fn new(config: GameConfig, difficulty: Difficulty, hints: u8, game_id: u64) -> Self {
        Self {
            board: Board::new(config.rows, config.cols),
            rows: config.rows,
            cols: config.cols,
            mines: config.mines,
            flags_placed: 0,
            mines_left: config.mines,
            status: GameStatus::Ready,
            first_click: true,
            started_at: None,
            elapsed_ms: 0,
            difficulty,
            hints_left: hints,
            triggered_mine: None,
            game_id,
            version: 0,
        }
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    /// Tile at `(x, y)`, `None` when out of bounds.
    pub fn tile(&self, coords: Coord2) -> Option<&Tile> {
        self.board.get(coords)
    }

    pub fn rows(&self) -> Coord {
        self.rows
    }

    pub fn cols(&self) -> Coord {
        self.cols
    }

    pub fn mines(&self) -> CellCount {
        self.mines
    }

    pub fn config(&self) -> GameConfig {
        GameConfig::new_unchecked(self.rows, self.cols, self.mines)
    }

    pub fn flags_placed(&self) -> CellCount {
        self.flags_placed
    }

    /// Mines minus flags, clamped at zero. Over-flagging can make this lower
    /// than the number of mines actually left unflagged.
    pub fn mines_left(&self) -> CellCount {
        self.mines_left
    }

    pub fn status(&self) -> GameStatus {
        self.status
    }

    pub fn is_finished(&self) -> bool {
        self.status.is_finished()
    }

    pub fn is_first_click(&self) -> bool {
        self.first_click
    }

    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    pub fn elapsed_ms(&self) -> u64 {
        self.elapsed_ms
    }

    pub fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    pub fn hints_left(&self) -> u8 {
        self.hints_left
    }

    /// The mine that ended a lost game.
    pub fn triggered_mine(&self) -> Option<Coord2> {
        self.triggered_mine
    }

    /// Changes on every new game, including restarts.
    pub fn game_id(&self) -> u64 {
        self.game_id
    }

    /// Changes on every committed transition.
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Final time of a won game, for an external best-time store.
    pub fn completion(&self) -> Option<Completion> {
        matches!(self.status, GameStatus::Won).then_some(Completion {
            difficulty: self.difficulty,
            elapsed_ms: self.elapsed_ms,
        })
    }

    pub(crate) fn bump_version(&mut self, previous: u64) {
        self.version = previous.wrapping_add(1);
    }

    pub(crate) fn reveal(
        &mut self,
        coords: Coord2,
        source: &mut dyn RandomSource,
        now: DateTime<Utc>,
    ) -> RevealOutcome {
        use RevealOutcome::*;

        if self.status.is_finished() {
            return NoChange;
        }

        match self.board.get(coords) {
            Some(tile) if tile.is_openable() => {}
            _ => return NoChange,
        }

        if self.first_click {
            self.start(coords, source, now);
        }

        if self.board[coords].is_mine {
            log::debug!("Mine hit at {:?}", coords);
            self.triggered_mine = Some(coords);
            self.board.reveal_all_mines();
            self.finish(GameStatus::Lost, now);
            return HitMine;
        }

        let opened = self.board.flood_reveal(coords);
        log::debug!("Revealed {} tiles from {:?}", opened, coords);
        self.check_won(now)
    }

    pub(crate) fn toggle_flag(&mut self, coords: Coord2) -> MarkOutcome {
        if self.status.is_finished() {
            return MarkOutcome::NoChange;
        }

        match self.board.get(coords) {
            Some(tile) if !tile.is_revealed => {}
            _ => return MarkOutcome::NoChange,
        }

        let tile = &mut self.board[coords];
        tile.is_flagged = !tile.is_flagged;
        if tile.is_flagged {
            self.flags_placed += 1;
        } else {
            self.flags_placed = self.flags_placed.saturating_sub(1);
        }
        self.mines_left = self.mines.saturating_sub(self.flags_placed);
        MarkOutcome::Changed
    }

    pub(crate) fn chord(&mut self, coords: Coord2, now: DateTime<Utc>) -> RevealOutcome {
        use RevealOutcome::*;

        if !self.status.is_playing() {
            return NoChange;
        }

        let count = match self.board.get(coords) {
            Some(tile) if tile.is_revealed && !tile.is_mine && tile.adjacent_mines > 0 => {
                tile.adjacent_mines
            }
            _ => return NoChange,
        };

        let flagged = self.board.flagged_neighbor_count(coords);
        if flagged != count {
            log::trace!(
                "Chord at {:?} refused, {} flags around a {}",
                coords,
                flagged,
                count
            );
            return NoChange;
        }

        let outcome = self
            .board
            .iter_neighbors(coords)
            .map(|neighbor| self.open_neighbor(neighbor))
            .fold(NoChange, Ord::max);

        match outcome {
            HitMine => {
                log::debug!("Chord at {:?} hit a misflagged mine", coords);
                self.board.reveal_all_mines();
                self.finish(GameStatus::Lost, now);
                HitMine
            }
            NoChange => NoChange,
            _ => self.check_won(now),
        }
    }

    pub(crate) fn use_hint(
        &mut self,
        source: &mut dyn RandomSource,
        now: DateTime<Utc>,
    ) -> RevealOutcome {
        if self.hints_left == 0 || self.status.is_finished() {
            return RevealOutcome::NoChange;
        }

        let Some(coords) = self.board.first_openable_safe() else {
            return RevealOutcome::NoChange;
        };

        let outcome = self.reveal(coords, source, now);
        if outcome.has_update() {
            self.hints_left -= 1;
            log::debug!("Hint opened {:?}, {} left", coords, self.hints_left);
        }
        outcome
    }

    pub(crate) fn tick(&mut self, now: DateTime<Utc>) -> TickOutcome {
        if !self.status.is_playing() {
            return TickOutcome::Stale;
        }

        let elapsed_ms = self.elapsed_at(now);
        if elapsed_ms == self.elapsed_ms {
            TickOutcome::NoChange
        } else {
            self.elapsed_ms = elapsed_ms;
            TickOutcome::Updated
        }
    }

    /// Opens one chord neighbor; a mine is revealed and reported, not yet fatal.
    fn open_neighbor(&mut self, coords: Coord2) -> RevealOutcome {
        let tile = self.board[coords];
        if !tile.is_openable() {
            return RevealOutcome::NoChange;
        }

        if tile.is_mine {
            self.board[coords].is_revealed = true;
            self.triggered_mine.get_or_insert(coords);
            RevealOutcome::HitMine
        } else {
            self.board.flood_reveal(coords);
            RevealOutcome::Revealed
        }
    }

    /// Lays the mines around the first click and starts the clock.
    fn start(&mut self, coords: Coord2, source: &mut dyn RandomSource, now: DateTime<Utc>) {
        let config = self.config();
        place_mines(&mut self.board, config, coords, source);
        self.first_click = false;
        self.status = GameStatus::Playing;
        self.started_at = Some(now);
        self.elapsed_ms = 0;
        log::debug!("Game {} started at {}", self.game_id, now);
    }

    fn check_won(&mut self, now: DateTime<Utc>) -> RevealOutcome {
        if self.board.hidden_safe_count() == 0 {
            self.finish(GameStatus::Won, now);
            RevealOutcome::Won
        } else {
            RevealOutcome::Revealed
        }
    }

    fn finish(&mut self, status: GameStatus, now: DateTime<Utc>) {
        self.elapsed_ms = self.elapsed_at(now);
        self.status = status;
        log::debug!(
            "Game {} ended {:?} after {} ms",
            self.game_id,
            status,
            self.elapsed_ms
        );
    }

    fn elapsed_at(&self, now: DateTime<Utc>) -> u64 {
        self.started_at
            .map(|started_at| (now - started_at).num_milliseconds())
            .and_then(|ms| u64::try_from(ms).ok())
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeDelta;

    use super::*;

    fn at(ms: i64) -> DateTime<Utc> {
        DateTime::<Utc>::UNIX_EPOCH + TimeDelta::milliseconds(ms)
    }

    // . . . .
    // . . . .
    // 1 1 1 1
    // * 1 1 *
    const BOTTOM_CORNERS: &[Coord2] = &[(3, 3), (0, 3)];

    fn game(rows: Coord, cols: Coord, mines: &[Coord2]) -> (GameState, ScriptedRandom) {
        let config = GameConfig::new(rows, cols, mines.len() as CellCount).unwrap();
        (
            GameState::new(config, Difficulty::Custom, 3, 1),
            ScriptedRandom::new(mines.to_vec()),
        )
    }

    #[test]
    fn config_rejects_empty_boards() {
        assert_eq!(
            GameConfig::new(0, 5, 0),
            Err(GameError::InvalidDimensions { rows: 0, cols: 5 })
        );
        assert!(GameConfig::new(5, 0, 0).is_err());
    }

    #[test]
    fn config_keeps_room_for_safe_first_click() {
        assert_eq!(max_mines(9, 9), 72);
        assert_eq!(max_mines(2, 2), 0);
        assert_eq!(max_mines(1, 10), 7);
        assert!(GameConfig::new(9, 9, 72).is_ok());
        assert_eq!(
            GameConfig::new(9, 9, 73),
            Err(GameError::TooManyMines {
                requested: 73,
                max: 72
            })
        );
    }

    #[test]
    fn presets_fit_their_boards() {
        for difficulty in Difficulty::ALL {
            if let Some(config) = difficulty.preset() {
                assert_eq!(GameConfig::new(config.rows, config.cols, config.mines), Ok(config));
            }
        }
        assert_eq!(Difficulty::Expert.preset().map(|c| (c.rows, c.cols)), Some((16, 30)));
    }

    #[test]
    fn difficulty_parses_case_insensitively() {
        assert_eq!(" expert ".parse::<Difficulty>(), Ok(Difficulty::Expert));
        assert_eq!("BEGINNER".parse::<Difficulty>(), Ok(Difficulty::Beginner));
        assert_eq!(
            "nightmare".parse::<Difficulty>(),
            Err(GameError::UnknownDifficulty("nightmare".into()))
        );
    }

    #[test]
    fn first_reveal_places_mines_and_starts() {
        let (mut state, mut source) = game(4, 4, BOTTOM_CORNERS);

        let outcome = state.reveal((0, 0), &mut source, at(1_000));

        assert_eq!(outcome, RevealOutcome::Revealed);
        assert_eq!(state.status(), GameStatus::Playing);
        assert!(!state.is_first_click());
        assert_eq!(state.started_at(), Some(at(1_000)));
        assert!(state.board()[(3, 3)].is_mine);
        assert!(!state.board()[(3, 3)].is_revealed);
    }

    #[test]
    fn hitting_a_mine_reveals_all_mines_and_loses() {
        let (mut state, mut source) = game(4, 4, &[(3, 3), (3, 0)]);
        state.reveal((0, 3), &mut source, at(0));

        let outcome = state.reveal((3, 3), &mut source, at(2_500));

        assert_eq!(outcome, RevealOutcome::HitMine);
        assert_eq!(state.status(), GameStatus::Lost);
        assert_eq!(state.triggered_mine(), Some((3, 3)));
        assert!(state.board()[(3, 0)].is_revealed);
        assert_eq!(state.elapsed_ms(), 2_500);
        assert_eq!(state.completion(), None);
    }

    #[test]
    fn finished_game_ignores_commands() {
        let (mut state, mut source) = game(3, 3, &[]);
        assert_eq!(state.reveal((1, 1), &mut source, at(0)), RevealOutcome::Won);

        let before = state.clone();
        assert_eq!(state.toggle_flag((0, 0)), MarkOutcome::NoChange);
        assert_eq!(state.chord((0, 0), at(5)), RevealOutcome::NoChange);
        assert_eq!(state.use_hint(&mut source, at(5)), RevealOutcome::NoChange);
        assert_eq!(state.tick(at(5)), TickOutcome::Stale);
        assert_eq!(state, before);
    }

    #[test]
    fn flags_clamp_mines_left() {
        let (mut state, _) = game(4, 4, &[(3, 3)]);

        assert_eq!(state.toggle_flag((0, 0)), MarkOutcome::Changed);
        assert_eq!(state.mines_left(), 0);
        assert_eq!(state.toggle_flag((1, 0)), MarkOutcome::Changed);
        assert_eq!(state.flags_placed(), 2);
        assert_eq!(state.mines_left(), 0);

        assert_eq!(state.toggle_flag((1, 0)), MarkOutcome::Changed);
        assert_eq!(state.toggle_flag((0, 0)), MarkOutcome::Changed);
        assert_eq!(state.flags_placed(), 0);
        assert_eq!(state.mines_left(), 1);
    }

    #[test]
    fn flag_ignores_revealed_and_out_of_bounds() {
        let (mut state, mut source) = game(4, 4, BOTTOM_CORNERS);
        state.reveal((0, 0), &mut source, at(0));

        assert_eq!(state.toggle_flag((0, 0)), MarkOutcome::NoChange);
        assert_eq!(state.toggle_flag((4, 0)), MarkOutcome::NoChange);
        assert_eq!(state.flags_placed(), 0);
    }

    #[test]
    fn chord_requires_exact_flag_count() {
        // 1 * 1 . .
        // 1 1 1 . .
        let (mut state, mut source) = game(2, 5, &[(1, 0)]);
        state.reveal((4, 1), &mut source, at(0));
        assert_eq!(state.status(), GameStatus::Playing);
        assert!(!state.board()[(0, 0)].is_revealed);

        assert_eq!(state.chord((2, 0), at(1)), RevealOutcome::NoChange);

        state.toggle_flag((1, 0));
        state.toggle_flag((1, 1));
        assert_eq!(state.chord((2, 0), at(1)), RevealOutcome::NoChange);

        state.toggle_flag((1, 1));
        assert_eq!(state.chord((2, 0), at(1)), RevealOutcome::Revealed);
        assert!(state.board()[(1, 1)].is_revealed);

        assert_eq!(state.chord((1, 1), at(1)), RevealOutcome::Won);
        assert!(state.board()[(0, 0)].is_revealed);
        assert!(state.board()[(0, 1)].is_revealed);
    }

    #[test]
    fn misflagged_chord_loses() {
        // * 1 . .
        // 1 1 . .
        // 1 1 . .
        // * 1 . .
        let (mut state, mut source) = game(4, 4, &[(0, 0), (0, 3)]);
        state.reveal((3, 1), &mut source, at(0));
        assert!(state.board()[(1, 1)].is_revealed);
        assert!(!state.board()[(0, 1)].is_revealed);

        state.toggle_flag((0, 1));
        let outcome = state.chord((1, 1), at(10));

        assert_eq!(outcome, RevealOutcome::HitMine);
        assert_eq!(state.status(), GameStatus::Lost);
        assert_eq!(state.triggered_mine(), Some((0, 0)));
        assert!(state.board()[(0, 3)].is_revealed);
    }

    #[test]
    fn chord_keeps_the_most_severe_outcome() {
        use RevealOutcome::*;

        let merged = |outcomes: &[RevealOutcome]| {
            outcomes.iter().copied().fold(NoChange, Ord::max)
        };

        assert_eq!(merged(&[]), NoChange);
        assert_eq!(merged(&[NoChange, Revealed, NoChange]), Revealed);
        assert_eq!(merged(&[Revealed, Won]), Won);
        assert_eq!(merged(&[Won, HitMine, Revealed]), HitMine);
    }

    #[test]
    fn chord_ignores_hidden_and_zero_tiles() {
        let (mut state, mut source) = game(3, 5, &[(4, 0), (4, 2)]);
        state.reveal((0, 2), &mut source, at(0));
        assert_eq!(state.status(), GameStatus::Playing);

        assert_eq!(state.chord((0, 0), at(1)), RevealOutcome::NoChange);
        assert_eq!(state.chord((4, 0), at(1)), RevealOutcome::NoChange);
        assert_eq!(state.chord((4, 1), at(1)), RevealOutcome::NoChange);
    }

    #[test]
    fn hint_before_first_click_places_mines() {
        let (mut state, mut source) = game(4, 4, BOTTOM_CORNERS);

        let outcome = state.use_hint(&mut source, at(0));

        assert_eq!(outcome, RevealOutcome::Revealed);
        assert_eq!(state.hints_left(), 2);
        assert_eq!(state.status(), GameStatus::Playing);
        assert!(state.board()[(0, 0)].is_revealed);
    }

    #[test]
    fn hint_runs_out() {
        // . . 1 * 1 1 * 1 1 *
        let (mut state, mut source) = game(1, 10, &[(3, 0), (6, 0), (9, 0)]);

        for (expected, opened) in [(2, (2, 0)), (1, (4, 0)), (0, (5, 0))] {
            assert_eq!(state.use_hint(&mut source, at(0)), RevealOutcome::Revealed);
            assert_eq!(state.hints_left(), expected);
            assert!(state.board()[opened].is_revealed);
        }
        assert_eq!(state.status(), GameStatus::Playing);
        let before = state.clone();
        assert_eq!(state.use_hint(&mut source, at(0)), RevealOutcome::NoChange);
        assert_eq!(state, before);
    }

    #[test]
    fn tick_tracks_elapsed_time_while_playing() {
        let (mut state, mut source) = game(4, 4, BOTTOM_CORNERS);
        assert_eq!(state.tick(at(50)), TickOutcome::Stale);

        state.reveal((0, 0), &mut source, at(100));
        assert_eq!(state.tick(at(100)), TickOutcome::NoChange);
        assert_eq!(state.tick(at(350)), TickOutcome::Updated);
        assert_eq!(state.elapsed_ms(), 250);
    }

    #[test]
    fn won_game_surfaces_completion() {
        let (mut state, mut source) = game(2, 2, &[]);
        state.reveal((0, 0), &mut source, at(0));

        assert_eq!(
            state.completion(),
            Some(Completion {
                difficulty: Difficulty::Custom,
                elapsed_ms: 0
            })
        );
    }
}
