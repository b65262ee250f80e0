use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::*;

/// Owns the current game and turns commands into new snapshots.
///
/// Commands never mutate a published snapshot: each one works on a private
/// copy that is committed, versioned and broadcast only when it changed
/// something. Player mistakes (bad coordinates, acting on a finished game,
/// a chord with the wrong number of flags) are reported as `NoChange`.
pub struct GameEngine {
    snapshot: Snapshot,
    settings: EngineSettings,
    random: Box<dyn RandomSource>,
    clock: Box<dyn Clock>,
    observers: Observers,
}

impl GameEngine {
    /// Opens a game on the preset named by `settings.difficulty`.
    pub fn new(settings: EngineSettings) -> core::result::Result<Self, SettingsError> {
        settings.validate()?;
        Ok(Self::open(settings))
    }

    fn open(settings: EngineSettings) -> Self {
        let (config, difficulty) = match settings.difficulty.preset() {
            Some(config) => (config, settings.difficulty),
            None => {
                log::warn!(
                    "{} has no preset board, opening a Beginner game",
                    settings.difficulty
                );
                (GameConfig::BEGINNER, Difficulty::Beginner)
            }
        };
        let state = GameState::new(config, difficulty, settings.hints, 1);

        Self {
            snapshot: Arc::new(state),
            settings,
            random: Box::new(SystemRandom),
            clock: Box::new(SystemClock),
            observers: Default::default(),
        }
    }

    pub fn with_random_source(mut self, source: impl RandomSource + 'static) -> Self {
        self.random = Box::new(source);
        self
    }

    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    /// Registers `callback` and immediately hands it the current snapshot.
    pub fn subscribe(
        &mut self,
        mut callback: impl FnMut(&Snapshot) + Send + 'static,
    ) -> SubscriptionId {
        callback(&self.snapshot);
        self.observers.subscribe(Box::new(callback))
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.observers.unsubscribe(id)
    }

    pub fn subscriber_count(&self) -> usize {
        self.observers.len()
    }

    pub fn new_game(
        &mut self,
        rows: Coord,
        cols: Coord,
        mines: CellCount,
        difficulty: Difficulty,
    ) -> Result<()> {
        let config = GameConfig::new(rows, cols, mines)?;
        self.start_game(config, difficulty);
        Ok(())
    }

    pub fn new_preset(&mut self, difficulty: Difficulty) -> Result<()> {
        let config = difficulty.preset().ok_or(GameError::NoPreset)?;
        self.start_game(config, difficulty);
        Ok(())
    }

    pub fn new_preset_named(&mut self, name: &str) -> Result<()> {
        self.new_preset(name.parse()?)
    }

    /// Same board size, mine count and difficulty; mines are laid again on
    /// the next first click.
    pub fn restart(&mut self) {
        let config = self.snapshot.config();
        let difficulty = self.snapshot.difficulty();
        self.start_game(config, difficulty);
    }

    pub fn reveal(&mut self, coords: Coord2) -> RevealOutcome {
        self.transition(
            |state, random, now| state.reveal(coords, random, now),
            RevealOutcome::has_update,
        )
    }

    pub fn toggle_flag(&mut self, coords: Coord2) -> MarkOutcome {
        self.transition(
            |state, _, _| state.toggle_flag(coords),
            MarkOutcome::has_update,
        )
    }

    pub fn chord(&mut self, coords: Coord2) -> RevealOutcome {
        self.transition(
            |state, _, now| state.chord(coords, now),
            RevealOutcome::has_update,
        )
    }

    pub fn use_hint(&mut self) -> RevealOutcome {
        self.transition(
            |state, random, now| state.use_hint(random, now),
            RevealOutcome::has_update,
        )
    }

    /// Refreshes the elapsed time of the current game.
    pub fn tick(&mut self) -> TickOutcome {
        self.tick_for(self.snapshot.game_id())
    }

    /// Refreshes the elapsed time only if `game_id` is still the current game.
    pub fn tick_for(&mut self, game_id: u64) -> TickOutcome {
        if game_id != self.snapshot.game_id() {
            log::trace!(
                "Dropping tick for game {}, current is {}",
                game_id,
                self.snapshot.game_id()
            );
            return TickOutcome::Stale;
        }

        self.transition(
            |state, _, now| state.tick(now),
            |outcome| matches!(outcome, TickOutcome::Updated),
        )
    }

    fn start_game(&mut self, config: GameConfig, difficulty: Difficulty) {
        let game_id = self.snapshot.game_id().wrapping_add(1);
        log::debug!(
            "New {} game {}: {}x{} with {} mines",
            difficulty,
            game_id,
            config.rows,
            config.cols,
            config.mines
        );
        self.commit(GameState::new(
            config,
            difficulty,
            self.settings.hints,
            game_id,
        ));
    }

    fn transition<T: Copy>(
        &mut self,
        command: impl FnOnce(&mut GameState, &mut dyn RandomSource, DateTime<Utc>) -> T,
        changed: fn(T) -> bool,
    ) -> T {
        let now = self.clock.now();
        let mut next = GameState::clone(&self.snapshot);
        let outcome = command(&mut next, self.random.as_mut(), now);
        if changed(outcome) {
            self.commit(next);
        }
        outcome
    }

    fn commit(&mut self, mut next: GameState) {
        next.bump_version(self.snapshot.version());
        self.snapshot = Arc::new(next);
        self.observers.notify(&self.snapshot);
    }
}

impl Default for GameEngine {
    fn default() -> Self {
        Self::open(EngineSettings::default())
    }
}

impl core::fmt::Debug for GameEngine {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("GameEngine")
            .field("snapshot", &self.snapshot)
            .field("settings", &self.settings)
            .field("observers", &self.observers)
            .finish_non_exhaustive()
    }
}
