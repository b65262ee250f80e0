use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::*;

struct Ticker {
    game_id: u64,
    task: JoinHandle<()>,
}

struct Shared {
    engine: GameEngine,
    ticker: Option<Ticker>,
}

/// Session subscribers and the newest version they have been handed.
struct Listeners {
    observers: Observers,
    delivered: u64,
}

struct Inner {
    shared: Mutex<Shared>,
    listeners: Mutex<Listeners>,
}

impl Inner {
    /// Hands `snapshot` to every subscriber unless a newer one already went out.
    ///
    /// Runs without the engine lock held, so callbacks may read the session.
    fn publish(&self, snapshot: &Snapshot) {
        let mut listeners = lock(&self.listeners);
        if snapshot.version() <= listeners.delivered {
            return;
        }
        listeners.delivered = snapshot.version();
        listeners.observers.notify(snapshot);
    }
}

/// A `GameEngine` with its clock driven by a tokio interval.
///
/// The interval runs only while the current game is `Playing`. It is bound to
/// the game id it was started for: starting a new game aborts it, and a tick
/// that still slips through is rejected by the engine as stale.
///
/// Subscriber callbacks are called after the engine lock is released and may
/// read the session. They must not issue commands or subscribe on it.
pub struct GameSession {
    inner: Arc<Inner>,
    updates: watch::Receiver<Snapshot>,
    runtime: Handle,
    tick_interval: Duration,
}

impl GameSession {
    /// Must be called from within a tokio runtime.
    pub fn new(mut engine: GameEngine) -> Result<Self> {
        let runtime = Handle::try_current().map_err(|_| GameError::NoRuntime)?;

        let (sender, updates) = watch::channel(engine.snapshot().clone());
        engine.subscribe(move |snapshot| {
            sender.send_replace(snapshot.clone());
        });
        let tick_interval = engine.settings().tick_interval();
        let delivered = engine.snapshot().version();

        let session = Self {
            inner: Arc::new(Inner {
                shared: Mutex::new(Shared {
                    engine,
                    ticker: None,
                }),
                listeners: Mutex::new(Listeners {
                    observers: Observers::default(),
                    delivered,
                }),
            }),
            updates,
            runtime,
            tick_interval,
        };
        session.command(|_| ());
        Ok(session)
    }

    pub fn snapshot(&self) -> Snapshot {
        lock(&self.inner.shared).engine.snapshot().clone()
    }

    /// Receiver that always holds the latest snapshot, ticks included.
    pub fn updates(&self) -> watch::Receiver<Snapshot> {
        self.updates.clone()
    }

    pub fn is_ticking(&self) -> bool {
        lock(&self.inner.shared)
            .ticker
            .as_ref()
            .is_some_and(|ticker| !ticker.task.is_finished())
    }

    /// Registers `callback` and immediately hands it the current snapshot.
    pub fn subscribe(
        &self,
        mut callback: impl FnMut(&Snapshot) + Send + 'static,
    ) -> SubscriptionId {
        let mut listeners = lock(&self.inner.listeners);
        callback(&self.snapshot());
        listeners.observers.subscribe(Box::new(callback))
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        lock(&self.inner.listeners).observers.unsubscribe(id)
    }

    pub fn new_game(
        &self,
        rows: Coord,
        cols: Coord,
        mines: CellCount,
        difficulty: Difficulty,
    ) -> Result<()> {
        self.command(|engine| engine.new_game(rows, cols, mines, difficulty))
    }

    pub fn new_preset(&self, difficulty: Difficulty) -> Result<()> {
        self.command(|engine| engine.new_preset(difficulty))
    }

    pub fn new_preset_named(&self, name: &str) -> Result<()> {
        self.command(|engine| engine.new_preset_named(name))
    }

    pub fn restart(&self) {
        self.command(GameEngine::restart)
    }

    pub fn reveal(&self, coords: Coord2) -> RevealOutcome {
        self.command(|engine| engine.reveal(coords))
    }

    pub fn toggle_flag(&self, coords: Coord2) -> MarkOutcome {
        self.command(|engine| engine.toggle_flag(coords))
    }

    pub fn chord(&self, coords: Coord2) -> RevealOutcome {
        self.command(|engine| engine.chord(coords))
    }

    pub fn use_hint(&self) -> RevealOutcome {
        self.command(GameEngine::use_hint)
    }

    fn command<T>(&self, command: impl FnOnce(&mut GameEngine) -> T) -> T {
        let (outcome, snapshot) = {
            let mut shared = lock(&self.inner.shared);
            let outcome = command(&mut shared.engine);
            self.sync_ticker(&mut shared);
            (outcome, shared.engine.snapshot().clone())
        };
        self.inner.publish(&snapshot);
        outcome
    }

    /// Starts, keeps, or stops the interval so it matches the current game.
    fn sync_ticker(&self, shared: &mut Shared) {
        let snapshot = shared.engine.snapshot();
        let wanted = snapshot
            .status()
            .is_playing()
            .then(|| snapshot.game_id());

        if let (Some(ticker), Some(game_id)) = (&shared.ticker, wanted) {
            if ticker.game_id == game_id {
                return;
            }
        }

        if let Some(ticker) = shared.ticker.take() {
            ticker.task.abort();
            log::trace!("Stopped timer of game {}", ticker.game_id);
        }

        if let Some(game_id) = wanted {
            shared.ticker = Some(self.spawn_ticker(game_id));
        }
    }

    fn spawn_ticker(&self, game_id: u64) -> Ticker {
        let inner = Arc::downgrade(&self.inner);
        let period = self.tick_interval;

        let task = self.runtime.spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            // the first tick completes immediately
            interval.tick().await;

            loop {
                interval.tick().await;
                if !tick_once(&inner, game_id) {
                    break;
                }
            }
            log::trace!("Timer of game {} exited", game_id);
        });
        log::trace!("Started timer of game {} every {:?}", game_id, period);

        Ticker { game_id, task }
    }
}

impl Drop for GameSession {
    fn drop(&mut self) {
        if let Some(ticker) = lock(&self.inner.shared).ticker.take() {
            ticker.task.abort();
        }
    }
}

impl core::fmt::Debug for GameSession {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("GameSession")
            .field("tick_interval", &self.tick_interval)
            .finish_non_exhaustive()
    }
}

/// Returns whether the ticker should keep running.
fn tick_once(inner: &Weak<Inner>, game_id: u64) -> bool {
    let Some(inner) = inner.upgrade() else {
        return false;
    };
    let (outcome, snapshot) = {
        let mut shared = lock(&inner.shared);
        let outcome = shared.engine.tick_for(game_id);
        (outcome, shared.engine.snapshot().clone())
    };
    if matches!(outcome, TickOutcome::Updated) {
        inner.publish(&snapshot);
    }
    !matches!(outcome, TickOutcome::Stale)
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
