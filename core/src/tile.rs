use serde::{Deserialize, Serialize};

use crate::{Coord, Coord2};

/// One grid cell as seen in a snapshot.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tile {
    pub x: Coord,
    pub y: Coord,
    pub is_mine: bool,
    pub is_revealed: bool,
    pub is_flagged: bool,
    /// Mine neighbors, only meaningful once mines are placed. Always 0 on mines.
    pub adjacent_mines: u8,
}

impl Tile {
    pub const fn hidden((x, y): Coord2) -> Self {
        Self {
            x,
            y,
            is_mine: false,
            is_revealed: false,
            is_flagged: false,
            adjacent_mines: 0,
        }
    }

    pub const fn coords(self) -> Coord2 {
        (self.x, self.y)
    }

    /// Unrevealed, flagged or not.
    pub const fn is_hidden(self) -> bool {
        !self.is_revealed
    }

    /// A tile the player still has to open to win.
    pub const fn is_hidden_safe(self) -> bool {
        !self.is_mine && !self.is_revealed
    }

    /// Hidden and not flagged, so a reveal would act on it.
    pub const fn is_openable(self) -> bool {
        !self.is_revealed && !self.is_flagged
    }
}
