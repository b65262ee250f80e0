use smallvec::SmallVec;

/// Single coordinate axis used for board width, height, and positions.
pub type Coord = u16;

/// Count type used for mine counts and total-cell counts.
pub type CellCount = u32;

/// Two-dimensional coordinates `(x, y)`, `x` being the column and `y` the row.
pub type Coord2 = (Coord, Coord);

pub trait ToNdIndex {
    type Output;
    fn to_nd_index(self) -> Self::Output;
}

/// Boards are stored row-major, so `(x, y)` maps to `[y, x]`.
impl ToNdIndex for Coord2 {
    type Output = [usize; 2];

    fn to_nd_index(self) -> Self::Output {
        [self.1.into(), self.0.into()]
    }
}

pub const fn mult(a: Coord, b: Coord) -> CellCount {
    let a = a as CellCount;
    let b = b as CellCount;
    a.saturating_mul(b)
}

/// Row-major offsets of the 8-neighborhood.
static OFFSETS: [(i16, i16); 8] = [
    (-1, -1),
    (0, -1),
    (1, -1),
    (-1, 0),
    (1, 0),
    (-1, 1),
    (0, 1),
    (1, 1),
];

/// Iterates the in-bounds 8-neighborhood of a tile, `bounds` being `(cols, rows)`.
#[derive(Clone, Debug)]
pub struct NeighborIter {
    center: Coord2,
    bounds: Coord2,
    offsets: core::slice::Iter<'static, (i16, i16)>,
}

impl NeighborIter {
    pub(crate) fn new(center: Coord2, bounds: Coord2) -> Self {
        Self {
            center,
            bounds,
            offsets: OFFSETS.iter(),
        }
    }
}

fn shift((x, y): Coord2, (dx, dy): (i16, i16), (cols, rows): Coord2) -> Option<Coord2> {
    let x = x.checked_add_signed(dx).filter(|&x| x < cols)?;
    let y = y.checked_add_signed(dy).filter(|&y| y < rows)?;
    Some((x, y))
}

impl Iterator for NeighborIter {
    type Item = Coord2;

    fn next(&mut self) -> Option<Self::Item> {
        let (center, bounds) = (self.center, self.bounds);
        self.offsets.find_map(|&offset| shift(center, offset, bounds))
    }
}

/// The tile itself plus its in-bounds neighbors, at most 9 entries.
pub type SafeZone = SmallVec<[Coord2; 9]>;

pub(crate) fn safe_zone(center: Coord2, bounds: Coord2) -> SafeZone {
    let mut zone = SafeZone::new();
    zone.push(center);
    zone.extend(NeighborIter::new(center, bounds));
    zone
}
