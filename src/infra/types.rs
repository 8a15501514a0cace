use super::error::TrackError;

/// Side length of the square track grid.
pub const GRID_SIDE: usize = 12;
/// Number of cells in the track grid.
pub const NUM_CELLS: usize = GRID_SIDE * GRID_SIDE;
/// Number of action slots (8 compass directions plus stay).
pub const NUM_SLOTS: usize = 9;
/// Slot of the stay move, legal in every cell.
pub const STAY_SLOT: usize = 8;
/// Absolute bound on each velocity component.
pub const MAX_SPEED: i32 = 5;

/// Row of a cell index (0 is the top row).
pub fn row_of(cell: usize) -> usize {
    cell / GRID_SIDE
}

/// Column of a cell index (0 is the left column).
pub fn col_of(cell: usize) -> usize {
    cell % GRID_SIDE
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Velocity {
    /// Horizontal component, one unit moves one column.
    pub vx: i32,
    /// Vertical component, one unit moves one row (`GRID_SIDE` cells).
    pub vy: i32,
}

impl Velocity {
    pub fn new(vx: i32, vy: i32) -> Self {
        Self { vx, vy }
    }

    pub fn accelerate(&self, action: Action) -> Self {
        Self::new(self.vx + action.dvx(), self.vy + action.dvy())
    }

    pub fn clamped(&self) -> Self {
        Self::new(
            self.vx.clamp(-MAX_SPEED, MAX_SPEED),
            self.vy.clamp(-MAX_SPEED, MAX_SPEED),
        )
    }

    pub fn within_limits(&self) -> bool {
        self.vx.abs() <= MAX_SPEED && self.vy.abs() <= MAX_SPEED
    }
}

/// One of the 9 compass moves of the mask vocabulary.
///
/// `north` is the row-decreasing step and `east` the column-increasing step.
/// Only the values in [`DIRECTIONS`] exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Direction {
    north: i32,
    east: i32,
}

/// The direction vocabulary in canonical slot order.
pub const DIRECTIONS: [Direction; NUM_SLOTS] = [
    Direction::new(1, 0),   // N
    Direction::new(-1, 0),  // S
    Direction::new(0, 1),   // E
    Direction::new(0, -1),  // W
    Direction::new(1, 1),   // NE
    Direction::new(1, -1),  // NW
    Direction::new(-1, 1),  // SE
    Direction::new(-1, -1), // SW
    Direction::new(0, 0),   // stay
];

impl Direction {
    const fn new(north: i32, east: i32) -> Self {
        Self { north, east }
    }

    pub fn north(&self) -> i32 {
        self.north
    }

    pub fn east(&self) -> i32 {
        self.east
    }

    pub fn from_slot(slot: usize) -> Option<Self> {
        DIRECTIONS.get(slot).copied()
    }

    pub fn slot(&self) -> usize {
        match (self.north, self.east) {
            (1, 0) => 0,
            (-1, 0) => 1,
            (0, 1) => 2,
            (0, -1) => 3,
            (1, 1) => 4,
            (1, -1) => 5,
            (-1, 1) => 6,
            (-1, -1) => 7,
            _ => 8,
        }
    }

    /// The acceleration that pushes the car this way across the grid.
    pub fn acceleration(&self) -> Action {
        Action {
            dvx: self.east,
            dvy: -self.north,
        }
    }

    pub fn name(&self) -> &'static str {
        const NAMES: [&str; NUM_SLOTS] = ["N", "S", "E", "W", "NE", "NW", "SE", "SW", "stay"];
        NAMES[self.slot()]
    }
}

/// Acceleration applied by the driver: `(dvx, dvy)`, each in {-1, 0, 1}.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Action {
    dvx: i32,
    dvy: i32,
}

impl Action {
    pub fn new(dvx: i32, dvy: i32) -> Result<Self, TrackError> {
        if !(-1..=1).contains(&dvx) || !(-1..=1).contains(&dvy) {
            return Err(TrackError::InvalidAction { dvx, dvy });
        }
        Ok(Self { dvx, dvy })
    }

    pub fn dvx(&self) -> i32 {
        self.dvx
    }

    pub fn dvy(&self) -> i32 {
        self.dvy
    }

    pub fn direction(&self) -> Direction {
        Direction::new(-self.dvy, self.dvx)
    }

    pub fn slot(&self) -> usize {
        self.direction().slot()
    }

    pub fn from_slot(slot: usize) -> Option<Self> {
        Direction::from_slot(slot).map(|d| d.acceleration())
    }

    /// Action of a slot known to be in range.
    ///
    /// # Panics
    ///
    /// Panics if `slot >= NUM_SLOTS`.
    pub fn at_slot(slot: usize) -> Self {
        DIRECTIONS[slot].acceleration()
    }

    /// All 9 actions in canonical slot order.
    pub fn all() -> impl Iterator<Item = Action> {
        DIRECTIONS.iter().map(|d| d.acceleration())
    }
}

impl TryFrom<(i32, i32)> for Action {
    type Error = TrackError;

    fn try_from((dvx, dvy): (i32, i32)) -> Result<Self, Self::Error> {
        Action::new(dvx, dvy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slot_round_trip() {
        for slot in 0..NUM_SLOTS {
            let action = Action::from_slot(slot).unwrap();
            assert_eq!(action.slot(), slot);
            assert_eq!(action.direction(), DIRECTIONS[slot]);
            assert_eq!(DIRECTIONS[slot].slot(), slot);
        }
        assert!(Action::from_slot(NUM_SLOTS).is_none());
    }

    #[test]
    fn test_actions_cover_all_deltas() {
        let mut seen: Vec<(i32, i32)> = Action::all().map(|a| (a.dvx(), a.dvy())).collect();
        seen.sort();
        seen.dedup();
        assert_eq!(seen.len(), NUM_SLOTS);
    }

    #[test]
    fn test_north_decreases_row() {
        let north = DIRECTIONS[0].acceleration();
        assert_eq!((north.dvx(), north.dvy()), (0, -1));
        let east = DIRECTIONS[2].acceleration();
        assert_eq!((east.dvx(), east.dvy()), (1, 0));
        assert_eq!(DIRECTIONS[8].acceleration(), Action::new(0, 0).unwrap());
    }

    #[test]
    fn test_invalid_action_rejected() {
        assert!(Action::new(2, 0).is_err());
        assert!(Action::try_from((0, -2)).is_err());
        assert!(Action::try_from((-1, 1)).is_ok());
    }

    #[test]
    fn test_velocity_clamp() {
        let v = Velocity::new(6, -7).clamped();
        assert_eq!(v, Velocity::new(5, -5));
        assert!(v.within_limits());
    }

    #[test]
    fn test_row_and_col() {
        assert_eq!(row_of(37), 3);
        assert_eq!(col_of(37), 1);
    }
}
