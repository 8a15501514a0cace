//! Per-cell legal move table, used by the agents as features and as a move filter.
//!
//! The table does not gate the environment dynamics: the transition function
//! enforces legality through the subgrid rule instead.

use crate::infra::{DIRECTIONS, Direction, GRID_SIDE, NUM_CELLS, NUM_SLOTS};

/// Cells a rule applies to.
enum Cells {
    Range(usize, usize),
    List(&'static [usize]),
}

impl Cells {
    fn contains(&self, cell: usize) -> bool {
        match self {
            Cells::Range(start, end) => (*start..*end).contains(&cell),
            Cells::List(cells) => cells.contains(&cell),
        }
    }
}

/// Moves that cross into or along the hollow interior, as (cells, removed (north, east)).
const INTERIOR_RULES: &[(Cells, &[(i32, i32)])] = &[
    (Cells::Range(40, 43), &[(-1, 0), (-1, 1), (-1, -1)]),
    (Cells::List(&[44]), &[(-1, -1)]),
    (Cells::Range(40, 44), &[(-1, 0)]),
    (Cells::Range(39, 43), &[(-1, 1)]),
    (Cells::Range(41, 45), &[(-1, -1)]),
    (Cells::Range(100, 104), &[(1, 0)]),
    (Cells::Range(99, 103), &[(1, 1)]),
    (Cells::Range(101, 105), &[(1, -1)]),
    (Cells::List(&[56, 68, 80, 92]), &[(0, -1)]),
    (Cells::List(&[68, 80, 92, 104]), &[(1, -1)]),
    (Cells::List(&[44, 56, 68, 80]), &[(-1, -1)]),
    (Cells::List(&[51, 63, 75, 87]), &[(0, 1)]),
    (Cells::List(&[63, 75, 87, 99]), &[(1, 1)]),
    (Cells::List(&[39, 51, 63, 75]), &[(-1, 1)]),
];

/// Legal move table for every cell of the track.
#[derive(Debug, Clone)]
pub struct ActionMask {
    /// Validity per cell and slot (true = legal)
    mask: Vec<[bool; NUM_SLOTS]>,
}

impl ActionMask {
    pub fn build() -> Self {
        let mask = (0..NUM_CELLS).map(Self::cell_mask).collect();
        Self { mask }
    }

    fn cell_mask(cell: usize) -> [bool; NUM_SLOTS] {
        let mut legal = [true; NUM_SLOTS];
        let mut remove = |moves: &[(i32, i32)]| {
            for d in DIRECTIONS {
                if moves.contains(&(d.north(), d.east())) {
                    legal[d.slot()] = false;
                }
            }
        };

        if cell < GRID_SIDE {
            remove(&[(1, 0), (1, 1), (1, -1)]);
        }
        if cell >= NUM_CELLS - GRID_SIDE {
            remove(&[(-1, 0), (-1, 1), (-1, -1)]);
        }
        if cell % GRID_SIDE == GRID_SIDE - 1 {
            remove(&[(0, 1), (1, 1), (-1, 1)]);
        }
        if cell % GRID_SIDE == 0 {
            remove(&[(0, -1), (1, -1), (-1, -1)]);
        }
        for (cells, moves) in INTERIOR_RULES {
            if cells.contains(cell) {
                remove(moves);
            }
        }

        legal
    }

    /// Legal directions of `cell` in slot order, with `None` in the illegal slots.
    pub fn legal_moves(&self, cell: usize) -> [Option<Direction>; NUM_SLOTS] {
        let legal = &self.mask[cell];
        let mut moves = [None; NUM_SLOTS];
        for (slot, d) in DIRECTIONS.iter().enumerate() {
            if legal[slot] {
                moves[slot] = Some(*d);
            }
        }
        moves
    }

    /// 0/1 indicator of the legal slots of `cell`.
    pub fn indicator(&self, cell: usize) -> [f64; NUM_SLOTS] {
        self.mask[cell].map(|legal| if legal { 1.0 } else { 0.0 })
    }

    pub fn is_legal(&self, cell: usize, slot: usize) -> bool {
        self.mask[cell][slot]
    }

    pub fn legal_slots(&self, cell: usize) -> impl Iterator<Item = usize> + '_ {
        self.mask[cell]
            .iter()
            .enumerate()
            .filter(|(_, legal)| **legal)
            .map(|(slot, _)| slot)
    }

    pub fn num_legal(&self, cell: usize) -> usize {
        self.mask[cell].iter().filter(|legal| **legal).count()
    }
}

impl Default for ActionMask {
    fn default() -> Self {
        Self::build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slot_of(north: i32, east: i32) -> usize {
        DIRECTIONS
            .iter()
            .position(|d| d.north() == north && d.east() == east)
            .unwrap()
    }

    #[test]
    fn test_no_cell_fully_blocked() {
        let mask = ActionMask::build();
        for cell in 0..NUM_CELLS {
            assert!(mask.num_legal(cell) > 0, "cell {} has no legal move", cell);
            assert!(mask.is_legal(cell, slot_of(0, 0)));
        }
    }

    #[test]
    fn test_corner_cells() {
        let mask = ActionMask::build();
        // Top-left: only S, E, SE and stay
        let legal: Vec<usize> = mask.legal_slots(0).collect();
        assert_eq!(legal, vec![slot_of(-1, 0), slot_of(0, 1), slot_of(-1, 1), slot_of(0, 0)]);
        // Bottom-right: only N, W, NW and stay
        let legal: Vec<usize> = mask.legal_slots(143).collect();
        assert_eq!(legal, vec![slot_of(1, 0), slot_of(0, -1), slot_of(1, -1), slot_of(0, 0)]);
    }

    #[test]
    fn test_interior_edges() {
        let mask = ActionMask::build();
        assert!(!mask.is_legal(40, slot_of(-1, 0)));
        assert!(!mask.is_legal(40, slot_of(-1, -1)));
        assert!(mask.is_legal(39, slot_of(-1, 0)));
        assert!(!mask.is_legal(39, slot_of(-1, 1)));
        assert!(!mask.is_legal(56, slot_of(0, -1)));
        assert!(!mask.is_legal(104, slot_of(1, -1)));
        assert!(!mask.is_legal(87, slot_of(0, 1)));
        assert!(!mask.is_legal(101, slot_of(1, 0)));
        assert_eq!(mask.num_legal(20), NUM_SLOTS);
    }

    #[test]
    fn test_legal_moves_keep_slot_order() {
        let mask = ActionMask::build();
        let moves = mask.legal_moves(0);
        assert_eq!(moves[slot_of(1, 0)], None);
        assert_eq!(moves[slot_of(-1, 0)], Some(DIRECTIONS[slot_of(-1, 0)]));

        let indicator = mask.indicator(0);
        for slot in 0..NUM_SLOTS {
            assert_eq!(indicator[slot] == 1.0, moves[slot].is_some());
        }
    }
}
