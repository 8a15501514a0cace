//! Subgrid topology of the track loop.

use crate::infra::{GRID_SIDE, NUM_CELLS};

/// Side of a subgrid block.
const BLOCK_SIDE: usize = GRID_SIDE / 3;

/// Top-left corners (row, col) of the 3x3 blocks in raster order.
const BLOCK_ORIGINS: [(usize, usize); 9] = [
    (0, 0),
    (0, 4),
    (0, 8),
    (4, 0),
    (4, 4),
    (4, 8),
    (8, 0),
    (8, 4),
    (8, 8),
];

/// Raster block visited at each step of the clockwise loop, interior last.
const CLOCKWISE_ORDER: [usize; 9] = [0, 1, 2, 5, 8, 7, 6, 3, 4];

/// The 9 subgrids of the track in clockwise order.
///
/// Index 0 is the top-left block, the indices then follow the loop
/// clockwise and end at 7 (mid-left). Index 8 is the hollow interior.
#[derive(Debug, Clone)]
pub struct Subgrids {
    blocks: Vec<Vec<usize>>,
    /// Subgrid index per cell.
    lookup: [usize; NUM_CELLS],
}

impl Subgrids {
    /// Index of the forbidden interior subgrid.
    pub const INTERIOR: usize = 8;

    pub fn partition() -> Self {
        let raster: Vec<Vec<usize>> = BLOCK_ORIGINS
            .iter()
            .map(|&(start_row, start_col)| {
                let mut cells = Vec::with_capacity(BLOCK_SIDE * BLOCK_SIDE);
                for i in 0..BLOCK_SIDE {
                    for j in 0..BLOCK_SIDE {
                        cells.push((start_row + i) * GRID_SIDE + (start_col + j));
                    }
                }
                cells
            })
            .collect();

        let blocks: Vec<Vec<usize>> = CLOCKWISE_ORDER
            .iter()
            .map(|&raster_idx| raster[raster_idx].clone())
            .collect();

        let mut lookup = [0; NUM_CELLS];
        for (idx, block) in blocks.iter().enumerate() {
            for &cell in block {
                lookup[cell] = idx;
            }
        }

        Self { blocks, lookup }
    }

    /// Subgrid index of `cell`, `None` when the cell is off the grid.
    pub fn locate(&self, cell: usize) -> Option<usize> {
        self.lookup.get(cell).copied()
    }

    /// Same as [`locate`](Self::locate) for a signed candidate position.
    pub fn locate_signed(&self, cell: i64) -> Option<usize> {
        usize::try_from(cell).ok().and_then(|c| self.locate(c))
    }

    pub fn cells(&self, index: usize) -> &[usize] {
        &self.blocks[index]
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &[usize]> {
        self.blocks.iter().map(|b| b.as_slice())
    }
}

impl Default for Subgrids {
    fn default() -> Self {
        Self::partition()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partition_covers_grid_once() {
        let subgrids = Subgrids::partition();
        assert_eq!(subgrids.len(), 9);

        let mut seen = vec![0usize; NUM_CELLS];
        for block in subgrids.iter() {
            assert_eq!(block.len(), 16);
            for &cell in block {
                seen[cell] += 1;
            }
        }
        assert!(seen.iter().all(|&count| count == 1));
    }

    #[test]
    fn test_clockwise_order() {
        let subgrids = Subgrids::partition();
        // Start and finish rows sit in the first and last loop blocks
        assert_eq!(subgrids.locate(36), Some(0));
        assert_eq!(subgrids.locate(37), Some(0));
        assert_eq!(subgrids.locate(4), Some(1));
        assert_eq!(subgrids.locate(11), Some(2));
        assert_eq!(subgrids.locate(59), Some(3));
        assert_eq!(subgrids.locate(143), Some(4));
        assert_eq!(subgrids.locate(136), Some(5));
        assert_eq!(subgrids.locate(132), Some(6));
        assert_eq!(subgrids.locate(48), Some(7));
        assert_eq!(subgrids.locate(65), Some(Subgrids::INTERIOR));
    }

    #[test]
    fn test_locate_off_grid() {
        let subgrids = Subgrids::partition();
        assert_eq!(subgrids.locate(NUM_CELLS), None);
        assert_eq!(subgrids.locate_signed(-1), None);
        assert_eq!(subgrids.locate_signed(0), Some(0));
    }

    #[test]
    fn test_cells_in_raster_order() {
        let subgrids = Subgrids::partition();
        assert_eq!(&subgrids.cells(0)[..5], &[0, 1, 2, 3, 12]);
        assert_eq!(subgrids.cells(Subgrids::INTERIOR)[0], 52);
    }
}
