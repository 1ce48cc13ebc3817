//! Linear index rules for external dense arrays.

use crate::geometry::Dims;

/// Layout of a full-volume array in an external file.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum IndexOrder {
    /// `i + j*nx + k*nx*ny`: I fastest, K slowest, top layer first.
    Natural,
    /// ROFF layout: K fastest and counted from the bottom, I slowest.
    Roff,
}

impl IndexOrder {
    /// Position of `(i, j, k)` in an array laid out in this order.
    pub fn linear_index(self, dims: Dims, i: usize, j: usize, k: usize) -> usize {
        match self {
            Self::Natural => dims.global_index(i, j, k),
            Self::Roff => i * dims.ny * dims.nz + j * dims.nz + (dims.nz - 1 - k),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn roff_order_counts_k_from_bottom() {
        let dims = Dims::new(2, 3, 4);
        assert_eq!(IndexOrder::Roff.linear_index(dims, 0, 0, 3), 0);
        assert_eq!(IndexOrder::Roff.linear_index(dims, 0, 0, 0), 3);
        assert_eq!(IndexOrder::Roff.linear_index(dims, 0, 1, 3), 4);
        assert_eq!(IndexOrder::Roff.linear_index(dims, 1, 0, 3), 12);
    }

    proptest! {
        #[test]
        fn both_orders_are_bijections(nx in 1usize..6, ny in 1usize..6, nz in 1usize..6) {
            let dims = Dims::new(nx, ny, nz);
            for order in [IndexOrder::Natural, IndexOrder::Roff] {
                let mut seen = vec![false; dims.volume()];
                for k in 0..nz {
                    for j in 0..ny {
                        for i in 0..nx {
                            let idx = order.linear_index(dims, i, j, k);
                            prop_assert!(idx < seen.len());
                            prop_assert!(!seen[idx]);
                            seen[idx] = true;
                        }
                    }
                }
            }
        }

        #[test]
        fn natural_index_inverts(nx in 1usize..8, ny in 1usize..8, nz in 1usize..8, g in 0usize..512) {
            let dims = Dims::new(nx, ny, nz);
            let g = g % dims.volume();
            let (i, j, k) = dims.ijk(g);
            prop_assert!(dims.contains(i, j, k));
            prop_assert_eq!(dims.global_index(i, j, k), g);
        }
    }
}
