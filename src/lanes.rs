//! Lane-group reduction primitive
//!
//! A warp-style group: 32 lanes executing in lock-step, reducing a per-lane
//! value to a single scalar visible to every lane. On CPU a lane group is
//! one unit of sequential code, so the pairwise shuffle exchange becomes an
//! explicit array exchange over a `[T; 32]` tile: a 5-step binary tree
//! (offsets 16, 8, 4, 2, 1) followed by a broadcast from lane 0.
//!
//! Vector tiles of width `k` are owned across the group with a stride of 32:
//! lane `l` holds elements `l, l + 32, l + 64, ...`, i.e. `k / 32` elements
//! per lane. Dot products and norms form one partial per lane and reduce it
//! here.

use std::ops::Add;

/// Number of cooperating lanes in a group; vector widths must be a multiple
/// of this.
pub const LANE_WIDTH: usize = 32;

/// Tree-reduce with an arbitrary combiner, broadcasting the result to every
/// lane slot.
///
/// Each step pairs lane `i` with lane `i + offset`, halving the offset from
/// 16 down to 1; after the final step lane 0 holds the full reduction and
/// its value is written back to all 32 slots.
#[inline]
pub fn tree_reduce<T, F>(lanes: &mut [T; LANE_WIDTH], combine: F) -> T
where
    T: Copy,
    F: Fn(T, T) -> T,
{
    let mut offset = LANE_WIDTH / 2;
    while offset > 0 {
        for lane in 0..offset {
            lanes[lane] = combine(lanes[lane], lanes[lane + offset]);
        }
        offset /= 2;
    }
    let reduced = lanes[0];
    for slot in lanes.iter_mut() {
        *slot = reduced;
    }
    reduced
}

/// Sum across all 32 lanes, visible to every lane
#[inline]
pub fn reduce_sum<T>(lanes: &mut [T; LANE_WIDTH]) -> T
where
    T: Copy + Add<Output = T>,
{
    tree_reduce(lanes, |a, b| a + b)
}

/// Minimum across all 32 lanes
#[inline]
pub fn reduce_min(lanes: &mut [f32; LANE_WIDTH]) -> f32 {
    tree_reduce(lanes, f32::min)
}

/// Maximum across all 32 lanes
#[inline]
pub fn reduce_max(lanes: &mut [f32; LANE_WIDTH]) -> f32 {
    tree_reduce(lanes, f32::max)
}
