//! Pure geometry for the tiling layouts.
//!
//! `compute_layout` maps an ordered member list plus layout parameters to
//! concrete rectangles. It never reorders members and never mutates state:
//! the member ordering is owned by the group, grow hints are read-only here.
//!
//! Two layouts:
//! - `Columns`: members are partitioned into columns derived purely from
//!   member order; widths and heights are weighted and growable.
//! - `Max`: the focused window takes the whole screen, everything else is
//!   hidden behind a zero-area rect.

use std::collections::HashMap;
use std::ops::Range;

use serde::{Deserialize, Serialize};

use crate::types::{Rect, WindowId};

/// Smallest width/height a tiled window may be squeezed to, in pixels.
pub const MIN_TILE: u32 = 50;

/// Default relative weight for a column or a window within a column.
const DEFAULT_WEIGHT: u32 = 100;
/// Weight bounds enforced when applying grow hints.
const MIN_WEIGHT: u32 = 10;
const MAX_WEIGHT: u32 = 1000;

/// Spatial direction for focus/shuffle/grow operations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Left,
    Right,
    Up,
    Down,
}

/// Where a new window lands in the focused column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InsertPosition {
    #[default]
    Top,
    Bottom,
}

/// Resolved parameters for the Columns layout
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnsParams {
    pub num_columns: usize,
    pub margin: u32,
    pub border_width: u32,
    pub grow_amount: u32,
    pub ratio: f32,
    pub insert_position: InsertPosition,
}

impl Default for ColumnsParams {
    fn default() -> Self {
        Self {
            num_columns: 3,
            margin: 8,
            border_width: 4,
            grow_amount: 1,
            ratio: 0.5,
            insert_position: InsertPosition::Top,
        }
    }
}

impl ColumnsParams {
    /// Default weight of a column before grow hints. `ratio` skews the first
    /// column: 0.5 means all columns start equal.
    fn default_col_weight(&self, col: usize, ncols: usize) -> u32 {
        if col == 0 && ncols > 1 {
            let ratio = self.ratio.clamp(0.1, 0.9);
            (DEFAULT_WEIGHT as f32 * ratio / (1.0 - ratio)).round() as u32
        } else {
            DEFAULT_WEIGHT
        }
    }
}

/// Resolved parameters for the Max layout
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MaxParams {
    pub margin: u32,
    pub border_width: u32,
}

/// A layout algorithm with its resolved parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LayoutParams {
    Columns(ColumnsParams),
    Max(MaxParams),
}

impl LayoutParams {
    pub fn kind(&self) -> &'static str {
        match self {
            LayoutParams::Columns(_) => "columns",
            LayoutParams::Max(_) => "max",
        }
    }
}

/// Grow hints for one group: per-column width deltas keyed by column index
/// and per-window height deltas. Deltas are weight offsets against the
/// defaults, clamped on both write and read so no window can be squeezed out.
#[derive(Debug, Clone, Default)]
pub struct GrowHints {
    col_deltas: HashMap<usize, i32>,
    win_deltas: HashMap<WindowId, i32>,
}

impl GrowHints {
    pub fn new() -> Self {
        Self::default()
    }

    fn effective(delta: Option<&i32>, default: u32) -> u32 {
        let weight = default as i64 + delta.copied().unwrap_or(0) as i64;
        weight.clamp(MIN_WEIGHT as i64, MAX_WEIGHT as i64) as u32
    }

    pub fn col_weight(&self, col: usize, default: u32) -> u32 {
        Self::effective(self.col_deltas.get(&col), default)
    }

    pub fn win_weight(&self, id: WindowId) -> u32 {
        Self::effective(self.win_deltas.get(&id), DEFAULT_WEIGHT)
    }

    /// Transfer `amount` weight units from one column to an adjacent one.
    /// Partial transfers apply when a bound would be crossed.
    pub fn transfer_column(
        &mut self,
        grow: (usize, u32),
        shrink: (usize, u32),
        amount: u32,
    ) {
        let grow_eff = self.col_weight(grow.0, grow.1);
        let shrink_eff = self.col_weight(shrink.0, shrink.1);
        let applicable = amount
            .min(MAX_WEIGHT.saturating_sub(grow_eff))
            .min(shrink_eff.saturating_sub(MIN_WEIGHT));
        if applicable == 0 {
            return;
        }
        *self.col_deltas.entry(grow.0).or_insert(0) += applicable as i32;
        *self.col_deltas.entry(shrink.0).or_insert(0) -= applicable as i32;
    }

    /// Shrink a column in place (the grow-at-screen-edge policy). The freed
    /// space redistributes across the other columns through normalization.
    pub fn shrink_column(&mut self, col: usize, default: u32, amount: u32) {
        let eff = self.col_weight(col, default);
        let applicable = amount.min(eff.saturating_sub(MIN_WEIGHT));
        if applicable > 0 {
            *self.col_deltas.entry(col).or_insert(0) -= applicable as i32;
        }
    }

    /// Transfer `amount` weight units between two windows in the same column.
    pub fn transfer_window(&mut self, grow: WindowId, shrink: WindowId, amount: u32) {
        let grow_eff = self.win_weight(grow);
        let shrink_eff = self.win_weight(shrink);
        let applicable = amount
            .min(MAX_WEIGHT.saturating_sub(grow_eff))
            .min(shrink_eff.saturating_sub(MIN_WEIGHT));
        if applicable == 0 {
            return;
        }
        *self.win_deltas.entry(grow).or_insert(0) += applicable as i32;
        *self.win_deltas.entry(shrink).or_insert(0) -= applicable as i32;
    }

    /// Shrink a window in place (grow toward a column edge).
    pub fn shrink_window(&mut self, id: WindowId, amount: u32) {
        let eff = self.win_weight(id);
        let applicable = amount.min(eff.saturating_sub(MIN_WEIGHT));
        if applicable > 0 {
            *self.win_deltas.entry(id).or_insert(0) -= applicable as i32;
        }
    }

    /// Reset all hints to equal distribution.
    pub fn clear(&mut self) {
        self.col_deltas.clear();
        self.win_deltas.clear();
    }

    /// Drop hints for windows no longer in the group.
    pub fn retain_windows(&mut self, alive: &[WindowId]) {
        self.win_deltas.retain(|id, _| alive.contains(id));
    }

    pub fn is_empty(&self) -> bool {
        self.col_deltas.is_empty() && self.win_deltas.is_empty()
    }
}

/// Partition `n` members into chunk ranges for up to `num_columns` columns.
/// The first `n % c` columns take one extra member.
pub fn column_ranges(n: usize, num_columns: usize) -> Vec<Range<usize>> {
    if n == 0 {
        return Vec::new();
    }
    let c = n.min(num_columns.max(1));
    let base = n / c;
    let extra = n % c;
    let mut ranges = Vec::with_capacity(c);
    let mut start = 0;
    for col in 0..c {
        let len = base + usize::from(col < extra);
        ranges.push(start..start + len);
        start += len;
    }
    ranges
}

/// Map a member index to its (column, row) position.
pub fn position_of(n: usize, num_columns: usize, idx: usize) -> Option<(usize, usize)> {
    column_ranges(n, num_columns)
        .iter()
        .enumerate()
        .find(|(_, r)| r.contains(&idx))
        .map(|(col, r)| (col, idx - r.start))
}

/// Map a (column, row) position back to a member index, clamping the row to
/// the target column's height.
pub fn index_at(n: usize, num_columns: usize, col: usize, row: usize) -> Option<usize> {
    let ranges = column_ranges(n, num_columns);
    let range = ranges.get(col)?;
    let row = row.min(range.len().saturating_sub(1));
    Some(range.start + row)
}

/// Resolve the member index adjacent to `idx` in the given direction under
/// the Columns adjacency: left/right cross columns (row clamped), up/down
/// move within the column. Returns None at an edge.
pub fn neighbor(n: usize, num_columns: usize, idx: usize, dir: Direction) -> Option<usize> {
    let ranges = column_ranges(n, num_columns);
    let (col, row) = position_of(n, num_columns, idx)?;
    match dir {
        Direction::Left if col > 0 => index_at(n, num_columns, col - 1, row),
        Direction::Right if col + 1 < ranges.len() => index_at(n, num_columns, col + 1, row),
        Direction::Up if row > 0 => Some(idx - 1),
        Direction::Down if row + 1 < ranges[col].len() => Some(idx + 1),
        _ => None,
    }
}

/// Split `total` pixels across `weights`, exactly: sizes sum to `total`.
/// The last entry absorbs integer remainder; undersized entries are repaired
/// from the largest entry when the total allows it.
fn split_weighted(total: u32, weights: &[u32]) -> Vec<u32> {
    let n = weights.len();
    if n == 0 {
        return Vec::new();
    }
    let sum: u64 = weights.iter().map(|&w| w.max(1) as u64).sum();
    let mut sizes = Vec::with_capacity(n);
    let mut used: u64 = 0;
    for (i, &w) in weights.iter().enumerate() {
        let size = if i == n - 1 {
            total as u64 - used
        } else {
            total as u64 * w.max(1) as u64 / sum
        };
        used += size;
        sizes.push(size as u32);
    }
    if total as u64 >= MIN_TILE as u64 * n as u64 {
        for i in 0..n {
            if sizes[i] < MIN_TILE {
                let deficit = MIN_TILE - sizes[i];
                let donor = (0..n).max_by_key(|&j| sizes[j]).unwrap_or(i);
                if donor != i && sizes[donor] >= MIN_TILE + deficit {
                    sizes[donor] -= deficit;
                    sizes[i] += deficit;
                }
            }
        }
    }
    sizes
}

/// Compute rectangles for every member of a group.
///
/// The returned rects are in member order. With margin and border width of
/// zero, Columns rects exactly tile `screen`. Margin and border inset each
/// rect after tiling, so they are decorative and never create drift.
pub fn compute_layout(
    members: &[WindowId],
    focused: Option<usize>,
    params: &LayoutParams,
    hints: &GrowHints,
    screen: Rect,
) -> Vec<(WindowId, Rect)> {
    if members.is_empty() {
        return Vec::new();
    }
    match params {
        LayoutParams::Columns(p) => compute_columns(members, p, hints, screen),
        LayoutParams::Max(p) => compute_max(members, focused, p, screen),
    }
}

fn compute_columns(
    members: &[WindowId],
    p: &ColumnsParams,
    hints: &GrowHints,
    screen: Rect,
) -> Vec<(WindowId, Rect)> {
    let n = members.len();
    let ranges = column_ranges(n, p.num_columns);
    let ncols = ranges.len();

    let col_weights: Vec<u32> = (0..ncols)
        .map(|col| hints.col_weight(col, p.default_col_weight(col, ncols)))
        .collect();
    let widths = split_weighted(screen.width, &col_weights);

    let inset = p.margin + p.border_width;
    let mut rects = Vec::with_capacity(n);
    let mut x = screen.x;
    for (col, range) in ranges.iter().enumerate() {
        let col_members = &members[range.clone()];
        let win_weights: Vec<u32> =
            col_members.iter().map(|&id| hints.win_weight(id)).collect();
        let heights = split_weighted(screen.height, &win_weights);

        let mut y = screen.y;
        for (&id, &height) in col_members.iter().zip(heights.iter()) {
            let tile = Rect::new(x, y, widths[col], height);
            rects.push((id, tile.inset(inset)));
            y += height as i32;
        }
        x += widths[col] as i32;
    }
    rects
}

fn compute_max(
    members: &[WindowId],
    focused: Option<usize>,
    p: &MaxParams,
    screen: Rect,
) -> Vec<(WindowId, Rect)> {
    let visible = focused.unwrap_or(0).min(members.len() - 1);
    let inset = p.margin + p.border_width;
    members
        .iter()
        .enumerate()
        .map(|(i, &id)| {
            if i == visible {
                (id, screen.inset(inset))
            } else {
                (id, Rect::ZERO)
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCREEN: Rect = Rect { x: 0, y: 0, width: 1920, height: 1080 };

    fn bare_columns() -> LayoutParams {
        LayoutParams::Columns(ColumnsParams {
            margin: 0,
            border_width: 0,
            ..ColumnsParams::default()
        })
    }

    /// The union of assigned rects must exactly tile the screen: the areas
    /// sum to the screen area and no two rects overlap.
    fn assert_exact_tiling(rects: &[(WindowId, Rect)], screen: Rect) {
        let total: u64 = rects.iter().map(|(_, r)| r.area()).sum();
        assert_eq!(total, screen.area(), "area not conserved");
        for (i, (_, a)) in rects.iter().enumerate() {
            for (_, b) in rects.iter().skip(i + 1) {
                let disjoint_x = a.x + a.width as i32 <= b.x || b.x + b.width as i32 <= a.x;
                let disjoint_y = a.y + a.height as i32 <= b.y || b.y + b.height as i32 <= a.y;
                assert!(disjoint_x || disjoint_y, "rects overlap: {:?} {:?}", a, b);
            }
        }
    }

    #[test]
    fn test_column_ranges_balanced() {
        assert_eq!(column_ranges(3, 3), vec![0..1, 1..2, 2..3]);
        assert_eq!(column_ranges(5, 3), vec![0..2, 2..4, 4..5]);
        assert_eq!(column_ranges(2, 3), vec![0..1, 1..2]);
        assert_eq!(column_ranges(0, 3), vec![]);
        // cap of zero is treated as one column
        assert_eq!(column_ranges(2, 0), vec![0..2]);
    }

    #[test]
    fn test_columns_exact_tiling_one_to_six_windows() {
        let hints = GrowHints::new();
        for n in 1..=6u32 {
            let members: Vec<WindowId> = (1..=n).collect();
            let rects = compute_layout(&members, Some(0), &bare_columns(), &hints, SCREEN);
            assert_eq!(rects.len(), n as usize);
            assert_exact_tiling(&rects, SCREEN);
        }
    }

    #[test]
    fn test_columns_three_windows_three_columns() {
        let hints = GrowHints::new();
        let rects = compute_layout(&[1, 2, 3], Some(0), &bare_columns(), &hints, SCREEN);
        // Three windows on the default policy open three side-by-side columns.
        assert_eq!(rects[0].1, Rect::new(0, 0, 640, 1080));
        assert_eq!(rects[1].1, Rect::new(640, 0, 640, 1080));
        assert_eq!(rects[2].1, Rect::new(1280, 0, 640, 1080));
    }

    #[test]
    fn test_columns_margin_insets_each_rect() {
        let hints = GrowHints::new();
        let params = LayoutParams::Columns(ColumnsParams {
            margin: 8,
            border_width: 4,
            ..ColumnsParams::default()
        });
        let rects = compute_layout(&[1, 2], Some(0), &params, &hints, SCREEN);
        assert_eq!(rects[0].1, Rect::new(12, 12, 960 - 24, 1080 - 24));
        assert_eq!(rects[1].1, Rect::new(972, 12, 960 - 24, 1080 - 24));
    }

    #[test]
    fn test_columns_grow_transfers_between_columns() {
        let mut hints = GrowHints::new();
        // columns 0 and 1 both default to weight 100; move 20 units
        hints.transfer_column((0, 100), (1, 100), 20);
        let rects = compute_layout(&[1, 2], Some(0), &bare_columns(), &hints, SCREEN);
        let w0 = rects[0].1.width;
        let w1 = rects[1].1.width;
        assert!(w0 > w1, "grown column should be wider: {} vs {}", w0, w1);
        assert_eq!(w0 + w1, 1920);
    }

    #[test]
    fn test_columns_grow_clamps_at_min_weight() {
        let mut hints = GrowHints::new();
        // try to take far more than the neighbor can give
        hints.transfer_column((0, 100), (1, 100), 10_000);
        let rects = compute_layout(&[1, 2], Some(0), &bare_columns(), &hints, SCREEN);
        assert!(rects[1].1.width >= MIN_TILE);
        assert_eq!(rects[0].1.width + rects[1].1.width, 1920);
    }

    #[test]
    fn test_columns_window_grow_within_column() {
        let mut hints = GrowHints::new();
        // 4 windows, cap 3: column 0 holds members 0 and 1 stacked
        hints.transfer_window(1, 2, 30);
        let rects = compute_layout(&[1, 2, 3, 4], Some(0), &bare_columns(), &hints, SCREEN);
        let h1 = rects[0].1.height;
        let h2 = rects[1].1.height;
        assert!(h1 > h2);
        assert_eq!(h1 + h2, 1080);
        assert_exact_tiling(&rects, SCREEN);
    }

    #[test]
    fn test_shrink_window_never_below_min() {
        let mut hints = GrowHints::new();
        for _ in 0..500 {
            hints.shrink_window(1, 50);
        }
        assert!(hints.win_weight(1) >= MIN_WEIGHT);
    }

    #[test]
    fn test_max_focused_takes_screen_others_hidden() {
        let hints = GrowHints::new();
        let params = LayoutParams::Max(MaxParams::default());
        let rects = compute_layout(&[1, 2, 3], Some(1), &params, &hints, SCREEN);
        assert_eq!(rects[0].1, Rect::ZERO);
        assert_eq!(rects[1].1, SCREEN);
        assert_eq!(rects[2].1, Rect::ZERO);
    }

    #[test]
    fn test_max_without_focus_shows_first() {
        let hints = GrowHints::new();
        let params = LayoutParams::Max(MaxParams::default());
        let rects = compute_layout(&[7, 8], None, &params, &hints, SCREEN);
        assert_eq!(rects[0].1, SCREEN);
        assert_eq!(rects[1].1, Rect::ZERO);
    }

    #[test]
    fn test_neighbor_adjacency() {
        // 3 windows in 3 columns: left/right cross columns, up/down dead-end
        assert_eq!(neighbor(3, 3, 1, Direction::Left), Some(0));
        assert_eq!(neighbor(3, 3, 1, Direction::Right), Some(2));
        assert_eq!(neighbor(3, 3, 0, Direction::Left), None);
        assert_eq!(neighbor(3, 3, 2, Direction::Right), None);
        assert_eq!(neighbor(3, 3, 1, Direction::Up), None);
        assert_eq!(neighbor(3, 3, 1, Direction::Down), None);

        // 5 windows, cap 3: columns [0,1] [2,3] [4]
        assert_eq!(neighbor(5, 3, 0, Direction::Down), Some(1));
        assert_eq!(neighbor(5, 3, 1, Direction::Up), Some(0));
        assert_eq!(neighbor(5, 3, 1, Direction::Right), Some(3));
        // moving right from the bottom of a tall column clamps the row
        assert_eq!(neighbor(5, 3, 3, Direction::Right), Some(4));
        assert_eq!(neighbor(5, 3, 4, Direction::Left), Some(2));
    }

    #[test]
    fn test_empty_members_yields_no_rects() {
        let hints = GrowHints::new();
        let rects = compute_layout(&[], None, &bare_columns(), &hints, SCREEN);
        assert!(rects.is_empty());
    }

    #[test]
    fn test_tiny_screen_never_negative() {
        let hints = GrowHints::new();
        let tiny = Rect::new(0, 0, 30, 20);
        let params = LayoutParams::Columns(ColumnsParams {
            margin: 16,
            border_width: 4,
            ..ColumnsParams::default()
        });
        let rects = compute_layout(&[1, 2, 3], Some(0), &params, &hints, tiny);
        for (_, r) in rects {
            // saturating inset: zero-size is fine, negative is impossible
            assert!(r.width <= 30 && r.height <= 20);
        }
    }

    #[test]
    fn test_ratio_skews_first_column() {
        let hints = GrowHints::new();
        let params = LayoutParams::Columns(ColumnsParams {
            margin: 0,
            border_width: 0,
            ratio: 0.6,
            ..ColumnsParams::default()
        });
        let rects = compute_layout(&[1, 2], Some(0), &params, &hints, SCREEN);
        assert!(rects[0].1.width > rects[1].1.width);
        assert_eq!(rects[0].1.width + rects[1].1.width, 1920);
    }
}
