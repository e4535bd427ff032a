//! Uniform grid for spatial queries.
//!
//! Items are kept in a map and linked into every bucket their bounds touch.

use std::collections::HashMap;

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Bounds {
    pub min_x: f32,
    pub min_y: f32,
    pub max_x: f32,
    pub max_y: f32,
}

impl Bounds {
    pub fn new(min_x: f32, min_y: f32, max_x: f32, max_y: f32) -> Self {
        Self { min_x, min_y, max_x, max_y }
    }

    /// Square of half-width `size` around a center.
    #[inline]
    pub fn from_center(cx: f32, cy: f32, size: f32) -> Self {
        Self {
            min_x: cx - size,
            min_y: cy - size,
            max_x: cx + size,
            max_y: cy + size,
        }
    }

    /// Check if two bounds intersect (touching edges do not count).
    #[inline]
    pub fn intersects(&self, other: &Bounds) -> bool {
        !(other.min_x >= self.max_x
            || other.max_x <= self.min_x
            || other.min_y >= self.max_y
            || other.max_y <= self.min_y)
    }

    #[inline]
    pub fn width(&self) -> f32 {
        self.max_x - self.min_x
    }

    #[inline]
    pub fn height(&self) -> f32 {
        self.max_y - self.min_y
    }
}

/// An item stored in the grid.
#[derive(Debug, Clone)]
pub struct GridItem {
    pub id: u32,
    pub x: f32,
    pub y: f32,
    pub size: f32,
    /// Cached bounding box.
    pub bound: Bounds,
}

impl GridItem {
    #[inline]
    pub fn new(id: u32, x: f32, y: f32, size: f32) -> Self {
        Self {
            id,
            x,
            y,
            size,
            bound: Bounds::from_center(x, y, size),
        }
    }
}

const GRID_SIZE: usize = 32;

/// Inclusive range of buckets an item covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Span {
    min_gx: usize,
    min_gy: usize,
    max_gx: usize,
    max_gy: usize,
}

impl Span {
    fn buckets(self) -> impl Iterator<Item = (usize, usize)> {
        (self.min_gy..=self.max_gy).flat_map(move |gy| (self.min_gx..=self.max_gx).map(move |gx| (gx, gy)))
    }
}

/// Maps world coordinates to bucket indices.
#[derive(Debug, Clone, Copy)]
struct Layout {
    bounds: Bounds,
    cell_w: f32,
    cell_h: f32,
}

impl Layout {
    /// Bucket span covered by `bound`, clamped to the grid.
    #[inline]
    fn span(&self, bound: &Bounds) -> Span {
        let max_index = (GRID_SIZE - 1) as f32;
        let gx = |x: f32| ((x - self.bounds.min_x) / self.cell_w).floor().clamp(0.0, max_index) as usize;
        let gy = |y: f32| ((y - self.bounds.min_y) / self.cell_h).floor().clamp(0.0, max_index) as usize;
        Span {
            min_gx: gx(bound.min_x),
            min_gy: gy(bound.min_y),
            max_gx: gx(bound.max_x),
            max_gy: gy(bound.max_y),
        }
    }
}

struct Slot {
    item: GridItem,
    span: Span,
}

/// Spatial hash over the world bounds.
///
/// Items are relinked only when their bucket span changes.
pub struct SpatialGrid {
    items: HashMap<u32, Slot>,
    layout: Layout,
    buckets: Vec<Vec<u32>>,
}

impl SpatialGrid {
    pub fn new(bounds: Bounds) -> Self {
        Self {
            items: HashMap::with_capacity(1024),
            layout: Layout {
                bounds,
                cell_w: (bounds.width() / GRID_SIZE as f32).max(f32::EPSILON),
                cell_h: (bounds.height() / GRID_SIZE as f32).max(f32::EPSILON),
            },
            buckets: vec![Vec::new(); GRID_SIZE * GRID_SIZE],
        }
    }

    /// Grid for the world rectangle.
    pub fn for_world(min_x: f32, min_y: f32, max_x: f32, max_y: f32) -> Self {
        Self::new(Bounds::new(min_x, min_y, max_x, max_y))
    }

    fn link(&mut self, id: u32, span: Span) {
        for (gx, gy) in span.buckets() {
            self.buckets[gy * GRID_SIZE + gx].push(id);
        }
    }

    fn unlink(&mut self, id: u32, span: Span) {
        for (gx, gy) in span.buckets() {
            let bucket = &mut self.buckets[gy * GRID_SIZE + gx];
            if let Some(pos) = bucket.iter().position(|&other| other == id) {
                bucket.swap_remove(pos);
            }
        }
    }

    /// Insert or replace an item.
    pub fn insert(&mut self, item: GridItem) {
        self.remove(item.id);
        let span = self.layout.span(&item.bound);
        self.link(item.id, span);
        self.items.insert(item.id, Slot { item, span });
    }

    pub fn remove(&mut self, id: u32) -> bool {
        match self.items.remove(&id) {
            Some(slot) => {
                self.unlink(id, slot.span);
                true
            }
            None => false,
        }
    }

    /// Move or resize an item; unknown ids are ignored.
    pub fn update(&mut self, id: u32, x: f32, y: f32, size: f32) {
        let Some(slot) = self.items.get_mut(&id) else {
            return;
        };
        let item = GridItem::new(id, x, y, size);
        let span = self.layout.span(&item.bound);
        let old = slot.span;
        slot.item = item;
        slot.span = span;
        if old != span {
            self.unlink(id, old);
            self.link(id, span);
        }
    }

    /// Ids of every item whose bounds intersect `bound`.
    pub fn find_in_bounds(&self, bound: &Bounds) -> Vec<u32> {
        let mut result = Vec::new();
        self.visit(bound, |item| {
            result.push(item.id);
            false
        });
        result
    }

    /// Ids of every item whose bounds intersect the square around a point.
    pub fn find_in_radius(&self, cx: f32, cy: f32, radius: f32) -> Vec<u32> {
        self.find_in_bounds(&Bounds::from_center(cx, cy, radius))
    }

    /// Whether any item intersecting `bound` satisfies `predicate`.
    pub fn any(&self, bound: &Bounds, predicate: impl FnMut(&GridItem) -> bool) -> bool {
        self.visit(bound, predicate)
    }

    /// Walk intersecting items once each until `f` returns true.
    ///
    /// An item spanning several buckets is only visited from the first bucket
    /// shared by its span and the query span.
    fn visit(&self, bound: &Bounds, mut f: impl FnMut(&GridItem) -> bool) -> bool {
        let query = self.layout.span(bound);
        for (gx, gy) in query.buckets() {
            for id in &self.buckets[gy * GRID_SIZE + gx] {
                let Some(slot) = self.items.get(id) else { continue };
                let owner = (slot.span.min_gx.max(query.min_gx), slot.span.min_gy.max(query.min_gy));
                if owner != (gx, gy) {
                    continue;
                }
                if slot.item.bound.intersects(bound) && f(&slot.item) {
                    return true;
                }
            }
        }
        false
    }

    #[inline]
    pub fn get(&self, id: u32) -> Option<&GridItem> {
        self.items.get(&id).map(|slot| &slot.item)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl std::fmt::Debug for SpatialGrid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpatialGrid")
            .field("items", &self.items.len())
            .field("bounds", &self.layout.bounds)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounds_intersects() {
        let a = Bounds::new(0.0, 0.0, 10.0, 10.0);
        let b = Bounds::new(5.0, 5.0, 15.0, 15.0);
        let c = Bounds::new(20.0, 20.0, 30.0, 30.0);

        assert!(a.intersects(&b));
        assert!(b.intersects(&a));
        assert!(!a.intersects(&c));
        assert!(!c.intersects(&a));
    }

    #[test]
    fn test_grid_insert_find() {
        let mut grid = SpatialGrid::for_world(-100.0, -100.0, 100.0, 100.0);

        grid.insert(GridItem::new(1, 0.0, 0.0, 10.0));
        grid.insert(GridItem::new(2, 50.0, 50.0, 10.0));
        grid.insert(GridItem::new(3, -50.0, -50.0, 10.0));
        assert_eq!(grid.len(), 3);

        let found = grid.find_in_radius(0.0, 0.0, 20.0);
        assert_eq!(found, vec![1]);

        let found = grid.find_in_radius(50.0, 50.0, 20.0);
        assert_eq!(found, vec![2]);
    }

    #[test]
    fn large_items_are_reported_once() {
        let mut grid = SpatialGrid::for_world(-100.0, -100.0, 100.0, 100.0);
        grid.insert(GridItem::new(7, 0.0, 0.0, 90.0));
        let found = grid.find_in_radius(0.0, 0.0, 100.0);
        assert_eq!(found, vec![7]);
    }

    #[test]
    fn update_and_remove_take_effect_on_next_query() {
        let mut grid = SpatialGrid::for_world(-100.0, -100.0, 100.0, 100.0);
        grid.insert(GridItem::new(1, 0.0, 0.0, 5.0));
        assert!(grid.find_in_radius(60.0, 60.0, 10.0).is_empty());

        grid.update(1, 60.0, 60.0, 5.0);
        assert_eq!(grid.find_in_radius(60.0, 60.0, 10.0), vec![1]);

        assert!(grid.remove(1));
        assert!(!grid.remove(1));
        assert!(grid.find_in_radius(60.0, 60.0, 10.0).is_empty());
    }

    #[test]
    fn moves_relink_only_touched_buckets() {
        let mut grid = SpatialGrid::for_world(-160.0, -160.0, 160.0, 160.0);
        grid.insert(GridItem::new(1, 0.0, 0.0, 4.0));
        let linked = |grid: &SpatialGrid| grid.buckets.iter().map(Vec::len).sum::<usize>();
        let before = linked(&grid);

        // Same buckets, new position.
        grid.update(1, 1.0, 1.0, 4.0);
        assert_eq!(linked(&grid), before);
        assert_eq!(grid.get(1).map(|item| item.x), Some(1.0));

        // Across the map, then back.
        grid.update(1, 120.0, -120.0, 4.0);
        assert_eq!(grid.find_in_radius(120.0, -120.0, 5.0), vec![1]);
        assert!(grid.find_in_radius(0.0, 0.0, 5.0).is_empty());

        // Re-inserting the same id replaces it.
        grid.insert(GridItem::new(1, -50.0, 50.0, 4.0));
        assert_eq!(grid.len(), 1);
        assert!(grid.find_in_radius(120.0, -120.0, 5.0).is_empty());

        assert!(grid.remove(1));
        assert_eq!(linked(&grid), 0);
    }

    #[test]
    fn any_stops_on_match() {
        let mut grid = SpatialGrid::for_world(-100.0, -100.0, 100.0, 100.0);
        grid.insert(GridItem::new(1, 0.0, 0.0, 5.0));
        grid.insert(GridItem::new(2, 2.0, 2.0, 5.0));
        let area = Bounds::from_center(0.0, 0.0, 10.0);
        assert!(grid.any(&area, |item| item.id == 2));
        assert!(!grid.any(&area, |item| item.id == 3));
    }
}
