use std::collections::HashMap;

/// Integer cell coordinates, `floor(axis / cell_size)` on each axis.
pub type CellKey = (i32, i32, i32);

#[derive(Clone, Debug)]
/// Uniform spatial hash over 3D points stored in a flat `[x, y, z, ...]` array.
///
/// Maps each occupied cell to the entity indices inside it and keeps a reverse
/// map from entity index to its current cell, so a single moved entity can be
/// re-bucketed without touching the rest of the grid.
///
/// # Query contract
/// [`query_near`](Self::query_near) returns every entity in the 3×3×3 block of
/// cells around the query point. When `cell_size` is at least twice the
/// largest perception radius in use, that block contains every entity within
/// the radius. The result is a superset: callers filter by exact distance.
///
/// # Performance Characteristics
/// - `update_one`: O(1) amortized (O(bucket size) for the removal scan)
/// - `rebuild`: O(entity_count)
/// - `query_near`: O(entities in 27 cells)
///
/// # Examples
/// ```
/// use murmur_core::grid::SpatialGrid;
///
/// let positions = vec![1.0, 1.0, 1.0, 2.0, 2.0, 2.0, 90.0, 90.0, 90.0];
/// let mut grid = SpatialGrid::new(10.0);
/// grid.rebuild(&positions);
///
/// let nearby = grid.query_near(1.5, 1.5, 1.5);
/// assert_eq!(nearby.len(), 2);
/// ```
pub struct SpatialGrid {
    cell_size: f32,
    cells: HashMap<CellKey, Vec<usize>>,
    entity_cells: Vec<Option<CellKey>>,
    tracked: usize,
}

impl SpatialGrid {
    /// Creates an empty grid.
    ///
    /// # Parameters
    /// - `cell_size`: Edge length of each cubic cell in world units. Should be
    ///   at least twice the largest perception radius queried against it.
    pub fn new(cell_size: f32) -> Self {
        debug_assert!(
            cell_size > 0.0 && cell_size.is_finite(),
            "cell size must be positive"
        );
        Self {
            cell_size,
            cells: HashMap::new(),
            entity_cells: Vec::new(),
            tracked: 0,
        }
    }

    pub fn cell_size(&self) -> f32 {
        self.cell_size
    }

    /// Computes the cell key for a world coordinate.
    ///
    /// Non-finite coordinates and coordinates whose cell index would overflow
    /// `i32` have no cell and return `None`.
    #[inline]
    pub fn cell_key(&self, x: f32, y: f32, z: f32) -> Option<CellKey> {
        Some((
            self.axis_cell(x)?,
            self.axis_cell(y)?,
            self.axis_cell(z)?,
        ))
    }

    #[inline]
    fn axis_cell(&self, v: f32) -> Option<i32> {
        if !v.is_finite() {
            return None;
        }
        let c = (v / self.cell_size).floor();
        if c.abs() >= i32::MAX as f32 {
            return None;
        }
        Some(c as i32)
    }

    #[inline]
    fn key_for_index(&self, index: usize, positions: &[f32]) -> Option<CellKey> {
        let offset = index * 3;
        self.cell_key(
            positions[offset],
            positions[offset + 1],
            positions[offset + 2],
        )
    }

    /// Cell the entity is currently bucketed in, if any.
    pub fn cell_of(&self, index: usize) -> Option<CellKey> {
        self.entity_cells.get(index).copied().flatten()
    }

    /// Number of entities currently bucketed.
    pub fn len(&self) -> usize {
        self.tracked
    }

    pub fn is_empty(&self) -> bool {
        self.tracked == 0
    }

    /// Number of non-empty cells.
    pub fn bucket_count(&self) -> usize {
        self.cells.len()
    }

    pub fn clear(&mut self) {
        self.cells.clear();
        self.entity_cells.clear();
        self.tracked = 0;
    }

    /// Clears the grid and reinserts every entity in `positions`.
    pub fn rebuild(&mut self, positions: &[f32]) {
        self.rebuild_where(positions, |_| true);
    }

    /// Clears the grid and reinserts the entities for which `keep` is true.
    pub fn rebuild_where<F>(&mut self, positions: &[f32], keep: F)
    where
        F: Fn(usize) -> bool,
    {
        self.clear();
        let count = positions.len() / 3;
        self.entity_cells.resize(count, None);
        for index in 0..count {
            if !keep(index) {
                continue;
            }
            if let Some(key) = self.key_for_index(index, positions) {
                self.cells.entry(key).or_default().push(index);
                self.entity_cells[index] = Some(key);
                self.tracked += 1;
            }
        }
    }

    /// Re-buckets one entity after its position changed.
    ///
    /// A no-op when the entity is still in the same cell. Untracked entities
    /// are inserted.
    pub fn update_one(&mut self, index: usize, positions: &[f32]) {
        let new_key = self.key_for_index(index, positions);
        let old_key = self.cell_of(index);
        if old_key == new_key {
            return;
        }
        if let Some(old) = old_key {
            self.detach(index, old);
        }
        if self.entity_cells.len() <= index {
            self.entity_cells.resize(index + 1, None);
        }
        if let Some(key) = new_key {
            self.cells.entry(key).or_default().push(index);
            self.tracked += 1;
        }
        self.entity_cells[index] = new_key;
    }

    pub fn update_many(&mut self, indices: &[usize], positions: &[f32]) {
        for &index in indices {
            self.update_one(index, positions);
        }
    }

    /// Stops tracking an entity. Returns whether it was tracked.
    pub fn remove(&mut self, index: usize) -> bool {
        match self.cell_of(index) {
            Some(key) => {
                self.detach(index, key);
                self.entity_cells[index] = None;
                true
            }
            None => false,
        }
    }

    fn detach(&mut self, index: usize, key: CellKey) {
        if let Some(bucket) = self.cells.get_mut(&key) {
            if let Some(pos) = bucket.iter().position(|&i| i == index) {
                bucket.swap_remove(pos);
                self.tracked -= 1;
            }
            if bucket.is_empty() {
                self.cells.remove(&key);
            }
        }
    }

    /// Entities in the 27 cells around `(x, y, z)`.
    pub fn query_near(&self, x: f32, y: f32, z: f32) -> Vec<usize> {
        let mut result = Vec::new();
        self.query_near_into(x, y, z, &mut result);
        result
    }

    /// Allocation-free form of [`query_near`](Self::query_near); clears `result` first.
    #[inline]
    pub fn query_near_into(&self, x: f32, y: f32, z: f32, result: &mut Vec<usize>) {
        result.clear();
        let Some((cx, cy, cz)) = self.cell_key(x, y, z) else {
            return;
        };
        for dx in -1..=1 {
            for dy in -1..=1 {
                for dz in -1..=1 {
                    let key = (
                        cx.saturating_add(dx),
                        cy.saturating_add(dy),
                        cz.saturating_add(dz),
                    );
                    if let Some(bucket) = self.cells.get(&key) {
                        result.extend_from_slice(bucket);
                    }
                }
            }
        }
    }

    /// Checks that every tracked entity sits in the cell its position implies.
    pub fn is_consistent_with(&self, positions: &[f32]) -> bool {
        self.entity_cells.iter().enumerate().all(|(index, key)| {
            key.is_none() || *key == self.key_for_index(index, positions)
        })
    }
}
