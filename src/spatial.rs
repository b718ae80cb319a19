//! Nearest-node lookups over a fixed set of positions, backed by an R-tree.

use crate::geometry::Vector2F;

use rstar::{PointDistance, RTree, RTreeObject, AABB};
use std::fmt;

#[derive(Clone, Debug)]
struct IndexedPoint<T> {
    position: [f32; 2],
    value: T,
}

impl<T> RTreeObject for IndexedPoint<T> {
    type Envelope = AABB<[f32; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_point(self.position)
    }
}

impl<T> PointDistance for IndexedPoint<T> {
    fn distance_2(&self, point: &[f32; 2]) -> f32 {
        let dx = point[0] - self.position[0];
        let dy = point[1] - self.position[1];

        dx * dx + dy * dy
    }

    fn contains_point(&self, point: &[f32; 2]) -> bool {
        self.position == *point
    }
}

/// Built once with `bulk_load`, never mutated.
#[derive(Clone)]
pub struct SpatialIndex<T> {
    tree: RTree<IndexedPoint<T>>,
}

impl<T: Copy + Ord> SpatialIndex<T> {
    pub fn build(points: impl IntoIterator<Item = (Vector2F, T)>) -> Self {
        let entries = points
            .into_iter()
            .map(|(p, value)| IndexedPoint {
                position: [p.x, p.y],
                value,
            })
            .collect();

        SpatialIndex {
            tree: RTree::bulk_load(entries),
        }
    }

    pub fn len(&self) -> usize {
        self.tree.size()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }

    /// The value closest to `query` by Euclidean distance. Among equally close values the smallest
    /// wins. `None` only when the index is empty.
    pub fn nearest(&self, query: Vector2F) -> Option<T> {
        let query = [query.x, query.y];
        let mut by_distance = self.tree.nearest_neighbor_iter(&query);
        let first = by_distance.next()?;
        let best_d2 = first.distance_2(&query);

        let nearest = by_distance
            .take_while(|e| e.distance_2(&query) == best_d2)
            .fold(first.value, |best, e| best.min(e.value));

        Some(nearest)
    }
}

impl<T> fmt::Debug for SpatialIndex<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpatialIndex")
            .field("len", &self.tree.size())
            .finish()
    }
}
