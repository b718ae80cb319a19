use fnv::FnvHashMap;

/// A map keyed by unordered pairs of indices: `(i, j)` and `(j, i)` name the same entry.
#[derive(Clone, Debug)]
pub struct SymmetricMap<T> {
    map: FnvHashMap<(usize, usize), T>,
}

impl<T> SymmetricMap<T> {
    pub fn new() -> Self {
        SymmetricMap {
            map: FnvHashMap::default(),
        }
    }

    fn order_indices(i1: usize, i2: usize) -> (usize, usize) {
        if i1 > i2 {
            (i2, i1)
        } else {
            (i1, i2)
        }
    }

    pub fn get(&self, i1: usize, i2: usize) -> Option<&T> {
        self.map.get(&Self::order_indices(i1, i2))
    }

    pub fn insert(&mut self, i1: usize, i2: usize, value: T) -> Option<T> {
        self.map.insert(Self::order_indices(i1, i2), value)
    }

    pub fn values(&self) -> impl Iterator<Item = &T> {
        self.map.values()
    }
}

impl<T> Default for SymmetricMap<T> {
    fn default() -> Self {
        Self::new()
    }
}
