use rand::{prelude::*, rngs::SmallRng};
use rand_distr::{Distribution, Uniform};

pub fn small_rng(seed: u64) -> SmallRng {
    SmallRng::seed_from_u64(seed)
}

/// Uniformly picks an index into a collection of `len` items, or `None` if it's empty.
pub fn choose_index<R: Rng + ?Sized>(rng: &mut R, len: usize) -> Option<usize> {
    if len == 0 {
        return None;
    }

    Some(Uniform::from(0..len).sample(rng))
}

/// Uniformly picks one of `items`.
pub fn choose<'a, T, R: Rng + ?Sized>(rng: &mut R, items: &'a [T]) -> Option<&'a T> {
    choose_index(rng, items.len()).map(|i| &items[i])
}
