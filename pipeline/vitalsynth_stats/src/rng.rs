use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Builds the run's random source.
///
/// `Some(seed)` gives a reproducible stream; `None` draws from OS entropy so
/// every production run differs.
pub fn seeded_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(s) => StdRng::seed_from_u64(s),
        None => StdRng::from_entropy(),
    }
}

/// Splits an independent child stream off `parent`.
///
/// Used where one stage owns several independent estimators (one per tree,
/// one per k-means restart) so their streams don't depend on each other's
/// consumption.
pub fn fork_rng(parent: &mut StdRng) -> StdRng {
    StdRng::seed_from_u64(parent.gen())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_same_stream() {
        let mut a = seeded_rng(Some(7));
        let mut b = seeded_rng(Some(7));
        let xa: Vec<u64> = (0..8).map(|_| a.gen()).collect();
        let xb: Vec<u64> = (0..8).map(|_| b.gen()).collect();
        assert_eq!(xa, xb);
    }

    #[test]
    fn forks_are_deterministic_but_distinct() {
        let mut p1 = seeded_rng(Some(1));
        let mut p2 = seeded_rng(Some(1));
        let mut c1 = fork_rng(&mut p1);
        let mut c2 = fork_rng(&mut p2);
        assert_eq!(c1.gen::<u64>(), c2.gen::<u64>());

        let mut sibling = fork_rng(&mut p1);
        assert_ne!(sibling.gen::<u64>(), c2.gen::<u64>());
    }
}
