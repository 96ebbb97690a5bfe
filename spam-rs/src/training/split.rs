//! Deterministic train/test split

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::error::{Result, SpamError};

/// Shuffle `items` with `seed` and hold out `ceil(len * test_size)` of them.
///
/// Returns `(train, test)`. A `test_size` of zero returns everything as
/// training data.
pub fn train_test_split<T: Clone>(items: &[T], test_size: f64, seed: u64) -> Result<(Vec<T>, Vec<T>)> {
    if !(0.0..1.0).contains(&test_size) {
        return Err(SpamError::Config(format!(
            "test_size must be in [0, 1), got {}",
            test_size
        )));
    }

    let n = items.len();
    let n_test = (n as f64 * test_size).ceil() as usize;
    if n_test > 0 && n_test >= n {
        return Err(SpamError::Corpus(format!(
            "{} examples are too few to hold out {} for testing",
            n, n_test
        )));
    }

    let mut indices: Vec<usize> = (0..n).collect();
    indices.shuffle(&mut StdRng::seed_from_u64(seed));

    let test = indices[..n_test].iter().map(|&i| items[i].clone()).collect();
    let train = indices[n_test..].iter().map(|&i| items[i].clone()).collect();
    Ok((train, test))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_sizes() {
        let items: Vec<u32> = (0..10).collect();
        let (train, test) = train_test_split(&items, 0.2, 42).unwrap();
        assert_eq!(train.len(), 8);
        assert_eq!(test.len(), 2);

        let mut all: Vec<u32> = train.iter().chain(&test).copied().collect();
        all.sort();
        assert_eq!(all, items);
    }

    #[test]
    fn test_split_rounds_test_size_up() {
        let items: Vec<u32> = (0..4).collect();
        let (train, test) = train_test_split(&items, 0.2, 1).unwrap();
        assert_eq!((train.len(), test.len()), (3, 1));
    }

    #[test]
    fn test_split_is_deterministic() {
        let items: Vec<u32> = (0..50).collect();
        assert_eq!(
            train_test_split(&items, 0.3, 7).unwrap(),
            train_test_split(&items, 0.3, 7).unwrap()
        );
    }

    #[test]
    fn test_zero_test_size() {
        let items = vec!["a", "b"];
        let (train, test) = train_test_split(&items, 0.0, 42).unwrap();
        assert_eq!(train.len(), 2);
        assert!(test.is_empty());
    }

    #[test]
    fn test_invalid_test_size() {
        let items = vec![1, 2, 3];
        assert!(matches!(train_test_split(&items, 1.0, 42), Err(SpamError::Config(_))));
        assert!(matches!(train_test_split(&[1], 0.5, 42), Err(SpamError::Corpus(_))));
    }
}
