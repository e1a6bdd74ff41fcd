//! Index permutations over `[0, n)`.
//!
//! A permutation is stored as `new_indices[old] = new`. Renumbering results,
//! pattern renumbering, and the tests all agree on that direction.

use crate::sparsity_error::SparsityError;

/// Check that `perm` is a bijection on `[0, n)`.
///
/// # Errors
/// `InvalidPermutation` naming the first offending position.
pub fn validate_permutation(perm: &[usize], n: usize) -> Result<(), SparsityError> {
    if perm.len() != n {
        return Err(SparsityError::InvalidPermutation(format!(
            "expected {n} entries, got {}",
            perm.len()
        )));
    }
    let mut seen = vec![false; n];
    for (i, &p) in perm.iter().enumerate() {
        if p >= n {
            return Err(SparsityError::InvalidPermutation(format!(
                "entry {i} maps to {p}, outside [0, {n})"
            )));
        }
        if std::mem::replace(&mut seen[p], true) {
            return Err(SparsityError::InvalidPermutation(format!(
                "index {p} is used twice"
            )));
        }
    }
    Ok(())
}

/// `perm` read backwards: `inverse[perm[i]] = i`.
pub fn invert_permutation(perm: &[usize]) -> Result<Vec<usize>, SparsityError> {
    validate_permutation(perm, perm.len())?;
    let mut inverse = vec![0; perm.len()];
    for (i, &p) in perm.iter().enumerate() {
        inverse[p] = i;
    }
    Ok(inverse)
}

pub fn identity_permutation(n: usize) -> Vec<usize> {
    (0..n).collect()
}
