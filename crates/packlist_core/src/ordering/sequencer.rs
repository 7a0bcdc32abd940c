//! Single-element list reinsertion.

use std::error::Error;
use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReorderError {
    /// `index` does not address an element of a sequence of length `len`.
    IndexOutOfRange { index: usize, len: usize },
}

impl Display for ReorderError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::IndexOutOfRange { index, len } => {
                write!(f, "index {index} out of range for sequence of length {len}")
            }
        }
    }
}

impl Error for ReorderError {}

/// Moves the element at `start_index` to `finish_index`.
///
/// Both indices address the same length-n input. Every other element keeps
/// its relative order; elements between the two indices shift by one.
///
/// # Errors
/// - `ReorderError::IndexOutOfRange` when either index is `>= sequence.len()`.
pub fn reorder<T>(
    mut sequence: Vec<T>,
    start_index: usize,
    finish_index: usize,
) -> Result<Vec<T>, ReorderError> {
    let len = sequence.len();
    for index in [start_index, finish_index] {
        if index >= len {
            return Err(ReorderError::IndexOutOfRange { index, len });
        }
    }
    if start_index == finish_index {
        return Ok(sequence);
    }

    let moved = sequence.remove(start_index);
    sequence.insert(finish_index, moved);
    Ok(sequence)
}

#[cfg(test)]
mod tests {
    use super::{reorder, ReorderError};

    fn letters(n: usize) -> Vec<char> {
        ('a'..='z').take(n).collect()
    }

    #[test]
    fn moves_element_to_front() {
        let result = reorder(vec!['A', 'B', 'C', 'D'], 2, 0).unwrap();
        assert_eq!(result, vec!['C', 'A', 'B', 'D']);
    }

    #[test]
    fn moves_element_to_logical_end() {
        let result = reorder(vec!['A', 'B', 'C', 'D'], 0, 3).unwrap();
        assert_eq!(result, vec!['B', 'C', 'D', 'A']);
    }

    #[test]
    fn same_index_returns_input_unchanged() {
        for n in 1..=5 {
            for index in 0..n {
                assert_eq!(reorder(letters(n), index, index).unwrap(), letters(n));
            }
        }
    }

    #[test]
    fn every_move_is_a_permutation_that_keeps_relative_order() {
        for n in 1..=6 {
            let original = letters(n);
            for start in 0..n {
                for finish in 0..n {
                    let result = reorder(original.clone(), start, finish).unwrap();
                    assert_eq!(result.len(), n);
                    assert_eq!(result[finish], original[start]);

                    let mut sorted = result.clone();
                    sorted.sort_unstable();
                    assert_eq!(sorted, original);

                    let others_before: Vec<char> = original
                        .iter()
                        .copied()
                        .filter(|value| *value != original[start])
                        .collect();
                    let others_after: Vec<char> = result
                        .iter()
                        .copied()
                        .filter(|value| *value != original[start])
                        .collect();
                    assert_eq!(others_before, others_after);
                }
            }
        }
    }

    #[test]
    fn moving_back_restores_original() {
        for n in 1..=6 {
            for a in 0..n {
                for b in 0..n {
                    let moved = reorder(letters(n), a, b).unwrap();
                    assert_eq!(reorder(moved, b, a).unwrap(), letters(n));
                }
            }
        }
    }

    #[test]
    fn out_of_range_indices_are_rejected() {
        assert_eq!(
            reorder(letters(3), 3, 0),
            Err(ReorderError::IndexOutOfRange { index: 3, len: 3 })
        );
        assert_eq!(
            reorder(letters(3), 0, 5),
            Err(ReorderError::IndexOutOfRange { index: 5, len: 3 })
        );
        assert_eq!(
            reorder(Vec::<char>::new(), 0, 0),
            Err(ReorderError::IndexOutOfRange { index: 0, len: 0 })
        );
    }
}
