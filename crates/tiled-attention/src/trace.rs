//! Append-only record of intermediate outputs, one snapshot per tile update.
//!
//! Snapshots taken before the last column block hold partially accumulated
//! rows. They are for inspection only; the engine never reads them back.

use crate::matrix::Matrix;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Trace {
    snapshots: Vec<Matrix>,
}

impl Trace {
    /// Empty trace sized for `updates` snapshots.
    #[must_use]
    pub fn with_capacity(updates: usize) -> Self {
        Self {
            snapshots: Vec::with_capacity(updates),
        }
    }

    pub(crate) fn push(&mut self, snapshot: Matrix) {
        self.snapshots.push(snapshot);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Matrix> {
        self.snapshots.get(index)
    }

    #[must_use]
    pub fn last(&self) -> Option<&Matrix> {
        self.snapshots.last()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Matrix> {
        self.snapshots.iter()
    }

    #[must_use]
    pub fn into_inner(self) -> Vec<Matrix> {
        self.snapshots
    }
}

impl<'a> IntoIterator for &'a Trace {
    type Item = &'a Matrix;
    type IntoIter = std::slice::Iter<'a, Matrix>;

    fn into_iter(self) -> Self::IntoIter {
        self.snapshots.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_preserves_order() {
        let mut t = Trace::with_capacity(2);
        assert!(t.is_empty());
        t.push(Matrix::zeros(1, 1));
        t.push(Matrix::from_vec(1, 1, vec![2.0]).unwrap());
        assert_eq!(t.len(), 2);
        assert_eq!(t.get(0).unwrap().as_slice(), &[0.0]);
        assert_eq!(t.last().unwrap().as_slice(), &[2.0]);
        assert_eq!((&t).into_iter().count(), 2);
        assert_eq!(t.into_inner().len(), 2);
    }
}
