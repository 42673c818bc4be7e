//! Tree-path addressing for serializer trees.

use std::cmp::Ordering;
use std::fmt;

use crate::error::{SchemaError, SchemaResult};

/// Maximum nesting depth of a serializer tree.
///
/// Schemas never nest deeper than this; the bound comes from the recorded
/// stream format, not from any property of this implementation.
pub const MAX_FIELD_PATH_DEPTH: usize = 6;

/// An ordered sequence of field indices addressing a node in a serializer
/// tree, plus the cursor position of the final index.
///
/// A `FieldPath` doubles as the mutable cursor of the field-path operation
/// state machine: operations mutate one instance in place and the decoder
/// snapshots it (it is `Copy`) at every emission point.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct FieldPath {
    path: [i32; MAX_FIELD_PATH_DEPTH],
    last: usize,
}

impl FieldPath {
    /// The conceptual "before the first path" cursor state.
    ///
    /// The first component starts at -1 so that an increment operation as
    /// the very first instruction yields path `0`.
    #[must_use]
    pub const fn root() -> Self {
        Self {
            path: [-1, 0, 0, 0, 0, 0],
            last: 0,
        }
    }

    /// Builds a path from explicit indices.
    ///
    /// Returns `None` if `indices` is empty or longer than
    /// [`MAX_FIELD_PATH_DEPTH`].
    #[must_use]
    pub fn from_indices(indices: &[i32]) -> Option<Self> {
        if indices.is_empty() || indices.len() > MAX_FIELD_PATH_DEPTH {
            return None;
        }
        let mut path = [0i32; MAX_FIELD_PATH_DEPTH];
        path[..indices.len()].copy_from_slice(indices);
        Some(Self {
            path,
            last: indices.len() - 1,
        })
    }

    /// Returns the position of the final index.
    #[must_use]
    pub const fn last(&self) -> usize {
        self.last
    }

    /// Returns the number of active components.
    #[must_use]
    pub const fn depth(&self) -> usize {
        self.last + 1
    }

    /// Returns the component at `pos`.
    ///
    /// # Panics
    ///
    /// Panics if `pos >= MAX_FIELD_PATH_DEPTH`.
    #[must_use]
    pub const fn get(&self, pos: usize) -> i32 {
        self.path[pos]
    }

    /// Returns the final component.
    #[must_use]
    pub const fn last_index(&self) -> i32 {
        self.path[self.last]
    }

    /// Returns the active components as a slice.
    #[must_use]
    pub fn components(&self) -> &[i32] {
        &self.path[..=self.last]
    }

    /// Sets the component at `pos`.
    ///
    /// # Panics
    ///
    /// Panics if `pos >= MAX_FIELD_PATH_DEPTH`.
    pub fn set(&mut self, pos: usize, value: i32) {
        self.path[pos] = value;
    }

    /// Adds `delta` to the component at `pos`, saturating on overflow.
    ///
    /// # Panics
    ///
    /// Panics if `pos >= MAX_FIELD_PATH_DEPTH`.
    pub fn bump(&mut self, pos: usize, delta: i32) {
        self.path[pos] = self.path[pos].saturating_add(delta);
    }

    /// Descends one level, setting the new final component to `value`.
    pub fn push(&mut self, value: i32) -> SchemaResult<()> {
        if self.last + 1 >= MAX_FIELD_PATH_DEPTH {
            return Err(SchemaError::PathTooDeep {
                depth: self.last + 2,
            });
        }
        self.last += 1;
        self.path[self.last] = value;
        Ok(())
    }

    /// Ascends `n` levels, zeroing the vacated components.
    ///
    /// Vacated components must read as zero: several operations descend with
    /// a relative `+=` against whatever the slot held.
    pub fn pop(&mut self, n: usize) -> SchemaResult<()> {
        if n > self.last {
            return Err(SchemaError::PathUnderflow {
                popped: n,
                depth: self.depth(),
            });
        }
        for _ in 0..n {
            self.path[self.last] = 0;
            self.last -= 1;
        }
        Ok(())
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, component) in self.components().iter().enumerate() {
            if i > 0 {
                write!(f, "/")?;
            }
            write!(f, "{component}")?;
        }
        Ok(())
    }
}

impl fmt::Debug for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FieldPath({self})")
    }
}

impl Ord for FieldPath {
    /// Lexicographic order over the active components; a proper prefix sorts
    /// before its extensions. Operations in the instruction stream are
    /// defined relative to the previous path in this order.
    fn cmp(&self, other: &Self) -> Ordering {
        self.components().cmp(other.components())
    }
}

impl PartialOrd for FieldPath {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn root_cursor_state() {
        let fp = FieldPath::root();
        assert_eq!(fp.last(), 0);
        assert_eq!(fp.get(0), -1);
        assert_eq!(fp.depth(), 1);
    }

    #[test]
    fn root_plus_one_is_first_field() {
        let mut fp = FieldPath::root();
        fp.bump(0, 1);
        assert_eq!(fp.components(), &[0]);
    }

    #[test]
    fn push_and_pop() {
        let mut fp = FieldPath::from_indices(&[2]).unwrap();
        fp.push(5).unwrap();
        assert_eq!(fp.components(), &[2, 5]);
        fp.pop(1).unwrap();
        assert_eq!(fp.components(), &[2]);
    }

    #[test]
    fn pop_zeroes_vacated_components() {
        let mut fp = FieldPath::from_indices(&[1, 7, 9]).unwrap();
        fp.pop(2).unwrap();
        fp.push(0).unwrap();
        // The vacated slot must not leak its previous value.
        assert_eq!(fp.components(), &[1, 0]);
    }

    #[test]
    fn push_past_max_depth_fails() {
        let mut fp = FieldPath::from_indices(&[0, 0, 0, 0, 0, 0]).unwrap();
        let err = fp.push(0).unwrap_err();
        assert!(matches!(err, SchemaError::PathTooDeep { depth: 7 }));
    }

    #[test]
    fn pop_past_root_fails() {
        let mut fp = FieldPath::from_indices(&[1, 2]).unwrap();
        let err = fp.pop(2).unwrap_err();
        assert!(matches!(
            err,
            SchemaError::PathUnderflow {
                popped: 2,
                depth: 2
            }
        ));
    }

    #[test]
    fn from_indices_bounds() {
        assert!(FieldPath::from_indices(&[]).is_none());
        assert!(FieldPath::from_indices(&[0; 7]).is_none());
        assert!(FieldPath::from_indices(&[0; 6]).is_some());
    }

    #[test]
    fn display_joins_with_slashes() {
        let fp = FieldPath::from_indices(&[1, 0, 4]).unwrap();
        assert_eq!(fp.to_string(), "1/0/4");
    }

    #[test]
    fn prefix_sorts_before_extension() {
        let short = FieldPath::from_indices(&[1]).unwrap();
        let long = FieldPath::from_indices(&[1, 0]).unwrap();
        assert!(short < long);
    }

    #[test]
    fn lexicographic_order() {
        let a = FieldPath::from_indices(&[0]).unwrap();
        let b = FieldPath::from_indices(&[0, 9]).unwrap();
        let c = FieldPath::from_indices(&[1, 0]).unwrap();
        let d = FieldPath::from_indices(&[1, 1]).unwrap();
        assert!(a < b);
        assert!(b < c);
        assert!(c < d);
    }

    #[test]
    fn equal_components_are_equal_paths() {
        let mut a = FieldPath::from_indices(&[3, 4, 5]).unwrap();
        a.pop(2).unwrap();
        let b = FieldPath::from_indices(&[3]).unwrap();
        assert_eq!(a, b);
    }

    proptest! {
        #[test]
        fn ord_matches_component_slices(
            a in proptest::collection::vec(0i32..64, 1..=6),
            b in proptest::collection::vec(0i32..64, 1..=6),
        ) {
            let fa = FieldPath::from_indices(&a).unwrap();
            let fb = FieldPath::from_indices(&b).unwrap();
            prop_assert_eq!(fa.cmp(&fb), a.cmp(&b));
        }

        #[test]
        fn push_pop_restores(
            base in proptest::collection::vec(0i32..64, 1..=5),
            value in 0i32..64,
        ) {
            let original = FieldPath::from_indices(&base).unwrap();
            let mut fp = original;
            fp.push(value).unwrap();
            prop_assert_eq!(fp.last_index(), value);
            fp.pop(1).unwrap();
            prop_assert_eq!(fp, original);
        }
    }
}
