//! Accumulated value state for a decoded record.
//!
//! State mirrors the serializer tree: one slot per field, with nested
//! state for records and arrays. Slots start empty and fill as deltas
//! arrive, so a record's state is the union of every delta applied to
//! it so far.

use schema::{Field, FieldKind, FieldPath, Serializer};

use crate::error::{DecodeError, DecodeResult};
use crate::value::FieldValue;

/// Contents of one field slot.
#[derive(Debug, Clone, PartialEq, Default)]
enum Slot {
    /// No value has arrived for this field yet.
    #[default]
    Empty,
    /// A decoded leaf value.
    Value(FieldValue),
    /// State for a nested record or array.
    Nested(RecordState),
}

/// Value state for one record (or one array's elements).
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RecordState {
    slots: Vec<Slot>,
}

impl RecordState {
    /// Creates state with `capacity` empty slots.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            slots: vec![Slot::Empty; capacity],
        }
    }

    /// Creates state sized to a serializer's field list.
    #[must_use]
    pub fn for_serializer(serializer: &Serializer) -> Self {
        Self::new(serializer.fields().len())
    }

    /// Number of slots.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Returns `true` if there are no slots.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Returns `true` if the slot at `index` holds anything.
    #[must_use]
    pub fn has(&self, index: usize) -> bool {
        !matches!(self.slots.get(index), None | Some(Slot::Empty))
    }

    /// Returns the leaf value at `index`, if one is present.
    #[must_use]
    pub fn value(&self, index: usize) -> Option<&FieldValue> {
        match self.slots.get(index) {
            Some(Slot::Value(value)) => Some(value),
            _ => None,
        }
    }

    /// Returns the nested state at `index`, if one is present.
    #[must_use]
    pub fn nested(&self, index: usize) -> Option<&Self> {
        match self.slots.get(index) {
            Some(Slot::Nested(state)) => Some(state),
            _ => None,
        }
    }

    /// Stores a leaf value, replacing whatever the slot held.
    pub fn set_value(&mut self, index: usize, value: FieldValue) {
        self.ensure_len(index + 1);
        self.slots[index] = Slot::Value(value);
    }

    /// Clears the slot at `index`.
    pub fn clear(&mut self, index: usize) {
        if let Some(slot) = self.slots.get_mut(index) {
            *slot = Slot::Empty;
        }
    }

    /// Returns the nested state at `index`, creating it with
    /// `capacity` slots if the slot held anything else.
    pub fn nested_mut(&mut self, index: usize, capacity: usize) -> &mut Self {
        self.ensure_len(index + 1);
        if !matches!(self.slots[index], Slot::Nested(_)) {
            self.slots[index] = Slot::Nested(Self::new(capacity));
        }
        match &mut self.slots[index] {
            Slot::Nested(state) => state,
            _ => unreachable!(),
        }
    }

    /// Resizes the nested state at `index` to exactly `len` slots,
    /// creating it if necessary. Used for array cardinality updates;
    /// shrinking discards the trailing elements.
    pub fn resize_nested(&mut self, index: usize, len: usize) {
        let nested = self.nested_mut(index, len);
        nested.slots.resize(len, Slot::Empty);
    }

    fn ensure_len(&mut self, len: usize) {
        if self.slots.len() < len {
            self.slots.resize(len, Slot::Empty);
        }
    }
}

/// Writes `value` into `state` at the position `fp` addresses in
/// `serializer`'s tree.
///
/// A path terminating at an array field carries the array's
/// cardinality: the value must be a `UInt` within the declared limit,
/// and the element state is resized to match.
pub fn set_value_for_path(
    serializer: &Serializer,
    fp: &FieldPath,
    state: &mut RecordState,
    value: FieldValue,
) -> DecodeResult<()> {
    set_at_level(serializer.fields(), fp, 0, state, value)
}

fn set_at_level(
    fields: &[Field],
    fp: &FieldPath,
    pos: usize,
    state: &mut RecordState,
    value: FieldValue,
) -> DecodeResult<()> {
    let index = slot_index(fp, pos, fields.len())?;
    set_in_field(&fields[index], fp, pos, index, state, value)
}

fn set_in_field(
    field: &Field,
    fp: &FieldPath,
    pos: usize,
    slot: usize,
    state: &mut RecordState,
    value: FieldValue,
) -> DecodeResult<()> {
    match &field.kind {
        FieldKind::Value { .. } => {
            if pos == fp.last() {
                state.set_value(slot, value);
                Ok(())
            } else {
                Err(DecodeError::UnresolvedPath { path: *fp })
            }
        }
        FieldKind::Record { nested } => {
            if pos == fp.last() {
                return Err(DecodeError::UnresolvedPath { path: *fp });
            }
            let sub = state.nested_mut(slot, nested.fields().len());
            set_at_level(nested.fields(), fp, pos + 1, sub, value)
        }
        FieldKind::Array { element, limit } => {
            if pos == fp.last() {
                let FieldValue::UInt(count) = value else {
                    return Err(DecodeError::ValueMismatch {
                        expected: "varuint",
                        found: value.kind(),
                    });
                };
                if count > u64::from(*limit) {
                    return Err(DecodeError::InvalidArrayCount {
                        count,
                        limit: *limit,
                    });
                }
                state.resize_nested(slot, count as usize);
                Ok(())
            } else {
                let elem = slot_index(fp, pos + 1, *limit as usize)?;
                let sub = state.nested_mut(slot, elem + 1);
                set_in_field(element, fp, pos + 1, elem, sub, value)
            }
        }
    }
}

/// Reads the leaf value `fp` addresses, if the path resolves and the
/// slot is filled.
#[must_use]
pub fn value_for_path<'a>(
    serializer: &Serializer,
    fp: &FieldPath,
    state: &'a RecordState,
) -> Option<&'a FieldValue> {
    value_at_level(serializer.fields(), fp, 0, state)
}

fn value_at_level<'a>(
    fields: &[Field],
    fp: &FieldPath,
    pos: usize,
    state: &'a RecordState,
) -> Option<&'a FieldValue> {
    let index = usize::try_from(fp.get(pos)).ok()?;
    let field = fields.get(index)?;
    match &field.kind {
        FieldKind::Value { .. } => {
            if pos == fp.last() {
                state.value(index)
            } else {
                None
            }
        }
        FieldKind::Record { nested } => {
            if pos == fp.last() {
                return None;
            }
            value_at_level(nested.fields(), fp, pos + 1, state.nested(index)?)
        }
        FieldKind::Array { element, .. } => {
            if pos == fp.last() {
                return None;
            }
            let sub = state.nested(index)?;
            let elem = usize::try_from(fp.get(pos + 1)).ok()?;
            value_in_element(element, fp, pos + 1, elem, sub)
        }
    }
}

fn value_in_element<'a>(
    element: &Field,
    fp: &FieldPath,
    pos: usize,
    slot: usize,
    state: &'a RecordState,
) -> Option<&'a FieldValue> {
    match &element.kind {
        FieldKind::Value { .. } => {
            if pos == fp.last() {
                state.value(slot)
            } else {
                None
            }
        }
        FieldKind::Record { nested } => {
            if pos == fp.last() {
                return None;
            }
            value_at_level(nested.fields(), fp, pos + 1, state.nested(slot)?)
        }
        FieldKind::Array { element, .. } => {
            if pos == fp.last() {
                return None;
            }
            let sub = state.nested(slot)?;
            let elem = usize::try_from(fp.get(pos + 1)).ok()?;
            value_in_element(element, fp, pos + 1, elem, sub)
        }
    }
}

fn slot_index(fp: &FieldPath, pos: usize, len: usize) -> DecodeResult<usize> {
    let raw = fp.get(pos);
    let index = usize::try_from(raw).map_err(|_| DecodeError::UnresolvedPath { path: *fp })?;
    if index >= len {
        return Err(DecodeError::UnresolvedPath { path: *fp });
    }
    Ok(index)
}
