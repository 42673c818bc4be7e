//! Whole-state enumeration for diagnostics.

use schema::{Field, FieldKind, FieldPath, Serializer};

use crate::state::RecordState;
use crate::value::FieldValue;

/// One populated leaf in a record's state.
#[derive(Debug, Clone, PartialEq)]
pub struct DumpEntry {
    /// Path of the leaf.
    pub path: FieldPath,
    /// Dotted field name, array elements as zero-padded indices.
    pub name: String,
    /// The stored value.
    pub value: FieldValue,
}

/// Enumerates every populated leaf in path order.
#[must_use]
pub fn collect_dump(serializer: &Serializer, state: &RecordState) -> Vec<DumpEntry> {
    let mut entries = Vec::new();
    let mut cursor = FieldPath::root();
    let mut parts = Vec::new();
    walk_level(
        serializer.fields(),
        state,
        &mut cursor,
        0,
        &mut parts,
        &mut |path, parts, value| {
            entries.push(DumpEntry {
                path,
                name: parts.join("."),
                value: value.clone(),
            });
        },
    );
    entries
}

/// Enumerates the paths of every populated leaf, in path order.
#[must_use]
pub fn collect_field_paths(serializer: &Serializer, state: &RecordState) -> Vec<FieldPath> {
    let mut paths = Vec::new();
    let mut cursor = FieldPath::root();
    let mut parts = Vec::new();
    walk_level(
        serializer.fields(),
        state,
        &mut cursor,
        0,
        &mut parts,
        &mut |path, _, _| paths.push(path),
    );
    paths
}

fn walk_level(
    fields: &[Field],
    state: &RecordState,
    cursor: &mut FieldPath,
    pos: usize,
    parts: &mut Vec<String>,
    emit: &mut dyn FnMut(FieldPath, &[String], &FieldValue),
) {
    for (index, field) in fields.iter().enumerate() {
        if !state.has(index) {
            continue;
        }
        cursor.set(pos, index as i32);
        walk_field(field, state, index, cursor, pos, field.name().to_string(), parts, emit);
    }
}

#[allow(clippy::too_many_arguments)]
fn walk_field(
    field: &Field,
    state: &RecordState,
    slot: usize,
    cursor: &mut FieldPath,
    pos: usize,
    segment: String,
    parts: &mut Vec<String>,
    emit: &mut dyn FnMut(FieldPath, &[String], &FieldValue),
) {
    match &field.kind {
        FieldKind::Value { .. } => {
            if let Some(value) = state.value(slot) {
                parts.push(segment);
                emit(*cursor, parts, value);
                parts.pop();
            }
        }
        FieldKind::Record { nested } => {
            if let Some(sub) = state.nested(slot) {
                parts.push(segment);
                if cursor.push(0).is_ok() {
                    walk_level(nested.fields(), sub, cursor, pos + 1, parts, emit);
                    let _ = cursor.pop(1);
                }
                parts.pop();
            }
        }
        FieldKind::Array { element, .. } => {
            if let Some(sub) = state.nested(slot) {
                parts.push(segment);
                if cursor.push(0).is_ok() {
                    for elem in 0..sub.len() {
                        if !sub.has(elem) {
                            continue;
                        }
                        cursor.set(pos + 1, elem as i32);
                        walk_field(
                            element,
                            sub,
                            elem,
                            cursor,
                            pos + 1,
                            format!("{elem:04}"),
                            parts,
                            emit,
                        );
                    }
                    let _ = cursor.pop(1);
                }
                parts.pop();
            }
        }
    }
}
