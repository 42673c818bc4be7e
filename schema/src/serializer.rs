//! Serializer trees and recursive path resolution.

use std::fmt;

use crate::error::{SchemaError, SchemaResult};
use crate::{Field, FieldCodec, FieldKind, FieldPath};

/// Identity of a serializer: declared name plus version.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SerializerId {
    pub name: String,
    pub version: i32,
}

impl SerializerId {
    /// Creates a serializer identity.
    #[must_use]
    pub fn new(name: impl Into<String>, version: i32) -> Self {
        Self {
            name: name.into(),
            version,
        }
    }
}

impl fmt::Display for SerializerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.name, self.version)
    }
}

/// An immutable description of a record type as an ordered field list.
///
/// Serializers are built once by the schema ingestion layer and shared
/// read-only across every record of the type; they never mutate afterwards
/// and are safe to use from concurrent decodes.
#[derive(Debug, Clone, PartialEq)]
pub struct Serializer {
    id: SerializerId,
    fields: Vec<Field>,
}

impl Serializer {
    /// Creates a serializer from an ordered field list.
    #[must_use]
    pub fn new(id: SerializerId, fields: Vec<Field>) -> Self {
        Self { id, fields }
    }

    /// Returns the serializer's identity.
    #[must_use]
    pub const fn id(&self) -> &SerializerId {
        &self.id
    }

    /// Returns the ordered field list.
    #[must_use]
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// Returns the field at `index`, if any.
    #[must_use]
    pub fn field(&self, index: usize) -> Option<&Field> {
        self.fields.get(index)
    }

    /// Resolves a tree-path to the field it addresses.
    ///
    /// `pos` is the path position this serializer level corresponds to;
    /// record decoding starts at 0. A path ending at a branch resolves to
    /// the branch field itself.
    pub fn field_for_path(&self, fp: &FieldPath, pos: usize) -> SchemaResult<&Field> {
        let idx = self.slot_index(fp, pos)?;
        field_for_path_tail(&self.fields[idx], fp, pos)
    }

    /// Resolves a tree-path to the value coder of the leaf it addresses.
    ///
    /// `Ok(None)` means the leaf exists but its declared type has no coder;
    /// the codec layer turns that into a fatal decode error.
    pub fn codec_for_path(&self, fp: &FieldPath, pos: usize) -> SchemaResult<Option<FieldCodec>> {
        let field = self.field_for_path(fp, pos)?;
        match &field.kind {
            FieldKind::Value { codec } => Ok(*codec),
            // The path stops at the array node: it addresses the cardinality.
            FieldKind::Array { .. } => Ok(Some(FieldCodec::VarUInt)),
            FieldKind::Record { .. } => Err(SchemaError::UnresolvedPath { path: *fp }),
        }
    }

    /// Builds the fully-qualified dotted name for a tree-path.
    ///
    /// Array elements render as zero-padded four-digit indices.
    pub fn name_for_path(&self, fp: &FieldPath) -> SchemaResult<String> {
        let mut parts = Vec::with_capacity(fp.depth());
        self.accumulate_name(fp, 0, &mut parts)?;
        Ok(parts.join("."))
    }

    /// Resolves a dotted field name back to a tree-path.
    ///
    /// Declared field names may themselves contain dots; at each level the
    /// field whose declared name is the longest prefix of the remaining name
    /// (exact, or followed by a `.`) is tried first, falling back to shorter
    /// matches when the descent under it dead-ends.
    #[must_use]
    pub fn field_path_for_name(&self, name: &str) -> Option<FieldPath> {
        let mut fp = FieldPath::root();
        if self.resolve_name(&mut fp, name) {
            Some(fp)
        } else {
            None
        }
    }

    /// Returns the deepest leaf level of the tree, counting from 1.
    #[must_use]
    pub fn max_depth(&self) -> usize {
        self.fields.iter().map(field_depth).max().unwrap_or(0)
    }

    fn slot_index(&self, fp: &FieldPath, pos: usize) -> SchemaResult<usize> {
        if pos > fp.last() {
            return Err(SchemaError::UnresolvedPath { path: *fp });
        }
        let idx = fp.get(pos);
        if idx < 0 || idx as usize >= self.fields.len() {
            return Err(SchemaError::UnresolvedPath { path: *fp });
        }
        Ok(idx as usize)
    }

    fn accumulate_name(
        &self,
        fp: &FieldPath,
        pos: usize,
        parts: &mut Vec<String>,
    ) -> SchemaResult<()> {
        let idx = self.slot_index(fp, pos)?;
        let field = &self.fields[idx];
        parts.push(field.properties.name.clone());
        accumulate_name_tail(field, fp, pos, parts)
    }

    fn resolve_name(&self, fp: &mut FieldPath, name: &str) -> bool {
        let mut candidates: Vec<(usize, &Field)> = self
            .fields
            .iter()
            .enumerate()
            .filter(|(_, field)| {
                let declared = field.name();
                name.starts_with(declared)
                    && (name.len() == declared.len()
                        || name.as_bytes().get(declared.len()) == Some(&b'.'))
            })
            .collect();
        // Longer declared names are more specific; when a descent under
        // one candidate dead-ends, the next shorter match gets a turn.
        candidates.sort_by(|a, b| b.1.name().len().cmp(&a.1.name().len()));
        for (idx, field) in candidates {
            let saved = *fp;
            fp.set(fp.last(), idx as i32);
            let declared_len = field.name().len();
            if declared_len == name.len() {
                return true;
            }
            if fp.push(0).is_ok() && resolve_name_tail(field, fp, &name[declared_len + 1..]) {
                return true;
            }
            *fp = saved;
        }
        false
    }
}

fn field_for_path_tail<'a>(field: &'a Field, fp: &FieldPath, pos: usize) -> SchemaResult<&'a Field> {
    match &field.kind {
        FieldKind::Value { .. } => {
            if pos == fp.last() {
                Ok(field)
            } else {
                Err(SchemaError::UnresolvedPath { path: *fp })
            }
        }
        FieldKind::Record { nested } => {
            if pos == fp.last() {
                Ok(field)
            } else {
                nested.field_for_path(fp, pos + 1)
            }
        }
        FieldKind::Array { element, limit } => {
            if pos == fp.last() {
                return Ok(field);
            }
            element_index(fp, pos + 1, *limit)?;
            field_for_path_tail(element, fp, pos + 1)
        }
    }
}

fn accumulate_name_tail(
    field: &Field,
    fp: &FieldPath,
    pos: usize,
    parts: &mut Vec<String>,
) -> SchemaResult<()> {
    match &field.kind {
        FieldKind::Value { .. } => {
            if pos == fp.last() {
                Ok(())
            } else {
                Err(SchemaError::UnresolvedPath { path: *fp })
            }
        }
        FieldKind::Record { nested } => {
            if pos == fp.last() {
                Ok(())
            } else {
                nested.accumulate_name(fp, pos + 1, parts)
            }
        }
        FieldKind::Array { element, limit } => {
            if pos == fp.last() {
                return Ok(());
            }
            let elem = element_index(fp, pos + 1, *limit)?;
            parts.push(format!("{elem:04}"));
            accumulate_name_tail(element, fp, pos + 1, parts)
        }
    }
}

fn resolve_name_tail(field: &Field, fp: &mut FieldPath, rest: &str) -> bool {
    match &field.kind {
        // Leftover segments on a leaf cannot resolve.
        FieldKind::Value { .. } => false,
        FieldKind::Record { nested } => nested.resolve_name(fp, rest),
        FieldKind::Array { element, limit } => {
            let (segment, remainder) = match rest.split_once('.') {
                Some((s, r)) => (s, Some(r)),
                None => (rest, None),
            };
            let Ok(elem) = segment.parse::<u32>() else {
                return false;
            };
            if elem >= *limit {
                return false;
            }
            fp.set(fp.last(), elem as i32);
            match remainder {
                None => matches!(element.kind, FieldKind::Value { .. }),
                Some(r) => {
                    if fp.push(0).is_err() {
                        return false;
                    }
                    resolve_name_tail(element, fp, r)
                }
            }
        }
    }
}

fn element_index(fp: &FieldPath, pos: usize, limit: u32) -> SchemaResult<usize> {
    if pos > fp.last() {
        return Err(SchemaError::UnresolvedPath { path: *fp });
    }
    let idx = fp.get(pos);
    if idx < 0 || idx as u32 >= limit {
        return Err(SchemaError::UnresolvedPath { path: *fp });
    }
    Ok(idx as usize)
}

fn field_depth(field: &Field) -> usize {
    match &field.kind {
        FieldKind::Value { .. } => 1,
        FieldKind::Record { nested } => 1 + nested.max_depth(),
        FieldKind::Array { element, .. } => 1 + field_depth(element),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::FieldProperties;

    fn leaf(name: &str, codec: FieldCodec) -> Field {
        Field::value(FieldProperties::named(name, codec.name()), Some(codec))
    }

    fn test_serializer() -> Serializer {
        let vec2 = Arc::new(Serializer::new(
            SerializerId::new("Vector2D", 0),
            vec![leaf("x", FieldCodec::Float32), leaf("y", FieldCodec::Float32)],
        ));
        Serializer::new(
            SerializerId::new("CTestRecord", 1),
            vec![
                leaf("m_iHealth", FieldCodec::VarUInt),
                Field::record(FieldProperties::named("m_vecOrigin", "Vector2D"), vec2),
                Field::array(
                    FieldProperties::named("m_Inventory", "CUtlVector<uint32>"),
                    leaf("item", FieldCodec::VarUInt),
                    64,
                ),
                Field::value(FieldProperties::named("m_hTarget", "CHandle"), None),
                leaf("m_sub.m_flRatio", FieldCodec::Float32),
            ],
        )
    }

    #[test]
    fn resolve_top_level_leaf() {
        let ser = test_serializer();
        let fp = FieldPath::from_indices(&[0]).unwrap();
        let field = ser.field_for_path(&fp, 0).unwrap();
        assert_eq!(field.name(), "m_iHealth");
        assert_eq!(
            ser.codec_for_path(&fp, 0).unwrap(),
            Some(FieldCodec::VarUInt)
        );
    }

    #[test]
    fn resolve_nested_leaf() {
        let ser = test_serializer();
        let fp = FieldPath::from_indices(&[1, 1]).unwrap();
        let field = ser.field_for_path(&fp, 0).unwrap();
        assert_eq!(field.name(), "y");
        assert_eq!(
            ser.codec_for_path(&fp, 0).unwrap(),
            Some(FieldCodec::Float32)
        );
    }

    #[test]
    fn resolve_array_element() {
        let ser = test_serializer();
        let fp = FieldPath::from_indices(&[2, 7]).unwrap();
        let field = ser.field_for_path(&fp, 0).unwrap();
        assert_eq!(field.name(), "item");
    }

    #[test]
    fn array_node_addresses_cardinality() {
        let ser = test_serializer();
        let fp = FieldPath::from_indices(&[2]).unwrap();
        assert_eq!(
            ser.codec_for_path(&fp, 0).unwrap(),
            Some(FieldCodec::VarUInt)
        );
    }

    #[test]
    fn array_element_out_of_bounds() {
        let ser = test_serializer();
        let fp = FieldPath::from_indices(&[2, 64]).unwrap();
        let err = ser.field_for_path(&fp, 0).unwrap_err();
        assert!(matches!(err, SchemaError::UnresolvedPath { .. }));
    }

    #[test]
    fn record_node_has_no_codec() {
        let ser = test_serializer();
        let fp = FieldPath::from_indices(&[1]).unwrap();
        let err = ser.codec_for_path(&fp, 0).unwrap_err();
        assert!(matches!(err, SchemaError::UnresolvedPath { .. }));
    }

    #[test]
    fn leaf_without_codec_resolves_to_none() {
        let ser = test_serializer();
        let fp = FieldPath::from_indices(&[3]).unwrap();
        assert_eq!(ser.codec_for_path(&fp, 0).unwrap(), None);
    }

    #[test]
    fn unknown_index_is_unresolved() {
        let ser = test_serializer();
        let fp = FieldPath::from_indices(&[9]).unwrap();
        assert!(matches!(
            ser.field_for_path(&fp, 0),
            Err(SchemaError::UnresolvedPath { .. })
        ));
    }

    #[test]
    fn path_deeper_than_leaf_is_unresolved() {
        let ser = test_serializer();
        let fp = FieldPath::from_indices(&[0, 0]).unwrap();
        assert!(matches!(
            ser.field_for_path(&fp, 0),
            Err(SchemaError::UnresolvedPath { .. })
        ));
    }

    #[test]
    fn name_for_nested_path() {
        let ser = test_serializer();
        let fp = FieldPath::from_indices(&[1, 0]).unwrap();
        assert_eq!(ser.name_for_path(&fp).unwrap(), "m_vecOrigin.x");
    }

    #[test]
    fn name_for_array_element() {
        let ser = test_serializer();
        let fp = FieldPath::from_indices(&[2, 12]).unwrap();
        assert_eq!(ser.name_for_path(&fp).unwrap(), "m_Inventory.0012");
    }

    #[test]
    fn name_lookup_simple() {
        let ser = test_serializer();
        let fp = ser.field_path_for_name("m_vecOrigin.y").unwrap();
        assert_eq!(fp.components(), &[1, 1]);
    }

    #[test]
    fn name_lookup_array_element() {
        let ser = test_serializer();
        let fp = ser.field_path_for_name("m_Inventory.0005").unwrap();
        assert_eq!(fp.components(), &[2, 5]);
    }

    #[test]
    fn name_lookup_prefers_longest_dotted_name() {
        let ser = test_serializer();
        // The declared name itself contains a dot; it must win over any
        // partial match.
        let fp = ser.field_path_for_name("m_sub.m_flRatio").unwrap();
        assert_eq!(fp.components(), &[4]);
    }

    #[test]
    fn name_lookup_falls_back_past_dotted_shadow() {
        let inner = Arc::new(Serializer::new(
            SerializerId::new("Inner", 0),
            vec![leaf("c", FieldCodec::Bool)],
        ));
        let middle = Arc::new(Serializer::new(
            SerializerId::new("Middle", 0),
            vec![Field::record(FieldProperties::named("b", "Inner"), inner)],
        ));
        // The dotted leaf "a.b" is the longer prefix of "a.b.c", but only
        // the record under "a" can absorb the trailing segment.
        let ser = Serializer::new(
            SerializerId::new("Shadowed", 0),
            vec![
                Field::record(FieldProperties::named("a", "Middle"), middle),
                leaf("a.b", FieldCodec::VarUInt),
            ],
        );
        let fp = ser.field_path_for_name("a.b.c").unwrap();
        assert_eq!(fp.components(), &[0, 0, 0]);
        // The dotted leaf itself still wins an exact match.
        let fp = ser.field_path_for_name("a.b").unwrap();
        assert_eq!(fp.components(), &[1]);
    }

    #[test]
    fn name_lookup_unknown() {
        let ser = test_serializer();
        assert!(ser.field_path_for_name("m_missing").is_none());
        assert!(ser.field_path_for_name("m_iHealthier").is_none());
    }

    #[test]
    fn name_roundtrip_for_every_leaf() {
        let ser = test_serializer();
        for fp in [
            FieldPath::from_indices(&[0]).unwrap(),
            FieldPath::from_indices(&[1, 0]).unwrap(),
            FieldPath::from_indices(&[1, 1]).unwrap(),
            FieldPath::from_indices(&[2, 3]).unwrap(),
            FieldPath::from_indices(&[3]).unwrap(),
            FieldPath::from_indices(&[4]).unwrap(),
        ] {
            let name = ser.name_for_path(&fp).unwrap();
            let resolved = ser.field_path_for_name(&name).unwrap();
            assert_eq!(resolved, fp, "round-trip failed for {name}");
        }
    }

    #[test]
    fn max_depth_counts_nesting() {
        let ser = test_serializer();
        assert_eq!(ser.max_depth(), 2);
    }

    #[test]
    fn serializer_id_display() {
        let id = SerializerId::new("CWorld", 3);
        assert_eq!(id.to_string(), "CWorld#3");
    }
}
