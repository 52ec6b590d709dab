use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// The `data_type` of a CMS field.
///
/// Unknown data types are kept verbatim in [`DataType::Other`] and are
/// treated as pass-through scalars by the engine.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum DataType {
    Text,
    Number,
    Boolean,
    Group,
    Blocks,
    GlobalField,
    Reference,
    File,
    IsoDate,
    Link,
    Json,
    Other(String),
}

impl DataType {
    /// The wire name used by the CMS.
    pub fn as_str(&self) -> &str {
        match self {
            DataType::Text => "text",
            DataType::Number => "number",
            DataType::Boolean => "boolean",
            DataType::Group => "group",
            DataType::Blocks => "blocks",
            DataType::GlobalField => "global_field",
            DataType::Reference => "reference",
            DataType::File => "file",
            DataType::IsoDate => "isodate",
            DataType::Link => "link",
            DataType::Json => "json",
            DataType::Other(other) => other,
        }
    }
}

impl From<String> for DataType {
    fn from(value: String) -> Self {
        match value.as_str() {
            "text" => DataType::Text,
            "number" => DataType::Number,
            "boolean" => DataType::Boolean,
            "group" => DataType::Group,
            "blocks" => DataType::Blocks,
            "global_field" => DataType::GlobalField,
            "reference" => DataType::Reference,
            "file" => DataType::File,
            "isodate" => DataType::IsoDate,
            "link" => DataType::Link,
            "json" => DataType::Json,
            _ => DataType::Other(value),
        }
    }
}

impl From<&str> for DataType {
    fn from(value: &str) -> Self {
        DataType::from(value.to_string())
    }
}

impl From<DataType> for String {
    fn from(value: DataType) -> Self {
        value.as_str().to_string()
    }
}

/// `reference_to` is a single uid for global fields and a uid list for
/// reference fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ReferenceTo {
    One(String),
    Many(Vec<String>),
}

impl ReferenceTo {
    /// All target uids, in declaration order.
    pub fn uids(&self) -> Vec<&str> {
        match self {
            ReferenceTo::One(uid) => vec![uid.as_str()],
            ReferenceTo::Many(uids) => uids.iter().map(String::as_str).collect(),
        }
    }

    /// The first non-empty target uid.
    pub fn first(&self) -> Option<&str> {
        self.uids().into_iter().find(|uid| !uid.is_empty())
    }
}

/// Field-level metadata flags the engine cares about. Everything else the
/// CMS sends is kept in `extra`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FieldMetadata {
    #[serde(default)]
    pub ref_multiple: bool,
    #[serde(default)]
    pub hide_time: bool,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One field of a content type schema.
///
/// `schema` holds the inline sub-schema of a `group`; `blocks` holds the
/// block definitions of a `blocks` field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSchema {
    pub uid: String,
    pub data_type: DataType,
    #[serde(default)]
    pub multiple: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub schema: Vec<FieldSchema>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub blocks: Vec<BlockSchema>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference_to: Option<ReferenceTo>,
    #[serde(default)]
    pub field_metadata: FieldMetadata,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl FieldSchema {
    /// Creates a bare field of the given type.
    pub fn new(uid: impl Into<String>, data_type: impl Into<DataType>) -> Self {
        Self {
            uid: uid.into(),
            data_type: data_type.into(),
            multiple: false,
            schema: Vec::new(),
            blocks: Vec::new(),
            reference_to: None,
            field_metadata: FieldMetadata::default(),
            extra: Map::new(),
        }
    }

    /// Shorthand for a `text` field.
    pub fn text(uid: &str) -> Self {
        Self::new(uid, DataType::Text)
    }

    /// Shorthand for a `group` field with an inline schema.
    pub fn group(uid: &str, schema: Vec<FieldSchema>, multiple: bool) -> Self {
        Self {
            schema,
            multiple,
            ..Self::new(uid, DataType::Group)
        }
    }

    /// Shorthand for a `blocks` field.
    pub fn blocks(uid: &str, blocks: Vec<BlockSchema>) -> Self {
        Self {
            blocks,
            multiple: true,
            ..Self::new(uid, DataType::Blocks)
        }
    }

    /// Shorthand for a `global_field` field pointing at `global_uid`.
    pub fn global_field(uid: &str, global_uid: &str, multiple: bool) -> Self {
        Self {
            multiple,
            reference_to: Some(ReferenceTo::One(global_uid.to_string())),
            ..Self::new(uid, DataType::GlobalField)
        }
    }

    /// Shorthand for a `reference` field.
    pub fn reference(uid: &str, targets: &[&str], ref_multiple: bool) -> Self {
        let mut field = Self {
            reference_to: Some(ReferenceTo::Many(
                targets.iter().map(|t| t.to_string()).collect(),
            )),
            ..Self::new(uid, DataType::Reference)
        };
        field.field_metadata.ref_multiple = ref_multiple;
        field
    }

    /// Sets `multiple`.
    #[must_use]
    pub fn with_multiple(mut self, multiple: bool) -> Self {
        self.multiple = multiple;
        self
    }

    /// Sets `field_metadata.hide_time`.
    #[must_use]
    pub fn with_hide_time(mut self, hide_time: bool) -> Self {
        self.field_metadata.hide_time = hide_time;
        self
    }

    /// The closed per-variant view of this field.
    pub fn kind(&self) -> FieldKind<'_> {
        let multiple = self.multiple;
        match &self.data_type {
            DataType::Group => FieldKind::Group {
                schema: SchemaView::new(&self.uid, &self.schema),
                multiple,
            },
            DataType::Blocks => FieldKind::Blocks {
                blocks: &self.blocks,
            },
            DataType::GlobalField => FieldKind::GlobalField {
                global_uid: self.reference_to.as_ref().and_then(ReferenceTo::first),
                multiple,
            },
            DataType::Reference => FieldKind::Reference {
                targets: self
                    .reference_to
                    .as_ref()
                    .map(ReferenceTo::uids)
                    .unwrap_or_default(),
                ref_multiple: self.field_metadata.ref_multiple,
                multiple,
            },
            DataType::File => FieldKind::File { multiple },
            DataType::IsoDate => FieldKind::IsoDate {
                multiple,
                hide_time: self.field_metadata.hide_time,
            },
            DataType::Link => FieldKind::Link { multiple },
            DataType::Json => FieldKind::Json,
            DataType::Text
            | DataType::Number
            | DataType::Boolean
            | DataType::Other(_) => FieldKind::Scalar,
        }
    }
}

/// Per-variant payload of a [`FieldSchema`], borrowed from it.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldKind<'a> {
    Group {
        schema: SchemaView<'a>,
        multiple: bool,
    },
    Blocks {
        blocks: &'a [BlockSchema],
    },
    GlobalField {
        global_uid: Option<&'a str>,
        multiple: bool,
    },
    /// `ref_multiple` decides the shape of a transformed draft value;
    /// `multiple` decides the shape of a stored metafield.
    Reference {
        targets: Vec<&'a str>,
        ref_multiple: bool,
        multiple: bool,
    },
    File {
        multiple: bool,
    },
    IsoDate {
        multiple: bool,
        hide_time: bool,
    },
    Link {
        multiple: bool,
    },
    Json,
    Scalar,
}

/// A block definition inside a `blocks` field.
///
/// A block with a non-empty `reference_to` is a global-field block whose
/// schema has to be fetched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockSchema {
    pub uid: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default)]
    pub schema: Vec<FieldSchema>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference_to: Option<String>,
}

impl BlockSchema {
    /// An inline block.
    pub fn inline(uid: &str, schema: Vec<FieldSchema>) -> Self {
        Self {
            uid: uid.to_string(),
            title: None,
            schema,
            reference_to: None,
        }
    }

    /// A block backed by the global field `global_uid`.
    pub fn global(uid: &str, global_uid: &str) -> Self {
        Self {
            uid: uid.to_string(),
            title: None,
            schema: Vec::new(),
            reference_to: Some(global_uid.to_string()),
        }
    }

    /// The global field uid, when this block is backed by one.
    pub fn global_field_uid(&self) -> Option<&str> {
        self.reference_to.as_deref().filter(|uid| !uid.is_empty())
    }

    pub fn view(&self) -> SchemaView<'_> {
        SchemaView::new(&self.uid, &self.schema)
    }
}

/// A content type (or a fetched global field, which has the same shape).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentType {
    pub uid: String,
    #[serde(default)]
    pub schema: Vec<FieldSchema>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ContentType {
    pub fn new(uid: impl Into<String>, schema: Vec<FieldSchema>) -> Self {
        Self {
            uid: uid.into(),
            schema,
            extra: Map::new(),
        }
    }

    pub fn view(&self) -> SchemaView<'_> {
        SchemaView::new(&self.uid, &self.schema)
    }
}

/// Anything that can be walked as a schema: a content type, a global
/// field, a group field or an inline block.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SchemaView<'a> {
    pub uid: &'a str,
    pub fields: &'a [FieldSchema],
}

impl<'a> SchemaView<'a> {
    pub fn new(uid: &'a str, fields: &'a [FieldSchema]) -> Self {
        Self { uid, fields }
    }
}

impl<'a> From<&'a ContentType> for SchemaView<'a> {
    fn from(content_type: &'a ContentType) -> Self {
        content_type.view()
    }
}
