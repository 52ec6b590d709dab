use metasync_model::{
    BlockSchema, ContentType, DataType, FieldKind, FieldSchema, ReferenceTo, SchemaView,
};
use pretty_assertions::assert_eq;
use serde_json::json;

// ── DataType ─────────────────────────────────────────────────────

#[test]
fn data_type_parses_known_names() {
    assert_eq!(DataType::from("group"), DataType::Group);
    assert_eq!(DataType::from("global_field"), DataType::GlobalField);
    assert_eq!(DataType::from("isodate"), DataType::IsoDate);
    assert_eq!(DataType::from("json"), DataType::Json);
}

#[test]
fn data_type_keeps_unknown_names() {
    let dt = DataType::from("taxonomy");
    assert_eq!(dt, DataType::Other("taxonomy".to_string()));
    assert_eq!(dt.as_str(), "taxonomy");
}

#[test]
fn data_type_serializes_as_wire_name() {
    let json = serde_json::to_value(DataType::GlobalField).unwrap();
    assert_eq!(json, json!("global_field"));
}

// ── FieldSchema deserialization ──────────────────────────────────

#[test]
fn field_schema_from_cms_json() {
    let field: FieldSchema = serde_json::from_value(json!({
        "uid": "related",
        "data_type": "reference",
        "display_name": "Related",
        "reference_to": ["product", "collection"],
        "field_metadata": {"ref_multiple": true, "description": ""},
        "multiple": false
    }))
    .unwrap();

    assert_eq!(field.uid, "related");
    assert_eq!(field.data_type, DataType::Reference);
    assert_eq!(
        field.reference_to,
        Some(ReferenceTo::Many(vec![
            "product".to_string(),
            "collection".to_string()
        ]))
    );
    assert!(field.field_metadata.ref_multiple);
    assert_eq!(field.extra["display_name"], json!("Related"));
    assert_eq!(field.field_metadata.extra["description"], json!(""));
}

#[test]
fn field_schema_defaults_when_flags_absent() {
    let field: FieldSchema =
        serde_json::from_value(json!({"uid": "title", "data_type": "text"})).unwrap();
    assert!(!field.multiple);
    assert!(field.schema.is_empty());
    assert!(field.blocks.is_empty());
    assert!(!field.field_metadata.hide_time);
}

#[test]
fn nested_group_and_blocks_deserialize() {
    let ct: ContentType = serde_json::from_value(json!({
        "uid": "page",
        "title": "Page",
        "schema": [
            {"uid": "seo", "data_type": "group", "schema": [
                {"uid": "meta_title", "data_type": "text"}
            ]},
            {"uid": "sections", "data_type": "blocks", "multiple": true, "blocks": [
                {"uid": "hero", "title": "Hero", "schema": [{"uid": "heading", "data_type": "text"}]},
                {"uid": "banner", "title": "Banner", "reference_to": "banner_gf"}
            ]}
        ]
    }))
    .unwrap();

    assert_eq!(ct.schema.len(), 2);
    assert_eq!(ct.schema[0].schema[0].uid, "meta_title");
    assert_eq!(ct.schema[1].blocks[0].global_field_uid(), None);
    assert_eq!(ct.schema[1].blocks[1].global_field_uid(), Some("banner_gf"));
    assert_eq!(ct.extra["title"], json!("Page"));
}

// ── FieldKind dispatch ───────────────────────────────────────────

#[test]
fn group_kind_exposes_inline_schema() {
    let field = FieldSchema::group("seo", vec![FieldSchema::text("meta_title")], false);
    match field.kind() {
        FieldKind::Group { schema, multiple } => {
            assert_eq!(schema.uid, "seo");
            assert_eq!(schema.fields.len(), 1);
            assert!(!multiple);
        }
        other => panic!("unexpected kind {other:?}"),
    }
}

#[test]
fn reference_kind_keeps_both_multiplicity_flags() {
    let field = FieldSchema::reference("related", &["product"], true);
    assert_eq!(
        field.kind(),
        FieldKind::Reference {
            targets: vec!["product"],
            ref_multiple: true,
            multiple: false
        }
    );

    let field = FieldSchema::reference("related", &["product"], false).with_multiple(true);
    assert_eq!(
        field.kind(),
        FieldKind::Reference {
            targets: vec!["product"],
            ref_multiple: false,
            multiple: true
        }
    );
}

#[test]
fn global_field_kind_reads_reference_to() {
    let field = FieldSchema::global_field("address", "address_gf", false);
    assert_eq!(
        field.kind(),
        FieldKind::GlobalField {
            global_uid: Some("address_gf"),
            multiple: false
        }
    );
}

#[test]
fn isodate_kind_carries_hide_time() {
    let field = FieldSchema::new("launch", DataType::IsoDate)
        .with_multiple(true)
        .with_hide_time(true);
    assert_eq!(
        field.kind(),
        FieldKind::IsoDate {
            multiple: true,
            hide_time: true
        }
    );
}

#[test]
fn scalar_kinds() {
    assert_eq!(FieldSchema::text("t").kind(), FieldKind::Scalar);
    assert_eq!(FieldSchema::new("n", "number").kind(), FieldKind::Scalar);
    assert_eq!(FieldSchema::new("x", "custom_widget").kind(), FieldKind::Scalar);
}

#[test]
fn block_views() {
    let block = BlockSchema::inline("hero", vec![FieldSchema::text("heading")]);
    assert_eq!(
        block.view(),
        SchemaView::new("hero", &[FieldSchema::text("heading")])
    );
    assert_eq!(BlockSchema::global("banner", "").global_field_uid(), None);
}

#[test]
fn reference_to_first_skips_empty() {
    let r = ReferenceTo::Many(vec![String::new(), "b".to_string()]);
    assert_eq!(r.first(), Some("b"));
    assert_eq!(ReferenceTo::One("a".to_string()).uids(), vec!["a"]);
}
