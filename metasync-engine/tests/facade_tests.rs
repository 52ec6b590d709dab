use metasync_cms::{ContentstackConfig, InMemoryCms};
use metasync_engine::{LivePreview, MetafieldOptions, Position, TransformOptions};
use metasync_model::{ContentType, CslpMapping, Entry, FieldSchema, MetaobjectEntries};
use pretty_assertions::assert_eq;
use serde_json::json;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ── In-memory port ──────────────────────────────────────────────

#[tokio::test]
async fn create_metaobject_entries_fills_caller_accumulators() {
    let preview = LivePreview::new(InMemoryCms::new());
    let content_type = ContentType::new("product", vec![FieldSchema::text("title")]);
    let entries = [Entry::from_value(json!({"uid": "p1", "title": "Shirt"})).unwrap()];
    let mut metaobjects = MetaobjectEntries::new();
    let mut cslp = CslpMapping::new();

    preview
        .create_metaobject_entries(
            content_type.view(),
            &entries,
            Position::root(),
            &mut metaobjects,
            &mut cslp,
            &TransformOptions::new("hash"),
        )
        .await
        .unwrap();

    assert_eq!(
        metaobjects.record("product", "p1").unwrap().to_plain(),
        json!({"title": "Shirt"})
    );
    assert!(cslp.is_empty());
}

#[tokio::test]
async fn key_index_and_metafield_merge() {
    let preview = LivePreview::new(InMemoryCms::new());
    let key_based = preview.create_content_type_key_based(&[
        FieldSchema::text("title"),
        FieldSchema::text("title"),
        FieldSchema::text("prototype"),
    ]);
    assert_eq!(key_based.keys().collect::<Vec<_>>(), vec!["title"]);

    let merged = preview
        .get_updated_product_metafields(
            &json!({"title": {}}),
            &key_based,
            &Entry::from_value(json!({"title": "New"})).unwrap(),
            &MetafieldOptions::new("product", "p1", "hash"),
        )
        .await
        .unwrap()
        .unwrap();
    assert_eq!(merged["title"].json, json!("New"));
}

// ── Contentstack ────────────────────────────────────────────────

#[tokio::test]
async fn fetch_data_returns_entry_with_schema() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v3/content_types/product/entries/p1"))
        .and(query_param("include_schema", "true"))
        .and(header("live_preview", "hash_1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "entry": {"uid": "p1", "title": "Shirt"},
            "schema": [{"uid": "title", "data_type": "text"}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let preview = LivePreview::connect(ContentstackConfig {
        delivery_token: "d".to_string(),
        preview_token: "p".to_string(),
        environment: "e".to_string(),
        api_key: "k".to_string(),
        preview_url: server.uri(),
    })
    .unwrap();

    let body = preview.fetch_data("product", "p1", "hash_1").await.unwrap();
    assert_eq!(body["entry"]["title"], "Shirt");
}

#[test]
fn connect_rejects_incomplete_config() {
    let err = LivePreview::connect(ContentstackConfig::default()).err().unwrap();
    assert!(err.to_string().contains("deliveryToken is required"));
}
