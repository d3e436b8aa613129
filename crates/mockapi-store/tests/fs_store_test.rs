//! Integration tests for the directory-backed fixture store

use mockapi_protocol::{GraphQlTestCase, TemplateModel, TestCase, build_key};
use mockapi_store::{ExpectationRegistry, FixtureContent, FixtureKind, FixtureStore, StoreError};
use serde_json::json;
use std::sync::Arc;
use tempfile::TempDir;

fn model(method: &str, path: &str, query: Option<&str>) -> TemplateModel {
    TemplateModel::for_request(method, path, query)
}

#[tokio::test]
async fn test_files_land_in_data_directory() {
    let temp_dir = TempDir::new().unwrap();
    let store = FixtureStore::open_dir(temp_dir.path()).unwrap();

    let tc = TestCase::new("GET", "api/Tests", json!({"Id": "q"}))
        .with_query_string("?param1=one&param2=two");
    let file_name = store.write(&tc).await.unwrap();

    assert_eq!(
        file_name,
        "get_api_tests_6599837003A0F1CA75414AAAC8587340.json"
    );
    let on_disk = std::fs::read_to_string(temp_dir.path().join(&file_name)).unwrap();
    assert_eq!(on_disk, r#"{"Id":"q"}"#);
}

#[tokio::test]
async fn test_overwrite_replaces_content() {
    let temp_dir = TempDir::new().unwrap();
    let store = FixtureStore::open_dir(temp_dir.path()).unwrap();

    store
        .write(&TestCase::new("PUT", "api/Item", json!({"v": 1})))
        .await
        .unwrap();
    store
        .write(&TestCase::new("PUT", "api/Item", json!({"v": 2})))
        .await
        .unwrap();

    let fixture = store
        .read("PUT", "api/Item", None, &model("PUT", "api/Item", None))
        .await
        .unwrap();
    assert_eq!(fixture.content, FixtureContent::Json(json!({"v": 2})));
    assert_eq!(store.list().await.unwrap(), vec!["put_api_item.json"]);
}

#[tokio::test]
async fn test_second_kind_makes_key_ambiguous() {
    let temp_dir = TempDir::new().unwrap();
    let store = FixtureStore::open_dir(temp_dir.path()).unwrap();

    store
        .write(&TestCase::new("GET", "api/Sample", json!({"a": 1})))
        .await
        .unwrap();
    store
        .write(&TestCase::new("GET", "api/Sample", json!("{}")).as_template())
        .await
        .unwrap();

    let err = store
        .read("GET", "api/Sample", None, &model("GET", "api/Sample", None))
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::Ambiguous { ref matches, .. } if matches.len() == 2));
}

#[tokio::test]
async fn test_hand_written_fixture_is_served() {
    let temp_dir = TempDir::new().unwrap();
    std::fs::write(
        temp_dir.path().join("get_api_greeting.template"),
        "Hello from @Model.RequestPath",
    )
    .unwrap();
    std::fs::write(temp_dir.path().join("get_styles.css"), "body { color: red }").unwrap();
    let store = FixtureStore::open_dir(temp_dir.path()).unwrap();

    let greeting = store
        .read(
            "GET",
            "/api/Greeting",
            None,
            &model("GET", "/api/Greeting", None),
        )
        .await
        .unwrap();
    assert_eq!(greeting.kind, FixtureKind::Template);
    assert_eq!(
        greeting.content,
        FixtureContent::Text {
            body: "Hello from /api/Greeting".into(),
            content_type: "text/plain; charset=utf-8",
        }
    );

    let css = store
        .read("GET", "styles", None, &model("GET", "styles", None))
        .await
        .unwrap();
    assert_eq!(css.content.content_type(), "text/css; charset=utf-8");
}

#[tokio::test]
async fn test_graphql_fixture_on_disk() {
    let temp_dir = TempDir::new().unwrap();
    let store = FixtureStore::open_dir(temp_dir.path()).unwrap();

    let tc = GraphQlTestCase::new("SampleQuery", "{ sample { id } }", json!({"data": null}));
    let file_name = store.write_graphql(&tc).await.unwrap();
    assert!(temp_dir.path().join(&file_name).exists());
    assert!(file_name.starts_with("samplequery_"));
    assert!(file_name.ends_with(".graphql"));
}

#[tokio::test]
async fn test_concurrent_writes_and_reads() {
    let temp_dir = TempDir::new().unwrap();
    let store = Arc::new(FixtureStore::open_dir(temp_dir.path()).unwrap());

    let mut handles = Vec::new();
    for i in 0..20 {
        let store = Arc::clone(&store);
        handles.push(tokio::spawn(async move {
            let path = format!("api/item{i}");
            store
                .write(&TestCase::new("GET", path.as_str(), json!({"i": i})))
                .await
                .unwrap();
            store
                .read("GET", &path, None, &TemplateModel::for_request("GET", &path, None))
                .await
                .unwrap()
        }));
    }

    for (i, handle) in handles.into_iter().enumerate() {
        let fixture = handle.await.unwrap();
        assert_eq!(fixture.content, FixtureContent::Json(json!({"i": i})));
    }
    assert_eq!(store.list().await.unwrap().len(), 20);
}

#[tokio::test]
async fn test_expectations_are_independent_of_files() {
    let temp_dir = TempDir::new().unwrap();
    let store = FixtureStore::open_dir(temp_dir.path()).unwrap();
    let registry = ExpectationRegistry::new();
    let key = build_key("POST", "api/ExpectOneTest", None);

    registry.set_or_replace(&key, json!({"ok": true})).await;
    assert!(store.list().await.unwrap().is_empty());
    assert_eq!(registry.keys().await, vec![key.file_name()]);
}
