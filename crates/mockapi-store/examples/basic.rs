//! Basic example of declaring, resolving and verifying fixtures

use mockapi_protocol::{TemplateModel, TestCase};
use mockapi_store::{ExpectationRegistry, FixtureContent, FixtureStore};
use serde_json::json;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    println!("mockapi store - Basic Example\n");

    let data_dir = tempfile::TempDir::new()?;
    let store = FixtureStore::open_dir(data_dir.path())?;
    println!("Fixtures live in {}\n", store.describe());

    // Example 1: A plain JSON fixture
    println!("=== Example 1: JSON Fixture ===\n");

    let test_case = TestCase::new("GET", "api/Sample", json!({"Id": "x"}));
    let file_name = store.write(&test_case).await?;
    println!("Wrote {file_name}");

    let model = TemplateModel::for_request("GET", "api/Sample", None);
    let fixture = store.read("GET", "api/Sample", None, &model).await?;
    if let FixtureContent::Json(value) = &fixture.content {
        println!("Resolved {} -> {value}", fixture.file_name);
    }

    // Example 2: The query string is part of the key
    println!("\n=== Example 2: Query Strings ===\n");

    let filtered = TestCase::new("GET", "api/Sample", json!([])).with_query_string("page=2");
    println!("Wrote {}", store.write(&filtered).await?);
    match store.read("GET", "api/Sample", Some("page=3"), &model).await {
        Ok(_) => println!("Unexpected match"),
        Err(e) => println!("page=3: {e}"),
    }

    // Example 3: A template rendered with the request context
    println!("\n=== Example 3: Template ===\n");

    let template = TestCase::new(
        "POST",
        "api/Echo",
        json!(r#"{"path":"@Model.RequestPath","body":@Model.RequestBody}"#),
    )
    .as_template();
    println!("Wrote {}", store.write(&template).await?);

    let model = TemplateModel::for_request("POST", "/api/Echo", None).with_body(r#"{"n":1}"#);
    let rendered = store.read("POST", "api/Echo", None, &model).await?;
    println!("Rendered: {:?}", rendered.content);

    // Example 4: Expectations are counted, then consumed
    println!("\n=== Example 4: Expectations ===\n");

    let expectations = ExpectationRegistry::new();
    let key = TestCase::new("POST", "api/Order", json!({})).key();
    expectations.set_or_replace(&key, json!({"ok": true})).await;

    for _ in 0..2 {
        expectations.try_read(&key).await;
    }
    println!("{}", expectations.verify(&key, 2).await);
    println!("{}", expectations.verify(&key, 2).await);

    println!("\n--- Stored Fixtures ---");
    for name in store.list().await? {
        println!("• {name}");
    }

    Ok(())
}
