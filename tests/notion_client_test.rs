use anyhow::Result;
use httpmock::prelude::*;
use serde_json::json;
use todoist_notion_sync::adapters::notion::{NotionClient, DEFAULT_NOTION_VERSION};
use todoist_notion_sync::SyncError;

fn client(server: &MockServer) -> NotionClient {
    NotionClient::new(
        reqwest::Client::new(),
        server.url("/v1"),
        "fake_notion_key",
        DEFAULT_NOTION_VERSION,
    )
}

#[tokio::test]
async fn test_find_by_rich_text_sends_equals_filter() -> Result<()> {
    let server = MockServer::start_async().await;
    let query = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/v1/databases/fake_db_id/query")
                .header("Notion-Version", "2022-06-28")
                .header("Authorization", "Bearer fake_notion_key")
                .json_body(json!({
                    "filter": {"property": "Todoist ID", "rich_text": {"equals": "2203306141"}}
                }));
            then.status(200).json_body(json!({
                "results": [{
                    "id": "page-work",
                    "properties": {
                        "Name": {"title": [{"plain_text": "Work"}]},
                        "Todoist ID": {"rich_text": [{"plain_text": "2203306141"}]}
                    }
                }],
                "has_more": false,
                "next_cursor": null
            }));
        })
        .await;

    let pages = client(&server)
        .find_by_rich_text("fake_db_id", "Todoist ID", "2203306141")
        .await?;

    query.assert_async().await;
    assert_eq!(pages.len(), 1);
    assert_eq!(pages[0].id, "page-work");
    assert_eq!(pages[0].title("Name").as_deref(), Some("Work"));
    Ok(())
}

#[tokio::test]
async fn test_query_error_carries_status() -> Result<()> {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/v1/databases/missing/query");
            then.status(404).body("Could not find database");
        })
        .await;

    let err = client(&server)
        .query_database("missing", None)
        .await
        .unwrap_err();

    assert_eq!(err.status_code(), Some(404));
    assert!(matches!(err, SyncError::HttpStatusError { service: "Notion", .. }));
    Ok(())
}
