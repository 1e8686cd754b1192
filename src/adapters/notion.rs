use crate::adapters::ensure_success;
use crate::domain::model::NotionPage;
use crate::utils::error::Result;
use reqwest::{Client, RequestBuilder};
use serde::Deserialize;
use serde_json::{json, Map, Value};

pub const DEFAULT_NOTION_BASE_URL: &str = "https://api.notion.com/v1";
pub const DEFAULT_NOTION_VERSION: &str = "2022-06-28";

const SERVICE: &str = "Notion";

#[derive(Debug, Deserialize)]
struct QueryResponse {
    #[serde(default)]
    results: Vec<NotionPage>,
    #[serde(default)]
    has_more: bool,
    #[serde(default)]
    next_cursor: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NotionClient {
    client: Client,
    base_url: String,
    api_key: String,
    version: String,
}

impl NotionClient {
    pub fn new(
        client: Client,
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            version: version.into(),
        }
    }

    fn request(&self, method: reqwest::Method, path: &str) -> RequestBuilder {
        self.client
            .request(method, format!("{}{}", self.base_url, path))
            .bearer_auth(&self.api_key)
            .header("Content-Type", "application/json")
            .header("Notion-Version", &self.version)
    }

    /// Every page of the database matching `filter`, following pagination.
    pub async fn query_database(
        &self,
        database_id: &str,
        filter: Option<Value>,
    ) -> Result<Vec<NotionPage>> {
        let mut pages = Vec::new();
        let mut cursor: Option<String> = None;

        loop {
            let mut body = Map::new();
            if let Some(filter) = &filter {
                body.insert("filter".to_string(), filter.clone());
            }
            if let Some(cursor) = &cursor {
                body.insert("start_cursor".to_string(), Value::String(cursor.clone()));
            }

            let response = self
                .request(
                    reqwest::Method::POST,
                    &format!("/databases/{}/query", database_id),
                )
                .json(&body)
                .send()
                .await?;
            let batch: QueryResponse = ensure_success(SERVICE, response).await?.json().await?;
            tracing::debug!(
                "Notion query returned {} pages (has_more: {})",
                batch.results.len(),
                batch.has_more
            );
            pages.extend(batch.results);

            match batch.next_cursor {
                Some(next) if batch.has_more => cursor = Some(next),
                _ => break,
            }
        }

        tracing::info!("Fetched {} pages from Notion database {}", pages.len(), database_id);
        Ok(pages)
    }

    pub async fn find_by_rich_text(
        &self,
        database_id: &str,
        property: &str,
        value: &str,
    ) -> Result<Vec<NotionPage>> {
        let filter = json!({
            "property": property,
            "rich_text": { "equals": value }
        });
        self.query_database(database_id, Some(filter)).await
    }

    pub async fn create_page(
        &self,
        database_id: &str,
        properties: Map<String, Value>,
    ) -> Result<NotionPage> {
        let payload = json!({
            "parent": { "database_id": database_id },
            "properties": properties,
        });
        let response = self
            .request(reqwest::Method::POST, "/pages")
            .json(&payload)
            .send()
            .await?;
        Ok(ensure_success(SERVICE, response).await?.json().await?)
    }

    pub async fn update_page(
        &self,
        page_id: &str,
        properties: Map<String, Value>,
    ) -> Result<NotionPage> {
        let payload = json!({ "properties": properties });
        let response = self
            .request(reqwest::Method::PATCH, &format!("/pages/{}", page_id))
            .json(&payload)
            .send()
            .await?;
        Ok(ensure_success(SERVICE, response).await?.json().await?)
    }
}

/// Builders for Notion property values.
pub mod props {
    use serde_json::{json, Value};

    pub fn title(content: &str) -> Value {
        json!({ "title": [{ "text": { "content": content } }] })
    }

    pub fn rich_text(content: &str) -> Value {
        json!({ "rich_text": [{ "text": { "content": content } }] })
    }

    pub fn select(name: &str) -> Value {
        json!({ "select": { "name": name } })
    }

    pub fn multi_select<S: AsRef<str>>(names: &[S]) -> Value {
        let options: Vec<Value> = names
            .iter()
            .map(|n| json!({ "name": n.as_ref() }))
            .collect();
        json!({ "multi_select": options })
    }

    pub fn date(start: &str) -> Value {
        json!({ "date": { "start": start } })
    }

    pub fn checkbox(checked: bool) -> Value {
        json!({ "checkbox": checked })
    }

    pub fn url(url: &str) -> Value {
        json!({ "url": url })
    }
}

#[cfg(test)]
mod tests {
    use super::props;
    use serde_json::json;

    #[test]
    fn test_property_shapes() {
        assert_eq!(
            props::title("Home"),
            json!({"title": [{"text": {"content": "Home"}}]})
        );
        assert_eq!(props::select("Todoist"), json!({"select": {"name": "Todoist"}}));
        assert_eq!(
            props::multi_select(&["errand", "phone"]),
            json!({"multi_select": [{"name": "errand"}, {"name": "phone"}]})
        );
        assert_eq!(
            props::date("2026-10-16"),
            json!({"date": {"start": "2026-10-16"}})
        );
        assert_eq!(props::checkbox(true), json!({"checkbox": true}));
    }
}
