use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Todoist ids are strings in REST v2 but older payloads carry integers.
fn deserialize_id<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected string or number id, got {}",
            other
        ))),
    }
}

fn deserialize_optional_id<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(Value::Number(n)) => Ok(Some(n.to_string())),
        Some(other) => Err(serde::de::Error::custom(format!(
            "expected string or number id, got {}",
            other
        ))),
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TodoistProject {
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,
    pub name: String,
    #[serde(default, deserialize_with = "deserialize_optional_id")]
    pub parent_id: Option<String>,
    #[serde(default)]
    pub comment_count: u32,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub is_favorite: bool,
    #[serde(default)]
    pub url: Option<String>,
}

impl TodoistProject {
    pub fn description(&self) -> String {
        format!(
            "Contains {} comments. Todoist Project ID: {}.",
            self.comment_count, self.id
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TodoistDue {
    pub date: String,
    #[serde(default)]
    pub string: Option<String>,
    #[serde(default)]
    pub is_recurring: bool,
    #[serde(default)]
    pub datetime: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TodoistTask {
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,
    #[serde(deserialize_with = "deserialize_id")]
    pub project_id: String,
    pub content: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub labels: Vec<String>,
    #[serde(default = "default_priority")]
    pub priority: u8,
    #[serde(default)]
    pub due: Option<TodoistDue>,
    #[serde(default)]
    pub is_completed: bool,
    #[serde(default)]
    pub url: Option<String>,
}

fn default_priority() -> u8 {
    1
}

impl TodoistTask {
    /// Todoist counts priority upwards (4 is urgent) while the UI shows it
    /// downwards (P1 is urgent).
    pub fn priority_label(&self) -> String {
        format!("P{}", 5 - self.priority.clamp(1, 4))
    }
}

/// Fields to change on a Todoist task. Unset fields are left untouched.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct TaskUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub labels: Option<Vec<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NotionPage {
    pub id: String,
    #[serde(default)]
    pub properties: Map<String, Value>,
}

impl NotionPage {
    fn text_of(&self, property: &str, kind: &str) -> Option<String> {
        let fragments = self.properties.get(property)?.get(kind)?.as_array()?;
        let text: String = fragments
            .iter()
            .filter_map(|fragment| {
                fragment
                    .get("plain_text")
                    .and_then(Value::as_str)
                    .or_else(|| {
                        fragment
                            .get("text")
                            .and_then(|t| t.get("content"))
                            .and_then(Value::as_str)
                    })
            })
            .collect();
        Some(text)
    }

    pub fn title(&self, property: &str) -> Option<String> {
        self.text_of(property, "title")
    }

    pub fn rich_text(&self, property: &str) -> Option<String> {
        self.text_of(property, "rich_text")
    }
}

/// How Todoist records are paired with existing Notion pages.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[serde(rename_all = "snake_case")]
pub enum MatchStrategy {
    /// Mapping store, then the `Todoist ID` property. Matches are updated.
    #[default]
    TodoistId,
    /// Literal title equality. Matches are left alone.
    Name,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncOptions {
    pub match_strategy: MatchStrategy,
    pub dry_run: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SyncAction {
    Create {
        source_id: String,
        name: String,
        properties: Map<String, Value>,
    },
    Update {
        source_id: String,
        page_id: String,
        name: String,
        properties: Map<String, Value>,
    },
    Skip {
        source_id: String,
        name: String,
        reason: String,
    },
}

impl SyncAction {
    pub fn source_id(&self) -> &str {
        match self {
            SyncAction::Create { source_id, .. }
            | SyncAction::Update { source_id, .. }
            | SyncAction::Skip { source_id, .. } => source_id,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            SyncAction::Create { name, .. }
            | SyncAction::Update { name, .. }
            | SyncAction::Skip { name, .. } => name,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SyncPlan {
    pub actions: Vec<SyncAction>,
}

impl SyncPlan {
    pub fn creates(&self) -> usize {
        self.actions
            .iter()
            .filter(|a| matches!(a, SyncAction::Create { .. }))
            .count()
    }

    pub fn updates(&self) -> usize {
        self.actions
            .iter()
            .filter(|a| matches!(a, SyncAction::Update { .. }))
            .count()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SyncReport {
    pub checked: usize,
    pub created: usize,
    pub updated: usize,
    pub skipped: usize,
    pub errors: Vec<String>,
}

impl SyncReport {
    pub fn status(&self) -> &'static str {
        if self.errors.is_empty() {
            "success"
        } else {
            "partial_success"
        }
    }

    pub fn message(&self) -> String {
        format!(
            "Sync complete! Checked: {}, Created: {}, Updated: {}. Encountered {} error(s).",
            self.checked,
            self.created,
            self.updated,
            self.errors.len()
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SyncResponse {
    pub status: String,
    pub message: String,
    pub details: SyncReport,
}

/// Response body plus the HTTP status the trigger should answer with.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SyncOutcome {
    pub status_code: u16,
    pub body: SyncResponse,
}

impl SyncOutcome {
    pub fn completed(report: SyncReport) -> Self {
        Self {
            status_code: 200,
            body: SyncResponse {
                status: report.status().to_string(),
                message: report.message(),
                details: report,
            },
        }
    }

    pub fn failed(status_code: u16, message: String, mut partial: SyncReport, detail: String) -> Self {
        partial.errors.push(detail);
        Self {
            status_code,
            body: SyncResponse {
                status: "error".to_string(),
                message,
                details: partial,
            },
        }
    }
}
