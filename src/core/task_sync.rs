use crate::adapters::notion::{props, NotionClient};
use crate::adapters::todoist::TodoistClient;
use crate::core::apply::apply_plan;
use crate::core::mapping::IdMappingStore;
use crate::core::project_sync::{
    index_by_todoist_id, DESCRIPTION_PROPERTY, LAST_SYNCED_PROPERTY, NAME_PROPERTY, SOURCE_PROPERTY,
    TODOIST_ID_PROPERTY,
};
use crate::domain::model::{
    NotionPage, SyncAction, SyncOptions, SyncPlan, SyncReport, TodoistProject, TodoistTask,
};
use crate::domain::ports::{Storage, SyncPipeline};
use crate::utils::error::Result;
use async_trait::async_trait;
use chrono::Utc;
use serde_json::{Map, Value};
use std::collections::{HashMap, HashSet};
use tokio::sync::Mutex;

pub const PROJECT_PROPERTY: &str = "Project";
pub const LABELS_PROPERTY: &str = "Labels";
pub const PRIORITY_PROPERTY: &str = "Priority";
pub const DUE_PROPERTY: &str = "Due";
pub const COMPLETED_PROPERTY: &str = "Completed";
pub const URL_PROPERTY: &str = "URL";

pub struct TaskSnapshot {
    pub tasks: Vec<TodoistTask>,
    pub projects: Vec<TodoistProject>,
    pub pages: Vec<NotionPage>,
}

pub struct TaskSyncPipeline<S: Storage> {
    todoist: TodoistClient,
    notion: NotionClient,
    database_id: String,
    mapping: Mutex<IdMappingStore<S>>,
    options: SyncOptions,
}

impl<S: Storage> TaskSyncPipeline<S> {
    pub fn new(
        todoist: TodoistClient,
        notion: NotionClient,
        database_id: impl Into<String>,
        mapping: IdMappingStore<S>,
        options: SyncOptions,
    ) -> Self {
        Self {
            todoist,
            notion,
            database_id: database_id.into(),
            mapping: Mutex::new(mapping),
            options,
        }
    }
}

pub fn task_properties(
    task: &TodoistTask,
    project_name: Option<&str>,
    synced_at: &str,
) -> Map<String, Value> {
    let mut properties = Map::new();
    properties.insert(NAME_PROPERTY.to_string(), props::title(&task.content));
    properties.insert(TODOIST_ID_PROPERTY.to_string(), props::rich_text(&task.id));
    properties.insert(LABELS_PROPERTY.to_string(), props::multi_select(task.labels.as_slice()));
    properties.insert(
        PRIORITY_PROPERTY.to_string(),
        props::select(&task.priority_label()),
    );
    properties.insert(
        COMPLETED_PROPERTY.to_string(),
        props::checkbox(task.is_completed),
    );
    properties.insert(LAST_SYNCED_PROPERTY.to_string(), props::date(synced_at));

    if let Some(project_name) = project_name {
        properties.insert(PROJECT_PROPERTY.to_string(), props::select(project_name));
    }
    if let Some(due) = &task.due {
        let start = due.datetime.as_deref().unwrap_or(&due.date);
        properties.insert(DUE_PROPERTY.to_string(), props::date(start));
    }
    if !task.description.is_empty() {
        properties.insert(
            DESCRIPTION_PROPERTY.to_string(),
            props::rich_text(&task.description),
        );
    }
    if let Some(url) = &task.url {
        properties.insert(URL_PROPERTY.to_string(), props::url(url));
    }
    properties
}

pub fn plan_tasks<S: Storage>(
    tasks: &[TodoistTask],
    projects: &[TodoistProject],
    pages: &[NotionPage],
    mapping: &mut IdMappingStore<S>,
    synced_at: &str,
) -> SyncPlan {
    let project_names: HashMap<&str, &str> = projects
        .iter()
        .map(|p| (p.id.as_str(), p.name.as_str()))
        .collect();
    let page_ids: HashSet<&str> = pages.iter().map(|p| p.id.as_str()).collect();
    let by_todoist_id = index_by_todoist_id(pages);

    let mut plan = SyncPlan::default();
    for task in tasks {
        let project_name = project_names.get(task.project_id.as_str()).copied();
        let mut properties = task_properties(task, project_name, synced_at);

        let mapped = match mapping.get(&task.id).map(str::to_string) {
            Some(page_id) if page_ids.contains(page_id.as_str()) => Some(page_id),
            Some(_) => {
                mapping.remove(&task.id);
                None
            }
            None => None,
        };

        plan.actions.push(
            match mapped.or_else(|| by_todoist_id.get(&task.id).map(|id| id.to_string())) {
                Some(page_id) => SyncAction::Update {
                    source_id: task.id.clone(),
                    page_id,
                    name: task.content.clone(),
                    properties,
                },
                None => {
                    properties.insert(SOURCE_PROPERTY.to_string(), props::select("Todoist"));
                    SyncAction::Create {
                        source_id: task.id.clone(),
                        name: task.content.clone(),
                        properties,
                    }
                }
            },
        );
    }

    plan
}

#[async_trait]
impl<S: Storage> SyncPipeline for TaskSyncPipeline<S> {
    type Snapshot = TaskSnapshot;

    fn name(&self) -> &'static str {
        "task"
    }

    async fn extract(&self) -> Result<TaskSnapshot> {
        let projects = self.todoist.get_projects().await?;
        let tasks = self.todoist.get_tasks(None).await?;
        let pages = self.notion.query_database(&self.database_id, None).await?;
        Ok(TaskSnapshot {
            tasks,
            projects,
            pages,
        })
    }

    async fn plan(&self, snapshot: TaskSnapshot) -> Result<SyncPlan> {
        let synced_at = Utc::now().to_rfc3339();
        let mut mapping = self.mapping.lock().await;
        Ok(plan_tasks(
            &snapshot.tasks,
            &snapshot.projects,
            &snapshot.pages,
            &mut *mapping,
            &synced_at,
        ))
    }

    async fn apply(&self, plan: SyncPlan) -> Result<SyncReport> {
        let mut mapping = self.mapping.lock().await;
        Ok(apply_plan(
            &self.notion,
            &self.database_id,
            &mut *mapping,
            plan,
            "task",
            self.options.dry_run,
        )
        .await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::storage::MemoryStorage;
    use serde_json::json;

    fn task(value: Value) -> TodoistTask {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_task_properties() {
        let task = task(json!({
            "id": "7",
            "project_id": "100",
            "content": "Buy milk",
            "labels": ["errand"],
            "priority": 3,
            "due": {"date": "2026-10-17", "is_recurring": false},
            "url": "https://todoist.com/showTask?id=7"
        }));
        let properties = task_properties(&task, Some("Home"), "now");

        assert_eq!(properties["Name"], props::title("Buy milk"));
        assert_eq!(properties["Project"], props::select("Home"));
        assert_eq!(properties["Labels"], json!({"multi_select": [{"name": "errand"}]}));
        assert_eq!(properties["Priority"], props::select("P2"));
        assert_eq!(properties["Due"], props::date("2026-10-17"));
        assert_eq!(properties["Completed"], props::checkbox(false));
        assert!(!properties.contains_key("Description"));
        assert!(properties.contains_key("URL"));
    }

    #[test]
    fn test_due_datetime_preferred_over_date() {
        let task = task(json!({
            "id": "8",
            "project_id": "100",
            "content": "Standup",
            "due": {"date": "2026-10-17", "datetime": "2026-10-17T09:30:00Z"}
        }));
        let properties = task_properties(&task, None, "now");
        assert_eq!(properties["Due"], props::date("2026-10-17T09:30:00Z"));
        assert!(!properties.contains_key("Project"));
    }

    #[tokio::test]
    async fn test_plan_tasks_matches_by_todoist_id() {
        let tasks = vec![
            task(json!({"id": "1", "project_id": "9", "content": "Old"})),
            task(json!({"id": "2", "project_id": "9", "content": "New"})),
        ];
        let pages: Vec<NotionPage> = serde_json::from_value(json!([
            {"id": "page-1", "properties": {"Todoist ID": {"rich_text": [{"plain_text": "1"}]}}}
        ]))
        .unwrap();
        let mut mapping = IdMappingStore::load(MemoryStorage::new(), "tasks")
            .await
            .unwrap();

        let plan = plan_tasks(&tasks, &[], &pages, &mut mapping, "now");

        assert!(matches!(&plan.actions[0], SyncAction::Update { page_id, .. } if page_id == "page-1"));
        match &plan.actions[1] {
            SyncAction::Create { properties, .. } => {
                assert_eq!(properties["Source"], props::select("Todoist"))
            }
            other => panic!("expected create, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_duplicate_todoist_id_updates_first_page() {
        let tasks = vec![task(json!({"id": "5", "project_id": "9", "content": "Dup"}))];
        let pages: Vec<NotionPage> = serde_json::from_value(json!([
            {"id": "page-first", "properties": {"Todoist ID": {"rich_text": [{"plain_text": "5"}]}}},
            {"id": "page-second", "properties": {"Todoist ID": {"rich_text": [{"plain_text": "5"}]}}}
        ]))
        .unwrap();
        let mut mapping = IdMappingStore::load(MemoryStorage::new(), "tasks")
            .await
            .unwrap();

        let plan = plan_tasks(&tasks, &[], &pages, &mut mapping, "now");

        assert!(matches!(&plan.actions[0], SyncAction::Update { page_id, .. } if page_id == "page-first"));
    }
}
