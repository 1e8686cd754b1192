use crate::adapters::notion::{props, NotionClient};
use crate::adapters::todoist::TodoistClient;
use crate::core::apply::apply_plan;
use crate::core::mapping::IdMappingStore;
use crate::domain::model::{
    MatchStrategy, NotionPage, SyncAction, SyncOptions, SyncPlan, SyncReport, TodoistProject,
};
use crate::domain::ports::{Storage, SyncPipeline};
use crate::utils::error::Result;
use async_trait::async_trait;
use chrono::Utc;
use serde_json::{Map, Value};
use std::collections::{HashMap, HashSet};
use tokio::sync::Mutex;

pub const NAME_PROPERTY: &str = "Name";
pub const TODOIST_ID_PROPERTY: &str = "Todoist ID";
pub const SOURCE_PROPERTY: &str = "Source";
pub const LAST_SYNCED_PROPERTY: &str = "Last Synced";
pub const DESCRIPTION_PROPERTY: &str = "Description";
pub const CATEGORY_PROPERTY: &str = "Category";

pub struct ProjectSnapshot {
    pub projects: Vec<TodoistProject>,
    pub pages: Vec<NotionPage>,
}

pub struct ProjectSyncPipeline<S: Storage> {
    todoist: TodoistClient,
    notion: NotionClient,
    database_id: String,
    mapping: Mutex<IdMappingStore<S>>,
    options: SyncOptions,
}

impl<S: Storage> ProjectSyncPipeline<S> {
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

/// Properties written for every project: create and update alike.
fn common_properties(
    project: &TodoistProject,
    category: Option<&str>,
    synced_at: &str,
) -> Map<String, Value> {
    let mut properties = Map::new();
    properties.insert(NAME_PROPERTY.to_string(), props::title(&project.name));
    properties.insert(LAST_SYNCED_PROPERTY.to_string(), props::date(synced_at));
    properties.insert(
        DESCRIPTION_PROPERTY.to_string(),
        props::rich_text(&project.description()),
    );
    if let Some(category) = category {
        properties.insert(CATEGORY_PROPERTY.to_string(), props::select(category));
    }
    properties
}

fn create_properties(
    project: &TodoistProject,
    category: Option<&str>,
    synced_at: &str,
) -> Map<String, Value> {
    let mut properties = common_properties(project, category, synced_at);
    properties.insert(
        TODOIST_ID_PROPERTY.to_string(),
        props::rich_text(&project.id),
    );
    properties.insert(SOURCE_PROPERTY.to_string(), props::select("Todoist"));
    properties
}

/// The name-matching mode only ever writes the title and the parent category.
fn name_only_properties(project: &TodoistProject, category: Option<&str>) -> Map<String, Value> {
    let mut properties = Map::new();
    properties.insert(NAME_PROPERTY.to_string(), props::title(&project.name));
    if let Some(category) = category {
        properties.insert(CATEGORY_PROPERTY.to_string(), props::select(category));
    }
    properties
}

/// Page id per `Todoist ID` value. On duplicates the first page in query
/// order wins.
pub(crate) fn index_by_todoist_id(pages: &[NotionPage]) -> HashMap<String, &str> {
    let mut index = HashMap::new();
    for page in pages {
        if let Some(id) = page.rich_text(TODOIST_ID_PROPERTY).filter(|id| !id.is_empty()) {
            index.entry(id).or_insert(page.id.as_str());
        }
    }
    index
}

/// Pairs projects with pages. Stale mapping entries (page no longer in the
/// database) are dropped from `mapping`.
pub fn plan_projects<S: Storage>(
    projects: &[TodoistProject],
    pages: &[NotionPage],
    mapping: &mut IdMappingStore<S>,
    strategy: MatchStrategy,
    synced_at: &str,
) -> SyncPlan {
    let names_by_id: HashMap<&str, &str> = projects
        .iter()
        .map(|p| (p.id.as_str(), p.name.as_str()))
        .collect();
    let page_ids: HashSet<&str> = pages.iter().map(|p| p.id.as_str()).collect();

    let mut plan = SyncPlan::default();
    match strategy {
        MatchStrategy::TodoistId => {
            let by_todoist_id = index_by_todoist_id(pages);

            for project in projects {
                let category = project
                    .parent_id
                    .as_deref()
                    .and_then(|parent| names_by_id.get(parent).copied());

                let mapped = mapping.get(&project.id).map(str::to_string);
                let mapped = match mapped {
                    Some(page_id) if page_ids.contains(page_id.as_str()) => Some(page_id),
                    Some(page_id) => {
                        tracing::debug!(
                            "Dropping stale mapping {} -> {} for project '{}'",
                            project.id,
                            page_id,
                            project.name
                        );
                        mapping.remove(&project.id);
                        None
                    }
                    None => None,
                };
                let page_id =
                    mapped.or_else(|| by_todoist_id.get(&project.id).map(|id| id.to_string()));

                plan.actions.push(match page_id {
                    Some(page_id) => SyncAction::Update {
                        source_id: project.id.clone(),
                        page_id,
                        name: project.name.clone(),
                        properties: common_properties(project, category, synced_at),
                    },
                    None => SyncAction::Create {
                        source_id: project.id.clone(),
                        name: project.name.clone(),
                        properties: create_properties(project, category, synced_at),
                    },
                });
            }
        }
        MatchStrategy::Name => {
            let existing: HashSet<String> = pages
                .iter()
                .filter_map(|page| page.title(NAME_PROPERTY))
                .collect();

            for project in projects {
                let category = project
                    .parent_id
                    .as_deref()
                    .and_then(|parent| names_by_id.get(parent).copied());

                plan.actions.push(if existing.contains(&project.name) {
                    SyncAction::Skip {
                        source_id: project.id.clone(),
                        name: project.name.clone(),
                        reason: "a page with this name already exists".to_string(),
                    }
                } else {
                    SyncAction::Create {
                        source_id: project.id.clone(),
                        name: project.name.clone(),
                        properties: name_only_properties(project, category),
                    }
                });
            }
        }
    }

    plan
}

#[async_trait]
impl<S: Storage> SyncPipeline for ProjectSyncPipeline<S> {
    type Snapshot = ProjectSnapshot;

    fn name(&self) -> &'static str {
        "project"
    }

    async fn extract(&self) -> Result<ProjectSnapshot> {
        let projects = self.todoist.get_projects().await?;
        let pages = self.notion.query_database(&self.database_id, None).await?;
        Ok(ProjectSnapshot { projects, pages })
    }

    async fn plan(&self, snapshot: ProjectSnapshot) -> Result<SyncPlan> {
        let synced_at = Utc::now().to_rfc3339();
        let mut mapping = self.mapping.lock().await;
        Ok(plan_projects(
            &snapshot.projects,
            &snapshot.pages,
            &mut *mapping,
            self.options.match_strategy,
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
            "project",
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

    fn project(id: &str, name: &str, parent: Option<&str>) -> TodoistProject {
        TodoistProject {
            id: id.to_string(),
            name: name.to_string(),
            parent_id: parent.map(str::to_string),
            comment_count: 0,
            color: None,
            is_favorite: false,
            url: None,
        }
    }

    fn page(id: &str, name: &str, todoist_id: Option<&str>) -> NotionPage {
        let mut properties = json!({
            "Name": {"title": [{"text": {"content": name}}]}
        });
        if let Some(todoist_id) = todoist_id {
            properties["Todoist ID"] = json!({"rich_text": [{"plain_text": todoist_id}]});
        }
        serde_json::from_value(json!({"id": id, "properties": properties})).unwrap()
    }

    async fn empty_mapping() -> IdMappingStore<MemoryStorage> {
        IdMappingStore::load(MemoryStorage::new(), "projects")
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_todoist_id_strategy_updates_matches_and_creates_the_rest() {
        let projects = vec![
            project("100", "Home", None),
            project("101", "Garden", Some("100")),
        ];
        let pages = vec![page("page-home", "Home (renamed)", Some("100"))];
        let mut mapping = empty_mapping().await;

        let plan = plan_projects(
            &projects,
            &pages,
            &mut mapping,
            MatchStrategy::TodoistId,
            "2026-10-16T00:00:00+00:00",
        );

        assert_eq!(plan.updates(), 1);
        assert_eq!(plan.creates(), 1);
        match &plan.actions[0] {
            SyncAction::Update {
                page_id,
                properties,
                ..
            } => {
                assert_eq!(page_id, "page-home");
                assert_eq!(properties["Name"], props::title("Home"));
                assert!(!properties.contains_key("Todoist ID"));
            }
            other => panic!("expected update, got {:?}", other),
        }
        match &plan.actions[1] {
            SyncAction::Create { properties, .. } => {
                assert_eq!(properties["Todoist ID"], props::rich_text("101"));
                assert_eq!(properties["Source"], props::select("Todoist"));
                assert_eq!(properties["Category"], props::select("Home"));
                assert_eq!(
                    properties["Description"],
                    props::rich_text("Contains 0 comments. Todoist Project ID: 101.")
                );
            }
            other => panic!("expected create, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_mapping_wins_and_stale_entries_are_dropped() {
        let projects = vec![project("100", "Home", None), project("200", "Work", None)];
        let pages = vec![page("page-a", "Home", None)];
        let mut mapping = empty_mapping().await;
        mapping.insert("100", "page-a");
        mapping.insert("200", "page-gone");

        let plan = plan_projects(
            &projects,
            &pages,
            &mut mapping,
            MatchStrategy::TodoistId,
            "now",
        );

        assert!(matches!(&plan.actions[0], SyncAction::Update { page_id, .. } if page_id == "page-a"));
        assert!(matches!(&plan.actions[1], SyncAction::Create { .. }));
        assert_eq!(mapping.get("200"), None);
    }

    #[tokio::test]
    async fn test_name_strategy_skips_existing_titles() {
        let projects = vec![
            project("600", "Existing Project", None),
            project("601", "New Project To Create", None),
            project("602", "Child", Some("600")),
        ];
        let pages = vec![page("page-x", "Existing Project", None)];
        let mut mapping = empty_mapping().await;

        let plan = plan_projects(&projects, &pages, &mut mapping, MatchStrategy::Name, "now");

        assert!(matches!(&plan.actions[0], SyncAction::Skip { .. }));
        match &plan.actions[1] {
            SyncAction::Create { properties, .. } => {
                assert_eq!(properties.len(), 1);
                assert_eq!(properties["Name"], props::title("New Project To Create"));
            }
            other => panic!("expected create, got {:?}", other),
        }
        match &plan.actions[2] {
            SyncAction::Create { properties, .. } => {
                assert_eq!(properties["Category"], props::select("Existing Project"));
            }
            other => panic!("expected create, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_unknown_parent_has_no_category() {
        let projects = vec![project("1", "Orphan", Some("999"))];
        let mut mapping = empty_mapping().await;
        let plan = plan_projects(&projects, &[], &mut mapping, MatchStrategy::TodoistId, "now");
        match &plan.actions[0] {
            SyncAction::Create { properties, .. } => {
                assert!(!properties.contains_key("Category"))
            }
            other => panic!("expected create, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_duplicate_todoist_id_updates_first_page() {
        let projects = vec![project("100", "Home", None)];
        let pages = vec![
            page("page-first", "Home", Some("100")),
            page("page-second", "Home copy", Some("100")),
        ];
        let mut mapping = empty_mapping().await;

        let plan = plan_projects(&projects, &pages, &mut mapping, MatchStrategy::TodoistId, "now");

        match &plan.actions[0] {
            SyncAction::Update { page_id, .. } => assert_eq!(page_id, "page-first"),
            other => panic!("expected update, got {:?}", other),
        }
    }
}
