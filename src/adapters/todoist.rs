use crate::adapters::ensure_success;
use crate::domain::model::{TaskUpdate, TodoistProject, TodoistTask};
use crate::utils::error::Result;
use reqwest::Client;

pub const DEFAULT_TODOIST_BASE_URL: &str = "https://api.todoist.com/rest/v2";

const SERVICE: &str = "Todoist";

#[derive(Debug, Clone)]
pub struct TodoistClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl TodoistClient {
    pub fn new(client: Client, base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub async fn get_projects(&self) -> Result<Vec<TodoistProject>> {
        tracing::debug!("Fetching Todoist projects");
        let response = self
            .client
            .get(self.url("/projects"))
            .bearer_auth(&self.api_key)
            .send()
            .await?;
        let projects: Vec<TodoistProject> = ensure_success(SERVICE, response).await?.json().await?;
        tracing::info!("Fetched {} projects from Todoist", projects.len());
        Ok(projects)
    }

    /// Active tasks, optionally restricted to one project.
    pub async fn get_tasks(&self, project_id: Option<&str>) -> Result<Vec<TodoistTask>> {
        tracing::debug!("Fetching Todoist tasks (project: {:?})", project_id);
        let mut request = self.client.get(self.url("/tasks")).bearer_auth(&self.api_key);
        if let Some(project_id) = project_id {
            request = request.query(&[("project_id", project_id)]);
        }
        let response = request.send().await?;
        let tasks: Vec<TodoistTask> = ensure_success(SERVICE, response).await?.json().await?;
        tracing::info!("Fetched {} tasks from Todoist", tasks.len());
        Ok(tasks)
    }

    pub async fn update_task(&self, task_id: &str, update: &TaskUpdate) -> Result<TodoistTask> {
        tracing::debug!("Updating Todoist task {}: {:?}", task_id, update);
        let response = self
            .client
            .post(self.url(&format!("/tasks/{}", task_id)))
            .bearer_auth(&self.api_key)
            .json(update)
            .send()
            .await?;
        Ok(ensure_success(SERVICE, response).await?.json().await?)
    }

    pub async fn close_task(&self, task_id: &str) -> Result<()> {
        tracing::debug!("Closing Todoist task {}", task_id);
        let response = self
            .client
            .post(self.url(&format!("/tasks/{}/close", task_id)))
            .bearer_auth(&self.api_key)
            .send()
            .await?;
        ensure_success(SERVICE, response).await?;
        Ok(())
    }
}
