//! HTTP client for the task/project API.

use chrono::{DateTime, SecondsFormat, Utc};
use color_eyre::{eyre::eyre, Result};
use reqwest::{RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde_json::json;
use tracing::debug;
use url::Url;

use crate::config::Config;

use super::api_types::{decode, ErrorBody, ProjectsBody, TasksBody};
use super::error::ApiError;
use super::types::{NewProject, Page, Project, Task};

/// API client carrying the base URL and bearer credential.
///
/// Every request attaches `Authorization: Bearer <token>`. The client holds
/// no mutable state and no cache; clones share the connection pool.
#[derive(Clone)]
pub struct ApiClient {
  http: reqwest::Client,
  base: String,
  token: String,
}

impl ApiClient {
  /// Build a client from loaded configuration.
  pub fn new(config: &Config) -> Result<Self> {
    let token = Config::api_token()?;
    Self::with_base(config.base_url()?, token)
  }

  /// Build a client against an explicit base URL.
  pub fn with_base(base: Url, token: impl Into<String>) -> Result<Self> {
    let http = reqwest::Client::builder()
      .build()
      .map_err(|e| eyre!("Failed to create HTTP client: {}", e))?;

    Ok(Self {
      http,
      base: base.as_str().trim_end_matches('/').to_string(),
      token: token.into(),
    })
  }

  fn endpoint(&self, path: &str) -> String {
    format!("{}{}", self.base, path)
  }

  /// Send a request, mapping non-success statuses to [`ApiError::Http`].
  ///
  /// When the server attaches a decodable error body its message is carried
  /// along; otherwise the bare status stands alone.
  async fn send(&self, request: RequestBuilder) -> Result<Response, ApiError> {
    let response = request.bearer_auth(&self.token).send().await?;

    let status = response.status();
    if !status.is_success() {
      let message = response
        .bytes()
        .await
        .ok()
        .and_then(|body| serde_json::from_slice::<ErrorBody>(&body).ok())
        .map(|body| body.message);
      return Err(ApiError::Http {
        status: status.as_u16(),
        message,
      });
    }

    Ok(response)
  }

  async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ApiError> {
    let response = self.send(request).await?;
    let bytes = response.bytes().await?;
    decode(&bytes)
  }

  /// List one page of projects.
  pub async fn list_projects(&self, page: Page) -> Result<Vec<Project>, ApiError> {
    Ok(self.projects_page(page).await?.projects)
  }

  /// List every project, walking pages until the server reports no more.
  pub async fn list_projects_all(&self) -> Result<Vec<Project>, ApiError> {
    let mut all = Vec::new();
    let mut page = Page::default();

    loop {
      let body = self.projects_page(page).await?;
      all.extend(body.projects);
      if !body.has_next {
        break;
      }
      page = page.next();
    }

    Ok(all)
  }

  async fn projects_page(&self, page: Page) -> Result<ProjectsBody, ApiError> {
    debug!(limit = page.limit, offset = page.offset, "GET /projects");
    let request = self
      .http
      .get(self.endpoint("/projects"))
      .query(&[("limit", page.limit), ("offset", page.offset)]);
    self.send_json(request).await
  }

  /// Create a project. The server answers with the stored entity.
  pub async fn create_project(&self, new: &NewProject) -> Result<Project, ApiError> {
    debug!(name = %new.name, "POST /projects");
    let request = self.http.post(self.endpoint("/projects")).json(new);
    self.send_json(request).await
  }

  /// Delete a project and everything under it.
  pub async fn delete_project(&self, project_id: &str) -> Result<(), ApiError> {
    debug!(project_id, "DELETE /projects/{{id}}");
    let request = self
      .http
      .delete(self.endpoint(&format!("/projects/{project_id}")));
    self.send(request).await?;
    Ok(())
  }

  /// List one page of a project's tasks.
  pub async fn list_tasks(&self, project_id: &str, page: Page) -> Result<Vec<Task>, ApiError> {
    Ok(self.tasks_page(project_id, page).await?.tasks)
  }

  /// List every task in a project.
  pub async fn list_tasks_all(&self, project_id: &str) -> Result<Vec<Task>, ApiError> {
    let mut all = Vec::new();
    let mut page = Page::default();

    loop {
      let body = self.tasks_page(project_id, page).await?;
      all.extend(body.tasks);
      if !body.has_next {
        break;
      }
      page = page.next();
    }

    Ok(all)
  }

  async fn tasks_page(&self, project_id: &str, page: Page) -> Result<TasksBody, ApiError> {
    debug!(
      project_id,
      limit = page.limit,
      offset = page.offset,
      "GET /projects/{{id}}/tasks"
    );
    let request = self
      .http
      .get(self.endpoint(&format!("/projects/{project_id}/tasks")))
      .query(&[("limit", page.limit), ("offset", page.offset)]);
    self.send_json(request).await
  }

  /// Create a task under a project.
  pub async fn create_task(&self, project_id: &str, name: &str) -> Result<Task, ApiError> {
    debug!(project_id, name, "POST /projects/{{id}}/tasks");
    let request = self
      .http
      .post(self.endpoint(&format!("/projects/{project_id}/tasks")))
      .json(&json!({ "name": name }));
    self.send_json(request).await
  }

  /// Mark a task completed at the given instant.
  pub async fn complete_task(&self, task_id: &str, at: DateTime<Utc>) -> Result<(), ApiError> {
    debug!(task_id, "PATCH /tasks/{{id}}");
    let request = self
      .http
      .patch(self.endpoint(&format!("/tasks/{task_id}")))
      .json(&json!({ "completed_at": at.to_rfc3339_opts(SecondsFormat::Millis, true) }));
    self.send(request).await?;
    Ok(())
  }

  /// Delete a task.
  pub async fn delete_task(&self, task_id: &str) -> Result<(), ApiError> {
    debug!(task_id, "DELETE /tasks/{{id}}");
    let request = self.http.delete(self.endpoint(&format!("/tasks/{task_id}")));
    self.send(request).await?;
    Ok(())
  }
}
