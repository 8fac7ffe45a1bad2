//! Query-cache bindings for the project and task collections.
//!
//! Each collection pairs a cache key with the client call that fills it and
//! declares, per mutation, which key prefixes go stale on success. The keys
//! mirror the resource paths: `["projects"]` for the project list,
//! `["projects", <id>, "tasks"]` for one project's tasks.

use chrono::{DateTime, Utc};

use crate::query::{MutationBinding, QueryCache, QueryHandle, QueryKey};

use super::client::ApiClient;
use super::error::ApiError;
use super::types::{NewProject, Page, Project, Task};

/// Cache key for the project list.
pub fn projects_key() -> QueryKey {
  QueryKey::new(["projects"])
}

/// Cache key for one project's task list.
pub fn project_tasks_key(project_id: &str) -> QueryKey {
  QueryKey::new(["projects", project_id, "tasks"])
}

/// How much of a collection a list observation fetches.
#[derive(Debug, Clone, Copy)]
pub enum ListRange {
  /// One pagination window.
  Page(Page),
  /// Walk every page.
  All,
}

/// Mutation wired to the API client.
pub type ApiMutation<I, O> = MutationBinding<I, O, ApiError>;

/// Cache bindings for the project collection.
#[derive(Clone)]
pub struct ProjectStore {
  client: ApiClient,
  cache: QueryCache,
}

impl ProjectStore {
  pub fn new(client: ApiClient, cache: QueryCache) -> Self {
    Self { client, cache }
  }

  /// Observe the project list under `["projects"]`.
  pub fn list(&self, range: ListRange) -> QueryHandle<Vec<Project>> {
    let client = self.client.clone();
    self.cache.observe(projects_key(), move || {
      let client = client.clone();
      async move {
        match range {
          ListRange::Page(page) => client.list_projects(page).await,
          ListRange::All => client.list_projects_all().await,
        }
      }
    })
  }

  /// Create a project; invalidates `["projects"]`.
  pub fn create(&self) -> ApiMutation<NewProject, Project> {
    let client = self.client.clone();
    MutationBinding::new(self.cache.clone(), move |new: NewProject| {
      let client = client.clone();
      async move { client.create_project(&new).await }
    })
    .invalidates(projects_key())
  }

  /// Delete a project; invalidates `["projects"]` and, through the prefix,
  /// every cached task list under it.
  pub fn remove(&self) -> ApiMutation<String, ()> {
    let client = self.client.clone();
    MutationBinding::new(self.cache.clone(), move |project_id: String| {
      let client = client.clone();
      async move { client.delete_project(&project_id).await }
    })
    .invalidates(projects_key())
  }
}

/// Cache bindings for one project's task collection.
#[derive(Clone)]
pub struct TaskStore {
  client: ApiClient,
  cache: QueryCache,
  project_id: String,
}

impl TaskStore {
  pub fn new(client: ApiClient, cache: QueryCache, project_id: impl Into<String>) -> Self {
    Self {
      client,
      cache,
      project_id: project_id.into(),
    }
  }

  fn key(&self) -> QueryKey {
    project_tasks_key(&self.project_id)
  }

  /// Observe this project's task list.
  pub fn list(&self, range: ListRange) -> QueryHandle<Vec<Task>> {
    let client = self.client.clone();
    let project_id = self.project_id.clone();
    self.cache.observe(self.key(), move || {
      let client = client.clone();
      let project_id = project_id.clone();
      async move {
        match range {
          ListRange::Page(page) => client.list_tasks(&project_id, page).await,
          ListRange::All => client.list_tasks_all(&project_id).await,
        }
      }
    })
  }

  /// Create a task from its name; invalidates this project's task list.
  pub fn create(&self) -> ApiMutation<String, Task> {
    let client = self.client.clone();
    let project_id = self.project_id.clone();
    MutationBinding::new(self.cache.clone(), move |name: String| {
      let client = client.clone();
      let project_id = project_id.clone();
      async move { client.create_task(&project_id, &name).await }
    })
    .invalidates(self.key())
  }

  /// Mark a task completed; invalidates this project's task list.
  pub fn complete(&self) -> ApiMutation<(String, DateTime<Utc>), ()> {
    let client = self.client.clone();
    MutationBinding::new(
      self.cache.clone(),
      move |(task_id, at): (String, DateTime<Utc>)| {
        let client = client.clone();
        async move { client.complete_task(&task_id, at).await }
      },
    )
    .invalidates(self.key())
  }

  /// Delete a task; invalidates this project's task list.
  pub fn remove(&self) -> ApiMutation<String, ()> {
    let client = self.client.clone();
    MutationBinding::new(self.cache.clone(), move |task_id: String| {
      let client = client.clone();
      async move { client.delete_task(&task_id).await }
    })
    .invalidates(self.key())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use mockito::{Matcher, Server, ServerGuard};
  use url::Url;

  fn client(server: &ServerGuard) -> ApiClient {
    ApiClient::with_base(Url::parse(&server.url()).unwrap(), "test-token").unwrap()
  }

  #[tokio::test]
  async fn test_simultaneous_observers_issue_one_request() {
    let mut server = Server::new_async().await;
    let mock = server
      .mock("GET", "/projects/p1/tasks")
      .match_query(Matcher::Any)
      .with_status(200)
      .with_body(r#"{"tasks": []}"#)
      .expect(1)
      .create_async()
      .await;

    let store = TaskStore::new(client(&server), QueryCache::new(), "p1");
    let mut first = store.list(ListRange::Page(Page::default()));
    let mut second = store.list(ListRange::Page(Page::default()));
    let (a, b) = tokio::join!(first.resolve(), second.resolve());
    assert!(a.unwrap().is_empty());
    assert!(b.unwrap().is_empty());
    mock.assert_async().await;
  }

  #[tokio::test]
  async fn test_create_project_invalidates_observed_list() {
    let mut server = Server::new_async().await;
    server
      .mock("GET", "/projects")
      .match_query(Matcher::Any)
      .with_status(200)
      .with_body(r#"{"projects": []}"#)
      .create_async()
      .await;

    let store = ProjectStore::new(client(&server), QueryCache::new());
    let mut handle = store.list(ListRange::Page(Page::default()));
    assert!(handle.resolve().await.unwrap().is_empty());

    // Later-defined mocks take precedence: the refetch sees the new entity.
    server
      .mock("GET", "/projects")
      .match_query(Matcher::Any)
      .with_status(200)
      .with_body(r#"{"projects": [{"id": "p1", "name": "Groceries"}]}"#)
      .create_async()
      .await;
    server
      .mock("POST", "/projects")
      .match_body(Matcher::Json(serde_json::json!({
        "name": "Groceries",
        "color": "default"
      })))
      .with_status(201)
      .with_body(r#"{"id": "p1", "name": "Groceries"}"#)
      .create_async()
      .await;

    let created = store
      .create()
      .mutate(NewProject::named("Groceries"))
      .await
      .unwrap();
    assert_eq!(created.id, "p1");

    let refreshed = handle.resolve().await.unwrap();
    assert_eq!(refreshed.len(), 1);
    assert_eq!(refreshed[0].id, "p1");
  }

  #[tokio::test]
  async fn test_complete_task_invalidates_task_list() {
    let mut server = Server::new_async().await;
    server
      .mock("GET", "/projects/p1/tasks")
      .match_query(Matcher::Any)
      .with_status(200)
      .with_body(r#"{"tasks": [{"id": "t1", "name": "Buy milk"}]}"#)
      .create_async()
      .await;

    let store = TaskStore::new(client(&server), QueryCache::new(), "p1");
    let mut handle = store.list(ListRange::Page(Page::default()));
    assert!(!handle.resolve().await.unwrap()[0].is_completed());

    server
      .mock("GET", "/projects/p1/tasks")
      .match_query(Matcher::Any)
      .with_status(200)
      .with_body(
        r#"{"tasks": [{"id": "t1", "name": "Buy milk", "completed_at": "2026-01-02T03:04:05Z"}]}"#,
      )
      .create_async()
      .await;
    server
      .mock("PATCH", "/tasks/t1")
      .with_status(204)
      .create_async()
      .await;

    store
      .complete()
      .mutate(("t1".to_string(), Utc::now()))
      .await
      .unwrap();

    assert!(handle.resolve().await.unwrap()[0].is_completed());
  }

  #[tokio::test]
  async fn test_failed_delete_leaves_unrelated_entries_alone() {
    let mut server = Server::new_async().await;
    let list_mock = server
      .mock("GET", "/projects/p1/tasks")
      .match_query(Matcher::Any)
      .with_status(200)
      .with_body(r#"{"tasks": [{"id": "t1", "name": "Buy milk"}]}"#)
      .expect(1)
      .create_async()
      .await;
    server
      .mock("DELETE", "/tasks/t9")
      .with_status(404)
      .with_body(r#"{"code": 404, "message": "task not found"}"#)
      .create_async()
      .await;

    let cache = QueryCache::new();
    let store = TaskStore::new(client(&server), cache, "p1");
    let mut handle = store.list(ListRange::Page(Page::default()));
    handle.resolve().await.unwrap();

    let err = store.remove().mutate("t9".to_string()).await.unwrap_err();
    assert_eq!(err.status(), Some(404));

    // No invalidation happened; the cached list was not refetched.
    assert!(handle.state().is_success());
    list_mock.assert_async().await;
  }

  #[tokio::test]
  async fn test_deleting_project_invalidates_task_lists_by_prefix() {
    let mut server = Server::new_async().await;
    let tasks_mock = server
      .mock("GET", "/projects/p1/tasks")
      .match_query(Matcher::Any)
      .with_status(200)
      .with_body(r#"{"tasks": []}"#)
      .expect(2)
      .create_async()
      .await;
    server
      .mock("DELETE", "/projects/p1")
      .with_status(204)
      .create_async()
      .await;

    let cache = QueryCache::new();
    let projects = ProjectStore::new(client(&server), cache.clone());
    let tasks = TaskStore::new(client(&server), cache, "p1");

    let mut handle = tasks.list(ListRange::Page(Page::default()));
    handle.resolve().await.unwrap();

    projects.remove().mutate("p1".to_string()).await.unwrap();

    handle.resolve().await.unwrap();
    tasks_mock.assert_async().await;
  }
}
