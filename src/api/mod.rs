//! Typed client and cache bindings for the task/project HTTP API.

mod api_types;
mod client;
mod collections;
mod error;
mod types;

pub use client::ApiClient;
pub use collections::{project_tasks_key, projects_key, ApiMutation, ListRange, ProjectStore, TaskStore};
pub use error::ApiError;
pub use types::{NewProject, Page, Project, Task};
