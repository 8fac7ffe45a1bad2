//! CLI subcommands and their handlers.
//!
//! Handlers observe a collection through the query cache before running any
//! mutation, so a successful mutation's invalidation refetches the observed
//! list and the refreshed state is what gets printed.

use chrono::Utc;
use clap::{Args, Subcommand};
use color_eyre::Result;

use crate::api::{ApiClient, ListRange, NewProject, Page, Project, ProjectStore, Task, TaskStore};
use crate::query::QueryCache;

#[derive(Debug, Subcommand)]
pub enum Command {
  /// Work with projects
  #[command(subcommand)]
  Projects(ProjectCommand),
  /// Work with a project's tasks
  #[command(subcommand)]
  Tasks(TaskCommand),
}

#[derive(Debug, Subcommand)]
pub enum ProjectCommand {
  /// List projects
  List(ListArgs),
  /// Create a project
  Add {
    /// Project name
    name: String,
    /// Project color
    #[arg(long, default_value = "default")]
    color: String,
  },
  /// Delete a project
  Rm {
    /// Project id
    project_id: String,
  },
}

#[derive(Debug, Subcommand)]
pub enum TaskCommand {
  /// List tasks in a project
  List {
    /// Project id
    project_id: String,
    #[command(flatten)]
    range: ListArgs,
  },
  /// Create a task in a project
  Add {
    /// Project id
    project_id: String,
    /// Task name
    name: String,
  },
  /// Mark a task completed
  Done {
    /// Project id
    project_id: String,
    /// Task id
    task_id: String,
  },
  /// Delete a task
  Rm {
    /// Project id
    project_id: String,
    /// Task id
    task_id: String,
  },
}

#[derive(Debug, Args)]
pub struct ListArgs {
  /// Fetch every page instead of one window
  #[arg(long)]
  all: bool,
  /// Page size
  #[arg(long)]
  limit: Option<u32>,
  /// Page offset
  #[arg(long, default_value_t = 0)]
  offset: u32,
}

impl ListArgs {
  fn range(&self, default_limit: u32) -> ListRange {
    if self.all {
      ListRange::All
    } else {
      ListRange::Page(Page::new(self.limit.unwrap_or(default_limit), self.offset))
    }
  }
}

pub async fn run(command: Command, client: ApiClient, page_size: u32) -> Result<()> {
  let cache = QueryCache::new();
  match command {
    Command::Projects(command) => run_projects(command, client, cache, page_size).await,
    Command::Tasks(command) => run_tasks(command, client, cache, page_size).await,
  }
}

async fn run_projects(
  command: ProjectCommand,
  client: ApiClient,
  cache: QueryCache,
  page_size: u32,
) -> Result<()> {
  let store = ProjectStore::new(client, cache);
  let default_range = ListRange::Page(Page::new(page_size, 0));

  match command {
    ProjectCommand::List(args) => {
      let mut handle = store.list(args.range(page_size));
      print_projects(&handle.resolve().await?);
    }
    ProjectCommand::Add { name, color } => {
      let mut handle = store.list(default_range);
      store
        .create()
        .mutate_then(NewProject { name, color }, |project| {
          println!("created project {} ({})", project.name, project.id);
        })
        .await?;
      print_projects(&handle.resolve().await?);
    }
    ProjectCommand::Rm { project_id } => {
      let mut handle = store.list(default_range);
      store.remove().mutate(project_id.clone()).await?;
      println!("deleted project {project_id}");
      print_projects(&handle.resolve().await?);
    }
  }

  Ok(())
}

async fn run_tasks(
  command: TaskCommand,
  client: ApiClient,
  cache: QueryCache,
  page_size: u32,
) -> Result<()> {
  let default_range = ListRange::Page(Page::new(page_size, 0));

  match command {
    TaskCommand::List { project_id, range } => {
      let store = TaskStore::new(client, cache, project_id);
      let mut handle = store.list(range.range(page_size));
      print_tasks(&handle.resolve().await?);
    }
    TaskCommand::Add { project_id, name } => {
      let store = TaskStore::new(client, cache, project_id);
      let mut handle = store.list(default_range);
      store
        .create()
        .mutate_then(name, |task| {
          println!("created task {} ({})", task.name, task.id);
        })
        .await?;
      print_tasks(&handle.resolve().await?);
    }
    TaskCommand::Done {
      project_id,
      task_id,
    } => {
      let store = TaskStore::new(client, cache, project_id);
      let mut handle = store.list(default_range);
      store.complete().mutate((task_id.clone(), Utc::now())).await?;
      println!("completed task {task_id}");
      print_tasks(&handle.resolve().await?);
    }
    TaskCommand::Rm {
      project_id,
      task_id,
    } => {
      let store = TaskStore::new(client, cache, project_id);
      let mut handle = store.list(default_range);
      store.remove().mutate(task_id.clone()).await?;
      println!("deleted task {task_id}");
      print_tasks(&handle.resolve().await?);
    }
  }

  Ok(())
}

fn print_projects(projects: &[Project]) {
  if projects.is_empty() {
    println!("no projects");
    return;
  }
  for project in projects {
    println!("{}  {}", project.id, project.name);
  }
}

fn print_tasks(tasks: &[Task]) {
  if tasks.is_empty() {
    println!("no tasks");
    return;
  }
  for task in tasks {
    let mark = if task.is_completed() { "x" } else { " " };
    println!("[{}] {}  {}", mark, task.id, task.name);
  }
}
