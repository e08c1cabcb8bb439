//! Fire-and-forget background jobs.
//!
//! The core only names the job and its arguments; delivery and retry
//! semantics belong to whatever runner sits behind the trait. The
//! in-process runner here feeds a tokio channel consumed by a worker
//! task, which is all a single-node deployment needs.

use async_trait::async_trait;
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::errors::{AppError, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Task {
  /// Send the account-activation email after registration.
  SendActivationEmail {
    to: String,
    username: String,
    token: String,
  },
  /// Rebuild the cached static landing page after a catalog write.
  RegenerateLandingPage,
}

impl Task {
  pub fn name(&self) -> &'static str {
    match self {
      Task::SendActivationEmail { .. } => "send_activation_email",
      Task::RegenerateLandingPage => "regenerate_landing_page",
    }
  }
}

#[async_trait]
pub trait TaskDispatcher: Send + Sync {
  /// Submit a job. Returns as soon as the job is accepted, never when
  /// it completes.
  async fn submit(&self, task: Task) -> Result<()>;
}

/// Channel-backed dispatcher with an in-process worker.
pub struct LocalTaskQueue {
  sender: mpsc::UnboundedSender<Task>,
}

impl LocalTaskQueue {
  /// Spawn the worker and return the dispatcher handle.
  pub fn spawn(app_base_url: String) -> Self {
    let (sender, mut receiver) = mpsc::unbounded_channel::<Task>();
    tokio::spawn(async move {
      while let Some(task) = receiver.recv().await {
        run_task(&app_base_url, task).await;
      }
    });
    Self { sender }
  }
}

async fn run_task(app_base_url: &str, task: Task) {
  match &task {
    Task::SendActivationEmail { to, username, token } => {
      // Development stand-in for a real mail provider: log the message
      // that would have been sent.
      info!(
        task = task.name(),
        %to,
        %username,
        activation_url = %format!("{}/api/v1/auth/activate/{}", app_base_url, token),
        "Activation email dispatched"
      );
    }
    Task::RegenerateLandingPage => {
      info!(task = task.name(), "Landing page regeneration requested");
    }
  }
}

#[async_trait]
impl TaskDispatcher for LocalTaskQueue {
  async fn submit(&self, task: Task) -> Result<()> {
    let name = task.name();
    self.sender.send(task).map_err(|_| {
      warn!(task = name, "Task worker is gone, dropping job");
      AppError::Internal("task worker unavailable".to_string())
    })
  }
}

/// Dispatcher that records submissions instead of running them, for
/// asserting on the jobs a flow produces.
#[derive(Debug, Default)]
pub struct RecordingTaskDispatcher {
  submitted: parking_lot::Mutex<Vec<Task>>,
}

impl RecordingTaskDispatcher {
  pub fn submitted(&self) -> Vec<Task> {
    self.submitted.lock().clone()
  }
}

#[async_trait]
impl TaskDispatcher for RecordingTaskDispatcher {
  async fn submit(&self, task: Task) -> Result<()> {
    self.submitted.lock().push(task);
    Ok(())
  }
}
