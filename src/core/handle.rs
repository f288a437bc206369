use serde::Serialize;

use crate::error::TaskError;

/// Lifecycle state of a supervised task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskState {
    Running,
    Completed,
    Failed,
}

/// One running unit as tracked by the supervisor.
#[derive(Debug, Clone)]
pub struct TaskHandle {
    pub name: String,
    pub state: TaskState,
    /// Terminal error when `state` is `Failed`.
    pub error: Option<TaskError>,
}

impl TaskHandle {
    pub(crate) fn running(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            state: TaskState::Running,
            error: None,
        }
    }

    pub(crate) fn finish(&mut self, outcome: Result<(), TaskError>) {
        match outcome {
            Ok(()) | Err(TaskError::Canceled) => self.state = TaskState::Completed,
            Err(e) => {
                self.state = TaskState::Failed;
                self.error = Some(e);
            }
        }
    }
}
