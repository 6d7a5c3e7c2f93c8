//! Routines: ordered checklists of sub-tasks.
//!
//! Invariant: after every add, remove or reorder the sub-task positions are
//! exactly `0..n-1` and `tasks` is sorted by position.

use serde::{Deserialize, Serialize};

use super::{new_id, require_text};
use crate::error::ValidationError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoutineTask {
    pub id: String,
    pub title: String,
    pub position: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Routine {
    pub id: String,
    pub title: String,
    /// `HH:mm` start time used for reminders.
    #[serde(default)]
    pub time: Option<String>,
    /// Weekday codes the routine runs on; empty means every day.
    #[serde(default)]
    pub days: Vec<String>,
    #[serde(default)]
    pub tasks: Vec<RoutineTask>,
}

impl Routine {
    pub fn new(title: &str, time: Option<&str>, days: Vec<String>) -> Result<Self, ValidationError> {
        Ok(Self {
            id: new_id(),
            title: require_text("title", title)?,
            time: time.map(|t| t.trim().to_string()),
            days,
            tasks: Vec::new(),
        })
    }

    /// Restore the position invariant on data read from elsewhere: stable
    /// sort by stored position, then renumber.
    pub fn normalize_positions(&mut self) {
        self.tasks.sort_by_key(|t| t.position);
        self.renumber();
    }

    fn renumber(&mut self) {
        for (index, task) in self.tasks.iter_mut().enumerate() {
            task.position = index as u32;
        }
    }

    /// Append a sub-task at the end. Returns the new task id.
    pub fn add_task(&mut self, title: &str) -> Result<String, ValidationError> {
        let task = RoutineTask {
            id: new_id(),
            title: require_text("title", title)?,
            position: self.tasks.len() as u32,
        };
        let id = task.id.clone();
        self.tasks.push(task);
        Ok(id)
    }

    pub fn remove_task(&mut self, task_id: &str) -> Result<RoutineTask, ValidationError> {
        let index = self
            .tasks
            .iter()
            .position(|t| t.id == task_id)
            .ok_or_else(|| ValidationError::InvalidValue {
                field: "taskId".into(),
                message: format!("no sub-task {task_id} in routine {}", self.id),
            })?;
        let removed = self.tasks.remove(index);
        self.renumber();
        Ok(removed)
    }

    /// Move the sub-task at `from` to `to`, shifting the ones in between.
    pub fn move_task(&mut self, from: usize, to: usize) -> Result<(), ValidationError> {
        let len = self.tasks.len();
        for index in [from, to] {
            if index >= len {
                return Err(ValidationError::OutOfBounds {
                    collection: "routine.tasks".into(),
                    index,
                    len,
                });
            }
        }
        let task = self.tasks.remove(from);
        self.tasks.insert(to, task);
        self.renumber();
        Ok(())
    }

    /// Reorder to match `ordered_ids`, which must be a permutation of the
    /// current sub-task ids.
    pub fn reorder(&mut self, ordered_ids: &[String]) -> Result<(), ValidationError> {
        let mut current: Vec<&str> = self.tasks.iter().map(|t| t.id.as_str()).collect();
        let mut requested: Vec<&str> = ordered_ids.iter().map(String::as_str).collect();
        current.sort_unstable();
        requested.sort_unstable();
        if current != requested {
            return Err(ValidationError::InvalidValue {
                field: "order".into(),
                message: "order must list every sub-task exactly once".into(),
            });
        }

        let mut remaining = std::mem::take(&mut self.tasks);
        for id in ordered_ids {
            if let Some(index) = remaining.iter().position(|t| &t.id == id) {
                self.tasks.push(remaining.swap_remove(index));
            }
        }
        self.renumber();
        Ok(())
    }

    pub fn positions_are_contiguous(&self) -> bool {
        self.tasks
            .iter()
            .enumerate()
            .all(|(index, task)| task.position == index as u32)
    }
}
