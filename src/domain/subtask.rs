use serde::{Deserialize, Serialize};
use std::fmt;

use super::TaskId;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SubtaskId(pub String);

impl fmt::Display for SubtaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for SubtaskId {
    fn from(s: String) -> Self {
        SubtaskId(s)
    }
}

impl From<&str> for SubtaskId {
    fn from(s: &str) -> Self {
        SubtaskId(s.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subtask {
    pub id: SubtaskId,
    pub task_id: TaskId,
    pub text: String,
    pub completed: bool,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SubtaskUpdate {
    pub text: Option<String>,
    pub completed: Option<bool>,
}
