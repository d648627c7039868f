use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, de};

use crate::error::SyncError;

/// Task-master status vocabulary.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Status {
    #[default]
    Pending,
    InProgress,
    Done,
    Deferred,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Priority {
    High,
    #[default]
    Medium,
    Low,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subtask {
    #[serde(deserialize_with = "id_from_number_or_string")]
    pub id: u64,
    pub title: String,
    pub description: String,
    pub status: Status,
    #[serde(
        default,
        deserialize_with = "ids_from_numbers_or_strings",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub dependencies: Vec<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub test_strategy: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    #[serde(deserialize_with = "id_from_number_or_string")]
    pub id: u64,
    pub title: String,
    pub description: String,
    pub status: Status,
    pub priority: Priority,
    #[serde(deserialize_with = "ids_from_numbers_or_strings")]
    pub dependencies: Vec<u64>,
    #[serde(
        default,
        deserialize_with = "optional_score",
        skip_serializing_if = "Option::is_none"
    )]
    pub complexity: Option<u8>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub subtasks: Vec<Subtask>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub test_strategy: Option<String>,
}

/// task-master writes ids (and sometimes scores) as numbers or numeric strings.
#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrString {
    Number(serde_json::Number),
    Text(String),
}

impl NumberOrString {
    fn to_u64<E: de::Error>(&self) -> Result<u64, E> {
        let parsed = match self {
            Self::Number(number) => number.as_u64().or_else(|| {
                number
                    .as_f64()
                    .filter(|float| float.fract() == 0.0 && *float >= 0.0)
                    .map(|float| float as u64)
            }),
            Self::Text(text) => text.trim().parse().ok(),
        };
        parsed.ok_or_else(|| E::custom("expected a non-negative integer"))
    }
}

fn id_from_number_or_string<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<u64, D::Error> {
    NumberOrString::deserialize(deserializer)?.to_u64()
}

fn ids_from_numbers_or_strings<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Vec<u64>, D::Error> {
    Vec::<NumberOrString>::deserialize(deserializer)?
        .iter()
        .map(NumberOrString::to_u64)
        .collect()
}

fn optional_score<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<u8>, D::Error> {
    Option::<NumberOrString>::deserialize(deserializer)?
        .map(|raw| {
            let score = raw.to_u64::<D::Error>()?;
            u8::try_from(score)
                .map_err(|_| <D::Error as de::Error>::custom(format!("score {score} is too large")))
        })
        .transpose()
}

/// A task annotated with its topological layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TieredTask {
    pub tier: usize,
    pub task: Task,
}

impl std::ops::Deref for TieredTask {
    type Target = Task;

    fn deref(&self) -> &Task {
        &self.task
    }
}

impl Status {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::InProgress => "in-progress",
            Self::Done => "done",
            Self::Deferred => "deferred",
        }
    }
}

impl Priority {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        }
    }

    /// Beads priority number; 0 is the most urgent.
    pub fn beads_priority(self) -> u8 {
        match self {
            Self::High => 0,
            Self::Medium => 1,
            Self::Low => 2,
        }
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Status {
    type Err = SyncError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw {
            "pending" => Ok(Self::Pending),
            "in-progress" => Ok(Self::InProgress),
            "done" => Ok(Self::Done),
            "deferred" => Ok(Self::Deferred),
            other => Err(SyncError::UnknownStatus(other.to_string())),
        }
    }
}

impl FromStr for Priority {
    type Err = SyncError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw {
            "high" => Ok(Self::High),
            "medium" => Ok(Self::Medium),
            "low" => Ok(Self::Low),
            other => Err(SyncError::UnknownPriority(other.to_string())),
        }
    }
}

fn normalize_ids(ids: &mut Vec<u64>) {
    ids.sort_unstable();
    ids.dedup();
}

impl Subtask {
    pub fn normalize(&mut self) {
        normalize_ids(&mut self.dependencies);
    }
}

impl Task {
    /// Dependencies are sets: sort and dedup them so every later phase iterates
    /// them in the same order.
    pub fn normalize(&mut self) {
        normalize_ids(&mut self.dependencies);
        for subtask in &mut self.subtasks {
            subtask.normalize();
        }
    }

    pub fn subtasks_by_id(&self) -> Vec<&Subtask> {
        let mut sorted: Vec<&Subtask> = self.subtasks.iter().collect();
        sorted.sort_by_key(|subtask| subtask.id);
        sorted
    }
}
