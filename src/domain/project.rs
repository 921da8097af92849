use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::{DomainError, DomainResult, Priority, Status};

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ProjectId(pub String);

impl ProjectId {
    /// Slug for a project name: lowercased, every run of whitespace becomes
    /// a single `-`.
    pub fn slug(name: &str) -> Self {
        let mut slug = String::with_capacity(name.len());
        let mut in_whitespace = false;
        for c in name.chars() {
            if c.is_whitespace() {
                if !in_whitespace {
                    slug.push('-');
                }
                in_whitespace = true;
            } else {
                slug.extend(c.to_lowercase());
                in_whitespace = false;
            }
        }
        ProjectId(slug)
    }

    /// Slug for `name`, suffixed with `timestamp_millis` when it collides with
    /// one of `existing`.
    pub fn for_name<'a>(
        name: &str,
        existing: impl IntoIterator<Item = &'a ProjectId>,
        timestamp_millis: i64,
    ) -> Self {
        let slug = Self::slug(name);
        if existing.into_iter().any(|id| *id == slug) {
            ProjectId(format!("{}-{}", slug.0, timestamp_millis))
        } else {
            slug
        }
    }
}

impl fmt::Display for ProjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for ProjectId {
    fn from(s: String) -> Self {
        ProjectId(s)
    }
}

impl From<&str> for ProjectId {
    fn from(s: &str) -> Self {
        ProjectId(s.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub id: ProjectId,
    pub name: String,
    pub url: String,
    pub audience: String,
    pub is_favorite: bool,
    pub status: Status,
    pub priority: Priority,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub logo_url: Option<String>,
}

impl Project {
    pub fn from_draft(id: ProjectId, draft: ProjectDraft) -> Self {
        Self {
            id,
            name: draft.name,
            url: draft.url,
            audience: draft.audience,
            is_favorite: draft.is_favorite,
            status: draft.status,
            priority: draft.priority,
            start_date: draft.start_date,
            end_date: draft.end_date,
            logo_url: draft.logo_url,
        }
    }

    pub fn apply(&mut self, patch: &ProjectUpdate) {
        if let Some(name) = &patch.name {
            self.name = name.clone();
        }
        if let Some(url) = &patch.url {
            self.url = url.clone();
        }
        if let Some(audience) = &patch.audience {
            self.audience = audience.clone();
        }
        if let Some(is_favorite) = patch.is_favorite {
            self.is_favorite = is_favorite;
        }
        if let Some(status) = patch.status {
            self.status = status;
        }
        if let Some(priority) = patch.priority {
            self.priority = priority;
        }
        if let Some(start_date) = patch.start_date {
            self.start_date = start_date;
        }
        if let Some(end_date) = patch.end_date {
            self.end_date = end_date;
        }
        if let Some(logo_url) = &patch.logo_url {
            self.logo_url = logo_url.clone();
        }
    }
}

/// A project as entered by the user, before an id is assigned.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectDraft {
    pub name: String,
    pub url: String,
    pub audience: String,
    pub is_favorite: bool,
    pub status: Status,
    pub priority: Priority,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub logo_url: Option<String>,
}

impl ProjectDraft {
    pub fn new(name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            name: name.into(),
            url: String::new(),
            audience: String::new(),
            is_favorite: false,
            status: Status::NotStarted,
            priority: Priority::Medium,
            start_date: now,
            end_date: now,
            logo_url: None,
        }
    }
}

impl ProjectDraft {
    pub fn validate(&self) -> DomainResult<()> {
        if self.name.trim().is_empty() {
            return Err(DomainError::MissingField("name".to_string()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProjectUpdate {
    pub name: Option<String>,
    pub url: Option<String>,
    pub audience: Option<String>,
    pub is_favorite: Option<bool>,
    pub status: Option<Status>,
    pub priority: Option<Priority>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub logo_url: Option<Option<String>>,
}

impl ProjectUpdate {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slug_lowercases_and_hyphenates() {
        assert_eq!(ProjectId::slug("My Site"), ProjectId::from("my-site"));
        assert_eq!(ProjectId::slug("Q3  Launch\tPlan"), ProjectId::from("q3-launch-plan"));
    }

    #[test]
    fn test_slug_keeps_edge_whitespace_as_hyphen() {
        assert_eq!(ProjectId::slug(" Docs "), ProjectId::from("-docs-"));
    }

    #[test]
    fn test_for_name_appends_timestamp_on_collision() {
        let existing = vec![ProjectId::from("my-site")];
        let id = ProjectId::for_name("My Site", &existing, 1_700_000_000_000);
        assert_eq!(id, ProjectId::from("my-site-1700000000000"));

        let fresh = ProjectId::for_name("Other", &existing, 1_700_000_000_000);
        assert_eq!(fresh, ProjectId::from("other"));
    }

    #[test]
    fn test_apply_patch_only_touches_given_fields() {
        let mut project = Project::from_draft(ProjectId::from("p1"), ProjectDraft::new("Website"));
        let before = project.clone();

        project.apply(&ProjectUpdate {
            status: Some(Status::AtRisk),
            logo_url: Some(Some("https://cdn.example/logo.png".to_string())),
            ..Default::default()
        });

        assert_eq!(project.status, Status::AtRisk);
        assert_eq!(project.logo_url.as_deref(), Some("https://cdn.example/logo.png"));
        assert_eq!(project.name, before.name);
        assert_eq!(project.priority, before.priority);
    }
}
