use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// How a stored résumé was last adapted to a job description.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TailoringMethod {
    /// Deterministic keyword tailoring, produced synchronously.
    KeywordFallback,
    /// Variant delivered later by the external AI worker.
    AiEnhanced,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResumeMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generated_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_role: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_description_excerpt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<TailoringMethod>,
    /// Any other keys the client stored alongside the résumé.
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExperienceEntry {
    pub title: String,
    pub company: String,
    #[serde(default)]
    pub period: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub achievements: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectEntry {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub technologies: BTreeSet<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
}

/// A user's structured résumé. One per user; the owner is the only writer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResumeDocument {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub linkedin: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default)]
    pub experience: Vec<ExperienceEntry>,
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default)]
    pub education: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub projects: Option<Vec<ProjectEntry>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub certifications: Option<Vec<String>>,
    #[serde(default)]
    pub metadata: ResumeMetadata,
}

impl ResumeDocument {
    /// Boundary validation for client-supplied documents.
    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("resume name cannot be empty".to_string());
        }
        if let Some(i) = self
            .experience
            .iter()
            .position(|e| e.title.trim().is_empty() || e.company.trim().is_empty())
        {
            return Err(format!("experience[{i}] needs both a title and a company"));
        }
        if let Some(projects) = &self.projects {
            if let Some(i) = projects.iter().position(|p| p.name.trim().is_empty()) {
                return Err(format!("projects[{i}] needs a name"));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_minimal_resume_deserializes_with_defaults() {
        let resume: ResumeDocument = serde_json::from_value(json!({ "name": "Ada" })).unwrap();
        assert_eq!(resume.name, "Ada");
        assert!(resume.summary.is_none());
        assert!(resume.skills.is_empty());
        assert!(resume.projects.is_none());
        assert_eq!(resume.metadata, ResumeMetadata::default());
    }

    #[test]
    fn test_metadata_keeps_unknown_keys() {
        let resume: ResumeDocument = serde_json::from_value(json!({
            "name": "Ada",
            "metadata": { "method": "ai_enhanced", "template": "modern" }
        }))
        .unwrap();
        assert_eq!(resume.metadata.method, Some(TailoringMethod::AiEnhanced));
        assert_eq!(resume.metadata.extra["template"], json!("modern"));

        let back = serde_json::to_value(&resume).unwrap();
        assert_eq!(back["metadata"]["template"], json!("modern"));
    }

    #[test]
    fn test_validate_rejects_blank_name() {
        let resume = ResumeDocument::default();
        assert!(resume.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_incomplete_experience() {
        let resume = ResumeDocument {
            name: "Ada".to_string(),
            experience: vec![ExperienceEntry {
                title: "Engineer".to_string(),
                ..Default::default()
            }],
            ..Default::default()
        };
        let err = resume.validate().unwrap_err();
        assert!(err.contains("experience[0]"));
    }

    #[test]
    fn test_project_technologies_deduplicate() {
        let project: ProjectEntry = serde_json::from_value(json!({
            "name": "coach",
            "technologies": ["rust", "axum", "rust"]
        }))
        .unwrap();
        assert_eq!(project.technologies.len(), 2);
    }
}
