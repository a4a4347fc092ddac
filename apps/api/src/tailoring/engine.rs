//! Résumé Tailoring Engine — deterministic keyword-driven adaptation.
//!
//! This is the fallback path: it never fails and never blocks. An AI-enhanced variant
//! may replace its output later (see `tailoring::enhancement`).

use chrono::{DateTime, Utc};

use crate::analysis::keywords::KeywordSet;
use crate::models::resume::{ResumeDocument, TailoringMethod};

/// Keywords named when appending to an existing summary.
const APPEND_KEYWORDS: usize = 3;
/// Keywords named when writing a summary from scratch.
const NEW_SUMMARY_KEYWORDS: usize = 5;
const EXCERPT_MAX_CHARS: usize = 200;

pub const GENERIC_CLAUSE: &str = "Eager to apply these strengths in a new role.";
pub const GENERIC_SUMMARY: &str = "Motivated professional ready to contribute to the team's goals.";

/// Inputs that accompany a résumé through tailoring.
#[derive(Debug, Clone)]
pub struct TailoringContext<'a> {
    pub job_description: &'a str,
    pub target_role: Option<&'a str>,
    pub tailored_at: DateTime<Utc>,
}

/// Returns a copy of `resume` adapted to `keywords`.
///
/// - summary gains a clause naming the top keywords (or a generic clause)
/// - skills matching any keyword move ahead of the rest, order kept within each group
/// - metadata records time, job description excerpt, and the fallback method tag
pub fn tailor_resume(
    resume: &ResumeDocument,
    keywords: &KeywordSet,
    ctx: &TailoringContext<'_>,
) -> ResumeDocument {
    let mut tailored = resume.clone();

    tailored.summary = Some(tailor_summary(resume.summary.as_deref(), keywords));
    tailored.skills = prioritize_skills(&resume.skills, keywords);

    let metadata = &mut tailored.metadata;
    metadata.generated_at = Some(ctx.tailored_at);
    metadata.job_description_excerpt = Some(excerpt(ctx.job_description));
    metadata.method = Some(TailoringMethod::KeywordFallback);
    if let Some(role) = ctx.target_role.map(str::trim).filter(|r| !r.is_empty()) {
        metadata.target_role = Some(role.to_string());
    }

    tailored
}

fn tailor_summary(original: Option<&str>, keywords: &KeywordSet) -> String {
    match original.map(str::trim).filter(|s| !s.is_empty()) {
        Some(summary) if keywords.is_empty() => format!("{summary} {GENERIC_CLAUSE}"),
        Some(summary) => format!(
            "{summary} Brings hands-on experience with {}.",
            join_natural(keywords.top(APPEND_KEYWORDS))
        ),
        None if keywords.is_empty() => GENERIC_SUMMARY.to_string(),
        None => format!(
            "Professional with experience in {}.",
            join_natural(keywords.top(NEW_SUMMARY_KEYWORDS))
        ),
    }
}

/// Stable partition: keyword-matching skills first, relative order preserved.
pub fn prioritize_skills(skills: &[String], keywords: &KeywordSet) -> Vec<String> {
    let (matching, rest): (Vec<String>, Vec<String>) = skills
        .iter()
        .cloned()
        .partition(|skill| skill_matches(skill, keywords));
    matching.into_iter().chain(rest).collect()
}

/// Case-insensitive substring overlap in either direction.
pub fn skill_matches(skill: &str, keywords: &KeywordSet) -> bool {
    let skill = skill.trim().to_lowercase();
    if skill.is_empty() {
        return false;
    }
    keywords
        .iter()
        .any(|kw| skill.contains(kw) || kw.contains(skill.as_str()))
}

/// "a", "a and b", "a, b and c".
fn join_natural(items: &[String]) -> String {
    match items {
        [] => String::new(),
        [only] => only.clone(),
        [init @ .., last] => format!("{} and {last}", init.join(", ")),
    }
}

fn excerpt(job_description: &str) -> String {
    job_description.trim().chars().take(EXCERPT_MAX_CHARS).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::keywords::extract_keywords;
    use crate::models::resume::ExperienceEntry;
    use chrono::TimeZone;

    fn ctx(jd: &str) -> TailoringContext<'_> {
        TailoringContext {
            job_description: jd,
            target_role: Some("Backend Engineer"),
            tailored_at: Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap(),
        }
    }

    fn make_resume(summary: Option<&str>, skills: &[&str]) -> ResumeDocument {
        ResumeDocument {
            name: "Ada Lovelace".to_string(),
            summary: summary.map(str::to_string),
            skills: skills.iter().map(|s| s.to_string()).collect(),
            experience: vec![ExperienceEntry {
                title: "Engineer".to_string(),
                company: "Analytical Engines".to_string(),
                period: "1842-1843".to_string(),
                description: "Wrote the first program".to_string(),
                achievements: vec!["Bernoulli numbers".to_string()],
            }],
            education: "Self-taught".to_string(),
            ..Default::default()
        }
    }

    const JD: &str = "Looking for a Python developer with AWS and Docker experience";

    #[test]
    fn test_matching_skills_move_first_in_original_order() {
        let resume = make_resume(None, &["Excel", "Docker", "Leadership", "python3", "AWS Lambda"]);
        let keywords = extract_keywords(JD);
        let tailored = tailor_resume(&resume, &keywords, &ctx(JD));
        assert_eq!(
            tailored.skills,
            vec!["Docker", "python3", "AWS Lambda", "Excel", "Leadership"]
        );
    }

    #[test]
    fn test_partition_property_over_mixed_skills() {
        let keywords = extract_keywords("rust kubernetes observability grafana");
        let skills: Vec<String> = ["Go", "Rust", "K8s", "Kubernetes", "Grafana dashboards", "SQL", "rust"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let out = prioritize_skills(&skills, &keywords);

        let first_non_match = out
            .iter()
            .position(|s| !skill_matches(s, &keywords))
            .unwrap_or(out.len());
        assert!(out[first_non_match..].iter().all(|s| !skill_matches(s, &keywords)));

        let expected_matches: Vec<&String> =
            skills.iter().filter(|s| skill_matches(s, &keywords)).collect();
        let got_matches: Vec<&String> = out[..first_non_match].iter().collect();
        assert_eq!(got_matches, expected_matches);
    }

    #[test]
    fn test_keyword_inside_skill_and_skill_inside_keyword_both_match() {
        let keywords = extract_keywords("postgresql");
        assert!(skill_matches("PostgreSQL administration", &keywords));
        assert!(skill_matches("postgres", &keywords));
        assert!(!skill_matches("  ", &keywords));
    }

    #[test]
    fn test_empty_keywords_keep_skill_order_and_use_generic_clause() {
        let resume = make_resume(Some("Seasoned engineer."), &["Docker", "Excel", "AWS"]);
        let tailored = tailor_resume(&resume, &KeywordSet::default(), &ctx(""));
        assert_eq!(tailored.skills, resume.skills);
        assert_eq!(
            tailored.summary.as_deref(),
            Some("Seasoned engineer. Eager to apply these strengths in a new role.")
        );
    }

    #[test]
    fn test_empty_keywords_without_summary_is_generic() {
        let resume = make_resume(None, &[]);
        let tailored = tailor_resume(&resume, &KeywordSet::default(), &ctx(""));
        assert_eq!(tailored.summary.as_deref(), Some(GENERIC_SUMMARY));
    }

    #[test]
    fn test_existing_summary_names_top_three_keywords() {
        let resume = make_resume(Some("Backend engineer."), &[]);
        let keywords = extract_keywords(JD);
        let tailored = tailor_resume(&resume, &keywords, &ctx(JD));
        let top = keywords.top(3);
        assert_eq!(
            tailored.summary.unwrap(),
            format!(
                "Backend engineer. Brings hands-on experience with {}, {} and {}.",
                top[0], top[1], top[2]
            )
        );
    }

    #[test]
    fn test_missing_summary_names_top_five_keywords() {
        let resume = make_resume(Some("   "), &[]);
        let keywords = extract_keywords(JD);
        let summary = tailor_resume(&resume, &keywords, &ctx(JD)).summary.unwrap();
        assert!(summary.starts_with("Professional with experience in "));
        for kw in keywords.top(5) {
            assert!(summary.contains(kw.as_str()), "{kw} missing from {summary}");
        }
    }

    #[test]
    fn test_other_fields_pass_through() {
        let resume = make_resume(Some("Engineer."), &["Docker"]);
        let keywords = extract_keywords(JD);
        let tailored = tailor_resume(&resume, &keywords, &ctx(JD));
        assert_eq!(tailored.name, resume.name);
        assert_eq!(tailored.experience, resume.experience);
        assert_eq!(tailored.education, resume.education);
        assert_eq!(tailored.projects, resume.projects);
    }

    #[test]
    fn test_metadata_is_stamped() {
        let resume = make_resume(None, &[]);
        let long_jd = "x".repeat(500);
        let c = ctx(&long_jd);
        let tailored = tailor_resume(&resume, &extract_keywords(&long_jd), &c);
        let meta = tailored.metadata;
        assert_eq!(meta.generated_at, Some(c.tailored_at));
        assert_eq!(meta.method, Some(TailoringMethod::KeywordFallback));
        assert_eq!(meta.target_role.as_deref(), Some("Backend Engineer"));
        assert_eq!(meta.job_description_excerpt.unwrap().chars().count(), 200);
    }

    #[test]
    fn test_join_natural() {
        let items: Vec<String> = ["a", "b", "c"].iter().map(|s| s.to_string()).collect();
        assert_eq!(join_natural(&items[..1]), "a");
        assert_eq!(join_natural(&items[..2]), "a and b");
        assert_eq!(join_natural(&items), "a, b and c");
    }
}
