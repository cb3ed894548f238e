//! Job application records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;
use validator::Validate;

use crate::error::{ModelError, ModelResult};
use crate::user::UserId;
use crate::validation::is_present;

/// Unique identifier for a job application.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(pub String);

impl JobId {
    /// Generate a new random job ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Get the inner string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for JobId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for JobId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Application status. Any value may be set at any time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    #[default]
    Pending,
    Interview,
    Declined,
}

impl JobStatus {
    /// Every status, in summary order.
    pub const ALL: [JobStatus; 3] = [JobStatus::Pending, JobStatus::Interview, JobStatus::Declined];

    /// Get string representation of the status.
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Pending => "pending",
            JobStatus::Interview => "interview",
            JobStatus::Declined => "declined",
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for JobStatus {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(JobStatus::Pending),
            "interview" => Ok(JobStatus::Interview),
            "declined" => Ok(JobStatus::Declined),
            other => Err(ModelError::InvalidStatus(other.to_string())),
        }
    }
}

/// Employment type of the position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum JobType {
    #[default]
    FullTime,
    PartTime,
    Remote,
    Internship,
}

impl JobType {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobType::FullTime => "full-time",
            JobType::PartTime => "part-time",
            JobType::Remote => "remote",
            JobType::Internship => "internship",
        }
    }
}

impl fmt::Display for JobType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for JobType {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "full-time" => Ok(JobType::FullTime),
            "part-time" => Ok(JobType::PartTime),
            "remote" => Ok(JobType::Remote),
            "internship" => Ok(JobType::Internship),
            other => Err(ModelError::InvalidJobType(other.to_string())),
        }
    }
}

/// A job application owned by exactly one user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    pub id: JobId,
    pub company: String,
    pub position: String,
    pub status: JobStatus,
    pub job_type: JobType,
    /// Owning user. Always stamped from the caller's identity.
    pub created_by: UserId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Job {
    /// Create a new job owned by `owner`.
    pub fn new(owner: UserId, changes: JobChanges) -> Self {
        let now = Utc::now();
        Self {
            id: JobId::new(),
            company: changes.company,
            position: changes.position,
            status: changes.status.unwrap_or_default(),
            job_type: changes.job_type.unwrap_or_default(),
            created_by: owner,
            created_at: now,
            updated_at: now,
        }
    }

    /// Backdate the record (seeding and imports).
    pub fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = created_at;
        self.updated_at = created_at;
        self
    }

    pub fn is_owned_by(&self, owner: &UserId) -> bool {
        &self.created_by == owner
    }

    /// Apply validated changes in place.
    pub fn apply(&mut self, changes: JobChanges) {
        self.company = changes.company;
        self.position = changes.position;
        if let Some(status) = changes.status {
            self.status = status;
        }
        if let Some(job_type) = changes.job_type {
            self.job_type = job_type;
        }
        self.updated_at = Utc::now();
    }
}

/// Client-supplied job fields, as received.
///
/// There is no owner field: an owner sent by the client is ignored during
/// deserialization.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct JobFields {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 50, message = "Company cannot be more than 50 characters"))]
    pub company: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 100, message = "Position cannot be more than 100 characters"))]
    pub position: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<JobStatus>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_type: Option<JobType>,
}

impl JobFields {
    pub fn new(company: impl Into<String>, position: impl Into<String>) -> Self {
        Self {
            company: Some(company.into()),
            position: Some(position.into()),
            status: None,
            job_type: None,
        }
    }

    pub fn status(mut self, status: JobStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn job_type(mut self, job_type: JobType) -> Self {
        self.job_type = Some(job_type);
        self
    }

    /// Validate and require company and position.
    pub fn into_changes(self) -> ModelResult<JobChanges> {
        if !is_present(&self.company) || !is_present(&self.position) {
            return Err(ModelError::validation("Please provide company and position."));
        }
        self.validate()?;

        Ok(JobChanges {
            company: self.company.unwrap_or_default().trim().to_string(),
            position: self.position.unwrap_or_default().trim().to_string(),
            status: self.status,
            job_type: self.job_type,
        })
    }
}

/// Validated job fields. Company and position are always present.
#[derive(Debug, Clone, PartialEq)]
pub struct JobChanges {
    pub company: String,
    pub position: String,
    pub status: Option<JobStatus>,
    pub job_type: Option<JobType>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_parsing() {
        assert_eq!("pending".parse::<JobStatus>(), Ok(JobStatus::Pending));
        assert_eq!("declined".parse::<JobStatus>(), Ok(JobStatus::Declined));
        assert!("accepted".parse::<JobStatus>().is_err());
        assert!("Pending".parse::<JobStatus>().is_err());
    }

    #[test]
    fn test_job_type_serde_names() {
        let json = serde_json::to_string(&JobType::PartTime).unwrap();
        assert_eq!(json, "\"part-time\"");
        let parsed: JobType = serde_json::from_str("\"internship\"").unwrap();
        assert_eq!(parsed, JobType::Internship);
    }

    #[test]
    fn test_into_changes_requires_company_and_position() {
        let missing_position = JobFields {
            company: Some("Acme".into()),
            ..Default::default()
        };
        assert!(missing_position.into_changes().is_err());

        let blank_company = JobFields::new("  ", "Engineer");
        assert!(blank_company.into_changes().is_err());

        let ok = JobFields::new(" Acme ", "Engineer").into_changes().unwrap();
        assert_eq!(ok.company, "Acme");
        assert_eq!(ok.status, None);
    }

    #[test]
    fn test_into_changes_enforces_lengths() {
        let long = JobFields::new("a".repeat(51), "Engineer");
        let err = long.into_changes().unwrap_err();
        assert!(err.to_string().contains("Company"));
    }

    #[test]
    fn test_new_job_uses_defaults() {
        let owner = UserId::from("user-1");
        let job = Job::new(owner.clone(), JobFields::new("Acme", "Engineer").into_changes().unwrap());
        assert_eq!(job.status, JobStatus::Pending);
        assert_eq!(job.job_type, JobType::FullTime);
        assert!(job.is_owned_by(&owner));
        assert_eq!(job.created_at, job.updated_at);
    }

    #[test]
    fn test_client_owner_field_is_ignored() {
        let fields: JobFields = serde_json::from_str(
            r#"{"company":"Acme","position":"Dev","createdBy":"intruder","status":"interview"}"#,
        )
        .unwrap();
        let job = Job::new(UserId::from("owner"), fields.into_changes().unwrap());
        assert_eq!(job.created_by.as_str(), "owner");
        assert_eq!(job.status, JobStatus::Interview);
    }

    #[test]
    fn test_apply_keeps_unsupplied_fields() {
        let mut job = Job::new(
            UserId::from("u"),
            JobFields::new("Acme", "Dev").status(JobStatus::Interview).into_changes().unwrap(),
        );
        job.apply(JobFields::new("Globex", "Lead").into_changes().unwrap());
        assert_eq!(job.company, "Globex");
        assert_eq!(job.position, "Lead");
        assert_eq!(job.status, JobStatus::Interview);
    }

    #[test]
    fn test_job_json_is_camel_case() {
        let job = Job::new(UserId::from("u"), JobFields::new("Acme", "Dev").into_changes().unwrap());
        let value = serde_json::to_value(&job).unwrap();
        assert_eq!(value["jobType"], "full-time");
        assert_eq!(value["createdBy"], "u");
        assert!(value.get("createdAt").is_some());
    }
}
