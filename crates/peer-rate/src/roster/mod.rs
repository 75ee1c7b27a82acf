//! Bulk roster import. Personnel departments hand over staff lists as CSV
//! exports; this module turns them into agencies and users, creating each
//! agency on its first reference and leaving member counts to the service.

mod normalizer;
mod parser;

use std::collections::HashSet;
use std::io::Read;
use std::path::Path;

use crate::reviews::domain::{Agency, AgencyId, User, UserId};
use crate::reviews::repository::{CycleStore, DirectoryStore, EvaluationStore};
use crate::reviews::service::{ReviewService, ReviewServiceError};

#[derive(Debug)]
pub enum RosterImportError {
    Io(std::io::Error),
    Csv(csv::Error),
    Row {
        line: usize,
        problem: RosterRowProblem,
    },
    Service(ReviewServiceError),
}

#[derive(Debug)]
pub enum RosterRowProblem {
    MissingAgency,
    MissingName,
    MissingEmail,
    UnknownRole(String),
    DuplicateEmail(String),
    ConflictingId(String),
}

impl std::fmt::Display for RosterImportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RosterImportError::Io(err) => write!(f, "failed to read roster export: {}", err),
            RosterImportError::Csv(err) => write!(f, "invalid roster CSV data: {}", err),
            RosterImportError::Row { line, problem } => {
                write!(f, "roster line {}: {}", line, problem)
            }
            RosterImportError::Service(err) => {
                write!(f, "could not apply roster data: {}", err)
            }
        }
    }
}

impl std::fmt::Display for RosterRowProblem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RosterRowProblem::MissingAgency => write!(f, "the agency column is empty"),
            RosterRowProblem::MissingName => write!(f, "the name column is empty"),
            RosterRowProblem::MissingEmail => write!(f, "the email column is empty"),
            RosterRowProblem::UnknownRole(role) => write!(f, "unrecognized role {role:?}"),
            RosterRowProblem::DuplicateEmail(email) => {
                write!(f, "email {email} appears more than once")
            }
            RosterRowProblem::ConflictingId(email) => {
                write!(f, "email {email} maps to a member id an earlier row already claimed")
            }
        }
    }
}

impl std::error::Error for RosterImportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RosterImportError::Io(err) => Some(err),
            RosterImportError::Csv(err) => Some(err),
            RosterImportError::Row { .. } => None,
            RosterImportError::Service(err) => Some(err),
        }
    }
}

impl From<std::io::Error> for RosterImportError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<csv::Error> for RosterImportError {
    fn from(err: csv::Error) -> Self {
        Self::Csv(err)
    }
}

impl From<ReviewServiceError> for RosterImportError {
    fn from(err: ReviewServiceError) -> Self {
        Self::Service(err)
    }
}

/// What an import created.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RosterSummary {
    pub agencies: usize,
    pub users: usize,
}

pub struct RosterImporter;

impl RosterImporter {
    pub fn from_path<P, D, C, E>(
        path: P,
        service: &ReviewService<D, C, E>,
    ) -> Result<RosterSummary, RosterImportError>
    where
        P: AsRef<Path>,
        D: DirectoryStore + 'static,
        C: CycleStore + 'static,
        E: EvaluationStore + 'static,
    {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file, service)
    }

    /// Applies every roster row through the service. The whole file is
    /// validated before anything is written, emails and the member ids
    /// derived from them both deduplicated, so a bad row never leaves a
    /// half-imported directory behind.
    pub fn from_reader<R, D, C, E>(
        reader: R,
        service: &ReviewService<D, C, E>,
    ) -> Result<RosterSummary, RosterImportError>
    where
        R: Read,
        D: DirectoryStore + 'static,
        C: CycleStore + 'static,
        E: EvaluationStore + 'static,
    {
        let records = parser::parse_records(reader)?;

        let mut seen_emails: HashSet<String> = HashSet::new();
        let mut seen_ids: HashSet<String> = HashSet::new();
        for record in &records {
            if !seen_emails.insert(record.email.to_ascii_lowercase()) {
                return Err(RosterImportError::Row {
                    line: record.line,
                    problem: RosterRowProblem::DuplicateEmail(record.email.clone()),
                });
            }
            // Member ids come from the email local part, so distinct emails
            // can still collide once sluggified.
            if !seen_ids.insert(normalizer::slug(local_part(&record.email))) {
                return Err(RosterImportError::Row {
                    line: record.line,
                    problem: RosterRowProblem::ConflictingId(record.email.clone()),
                });
            }
        }

        let mut seen_agencies: HashSet<AgencyId> = HashSet::new();
        let mut users = 0;
        for record in records {
            let agency_id = AgencyId(normalizer::slug(&record.agency));
            if seen_agencies.insert(agency_id.clone()) {
                service.add_agency(Agency {
                    id: agency_id.clone(),
                    name: record.agency,
                    employee_count: 0,
                    region: record.region,
                })?;
            }
            service.add_user(User {
                id: UserId(normalizer::slug(local_part(&record.email))),
                name: record.name,
                email: record.email,
                avatar: None,
                role: record.role,
                agency_id,
                department: record.department,
                position: record.position,
            })?;
            users += 1;
        }

        Ok(RosterSummary {
            agencies: seen_agencies.len(),
            users,
        })
    }
}

fn local_part(email: &str) -> &str {
    email.split('@').next().unwrap_or(email)
}
