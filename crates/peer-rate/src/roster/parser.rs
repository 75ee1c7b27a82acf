use std::io::Read;

use serde::{Deserialize, Deserializer};

use super::normalizer::clean;
use super::{RosterImportError, RosterRowProblem};
use crate::reviews::domain::Role;

/// One validated roster row. `line` is the 1-based CSV line it came from,
/// counting the header.
#[derive(Debug)]
pub(crate) struct RosterRecord {
    pub(crate) line: usize,
    pub(crate) agency: String,
    pub(crate) name: String,
    pub(crate) email: String,
    pub(crate) role: Role,
    pub(crate) department: Option<String>,
    pub(crate) position: Option<String>,
    pub(crate) region: Option<String>,
}

pub(crate) fn parse_records<R: Read>(reader: R) -> Result<Vec<RosterRecord>, RosterImportError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    let mut records = Vec::new();

    for (index, record) in csv_reader.deserialize::<RosterRow>().enumerate() {
        let line = index + 2;
        let row = record?;

        let agency = clean(&row.agency);
        if agency.is_empty() {
            return Err(row_error(line, RosterRowProblem::MissingAgency));
        }
        let name = clean(&row.name);
        if name.is_empty() {
            return Err(row_error(line, RosterRowProblem::MissingName));
        }
        let email = clean(&row.email);
        if email.is_empty() {
            return Err(row_error(line, RosterRowProblem::MissingEmail));
        }
        let role = parse_role(&row.role, line)?;

        records.push(RosterRecord {
            line,
            agency,
            name,
            email,
            role,
            department: row.department.as_deref().map(clean),
            position: row.position.as_deref().map(clean),
            region: row.region.as_deref().map(clean),
        });
    }

    Ok(records)
}

#[derive(Debug, Deserialize)]
struct RosterRow {
    #[serde(rename = "Agency")]
    agency: String,
    #[serde(rename = "Name")]
    name: String,
    #[serde(rename = "Email")]
    email: String,
    #[serde(rename = "Role")]
    role: String,
    #[serde(rename = "Department", default, deserialize_with = "empty_string_as_none")]
    department: Option<String>,
    #[serde(rename = "Position", default, deserialize_with = "empty_string_as_none")]
    position: Option<String>,
    #[serde(rename = "Region", default, deserialize_with = "empty_string_as_none")]
    region: Option<String>,
}

fn parse_role(value: &str, line: usize) -> Result<Role, RosterImportError> {
    match clean(value).to_ascii_lowercase().as_str() {
        "admin" | "administrator" => Ok(Role::Admin),
        "leader" | "head" => Ok(Role::Leader),
        "employee" | "staff" => Ok(Role::Employee),
        _ => Err(row_error(
            line,
            RosterRowProblem::UnknownRole(clean(value)),
        )),
    }
}

fn row_error(line: usize, problem: RosterRowProblem) -> RosterImportError {
    RosterImportError::Row { line, problem }
}

fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    Ok(opt.filter(|value| !value.trim().is_empty()))
}
