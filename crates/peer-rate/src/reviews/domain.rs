use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Identifier wrapper for agencies.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AgencyId(pub String);

/// Identifier wrapper for users.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UserId(pub String);

/// Identifier wrapper for evaluation cycles.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CycleId(pub String);

/// Identifier wrapper for scoring criteria.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CriterionId(pub String);

/// Identifier wrapper for submitted evaluations.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EvaluationId(pub String);

impl fmt::Display for AgencyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for CycleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for CriterionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// An organizational unit whose members review each other.
///
/// `employee_count` is denormalized and maintained by the directory
/// operations; it is display data, not a source of truth for eligibility.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Agency {
    pub id: AgencyId,
    pub name: String,
    pub employee_count: u32,
    pub region: Option<String>,
}

/// Flat role enumeration. Roles gate capability, not data ownership.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    Leader,
    Employee,
}

impl Role {
    /// Administrators configure cycles but never rate and are never rated.
    pub const fn takes_part_in_reviews(self) -> bool {
        !matches!(self, Self::Admin)
    }
}

/// A member of an agency. The agency reference is set once and scopes all
/// peer-review eligibility; `avatar` is an opaque reference owned elsewhere.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub avatar: Option<String>,
    pub role: Role,
    pub agency_id: AgencyId,
    pub department: Option<String>,
    pub position: Option<String>,
}

/// Upper bound of the canonical scoring scale. Criterion scores and band
/// thresholds both live on 0..=100.
pub const SCORE_SCALE_MAX: f64 = 100.0;

/// A single scoring criterion, owned by exactly one cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Criterion {
    pub id: CriterionId,
    pub name: String,
    pub description: String,
    pub order: u32,
}

impl Criterion {
    /// The standard criteria applied when an administrator creates a cycle
    /// without an explicit list.
    pub fn standard_set() -> Vec<Self> {
        let criteria = [
            (
                "professionalism",
                "Professionalism",
                "Subject-matter competence and quality of delivered work",
            ),
            (
                "productivity",
                "Productivity",
                "Volume and timeliness of completed work",
            ),
            (
                "collaboration",
                "Collaboration",
                "Willingness to support colleagues and share knowledge",
            ),
            (
                "innovation",
                "Innovation",
                "Initiative in improving processes and proposing ideas",
            ),
            (
                "discipline",
                "Discipline",
                "Adherence to working hours, rules, and commitments",
            ),
        ];
        criteria
            .into_iter()
            .enumerate()
            .map(|(position, (id, name, description))| Self {
                id: CriterionId(id.to_string()),
                name: name.to_string(),
                description: description.to_string(),
                order: position as u32 + 1,
            })
            .collect()
    }
}

/// A rating band: scores at or above `min_score` (and below any higher
/// band's threshold) earn this label. Bands are per-cycle configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatingBand {
    pub id: String,
    pub label: String,
    pub min_score: f64,
    pub color: String,
    pub order: u32,
}

impl RatingBand {
    pub const UNRATED_LABEL: &'static str = "Unrated";
    pub const UNRATED_COLOR: &'static str = "#94a3b8";

    /// Neutral sentinel used when a cycle has no bands configured or an
    /// evaluatee has no submissions yet. Never stored on a cycle.
    pub fn unrated() -> Self {
        Self {
            id: "unrated".to_string(),
            label: Self::UNRATED_LABEL.to_string(),
            min_score: 0.0,
            color: Self::UNRATED_COLOR.to_string(),
            order: 0,
        }
    }

    /// The standard five-band scheme on the 100-point scale, applied when an
    /// administrator creates a cycle without an explicit scheme.
    pub fn standard_scale() -> Vec<Self> {
        let bands = [
            ("excellent", "Excellent", 90.0, "#10b981"),
            ("good", "Good", 80.0, "#3b82f6"),
            ("fair", "Fair", 65.0, "#f59e0b"),
            ("average", "Average", 50.0, "#6366f1"),
            ("weak", "Weak", 0.0, "#f43f5e"),
        ];
        bands
            .into_iter()
            .enumerate()
            .map(|(position, (id, label, min_score, color))| Self {
                id: id.to_string(),
                label: label.to_string(),
                min_score,
                color: color.to_string(),
                order: position as u32 + 1,
            })
            .collect()
    }
}

/// Which agencies a cycle targets. Replaces the historical convention of
/// mixing an `"all"` sentinel into a list of agency ids.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "agencies")]
pub enum Scope {
    AllAgencies,
    Agencies(BTreeSet<AgencyId>),
}

impl Scope {
    pub fn includes(&self, agency: &AgencyId) -> bool {
        match self {
            Scope::AllAgencies => true,
            Scope::Agencies(ids) => ids.contains(agency),
        }
    }

    /// An explicit empty set would make the cycle visible to nobody and is
    /// rejected at creation/update time.
    pub fn is_empty(&self) -> bool {
        matches!(self, Scope::Agencies(ids) if ids.is_empty())
    }
}

/// Administrator-managed lifecycle state. `Closed` is terminal; the derived
/// open/upcoming/expired presentation states live in [`super::scope`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CycleStatus {
    Active,
    Paused,
    Closed,
    Upcoming,
}

impl CycleStatus {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Active => "Active",
            Self::Paused => "Paused",
            Self::Closed => "Closed",
            Self::Upcoming => "Upcoming",
        }
    }
}

/// An evaluation round: a time window, a target scope, and the scoring
/// scheme (criteria plus rating bands) frozen into the cycle itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationCycle {
    pub id: CycleId,
    pub name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub status: CycleStatus,
    pub scope: Scope,
    pub criteria: Vec<Criterion>,
    pub bands: Vec<RatingBand>,
}

impl EvaluationCycle {
    /// Cycles may transiently exist without criteria or bands while an
    /// administrator edits them; such cycles are not scoreable yet.
    pub fn is_configured(&self) -> bool {
        !self.criteria.is_empty() && !self.bands.is_empty()
    }

    /// Criteria in display order.
    pub fn ordered_criteria(&self) -> Vec<&Criterion> {
        let mut criteria: Vec<&Criterion> = self.criteria.iter().collect();
        criteria.sort_by(|a, b| a.order.cmp(&b.order).then_with(|| a.id.cmp(&b.id)));
        criteria
    }
}

/// One submitted peer review. Immutable once stored; at most one exists per
/// (evaluator, evaluatee, cycle) key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    pub id: EvaluationId,
    pub evaluator_id: UserId,
    pub evaluatee_id: UserId,
    pub cycle_id: CycleId,
    pub scores: BTreeMap<CriterionId, f64>,
    pub agency_id: AgencyId,
    pub submitted_at: DateTime<Utc>,
}

impl Evaluation {
    /// Composite key under which at most one submission may exist.
    pub fn submission_key(&self) -> (UserId, UserId, CycleId) {
        (
            self.evaluator_id.clone(),
            self.evaluatee_id.clone(),
            self.cycle_id.clone(),
        )
    }
}

/// Inbound payload for one peer review. The service stamps the id, the
/// denormalized agency, and the submission instant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationSubmission {
    pub evaluator_id: UserId,
    pub evaluatee_id: UserId,
    pub scores: BTreeMap<CriterionId, f64>,
}

/// Inbound payload for creating or replacing an evaluation cycle.
///
/// `criteria` and `bands` left as `None` fall back to the standard scheme on
/// creation and keep the current configuration on update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CycleDraft {
    pub name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub scope: Scope,
    #[serde(default)]
    pub criteria: Option<Vec<Criterion>>,
    #[serde(default)]
    pub bands: Option<Vec<RatingBand>>,
}
