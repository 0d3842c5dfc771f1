use serde::Serialize;
use std::fmt;

use crate::domain::planner::placement_plan::{BatchTotals, PlacementPlan};
use crate::error::Error;

/// One entry of the audit trail: something that was skipped or degraded,
/// and why.
#[derive(Debug)]
pub struct PlanningWarning {
    /// Request or dataset the warning is about.
    pub subject: String,
    pub reason: Error,
}

impl PlanningWarning {
    pub fn new(subject: impl Into<String>, reason: Error) -> Self {
        PlanningWarning { subject: subject.into(), reason }
    }
}

impl fmt::Display for PlanningWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.subject, self.reason)
    }
}

impl Serialize for PlanningWarning {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        use serde::ser::SerializeStruct;
        let mut state = serializer.serialize_struct("PlanningWarning", 2)?;
        state.serialize_field("subject", &self.subject)?;
        state.serialize_field("reason", &self.reason.to_string())?;
        state.end()
    }
}

/// Result of one planning run.
#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanningReport {
    /// In input order, one per workflow that could be planned.
    pub plans: Vec<PlacementPlan>,
    pub warnings: Vec<PlanningWarning>,
    pub totals: BatchTotals,
}

impl PlanningReport {
    pub fn plan(&self, workflow: &str) -> Option<&PlacementPlan> {
        self.plans.iter().find(|p| p.workflow_name.as_str() == workflow)
    }

    pub fn warnings_for<'a>(&'a self, subject: &'a str) -> impl Iterator<Item = &'a PlanningWarning> {
        self.warnings.iter().filter(move |w| w.subject == subject)
    }
}
