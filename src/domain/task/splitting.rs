use serde::Serialize;
use serde_json::{Map, Value};

use crate::api::request_dto::{FieldAccess, value_as_f64};

/// Job splitting parameters understood by the planner, under
/// algorithm-independent names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SplitField {
    EventsPerJob,
    AvgEventsPerJob,
    EventsPerLumi,
    LumisPerJob,
    HaltJobOnFileBoundaries,
    HaltJobOnFileBoundariesEventAware,
    JobTimeLimit,
}

impl SplitField {
    /// Fields copied from a task's splitting configuration.
    const SOURCE: [SplitField; 6] = [
        SplitField::EventsPerLumi,
        SplitField::EventsPerJob,
        SplitField::LumisPerJob,
        SplitField::HaltJobOnFileBoundaries,
        SplitField::JobTimeLimit,
        SplitField::HaltJobOnFileBoundariesEventAware,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            SplitField::EventsPerJob => "events_per_job",
            SplitField::AvgEventsPerJob => "avg_events_per_job",
            SplitField::EventsPerLumi => "events_per_lumi",
            SplitField::LumisPerJob => "lumis_per_job",
            SplitField::HaltJobOnFileBoundaries => "halt_job_on_file_boundaries",
            SplitField::HaltJobOnFileBoundariesEventAware => "halt_job_on_file_boundaries_event_aware",
            SplitField::JobTimeLimit => "job_time_limit",
        }
    }
}

/// Request-manager field names that carry splitting parameters when a task
/// has no `Splitting` object.
const FLAT_FIELDS: [(&str, SplitField); 4] = [
    ("EventsPerJob", SplitField::EventsPerJob),
    ("EventsPerLumi", SplitField::EventsPerLumi),
    ("LumisPerJob", SplitField::LumisPerJob),
    ("JobTimeLimit", SplitField::JobTimeLimit),
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum SplittingAlgorithm {
    EventAwareLumiBased,
    LumiBased,
    EventBased,
    FileBased,
    Other(String),
}

impl From<&str> for SplittingAlgorithm {
    fn from(s: &str) -> Self {
        match s {
            "EventAwareLumiBased" => SplittingAlgorithm::EventAwareLumiBased,
            "LumiBased" => SplittingAlgorithm::LumiBased,
            "EventBased" => SplittingAlgorithm::EventBased,
            "FileBased" => SplittingAlgorithm::FileBased,
            other => SplittingAlgorithm::Other(other.to_string()),
        }
    }
}

/// Field renames and implied flags of one splitting algorithm.
struct AlgorithmTransform {
    renames: &'static [(SplitField, SplitField)],
    flags: &'static [(SplitField, bool)],
}

impl SplittingAlgorithm {
    fn transform(&self) -> AlgorithmTransform {
        match self {
            SplittingAlgorithm::EventAwareLumiBased => AlgorithmTransform {
                renames: &[(SplitField::EventsPerJob, SplitField::AvgEventsPerJob)],
                flags: &[(SplitField::HaltJobOnFileBoundariesEventAware, true)],
            },
            SplittingAlgorithm::LumiBased => AlgorithmTransform { renames: &[], flags: &[(SplitField::HaltJobOnFileBoundaries, true)] },
            _ => AlgorithmTransform { renames: &[], flags: &[] },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Splitting {
    pub algorithm: SplittingAlgorithm,
    pub events_per_job: Option<u64>,
    pub avg_events_per_job: Option<u64>,
    pub events_per_lumi: Option<u64>,
    pub lumis_per_job: Option<u64>,
    pub halt_job_on_file_boundaries: Option<bool>,
    pub halt_job_on_file_boundaries_event_aware: Option<bool>,
    pub job_time_limit: Option<u64>,
}

impl Splitting {
    pub fn new(algorithm: SplittingAlgorithm) -> Self {
        Splitting {
            algorithm,
            events_per_job: None,
            avg_events_per_job: None,
            events_per_lumi: None,
            lumis_per_job: None,
            halt_job_on_file_boundaries: None,
            halt_job_on_file_boundaries_event_aware: None,
            job_time_limit: None,
        }
    }

    /// Reads the splitting of one task: its `Splitting` object if present,
    /// otherwise the flat request-manager fields.
    pub fn from_task(task: &Map<String, Value>) -> Splitting {
        if let Some(params) = task.object_field("Splitting") {
            return Splitting::from_params(params.str_field("algorithm").unwrap_or_default(), params);
        }

        let mut params = Map::new();
        for (flat, field) in FLAT_FIELDS {
            if let Some(value) = task.field(flat) {
                params.insert(field.key().to_string(), value.clone());
            }
        }
        Splitting::from_params(task.str_field("SplittingAlgo").unwrap_or_default(), &params)
    }

    /// Copies the known parameters, renaming them and adding the flags
    /// implied by the algorithm. Values present in `params` win over
    /// implied flags.
    pub fn from_params(algorithm: &str, params: &Map<String, Value>) -> Splitting {
        let algorithm = SplittingAlgorithm::from(algorithm);
        let transform = algorithm.transform();
        let mut splitting = Splitting::new(algorithm);

        for (field, value) in transform.flags {
            splitting.set(*field, &Value::Bool(*value));
        }

        for field in SplitField::SOURCE {
            let Some(value) = params.field(field.key()) else {
                continue;
            };
            let target = transform.renames.iter().find(|(source, _)| *source == field).map(|(_, renamed)| *renamed).unwrap_or(field);
            splitting.set(target, value);
        }

        splitting
    }

    fn set(&mut self, field: SplitField, value: &Value) {
        let number = || value_as_f64(value).filter(|v| *v >= 0.0).map(|v| v as u64);
        let flag = || match value {
            Value::Bool(b) => Some(*b),
            Value::String(s) => Some(s == "True" || s == "true"),
            _ => None,
        };
        match field {
            SplitField::EventsPerJob => self.events_per_job = number(),
            SplitField::AvgEventsPerJob => self.avg_events_per_job = number(),
            SplitField::EventsPerLumi => self.events_per_lumi = number(),
            SplitField::LumisPerJob => self.lumis_per_job = number(),
            SplitField::JobTimeLimit => self.job_time_limit = number(),
            SplitField::HaltJobOnFileBoundaries => self.halt_job_on_file_boundaries = flag(),
            SplitField::HaltJobOnFileBoundariesEventAware => self.halt_job_on_file_boundaries_event_aware = flag(),
        }
    }

    /// Events per job, whichever name the algorithm stores it under.
    pub fn job_granularity(&self) -> Option<u64> {
        self.avg_events_per_job.or(self.events_per_job)
    }
}
