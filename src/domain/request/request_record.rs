use serde::Serialize;
use serde_json::{Map, Value};

use crate::api::request_dto::{FieldAccess, RawDocument};
use crate::domain::request::request_type::RequestType;
use crate::domain::utils::id::{DatasetName, RequestName};
use crate::error::{Error, Result};

const CHAIN_BASES: [&str; 2] = ["Task", "Step"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum DatasetKind {
    InputDataset,
    MCPileup,
    DataPileup,
}

impl DatasetKind {
    pub const ALL: [DatasetKind; 3] = [DatasetKind::InputDataset, DatasetKind::MCPileup, DatasetKind::DataPileup];

    pub fn key(&self) -> &'static str {
        match self {
            DatasetKind::InputDataset => "InputDataset",
            DatasetKind::MCPileup => "MCPileup",
            DatasetKind::DataPileup => "DataPileup",
        }
    }

    pub fn is_pileup(&self) -> bool {
        !matches!(self, DatasetKind::InputDataset)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DatasetRef {
    pub kind: DatasetKind,
    pub name: DatasetName,
}

/// Canonical view of one incoming request.
#[derive(Debug, Clone, Serialize)]
pub struct RequestRecord {
    pub name: RequestName,
    pub request_type: RequestType,
    /// Inputs named by the request itself, in task order.
    pub datasets: Vec<DatasetRef>,
}

impl RequestRecord {
    /// Builds the record from a raw request document.
    ///
    /// The name comes from `RequestName`. Without it, a document holding a
    /// single top-level key is taken to be `{name: request}`; any other
    /// shape has no recoverable identity.
    pub fn normalize(raw: &RawDocument) -> Result<RequestRecord> {
        let (name, body) = Self::identity(raw)?;

        let request_type = RequestType::from_field(body.str_field("RequestType"));

        let mut datasets = Vec::new();
        let task_keys = chain_task_keys(body);
        if task_keys.is_empty() && !request_type.is_chain() {
            collect_datasets(body, &mut datasets);
        }
        for key in task_keys {
            if let Some(task) = body.object_field(key) {
                collect_datasets(task, &mut datasets);
            }
        }

        Ok(RequestRecord { name: RequestName::new(name), request_type, datasets })
    }

    fn identity(raw: &RawDocument) -> Result<(String, &Map<String, Value>)> {
        if let Some(name) = raw.str_field("RequestName").filter(|n| !n.is_empty()) {
            return Ok((name.to_string(), &raw.0));
        }

        if raw.len() != 1 {
            return Err(Error::AmbiguousIdentity(raw.len()));
        }

        let (key, value) = raw.iter().next().ok_or(Error::AmbiguousIdentity(0))?;
        if key.is_empty() {
            return Err(Error::InvalidRequest { request: String::new(), reason: "request name is empty".to_string() });
        }
        let body = value.as_object().unwrap_or(&raw.0);
        Ok((key.clone(), body))
    }

    /// The request document itself, unwrapping the `{name: request}` form.
    pub fn body(raw: &RawDocument) -> Result<RawDocument> {
        let (_, body) = Self::identity(raw)?;
        Ok(RawDocument::new(body.clone()))
    }
}

/// Top-level keys of chained task objects (`Task1`, `Step2`, ...), skipping
/// the `TaskChain`/`StepChain` counters, ordered by their numeric suffix.
fn chain_task_keys(body: &Map<String, Value>) -> Vec<&str> {
    let mut keys: Vec<(&str, u64, &str)> = body
        .iter()
        .filter(|(key, value)| value.is_object() && !key.ends_with("Chain"))
        .filter_map(|(key, _)| {
            let base = CHAIN_BASES.iter().find(|base| key.starts_with(**base))?;
            let index = key[base.len()..].parse::<u64>().unwrap_or(u64::MAX);
            Some((*base, index, key.as_str()))
        })
        .collect();
    keys.sort();
    keys.into_iter().map(|(_, _, key)| key).collect()
}

fn collect_datasets(fields: &Map<String, Value>, datasets: &mut Vec<DatasetRef>) {
    for kind in DatasetKind::ALL {
        for name in fields.string_list(kind.key()) {
            datasets.push(DatasetRef { kind, name: DatasetName::new(name) });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(value: Value) -> RawDocument {
        RawDocument::try_from(value).unwrap()
    }

    #[test]
    fn collects_chain_datasets_in_task_order() {
        let raw = doc(json!({
            "RequestName": "wf_chain",
            "RequestType": "TaskChain",
            "TaskChain": 2,
            "Task10": {"InputDataset": "/Z/Z/Z"},
            "Task2": {"MCPileup": ["/P/U/PREMIX"], "DataPileup": ""},
            "Task1": {"InputDataset": "/A/B/RAW"},
        }));

        let record = RequestRecord::normalize(&raw).unwrap();

        assert_eq!(record.name.as_str(), "wf_chain");
        assert_eq!(record.request_type, RequestType::TaskChain);
        let names: Vec<&str> = record.datasets.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["/A/B/RAW", "/P/U/PREMIX", "/Z/Z/Z"]);
        assert_eq!(record.datasets[1].kind, DatasetKind::MCPileup);
        assert!(record.datasets[1].kind.is_pileup());
    }

    #[test]
    fn single_key_document_names_the_request() {
        let raw = doc(json!({"wf_single": {"RequestType": "ReReco", "InputDataset": "/A/B/C", "Campaign": "Run3"}}));

        let record = RequestRecord::normalize(&raw).unwrap();

        assert_eq!(record.name.as_str(), "wf_single");
        assert_eq!(record.request_type, RequestType::ReReco);
        assert_eq!(record.datasets, vec![DatasetRef { kind: DatasetKind::InputDataset, name: DatasetName::new("/A/B/C") }]);
    }

    #[test]
    fn several_keys_without_name_are_ambiguous() {
        let raw = doc(json!({"RequestType": "ReReco", "InputDataset": "/A/B/C"}));

        assert!(matches!(RequestRecord::normalize(&raw), Err(Error::AmbiguousIdentity(2))));
    }

    #[test]
    fn empty_name_is_rejected() {
        let raw = doc(json!({"": {"RequestType": "ReReco"}}));

        assert!(matches!(RequestRecord::normalize(&raw), Err(Error::InvalidRequest { .. })));
    }
}
