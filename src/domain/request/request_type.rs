use serde::Serialize;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum RequestType {
    Standard,
    TaskChain,
    StepChain,
    ReReco,
    MonteCarlo,
    Other(String),
}

impl FromStr for RequestType {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "" | "Standard" => RequestType::Standard,
            "TaskChain" => RequestType::TaskChain,
            "StepChain" => RequestType::StepChain,
            "ReReco" => RequestType::ReReco,
            "MonteCarlo" => RequestType::MonteCarlo,
            other => RequestType::Other(other.to_string()),
        })
    }
}

impl RequestType {
    pub fn from_field(value: Option<&str>) -> Self {
        match value {
            Some(s) => s.parse().unwrap_or(RequestType::Standard),
            None => RequestType::Standard,
        }
    }

    /// Key prefix of the chained task objects, e.g. `Task` for `Task1`.
    pub fn chain_base(&self) -> Option<&'static str> {
        match self {
            RequestType::TaskChain => Some("Task"),
            RequestType::StepChain => Some("Step"),
            _ => None,
        }
    }

    pub fn is_chain(&self) -> bool {
        self.chain_base().is_some()
    }
}

impl fmt::Display for RequestType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestType::Standard => write!(f, "Standard"),
            RequestType::TaskChain => write!(f, "TaskChain"),
            RequestType::StepChain => write!(f, "StepChain"),
            RequestType::ReReco => write!(f, "ReReco"),
            RequestType::MonteCarlo => write!(f, "MonteCarlo"),
            RequestType::Other(name) => write!(f, "{}", name),
        }
    }
}
