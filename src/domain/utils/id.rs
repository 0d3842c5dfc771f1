use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;
use std::marker::PhantomData;

/// String identifier tagged with the kind of entity it names, so a site name
/// cannot be passed where a dataset name is expected.
#[derive(PartialEq, Eq, PartialOrd, Ord, Clone, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Id<T> {
    pub id: String,
    #[serde(skip)]
    _marker: PhantomData<T>,
}

impl<T> Id<T> {
    pub fn new(id: impl Into<String>) -> Self {
        Id { id: id.into(), _marker: PhantomData }
    }

    pub fn as_str(&self) -> &str {
        &self.id
    }
}

impl<T> fmt::Display for Id<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id)
    }
}

impl<T> From<Id<T>> for String {
    fn from(id_wrapper: Id<T>) -> Self {
        id_wrapper.id
    }
}

impl<T> From<&str> for Id<T> {
    fn from(id: &str) -> Self {
        Id::new(id)
    }
}

// Lets maps keyed by Id<T> be queried with a plain &str.
impl<T> Borrow<str> for Id<T> {
    fn borrow(&self) -> &str {
        &self.id
    }
}

impl<T> fmt::Debug for Id<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let full_name = std::any::type_name::<T>();
        let clean_name = full_name.split("::").last().unwrap_or(full_name);
        let display_name = clean_name.replace("Tag", "Id");

        write!(f, "{}: {:?}", display_name, self.id)
    }
}

#[derive(Debug, Default, PartialEq, Eq, PartialOrd, Ord, Clone, Hash, Copy)]
pub struct RequestTag;
#[derive(Debug, Default, PartialEq, Eq, PartialOrd, Ord, Clone, Hash, Copy)]
pub struct DatasetTag;
#[derive(Debug, Default, PartialEq, Eq, PartialOrd, Ord, Clone, Hash, Copy)]
pub struct BlockTag;
#[derive(Debug, Default, PartialEq, Eq, PartialOrd, Ord, Clone, Hash, Copy)]
pub struct SiteTag;
#[derive(Debug, Default, PartialEq, Eq, PartialOrd, Ord, Clone, Hash, Copy)]
pub struct CampaignTag;

pub type RequestName = Id<RequestTag>;
pub type DatasetName = Id<DatasetTag>;
pub type BlockId = Id<BlockTag>;
pub type SiteName = Id<SiteTag>;
pub type CampaignName = Id<CampaignTag>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn map_lookup_by_str() {
        let mut sizes: HashMap<DatasetName, u64> = HashMap::new();
        sizes.insert(DatasetName::new("/A/B/C"), 42);

        assert_eq!(sizes.get("/A/B/C"), Some(&42));
        assert_eq!(sizes.get("/A/B/D"), None);
    }

    #[test]
    fn serializes_as_plain_string() {
        let site = SiteName::new("T1_US_FNAL");
        assert_eq!(serde_json::to_string(&site).unwrap(), "\"T1_US_FNAL\"");

        let parsed: SiteName = serde_json::from_str("\"T2_CH_CERN\"").unwrap();
        assert_eq!(parsed.as_str(), "T2_CH_CERN");
        assert_eq!(format!("{:?}", parsed), "SiteId: \"T2_CH_CERN\"");
    }
}
