use cse_types::{ResourceType, Timestamp};
use serde_json::Value;
use std::collections::BTreeMap;

/// Discovery criteria, translated from [`cse_types::Filters`] by the
/// dispatcher before reaching the storage layer.
#[derive(Clone, Debug, Default)]
pub struct SearchCriteria {
    pub root: String,
    pub ty: Option<ResourceType>,
    pub labels: Vec<String>,
    pub created_after: Option<Timestamp>,
    pub created_before: Option<Timestamp>,
    pub attributes: BTreeMap<String, Value>,
    pub limit: Option<usize>,
    pub level: Option<u32>,
}
