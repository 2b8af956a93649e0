use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::ResourceType;
use crate::rsc::Rsc;

/// The four oneM2M request operations this core dispatches, plus the
/// asynchronous `Notify` used for outbound notification delivery.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operation {
    Retrieve,
    Create,
    Update,
    Delete,
    Notify,
}

/// Discovery / conditional filter criteria, carried as loosely typed
/// key-value pairs and interpreted by the dispatcher.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Filters {
    pub ty: Option<ResourceType>,
    pub labels: Vec<String>,
    pub created_after: Option<crate::Timestamp>,
    pub created_before: Option<crate::Timestamp>,
    pub attributes: BTreeMap<String, Value>,
    pub limit: Option<usize>,
    pub level: Option<u32>,
}

/// The canonical, transport-agnostic request envelope. The HTTP binding in
/// `cse-gateway` is responsible for building one of these from headers and a
/// body, and for rendering a [`Response`] back into HTTP.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Request {
    pub op: Operation,
    pub to: String,
    pub originator: String,
    pub rqi: String,
    pub rvi: String,
    pub ty: Option<ResourceType>,
    pub body: Value,
    #[serde(default)]
    pub filters: Filters,
    pub ec: Option<String>,
    pub ret: Option<crate::Timestamp>,
    pub vsi: Option<String>,
    pub accept: Option<String>,
}

/// The canonical response envelope, rendered back to HTTP (or handed to a
/// notification target) by the caller.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Response {
    pub rsc: Rsc,
    pub rqi: String,
    pub rvi: String,
    pub body: Option<Value>,
    pub dbg: Option<String>,
}

impl Response {
    pub fn ok(rqi: impl Into<String>, rvi: impl Into<String>, body: Value) -> Self {
        Response {
            rsc: Rsc::Ok,
            rqi: rqi.into(),
            rvi: rvi.into(),
            body: Some(body),
            dbg: None,
        }
    }

    pub fn error(rqi: impl Into<String>, rvi: impl Into<String>, rsc: Rsc, dbg: impl Into<String>) -> Self {
        Response {
            rsc,
            rqi: rqi.into(),
            rvi: rvi.into(),
            body: None,
            dbg: Some(dbg.into()),
        }
    }
}
