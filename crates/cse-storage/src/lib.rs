//! The storage facade: a narrow trait boundary in front of a document
//! store, plus an in-process reference implementation with the derived
//! indexes the dispatcher and notification engine rely on.

mod memory;
mod search;

pub use memory::InMemoryStore;
pub use search::SearchCriteria;

use async_trait::async_trait;
use cse_resource::Resource;
use cse_types::{Ri, Rn, ResourceType};
use snafu::Snafu;

#[derive(Debug, Snafu)]
pub enum StoreError {
    #[snafu(display("resource not found: {ri}"))]
    NotFound { ri: Ri },
    #[snafu(display("sibling already exists: {pi}/{rn}"))]
    SiblingExists { pi: Ri, rn: Rn },
}

pub type Result<T, E = StoreError> = std::result::Result<T, E>;

/// The storage boundary the dispatcher, registration manager and
/// notification engine program against. A different backend can be
/// substituted by implementing this trait, without anything upstream
/// needing to change.
#[async_trait]
pub trait ResourceStore: Send + Sync {
    async fn put(&self, resource: Resource) -> Result<()>;
    async fn get(&self, ri: &str) -> Result<Resource>;
    async fn get_by_name(&self, pi: &str, rn: &str) -> Result<Resource>;
    async fn delete(&self, ri: &str) -> Result<Resource>;
    async fn children(&self, pi: &str, ty: Option<ResourceType>) -> Result<Vec<Resource>>;
    async fn search(&self, criteria: &SearchCriteria) -> Result<Vec<Resource>>;
}
