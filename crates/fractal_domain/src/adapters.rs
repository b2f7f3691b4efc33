use crate::{OwnerId, Project, ProjectDraft, ProjectId, SubscriptionId};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

/// Row-level change announced by the store to its subscribers.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ProjectChange {
    Inserted(Project),
    Deleted(ProjectId),
}

pub type ProjectChangeSink = Arc<dyn Fn(ProjectChange) + Send + Sync>;

pub trait ProjectStore: Send + Sync {
    /// All projects of `owner_id`, newest first.
    fn fetch_all(&self, owner_id: &OwnerId) -> Result<Vec<Project>, String>;

    fn create(&self, draft: ProjectDraft) -> Result<Project, String>;

    /// Deleting an id that does not exist is not an error.
    fn delete(&self, project_id: &ProjectId) -> Result<(), String>;

    /// Registers `sink` for inserts and deletes of rows owned by `owner_id`.
    /// The sink may be called from any thread.
    fn subscribe(
        &self,
        owner_id: &OwnerId,
        sink: ProjectChangeSink,
    ) -> Result<SubscriptionId, String>;

    /// Unknown handles are ignored.
    fn unsubscribe(&self, subscription: SubscriptionId) -> Result<(), String>;
}

pub type GenerateFuture = Pin<Box<dyn Future<Output = Result<String, String>> + Send>>;

pub trait CodeGenerator: Send + Sync {
    fn generate(&self, prompt: String) -> GenerateFuture;
}
