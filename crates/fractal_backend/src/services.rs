use crate::sqlite_store::SqliteStore;
use fractal_domain::{
    OwnerId, Project, ProjectChangeSink, ProjectDraft, ProjectId, ProjectStore, SubscriptionId,
};

impl ProjectStore for SqliteStore {
    fn fetch_all(&self, owner_id: &OwnerId) -> Result<Vec<Project>, String> {
        self.list_projects(owner_id).map_err(|e| format!("{e:#}"))
    }

    fn create(&self, draft: ProjectDraft) -> Result<Project, String> {
        self.insert_project(draft).map_err(|e| format!("{e:#}"))
    }

    fn delete(&self, project_id: &ProjectId) -> Result<(), String> {
        self.delete_project(project_id)
            .map(|_| ())
            .map_err(|e| format!("{e:#}"))
    }

    fn subscribe(
        &self,
        owner_id: &OwnerId,
        sink: ProjectChangeSink,
    ) -> Result<SubscriptionId, String> {
        Ok(self.add_subscription(owner_id.clone(), sink))
    }

    fn unsubscribe(&self, subscription: SubscriptionId) -> Result<(), String> {
        self.remove_subscription(subscription);
        Ok(())
    }
}
