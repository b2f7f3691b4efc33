use crate::{OwnerId, ProjectDraft, ProjectId, SubscriptionId};

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Effect {
    FetchProjects {
        generation: u64,
        owner_id: OwnerId,
    },
    Subscribe {
        generation: u64,
        owner_id: OwnerId,
    },
    Unsubscribe {
        subscription: SubscriptionId,
    },

    CreateProject {
        generation: u64,
        draft: ProjectDraft,
    },
    DeleteProject {
        generation: u64,
        project_id: ProjectId,
    },

    GenerateCode {
        generation: u64,
        request_id: u64,
        prompt: String,
    },
}
