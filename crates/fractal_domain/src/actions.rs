use crate::{DialogCommand, Identity, Project, ProjectId, SubscriptionId};

#[derive(Clone, Debug)]
pub enum Action {
    IdentityChanged {
        identity: Option<Identity>,
    },

    ProjectsLoaded {
        generation: u64,
        projects: Vec<Project>,
    },
    ProjectsLoadFailed {
        generation: u64,
        message: String,
    },
    SubscriptionEstablished {
        generation: u64,
        subscription: SubscriptionId,
    },
    SubscriptionFailed {
        generation: u64,
        message: String,
    },
    ProjectInserted {
        generation: u64,
        project: Project,
    },
    ProjectDeleted {
        generation: u64,
        project_id: ProjectId,
    },

    PromptChanged {
        text: String,
    },
    NewProject,
    LoadProject {
        project_id: ProjectId,
    },

    SaveProject,
    ProjectSaved {
        generation: u64,
    },
    ProjectSaveFailed {
        generation: u64,
        message: String,
    },

    DeleteProject {
        project_id: ProjectId,
    },
    ProjectDeleteFinished {
        generation: u64,
        project_id: ProjectId,
        result: Result<(), String>,
    },

    Generate,
    CodeGenerated {
        generation: u64,
        request_id: u64,
        code: String,
    },
    GenerateFailed {
        generation: u64,
        request_id: u64,
        message: String,
    },

    DialogCommand {
        command: DialogCommand,
    },
    DismissDialog,
}
