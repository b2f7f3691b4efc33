use serde::{Deserialize, Serialize};

pub const PROTOCOL_VERSION: u32 = 1;

#[derive(Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProjectId(pub String);

#[derive(Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OwnerId(pub String);

/// Body of `POST /api/generate-ui`.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct GenerateUiRequest {
    #[serde(default)]
    pub prompt: Option<String>,
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct GenerateUiResponse {
    pub code: String,
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct ApiError {
    pub error: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AppSnapshot {
    pub rev: u64,
    #[serde(default)]
    pub identity: Option<IdentitySnapshot>,
    pub projects: Vec<ProjectSnapshot>,
    #[serde(default)]
    pub projects_loading: bool,
    pub subscription: SubscriptionSnapshot,
    pub editor: EditorSnapshot,
    #[serde(default)]
    pub dialog: Option<DialogSnapshot>,
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct IdentitySnapshot {
    pub owner_id: OwnerId,
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct ProjectSnapshot {
    pub id: ProjectId,
    pub owner_id: OwnerId,
    pub title: String,
    pub prompt: String,
    pub generated_code: String,
    #[serde(default)]
    pub is_public: bool,
    pub created_at_unix_ms: u64,
}

#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct EditorSnapshot {
    pub prompt: String,
    pub generated_code: String,
    #[serde(default)]
    pub current_project_id: Option<ProjectId>,
    #[serde(default)]
    pub generating: bool,
    #[serde(default)]
    pub last_error: Option<String>,
}

#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SubscriptionSnapshot {
    #[default]
    Inactive,
    Pending,
    Active,
    Degraded {
        message: String,
    },
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DialogSeverity {
    Success,
    Warning,
    Error,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DialogActionVariant {
    Primary,
    Default,
    Danger,
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct DialogSnapshot {
    pub title: String,
    pub message: String,
    pub severity: DialogSeverity,
    pub actions: Vec<DialogActionSnapshot>,
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct DialogActionSnapshot {
    pub label: String,
    pub variant: DialogActionVariant,
    /// Sending this back as a client action performs the button's command.
    pub action: ClientAction,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WsClientMessage {
    Hello {
        protocol_version: u32,
        last_seen_rev: Option<u64>,
    },
    Action {
        request_id: String,
        action: Box<ClientAction>,
    },
    Ping,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WsServerMessage {
    Hello {
        protocol_version: u32,
        current_rev: u64,
    },
    Ack {
        request_id: String,
        rev: u64,
    },
    Event {
        rev: u64,
        event: Box<ServerEvent>,
    },
    Error {
        request_id: Option<String>,
        message: String,
    },
    Pong,
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientAction {
    PromptChanged {
        text: String,
    },
    Generate,
    SaveProject,
    LoadProject {
        project_id: ProjectId,
    },
    DeleteProject {
        project_id: ProjectId,
    },
    ConfirmDeleteProject {
        project_id: ProjectId,
    },
    DismissDialog,
    NewProject,
}

/// Body of `POST /api/auth/signup` and `POST /api/auth/login`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AuthRequest {
    pub email: String,
    pub password: String,
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct AuthResponse {
    pub owner_id: OwnerId,
    pub email: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerEvent {
    AppChanged {
        rev: u64,
        snapshot: Box<AppSnapshot>,
    },
}
