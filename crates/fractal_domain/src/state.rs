use crate::ProjectList;
use std::fmt;

#[derive(Clone, Debug, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct ProjectId(pub(crate) String);

impl ProjectId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Stable key of an authenticated identity. Everything the synchronizer
/// holds is scoped to one owner at a time.
#[derive(Clone, Debug, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct OwnerId(pub(crate) String);

impl OwnerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OwnerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub struct SubscriptionId(pub(crate) u64);

impl SubscriptionId {
    pub fn as_u64(self) -> u64 {
        self.0
    }

    pub fn from_u64(id: u64) -> Self {
        Self(id)
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Identity {
    pub owner_id: OwnerId,
    pub email: Option<String>,
}

impl Identity {
    pub fn new(owner_id: OwnerId) -> Self {
        Self {
            owner_id,
            email: None,
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Project {
    pub id: ProjectId,
    pub owner_id: OwnerId,
    pub title: String,
    pub prompt: String,
    pub generated_code: String,
    pub is_public: bool,
    pub created_at_unix_ms: u64,
}

/// Fields of a project before the store assigns its id and creation time.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ProjectDraft {
    pub owner_id: OwnerId,
    pub title: String,
    pub prompt: String,
    pub generated_code: String,
    pub is_public: bool,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum DialogSeverity {
    Success,
    Warning,
    Error,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum DialogVariant {
    Primary,
    Default,
    Danger,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum DialogCommand {
    Dismiss,
    ConfirmDelete(ProjectId),
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct DialogAction {
    pub label: String,
    pub variant: DialogVariant,
    pub command: DialogCommand,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Dialog {
    pub title: String,
    pub message: String,
    pub severity: DialogSeverity,
    pub actions: Vec<DialogAction>,
}

impl Dialog {
    /// A notification acknowledged with a single "OK" button.
    pub fn notice(
        severity: DialogSeverity,
        title: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            message: message.into(),
            severity,
            actions: vec![DialogAction {
                label: "OK".to_owned(),
                variant: DialogVariant::Primary,
                command: DialogCommand::Dismiss,
            }],
        }
    }

    pub fn confirm_delete(project: &Project) -> Self {
        Self {
            title: "Delete Project".to_owned(),
            message: format!(
                "Are you sure you want to delete \"{}\"? This cannot be undone.",
                project.title
            ),
            severity: DialogSeverity::Warning,
            actions: vec![
                DialogAction {
                    label: "Cancel".to_owned(),
                    variant: DialogVariant::Default,
                    command: DialogCommand::Dismiss,
                },
                DialogAction {
                    label: "Delete".to_owned(),
                    variant: DialogVariant::Danger,
                    command: DialogCommand::ConfirmDelete(project.id.clone()),
                },
            ],
        }
    }

    pub fn offers(&self, command: &DialogCommand) -> bool {
        self.actions.iter().any(|action| &action.command == command)
    }
}

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub enum DialogSlot {
    #[default]
    None,
    Open(Dialog),
}

impl DialogSlot {
    pub fn dialog(&self) -> Option<&Dialog> {
        match self {
            Self::None => None,
            Self::Open(dialog) => Some(dialog),
        }
    }

    pub fn is_open(&self) -> bool {
        matches!(self, Self::Open(_))
    }
}

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub enum SubscriptionStatus {
    #[default]
    Inactive,
    Pending,
    Active(SubscriptionId),
    /// The push channel failed; the list only changes through fetches from here on.
    Degraded {
        message: String,
    },
}

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Editor {
    pub prompt: String,
    pub generated_code: String,
    pub current_project_id: Option<ProjectId>,
    pub generating: bool,
    pub last_error: Option<String>,
}

impl Editor {
    pub(crate) fn clear_project(&mut self) {
        self.prompt.clear();
        self.generated_code.clear();
        self.current_project_id = None;
    }
}

#[derive(Clone, Debug)]
pub struct AppState {
    pub identity: Option<Identity>,
    /// Bumped on every identity transition. Async results carry the value
    /// they were issued under and are dropped when it no longer matches.
    pub generation: u64,
    pub projects: ProjectList,
    pub subscription: SubscriptionStatus,
    pub editor: Editor,
    pub dialog: DialogSlot,
    pub(crate) pending_delete: Option<ProjectId>,
    pub(crate) next_generate_request_id: u64,
    pub(crate) active_generate_request_id: Option<u64>,
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}
