use crate::{
    Action, AppState, Dialog, DialogCommand, DialogSeverity, DialogSlot, Editor, Effect,
    Identity, OwnerId, ProjectChange, ProjectDraft, ProjectId, ProjectList, SubscriptionStatus,
};

mod title;

pub use title::derive_project_title;

impl AppState {
    pub fn new() -> Self {
        Self {
            identity: None,
            generation: 0,
            projects: ProjectList::default(),
            subscription: SubscriptionStatus::Inactive,
            editor: Editor::default(),
            dialog: DialogSlot::None,
            pending_delete: None,
            next_generate_request_id: 1,
            active_generate_request_id: None,
        }
    }

    pub fn owner_id(&self) -> Option<&OwnerId> {
        self.identity.as_ref().map(|identity| &identity.owner_id)
    }

    pub fn apply(&mut self, action: Action) -> Vec<Effect> {
        match action {
            Action::IdentityChanged { identity } => self.change_identity(identity),

            Action::ProjectsLoaded {
                generation,
                projects,
            } => {
                if !self.is_current(generation) {
                    return Vec::new();
                }
                let Some(owner_id) = self.owner_id().cloned() else {
                    return Vec::new();
                };
                let projects = projects
                    .into_iter()
                    .filter(|p| p.owner_id == owner_id)
                    .collect();
                self.projects.finish_loading(projects);
                Vec::new()
            }
            Action::ProjectsLoadFailed {
                generation,
                message,
            } => {
                if !self.is_current(generation) {
                    return Vec::new();
                }
                self.projects.abort_loading();
                self.open_dialog(Dialog::notice(
                    DialogSeverity::Error,
                    "Error Loading Projects",
                    message,
                ));
                Vec::new()
            }
            Action::SubscriptionEstablished {
                generation,
                subscription,
            } => {
                if !self.is_current(generation) || self.identity.is_none() {
                    return vec![Effect::Unsubscribe { subscription }];
                }
                let mut effects = Vec::new();
                if let SubscriptionStatus::Active(previous) = self.subscription
                    && previous != subscription
                {
                    effects.push(Effect::Unsubscribe {
                        subscription: previous,
                    });
                }
                self.subscription = SubscriptionStatus::Active(subscription);
                effects
            }
            Action::SubscriptionFailed {
                generation,
                message,
            } => {
                if !self.is_current(generation) {
                    return Vec::new();
                }
                self.subscription = SubscriptionStatus::Degraded {
                    message: message.clone(),
                };
                self.open_dialog(Dialog::notice(
                    DialogSeverity::Warning,
                    "Live Updates Unavailable",
                    format!("Your project list may be out of date: {message}"),
                ));
                Vec::new()
            }
            Action::ProjectInserted {
                generation,
                project,
            } => {
                if !self.is_current(generation) || self.owner_id() != Some(&project.owner_id) {
                    return Vec::new();
                }
                self.projects.apply(ProjectChange::Inserted(project));
                Vec::new()
            }
            Action::ProjectDeleted {
                generation,
                project_id,
            } => {
                if !self.is_current(generation) || self.identity.is_none() {
                    return Vec::new();
                }
                self.projects.apply(ProjectChange::Deleted(project_id));
                Vec::new()
            }

            Action::PromptChanged { text } => {
                self.editor.prompt = text;
                Vec::new()
            }
            Action::NewProject => {
                self.editor.clear_project();
                Vec::new()
            }
            Action::LoadProject { project_id } => {
                if let Some(project) = self.projects.get(&project_id) {
                    self.editor.prompt = project.prompt.clone();
                    self.editor.generated_code = project.generated_code.clone();
                    self.editor.current_project_id = Some(project_id);
                }
                Vec::new()
            }

            Action::SaveProject => self.save_project(),
            Action::ProjectSaved { generation } => {
                if self.is_current(generation) {
                    self.open_dialog(Dialog::notice(
                        DialogSeverity::Success,
                        "Project Saved",
                        "Your project was saved successfully.",
                    ));
                }
                Vec::new()
            }
            Action::ProjectSaveFailed {
                generation,
                message,
            } => {
                if self.is_current(generation) {
                    self.open_dialog(Dialog::notice(
                        DialogSeverity::Error,
                        "Save Failed",
                        message,
                    ));
                }
                Vec::new()
            }

            Action::DeleteProject { project_id } => {
                if let Some(project) = self.projects.get(&project_id) {
                    let dialog = Dialog::confirm_delete(project);
                    self.open_dialog(dialog);
                }
                Vec::new()
            }
            Action::ProjectDeleteFinished {
                generation,
                project_id,
                result,
            } => self.finish_delete(generation, project_id, result),

            Action::Generate => self.generate(),
            Action::CodeGenerated {
                generation,
                request_id,
                code,
            } => {
                if self.take_generate_request(generation, request_id) {
                    self.editor.generated_code = code;
                }
                Vec::new()
            }
            Action::GenerateFailed {
                generation,
                request_id,
                message,
            } => {
                if self.take_generate_request(generation, request_id) {
                    self.editor.last_error = Some(message.clone());
                    self.open_dialog(Dialog::notice(
                        DialogSeverity::Error,
                        "Generation Error",
                        message,
                    ));
                }
                Vec::new()
            }

            Action::DialogCommand { command } => match command {
                DialogCommand::Dismiss => {
                    self.dialog = DialogSlot::None;
                    Vec::new()
                }
                DialogCommand::ConfirmDelete(project_id) => self.confirm_delete(project_id),
            },
            Action::DismissDialog => {
                self.dialog = DialogSlot::None;
                Vec::new()
            }
        }
    }

    fn is_current(&self, generation: u64) -> bool {
        generation == self.generation
    }

    fn open_dialog(&mut self, dialog: Dialog) {
        self.dialog = DialogSlot::Open(dialog);
    }

    fn change_identity(&mut self, identity: Option<Identity>) -> Vec<Effect> {
        if self.owner_id() == identity.as_ref().map(|i| &i.owner_id) {
            // Same stable key: only display fields may have changed.
            if let (Some(current), Some(next)) = (self.identity.as_mut(), identity) {
                current.email = next.email;
            }
            return Vec::new();
        }

        let mut effects = Vec::new();
        if let SubscriptionStatus::Active(subscription) = self.subscription {
            effects.push(Effect::Unsubscribe { subscription });
        }

        self.generation = self.generation.saturating_add(1);
        self.subscription = SubscriptionStatus::Inactive;
        self.projects.reset();
        self.editor = Editor::default();
        self.dialog = DialogSlot::None;
        self.pending_delete = None;
        self.active_generate_request_id = None;
        self.identity = identity;

        let Some(owner_id) = self.owner_id().cloned() else {
            return effects;
        };

        self.projects.begin_loading();
        self.subscription = SubscriptionStatus::Pending;
        effects.push(Effect::FetchProjects {
            generation: self.generation,
            owner_id: owner_id.clone(),
        });
        effects.push(Effect::Subscribe {
            generation: self.generation,
            owner_id,
        });
        effects
    }

    fn save_project(&mut self) -> Vec<Effect> {
        let Some(owner_id) = self.owner_id().cloned() else {
            return Vec::new();
        };

        let prompt = &self.editor.prompt;
        let generated_code = &self.editor.generated_code;
        if prompt.trim().is_empty() || generated_code.trim().is_empty() {
            self.open_dialog(Dialog::notice(
                DialogSeverity::Warning,
                "Missing Data",
                "Please generate some code before saving.",
            ));
            return Vec::new();
        }

        let draft = ProjectDraft {
            owner_id,
            title: derive_project_title(prompt),
            prompt: prompt.clone(),
            generated_code: generated_code.clone(),
            is_public: false,
        };
        vec![Effect::CreateProject {
            generation: self.generation,
            draft,
        }]
    }

    fn confirm_delete(&mut self, project_id: ProjectId) -> Vec<Effect> {
        if self.identity.is_none() || self.pending_delete.as_ref() == Some(&project_id) {
            return Vec::new();
        }
        let confirmed = self
            .dialog
            .dialog()
            .is_some_and(|d| d.offers(&DialogCommand::ConfirmDelete(project_id.clone())));
        if !confirmed {
            return Vec::new();
        }

        self.pending_delete = Some(project_id.clone());
        vec![Effect::DeleteProject {
            generation: self.generation,
            project_id,
        }]
    }

    fn finish_delete(
        &mut self,
        generation: u64,
        project_id: ProjectId,
        result: Result<(), String>,
    ) -> Vec<Effect> {
        if !self.is_current(generation) {
            return Vec::new();
        }
        if self.pending_delete.as_ref() == Some(&project_id) {
            self.pending_delete = None;
        }

        match result {
            Ok(()) => {
                let confirm = DialogCommand::ConfirmDelete(project_id.clone());
                if self.dialog.dialog().is_some_and(|d| d.offers(&confirm)) {
                    self.dialog = DialogSlot::None;
                }
                if self.editor.current_project_id.as_ref() == Some(&project_id) {
                    self.editor.clear_project();
                }
            }
            Err(message) => {
                self.open_dialog(Dialog::notice(
                    DialogSeverity::Error,
                    "Delete Failed",
                    message,
                ));
            }
        }
        Vec::new()
    }

    fn generate(&mut self) -> Vec<Effect> {
        if self.editor.prompt.trim().is_empty() {
            self.open_dialog(Dialog::notice(
                DialogSeverity::Warning,
                "Missing Prompt",
                "Describe the UI you want before generating.",
            ));
            return Vec::new();
        }

        let request_id = self.next_generate_request_id;
        self.next_generate_request_id = self.next_generate_request_id.saturating_add(1);
        self.active_generate_request_id = Some(request_id);

        self.editor.generating = true;
        self.editor.generated_code.clear();
        self.editor.last_error = None;

        vec![Effect::GenerateCode {
            generation: self.generation,
            request_id,
            prompt: self.editor.prompt.clone(),
        }]
    }

    /// Returns true when `request_id` is the newest generate request of the
    /// current session; that request is then no longer in flight.
    fn take_generate_request(&mut self, generation: u64, request_id: u64) -> bool {
        if !self.is_current(generation) || self.active_generate_request_id != Some(request_id) {
            return false;
        }
        self.active_generate_request_id = None;
        self.editor.generating = false;
        true
    }
}
