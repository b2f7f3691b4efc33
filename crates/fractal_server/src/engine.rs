use anyhow::Context as _;
use fractal_api::{
    AppSnapshot, ClientAction, DialogActionSnapshot, DialogActionVariant, DialogSnapshot,
    EditorSnapshot, IdentitySnapshot, ProjectSnapshot, ServerEvent, SubscriptionSnapshot,
    WsServerMessage,
};
use fractal_domain::{
    Action, AppState, CodeGenerator, DialogCommand, DialogSeverity, DialogVariant, Effect,
    Identity, ProjectChange, ProjectChangeSink, ProjectId, ProjectStore,
    SubscriptionStatus,
};
use std::ops::ControlFlow;
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc, oneshot};

#[derive(Clone)]
pub struct EngineHandle {
    tx: mpsc::Sender<EngineCommand>,
}

impl EngineHandle {
    pub async fn current_rev(&self) -> anyhow::Result<u64> {
        let (tx, rx) = oneshot::channel();
        self.tx
            .send(EngineCommand::GetRev { reply: tx })
            .await
            .context("engine unavailable")?;
        rx.await.context("engine stopped")?
    }

    pub async fn app_snapshot(&self) -> anyhow::Result<AppSnapshot> {
        let (tx, rx) = oneshot::channel();
        self.tx
            .send(EngineCommand::GetAppSnapshot { reply: tx })
            .await
            .context("engine unavailable")?;
        rx.await.context("engine stopped")?
    }

    /// Binds the engine to an authenticated owner, or clears it with `None`.
    pub async fn set_identity(&self, identity: Option<Identity>) -> anyhow::Result<u64> {
        let (tx, rx) = oneshot::channel();
        self.tx
            .send(EngineCommand::SetIdentity {
                identity,
                reply: tx,
            })
            .await
            .context("engine unavailable")?;
        rx.await.context("engine stopped")
    }

    /// Signs the engine out and stops its task. Safe to call from `Drop`.
    pub fn shutdown(&self) {
        if let Err(err) = self.tx.try_send(EngineCommand::Shutdown) {
            tracing::debug!(error = %err, "engine already stopped");
        }
    }

    pub async fn apply_client_action(&self, action: ClientAction) -> Result<u64, String> {
        let (tx, rx) = oneshot::channel();
        if self
            .tx
            .send(EngineCommand::ApplyClientAction { action, reply: tx })
            .await
            .is_err()
        {
            return Err("engine unavailable".to_owned());
        }
        rx.await
            .unwrap_or_else(|_| Err("engine stopped".to_owned()))
    }
}

pub enum EngineCommand {
    GetRev {
        reply: oneshot::Sender<anyhow::Result<u64>>,
    },
    GetAppSnapshot {
        reply: oneshot::Sender<anyhow::Result<AppSnapshot>>,
    },
    SetIdentity {
        identity: Option<Identity>,
        reply: oneshot::Sender<u64>,
    },
    ApplyClientAction {
        action: ClientAction,
        reply: oneshot::Sender<Result<u64, String>>,
    },
    Shutdown,
    /// Completion of an effect task.
    DispatchAction {
        action: Box<Action>,
    },
}

/// Single owner of `AppState`. Effects run as detached tasks and report
/// back through the command channel; store pushes arrive on `push_rx`.
pub struct Engine {
    state: AppState,
    rev: u64,
    store: Arc<dyn ProjectStore>,
    generator: Arc<dyn CodeGenerator>,
    events: broadcast::Sender<WsServerMessage>,
    tx: mpsc::Sender<EngineCommand>,
    push_tx: mpsc::UnboundedSender<Action>,
}

impl Engine {
    pub fn start(
        store: Arc<dyn ProjectStore>,
        generator: Arc<dyn CodeGenerator>,
    ) -> (EngineHandle, broadcast::Sender<WsServerMessage>) {
        let (tx, mut rx) = mpsc::channel::<EngineCommand>(256);
        let (push_tx, mut push_rx) = mpsc::unbounded_channel::<Action>();
        let (events, _) = broadcast::channel::<WsServerMessage>(256);

        let mut engine = Self {
            state: AppState::new(),
            rev: 0,
            store,
            generator,
            events: events.clone(),
            tx: tx.clone(),
            push_tx,
        };

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    cmd = rx.recv() => {
                        let Some(cmd) = cmd else { break };
                        if engine.handle(cmd).is_break() {
                            break;
                        }
                    }
                    Some(action) = push_rx.recv() => {
                        engine.process_action(action);
                    }
                }
            }
        });

        (EngineHandle { tx }, events)
    }

    fn handle(&mut self, cmd: EngineCommand) -> ControlFlow<()> {
        match cmd {
            EngineCommand::GetRev { reply } => {
                let _ = reply.send(Ok(self.rev));
            }
            EngineCommand::GetAppSnapshot { reply } => {
                let _ = reply.send(Ok(self.app_snapshot()));
            }
            EngineCommand::SetIdentity { identity, reply } => {
                self.process_action(Action::IdentityChanged { identity });
                let _ = reply.send(self.rev);
            }
            EngineCommand::ApplyClientAction { action, reply } => {
                self.process_action(map_client_action(action));
                let _ = reply.send(Ok(self.rev));
            }
            EngineCommand::DispatchAction { action } => {
                self.process_action(*action);
            }
            EngineCommand::Shutdown => {
                // Signing out releases the store subscription before the task exits.
                self.process_action(Action::IdentityChanged { identity: None });
                return ControlFlow::Break(());
            }
        }
        ControlFlow::Continue(())
    }

    fn process_action(&mut self, action: Action) {
        self.rev = self.rev.saturating_add(1);
        let effects = self.state.apply(action);
        self.publish_app_snapshot();

        for effect in effects {
            self.spawn_effect(effect);
        }
    }

    fn spawn_effect(&self, effect: Effect) {
        let store = self.store.clone();
        let tx = self.tx.clone();

        match effect {
            Effect::FetchProjects {
                generation,
                owner_id,
            } => {
                tokio::spawn(async move {
                    let fetched = tokio::task::spawn_blocking(move || store.fetch_all(&owner_id))
                        .await
                        .ok()
                        .unwrap_or_else(|| Err("failed to join fetch projects task".to_owned()));
                    let action = match fetched {
                        Ok(projects) => Action::ProjectsLoaded {
                            generation,
                            projects,
                        },
                        Err(message) => {
                            tracing::error!(error = %message, "fetch projects failed");
                            Action::ProjectsLoadFailed {
                                generation,
                                message,
                            }
                        }
                    };
                    dispatch(&tx, action).await;
                });
            }
            Effect::Subscribe {
                generation,
                owner_id,
            } => {
                let sink = push_sink(self.push_tx.clone(), generation);
                tokio::spawn(async move {
                    let log_owner = owner_id.clone();
                    let subscribed =
                        tokio::task::spawn_blocking(move || store.subscribe(&owner_id, sink))
                            .await
                            .ok()
                            .unwrap_or_else(|| Err("failed to join subscribe task".to_owned()));
                    let action = match subscribed {
                        Ok(subscription) => {
                            tracing::info!(
                                owner_id = %log_owner,
                                subscription = subscription.as_u64(),
                                "project subscription established"
                            );
                            Action::SubscriptionEstablished {
                                generation,
                                subscription,
                            }
                        }
                        Err(message) => {
                            tracing::warn!(
                                owner_id = %log_owner,
                                error = %message,
                                "project subscription degraded"
                            );
                            Action::SubscriptionFailed {
                                generation,
                                message,
                            }
                        }
                    };
                    dispatch(&tx, action).await;
                });
            }
            Effect::Unsubscribe { subscription } => {
                tokio::task::spawn_blocking(move || {
                    if let Err(message) = store.unsubscribe(subscription) {
                        tracing::warn!(
                            subscription = subscription.as_u64(),
                            error = %message,
                            "failed to release project subscription"
                        );
                    }
                });
            }
            Effect::CreateProject { generation, draft } => {
                tokio::spawn(async move {
                    let created = tokio::task::spawn_blocking(move || store.create(draft))
                        .await
                        .ok()
                        .unwrap_or_else(|| Err("failed to join create project task".to_owned()));
                    let action = match created {
                        Ok(_) => Action::ProjectSaved { generation },
                        Err(message) => {
                            tracing::error!(error = %message, "save project failed");
                            Action::ProjectSaveFailed {
                                generation,
                                message,
                            }
                        }
                    };
                    dispatch(&tx, action).await;
                });
            }
            Effect::DeleteProject {
                generation,
                project_id,
            } => {
                tokio::spawn(async move {
                    let target = project_id.clone();
                    let result = tokio::task::spawn_blocking(move || store.delete(&target))
                        .await
                        .ok()
                        .unwrap_or_else(|| Err("failed to join delete project task".to_owned()));
                    if let Err(message) = &result {
                        tracing::error!(project_id = %project_id, error = %message, "delete project failed");
                    }
                    dispatch(
                        &tx,
                        Action::ProjectDeleteFinished {
                            generation,
                            project_id,
                            result,
                        },
                    )
                    .await;
                });
            }
            Effect::GenerateCode {
                generation,
                request_id,
                prompt,
            } => {
                let generator = self.generator.clone();
                tokio::spawn(async move {
                    let action = match generator.generate(prompt).await {
                        Ok(code) => Action::CodeGenerated {
                            generation,
                            request_id,
                            code,
                        },
                        Err(message) => {
                            tracing::error!(error = %message, "code generation failed");
                            Action::GenerateFailed {
                                generation,
                                request_id,
                                message,
                            }
                        }
                    };
                    dispatch(&tx, action).await;
                });
            }
        }
    }

    fn publish_app_snapshot(&self) {
        let _ = self.events.send(WsServerMessage::Event {
            rev: self.rev,
            event: Box::new(ServerEvent::AppChanged {
                rev: self.rev,
                snapshot: Box::new(self.app_snapshot()),
            }),
        });
    }

    fn app_snapshot(&self) -> AppSnapshot {
        app_snapshot(&self.state, self.rev)
    }
}

async fn dispatch(tx: &mpsc::Sender<EngineCommand>, action: Action) {
    let _ = tx
        .send(EngineCommand::DispatchAction {
            action: Box::new(action),
        })
        .await;
}

/// Store notifications may fire on any thread; they are tagged with the
/// generation they were subscribed under.
fn push_sink(push_tx: mpsc::UnboundedSender<Action>, generation: u64) -> ProjectChangeSink {
    Arc::new(move |change: ProjectChange| {
        let action = match change {
            ProjectChange::Inserted(project) => Action::ProjectInserted {
                generation,
                project,
            },
            ProjectChange::Deleted(project_id) => Action::ProjectDeleted {
                generation,
                project_id,
            },
        };
        let _ = push_tx.send(action);
    })
}

fn map_client_action(action: ClientAction) -> Action {
    match action {
        ClientAction::PromptChanged { text } => Action::PromptChanged { text },
        ClientAction::Generate => Action::Generate,
        ClientAction::SaveProject => Action::SaveProject,
        ClientAction::LoadProject { project_id } => Action::LoadProject {
            project_id: ProjectId::new(project_id.0),
        },
        ClientAction::DeleteProject { project_id } => Action::DeleteProject {
            project_id: ProjectId::new(project_id.0),
        },
        ClientAction::ConfirmDeleteProject { project_id } => Action::DialogCommand {
            command: DialogCommand::ConfirmDelete(ProjectId::new(project_id.0)),
        },
        ClientAction::DismissDialog => Action::DismissDialog,
        ClientAction::NewProject => Action::NewProject,
    }
}

fn map_dialog_command(command: &DialogCommand) -> ClientAction {
    match command {
        DialogCommand::Dismiss => ClientAction::DismissDialog,
        DialogCommand::ConfirmDelete(project_id) => ClientAction::ConfirmDeleteProject {
            project_id: fractal_api::ProjectId(project_id.as_str().to_owned()),
        },
    }
}

fn app_snapshot(state: &AppState, rev: u64) -> AppSnapshot {
    AppSnapshot {
        rev,
        identity: state.identity.as_ref().map(|identity| IdentitySnapshot {
            owner_id: fractal_api::OwnerId(identity.owner_id.as_str().to_owned()),
            email: identity.email.clone(),
        }),
        projects: state
            .projects
            .iter()
            .map(|project| ProjectSnapshot {
                id: fractal_api::ProjectId(project.id.as_str().to_owned()),
                owner_id: fractal_api::OwnerId(project.owner_id.as_str().to_owned()),
                title: project.title.clone(),
                prompt: project.prompt.clone(),
                generated_code: project.generated_code.clone(),
                is_public: project.is_public,
                created_at_unix_ms: project.created_at_unix_ms,
            })
            .collect(),
        projects_loading: state.projects.is_loading(),
        subscription: match &state.subscription {
            SubscriptionStatus::Inactive => SubscriptionSnapshot::Inactive,
            SubscriptionStatus::Pending => SubscriptionSnapshot::Pending,
            SubscriptionStatus::Active(_) => SubscriptionSnapshot::Active,
            SubscriptionStatus::Degraded { message } => SubscriptionSnapshot::Degraded {
                message: message.clone(),
            },
        },
        editor: EditorSnapshot {
            prompt: state.editor.prompt.clone(),
            generated_code: state.editor.generated_code.clone(),
            current_project_id: state
                .editor
                .current_project_id
                .as_ref()
                .map(|id| fractal_api::ProjectId(id.as_str().to_owned())),
            generating: state.editor.generating,
            last_error: state.editor.last_error.clone(),
        },
        dialog: state.dialog.dialog().map(|dialog| DialogSnapshot {
            title: dialog.title.clone(),
            message: dialog.message.clone(),
            severity: match dialog.severity {
                DialogSeverity::Success => fractal_api::DialogSeverity::Success,
                DialogSeverity::Warning => fractal_api::DialogSeverity::Warning,
                DialogSeverity::Error => fractal_api::DialogSeverity::Error,
            },
            actions: dialog
                .actions
                .iter()
                .map(|action| DialogActionSnapshot {
                    label: action.label.clone(),
                    variant: match action.variant {
                        DialogVariant::Primary => DialogActionVariant::Primary,
                        DialogVariant::Default => DialogActionVariant::Default,
                        DialogVariant::Danger => DialogActionVariant::Danger,
                    },
                    action: map_dialog_command(&action.command),
                })
                .collect(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fractal_domain::{GenerateFuture, OwnerId, Project, ProjectDraft, SubscriptionId};
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::time::Duration;

    #[derive(Default)]
    struct MemoryStore {
        projects: Mutex<Vec<Project>>,
        sinks: Mutex<HashMap<u64, (OwnerId, ProjectChangeSink)>>,
        next_id: Mutex<u64>,
    }

    impl MemoryStore {
        fn with_projects(projects: Vec<Project>) -> Self {
            Self {
                projects: Mutex::new(projects),
                ..Self::default()
            }
        }

        fn notify(&self, owner_id: &OwnerId, change: ProjectChange) {
            let sinks = self
                .sinks
                .lock()
                .unwrap()
                .values()
                .filter(|(owner, _)| owner == owner_id)
                .map(|(_, sink)| sink.clone())
                .collect::<Vec<_>>();
            for sink in sinks {
                sink(change.clone());
            }
        }

        fn subscriber_count(&self) -> usize {
            self.sinks.lock().unwrap().len()
        }
    }

    impl ProjectStore for MemoryStore {
        fn fetch_all(&self, owner_id: &OwnerId) -> Result<Vec<Project>, String> {
            Ok(self
                .projects
                .lock()
                .unwrap()
                .iter()
                .filter(|p| &p.owner_id == owner_id)
                .cloned()
                .collect())
        }

        fn create(&self, draft: ProjectDraft) -> Result<Project, String> {
            let mut next_id = self.next_id.lock().unwrap();
            *next_id += 1;
            let project = Project {
                id: ProjectId::new(format!("p{}", *next_id)),
                owner_id: draft.owner_id,
                title: draft.title,
                prompt: draft.prompt,
                generated_code: draft.generated_code,
                is_public: draft.is_public,
                created_at_unix_ms: 1_000 + *next_id,
            };
            drop(next_id);
            self.projects.lock().unwrap().push(project.clone());
            self.notify(&project.owner_id, ProjectChange::Inserted(project.clone()));
            Ok(project)
        }

        fn delete(&self, project_id: &ProjectId) -> Result<(), String> {
            let removed = {
                let mut projects = self.projects.lock().unwrap();
                let index = projects.iter().position(|p| &p.id == project_id);
                index.map(|index| projects.remove(index))
            };
            if let Some(project) = removed {
                self.notify(&project.owner_id, ProjectChange::Deleted(project.id));
            }
            Ok(())
        }

        fn subscribe(
            &self,
            owner_id: &OwnerId,
            sink: ProjectChangeSink,
        ) -> Result<SubscriptionId, String> {
            let mut next_id = self.next_id.lock().unwrap();
            *next_id += 1;
            self.sinks
                .lock()
                .unwrap()
                .insert(*next_id, (owner_id.clone(), sink));
            Ok(SubscriptionId::from_u64(*next_id))
        }

        fn unsubscribe(&self, subscription: SubscriptionId) -> Result<(), String> {
            self.sinks.lock().unwrap().remove(&subscription.as_u64());
            Ok(())
        }
    }

    struct EchoGenerator;

    impl CodeGenerator for EchoGenerator {
        fn generate(&self, prompt: String) -> GenerateFuture {
            Box::pin(async move { Ok(format!("<div>{prompt}</div>")) })
        }
    }

    fn project(owner_id: &str, id: &str, created_at_unix_ms: u64) -> Project {
        Project {
            id: ProjectId::new(id),
            owner_id: OwnerId::new(owner_id),
            title: id.to_owned(),
            prompt: format!("prompt {id}"),
            generated_code: format!("<{id} />"),
            is_public: false,
            created_at_unix_ms,
        }
    }

    async fn wait_for_snapshot(
        rx: &mut broadcast::Receiver<WsServerMessage>,
        predicate: impl Fn(&AppSnapshot) -> bool,
    ) -> AppSnapshot {
        let wait = async {
            loop {
                let msg = rx.recv().await.expect("event stream closed");
                if let WsServerMessage::Event { event, .. } = msg {
                    let ServerEvent::AppChanged { snapshot, .. } = *event;
                    if predicate(&snapshot) {
                        return *snapshot;
                    }
                }
            }
        };
        tokio::time::timeout(Duration::from_secs(5), wait)
            .await
            .expect("timed out waiting for snapshot")
    }

    async fn sign_in(engine: &EngineHandle, owner_id: &str) {
        engine
            .set_identity(Some(Identity::new(OwnerId::new(owner_id))))
            .await
            .unwrap();
    }

    fn snapshot_ids(snapshot: &AppSnapshot) -> Vec<String> {
        snapshot.projects.iter().map(|p| p.id.0.clone()).collect()
    }

    #[tokio::test]
    async fn sign_in_loads_projects_newest_first() {
        let store = Arc::new(MemoryStore::with_projects(vec![
            project("alice", "t1", 1),
            project("alice", "t2", 2),
            project("bob", "b1", 3),
        ]));
        let (engine, events) = Engine::start(store.clone(), Arc::new(EchoGenerator));
        let mut rx = events.subscribe();

        sign_in(&engine, "alice").await;
        let snapshot = wait_for_snapshot(&mut rx, |s| {
            !s.projects_loading && s.subscription == SubscriptionSnapshot::Active
        })
        .await;

        assert_eq!(snapshot_ids(&snapshot), vec!["t2", "t1"]);
        assert_eq!(store.subscriber_count(), 1);
    }

    #[tokio::test]
    async fn save_round_trips_through_push() {
        let store = Arc::new(MemoryStore::default());
        let (engine, events) = Engine::start(store.clone(), Arc::new(EchoGenerator));
        let mut rx = events.subscribe();

        sign_in(&engine, "alice").await;
        wait_for_snapshot(&mut rx, |s| s.subscription == SubscriptionSnapshot::Active).await;

        engine
            .apply_client_action(ClientAction::PromptChanged {
                text: "Pricing card\nwith three tiers".to_owned(),
            })
            .await
            .unwrap();
        engine.apply_client_action(ClientAction::Generate).await.unwrap();
        wait_for_snapshot(&mut rx, |s| !s.editor.generated_code.is_empty()).await;

        engine
            .apply_client_action(ClientAction::SaveProject)
            .await
            .unwrap();
        let snapshot = wait_for_snapshot(&mut rx, |s| {
            s.projects.len() == 1
                && s.dialog.as_ref().map(|d| d.title.as_str()) == Some("Project Saved")
        })
        .await;

        assert_eq!(snapshot.projects[0].title, "Pricing card");
        assert!(!snapshot.projects[0].is_public);
    }

    #[tokio::test]
    async fn delete_confirmation_removes_project() {
        let store = Arc::new(MemoryStore::with_projects(vec![project("alice", "t1", 1)]));
        let (engine, events) = Engine::start(store.clone(), Arc::new(EchoGenerator));
        let mut rx = events.subscribe();

        sign_in(&engine, "alice").await;
        wait_for_snapshot(&mut rx, |s| {
            s.projects.len() == 1 && s.subscription == SubscriptionSnapshot::Active
        })
        .await;

        engine
            .apply_client_action(ClientAction::DeleteProject {
                project_id: fractal_api::ProjectId("t1".to_owned()),
            })
            .await
            .unwrap();
        let snapshot = wait_for_snapshot(&mut rx, |s| s.dialog.is_some()).await;
        let confirm = snapshot
            .dialog
            .expect("confirmation dialog")
            .actions
            .into_iter()
            .find(|a| a.variant == DialogActionVariant::Danger)
            .expect("delete button");
        assert_eq!(store.fetch_all(&OwnerId::new("alice")).unwrap().len(), 1);

        engine.apply_client_action(confirm.action).await.unwrap();
        let snapshot =
            wait_for_snapshot(&mut rx, |s| s.projects.is_empty() && s.dialog.is_none()).await;
        assert!(snapshot.projects.is_empty());
    }

    #[tokio::test]
    async fn switching_identity_releases_previous_subscription() {
        let store = Arc::new(MemoryStore::default());
        let (engine, events) = Engine::start(store.clone(), Arc::new(EchoGenerator));
        let mut rx = events.subscribe();

        sign_in(&engine, "alice").await;
        wait_for_snapshot(&mut rx, |s| s.subscription == SubscriptionSnapshot::Active).await;

        sign_in(&engine, "bob").await;
        wait_for_snapshot(&mut rx, |s| {
            s.identity.as_ref().map(|i| i.owner_id.0.as_str()) == Some("bob")
                && s.subscription == SubscriptionSnapshot::Active
        })
        .await;

        store.create(ProjectDraft {
            owner_id: OwnerId::new("alice"),
            title: "a".to_owned(),
            prompt: "a".to_owned(),
            generated_code: "a".to_owned(),
            is_public: false,
        })
        .unwrap();

        let snapshot = engine.app_snapshot().await.unwrap();
        assert!(snapshot.projects.is_empty());

        // Unsubscribe runs on a blocking task; give it a moment.
        for _ in 0..50 {
            if store.subscriber_count() == 1 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(store.subscriber_count(), 1);
    }

    #[tokio::test]
    async fn shutdown_releases_subscription_and_stops_task() {
        let store = Arc::new(MemoryStore::default());
        let (engine, events) = Engine::start(store.clone(), Arc::new(EchoGenerator));
        let mut rx = events.subscribe();

        sign_in(&engine, "alice").await;
        wait_for_snapshot(&mut rx, |s| s.subscription == SubscriptionSnapshot::Active).await;
        assert_eq!(store.subscriber_count(), 1);

        engine.shutdown();
        wait_for_snapshot(&mut rx, |s| s.identity.is_none()).await;

        for _ in 0..50 {
            if store.subscriber_count() == 0 && engine.current_rev().await.is_err() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(store.subscriber_count(), 0);
        assert!(engine.current_rev().await.is_err());
    }

    #[tokio::test]
    async fn engine_without_identity_lists_nothing() {
        let store = Arc::new(MemoryStore::with_projects(vec![project("alice", "t1", 1)]));
        let (engine, _events) = Engine::start(store.clone(), Arc::new(EchoGenerator));

        engine
            .apply_client_action(ClientAction::LoadProject {
                project_id: fractal_api::ProjectId("t1".to_owned()),
            })
            .await
            .unwrap();
        let snapshot = engine.app_snapshot().await.unwrap();
        assert!(snapshot.identity.is_none());
        assert!(snapshot.projects.is_empty());
        assert!(snapshot.editor.prompt.is_empty());
        assert_eq!(store.subscriber_count(), 0);
    }

    #[test]
    fn snapshot_maps_dialog_buttons_to_client_actions() {
        let mut state = AppState::new();
        let _ = state.apply(Action::IdentityChanged {
            identity: Some(Identity::new(OwnerId::new("alice"))),
        });
        let _ = state.apply(Action::ProjectsLoaded {
            generation: state.generation,
            projects: vec![project("alice", "t1", 1)],
        });
        let _ = state.apply(Action::DeleteProject {
            project_id: ProjectId::new("t1"),
        });

        let snapshot = app_snapshot(&state, 7);
        let dialog = snapshot.dialog.expect("dialog");
        assert_eq!(dialog.severity, fractal_api::DialogSeverity::Warning);
        let actions = dialog
            .actions
            .into_iter()
            .map(|a| a.action)
            .collect::<Vec<_>>();
        assert_eq!(actions, vec![
            ClientAction::DismissDialog,
            ClientAction::ConfirmDeleteProject {
                project_id: fractal_api::ProjectId("t1".to_owned()),
            },
        ]);
        assert_eq!(snapshot.rev, 7);
        assert_eq!(snapshot.subscription, SubscriptionSnapshot::Pending);
    }
}
