use crate::accounts::{Account, hash_password, normalize_email, verify_password};
use crate::subscriptions::Subscriptions;
use crate::time::{unix_epoch_micros_now, unix_epoch_millis_now};
use anyhow::{Context as _, anyhow};
use fractal_domain::{
    OwnerId, Project, ProjectChange, ProjectChangeSink, ProjectDraft, ProjectId, SubscriptionId,
};
use rand::{Rng as _, rngs::OsRng};
use rusqlite::{Connection, OptionalExtension as _, params};
use std::path::{Path, PathBuf};
use std::sync::{Arc, mpsc};

const LATEST_SCHEMA_VERSION: u32 = 2;

const MIGRATIONS: &[(u32, &str)] = &[
    (
        1,
        include_str!(concat!(
            env!("CARGO_MANIFEST_DIR"),
            "/migrations/0001_init.sql"
        )),
    ),
    (
        2,
        include_str!(concat!(
            env!("CARGO_MANIFEST_DIR"),
            "/migrations/0002_accounts.sql"
        )),
    ),
];

/// Project table behind a single worker thread. Subscribers are notified
/// from that thread right after a change commits, so pushes leave in
/// commit order.
#[derive(Clone)]
pub struct SqliteStore {
    tx: mpsc::Sender<DbCommand>,
    subscriptions: Arc<Subscriptions>,
}

enum DbCommand {
    ListProjects {
        owner_id: OwnerId,
        reply: mpsc::Sender<anyhow::Result<Vec<Project>>>,
    },
    InsertProject {
        draft: ProjectDraft,
        reply: mpsc::Sender<anyhow::Result<Project>>,
    },
    DeleteProject {
        project_id: ProjectId,
        reply: mpsc::Sender<anyhow::Result<bool>>,
    },
    CreateAccount {
        email: String,
        password: String,
        reply: mpsc::Sender<anyhow::Result<Option<Account>>>,
    },
    Authenticate {
        email: String,
        password: String,
        reply: mpsc::Sender<anyhow::Result<Option<Account>>>,
    },
}

impl SqliteStore {
    pub fn new(db_path: PathBuf) -> anyhow::Result<Self> {
        let (tx, rx) = mpsc::channel::<DbCommand>();
        let subscriptions = Arc::new(Subscriptions::default());
        let notify = subscriptions.clone();

        std::thread::Builder::new()
            .name("fractal-sqlite".to_owned())
            .spawn(move || {
                let mut db = SqliteDatabase::open(&db_path);
                while let Ok(cmd) = rx.recv() {
                    match (&mut db, cmd) {
                        (Ok(db), DbCommand::ListProjects { owner_id, reply }) => {
                            let _ = reply.send(db.list_projects(&owner_id));
                        }
                        (Ok(db), DbCommand::InsertProject { draft, reply }) => {
                            let inserted = db.insert_project(draft);
                            if let Ok(project) = &inserted {
                                notify.notify(
                                    &project.owner_id,
                                    &ProjectChange::Inserted(project.clone()),
                                );
                            }
                            let _ = reply.send(inserted);
                        }
                        (Ok(db), DbCommand::DeleteProject { project_id, reply }) => {
                            let deleted = db.delete_project(&project_id);
                            if let Ok(Some(owner_id)) = &deleted {
                                notify.notify(owner_id, &ProjectChange::Deleted(project_id));
                            }
                            let _ = reply.send(deleted.map(|owner_id| owner_id.is_some()));
                        }
                        (
                            Ok(db),
                            DbCommand::CreateAccount {
                                email,
                                password,
                                reply,
                            },
                        ) => {
                            let _ = reply.send(db.create_account(&email, &password));
                        }
                        (
                            Ok(db),
                            DbCommand::Authenticate {
                                email,
                                password,
                                reply,
                            },
                        ) => {
                            let _ = reply.send(db.authenticate(&email, &password));
                        }
                        (Err(err), cmd) => {
                            respond_db_open_error(err, cmd);
                        }
                    }
                }
            })
            .context("failed to spawn sqlite worker thread")?;

        Ok(Self { tx, subscriptions })
    }

    pub fn list_projects(&self, owner_id: &OwnerId) -> anyhow::Result<Vec<Project>> {
        let (reply_tx, reply_rx) = mpsc::channel();
        self.tx
            .send(DbCommand::ListProjects {
                owner_id: owner_id.clone(),
                reply: reply_tx,
            })
            .context("sqlite worker is not running")?;
        reply_rx.recv().context("sqlite worker terminated")?
    }

    pub fn insert_project(&self, draft: ProjectDraft) -> anyhow::Result<Project> {
        let (reply_tx, reply_rx) = mpsc::channel();
        self.tx
            .send(DbCommand::InsertProject {
                draft,
                reply: reply_tx,
            })
            .context("sqlite worker is not running")?;
        reply_rx.recv().context("sqlite worker terminated")?
    }

    /// Returns whether a row was removed.
    pub fn delete_project(&self, project_id: &ProjectId) -> anyhow::Result<bool> {
        let (reply_tx, reply_rx) = mpsc::channel();
        self.tx
            .send(DbCommand::DeleteProject {
                project_id: project_id.clone(),
                reply: reply_tx,
            })
            .context("sqlite worker is not running")?;
        reply_rx.recv().context("sqlite worker terminated")?
    }

    /// Returns `None` when the email is already registered.
    pub fn create_account(&self, email: &str, password: &str) -> anyhow::Result<Option<Account>> {
        let (reply_tx, reply_rx) = mpsc::channel();
        self.tx
            .send(DbCommand::CreateAccount {
                email: email.to_owned(),
                password: password.to_owned(),
                reply: reply_tx,
            })
            .context("sqlite worker is not running")?;
        reply_rx.recv().context("sqlite worker terminated")?
    }

    /// Returns `None` for an unknown email or a wrong password.
    pub fn authenticate(&self, email: &str, password: &str) -> anyhow::Result<Option<Account>> {
        let (reply_tx, reply_rx) = mpsc::channel();
        self.tx
            .send(DbCommand::Authenticate {
                email: email.to_owned(),
                password: password.to_owned(),
                reply: reply_tx,
            })
            .context("sqlite worker is not running")?;
        reply_rx.recv().context("sqlite worker terminated")?
    }

    pub fn add_subscription(&self, owner_id: OwnerId, sink: ProjectChangeSink) -> SubscriptionId {
        self.subscriptions.add(owner_id, sink)
    }

    pub fn remove_subscription(&self, subscription: SubscriptionId) -> bool {
        self.subscriptions.remove(subscription)
    }

    #[cfg(test)]
    fn subscription_count(&self) -> usize {
        self.subscriptions.len()
    }
}

fn respond_db_open_error(err: &anyhow::Error, cmd: DbCommand) {
    let message = format!("{err:#}");
    match cmd {
        DbCommand::ListProjects { reply, .. } => {
            let _ = reply.send(Err(anyhow!(message)));
        }
        DbCommand::InsertProject { reply, .. } => {
            let _ = reply.send(Err(anyhow!(message)));
        }
        DbCommand::DeleteProject { reply, .. } => {
            let _ = reply.send(Err(anyhow!(message)));
        }
        DbCommand::CreateAccount { reply, .. } | DbCommand::Authenticate { reply, .. } => {
            let _ = reply.send(Err(anyhow!(message)));
        }
    }
}

struct SqliteDatabase {
    conn: Connection,
}

impl SqliteDatabase {
    fn open(db_path: &Path) -> anyhow::Result<Self> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }

        let mut conn = Connection::open(db_path)
            .with_context(|| format!("failed to open sqlite db {}", db_path.display()))?;

        configure_connection(&mut conn).context("failed to configure sqlite connection")?;
        apply_migrations(&mut conn).context("failed to apply sqlite migrations")?;

        Ok(Self { conn })
    }

    fn list_projects(&mut self, owner_id: &OwnerId) -> anyhow::Result<Vec<Project>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, owner_id, title, prompt, generated_code, is_public, created_at_unix_ms
             FROM projects
             WHERE owner_id = ?1
             ORDER BY created_at_unix_ms DESC, rowid DESC",
        )?;
        let rows = stmt.query_map(params![owner_id.as_str()], project_from_row)?;

        let mut projects = Vec::new();
        for row in rows {
            projects.push(row?);
        }
        Ok(projects)
    }

    fn insert_project(&mut self, draft: ProjectDraft) -> anyhow::Result<Project> {
        let project = Project {
            id: ProjectId::new(new_project_id()),
            owner_id: draft.owner_id,
            title: draft.title,
            prompt: draft.prompt,
            generated_code: draft.generated_code,
            is_public: draft.is_public,
            created_at_unix_ms: unix_epoch_millis_now(),
        };

        self.conn
            .execute(
                "INSERT INTO projects (id, owner_id, title, prompt, generated_code, is_public, created_at_unix_ms)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    project.id.as_str(),
                    project.owner_id.as_str(),
                    project.title,
                    project.prompt,
                    project.generated_code,
                    project.is_public as i64,
                    project.created_at_unix_ms as i64,
                ],
            )
            .context("failed to insert project")?;

        Ok(project)
    }

    /// Returns the owner of the removed row, if there was one.
    fn delete_project(&mut self, project_id: &ProjectId) -> anyhow::Result<Option<OwnerId>> {
        let tx = self.conn.transaction()?;
        let owner_id: Option<String> = tx
            .query_row(
                "SELECT owner_id FROM projects WHERE id = ?1",
                params![project_id.as_str()],
                |row| row.get(0),
            )
            .optional()?;
        if owner_id.is_some() {
            tx.execute(
                "DELETE FROM projects WHERE id = ?1",
                params![project_id.as_str()],
            )
            .context("failed to delete project")?;
        }
        tx.commit()?;

        Ok(owner_id.map(OwnerId::new))
    }
}

impl SqliteDatabase {
    fn create_account(&mut self, email: &str, password: &str) -> anyhow::Result<Option<Account>> {
        let email = normalize_email(email);
        let tx = self.conn.transaction()?;
        let taken = tx
            .query_row(
                "SELECT 1 FROM accounts WHERE email = ?1",
                params![email],
                |_| Ok(()),
            )
            .optional()?
            .is_some();
        if taken {
            return Ok(None);
        }

        let owner_id = OwnerId::new(new_project_id());
        let stored = hash_password(password);
        tx.execute(
            "INSERT INTO accounts (owner_id, email, password_salt, password_hash, created_at_unix_ms)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                owner_id.as_str(),
                email,
                stored.salt,
                stored.hash,
                unix_epoch_millis_now() as i64,
            ],
        )
        .context("failed to insert account")?;
        tx.commit()?;

        Ok(Some(Account { owner_id, email }))
    }

    fn authenticate(&mut self, email: &str, password: &str) -> anyhow::Result<Option<Account>> {
        let email = normalize_email(email);
        let row: Option<(String, String, String)> = self
            .conn
            .query_row(
                "SELECT owner_id, password_salt, password_hash FROM accounts WHERE email = ?1",
                params![email],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )
            .optional()?;

        let Some((owner_id, salt, hash)) = row else {
            return Ok(None);
        };
        if !verify_password(&salt, &hash, password) {
            return Ok(None);
        }
        Ok(Some(Account {
            owner_id: OwnerId::new(owner_id),
            email,
        }))
    }
}

fn project_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Project> {
    Ok(Project {
        id: ProjectId::new(row.get::<_, String>(0)?),
        owner_id: OwnerId::new(row.get::<_, String>(1)?),
        title: row.get(2)?,
        prompt: row.get(3)?,
        generated_code: row.get(4)?,
        is_public: row.get::<_, i64>(5)? != 0,
        created_at_unix_ms: row.get::<_, i64>(6)?.max(0) as u64,
    })
}

fn new_project_id() -> String {
    let micros = unix_epoch_micros_now();
    let rand: u64 = OsRng.r#gen();
    format!("{micros:x}-{rand:016x}")
}

fn configure_connection(conn: &mut Connection) -> anyhow::Result<()> {
    conn.execute_batch(
        "PRAGMA foreign_keys = ON;
         PRAGMA journal_mode = WAL;
         PRAGMA synchronous = NORMAL;
         PRAGMA busy_timeout = 5000;",
    )
    .context("failed to apply sqlite PRAGMAs")?;
    Ok(())
}

fn apply_migrations(conn: &mut Connection) -> anyhow::Result<()> {
    let mut current: u32 = conn
        .query_row("PRAGMA user_version", [], |row| row.get::<_, i64>(0))
        .context("failed to read user_version")? as u32;

    if current > LATEST_SCHEMA_VERSION {
        return Err(anyhow!(
            "sqlite schema version is newer than this build: db={}, app={}",
            current,
            LATEST_SCHEMA_VERSION
        ));
    }

    if current == LATEST_SCHEMA_VERSION {
        return Ok(());
    }

    conn.execute_batch("BEGIN IMMEDIATE;")
        .context("failed to begin migration transaction")?;

    for (version, sql) in MIGRATIONS {
        if *version <= current {
            continue;
        }
        conn.execute_batch(sql)
            .with_context(|| format!("failed to apply migration v{version:04}"))?;
        conn.pragma_update(None, "user_version", *version as i64)
            .context("failed to update user_version")?;
        current = *version;
    }

    conn.execute_batch("COMMIT;")
        .context("failed to commit migration transaction")?;
    Ok(())
}
