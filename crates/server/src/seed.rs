//! Startup import of JSON fixtures and the bootstrap admin account.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use api::aggregates::{refresh_average_cost, refresh_average_rating};
use api::resources::{BOOTCAMPS, COURSES, REVIEWS};
use auth::{AuthError, AuthService, Role, USERS, User};
use devcamper_core::SeedConfig;
use serde::Deserialize;
use storage::{CollectionStore, Document, StorageError, document_id, to_document};
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum SeedError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid fixture {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Auth(#[from] AuthError),
}

/// Records imported per collection.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SeedReport {
    pub bootcamps: usize,
    pub courses: usize,
    pub reviews: usize,
    pub users: usize,
}

/// Account fixture. Passwords are given in plain text and hashed on import.
#[derive(Debug, Deserialize)]
struct FixtureUser {
    #[serde(default, alias = "_id")]
    id: Option<String>,
    name: String,
    email: String,
    password: String,
    #[serde(default)]
    role: Role,
}

async fn read_fixture<T: for<'de> Deserialize<'de>>(dir: &Path, name: &str) -> Result<Vec<T>, SeedError> {
    let path = dir.join(name);
    let text = match tokio::fs::read_to_string(&path).await {
        Ok(text) => text,
        Err(err) if err.kind() == ErrorKind::NotFound => {
            debug!(path = %path.display(), "no fixture file");
            return Ok(Vec::new());
        }
        Err(source) => return Err(SeedError::Read { path, source }),
    };
    serde_json::from_str(&text).map_err(|source| SeedError::Parse { path, source })
}

/// Fixtures may carry `_id`; stored documents use `id`.
fn normalize(mut document: Document) -> Document {
    if let Some(id) = document.remove("_id") {
        document.entry("id").or_insert(id);
    }
    document
}

async fn import_documents(
    store: &dyn CollectionStore,
    dir: &Path,
    collection: &str,
) -> Result<Vec<Document>, SeedError> {
    let fixtures: Vec<Document> = read_fixture(dir, &format!("{collection}.json")).await?;
    let mut stored = Vec::with_capacity(fixtures.len());
    for document in fixtures {
        stored.push(store.insert(collection, normalize(document)).await?);
    }
    Ok(stored)
}

async fn import_users(store: &dyn CollectionStore, dir: &Path) -> Result<usize, SeedError> {
    let fixtures: Vec<FixtureUser> = read_fixture(dir, "users.json").await?;
    let count = fixtures.len();
    for fixture in fixtures {
        let mut user = User::new(&fixture.name, &fixture.email, fixture.role, &fixture.password)?;
        if let Some(id) = fixture.id {
            user.id = id;
        }
        store.insert(USERS, to_document(&user)?).await?;
    }
    Ok(count)
}

/// Import every fixture under `data_dir`, refresh bootcamp averages, then make
/// sure the configured admin account exists.
pub async fn run(
    store: &dyn CollectionStore,
    auth: &AuthService,
    config: &SeedConfig,
) -> Result<SeedReport, SeedError> {
    let mut report = SeedReport::default();

    if let Some(dir) = &config.data_dir {
        info!(dir = %dir.display(), "importing fixtures");
        report.users = import_users(store, dir).await?;

        let bootcamps = import_documents(store, dir, BOOTCAMPS.collection).await?;
        report.courses = import_documents(store, dir, COURSES.collection).await?.len();
        report.reviews = import_documents(store, dir, REVIEWS.collection).await?.len();
        report.bootcamps = bootcamps.len();

        for id in bootcamps.iter().filter_map(document_id) {
            refresh_average_cost(store, id).await?;
            refresh_average_rating(store, id).await?;
        }
    }

    if let (Some(email), Some(password)) = (&config.admin_email, &config.admin_password) {
        let admin = auth.ensure_admin(email, password).await?;
        info!(user_id = %admin.id, "admin account ready");
    }

    Ok(report)
}
