//! Test utilities for database and server testing.
//!
//! Sets up in-memory SQLite databases with migrations applied and spawns the
//! app on a random local port, with platform endpoints pointed at a mock
//! server.

use anyhow::{Context, Result};
use migration::{Migrator, MigratorTrait};
use sea_orm::{Database, DatabaseConnection};
use std::sync::Arc;
use tokio::{net::TcpListener, sync::oneshot, task::JoinHandle};
use uuid::Uuid;

use stagesync::config::AppConfig;
use stagesync::repositories::connection::TokenGrant;
use stagesync::repositories::{ConnectionRepository, UserRepository};
use stagesync::server::{create_app, AppState};

/// Sets up an in-memory SQLite database with all migrations applied.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = Database::connect("sqlite::memory:").await?;
    Migrator::up(&db, None).await?;
    Ok(db)
}

/// Test configuration with every platform's endpoints pointed at `mock_base`
/// and credentials filled in.
pub fn test_config(mock_base: &str) -> AppConfig {
    let mut config = AppConfig {
        profile: "test".to_string(),
        session_signing_key: "integration-test-signing-key".to_string(),
        ..AppConfig::default()
    };

    for (slug, platform) in [
        ("spotify", &mut config.spotify),
        ("youtube", &mut config.youtube),
        ("melon", &mut config.melon),
        ("genie", &mut config.genie),
        ("bugs", &mut config.bugs),
    ] {
        platform.client_id = Some(format!("{slug}-client-id"));
        platform.client_secret = Some(format!("{slug}-client-secret"));
        platform.token_base = Some(mock_base.to_string());
        platform.api_base = Some(mock_base.to_string());
    }

    config
}

pub struct TestServerHandle {
    shutdown_tx: Option<oneshot::Sender<()>>,
    join_handle: Option<JoinHandle<Result<()>>>,
}

impl TestServerHandle {
    fn new(shutdown_tx: oneshot::Sender<()>, join_handle: JoinHandle<Result<()>>) -> Self {
        Self {
            shutdown_tx: Some(shutdown_tx),
            join_handle: Some(join_handle),
        }
    }

    pub async fn shutdown(mut self) -> Result<()> {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.join_handle.take() {
            handle.await.context("server task join failed")??;
        }
        Ok(())
    }
}

/// Spawns the app on a random port with a fresh in-memory database.
pub async fn spawn_test_app(
    config: AppConfig,
) -> Result<(String, Arc<DatabaseConnection>, TestServerHandle)> {
    let db = setup_test_db().await?;
    let state = AppState::new(config, db);
    let db = Arc::clone(&state.db);
    let app = create_app(state);

    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    let server_url = format!("http://{}", addr);

    let (ready_tx, ready_rx) = oneshot::channel();
    let (shutdown_tx, shutdown_rx) = oneshot::channel();

    let server_task = tokio::spawn(async move {
        let server = axum::serve(listener, app).with_graceful_shutdown(async {
            let _ = shutdown_rx.await;
        });
        let _ = ready_tx.send(());
        server.await.context("axum server error")
    });

    ready_rx.await.expect("server task to signal readiness");

    Ok((server_url, db, TestServerHandle::new(shutdown_tx, server_task)))
}

/// Creates a user row and returns its id.
#[allow(dead_code)]
pub async fn create_test_user(db: &Arc<DatabaseConnection>, email: &str) -> Result<Uuid> {
    let users = UserRepository::new(Arc::clone(db));
    let user = users.create(email, "Test Artist").await?;
    Ok(user.id)
}

/// Inserts an active connection for (user, platform) and returns its id.
#[allow(dead_code)]
pub async fn create_test_connection(
    db: &Arc<DatabaseConnection>,
    user_id: Uuid,
    platform: stagesync::platforms::Platform,
    access_token: &str,
) -> Result<Uuid> {
    let connections = ConnectionRepository::new(Arc::clone(db));
    let grant = TokenGrant {
        access_token: access_token.to_string(),
        refresh_token: Some("rt-test".to_string()),
        token_expires_at: None,
    };
    let model = connections
        .upsert_active(user_id, platform, "external-test-id", &grant)
        .await?;
    Ok(model.id)
}
