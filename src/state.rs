use std::sync::Arc;

use axum::extract::FromRef;

use crate::auth::service::AuthService;
use crate::auth::store::{PgUserStore, UserStore};
use crate::auth::token::TokenKeys;
use crate::config::AppConfig;
use crate::mailer::{LogMailer, Mailer};

#[derive(Clone)]
pub struct AppState {
    pub auth: AuthService,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);

        let pool = sqlx::postgres::PgPoolOptions::new()
            .max_connections(10)
            .connect(&config.database_url)
            .await?;

        // Run migrations if present
        if let Err(e) = sqlx::migrate!("./migrations").run(&pool).await {
            tracing::warn!(error = %e, "migrations folder not found or migration failed; continuing");
        }

        let auth = AuthService::new(
            Arc::new(PgUserStore::new(pool)),
            Arc::new(LogMailer),
            TokenKeys::from_config(&config.token),
            config.reset_password_url.clone(),
        );

        Ok(Self { auth, config })
    }

    /// State wired to in-memory collaborators, for tests.
    pub fn fake() -> Self {
        Self::fake_with(
            Arc::new(crate::testing::MemoryUserStore::default()),
            Arc::new(crate::testing::RecordingMailer::default()),
        )
    }

    /// Like `fake`, but with caller-held collaborators so tests can inspect
    /// stored users and recorded mail.
    pub fn fake_with(store: Arc<dyn UserStore>, mailer: Arc<dyn Mailer>) -> Self {
        let config = Arc::new(crate::testing::test_config());
        let auth = AuthService::new(
            store,
            mailer,
            TokenKeys::from_config(&config.token),
            config.reset_password_url.clone(),
        );
        Self { auth, config }
    }
}

impl FromRef<AppState> for AuthService {
    fn from_ref(state: &AppState) -> Self {
        state.auth.clone()
    }
}
