use std::sync::Arc;
use tokio::sync::RwLock;

use crate::config::Config;
use crate::db::Store;
use crate::mailer::{LogMailer, Mailer, SmtpMailer};
use crate::services::{AccountService, AuditService, CredentialIssuer, PasswordResetService};

#[derive(Clone)]
pub struct SharedState {
    pub config: Arc<RwLock<Config>>,

    pub store: Store,

    pub accounts: AccountService,

    pub password_reset: PasswordResetService,

    pub audit: AuditService,

    pub credentials: CredentialIssuer,
}

impl SharedState {
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let mailer: Arc<dyn Mailer> = if config.email.enabled {
            Arc::new(SmtpMailer::from_config(&config.email)?)
        } else {
            Arc::new(LogMailer::default())
        };

        Self::with_mailer(config, mailer).await
    }

    /// Wire the state with an explicit mailer (tests inject a recording one).
    pub async fn with_mailer(config: Config, mailer: Arc<dyn Mailer>) -> anyhow::Result<Self> {
        let store = Store::with_pool_options(
            &config.general.database_path,
            config.general.max_db_connections,
            config.general.min_db_connections,
        )
        .await?;

        let audit = AuditService::new(store.clone());
        let accounts = AccountService::new(store.clone(), audit.clone());
        let password_reset = PasswordResetService::new(
            store.clone(),
            mailer,
            config.email.frontend_url.trim_end_matches('/').to_string(),
        );
        let credentials = CredentialIssuer::new(
            &config.security.jwt_secret,
            config.security.access_ttl_minutes,
            config.security.refresh_ttl_days,
        );

        Ok(Self {
            config: Arc::new(RwLock::new(config)),
            store,
            accounts,
            password_reset,
            audit,
            credentials,
        })
    }
}
