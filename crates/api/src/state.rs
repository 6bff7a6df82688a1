use auth::{AccountService, TokenIssuer};
use requests::RequestService;
use std::time::Duration;
use workreq_core::{AppConfig, Database, PolicyConfig};

/// Application state shared across all handlers
#[derive(Debug, Clone)]
pub struct AppState {
    pub accounts: AccountService,
    pub requests: RequestService,
    pub tokens: TokenIssuer,
    pub policy: PolicyConfig,
    pub request_timeout: Duration,
}

impl AppState {
    pub fn new(db: Database, config: &AppConfig) -> Self {
        let tokens = TokenIssuer::from_config(&config.auth);

        Self {
            accounts: AccountService::new(db.clone(), tokens.clone()),
            requests: RequestService::new(db),
            tokens,
            policy: config.policy.clone(),
            request_timeout: config.server.request_timeout(),
        }
    }
}
