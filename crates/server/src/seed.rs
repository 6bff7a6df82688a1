use auth::{Account, AccountService, AccountUpdate, NewAccount, Role};
use tracing::info;
use workreq_core::SeedOperator;

/// Make sure the configured operator account exists and accepts the configured password.
///
/// An existing account with the same username keeps its id and profile; only its
/// password is reset and its role raised to operator.
pub async fn ensure_operator(accounts: &AccountService, seed: &SeedOperator) -> auth::Result<Account> {
    info!(username = %seed.username, "Checking for seed operator account...");

    if let Some(existing) = accounts.find_by_username(&seed.username).await? {
        accounts.set_password(&existing.id, &seed.password).await?;

        let account = if existing.is_operator() {
            existing
        } else {
            let promote = AccountUpdate {
                role: Some(Role::Operator),
                ..Default::default()
            };
            accounts.update(&existing.id, &promote).await?
        };

        info!(account_id = %account.id, "Seed operator already present, password reset");
        return Ok(account);
    }

    let account = accounts
        .create_by_admin(&NewAccount {
            username: seed.username.clone(),
            password: seed.password.clone(),
            name: seed.name.clone(),
            email: seed.email.clone(),
            unit: seed.unit.clone(),
            role: Role::Operator,
        })
        .await?;

    info!(account_id = %account.id, username = %account.username, "Created seed operator account");
    Ok(account)
}
