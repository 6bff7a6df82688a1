use crate::{
    error::{AuthError, Result},
    jwt::TokenIssuer,
    model::{Account, AccountUpdate, NewAccount, Role},
    password::{hash_password, verify_password},
};
use chrono::Utc;
use tracing::{info, warn};
use uuid::Uuid;
use workreq_core::Database;

const SELECT_ACCOUNT: &str = "SELECT id, username, password_hash, name, email, unit, role, created_at, updated_at FROM users";

/// Account registration, lookup, mutation and login
#[derive(Debug, Clone)]
pub struct AccountService {
    db: Database,
    tokens: TokenIssuer,
}

impl AccountService {
    pub fn new(db: Database, tokens: TokenIssuer) -> Self {
        Self { db, tokens }
    }

    pub fn tokens(&self) -> &TokenIssuer {
        &self.tokens
    }

    /// Self-service registration. Only the username is pre-checked; a duplicate
    /// email still fails on the store's uniqueness constraint.
    pub async fn register(&self, new: &NewAccount) -> Result<Account> {
        if self.find_by_username(&new.username).await?.is_some() {
            return Err(AuthError::DuplicateUsername);
        }

        self.insert(new).await
    }

    /// Administrative creation: username and email are both pre-checked.
    pub async fn create_by_admin(&self, new: &NewAccount) -> Result<Account> {
        if self.find_by_username(&new.username).await?.is_some() {
            return Err(AuthError::DuplicateUsername);
        }
        if self.find_by_email(&new.email).await?.is_some() {
            return Err(AuthError::DuplicateEmail);
        }

        self.insert(new).await
    }

    async fn insert(&self, new: &NewAccount) -> Result<Account> {
        let password_hash = hash_password(&new.password)?;
        let now = Utc::now();

        let account = Account {
            id: Uuid::new_v4().to_string(),
            username: new.username.clone(),
            password_hash,
            name: new.name.clone(),
            email: new.email.clone(),
            unit: new.unit.clone(),
            role: new.role,
            created_at: now,
            updated_at: now,
        };

        sqlx::query(
            "INSERT INTO users (id, username, password_hash, name, email, unit, role, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&account.id)
        .bind(&account.username)
        .bind(&account.password_hash)
        .bind(&account.name)
        .bind(&account.email)
        .bind(&account.unit)
        .bind(account.role.as_str())
        .bind(account.created_at)
        .bind(account.updated_at)
        .execute(self.db.pool())
        .await
        .map_err(map_unique_violation)?;

        info!(account_id = %account.id, username = %account.username, role = %account.role, "Created account");
        Ok(account)
    }

    /// Verify credentials and issue a token.
    ///
    /// An unknown username and a wrong password produce the same error.
    pub async fn login(&self, username: &str, password: &str) -> Result<(String, Account)> {
        let Some(account) = self.find_by_username(username).await? else {
            warn!(username, "Login failed");
            return Err(AuthError::InvalidCredentials);
        };

        if !verify_password(password, &account.password_hash) {
            warn!(username, "Login failed");
            return Err(AuthError::InvalidCredentials);
        }

        let token = self.tokens.issue(&account.id, &account.username, account.role)?;
        info!(account_id = %account.id, username, "Login successful");

        Ok((token, account))
    }

    pub async fn get(&self, id: &str) -> Result<Account> {
        self.find_by_id(id).await?.ok_or(AuthError::NotFound)
    }

    /// All accounts, newest first
    pub async fn list(&self) -> Result<Vec<Account>> {
        let accounts = sqlx::query_as::<_, Account>(&format!("{SELECT_ACCOUNT} ORDER BY created_at DESC"))
            .fetch_all(self.db.pool())
            .await?;
        Ok(accounts)
    }

    /// Apply a partial profile update. A changed email is re-checked against all other accounts.
    pub async fn update(&self, id: &str, changes: &AccountUpdate) -> Result<Account> {
        let mut account = self.get(id).await?;

        if let Some(name) = non_empty(&changes.name) {
            account.name = name.to_string();
        }
        if let Some(email) = non_empty(&changes.email) {
            if email != account.email {
                if let Some(other) = self.find_by_email(email).await? {
                    if other.id != account.id {
                        return Err(AuthError::DuplicateEmail);
                    }
                }
            }
            account.email = email.to_string();
        }
        if let Some(unit) = non_empty(&changes.unit) {
            account.unit = unit.to_string();
        }
        if let Some(role) = changes.role {
            account.role = role;
        }
        account.updated_at = Utc::now();

        sqlx::query("UPDATE users SET name = ?, email = ?, unit = ?, role = ?, updated_at = ? WHERE id = ?")
            .bind(&account.name)
            .bind(&account.email)
            .bind(&account.unit)
            .bind(account.role.as_str())
            .bind(account.updated_at)
            .bind(&account.id)
            .execute(self.db.pool())
            .await
            .map_err(map_unique_violation)?;

        info!(account_id = %account.id, "Updated account");
        Ok(account)
    }

    /// Replace an account's password
    pub async fn set_password(&self, id: &str, password: &str) -> Result<()> {
        let password_hash = hash_password(password)?;

        let result = sqlx::query("UPDATE users SET password_hash = ?, updated_at = ? WHERE id = ?")
            .bind(password_hash)
            .bind(Utc::now())
            .bind(id)
            .execute(self.db.pool())
            .await?;

        if result.rows_affected() == 0 {
            return Err(AuthError::NotFound);
        }
        Ok(())
    }

    /// Remove an account immediately. Requests naming this account are left as they are.
    pub async fn delete(&self, id: &str) -> Result<()> {
        let result = sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(id)
            .execute(self.db.pool())
            .await?;

        if result.rows_affected() == 0 {
            return Err(AuthError::NotFound);
        }

        info!(account_id = %id, "Deleted account");
        Ok(())
    }

    pub async fn count(&self) -> Result<i64> {
        let count = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(self.db.pool())
            .await?;
        Ok(count)
    }

    pub async fn count_by_role(&self, role: Role) -> Result<i64> {
        let count = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE role = ?")
            .bind(role.as_str())
            .fetch_one(self.db.pool())
            .await?;
        Ok(count)
    }

    pub async fn find_by_id(&self, id: &str) -> Result<Option<Account>> {
        self.find_one("id", id).await
    }

    pub async fn find_by_username(&self, username: &str) -> Result<Option<Account>> {
        self.find_one("username", username).await
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<Account>> {
        self.find_one("email", email).await
    }

    async fn find_one(&self, column: &'static str, value: &str) -> Result<Option<Account>> {
        let account = sqlx::query_as::<_, Account>(&format!("{SELECT_ACCOUNT} WHERE {column} = ? LIMIT 1"))
            .bind(value)
            .fetch_optional(self.db.pool())
            .await?;
        Ok(account)
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

/// Translate a UNIQUE constraint failure into the matching domain error.
fn map_unique_violation(err: sqlx::Error) -> AuthError {
    if let Some(db_err) = err.as_database_error() {
        if db_err.is_unique_violation() {
            let message = db_err.message();
            if message.contains("users.username") {
                return AuthError::DuplicateUsername;
            }
            if message.contains("users.email") {
                return AuthError::DuplicateEmail;
            }
        }
    }
    AuthError::Database(err)
}
