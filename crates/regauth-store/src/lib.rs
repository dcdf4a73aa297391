//! regauth Store - SurrealDB document store for user accounts
//!
//! Provides connection management and the `UserStore` implementation backed
//! by a `users` table in SurrealDB.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use regauth_core::{AccountError, DatabaseConfig, Result, User, UserStore};
use serde::{Deserialize, Serialize};
use surrealdb::engine::remote::ws::{Client, Ws};
use surrealdb::opt::auth::Root;
use surrealdb::sql::{Id, Thing};
use surrealdb::Surreal;
use tracing::{debug, info};
use uuid::Uuid;

const USERS_TABLE: &str = "users";

/// SurrealDB user store implementation
pub struct SurrealUserStore {
    client: Surreal<Client>,
}

impl SurrealUserStore {
    /// Create a new SurrealDB connection and make sure the schema exists
    pub async fn connect(config: &DatabaseConfig) -> Result<Self> {
        // Remove ws:// or wss:// prefix if present (surrealdb crate adds it automatically)
        let url = config
            .surrealdb_url
            .strip_prefix("ws://")
            .or_else(|| config.surrealdb_url.strip_prefix("wss://"))
            .unwrap_or(&config.surrealdb_url);

        let client = Surreal::new::<Ws>(url)
            .await
            .map_err(|e| AccountError::DatabaseError(format!("SurrealDB connection failed: {e}")))?;

        client
            .signin(Root {
                username: &config.surrealdb_user,
                password: &config.surrealdb_pass,
            })
            .await
            .map_err(|e| AccountError::DatabaseError(format!("SurrealDB auth failed: {e}")))?;

        client
            .use_ns(&config.surrealdb_namespace)
            .use_db(&config.surrealdb_database)
            .await
            .map_err(|e| AccountError::DatabaseError(format!("SurrealDB namespace error: {e}")))?;

        info!(
            namespace = %config.surrealdb_namespace,
            database = %config.surrealdb_database,
            "Connected to SurrealDB"
        );

        let store = Self { client };
        store.init_schema().await?;
        Ok(store)
    }

    /// Define the users table and its unique indexes
    pub async fn init_schema(&self) -> Result<()> {
        self.client
            .query(
                r#"
                DEFINE TABLE IF NOT EXISTS users SCHEMALESS;
                DEFINE INDEX IF NOT EXISTS users_user_name ON users FIELDS userName UNIQUE;
                DEFINE INDEX IF NOT EXISTS users_email ON users FIELDS email UNIQUE;
            "#,
            )
            .await
            .and_then(|response| response.check())
            .map_err(|e| AccountError::DatabaseError(format!("Schema init failed: {e}")))?;

        debug!("users schema ready");
        Ok(())
    }
}

/// User record for SurrealDB
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UserRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    id: Option<Thing>,
    user_name: String,
    email: String,
    password: String,
    full_name: String,
    created_at: DateTime<Utc>,
}

impl From<User> for UserRecord {
    fn from(user: User) -> Self {
        Self {
            id: None,
            user_name: user.user_name,
            email: user.email,
            password: user.password_hash,
            full_name: user.full_name,
            created_at: user.created_at,
        }
    }
}

impl From<UserRecord> for User {
    fn from(record: UserRecord) -> Self {
        Self {
            id: record.id.map(|thing| record_key(&thing)),
            user_name: record.user_name,
            email: record.email,
            password_hash: record.password,
            full_name: record.full_name,
            created_at: record.created_at,
        }
    }
}

/// Bare key of a record id (`users:abc` -> `abc`)
fn record_key(thing: &Thing) -> String {
    match &thing.id {
        Id::String(key) => key.clone(),
        other => other.to_string(),
    }
}

fn is_unique_violation(message: &str) -> bool {
    message.contains("already contains")
}

#[async_trait]
impl UserStore for SurrealUserStore {
    async fn find_by_username_or_email(&self, username: &str, email: &str) -> Result<Option<User>> {
        if username.is_empty() && email.is_empty() {
            return Ok(None);
        }

        let records: Vec<UserRecord> = self
            .client
            .query(
                "SELECT * FROM users WHERE ($user_name != '' AND userName = $user_name) \
                 OR ($email != '' AND email = $email) LIMIT 1",
            )
            .bind(("user_name", username.to_string()))
            .bind(("email", email.to_string()))
            .await
            .map_err(|e| AccountError::DatabaseError(format!("Query failed: {e}")))?
            .take(0)
            .map_err(|e| AccountError::DatabaseError(format!("Result extraction failed: {e}")))?;

        Ok(records.into_iter().next().map(User::from))
    }

    async fn insert(&self, user: User) -> Result<User> {
        if self
            .find_by_username_or_email(&user.user_name, &user.email)
            .await?
            .is_some()
        {
            return Err(AccountError::Conflict(
                "User with this email or username already exists".to_string(),
            ));
        }

        let key = Uuid::new_v4().to_string();
        let created: Option<UserRecord> = self
            .client
            .create((USERS_TABLE, key))
            .content(UserRecord::from(user))
            .await
            .map_err(|e| {
                let message = e.to_string();
                if is_unique_violation(&message) {
                    AccountError::Conflict(
                        "User with this email or username already exists".to_string(),
                    )
                } else {
                    AccountError::DatabaseError(format!("Failed to create user: {message}"))
                }
            })?;

        created
            .map(User::from)
            .ok_or_else(|| AccountError::DatabaseError("Failed to create user".to_string()))
    }

    async fn ping(&self) -> Result<()> {
        self.client
            .health()
            .await
            .map_err(|e| AccountError::DatabaseError(format!("SurrealDB health check failed: {e}")))
    }
}
