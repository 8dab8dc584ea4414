//! Direct MongoDB access for checks that must look behind the API: stored
//! password hashes and todo flags. Only used when `MONGO_URL` is configured.

use anyhow::{Context, Result};
use mongodb::bson::{Document, doc};
use mongodb::{Client, Collection, Database};
use tracing::debug;

pub struct UserStore {
    db: Database,
}

impl UserStore {
    /// Connect to `url`. The database named in the URL wins over `fallback_name`.
    pub async fn connect(url: &str, fallback_name: &str) -> Result<Self> {
        let client = Client::with_uri_str(url)
            .await
            .context("failed to connect to MongoDB")?;
        let db = client
            .default_database()
            .unwrap_or_else(|| client.database(fallback_name));
        debug!(database = %db.name(), "connected to MongoDB");
        Ok(Self { db })
    }

    fn users(&self) -> Collection<Document> {
        self.db.collection("users")
    }

    fn todos(&self) -> Collection<Document> {
        self.db.collection("todos")
    }

    /// Id of any user whose email differs from `email`.
    pub async fn find_user_excluding(&self, email: &str) -> Result<Option<String>> {
        let user = self
            .users()
            .find_one(doc! { "email": { "$ne": email } })
            .await
            .context("users lookup failed")?;
        Ok(user.and_then(|d| d.get_str("id").ok().map(str::to_string)))
    }

    pub async fn password_hash(&self, user_id: &str) -> Result<Option<String>> {
        let user = self
            .users()
            .find_one(doc! { "id": user_id })
            .await
            .context("users lookup failed")?;
        Ok(user.and_then(|d| d.get_str("password").ok().map(str::to_string)))
    }

    /// Write back a previously captured hash. Returns false when no user matched.
    pub async fn restore_password_hash(&self, user_id: &str, hash: &str) -> Result<bool> {
        let result = self
            .users()
            .update_one(doc! { "id": user_id }, doc! { "$set": { "password": hash } })
            .await
            .context("password restore failed")?;
        Ok(result.matched_count > 0)
    }

    /// The stored `convertedToLog` flag of a todo, `None` when the todo is absent.
    pub async fn todo_converted(&self, todo_id: &str) -> Result<Option<bool>> {
        let todo = self
            .todos()
            .find_one(doc! { "id": todo_id })
            .await
            .context("todos lookup failed")?;
        Ok(todo.map(|d| d.get_bool("convertedToLog").unwrap_or(false)))
    }
}

/// bcrypt hashes as written by bcryptjs / libxcrypt.
pub fn is_bcrypt_hash(hash: &str) -> bool {
    hash.starts_with("$2a$") || hash.starts_with("$2b$")
}
