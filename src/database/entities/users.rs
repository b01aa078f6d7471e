use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// A user, created on first successful login for a given provider identity.
///
/// One record per `(provider, provider_user_id)`; records are never mutated
/// beyond `last_login` and never deleted by this system.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub provider: String,
    pub provider_user_id: String,
    pub username: String,
    pub email: Option<String>,
    pub created_at: DateTime<Utc>,
    pub last_login: Option<DateTime<Utc>>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl Default for Model {
    fn default() -> Self {
        Self {
            id: 0, // Will be auto-assigned by database
            provider: String::new(),
            provider_user_id: String::new(),
            username: String::new(),
            email: None,
            created_at: Utc::now(),
            last_login: None,
        }
    }
}

impl Model {
    /// Create a new user record with required fields
    pub fn new(
        provider: impl Into<String>,
        provider_user_id: impl Into<String>,
        username: impl Into<String>,
    ) -> Self {
        Self {
            provider: provider.into(),
            provider_user_id: provider_user_id.into(),
            username: username.into(),
            ..Default::default()
        }
    }

    /// Builder method to set email
    pub fn with_email(mut self, email: Option<String>) -> Self {
        self.email = email;
        self
    }

    /// Builder method to set last login
    pub fn with_last_login(mut self, last_login: DateTime<Utc>) -> Self {
        self.last_login = Some(last_login);
        self
    }

    /// Builder method to set ID (for tests)
    pub fn with_id(mut self, id: i32) -> Self {
        self.id = id;
        self
    }
}
