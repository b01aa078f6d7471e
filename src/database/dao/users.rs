use crate::database::entities::{UserRecord, users};
use crate::database::{DatabaseError, DatabaseResult};
use chrono::Utc;
use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ActiveModelTrait, ActiveValue, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait,
    QueryFilter, Set,
};

/// Users DAO for database operations
#[derive(Clone)]
pub struct UsersDao {
    db: DatabaseConnection,
}

impl UsersDao {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Find the user for an external identity, creating it on first login.
    ///
    /// Idempotent on `(provider, provider_user_id)`: repeated logins with the
    /// same identity update `username`, `email` and `last_login` on the
    /// existing record instead of inserting a second one.
    pub async fn find_or_create(&self, user: &UserRecord) -> DatabaseResult<UserRecord> {
        let active_model = users::ActiveModel {
            id: ActiveValue::NotSet, // Let database auto-assign ID
            provider: Set(user.provider.clone()),
            provider_user_id: Set(user.provider_user_id.clone()),
            username: Set(user.username.clone()),
            email: Set(user.email.clone()),
            created_at: Set(user.created_at),
            last_login: Set(Some(Utc::now())),
        };

        let on_conflict =
            OnConflict::columns([users::Column::Provider, users::Column::ProviderUserId])
                .update_columns([
                    users::Column::Username,
                    users::Column::Email,
                    users::Column::LastLogin,
                ])
                .to_owned();

        users::Entity::insert(active_model)
            .on_conflict(on_conflict)
            .exec(&self.db)
            .await
            .map_err(|e| DatabaseError::Database(e.to_string()))?;

        // Re-read so both the insert and update paths return the stored row.
        self.find_by_provider(&user.provider, &user.provider_user_id)
            .await?
            .ok_or(DatabaseError::NotFound)
    }

    /// Find user by provider and provider user ID
    pub async fn find_by_provider(
        &self,
        provider: &str,
        provider_user_id: &str,
    ) -> DatabaseResult<Option<UserRecord>> {
        let user = users::Entity::find()
            .filter(users::Column::Provider.eq(provider))
            .filter(users::Column::ProviderUserId.eq(provider_user_id))
            .one(&self.db)
            .await
            .map_err(|e| DatabaseError::Database(e.to_string()))?;

        Ok(user)
    }

    /// Find user by ID
    pub async fn find_by_id(&self, user_id: i32) -> DatabaseResult<Option<UserRecord>> {
        let user = users::Entity::find_by_id(user_id)
            .one(&self.db)
            .await
            .map_err(|e| DatabaseError::Database(e.to_string()))?;

        Ok(user)
    }

    /// Update last login timestamp
    pub async fn update_last_login(&self, user_id: i32) -> DatabaseResult<UserRecord> {
        let active_model = users::ActiveModel {
            id: Set(user_id),
            last_login: Set(Some(Utc::now())),
            ..Default::default()
        };

        let updated_user = active_model
            .update(&self.db)
            .await
            .map_err(|e| DatabaseError::Database(e.to_string()))?;

        Ok(updated_user)
    }

    /// Count all user records
    pub async fn count(&self) -> DatabaseResult<u64> {
        users::Entity::find()
            .count(&self.db)
            .await
            .map_err(|e| DatabaseError::Database(e.to_string()))
    }
}
