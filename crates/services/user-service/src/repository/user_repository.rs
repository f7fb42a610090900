//! User repository backed by SeaORM.

use async_trait::async_trait;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, Set, SqlErr,
};
use uuid::Uuid;

use super::entities::user::{self, ActiveModel, Entity as UserEntity};
use crate::infra::migrations::USERNAME_UNIQUE_INDEX;
use common::{AppError, AppResult};
use domain::{
    FormErrors, NewUser, PictureChange, ProfileChanges, User, MSG_EMAIL_IN_USE, MSG_USERNAME_TAKEN,
};

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// User repository trait for dependency injection.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Find user by ID
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<User>>;

    /// Find user by exact username
    async fn find_by_username(&self, username: &str) -> AppResult<Option<User>>;

    /// Whether any user other than `exclude` holds this email
    async fn email_in_use(&self, email: &str, exclude: Option<Uuid>) -> AppResult<bool>;

    /// Whether any user holds this username
    async fn username_in_use(&self, username: &str) -> AppResult<bool>;

    /// Insert a new user
    async fn create(&self, data: NewUser) -> AppResult<User>;

    /// Apply profile edits to an existing user
    async fn update_profile(&self, id: Uuid, changes: ProfileChanges) -> AppResult<User>;

    /// Check storage connectivity
    async fn ping(&self) -> AppResult<()>;
}

/// Concrete implementation of UserRepository
pub struct UserStore {
    db: DatabaseConnection,
}

impl UserStore {
    /// Create new repository instance
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

/// Map a unique index violation back onto the form field it guards.
fn map_write_error(err: DbErr) -> AppError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(detail)) => {
            if detail.contains(USERNAME_UNIQUE_INDEX) || detail.contains("username") {
                AppError::Form(FormErrors::single("username", MSG_USERNAME_TAKEN))
            } else {
                AppError::Form(FormErrors::single("email", MSG_EMAIL_IN_USE))
            }
        }
        _ => AppError::from(err),
    }
}

#[async_trait]
impl UserRepository for UserStore {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<User>> {
        UserEntity::find_by_id(id)
            .one(&self.db)
            .await?
            .map(User::try_from)
            .transpose()
    }

    async fn find_by_username(&self, username: &str) -> AppResult<Option<User>> {
        UserEntity::find()
            .filter(user::Column::Username.eq(username))
            .one(&self.db)
            .await?
            .map(User::try_from)
            .transpose()
    }

    async fn email_in_use(&self, email: &str, exclude: Option<Uuid>) -> AppResult<bool> {
        let mut query = UserEntity::find().filter(user::Column::Email.eq(email));
        if let Some(id) = exclude {
            query = query.filter(user::Column::Id.ne(id));
        }

        Ok(query.count(&self.db).await? > 0)
    }

    async fn username_in_use(&self, username: &str) -> AppResult<bool> {
        let count = UserEntity::find()
            .filter(user::Column::Username.eq(username))
            .count(&self.db)
            .await?;

        Ok(count > 0)
    }

    async fn create(&self, data: NewUser) -> AppResult<User> {
        let now = chrono::Utc::now();
        let active_model = ActiveModel {
            id: Set(Uuid::new_v4()),
            username: Set(data.username),
            email: Set(data.email),
            password_hash: Set(data.password_hash),
            role: Set(data.role.to_string()),
            first_name: Set(data.first_name),
            last_name: Set(data.last_name),
            profile_picture: Set(data.profile_picture),
            address_line1: Set(data.address_line1),
            city: Set(data.city),
            state: Set(data.state),
            pincode: Set(data.pincode),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let model = active_model.insert(&self.db).await.map_err(map_write_error)?;
        User::try_from(model)
    }

    async fn update_profile(&self, id: Uuid, changes: ProfileChanges) -> AppResult<User> {
        let user = UserEntity::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or(AppError::NotFound)?;

        let mut active: ActiveModel = user.into();
        active.first_name = Set(changes.first_name);
        active.last_name = Set(changes.last_name);
        active.email = Set(changes.email);
        active.address_line1 = Set(changes.address_line1);
        active.city = Set(changes.city);
        active.state = Set(changes.state);
        active.pincode = Set(changes.pincode);
        match changes.picture {
            PictureChange::Keep => {}
            PictureChange::Replace(path) => active.profile_picture = Set(Some(path)),
            PictureChange::Clear => active.profile_picture = Set(None),
        }
        active.updated_at = Set(chrono::Utc::now());

        let model = active.update(&self.db).await.map_err(map_write_error)?;
        User::try_from(model)
    }

    async fn ping(&self) -> AppResult<()> {
        crate::infra::ping(&self.db).await?;
        Ok(())
    }
}
