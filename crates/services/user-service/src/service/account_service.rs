//! Account service - registration, login and profile use cases.

use std::sync::Arc;

use async_trait::async_trait;
use once_cell::sync::Lazy;
use tracing::{info, warn};
use uuid::Uuid;

use common::{AppError, AppResult};
use domain::{
    FormErrors, LoginForm, NewUser, Password, PictureChange, ProfileChanges, ProfileForm,
    SignupForm, User, MSG_EMAIL_IN_USE, MSG_USERNAME_TAKEN,
};

use crate::repository::UserRepository;

/// Hash verified when the username is unknown, so a miss costs the same as a
/// wrong password.
static DUMMY_PASSWORD: Lazy<Option<Password>> =
    Lazy::new(|| Password::new("dummy-password-never-matches").ok());

/// Account service trait for dependency injection.
#[async_trait]
pub trait AccountService: Send + Sync {
    /// Clean a signup form and add uniqueness problems.
    async fn check_signup(&self, form: &mut SignupForm) -> AppResult<FormErrors>;

    /// Create an account from a form that passed [`check_signup`] cleanly.
    /// `picture` is an already stored media path. A username or email taken
    /// since the check surfaces as a form error from the unique indexes.
    ///
    /// [`check_signup`]: AccountService::check_signup
    async fn register(&self, form: SignupForm, picture: Option<String>) -> AppResult<User>;

    /// Check login credentials. Any mismatch is `InvalidCredentials`.
    async fn authenticate(&self, form: &LoginForm) -> AppResult<User>;

    /// Look up a user by ID
    async fn get_user(&self, id: Uuid) -> AppResult<Option<User>>;

    /// Clean a profile form; email uniqueness ignores the user's own record.
    async fn check_profile(&self, user_id: Uuid, form: &mut ProfileForm) -> AppResult<FormErrors>;

    /// Persist edits from a form that passed [`check_profile`] cleanly.
    ///
    /// [`check_profile`]: AccountService::check_profile
    async fn update_profile(
        &self,
        user_id: Uuid,
        form: ProfileForm,
        picture: PictureChange,
    ) -> AppResult<User>;

    /// Check storage connectivity
    async fn ping(&self) -> AppResult<()>;
}

/// Concrete implementation of AccountService using repository.
pub struct AccountManager {
    repo: Arc<dyn UserRepository>,
}

impl AccountManager {
    /// Create new account service instance with repository
    pub fn new(repo: Arc<dyn UserRepository>) -> Self {
        Self { repo }
    }
}

#[async_trait]
impl AccountService for AccountManager {
    async fn check_signup(&self, form: &mut SignupForm) -> AppResult<FormErrors> {
        let mut errors = form.clean();

        if !errors.has("username") && self.repo.username_in_use(&form.username).await? {
            errors.add("username", MSG_USERNAME_TAKEN);
        }
        if !errors.has("email") && self.repo.email_in_use(&form.email, None).await? {
            errors.add("email", MSG_EMAIL_IN_USE);
        }

        Ok(errors)
    }

    async fn register(&self, form: SignupForm, picture: Option<String>) -> AppResult<User> {
        let role = form
            .role()
            .ok_or_else(|| AppError::internal("validated signup form without a role"))?;
        let password_hash = Password::new(&form.password1)?.into_string();

        let user = self
            .repo
            .create(NewUser {
                username: form.username,
                email: form.email,
                password_hash,
                role,
                first_name: form.first_name,
                last_name: form.last_name,
                profile_picture: picture,
                address_line1: form.address_line1,
                city: form.city,
                state: form.state,
                pincode: form.pincode,
            })
            .await?;

        info!(user_id = %user.id, role = %user.role, "Account created");
        Ok(user)
    }

    async fn authenticate(&self, form: &LoginForm) -> AppResult<User> {
        let user = self.repo.find_by_username(&form.username).await?;

        let verified = match &user {
            Some(user) => Password::from_hash(user.password_hash.as_str()).verify(&form.password),
            None => {
                if let Some(dummy) = DUMMY_PASSWORD.as_ref() {
                    dummy.verify(&form.password);
                }
                false
            }
        };

        match user {
            Some(user) if verified => Ok(user),
            _ => {
                warn!(username = %form.username, "Failed login attempt");
                Err(AppError::InvalidCredentials)
            }
        }
    }

    async fn get_user(&self, id: Uuid) -> AppResult<Option<User>> {
        self.repo.find_by_id(id).await
    }

    async fn check_profile(&self, user_id: Uuid, form: &mut ProfileForm) -> AppResult<FormErrors> {
        let mut errors = form.clean();

        if !errors.has("email") && self.repo.email_in_use(&form.email, Some(user_id)).await? {
            errors.add("email", MSG_EMAIL_IN_USE);
        }

        Ok(errors)
    }

    async fn update_profile(
        &self,
        user_id: Uuid,
        form: ProfileForm,
        picture: PictureChange,
    ) -> AppResult<User> {
        let user = self
            .repo
            .update_profile(
                user_id,
                ProfileChanges {
                    first_name: form.first_name,
                    last_name: form.last_name,
                    email: form.email,
                    address_line1: form.address_line1,
                    city: form.city,
                    state: form.state,
                    pincode: form.pincode,
                    picture,
                },
            )
            .await?;

        info!(user_id = %user.id, "Profile updated");
        Ok(user)
    }

    async fn ping(&self) -> AppResult<()> {
        self.repo.ping().await
    }
}
