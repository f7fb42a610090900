//! Domain layer - Core business entities and value objects.
//!
//! This crate contains pure domain logic with no infrastructure dependencies:
//! users and roles, password hashing, form rules and the dashboard feed.

pub mod activity;
pub mod constants;
pub mod error;
pub mod forms;
pub mod password;
pub mod user;

pub use activity::{recent_activities, Activity};
pub use constants::*;
pub use error::{DomainError, DomainResult};
pub use forms::{FormErrors, LoginForm, ProfileForm, SignupForm};
pub use password::Password;
pub use user::{NewUser, PictureChange, ProfileChanges, User, UserRole};
