//! User domain entity and related types.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::constants::{MSG_INVALID_CHOICE, ROLE_DOCTOR, ROLE_PATIENT};
use crate::error::DomainError;

/// User roles enumeration
///
/// A role is chosen once at signup and never changes afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Doctor,
    Patient,
}

impl UserRole {
    /// Stored / submitted representation of the role
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Doctor => ROLE_DOCTOR,
            UserRole::Patient => ROLE_PATIENT,
        }
    }

    /// Human-readable label used in templates
    pub fn label(&self) -> &'static str {
        match self {
            UserRole::Doctor => "Doctor",
            UserRole::Patient => "Patient",
        }
    }

    pub fn is_doctor(&self) -> bool {
        matches!(self, UserRole::Doctor)
    }
}

impl FromStr for UserRole {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            ROLE_DOCTOR => Ok(UserRole::Doctor),
            ROLE_PATIENT => Ok(UserRole::Patient),
            _ => Err(DomainError::validation(MSG_INVALID_CHOICE)),
        }
    }
}

impl From<UserRole> for String {
    fn from(role: UserRole) -> Self {
        role.as_str().to_string()
    }
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// User domain entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: UserRole,
    pub first_name: String,
    pub last_name: String,
    /// Path relative to the media root, e.g. `profile_pictures/<uuid>.png`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile_picture: Option<String>,
    pub address_line1: String,
    pub city: String,
    pub state: String,
    pub pincode: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Build a fresh user record from validated registration data
    pub fn new(id: Uuid, data: NewUser) -> Self {
        let now = Utc::now();
        Self {
            id,
            username: data.username,
            email: data.email,
            password_hash: data.password_hash,
            role: data.role,
            first_name: data.first_name,
            last_name: data.last_name,
            profile_picture: data.profile_picture,
            address_line1: data.address_line1,
            city: data.city,
            state: data.state,
            pincode: data.pincode,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_doctor(&self) -> bool {
        self.role.is_doctor()
    }

    /// First and last name joined by a space, trimmed
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }

    /// Single-line postal address: `line1, city, state - pincode`
    pub fn formatted_address(&self) -> String {
        format!(
            "{}, {}, {} - {}",
            self.address_line1, self.city, self.state, self.pincode
        )
    }

    /// Apply validated profile changes. Username, password and role are untouched.
    pub fn apply_changes(&mut self, changes: ProfileChanges) {
        self.first_name = changes.first_name;
        self.last_name = changes.last_name;
        self.email = changes.email;
        self.address_line1 = changes.address_line1;
        self.city = changes.city;
        self.state = changes.state;
        self.pincode = changes.pincode;
        match changes.picture {
            PictureChange::Keep => {}
            PictureChange::Replace(path) => self.profile_picture = Some(path),
            PictureChange::Clear => self.profile_picture = None,
        }
        self.updated_at = Utc::now();
    }
}

/// Validated data for inserting a user
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub role: UserRole,
    pub first_name: String,
    pub last_name: String,
    pub profile_picture: Option<String>,
    pub address_line1: String,
    pub city: String,
    pub state: String,
    pub pincode: String,
}

/// What to do with the stored profile picture on a profile update
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum PictureChange {
    #[default]
    Keep,
    Replace(String),
    Clear,
}

/// Validated profile edits
#[derive(Debug, Clone)]
pub struct ProfileChanges {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub address_line1: String,
    pub city: String,
    pub state: String,
    pub pincode: String,
    pub picture: PictureChange,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(role: UserRole) -> User {
        User::new(
            Uuid::new_v4(),
            NewUser {
                username: "asha".to_string(),
                email: "asha@example.com".to_string(),
                password_hash: "hash".to_string(),
                role,
                first_name: "Asha".to_string(),
                last_name: "Rao".to_string(),
                profile_picture: Some("profile_pictures/a.png".to_string()),
                address_line1: "12 MG Road".to_string(),
                city: "Pune".to_string(),
                state: "MH".to_string(),
                pincode: "411001".to_string(),
            },
        )
    }

    #[test]
    fn test_role_parsing() {
        assert_eq!("doctor".parse::<UserRole>().unwrap(), UserRole::Doctor);
        assert_eq!("patient".parse::<UserRole>().unwrap(), UserRole::Patient);
        assert!("admin".parse::<UserRole>().is_err());
        assert!("Doctor".parse::<UserRole>().is_err());
    }

    #[test]
    fn test_role_display_round_trips_storage_value() {
        assert_eq!(UserRole::Doctor.to_string(), "doctor");
        assert_eq!(String::from(UserRole::Patient), "patient");
    }

    #[test]
    fn test_full_name_and_address() {
        let user = sample(UserRole::Patient);
        assert_eq!(user.full_name(), "Asha Rao");
        assert_eq!(user.formatted_address(), "12 MG Road, Pune, MH - 411001");
    }

    #[test]
    fn test_full_name_trims_missing_part() {
        let mut user = sample(UserRole::Patient);
        user.last_name.clear();
        assert_eq!(user.full_name(), "Asha");
    }

    #[test]
    fn test_apply_changes_keeps_identity() {
        let mut user = sample(UserRole::Doctor);
        user.apply_changes(ProfileChanges {
            first_name: "A".to_string(),
            last_name: "B".to_string(),
            email: "new@example.com".to_string(),
            address_line1: "1 Street".to_string(),
            city: "C".to_string(),
            state: "S".to_string(),
            pincode: "1".to_string(),
            picture: PictureChange::Clear,
        });

        assert_eq!(user.username, "asha");
        assert_eq!(user.role, UserRole::Doctor);
        assert_eq!(user.email, "new@example.com");
        assert!(user.profile_picture.is_none());
    }

    #[test]
    fn test_keep_picture() {
        let mut user = sample(UserRole::Doctor);
        user.apply_changes(ProfileChanges {
            first_name: "A".to_string(),
            last_name: "B".to_string(),
            email: "asha@example.com".to_string(),
            address_line1: "1 Street".to_string(),
            city: "C".to_string(),
            state: "S".to_string(),
            pincode: "1".to_string(),
            picture: PictureChange::Keep,
        });
        assert_eq!(
            user.profile_picture.as_deref(),
            Some("profile_pictures/a.png")
        );
    }

    #[test]
    fn test_password_hash_not_serialized() {
        let json = serde_json::to_value(sample(UserRole::Doctor)).unwrap();
        assert!(json.get("password_hash").is_none());
        assert_eq!(json["role"], "doctor");
    }
}
