//! Form input types and their validation rules.
//!
//! Each form deserializes from submitted fields, and `clean` trims the text
//! inputs and returns every field-level problem at once. Checks that need
//! storage (email / username uniqueness) are layered on by the account
//! service using the same [`FormErrors`] collection.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use validator::{Validate, ValidationErrors};

use crate::constants::*;
use crate::password::Password;
use crate::user::{User, UserRole};

static USERNAME_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[\w.@+-]+$").unwrap());

// =============================================================================
// FormErrors
// =============================================================================

/// Field name to messages, in the order the problems were found.
///
/// Non-field problems are stored under [`NON_FIELD_ERRORS`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormErrors {
    entries: Vec<(String, Vec<String>)>,
}

impl FormErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shorthand for a collection holding a single field error
    pub fn single(field: &str, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.add(field, message);
        errors
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        let message = message.into();
        match self.entries.iter_mut().find(|(name, _)| name == field) {
            Some((_, messages)) => messages.push(message),
            None => self.entries.push((field.to_string(), vec![message])),
        }
    }

    pub fn add_non_field(&mut self, message: impl Into<String>) {
        self.add(NON_FIELD_ERRORS, message);
    }

    pub fn extend(&mut self, other: FormErrors) {
        for (field, messages) in other.entries {
            for message in messages {
                self.add(&field, message);
            }
        }
    }

    pub fn has(&self, field: &str) -> bool {
        self.entries.iter().any(|(name, _)| name == field)
    }

    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.entries
            .iter()
            .find(|(name, _)| name == field)
            .map(|(_, messages)| messages.as_slice())
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// `Ok(())` when nothing was recorded
    pub fn into_result(self) -> Result<(), FormErrors> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.entries
            .iter()
            .map(|(name, messages)| (name.as_str(), messages.as_slice()))
    }

    /// Flash-style lines: `"Field: message"`, or the bare message for
    /// non-field errors.
    pub fn notifications(&self) -> Vec<String> {
        let mut lines = Vec::new();
        for (field, messages) in self.iter() {
            for message in messages {
                if field == NON_FIELD_ERRORS {
                    lines.push(message.clone());
                } else {
                    lines.push(format!("{}: {}", title_case(field), message));
                }
            }
        }
        lines
    }
}

impl std::fmt::Display for FormErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.notifications().join("; "))
    }
}

impl Serialize for FormErrors {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (field, messages) in &self.entries {
            map.serialize_entry(field, messages)?;
        }
        map.end()
    }
}

impl From<ValidationErrors> for FormErrors {
    fn from(errors: ValidationErrors) -> Self {
        let mut form_errors = FormErrors::new();
        for (field, field_errors) in errors.field_errors() {
            for error in field_errors.iter() {
                let message = match error.code.as_ref() {
                    "length" => match error.params.get("max") {
                        Some(max) => {
                            format!("Ensure this value has at most {} characters.", max)
                        }
                        None => MSG_REQUIRED.to_string(),
                    },
                    "email" => MSG_INVALID_EMAIL.to_string(),
                    _ => error
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| error.code.to_string()),
                };
                form_errors.add(&field.to_string(), message);
            }
        }
        form_errors
    }
}

/// Capitalize the first letter of every alphabetic run, lowercase the rest.
fn title_case(field: &str) -> String {
    let mut out = String::with_capacity(field.len());
    let mut prev_is_letter = false;
    for c in field.chars() {
        if c.is_alphabetic() {
            if prev_is_letter {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            prev_is_letter = true;
        } else {
            out.push(c);
            prev_is_letter = false;
        }
    }
    out
}

fn trim_in_place(value: &mut String) {
    let trimmed = value.trim();
    if trimmed.len() != value.len() {
        *value = trimmed.to_string();
    }
}

/// Flag empty required fields, then merge validator output for the rest,
/// in field order. A missing field reports only the "required" message.
fn collect(required: &[(&str, &String)], validated: Result<(), ValidationErrors>) -> FormErrors {
    let validated = validated.err().map(FormErrors::from).unwrap_or_default();

    let mut errors = FormErrors::new();
    for (field, value) in required {
        if value.is_empty() {
            errors.add(field, MSG_REQUIRED);
        } else if let Some(messages) = validated.get(field) {
            for message in messages {
                errors.add(field, message.clone());
            }
        }
    }
    errors
}

// =============================================================================
// Signup
// =============================================================================

/// Registration form
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct SignupForm {
    #[validate(length(max = MAX_USERNAME_LENGTH))]
    pub username: String,
    #[validate(email, length(max = MAX_EMAIL_LENGTH))]
    pub email: String,
    #[serde(skip_serializing)]
    pub password1: String,
    #[serde(skip_serializing)]
    pub password2: String,
    pub user_type: String,
    #[validate(length(max = MAX_NAME_LENGTH))]
    pub first_name: String,
    #[validate(length(max = MAX_NAME_LENGTH))]
    pub last_name: String,
    #[validate(length(max = MAX_ADDRESS_LINE_LENGTH))]
    pub address_line1: String,
    #[validate(length(max = MAX_CITY_LENGTH))]
    pub city: String,
    #[validate(length(max = MAX_STATE_LENGTH))]
    pub state: String,
    #[validate(length(max = MAX_PINCODE_LENGTH))]
    pub pincode: String,
}

impl SignupForm {
    /// Trim text inputs and collect every problem that needs no storage lookup.
    pub fn clean(&mut self) -> FormErrors {
        for value in [
            &mut self.username,
            &mut self.email,
            &mut self.user_type,
            &mut self.first_name,
            &mut self.last_name,
            &mut self.address_line1,
            &mut self.city,
            &mut self.state,
            &mut self.pincode,
        ] {
            trim_in_place(value);
        }

        let mut errors = collect(
            &[
                ("username", &self.username),
                ("email", &self.email),
                ("password1", &self.password1),
                ("password2", &self.password2),
                ("user_type", &self.user_type),
                ("first_name", &self.first_name),
                ("last_name", &self.last_name),
                ("address_line1", &self.address_line1),
                ("city", &self.city),
                ("state", &self.state),
                ("pincode", &self.pincode),
            ],
            self.validate(),
        );

        if !self.username.is_empty() && !USERNAME_RE.is_match(&self.username) {
            errors.add("username", MSG_INVALID_USERNAME);
        }
        if !self.user_type.is_empty() && self.role().is_none() {
            errors.add("user_type", MSG_INVALID_CHOICE);
        }

        if !self.password1.is_empty() && !self.password2.is_empty() {
            if self.password1 != self.password2 {
                errors.add_non_field(MSG_PASSWORD_MISMATCH);
            } else {
                for problem in Password::strength_errors(&self.password2) {
                    errors.add("password2", problem);
                }
            }
        }

        errors
    }

    /// Parsed role, if `user_type` holds a valid choice
    pub fn role(&self) -> Option<UserRole> {
        self.user_type.parse().ok()
    }
}

// =============================================================================
// Login
// =============================================================================

/// Login form. Credentials are checked by the account service.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct LoginForm {
    #[validate(length(max = MAX_USERNAME_LENGTH))]
    pub username: String,
    #[serde(skip_serializing)]
    pub password: String,
}

impl LoginForm {
    pub fn clean(&mut self) -> FormErrors {
        trim_in_place(&mut self.username);
        collect(
            &[("username", &self.username), ("password", &self.password)],
            self.validate(),
        )
    }
}

// =============================================================================
// Profile edit
// =============================================================================

/// Profile edit form. Username, password and role are not editable.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct ProfileForm {
    #[validate(length(max = MAX_NAME_LENGTH))]
    pub first_name: String,
    #[validate(length(max = MAX_NAME_LENGTH))]
    pub last_name: String,
    #[validate(email, length(max = MAX_EMAIL_LENGTH))]
    pub email: String,
    #[validate(length(max = MAX_ADDRESS_LINE_LENGTH))]
    pub address_line1: String,
    #[validate(length(max = MAX_CITY_LENGTH))]
    pub city: String,
    #[validate(length(max = MAX_STATE_LENGTH))]
    pub state: String,
    #[validate(length(max = MAX_PINCODE_LENGTH))]
    pub pincode: String,
    /// Checkbox asking to remove the current picture
    #[serde(rename = "profile_picture-clear", skip_serializing)]
    pub clear_picture: Option<String>,
}

impl ProfileForm {
    pub fn clean(&mut self) -> FormErrors {
        for value in [
            &mut self.first_name,
            &mut self.last_name,
            &mut self.email,
            &mut self.address_line1,
            &mut self.city,
            &mut self.state,
            &mut self.pincode,
        ] {
            trim_in_place(value);
        }

        collect(
            &[
                ("first_name", &self.first_name),
                ("last_name", &self.last_name),
                ("email", &self.email),
                ("address_line1", &self.address_line1),
                ("city", &self.city),
                ("state", &self.state),
                ("pincode", &self.pincode),
            ],
            self.validate(),
        )
    }

    /// Whether the clear checkbox was ticked
    pub fn wants_clear(&self) -> bool {
        matches!(self.clear_picture.as_deref(), Some(v) if !v.is_empty() && v != "off" && v != "false")
    }
}

impl From<&User> for ProfileForm {
    fn from(user: &User) -> Self {
        Self {
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            email: user.email.clone(),
            address_line1: user.address_line1.clone(),
            city: user.city.clone(),
            state: user.state.clone(),
            pincode: user.pincode.clone(),
            clear_picture: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_signup() -> SignupForm {
        SignupForm {
            username: "drjane".to_string(),
            email: "jane@example.com".to_string(),
            password1: "Str0ngPass!".to_string(),
            password2: "Str0ngPass!".to_string(),
            user_type: "doctor".to_string(),
            first_name: "Jane".to_string(),
            last_name: "Doe".to_string(),
            address_line1: "1 Main Street".to_string(),
            city: "Springfield".to_string(),
            state: "IL".to_string(),
            pincode: "62701".to_string(),
        }
    }

    #[test]
    fn test_valid_signup_has_no_errors() {
        let mut form = valid_signup();
        assert!(form.clean().is_empty());
        assert_eq!(form.role(), Some(UserRole::Doctor));
    }

    #[test]
    fn test_missing_fields_report_required() {
        let mut form = SignupForm::default();
        let errors = form.clean();
        assert_eq!(errors.get("username"), Some(&[MSG_REQUIRED.to_string()][..]));
        assert_eq!(errors.get("email"), Some(&[MSG_REQUIRED.to_string()][..]));
        assert!(errors.has("pincode"));
        assert!(!errors.has(NON_FIELD_ERRORS));
    }

    #[test]
    fn test_password_mismatch_reported_with_other_errors() {
        let mut form = valid_signup();
        form.email = "not-an-email".to_string();
        form.password2 = "Different1!".to_string();

        let errors = form.clean();
        assert_eq!(
            errors.get("email"),
            Some(&[MSG_INVALID_EMAIL.to_string()][..])
        );
        assert_eq!(
            errors.get(NON_FIELD_ERRORS),
            Some(&[MSG_PASSWORD_MISMATCH.to_string()][..])
        );
    }

    #[test]
    fn test_weak_password_flags_confirmation_field() {
        let mut form = valid_signup();
        form.password1 = "12345678".to_string();
        form.password2 = "12345678".to_string();

        let errors = form.clean();
        assert_eq!(
            errors.get("password2"),
            Some(&[MSG_PASSWORD_NUMERIC.to_string()][..])
        );
    }

    #[test]
    fn test_invalid_role_and_username() {
        let mut form = valid_signup();
        form.user_type = "admin".to_string();
        form.username = "bad name!".to_string();

        let errors = form.clean();
        assert_eq!(
            errors.get("user_type"),
            Some(&[MSG_INVALID_CHOICE.to_string()][..])
        );
        assert_eq!(
            errors.get("username"),
            Some(&[MSG_INVALID_USERNAME.to_string()][..])
        );
    }

    #[test]
    fn test_length_limits() {
        let mut form = valid_signup();
        form.pincode = "12345678901".to_string();

        let errors = form.clean();
        assert_eq!(
            errors.get("pincode"),
            Some(&["Ensure this value has at most 10 characters.".to_string()][..])
        );
    }

    #[test]
    fn test_inputs_are_trimmed() {
        let mut form = valid_signup();
        form.city = "  Springfield  ".to_string();
        assert!(form.clean().is_empty());
        assert_eq!(form.city, "Springfield");
    }

    #[test]
    fn test_login_requires_both_fields() {
        let mut form = LoginForm::default();
        let errors = form.clean();
        assert!(errors.has("username"));
        assert!(errors.has("password"));
    }

    #[test]
    fn test_profile_clear_checkbox() {
        let mut form = ProfileForm::default();
        assert!(!form.wants_clear());
        form.clear_picture = Some("on".to_string());
        assert!(form.wants_clear());
    }

    #[test]
    fn test_notifications_format() {
        let mut errors = FormErrors::new();
        errors.add("address_line1", MSG_REQUIRED);
        errors.add_non_field(MSG_PASSWORD_MISMATCH);

        assert_eq!(
            errors.notifications(),
            vec![
                format!("Address_Line1: {}", MSG_REQUIRED),
                MSG_PASSWORD_MISMATCH.to_string(),
            ]
        );
    }

    #[test]
    fn test_errors_serialize_in_insertion_order() {
        let mut errors = FormErrors::new();
        errors.add("username", "a");
        errors.add("email", "b");
        errors.add("username", "c");

        let json = serde_json::to_string(&errors).unwrap();
        assert_eq!(json, r#"{"username":["a","c"],"email":["b"]}"#);
    }
}
