//! Domain-level constants.
//!
//! These constants define business rules and validation requirements.

// =============================================================================
// User Roles
// =============================================================================

/// Role value stored for doctors
pub const ROLE_DOCTOR: &str = "doctor";

/// Role value stored for patients
pub const ROLE_PATIENT: &str = "patient";

// =============================================================================
// Field Limits
// =============================================================================

pub const MAX_USERNAME_LENGTH: u64 = 150;
pub const MAX_EMAIL_LENGTH: u64 = 254;
pub const MAX_NAME_LENGTH: u64 = 50;
pub const MAX_ADDRESS_LINE_LENGTH: u64 = 100;
pub const MAX_CITY_LENGTH: u64 = 50;
pub const MAX_STATE_LENGTH: u64 = 50;
pub const MAX_PINCODE_LENGTH: u64 = 10;

/// Minimum password length requirement
pub const MIN_PASSWORD_LENGTH: usize = 8;

// =============================================================================
// Validation Messages
// =============================================================================

pub const MSG_REQUIRED: &str = "This field is required.";
pub const MSG_INVALID_EMAIL: &str = "Enter a valid email address.";
pub const MSG_INVALID_USERNAME: &str =
    "Enter a valid username. This value may contain only letters, numbers, and @/./+/-/_ characters.";
pub const MSG_INVALID_CHOICE: &str = "Select a valid choice.";
pub const MSG_EMAIL_IN_USE: &str = "This email is already in use.";
pub const MSG_USERNAME_TAKEN: &str = "A user with that username already exists.";
pub const MSG_PASSWORD_MISMATCH: &str = "Passwords do not match";
pub const MSG_PASSWORD_NUMERIC: &str = "This password is entirely numeric.";
pub const MSG_INVALID_IMAGE: &str =
    "Upload a valid image. The file you uploaded was either not an image or a corrupted image.";

pub const MSG_PICTURE_CONFLICT: &str =
    "Please either submit a file or check the clear checkbox, not both.";

/// Key under which errors not tied to a single field are reported
pub const NON_FIELD_ERRORS: &str = "__all__";
