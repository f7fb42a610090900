//! Server-rendered pages.
//!
//! Templates are compiled into the binary and rendered with Handlebars.
//! Every page shares `layout.hbs`, which shows the navigation bar and the
//! drained flash queue.

use handlebars::{Handlebars, TemplateError};
use serde::Serialize;

use common::{AppError, AppResult};
use domain::{Activity, FormErrors, User, NON_FIELD_ERRORS};

use crate::media::MediaStore;
use crate::middleware::Flash;

const PARTIALS: &[(&str, &str)] = &[
    ("layout", include_str!("../../templates/layout.hbs")),
    ("field", include_str!("../../templates/_field.hbs")),
    ("profile_card", include_str!("../../templates/_profile_card.hbs")),
    ("activities", include_str!("../../templates/_activities.hbs")),
];

/// Renderable pages
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    Signup,
    Login,
    DoctorDashboard,
    PatientDashboard,
    EditProfile,
}

impl Page {
    pub const ALL: [Page; 5] = [
        Page::Signup,
        Page::Login,
        Page::DoctorDashboard,
        Page::PatientDashboard,
        Page::EditProfile,
    ];

    fn name(&self) -> &'static str {
        match self {
            Page::Signup => "signup",
            Page::Login => "login",
            Page::DoctorDashboard => "doctor_dashboard",
            Page::PatientDashboard => "patient_dashboard",
            Page::EditProfile => "edit_profile",
        }
    }

    fn source(&self) -> &'static str {
        match self {
            Page::Signup => include_str!("../../templates/signup.hbs"),
            Page::Login => include_str!("../../templates/login.hbs"),
            Page::DoctorDashboard => include_str!("../../templates/doctor_dashboard.hbs"),
            Page::PatientDashboard => include_str!("../../templates/patient_dashboard.hbs"),
            Page::EditProfile => include_str!("../../templates/edit_profile.hbs"),
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Page::Signup => "Sign up",
            Page::Login => "Log in",
            Page::DoctorDashboard => "Doctor dashboard",
            Page::PatientDashboard => "Patient dashboard",
            Page::EditProfile => "Edit profile",
        }
    }
}

/// Compiled template registry.
pub struct Views {
    registry: Handlebars<'static>,
}

impl Views {
    pub fn new() -> Result<Self, TemplateError> {
        let mut registry = Handlebars::new();
        registry.set_strict_mode(false);

        for (name, source) in PARTIALS {
            registry.register_partial(name, *source)?;
        }
        for page in Page::ALL {
            registry.register_template_string(page.name(), page.source())?;
        }

        Ok(Self { registry })
    }

    pub fn render<T: Serialize>(&self, page: Page, context: &PageContext<'_, T>) -> AppResult<String> {
        self.registry
            .render(page.name(), context)
            .map_err(|e| AppError::internal(format!("Failed to render {}: {}", page.name(), e)))
    }
}

/// Values every page receives, plus the page-specific body.
#[derive(Debug, Serialize)]
pub struct PageContext<'a, T: Serialize> {
    pub title: &'static str,
    pub user: Option<UserView>,
    pub flashes: Vec<Flash>,
    #[serde(flatten)]
    pub body: &'a T,
}

/// Template-facing projection of a user.
#[derive(Debug, Clone, Serialize)]
pub struct UserView {
    pub username: String,
    pub email: String,
    pub role: &'static str,
    pub role_label: &'static str,
    pub first_name: String,
    pub last_name: String,
    pub full_name: String,
    pub picture_url: Option<String>,
    pub address_line1: String,
    pub city: String,
    pub state: String,
    pub pincode: String,
}

impl UserView {
    pub fn new(user: &User, media: &MediaStore) -> Self {
        Self {
            username: user.username.clone(),
            email: user.email.clone(),
            role: user.role.as_str(),
            role_label: user.role.label(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            full_name: user.full_name(),
            picture_url: user.profile_picture.as_deref().map(|p| media.url(p)),
            address_line1: user.address_line1.clone(),
            city: user.city.clone(),
            state: user.state.clone(),
            pincode: user.pincode.clone(),
        }
    }
}

/// Bound form: submitted values with their errors.
#[derive(Debug, Serialize)]
pub struct FormView<'a, F: Serialize> {
    pub values: &'a F,
    pub errors: &'a FormErrors,
    pub non_field_errors: &'a [String],
}

impl<'a, F: Serialize> FormView<'a, F> {
    pub fn new(values: &'a F, errors: &'a FormErrors) -> Self {
        Self {
            values,
            errors,
            non_field_errors: errors.get(NON_FIELD_ERRORS).unwrap_or(&[]),
        }
    }
}

/// Body for pages showing a single form
#[derive(Debug, Serialize)]
pub struct FormPage<'a, F: Serialize> {
    pub form: FormView<'a, F>,
}

/// Body for both dashboards
#[derive(Debug, Serialize)]
pub struct DashboardPage {
    pub address: String,
    pub activities: &'static [Activity],
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::{recent_activities, LoginForm, UserRole, MSG_REQUIRED};

    #[test]
    fn test_all_templates_compile() {
        assert!(Views::new().is_ok());
    }

    #[test]
    fn test_login_page_shows_errors_and_flashes() {
        let views = Views::new().unwrap();
        let form = LoginForm {
            username: "<script>".to_string(),
            password: String::new(),
        };
        let errors = FormErrors::single("password", MSG_REQUIRED);
        let body = FormPage {
            form: FormView::new(&form, &errors),
        };
        let context = PageContext {
            title: Page::Login.title(),
            user: None,
            flashes: vec![Flash {
                level: crate::middleware::FlashLevel::Error,
                message: "Invalid username or password.".to_string(),
            }],
            body: &body,
        };

        let html = views.render(Page::Login, &context).unwrap();
        assert!(html.contains(MSG_REQUIRED));
        assert!(html.contains("alert-error"));
        assert!(html.contains("&lt;script&gt;"));
    }

    #[test]
    fn test_dashboard_lists_activities() {
        let views = Views::new().unwrap();
        let body = DashboardPage {
            address: "1 Main Street, Springfield, IL - 62701".to_string(),
            activities: recent_activities(UserRole::Patient),
        };
        let context = PageContext {
            title: Page::PatientDashboard.title(),
            user: None,
            flashes: Vec::new(),
            body: &body,
        };

        let html = views.render(Page::PatientDashboard, &context).unwrap();
        assert!(html.contains("Lab test results ready"));
        assert!(html.contains("1 Main Street, Springfield, IL - 62701"));
    }
}
