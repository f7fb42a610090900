//! Recent activity feed shown on the dashboards.

use serde::Serialize;

use crate::user::UserRole;

/// One entry in a dashboard activity feed
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Activity {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub title: &'static str,
    pub time: &'static str,
    pub icon: &'static str,
}

const fn activity(
    kind: &'static str,
    title: &'static str,
    time: &'static str,
    icon: &'static str,
) -> Activity {
    Activity {
        kind,
        title,
        time,
        icon,
    }
}

const DOCTOR_FEED: [Activity; 3] = [
    activity("appointment", "New appointment scheduled", "2 hours ago", "calendar"),
    activity("patient", "New patient registered", "5 hours ago", "user-plus"),
    activity("prescription", "Prescription reviewed", "1 day ago", "file-medical"),
];

const PATIENT_FEED: [Activity; 3] = [
    activity("appointment", "Upcoming appointment tomorrow", "In 1 day", "calendar"),
    activity("prescription", "New prescription added", "2 days ago", "pills"),
    activity("test", "Lab test results ready", "3 days ago", "flask"),
];

/// Fixed feed for the given role. Placeholder data, not derived from records.
pub fn recent_activities(role: UserRole) -> &'static [Activity] {
    match role {
        UserRole::Doctor => &DOCTOR_FEED,
        UserRole::Patient => &PATIENT_FEED,
    }
}
