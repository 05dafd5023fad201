use axum::Json;
use serde::Serialize;

use crate::audit::{
    AccountingStandard, AuditFocus, AuditorRole, Choice, ComplianceRequirement, Sector,
};

/// The fixed option sets a front end needs to render the form.
#[derive(Debug, Serialize)]
pub struct FormOptions {
    pub sectors: Vec<&'static str>,
    pub standards: Vec<&'static str>,
    pub roles: Vec<&'static str>,
    pub default_role: &'static str,
    pub compliance_requirements: Vec<&'static str>,
    pub audit_focus: Vec<&'static str>,
}

pub async fn form_options() -> Json<FormOptions> {
    Json(FormOptions {
        sectors: Sector::labels(),
        standards: AccountingStandard::labels(),
        roles: AuditorRole::labels(),
        default_role: AuditorRole::default().label(),
        compliance_requirements: ComplianceRequirement::labels(),
        audit_focus: AuditFocus::labels(),
    })
}
