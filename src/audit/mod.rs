pub mod form;
pub mod model;
pub mod prompt;

pub use form::{AuditPlanForm, FieldError, TeamMemberInput, ValidationErrors};
pub use model::{
    AccountingStandard, AuditFocus, AuditPeriod, AuditPlanText, AuditRequest, AuditorRole, Choice,
    ComplianceRequirement, Sector, TeamMember,
};
