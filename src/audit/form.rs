use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::model::{
    AccountingStandard, AuditFocus, AuditPeriod, AuditRequest, AuditorRole, Choice,
    ComplianceRequirement, Sector, TeamMember,
};

/// Raw form submission. Every field is optional at this stage so that a
/// single validation pass can report all problems at once.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AuditPlanForm {
    pub company_name: Option<String>,
    pub sector: Option<String>,
    pub standards: Option<String>,
    pub team: Vec<TeamMemberInput>,
    pub about_company: Option<String>,
    pub audit_start_date: Option<String>,
    pub audit_end_date: Option<String>,
    pub compliance_requirements: Vec<String>,
    pub audit_focus: Vec<String>,
    pub special_considerations: Option<String>,
}

/// A team member given either as a bare name or as `{name, role}`.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum TeamMemberInput {
    Name(String),
    Member {
        name: String,
        #[serde(default)]
        role: Option<String>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors(Vec<FieldError>);

impl ValidationErrors {
    pub fn push(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.push(FieldError {
            field: field.into(),
            message: message.into(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn fields(&self) -> &[FieldError] {
        &self.0
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.iter().any(|e| e.field == field)
    }
}

impl std::fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let joined = self
            .0
            .iter()
            .map(|e| format!("{}: {}", e.field, e.message))
            .collect::<Vec<_>>()
            .join("; ");
        f.write_str(&joined)
    }
}

impl AuditPlanForm {
    #[tracing::instrument(name = "form.validate", skip_all, fields(form.errors))]
    pub fn validate(self) -> Result<AuditRequest, ValidationErrors> {
        let mut errors = ValidationErrors::default();

        let company_name = non_blank(self.company_name);
        if company_name.is_none() {
            errors.push("company_name", "Please enter a company name");
        }

        let sector = match non_blank(self.sector) {
            Some(raw) => {
                let parsed = Sector::parse(&raw);
                if parsed.is_none() {
                    errors.push("sector", format!("Unknown sector {raw:?}"));
                }
                parsed
            }
            None => {
                errors.push("sector", "Please choose a sector");
                None
            }
        };

        let standards = match non_blank(self.standards) {
            Some(raw) => {
                let parsed = AccountingStandard::parse(&raw);
                if parsed.is_none() {
                    errors.push(
                        "standards",
                        format!(
                            "Unknown accounting standard {raw:?}, expected one of: {}",
                            AccountingStandard::labels().join(", ")
                        ),
                    );
                }
                parsed
            }
            None => {
                errors.push("standards", "Please choose an accounting standard");
                None
            }
        };

        let team = validate_team(self.team, &mut errors);

        let audit_period = validate_period(
            non_blank(self.audit_start_date),
            non_blank(self.audit_end_date),
            &mut errors,
        );

        let compliance_requirements = parse_choices::<ComplianceRequirement>(
            "compliance_requirements",
            &self.compliance_requirements,
            &mut errors,
        );
        let audit_focus =
            parse_choices::<AuditFocus>("audit_focus", &self.audit_focus, &mut errors);

        tracing::Span::current().record("form.errors", errors.fields().len());

        match (company_name, sector, standards) {
            (Some(company_name), Some(sector), Some(standards)) if errors.is_empty() => {
                Ok(AuditRequest::new(
                    company_name,
                    sector,
                    standards,
                    team,
                    non_blank(self.about_company).unwrap_or_default(),
                    audit_period,
                    compliance_requirements,
                    audit_focus,
                    non_blank(self.special_considerations).unwrap_or_default(),
                ))
            }
            _ => Err(errors),
        }
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn validate_team(input: Vec<TeamMemberInput>, errors: &mut ValidationErrors) -> Vec<TeamMember> {
    if input.is_empty() {
        errors.push("team", "Please add at least one auditor to the team");
        return Vec::new();
    }

    let mut team = Vec::with_capacity(input.len());
    for (index, member) in input.into_iter().enumerate() {
        let (name, role) = match member {
            TeamMemberInput::Name(name) => (name, None),
            TeamMemberInput::Member { name, role } => (name, role),
        };

        let name = name.trim().to_string();
        if name.is_empty() {
            errors.push(format!("team[{index}].name"), "Auditor name is required");
        }

        let role = match non_blank(role) {
            Some(raw) => match AuditorRole::parse(&raw) {
                Some(role) => role,
                None => {
                    errors.push(format!("team[{index}].role"), format!("Unknown role {raw:?}"));
                    AuditorRole::default()
                }
            },
            None => AuditorRole::default(),
        };

        team.push(TeamMember { name, role });
    }
    team
}

fn validate_period(
    start: Option<String>,
    end: Option<String>,
    errors: &mut ValidationErrors,
) -> Option<AuditPeriod> {
    let parse = |field: &str, raw: &str, errors: &mut ValidationErrors| {
        NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .map_err(|_| errors.push(field, "Invalid date, use YYYY-MM-DD"))
            .ok()
    };

    match (start, end) {
        (None, None) => None,
        (Some(start), Some(end)) => {
            let start = parse("audit_start_date", &start, errors);
            let end = parse("audit_end_date", &end, errors);
            match (start, end) {
                (Some(start), Some(end)) if start > end => {
                    errors.push("audit_end_date", "Audit end date must not precede the start date");
                    None
                }
                (Some(start), Some(end)) => Some(AuditPeriod { start, end }),
                _ => None,
            }
        }
        (Some(_), None) => {
            errors.push("audit_end_date", "Audit end date is required with a start date");
            None
        }
        (None, Some(_)) => {
            errors.push("audit_start_date", "Audit start date is required with an end date");
            None
        }
    }
}

fn parse_choices<T: Choice + PartialEq>(
    field: &str,
    raw: &[String],
    errors: &mut ValidationErrors,
) -> Vec<T> {
    let mut parsed = Vec::with_capacity(raw.len());
    for value in raw {
        match T::parse(value) {
            Some(choice) if !parsed.contains(&choice) => parsed.push(choice),
            Some(_) => {}
            None => errors.push(field, format!("Unknown option {value:?}")),
        }
    }
    parsed
}
