use chrono::NaiveDate;
use serde::Serialize;

/// A value picked from one of the form's fixed option lists.
pub trait Choice: Sized + Copy + 'static {
    const ALL: &'static [Self];

    fn label(self) -> &'static str;

    /// Case-insensitive lookup by label, ignoring surrounding whitespace.
    fn parse(input: &str) -> Option<Self> {
        let needle = input.trim();
        Self::ALL
            .iter()
            .copied()
            .find(|choice| choice.label().eq_ignore_ascii_case(needle))
    }

    fn labels() -> Vec<&'static str> {
        Self::ALL.iter().map(|choice| choice.label()).collect()
    }
}

/// A sector from the catalogue, either a family ("Retail") or a family
/// segment ("Retail - E-commerce").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Sector(&'static str);

impl Choice for Sector {
    const ALL: &'static [Self] = &[
        Sector("Technology"),
        Sector("Technology - Software"),
        Sector("Technology - Hardware"),
        Sector("Healthcare"),
        Sector("Healthcare - Hospitals"),
        Sector("Healthcare - Pharmaceuticals"),
        Sector("Finance"),
        Sector("Finance - Banking"),
        Sector("Finance - Insurance"),
        Sector("Manufacturing"),
        Sector("Manufacturing - Automotive"),
        Sector("Manufacturing - Electronics"),
        Sector("Retail"),
        Sector("Retail - E-commerce"),
        Sector("Retail - Brick & Mortar"),
        Sector("Energy"),
        Sector("Energy - Oil & Gas"),
        Sector("Energy - Renewable"),
        Sector("Real Estate"),
        Sector("Real Estate - Commercial"),
        Sector("Real Estate - Residential"),
        Sector("Telecommunications"),
        Sector("Transportation"),
        Sector("Transportation - Logistics"),
        Sector("Transportation - Airlines"),
        Sector("Other"),
    ];

    fn label(self) -> &'static str {
        self.0
    }
}

impl std::fmt::Display for Sector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AccountingStandard {
    #[serde(rename = "IFRS")]
    Ifrs,
    #[serde(rename = "US GAAP")]
    UsGaap,
}

impl Choice for AccountingStandard {
    const ALL: &'static [Self] = &[Self::Ifrs, Self::UsGaap];

    fn label(self) -> &'static str {
        match self {
            Self::Ifrs => "IFRS",
            Self::UsGaap => "US GAAP",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ComplianceRequirement {
    #[serde(rename = "SOX")]
    Sox,
    #[serde(rename = "GDPR")]
    Gdpr,
    #[serde(rename = "HIPAA")]
    Hipaa,
    #[serde(rename = "PCI DSS")]
    PciDss,
    #[serde(rename = "ISO 27001")]
    Iso27001,
    Other,
}

impl Choice for ComplianceRequirement {
    const ALL: &'static [Self] = &[
        Self::Sox,
        Self::Gdpr,
        Self::Hipaa,
        Self::PciDss,
        Self::Iso27001,
        Self::Other,
    ];

    fn label(self) -> &'static str {
        match self {
            Self::Sox => "SOX",
            Self::Gdpr => "GDPR",
            Self::Hipaa => "HIPAA",
            Self::PciDss => "PCI DSS",
            Self::Iso27001 => "ISO 27001",
            Self::Other => "Other",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AuditFocus {
    #[serde(rename = "Financial Controls")]
    FinancialControls,
    #[serde(rename = "Operational Efficiency")]
    OperationalEfficiency,
    #[serde(rename = "IT Security")]
    ItSecurity,
    Compliance,
    #[serde(rename = "Risk Management")]
    RiskManagement,
    #[serde(rename = "Internal Controls")]
    InternalControls,
}

impl Choice for AuditFocus {
    const ALL: &'static [Self] = &[
        Self::FinancialControls,
        Self::OperationalEfficiency,
        Self::ItSecurity,
        Self::Compliance,
        Self::RiskManagement,
        Self::InternalControls,
    ];

    fn label(self) -> &'static str {
        match self {
            Self::FinancialControls => "Financial Controls",
            Self::OperationalEfficiency => "Operational Efficiency",
            Self::ItSecurity => "IT Security",
            Self::Compliance => "Compliance",
            Self::RiskManagement => "Risk Management",
            Self::InternalControls => "Internal Controls",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum AuditorRole {
    #[default]
    #[serde(rename = "Senior Auditor")]
    SeniorAuditor,
    #[serde(rename = "Lead Auditor")]
    LeadAuditor,
    #[serde(rename = "Internal Auditor")]
    InternalAuditor,
    #[serde(rename = "External Auditor")]
    ExternalAuditor,
    #[serde(rename = "Compliance Officer")]
    ComplianceOfficer,
    #[serde(rename = "Risk Manager")]
    RiskManager,
    #[serde(rename = "IT Auditor")]
    ItAuditor,
    #[serde(rename = "Forensic Auditor")]
    ForensicAuditor,
    #[serde(rename = "Tax Auditor")]
    TaxAuditor,
    #[serde(rename = "Operations Auditor")]
    OperationsAuditor,
}

impl Choice for AuditorRole {
    const ALL: &'static [Self] = &[
        Self::SeniorAuditor,
        Self::LeadAuditor,
        Self::InternalAuditor,
        Self::ExternalAuditor,
        Self::ComplianceOfficer,
        Self::RiskManager,
        Self::ItAuditor,
        Self::ForensicAuditor,
        Self::TaxAuditor,
        Self::OperationsAuditor,
    ];

    fn label(self) -> &'static str {
        match self {
            Self::SeniorAuditor => "Senior Auditor",
            Self::LeadAuditor => "Lead Auditor",
            Self::InternalAuditor => "Internal Auditor",
            Self::ExternalAuditor => "External Auditor",
            Self::ComplianceOfficer => "Compliance Officer",
            Self::RiskManager => "Risk Manager",
            Self::ItAuditor => "IT Auditor",
            Self::ForensicAuditor => "Forensic Auditor",
            Self::TaxAuditor => "Tax Auditor",
            Self::OperationsAuditor => "Operations Auditor",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TeamMember {
    pub name: String,
    pub role: AuditorRole,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AuditPeriod {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl AuditPeriod {
    pub fn describe(&self) -> String {
        format!(
            "{} to {}",
            self.start.format("%B %d, %Y"),
            self.end.format("%B %d, %Y")
        )
    }
}

/// A validated audit request. Only [`crate::audit::AuditPlanForm::validate`]
/// builds one, so every instance has a company name, a catalogued sector and
/// a non-empty team.
#[derive(Debug, Clone, Serialize)]
pub struct AuditRequest {
    company_name: String,
    sector: Sector,
    standards: AccountingStandard,
    team: Vec<TeamMember>,
    about_company: String,
    audit_period: Option<AuditPeriod>,
    compliance_requirements: Vec<ComplianceRequirement>,
    audit_focus: Vec<AuditFocus>,
    special_considerations: String,
}

impl AuditRequest {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        company_name: String,
        sector: Sector,
        standards: AccountingStandard,
        team: Vec<TeamMember>,
        about_company: String,
        audit_period: Option<AuditPeriod>,
        compliance_requirements: Vec<ComplianceRequirement>,
        audit_focus: Vec<AuditFocus>,
        special_considerations: String,
    ) -> Self {
        Self {
            company_name,
            sector,
            standards,
            team,
            about_company,
            audit_period,
            compliance_requirements,
            audit_focus,
            special_considerations,
        }
    }

    pub fn company_name(&self) -> &str {
        &self.company_name
    }

    pub fn sector(&self) -> Sector {
        self.sector
    }

    pub fn standards(&self) -> AccountingStandard {
        self.standards
    }

    pub fn team(&self) -> &[TeamMember] {
        &self.team
    }

    pub fn about_company(&self) -> &str {
        &self.about_company
    }

    pub fn audit_period(&self) -> Option<AuditPeriod> {
        self.audit_period
    }

    pub fn compliance_requirements(&self) -> &[ComplianceRequirement] {
        &self.compliance_requirements
    }

    pub fn audit_focus(&self) -> &[AuditFocus] {
        &self.audit_focus
    }

    pub fn special_considerations(&self) -> &str {
        &self.special_considerations
    }

    /// Accounting standard followed by any additional compliance
    /// requirements, as listed in prompts and reports.
    pub fn compliance_labels(&self) -> Vec<&'static str> {
        std::iter::once(self.standards.label())
            .chain(self.compliance_requirements.iter().map(|c| c.label()))
            .collect()
    }

    pub fn focus_labels(&self) -> Vec<&'static str> {
        self.audit_focus.iter().map(|f| f.label()).collect()
    }
}

/// Plan text returned by the model. Never empty or whitespace-only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct AuditPlanText(String);

impl AuditPlanText {
    pub fn new(text: impl Into<String>) -> Option<Self> {
        let text = text.into();
        if text.trim().is_empty() {
            None
        } else {
            Some(Self(text))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sector_parse_is_case_insensitive_and_canonical() {
        let sector = Sector::parse("  retail ").unwrap();
        assert_eq!(sector.label(), "Retail");

        let sector = Sector::parse("retail - e-commerce").unwrap();
        assert_eq!(sector.label(), "Retail - E-commerce");
    }

    #[test]
    fn test_sector_labels_parse_back() {
        let labels = Sector::labels();
        assert_eq!(labels.len(), Sector::ALL.len());
        assert!(labels.contains(&"Retail"));
        for label in labels {
            assert_eq!(Sector::parse(label).map(Sector::label), Some(label));
        }
    }

    #[test]
    fn test_sector_rejects_unknown() {
        assert!(Sector::parse("Space Mining").is_none());
        assert!(Sector::parse("").is_none());
    }

    #[test]
    fn test_standard_labels_round_trip_through_parse() {
        for standard in AccountingStandard::ALL {
            assert_eq!(AccountingStandard::parse(standard.label()), Some(*standard));
        }
        assert_eq!(
            AccountingStandard::parse("us gaap"),
            Some(AccountingStandard::UsGaap)
        );
        assert_eq!(AccountingStandard::parse("GAAP"), None);
    }

    #[test]
    fn test_choice_serializes_as_label() {
        let json = serde_json::to_string(&ComplianceRequirement::PciDss).unwrap();
        assert_eq!(json, "\"PCI DSS\"");
        let json = serde_json::to_string(&AuditorRole::ItAuditor).unwrap();
        assert_eq!(json, "\"IT Auditor\"");
        let json = serde_json::to_string(&Sector::parse("Finance - Banking").unwrap()).unwrap();
        assert_eq!(json, "\"Finance - Banking\"");
    }

    #[test]
    fn test_default_role_is_senior_auditor() {
        assert_eq!(AuditorRole::default(), AuditorRole::SeniorAuditor);
    }

    #[test]
    fn test_plan_text_rejects_blank() {
        assert!(AuditPlanText::new("").is_none());
        assert!(AuditPlanText::new("  \n\t ").is_none());
        assert_eq!(AuditPlanText::new("Plan: ...").unwrap().as_str(), "Plan: ...");
    }

    #[test]
    fn test_audit_period_describe() {
        let period = AuditPeriod {
            start: NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
            end: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
        };
        assert_eq!(period.describe(), "January 15, 2024 to March 01, 2024");
    }
}
