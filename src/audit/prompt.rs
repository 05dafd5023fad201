use super::model::{AuditRequest, Choice};

pub const PLAN_SYSTEM_PROMPT: &str = "You are a professional financial auditor with expertise \
    in various sectors and accounting standards.";

pub const RISK_SYSTEM_PROMPT: &str =
    "You are a professional risk analyst with expertise in financial auditing.";

/// Sections the model is asked to produce, in order.
pub const PLAN_SECTIONS: &[&str] = &[
    "Audit Objectives",
    "Scope of Audit",
    "Risk Assessment",
    "Audit Procedures",
    "Substantive Audit Procedures",
    "Recommendations",
    "Timeline and Milestones",
    "Resource Allocation",
    "Special Considerations Analysis",
];

fn or_none(value: &str) -> &str {
    if value.is_empty() { "None specified" } else { value }
}

pub fn team_lines(request: &AuditRequest) -> String {
    request
        .team()
        .iter()
        .map(|member| format!("- {} ({})", member.name, member.role.label()))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn build_plan_prompt(request: &AuditRequest, risk_analysis: Option<&str>) -> String {
    let company = request.company_name();
    let sector = request.sector().label();
    let standards = request.standards().label();

    let mut prompt = format!(
        "Generate a comprehensive audit plan for {company}, a company in the {sector} sector.\n\
         The financial statements are prepared under {standards}.\n"
    );

    if let Some(period) = request.audit_period() {
        prompt.push_str(&format!(
            "The audit will be conducted from {} to {}.\n",
            period.start, period.end
        ));
    }

    prompt.push_str(&format!(
        "\nDescription of the Company:\n{}\n\n\
         Risk Analysis:\n{}\n\n\
         Audit Team:\n{}\n\n\
         Compliance Requirements: {}\n\
         Audit Focus Areas: {}\n\
         Special Considerations: {}\n\n",
        or_none(request.about_company()),
        risk_analysis.unwrap_or("No risk analysis available."),
        team_lines(request),
        request.compliance_labels().join(", "),
        or_none(&request.focus_labels().join(", ")),
        or_none(request.special_considerations()),
    ));

    prompt.push_str("Please provide the following sections:\n");
    for (index, section) in PLAN_SECTIONS.iter().enumerate() {
        prompt.push_str(&format!("{}. {section}\n", index + 1));
        match *section {
            "Risk Assessment" => prompt.push_str(&format!(
                "   - Based on the sector ({sector}) and company information provided\n   \
                 - Include industry-specific risks\n   \
                 - Analyze operational risks based on the company's nature and function\n"
            )),
            "Substantive Audit Procedures" => prompt.push_str(
                "   - Provide detailed procedures based on the risk assessment\n   \
                 - Include specific tests for key areas identified\n   \
                 - Consider the company's business model and operations\n",
            ),
            _ => {}
        }
    }

    prompt.push_str(&format!(
        "\nFor the Special Considerations Analysis section, provide a detailed interpretation \
         and analysis of the following special considerations: \"{}\". Explain how these \
         considerations should be addressed in the audit plan, what specific procedures should \
         be implemented, and what potential risks or challenges they might present.\n\n\
         Make the response detailed and specific to the {sector} sector and the company's \
         nature and function as described.\n\
         For each compliance requirement ({}), include specific audit procedures and \
         considerations.\n\
         Consider the diverse roles of the audit team members when assigning responsibilities.\n\
         Separate sections with a blank line and start each section with its numbered title \
         on its own line.",
        or_none(request.special_considerations()),
        request.compliance_labels().join(", "),
    ));

    prompt
}

pub fn build_risk_prompt(
    request: &AuditRequest,
    industry_risks: &[String],
    company_risks: &[String],
) -> String {
    format!(
        "Analyze the following risk data for {} in the {} sector:\n\n\
         Industry Risks:\n{}\n\n\
         Company Specific Risks:\n{}\n\n\
         Company Description:\n{}\n\n\
         Please provide a comprehensive risk analysis that:\n\
         1. Evaluates the severity of each risk\n\
         2. Suggests mitigation strategies\n\
         3. Identifies any additional risks based on the company description\n\
         4. Provides recommendations for the audit plan",
        request.company_name(),
        request.sector().label(),
        industry_risks.join(", "),
        company_risks.join(", "),
        or_none(request.about_company()),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::AuditPlanForm;

    fn request(json: &str) -> AuditRequest {
        serde_json::from_str::<AuditPlanForm>(json)
            .unwrap()
            .validate()
            .unwrap()
    }

    #[test]
    fn test_plan_prompt_contains_required_fields_verbatim() {
        let req = request(
            r#"{"company_name": "Acme Co", "sector": "Retail", "standards": "IFRS", "team": ["Alice"]}"#,
        );
        let prompt = build_plan_prompt(&req, None);
        assert!(prompt.contains("Acme Co"));
        assert!(prompt.contains("Retail"));
        assert!(prompt.contains("IFRS"));
        assert!(prompt.contains("- Alice (Senior Auditor)"));
        assert!(prompt.contains("No risk analysis available."));
    }

    #[test]
    fn test_plan_prompt_lists_every_section_in_order() {
        let req = request(
            r#"{"company_name": "Acme Co", "sector": "Retail", "standards": "US GAAP", "team": ["Alice"]}"#,
        );
        let prompt = build_plan_prompt(&req, Some("Liquidity is tight."));
        let mut last = 0;
        for (i, section) in PLAN_SECTIONS.iter().enumerate() {
            let needle = format!("{}. {section}", i + 1);
            let pos = prompt.find(&needle).unwrap_or_else(|| panic!("missing {needle}"));
            assert!(pos >= last);
            last = pos;
        }
        assert!(prompt.contains("Liquidity is tight."));
        assert!(prompt.contains("US GAAP"));
    }

    #[test]
    fn test_plan_prompt_includes_optional_fields() {
        let req = request(
            r#"{"company_name": "Globex", "sector": "Energy - Renewable", "standards": "IFRS",
                "team": [{"name": "Bob", "role": "IT Auditor"}],
                "about_company": "Builds wind farms.",
                "audit_start_date": "2024-01-01", "audit_end_date": "2024-02-15",
                "compliance_requirements": ["SOX"], "audit_focus": ["IT Security"],
                "special_considerations": "Recent acquisition"}"#,
        );
        let prompt = build_plan_prompt(&req, None);
        assert!(prompt.contains("Builds wind farms."));
        assert!(prompt.contains("from 2024-01-01 to 2024-02-15"));
        assert!(prompt.contains("Compliance Requirements: IFRS, SOX"));
        assert!(prompt.contains("Audit Focus Areas: IT Security"));
        assert!(prompt.contains("\"Recent acquisition\""));
        assert!(prompt.contains("- Bob (IT Auditor)"));
    }

    #[test]
    fn test_risk_prompt_joins_risks() {
        let req = request(
            r#"{"company_name": "Acme Co", "sector": "Retail", "standards": "IFRS", "team": ["Alice"]}"#,
        );
        let prompt = build_risk_prompt(
            &req,
            &["Competitive pressures".to_string(), "Regulation".to_string()],
            &["Thin margins".to_string()],
        );
        assert!(prompt.contains("Acme Co in the Retail sector"));
        assert!(prompt.contains("Competitive pressures, Regulation"));
        assert!(prompt.contains("Thin margins"));
    }
}
