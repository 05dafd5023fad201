//! Report structure, independent of the output format.

use chrono::NaiveDate;

use crate::audit::{AuditPlanText, AuditRequest, Choice};

#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    Title(String),
    Subtitle(String),
    Heading(String),
    Paragraph(String),
    /// Label/value rows, label column in bold.
    KeyValue(Vec<(String, String)>),
    Table {
        headers: Vec<String>,
        rows: Vec<Vec<String>>,
    },
    /// Vertical space in points.
    Spacer(f32),
    PageBreak,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReportDocument {
    pub title: String,
    pub blocks: Vec<Block>,
}

/// One section of the returned plan. `title` is `None` for free-standing
/// paragraphs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanSection {
    pub title: Option<String>,
    pub paragraphs: Vec<String>,
}

pub fn build_document(
    request: &AuditRequest,
    plan: &AuditPlanText,
    generated_on: NaiveDate,
) -> ReportDocument {
    let sections = parse_plan_sections(plan.as_str());
    let company = request.company_name();
    let mut blocks = Vec::new();

    // Title page
    blocks.push(Block::Spacer(100.0));
    blocks.push(Block::Title("Financial Audit Plan".to_string()));
    blocks.push(Block::Subtitle(format!("for {company}")));
    blocks.push(Block::Spacer(50.0));
    blocks.push(Block::Paragraph(format!(
        "Generated on: {}",
        generated_on.format("%B %d, %Y")
    )));
    blocks.push(Block::PageBreak);

    // Table of contents
    blocks.push(Block::Title("Table of Contents".to_string()));
    blocks.push(Block::Spacer(20.0));
    blocks.push(Block::Paragraph("1. Executive Summary".to_string()));
    blocks.push(Block::Paragraph("2. Company Information".to_string()));
    blocks.push(Block::Paragraph("3. Audit Plan Details".to_string()));
    for title in sections.iter().filter_map(|s| s.title.as_deref()) {
        blocks.push(Block::Paragraph(format!("    - {title}")));
    }
    blocks.push(Block::PageBreak);

    blocks.push(Block::Heading("1. Executive Summary".to_string()));
    blocks.push(Block::Paragraph(executive_summary(request)));
    blocks.push(Block::PageBreak);

    blocks.push(Block::Heading("2. Company Information".to_string()));
    blocks.push(Block::KeyValue(company_information(request)));

    if !request.about_company().is_empty() {
        blocks.push(Block::Heading("Company Description:".to_string()));
        blocks.push(Block::Paragraph(request.about_company().to_string()));
        blocks.push(Block::Spacer(12.0));
    }

    blocks.push(Block::Heading("Audit Team:".to_string()));
    blocks.push(Block::Table {
        headers: vec!["Name".to_string(), "Role".to_string()],
        rows: request
            .team()
            .iter()
            .map(|m| vec![m.name.clone(), m.role.label().to_string()])
            .collect(),
    });
    blocks.push(Block::PageBreak);

    blocks.push(Block::Heading("3. Audit Plan Details".to_string()));
    blocks.push(Block::Spacer(10.0));
    for section in sections {
        if let Some(title) = section.title {
            blocks.push(Block::Heading(title));
        }
        for paragraph in section.paragraphs {
            blocks.push(Block::Paragraph(paragraph));
        }
        blocks.push(Block::Spacer(12.0));
    }

    ReportDocument {
        title: format!("Financial Audit Plan - {company}"),
        blocks,
    }
}

fn executive_summary(request: &AuditRequest) -> String {
    let team_size = request.team().len();
    let mut summary = format!(
        "This audit plan outlines the comprehensive approach for conducting a financial audit \
         of {}, a company operating in the {} sector.",
        request.company_name(),
        request.sector().label()
    );

    match request.audit_period() {
        Some(period) => summary.push_str(&format!(
            " The audit will be conducted from {} with a team of {team_size} {}.",
            period.describe(),
            if team_size == 1 { "auditor" } else { "auditors" }
        )),
        None => summary.push_str(&format!(
            " The audit will be conducted by a team of {team_size} {}.",
            if team_size == 1 { "auditor" } else { "auditors" }
        )),
    }

    summary.push_str(&format!(
        " The audit will focus on compliance with {}",
        request.compliance_labels().join(", ")
    ));
    let focus = request.focus_labels();
    if focus.is_empty() {
        summary.push('.');
    } else {
        summary.push_str(&format!(
            " and will address specific areas including {}.",
            focus.join(", ")
        ));
    }

    if !request.special_considerations().is_empty() {
        summary.push_str(
            " Special considerations have been identified and are addressed in the \
             Special Considerations Analysis section of the plan.",
        );
    }

    summary
}

fn company_information(request: &AuditRequest) -> Vec<(String, String)> {
    let or_none = |value: String| {
        if value.is_empty() {
            "None specified".to_string()
        } else {
            value
        }
    };

    vec![
        ("Company Name:".to_string(), request.company_name().to_string()),
        ("Sector:".to_string(), request.sector().label().to_string()),
        (
            "Accounting Standard:".to_string(),
            request.standards().label().to_string(),
        ),
        (
            "Audit Period:".to_string(),
            or_none(
                request
                    .audit_period()
                    .map(|p| p.describe())
                    .unwrap_or_default(),
            ),
        ),
        (
            "Compliance Requirements:".to_string(),
            or_none(
                request
                    .compliance_requirements()
                    .iter()
                    .map(|c| c.label())
                    .collect::<Vec<_>>()
                    .join(", "),
            ),
        ),
        (
            "Audit Focus Areas:".to_string(),
            or_none(request.focus_labels().join(", ")),
        ),
        (
            "Special Considerations:".to_string(),
            or_none(request.special_considerations().to_string()),
        ),
    ]
}

/// Splits plan text into sections on blank lines. The first line of a
/// multi-line block is its title; a single line that is marked up as a
/// heading becomes a title-only section; any other single line is kept as a
/// paragraph.
pub fn parse_plan_sections(text: &str) -> Vec<PlanSection> {
    let mut sections = Vec::new();
    let mut block: Vec<&str> = Vec::new();

    for line in text.lines().chain(std::iter::once("")) {
        let line = line.trim();
        if !line.is_empty() {
            block.push(line);
            continue;
        }
        let section = match block.as_slice() {
            [single] if is_marked_heading(single) => PlanSection {
                title: Some(clean_heading(single)),
                paragraphs: Vec::new(),
            },
            [single] => PlanSection {
                title: None,
                paragraphs: vec![clean_inline(single)],
            },
            [first, rest @ ..] => PlanSection {
                title: Some(clean_heading(first)),
                paragraphs: rest.iter().map(|line| clean_inline(line)).collect(),
            },
            [] => continue,
        };
        sections.push(section);
        block.clear();
    }

    sections
}

fn is_marked_heading(line: &str) -> bool {
    line.starts_with('#')
        || (line.len() > 4 && line.starts_with("**") && line.ends_with("**"))
}

fn clean_heading(line: &str) -> String {
    let line = line.trim_start_matches('#').trim();
    let line = clean_inline(line);
    let line = strip_numbering(&line);
    line.trim_end_matches(':').trim().to_string()
}

fn strip_numbering(line: &str) -> &str {
    let digits = line.bytes().take_while(u8::is_ascii_digit).count();
    if digits == 0 {
        return line;
    }
    match line[digits..].strip_prefix(['.', ')']) {
        Some(rest) if rest.starts_with(' ') => rest.trim_start(),
        _ => line,
    }
}

fn clean_inline(line: &str) -> String {
    let line = line.replace("**", "").replace("__", "");
    match line.strip_prefix("* ") {
        Some(rest) => format!("- {rest}"),
        None => line,
    }
}
