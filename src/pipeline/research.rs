use std::time::Duration;

use serde::Serialize;

use crate::config::Config;
use crate::telemetry::metrics::RISK_RESEARCH_FALLBACKS;

const MAX_PER_CATEGORY: usize = 5;
const MAX_BODY_BYTES: usize = 1_000_000;
const MIN_SNIPPET_CHARS: usize = 20;
const MAX_SNIPPET_CHARS: usize = 400;
const USER_AGENT: &str = "Mozilla/5.0 (compatible; audit-plan-generator/1.0)";

const RISK_INDICATORS: &[&str] = &["risk", "challenge", "threat", "concern", "issue", "problem"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskCategory {
    Industry,
    CompanySpecific,
    Financial,
    Operational,
    Compliance,
    Strategic,
    Reputation,
}

impl RiskCategory {
    /// Keyword categories, in matching order.
    const KEYWORDED: [RiskCategory; 5] = [
        RiskCategory::Financial,
        RiskCategory::Operational,
        RiskCategory::Compliance,
        RiskCategory::Strategic,
        RiskCategory::Reputation,
    ];

    fn keywords(self) -> &'static [&'static str] {
        match self {
            RiskCategory::Financial => &[
                "financial",
                "revenue",
                "profit",
                "loss",
                "cash flow",
                "debt",
                "investment",
                "market",
                "economic",
            ],
            RiskCategory::Operational => &[
                "operational",
                "process",
                "supply chain",
                "logistics",
                "production",
                "efficiency",
                "quality",
                "capacity",
            ],
            RiskCategory::Compliance => &[
                "compliance",
                "regulatory",
                "legal",
                "law",
                "regulation",
                "standard",
                "requirement",
                "policy",
            ],
            RiskCategory::Strategic => &[
                "strategic",
                "competition",
                "market position",
                "business model",
                "innovation",
                "technology",
                "disruption",
            ],
            RiskCategory::Reputation => &[
                "reputation",
                "brand",
                "public relations",
                "customer",
                "stakeholder",
                "trust",
                "image",
            ],
            RiskCategory::Industry | RiskCategory::CompanySpecific => &[],
        }
    }
}

/// Categorizes a search snippet. Snippets that do not talk about risk at all
/// are ignored.
pub fn categorize_snippet(text: &str) -> Option<RiskCategory> {
    let lower = text.to_lowercase();
    if !RISK_INDICATORS.iter().any(|k| lower.contains(k)) {
        return None;
    }

    let category = RiskCategory::KEYWORDED
        .into_iter()
        .find(|category| category.keywords().iter().any(|k| lower.contains(k)))
        .unwrap_or(if lower.contains("industry") {
            RiskCategory::Industry
        } else {
            RiskCategory::CompanySpecific
        });
    Some(category)
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RiskProfile {
    pub industry: Vec<String>,
    pub company_specific: Vec<String>,
    pub financial: Vec<String>,
    pub operational: Vec<String>,
    pub compliance: Vec<String>,
    pub strategic: Vec<String>,
    pub reputation: Vec<String>,
}

fn owned(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

impl RiskProfile {
    /// Generic risks used whenever research is off or finds nothing.
    pub fn baseline() -> Self {
        Self {
            industry: owned(&[
                "Market volatility in the sector",
                "Regulatory changes affecting the industry",
                "Competitive pressures",
                "Technological disruption",
            ]),
            company_specific: owned(&[
                "Operational risks based on business model",
                "Financial risks from current market conditions",
                "Compliance risks in the sector",
            ]),
            financial: owned(&[
                "Revenue volatility",
                "Cost management challenges",
                "Capital structure risks",
            ]),
            operational: owned(&[
                "Process inefficiencies",
                "Supply chain vulnerabilities",
                "Quality control issues",
            ]),
            compliance: owned(&[
                "Regulatory changes",
                "Compliance monitoring challenges",
                "Documentation requirements",
            ]),
            strategic: owned(&[
                "Market competition",
                "Business model sustainability",
                "Innovation challenges",
            ]),
            reputation: owned(&[
                "Brand perception",
                "Customer satisfaction",
                "Stakeholder trust",
            ]),
        }
    }

    fn bucket_mut(&mut self, category: RiskCategory) -> &mut Vec<String> {
        match category {
            RiskCategory::Industry => &mut self.industry,
            RiskCategory::CompanySpecific => &mut self.company_specific,
            RiskCategory::Financial => &mut self.financial,
            RiskCategory::Operational => &mut self.operational,
            RiskCategory::Compliance => &mut self.compliance,
            RiskCategory::Strategic => &mut self.strategic,
            RiskCategory::Reputation => &mut self.reputation,
        }
    }

    /// Adds a snippet unless it is a duplicate or the bucket is full.
    pub fn push(&mut self, category: RiskCategory, snippet: &str) {
        let snippet = snippet.trim();
        let bucket = self.bucket_mut(category);
        if bucket.len() < MAX_PER_CATEGORY && !bucket.iter().any(|s| s == snippet) {
            bucket.push(snippet.to_string());
        }
    }

    pub fn is_empty(&self) -> bool {
        self.industry.is_empty()
            && self.company_specific.is_empty()
            && self.financial.is_empty()
            && self.operational.is_empty()
            && self.compliance.is_empty()
            && self.strategic.is_empty()
            && self.reputation.is_empty()
    }

    /// Categorizes every usable line of a markdown page.
    pub fn absorb(&mut self, markdown: &str) {
        for snippet in snippets(markdown) {
            if let Some(category) = categorize_snippet(&snippet) {
                self.push(category, &snippet);
            }
        }
    }
}

/// Splits a page into candidate snippets, dropping markdown decoration and
/// lines too short or too long to be a search result summary.
fn snippets(markdown: &str) -> Vec<String> {
    markdown
        .lines()
        .map(|line| {
            line.trim()
                .trim_start_matches(['#', '>', '*', '-', '|'])
                .replace("**", "")
                .trim()
                .to_string()
        })
        .filter(|line| {
            let len = line.chars().count();
            (MIN_SNIPPET_CHARS..=MAX_SNIPPET_CHARS).contains(&len)
        })
        .collect()
}

/// Gathers industry and company risk snippets from a web search page.
pub struct RiskResearcher {
    client: reqwest::Client,
    search_url: Option<String>,
}

impl RiskResearcher {
    pub fn new(config: &Config) -> Self {
        let search_url = config
            .risk_search_enabled
            .then(|| config.risk_search_url.clone());
        Self::with_search_url(search_url)
    }

    pub fn with_search_url(search_url: Option<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(15))
            .user_agent(USER_AGENT)
            .build()
            .unwrap_or_default();
        Self { client, search_url }
    }

    /// Never fails: any search problem falls back to [`RiskProfile::baseline`].
    #[tracing::instrument(
        name = "pipeline_stage research",
        skip(self),
        fields(
            pipeline.stage = "research",
            research.enabled = self.search_url.is_some(),
            research.fallback,
        )
    )]
    pub async fn research(&self, company: &str, sector: &str) -> RiskProfile {
        let span = tracing::Span::current();

        let Some(search_url) = &self.search_url else {
            span.record("research.fallback", true);
            return RiskProfile::baseline();
        };

        let queries = [
            format!("{sector} industry risks and challenges"),
            format!("{company} {sector} company risks and challenges"),
        ];

        let mut profile = RiskProfile::default();
        for query in &queries {
            match self.search(search_url, query).await {
                Ok(markdown) => profile.absorb(&markdown),
                Err(e) => {
                    tracing::warn!(error = %e, query = %query, "Risk search failed, using baseline risks");
                    return fallback(&span, "search_error");
                }
            }
        }

        if profile.is_empty() {
            tracing::info!("Risk search returned no usable snippets, using baseline risks");
            return fallback(&span, "no_results");
        }

        span.record("research.fallback", false);
        profile
    }

    async fn search(&self, search_url: &str, query: &str) -> anyhow::Result<String> {
        let response = self
            .client
            .get(search_url)
            .query(&[("q", query)])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            anyhow::bail!("search returned HTTP {status}");
        }

        let body = response.text().await?;
        if body.len() > MAX_BODY_BYTES {
            anyhow::bail!("search response too large ({} bytes)", body.len());
        }

        tracing::debug!(body_len = body.len(), "Search page fetched");
        Ok(html2md::rewrite_html(&body, false))
    }
}

fn fallback(span: &tracing::Span, reason: &'static str) -> RiskProfile {
    span.record("research.fallback", true);
    RISK_RESEARCH_FALLBACKS.add(1, &[opentelemetry::KeyValue::new("reason", reason)]);
    RiskProfile::baseline()
}
