pub mod analyze;
pub mod generate;
pub mod orchestrator;
pub mod research;

pub use orchestrator::generate_audit_plan;
pub use research::{RiskCategory, RiskProfile, RiskResearcher, categorize_snippet};
