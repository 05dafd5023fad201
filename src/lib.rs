pub mod audit;
pub mod config;
pub mod error;
pub mod history;
pub mod llm;
pub mod pipeline;
pub mod report;
pub mod routes;
pub mod telemetry;

use std::sync::Arc;

pub use config::Config;

use history::History;
use llm::LlmClient;
use pipeline::RiskResearcher;

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub llm_client: Arc<LlmClient>,
    pub history: Arc<History>,
    pub researcher: Arc<RiskResearcher>,
}

impl AppState {
    pub fn new(config: Config, llm_client: LlmClient) -> Self {
        let researcher = RiskResearcher::new(&config);
        Self {
            config,
            llm_client: Arc::new(llm_client),
            history: Arc::new(History::new()),
            researcher: Arc::new(researcher),
        }
    }
}
