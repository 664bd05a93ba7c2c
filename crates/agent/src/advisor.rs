//! The energy advisor: instructions plus a configured agent loop.

use std::sync::Arc;
use std::time::Duration;
use energy_advisor_config::AppConfig;
use energy_advisor_core::error::{Error, Result};
use energy_advisor_core::provider::Provider;
use energy_advisor_core::tool::ToolRegistry;
use energy_advisor_providers::{build_from_config, resolve_model};
use energy_advisor_tools::default_registry;
use tracing::info;
use crate::loop_runner::{AgentLoop, FinalAnswer};
use crate::prompt::DEFAULT_INSTRUCTIONS;

/// Answers energy questions by letting the model consult the pricing and
/// weather tools.
pub struct EnergyAdvisor {
    instructions: String,
    agent: AgentLoop,
}

impl EnergyAdvisor {
    pub fn new(instructions: impl Into<String>, agent: AgentLoop) -> Result<Self> {
        let instructions = instructions.into();
        if instructions.trim().is_empty() {
            return Err(Error::InvalidInput("instructions must not be empty".into()));
        }
        Ok(Self { instructions, agent })
    }

    /// Build the advisor from configuration with the configured provider
    /// and the built-in tools.
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        config.validate().map_err(|e| Error::Config {
            message: e.to_string(),
        })?;
        let provider = build_from_config(config)?;
        let registry = default_registry()?;
        Self::from_parts(config, provider, registry)
    }

    /// Build the advisor from configuration, supplying the provider and
    /// tools directly.
    pub fn from_parts(
        config: &AppConfig,
        provider: Arc<dyn Provider>,
        registry: ToolRegistry,
    ) -> Result<Self> {
        let model = resolve_model(config);
        let mut agent = AgentLoop::new(
            provider,
            model.clone(),
            config.default_temperature,
            Arc::new(registry),
        )
        .with_max_iterations(config.agent.max_tool_iterations)
        .with_parallel_tool_calls(config.agent.parallel_tool_calls)
        .with_request_timeout(Duration::from_secs(config.agent.request_timeout_secs));
        if let Some(max_tokens) = config.default_max_tokens {
            agent = agent.with_max_tokens(max_tokens);
        }

        info!(
            model = %model,
            tools = agent.tools().len(),
            max_iterations = agent.max_iterations(),
            "Energy advisor ready"
        );

        let instructions = config
            .instructions
            .clone()
            .unwrap_or_else(|| DEFAULT_INSTRUCTIONS.to_string());
        Self::new(instructions, agent)
    }

    /// Answer `question`, optionally with extra context such as the
    /// household's location or appliances.
    pub async fn invoke(&self, question: &str, context: Option<&str>) -> Result<FinalAnswer> {
        self.agent.run(&self.instructions, context, question).await
    }

    /// Names of the tools the model may call, sorted.
    pub fn get_agent_tools(&self) -> Vec<String> {
        self.agent.tools().names().into_iter().map(String::from).collect()
    }

    pub fn instructions(&self) -> &str {
        &self.instructions
    }
}
