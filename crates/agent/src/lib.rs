//! The tool-calling agent loop behind the energy advisor.
//!
//! Each question runs one bounded cycle:
//!
//! 1. **Seed** the conversation (instructions, optional context, question)
//! 2. **Ask the model** via the configured provider, offering every tool
//! 3. **If tool calls**: execute them in order, append the results, go to 2
//! 4. **If text only**: return it as the final answer
//!
//! The loop gives up with [`energy_advisor_core::Error::ToolLoopExceeded`]
//! once the iteration limit is reached.

pub mod advisor;
pub mod executor;
pub mod loop_runner;
pub mod prompt;

#[cfg(test)]
mod test_helpers;

pub use advisor::EnergyAdvisor;
pub use executor::ToolExecutor;
pub use loop_runner::{AgentLoop, FinalAnswer};
pub use prompt::DEFAULT_INSTRUCTIONS;
