//! Language model gateway implementations for the energy advisor.
//!
//! All providers implement the `energy_advisor_core::Provider` trait.
//! [`build_from_config`] picks and constructs one from configuration.

pub mod openai_compat;
pub mod router;

pub use openai_compat::OpenAiCompatProvider;
pub use router::{build_from_config, resolve_model};
