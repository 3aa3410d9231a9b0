//! Agent module — core agent logic.
//!
//! This module contains:
//! - Message types ([`Message`], [`Role`])
//! - Stage contracts ([`Plan`], [`ActionResult`], [`FinalAnswer`])
//! - Chat client trait and the Ollama backend
//! - Prompt assembly for each stage
//! - The agent loop itself
//!
//! # Adding a New LLM Provider
//!
//! See [`llm::ProviderRegistry`] for instructions.

pub mod context;
mod loop_impl;
mod message;
mod schema;

pub mod llm;

pub use llm::{ChatClient, ChatOptions, OllamaClient, ProviderRegistry};
pub use loop_impl::Agent;
pub use message::{Message, Role};
pub use schema::{ActionResult, FinalAnswer, Plan};
