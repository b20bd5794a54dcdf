pub mod failover;
pub mod generator;
pub mod models;
pub mod prompt;
pub mod providers;

pub use failover::FailoverGenerator;
pub use generator::{ChunkStream, GenerationRequest, LlmError, ReportGenerator};
pub use providers::openai_compat::{EndpointConfig, OpenAiCompatProvider};
