//! Guide generation.
//!
//! The model is a proposal engine only: it picks activity ids and names from
//! the knowledge it is given. Everything it returns is later checked against
//! the activity store before it reaches a caller.
//!
//! - `retrieval` selects catalog entries for the requested city
//! - `prompt` renders the planning prompt with `tera`
//! - `llm` talks to OpenAI-compatible or Ollama endpoints
//! - `guide` ties the three together and parses the answer

pub mod guide;
pub mod llm;
pub mod prompt;
pub mod retrieval;

pub use guide::GuideGenerator;
pub use llm::{build_llm_client, LlmClient};
pub use retrieval::{CatalogRetriever, KnowledgeDocument, KnowledgeRetriever};
