#![forbid(unsafe_code)]

pub mod backend;
pub mod http;
pub mod memory;
pub mod result;
pub mod wire;

pub use backend::{AssessmentBackend, BackendError, PoolResponse};
pub use http::{HttpBackend, HttpConfig};
pub use memory::InMemoryBackend;
pub use result::{QuestionResult, ResultSummary, TopicPerformance};
