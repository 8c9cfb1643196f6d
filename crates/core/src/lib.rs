//! # EduGuardian Core
//!
//! Domain types, collaborator traits, and error definitions for the
//! EduGuardian tutoring pipeline. This crate has no framework dependencies:
//! it defines the state record and the seams that every other crate
//! implements against.
//!
//! ## Design Philosophy
//!
//! Every external collaborator (text generation, web search, checkpoint
//! storage) is a trait here. Implementations live in their own crates, so
//! the pipeline can be driven by scripted fakes in tests and by real HTTP
//! clients in production.

pub mod checkpoint;
pub mod error;
pub mod event;
pub mod lesson;
pub mod message;
pub mod provider;
pub mod search;

// Re-export key types at crate root for ergonomics
pub use checkpoint::{Checkpoint, Checkpointer, LessonTurn, ThreadId};
pub use error::{CheckpointError, Error, ProviderError, Result, SearchError};
pub use event::{EventBus, PipelineEvent};
pub use lesson::{LessonRequest, LessonState, LessonUpdate, SourceType, StepName, StudentLevel};
pub use message::{Message, Role};
pub use provider::{Provider, ProviderRequest, ProviderResponse, Usage};
pub use search::{SearchProvider, SearchRequest, SearchResponse, SearchResult};
