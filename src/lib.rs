//! # Turnkit — chat-turn orchestration for tool-calling AI app agents
//!
//! Turnkit executes one conversational "turn" of an app-building AI
//! agent end-to-end: assemble the tool set for the turn (a fixed
//! todo-list tool, remote tools advertised by a dev-server control
//! plane, and an optional file-patch tool), drive one streaming model
//! call, merge tool calls, tool results, and text tokens into a single
//! growing transcript with incremental progress notifications, and
//! return the transcript plus the structured message list. Persistence
//! and broadcast stay with the caller.
//!
//! ## Design
//!
//! - **Explicit seams**: every collaborator (streaming model, apply
//!   model, control plane, file store, todo sink) is a trait in
//!   [`traits`], injected through [`orchestrator::TurnDeps`]. No hidden
//!   globals.
//! - **Observer, not callbacks-plus-exceptions**: progress and outcome
//!   notifications go through [`traits::TurnObserver`]; the orchestrator
//!   itself returns a plain `Result`.
//! - **Scoped resources**: the control-plane connection is acquired at
//!   turn entry and released on every exit path.
//! - **Nothing swallowed**: every failure reaches the caller; retry and
//!   recovery are deliberately left to the layer above.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use turnkit::prelude::*;
//!
//! # struct NullSink;
//! # #[async_trait::async_trait]
//! # impl turnkit::traits::TodoSink for NullSink {
//! #     async fn replace(&self, _: Vec<turnkit::types::TodoItem>) -> Result<(), TurnError> { Ok(()) }
//! # }
//! #[tokio::main]
//! async fn main() -> Result<(), TurnError> {
//!     let chat = ModelConfig::from_env("CHAT_MODEL")
//!         .ok_or_else(|| TurnError::ConfigurationError("CHAT_MODEL_API_KEY not set".into()))?;
//!     let deps = TurnDeps {
//!         model: Arc::new(OpenAiChatModel::new(chat)),
//!         connector: Arc::new(HttpControlPlane::new()),
//!         files: Arc::new(LocalFileStore::new("apps/demo")),
//!         todos: Arc::new(NullSink),
//!         apply_model: ModelConfig::from_env("APPLY_MODEL")
//!             .map(|cfg| Arc::new(OpenAiApplyModel::new(cfg)) as _),
//!     };
//!
//!     let output = run_turn(
//!         &deps,
//!         "demo-app",
//!         "http://localhost:4100",
//!         Message::user("add a dark mode toggle").build(),
//!         Vec::new(),
//!         TurnOptions::default(),
//!     )
//!     .await?;
//!     println!("{}", output.text);
//!     Ok(())
//! }
//! ```

#![deny(unsafe_code)]

pub mod config;
pub mod control_plane;
pub mod convert;
pub mod error;
pub mod files;
pub mod orchestrator;
pub mod providers;
pub mod registry;
pub mod stream;
pub mod tools;
pub mod tracing;
pub mod traits;
pub mod types;
pub mod utils;

pub use error::TurnError;
pub use orchestrator::{TurnDeps, TurnOptions, TurnOutput, run_turn};

/// Common imports for working with turnkit.
pub mod prelude {
    pub use crate::config::ModelConfig;
    pub use crate::control_plane::HttpControlPlane;
    pub use crate::error::TurnError;
    pub use crate::files::LocalFileStore;
    pub use crate::orchestrator::{TurnDeps, TurnOptions, TurnOutput, run_turn};
    pub use crate::providers::{OpenAiApplyModel, OpenAiChatModel};
    pub use crate::registry::{RegisteredTool, ToolHandler, ToolRegistry};
    pub use crate::stream::{StepOutcome, TurnEvent, TurnStream};
    pub use crate::traits::{
        ApplyModel, ControlPlaneConnection, ControlPlaneConnector, FileStore,
        StreamingChatModel, TodoSink, TurnObserver,
    };
    pub use crate::types::{
        ChatRequest, Message, MessagePart, ModelMessage, Role, TodoItem, ToolSpec,
    };
    pub use crate::utils::cancel::CancelHandle;
}
