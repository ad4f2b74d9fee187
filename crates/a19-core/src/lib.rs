pub mod ai;
pub mod attachment;
pub mod config;
pub mod contract;
pub mod conversation;
pub mod error;
pub mod export;
pub mod starters;
pub mod state;

// Re-export main types for convenience
pub use ai::{ChatSession, GeminiClient, GenerationClient, GenerationError, MessagePart};
pub use attachment::{Attachment, AttachmentError};
pub use config::Config;
pub use conversation::{Completion, Conversation, PendingRequest, ReplyKind};
pub use error::SubmitError;
pub use export::ExportError;
pub use starters::{StarterPrompt, STARTER_PROMPTS};
pub use state::{ChatRole, ChatTurn, GeneratedArtifact};
