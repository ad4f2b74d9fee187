//! Conversation controller
//!
//! Owns the transcript, the pending attachment, the latest generated artifact
//! and the single in-flight request. Submitting is split at its one suspension
//! point so a UI loop can hand the network call to a background task:
//!
//! ```text
//! begin(&mut draft) -> PendingRequest      guard, user turn, session, message
//! PendingRequest::send().await -> Completion
//! complete(completion)                     model turn, artifact, last error
//! ```
//!
//! [`Conversation::submit`] runs all three back to back.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::ai::{ChatSession, GenerationClient, GenerationError, MessagePart};
use crate::attachment::Attachment;
use crate::contract;
use crate::error::SubmitError;
use crate::state::{ChatTurn, GeneratedArtifact};

type SharedSession = Arc<Mutex<Box<dyn ChatSession>>>;

/// What a successful reply did to the artifact
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyKind {
    /// New html/css arrived and replaced the stored artifact
    ArtifactUpdated,
    /// Pure conversational reply; the artifact was left alone
    Conversational,
}

/// Holds the in-flight flag up until it is dropped
struct InFlightGuard(Arc<AtomicBool>);

impl InFlightGuard {
    fn acquire(flag: &Arc<AtomicBool>) -> Self {
        flag.store(true, Ordering::Release);
        Self(Arc::clone(flag))
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// An accepted submission that has not been sent yet
pub struct PendingRequest {
    session: SharedSession,
    parts: Vec<MessagePart>,
    guard: InFlightGuard,
}

impl PendingRequest {
    /// Perform the remote call. Safe to run on a spawned task.
    pub async fn send(self) -> Completion {
        let PendingRequest { session, parts, guard } = self;
        let result = {
            let mut session = session.lock().await;
            session.send_message(parts).await
        };
        Completion { result, guard }
    }
}

/// The raw outcome of a sent request, waiting to be applied to the conversation
pub struct Completion {
    result: Result<String, GenerationError>,
    guard: InFlightGuard,
}

pub struct Conversation<C> {
    client: C,
    session: Option<SharedSession>,
    turns: Vec<ChatTurn>,
    artifact: Option<GeneratedArtifact>,
    attachment: Option<Attachment>,
    in_flight: Arc<AtomicBool>,
    last_error: Option<String>,
}

impl<C: GenerationClient> Conversation<C> {
    pub fn new(client: C) -> Self {
        Self {
            client,
            session: None,
            turns: Vec::new(),
            artifact: None,
            attachment: None,
            in_flight: Arc::new(AtomicBool::new(false)),
            last_error: None,
        }
    }

    pub fn turns(&self) -> &[ChatTurn] {
        &self.turns
    }

    pub fn artifact(&self) -> Option<&GeneratedArtifact> {
        self.artifact.as_ref()
    }

    pub fn attachment(&self) -> Option<&Attachment> {
        self.attachment.as_ref()
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    pub fn has_session(&self) -> bool {
        self.session.is_some()
    }

    /// Hold a file for the next submission, returning whatever it replaced
    pub fn attach(&mut self, attachment: Attachment) -> Option<Attachment> {
        debug!(name = attachment.name(), mime_type = attachment.mime_type(), "attachment selected");
        self.attachment.replace(attachment)
    }

    pub fn cancel_attachment(&mut self) -> Option<Attachment> {
        self.attachment.take()
    }

    /// Accept a submission and prepare the outgoing message.
    ///
    /// Returns `None` (and changes nothing) when the draft is blank with no
    /// attachment, or when a request is already in flight. On acceptance the
    /// draft is cleared and the attachment consumed.
    pub fn begin(&mut self, draft: &mut String) -> Option<PendingRequest> {
        if self.is_in_flight() {
            debug!("submission ignored: request already in flight");
            return None;
        }
        if draft.trim().is_empty() && self.attachment.is_none() {
            debug!("submission ignored: nothing to send");
            return None;
        }

        self.last_error = None;

        let mut text = std::mem::take(draft);
        if let Some(Attachment::Text { name, content }) = &self.attachment {
            text.push_str(&format!(
                "\n\n--- Content from attached file {} ---\n{}",
                name, content
            ));
        }

        self.turns.push(ChatTurn::user(text.clone()));
        let guard = InFlightGuard::acquire(&self.in_flight);

        let session = Arc::clone(self.session.get_or_insert_with(|| {
            info!("creating generation session");
            Arc::new(Mutex::new(self.client.start_chat(contract::session_config())))
        }));

        let attachment = self.attachment.take();
        let mut parts = Vec::with_capacity(2);
        match attachment {
            Some(Attachment::Image { mime_type, bytes, .. }) => {
                if !text.is_empty() {
                    parts.push(MessagePart::Text(text));
                }
                parts.push(MessagePart::inline_data(&mime_type, &bytes));
            }
            _ => parts.push(MessagePart::Text(text)),
        }

        info!(turns = self.turns.len(), parts = parts.len(), "submitting prompt");

        Some(PendingRequest { session, parts, guard })
    }

    /// Apply a finished request: record the model turn and update the artifact
    /// or the last error. The in-flight flag is released on return.
    pub fn complete(&mut self, completion: Completion) -> Result<ReplyKind, SubmitError> {
        let Completion { result, guard } = completion;
        let outcome = self.resolve(result);
        drop(guard);
        outcome
    }

    /// Record a request whose task died before producing a [`Completion`]
    pub fn abort(&mut self, reason: impl Into<String>) -> SubmitError {
        let outcome = self.resolve(Err(GenerationError::Aborted(reason.into())));
        self.in_flight.store(false, Ordering::Release);
        match outcome {
            Err(err) => err,
            Ok(_) => SubmitError::EmptyResponse,
        }
    }

    /// Begin, send and complete in one go.
    ///
    /// `None` means the submission was rejected by the guard.
    pub async fn submit(&mut self, draft: &mut String) -> Option<Result<ReplyKind, SubmitError>> {
        let pending = self.begin(draft)?;
        let completion = pending.send().await;
        Some(self.complete(completion))
    }

    fn resolve(&mut self, result: Result<String, GenerationError>) -> Result<ReplyKind, SubmitError> {
        let parsed = result
            .map_err(SubmitError::from)
            .and_then(|body| contract::parse_reply(&body));

        match parsed {
            Ok(reply) => {
                self.turns.push(ChatTurn::model(reply.explanation.clone()));
                if reply.has_source() {
                    info!("artifact updated");
                    self.artifact = Some(reply);
                    Ok(ReplyKind::ArtifactUpdated)
                } else {
                    debug!("conversational reply, artifact kept");
                    Ok(ReplyKind::Conversational)
                }
            }
            Err(err) => {
                let message = err.to_string();
                warn!(kind = err.kind(), error = %message, "generation failed");
                self.turns
                    .push(ChatTurn::model(format!("Sorry, something went wrong: {}", message)));
                self.last_error = Some(message);
                Err(err)
            }
        }
    }
}
