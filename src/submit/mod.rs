use crate::api::{interpret, NoteRequest, NoteTransport, SubmissionOutcome};
use crate::config::{NoteSurface, NotesConfig};
use crate::dom::{Page, Scope};
use crate::sync::{ListSynchronizer, MergeOutcome};
use crate::target::{root_scope, ResolutionFailure, TargetResolver};
use crate::token::TokenProvider;
use leptos::logging::{error, log, warn};
use std::cell::Cell;
use std::rc::Rc;
use thiserror::Error;

pub(crate) const PAYLOAD_KEY_ATTR: &str = "data-notes-payload-key";
const NOTE_ERROR_ATTR: &str = "data-note-error";

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct AnnotationDraft {
    text: String,
}

impl AnnotationDraft {
    pub fn new(raw: &str) -> Self {
        Self {
            text: raw.trim().to_string(),
        }
    }

    /// Trimmed text, or `None` when there is nothing to send.
    pub fn submittable(&self) -> Option<&str> {
        (!self.text.is_empty()).then_some(self.text.as_str())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, strum::Display)]
pub(crate) enum SubmitPhase {
    Idle,
    Validating,
    Sending,
    Succeeded,
    Rejected,
    Failed,
}

/// Per-trigger submission state. At most one request in flight per gate.
#[derive(Debug)]
pub(crate) struct SubmitGate {
    phase: Cell<SubmitPhase>,
    last: Cell<Option<SubmitPhase>>,
}

impl Default for SubmitGate {
    fn default() -> Self {
        Self {
            phase: Cell::new(SubmitPhase::Idle),
            last: Cell::new(None),
        }
    }
}

impl SubmitGate {
    pub fn phase(&self) -> SubmitPhase {
        self.phase.get()
    }

    /// Terminal phase of the most recent completed attempt.
    #[cfg(test)]
    pub fn last_outcome(&self) -> Option<SubmitPhase> {
        self.last.get()
    }

    fn try_begin(&self) -> bool {
        if self.phase.get() != SubmitPhase::Idle {
            return false;
        }
        self.phase.set(SubmitPhase::Validating);
        true
    }

    fn enter(&self, phase: SubmitPhase) {
        self.phase.set(phase);
    }

    fn settle(&self, terminal: Option<SubmitPhase>) {
        if let Some(t) = terminal {
            self.last.set(Some(t));
        }
        self.phase.set(SubmitPhase::Idle);
    }
}

#[derive(Debug, Error, PartialEq)]
pub(crate) enum SubmitError {
    #[error("note text is empty")]
    ValidationEmpty,

    #[error(transparent)]
    Resolution(#[from] ResolutionFailure),

    #[error("no note input found for trigger")]
    MissingInput,

    #[error("a submission is already in flight")]
    Busy,

    #[error("permission denied")]
    PermissionDenied,

    #[error("note request failed: {0}")]
    TransportOrServer(String),

    #[error("malformed note response: {0}")]
    MalformedResponse(String),
}

impl SubmitError {
    /// Text for the inline warning, if this error is shown to the user at all.
    pub fn user_message<'a>(&self, config: &'a NotesConfig) -> Option<&'a str> {
        match self {
            SubmitError::PermissionDenied => Some(config.permission_denied_message.as_str()),
            SubmitError::TransportOrServer(_) | SubmitError::MalformedResponse(_) => {
                Some(config.generic_failure_message.as_str())
            }
            SubmitError::ValidationEmpty
            | SubmitError::Resolution(_)
            | SubmitError::MissingInput
            | SubmitError::Busy => None,
        }
    }

    fn terminal_phase(&self) -> Option<SubmitPhase> {
        match self {
            SubmitError::PermissionDenied => Some(SubmitPhase::Rejected),
            SubmitError::TransportOrServer(_) | SubmitError::MalformedResponse(_) => {
                Some(SubmitPhase::Failed)
            }
            _ => None,
        }
    }
}

/// Drives one submission from click to merged list (or inline warning).
pub(crate) struct AnnotationSubmitter<P: Page, T: NoteTransport> {
    page: Rc<P>,
    transport: Rc<T>,
    config: Rc<NotesConfig>,
    surface: NoteSurface,
    resolver: TargetResolver,
    tokens: TokenProvider,
    list: ListSynchronizer,
}

impl<P: Page, T: NoteTransport> AnnotationSubmitter<P, T> {
    pub fn new(page: Rc<P>, transport: Rc<T>, config: Rc<NotesConfig>) -> Self {
        let surface = config.surface();
        Self {
            resolver: TargetResolver::from_config(&config),
            tokens: TokenProvider::new(&config),
            list: ListSynchronizer::new(&surface),
            page,
            transport,
            config,
            surface,
        }
    }

    pub fn surface(&self) -> &NoteSurface {
        &self.surface
    }

    pub async fn submit(&self, gate: &SubmitGate, trigger: &P::Node) -> Result<MergeOutcome, SubmitError> {
        if !gate.try_begin() {
            log!("notes: ignoring click while {}", gate.phase());
            return Err(SubmitError::Busy);
        }

        let result = self.run(gate, trigger).await;
        match &result {
            Ok(merged) => {
                log!("notes: saved ({merged:?})");
                gate.settle(Some(SubmitPhase::Succeeded));
            }
            Err(e @ (SubmitError::Resolution(_) | SubmitError::MissingInput)) => {
                warn!("notes: submission aborted: {e}");
                gate.settle(None);
            }
            Err(e) => {
                if e.terminal_phase().is_some() {
                    error!("notes: submission failed: {e}");
                }
                gate.settle(e.terminal_phase());
            }
        }
        result
    }

    async fn run(&self, gate: &SubmitGate, trigger: &P::Node) -> Result<MergeOutcome, SubmitError> {
        let page = self.page.as_ref();
        // Validation needs only the input, so it runs before the record lookup.
        let scope = root_scope(page, &self.surface, trigger);
        let input = self
            .surface
            .input
            .find_or_document(page, &scope)
            .ok_or(SubmitError::MissingInput)?;

        let draft = AnnotationDraft::new(&page.value(&input));
        let Some(text) = draft.submittable() else {
            page.add_class(&input, &self.config.invalid_class);
            return Err(SubmitError::ValidationEmpty);
        };

        let target = self.resolver.resolve(page, &self.surface, trigger)?;

        gate.enter(SubmitPhase::Sending);
        let request = NoteRequest {
            url: self.surface.endpoint.resolve(page, trigger, &target.record_id),
            payload_key: page
                .attribute(trigger, PAYLOAD_KEY_ATTR)
                .filter(|k| !k.trim().is_empty())
                .unwrap_or_else(|| self.config.payload_key.clone()),
            text: text.to_string(),
            token: self.tokens.resolve(page, &target.root_scope),
        };

        let outcome = interpret(self.transport.post_note(&request).await);
        let feedback = InlineFeedback::new(page, trigger, &target.root_scope);

        match outcome {
            SubmissionOutcome::Success { fragment_html } => {
                let merged = self.list.merge(page, &target.root_scope, &fragment_html);
                page.set_value(&input, "");
                page.remove_class(&input, &self.config.invalid_class);
                page.focus(&input);
                feedback.clear();
                Ok(merged)
            }
            SubmissionOutcome::Empty => {
                page.set_value(&input, "");
                Ok(self.list.reload(page))
            }
            SubmissionOutcome::AuthDenied => {
                let err = SubmitError::PermissionDenied;
                feedback.show(err.user_message(&self.config).unwrap_or_default());
                Err(err)
            }
            SubmissionOutcome::TransportError { detail, .. } => {
                let err = SubmitError::TransportOrServer(detail);
                feedback.show(err.user_message(&self.config).unwrap_or_default());
                Err(err)
            }
            SubmissionOutcome::MalformedResponse { detail } => {
                let err = SubmitError::MalformedResponse(detail);
                feedback.show(err.user_message(&self.config).unwrap_or_default());
                Err(err)
            }
        }
    }
}

/// The inline warning next to a notes widget: one per container, reused.
struct InlineFeedback<'a, P: Page> {
    page: &'a P,
    container: Option<P::Node>,
}

impl<'a, P: Page> InlineFeedback<'a, P> {
    fn new(page: &'a P, trigger: &P::Node, scope: &Scope<P::Node>) -> Self {
        let container = scope
            .element()
            .cloned()
            .or_else(|| page.parent(trigger))
            .or_else(|| page.body());
        Self { page, container }
    }

    fn selector() -> String {
        format!("[{NOTE_ERROR_ATTR}]")
    }

    fn existing(&self) -> Option<P::Node> {
        let container = self.container.as_ref()?;
        self.page
            .query(&Scope::Element(container.clone()), &Self::selector())
    }

    fn show(&self, message: &str) {
        let Some(container) = self.container.as_ref() else {
            return;
        };
        let el = match self.existing() {
            Some(w) => w,
            None => {
                let Some(w) = self.page.create_element("div") else {
                    return;
                };
                self.page.set_attribute(&w, "class", "alert alert-warning");
                self.page.set_attribute(&w, "role", "alert");
                self.page.set_attribute(&w, "data-auto-dismiss", "false");
                self.page.set_attribute(&w, NOTE_ERROR_ATTR, "true");
                self.page.insert_first(container, &w);
                w
            }
        };
        self.page.set_text(&el, message);
    }

    fn clear(&self) {
        if let Some(w) = self.existing() {
            self.page.remove(&w);
        }
    }
}
