use std::path::PathBuf;

use form_spec::{
    AnswerStore, FieldInput, FieldTarget, FormSchema, InputError, KeyValueStore, LiveFiles,
    Question, RenderContext, SectionView, StoreError, apply_input, check_schema, details_id,
    render_section, validate_section,
};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::FormConfig;
use crate::events::{EventQueue, FormEvent};
use crate::notify::{ExplanationBanner, Notifier};
use crate::submit::{
    NETWORK_ERROR_MESSAGE, SubmissionClient, SubmissionPayload, SubmitOutcome, Transport,
    TransportError,
};

pub const SAVED_MESSAGE: &str = "Progress saved!";

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("question '{0}' is not on the current section")]
    NotOnSection(String),
    #[error(transparent)]
    Input(#[from] InputError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Which screen is showing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Form,
    ThankYou,
}

/// Section change to animate: slide the old section out, then the new one in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub from: usize,
    pub to: usize,
}

/// Terminal view shown after a delivered submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThankYouView {
    pub heading: &'static str,
    pub message: &'static str,
    pub action: &'static str,
}

pub const THANK_YOU: ThankYouView = ThankYouView {
    heading: "Received!",
    message: "Thank you for detailing your project requirements. We will review the information and get back to you within 24 hours.",
    action: "Start New Project",
};

#[derive(Debug, Clone, PartialEq)]
pub enum SessionView {
    Section(SectionView),
    ThankYou(ThankYouView),
}

/// What handling an event did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Nothing beyond in-place updates of the current section.
    Updated,
    Ignored,
    Advanced(Transition),
    Retreated(Transition),
    Saved,
    Submitted,
    SubmitFailed(String),
    SubmitIgnored,
    Restarted,
}

/// Drives one form: the section controller, the answer store, and submission.
pub struct FormSession<S, T> {
    schema: FormSchema,
    store: AnswerStore<S>,
    client: SubmissionClient<T>,
    access_key: String,
    subject: String,
    files: LiveFiles,
    banner: ExplanationBanner,
    notifier: Notifier,
    screen: Screen,
    queue: EventQueue,
}

impl<S: KeyValueStore, T: Transport> FormSession<S, T> {
    /// Takes a restored store; an index past the last section is pulled back onto it.
    pub fn new(
        schema: FormSchema,
        mut store: AnswerStore<S>,
        transport: T,
        config: &FormConfig,
    ) -> Result<Self, SessionError> {
        for issue in check_schema(&schema).issues {
            warn!(
                code = %issue.code,
                question = issue.question_id.as_deref().unwrap_or("-"),
                "{}",
                issue.message
            );
        }
        if !schema.is_empty() && store.section_index() >= schema.len() {
            warn!(
                index = store.section_index(),
                sections = schema.len(),
                "restored section index is out of range"
            );
            store.set_section_index(schema.last_index())?;
        }
        Ok(Self {
            schema,
            store,
            client: SubmissionClient::new(transport),
            access_key: config.access_key.clone(),
            subject: config.subject.clone(),
            files: LiveFiles::new(),
            banner: ExplanationBanner::default(),
            notifier: Notifier::new(config.toast_duration()),
            screen: Screen::Form,
            queue: EventQueue::default(),
        })
    }

    pub fn schema(&self) -> &FormSchema {
        &self.schema
    }

    pub fn store(&self) -> &AnswerStore<S> {
        &self.store
    }

    pub fn client(&self) -> &SubmissionClient<T> {
        &self.client
    }

    pub fn current_index(&self) -> usize {
        self.store.section_index()
    }

    pub fn screen(&self) -> Screen {
        self.screen
    }

    pub fn banner(&self) -> &ExplanationBanner {
        &self.banner
    }

    pub fn notifier(&self) -> &Notifier {
        &self.notifier
    }

    pub fn notifier_mut(&mut self) -> &mut Notifier {
        &mut self.notifier
    }

    pub fn live_files(&self) -> &LiveFiles {
        &self.files
    }

    pub fn is_last_section(&self) -> bool {
        self.current_index() + 1 >= self.schema.len()
    }

    /// Current screen, rebuilt from the store.
    pub fn view(&self) -> Option<SessionView> {
        match self.screen {
            Screen::ThankYou => Some(SessionView::ThankYou(THANK_YOU)),
            Screen::Form => {
                let ctx = RenderContext::new(self.store.answers(), &self.files)
                    .with_submitting(self.client.is_submitting());
                render_section(&self.schema, self.current_index(), &ctx).map(SessionView::Section)
            }
        }
    }

    pub fn section_view(&self) -> Option<SectionView> {
        match self.view() {
            Some(SessionView::Section(view)) => Some(view),
            _ => None,
        }
    }

    pub fn enqueue(&mut self, event: FormEvent) {
        self.queue.push(event);
    }

    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Handles queued events in order; stops at the first error, leaving the rest queued.
    pub async fn drain(&mut self) -> Result<Vec<Effect>, SessionError> {
        let mut effects = Vec::new();
        while let Some(event) = self.queue.pop() {
            effects.push(self.dispatch(event).await?);
        }
        Ok(effects)
    }

    pub async fn dispatch(&mut self, event: FormEvent) -> Result<Effect, SessionError> {
        debug!(?event, "dispatching");
        if self.screen == Screen::ThankYou {
            return Ok(match event {
                FormEvent::StartOver => self.start_over(),
                _ => Effect::Ignored,
            });
        }
        match event {
            FormEvent::Input { id, target, input } => self.input(&id, target, input),
            FormEvent::Attach { id, target, paths } => self.attach(&id, target, paths),
            FormEvent::ShowExplanation { id } => Ok(self.show_explanation(&id)),
            FormEvent::DismissExplanation => {
                self.banner.hide();
                Ok(Effect::Updated)
            }
            FormEvent::SaveProgress => {
                self.store.persist()?;
                self.notifier.success(SAVED_MESSAGE);
                Ok(Effect::Saved)
            }
            FormEvent::Next => self.next().await,
            FormEvent::Back => self.back(),
            FormEvent::StartOver => Ok(Effect::Ignored),
        }
    }

    fn current_question(&self, id: &str) -> Result<Question, SessionError> {
        self.schema
            .section(self.current_index())
            .and_then(|section| section.questions.iter().find(|question| question.id == id))
            .cloned()
            .ok_or_else(|| SessionError::NotOnSection(id.to_string()))
    }

    fn input(
        &mut self,
        id: &str,
        target: FieldTarget,
        input: FieldInput,
    ) -> Result<Effect, SessionError> {
        let question = self.current_question(id)?;
        let applied = apply_input(&question, target, input, &mut self.store)?;
        if let Some(change) = applied.conditional
            && !change.after.is_visible()
        {
            self.files.remove(&details_id(&question.id));
        }
        Ok(Effect::Updated)
    }

    fn attach(
        &mut self,
        id: &str,
        target: FieldTarget,
        paths: Vec<PathBuf>,
    ) -> Result<Effect, SessionError> {
        let question = self.current_question(id)?;
        let names = paths
            .iter()
            .map(|path| {
                path.file_name()
                    .map(|name| name.to_string_lossy().into_owned())
                    .unwrap_or_else(|| path.display().to_string())
            })
            .collect::<Vec<_>>();
        let applied = apply_input(&question, target, FieldInput::Files(names), &mut self.store)?;
        if let Some(key) = applied.key {
            self.files.insert(key, paths);
        }
        Ok(Effect::Updated)
    }

    fn show_explanation(&mut self, id: &str) -> Effect {
        match self
            .current_question(id)
            .ok()
            .and_then(|question| question.explanation)
        {
            Some(text) => {
                self.banner.show(text);
                Effect::Updated
            }
            None => Effect::Ignored,
        }
    }

    /// Moves to `index`: live file controls and the banner belong to the old section.
    fn go_to(&mut self, index: usize) -> Result<(), SessionError> {
        self.store.set_section_index(index)?;
        self.files.clear();
        self.banner.hide();
        Ok(())
    }

    pub async fn next(&mut self) -> Result<Effect, SessionError> {
        let from = self.current_index();
        if !validate_section(&self.schema, from, self.store.answers()).valid {
            return Ok(Effect::Ignored);
        }
        if !self.is_last_section() {
            let to = from + 1;
            self.go_to(to)?;
            info!(from, to, "advanced section");
            return Ok(Effect::Advanced(Transition { from, to }));
        }
        self.submit().await
    }

    pub fn back(&mut self) -> Result<Effect, SessionError> {
        let from = self.current_index();
        if from == 0 {
            return Ok(Effect::Ignored);
        }
        let to = from - 1;
        self.go_to(to)?;
        Ok(Effect::Retreated(Transition { from, to }))
    }

    async fn submit(&mut self) -> Result<Effect, SessionError> {
        if self.client.is_submitting() {
            return Ok(Effect::SubmitIgnored);
        }
        if self.access_key.is_empty() {
            warn!("submitting without an access key");
        }
        let mut payload =
            SubmissionPayload::from_answers(&self.access_key, &self.subject, self.store.answers());
        if let Err(err) = payload.attach_files(&self.files).await {
            warn!(error = %err, "could not read attachments");
            let message = match &err {
                TransportError::Attachment { path, .. } => {
                    format!("Could not read {}", path.display())
                }
                _ => NETWORK_ERROR_MESSAGE.to_string(),
            };
            self.notifier.error(message.clone());
            return Ok(Effect::SubmitFailed(message));
        }
        match self.client.submit(payload).await {
            Ok(SubmitOutcome::Delivered) => {
                self.screen = Screen::ThankYou;
                self.banner.hide();
                self.files.clear();
                self.store.clear()?;
                Ok(Effect::Submitted)
            }
            Ok(SubmitOutcome::Rejected(message)) => {
                self.notifier.error(message.clone());
                Ok(Effect::SubmitFailed(message))
            }
            Ok(SubmitOutcome::AlreadyInFlight) => Ok(Effect::SubmitIgnored),
            Err(_) => {
                self.notifier.error(NETWORK_ERROR_MESSAGE);
                Ok(Effect::SubmitFailed(NETWORK_ERROR_MESSAGE.to_string()))
            }
        }
    }

    fn start_over(&mut self) -> Effect {
        self.store.reset();
        self.files.clear();
        self.banner.hide();
        self.screen = Screen::Form;
        Effect::Restarted
    }
}
