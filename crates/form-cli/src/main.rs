mod logging;
mod wizard;

use clap::{Args, Parser, Subcommand};
use form_runtime::{
    Effect, FormConfig, FormEvent, FormSession, HttpTransport, LOAD_FAILED_MESSAGE,
    SchemaSource, SessionError, SessionView, config::DEFAULT_STORAGE_KEY, load_schema,
};
use form_spec::{
    AdvanceLabel, AnswerStore, Control, FieldInput, FieldTarget, FieldView, FileKeyValueStore,
    FormSchema, InputError, KeyValueStore, SectionView, TextKind, check_schema, document_schema,
};
use std::env;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::info;
use wizard::{AnswerParseError, PromptContext, RenderMode, Verbosity, WizardPresenter};

type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

type Session = FormSession<FileKeyValueStore, HttpTransport>;

#[derive(Parser)]
#[command(
    author,
    version,
    about = "Schema-driven requirements form in the terminal",
    long_about = "Walks a multi-section requirements form, keeps a draft between runs, and submits the answers to a form-delivery endpoint"
)]
struct Cli {
    /// Log at debug level (overrides RUST_LOG).
    #[arg(long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Fill in the form section by section.
    Run {
        /// Schema document path or http(s) URL (defaults to the config value).
        #[arg(long, value_name = "SRC")]
        schema: Option<String>,
        /// JSON config file.
        #[arg(long, value_name = "FILE")]
        config: Option<PathBuf>,
        /// Directory holding drafts (defaults to REQFORM_DRAFT_DIR or ./.reqform).
        #[arg(long, value_name = "DIR")]
        draft_dir: Option<PathBuf>,
        /// Form-delivery endpoint.
        #[arg(long, value_name = "URL")]
        endpoint: Option<String>,
        /// Access key sent with every submission.
        #[arg(long, value_name = "KEY")]
        access_key: Option<String>,
        /// Section output mode.
        #[arg(long, value_enum, default_value_t = RenderMode::Text)]
        format: RenderMode,
    },
    /// Load a schema and report structural problems.
    Check {
        /// Schema document path or http(s) URL.
        #[arg(long, value_name = "SRC")]
        schema: String,
        /// Report output mode.
        #[arg(long, value_enum, default_value_t = RenderMode::Text)]
        format: RenderMode,
    },
    /// Print the JSON Schema of the schema document format.
    Schema,
    /// Inspect or discard the saved draft.
    Draft {
        #[command(subcommand)]
        action: DraftAction,
    },
}

#[derive(Subcommand)]
enum DraftAction {
    /// Print the saved draft record.
    Show(DraftTarget),
    /// Delete the saved draft record.
    Clear(DraftTarget),
}

#[derive(Args)]
struct DraftTarget {
    /// Directory holding drafts (defaults to REQFORM_DRAFT_DIR or ./.reqform).
    #[arg(long, value_name = "DIR")]
    draft_dir: Option<PathBuf>,
    /// Key the draft is stored under.
    #[arg(long, value_name = "KEY", default_value = DEFAULT_STORAGE_KEY)]
    storage_key: String,
}

struct RunOptions {
    schema: Option<String>,
    config: Option<PathBuf>,
    draft_dir: Option<PathBuf>,
    endpoint: Option<String>,
    access_key: Option<String>,
    format: RenderMode,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Eof,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Action {
    Advance,
    Back,
    Save,
    Quit,
}

fn main() -> CliResult<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose);
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    runtime.block_on(run_command(cli.command, cli.verbose))
}

async fn run_command(command: Command, verbose: bool) -> CliResult<()> {
    match command {
        Command::Run {
            schema,
            config,
            draft_dir,
            endpoint,
            access_key,
            format,
        } => {
            let options = RunOptions {
                schema,
                config,
                draft_dir,
                endpoint,
                access_key,
                format,
            };
            run_form(options, verbose).await
        }
        Command::Check { schema, format } => run_check(&schema, format).await,
        Command::Schema => {
            println!("{}", serde_json::to_string_pretty(&document_schema())?);
            Ok(())
        }
        Command::Draft { action } => match action {
            DraftAction::Show(target) => run_draft_show(target),
            DraftAction::Clear(target) => run_draft_clear(target),
        },
    }
}

fn load_config(path: Option<&Path>) -> CliResult<FormConfig> {
    match path {
        Some(path) => Ok(FormConfig::from_path(path)?),
        None => Ok(FormConfig::default()),
    }
}

fn resolve_draft_dir(dir: Option<PathBuf>) -> CliResult<PathBuf> {
    let candidate = match dir {
        Some(path) => path,
        None => env::var_os("REQFORM_DRAFT_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(".reqform")),
    };
    if candidate.as_os_str().is_empty() {
        return Err("draft directory cannot be empty".into());
    }
    Ok(candidate)
}

async fn load_or_report(raw: &str) -> CliResult<FormSchema> {
    let source = SchemaSource::parse(raw);
    match load_schema(&source).await {
        Ok(schema) => Ok(schema),
        Err(err) => {
            eprintln!("{}", LOAD_FAILED_MESSAGE);
            Err(err.into())
        }
    }
}

async fn run_form(options: RunOptions, verbose: bool) -> CliResult<()> {
    let mut config = load_config(options.config.as_deref())?;
    if let Some(schema) = options.schema {
        config.schema = schema;
    }
    if let Some(endpoint) = options.endpoint {
        config.endpoint = endpoint;
    }
    if let Some(access_key) = options.access_key {
        config.access_key = access_key;
    }

    let schema = load_or_report(&config.schema).await?;
    let backend = FileKeyValueStore::new(resolve_draft_dir(options.draft_dir)?);
    let store = AnswerStore::restore(backend, config.storage_key.clone());
    let draft_path = store.backend().path_for(store.key());
    let transport = HttpTransport::new(config.endpoint.clone());
    info!(
        schema = %config.schema,
        draft = %draft_path.display(),
        endpoint = transport.endpoint(),
        "starting form session"
    );
    let session = FormSession::new(schema, store, transport, &config)?;
    let presenter = WizardPresenter::new(Verbosity::from_verbose(verbose), options.format);
    run_session(session, &presenter, &draft_path).await
}

async fn run_session(
    mut session: Session,
    presenter: &WizardPresenter,
    draft_path: &Path,
) -> CliResult<()> {
    loop {
        let view = session.view().ok_or("form schema has no sections")?;
        match view {
            SessionView::ThankYou(thanks) => {
                presenter.show_thank_you(&thanks);
                match prompt_line(&format!("{}? [y/N]", thanks.action), None)? {
                    Some(answer) if is_yes(&answer) => {
                        session.dispatch(FormEvent::StartOver).await?;
                    }
                    _ => return Ok(()),
                }
            }
            SessionView::Section(section) => {
                presenter.show_section(&section);
                if fill_section(&mut session, presenter, &section).await? == Flow::Eof {
                    return finish_early(draft_path);
                }
                if act_on_section(&mut session, presenter, &section).await? == Flow::Eof {
                    return finish_early(draft_path);
                }
            }
        }
    }
}

fn finish_early(draft_path: &Path) -> CliResult<()> {
    println!("Progress is kept in {}", draft_path.display());
    Ok(())
}

/// Action prompt after the fields; returns once the section changed or the user left.
async fn act_on_section(
    session: &mut Session,
    presenter: &WizardPresenter,
    section: &SectionView,
) -> CliResult<Flow> {
    loop {
        let action = match prompt_action(section)? {
            Some(action) => action,
            None => return Ok(Flow::Eof),
        };
        let effect = match action {
            Action::Quit => return Ok(Flow::Eof),
            Action::Save => session.dispatch(FormEvent::SaveProgress).await?,
            Action::Back => session.dispatch(FormEvent::Back).await?,
            Action::Advance => {
                if section.is_last() {
                    println!("{}", AdvanceLabel::Sending.as_str());
                }
                session.dispatch(FormEvent::Next).await?
            }
        };
        if let Some(toast) = session.notifier_mut().take() {
            presenter.show_toast(&toast);
        }
        match effect {
            Effect::Advanced(transition) | Effect::Retreated(transition) => {
                presenter.show_transition(transition);
                return Ok(Flow::Continue);
            }
            Effect::Submitted | Effect::SubmitFailed(_) => return Ok(Flow::Continue),
            _ => {}
        }
    }
}

fn prompt_action(section: &SectionView) -> CliResult<Option<Action>> {
    let mut menu = format!("[n] {}", section.advance.as_str());
    if section.back_visible {
        menu.push_str("  [b] Back");
    }
    menu.push_str("  [s] Save progress  [q] Quit");
    loop {
        let Some(raw) = prompt_line(&menu, None)? else {
            return Ok(None);
        };
        match parse_action(&raw) {
            Some(Action::Back) if !section.back_visible => {
                println!("Already on the first section.");
            }
            Some(action) => return Ok(Some(action)),
            None => println!("Choose n, b, s or q."),
        }
    }
}

fn parse_action(raw: &str) -> Option<Action> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "" | "n" | "next" | "submit" => Some(Action::Advance),
        "b" | "back" => Some(Action::Back),
        "s" | "save" => Some(Action::Save),
        "q" | "quit" => Some(Action::Quit),
        _ => None,
    }
}

fn is_yes(raw: &str) -> bool {
    matches!(raw.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}

fn current_field(session: &Session, id: &str) -> Option<FieldView> {
    session.section_view()?.field(id).cloned()
}

/// Prompts every field of the section; revealed custom and child fields follow their parent.
async fn fill_section(
    session: &mut Session,
    presenter: &WizardPresenter,
    section: &SectionView,
) -> CliResult<Flow> {
    let total = section.fields.len();
    let ids = section
        .fields
        .iter()
        .map(|field| field.id.clone())
        .collect::<Vec<_>>();
    for (position, id) in ids.iter().enumerate() {
        let Some(field) = current_field(session, id) else {
            continue;
        };
        let prompt = PromptContext::for_field(&field, position, total);
        let flow = prompt_control(
            session,
            presenter,
            id,
            FieldTarget::Question,
            &field.control,
            &prompt,
        )
        .await?;
        if flow == Flow::Eof {
            return Ok(Flow::Eof);
        }

        let Some(field) = current_field(session, id) else {
            continue;
        };
        if let Some(custom) = &field.custom {
            let control = Control::TextInput {
                kind: TextKind::Text,
                value: custom.value.clone(),
                placeholder: None,
            };
            let prompt = PromptContext::for_custom(custom, position, total);
            let flow =
                prompt_control(session, presenter, id, FieldTarget::Custom, &control, &prompt)
                    .await?;
            if flow == Flow::Eof {
                return Ok(Flow::Eof);
            }
        }
        if let Some(child) = &field.conditional
            && let Some(control) = &child.control
        {
            let prompt = PromptContext::for_child(child, control, position, total);
            let flow =
                prompt_control(session, presenter, id, FieldTarget::Child, control, &prompt)
                    .await?;
            if flow == Flow::Eof {
                return Ok(Flow::Eof);
            }
        }
    }
    Ok(Flow::Continue)
}

async fn prompt_control(
    session: &mut Session,
    presenter: &WizardPresenter,
    id: &str,
    target: FieldTarget,
    control: &Control,
    prompt: &PromptContext,
) -> CliResult<Flow> {
    presenter.show_prompt(prompt);
    loop {
        let Some(raw) = prompt_line(">", prompt.current.as_deref())? else {
            return Ok(Flow::Eof);
        };
        if raw.is_empty() {
            return Ok(Flow::Continue);
        }
        if raw == "?" {
            show_explanation(session, presenter, id).await?;
            continue;
        }
        let events = match parse_answer(id, target, control, &raw) {
            Ok(events) => events,
            Err(err) => {
                presenter.show_parse_error(&err);
                continue;
            }
        };
        match apply_events(session, events).await {
            Ok(()) => return Ok(Flow::Continue),
            Err(SessionError::Input(InputError::Store(err)) | SessionError::Store(err)) => {
                presenter.show_storage_error(&err)
            }
            Err(SessionError::Input(err)) => presenter.show_input_error(&err),
            Err(other) => return Err(other.into()),
        }
    }
}

async fn apply_events(session: &mut Session, events: Vec<FormEvent>) -> Result<(), SessionError> {
    for event in events {
        session.dispatch(event).await?;
    }
    Ok(())
}

async fn show_explanation(
    session: &mut Session,
    presenter: &WizardPresenter,
    id: &str,
) -> CliResult<()> {
    session
        .dispatch(FormEvent::ShowExplanation { id: id.to_string() })
        .await?;
    match session.banner().text() {
        Some(text) => presenter.show_banner(text),
        None => println!("No explanation for this question."),
    }
    session.dispatch(FormEvent::DismissExplanation).await?;
    Ok(())
}

/// Turns one typed answer into the events the matching control would emit.
fn parse_answer(
    id: &str,
    target: FieldTarget,
    control: &Control,
    raw: &str,
) -> Result<Vec<FormEvent>, AnswerParseError> {
    let raw = raw.trim();
    let input = |input: FieldInput| FormEvent::Input {
        id: id.to_string(),
        target,
        input,
    };
    match control {
        Control::TextInput { .. } | Control::TextArea { .. } => {
            let value = if raw == "-" { "" } else { raw };
            Ok(vec![input(FieldInput::Text(value.to_string()))])
        }
        Control::Dropdown { options, .. } => {
            if raw == "-" {
                return Ok(vec![input(FieldInput::Select(String::new()))]);
            }
            let option = resolve_choice(options, raw)?;
            Ok(vec![input(FieldInput::Select(option))])
        }
        Control::RadioGroup { options } => {
            let labels = options
                .iter()
                .map(|choice| choice.label.clone())
                .collect::<Vec<_>>();
            let option = resolve_choice(&labels, raw)?;
            Ok(vec![input(FieldInput::Select(option))])
        }
        Control::CheckboxGroup { options } => {
            let labels = options
                .iter()
                .map(|choice| choice.label.clone())
                .collect::<Vec<_>>();
            let wanted = if raw == "-" {
                Vec::new()
            } else {
                raw.split(',')
                    .map(str::trim)
                    .filter(|part| !part.is_empty())
                    .map(|part| resolve_choice(&labels, part))
                    .collect::<Result<Vec<_>, _>>()?
            };
            Ok(options
                .iter()
                .filter(|choice| choice.checked != wanted.contains(&choice.label))
                .map(|choice| {
                    input(FieldInput::Toggle {
                        option: choice.label.clone(),
                        checked: !choice.checked,
                    })
                })
                .collect())
        }
        Control::FileUpload { .. } => {
            let paths = raw
                .split(',')
                .map(str::trim)
                .filter(|part| !part.is_empty())
                .map(PathBuf::from)
                .collect::<Vec<_>>();
            if let Some(missing) = paths.iter().find(|path| !path.is_file()) {
                return Err(AnswerParseError::new(
                    format!("file '{}' does not exist", missing.display()),
                    Some("comma-separated paths to existing files".into()),
                ));
            }
            Ok(vec![FormEvent::Attach {
                id: id.to_string(),
                target,
                paths,
            }])
        }
    }
}

fn resolve_choice(options: &[String], raw: &str) -> Result<String, AnswerParseError> {
    if let Ok(number) = raw.parse::<usize>()
        && (1..=options.len()).contains(&number)
    {
        return Ok(options[number - 1].clone());
    }
    options
        .iter()
        .find(|option| option.eq_ignore_ascii_case(raw))
        .cloned()
        .ok_or_else(|| {
            AnswerParseError::new(
                format!("'{}' is not one of the options", raw),
                Some(format!("1-{} or one of: {}", options.len(), options.join(", "))),
            )
        })
}

async fn run_check(raw: &str, format: RenderMode) -> CliResult<()> {
    let schema = load_or_report(raw).await?;
    let report = check_schema(&schema);
    match format {
        RenderMode::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        RenderMode::Text if report.is_clean() => println!(
            "Schema OK: {} sections, {} questions",
            schema.len(),
            schema.questions().count()
        ),
        RenderMode::Text => {
            for issue in &report.issues {
                println!(
                    "{} [{}] {}",
                    issue.question_id.as_deref().unwrap_or("-"),
                    issue.code,
                    issue.message
                );
            }
        }
    }
    if report.is_clean() {
        Ok(())
    } else {
        Err(format!("{} schema issue(s) found", report.issues.len()).into())
    }
}

fn run_draft_show(target: DraftTarget) -> CliResult<()> {
    let backend = FileKeyValueStore::new(resolve_draft_dir(target.draft_dir)?);
    if backend.get(&target.storage_key)?.is_none() {
        println!(
            "No saved draft for '{}' in {}",
            target.storage_key,
            backend.dir().display()
        );
        return Ok(());
    }
    let store = AnswerStore::restore(backend, target.storage_key);
    println!("{}", serde_json::to_string_pretty(&store.snapshot())?);
    Ok(())
}

fn run_draft_clear(target: DraftTarget) -> CliResult<()> {
    let mut backend = FileKeyValueStore::new(resolve_draft_dir(target.draft_dir)?);
    backend.remove(&target.storage_key)?;
    info!(key = %target.storage_key, "draft cleared");
    println!("Cleared draft '{}'", target.storage_key);
    Ok(())
}

fn prompt_line(prompt: &str, current: Option<&str>) -> CliResult<Option<String>> {
    if let Some(current_value) = current {
        print!("{} [{}]: ", prompt, current_value);
    } else {
        print!("{}: ", prompt);
    }
    io::stdout().flush()?;
    let mut line = String::new();
    if io::stdin().read_line(&mut line)? == 0 {
        println!();
        return Ok(None);
    }
    Ok(Some(line.trim().to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use form_spec::Choice;
    use std::sync::Mutex;

    static ENV_LOCK: Mutex<()> = Mutex::new(());

    fn choices(labels: &[(&str, bool)]) -> Vec<Choice> {
        labels
            .iter()
            .map(|(label, checked)| Choice {
                label: label.to_string(),
                checked: *checked,
            })
            .collect()
    }

    fn single_input(events: Vec<FormEvent>) -> FieldInput {
        assert_eq!(events.len(), 1);
        match events.into_iter().next() {
            Some(FormEvent::Input { input, .. }) => input,
            other => panic!("expected input event, got {other:?}"),
        }
    }

    #[test]
    fn actions_accept_short_and_long_forms() {
        assert_eq!(parse_action(""), Some(Action::Advance));
        assert_eq!(parse_action("Submit"), Some(Action::Advance));
        assert_eq!(parse_action("b"), Some(Action::Back));
        assert_eq!(parse_action("save"), Some(Action::Save));
        assert_eq!(parse_action("Q"), Some(Action::Quit));
        assert_eq!(parse_action("later"), None);
    }

    #[test]
    fn choices_resolve_by_number_or_label() {
        let options = vec!["Retail".to_string(), "Other".to_string()];
        assert_eq!(resolve_choice(&options, "2").expect("number"), "Other");
        assert_eq!(resolve_choice(&options, "retail").expect("label"), "Retail");
        assert!(resolve_choice(&options, "3").is_err());
        assert!(resolve_choice(&options, "Finance").is_err());
    }

    #[test]
    fn dropdown_dash_selects_placeholder() {
        let control = Control::Dropdown {
            placeholder: "Select an option...".into(),
            options: vec!["Managed".into()],
            selected: Some("Managed".into()),
        };
        let events = parse_answer("hosting", FieldTarget::Question, &control, "-").expect("parse");
        assert_eq!(single_input(events), FieldInput::Select(String::new()));
    }

    #[test]
    fn checkbox_answer_emits_only_changed_toggles() {
        let control = Control::CheckboxGroup {
            options: choices(&[("A", true), ("B", false), ("C", false)]),
        };
        let events =
            parse_answer("platforms", FieldTarget::Question, &control, "3").expect("parse");
        let inputs = events
            .into_iter()
            .map(|event| match event {
                FormEvent::Input { input, .. } => input,
                other => panic!("unexpected {other:?}"),
            })
            .collect::<Vec<_>>();
        assert_eq!(
            inputs,
            vec![
                FieldInput::Toggle {
                    option: "A".into(),
                    checked: false
                },
                FieldInput::Toggle {
                    option: "C".into(),
                    checked: true
                },
            ]
        );
    }

    #[test]
    fn child_answers_keep_their_target() {
        let control = Control::TextArea {
            value: String::new(),
            placeholder: Some("Please provide details...".into()),
        };
        let events =
            parse_answer("has_brand", FieldTarget::Child, &control, "Navy").expect("parse");
        assert_eq!(
            events,
            vec![FormEvent::child("has_brand", FieldInput::Text("Navy".into()))]
        );
    }

    #[test]
    fn file_answers_require_existing_files() {
        let dir = tempfile::tempdir().expect("temp dir");
        let present = dir.path().join("brief.pdf");
        std::fs::write(&present, b"%PDF").expect("write");
        let control = Control::FileUpload {
            status: "Click to Upload or drag files".into(),
            preview: None,
        };
        let events = parse_answer(
            "brief",
            FieldTarget::Question,
            &control,
            &present.display().to_string(),
        )
        .expect("parse");
        assert_eq!(
            events,
            vec![FormEvent::Attach {
                id: "brief".into(),
                target: FieldTarget::Question,
                paths: vec![present],
            }]
        );
        let missing = dir.path().join("missing.pdf");
        assert!(
            parse_answer(
                "brief",
                FieldTarget::Question,
                &control,
                &missing.display().to_string()
            )
            .is_err()
        );
    }

    #[test]
    fn draft_dir_prefers_flag_then_env() {
        let _lock = ENV_LOCK.lock().expect("env lock");
        assert_eq!(
            resolve_draft_dir(Some(PathBuf::from("flag"))).expect("flag"),
            PathBuf::from("flag")
        );
        unsafe { env::set_var("REQFORM_DRAFT_DIR", "from-env") };
        assert_eq!(
            resolve_draft_dir(None).expect("env"),
            PathBuf::from("from-env")
        );
        unsafe { env::remove_var("REQFORM_DRAFT_DIR") };
        assert_eq!(
            resolve_draft_dir(None).expect("default"),
            PathBuf::from(".reqform")
        );
        assert!(resolve_draft_dir(Some(PathBuf::new())).is_err());
    }
}
