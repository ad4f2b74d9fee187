use std::path::{Path, PathBuf};
use ratatui::layout::Rect;
use tokio::task::JoinHandle;
use tracing::{info, warn};
use a19_core::export;
use crate::highlight::CodeHighlighter;
use a19_core::{
    Attachment, Completion, Config, Conversation, GeminiClient, GeneratedArtifact, ReplyKind,
    STARTER_PROMPTS,
};

/// Ticks before the splash screen gives way on its own (~3s at 300ms)
pub const SPLASH_TICKS: u8 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Splash,
    Main,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Editing,
    /// Typing a file path to attach
    Attaching,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceTab {
    Preview,
    Html,
    Css,
    JavaScript,
}

impl SourceTab {
    pub const ALL: [SourceTab; 4] = [
        SourceTab::Preview,
        SourceTab::Html,
        SourceTab::Css,
        SourceTab::JavaScript,
    ];

    pub fn title(&self) -> &'static str {
        match self {
            SourceTab::Preview => "Preview",
            SourceTab::Html => "HTML",
            SourceTab::Css => "CSS",
            SourceTab::JavaScript => "JavaScript",
        }
    }

    pub fn index(&self) -> usize {
        Self::ALL.iter().position(|t| t == self).unwrap_or(0)
    }

    pub fn next(&self) -> Self {
        Self::ALL[(self.index() + 1) % Self::ALL.len()]
    }

    pub fn prev(&self) -> Self {
        Self::ALL[(self.index() + Self::ALL.len() - 1) % Self::ALL.len()]
    }

    /// Syntax name for the code tabs
    pub fn extension(&self) -> &'static str {
        match self {
            SourceTab::Preview | SourceTab::Html => "html",
            SourceTab::Css => "css",
            SourceTab::JavaScript => "js",
        }
    }

    /// The slice of the artifact this tab shows, if it is a code tab
    pub fn source<'a>(&self, artifact: &'a GeneratedArtifact) -> Option<&'a str> {
        match self {
            SourceTab::Preview => None,
            SourceTab::Html => Some(&artifact.html),
            SourceTab::Css => Some(&artifact.css),
            SourceTab::JavaScript => Some(&artifact.javascript),
        }
    }
}

pub struct App {
    // Core state
    pub should_quit: bool,
    pub screen: Screen,
    pub input_mode: InputMode,
    pub splash_ticks: u8,

    // Prompt input
    pub prompt_input: String,
    pub prompt_cursor: usize, // cursor position in prompt_input (chars)
    pub attach_input: String,

    // Conversation
    pub conversation: Conversation<GeminiClient>,
    pub generation_task: Option<JoinHandle<Completion>>,
    pub model: String,
    api_key: String,
    endpoint: String,

    // Chat pane
    pub chat_scroll: u16,
    pub chat_height: u16, // Height of chat area for scroll calculations
    pub chat_width: u16,  // Width of chat area for wrap calculations

    // Artifact pane
    pub active_tab: SourceTab,
    pub code_scroll: u16,
    pub code_height: u16,
    pub highlighter: CodeHighlighter,

    // Panel areas for mouse hit-testing (updated during render)
    pub chat_area: Option<Rect>,
    pub code_area: Option<Rect>,

    // Animation state
    pub animation_frame: u8, // 0-2 for ellipsis animation

    // One-line feedback in the footer (saved paths, attach errors, ...)
    pub status: Option<String>,
    pub export_dir: PathBuf,
}

impl App {
    pub fn new(config: &Config) -> Self {
        let api_key = config.api_key().unwrap_or_default();
        let client = GeminiClient::with_endpoint(&api_key, config.model(), config.endpoint());

        let status = if api_key.is_empty() {
            warn!("no API key configured");
            Some(format!(
                "No API key: set {} or add api_key to the config file",
                a19_core::config::API_KEY_ENV
            ))
        } else {
            None
        };

        Self {
            should_quit: false,
            screen: Screen::Splash,
            input_mode: InputMode::Normal,
            splash_ticks: 0,

            prompt_input: String::new(),
            prompt_cursor: 0,
            attach_input: String::new(),

            conversation: Conversation::new(client),
            generation_task: None,
            model: config.model().to_string(),
            api_key,
            endpoint: config.endpoint().to_string(),

            chat_scroll: 0,
            chat_height: 0,
            chat_width: 0,

            active_tab: SourceTab::Preview,
            code_scroll: 0,
            code_height: 0,
            highlighter: CodeHighlighter::new(),

            chat_area: None,
            code_area: None,

            animation_frame: 0,

            status,
            export_dir: config.export_dir(),
        }
    }

    pub fn is_loading(&self) -> bool {
        self.conversation.is_in_flight() || self.generation_task.is_some()
    }

    /// The welcome page shows until there is something to talk about
    pub fn show_welcome(&self) -> bool {
        self.conversation.turns().is_empty()
            && !self.is_loading()
            && self.conversation.last_error().is_none()
    }

    pub fn dismiss_splash(&mut self) {
        self.screen = Screen::Main;
        self.input_mode = InputMode::Editing;
    }

    /// Tick animation frame and splash timer (called by Tick event)
    pub fn tick(&mut self) {
        if self.screen == Screen::Splash {
            self.splash_ticks = self.splash_ticks.saturating_add(1);
            if self.splash_ticks >= SPLASH_TICKS {
                self.dismiss_splash();
            }
        }
        if self.is_loading() {
            self.animation_frame = (self.animation_frame + 1) % 3;
        }
    }

    /// Switch to the next known model. Only allowed before the first message,
    /// since a session is bound to the model it started with.
    pub fn cycle_model(&mut self) -> Option<&str> {
        if !self.conversation.turns().is_empty() || self.is_loading() {
            self.status = Some("Model can only change before the first message".to_string());
            return None;
        }

        let models = GeminiClient::list_models();
        let next = models
            .iter()
            .position(|m| *m == self.model)
            .map(|i| (i + 1) % models.len())
            .unwrap_or(0);

        let client = GeminiClient::with_endpoint(&self.api_key, &models[next], &self.endpoint);
        info!(model = client.model(), "model changed");
        self.model = client.model().to_string();
        let attachment = self.conversation.cancel_attachment();
        self.conversation = Conversation::new(client);
        if let Some(attachment) = attachment {
            self.conversation.attach(attachment);
        }
        self.status = Some(format!("Model: {}", self.model));
        Some(self.model.as_str())
    }

    /// Copy a starter prompt into the input (1-based, as shown on screen)
    pub fn use_starter(&mut self, number: usize) -> bool {
        match number.checked_sub(1).and_then(|i| STARTER_PROMPTS.get(i)) {
            Some(starter) => {
                self.prompt_input = starter.prompt.to_string();
                self.prompt_cursor = self.prompt_input.chars().count();
                self.input_mode = InputMode::Editing;
                true
            }
            None => false,
        }
    }

    /// Hand the prompt to the conversation and spawn the request
    pub fn submit_prompt(&mut self) {
        // A finished but unpolled task still owes the transcript its reply
        if self.generation_task.is_some() {
            return;
        }
        if let Some(pending) = self.conversation.begin(&mut self.prompt_input) {
            self.prompt_cursor = 0;
            self.status = None;
            self.generation_task = Some(tokio::spawn(pending.send()));
            self.scroll_chat_to_bottom();
        }
    }

    /// Apply the background request once it has finished
    pub async fn poll_generation(&mut self) {
        let finished = self
            .generation_task
            .as_ref()
            .map(|task| task.is_finished())
            .unwrap_or(false);
        if !finished {
            return;
        }

        if let Some(task) = self.generation_task.take() {
            let outcome = match task.await {
                Ok(completion) => self.conversation.complete(completion),
                Err(e) => Err(self.conversation.abort(e.to_string())),
            };

            if let Ok(ReplyKind::ArtifactUpdated) = outcome {
                self.code_scroll = 0;
                self.status = Some("Website updated".to_string());
            }
            self.scroll_chat_to_bottom();
        }
    }

    pub fn attach_from_input(&mut self) {
        let path = self.attach_input.trim().to_string();
        self.attach_input.clear();
        self.input_mode = InputMode::Editing;
        if path.is_empty() {
            return;
        }
        self.attach_path(Path::new(&expand_home(&path)));
    }

    pub fn attach_path(&mut self, path: &Path) {
        match Attachment::from_path(path) {
            Ok(attachment) => {
                self.status = Some(format!("Attached {}", attachment.name()));
                self.conversation.attach(attachment);
            }
            Err(e) => {
                warn!(error = %e, "attachment rejected");
                self.status = Some(e.to_string());
            }
        }
    }

    pub fn cancel_attachment(&mut self) {
        if let Some(removed) = self.conversation.cancel_attachment() {
            self.status = Some(format!("Removed {}", removed.name()));
        }
    }

    // Artifact tabs
    pub fn next_tab(&mut self) {
        self.active_tab = self.active_tab.next();
        self.code_scroll = 0;
    }

    pub fn prev_tab(&mut self) {
        self.active_tab = self.active_tab.prev();
        self.code_scroll = 0;
    }

    pub fn current_source(&self) -> Option<&str> {
        self.conversation
            .artifact()
            .and_then(|artifact| self.active_tab.source(artifact))
    }

    pub fn save_archive(&mut self) {
        let Some(artifact) = self.conversation.artifact() else {
            self.status = Some("Nothing to save yet".to_string());
            return;
        };
        self.status = Some(match export::save_archive(artifact, &self.export_dir) {
            Ok(path) => format!("Saved {}", path.display()),
            Err(e) => format!("Save failed: {}", e),
        });
    }

    /// Write the composed preview document and return its path
    pub fn write_preview(&mut self) -> Option<PathBuf> {
        let artifact = self.conversation.artifact()?;
        let dir = std::env::temp_dir().join("a19");
        match export::save_preview(artifact, &dir) {
            Ok(path) => {
                info!(path = %path.display(), "wrote preview document");
                Some(path)
            }
            Err(e) => {
                self.status = Some(format!("Preview failed: {}", e));
                None
            }
        }
    }

    // Code scrolling
    fn code_line_count(&self) -> u16 {
        self.current_source()
            .map(|s| s.lines().count().min(u16::MAX as usize) as u16)
            .unwrap_or(0)
    }

    pub fn scroll_code_down(&mut self, lines: u16) {
        let max_scroll = self.code_line_count().saturating_sub(self.code_height);
        self.code_scroll = self.code_scroll.saturating_add(lines).min(max_scroll);
    }

    pub fn scroll_code_up(&mut self, lines: u16) {
        self.code_scroll = self.code_scroll.saturating_sub(lines);
    }

    pub fn scroll_chat_down(&mut self, lines: u16) {
        self.chat_scroll = self.chat_scroll.saturating_add(lines);
    }

    pub fn scroll_chat_up(&mut self, lines: u16) {
        self.chat_scroll = self.chat_scroll.saturating_sub(lines);
    }

    /// Scroll chat to bottom so the newest turn (or "Generating...") is visible
    pub fn scroll_chat_to_bottom(&mut self) {
        // Use actual chat width for wrap calculation, default to 40 if not set
        let wrap_width = if self.chat_width > 0 {
            self.chat_width as usize
        } else {
            40
        };

        let mut total_lines: u16 = 0;

        for turn in self.conversation.turns() {
            total_lines = total_lines.saturating_add(1); // Role line
            for line in turn.text.lines() {
                // Character count, not byte length, for UTF-8 text
                let char_count = line.chars().count();
                total_lines = total_lines.saturating_add((char_count / wrap_width + 1) as u16);
            }
            total_lines = total_lines.saturating_add(1); // Blank line after turn
        }

        if self.is_loading() {
            total_lines = total_lines.saturating_add(2);
        }

        let visible_height = if self.chat_height > 0 {
            self.chat_height
        } else {
            20
        };

        self.chat_scroll = total_lines.saturating_sub(visible_height);
    }
}

/// Allow `~/` in typed paths
fn expand_home(path: &str) -> String {
    match (path.strip_prefix("~/"), dirs::home_dir()) {
        (Some(rest), Some(home)) => home.join(rest).display().to_string(),
        _ => path.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_app() -> App {
        let config = Config {
            api_key: Some("test-key".to_string()),
            model: None,
            endpoint: Some("http://127.0.0.1:9".to_string()),
            export_dir: None,
        };
        App::new(&config)
    }

    #[test]
    fn test_starts_on_splash() {
        let app = test_app();
        assert_eq!(app.screen, Screen::Splash);
        assert!(app.show_welcome());
    }

    #[test]
    fn test_splash_times_out() {
        let mut app = test_app();
        for _ in 0..SPLASH_TICKS {
            app.tick();
        }
        assert_eq!(app.screen, Screen::Main);
        assert_eq!(app.input_mode, InputMode::Editing);
    }

    #[test]
    fn test_use_starter() {
        let mut app = test_app();
        assert!(app.use_starter(3));
        assert_eq!(app.prompt_input, STARTER_PROMPTS[2].prompt);
        assert_eq!(app.prompt_cursor, STARTER_PROMPTS[2].prompt.chars().count());

        assert!(!app.use_starter(0));
        assert!(!app.use_starter(5));
    }

    #[test]
    fn test_tabs_cycle() {
        let mut app = test_app();
        app.next_tab();
        assert_eq!(app.active_tab, SourceTab::Html);
        app.prev_tab();
        app.prev_tab();
        assert_eq!(app.active_tab, SourceTab::JavaScript);
        app.next_tab();
        assert_eq!(app.active_tab, SourceTab::Preview);
    }

    #[test]
    fn test_cycle_model_before_first_message() {
        let mut app = test_app();
        let models = GeminiClient::list_models();
        assert_eq!(app.model, models[0]);

        assert_eq!(app.cycle_model(), Some(models[1].as_str()));
        assert_eq!(app.model, models[1]);
        assert!(app.conversation.turns().is_empty());
    }

    #[test]
    fn test_cycle_model_keeps_attachment() {
        let mut app = test_app();
        let image = Attachment::from_bytes("sketch.png", "image/png", vec![1, 2, 3]).unwrap();
        app.conversation.attach(image);

        app.cycle_model();
        assert_eq!(app.conversation.attachment().map(|a| a.name()), Some("sketch.png"));
    }

    #[tokio::test]
    async fn test_submit_waits_for_unpolled_task() {
        let mut app = test_app();
        app.generation_task = Some(tokio::spawn(std::future::pending::<Completion>()));
        app.prompt_input = "make it blue".to_string();

        app.submit_prompt();
        assert_eq!(app.prompt_input, "make it blue");
        assert!(app.conversation.turns().is_empty());
        assert!(app.is_loading());

        if let Some(task) = app.generation_task.take() {
            task.abort();
        }
    }

    #[test]
    fn test_blank_submit_spawns_nothing() {
        let mut app = test_app();
        app.prompt_input = "   ".to_string();
        app.submit_prompt();
        assert!(app.generation_task.is_none());
        assert!(app.conversation.turns().is_empty());
    }

    #[test]
    fn test_attach_and_cancel() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("brief.txt");
        std::fs::write(&path, "colors: teal").unwrap();
        let mut app = test_app();

        app.attach_input = path.display().to_string();
        app.attach_from_input();
        assert_eq!(app.conversation.attachment().map(|a| a.name()), Some("brief.txt"));
        assert_eq!(app.input_mode, InputMode::Editing);

        app.cancel_attachment();
        assert!(app.conversation.attachment().is_none());
        assert_eq!(app.status.as_deref(), Some("Removed brief.txt"));
    }

    #[test]
    fn test_attach_unsupported_sets_status() {
        let mut app = test_app();
        app.attach_path(Path::new("/tmp/report.pdf"));
        assert!(app.conversation.attachment().is_none());
        assert!(app.status.unwrap().contains("Unsupported"));
    }

    #[test]
    fn test_save_without_artifact() {
        let mut app = test_app();
        app.save_archive();
        assert_eq!(app.status.as_deref(), Some("Nothing to save yet"));
        assert!(app.write_preview().is_none());
    }

    #[test]
    fn test_source_tab_slices() {
        let artifact = GeneratedArtifact {
            html: "<p></p>".to_string(),
            css: "p{}".to_string(),
            javascript: String::new(),
            explanation: String::new(),
        };
        assert_eq!(SourceTab::Preview.source(&artifact), None);
        assert_eq!(SourceTab::Css.source(&artifact), Some("p{}"));
        assert_eq!(SourceTab::JavaScript.source(&artifact), Some(""));
    }

    #[test]
    fn test_expand_home_leaves_absolute_paths() {
        assert_eq!(expand_home("/var/tmp/a.png"), "/var/tmp/a.png");
    }
}
