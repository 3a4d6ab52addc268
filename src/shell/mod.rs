//! # Interactive Shell
//!
//! Line-oriented front end. In SQL mode each input is routed through the
//! table view; in AI mode it is handed to the AI delegate. Dot commands
//! work in both modes.

pub mod helper;
pub mod render;

use crate::ai::{AiDelegate, QuestionAnswerer};
use crate::error::Result;
use crate::store::ResultSet;
use crate::view::{DisplayedResult, TableView};
use colored::Colorize;
use helper::ShellHelper;
use rustyline::error::ReadlineError;
use rustyline::history::DefaultHistory;
use rustyline::Editor;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tokio::runtime::Runtime;
use tracing::{debug, info};

/// Which kind of input the prompt accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Sql,
    Ai,
}

impl Mode {
    fn prompt(self) -> &'static str {
        match self {
            Mode::Sql => "sql> ",
            Mode::Ai => "ai> ",
        }
    }
}

/// What handling one input line produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    /// Show a table
    Table(DisplayedResult, Duration),
    /// Show the delegate's raw text
    Answer(String, Duration),
    /// Informational message
    Info(String),
    /// A command could not be carried out
    Warning(String),
    Help,
    Clear,
    Quit,
    Nothing,
}

/// Shell state: the table view, the optional AI delegate and the mode
pub struct Shell<Q> {
    view: TableView,
    ai: Option<AiDelegate<Q>>,
    ai_unavailable: Option<String>,
    runtime: Runtime,
    mode: Mode,
    history_file: Option<PathBuf>,
}

impl<Q: QuestionAnswerer> Shell<Q> {
    pub fn new(view: TableView, runtime: Runtime) -> Self {
        Self {
            view,
            ai: None,
            ai_unavailable: Some("natural-language mode is not configured".to_string()),
            runtime,
            mode: Mode::Sql,
            history_file: None,
        }
    }

    /// Enable AI mode with the given delegate
    #[must_use]
    pub fn with_ai(mut self, delegate: AiDelegate<Q>) -> Self {
        self.ai = Some(delegate);
        self.ai_unavailable = None;
        self
    }

    /// Record why AI mode is unavailable, shown when the user asks for it
    #[must_use]
    pub fn with_ai_unavailable(mut self, reason: impl Into<String>) -> Self {
        self.ai = None;
        self.ai_unavailable = Some(reason.into());
        self
    }

    #[must_use]
    pub fn with_history_file(mut self, path: Option<PathBuf>) -> Self {
        self.history_file = path;
        self
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn view(&self) -> &TableView {
        &self.view
    }

    /// Switch modes; AI mode needs a delegate
    pub fn set_mode(&mut self, mode: Mode) -> Response {
        if mode == Mode::Ai && self.ai.is_none() {
            let reason = self
                .ai_unavailable
                .clone()
                .unwrap_or_else(|| "natural-language mode is not configured".to_string());
            return Response::Warning(format!("AI mode unavailable: {reason}"));
        }
        self.mode = mode;
        info!("Switched to {mode:?} mode");
        Response::Info(match mode {
            Mode::Sql => "SQL mode".to_string(),
            Mode::Ai => "Natural-language mode: ask a question about the database".to_string(),
        })
    }

    /// Show the default table, as on startup
    pub fn load_initial_view(&mut self) -> Response {
        let started = Instant::now();
        self.view.load_data(None);
        Response::Table(self.view.display().clone(), started.elapsed())
    }

    /// Handle one line of input
    pub fn handle_line(&mut self, line: &str) -> Response {
        let line = line.trim();
        if line.is_empty() {
            return Response::Nothing;
        }

        let command = line.trim_end_matches(';').trim().to_lowercase();
        match command.as_str() {
            "help" | "h" | ".help" => return Response::Help,
            "quit" | "exit" | "q" | ".quit" | ".exit" => return Response::Quit,
            ".clear" => return Response::Clear,
            ".sql" => return self.set_mode(Mode::Sql),
            ".ai" => return self.set_mode(Mode::Ai),
            ".mode" => {
                let next = match self.mode {
                    Mode::Sql => Mode::Ai,
                    Mode::Ai => Mode::Sql,
                };
                return self.set_mode(next);
            }
            ".tables" => return self.tables(),
            ".schema" => return self.schema(),
            ".memo" => {
                return Response::Info(match self.view.memo() {
                    Some(memo) => format!("Refresh query: {memo}"),
                    None => "No refresh query; the first table is shown after changes".to_string(),
                });
            }
            ".refresh" => {
                let started = Instant::now();
                self.view.refresh_current_view();
                return Response::Table(self.view.display().clone(), started.elapsed());
            }
            _ => {}
        }

        let started = Instant::now();
        match (self.mode, &self.ai) {
            (Mode::Ai, Some(delegate)) => {
                let text = self.runtime.block_on(delegate.ask(line));
                Response::Answer(text, started.elapsed())
            }
            _ => {
                self.view.execute_query(line);
                Response::Table(self.view.display().clone(), started.elapsed())
            }
        }
    }

    fn tables(&self) -> Response {
        let started = Instant::now();
        let display = match self.view.store().tables() {
            Ok(tables) => DisplayedResult::from(ResultSet {
                columns: vec!["name".to_string()],
                rows: tables.into_iter().map(|t| vec![t]).collect(),
            }),
            Err(e) => DisplayedResult::from(&e),
        };
        Response::Table(display, started.elapsed())
    }

    fn schema(&self) -> Response {
        match self.view.store().schema() {
            Ok(entries) if entries.is_empty() => Response::Info("No tables".to_string()),
            Ok(entries) => Response::Info(
                entries
                    .into_iter()
                    .map(|(_, sql)| format!("{sql};"))
                    .collect::<Vec<_>>()
                    .join("\n\n"),
            ),
            Err(e) => Response::Warning(e.display_message()),
        }
    }

    /// Run the interactive loop until the user quits
    pub fn run(&mut self) -> Result<()> {
        println!("{}", "Infotron SQLite Browser".green());
        println!("Database: {}", self.view.store().path().display());
        println!("Type 'help' for commands, '.ai' for natural-language mode, 'quit' to exit");
        println!();

        let mut rl: Editor<ShellHelper, DefaultHistory> = Editor::new()?;
        rl.set_helper(Some(ShellHelper::new()));

        if let Some(path) = &self.history_file
            && let Err(err) = rl.load_history(path)
            && !matches!(err, ReadlineError::Io(ref io_err) if io_err.kind() == std::io::ErrorKind::NotFound)
        {
            eprintln!("Failed to load history: {err}");
        }

        let initial = self.load_initial_view();
        self.render(&initial, &mut rl);

        loop {
            match rl.readline(self.mode.prompt()) {
                Ok(line) => {
                    if !line.trim().is_empty()
                        && let Err(err) = rl.add_history_entry(line.as_str())
                    {
                        eprintln!("Failed to add to history: {err}");
                    }

                    let response = self.handle_line(&line);
                    if response == Response::Quit {
                        println!("Goodbye!");
                        break;
                    }
                    self.render(&response, &mut rl);
                }
                Err(ReadlineError::Interrupted) => {
                    println!("^C");
                    break;
                }
                Err(ReadlineError::Eof) => {
                    println!("^D");
                    break;
                }
                Err(err) => {
                    println!("{}: {}", "Error".red(), err);
                    break;
                }
            }
        }

        if let Some(path) = &self.history_file
            && let Err(err) = rl.save_history(path)
        {
            eprintln!("Failed to save history: {err}");
        }

        debug!("Shell exited");
        Ok(())
    }

    fn render(&self, response: &Response, rl: &mut Editor<ShellHelper, DefaultHistory>) {
        match response {
            Response::Table(display, elapsed) => render::display_result(display, *elapsed),
            Response::Answer(text, elapsed) => render::display_answer(text, *elapsed),
            Response::Info(message) => println!("{message}"),
            Response::Warning(message) => println!("{}: {}", "Warning".yellow(), message),
            Response::Help => render::display_help(self.ai.is_some()),
            Response::Clear => {
                if let Err(err) = rl.clear_screen() {
                    eprintln!("Failed to clear screen: {err}");
                }
            }
            Response::Quit | Response::Nothing => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::ChainOutput;
    use crate::error::Error;
    use crate::store::Store;
    use std::future::Future;

    struct Echo;

    impl QuestionAnswerer for Echo {
        fn answer(&self, question: &str) -> impl Future<Output = Result<ChainOutput>> + Send {
            let outcome = if question == "fail" {
                Err(Error::Chain("no SQL".to_string()))
            } else {
                Ok(ChainOutput {
                    question: question.to_string(),
                    sql: "SELECT 1".to_string(),
                    sql_result: "[(1,)]".to_string(),
                    answer: "one".to_string(),
                    steps: Vec::new(),
                })
            };
            async move { outcome }
        }
    }

    fn shell() -> (tempfile::TempDir, Shell<Echo>) {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::new(dir.path().join("shell.db"));
        store.ensure_exists().unwrap();
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        (dir, Shell::new(TableView::new(store), runtime))
    }

    #[test]
    fn test_sql_line_updates_table() {
        let (_dir, mut shell) = shell();
        shell.handle_line("CREATE TABLE t (a INTEGER, b TEXT);");
        match shell.handle_line("SELECT b, a FROM t") {
            Response::Table(display, _) => assert_eq!(display.columns, vec!["b", "a"]),
            other => panic!("Expected table, got {other:?}"),
        }
    }

    #[test]
    fn test_ai_mode_requires_delegate() {
        let (_dir, shell) = shell();
        let mut shell = shell.with_ai_unavailable("ANTHROPIC_API_KEY is not set");
        match shell.handle_line(".ai") {
            Response::Warning(msg) => assert!(msg.contains("ANTHROPIC_API_KEY")),
            other => panic!("Expected warning, got {other:?}"),
        }
        assert_eq!(shell.mode(), Mode::Sql);
    }

    #[test]
    fn test_ai_mode_routes_to_delegate() {
        let (_dir, shell) = shell();
        let mut shell = shell.with_ai(AiDelegate::new(Echo));
        shell.handle_line(".mode");
        assert_eq!(shell.mode(), Mode::Ai);

        match shell.handle_line("what is one") {
            Response::Answer(text, _) => assert!(text.ends_with("Answer: one")),
            other => panic!("Expected answer, got {other:?}"),
        }
        match shell.handle_line("fail") {
            Response::Answer(text, _) => assert!(text.starts_with("Error: ")),
            other => panic!("Expected answer, got {other:?}"),
        }

        shell.handle_line(".SQL");
        assert_eq!(shell.mode(), Mode::Sql);
    }

    #[test]
    fn test_dot_commands() {
        let (_dir, mut shell) = shell();
        assert_eq!(shell.handle_line("   "), Response::Nothing);
        assert_eq!(shell.handle_line("exit"), Response::Quit);
        assert_eq!(shell.handle_line("help"), Response::Help);

        shell.handle_line("CREATE TABLE b (x); CREATE TABLE a (y);");
        match shell.handle_line(".tables") {
            Response::Table(display, _) => {
                assert_eq!(display.rows, vec![vec!["b"], vec!["a"]]);
            }
            other => panic!("Expected table, got {other:?}"),
        }
        match shell.handle_line(".schema") {
            Response::Info(text) => assert!(text.contains("CREATE TABLE b (x);")),
            other => panic!("Expected info, got {other:?}"),
        }
    }

    #[test]
    fn test_refresh_reruns_memo() {
        let (_dir, mut shell) = shell();
        shell.handle_line("CREATE TABLE t (a INTEGER)");
        shell.handle_line("SELECT COUNT(*) AS n FROM t");
        shell
            .view()
            .store()
            .execute("INSERT INTO t VALUES (1), (2)")
            .unwrap();
        match shell.handle_line(".refresh") {
            Response::Table(display, _) => assert_eq!(display.rows, vec![vec!["2"]]),
            other => panic!("Expected table, got {other:?}"),
        }
    }
}
