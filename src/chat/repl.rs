use super::backend::ChatBackend;
use super::render;
use super::retry::RetryPolicy;
use super::session::{ChatSession, Exchange};
use anyhow::Result;
use colored::Colorize;
use rustyline::completion::{Completer, Pair};
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::history::DefaultHistory;
use rustyline::validate::Validator;
use rustyline::{Context, Editor, Helper};
use std::borrow::Cow::{self, Borrowed, Owned};
use std::path::PathBuf;
use tracing::info;

/// Slash-command assistance backed by the help table.
#[derive(Clone, Copy)]
struct CommandHelper {
    table: &'static [(&'static str, &'static str)],
}

impl CommandHelper {
    fn new() -> Self {
        Self {
            table: &render::COMMANDS,
        }
    }

    /// The command word being typed, if the cursor is still inside it.
    fn typed_command(line: &str, pos: usize) -> Option<&str> {
        let before = line.get(..pos)?;
        (before.starts_with('/') && !before.contains(char::is_whitespace)).then_some(before)
    }

    /// Table entries whose name extends `prefix`; placeholders like `/<n>` never match.
    fn matching<'a>(
        &'a self,
        prefix: &'a str,
    ) -> impl Iterator<Item = &'static (&'static str, &'static str)> + 'a {
        self.table
            .iter()
            .filter(move |(name, _)| !name.contains('<') && name.starts_with(prefix))
    }

    fn is_known(&self, word: &str) -> bool {
        let word = word.to_ascii_lowercase();
        self.table.iter().any(|(name, _)| *name == word)
            || word[1..].parse::<usize>().is_ok()
            || word == "/exit"
            || word == "/?"
    }
}

impl Helper for CommandHelper {}

impl Completer for CommandHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        let Some(typed) = Self::typed_command(line, pos) else {
            return Ok((pos, Vec::new()));
        };
        let candidates = self
            .matching(typed)
            .map(|(name, description)| Pair {
                display: format!("{:<10} {}", name, description),
                replacement: format!("{} ", name),
            })
            .collect();
        Ok((0, candidates))
    }
}

impl Hinter for CommandHelper {
    type Hint = String;

    fn hint(&self, line: &str, pos: usize, _ctx: &Context<'_>) -> Option<String> {
        let typed = Self::typed_command(line, pos)?;
        let mut matches = self.matching(typed);
        let (name, description) = matches.next()?;
        if matches.next().is_some() {
            return None;
        }
        Some(format!("{}  {}", &name[typed.len()..], description))
    }
}

impl Highlighter for CommandHelper {
    fn highlight<'l>(&self, line: &'l str, _pos: usize) -> Cow<'l, str> {
        if !line.starts_with('/') {
            return Borrowed(line);
        }
        let (word, rest) = line.split_at(line.find(char::is_whitespace).unwrap_or(line.len()));
        let word = if self.is_known(word) {
            word.bright_cyan()
        } else {
            word.yellow()
        };
        Owned(format!("{}{}", word, rest))
    }

    fn highlight_hint<'h>(&self, hint: &'h str) -> Cow<'h, str> {
        Owned(hint.bright_black().to_string())
    }

    fn highlight_char(&self, line: &str, _pos: usize, _forced: bool) -> bool {
        line.starts_with('/')
    }
}

impl Validator for CommandHelper {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Help,
    New,
    Clear,
    Url(Option<String>),
    Status,
    Export(Option<PathBuf>),
    Retry,
    History,
    Button(usize),
    Quit,
    Unknown(String),
}

/// Returns `None` for plain chat input.
pub fn parse_command(input: &str) -> Option<Command> {
    let input = input.trim();
    if input.eq_ignore_ascii_case("quit") || input.eq_ignore_ascii_case("exit") {
        return Some(Command::Quit);
    }

    let rest = input.strip_prefix('/')?;
    let (name, arg) = match rest.split_once(char::is_whitespace) {
        Some((name, arg)) => (name, Some(arg.trim()).filter(|a| !a.is_empty())),
        None => (rest, None),
    };

    let command = match name.to_ascii_lowercase().as_str() {
        "help" | "?" => Command::Help,
        "new" => Command::New,
        "clear" => Command::Clear,
        "url" => Command::Url(arg.map(str::to_string)),
        "status" => Command::Status,
        "export" => Command::Export(arg.map(PathBuf::from)),
        "retry" => Command::Retry,
        "history" => Command::History,
        "quit" | "exit" => Command::Quit,
        n => match n.parse::<usize>() {
            Ok(number) => Command::Button(number),
            Err(_) => Command::Unknown(input.to_string()),
        },
    };
    Some(command)
}

/// Interactive terminal chat against any [`ChatBackend`].
pub struct ChatApp {
    backend: Box<dyn ChatBackend>,
    session: ChatSession,
    retry: RetryPolicy,
    bot_name: String,
    export_dir: PathBuf,
}

impl ChatApp {
    pub fn new(
        backend: Box<dyn ChatBackend>,
        server_url: &str,
        retry: RetryPolicy,
        bot_name: String,
        export_dir: PathBuf,
    ) -> Self {
        Self {
            backend,
            session: ChatSession::new(server_url),
            retry,
            bot_name,
            export_dir,
        }
    }

    pub async fn run(&mut self) -> Result<()> {
        let mut rl: Editor<CommandHelper, DefaultHistory> = Editor::new()?;
        rl.set_helper(Some(CommandHelper::new()));

        render::banner(
            &self.bot_name,
            &self.backend.describe(self.session.context()),
        );
        self.status().await;
        info!("Chat started as {}", self.session.context().sender_id());

        loop {
            match rl.readline(">> ") {
                Ok(line) => {
                    let trimmed = line.trim();
                    if trimmed.is_empty() {
                        continue;
                    }
                    let _ = rl.add_history_entry(trimmed);

                    match parse_command(trimmed) {
                        Some(Command::Quit) => {
                            render::success("Goodbye!");
                            break;
                        }
                        Some(command) => self.execute(command).await,
                        None => {
                            let exchange = self.session.send(self.backend.as_ref(), trimmed).await;
                            self.show(&exchange);
                        }
                    }
                }
                Err(rustyline::error::ReadlineError::Interrupted) => {
                    render::warning("CTRL-C detected. Type 'quit' to exit.");
                }
                Err(rustyline::error::ReadlineError::Eof) => {
                    render::success("Goodbye!");
                    break;
                }
                Err(err) => {
                    render::error(&format!("Error: {:?}", err));
                    break;
                }
            }
        }

        Ok(())
    }

    async fn execute(&mut self, command: Command) {
        match command {
            Command::Help => render::help(),
            Command::New => {
                self.session.new_session();
                render::info(&format!(
                    "Started a new session ({}).",
                    self.session.context().sender_id()
                ));
            }
            Command::Clear => {
                self.session.clear_history();
                render::info("History cleared.");
            }
            Command::Url(None) => {
                render::info(&format!("Server URL: {}", self.session.context().server_url()))
            }
            Command::Url(Some(url)) => {
                self.session.set_server_url(&url);
                render::info(&format!("Server URL set to {}", self.session.context().server_url()));
                self.status().await;
            }
            Command::Status => self.status().await,
            Command::Export(path) => {
                let path = path.unwrap_or_else(|| self.session.default_export_path(&self.export_dir));
                match self.session.export(&path) {
                    Ok(()) => render::success(&format!("Conversation saved to {}", path.display())),
                    Err(e) => render::error(&format!("Export failed: {:#}", e)),
                }
            }
            Command::Retry => {
                match self
                    .session
                    .retry(self.backend.as_ref(), &self.retry)
                    .await
                {
                    Some(exchange) => {
                        if exchange.attempts > 1 {
                            render::info(&format!("Took {} attempts.", exchange.attempts));
                        }
                        self.show(&exchange);
                    }
                    None => render::info("Nothing to retry."),
                }
            }
            Command::History => render::history(self.session.history().messages(), &self.bot_name),
            Command::Button(number) => {
                match self.session.press_button(self.backend.as_ref(), number).await {
                    Some(exchange) => self.show(&exchange),
                    None => render::warning(&format!("There is no button {}.", number)),
                }
            }
            Command::Unknown(input) => {
                render::warning(&format!("Unknown command: {} (try /help)", input))
            }
            Command::Quit => {}
        }
    }

    fn show(&self, exchange: &Exchange) {
        render::messages(self.session.messages_since(exchange), &self.bot_name);
        if let Some(error) = &exchange.error {
            render::diagnostic(error, self.session.can_retry());
        }
    }

    async fn status(&self) {
        match self.backend.health(self.session.context()).await {
            Ok(health) => {
                let detail = health.detail.map(|d| format!(" ({})", d)).unwrap_or_default();
                render::success(&format!("Backend is up: {}{}", health.endpoint, detail));
            }
            Err(e) => {
                render::warning(&format!("Backend is not reachable: {}", e));
            }
        }
    }
}
