use super::error::ChatError;
use super::message::{Attachment, Message, Role};
use colored::Colorize;

pub const COMMANDS: [(&str, &str); 10] = [
    ("/help", "show this help"),
    ("/new", "start a new session with a fresh sender id"),
    ("/clear", "clear the conversation history"),
    ("/url", "show or change the server URL"),
    ("/status", "check whether the backend is reachable"),
    ("/export", "save the conversation as JSON"),
    ("/retry", "resend the last failed message"),
    ("/history", "show the conversation so far"),
    ("/quit", "leave the chat"),
    ("/<n>", "choose button <n> of the latest reply"),
];

pub fn banner(bot_name: &str, target: &str) {
    println!("{}", format!("=== {} ===", bot_name).bright_magenta().bold());
    println!("{}", format!("Connected to {}", target).bright_black());
    println!(
        "{}",
        "Type a message, '/help' for commands, or 'quit' to exit.".bright_black()
    );
    println!();
}

pub fn help() {
    println!("{}", "Commands:".bright_yellow());
    for (name, description) in COMMANDS {
        println!("  {:<10} {}", name.bright_cyan(), description);
    }
}

pub fn message(message: &Message, bot_name: &str) {
    match message.role {
        Role::User => println!("{}", format!("> {}", message.content).green()),
        Role::Assistant => {
            match &message.attachment {
                Some(Attachment::Image { url }) => {
                    println!(
                        "{} {}",
                        format!("[{}]", bot_name).bright_magenta(),
                        "[image]".bright_black()
                    );
                    println!("  {}", url.underline());
                }
                Some(Attachment::Buttons { buttons }) => {
                    print_text(bot_name, &message.content);
                    for (i, button) in buttons.iter().enumerate() {
                        println!("  {} {}", format!("[{}]", i + 1).bright_cyan(), button.title);
                    }
                    println!(
                        "{}",
                        format!("  Type /1../{} to choose.", buttons.len()).bright_black()
                    );
                }
                None => print_text(bot_name, &message.content),
            }
        }
    }
}

fn print_text(bot_name: &str, text: &str) {
    if text.is_empty() {
        return;
    }
    println!("{}", format!("[{}]", bot_name).bright_magenta());
    for line in text.lines() {
        println!("{}", line.bright_blue());
    }
}

pub fn messages<'a>(messages: impl IntoIterator<Item = &'a Message>, bot_name: &str) {
    for m in messages {
        message(m, bot_name);
    }
}

pub fn history(history: &[Message], bot_name: &str) {
    if history.is_empty() {
        println!("{}", "No messages yet.".bright_black());
        return;
    }
    for m in history {
        print!("{} ", m.timestamp.bright_black());
        message(m, bot_name);
    }
}

/// Inline diagnostic after a failed exchange, on stderr.
pub fn diagnostic(error: &ChatError, can_retry: bool) {
    eprintln!("{}", format!("  ! {}", error).red());
    if can_retry && error.is_transient() {
        eprintln!("{}", "  Type /retry to try again.".bright_black());
    }
}

pub fn info(text: &str) {
    println!("{}", text.bright_black());
}

pub fn success(text: &str) {
    println!("{}", text.bright_green());
}

pub fn warning(text: &str) {
    println!("{}", text.yellow());
}

pub fn error(text: &str) {
    eprintln!("{}", text.red());
}
