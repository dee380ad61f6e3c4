//! Interactive chat command.

use super::{load_document, print_answer};
use crate::cli::preflight;
use crate::cli::Output;
use crate::config::Settings;
use crate::session::{Role, Session};
use anyhow::Result;
use console::style;
use std::io::{self, BufRead, Write};
use std::path::Path;
use tracing::debug;

/// A line typed at the chat prompt.
#[derive(Debug, PartialEq)]
enum Input<'a> {
    Exit,
    Clear,
    Sources,
    History,
    Load(&'a str),
    Question(&'a str),
}

impl<'a> Input<'a> {
    fn parse(line: &'a str) -> Option<Self> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }

        let input = match line.to_ascii_lowercase().as_str() {
            "exit" | "quit" => Input::Exit,
            "clear" => Input::Clear,
            "sources" => Input::Sources,
            "history" => Input::History,
            _ => match line.split_once(' ') {
                Some((cmd, path)) if cmd.eq_ignore_ascii_case("load") && !path.trim().is_empty() => {
                    Input::Load(path.trim())
                }
                _ => Input::Question(line),
            },
        };
        Some(input)
    }
}

/// Run the interactive chat command.
pub async fn run_chat(file: &str, api_key: Option<&str>, settings: Settings) -> Result<()> {
    let api_key = match preflight::resolve_api_key(api_key, &settings) {
        Ok(key) => key,
        Err(e) => {
            Output::error(&format!("{}", e));
            return Err(e.into());
        }
    };

    let mut session = Session::from_settings(&settings)?;
    session.set_credentials(&api_key)?;

    if let Err(e) = load_document(&mut session, Path::new(file)).await {
        Output::error(&format!("{}", e));
        return Err(e.into());
    }

    println!("\n{}", style("Pagewise Chat").bold().cyan());
    println!(
        "{}\n",
        style("Ask about the document, or 'exit' to quit. Commands: clear, sources, history, load <file>.")
            .dim()
    );

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        print!("{} ", style("You:").green().bold());
        stdout.flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }

        let Some(input) = Input::parse(&line) else {
            continue;
        };
        debug!("Chat input: {:?}", input);

        match input {
            Input::Exit => {
                Output::info("Goodbye!");
                break;
            }
            Input::Clear => {
                session.clear_history();
                Output::info("Conversation history cleared.");
            }
            Input::Sources => {
                let last = session
                    .history()
                    .iter()
                    .rev()
                    .find_map(|m| m.sources.as_deref());
                match last {
                    Some(sources) => Output::sources(sources),
                    None => Output::info("No answers yet."),
                }
            }
            Input::History => {
                if session.history().is_empty() {
                    Output::info("No messages yet.");
                }
                for message in session.history() {
                    let who = match message.role {
                        Role::User => style("You:").green().bold(),
                        Role::Assistant => style("Pagewise:").cyan().bold(),
                    };
                    println!("{} {}", who, message.content);
                }
            }
            Input::Load(path) => {
                if let Err(e) = load_document(&mut session, &Settings::expand_path(path)).await {
                    Output::error(&format!("{}", e));
                    Output::info("Keeping the previous document.");
                }
            }
            Input::Question(question) => {
                let result = match session.ask_question(question).await {
                    Ok(stream) => print_answer(stream).await,
                    Err(e) => Err(e),
                };
                if let Err(e) = result {
                    Output::error(&format!("Error: {}", e));
                }
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_commands() {
        assert_eq!(Input::parse("  \n"), None);
        assert_eq!(Input::parse("QUIT"), Some(Input::Exit));
        assert_eq!(Input::parse("clear\n"), Some(Input::Clear));
        assert_eq!(Input::parse("load  ~/docs/report.pdf"), Some(Input::Load("~/docs/report.pdf")));
        assert_eq!(Input::parse("load"), Some(Input::Question("load")));
        assert_eq!(
            Input::parse("What is on page 3?"),
            Some(Input::Question("What is on page 3?"))
        );
    }
}
