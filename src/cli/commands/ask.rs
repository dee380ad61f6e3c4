//! Ask command implementation.

use super::{load_document, print_answer};
use crate::cli::preflight;
use crate::cli::Output;
use crate::config::Settings;
use crate::session::Session;
use anyhow::Result;
use std::path::Path;

/// Run the ask command.
pub async fn run_ask(
    file: &str,
    question: &str,
    api_key: Option<&str>,
    settings: Settings,
) -> Result<()> {
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

    let spinner = Output::spinner("Thinking...");
    let stream = session.ask_question(question).await;
    spinner.finish_and_clear();

    match stream {
        Ok(stream) => {
            if let Err(e) = print_answer(stream).await {
                Output::error(&format!("Failed to generate answer: {}", e));
                return Err(e.into());
            }
        }
        Err(e) => {
            Output::error(&format!("Failed to generate answer: {}", e));
            return Err(e.into());
        }
    }

    Ok(())
}
