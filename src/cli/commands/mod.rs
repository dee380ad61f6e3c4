//! CLI command implementations.

mod ask;
mod chat;
mod config;
mod serve;

pub use ask::run_ask;
pub use chat::run_chat;
pub use config::run_config;
pub use serve::run_serve;

use crate::cli::{preflight, Output};
use crate::document::Upload;
use crate::error::Result;
use crate::session::{AnswerStream, ProcessResult, Session};
use console::style;
use std::io::{self, Write};
use std::path::Path;

/// Read, chunk and index a file into the session, with a spinner.
async fn load_document(session: &mut Session, path: &Path) -> Result<ProcessResult> {
    preflight::check_document(path)?;

    let spinner = Output::spinner(&format!("Reading {}...", path.display()));
    let result = async {
        let upload = Upload::from_path(path).await?;
        spinner.set_message(format!("Indexing {} ({})...", upload.name, upload.kind));
        session.process_document(upload).await
    }
    .await;
    spinner.finish_and_clear();

    let result = result?;
    Output::success(&format!(
        "Indexed {} ({} pages, {} chunks)",
        result.document, result.pages, result.chunks_indexed
    ));
    Ok(result)
}

/// Print answer fragments as they arrive. Ctrl+C cancels the answer.
///
/// Returns `true` if the answer finished.
async fn print_answer(mut stream: AnswerStream<'_>) -> Result<bool> {
    let mut stdout = io::stdout();
    print!("\n{} ", style("Pagewise:").cyan().bold());
    stdout.flush()?;

    loop {
        tokio::select! {
            fragment = stream.next_fragment() => match fragment {
                Some(Ok(text)) => {
                    print!("{}", text);
                    stdout.flush()?;
                }
                Some(Err(e)) => {
                    println!();
                    return Err(e);
                }
                None => break,
            },
            _ = tokio::signal::ctrl_c() => {
                println!();
                Output::warning("Answer cancelled.");
                return Ok(false);
            }
        }
    }

    println!("\n");
    Output::sources(stream.sources());
    Ok(true)
}
