//! Ask command handler.
//!
//! Runs the pipeline once from the terminal. Tokens go to stdout as they
//! are replayed; sources and follow-ups are printed afterwards.

use clap::Args;
use comai_core::{config::AppConfig, AppError, AppResult};
use comai_rag::{bootstrap, stream_query, MemoryContext, Question, RagResult, StreamEvent};
use futures::StreamExt;
use std::io::Write;

/// Ask a single question from the terminal
#[derive(Args, Debug)]
pub struct AskCommand {
    /// The question to ask
    pub question: String,

    /// Conversation history to ground the answer in
    #[arg(long)]
    pub memory: Option<String>,

    /// Print the whole answer at once
    #[arg(long)]
    pub no_stream: bool,

    /// Output as JSON (implies --no-stream)
    #[arg(long)]
    pub json: bool,
}

impl AskCommand {
    /// Execute the ask command.
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing ask command");
        tracing::debug!("Ask command options: {:?}", self);

        let handle = bootstrap(config).await;
        let pipeline = handle.pipeline()?;
        let question = Question::parse(self.question.as_str())?;
        let memory = MemoryContext::from(self.memory.clone());

        if self.json {
            let result = pipeline.run(&question, &memory).await;
            println!("{}", serde_json::to_string_pretty(&result)?);
            return Ok(());
        }

        if self.no_stream {
            let result = pipeline.run(&question, &memory).await;
            print_result(&mut std::io::stdout(), &result)?;
            return Ok(());
        }

        let mut stdout = std::io::stdout();
        let mut events = stream_query(&handle, &self.question, memory);

        while let Some(event) = events.next().await {
            match event {
                StreamEvent::Token(token) => {
                    write!(stdout, "{}", token)?;
                    stdout.flush()?;
                }
                StreamEvent::Sources(sources) => {
                    writeln!(stdout)?;
                    print_list(&mut stdout, "Sources", &sources)?;
                }
                StreamEvent::FollowUps(follow_ups) => {
                    print_list(&mut stdout, "You might also ask", &follow_ups)?;
                }
                StreamEvent::Done => writeln!(stdout)?,
                StreamEvent::Error(message) => return Err(AppError::Other(message)),
            }
        }

        Ok(())
    }
}

fn print_result(out: &mut impl Write, result: &RagResult) -> std::io::Result<()> {
    writeln!(out, "{}", result.answer())?;

    if !result.sources().is_empty() {
        writeln!(out)?;
        print_list(out, "Sources", result.sources())?;
    }
    if !result.follow_ups().is_empty() {
        print_list(out, "You might also ask", result.follow_ups())?;
    }
    Ok(())
}

fn print_list(out: &mut impl Write, title: &str, items: &[String]) -> std::io::Result<()> {
    writeln!(out, "\n{}:", title)?;
    for item in items {
        writeln!(out, "  - {}", item)?;
    }
    Ok(())
}
