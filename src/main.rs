use std::env;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use anyhow::Context;

use ragchat::{ChatSession, SessionConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let log_dir = env::var("RAGCHAT_LOG_DIR").ok().map(PathBuf::from);
    ragchat::logging::init(log_dir.as_deref());

    let config_path = env::args().nth(1).unwrap_or_else(|| "ragchat.yaml".to_string());
    let mut config = SessionConfig::from_file(Path::new(&config_path))
        .with_context(|| format!("failed to load {config_path}"))?;
    config.credentials.fill_from_env();

    tracing::info!("starting chat with model {}", config.model);
    let mut session = ChatSession::open(config).await?;

    println!(
        "ragchat ready with {}. :clear resets history, :history shows the window, :quit exits.",
        session.config().model
    );

    let stdin = io::stdin();
    let mut stdout = io::stdout();
    loop {
        write!(stdout, "> ")?;
        stdout.flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        let line = line.trim_end_matches(['\n', '\r']);

        match line {
            ":quit" | ":q" => break,
            ":clear" => {
                session.clear_history();
                println!("history cleared");
            }
            ":history" => {
                for turn in session.windowed_history() {
                    println!("Q: {}", turn.question);
                    println!("A: {}", turn.answer);
                }
            }
            question => match session.answer(question).await {
                Ok((answer, _)) => println!("{answer}"),
                Err(err) => eprintln!("error: {err}"),
            },
        }
    }

    Ok(())
}
