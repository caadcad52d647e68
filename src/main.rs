//! Solfa CLI - Ear-Training Quiz Engine
//!
//! Interactive console adapter: one session, text in, both reply channels
//! out. Useful for exercising the engine without a voice platform.

use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use env_logger::Env;
use log::info;

use solfa::content::ContentStore;
use solfa::phrases::PhraseBook;
use solfa::{AudioTagResolver, Config, NullResolver, SessionRegistry, TemplateResolver, UserInput};

#[derive(Parser)]
#[command(name = "solfa-cli", version, about = "Ear-training quiz engine console")]
struct Cli {
    /// JSON config file; defaults apply when omitted
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Append debug blocks to replies
    #[arg(long)]
    debug: bool,

    /// Print the speech channel alongside the display text
    #[arg(long)]
    speech: bool,
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    info!("solfa v{}", env!("CARGO_PKG_VERSION"));

    let config = match &cli.config {
        Some(path) => Config::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => Config::default(),
    };

    let store = ContentStore::load(
        &config.items_path,
        config.speech_names_path.as_deref(),
    )
    .with_context(|| format!("loading content table {}", config.items_path.display()))?;

    let phrases = match &config.phrases_path {
        Some(path) => PhraseBook::load(path)
            .with_context(|| format!("loading phrase book {}", path.display()))?,
        None => PhraseBook::builtin(),
    };

    let resolver: Arc<dyn AudioTagResolver> = match &config.audio_tag_template {
        Some(template) => Arc::new(TemplateResolver::new(template.clone())),
        None => Arc::new(NullResolver),
    };

    let registry = SessionRegistry::new(Arc::new(store), Arc::new(phrases), resolver)
        .with_ttl(config.session_ttl_secs)
        .with_debug(config.debug || cli.debug);
    let engine = registry.create("console");

    let opening = engine.lock().get_reply()?;
    print_reply(&opening.display, &opening.speech, cli.speech);

    let stdin = io::stdin();
    loop {
        print!("> ");
        io::stdout().flush()?;
        let Some(line) = stdin.lock().lines().next() else {
            break;
        };
        let line = line?;
        let text = line.trim();
        if text.is_empty() {
            continue;
        }
        if text == "/quit" || text == "/exit" {
            break;
        }

        let mut engine = engine.lock();
        match engine.process_user_reply(&UserInput::command(text)) {
            Ok(reply) => {
                let speech = engine.decorate_speech(&reply.speech);
                print_reply(&reply.display, &speech, cli.speech);
                let buttons: Vec<String> =
                    engine.buttons().into_iter().map(|b| b.title).collect();
                if !buttons.is_empty() {
                    println!("[{}]", buttons.join(" | "));
                }
            }
            Err(e) => {
                log::error!("turn failed: {e}");
                println!("error: {e}");
            }
        }
    }

    Ok(())
}

fn print_reply(display: &str, speech: &str, show_speech: bool) {
    println!("{display}");
    if show_speech {
        println!("(tts) {speech}");
    }
}
