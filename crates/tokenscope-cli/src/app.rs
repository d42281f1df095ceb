use anyhow::{bail, Result};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, warn};

use tokenscope_core::{
    rank_with, ClickIgnored, ClickOutcome, ModelBackend, ModelInfo, RankedDistribution, Session,
    SessionUpdate, Settings,
};

use crate::commands::{handle_command, CommandResult};
use crate::render::{render_distribution, render_status, render_tokens};

/// Label used when adopting a model the server loaded on its own.
const SERVER_DEFAULT_MODEL: &str = "(server default)";

/// Options for a single non-interactive run.
#[derive(Debug, Clone, Default)]
pub struct OneShot {
    pub text: String,
    pub index: Option<usize>,
    /// Force a load even if the server already has a model.
    pub model: Option<String>,
    pub weights: Option<String>,
}

/// Interactive mode: lines from stdin drive the session, updates are
/// printed as they arrive.
pub async fn run_interactive(settings: Settings) -> Result<()> {
    let backend: Arc<dyn ModelBackend> = Arc::new(settings.build_backend());
    let mut session = Session::new(backend.clone(), settings.session_config());

    println!("Tokenscope | server {} | /help for commands", settings.api_base());
    match backend.status().await {
        Ok(status) if status.model_loaded => {
            session.mark_model_loaded(ModelInfo::named(SERVER_DEFAULT_MODEL));
            println!("Server already has a model loaded. Type some text.");
        }
        Ok(_) => println!("No model loaded. Use /load [model] [weights]."),
        Err(e) => {
            warn!("Status check failed: {}", e);
            println!("{}", e.user_message());
        }
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                if !apply_command(&mut session, &settings, handle_command(&line)) {
                    break;
                }
            }
            Some(update) = session.next_update() => print_update(&session, &update),
        }
    }
    Ok(())
}

/// Returns false when the user asked to quit.
fn apply_command(session: &mut Session, settings: &Settings, command: CommandResult) -> bool {
    match command {
        CommandResult::Quit => return false,
        CommandResult::Message(msg) => println!("{msg}"),
        CommandResult::SetText(text) => session.set_text(text),
        CommandResult::AppendText(more) => {
            let text = format!("{}{}", session.text(), more);
            session.set_text(text);
        }
        CommandResult::Click(index) => match session.click_token(index) {
            ClickOutcome::Selected(_) => {
                if let Some(label) = session.selection_label() {
                    println!("Selected: {label}. Loading predictions...");
                }
            }
            ClickOutcome::Deselected(i) => println!("Deselected token {i}."),
            ClickOutcome::Ignored(reason) => println!("{}", describe_ignored(reason)),
        },
        CommandResult::LoadModel { model_path, weights } => {
            let model_path = model_path.unwrap_or_else(|| settings.model.default_path.clone());
            let weights = weights.or_else(|| settings.model.custom_weights_path.clone());
            match session.load_model(&model_path, weights.as_deref()) {
                Ok(()) => println!("Loading model {model_path}..."),
                Err(e) => println!("{}", e.user_message()),
            }
        }
        CommandResult::Reset => {
            session.reset();
            println!("Session reset. Use /load to load a model.");
        }
        CommandResult::ShowStatus => println!("{}", render_status(session)),
        CommandResult::DismissNotice => session.dismiss_notice(),
        CommandResult::ShowTokens => {
            println!("{}", render_tokens(session.tokens(), session.selection()))
        }
        CommandResult::ShowDistribution => match session.distribution() {
            Some(view) => println!("{}", render_distribution(&view.ranked)),
            None => println!("Click on a token to see conditional probabilities."),
        },
    }
    true
}

fn print_update(session: &Session, update: &SessionUpdate) {
    match update {
        SessionUpdate::TokenizeStarted => debug!("Tokenizing..."),
        SessionUpdate::TokensReplaced { .. } | SessionUpdate::TokensCleared => {
            println!("{}", render_tokens(session.tokens(), session.selection()))
        }
        SessionUpdate::DistributionReady { index } => {
            if let Some(view) = session.distribution() {
                println!("Conditional probabilities (Token {})", index + 1);
                println!("{}", render_distribution(&view.ranked));
            }
        }
        SessionUpdate::ModelLoaded(info) => {
            println!("Model {} loaded successfully!", info.model_path)
        }
        SessionUpdate::Failed(notice) => println!("Error: {}", notice.message),
    }
}

fn describe_ignored(reason: ClickIgnored) -> &'static str {
    match reason {
        ClickIgnored::ModelNotLoaded => "No model loaded. Use /load first.",
        ClickIgnored::TokensStale => "Tokens are out of date; wait for tokenization to finish.",
        ClickIgnored::OutOfRange => "No token at that index. Use /tokens to list them.",
    }
}

/// One-shot mode: load (or adopt) a model, tokenize `text`, and print the
/// distribution at `index`, or after the whole text when no index is given.
pub async fn run_once(settings: &Settings, opts: OneShot) -> Result<()> {
    let backend: Arc<dyn ModelBackend> = Arc::new(settings.build_backend());
    let ranked = inspect(backend, settings, opts).await?;
    println!("{}", render_distribution(&ranked));
    Ok(())
}

/// The work behind [`run_once`], against any backend. Prints the token line
/// and returns the ranked distribution.
pub async fn inspect(
    backend: Arc<dyn ModelBackend>,
    settings: &Settings,
    opts: OneShot,
) -> Result<RankedDistribution> {
    let mut session = Session::new(backend.clone(), settings.session_config());

    let server_has_model = match backend.status().await {
        Ok(status) => status.model_loaded,
        Err(e) => bail!(e.user_message()),
    };
    if opts.model.is_some() || !server_has_model {
        let model_path = opts
            .model
            .clone()
            .unwrap_or_else(|| settings.model.default_path.clone());
        let weights = opts
            .weights
            .clone()
            .or_else(|| settings.model.custom_weights_path.clone());
        if let Err(e) = session.load_model(&model_path, weights.as_deref()) {
            bail!(e.user_message());
        }
        eprintln!("Loading model {model_path}...");
        wait_for(&mut session, |u| matches!(u, SessionUpdate::ModelLoaded(_))).await?;
    } else {
        session.mark_model_loaded(ModelInfo::named(SERVER_DEFAULT_MODEL));
    }

    session.set_text(opts.text.clone());
    wait_for(&mut session, |u| {
        matches!(
            u,
            SessionUpdate::TokensReplaced { .. } | SessionUpdate::TokensCleared
        )
    })
    .await?;
    if session.tokens().is_empty() {
        bail!("Nothing to tokenize");
    }
    println!("{}", render_tokens(session.tokens(), opts.index));

    let ranked = match opts.index {
        Some(index) => {
            if let ClickOutcome::Ignored(reason) = session.click_token(index) {
                bail!(describe_ignored(reason));
            }
            // re-tokenized by the prediction; may have dropped the selection
            wait_for(&mut session, |u| {
                matches!(
                    u,
                    SessionUpdate::DistributionReady { .. } | SessionUpdate::TokensReplaced { .. }
                )
            })
            .await?;
            match session.distribution() {
                Some(view) => view.ranked.clone(),
                None => bail!(
                    "Token {index} no longer exists after re-tokenization ({} tokens)",
                    session.tokens().len()
                ),
            }
        }
        None => {
            let response = backend
                .predict_next(session.text())
                .await
                .map_err(|e| anyhow::anyhow!(e.user_message()))?;
            let dist = response.next_token_predictions.unwrap_or_default();
            rank_with(&dist, settings.session_config().rank)
        }
    };
    Ok(ranked)
}

/// Pump session updates until one matches; failures abort.
async fn wait_for<F>(session: &mut Session, done: F) -> Result<SessionUpdate>
where
    F: Fn(&SessionUpdate) -> bool,
{
    while let Some(update) = session.next_update().await {
        if let SessionUpdate::Failed(notice) = &update {
            bail!(notice.message.clone());
        }
        if done(&update) {
            return Ok(update);
        }
    }
    bail!("Session closed")
}
