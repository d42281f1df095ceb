/// Result of processing one input line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandResult {
    /// Display a message to the user.
    Message(String),
    /// Replace the document text.
    SetText(String),
    /// Append to the document text.
    AppendText(String),
    /// Toggle selection of the token at a 0-based index.
    Click(usize),
    /// Load a model, optionally with custom weights. `None` means the configured default.
    LoadModel {
        model_path: Option<String>,
        weights: Option<String>,
    },
    /// Drop everything and go back to the pre-load state.
    Reset,
    /// Show model, document and busy state.
    ShowStatus,
    /// Re-print the current token list.
    ShowTokens,
    /// Re-print the current distribution.
    ShowDistribution,
    /// Hide the current error notice.
    DismissNotice,
    /// Quit the application.
    Quit,
}

pub fn handle_command(input: &str) -> CommandResult {
    let line = input.trim_end_matches(['\r', '\n']);
    if !line.starts_with('/') {
        return CommandResult::SetText(line.to_string());
    }

    let parts: Vec<&str> = line.splitn(2, ' ').collect();
    let cmd = parts[0];
    let arg = parts.get(1).copied().unwrap_or("");

    match cmd {
        "/help" | "/h" => show_help(),
        "/exit" | "/quit" | "/q" => CommandResult::Quit,

        "/load" => {
            let mut args = arg.split_whitespace();
            CommandResult::LoadModel {
                model_path: args.next().map(str::to_string),
                weights: args.next().map(str::to_string),
            }
        }
        "/reset" | "/change-model" => CommandResult::Reset,

        "/click" | "/c" => match arg.trim().parse::<usize>() {
            Ok(index) => CommandResult::Click(index),
            Err(_) => CommandResult::Message("Usage: /click <token-index>  (0-based)".into()),
        },
        "/append" | "/a" => CommandResult::AppendText(arg.to_string()),
        // a literal line starting with '/'
        "/text" => CommandResult::SetText(arg.to_string()),

        "/status" => CommandResult::ShowStatus,
        "/tokens" => CommandResult::ShowTokens,
        "/dist" | "/probs" => CommandResult::ShowDistribution,
        "/dismiss" => CommandResult::DismissNotice,

        _ => CommandResult::Message(format!(
            "Unknown command: {cmd}. Type /help for available commands."
        )),
    }
}

fn show_help() -> CommandResult {
    CommandResult::Message(
        "Tokenscope Commands:\n\
         \n\
         Any line without a leading '/' replaces the text.\n\
         \n\
         Text:\n\
         \x20 /append <text>          Append to the current text\n\
         \x20 /text <text>            Set text that itself starts with '/'\n\
         \n\
         Tokens:\n\
         \x20 /click <n>, /c <n>      Select or deselect token n (0-based)\n\
         \x20 /tokens                 Show the token list\n\
         \x20 /dist, /probs           Show the current distribution\n\
         \n\
         Model:\n\
         \x20 /load [model] [weights] Load a model (default from config)\n\
         \x20 /reset, /change-model   Unload and clear everything\n\
         \x20 /status                 Show session status\n\
         \x20 /dismiss                Hide the last error\n\
         \n\
         \x20 /help, /h               Show this help\n\
         \x20 /quit, /exit, /q        Exit"
            .into(),
    )
}
