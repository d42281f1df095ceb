use tokenscope_cli::commands::{handle_command, CommandResult};

// ========================================================================
// Command Parsing Tests (commands.rs)
// ========================================================================

// --- PLAIN TEXT ---

#[test]
fn test_plain_line_sets_text() {
    let result = handle_command("hello world");
    assert_eq!(result, CommandResult::SetText("hello world".into()));
}

#[test]
fn test_plain_line_keeps_trailing_space() {
    // a trailing space asks for the distribution of the next word
    let result = handle_command("The cat sat \n");
    assert_eq!(result, CommandResult::SetText("The cat sat ".into()));
}

#[test]
fn test_empty_line_clears_text() {
    assert_eq!(handle_command(""), CommandResult::SetText(String::new()));
}

#[test]
fn test_text_command_allows_leading_slash() {
    let result = handle_command("/text /usr/bin is a path");
    assert_eq!(result, CommandResult::SetText("/usr/bin is a path".into()));
}

#[test]
fn test_append_command() {
    let result = handle_command("/append  world");
    assert_eq!(result, CommandResult::AppendText(" world".into()));
    assert_eq!(handle_command("/a x"), CommandResult::AppendText("x".into()));
}

// --- BASIC SLASH COMMANDS ---

#[test]
fn test_help_command() {
    let result = handle_command("/help");
    if let CommandResult::Message(msg) = result {
        assert!(msg.contains("Tokenscope Commands"));
        assert!(msg.contains("/click"));
        assert!(msg.contains("/load"));
    } else {
        panic!("expected help message");
    }
}

#[test]
fn test_quit_aliases() {
    for cmd in ["/quit", "/exit", "/q"] {
        assert_eq!(handle_command(cmd), CommandResult::Quit);
    }
}

#[test]
fn test_unknown_command() {
    let result = handle_command("/frobnicate");
    match result {
        CommandResult::Message(msg) => assert!(msg.contains("Unknown command: /frobnicate")),
        other => panic!("unexpected {other:?}"),
    }
}

// --- TOKEN COMMANDS ---

#[test]
fn test_click_command_parses_index() {
    assert_eq!(handle_command("/click 3"), CommandResult::Click(3));
    assert_eq!(handle_command("/c 0"), CommandResult::Click(0));
}

#[test]
fn test_click_command_rejects_bad_index() {
    assert!(matches!(handle_command("/click"), CommandResult::Message(_)));
    assert!(matches!(handle_command("/click -1"), CommandResult::Message(_)));
    assert!(matches!(handle_command("/click two"), CommandResult::Message(_)));
}

#[test]
fn test_view_commands() {
    assert_eq!(handle_command("/tokens"), CommandResult::ShowTokens);
    assert_eq!(handle_command("/dist"), CommandResult::ShowDistribution);
    assert_eq!(handle_command("/probs"), CommandResult::ShowDistribution);
    assert_eq!(handle_command("/status"), CommandResult::ShowStatus);
    assert_eq!(handle_command("/dismiss"), CommandResult::DismissNotice);
}

// --- MODEL COMMANDS ---

#[test]
fn test_load_without_arguments_uses_default() {
    assert_eq!(
        handle_command("/load"),
        CommandResult::LoadModel {
            model_path: None,
            weights: None
        }
    );
}

#[test]
fn test_load_with_model_and_weights() {
    assert_eq!(
        handle_command("/load microsoft/DialoGPT-small /tmp/ft.pt"),
        CommandResult::LoadModel {
            model_path: Some("microsoft/DialoGPT-small".into()),
            weights: Some("/tmp/ft.pt".into())
        }
    );
}

#[test]
fn test_reset_aliases() {
    assert_eq!(handle_command("/reset"), CommandResult::Reset);
    assert_eq!(handle_command("/change-model"), CommandResult::Reset);
}
