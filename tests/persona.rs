//! Base instructions composed from the workspace persona layers.

mod common;

use std::fs;
use std::path::Path;
use std::sync::Arc;

use alicia_runtime::client::DEFAULT_SYSTEM_INSTRUCTIONS;
use alicia_runtime::persona::{IDENTITY_LOCK, PERSONA_INSTRUCTIONS};
use alicia_runtime::{
    AssistantRequest, Error, PersonaLoader, ResponsesAssistant, ResponsesAssistantBuilder,
    ToolingConfig,
};
use common::{text_response, ScriptedTransport};

fn write_layers(root: &Path, voice: &str) {
    let dir = root.join("src/soul");
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join("IDENTITY.md"), "---\nlayer: identity\n---\nI am Alicia.\n").unwrap();
    fs::write(dir.join("SOUL.md"), "Curious and steady.").unwrap();
    fs::write(dir.join("VOICE.md"), voice).unwrap();
    fs::write(dir.join("MODES.md"), "Focus mode: short answers.").unwrap();
}

fn bare_builder(transport: Arc<ScriptedTransport>) -> ResponsesAssistantBuilder {
    ResponsesAssistant::builder()
        .transport(transport)
        .settings(common::settings())
        .tooling_config(ToolingConfig::default())
}

fn isolated(root: &Path) -> PersonaLoader {
    PersonaLoader::new(root).with_lookup(|_| None)
}

#[tokio::test]
async fn workspace_layers_become_the_base_instructions() {
    let dir = tempfile::tempdir().unwrap();
    write_layers(dir.path(), "Warm, direct.");
    let transport = ScriptedTransport::new();
    transport.reply(text_response("resp_1", "hello"));

    let assistant = bare_builder(transport.clone())
        .persona_loader(isolated(dir.path()))
        .extra_instructions("  Keep it short.  ")
        .build()
        .unwrap();
    assistant.respond(&AssistantRequest::new("s", "hi")).await.unwrap();

    let expected = format!(
        "Keep it short.\n\n{}\n\nI am Alicia.\n\nCurious and steady.\n\nWarm, direct.\n\nFocus mode: short answers.\n\n{}",
        IDENTITY_LOCK, PERSONA_INSTRUCTIONS
    );
    assert_eq!(transport.requests()[0].instructions, expected);
}

#[tokio::test]
async fn workspace_root_loads_layers_from_default_paths() {
    let dir = tempfile::tempdir().unwrap();
    write_layers(dir.path(), "Warm, direct.");
    let transport = ScriptedTransport::new();
    transport.reply(text_response("resp_1", "hello"));

    let assistant = bare_builder(transport.clone())
        .workspace_root(dir.path())
        .build()
        .unwrap();
    assistant.respond(&AssistantRequest::new("s", "hi")).await.unwrap();

    let instructions = &transport.requests()[0].instructions;
    assert!(instructions.starts_with(IDENTITY_LOCK));
    assert!(instructions.contains("Warm, direct."));
    assert!(!instructions.contains("layer: identity"));
}

#[tokio::test]
async fn workspace_without_layers_keeps_the_default_persona() {
    let dir = tempfile::tempdir().unwrap();
    let transport = ScriptedTransport::new();
    transport.reply(text_response("resp_1", "hello"));

    let assistant = bare_builder(transport.clone())
        .persona_loader(isolated(dir.path()))
        .build()
        .unwrap();
    assistant.respond(&AssistantRequest::new("s", "hi")).await.unwrap();

    assert_eq!(transport.requests()[0].instructions, DEFAULT_SYSTEM_INSTRUCTIONS);
}

#[test]
fn empty_layer_fails_the_build() {
    let dir = tempfile::tempdir().unwrap();
    write_layers(dir.path(), "---\ntone: warm\n---\n\n");

    let err = bare_builder(ScriptedTransport::new())
        .persona_loader(isolated(dir.path()))
        .build()
        .err()
        .unwrap();

    assert!(matches!(err, Error::Configuration { .. }), "got {err:?}");
    assert_eq!(
        err.context().and_then(|c| c.field_path.as_deref()),
        Some("ALICIA_VOICE_PATH")
    );
}

#[test]
fn explicit_instructions_skip_the_layers() {
    let dir = tempfile::tempdir().unwrap();
    write_layers(dir.path(), "");

    let built = bare_builder(ScriptedTransport::new())
        .persona_loader(isolated(dir.path()))
        .system_instructions("You are a test assistant.")
        .build();
    assert!(built.is_ok());
}
