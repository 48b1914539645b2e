//! Capability fallback ladder and per-turn skill selection.

mod common;

use std::path::PathBuf;
use std::sync::Arc;

use alicia_runtime::skills::SkillDescriptor;
use alicia_runtime::{
    AssistantRequest, ChatMessage, Error, ProviderId, RuntimeSettings, ToolFallback, ToolingConfig,
};
use common::{builder, text_response, ScriptedTransport};

fn ask(message: &str) -> AssistantRequest {
    AssistantRequest::new("session", message).with_history(vec![ChatMessage::user(message)])
}

fn web_shell_and_computer() -> ToolingConfig {
    ToolingConfig {
        enable_web_search: true,
        enable_shell: true,
        enable_computer_use: true,
        ..ToolingConfig::default()
    }
}

fn skills_config() -> ToolingConfig {
    ToolingConfig {
        enable_shell: true,
        enable_skills: true,
        local_skills: vec![
            SkillDescriptor::new("pdf", "Read PDF files", PathBuf::from("/ws/skills/pdf")),
            SkillDescriptor::new("csv", "Summarize CSV files", PathBuf::from("/ws/skills/csv")),
        ],
        enabled_skill_names: vec!["csv".to_string()],
        ..ToolingConfig::default()
    }
}

#[tokio::test(start_paused = true)]
async fn rejected_computer_use_falls_back_once_to_hosted_tools() {
    let transport = ScriptedTransport::new();
    transport
        .fail(400, "unsupported tool: computer_use_preview")
        .reply(text_response("resp_1", "searched the web"));

    let assistant = builder(transport.clone(), web_shell_and_computer()).build().unwrap();
    let outcome = assistant.respond(&ask("news?")).await.unwrap();

    assert_eq!(outcome.text, "searched the web");
    assert_eq!(outcome.metadata.tool_fallback, ToolFallback::WithoutLocalTools);
    assert_eq!(outcome.metadata.tools, vec!["web_search"]);
    assert_eq!(
        transport.tool_names(),
        vec![
            vec![
                "web_search".to_string(),
                "shell".to_string(),
                "computer_use_preview".to_string(),
            ],
            vec!["web_search".to_string()],
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn level_one_is_skipped_when_it_would_be_empty() {
    let transport = ScriptedTransport::new();
    transport
        .fail(400, "Tool 'shell' is not supported with this model")
        .reply(text_response("resp_1", "no tools"));

    let tooling = ToolingConfig {
        enable_shell: true,
        enable_apply_patch: true,
        ..ToolingConfig::default()
    };
    let assistant = builder(transport.clone(), tooling).build().unwrap();
    let outcome = assistant.respond(&ask("patch it")).await.unwrap();

    assert_eq!(outcome.metadata.tool_fallback, ToolFallback::WithoutTools);
    assert!(outcome.metadata.tools.is_empty());
    let requests = transport.requests();
    assert_eq!(requests.len(), 2);
    assert!(requests[1].tools.is_none());
}

#[tokio::test(start_paused = true)]
async fn level_one_is_skipped_when_it_removes_nothing() {
    let transport = ScriptedTransport::new();
    transport
        .fail(400, "unknown tool type: web_search")
        .reply(text_response("resp_1", "bare"));

    let tooling = ToolingConfig {
        enable_web_search: true,
        ..ToolingConfig::default()
    };
    let assistant = builder(transport.clone(), tooling).build().unwrap();
    let outcome = assistant.respond(&ask("hi")).await.unwrap();

    assert_eq!(outcome.metadata.tool_fallback, ToolFallback::WithoutTools);
    assert_eq!(transport.requests().len(), 2);
}

#[tokio::test(start_paused = true)]
async fn compatibility_failure_at_level_one_descends_to_level_two() {
    let transport = ScriptedTransport::new();
    transport
        .fail(400, "unsupported tool: computer_use_preview")
        .fail(400, "invalid tool configuration: web_search")
        .reply(text_response("resp_1", "finally"));

    let assistant = builder(transport.clone(), web_shell_and_computer()).build().unwrap();
    let outcome = assistant.respond(&ask("hi")).await.unwrap();

    assert_eq!(outcome.text, "finally");
    assert_eq!(outcome.metadata.tool_fallback, ToolFallback::WithoutTools);
    assert_eq!(transport.tool_names().len(), 3);
    assert!(transport.tool_names()[2].is_empty());
}

#[tokio::test(start_paused = true)]
async fn other_failure_at_level_one_is_returned() {
    let transport = ScriptedTransport::new();
    transport
        .fail(400, "unsupported tool: computer_use_preview")
        .fail(401, "invalid api key");

    let assistant = builder(transport.clone(), web_shell_and_computer()).build().unwrap();
    let err = assistant.respond(&ask("hi")).await.unwrap_err();

    assert_eq!(err.status(), Some(401));
    assert_eq!(transport.requests().len(), 2);
}

#[tokio::test(start_paused = true)]
async fn failure_at_level_two_surfaces() {
    let transport = ScriptedTransport::new();
    transport
        .fail(400, "unsupported tool: shell")
        .fail(400, "unsupported tool: still");

    let tooling = ToolingConfig {
        enable_shell: true,
        ..ToolingConfig::default()
    };
    let assistant = builder(transport.clone(), tooling).build().unwrap();
    let err = assistant.respond(&ask("hi")).await.unwrap_err();

    assert!(matches!(err, Error::Upstream { .. }), "got {err:?}");
    assert_eq!(transport.requests().len(), 2);
}

#[tokio::test(start_paused = true)]
async fn tool_looking_errors_without_tools_are_not_retried_as_fallback() {
    let transport = ScriptedTransport::new();
    transport.fail(400, "unsupported tool: none configured");

    let assistant = builder(transport.clone(), ToolingConfig::default()).build().unwrap();
    assert!(assistant.respond(&ask("hi")).await.is_err());
    assert_eq!(transport.requests().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn non_compatibility_errors_do_not_fall_back() {
    let transport = ScriptedTransport::new();
    transport.fail(400, "context length exceeded");

    let assistant = builder(transport.clone(), web_shell_and_computer()).build().unwrap();
    assert!(assistant.respond(&ask("hi")).await.is_err());
    assert_eq!(transport.requests().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn settings_skill_selection_wins_over_configured_default() {
    let transport = ScriptedTransport::new();
    transport.reply(text_response("resp_1", "ok"));

    let assistant = builder(transport.clone(), skills_config())
        .settings(Arc::new(
            RuntimeSettings::new(ProviderId::OpenAi, "gpt-5").with_enabled_skills(["pdf"]),
        ))
        .build()
        .unwrap();
    let outcome = assistant.respond(&ask("read the pdf")).await.unwrap();

    assert_eq!(outcome.metadata.capabilities, vec!["shell", "skills"]);
    let instructions = &transport.requests()[0].instructions;
    assert!(instructions.starts_with("You are a test assistant.\n\n"));
    assert!(instructions.contains(r#"name="pdf""#));
    assert!(!instructions.contains(r#"name="csv""#));
}

#[tokio::test(start_paused = true)]
async fn configured_skills_apply_when_settings_have_none() {
    let transport = ScriptedTransport::new();
    transport.reply(text_response("resp_1", "ok"));

    let assistant = builder(transport.clone(), skills_config()).build().unwrap();
    assistant.respond(&ask("summarize")).await.unwrap();

    let instructions = &transport.requests()[0].instructions;
    assert!(instructions.contains(r#"name="csv""#));
    assert!(!instructions.contains(r#"name="pdf""#));
}

#[tokio::test(start_paused = true)]
async fn dropping_skills_marks_instructions_fallback() {
    let transport = ScriptedTransport::new();
    transport
        .fail(400, "unsupported tool: shell")
        .reply(text_response("resp_1", "ok"));

    let tooling = ToolingConfig {
        enable_web_search: true,
        ..skills_config()
    };
    let assistant = builder(transport.clone(), tooling).build().unwrap();
    let outcome = assistant.respond(&ask("hi")).await.unwrap();

    assert_eq!(outcome.metadata.tool_fallback, ToolFallback::WithoutLocalTools);
    assert!(outcome.metadata.instructions_fallback);
    assert_eq!(outcome.metadata.capabilities, vec!["web_search"]);
    let requests = transport.requests();
    assert!(requests[0].instructions.contains("Local skills are available"));
    assert_eq!(requests[1].instructions, "You are a test assistant.");
}

#[tokio::test(start_paused = true)]
async fn system_patches_follow_the_base_instructions() {
    let transport = ScriptedTransport::new();
    transport.reply(text_response("resp_1", "ok"));

    let assistant = builder(transport.clone(), ToolingConfig::default()).build().unwrap();
    assistant
        .respond(&ask("hi").with_system_patch("  Answer in French.  ").with_system_patch("   "))
        .await
        .unwrap();

    assert_eq!(
        transport.requests()[0].instructions,
        "You are a test assistant.\n\nAnswer in French."
    );
}
