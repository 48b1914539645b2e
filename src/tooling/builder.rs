//! Turns a [`ToolingConfig`] into the concrete tool set of one request.
//!
//! Building never fails: a capability that is enabled but cannot be expressed
//! (missing vector store, missing MCP endpoint, skills without shell...) is left
//! out and reported as a warning instead.

use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::skills::SkillDescriptor;
use crate::tooling::config::ToolingConfig;
use crate::tooling::descriptor::{Container, ToolDescriptor};
use crate::tooling::executor::{FunctionCallExecutor, FunctionHandler};
use crate::tooling::python::{
    run_python_inline_descriptor, ProcessScriptRunner, RunPythonInline, ScriptRunner,
    RUN_PYTHON_INLINE,
};

/// Capability marker added when skills are active.
pub const SKILLS_CAPABILITY: &str = "skills";

/// Everything derived from one tooling configuration.
#[derive(Debug, Clone, Default)]
pub struct ToolSet {
    pub tools: Vec<ToolDescriptor>,
    pub tool_names: Vec<String>,
    /// Tool names plus non-tool capabilities such as `skills`.
    pub capability_names: Vec<String>,
    pub system_hints: Vec<String>,
    pub warnings: Vec<String>,
    pub executor: FunctionCallExecutor,
}

impl ToolSet {
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Whether any tool acts on the local machine, i.e. level 1 would remove something.
    pub fn has_local_execution(&self) -> bool {
        self.tools.iter().any(ToolDescriptor::is_local_execution)
    }
}

struct ExtraFunction {
    descriptor: ToolDescriptor,
    handler: Arc<dyn FunctionHandler>,
}

/// Builds [`ToolSet`]s. Holds only injectable collaborators, so one builder
/// serves every fallback level.
#[derive(Default)]
pub struct ToolSetBuilder {
    runner: Option<Arc<dyn ScriptRunner>>,
    extra_functions: Vec<ExtraFunction>,
}

impl ToolSetBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Script runner used by `run_python_inline` (a process runner by default).
    pub fn with_script_runner(mut self, runner: Arc<dyn ScriptRunner>) -> Self {
        self.runner = Some(runner);
        self
    }

    /// Register an additional function tool, active whenever function calling is.
    pub fn with_function(
        mut self,
        descriptor: ToolDescriptor,
        handler: Arc<dyn FunctionHandler>,
    ) -> Self {
        self.extra_functions.push(ExtraFunction {
            descriptor,
            handler,
        });
        self
    }

    pub fn build(&self, config: &ToolingConfig, enabled_skill_names: &[String]) -> ToolSet {
        let mut tools = Vec::new();
        let mut warnings = Vec::new();
        let mut system_hints = Vec::new();
        let mut executor = FunctionCallExecutor::new();
        let mut skills_active = false;

        if config.enable_web_search {
            tools.push(ToolDescriptor::WebSearch);
        }

        if config.enable_file_search {
            if config.file_search_vector_store_ids.is_empty() {
                warnings.push(
                    "file_search enabled without `ALICIA_OPENAI_FILE_SEARCH_VECTOR_STORE_IDS`; tool skipped."
                        .to_string(),
                );
            } else {
                tools.push(ToolDescriptor::FileSearch {
                    vector_store_ids: config.file_search_vector_store_ids.clone(),
                });
            }
        }

        if config.enable_code_interpreter {
            tools.push(ToolDescriptor::CodeInterpreter {
                container: Container::auto(),
            });
        }

        if config.enable_image_generation {
            tools.push(ToolDescriptor::ImageGeneration);
        }

        if config.enable_remote_mcp {
            let mcp = &config.mcp;
            let endpoint = match (&mcp.server_url, &mcp.connector_id) {
                (Some(url), _) => Some((Some(url.clone()), None)),
                (None, Some(id)) => Some((None, Some(id.clone()))),
                (None, None) => None,
            };
            match endpoint {
                Some((server_url, connector_id)) => tools.push(ToolDescriptor::Mcp {
                    server_label: mcp.server_label.clone(),
                    server_url,
                    connector_id,
                    authorization: mcp.authorization.clone(),
                    require_approval: mcp.require_approval,
                }),
                None => warnings.push(
                    "mcp enabled without `ALICIA_OPENAI_MCP_SERVER_URL` or `ALICIA_OPENAI_MCP_CONNECTOR_ID`; tool skipped."
                        .to_string(),
                ),
            }
        }

        if config.enable_shell {
            tools.push(ToolDescriptor::Shell {
                container: Container::auto(),
            });
        }

        if config.enable_apply_patch {
            tools.push(ToolDescriptor::ApplyPatch);
        }

        if config.enable_computer_use {
            tools.push(ToolDescriptor::ComputerUsePreview {
                display_width: config.computer.width,
                display_height: config.computer.height,
                environment: config.computer.environment.clone(),
            });
        }

        if config.enable_function_calling {
            let runner = self.runner.clone().unwrap_or_else(|| -> Arc<dyn ScriptRunner> {
                Arc::new(ProcessScriptRunner::new(
                    config.shell_timeout,
                    config.shell_max_output_chars,
                ))
            });
            executor.register(RUN_PYTHON_INLINE, Arc::new(RunPythonInline::new(runner)));
            tools.push(run_python_inline_descriptor());

            for extra in &self.extra_functions {
                let name = extra.descriptor.name().to_string();
                if executor.contains(&name) {
                    warn!(function = %name, "ignoring duplicate function registration");
                    continue;
                }
                executor.register(name, extra.handler.clone());
                tools.push(extra.descriptor.clone());
            }
        }

        if config.enable_skills {
            if !config.enable_shell {
                warnings.push("skills enabled without `shell`; local skills require the shell tool.".to_string());
            } else if config.local_skills.is_empty() {
                let roots: Vec<String> = config
                    .local_skill_search_roots
                    .iter()
                    .map(|r| normalize_path(&r.to_string_lossy()))
                    .collect();
                warnings.push(format!(
                    "skills enabled, but no SKILL.md was found in: {}.",
                    if roots.is_empty() {
                        "(none)".to_string()
                    } else {
                        roots.join(", ")
                    }
                ));
            } else {
                let enabled = select_enabled_skills(&config.local_skills, enabled_skill_names);
                if enabled.is_empty() {
                    warnings.push("skills enabled, but none was activated via `/skills`.".to_string());
                } else {
                    system_hints.push(format_skills_hint(&enabled));
                    skills_active = true;
                }
            }
        }

        let tool_names = dedupe(tools.iter().map(|t| t.name().to_string()));
        let mut capability_names = tool_names.clone();
        if skills_active {
            capability_names.push(SKILLS_CAPABILITY.to_string());
        }
        let capability_names = dedupe(capability_names);

        for warning in &warnings {
            warn!(warning = %warning, "tool configuration warning");
        }
        debug!(tools = ?tool_names, capabilities = ?capability_names, "tool set built");

        ToolSet {
            tools,
            tool_names,
            capability_names,
            system_hints,
            warnings,
            executor,
        }
    }
}

fn dedupe<I: IntoIterator<Item = String>>(items: I) -> Vec<String> {
    let mut seen = HashSet::new();
    items.into_iter().filter(|i| seen.insert(i.clone())).collect()
}

fn normalize_path(path: &str) -> String {
    path.replace('\\', "/")
}

fn select_enabled_skills<'a>(
    skills: &'a [SkillDescriptor],
    enabled: &[String],
) -> Vec<&'a SkillDescriptor> {
    let wanted: HashSet<String> = enabled.iter().map(|n| n.trim().to_lowercase()).collect();
    skills
        .iter()
        .filter(|s| wanted.contains(&s.name.trim().to_lowercase()))
        .collect()
}

/// Instruction block listing the enabled skills.
pub fn format_skills_hint(skills: &[&SkillDescriptor]) -> String {
    let quote = |s: &str| serde_json::Value::String(s.to_string()).to_string();

    let mut lines = vec![
        "Local skills are available through the shell tool.".to_string(),
        "Before using a skill, open the SKILL.md file at the given path.".to_string(),
    ];
    for (i, skill) in skills.iter().enumerate() {
        lines.push(format!(
            "{}. name={} description={} path={}",
            i + 1,
            quote(&skill.name),
            quote(&skill.description),
            quote(&normalize_path(&skill.path.to_string_lossy())),
        ));
    }
    lines.join("\n")
}
