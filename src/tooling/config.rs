//! Tooling configuration and its environment resolver.
//!
//! Variables (all optional):
//! - `ALICIA_OPENAI_ENABLE_{WEB_SEARCH,FILE_SEARCH,CODE_INTERPRETER,IMAGE_GENERATION,
//!   REMOTE_MCP,SHELL,APPLY_PATCH,FUNCTION_CALLING,COMPUTER_USE,SKILLS}`
//! - `ALICIA_OPENAI_FILE_SEARCH_VECTOR_STORE_IDS` (comma separated)
//! - `ALICIA_OPENAI_MCP_{SERVER_LABEL,SERVER_URL,CONNECTOR_ID,AUTHORIZATION,REQUIRE_APPROVAL}`
//! - `ALICIA_OPENAI_COMPUTER_{DISPLAY_WIDTH,DISPLAY_HEIGHT,ENVIRONMENT}`
//! - `ALICIA_OPENAI_SKILL_PATHS`, `ALICIA_OPENAI_MAX_SKILLS`, `ALICIA_OPENAI_ENABLED_SKILLS`
//! - `ALICIA_OPENAI_SHELL_TIMEOUT_MS`, `ALICIA_OPENAI_SHELL_MAX_OUTPUT_CHARS`

use std::collections::HashSet;
use std::env;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

use crate::skills::{LocalSkillCatalog, SkillCatalog, SkillDescriptor, DEFAULT_SKILL_LIMIT};
use crate::tooling::descriptor::McpApproval;
use crate::types::ToolFallback;

pub const DEFAULT_MCP_SERVER_LABEL: &str = "alicia-mcp";
pub const DEFAULT_SHELL_TIMEOUT: Duration = Duration::from_millis(30_000);
pub const DEFAULT_SHELL_MAX_OUTPUT_CHARS: usize = 12_000;
pub const MIN_SHELL_TIMEOUT_MS: u64 = 250;
pub const MIN_SHELL_MAX_OUTPUT_CHARS: usize = 512;
/// Skill root used when `ALICIA_OPENAI_SKILL_PATHS` is unset, relative to the workspace.
pub const DEFAULT_SKILLS_DIR: &str = "src/skills";

/// Remote MCP server parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct McpSettings {
    pub server_label: String,
    pub server_url: Option<String>,
    pub connector_id: Option<String>,
    pub authorization: Option<String>,
    pub require_approval: McpApproval,
}

impl Default for McpSettings {
    fn default() -> Self {
        Self {
            server_label: DEFAULT_MCP_SERVER_LABEL.to_string(),
            server_url: None,
            connector_id: None,
            authorization: None,
            require_approval: McpApproval::Never,
        }
    }
}

impl McpSettings {
    pub fn has_endpoint(&self) -> bool {
        self.server_url.is_some() || self.connector_id.is_some()
    }
}

/// Display the computer-use tool drives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComputerDisplay {
    pub width: u32,
    pub height: u32,
    pub environment: String,
}

impl Default for ComputerDisplay {
    fn default() -> Self {
        Self {
            width: 1440,
            height: 900,
            environment: "browser".to_string(),
        }
    }
}

/// Which capabilities are on and what they need.
///
/// Treated as immutable per turn: fallback levels derive reduced copies.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolingConfig {
    pub workspace_root: PathBuf,
    pub enable_web_search: bool,
    pub enable_file_search: bool,
    pub file_search_vector_store_ids: Vec<String>,
    pub enable_code_interpreter: bool,
    pub enable_image_generation: bool,
    pub enable_remote_mcp: bool,
    pub mcp: McpSettings,
    pub enable_shell: bool,
    pub enable_apply_patch: bool,
    pub enable_function_calling: bool,
    pub enable_computer_use: bool,
    pub computer: ComputerDisplay,
    pub enable_skills: bool,
    pub local_skill_search_roots: Vec<PathBuf>,
    /// Full discovered catalog; the enabled subset is chosen per turn.
    pub local_skills: Vec<SkillDescriptor>,
    /// Used when the runtime settings carry no skill selection.
    pub enabled_skill_names: Vec<String>,
    pub shell_timeout: Duration,
    pub shell_max_output_chars: usize,
}

impl Default for ToolingConfig {
    /// Every capability disabled.
    fn default() -> Self {
        Self {
            workspace_root: PathBuf::from("."),
            enable_web_search: false,
            enable_file_search: false,
            file_search_vector_store_ids: Vec::new(),
            enable_code_interpreter: false,
            enable_image_generation: false,
            enable_remote_mcp: false,
            mcp: McpSettings::default(),
            enable_shell: false,
            enable_apply_patch: false,
            enable_function_calling: false,
            enable_computer_use: false,
            computer: ComputerDisplay::default(),
            enable_skills: false,
            local_skill_search_roots: Vec::new(),
            local_skills: Vec::new(),
            enabled_skill_names: Vec::new(),
            shell_timeout: DEFAULT_SHELL_TIMEOUT,
            shell_max_output_chars: DEFAULT_SHELL_MAX_OUTPUT_CHARS,
        }
    }
}

impl ToolingConfig {
    /// Level 1: no shell, patch application, computer use or skills.
    pub fn without_local_execution(&self) -> Self {
        Self {
            enable_shell: false,
            enable_apply_patch: false,
            enable_computer_use: false,
            enable_skills: false,
            ..self.clone()
        }
    }

    /// Level 2: nothing enabled.
    pub fn without_all_tools(&self) -> Self {
        Self {
            enable_web_search: false,
            enable_file_search: false,
            enable_code_interpreter: false,
            enable_image_generation: false,
            enable_remote_mcp: false,
            enable_function_calling: false,
            ..self.without_local_execution()
        }
    }

    pub fn for_fallback(&self, fallback: ToolFallback) -> Self {
        match fallback {
            ToolFallback::None => self.clone(),
            ToolFallback::WithoutLocalTools => self.without_local_execution(),
            ToolFallback::WithoutTools => self.without_all_tools(),
        }
    }
}

/// Builds a [`ToolingConfig`] from environment-style key/value lookups.
///
/// Never fails: unparsable values fall back to defaults, an invalid MCP URL is
/// dropped with a log line (the tool set builder then reports the missing endpoint).
pub struct ToolingConfigResolver {
    workspace_root: PathBuf,
    lookup: Box<dyn Fn(&str) -> Option<String> + Send + Sync>,
    skill_catalog: Option<Arc<dyn SkillCatalog>>,
}

impl ToolingConfigResolver {
    /// Resolver over the process environment.
    pub fn new(workspace_root: impl Into<PathBuf>) -> Self {
        Self {
            workspace_root: workspace_root.into(),
            lookup: Box::new(|key| env::var(key).ok()),
            skill_catalog: None,
        }
    }

    /// Replace the variable source (tests, config files).
    pub fn with_lookup<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String> + Send + Sync + 'static,
    {
        self.lookup = Box::new(lookup);
        self
    }

    /// Use this catalog instead of scanning the configured skill roots.
    pub fn with_skill_catalog(mut self, catalog: Arc<dyn SkillCatalog>) -> Self {
        self.skill_catalog = Some(catalog);
        self
    }

    fn var(&self, key: &str) -> Option<String> {
        (self.lookup)(key)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    fn flag(&self, key: &str, default: bool) -> bool {
        parse_bool_flag(self.var(key).as_deref(), default)
    }

    pub fn resolve(&self) -> ToolingConfig {
        let file_search_vector_store_ids =
            parse_csv(self.var("ALICIA_OPENAI_FILE_SEARCH_VECTOR_STORE_IDS").as_deref());

        let local_skill_search_roots = self.skill_roots();
        let skill_limit = parse_integer(
            self.var("ALICIA_OPENAI_MAX_SKILLS").as_deref(),
            DEFAULT_SKILL_LIMIT as u64,
            1,
        ) as usize;
        let local_skills = match &self.skill_catalog {
            Some(catalog) => catalog.list_available_skills(),
            None => LocalSkillCatalog::new(local_skill_search_roots.clone())
                .with_limit(skill_limit)
                .list_available_skills(),
        };

        let mcp = McpSettings {
            server_label: self
                .var("ALICIA_OPENAI_MCP_SERVER_LABEL")
                .unwrap_or_else(|| DEFAULT_MCP_SERVER_LABEL.to_string()),
            server_url: self
                .var("ALICIA_OPENAI_MCP_SERVER_URL")
                .and_then(|raw| validate_server_url(&raw)),
            connector_id: self.var("ALICIA_OPENAI_MCP_CONNECTOR_ID"),
            authorization: self.var("ALICIA_OPENAI_MCP_AUTHORIZATION"),
            require_approval: self
                .var("ALICIA_OPENAI_MCP_REQUIRE_APPROVAL")
                .map(|v| McpApproval::parse(&v))
                .unwrap_or_default(),
        };

        let defaults = ComputerDisplay::default();
        let computer = ComputerDisplay {
            width: parse_integer(
                self.var("ALICIA_OPENAI_COMPUTER_DISPLAY_WIDTH").as_deref(),
                defaults.width as u64,
                1,
            )
            .min(u32::MAX as u64) as u32,
            height: parse_integer(
                self.var("ALICIA_OPENAI_COMPUTER_DISPLAY_HEIGHT").as_deref(),
                defaults.height as u64,
                1,
            )
            .min(u32::MAX as u64) as u32,
            environment: self
                .var("ALICIA_OPENAI_COMPUTER_ENVIRONMENT")
                .unwrap_or(defaults.environment),
        };

        ToolingConfig {
            workspace_root: self.workspace_root.clone(),
            enable_web_search: self.flag("ALICIA_OPENAI_ENABLE_WEB_SEARCH", true),
            enable_file_search: self.flag(
                "ALICIA_OPENAI_ENABLE_FILE_SEARCH",
                !file_search_vector_store_ids.is_empty(),
            ),
            file_search_vector_store_ids,
            enable_code_interpreter: self.flag("ALICIA_OPENAI_ENABLE_CODE_INTERPRETER", true),
            enable_image_generation: self.flag("ALICIA_OPENAI_ENABLE_IMAGE_GENERATION", true),
            enable_remote_mcp: self.flag("ALICIA_OPENAI_ENABLE_REMOTE_MCP", mcp.has_endpoint()),
            mcp,
            enable_shell: self.flag("ALICIA_OPENAI_ENABLE_SHELL", false),
            enable_apply_patch: self.flag("ALICIA_OPENAI_ENABLE_APPLY_PATCH", false),
            enable_function_calling: self.flag("ALICIA_OPENAI_ENABLE_FUNCTION_CALLING", true),
            enable_computer_use: self.flag("ALICIA_OPENAI_ENABLE_COMPUTER_USE", false),
            computer,
            enable_skills: self.flag("ALICIA_OPENAI_ENABLE_SKILLS", false),
            local_skill_search_roots,
            local_skills,
            enabled_skill_names: parse_csv(self.var("ALICIA_OPENAI_ENABLED_SKILLS").as_deref()),
            shell_timeout: Duration::from_millis(parse_integer(
                self.var("ALICIA_OPENAI_SHELL_TIMEOUT_MS").as_deref(),
                DEFAULT_SHELL_TIMEOUT.as_millis() as u64,
                MIN_SHELL_TIMEOUT_MS,
            )),
            shell_max_output_chars: parse_integer(
                self.var("ALICIA_OPENAI_SHELL_MAX_OUTPUT_CHARS").as_deref(),
                DEFAULT_SHELL_MAX_OUTPUT_CHARS as u64,
                MIN_SHELL_MAX_OUTPUT_CHARS as u64,
            ) as usize,
        }
    }

    fn skill_roots(&self) -> Vec<PathBuf> {
        let configured: Vec<PathBuf> = parse_csv(self.var("ALICIA_OPENAI_SKILL_PATHS").as_deref())
            .into_iter()
            .map(|root| resolve_against(&self.workspace_root, &root))
            .collect();
        let roots = if configured.is_empty() {
            vec![self.workspace_root.join(DEFAULT_SKILLS_DIR)]
        } else {
            configured
        };

        let mut seen = HashSet::new();
        roots.into_iter().filter(|r| seen.insert(r.clone())).collect()
    }
}

pub(crate) fn resolve_against(base: &Path, path: &str) -> PathBuf {
    let p = Path::new(path);
    if p.is_absolute() {
        p.to_path_buf()
    } else {
        base.join(p)
    }
}

fn validate_server_url(raw: &str) -> Option<String> {
    match url::Url::parse(raw) {
        Ok(u) if matches!(u.scheme(), "http" | "https") => Some(raw.to_string()),
        Ok(u) => {
            warn!(scheme = u.scheme(), "ignoring MCP server URL with unsupported scheme");
            None
        }
        Err(e) => {
            warn!(error = %e, "ignoring invalid MCP server URL");
            None
        }
    }
}

/// `1/true/yes/on` and `0/false/no/off`, case-insensitive; anything else keeps `default`.
pub fn parse_bool_flag(value: Option<&str>, default: bool) -> bool {
    let Some(value) = value else {
        return default;
    };
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => true,
        "0" | "false" | "no" | "off" => false,
        _ => default,
    }
}

/// Parse an integer clamped to `min`; unparsable values keep `default`.
pub fn parse_integer(value: Option<&str>, default: u64, min: u64) -> u64 {
    value
        .and_then(|v| v.trim().parse::<i64>().ok())
        .map(|v| v.max(min as i64) as u64)
        .unwrap_or(default)
}

pub fn parse_csv(value: Option<&str>) -> Vec<String> {
    value
        .unwrap_or("")
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn resolver(vars: &[(&str, &str)]) -> ToolingConfigResolver {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ToolingConfigResolver::new("/work")
            .with_lookup(move |k| map.get(k).cloned())
            .with_skill_catalog(Arc::new(Vec::<SkillDescriptor>::new()))
    }

    #[test]
    fn defaults_without_environment() {
        let cfg = resolver(&[]).resolve();
        assert!(cfg.enable_web_search);
        assert!(cfg.enable_code_interpreter);
        assert!(cfg.enable_image_generation);
        assert!(cfg.enable_function_calling);
        assert!(!cfg.enable_file_search);
        assert!(!cfg.enable_remote_mcp);
        assert!(!cfg.enable_shell);
        assert!(!cfg.enable_apply_patch);
        assert!(!cfg.enable_computer_use);
        assert!(!cfg.enable_skills);
        assert_eq!(cfg.shell_timeout, DEFAULT_SHELL_TIMEOUT);
        assert_eq!(cfg.local_skill_search_roots, vec![PathBuf::from("/work/src/skills")]);
    }

    #[test]
    fn vector_stores_and_mcp_endpoint_turn_their_tools_on() {
        let cfg = resolver(&[
            ("ALICIA_OPENAI_FILE_SEARCH_VECTOR_STORE_IDS", "vs_1, ,vs_2"),
            ("ALICIA_OPENAI_MCP_CONNECTOR_ID", "connector_drive"),
            ("ALICIA_OPENAI_MCP_REQUIRE_APPROVAL", "always"),
        ])
        .resolve();
        assert!(cfg.enable_file_search);
        assert_eq!(cfg.file_search_vector_store_ids, vec!["vs_1", "vs_2"]);
        assert!(cfg.enable_remote_mcp);
        assert_eq!(cfg.mcp.require_approval, McpApproval::Always);
        assert_eq!(cfg.mcp.server_label, DEFAULT_MCP_SERVER_LABEL);
    }

    #[test]
    fn invalid_mcp_url_is_dropped() {
        let cfg = resolver(&[
            ("ALICIA_OPENAI_ENABLE_REMOTE_MCP", "on"),
            ("ALICIA_OPENAI_MCP_SERVER_URL", "not a url"),
        ])
        .resolve();
        assert!(cfg.enable_remote_mcp);
        assert!(cfg.mcp.server_url.is_none());
    }

    #[test]
    fn numeric_limits_are_clamped() {
        let cfg = resolver(&[
            ("ALICIA_OPENAI_SHELL_TIMEOUT_MS", "10"),
            ("ALICIA_OPENAI_SHELL_MAX_OUTPUT_CHARS", "garbage"),
            ("ALICIA_OPENAI_COMPUTER_DISPLAY_WIDTH", "1024"),
        ])
        .resolve();
        assert_eq!(cfg.shell_timeout, Duration::from_millis(MIN_SHELL_TIMEOUT_MS));
        assert_eq!(cfg.shell_max_output_chars, DEFAULT_SHELL_MAX_OUTPUT_CHARS);
        assert_eq!(cfg.computer.width, 1024);
        assert_eq!(cfg.computer.height, 900);
    }

    #[test]
    fn oversized_display_dimensions_saturate() {
        let cfg = resolver(&[
            ("ALICIA_OPENAI_COMPUTER_DISPLAY_WIDTH", "4294967296"),
            ("ALICIA_OPENAI_COMPUTER_DISPLAY_HEIGHT", "99999999999"),
        ])
        .resolve();
        assert_eq!(cfg.computer.width, u32::MAX);
        assert_eq!(cfg.computer.height, u32::MAX);
    }

    #[test]
    fn skill_paths_resolve_relative_to_workspace_and_dedupe() {
        let cfg = resolver(&[("ALICIA_OPENAI_SKILL_PATHS", "a,/abs,a")]).resolve();
        assert_eq!(
            cfg.local_skill_search_roots,
            vec![PathBuf::from("/work/a"), PathBuf::from("/abs")]
        );
    }

    #[test]
    fn bool_flags() {
        assert!(parse_bool_flag(Some("YES"), false));
        assert!(!parse_bool_flag(Some("off"), true));
        assert!(parse_bool_flag(Some("maybe"), true));
        assert!(!parse_bool_flag(None, false));
    }

    #[test]
    fn fallback_levels_reduce_capabilities() {
        let full = ToolingConfig {
            enable_web_search: true,
            enable_shell: true,
            enable_apply_patch: true,
            enable_computer_use: true,
            enable_skills: true,
            enable_function_calling: true,
            ..Default::default()
        };
        let l1 = full.for_fallback(ToolFallback::WithoutLocalTools);
        assert!(l1.enable_web_search && l1.enable_function_calling);
        assert!(!l1.enable_shell && !l1.enable_apply_patch && !l1.enable_computer_use && !l1.enable_skills);

        let l2 = full.for_fallback(ToolFallback::WithoutTools);
        assert!(!l2.enable_web_search && !l2.enable_function_calling);
        assert_eq!(full.for_fallback(ToolFallback::None), full);
    }
}
