use std::collections::HashMap;

use serde::Deserialize;
use serde_json::Value;

pub(crate) const SETTINGS_SECTION_KEY: &str = "zig-analyzer";

const DEFAULT_ZIG_PATH: &str = "zig";
const DEFAULT_OUTLINE_PATH: &str = "hoodie";

/// Runtime server settings updated from LSP configuration payloads.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ServerSettings {
    pub(crate) tools: ToolSettings,
}

impl ServerSettings {
    pub(crate) fn from_lsp_payload(payload: Option<&Value>) -> Self {
        let mut settings = Self::default();
        if let Some(payload) = payload {
            settings = settings.merged_with_payload(payload);
        }
        settings
    }

    pub(crate) fn merged_with_payload(&self, payload: &Value) -> Self {
        let mut merged = self.clone();

        for candidate in payload_candidates(payload) {
            if let Ok(patch) = serde_json::from_value::<ServerSettingsPatch>(candidate.clone()) {
                merged.apply_patch(patch);
            }
        }

        merged.normalize();
        merged
    }

    fn apply_patch(&mut self, patch: ServerSettingsPatch) {
        if let Some(tools) = patch.tools {
            self.tools.apply_patch(tools);
        }
        // Flat keys (zigPath / outlinePath at section level) are accepted too,
        // matching how editors commonly surface these two settings.
        if let Some(zig_path) = patch.zig_path {
            self.tools.zig_path = zig_path;
        }
        if let Some(outline_path) = patch.outline_path {
            self.tools.outline_path = outline_path;
        }
    }

    fn normalize(&mut self) {
        self.tools.normalize();
    }
}

/// Paths of the external executables this server drives.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ToolSettings {
    /// The `zig` binary used for `zig test`.
    pub(crate) zig_path: String,
    /// The outline tool invoked as `<outline_path> outline <file>`.
    pub(crate) outline_path: String,
}

impl Default for ToolSettings {
    fn default() -> Self {
        Self {
            zig_path: DEFAULT_ZIG_PATH.to_string(),
            outline_path: DEFAULT_OUTLINE_PATH.to_string(),
        }
    }
}

impl ToolSettings {
    fn apply_patch(&mut self, patch: ToolSettingsPatch) {
        if let Some(zig_path) = patch.zig_path {
            self.zig_path = zig_path;
        }
        if let Some(outline_path) = patch.outline_path {
            self.outline_path = outline_path;
        }
    }

    fn normalize(&mut self) {
        self.zig_path = self.zig_path.trim().to_string();
        if self.zig_path.is_empty() {
            self.zig_path = DEFAULT_ZIG_PATH.to_string();
        }
        self.outline_path = self.outline_path.trim().to_string();
        if self.outline_path.is_empty() {
            self.outline_path = DEFAULT_OUTLINE_PATH.to_string();
        }
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default, rename_all = "camelCase")]
struct ServerSettingsPatch {
    tools: Option<ToolSettingsPatch>,
    zig_path: Option<String>,
    outline_path: Option<String>,
    #[serde(flatten)]
    _extra: HashMap<String, Value>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default, rename_all = "camelCase")]
struct ToolSettingsPatch {
    zig_path: Option<String>,
    outline_path: Option<String>,
    #[serde(flatten)]
    _extra: HashMap<String, Value>,
}

fn payload_candidates(payload: &Value) -> Vec<Value> {
    let mut candidates = Vec::new();
    candidates.push(payload.clone());

    if let Some(scoped) = payload.get(SETTINGS_SECTION_KEY) {
        candidates.push(scoped.clone());
    }

    candidates
}

#[cfg(test)]
#[path = "../../tests/src/server/settings_tests.rs"]
mod tests;
