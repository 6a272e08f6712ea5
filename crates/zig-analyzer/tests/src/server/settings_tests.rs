use serde_json::json;

use super::*;

#[test]
fn defaults_point_at_path_binaries() {
    let settings = ServerSettings::default();
    assert_eq!(settings.tools.zig_path, "zig");
    assert_eq!(settings.tools.outline_path, "hoodie");
}

#[test]
fn section_scoped_payload_is_applied() {
    let payload = json!({
        "zig-analyzer": {
            "tools": {
                "zigPath": "/opt/zig/zig",
                "outlinePath": "/opt/hoodie/hoodie"
            }
        }
    });
    let settings = ServerSettings::from_lsp_payload(Some(&payload));
    assert_eq!(settings.tools.zig_path, "/opt/zig/zig");
    assert_eq!(settings.tools.outline_path, "/opt/hoodie/hoodie");
}

#[test]
fn flat_keys_are_accepted() {
    let payload = json!({"zigPath": "zig-0.14", "outlinePath": "hoodie-dev"});
    let settings = ServerSettings::from_lsp_payload(Some(&payload));
    assert_eq!(settings.tools.zig_path, "zig-0.14");
    assert_eq!(settings.tools.outline_path, "hoodie-dev");
}

#[test]
fn merge_keeps_unmentioned_fields() {
    let base = ServerSettings::from_lsp_payload(Some(&json!({"zigPath": "/usr/bin/zig"})));
    let merged = base.merged_with_payload(&json!({"outlinePath": "/usr/bin/hoodie"}));
    assert_eq!(merged.tools.zig_path, "/usr/bin/zig");
    assert_eq!(merged.tools.outline_path, "/usr/bin/hoodie");
}

#[test]
fn blank_paths_normalize_back_to_defaults() {
    let payload = json!({"zigPath": "   ", "outlinePath": ""});
    let settings = ServerSettings::from_lsp_payload(Some(&payload));
    assert_eq!(settings.tools.zig_path, "zig");
    assert_eq!(settings.tools.outline_path, "hoodie");
}

#[test]
fn unknown_keys_are_ignored() {
    let payload = json!({"zig-analyzer": {"diagnostics": {"onType": true}, "zigPath": "zig-nightly"}});
    let settings = ServerSettings::from_lsp_payload(Some(&payload));
    assert_eq!(settings.tools.zig_path, "zig-nightly");
}
