use super::*;

#[test]
fn parse_declarations_full_shape() {
    let raw = r#"[
        {
            "label": "Point",
            "type": "struct",
            "start": 0,
            "end": 120,
            "children": [
                {"label": "norm", "type": "function", "receiverType": "Point", "start": 40, "end": 100}
            ]
        },
        {"label": "origin is zero", "type": "test", "start": 122, "end": 180}
    ]"#;

    let decls = parse_declarations(raw).unwrap();
    assert_eq!(decls.len(), 2);
    assert_eq!(decls[0].kind, crate::outline::DeclarationKind::Struct);
    assert_eq!(decls[0].children.len(), 1);
    assert_eq!(decls[0].children[0].receiver_type.as_deref(), Some("Point"));
    assert_eq!(decls[1].label, "origin is zero");
    assert_eq!(decls[1].kind, crate::outline::DeclarationKind::Test);
}

#[test]
fn parse_declarations_tolerates_unknown_kinds() {
    let raw = r#"[{"label": "x", "type": "comptime_block", "start": 0, "end": 10}]"#;
    let decls = parse_declarations(raw).unwrap();
    assert_eq!(decls[0].kind, crate::outline::DeclarationKind::Unknown);
}

#[test]
fn parse_declarations_rejects_garbage() {
    let error = parse_declarations("error: file.zig is not a zig file").unwrap_err();
    assert!(matches!(error, OutlineError::InvalidOutput { .. }));
}

#[tokio::test]
async fn missing_tool_reports_not_found_with_hint() {
    let error = run_outline("zig-analyzer-no-such-outline-tool", Path::new("/tmp/main.zig"))
        .await
        .unwrap_err();
    assert!(matches!(error, OutlineError::ToolNotFound(_)));
    assert!(error.to_string().contains("PATH"), "hint should be actionable: {error}");
}

#[tokio::test]
async fn tool_emitting_non_json_reports_invalid_output() {
    // `echo outline <file>` exits 0 but prints its own arguments.
    let error = run_outline("echo", Path::new("/tmp/main.zig")).await.unwrap_err();
    assert!(matches!(error, OutlineError::InvalidOutput { .. }));
}
