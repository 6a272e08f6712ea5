use super::*;

#[test]
fn test_args_for_a_whole_file() {
    let config = TestConfig::file("/src/main.zig");
    assert_eq!(test_args(&config), vec!["test".to_string(), "/src/main.zig".to_string()]);
}

#[test]
fn test_args_appends_filter_names_last() {
    let mut config = TestConfig::file("/src/main.zig");
    config.functions = vec!["test \"addition\"".to_string(), "test \"overflow\"".to_string()];
    assert_eq!(test_args(&config), vec![
        "test".to_string(),
        "/src/main.zig".to_string(),
        "--test-filter".to_string(),
        "test \"addition\"".to_string(),
        "test \"overflow\"".to_string(),
    ]);
}

#[test]
fn detect_project_root_walks_up_to_the_build_file() {
    let temp_dir = std::env::temp_dir().join(format!(
        "zig-analyzer-root-test-{}",
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .expect("clock drift")
            .as_nanos()
    ));
    let nested = temp_dir.join("src/feature");
    std::fs::create_dir_all(&nested).expect("create nested dirs");
    std::fs::write(temp_dir.join("build.zig"), "").expect("create marker");
    let file = nested.join("main.zig");
    std::fs::write(&file, "test \"t\" {}").expect("create source file");

    assert_eq!(detect_project_root(&file), Some(temp_dir.clone()));

    std::fs::remove_dir_all(&temp_dir).ok();
}

#[test]
fn detect_project_root_none_without_marker() {
    let temp_dir = std::env::temp_dir().join(format!(
        "zig-analyzer-no-root-test-{}",
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .expect("clock drift")
            .as_nanos()
    ));
    std::fs::create_dir_all(&temp_dir).expect("create dir");
    let file = temp_dir.join("lone.zig");
    std::fs::write(&file, "").expect("create source file");

    assert_eq!(detect_project_root(&file), None);

    std::fs::remove_dir_all(&temp_dir).ok();
}
