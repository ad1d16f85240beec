//! Failures at each stage of loading

use super::harness::*;
use kestrel_loader::LoaderError;

#[test]
fn test_missing_module() {
    let project = Project::new();
    let error = expect_loader_error(project.run("./nowhere"));
    assert!(error.is_resolution_error(), "{}", error);
}

#[test]
fn test_missing_dependency() {
    let project = Project::new().file("main.js", r#"import { x } from "./gone"; x;"#);

    let error = expect_loader_error(project.run("./main"));
    assert!(matches!(error, LoaderError::ModuleNotFound { .. }), "{}", error);
}

#[test]
fn test_syntax_error_in_dependency() {
    let project = Project::new()
        .file("broken.js", "export let = 1;")
        .file("main.js", r#"import { x } from "./broken"; x;"#);

    match expect_loader_error(project.run("./main")) {
        LoaderError::Compile { url, .. } => assert!(url.path().ends_with("/broken.js")),
        other => panic!("Expected compile error, got {}", other),
    }
}

#[test]
fn test_unknown_export() {
    let project = Project::new()
        .file("lib.js", "export let a = 1;")
        .file("main.js", r#"import { b } from "./lib"; b;"#);

    match expect_loader_error(project.run("./main")) {
        LoaderError::UnknownExport { url, name } => {
            assert_eq!(name, "b");
            assert!(url.path().ends_with("/lib.js"));
        }
        other => panic!("Expected unknown export, got {}", other),
    }
}

#[test]
fn test_runtime_error() {
    let project = Project::new().file("main.js", "let x = 1; x();");

    match expect_loader_error(project.run("./main")) {
        LoaderError::Evaluate { message, .. } => assert!(message.contains("not callable")),
        other => panic!("Expected evaluate error, got {}", other),
    }
}

#[test]
fn test_errors_are_permanent() {
    let project = Project::new().file("main.js", "missing;");

    let first = expect_loader_error(project.run("./main"));
    let second = expect_loader_error(project.run("./main"));
    assert_eq!(first.to_string(), second.to_string());
}

#[test]
fn test_duplicate_declaration() {
    let project = Project::new().file("main.js", "let a = 1; let a = 2; a;");
    assert!(matches!(
        expect_loader_error(project.run("./main")),
        LoaderError::Compile { .. }
    ));
}
