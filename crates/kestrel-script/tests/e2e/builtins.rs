//! Builtin libraries imported from script

use super::harness::*;
use kestrel_loader::{LoaderError, Value};

#[test]
fn test_call_builtin_function() {
    let project = Project::new().file(
        "main.js",
        r#"import { double } from "@rt/math"; double(21);"#,
    );

    expect_number(project.run("./main"), 42.0);
}

#[test]
fn test_builtin_values_and_functions_together() {
    let project = Project::new().file(
        "main.js",
        r#"
        import { double, pi } from "@rt/math";
        import { upper } from "@rt/text";
        upper("pi is ") + double(pi);
        "#,
    );

    expect_string(project.run("./main"), "PI IS 7");
}

#[test]
fn test_import_builtin_directly() {
    let project = Project::new();

    let namespace = project.import("@rt/math").unwrap();
    assert_eq!(namespace.get("pi"), Some(Value::Number(3.5)));
    assert!(namespace.get("double").unwrap().as_function().is_some());
}

#[test]
fn test_unknown_builtin_export() {
    let project = Project::new().file(
        "main.js",
        r#"import { triple } from "@rt/math"; triple(1);"#,
    );

    match expect_loader_error(project.run("./main")) {
        LoaderError::UnknownExport { name, .. } => assert_eq!(name, "triple"),
        other => panic!("Expected unknown export, got {}", other),
    }
}

#[test]
fn test_unknown_builtin_library() {
    let project = Project::new().file(
        "main.js",
        r#"import { x } from "@rt/nope"; x;"#,
    );

    let error = expect_loader_error(project.run("./main"));
    assert!(matches!(error, LoaderError::UnknownBuiltin(id) if id == "nope"));
}

#[test]
fn test_builtin_error_surfaces_as_evaluate_error() {
    let project = Project::new().file(
        "main.js",
        r#"import { double } from "@rt/math"; double("x");"#,
    );

    match expect_loader_error(project.run("./main")) {
        LoaderError::Evaluate { message, .. } => {
            assert!(message.contains("double: expected one number"), "{}", message)
        }
        other => panic!("Expected evaluate error, got {}", other),
    }
}
