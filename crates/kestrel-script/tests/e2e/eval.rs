//! Out-of-band eval source

use super::harness::*;
use kestrel_loader::{Completion, LoaderError, Value};

#[test]
fn test_eval_expression() {
    let project = Project::new();

    let completion = project.eval("1 + 2;").unwrap();
    assert_eq!(completion, Completion::Value(Value::Number(3.0)));
}

#[test]
fn test_eval_imports_relative_to_cwd() {
    let project = Project::new().file("lib/answer.js", "export let answer = 42;");

    let completion = project
        .eval(r#"import { answer } from "./lib/answer"; answer;"#)
        .unwrap();
    assert_eq!(completion.into_value(), Some(Value::Number(42.0)));
}

#[test]
fn test_eval_without_expression_is_empty() {
    let project = Project::new();
    assert_eq!(project.eval("let x = 1;").unwrap(), Completion::Empty);
}

#[test]
fn test_eval_only_once() {
    let project = Project::new();

    project.eval("1;").unwrap();
    match project.eval("2;") {
        Err(E2EError::Loader(LoaderError::EvalAlreadyLoaded)) => {}
        other => panic!("Expected EvalAlreadyLoaded, got {:?}", other.map(|_| ())),
    }
}

#[test]
fn test_eval_syntax_error() {
    let project = Project::new();
    assert!(matches!(
        project.eval("let = ;"),
        Err(E2EError::Loader(LoaderError::Compile { .. }))
    ));
}
