//! Static imports between files

use super::harness::*;
use kestrel_loader::Value;

#[test]
fn test_single_module() {
    let project = Project::new().file("main.js", "let x = 40; x + 2;");
    expect_number(project.run("./main"), 42.0);
}

#[test]
fn test_import_from_sibling() {
    let project = Project::new()
        .file("config.js", "export let base = 20;")
        .file("main.js", r#"import { base } from "./config"; base * 2 + 2;"#);

    expect_number(project.run("./main"), 42.0);
}

#[test]
fn test_import_with_alias_and_export_list() {
    let project = Project::new()
        .file("lib.js", "let hidden = 6; export { hidden as six };")
        .file("main.js", r#"import { six as n } from "./lib"; n * 7;"#);

    expect_number(project.run("./main"), 42.0);
}

#[test]
fn test_nested_directories() {
    let project = Project::new()
        .file("src/util/num.js", "export let one = 1;")
        .file(
            "src/main.js",
            r#"import { one } from "./util/num.js"; one + one;"#,
        );

    expect_number(project.run("./src/main"), 2.0);
}

#[test]
fn test_parent_directory_import() {
    let project = Project::new()
        .file("shared.js", r#"export let name = "shared";"#)
        .file("app/main.js", r#"import { name } from "../shared"; name;"#);

    expect_string(project.run("./app/main"), "shared");
}

#[test]
fn test_shared_dependency_evaluates_once() {
    let project = Project::new()
        .file("counter.js", "export let hits = 0; hits = hits + 1;")
        .file("left.js", r#"import { hits } from "./counter"; export let l = hits;"#)
        .file("right.js", r#"import { hits } from "./counter"; export let r = hits;"#)
        .file(
            "main.js",
            r#"
            import { l } from "./left";
            import { r } from "./right";
            import { hits } from "./counter";
            l + r + hits;
            "#,
        );

    expect_number(project.run("./main"), 3.0);
}

#[test]
fn test_namespace_exposes_exports_only() {
    let project = Project::new().file(
        "lib.js",
        "let private = 1; export let public = private + 1;",
    );

    let namespace = project.import("./lib").unwrap();
    assert_eq!(namespace.get("public"), Some(Value::Number(2.0)));
    assert!(!namespace.contains("private"));
}

#[test]
fn test_data_url_module() {
    let project = Project::new();
    expect_number(project.run("data:,21%20*%202;"), 42.0);
}

#[test]
fn test_module_without_expression_has_no_value() {
    let project = Project::new().file("quiet.js", "let x = 1;");
    assert!(matches!(project.run("./quiet"), Err(E2EError::NoValue)));
}
