//! Imported bindings observe the exporter's current value

use super::harness::*;

#[test]
fn test_importer_sees_final_value() {
    let project = Project::new()
        .file("counter.js", "export let count = 1; count = count + 1;")
        .file("main.js", r#"import { count } from "./counter"; count;"#);

    expect_number(project.run("./main"), 2.0);
}

#[test]
fn test_namespace_binding_is_shared_with_importer() {
    let project = Project::new()
        .file("state.js", "export let level = 3;")
        .file("main.js", r#"import { level } from "./state"; level;"#);

    expect_number(project.run("./main"), 3.0);

    let namespace = project.import("./state").unwrap();
    let binding = namespace.binding("level").unwrap();

    // The exporter's cell is the one every namespace hands out
    let again = project.import("./state").unwrap();
    assert!(again.binding("level").unwrap().ptr_eq(binding));
}

#[test]
fn test_exporter_assignments_visible_after_cycle() {
    let project = Project::new()
        .file(
            "a.js",
            r#"
            import { snapshot } from "./b";
            export let value = 1;
            value = 2;
            snapshot;
            "#,
        )
        .file(
            "b.js",
            r#"
            import { value } from "./a";
            export let snapshot = value;
            "#,
        );

    let result = project.run("./a").unwrap();
    assert_eq!(result, kestrel_loader::Value::Undefined);

    let a = project.import("./a").unwrap();
    assert_eq!(a.get("value"), Some(kestrel_loader::Value::Number(2.0)));
}

#[test]
fn test_assigning_an_import_fails() {
    let project = Project::new()
        .file("lib.js", "export let x = 1;")
        .file("main.js", r#"import { x } from "./lib"; x = 2;"#);

    let error = expect_loader_error(project.run("./main"));
    assert!(error.to_string().contains("imported binding"), "{}", error);
}
