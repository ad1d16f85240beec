//! Circular imports

use super::harness::*;
use kestrel_loader::Value;

#[test]
fn test_two_module_cycle() {
    let project = Project::new()
        .file(
            "a.js",
            r#"import { fromB } from "./b"; export let fromA = 1; fromB + fromA;"#,
        )
        .file(
            "b.js",
            r#"import { fromA } from "./a"; export let fromB = 10; fromB;"#,
        );

    expect_number(project.run("./a"), 11.0);
}

#[test]
fn test_cycle_member_reads_uninitialized_binding() {
    let project = Project::new()
        .file(
            "a.js",
            r#"import { early } from "./b"; export let fromA = 1;"#,
        )
        .file(
            "b.js",
            r#"import { fromA } from "./a"; export let early = fromA;"#,
        );

    let a = project.import("./a").unwrap();
    assert_eq!(a.get("fromA"), Some(Value::Number(1.0)));

    let b = project.import("./b").unwrap();
    assert_eq!(b.get("early"), Some(Value::Undefined));
}

#[test]
fn test_three_module_cycle_from_each_entry() {
    for entry in ["./a", "./b", "./c"] {
        let project = Project::new()
            .file("a.js", r#"import { b } from "./b"; export let a = 1;"#)
            .file("b.js", r#"import { c } from "./c"; export let b = 2;"#)
            .file("c.js", r#"import { a } from "./a"; export let c = 3;"#);

        let namespace = project.import(entry).unwrap();
        assert_eq!(namespace.len(), 1, "entry {}", entry);

        let stats = project.loader.cache_stats();
        assert_eq!(stats.entries, 3, "entry {}", entry);
    }
}

#[test]
fn test_self_import() {
    let project = Project::new().file(
        "self.js",
        r#"import { me as mine } from "./self"; export let me = 5; mine;"#,
    );

    expect_number(project.run("./self"), 5.0);
}

#[test]
fn test_cycle_members_share_one_component() {
    let project = Project::new()
        .file("a.js", r#"import { b } from "./b"; export let a = 1;"#)
        .file("b.js", r#"import { a } from "./a"; export let b = 2;"#);

    block_on(async {
        let a = project.loader.get_module_job("./a", None).await.unwrap();
        let b = project.loader.get_module_job("./b", None).await.unwrap();

        a.instantiate().await.unwrap();
        b.instantiate().await.unwrap();

        assert_eq!(a.component_root(), Some(a.id()));
        assert_eq!(b.component_root(), Some(a.id()));
    });
}
