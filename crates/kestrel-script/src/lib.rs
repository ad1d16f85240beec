//! Kestrel script
//!
//! A small module language and its compiler, used to drive the Kestrel
//! loader end to end.
//!
//! ```text
//! import { double } from "@rt/math";
//! import { base } from "./config";
//!
//! export let answer = double(base) + 2;
//! let label = "answer: " + answer;
//! export { label as description };
//!
//! answer;
//! ```
//!
//! Modules declare imports, `let` bindings (optionally exported), export
//! lists and expression statements. The value of the last expression
//! statement is the module's evaluation result. Exported bindings are live:
//! importers read the exporter's cell, not a copy.

pub mod ast;
pub mod compiler;
pub mod error;
pub mod interp;
pub mod lexer;
pub mod parser;
pub mod unit;

pub use compiler::ScriptCompiler;
pub use error::ScriptError;
pub use parser::parse;
pub use unit::{ScriptUnit, Status};
