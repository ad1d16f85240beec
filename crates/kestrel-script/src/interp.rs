//! Tree-walking evaluator for module bodies

use std::collections::HashMap;

use kestrel_loader::{Binding, Value};

use crate::ast::{BinaryOp, Expression, Module, Statement};
use crate::error::ScriptError;

/// Bindings visible to a module body
pub struct Environment<'a> {
    /// `let` declarations, exported or not
    pub locals: &'a HashMap<String, Binding>,
    /// Imported bindings, shared with the exporting modules
    pub imports: &'a HashMap<String, Binding>,
}

impl Environment<'_> {
    fn lookup(&self, name: &str) -> Result<Value, ScriptError> {
        self.locals
            .get(name)
            .or_else(|| self.imports.get(name))
            .map(Binding::get)
            .ok_or_else(|| ScriptError::Runtime(format!("'{}' is not defined", name)))
    }

    fn assign(&self, name: &str, value: Value) -> Result<(), ScriptError> {
        if let Some(binding) = self.locals.get(name) {
            binding.set(value);
            return Ok(());
        }
        if self.imports.contains_key(name) {
            return Err(ScriptError::Runtime(format!(
                "cannot assign to imported binding '{}'",
                name
            )));
        }
        Err(ScriptError::Runtime(format!("'{}' is not defined", name)))
    }
}

/// Run a module body. Returns the value of the last expression statement.
pub fn run(module: &Module, env: &Environment<'_>) -> Result<Option<Value>, ScriptError> {
    let mut completion = None;

    for statement in &module.statements {
        match statement {
            Statement::Import(_) | Statement::ExportList(_) => {}
            Statement::Let { name, init, .. } => {
                let value = eval(init, env)?;
                env.assign(name, value)?;
            }
            Statement::Assign { name, value, .. } => {
                let value = eval(value, env)?;
                env.assign(name, value)?;
            }
            Statement::Expression(expr) => {
                completion = Some(eval(expr, env)?);
            }
        }
    }

    Ok(completion)
}

fn eval(expr: &Expression, env: &Environment<'_>) -> Result<Value, ScriptError> {
    match expr {
        Expression::Number(n) => Ok(Value::Number(*n)),
        Expression::String(s) => Ok(Value::string(s)),
        Expression::Bool(b) => Ok(Value::Bool(*b)),
        Expression::Null => Ok(Value::Null),
        Expression::Identifier { name, .. } => env.lookup(name),
        Expression::Negate(operand) => match eval(operand, env)? {
            Value::Number(n) => Ok(Value::Number(-n)),
            other => Err(ScriptError::Runtime(format!(
                "cannot negate a {}",
                other.type_name()
            ))),
        },
        Expression::Binary { op, left, right } => {
            let left = eval(left, env)?;
            let right = eval(right, env)?;
            binary(*op, left, right)
        }
        Expression::Call { callee, args, span } => {
            let target = eval(callee, env)?;
            let function = target.as_function().ok_or_else(|| {
                ScriptError::Runtime(format!(
                    "{}:{}: a {} is not callable",
                    span.line,
                    span.column,
                    target.type_name()
                ))
            })?;

            let args = args
                .iter()
                .map(|arg| eval(arg, env))
                .collect::<Result<Vec<_>, _>>()?;

            function
                .call(&args)
                .map_err(|e| ScriptError::Runtime(format!("{}: {}", function.name(), e)))
        }
    }
}

fn binary(op: BinaryOp, left: Value, right: Value) -> Result<Value, ScriptError> {
    match (op, &left, &right) {
        (BinaryOp::Add, Value::Number(a), Value::Number(b)) => Ok(Value::Number(a + b)),
        (BinaryOp::Add, Value::String(_), _) | (BinaryOp::Add, _, Value::String(_)) => {
            Ok(Value::string(&format!("{}{}", left, right)))
        }
        (BinaryOp::Subtract, Value::Number(a), Value::Number(b)) => Ok(Value::Number(a - b)),
        (BinaryOp::Multiply, Value::Number(a), Value::Number(b)) => Ok(Value::Number(a * b)),
        (BinaryOp::Divide, Value::Number(a), Value::Number(b)) => Ok(Value::Number(a / b)),
        _ => Err(ScriptError::Runtime(format!(
            "unsupported operands for {:?}: {} and {}",
            op,
            left.type_name(),
            right.type_name()
        ))),
    }
}
