//! Tree-walking executor

use serde_json::Value;

use crate::parser::ast::{Invocation, Node, Operand, Tree};
use crate::template::TemplateSet;

use super::{ExecError, MissingKey, MAX_EXEC_DEPTH};

/// Text printed for missing or null values under `missingkey=default`
const NO_VALUE: &str = "<no value>";

pub(super) struct Executor<'s> {
    set: &'s TemplateSet,
    missing_key: MissingKey,
    out: String,
    depth: usize,
}

impl<'s> Executor<'s> {
    pub(super) fn new(set: &'s TemplateSet, missing_key: MissingKey) -> Self {
        Self {
            set,
            missing_key,
            out: String::new(),
            depth: 0,
        }
    }

    pub(super) fn run_root(mut self, data: &Value) -> Result<String, ExecError> {
        let set = self.set;
        let root = set.root().clone();
        self.walk(set.root_name(), root.tree(), data)?;
        Ok(self.out)
    }

    fn walk(&mut self, template: &str, tree: &Tree, dot: &Value) -> Result<(), ExecError> {
        for spanned in &tree.nodes {
            match &spanned.node {
                Node::Text(text) => self.out.push_str(text),
                Node::Print(operand) => {
                    let value = self.eval(template, operand, dot)?;
                    self.print(value.as_ref());
                }
                Node::Template(invocation) => {
                    let name = invocation.name.node.as_str();
                    let member = self.set.get(name).cloned().ok_or_else(|| {
                        ExecError::UndefinedTemplate {
                            name: name.to_string(),
                            caller: template.to_string(),
                        }
                    })?;
                    let arg = self.argument(template, invocation, dot)?;
                    self.invoke(name, member.tree(), &arg)?;
                }
                Node::Block { invocation, body } => {
                    let name = invocation.name.node.as_str();
                    let arg = self.argument(template, invocation, dot)?;
                    match self.set.get(name).cloned() {
                        Some(member) => self.invoke(name, member.tree(), &arg)?,
                        None => self.invoke(name, body, &arg)?,
                    }
                }
            }
        }
        Ok(())
    }

    fn invoke(&mut self, name: &str, tree: &Tree, dot: &Value) -> Result<(), ExecError> {
        if self.depth >= MAX_EXEC_DEPTH {
            return Err(ExecError::RecursionLimit {
                name: name.to_string(),
                depth: MAX_EXEC_DEPTH,
            });
        }
        self.depth += 1;
        let result = self.walk(name, tree, dot);
        self.depth -= 1;
        result
    }

    /// Data passed to an invoked template; the current value when no operand is given
    fn argument(
        &self,
        template: &str,
        invocation: &Invocation,
        dot: &Value,
    ) -> Result<Value, ExecError> {
        match &invocation.operand {
            Some(operand) => Ok(self.eval(template, operand, dot)?.unwrap_or(Value::Null)),
            None => Ok(dot.clone()),
        }
    }

    /// Evaluate an operand; `None` means a field lookup found nothing
    fn eval(
        &self,
        template: &str,
        operand: &Operand,
        dot: &Value,
    ) -> Result<Option<Value>, ExecError> {
        let value = match operand {
            Operand::Dot => Some(dot.clone()),
            Operand::Field(path) => {
                let found = lookup_path(dot, path).cloned();
                if found.is_none() && self.missing_key == MissingKey::Error {
                    return Err(ExecError::MissingKey {
                        template: template.to_string(),
                        path: format!(".{}", path.join(".")),
                    });
                }
                found
            }
            Operand::String(s) => Some(Value::String(s.clone())),
            Operand::Number(n) => Some(number_value(*n)),
            Operand::Bool(b) => Some(Value::Bool(*b)),
        };
        Ok(value)
    }

    fn print(&mut self, value: Option<&Value>) {
        match value {
            Some(Value::String(s)) => self.out.push_str(s),
            Some(Value::Null) | None => {
                if self.missing_key != MissingKey::Zero {
                    self.out.push_str(NO_VALUE);
                }
            }
            Some(other) => self.out.push_str(&other.to_string()),
        }
    }
}

fn lookup_path<'v>(value: &'v Value, path: &[String]) -> Option<&'v Value> {
    path.iter()
        .try_fold(value, |current, segment| current.as_object()?.get(segment))
}

/// Whole numbers print without a fractional part
fn number_value(n: f64) -> Value {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        Value::from(n as i64)
    } else {
        Value::from(n)
    }
}
