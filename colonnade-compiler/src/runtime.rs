//! Program execution.
//!
//! The interpreter runs a [`Program`] against a data [`Value`] bound to the
//! root scope variable. Variables live in one flat environment for the whole
//! run: a loop variable stays bound after its loop ends, and a nested loop
//! rebinds it on every pass.

use std::collections::HashMap;

use colonnade_core::{HookRegistry, Value};

use crate::error::RuntimeError;
use crate::program::{Expr, Instr, Program};
use crate::traversal::{default_format, normalize_traversable};

/// Renders sub-templates named by `include` directives.
pub trait Includer {
    /// Append the rendering of template `path` with `data` as its root scope.
    fn include(&self, path: &str, data: &Value, out: &mut String) -> Result<(), RuntimeError>;
}

/// An [`Includer`] for standalone programs: every include fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoIncludes;

impl Includer for NoIncludes {
    fn include(&self, path: &str, _data: &Value, _out: &mut String) -> Result<(), RuntimeError> {
        Err(RuntimeError::Include {
            path: path.to_owned(),
            source: "includes are not available".into(),
        })
    }
}

/// Executes programs with a hook registry for formatter calls and an
/// [`Includer`] for sub-templates.
pub struct Interpreter<'a> {
    hooks: &'a HookRegistry,
    includer: &'a dyn Includer,
}

impl<'a> Interpreter<'a> {
    pub fn new(hooks: &'a HookRegistry, includer: &'a dyn Includer) -> Self {
        Self { hooks, includer }
    }

    /// Run `program` with `data` bound to `root_var`, returning the output.
    pub fn run(
        &self,
        program: &Program,
        root_var: &str,
        data: &Value,
    ) -> Result<String, RuntimeError> {
        let mut env = HashMap::new();
        env.insert(root_var.to_owned(), data.clone());
        let mut out = String::new();
        self.exec(program.body(), &mut env, &mut out)?;
        Ok(out)
    }

    fn exec(
        &self,
        body: &[Instr],
        env: &mut HashMap<String, Value>,
        out: &mut String,
    ) -> Result<(), RuntimeError> {
        for instr in body {
            match instr {
                Instr::Text(text) => out.push_str(text),
                Instr::Echo(expr) => out.push_str(&self.eval(expr, env)?.to_text()),
                Instr::Include { path, data } => {
                    let data = self.eval(data, env)?;
                    self.includer.include(path, &data, out)?;
                }
                Instr::If {
                    binding,
                    source,
                    then,
                    otherwise,
                } => {
                    let value = self.eval(source, env)?;
                    let taken = value.is_truthy();
                    env.insert(binding.clone(), value);
                    self.exec(if taken { then } else { otherwise }, env, out)?;
                }
                Instr::Foreach {
                    collection,
                    key,
                    value,
                    body,
                } => {
                    let entries = env
                        .get(collection)
                        .map(Value::entries)
                        .unwrap_or_default();
                    for (k, v) in entries {
                        env.insert(key.clone(), k);
                        env.insert(value.clone(), v);
                        self.exec(body, env, out)?;
                    }
                }
            }
        }
        Ok(())
    }

    fn eval(&self, expr: &Expr, env: &HashMap<String, Value>) -> Result<Value, RuntimeError> {
        match expr {
            Expr::Str(s) => Ok(Value::String(s.clone())),
            Expr::Var(var) => Ok(env.get(var).cloned().unwrap_or_default()),
            Expr::Index { var, key } => Ok(env
                .get(var)
                .and_then(|v| v.get(key))
                .cloned()
                .unwrap_or_default()),
            Expr::Coalesce(terms) => {
                let Some((last, rest)) = terms.split_last() else {
                    return Ok(Value::Null);
                };
                for term in rest {
                    let value = self.eval(term, env)?;
                    if !value.is_null() {
                        return Ok(value);
                    }
                }
                self.eval(last, env)
            }
            Expr::Call { name, arg } => {
                let arg = self.eval(arg, env)?;
                self.call(name, arg)
            }
        }
    }

    fn call(&self, name: &str, arg: Value) -> Result<Value, RuntimeError> {
        match name {
            "traversable" => Ok(normalize_traversable(&arg).unwrap_or_default()),
            "escape" => Ok(Value::String(default_format(&arg))),
            "missing" => Ok(Value::String(format!(":{}:", arg.to_text()))),
            _ => self
                .hooks
                .by_name(name)
                .and_then(|hook| hook.format_op())
                .map(|op| op.format(arg))
                .ok_or_else(|| RuntimeError::UnknownFunction {
                    name: name.to_owned(),
                }),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use colonnade_core::Hook;
    use serde_json::json;

    fn run(text: &str, data: serde_json::Value) -> Result<String, RuntimeError> {
        let hooks = HookRegistry::new();
        let program = Program::parse(text).expect("parse");
        Interpreter::new(&hooks, &NoIncludes).run(&program, "data", &Value::from(data))
    }

    #[test]
    fn missing_key_renders_placeholder() {
        let out =
            run(r#"<?tpl echo escape($data["x"] ?? missing("x")) ?>"#, json!({})).expect("run");
        assert_eq!(out, ":x:");
    }

    #[test]
    fn coalesce_takes_first_set_value() {
        let out = run(
            r#"<?tpl echo $v["a"] ?? $data["a"] ?? missing("a") ?>"#,
            json!({"a": "outer"}),
        )
        .expect("run");
        assert_eq!(out, "outer");
    }

    #[test]
    fn loop_over_list_binds_key_and_value() {
        let text = concat!(
            r#"<?tpl if $c = traversable($data["items"]) ?>"#,
            "<?tpl foreach $c as $k => $v ?>[<?tpl echo $k ?>:<?tpl echo $v ?>]<?tpl endforeach ?>",
            "<?tpl endif ?>"
        );
        let out = run(text, json!({"items": ["a", "b"]})).expect("run");
        assert_eq!(out, "[0:a][1:b]");
    }

    #[test]
    fn empty_list_takes_else_branch() {
        let text = concat!(
            r#"<?tpl if $c = traversable($data["items"]) ?>"#,
            "yes<?tpl else ?>no<?tpl endif ?>"
        );
        assert_eq!(run(text, json!({"items": []})).expect("run"), "no");
        assert_eq!(run(text, json!({})).expect("run"), "no");
        assert_eq!(run(text, json!({"items": [1]})).expect("run"), "yes");
    }

    #[test]
    fn unknown_function_is_an_error() {
        let err = run(r#"<?tpl echo shout($data["a"]) ?>"#, json!({"a": "x"})).unwrap_err();
        assert!(matches!(err, RuntimeError::UnknownFunction { ref name } if name == "shout"));
    }

    #[test]
    fn hook_formatter_is_called_by_name() {
        let mut hooks = HookRegistry::new();
        hooks.register(
            "upper",
            Hook::new().with_format(|v: Value| Value::from(v.to_text().to_uppercase())),
        );
        let program =
            Program::parse(r#"<?tpl echo upperhook(escape($data["a"])) ?>"#).expect("parse");
        let out = Interpreter::new(&hooks, &NoIncludes)
            .run(&program, "data", &Value::from(json!({"a": "a<b"})))
            .expect("run");
        assert_eq!(out, "A&LT;B");
    }

    #[test]
    fn include_without_host_fails() {
        let err = run(r#"<?tpl include "p.html" with $data ?>"#, json!({})).unwrap_err();
        assert!(matches!(err, RuntimeError::Include { ref path, .. } if path == "p.html"));
    }
}
