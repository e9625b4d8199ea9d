//! End-to-end compile → load → run tests over in-memory templates.

use std::collections::HashMap;

use colonnade_compiler::{
    CompileError, Compiler, Includer, Interpreter, NoIncludes, Program, RuntimeError,
};
use colonnade_core::{FormatterChain, Hook, HookRegistry, ScopeChain, Value};
use rstest::rstest;
use serde_json::json;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn compile(hooks: &HookRegistry, source: &str) -> String {
    Compiler::new(hooks)
        .compile(source, &ScopeChain::root("data"), &FormatterChain::new())
        .expect("compile")
}

fn render_with(hooks: &HookRegistry, source: &str, data: serde_json::Value) -> String {
    let program = Program::parse(&compile(hooks, source)).expect("program");
    Interpreter::new(hooks, &NoIncludes)
        .run(&program, "data", &Value::from(data))
        .expect("run")
}

fn render(source: &str, data: serde_json::Value) -> String {
    render_with(&HookRegistry::with_builtins(), source, data)
}

/// Includes resolved from an in-memory map of template sources.
struct MemoryTemplates<'a> {
    hooks: &'a HookRegistry,
    sources: HashMap<&'static str, &'static str>,
}

impl Includer for MemoryTemplates<'_> {
    fn include(&self, path: &str, data: &Value, out: &mut String) -> Result<(), RuntimeError> {
        let source = self.sources.get(path).ok_or_else(|| RuntimeError::Include {
            path: path.to_owned(),
            source: "no such template".into(),
        })?;
        let program = Program::parse(&compile(self.hooks, source)).map_err(|e| {
            RuntimeError::Include {
                path: path.to_owned(),
                source: Box::new(e),
            }
        })?;
        out.push_str(&Interpreter::new(self.hooks, self).run(&program, "data", data)?);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// 1. Purity
// ---------------------------------------------------------------------------

#[test]
fn compile_is_deterministic() {
    let hooks = HookRegistry::with_builtins();
    let source = r#"<ul :items:><li :subitems: class="x">:name: :footer.html:</li></ul><p :else:>none</p>"#;
    assert_eq!(compile(&hooks, source), compile(&hooks, source));
}

#[test]
fn markup_without_bindings_round_trips() {
    let hooks = HookRegistry::new();
    let source = "<!DOCTYPE html>\n<title>x &amp; y</title>\n<p class=\"a\">hi<br>there</p>\n";
    assert_eq!(compile(&hooks, source), source);
}

// ---------------------------------------------------------------------------
// 2. Scope shadowing
// ---------------------------------------------------------------------------

#[rstest]
#[case(json!({"items": [{"name": "A", "subitems": [{}]}]}), "<ul><li>A</li></ul>")]
#[case(json!({"items": [{"name": "A", "subitems": [{"name": "B"}]}]}), "<ul><li>B</li></ul>")]
#[case(json!({"name": "R", "items": [{"subitems": [{}]}]}), "<ul><li>R</li></ul>")]
#[case(json!({"items": [{"subitems": [{}]}]}), "<ul><li>:name:</li></ul>")]
fn inner_placeholder_falls_back_outward(#[case] data: serde_json::Value, #[case] expected: &str) {
    let out = render("<ul :items:><li :subitems:>:name:</li></ul>", data);
    assert_eq!(out, expected);
}

#[rstest]
#[case(json!({"a": [{"n": "x"}, {"n": "y"}]}), "")]
#[case(json!({"a": [{"n": "x"}, {"n": "y"}], "b": [{}, {"n": "B"}]}), "<li>xyBB</li>")]
fn two_bindings_loop_outer_second(#[case] data: serde_json::Value, #[case] expected: &str) {
    assert_eq!(render("<li :a: :b:>:n:</li>", data), expected);
}

#[test]
fn loop_repeats_children_not_element() {
    let out = render(
        "<ul :items:><li>:name:</li></ul>",
        json!({"items": [{"name": "a"}, {"name": "b"}]}),
    );
    assert_eq!(out, "<ul><li>a</li><li>b</li></ul>");
}

// ---------------------------------------------------------------------------
// 3. Traversal normalization
// ---------------------------------------------------------------------------

#[test]
fn record_and_single_item_list_render_identically() {
    let source = "<div :item:><b>:name:</b></div>";
    let from_record = render(source, json!({"item": {"name": "A"}}));
    let from_list = render(source, json!({"item": [{"name": "A"}]}));
    assert_eq!(from_record, "<div><b>A</b></div>");
    assert_eq!(from_record, from_list);
}

#[rstest]
#[case(json!({}))]
#[case(json!({"items": null}))]
#[case(json!({"items": "text"}))]
#[case(json!({"items": []}))]
fn unusable_bindings_skip_the_block(#[case] data: serde_json::Value) {
    assert_eq!(render("a<ul :items:>x</ul>b", data), "ab");
}

// ---------------------------------------------------------------------------
// 4. Escaping and formatters
// ---------------------------------------------------------------------------

#[test]
fn default_formatter_escapes() {
    let out = render("<p>:v:</p>", json!({"v": "<b>&\""}));
    assert_eq!(out, "<p>&lt;b&gt;&amp;&quot;</p>");
}

#[test]
fn hook_formatter_wraps_escaping() {
    let mut hooks = HookRegistry::with_builtins();
    hooks.register(
        "upper",
        Hook::new().with_format(|v: Value| Value::from(v.to_text().to_uppercase())),
    );
    let out = render_with(&hooks, "<p :upper:>:v:</p><i>:v:</i>", json!({"v": "a<b"}));
    assert_eq!(out, "<p>A&LT;B</p><i>a&lt;b</i>");
}

#[test]
fn formatters_compose_in_registration_order() {
    let mut hooks = HookRegistry::new();
    hooks.register(
        "first",
        Hook::new().with_format(|v: Value| Value::from(format!("[{}]", v.to_text()))),
    );
    hooks.register(
        "second",
        Hook::new().with_format(|v: Value| Value::from(format!("({})", v.to_text()))),
    );
    let out = render_with(&hooks, "<p :first: :second:>:v:</p>", json!({"v": "x"}));
    assert_eq!(out, "<p>([x])</p>");
}

// ---------------------------------------------------------------------------
// 5. Else hook
// ---------------------------------------------------------------------------

#[rstest]
#[case(json!({"items": []}), "<p>none</p>")]
#[case(json!({}), "<p>none</p>")]
#[case(json!({"items": [{"name": "a"}]}), "<ul>a</ul>")]
fn else_renders_only_when_guard_fails(#[case] data: serde_json::Value, #[case] expected: &str) {
    let out = render("<ul :items:>:name:</ul><p :else:>none</p>", data);
    assert_eq!(out, expected);
}

#[test]
fn else_without_preceding_block_is_stripped() {
    let hooks = HookRegistry::with_builtins();
    assert_eq!(compile(&hooks, "<p :else:>none</p>"), "<p>none</p>");
}

#[test]
fn second_else_renders_unconditionally() {
    let out = render(
        "<ul :items:>x</ul><p :else:>none</p><p :else:>always</p>",
        json!({"items": [1]}),
    );
    assert_eq!(out, "<ul>x</ul><p>always</p>");
}

// ---------------------------------------------------------------------------
// 6. Includes
// ---------------------------------------------------------------------------

#[test]
fn include_placeholder_compiles_to_include_directive() {
    let hooks = HookRegistry::new();
    let program = compile(&hooks, "<div>:head.html:</div><div :rows:>:partials/row.html:</div>");
    assert!(program.contains(r#"<?tpl include "head.html" with $data ?>"#));
    assert!(program.contains(r#"<?tpl include "partials/row.html" with $data_rows_val ?>"#));
}

#[test]
fn include_renders_with_entry_scope() {
    let hooks = HookRegistry::with_builtins();
    let host = MemoryTemplates {
        hooks: &hooks,
        sources: HashMap::from([("head.html", "<h1>:title:</h1>")]),
    };
    let program = Program::parse(&compile(&hooks, "<main>:head.html:<p>:body:</p></main>"))
        .expect("program");
    let out = Interpreter::new(&hooks, &host)
        .run(
            &program,
            "data",
            &Value::from(json!({"title": "T", "body": "B"})),
        )
        .expect("run");
    assert_eq!(out, "<main><h1>T</h1><p>B</p></main>");
}

// ---------------------------------------------------------------------------
// 7. Source markup
// ---------------------------------------------------------------------------

#[test]
fn html_text_that_is_not_xml_compiles() {
    let hooks = HookRegistry::with_builtins();
    let program = compile(&hooks, "<p>Tom & Jerry: 1 < 2</p>");
    assert_eq!(program, "<p>Tom &amp; Jerry: 1 &lt; 2</p>");
}

#[test]
fn script_body_passes_through() {
    let out = render(
        "<script>if (a < b && c) { go('</p>'); }</script><p>:v:</p>",
        json!({"v": "ok"}),
    );
    assert_eq!(out, "<script>if (a < b && c) { go('</p>'); }</script><p>ok</p>");
}

#[rstest]
#[case("<!-- <?tpl endif ?> -->", 5)]
#[case(r#"<div data-x="<?tpl">x</div>"#, 13)]
#[case("<p><![CDATA[<?tpl echo 1 ?>]]></p>", 12)]
fn directive_opener_in_source_is_rejected(#[case] source: &str, #[case] at: usize) {
    let err = Compiler::new(&HookRegistry::new())
        .compile(source, &ScopeChain::root("data"), &FormatterChain::new())
        .unwrap_err();
    assert!(
        matches!(err, CompileError::Reserved { offset } if offset == at),
        "got: {err}"
    );
}

#[test]
fn escaped_opener_is_plain_text() {
    let hooks = HookRegistry::new();
    assert_eq!(compile(&hooks, "<p>&lt;?tpl</p>"), "<p>&lt;?tpl</p>");
}
