//! Control-flow markers synthesized during expansion.
//!
//! A directive renders as `<?tpl … ?>` in program text. Expression payloads
//! are already-rendered expression text (see the compiler's resolver).

use std::fmt;

/// Opening delimiter of a directive in program text.
pub const OPEN: &str = "<?tpl";
/// Closing delimiter of a directive in program text.
pub const CLOSE: &str = "?>";

/// A synthesized program instruction stored in the tree as a sibling node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Directive {
    /// `if $binding = traversable(source)`: the existence guard around a loop.
    If { binding: String, source: String },
    /// `foreach $collection as $key => $value`.
    Foreach {
        collection: String,
        key: String,
        value: String,
    },
    Else,
    EndForeach,
    EndIf,
    /// Emit the value of an expression.
    Echo { expr: String },
    /// Render another template with `data` as its root scope.
    Include { path: String, data: String },
}

impl Directive {
    /// `true` for the marker closing a conditional block.
    pub fn is_end_if(&self) -> bool {
        matches!(self, Directive::EndIf)
    }
}

impl fmt::Display for Directive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Directive::If { binding, source } => {
                write!(f, "{OPEN} if ${binding} = traversable({source}) {CLOSE}")
            }
            Directive::Foreach {
                collection,
                key,
                value,
            } => write!(
                f,
                "{OPEN} foreach ${collection} as ${key} => ${value} {CLOSE}"
            ),
            Directive::Else => write!(f, "{OPEN} else {CLOSE}"),
            Directive::EndForeach => write!(f, "{OPEN} endforeach {CLOSE}"),
            Directive::EndIf => write!(f, "{OPEN} endif {CLOSE}"),
            Directive::Echo { expr } => write!(f, "{OPEN} echo {expr} {CLOSE}"),
            Directive::Include { path, data } => {
                write!(f, "{OPEN} include {} with ${data} {CLOSE}", quote(path))
            }
        }
    }
}

/// Quote `s` as a program string literal.
pub fn quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        if c == '"' || c == '\\' {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('"');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loop_markers_render() {
        let open = Directive::Foreach {
            collection: "data_items".into(),
            key: "data_items_key".into(),
            value: "data_items_val".into(),
        };
        assert_eq!(
            open.to_string(),
            "<?tpl foreach $data_items as $data_items_key => $data_items_val ?>"
        );
        assert_eq!(Directive::EndForeach.to_string(), "<?tpl endforeach ?>");
    }

    #[test]
    fn include_quotes_path() {
        let d = Directive::Include {
            path: "partials/row.html".into(),
            data: "data".into(),
        };
        assert_eq!(
            d.to_string(),
            r#"<?tpl include "partials/row.html" with $data ?>"#
        );
    }

    #[test]
    fn quote_escapes() {
        assert_eq!(quote(r#"a"b\c"#), r#""a\"b\\c""#);
    }
}
