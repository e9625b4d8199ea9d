//! Value normalization and the default output formatter.

use colonnade_core::Value;

/// Make a bound value iterable.
///
/// Lists and maps are returned as they are. A record becomes a one-element
/// list holding its fields as a map, so binding a single object renders the
/// block once. Scalars and null are not traversable.
pub fn normalize_traversable(value: &Value) -> Option<Value> {
    match value {
        Value::List(_) | Value::Map(_) => Some(value.clone()),
        Value::Record(fields) => Some(Value::List(vec![Value::Map(fields.clone())])),
        _ => None,
    }
}

/// Convert `value` to text and escape it for HTML.
pub fn default_format(value: &Value) -> String {
    escape_html(&value.to_text())
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn record_becomes_single_item_list() {
        let rec = Value::record([("name", "A")]);
        assert_eq!(
            normalize_traversable(&rec),
            Some(Value::List(vec![Value::map([("name", "A")])]))
        );
    }

    #[test]
    fn collections_pass_through() {
        let list = Value::from(vec!["a"]);
        assert_eq!(normalize_traversable(&list), Some(list.clone()));
        let empty = Value::List(vec![]);
        assert_eq!(normalize_traversable(&empty), Some(empty.clone()));
    }

    #[rstest]
    #[case(Value::Null)]
    #[case(Value::from("text"))]
    #[case(Value::from(3i64))]
    #[case(Value::Bool(true))]
    fn scalars_are_not_traversable(#[case] value: Value) {
        assert_eq!(normalize_traversable(&value), None);
    }

    #[rstest]
    #[case("<b>&\"", "&lt;b&gt;&amp;&quot;")]
    #[case("it's", "it&apos;s")]
    #[case("plain", "plain")]
    fn escapes_markup(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(default_format(&Value::from(input)), expected);
    }

    #[test]
    fn null_formats_empty() {
        assert_eq!(default_format(&Value::Null), "");
    }
}
