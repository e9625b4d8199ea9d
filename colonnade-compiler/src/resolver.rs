//! Fallback lookups over nested scopes.

use colonnade_core::directive::quote;
use colonnade_core::ScopeChain;

/// Build the expression that looks `key` up from the innermost scope out.
///
/// ```text
/// $data_items_val["name"] ?? $data["name"] ?? missing("name")
/// ```
///
/// `missing("name")` evaluates to `:name:`, keeping unresolved bindings
/// visible in the output without ever writing that placeholder into program
/// text.
pub fn resolve(scope: &ScopeChain, key: &str) -> String {
    let key = quote(key);
    let mut expr = String::new();
    for var in scope.vars().iter().rev() {
        expr.push_str(&format!("${var}[{key}] ?? "));
    }
    expr.push_str(&format!("missing({key})"));
    expr
}
