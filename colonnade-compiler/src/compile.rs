//! Source-to-program compilation.

use colonnade_core::directive::OPEN;
use colonnade_core::{markup, FormatterChain, HookRegistry, ScopeChain};

use crate::emitter::emit;
use crate::error::CompileError;
use crate::expander::MacroExpander;

/// Compiles template source into program text.
#[derive(Debug, Clone, Copy)]
pub struct Compiler<'a> {
    hooks: &'a HookRegistry,
}

impl<'a> Compiler<'a> {
    pub fn new(hooks: &'a HookRegistry) -> Self {
        Self { hooks }
    }

    /// Parse `source`, expand it from the document root and serialize the
    /// result.
    ///
    /// Compilation is pure: the same source, scope and formatters always give
    /// the same program text.
    ///
    /// Source may not contain the directive opener anywhere, including
    /// comments, CDATA sections and attribute values; write `&lt;?tpl`
    /// instead.
    pub fn compile(
        &self,
        source: &str,
        scope: &ScopeChain,
        formatters: &FormatterChain,
    ) -> Result<String, CompileError> {
        if let Some(offset) = source.find(OPEN) {
            return Err(CompileError::Reserved { offset });
        }
        let mut doc = markup::parse(source)?;
        let root = doc.root();
        MacroExpander::new(self.hooks).expand(&mut doc, root, scope, formatters);
        let program = emit(&doc, root);
        tracing::debug!(
            source_bytes = source.len(),
            program_bytes = program.len(),
            "compiled template"
        );
        Ok(program)
    }
}
