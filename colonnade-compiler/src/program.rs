//! Program loading.
//!
//! Compiled artifacts are markup interleaved with `<?tpl … ?>` directives.
//! [`Program::parse`] splits the text at the directive delimiters, parses each
//! directive body with `nom` and folds the flat statement stream into a block
//! tree, rejecting unbalanced `if`/`foreach` markers.
//!
//! ```text
//! statement := "if" $var "=" expr
//!            | "foreach" $var "as" $var "=>" $var
//!            | "else" | "endforeach" | "endif"
//!            | "echo" expr
//!            | "include" string "with" expr
//! expr      := term ("??" term)*
//! term      := string | $var | $var "[" string "]" | name "(" expr ")"
//! ```

use nom::{
    branch::alt,
    bytes::complete::{escaped, tag, take_while1},
    character::complete::{char, multispace0, multispace1, none_of, one_of},
    combinator::{all_consuming, map, opt, value},
    multi::separated_list1,
    sequence::{delimited, pair, preceded, tuple},
    IResult,
};

use colonnade_core::directive::{CLOSE, OPEN};

use crate::error::ProgramError;

// ---------------------------------------------------------------------------
// 1. Instruction tree
// ---------------------------------------------------------------------------

/// An expression inside a directive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
    Str(String),
    Var(String),
    /// `$var["key"]`
    Index { var: String, key: String },
    /// `name(arg)`
    Call { name: String, arg: Box<Expr> },
    /// `a ?? b ?? c`: the first operand that is set.
    Coalesce(Vec<Expr>),
}

/// One executable step of a program.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Instr {
    Text(String),
    Echo(Expr),
    Include {
        path: String,
        data: Expr,
    },
    /// Bind `binding` to `source`, then run `then` if it is truthy and
    /// `otherwise` if not.
    If {
        binding: String,
        source: Expr,
        then: Vec<Instr>,
        otherwise: Vec<Instr>,
    },
    Foreach {
        collection: String,
        key: String,
        value: String,
        body: Vec<Instr>,
    },
}

/// A loaded program.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Program {
    body: Vec<Instr>,
}

impl Program {
    /// Parse program text.
    pub fn parse(text: &str) -> Result<Self, ProgramError> {
        let mut blocks = BlockBuilder::new();
        let mut rest = text;
        let mut offset = 0;

        while let Some(start) = rest.find(OPEN) {
            if start > 0 {
                blocks.push(Instr::Text(rest[..start].to_owned()));
            }
            let at = offset + start;
            let after = &rest[start + OPEN.len()..];
            let end = after
                .find(CLOSE)
                .ok_or(ProgramError::Unterminated { offset: at })?;
            let body = &after[..end];

            let (_, stmt) = statement(body).map_err(|_| ProgramError::Syntax {
                offset: at,
                directive: body.trim().to_owned(),
            })?;
            blocks.apply(stmt, at, body.trim())?;

            let consumed = start + OPEN.len() + end + CLOSE.len();
            rest = &rest[consumed..];
            offset += consumed;
        }
        if !rest.is_empty() {
            blocks.push(Instr::Text(rest.to_owned()));
        }

        let body = blocks.finish()?;
        Ok(Self { body })
    }

    pub fn body(&self) -> &[Instr] {
        &self.body
    }
}

// ---------------------------------------------------------------------------
// 2. Block folding
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
enum Statement {
    If { binding: String, source: Expr },
    Foreach { collection: String, key: String, value: String },
    Else,
    EndForeach,
    EndIf,
    Echo(Expr),
    Include { path: String, data: Expr },
}

enum FrameKind {
    Root,
    If {
        binding: String,
        source: Expr,
        then: Option<Vec<Instr>>,
    },
    Foreach {
        collection: String,
        key: String,
        value: String,
    },
}

struct Frame {
    kind: FrameKind,
    body: Vec<Instr>,
    offset: usize,
}

struct BlockBuilder {
    stack: Vec<Frame>,
}

impl BlockBuilder {
    fn new() -> Self {
        Self {
            stack: vec![Frame {
                kind: FrameKind::Root,
                body: Vec::new(),
                offset: 0,
            }],
        }
    }

    fn push(&mut self, instr: Instr) {
        if let Some(frame) = self.stack.last_mut() {
            frame.body.push(instr);
        }
    }

    fn open(&mut self, kind: FrameKind, offset: usize) {
        self.stack.push(Frame {
            kind,
            body: Vec::new(),
            offset,
        });
    }

    fn apply(&mut self, stmt: Statement, offset: usize, text: &str) -> Result<(), ProgramError> {
        let unbalanced = || ProgramError::Unbalanced {
            offset,
            directive: text.to_owned(),
        };
        match stmt {
            Statement::Echo(expr) => self.push(Instr::Echo(expr)),
            Statement::Include { path, data } => self.push(Instr::Include { path, data }),
            Statement::If { binding, source } => self.open(
                FrameKind::If {
                    binding,
                    source,
                    then: None,
                },
                offset,
            ),
            Statement::Foreach {
                collection,
                key,
                value,
            } => self.open(
                FrameKind::Foreach {
                    collection,
                    key,
                    value,
                },
                offset,
            ),
            Statement::Else => {
                let frame = self.stack.last_mut().ok_or_else(unbalanced)?;
                match &mut frame.kind {
                    FrameKind::If { then, .. } if then.is_none() => {
                        *then = Some(std::mem::take(&mut frame.body));
                    }
                    _ => return Err(unbalanced()),
                }
            }
            Statement::EndIf => {
                if !matches!(self.top_kind(), Some(FrameKind::If { .. })) {
                    return Err(unbalanced());
                }
                let frame = self.stack.pop().ok_or_else(unbalanced)?;
                if let FrameKind::If {
                    binding,
                    source,
                    then,
                } = frame.kind
                {
                    let (then, otherwise) = match then {
                        Some(then) => (then, frame.body),
                        None => (frame.body, Vec::new()),
                    };
                    self.push(Instr::If {
                        binding,
                        source,
                        then,
                        otherwise,
                    });
                }
            }
            Statement::EndForeach => {
                if !matches!(self.top_kind(), Some(FrameKind::Foreach { .. })) {
                    return Err(unbalanced());
                }
                let frame = self.stack.pop().ok_or_else(unbalanced)?;
                if let FrameKind::Foreach {
                    collection,
                    key,
                    value,
                } = frame.kind
                {
                    self.push(Instr::Foreach {
                        collection,
                        key,
                        value,
                        body: frame.body,
                    });
                }
            }
        }
        Ok(())
    }

    fn top_kind(&self) -> Option<&FrameKind> {
        self.stack.last().map(|frame| &frame.kind)
    }

    fn finish(mut self) -> Result<Vec<Instr>, ProgramError> {
        let Some(frame) = self.stack.pop() else {
            return Ok(Vec::new());
        };
        match frame.kind {
            FrameKind::Root => Ok(frame.body),
            FrameKind::If { .. } => Err(ProgramError::Unclosed {
                offset: frame.offset,
                construct: "if",
            }),
            FrameKind::Foreach { .. } => Err(ProgramError::Unclosed {
                offset: frame.offset,
                construct: "foreach",
            }),
        }
    }
}

// ---------------------------------------------------------------------------
// 3. Directive grammar
// ---------------------------------------------------------------------------

fn statement(input: &str) -> IResult<&str, Statement> {
    all_consuming(delimited(
        multispace0,
        alt((
            if_statement,
            foreach_statement,
            value(Statement::EndForeach, tag("endforeach")),
            value(Statement::EndIf, tag("endif")),
            value(Statement::Else, tag("else")),
            map(preceded(pair(tag("echo"), multispace1), expr), Statement::Echo),
            include_statement,
        )),
        multispace0,
    ))(input)
}

fn if_statement(input: &str) -> IResult<&str, Statement> {
    map(
        tuple((
            tag("if"),
            multispace1,
            variable,
            delimited(multispace0, char('='), multispace0),
            expr,
        )),
        |(_, _, binding, _, source)| Statement::If {
            binding: binding.to_owned(),
            source,
        },
    )(input)
}

fn foreach_statement(input: &str) -> IResult<&str, Statement> {
    map(
        tuple((
            tag("foreach"),
            multispace1,
            variable,
            delimited(multispace1, tag("as"), multispace1),
            variable,
            delimited(multispace0, tag("=>"), multispace0),
            variable,
        )),
        |(_, _, collection, _, key, _, value)| Statement::Foreach {
            collection: collection.to_owned(),
            key: key.to_owned(),
            value: value.to_owned(),
        },
    )(input)
}

fn include_statement(input: &str) -> IResult<&str, Statement> {
    map(
        tuple((
            tag("include"),
            multispace1,
            string_literal,
            delimited(multispace1, tag("with"), multispace1),
            expr,
        )),
        |(_, _, path, _, data)| Statement::Include { path, data },
    )(input)
}

fn expr(input: &str) -> IResult<&str, Expr> {
    map(
        separated_list1(delimited(multispace0, tag("??"), multispace0), term),
        |mut terms| {
            if terms.len() == 1 {
                terms.remove(0)
            } else {
                Expr::Coalesce(terms)
            }
        },
    )(input)
}

fn term(input: &str) -> IResult<&str, Expr> {
    alt((map(string_literal, Expr::Str), lookup, call))(input)
}

fn lookup(input: &str) -> IResult<&str, Expr> {
    map(
        pair(
            variable,
            opt(delimited(
                pair(char('['), multispace0),
                string_literal,
                pair(multispace0, char(']')),
            )),
        ),
        |(var, key)| match key {
            Some(key) => Expr::Index {
                var: var.to_owned(),
                key,
            },
            None => Expr::Var(var.to_owned()),
        },
    )(input)
}

fn call(input: &str) -> IResult<&str, Expr> {
    map(
        pair(
            name,
            delimited(
                pair(char('('), multispace0),
                expr,
                pair(multispace0, char(')')),
            ),
        ),
        |(name, arg)| Expr::Call {
            name: name.to_owned(),
            arg: Box::new(arg),
        },
    )(input)
}

/// `$name`, returning the bare name.
fn variable(input: &str) -> IResult<&str, &str> {
    preceded(char('$'), name)(input)
}

fn name(input: &str) -> IResult<&str, &str> {
    take_while1(|c: char| c.is_ascii_alphanumeric() || c == '_')(input)
}

/// `"…"` with `\"` and `\\` escapes, returning the unescaped content.
fn string_literal(input: &str) -> IResult<&str, String> {
    map(
        delimited(
            char('"'),
            opt(escaped(none_of("\\\""), '\\', one_of("\\\""))),
            char('"'),
        ),
        |raw: Option<&str>| unescape(raw.unwrap_or_default()),
    )(input)
}

fn unescape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(next) = chars.next() {
                out.push(next);
            }
        } else {
            out.push(c);
        }
    }
    out
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
