//! A toy front-end for integration tests.
//!
//! Grammar (whitespace-insensitive):
//!
//! ```text
//! expr := sum (('<' | '>' | '=') sum)?
//! sum  := term (('+' | '-') term)*
//! term := atom (('*' | '/') atom)*
//! atom := int | float | ident | '(' expr ')' | '-' atom
//! ```
//!
//! Identifiers are looked up through the compiler context and left as free
//! parameters. Text containing `#` makes the service itself fail.

#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::Mutex;
use quill_core::api::{Diagnostic, Engine, EngineOptions};
use quill_core::cache::EngineCaches;
use quill_core::frontend::{
    CompileOutput, CompilerContext, CompilerFactory, ExpressionCompiler, FrontEndError,
};
use quill_core::tree::{BinaryOp, Expr, Param, UnaryOp};
use quill_core::values::Value;
use quill_types::{LibraryId, LibrarySet, Ty, TypeManager};

#[derive(Default)]
pub struct Counters {
    pub created: AtomicUsize,
    pub compiled: AtomicUsize,
    pub disposed: AtomicUsize,
    /// Library sets compilers were created for, in order.
    pub libraries: Mutex<Vec<LibrarySet>>,
}

impl Counters {
    pub fn created(&self) -> usize {
        self.created.load(Ordering::SeqCst)
    }

    pub fn compiled(&self) -> usize {
        self.compiled.load(Ordering::SeqCst)
    }

    pub fn disposed(&self) -> usize {
        self.disposed.load(Ordering::SeqCst)
    }
}

pub struct ToyFactory {
    types: Arc<TypeManager>,
    counters: Arc<Counters>,
}

impl CompilerFactory for ToyFactory {
    fn create(&self, libraries: &LibrarySet) -> Result<Box<dyn ExpressionCompiler>, FrontEndError> {
        if libraries.contains(&LibraryId::new("missing")) {
            return Err(FrontEndError::new("library `missing` cannot be loaded"));
        }
        self.counters.created.fetch_add(1, Ordering::SeqCst);
        self.counters.libraries.lock().push(libraries.clone());
        Ok(Box::new(Toy {
            types: Arc::clone(&self.types),
            counters: Arc::clone(&self.counters),
        }))
    }
}

struct Toy {
    types: Arc<TypeManager>,
    counters: Arc<Counters>,
}

impl ExpressionCompiler for Toy {
    fn compile_expression(
        &mut self,
        text: &str,
        context: &CompilerContext<'_>,
        expected: Option<&Ty>,
    ) -> Result<CompileOutput, FrontEndError> {
        self.counters.compiled.fetch_add(1, Ordering::SeqCst);
        if text.contains('#') {
            return Err(FrontEndError::new("front-end crashed"));
        }

        let mut parser = Parser {
            types: &self.types,
            context,
            text,
            pos: 0,
            diagnostics: Vec::new(),
        };
        let mut tree = parser.expr();
        parser.skip_ws();
        if tree.is_some() && parser.pos < text.len() {
            let at = parser.pos;
            parser.error("unexpected trailing input", at..text.len());
            tree = None;
        }

        // Widen int results when a float is expected.
        let float = self.types.float();
        let tree = tree.map(|t| match expected {
            Some(ty) if *ty == float && *t.ty() == self.types.int() => {
                Expr::unary(float.clone(), UnaryOp::Convert, t)
            }
            _ => t,
        });

        Ok(CompileOutput {
            tree,
            diagnostics: parser.diagnostics,
        })
    }

    fn dispose(&mut self) -> Result<(), FrontEndError> {
        self.counters.disposed.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

struct Parser<'a, 'c> {
    types: &'a TypeManager,
    context: &'a CompilerContext<'c>,
    text: &'a str,
    pos: usize,
    diagnostics: Vec<Diagnostic>,
}

impl Parser<'_, '_> {
    fn skip_ws(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.pos += 1;
        }
    }

    fn peek(&self) -> Option<char> {
        self.text[self.pos..].chars().next()
    }

    fn error(&mut self, message: &str, span: std::ops::Range<usize>) {
        self.diagnostics
            .push(Diagnostic::error(message).with_span(span).with_code("Q0001"));
    }

    fn expr(&mut self) -> Option<Expr> {
        let start = self.pos;
        let left = self.sum()?;
        self.skip_ws();
        let op = match self.peek() {
            Some('<') => BinaryOp::LessThan,
            Some('>') => BinaryOp::GreaterThan,
            Some('=') => BinaryOp::Equal,
            _ => return Some(left),
        };
        self.pos += 1;
        let right = self.sum()?;
        self.numeric(op, &left, &right, start)?;
        Some(Expr::binary(self.types.bool(), op, left, right))
    }

    fn sum(&mut self) -> Option<Expr> {
        let start = self.pos;
        let mut left = self.term()?;
        loop {
            self.skip_ws();
            let op = match self.peek() {
                Some('+') => BinaryOp::Add,
                Some('-') => BinaryOp::Subtract,
                _ => return Some(left),
            };
            self.pos += 1;
            let right = self.term()?;
            let ty = self.numeric(op, &left, &right, start)?;
            left = Expr::binary(ty, op, left, right);
        }
    }

    fn term(&mut self) -> Option<Expr> {
        let start = self.pos;
        let mut left = self.atom()?;
        loop {
            self.skip_ws();
            let op = match self.peek() {
                Some('*') => BinaryOp::Multiply,
                Some('/') => BinaryOp::Divide,
                _ => return Some(left),
            };
            self.pos += 1;
            let right = self.atom()?;
            let ty = self.numeric(op, &left, &right, start)?;
            left = Expr::binary(ty, op, left, right);
        }
    }

    fn atom(&mut self) -> Option<Expr> {
        self.skip_ws();
        let start = self.pos;
        match self.peek() {
            Some(c) if c.is_ascii_digit() => {
                let text = self.text;
                let len = text[start..]
                    .find(|c: char| !(c.is_ascii_digit() || c == '.'))
                    .unwrap_or(text.len() - start);
                self.pos += len;
                let literal = &text[start..self.pos];
                let value = if literal.contains('.') {
                    literal.parse().ok().map(|x| (self.types.float(), Value::Float(x)))
                } else {
                    literal.parse().ok().map(|n| (self.types.int(), Value::Int(n)))
                };
                match value {
                    Some((ty, value)) => Some(Expr::constant(ty, value)),
                    None => {
                        self.error(&format!("invalid number `{}`", literal), start..self.pos);
                        None
                    }
                }
            }
            Some(c) if c.is_alphabetic() || c == '_' => {
                let text = self.text;
                let len = text[start..]
                    .find(|c: char| !(c.is_alphanumeric() || c == '_'))
                    .unwrap_or(text.len() - start);
                self.pos += len;
                let name = &text[start..self.pos];
                match self.context.find_variable(name) {
                    Some(ty) => Some(Expr::param(&Param::new(name, ty))),
                    None => {
                        self.error(&format!("`{}` is not declared", name), start..self.pos);
                        None
                    }
                }
            }
            Some('(') => {
                self.pos += 1;
                let inner = self.expr()?;
                self.skip_ws();
                if self.peek() != Some(')') {
                    let at = self.pos;
                    self.error("expected `)`", at..at);
                    return None;
                }
                self.pos += 1;
                Some(inner)
            }
            Some('-') => {
                self.pos += 1;
                let operand = self.atom()?;
                Some(Expr::unary(operand.ty().clone(), UnaryOp::Negate, operand))
            }
            Some(c) => {
                self.error(&format!("unexpected `{}`", c), start..start + c.len_utf8());
                None
            }
            None => {
                self.error("unexpected end of input", start..start);
                None
            }
        }
    }

    /// Result type of an arithmetic operator, or a diagnostic.
    fn numeric(&mut self, op: BinaryOp, left: &Expr, right: &Expr, start: usize) -> Option<Ty> {
        let (int, float) = (self.types.int(), self.types.float());
        let is_number = |ty: &Ty| *ty == int || *ty == float;
        if !is_number(left.ty()) || !is_number(right.ty()) {
            let end = self.pos;
            self.error(
                &format!(
                    "operator `{}` needs numbers, found {} and {}",
                    op.symbol(),
                    left.ty(),
                    right.ty()
                ),
                start..end,
            );
            return None;
        }
        if *left.ty() == float || *right.ty() == float {
            Some(float)
        } else {
            Some(int)
        }
    }
}

pub fn libs(names: &[&str]) -> LibrarySet {
    names.iter().map(LibraryId::new).collect()
}

/// An engine with private caches over the toy front-end.
pub fn engine(types: &Arc<TypeManager>, options: EngineOptions) -> (Engine, Arc<Counters>) {
    let counters = Arc::new(Counters::default());
    let caches = Arc::new(EngineCaches::new(&options));
    let factory = ToyFactory {
        types: Arc::clone(types),
        counters: Arc::clone(&counters),
    };
    (
        Engine::with_caches(options, Arc::new(factory), caches),
        counters,
    )
}

/// A toy front-end and its counters, for engines that share caches.
pub fn toy_factory(types: &Arc<TypeManager>) -> (Arc<dyn CompilerFactory>, Arc<Counters>) {
    let counters = Arc::new(Counters::default());
    let factory = ToyFactory {
        types: Arc::clone(types),
        counters: Arc::clone(&counters),
    };
    (Arc::new(factory), counters)
}

/// A front-end that compiles any text to the constant `value`.
pub struct ConstFactory {
    pub types: Arc<TypeManager>,
    pub value: i64,
}

impl CompilerFactory for ConstFactory {
    fn create(&self, _: &LibrarySet) -> Result<Box<dyn ExpressionCompiler>, FrontEndError> {
        Ok(Box::new(Const {
            int: self.types.int(),
            value: self.value,
        }))
    }
}

struct Const {
    int: Ty,
    value: i64,
}

impl ExpressionCompiler for Const {
    fn compile_expression(
        &mut self,
        _: &str,
        _: &CompilerContext<'_>,
        _: Option<&Ty>,
    ) -> Result<CompileOutput, FrontEndError> {
        Ok(CompileOutput {
            tree: Some(Expr::constant(self.int.clone(), Value::Int(self.value))),
            diagnostics: vec![],
        })
    }
}
