//! Tree-walking evaluator for rewritten expressions.
//!
//! Environment variables are read from and written to an [`Activation`];
//! lambda parameters and block locals live on the evaluator's own stack.

mod error;


pub use error::ExecutionError;

use std::sync::Arc;

use quill_types::{Scalar, Ty, TyKind};

use crate::tree::{BinaryOp, ElementInit, Expr, ExprKind, MemberBinding, MemberRef, ParamId, UnaryOp};
use crate::values::{Activation, Closure, ListRef, ObjectRef, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EvaluatorOptions {
    /// Maximum nesting of evaluations, including closure calls.
    pub max_depth: usize,
}

impl Default for EvaluatorOptions {
    fn default() -> Self {
        Self { max_depth: 1000 }
    }
}

pub struct Evaluator<'a> {
    options: EvaluatorOptions,
    activation: &'a mut Activation,
    locals: Vec<(ParamId, Value)>,
    depth: usize,
}

impl<'a> Evaluator<'a> {
    pub fn new(options: EvaluatorOptions, activation: &'a mut Activation) -> Self {
        Self {
            options,
            activation,
            locals: Vec::new(),
            depth: 0,
        }
    }

    pub fn eval(&mut self, expr: &Expr) -> Result<Value, ExecutionError> {
        if self.depth >= self.options.max_depth {
            return Err(ExecutionError::DepthExceeded(self.options.max_depth));
        }
        self.depth += 1;
        let result = self.eval_node(expr);
        self.depth -= 1;
        result
    }

    fn eval_node(&mut self, expr: &Expr) -> Result<Value, ExecutionError> {
        match expr.kind() {
            ExprKind::Constant(value) => Ok(value.clone()),

            ExprKind::Param(param) => self
                .local(param.id())
                .cloned()
                .ok_or_else(|| ExecutionError::UnboundParameter(param.name().to_string())),

            ExprKind::Binding(binding) => self
                .activation
                .get(binding.id())
                .cloned()
                .ok_or_else(|| ExecutionError::UnboundVariable(binding.name().to_string())),

            ExprKind::Binary {
                op,
                checked,
                left,
                right,
                method,
                conversion,
            } => {
                if let Some(method) = method {
                    let args = [self.eval(left)?, self.eval(right)?];
                    return method.func.call(None, &args);
                }
                match op {
                    BinaryOp::AndAlso => {
                        if !as_bool(&self.eval(left)?)? {
                            return Ok(Value::Bool(false));
                        }
                        Ok(Value::Bool(as_bool(&self.eval(right)?)?))
                    }
                    BinaryOp::OrElse => {
                        if as_bool(&self.eval(left)?)? {
                            return Ok(Value::Bool(true));
                        }
                        Ok(Value::Bool(as_bool(&self.eval(right)?)?))
                    }
                    BinaryOp::Coalesce => {
                        let value = self.eval(left)?;
                        if matches!(value, Value::Null | Value::Unit) {
                            return self.eval(right);
                        }
                        match conversion {
                            Some(conversion) => {
                                let callee = self.eval(conversion)?;
                                self.invoke(&callee, vec![value])
                            }
                            None => Ok(value),
                        }
                    }
                    _ => {
                        let l = self.eval(left)?;
                        let r = self.eval(right)?;
                        binary(*op, *checked, &l, &r)
                    }
                }
            }

            ExprKind::Unary {
                op,
                checked,
                operand,
                method,
            } => {
                let value = self.eval(operand)?;
                match method {
                    Some(method) => method.func.call(None, &[value]),
                    None => unary(*op, *checked, value, expr.ty()),
                }
            }

            ExprKind::Conditional {
                test,
                if_true,
                if_false,
            } => {
                if as_bool(&self.eval(test)?)? {
                    self.eval(if_true)
                } else {
                    self.eval(if_false)
                }
            }

            ExprKind::Invoke { callee, args } => {
                let callee = self.eval(callee)?;
                let args = self.eval_all(args)?;
                self.invoke(&callee, args)
            }

            ExprKind::Lambda { params, body } => Ok(Value::Closure(Closure {
                params: Arc::from(params.as_slice()),
                body: body.clone(),
                captured: Arc::from(self.locals.as_slice()),
            })),

            ExprKind::ListInit { new, initializers } => {
                let collection = self.eval(new)?;
                self.add_all(&collection, initializers)?;
                Ok(collection)
            }

            ExprKind::Member { target, member } => {
                let target = match target {
                    Some(target) => Some(self.eval(target)?),
                    None => None,
                };
                read_member(target.as_ref(), member)
            }

            ExprKind::MemberInit { new, bindings } => {
                let instance = self.eval(new)?;
                self.apply_bindings(&instance, bindings)?;
                Ok(instance)
            }

            ExprKind::Index { target, indices } => {
                let target = self.eval(target)?;
                let indices = self.eval_all(indices)?;
                index(&target, &indices)
            }

            ExprKind::Call {
                target,
                method,
                args,
            } => {
                let target = match target {
                    Some(target) => match self.eval(target)? {
                        Value::Null => return Err(ExecutionError::NullReference),
                        value => Some(value),
                    },
                    None => None,
                };
                let args = self.eval_all(args)?;
                method.func.call(target.as_ref(), &args)
            }

            ExprKind::NewArrayInit { elements } => {
                let items = self.eval_all(elements)?;
                Ok(Value::List(ListRef::new(expr.ty().clone(), items)))
            }

            ExprKind::NewArrayBounds { bounds } => {
                let mut lengths = Vec::with_capacity(bounds.len());
                for bound in bounds {
                    let len = as_int(&self.eval(bound)?)?;
                    let len = usize::try_from(len)
                        .map_err(|_| ExecutionError::IndexOutOfRange { index: len, len: 0 })?;
                    lengths.push(len);
                }
                let rank = array_rank(expr.ty());
                if lengths.len() > rank.max(1) {
                    return Err(ExecutionError::RankMismatch {
                        bounds: lengths.len(),
                        rank,
                    });
                }
                Ok(new_array(expr.ty(), &lengths))
            }

            ExprKind::New { ctor, args } => {
                let args = self.eval_all(args)?;
                match ctor {
                    Some(ctor) => ctor.func.call(None, &args),
                    None => Ok(instantiate(expr.ty())),
                }
            }

            ExprKind::TypeIs { operand, test_ty } => {
                Ok(Value::Bool(self.eval(operand)?.is_instance_of(test_ty)))
            }

            ExprKind::Block { locals, body } => {
                let depth = self.locals.len();
                self.locals
                    .extend(locals.iter().map(|l| (l.id(), Value::default_for(l.ty()))));
                let result = self.eval_sequence(body);
                self.locals.truncate(depth);
                result
            }

            ExprKind::Assign { target, value } => {
                let value = self.eval(value)?;
                self.assign(target, value.clone())?;
                Ok(value)
            }
        }
    }

    fn eval_all(&mut self, exprs: &[Expr]) -> Result<Vec<Value>, ExecutionError> {
        exprs.iter().map(|e| self.eval(e)).collect()
    }

    fn eval_sequence(&mut self, exprs: &[Expr]) -> Result<Value, ExecutionError> {
        let mut last = Value::Unit;
        for expr in exprs {
            last = self.eval(expr)?;
        }
        Ok(last)
    }

    fn local(&self, id: ParamId) -> Option<&Value> {
        self.locals
            .iter()
            .rev()
            .find(|(slot, _)| *slot == id)
            .map(|(_, value)| value)
    }

    fn invoke(&mut self, callee: &Value, args: Vec<Value>) -> Result<Value, ExecutionError> {
        let Value::Closure(closure) = callee else {
            return Err(ExecutionError::NotCallable(callee.kind_name()));
        };
        if closure.arity() != args.len() {
            return Err(ExecutionError::ArgumentCount {
                expected: closure.arity(),
                got: args.len(),
            });
        }

        let mut frame = closure.captured.to_vec();
        frame.extend(closure.params.iter().map(|p| p.id()).zip(args));
        let saved = std::mem::replace(&mut self.locals, frame);
        let result = self.eval(&closure.body);
        self.locals = saved;
        result
    }

    fn add_all(&mut self, collection: &Value, inits: &[ElementInit]) -> Result<(), ExecutionError> {
        if collection.is_null() {
            return Err(ExecutionError::NullReference);
        }
        for init in inits {
            let args = self.eval_all(&init.args)?;
            init.add.func.call(Some(collection), &args)?;
        }
        Ok(())
    }

    fn apply_bindings(
        &mut self,
        instance: &Value,
        bindings: &[MemberBinding],
    ) -> Result<(), ExecutionError> {
        for binding in bindings {
            match binding {
                MemberBinding::Assign { member, value } => {
                    let value = self.eval(value)?;
                    write_member(instance, member, value)?;
                }
                MemberBinding::List {
                    member,
                    initializers,
                } => {
                    let collection = read_member(Some(instance), member)?;
                    self.add_all(&collection, initializers)?;
                }
                MemberBinding::Member { member, bindings } => {
                    let nested = read_member(Some(instance), member)?;
                    self.apply_bindings(&nested, bindings)?;
                }
            }
        }
        Ok(())
    }

    /// Writes `value` to the location `target` denotes. Targets and indices
    /// along the way are evaluated first.
    pub fn assign(&mut self, target: &Expr, value: Value) -> Result<(), ExecutionError> {
        match target.kind() {
            ExprKind::Param(param) => {
                let id = param.id();
                match self.locals.iter_mut().rev().find(|(slot, _)| *slot == id) {
                    Some((_, slot)) => {
                        *slot = value;
                        Ok(())
                    }
                    None => Err(ExecutionError::UnboundParameter(param.name().to_string())),
                }
            }
            ExprKind::Binding(binding) => {
                self.activation.store(binding.id(), value);
                Ok(())
            }
            ExprKind::Member {
                target: Some(object),
                member,
            } => {
                let object = self.eval(object)?;
                write_member(&object, member, value)
            }
            ExprKind::Index { target, indices } => {
                let target = self.eval(target)?;
                let indices = self.eval_all(indices)?;
                let (list, at) = list_slot(&target, &indices)?;
                list.set(at, value);
                Ok(())
            }
            _ => Err(ExecutionError::InvalidAssignment),
        }
    }
}

fn as_bool(value: &Value) -> Result<bool, ExecutionError> {
    value.as_bool().ok_or(ExecutionError::TypeMismatch {
        expected: "bool",
        found: value.kind_name(),
    })
}

fn as_int(value: &Value) -> Result<i64, ExecutionError> {
    value.as_int().ok_or(ExecutionError::TypeMismatch {
        expected: "int",
        found: value.kind_name(),
    })
}

/// Array of `lengths[0]` elements, each an array of the remaining lengths.
///
/// Every level is a list typed with the matching array type; innermost
/// elements are the element type's default.
fn new_array(ty: &Ty, lengths: &[usize]) -> Value {
    let Some((&len, rest)) = lengths.split_first() else {
        return Value::List(ListRef::new(ty.clone(), Vec::new()));
    };
    let element = ty.element();
    let items = (0..len)
        .map(|_| match element {
            Some(element) if !rest.is_empty() => new_array(element, rest),
            Some(element) => Value::default_for(element),
            None => Value::Null,
        })
        .collect();
    Value::List(ListRef::new(ty.clone(), items))
}

fn array_rank(ty: &Ty) -> usize {
    let mut rank = 0;
    let mut current = ty;
    while let Some(element) = current.element() {
        rank += 1;
        current = element;
    }
    rank
}

/// A fresh value of `ty` for `new` without a constructor.
fn instantiate(ty: &Ty) -> Value {
    match ty.kind() {
        TyKind::Scalar(_) => Value::default_for(ty),
        TyKind::Array(_) => Value::List(ListRef::new(ty.clone(), Vec::new())),
        _ => Value::Object(ObjectRef::new(ty.clone())),
    }
}

fn read_member(target: Option<&Value>, member: &MemberRef) -> Result<Value, ExecutionError> {
    if let Some(getter) = &member.getter {
        if matches!(target, Some(Value::Null)) {
            return Err(ExecutionError::NullReference);
        }
        return getter.call(target, &[]);
    }
    match target {
        Some(Value::Object(object)) => Ok(object
            .get(&member.name)
            .unwrap_or_else(|| Value::default_for(&member.ty))),
        Some(Value::Null) => Err(ExecutionError::NullReference),
        Some(other) => Err(ExecutionError::TypeMismatch {
            expected: "object",
            found: other.kind_name(),
        }),
        None => Err(ExecutionError::MissingField(member.name.to_string())),
    }
}

fn write_member(target: &Value, member: &MemberRef, value: Value) -> Result<(), ExecutionError> {
    match target {
        Value::Object(object) if member.getter.is_none() => {
            object.set(member.name.clone(), value);
            Ok(())
        }
        Value::Object(_) => Err(ExecutionError::InvalidAssignment),
        Value::Null => Err(ExecutionError::NullReference),
        other => Err(ExecutionError::TypeMismatch {
            expected: "object",
            found: other.kind_name(),
        }),
    }
}

fn list_slot<'v>(target: &'v Value, indices: &[Value]) -> Result<(&'v ListRef, usize), ExecutionError> {
    let list = match target {
        Value::List(list) => list,
        Value::Null => return Err(ExecutionError::NullReference),
        other => {
            return Err(ExecutionError::TypeMismatch {
                expected: "list",
                found: other.kind_name(),
            });
        }
    };
    let [index] = indices else {
        return Err(ExecutionError::ArgumentCount {
            expected: 1,
            got: indices.len(),
        });
    };
    let index = as_int(index)?;
    let len = list.len();
    match usize::try_from(index) {
        Ok(at) if at < len => Ok((list, at)),
        _ => Err(ExecutionError::IndexOutOfRange { index, len }),
    }
}

fn index(target: &Value, indices: &[Value]) -> Result<Value, ExecutionError> {
    if let (Value::Str(s), [index]) = (target, indices) {
        let index = as_int(index)?;
        let len = s.chars().count();
        return usize::try_from(index)
            .ok()
            .and_then(|at| s.chars().nth(at))
            .map(|c| Value::str(c.encode_utf8(&mut [0; 4])))
            .ok_or(ExecutionError::IndexOutOfRange { index, len });
    }
    let (list, at) = list_slot(target, indices)?;
    list.get(at).ok_or(ExecutionError::IndexOutOfRange {
        index: at as i64,
        len: list.len(),
    })
}

fn binary(op: BinaryOp, checked: bool, l: &Value, r: &Value) -> Result<Value, ExecutionError> {
    match (l, r) {
        (Value::Int(a), Value::Int(b)) => int_binary(op, checked, *a, *b),
        (Value::Float(a), Value::Float(b)) => float_binary(op, *a, *b),
        (Value::Int(a), Value::Float(b)) => float_binary(op, *a as f64, *b),
        (Value::Float(a), Value::Int(b)) => float_binary(op, *a, *b as f64),
        (Value::Bool(a), Value::Bool(b)) => match op {
            BinaryOp::And => Ok(Value::Bool(*a & *b)),
            BinaryOp::Or => Ok(Value::Bool(*a | *b)),
            BinaryOp::ExclusiveOr => Ok(Value::Bool(*a ^ *b)),
            BinaryOp::Equal => Ok(Value::Bool(a == b)),
            BinaryOp::NotEqual => Ok(Value::Bool(a != b)),
            _ => Err(mismatch(op, l)),
        },
        (Value::Str(a), Value::Str(b)) => match op {
            BinaryOp::Add => Ok(Value::str(&format!("{}{}", a, b))),
            op if op.is_comparison() => Ok(Value::Bool(compare(op, a.cmp(b)))),
            _ => Err(mismatch(op, l)),
        },
        _ => match op {
            BinaryOp::Equal => Ok(Value::Bool(l == r)),
            BinaryOp::NotEqual => Ok(Value::Bool(l != r)),
            _ => Err(mismatch(op, l)),
        },
    }
}

fn mismatch(op: BinaryOp, found: &Value) -> ExecutionError {
    let expected = if op.is_comparison() || op == BinaryOp::Add {
        "number or str"
    } else {
        "number"
    };
    ExecutionError::TypeMismatch {
        expected,
        found: found.kind_name(),
    }
}

fn compare(op: BinaryOp, ord: std::cmp::Ordering) -> bool {
    use std::cmp::Ordering::*;
    match op {
        BinaryOp::Equal => ord == Equal,
        BinaryOp::NotEqual => ord != Equal,
        BinaryOp::LessThan => ord == Less,
        BinaryOp::LessThanOrEqual => ord != Greater,
        BinaryOp::GreaterThan => ord == Greater,
        BinaryOp::GreaterThanOrEqual => ord != Less,
        _ => false,
    }
}

fn int_binary(op: BinaryOp, checked: bool, a: i64, b: i64) -> Result<Value, ExecutionError> {
    let overflow = ExecutionError::Overflow { op: op.symbol() };
    let arith = |checked_op: fn(i64, i64) -> Option<i64>, wrapping_op: fn(i64, i64) -> i64| {
        if checked {
            checked_op(a, b).map(Value::Int).ok_or(overflow.clone())
        } else {
            Ok(Value::Int(wrapping_op(a, b)))
        }
    };
    match op {
        BinaryOp::Add => arith(i64::checked_add, i64::wrapping_add),
        BinaryOp::Subtract => arith(i64::checked_sub, i64::wrapping_sub),
        BinaryOp::Multiply => arith(i64::checked_mul, i64::wrapping_mul),
        BinaryOp::Divide | BinaryOp::Modulo => {
            if b == 0 {
                return Err(ExecutionError::DivisionByZero);
            }
            if a == i64::MIN && b == -1 {
                return Err(overflow);
            }
            Ok(Value::Int(if op == BinaryOp::Divide {
                a.div_euclid(b)
            } else {
                a.rem_euclid(b)
            }))
        }
        BinaryOp::Power => {
            let exp = u32::try_from(b).map_err(|_| overflow.clone())?;
            if checked {
                a.checked_pow(exp).map(Value::Int).ok_or(overflow)
            } else {
                Ok(Value::Int(a.wrapping_pow(exp)))
            }
        }
        BinaryOp::And => Ok(Value::Int(a & b)),
        BinaryOp::Or => Ok(Value::Int(a | b)),
        BinaryOp::ExclusiveOr => Ok(Value::Int(a ^ b)),
        BinaryOp::LeftShift => Ok(Value::Int(a.wrapping_shl(b as u32))),
        BinaryOp::RightShift => Ok(Value::Int(a.wrapping_shr(b as u32))),
        op if op.is_comparison() => Ok(Value::Bool(compare(op, a.cmp(&b)))),
        _ => Err(mismatch(op, &Value::Int(a))),
    }
}

fn float_binary(op: BinaryOp, a: f64, b: f64) -> Result<Value, ExecutionError> {
    Ok(match op {
        BinaryOp::Add => Value::Float(a + b),
        BinaryOp::Subtract => Value::Float(a - b),
        BinaryOp::Multiply => Value::Float(a * b),
        BinaryOp::Divide => Value::Float(a / b),
        BinaryOp::Modulo => Value::Float(a % b),
        BinaryOp::Power => Value::Float(a.powf(b)),
        BinaryOp::Equal => Value::Bool(a == b),
        BinaryOp::NotEqual => Value::Bool(a != b),
        BinaryOp::LessThan => Value::Bool(a < b),
        BinaryOp::LessThanOrEqual => Value::Bool(a <= b),
        BinaryOp::GreaterThan => Value::Bool(a > b),
        BinaryOp::GreaterThanOrEqual => Value::Bool(a >= b),
        _ => return Err(mismatch(op, &Value::Float(a))),
    })
}

fn unary(op: UnaryOp, checked: bool, value: Value, ty: &Ty) -> Result<Value, ExecutionError> {
    match (op, value) {
        (UnaryOp::Negate, Value::Int(n)) if checked => n
            .checked_neg()
            .map(Value::Int)
            .ok_or(ExecutionError::Overflow { op: "neg" }),
        (UnaryOp::Negate, Value::Int(n)) => Ok(Value::Int(n.wrapping_neg())),
        (UnaryOp::Negate, Value::Float(x)) => Ok(Value::Float(-x)),
        (UnaryOp::UnaryPlus, value @ (Value::Int(_) | Value::Float(_))) => Ok(value),
        (UnaryOp::Not, Value::Bool(b)) => Ok(Value::Bool(!b)),
        (UnaryOp::Not, Value::Int(n)) => Ok(Value::Int(!n)),
        (UnaryOp::ArrayLength, Value::List(list)) => Ok(Value::Int(list.len() as i64)),
        (UnaryOp::ArrayLength, Value::Null) => Err(ExecutionError::NullReference),
        (UnaryOp::Quote, value) => Ok(value),
        (UnaryOp::TypeAs, value) => Ok(if value.is_instance_of(ty) {
            value
        } else {
            Value::Null
        }),
        (UnaryOp::Convert, value) => convert(value, ty, checked),
        (_, value) => Err(ExecutionError::TypeMismatch {
            expected: "number",
            found: value.kind_name(),
        }),
    }
}

const TWO_POW_63: f64 = 9_223_372_036_854_775_808.0;

fn convert(value: Value, ty: &Ty, checked: bool) -> Result<Value, ExecutionError> {
    let TyKind::Scalar(target) = ty.kind() else {
        // Reference conversions only re-type the value.
        return if value.is_null() || value.is_instance_of(ty) {
            Ok(value)
        } else {
            Err(ExecutionError::TypeMismatch {
                expected: "instance of the target type",
                found: value.kind_name(),
            })
        };
    };
    match (target, value) {
        (Scalar::Float, Value::Int(n)) => Ok(Value::Float(n as f64)),
        (Scalar::Int, Value::Float(x)) => {
            let truncated = x.trunc();
            // `i64::MAX as f64` rounds up to 2^63, which is out of range.
            if checked && !(i64::MIN as f64..TWO_POW_63).contains(&truncated) {
                return Err(ExecutionError::Overflow { op: "convert" });
            }
            Ok(Value::Int(truncated as i64))
        }
        (Scalar::Str, Value::Str(s)) => Ok(Value::Str(s)),
        (Scalar::Str, value @ (Value::Int(_) | Value::Float(_) | Value::Bool(_))) => {
            Ok(Value::str(&value.to_string()))
        }
        (Scalar::Unit, _) => Ok(Value::Unit),
        (_, value) if value.is_instance_of(ty) => Ok(value),
        (target, value) => Err(ExecutionError::TypeMismatch {
            expected: target.name(),
            found: value.kind_name(),
        }),
    }
}
