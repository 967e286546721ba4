//! Purpose: Compile and evaluate jq expressions as column definitions for `mutate`.
//! Exports: `ExprDef`.
//! Role: Small adapter around `jaq-core` so transforms can be written as data (CLI, JSON defs).
//! Invariants: Compile failures are argument errors; runtime failures are eval errors.
//! Invariants: The row is presented as an object of all columns; the first output is the cell value.
//! Invariants: An expression with no output yields null.
//! Invariants: A missing numeric cell is NaN and orders below every number, so `.a < 1`
//! holds for it while `.a > 1` does not. Guard `<` tests with `.a > -1e308`.
use std::fmt;

use jaq_core::load::{Arena, File, Loader};
use jaq_core::{Compiler, Ctx, Error as JaqError, Native, RcIter};

use crate::core::error::{Error, ErrorKind};
use crate::core::mutate::ColumnDef;
use crate::core::row::Row;
use crate::core::value::{Record, Value};

#[derive(Clone)]
pub struct ExprDef {
    expr: String,
    filter: jaq_core::Filter<Native<Value>>,
}

impl fmt::Debug for ExprDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExprDef").field("expr", &self.expr).finish()
    }
}

impl ExprDef {
    pub fn compile(expr: &str) -> Result<Self, Error> {
        let arena = Arena::default();
        let loader = Loader::new(std::iter::empty());

        let program = File {
            code: expr,
            path: (),
        };
        let modules = loader
            .load(&arena, program)
            .map_err(|errs| compile_error(expr, errs))?;

        let filter = Compiler::default()
            .with_funs(jaq_std::base_funs::<Value>())
            .compile(modules)
            .map_err(|errs| compile_error(expr, errs))?;

        Ok(Self {
            expr: expr.to_string(),
            filter,
        })
    }

    pub fn expr(&self) -> &str {
        &self.expr
    }

    pub fn eval(&self, input: Value) -> Result<Value, Error> {
        let inputs = RcIter::new(std::iter::empty::<Result<Value, String>>());
        let mut out = self.filter.run((Ctx::new([], &inputs), input));
        match out.next() {
            None => Ok(Value::Null),
            Some(Ok(value)) => Ok(value),
            Some(Err(err)) => Err(Error::new(ErrorKind::Eval)
                .with_message(format!("expression failed: {err}"))
                .with_hint(format!("Expression: `{}`", self.expr))),
        }
    }
}

impl ColumnDef for ExprDef {
    fn compute(&self, row: &Row<'_>) -> Result<Value, Error> {
        self.eval(row.to_value()).map_err(|err| {
            err.with_hint(format!("Expression `{}` at row {}", self.expr, row.index()))
        })
    }
}

fn compile_error<E: fmt::Debug>(expr: &str, err: E) -> Error {
    Error::new(ErrorKind::Argument)
        .with_message("invalid column expression")
        .with_hint(format!(
            "Failed to parse/compile `{expr}`.\nDetails: {err:?}\nExample: '.a * 2'"
        ))
}

impl std::ops::Add for Value {
    type Output = Result<Self, JaqError<Self>>;

    fn add(self, rhs: Self) -> Self::Output {
        use jaq_core::ops::Math;
        match (self, rhs) {
            (Self::Number(a), Self::Number(b)) => Ok(Self::Number(a + b)),
            (Self::Text(a), Self::Text(b)) => Ok(Self::Text(format!("{a}{b}"))),
            (Self::Array(mut a), Self::Array(b)) => {
                a.extend(b);
                Ok(Self::Array(a))
            }
            (Self::Null, other) | (other, Self::Null) => Ok(other),
            (l, r) => Err(JaqError::math(l, Math::Add, r)),
        }
    }
}

impl std::ops::Sub for Value {
    type Output = Result<Self, JaqError<Self>>;

    fn sub(self, rhs: Self) -> Self::Output {
        use jaq_core::ops::Math;
        match (self, rhs) {
            (Self::Number(a), Self::Number(b)) => Ok(Self::Number(a - b)),
            (l, r) => Err(JaqError::math(l, Math::Sub, r)),
        }
    }
}

impl std::ops::Mul for Value {
    type Output = Result<Self, JaqError<Self>>;

    fn mul(self, rhs: Self) -> Self::Output {
        use jaq_core::ops::Math;
        match (self, rhs) {
            (Self::Number(a), Self::Number(b)) => Ok(Self::Number(a * b)),
            (l, r) => Err(JaqError::math(l, Math::Mul, r)),
        }
    }
}

impl std::ops::Div for Value {
    type Output = Result<Self, JaqError<Self>>;

    fn div(self, rhs: Self) -> Self::Output {
        use jaq_core::ops::Math;
        match (self, rhs) {
            (Self::Number(a), Self::Number(b)) => Ok(Self::Number(a / b)),
            (l, r) => Err(JaqError::math(l, Math::Div, r)),
        }
    }
}

impl std::ops::Rem for Value {
    type Output = Result<Self, JaqError<Self>>;

    fn rem(self, rhs: Self) -> Self::Output {
        use jaq_core::ops::Math;
        match (self, rhs) {
            (Self::Number(a), Self::Number(b)) => Ok(Self::Number(a % b)),
            (l, r) => Err(JaqError::math(l, Math::Rem, r)),
        }
    }
}

impl std::ops::Neg for Value {
    type Output = Result<Self, JaqError<Self>>;

    fn neg(self) -> Self::Output {
        match self {
            Self::Number(a) => Ok(Self::Number(-a)),
            other => Err(JaqError::typ(other, "number")),
        }
    }
}

fn to_index(value: &Value) -> Result<isize, JaqError<Value>> {
    match value {
        Value::Number(n) if n.is_finite() && n.fract() == 0.0 => Ok(*n as isize),
        other => Err(JaqError::typ(other.clone(), "integer")),
    }
}

fn first_or_null<'a, I>(mut iter: I) -> jaq_core::ValX<'a, Value>
where
    I: Iterator<Item = jaq_core::ValX<'a, Value>>,
{
    iter.next().unwrap_or(Ok(Value::Null))
}

impl jaq_core::ValT for Value {
    fn from_num(n: &str) -> Result<Self, JaqError<Self>> {
        let parsed = n.parse::<f64>().map_err(JaqError::str)?;
        Ok(Self::Number(parsed))
    }

    fn from_map<I: IntoIterator<Item = (Self, Self)>>(iter: I) -> Result<Self, JaqError<Self>> {
        let mut record = Record::new();
        for (k, v) in iter {
            let Some(key) = Value::as_str(&k) else {
                return Err(JaqError::typ(k, "string"));
            };
            record.insert(key, v);
        }
        Ok(Self::Object(record))
    }

    fn values(self) -> Box<dyn Iterator<Item = Result<Self, JaqError<Self>>>> {
        match self {
            Self::Array(values) => Box::new(values.into_iter().map(Ok)),
            Self::Object(fields) => Box::new(fields.into_iter().map(|(_, value)| Ok(value))),
            other => Box::new(std::iter::once(Err(JaqError::typ(other, "iterable")))),
        }
    }

    fn index(self, index: &Self) -> Result<Self, JaqError<Self>> {
        match (self, index) {
            // Like jq, a missing key reads as null, matching `Row::get`.
            (Self::Object(mut obj), Self::Text(key)) => Ok(obj.remove(key).unwrap_or(Self::Null)),
            (Self::Null, _) => Ok(Self::Null),
            (Self::Array(arr), Self::Number(n)) => {
                let idx = to_index(&Self::Number(*n))?;
                let len = arr.len() as isize;
                let idx = if idx < 0 { len + idx } else { idx };
                Ok(usize::try_from(idx)
                    .ok()
                    .and_then(|idx| arr.get(idx).cloned())
                    .unwrap_or(Self::Null))
            }
            (l, r) => Err(JaqError::index(l, r.clone())),
        }
    }

    fn range(self, range: jaq_core::val::Range<&Self>) -> Result<Self, JaqError<Self>> {
        match self {
            Self::Array(arr) => {
                let len = arr.len() as isize;
                let start = range.start.map(to_index).transpose()?.unwrap_or(0);
                let end = range.end.map(to_index).transpose()?.unwrap_or(len);
                let norm = |idx: isize| if idx < 0 { len + idx } else { idx };
                let start = norm(start).clamp(0, len) as usize;
                let end = norm(end).clamp(0, len) as usize;
                let slice = if end >= start {
                    arr[start..end].to_vec()
                } else {
                    Vec::new()
                };
                Ok(Self::Array(slice))
            }
            other => Err(JaqError::typ(other, "array")),
        }
    }

    fn map_values<'a, I: Iterator<Item = jaq_core::ValX<'a, Self>>>(
        self,
        opt: jaq_core::path::Opt,
        f: impl Fn(Self) -> I,
    ) -> jaq_core::ValX<'a, Self> {
        match self {
            Self::Array(values) => {
                let mut out = Vec::with_capacity(values.len());
                for value in values {
                    out.push(first_or_null(f(value))?);
                }
                Ok(Self::Array(out))
            }
            Self::Object(fields) => {
                let mut out = Record::new();
                for (k, v) in fields {
                    out.insert(k, first_or_null(f(v))?);
                }
                Ok(Self::Object(out))
            }
            other => match opt {
                jaq_core::path::Opt::Optional => Ok(other),
                jaq_core::path::Opt::Essential => Err(JaqError::typ(other, "iterable").into()),
            },
        }
    }

    fn map_index<'a, I: Iterator<Item = jaq_core::ValX<'a, Self>>>(
        self,
        index: &Self,
        opt: jaq_core::path::Opt,
        f: impl Fn(Self) -> I,
    ) -> jaq_core::ValX<'a, Self> {
        match self {
            Self::Object(mut obj) => {
                let Some(key) = Value::as_str(index) else {
                    return Err(JaqError::typ(index.clone(), "string").into());
                };
                let current = obj.get(key).cloned().unwrap_or(Self::Null);
                // Re-inserting keeps the key at its original position.
                obj.insert(key, first_or_null(f(current))?);
                Ok(Self::Object(obj))
            }
            other => match opt {
                jaq_core::path::Opt::Optional => Ok(other),
                jaq_core::path::Opt::Essential => Err(JaqError::index(other, index.clone()).into()),
            },
        }
    }

    fn map_range<'a, I: Iterator<Item = jaq_core::ValX<'a, Self>>>(
        self,
        range: jaq_core::val::Range<&Self>,
        opt: jaq_core::path::Opt,
        f: impl Fn(Self) -> I,
    ) -> jaq_core::ValX<'a, Self> {
        match self {
            Self::Array(arr) => {
                let slice = jaq_core::ValT::range(Self::Array(arr), range)?;
                first_or_null(f(slice))
            }
            other => match opt {
                jaq_core::path::Opt::Optional => Ok(other),
                jaq_core::path::Opt::Essential => Err(JaqError::typ(other, "array").into()),
            },
        }
    }

    fn as_bool(&self) -> bool {
        !matches!(self, Self::Null | Self::Bool(false))
    }

    fn as_str(&self) -> Option<&str> {
        Value::as_str(self)
    }
}

impl jaq_std::ValT for Value {
    fn into_seq<S: FromIterator<Self>>(self) -> Result<S, Self> {
        match self {
            Self::Array(values) => Ok(values.into_iter().collect()),
            other => Err(other),
        }
    }

    fn as_isize(&self) -> Option<isize> {
        let num = Value::as_f64(self)?;
        if !num.is_finite() || num.fract() != 0.0 {
            return None;
        }
        let cast = num as isize;
        if (cast as f64).to_bits() == num.to_bits() {
            Some(cast)
        } else {
            None
        }
    }

    fn as_f64(&self) -> Result<f64, JaqError<Self>> {
        Value::as_f64(self).ok_or_else(|| JaqError::typ(self.clone(), "number"))
    }
}
