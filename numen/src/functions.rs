//! Function registry
//!
//! Maps a function name to the argument counts it accepts and the native
//! evaluator for each. Formula call sites resolve against this table at
//! parse time, so a call never fails at evaluation time.

use crate::error::NumenError;
use crate::evaluator::{evaluate_formula, Scope};
use crate::semantic::FormulaNode;
use crate::NumenResult;
use rand::Rng;
use std::collections::HashMap;
use std::f64::consts;
use std::fmt;
use std::rc::Rc;

/// Native evaluator of one function overload
pub type FuncEval = Rc<dyn Fn(&Args<'_>) -> f64>;

/// Name of the built-in conditional, whose first argument is a Condition
pub const IF_FUNCTION: &str = "If";

/// Arguments of a call. Each argument is evaluated only when asked for.
pub struct Args<'a> {
    scope: &'a dyn Scope,
    params: &'a [FormulaNode],
}

impl<'a> Args<'a> {
    pub(crate) fn new(scope: &'a dyn Scope, params: &'a [FormulaNode]) -> Self {
        Self { scope, params }
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// Evaluate argument `index`; 0 when out of range
    pub fn value(&self, index: usize) -> f64 {
        self.params
            .get(index)
            .map_or(0.0, |param| evaluate_formula(param, self.scope))
    }

    pub fn scope(&self) -> &'a dyn Scope {
        self.scope
    }
}

#[derive(Clone)]
pub(crate) enum FunctionKind {
    Native(Vec<(usize, FuncEval)>),
    If,
}

/// A registered function
#[derive(Clone)]
pub struct FunctionDef {
    name: String,
    pub(crate) kind: FunctionKind,
}

impl FunctionDef {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Accepted argument counts
    pub fn arities(&self) -> Vec<usize> {
        match &self.kind {
            FunctionKind::Native(overloads) => overloads.iter().map(|(arity, _)| *arity).collect(),
            FunctionKind::If => vec![3],
        }
    }

    pub(crate) fn overload(&self, arity: usize) -> Option<&FuncEval> {
        match &self.kind {
            FunctionKind::Native(overloads) => overloads
                .iter()
                .find(|(candidate, _)| *candidate == arity)
                .map(|(_, eval)| eval),
            FunctionKind::If => None,
        }
    }
}

impl fmt::Debug for FunctionDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FunctionDef")
            .field("name", &self.name)
            .field("arities", &self.arities())
            .finish()
    }
}

#[derive(Debug, Clone, Default)]
pub struct FunctionRegistry {
    functions: HashMap<String, FunctionDef>,
}

impl FunctionRegistry {
    /// An empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// `If`, `Random`, `Min`, `Max` and the math library
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.insert(IF_FUNCTION, FunctionKind::If);
        registry.insert(
            "Random",
            FunctionKind::Native(vec![
                (1, Rc::new(|args: &Args<'_>| random_below(args.value(0))) as FuncEval),
                (2, Rc::new(|args: &Args<'_>| random_between(args.value(0), args.value(1))) as FuncEval),
            ]),
        );
        registry.insert(
            "Min",
            native(2, |args| {
                let (a, b) = (args.value(0), args.value(1));
                if a < b {
                    a
                } else {
                    b
                }
            }),
        );
        registry.insert(
            "Max",
            native(2, |args| {
                let (a, b) = (args.value(0), args.value(1));
                if a > b {
                    a
                } else {
                    b
                }
            }),
        );
        for (name, arity, math) in MATH_LIBRARY {
            let math = *math;
            registry.insert(name, native(*arity, move |args| math.call(args)));
        }
        registry
    }

    /// Register `name` taking exactly `arity` arguments.
    ///
    /// Fails when the name is already registered.
    pub fn register(
        &mut self,
        name: &str,
        arity: usize,
        eval: impl Fn(&Args<'_>) -> f64 + 'static,
    ) -> NumenResult<()> {
        if name.is_empty() {
            return Err(NumenError::Function("function name cannot be empty".to_string()));
        }
        if self.functions.contains_key(name) {
            return Err(NumenError::Function(format!(
                "function '{}' is already registered",
                name
            )));
        }
        self.insert(name, native(arity, eval));
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&FunctionDef> {
        self.functions.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.functions.contains_key(name)
    }

    /// Registered names, sorted
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.functions.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    fn insert(&mut self, name: &str, kind: FunctionKind) {
        self.functions.insert(
            name.to_string(),
            FunctionDef {
                name: name.to_string(),
                kind,
            },
        );
    }
}

fn native(arity: usize, eval: impl Fn(&Args<'_>) -> f64 + 'static) -> FunctionKind {
    let eval: FuncEval = Rc::new(eval);
    FunctionKind::Native(vec![(arity, eval)])
}

/// Uniform integer in `[0, n)`; 0 when the range is empty
fn random_below(n: f64) -> f64 {
    random_between(0.0, n)
}

/// Uniform integer in `[low, high)`; `low` when the range is empty
fn random_between(low: f64, high: f64) -> f64 {
    let (low, high) = (low as i64, high as i64);
    if high <= low {
        return low as f64;
    }
    rand::rng().random_range(low..high) as f64
}

#[derive(Clone, Copy)]
enum MathFn {
    Nullary(fn() -> f64),
    Unary(fn(f64) -> f64),
    Binary(fn(f64, f64) -> f64),
}

impl MathFn {
    fn call(self, args: &Args<'_>) -> f64 {
        match self {
            MathFn::Nullary(f) => f(),
            MathFn::Unary(f) => f(args.value(0)),
            MathFn::Binary(f) => f(args.value(0), args.value(1)),
        }
    }
}

static MATH_LIBRARY: &[(&str, usize, MathFn)] = &[
    ("Trunc", 1, MathFn::Unary(f64::trunc)),
    ("Cbrt", 1, MathFn::Unary(f64::cbrt)),
    ("Sqrt", 1, MathFn::Unary(f64::sqrt)),
    ("Hypot", 2, MathFn::Binary(f64::hypot)),
    ("Sin", 1, MathFn::Unary(f64::sin)),
    ("Cos", 1, MathFn::Unary(f64::cos)),
    ("Tan", 1, MathFn::Unary(f64::tan)),
    ("Log", 1, MathFn::Unary(f64::ln)),
    ("Log2", 1, MathFn::Unary(f64::log2)),
    ("Log10", 1, MathFn::Unary(f64::log10)),
    ("Log1p", 1, MathFn::Unary(f64::ln_1p)),
    ("Abs", 1, MathFn::Unary(f64::abs)),
    ("Floor", 1, MathFn::Unary(f64::floor)),
    ("Ceil", 1, MathFn::Unary(f64::ceil)),
    ("Round", 1, MathFn::Unary(f64::round)),
    ("Mod", 2, MathFn::Binary(float_mod)),
    ("Pow", 2, MathFn::Binary(f64::powf)),
    ("Copysign", 2, MathFn::Binary(f64::copysign)),
    ("Remainder", 2, MathFn::Binary(ieee_remainder)),
    ("Dim", 2, MathFn::Binary(positive_difference)),
    ("Asin", 1, MathFn::Unary(f64::asin)),
    ("Acos", 1, MathFn::Unary(f64::acos)),
    ("Atan", 1, MathFn::Unary(f64::atan)),
    ("Atan2", 2, MathFn::Binary(f64::atan2)),
    ("Sinh", 1, MathFn::Unary(f64::sinh)),
    ("Cosh", 1, MathFn::Unary(f64::cosh)),
    ("Tanh", 1, MathFn::Unary(f64::tanh)),
    ("Asinh", 1, MathFn::Unary(f64::asinh)),
    ("Acosh", 1, MathFn::Unary(f64::acosh)),
    ("Atanh", 1, MathFn::Unary(f64::atanh)),
    ("Exp", 1, MathFn::Unary(f64::exp)),
    ("Exp2", 1, MathFn::Unary(f64::exp2)),
    ("Expm1", 1, MathFn::Unary(f64::exp_m1)),
    ("Pow10", 1, MathFn::Unary(pow10)),
    ("NaN", 0, MathFn::Nullary(nan)),
    ("Inf", 1, MathFn::Unary(signed_infinity)),
];

/// Floating remainder with the sign of the dividend
fn float_mod(x: f64, y: f64) -> f64 {
    x % y
}

/// IEEE 754 remainder: `x - n*y` with `n` rounded to the nearest even
fn ieee_remainder(x: f64, y: f64) -> f64 {
    x - (x / y).round_ties_even() * y
}

fn positive_difference(x: f64, y: f64) -> f64 {
    if x > y {
        x - y
    } else {
        0.0
    }
}

fn pow10(x: f64) -> f64 {
    10f64.powf(x)
}

fn nan() -> f64 {
    f64::NAN
}

fn signed_infinity(sign: f64) -> f64 {
    if sign < 0.0 {
        f64::NEG_INFINITY
    } else {
        f64::INFINITY
    }
}

/// Values of the `mathconst` names, indexed by raw id (1..=11)
pub(crate) const MATH_CONSTANTS: &[(&str, f64)] = &[
    ("E", consts::E),
    ("PI", consts::PI),
    ("PHI", 1.618_033_988_749_895),
    ("SQRT2", consts::SQRT_2),
    ("SQRTE", 1.648_721_270_700_128_2),
    ("SQRTPI", 1.772_453_850_905_516),
    ("SQRTPHI", 1.272_019_649_514_069),
    ("LN2", consts::LN_2),
    ("LOG2E", consts::LOG2_E),
    ("LOG10", consts::LN_10),
    ("LOG10E", consts::LOG10_E),
];
