use crate::ast::ExpressionId;
use crate::evaluator::Oper;
use crate::functions::FuncEval;
use crate::registry::Id;
use std::cell::RefCell;
use std::fmt;

/// Binary arithmetic operators of the Formula language
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulo,
}

impl BinaryOp {
    pub fn from_symbol(c: char) -> Option<BinaryOp> {
        match c {
            '+' => Some(BinaryOp::Add),
            '-' => Some(BinaryOp::Subtract),
            '*' => Some(BinaryOp::Multiply),
            '/' => Some(BinaryOp::Divide),
            '%' => Some(BinaryOp::Modulo),
            _ => None,
        }
    }

    pub fn symbol(&self) -> char {
        match self {
            BinaryOp::Add => '+',
            BinaryOp::Subtract => '-',
            BinaryOp::Multiply => '*',
            BinaryOp::Divide => '/',
            BinaryOp::Modulo => '%',
        }
    }

    /// Multiplicative operators bind tighter than additive ones
    pub fn precedence(&self) -> u8 {
        match self {
            BinaryOp::Add | BinaryOp::Subtract => 1,
            BinaryOp::Multiply | BinaryOp::Divide | BinaryOp::Modulo => 2,
        }
    }
}

/// Comparison operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComparisonOperator {
    GreaterThan,
    LessThan,
    GreaterThanOrEqual,
    LessThanOrEqual,
    Equal,
    NotEqual,
}

impl ComparisonOperator {
    pub fn from_symbol(symbol: &str) -> Option<ComparisonOperator> {
        match symbol {
            ">" => Some(ComparisonOperator::GreaterThan),
            "<" => Some(ComparisonOperator::LessThan),
            ">=" => Some(ComparisonOperator::GreaterThanOrEqual),
            "<=" => Some(ComparisonOperator::LessThanOrEqual),
            "=" => Some(ComparisonOperator::Equal),
            "!=" => Some(ComparisonOperator::NotEqual),
            _ => None,
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            ComparisonOperator::GreaterThan => ">",
            ComparisonOperator::LessThan => "<",
            ComparisonOperator::GreaterThanOrEqual => ">=",
            ComparisonOperator::LessThanOrEqual => "<=",
            ComparisonOperator::Equal => "=",
            ComparisonOperator::NotEqual => "!=",
        }
    }
}

/// Logic connectives, written doubled in source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogicOp {
    And,
    Or,
}

impl LogicOp {
    pub fn from_symbol(c: char) -> Option<LogicOp> {
        match c {
            '&' => Some(LogicOp::And),
            '|' => Some(LogicOp::Or),
            _ => None,
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            LogicOp::And => "&&",
            LogicOp::Or => "||",
        }
    }
}

/// A node of the Formula language
#[derive(Debug, Clone)]
pub enum FormulaNode {
    Constant(f64),
    Identifier { id: Id, name: String },
    Binary(Box<FormulaNode>, BinaryOp, Box<FormulaNode>),
    /// Unary minus, evaluated as `0 - node`
    Negate(Box<FormulaNode>),
    Call(FunctionCall),
}

impl FormulaNode {
    pub fn binary(left: FormulaNode, op: BinaryOp, right: FormulaNode) -> Self {
        FormulaNode::Binary(Box::new(left), op, Box::new(right))
    }

    pub fn negate(node: FormulaNode) -> Self {
        FormulaNode::Negate(Box::new(node))
    }

    /// Height of the tree below this node; names and constants are 0
    pub fn depth(&self) -> usize {
        match self {
            FormulaNode::Constant(_) | FormulaNode::Identifier { .. } => 0,
            FormulaNode::Binary(left, _, right) => 1 + left.depth().max(right.depth()),
            FormulaNode::Negate(inner) => 1 + inner.depth(),
            FormulaNode::Call(call) => {
                let condition = match &call.kind {
                    CallKind::If(condition) => condition.depth(),
                    CallKind::Native(_) => 0,
                };
                let args = call.args.iter().map(FormulaNode::depth).max().unwrap_or(0);
                1 + condition.max(args)
            }
        }
    }

    /// Visit every identifier referenced in this subtree, in source order
    pub fn for_each_id(&self, visit: &mut dyn FnMut(Id)) {
        match self {
            FormulaNode::Constant(_) => {}
            FormulaNode::Identifier { id, .. } => visit(*id),
            FormulaNode::Binary(left, _, right) => {
                left.for_each_id(visit);
                right.for_each_id(visit);
            }
            FormulaNode::Negate(inner) => inner.for_each_id(visit),
            FormulaNode::Call(call) => {
                if let CallKind::If(condition) = &call.kind {
                    condition.for_each_id(visit);
                }
                for arg in &call.args {
                    arg.for_each_id(visit);
                }
            }
        }
    }
}

/// How a call site evaluates
#[derive(Clone)]
pub enum CallKind {
    Native(FuncEval),
    /// `If(condition, then, otherwise)`: `args` holds the two branches
    If(Box<ConditionNode>),
}

/// A resolved function call site
#[derive(Clone)]
pub struct FunctionCall {
    pub name: String,
    pub kind: CallKind,
    pub args: Vec<FormulaNode>,
}

impl fmt::Debug for FunctionCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut debug = f.debug_struct("FunctionCall");
        debug.field("name", &self.name);
        if let CallKind::If(condition) = &self.kind {
            debug.field("condition", condition);
        }
        debug.field("args", &self.args).finish()
    }
}

/// A node of the Condition language
#[derive(Debug, Clone)]
pub enum ConditionNode {
    Literal(bool),
    Comparison(FormulaNode, ComparisonOperator, FormulaNode),
    Logic(Box<ConditionNode>, LogicOp, Box<ConditionNode>),
}

impl ConditionNode {
    pub fn logic(left: ConditionNode, op: LogicOp, right: ConditionNode) -> Self {
        ConditionNode::Logic(Box::new(left), op, Box::new(right))
    }

    pub fn depth(&self) -> usize {
        match self {
            ConditionNode::Literal(_) => 0,
            ConditionNode::Comparison(left, _, right) => 1 + left.depth().max(right.depth()),
            ConditionNode::Logic(left, _, right) => 1 + left.depth().max(right.depth()),
        }
    }

    pub fn for_each_id(&self, visit: &mut dyn FnMut(Id)) {
        match self {
            ConditionNode::Literal(_) => {}
            ConditionNode::Comparison(left, _, right) => {
                left.for_each_id(visit);
                right.for_each_id(visit);
            }
            ConditionNode::Logic(left, _, right) => {
                left.for_each_id(visit);
                right.for_each_id(visit);
            }
        }
    }
}

/// One assignment statement: `target <op> value`
#[derive(Debug, Clone)]
pub struct Operation {
    pub target: Id,
    pub name: String,
    pub op: Oper,
    pub value: FormulaNode,
}

/// One step of a process
#[derive(Debug, Clone)]
pub enum Step {
    Assign(Operation),
    /// Halts the process when `condition` is absent or holds
    Return {
        condition: Option<ConditionNode>,
        value: FormulaNode,
    },
}

/// A parsed Formula
#[derive(Debug, Clone)]
pub struct Formula {
    pub id: ExpressionId,
    pub root: FormulaNode,
}

/// A parsed Condition
#[derive(Debug, Clone)]
pub struct Condition {
    pub id: ExpressionId,
    pub root: ConditionNode,
}

impl Condition {
    /// Every identifier referenced by the condition, in source order
    pub fn referenced_ids(&self) -> Vec<Id> {
        let mut ids = Vec::new();
        self.root.for_each_id(&mut |id| ids.push(id));
        ids
    }
}

/// A parsed sequence of assignment statements
#[derive(Debug, Clone)]
pub struct OperationSet {
    pub id: ExpressionId,
    pub operations: Vec<Operation>,
    pub(crate) separator: char,
}

/// A process-local ordered slot and the global name it shadows, if any
#[derive(Debug, Clone, PartialEq)]
pub struct LocalSlot {
    pub name: String,
    pub global: Option<Id>,
}

/// Raw id of the slot a `Return` writes into
pub const RETURN_SLOT: u32 = 1;

/// A parsed Process.
///
/// Owns a scratch value array indexed by local raw id (index 0 unused). The
/// scratch is reused by every run; a re-entrant run falls back to a
/// temporary array.
#[derive(Debug)]
pub struct Process {
    pub id: ExpressionId,
    pub steps: Vec<Step>,
    pub(crate) slots: Vec<LocalSlot>,
    pub(crate) scratch: RefCell<Vec<f64>>,
    pub(crate) separator: char,
}

impl Process {
    pub(crate) fn new(id: ExpressionId, steps: Vec<Step>, slots: Vec<LocalSlot>, separator: char) -> Self {
        let scratch = RefCell::new(vec![0.0; slots.len() + 1]);
        Self {
            id,
            steps,
            slots,
            scratch,
            separator,
        }
    }

    /// Local slots in raw-id order; the first one is always `return`
    pub fn slots(&self) -> &[LocalSlot] {
        &self.slots
    }

    /// Global identifiers assigned by this process
    pub fn global_targets(&self) -> Vec<Id> {
        let mut targets = Vec::new();
        for step in &self.steps {
            if let Step::Assign(operation) = step {
                if let Some(global) = self.global_of(operation.target) {
                    if !targets.contains(&global) {
                        targets.push(global);
                    }
                }
            }
        }
        targets
    }

    pub(crate) fn global_of(&self, local: Id) -> Option<Id> {
        let index = usize::try_from(local.raw()).ok()?.checked_sub(1)?;
        self.slots.get(index).and_then(|slot| slot.global)
    }
}

fn write_joined<T: fmt::Display>(f: &mut fmt::Formatter<'_>, items: &[T], separator: char) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            write!(f, "{}", separator)?;
        }
        write!(f, "{}", item)?;
    }
    Ok(())
}

impl fmt::Display for FormulaNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FormulaNode::Constant(value) => write!(f, "{}", value),
            FormulaNode::Identifier { name, .. } => write!(f, "{}", name),
            FormulaNode::Binary(left, op, right) => write!(f, "({}{}{})", left, op.symbol(), right),
            FormulaNode::Negate(inner) => write!(f, "-{}", inner),
            FormulaNode::Call(call) => write!(f, "{}", call),
        }
    }
}

impl fmt::Display for FunctionCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.name)?;
        if let CallKind::If(condition) = &self.kind {
            write!(f, "{}", condition)?;
            if !self.args.is_empty() {
                write!(f, ",")?;
            }
        }
        write_joined(f, &self.args, ',')?;
        write!(f, ")")
    }
}

impl fmt::Display for ConditionNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConditionNode::Literal(value) => write!(f, "{}", value),
            ConditionNode::Comparison(left, op, right) => write!(f, "({}{}{})", left, op.symbol(), right),
            ConditionNode::Logic(left, op, right) => write!(f, "({}{}{})", left, op.symbol(), right),
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.name, self.op.symbol(), self.value)
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Step::Assign(operation) => write!(f, "{}", operation),
            Step::Return {
                condition: Some(condition),
                value,
            } => write!(f, "Return({},{})", condition, value),
            Step::Return { condition: None, value } => write!(f, "Return({})", value),
        }
    }
}

impl fmt::Display for Formula {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.root)
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.root)
    }
}

impl fmt::Display for OperationSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_joined(f, &self.operations, self.separator)
    }
}

impl fmt::Display for Process {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_joined(f, &self.steps, self.separator)
    }
}
