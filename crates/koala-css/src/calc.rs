//! `calc()` expression evaluation.
//!
//! [CSS Values and Units Level 4 § 10.2](https://www.w3.org/TR/css-values-4/#calc-internal)
//! parses `calc()` into a tree and then canonicalizes it; the grammar itself
//! admits arbitrary nesting and nested function calls (`min()`, `max()`,
//! `clamp()`). Keeping the whole grammar here would dwarf the rest of the
//! value layer, so this module covers the common operator subset — `+`,
//! `-`, `*`, `/`, `min`, `max`, `clamp` — compiled ahead of time into a flat
//! postfix (RPN) instruction stream that [`Expr::eval`] walks with an
//! explicit stack, rather than recursing over a tree at evaluation time.
//!
//! Mixing categories (adding a length to an angle) is an evaluation
//! error, caught by [`Op::Add`]/[`Op::Sub`]'s category check.
//! Multiplication needs a bare number on exactly one side, and division's
//! divisor must be a bare number; compiled programs are interned
//! ([`intern`]) so byte-identical sources share one allocation.

use crate::token::Token;
use crate::unit::{Dimension, Unit, UnitCategory, UnitContext};
use crate::value::{BlockDelimiter, ComponentValue};
use koala_common::fixed::Fixed;
use std::cell::RefCell;
use std::rc::Rc;

/// A single instruction in a compiled `calc()` expression's postfix stream.
#[derive(Debug, Clone, Copy, PartialEq, Hash)]
pub enum Instr {
    /// Push a literal dimensioned value.
    Push(Dimension),
    /// Pop two operands, apply `op`, push the result.
    Op(Op),
}

/// A `calc()` binary operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    /// `a + b` — operands must share a [`UnitCategory`].
    Add,
    /// `a - b` — operands must share a [`UnitCategory`].
    Sub,
    /// `a * b` — exactly one operand must be [`UnitCategory::Number`].
    Mul,
    /// `a / b` — the divisor must be [`UnitCategory::Number`].
    Div,
    /// `min(a, b)` — operands must share a [`UnitCategory`].
    Min,
    /// `max(a, b)` — operands must share a [`UnitCategory`].
    Max,
}

/// A compiled `calc()` expression, ready for repeated evaluation (e.g. once
/// per resize, with the viewport-relative operands pre-resolved to `px`
/// before evaluation).
#[derive(Debug, Clone, PartialEq, Hash)]
pub struct Expr {
    instructions: Vec<Instr>,
}

/// Why a compiled `calc()` expression failed to evaluate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EvalError {
    /// The instruction stream popped an operand from an empty stack —
    /// malformed postfix form.
    StackUnderflow,
    /// Evaluation produced something other than exactly one value.
    NotSingleValue,
    /// `+`/`-`/`min`/`max` was applied to operands of different categories.
    CategoryMismatch,
    /// `*`/`/` was applied to two dimensioned (non-number) operands.
    NotANumber,
    /// Division by a literal zero.
    DivideByZero,
    /// `+`/`-`/`min`/`max` was applied to two operands that share a
    /// [`UnitCategory`] but neither unit converts to a fixed ratio of the
    /// other (e.g. `1em + 1vh`) — normalizing them needs font-size/viewport
    /// context this module doesn't have.
    UnresolvedRelativeUnits,
}

impl Expr {
    /// Build an expression directly from a postfix instruction stream.
    /// [`compile`] is the usual entry point; this exists for callers
    /// (and tests) that already hold RPN form.
    #[must_use]
    pub const fn from_instructions(instructions: Vec<Instr>) -> Self {
        Self { instructions }
    }

    /// A single literal, with no operators — the common case for a
    /// `calc()` that folds to a constant at parse time.
    #[must_use]
    pub fn literal(dimension: Dimension) -> Self {
        Self {
            instructions: vec![Instr::Push(dimension)],
        }
    }

    /// Evaluate the expression, producing a single [`Dimension`].
    ///
    /// # Errors
    ///
    /// Returns [`EvalError`] if the instruction stream is malformed or an
    /// operator is applied to incompatible operands.
    pub fn eval(&self) -> Result<Dimension, EvalError> {
        self.run(None)
    }

    /// Evaluate with a resolving context: every pushed operand is first
    /// normalized to its category's canonical unit (`em`, `rem`, viewport
    /// units, and `%` become px via `ctx`), so operands that would be
    /// [`EvalError::UnresolvedRelativeUnits`] under [`Expr::eval`] combine
    /// cleanly here.
    ///
    /// `font_size` is the `em` reference in px; `percent_ref` the `%`
    /// reference length, or `None` when percentages can't be resolved yet
    /// (keeping them symbolic until a layout-dependent reference exists).
    ///
    /// # Errors
    ///
    /// Returns [`EvalError`] on malformed streams, incompatible operands,
    /// or an operand the context can't normalize.
    pub fn eval_in(
        &self,
        ctx: &UnitContext,
        font_size: Fixed,
        percent_ref: Option<Fixed>,
    ) -> Result<Dimension, EvalError> {
        self.run(Some((ctx, font_size, percent_ref)))
    }

    fn run(
        &self,
        resolve: Option<(&UnitContext, Fixed, Option<Fixed>)>,
    ) -> Result<Dimension, EvalError> {
        let mut stack: Vec<Dimension> = Vec::new();
        for instr in &self.instructions {
            match instr {
                Instr::Push(dim) => {
                    let dim = match resolve {
                        Some((ctx, font_size, percent_ref)) => ctx
                            .to_base(*dim, font_size, percent_ref)
                            .ok_or(EvalError::UnresolvedRelativeUnits)?,
                        None => *dim,
                    };
                    stack.push(dim);
                }
                Instr::Op(op) => {
                    let rhs = stack.pop().ok_or(EvalError::StackUnderflow)?;
                    let lhs = stack.pop().ok_or(EvalError::StackUnderflow)?;
                    stack.push(apply(*op, lhs, rhs)?);
                }
            }
        }
        match stack.len() {
            1 => Ok(stack[0]),
            _ => Err(EvalError::NotSingleValue),
        }
    }
}

fn apply(op: Op, lhs: Dimension, rhs: Dimension) -> Result<Dimension, EvalError> {
    match op {
        Op::Add | Op::Sub | Op::Min | Op::Max => {
            if lhs.unit.category() != rhs.unit.category() {
                return Err(EvalError::CategoryMismatch);
            }
            let (lhs_value, rhs_value, unit) = normalize_operands(lhs, rhs)?;
            let value = match op {
                Op::Add => lhs_value + rhs_value,
                Op::Sub => lhs_value - rhs_value,
                Op::Min => {
                    if lhs_value.to_f64() <= rhs_value.to_f64() {
                        lhs_value
                    } else {
                        rhs_value
                    }
                }
                Op::Max => {
                    if lhs_value.to_f64() >= rhs_value.to_f64() {
                        lhs_value
                    } else {
                        rhs_value
                    }
                }
                Op::Mul | Op::Div => unreachable!("handled in outer match"),
            };
            Ok(Dimension { value, unit })
        }
        Op::Mul => {
            let (number, dimensioned) = pick_number_operand(lhs, rhs)?;
            Ok(Dimension {
                value: dimensioned.value * number,
                unit: dimensioned.unit,
            })
        }
        Op::Div => {
            if rhs.unit.category() != UnitCategory::Number {
                return Err(EvalError::NotANumber);
            }
            if rhs.value.is_zero() {
                return Err(EvalError::DivideByZero);
            }
            Ok(Dimension {
                value: lhs.value / rhs.value,
                unit: lhs.unit,
            })
        }
    }
}

/// [§ 10.2](https://www.w3.org/TR/css-values-4/#calc-internal): "lengths →
/// px ... before arithmetic". `lhs`/`rhs` are already known to share a
/// category; if their units differ, convert both to that category's
/// canonical unit via [`Unit::absolute_factor`] before combining, so
/// `10px + 1in` adds in a common unit (`106px`) rather than summing raw
/// magnitudes across units. Units with no fixed ratio to their canonical
/// unit (`em`, `%`, viewport units, ...) can't be normalized here — this
/// module has no font-size/viewport context — so mixing one of those with
/// a different unit in the same category is rejected.
fn normalize_operands(lhs: Dimension, rhs: Dimension) -> Result<(Fixed, Fixed, Unit), EvalError> {
    if lhs.unit == rhs.unit {
        return Ok((lhs.value, rhs.value, lhs.unit));
    }
    match (lhs.unit.absolute_factor(), rhs.unit.absolute_factor()) {
        (Some(lhs_factor), Some(rhs_factor)) => {
            let canonical = lhs.unit.category().canonical_unit();
            Ok((lhs.value * lhs_factor, rhs.value * rhs_factor, canonical))
        }
        _ => Err(EvalError::UnresolvedRelativeUnits),
    }
}

/// Pick out which of `lhs`/`rhs` is the unitless number operand for a
/// multiplication, so `2 * 3px` and `3px * 2` both resolve the same way.
/// Exactly one side must be a plain number: a number-by-number product has
/// no dimensioned side to carry the result's unit and is rejected, as is a
/// dimension-by-dimension product.
fn pick_number_operand(lhs: Dimension, rhs: Dimension) -> Result<(Fixed, Dimension), EvalError> {
    match (lhs.unit.category(), rhs.unit.category()) {
        (UnitCategory::Number, UnitCategory::Number) => Err(EvalError::NotANumber),
        (UnitCategory::Number, _) => Ok((lhs.value, rhs)),
        (_, UnitCategory::Number) => Ok((rhs.value, lhs)),
        _ => Err(EvalError::NotANumber),
    }
}

/// An interned, shared handle to a compiled `calc()` program.
///
/// Compiling the same token sequence twice hands back handles to the
/// *same* allocation: [`CalcRef::ptr_eq`] holds whenever the instruction
/// streams are byte-identical, which is what lets computed styles built
/// from the same source share storage in the arena.
#[derive(Debug, Clone)]
pub struct CalcRef(Rc<Expr>);

impl CalcRef {
    /// The compiled program.
    #[must_use]
    pub fn expr(&self) -> &Expr {
        &self.0
    }

    /// Whether two handles share the same interned program allocation.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl PartialEq for CalcRef {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0) || self.0 == other.0
    }
}

impl std::hash::Hash for CalcRef {
    // Hashes the program, not the pointer, so two handles that compare
    // equal through the deep-equality arm above also hash equal.
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.0.hash(state);
    }
}

thread_local! {
    static EXPR_TABLE: RefCell<Vec<std::rc::Weak<Expr>>> = const { RefCell::new(Vec::new()) };
}

/// Intern a compiled expression, deduplicating against every live program
/// on this thread. The table holds weak references only, so a program
/// whose last [`CalcRef`] drops is pruned on the next intern.
#[must_use]
pub fn intern(expr: Expr) -> CalcRef {
    EXPR_TABLE.with(|table| {
        let mut table = table.borrow_mut();
        table.retain(|weak| weak.strong_count() > 0);
        for weak in table.iter() {
            if let Some(existing) = weak.upgrade() {
                if *existing == expr {
                    return CalcRef(existing);
                }
            }
        }
        let rc = Rc::new(expr);
        table.push(Rc::downgrade(&rc));
        CalcRef(rc)
    })
}

/// Compile the contents of a `calc(...)` function into an interned postfix
/// program, or `None` when the expression doesn't fit the grammar
/// (unbalanced operators, an operand kind `calc()` doesn't admit, unknown
/// units).
///
/// Grammar, standard precedence (`*`/`/` bind tighter than `+`/`-`):
///
/// ```text
/// sum     := product ( ('+'|'-') product )*
/// product := operand ( ('*'|'/') operand )*
/// operand := NUMBER | DIMENSION | PERCENTAGE
///         |  '(' sum ')' | calc(sum) | min(sum, sum...) | max(sum, sum...)
///         |  clamp(sum, sum, sum)
/// ```
#[must_use]
pub fn compile(args: &[ComponentValue]) -> Option<CalcRef> {
    let mut instructions = Vec::new();
    let mut parser = CalcParser { input: args, position: 0 };
    parser.sum(&mut instructions)?;
    parser.skip_whitespace();
    if parser.position != parser.input.len() {
        return None;
    }
    Some(intern(Expr::from_instructions(instructions)))
}

struct CalcParser<'a> {
    input: &'a [ComponentValue],
    position: usize,
}

impl CalcParser<'_> {
    fn skip_whitespace(&mut self) {
        while matches!(
            self.input.get(self.position),
            Some(ComponentValue::Token(Token::Whitespace))
        ) {
            self.position += 1;
        }
    }

    fn peek_delim(&mut self) -> Option<char> {
        self.skip_whitespace();
        match self.input.get(self.position) {
            Some(ComponentValue::Token(Token::Delim(c))) => Some(*c),
            _ => None,
        }
    }

    fn sum(&mut self, out: &mut Vec<Instr>) -> Option<()> {
        self.product(out)?;
        while let Some(op @ ('+' | '-')) = self.peek_delim() {
            self.position += 1;
            self.product(out)?;
            out.push(Instr::Op(if op == '+' { Op::Add } else { Op::Sub }));
        }
        Some(())
    }

    fn product(&mut self, out: &mut Vec<Instr>) -> Option<()> {
        self.operand(out)?;
        while let Some(op @ ('*' | '/')) = self.peek_delim() {
            self.position += 1;
            self.operand(out)?;
            out.push(Instr::Op(if op == '*' { Op::Mul } else { Op::Div }));
        }
        Some(())
    }

    fn operand(&mut self, out: &mut Vec<Instr>) -> Option<()> {
        self.skip_whitespace();
        let cv = self.input.get(self.position)?;
        self.position += 1;
        match cv {
            ComponentValue::Token(Token::Number { value, .. }) => {
                out.push(Instr::Push(Dimension { value: *value, unit: Unit::Number }));
                Some(())
            }
            ComponentValue::Token(Token::Percentage { value, .. }) => {
                out.push(Instr::Push(Dimension { value: *value, unit: Unit::Percent }));
                Some(())
            }
            ComponentValue::Token(Token::Dimension { value, unit, .. }) => {
                let unit = Unit::from_keyword(unit.as_str())?;
                out.push(Instr::Push(Dimension { value: *value, unit }));
                Some(())
            }
            ComponentValue::Block { open: BlockDelimiter::Paren, value } => {
                nested_sum(value, out)
            }
            ComponentValue::Function { name, value } if name.eq_ignore_ascii_case("calc") => {
                nested_sum(value, out)
            }
            ComponentValue::Function { name, value }
                if name.eq_ignore_ascii_case("min") || name.eq_ignore_ascii_case("max") =>
            {
                let op = if name.eq_ignore_ascii_case("min") { Op::Min } else { Op::Max };
                let branches = split_arguments(value);
                if branches.is_empty() {
                    return None;
                }
                for (i, branch) in branches.iter().enumerate() {
                    nested_sum(branch, out)?;
                    if i > 0 {
                        out.push(Instr::Op(op));
                    }
                }
                Some(())
            }
            ComponentValue::Function { name, value } if name.eq_ignore_ascii_case("clamp") => {
                // clamp(MIN, VAL, MAX) == max(MIN, min(VAL, MAX))
                let branches = split_arguments(value);
                let [min_branch, val_branch, max_branch] = branches.as_slice() else {
                    return None;
                };
                nested_sum(min_branch, out)?;
                nested_sum(val_branch, out)?;
                nested_sum(max_branch, out)?;
                out.push(Instr::Op(Op::Min));
                out.push(Instr::Op(Op::Max));
                Some(())
            }
            _ => None,
        }
    }
}

fn nested_sum(input: &[ComponentValue], out: &mut Vec<Instr>) -> Option<()> {
    let mut parser = CalcParser { input, position: 0 };
    parser.sum(out)?;
    parser.skip_whitespace();
    if parser.position == input.len() { Some(()) } else { None }
}

/// Split a function's argument component values on top-level commas.
fn split_arguments(values: &[ComponentValue]) -> Vec<Vec<ComponentValue>> {
    let mut out = vec![Vec::new()];
    for cv in values {
        if matches!(cv, ComponentValue::Token(Token::Comma)) {
            out.push(Vec::new());
        } else {
            out.last_mut().expect("starts non-empty").push(cv.clone());
        }
    }
    out.retain(|arg| {
        arg.iter()
            .any(|cv| !matches!(cv, ComponentValue::Token(Token::Whitespace)))
    });
    out
}

/// Sum a clamp's three operands in the `clamp(min, val, max)` shape: the
/// result is `val` bounded below by `min` and above by `max`, independent
/// of the order `min`/`max` are actually supplied in.
#[must_use]
pub fn clamp(min: Dimension, value: Dimension, max: Dimension) -> Option<Dimension> {
    if min.unit.category() != value.unit.category() || value.unit.category() != max.unit.category()
    {
        return None;
    }
    let v = value.value.to_f64().max(min.value.to_f64()).min(max.value.to_f64());
    Some(Dimension {
        value: Fixed::from_f64(v),
        unit: value.unit,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn px(v: f64) -> Dimension {
        Dimension::new(v, Unit::Px)
    }

    fn number(v: f64) -> Dimension {
        Dimension::new(v, Unit::Number)
    }

    #[test]
    fn addition_requires_matching_category() {
        let expr = Expr::from_instructions(vec![
            Instr::Push(px(10.0)),
            Instr::Push(Dimension::new(1.0, Unit::Deg)),
            Instr::Op(Op::Add),
        ]);
        assert_eq!(expr.eval(), Err(EvalError::CategoryMismatch));
    }

    #[test]
    fn addition_sums_same_category() {
        let expr = Expr::from_instructions(vec![
            Instr::Push(px(10.0)),
            Instr::Push(px(5.0)),
            Instr::Op(Op::Add),
        ]);
        assert_eq!(expr.eval().unwrap().value.to_f64(), 15.0);
    }

    #[test]
    fn multiplication_by_bare_number_scales() {
        let expr = Expr::from_instructions(vec![
            Instr::Push(px(10.0)),
            Instr::Push(number(3.0)),
            Instr::Op(Op::Mul),
        ]);
        let result = expr.eval().unwrap();
        assert_eq!(result.value.to_f64(), 30.0);
        assert_eq!(result.unit, Unit::Px);
    }

    #[test]
    fn division_by_dimensioned_value_rejected() {
        let expr = Expr::from_instructions(vec![
            Instr::Push(px(10.0)),
            Instr::Push(px(2.0)),
            Instr::Op(Op::Div),
        ]);
        assert_eq!(expr.eval(), Err(EvalError::NotANumber));
    }

    #[test]
    fn division_by_zero_is_rejected_not_inf() {
        let expr = Expr::from_instructions(vec![
            Instr::Push(px(10.0)),
            Instr::Push(number(0.0)),
            Instr::Op(Op::Div),
        ]);
        assert_eq!(expr.eval(), Err(EvalError::DivideByZero));
    }

    #[test]
    fn min_and_max_pick_extremes() {
        let min_expr = Expr::from_instructions(vec![
            Instr::Push(px(10.0)),
            Instr::Push(px(4.0)),
            Instr::Op(Op::Min),
        ]);
        assert_eq!(min_expr.eval().unwrap().value.to_f64(), 4.0);

        let max_expr = Expr::from_instructions(vec![
            Instr::Push(px(10.0)),
            Instr::Push(px(4.0)),
            Instr::Op(Op::Max),
        ]);
        assert_eq!(max_expr.eval().unwrap().value.to_f64(), 10.0);
    }

    #[test]
    fn clamp_bounds_value_between_min_and_max() {
        let result = clamp(px(5.0), px(20.0), px(15.0)).unwrap();
        assert_eq!(result.value.to_f64(), 15.0);
    }

    #[test]
    fn addition_normalizes_absolute_units_before_combining() {
        let expr = Expr::from_instructions(vec![
            Instr::Push(px(10.0)),
            Instr::Push(Dimension::new(1.0, Unit::In)),
            Instr::Op(Op::Add),
        ]);
        let result = expr.eval().unwrap();
        assert_eq!(result.unit, Unit::Px);
        assert!((result.value.to_f64() - 106.0).abs() < 0.01);
    }

    #[test]
    fn addition_of_unconvertible_relative_units_is_rejected() {
        let expr = Expr::from_instructions(vec![
            Instr::Push(Dimension::new(1.0, Unit::Em)),
            Instr::Push(Dimension::new(1.0, Unit::Vh)),
            Instr::Op(Op::Add),
        ]);
        assert_eq!(expr.eval(), Err(EvalError::UnresolvedRelativeUnits));
    }

    #[test]
    fn malformed_stream_underflows() {
        let expr = Expr::from_instructions(vec![Instr::Op(Op::Add)]);
        assert_eq!(expr.eval(), Err(EvalError::StackUnderflow));
    }

    #[test]
    fn number_times_number_is_rejected() {
        let expr = Expr::from_instructions(vec![
            Instr::Push(number(2.0)),
            Instr::Push(number(3.0)),
            Instr::Op(Op::Mul),
        ]);
        assert_eq!(expr.eval(), Err(EvalError::NotANumber));
    }

    fn compile_source(source: &str) -> Option<CalcRef> {
        let mut tokens = crate::tokenizer::Tokenizer::new(source).peekable();
        let components = crate::value::parse_component_values(&mut tokens);
        let [ComponentValue::Function { name, value }] = components.as_slice() else {
            panic!("expected a single calc() function in {source:?}");
        };
        assert!(name.eq_ignore_ascii_case("calc"));
        compile(value)
    }

    #[test]
    fn compiles_addition_with_parenthesized_division() {
        let calc = compile_source("calc(10px + (4em / 2))").unwrap();
        let ctx = UnitContext::default();
        let result = calc.expr().eval_in(&ctx, Fixed::from_int(16), None).unwrap();
        assert_eq!(result.unit, Unit::Px);
        assert_eq!(result.value.to_f64(), 42.0);
    }

    #[test]
    fn precedence_binds_product_tighter_than_sum() {
        let calc = compile_source("calc(2px + 3 * 4px)").unwrap();
        assert_eq!(calc.expr().eval().unwrap().value.to_f64(), 14.0);
    }

    #[test]
    fn identical_sources_share_one_interned_program() {
        let a = compile_source("calc(1px + 2px)").unwrap();
        let b = compile_source("calc(1px + 2px)").unwrap();
        assert!(a.ptr_eq(&b));
        let c = compile_source("calc(1px + 3px)").unwrap();
        assert!(!a.ptr_eq(&c));
    }

    #[test]
    fn nested_min_and_clamp_compile() {
        let min = compile_source("calc(min(4px, 9px) + 1px)").unwrap();
        assert_eq!(min.expr().eval().unwrap().value.to_f64(), 5.0);
        let clamped = compile_source("calc(clamp(5px, 20px, 15px))").unwrap();
        assert_eq!(clamped.expr().eval().unwrap().value.to_f64(), 15.0);
    }

    #[test]
    fn dangling_operator_fails_to_compile() {
        assert!(compile_source("calc(10px +)").is_none());
        assert!(compile_source("calc(10bogus)").is_none());
    }

    #[test]
    fn percentage_stays_symbolic_without_a_reference() {
        let calc = compile_source("calc(50% + 10px)").unwrap();
        let ctx = UnitContext::default();
        assert_eq!(
            calc.expr().eval_in(&ctx, Fixed::from_int(16), None),
            Err(EvalError::UnresolvedRelativeUnits)
        );
        let resolved = calc
            .expr()
            .eval_in(&ctx, Fixed::from_int(16), Some(Fixed::from_int(200)))
            .unwrap();
        assert_eq!(resolved.value.to_f64(), 110.0);
    }
}
