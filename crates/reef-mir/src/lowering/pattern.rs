//! Lowering of `match` and `matches`.
//!
//! Patterns are compiled into a decision tree. Each arm becomes a [`Row`]:
//! the variant tests its pattern needs, keyed by the place they read, and the
//! variables it binds. The tree switches on the `_variantIdentifier` of the
//! first row's first tested place, specializes the rows for every variant that
//! some row tests, and recurses into the case blocks. Rows that do not test
//! that place follow the `otherwise` edge. Sub-patterns read fields of the
//! scrutinee's place directly, so the scrutinee is evaluated exactly once.

use indexmap::IndexMap;
use reef_types::TypedMatchArm;
use rustc_hash::FxHashMap;

use super::blocks::{BlockRef, PendingTerminator};
use super::types::tuple_member_name;
use super::*;

/// One candidate arm with the tests still to perform.
#[derive(Debug, Clone)]
struct Row<'p> {
    /// Variant patterns and the places they are matched against, left to right
    tests: Vec<(Place, &'p TypedPattern)>,
    bindings: Vec<(VariableId, Place)>,
    arm: usize,
}

impl<'p> Row<'p> {
    fn new(arm: usize, place: Place, pattern: &'p TypedPattern) -> Result<Self, LoweringError> {
        let mut row = Self {
            tests: Vec::new(),
            bindings: Vec::new(),
            arm,
        };
        flatten(place, pattern, &mut row.tests, &mut row.bindings)?;
        Ok(row)
    }

    fn test_position(&self, place: &Place) -> Option<usize> {
        self.tests.iter().position(|(tested, _)| tested == place)
    }
}

/// Splits `pattern`, matched against `place`, into variant tests and bindings.
/// Discards produce neither.
fn flatten<'p>(
    place: Place,
    pattern: &'p TypedPattern,
    tests: &mut Vec<(Place, &'p TypedPattern)>,
    bindings: &mut Vec<(VariableId, Place)>,
) -> Result<(), LoweringError> {
    match &pattern.kind {
        TypedPatternKind::Discard | TypedPatternKind::Type { binding: None } => {}
        TypedPatternKind::Variable(variable)
        | TypedPatternKind::Type {
            binding: Some(variable),
        } => bindings.push((*variable, place)),
        TypedPatternKind::Class { fields, binding, .. } => {
            if let Some(variable) = binding {
                bindings.push((*variable, place.clone()));
            }
            for field in fields {
                flatten(place.clone().class_field(field.name.clone()), &field.pattern, tests, bindings)?;
            }
        }
        TypedPatternKind::UnionVariant { binding, .. }
        | TypedPatternKind::UnionTupleVariant { binding, .. }
        | TypedPatternKind::UnionClassVariant { binding, .. } => {
            if let Some(variable) = binding {
                bindings.push((*variable, place.clone()));
            }
            tests.push((place, pattern));
        }
        TypedPatternKind::Unknown => {
            return Err(LoweringError::Internal("pattern failed type checking".into()));
        }
    }
    Ok(())
}

/// The union and variant index a variant pattern tests.
fn variant_test(pattern: &TypedPattern) -> Result<(TypeDefId, usize), LoweringError> {
    match &pattern.kind {
        TypedPatternKind::UnionVariant { union, variant, .. }
        | TypedPatternKind::UnionTupleVariant { union, variant, .. }
        | TypedPatternKind::UnionClassVariant { union, variant, .. } => Ok((*union, *variant)),
        other => Err(LoweringError::Internal(format!("{other:?} does not test a variant"))),
    }
}

/// The rows that remain possible once the value at `place` is known to be
/// `variant`, with that variant's sub-patterns expanded in place.
fn specialize<'p>(
    rows: &[Row<'p>],
    place: &Place,
    variant: usize,
    variant_name: &str,
) -> Result<Vec<Row<'p>>, LoweringError> {
    let mut specialized = Vec::with_capacity(rows.len());
    for row in rows {
        let Some(position) = row.test_position(place) else {
            specialized.push(row.clone());
            continue;
        };
        let pattern: &'p TypedPattern = row.tests[position].1;
        if variant_test(pattern)?.1 != variant {
            continue;
        }

        let mut row = row.clone();
        row.tests.remove(position);
        let mut sub_tests = Vec::new();
        match &pattern.kind {
            TypedPatternKind::UnionTupleVariant { members, .. } => {
                for (index, member) in members.iter().enumerate() {
                    let member_place = place.clone().field(tuple_member_name(index), variant_name);
                    flatten(member_place, member, &mut sub_tests, &mut row.bindings)?;
                }
            }
            TypedPatternKind::UnionClassVariant { fields, .. } => {
                for field in fields {
                    let field_place = place.clone().field(field.name.clone(), variant_name);
                    flatten(field_place, &field.pattern, &mut sub_tests, &mut row.bindings)?;
                }
            }
            _ => {}
        }
        row.tests.splice(position..position, sub_tests);
        specialized.push(row);
    }
    Ok(specialized)
}

impl<'a> FunctionLoweringContext<'a> {
    pub(super) fn lower_match(
        &mut self,
        value: &TypedExpr,
        arms: &[TypedMatchArm],
        destination: Option<Place>,
    ) -> Result<(), LoweringError> {
        let Some(first) = arms.first() else {
            return self.lower_statement(value);
        };
        if first.pattern.is_irrefutable() {
            self.lower_irrefutable(value, &first.pattern)?;
            return self.lower_arm(&first.expression, destination);
        }

        let place = self.lower_place(value)?;
        let rows = arms
            .iter()
            .enumerate()
            .map(|(index, arm)| Row::new(index, place.clone(), &arm.pattern))
            .collect::<Result<Vec<_>, _>>()?;
        log::trace!("compiling match with {} arms", rows.len());

        let join = self.blocks.reserve();
        let mut arm_blocks = FxHashMap::default();
        self.compile_rows(rows, join, &mut arm_blocks, &mut |this, arm| {
            this.lower_arm(&arms[arm].expression, destination.clone())?;
            this.blocks.goto_if_open(join)
        })?;
        self.blocks.place(join)
    }

    /// Stores whether `value` matches `pattern` in `destination`.
    ///
    /// `true` is stored up front. The success path stores it again and every
    /// failed test jumps to one shared block storing `false`.
    pub(super) fn lower_matches(
        &mut self,
        value: &TypedExpr,
        pattern: &TypedPattern,
        destination: Place,
    ) -> Result<(), LoweringError> {
        if pattern.is_irrefutable() {
            self.lower_irrefutable(value, pattern)?;
            return self.assign(destination, Rvalue::Use(Operand::BoolConstant(true)));
        }

        let place = self.lower_place(value)?;
        self.assign(destination.clone(), Rvalue::Use(Operand::BoolConstant(true)))?;
        let join = self.blocks.reserve();
        let fail = self.blocks.reserve();
        let row = Row::new(0, place, pattern)?;
        self.compile_rows(vec![row], fail, &mut FxHashMap::default(), &mut |this, _| {
            this.assign(destination.clone(), Rvalue::Use(Operand::BoolConstant(true)))?;
            this.blocks.goto_if_open(join)
        })?;

        if self.blocks.is_referenced(fail) {
            self.blocks.place(fail)?;
            self.assign(destination, Rvalue::Use(Operand::BoolConstant(false)))?;
            self.blocks.goto_if_open(join)?;
        }
        self.blocks.place(join)
    }

    /// A pattern that cannot fail: evaluates `value` and makes the bindings,
    /// without any branching.
    fn lower_irrefutable(&mut self, value: &TypedExpr, pattern: &TypedPattern) -> Result<(), LoweringError> {
        match &pattern.kind {
            TypedPatternKind::Variable(variable)
            | TypedPatternKind::Type {
                binding: Some(variable),
            } => {
                let target = self.variable_place(*variable)?;
                self.lower_into(value, target)
            }
            TypedPatternKind::Discard | TypedPatternKind::Type { binding: None } => self.lower_statement(value),
            _ => {
                let place = self.lower_place(value)?;
                let mut tests = Vec::new();
                let mut bindings = Vec::new();
                flatten(place, pattern, &mut tests, &mut bindings)?;
                if !tests.is_empty() {
                    return Err(LoweringError::Internal("irrefutable pattern tests a variant".into()));
                }
                self.bind(bindings)
            }
        }
    }

    fn lower_arm(&mut self, body: &TypedExpr, destination: Option<Place>) -> Result<(), LoweringError> {
        match destination {
            Some(destination) => self.lower_into(body, destination),
            None => self.lower_statement(body),
        }
    }

    fn bind(&mut self, bindings: Vec<(VariableId, Place)>) -> Result<(), LoweringError> {
        for (variable, place) in bindings {
            let target = self.variable_place(variable)?;
            self.assign(target, Rvalue::Use(Operand::Copy(place)))?;
        }
        Ok(())
    }

    /// Emits the decision tree for `rows` starting in the current block.
    /// Values no row accepts continue at `fail`.
    fn compile_rows<'p, F>(
        &mut self,
        mut rows: Vec<Row<'p>>,
        fail: BlockRef,
        arm_blocks: &mut FxHashMap<usize, BlockRef>,
        emit_arm: &mut F,
    ) -> Result<(), LoweringError>
    where
        F: FnMut(&mut Self, usize) -> Result<(), LoweringError>,
    {
        let Some(first) = rows.first() else {
            return self.blocks.terminate(PendingTerminator::GoTo(fail));
        };
        let Some((place, pattern)) = first.tests.first().cloned() else {
            let row = rows.swap_remove(0);
            if let Some(block) = arm_blocks.get(&row.arm) {
                return self.blocks.terminate(PendingTerminator::GoTo(*block));
            }
            if self.blocks.is_empty() {
                arm_blocks.insert(row.arm, self.blocks.current());
            }
            self.bind(row.bindings)?;
            return emit_arm(self, row.arm);
        };

        // Rows after one that tests nothing can never be reached
        if let Some(catch_all) = rows.iter().position(|row| row.tests.is_empty()) {
            rows.truncate(catch_all + 1);
        }

        let (union, _) = variant_test(pattern)?;
        let mut tested: Vec<usize> = Vec::new();
        for row in &rows {
            if let Some(position) = row.test_position(&place) {
                let (_, variant) = variant_test(row.tests[position].1)?;
                if !tested.contains(&variant) {
                    tested.push(variant);
                }
            }
        }
        let defaults: Vec<Row<'p>> = rows.iter().filter(|r| r.test_position(&place).is_none()).cloned().collect();

        let first_variant = self.variant_name(union, 0)?;
        let cases: Vec<(usize, BlockRef)> = tested.iter().map(|v| (*v, self.blocks.reserve())).collect();
        let otherwise = if defaults.is_empty() { fail } else { self.blocks.reserve() };
        self.blocks.terminate(PendingTerminator::SwitchInt {
            operand: Operand::Copy(place.clone().field(VARIANT_IDENTIFIER_FIELD, first_variant)),
            cases: cases.iter().map(|(v, block)| (*v as u64, *block)).collect::<IndexMap<_, _>>(),
            otherwise,
        })?;

        for (variant, block) in cases {
            self.blocks.place(block)?;
            let name = self.variant_name(union, variant)?;
            let specialized = specialize(&rows, &place, variant, &name)?;
            self.compile_rows(specialized, fail, arm_blocks, emit_arm)?;
        }
        if !defaults.is_empty() {
            self.blocks.place(otherwise)?;
            self.compile_rows(defaults, fail, arm_blocks, emit_arm)?;
        }
        Ok(())
    }
}
