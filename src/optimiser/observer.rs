//! Formulation Observer

use good_lp::{Expression, Variable};

/// What an LP variable stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VariableRole {
    /// New quantity of a recipe row, in grams
    Quantity,

    /// Absolute deviation of a recipe row from its current quantity, in grams
    Deviation,

    /// Worst-case fractional cut shared by every row
    Reduction,
}

/// Observer trait for capturing an LP formulation as it's built.
///
/// Lets callers inspect or log the exact model a strategy hands to the solver
/// without re-deriving it. Strategies that do not use the LP never call it.
pub trait FormulationObserver {
    /// Called when a decision variable is created.
    ///
    /// `row` is the recipe row the variable belongs to, `None` for shared variables.
    fn on_variable(&mut self, _role: VariableRole, _row: Option<usize>, _var: Variable) {}

    /// Called when a term is added to the (minimised) objective.
    fn on_objective_term(&mut self, _var: Variable, _coefficient: f64) {}

    /// Called when a `lhs <= rhs` constraint is recorded.
    ///
    /// `kind` names the constraint family (e.g. `"budget"`, `"deviation_above"`).
    fn on_constraint(&mut self, _kind: &'static str, _lhs: &Expression, _rhs: f64) {}
}

/// No-op observer for unobserved solves.
#[derive(Debug, Default)]
pub struct NoopObserver;

impl FormulationObserver for NoopObserver {}

/// Observer that counts what was built; handy for asserting model shape.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct FormulationStats {
    /// Variables created, by role, in creation order
    pub variables: Vec<VariableRole>,

    /// Number of objective terms
    pub objective_terms: usize,

    /// Constraint kinds, in recording order
    pub constraints: Vec<&'static str>,
}

impl FormulationStats {
    /// Number of variables of the given role.
    pub fn count(&self, role: VariableRole) -> usize {
        self.variables.iter().filter(|r| **r == role).count()
    }

    /// Number of constraints of the given kind.
    pub fn constraint_count(&self, kind: &str) -> usize {
        self.constraints.iter().filter(|k| **k == kind).count()
    }
}

impl FormulationObserver for FormulationStats {
    fn on_variable(&mut self, role: VariableRole, _row: Option<usize>, _var: Variable) {
        self.variables.push(role);
    }

    fn on_objective_term(&mut self, _var: Variable, _coefficient: f64) {
        self.objective_terms += 1;
    }

    fn on_constraint(&mut self, kind: &'static str, _lhs: &Expression, _rhs: f64) {
        self.constraints.push(kind);
    }
}
