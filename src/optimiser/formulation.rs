//! LP Formulation
//!
//! Accumulates decision variables, the minimised objective and `<=` constraints, then
//! hands the model to the configured solver backend.

use std::fmt;

use good_lp::{
    Expression, ProblemVariables, Solution, SolverModel, Variable, variable::VariableDefinition,
};

#[cfg(feature = "solver-highs")]
use good_lp::solvers::highs::highs as default_solver;
#[cfg(all(not(feature = "solver-highs"), feature = "solver-microlp"))]
use good_lp::solvers::microlp::microlp as default_solver;

use crate::optimiser::{
    OptimiserError,
    observer::{FormulationObserver, VariableRole},
};

/// Recorded `lhs <= rhs` constraint.
#[derive(Debug, Clone)]
pub(crate) struct Constraint {
    /// Constraint family, for observers and logs
    pub(crate) kind: &'static str,

    /// Left-hand side expression
    pub(crate) lhs: Expression,

    /// Right-hand side scalar
    pub(crate) rhs: f64,
}

/// Builder state for one LP solve.
pub struct Formulation {
    pb: ProblemVariables,
    objective: Expression,
    variables: usize,
    constraints: Vec<Constraint>,
}

impl fmt::Debug for Formulation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Formulation")
            .field("pb", &"<ProblemVariables>")
            .field("objective", &"<Expression>")
            .field("variables", &self.variables)
            .field(
                "constraints",
                &format!("[{} constraints]", self.constraints.len()),
            )
            .finish()
    }
}

impl Default for Formulation {
    fn default() -> Self {
        Self::new()
    }
}

impl Formulation {
    /// Empty formulation with a zero objective.
    pub fn new() -> Self {
        Self {
            pb: ProblemVariables::new(),
            objective: Expression::default(),
            variables: 0,
            constraints: Vec::new(),
        }
    }

    /// Adds a decision variable and reports it to `observer`.
    pub fn add_variable<O: FormulationObserver + ?Sized>(
        &mut self,
        definition: VariableDefinition,
        role: VariableRole,
        row: Option<usize>,
        observer: &mut O,
    ) -> Variable {
        let var = self.pb.add(definition);

        self.variables += 1;
        observer.on_variable(role, row, var);

        var
    }

    /// Adds `coefficient * var` to the minimised objective.
    pub fn add_to_objective<O: FormulationObserver + ?Sized>(
        &mut self,
        var: Variable,
        coefficient: f64,
        observer: &mut O,
    ) {
        self.objective += var * coefficient;

        observer.on_objective_term(var, coefficient);
    }

    /// Records `lhs <= rhs`.
    pub fn add_leq_constraint<O: FormulationObserver + ?Sized>(
        &mut self,
        kind: &'static str,
        lhs: Expression,
        rhs: f64,
        observer: &mut O,
    ) {
        observer.on_constraint(kind, &lhs, rhs);

        self.constraints.push(Constraint { kind, lhs, rhs });
    }

    /// Number of decision variables added so far
    pub fn variable_count(&self) -> usize {
        self.variables
    }

    /// Number of constraints recorded so far
    pub fn constraint_count(&self) -> usize {
        self.constraints.len()
    }

    /// Minimises the objective subject to every recorded constraint.
    ///
    /// # Errors
    ///
    /// Returns [`OptimiserError::Resolution`] if the solver reports the model
    /// infeasible, unbounded or fails outright.
    pub fn solve(self) -> Result<impl Solution, OptimiserError> {
        let Self {
            pb,
            objective,
            variables,
            constraints,
        } = self;

        tracing::trace!(
            variables,
            constraints = constraints.len(),
            "solving grammage LP"
        );

        let mut model = pb.minimise(objective).using(default_solver);

        for constraint in constraints {
            tracing::trace!(kind = constraint.kind, rhs = constraint.rhs, "constraint");

            model = model.with(constraint.lhs.leq(constraint.rhs));
        }

        Ok(model.solve()?)
    }
}

#[cfg(test)]
mod tests {
    use good_lp::variable;
    use testresult::TestResult;

    use crate::optimiser::observer::{FormulationStats, NoopObserver};

    use super::*;

    #[test]
    fn debug_reports_sizes() {
        let formulation = Formulation::new();

        let formatted = format!("{formulation:?}");

        assert!(formatted.contains("Formulation"));
        assert!(formatted.contains("0 constraints"));
    }

    #[test]
    fn solves_a_bounded_minimisation() -> TestResult {
        let mut observer = NoopObserver;
        let mut formulation = Formulation::new();

        let x = formulation.add_variable(
            variable().min(0.0),
            VariableRole::Quantity,
            Some(0),
            &mut observer,
        );

        formulation.add_to_objective(x, -1.0, &mut observer);
        formulation.add_leq_constraint("cap", Expression::from(x), 4.0, &mut observer);

        let solution = formulation.solve()?;

        assert!((solution.value(x) - 4.0).abs() < 1e-6);

        Ok(())
    }

    #[test]
    fn infeasible_model_surfaces_resolution_error() {
        let mut observer = NoopObserver;
        let mut formulation = Formulation::new();

        let x = formulation.add_variable(
            variable().min(5.0),
            VariableRole::Quantity,
            Some(0),
            &mut observer,
        );

        formulation.add_to_objective(x, 1.0, &mut observer);
        formulation.add_leq_constraint("cap", Expression::from(x), 1.0, &mut observer);

        assert!(matches!(
            formulation.solve(),
            Err(OptimiserError::Resolution(_))
        ));
    }

    #[test]
    fn observer_sees_every_building_step() {
        let mut stats = FormulationStats::default();
        let mut formulation = Formulation::new();

        let q = formulation.add_variable(
            variable().min(5.0),
            VariableRole::Quantity,
            Some(0),
            &mut stats,
        );
        let r = formulation.add_variable(
            variable().min(0.0).max(1.0),
            VariableRole::Reduction,
            None,
            &mut stats,
        );

        formulation.add_to_objective(r, 1.0, &mut stats);
        formulation.add_leq_constraint("budget", Expression::from(q), 10.0, &mut stats);

        assert_eq!(formulation.variable_count(), 2);
        assert_eq!(formulation.constraint_count(), 1);
        assert_eq!(stats.count(VariableRole::Reduction), 1);
        assert_eq!(stats.objective_terms, 1);
        assert_eq!(stats.constraints, vec!["budget"]);
    }
}
