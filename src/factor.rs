//! Definition of the factor module
//!
//! A `Factor` represents a relationship between some set of `Variable`s. It is stored as a dense
//! table with one axis per `Variable` of its scope, so the value of a complete assignment lives at
//! the row-major (mixed-radix) offset of its state indices.

use crate::util::{PluviaError, Result, TOLERANCE};
use crate::variable::{Assignment, Variable};

use itertools::Itertools;
use ndarray::prelude as nd;
use ndarray::IxDyn;

/// Alias f64 ndarray::Array as Table
pub type Table = nd::ArrayD<f64>;


#[derive(Clone, Debug, PartialEq)]
pub struct Factor {

    /// The scope of the `Factor`, in axis order
    scope: Vec<Variable>,

    /// The values of the `Factor` table.
    table: Table

}


impl Factor {

    /// Get the identity factor: the scalar `1`, with no scope.
    pub fn identity() -> Self {
        Factor { scope: vec![], table: Table::from_elem(IxDyn(&[]), 1.0) }
    }


    /// Create a new `Factor`
    ///
    /// # Errors
    /// * `PluviaError::DuplicateVariable` if a `Variable` appears twice in `scope`
    /// * `PluviaError::DimensionMismatch` if the shape of `table` is not the cardinalities of
    ///   `scope`
    /// * `PluviaError::NegativeValue` if any entry is negative or not finite
    pub fn new(scope: Vec<Variable>, table: Table) -> Result<Self> {
        if let Some(dup) = scope.iter().duplicates().next() {
            return Err(PluviaError::DuplicateVariable(dup.to_string()));
        }

        let expected: Vec<usize> = scope.iter().map(|v| v.cardinality()).collect();
        if expected.as_slice() != table.shape() {
            return Err(PluviaError::DimensionMismatch { expected, found: table.shape().to_vec() });
        }

        // factors may not have negative values
        if table.iter().any(|&v| v < 0.0 || !v.is_finite()) {
            return Err(PluviaError::NegativeValue);
        }

        Ok(Factor { scope, table })
    }


    /// Create a conditional probability distribution ```P(var | parents)```.
    ///
    /// The scope of the resulting `Factor` is ```parents ++ [var]```, so `table` has one axis per
    /// parent followed by the axis of `var`.
    ///
    /// # Errors
    /// Any error of `Factor::new`, or `PluviaError::NotNormalized` if some assignment to the
    /// parents does not sum to one over the states of `var`.
    pub fn cpd(var: Variable, parents: Vec<Variable>, table: Table) -> Result<Self> {
        let mut scope = parents;
        scope.push(var);

        let factor = Factor::new(scope, table)?;

        let sums = factor.conditional_sums(var)?;
        if let Some(bad) = sums.iter().find(|s| (*s - 1.0).abs() > TOLERANCE) {
            return Err(PluviaError::NotNormalized(format!("states of {} sum to {}", var, bad)));
        }

        Ok(factor)
    }


    /// Retrieve the scope of the `Factor`.
    pub fn scope(&self) -> &[Variable] {
        &self.scope
    }


    /// Retrieve the underlying table of the `Factor`
    pub fn table(&self) -> &Table {
        &self.table
    }


    /// Check if `var` is in the scope of the `Factor`
    pub fn contains(&self, var: &Variable) -> bool {
        self.scope.contains(var)
    }


    /// Get the number of entries in the `Factor` table
    pub fn len(&self) -> usize {
        self.table.len()
    }


    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }


    /// Sum of all entries in the table
    pub fn total(&self) -> f64 {
        self.table.sum()
    }


    /// Retrieve the value for a complete assignment over the scope of this `Factor`
    ///
    /// # Args
    /// * `assignment`: a full assignment to the scope of a `Factor`. The assignment's scope may be
    ///   a superset of the `Factor`s scope.
    ///
    /// # Errors
    /// * `PluviaError::IncompleteAssignment`, if assignment is not a complete assignment to the
    ///   scope of the `Factor`
    /// * `PluviaError::InvalidState`, if an assigned state is out of range
    pub fn value(&self, assignment: &Assignment) -> Result<f64> {
        let mut idx = Vec::with_capacity(self.scope.len());
        for v in self.scope.iter() {
            match assignment.get(v) {
                Some(&s) if s < v.cardinality() => idx.push(s),
                Some(&s) => return Err(invalid_state(v, s)),
                None => return Err(PluviaError::IncompleteAssignment)
            }
        }

        Ok(self.table[IxDyn(&idx)])
    }


    /// Product of this `Factor` and another `Factor`.
    ///
    /// Defined in Koller & Friedman Section 4.2.1. We are computing a new factor
    /// ```Psi(X, Y, Z) = phi1(X, Y) * phi2(Y, Z)```; the scope of the result is the scope of
    /// `self` followed by the variables of `other` that are not in `self`.
    ///
    /// # Errors
    /// * `PluviaError::DimensionMismatch`, if a shared variable has different axis lengths in the
    ///   two tables
    pub fn product(&self, other: &Self) -> Result<Self> {
        let mut scope = self.scope.clone();
        let mut shape: Vec<usize> = self.table.shape().to_vec();

        // axes of the new table that feed each axis of `other`
        let mut other_axes = Vec::with_capacity(other.scope.len());
        for (i, v) in other.scope.iter().enumerate() {
            let len = other.table.len_of(nd::Axis(i));
            match scope.iter().position(|u| u == v) {
                Some(pos) => {
                    if shape[pos] != len {
                        return Err(PluviaError::DimensionMismatch {
                            expected: vec![shape[pos]],
                            found: vec![len]
                        });
                    }
                    other_axes.push(pos);
                },
                None => {
                    other_axes.push(scope.len());
                    scope.push(*v);
                    shape.push(len);
                }
            }
        }

        let lhs_axes = self.scope.len();
        let table = Table::from_shape_fn(IxDyn(&shape), |idx| {
            let lhs: Vec<usize> = (0..lhs_axes).map(|a| idx[a]).collect();
            let rhs: Vec<usize> = other_axes.iter().map(|&a| idx[a]).collect();
            self.table[IxDyn(&lhs)] * other.table[IxDyn(&rhs)]
        });

        Ok(Factor { scope, table })
    }


    /// Marginalize the `Factor` over the given `Variable`
    ///
    /// Defined in Koller & Friedman 9.3.1
    ///
    /// # Returns
    /// another `Factor`, with `var` summed out
    ///
    /// # Errors
    /// * `PluviaError::InvalidScope`, if `var` is not in the scope of the `Factor`
    pub fn marginalize(&self, var: Variable) -> Result<Self> {
        let axis = self.axis_of(&var)?;

        let table = self.table.sum_axis(nd::Axis(axis));
        let scope = self.scope.iter().cloned().filter(|&v| v != var).collect();

        Ok(Factor { scope, table })
    }


    /// Restrict the `Factor` to the entries consistent with ```var = state```. The result no
    /// longer has `var` in its scope.
    ///
    /// # Errors
    /// * `PluviaError::InvalidScope`, if `var` is not in the scope of the `Factor`
    /// * `PluviaError::InvalidState`, if `state` is not a state of `var`
    pub fn restrict(&self, var: Variable, state: usize) -> Result<Self> {
        let axis = self.axis_of(&var)?;
        if state >= var.cardinality() {
            return Err(invalid_state(&var, state));
        }

        let table = self.table.index_axis(nd::Axis(axis), state).to_owned();
        let scope = self.scope.iter().cloned().filter(|&v| v != var).collect();

        Ok(Factor { scope, table })
    }


    /// Reduce the `Factor` over the given partial assignment
    ///
    /// Defined in Koller & Friedman 4.2.3. Assigned variables outside of the scope of the
    /// `Factor` are ignored.
    ///
    /// # Errors
    /// * `PluviaError::InvalidState`, if an assigned state is out of range
    pub fn reduce(&self, assignment: &Assignment) -> Result<Self> {
        let mut reduced = self.clone();
        for v in self.scope.iter() {
            if let Some(&state) = assignment.get(v) {
                reduced = reduced.restrict(*v, state)?;
            }
        }

        Ok(reduced)
    }


    /// Divide every entry by the sum of all entries, turning the `Factor` into a distribution.
    ///
    /// # Errors
    /// * `PluviaError::DegenerateDistribution`, if the entries sum to zero
    pub fn normalize(&self) -> Result<Self> {
        let z = self.total();
        if z <= 0.0 || !z.is_finite() {
            return Err(PluviaError::DegenerateDistribution);
        }

        Ok(Factor { scope: self.scope.clone(), table: self.table.mapv(|v| v / z) })
    }


    /// Reorder the axes of the `Factor`.
    ///
    /// # Errors
    /// * `PluviaError::InvalidScope`, if `order` is not a permutation of the scope
    pub fn permute(&self, order: &[Variable]) -> Result<Self> {
        if order.len() != self.scope.len() || order.iter().unique().count() != order.len() {
            return Err(PluviaError::InvalidScope(
                format!("{} is not a permutation of the scope", order.iter().join(", "))
            ));
        }

        let axes = order.iter().map(|v| self.axis_of(v)).collect::<Result<Vec<usize>>>()?;
        let shape: Vec<usize> = order.iter().map(|v| v.cardinality()).collect();

        let table = Table::from_shape_fn(IxDyn(&shape), |idx| {
            let mut src = vec![0; axes.len()];
            for (i, &a) in axes.iter().enumerate() {
                src[a] = idx[i];
            }
            self.table[IxDyn(&src)]
        });

        Ok(Factor { scope: order.to_vec(), table })
    }


    /// Sum over the states of `var` for every assignment of the remaining variables.
    ///
    /// For a CPD ```P(var | parents)``` every entry of the result should be one. The sums are
    /// returned in row-major order of the remaining scope.
    ///
    /// # Errors
    /// * `PluviaError::InvalidScope`, if `var` is not in the scope of the `Factor`
    pub fn conditional_sums(&self, var: Variable) -> Result<Vec<f64>> {
        let marginal = self.marginalize(var)?;
        Ok(marginal.table.iter().cloned().collect())
    }


    /// Index of the axis of `var` in the table
    fn axis_of(&self, var: &Variable) -> Result<usize> {
        self.scope.iter().position(|v| v == var).ok_or_else(|| {
            PluviaError::InvalidScope(format!("{} is not in the scope of the factor", var))
        })
    }

}


fn invalid_state(var: &Variable, state: usize) -> PluviaError {
    PluviaError::InvalidState { variable: var.to_string(), state: state.to_string() }
}


// Unit tests
#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use itertools::iproduct;
    use ndarray::array;

    fn assignment(pairs: &[(Variable, usize)]) -> Assignment {
        let mut assn = Assignment::new();
        for &(v, s) in pairs {
            assn.set(&v, s);
        }
        assn
    }

    #[test]
    fn identity() {
        let f = Factor::identity();

        assert!(f.scope().is_empty());
        assert_eq!(1, f.len());
        assert_eq!(1.0, f.value(&Assignment::new()).unwrap());
    }

    #[test]
    fn table_factor() {
        let vars = vec![ Variable::binary(), Variable::discrete(5), Variable::discrete(3) ];
        let mut table = Table::ones(IxDyn(&[2, 5, 3]));
        table[[1, 1, 1].as_ref()] = 5.;

        let f = Factor::new(vars.clone(), table).unwrap();

        for (x, y, z) in iproduct!(0..2, 0..5, 0..3) {
            let assn = assignment(&[(vars[0], x), (vars[1], y), (vars[2], z)]);

            let val = f.value(&assn).unwrap();
            if x == 1 && y == 1 && z == 1 {
                assert_eq!(5., val);
            } else {
                assert_eq!(1., val);
            }
        }
    }

    #[test]
    fn table_factor_errs() {
        // mismatched number of dimensions
        let vars = vec![ Variable::binary(), Variable::binary() ];
        let f = Factor::new(vars.clone(), Table::ones(IxDyn(&[2, 2, 2])));
        match f {
            Err(PluviaError::DimensionMismatch { expected, found }) => {
                assert_eq!(vec![2, 2], expected);
                assert_eq!(vec![2, 2, 2], found);
            },
            _ => panic!("wrong error type")
        };

        // wrong cardinality
        let f = Factor::new(vars.clone(), Table::ones(IxDyn(&[2, 3])));
        assert!(matches!(f, Err(PluviaError::DimensionMismatch { .. })));

        // negative entries
        let f = Factor::new(vars.clone(), array![[1., -1.], [0., 1.]].into_dyn());
        assert_eq!(Err(PluviaError::NegativeValue), f);

        // repeated variable
        let f = Factor::new(vec![vars[0], vars[0]], Table::ones(IxDyn(&[2, 2])));
        assert!(matches!(f, Err(PluviaError::DuplicateVariable(_))));
    }

    #[test]
    fn cpd() {
        let a = Variable::binary();
        let b = Variable::binary();

        let f = Factor::cpd(b, vec![a], array![[0.9, 0.1], [0.2, 0.8]].into_dyn()).unwrap();
        assert_eq!(&[a, b], f.scope());
        for s in f.conditional_sums(b).unwrap() {
            assert_abs_diff_eq!(1.0, s, epsilon = TOLERANCE);
        }

        // a table that sums to one overall, but not per parent assignment
        let f = Factor::cpd(b, vec![a], array![[0.25, 0.25], [0.25, 0.25]].into_dyn());
        assert!(matches!(f, Err(PluviaError::NotNormalized(_))));
    }

    #[test]
    fn value_errs() {
        let a = Variable::binary();
        let b = Variable::binary();
        let f = Factor::new(vec![a, b], Table::ones(IxDyn(&[2, 2]))).unwrap();

        // out of scope variables are ignored
        let c = Variable::binary();
        assert_eq!(1.0, f.value(&assignment(&[(a, 0), (b, 1), (c, 1)])).unwrap());

        assert_eq!(Err(PluviaError::IncompleteAssignment), f.value(&assignment(&[(a, 0)])));
        assert!(matches!(
            f.value(&assignment(&[(a, 0), (b, 2)])),
            Err(PluviaError::InvalidState { .. })
        ));
    }

    #[test]
    /// Example taken from Koller & Friedman Figure 4.3
    fn product() {
        let a = Variable::discrete(3);
        let b = Variable::binary();
        let c = Variable::binary();

        let tbl1 = array![[0.5, 0.8], [0.1, 0.], [0.3, 0.9]].into_dyn();
        let phi1 = Factor::new(vec![ a, b ], tbl1).unwrap();

        let tbl2 = array![[0.5, 0.7], [0.1, 0.2]].into_dyn();
        let phi2 = Factor::new(vec![ b, c ], tbl2).unwrap();

        let phi = phi1.product(&phi2).unwrap();
        assert_eq!(&[a, b, c], phi.scope());

        let expected = nd::Array::from_shape_vec(
            (3, 2, 2),
            vec![ 0.25, 0.35, 0.08, 0.16, 0.05, 0.07, 0., 0., 0.15, 0.21, 0.09, 0.18 ]
        ).unwrap().into_dyn();

        for (x, y, z) in iproduct!(0..3, 0..2, 0..2) {
            let assn = assignment(&[(a, x), (b, y), (c, z)]);
            assert_abs_diff_eq!(expected[[x, y, z].as_ref()], phi.value(&assn).unwrap(), epsilon = 1e-12);
        }
    }

    #[test]
    fn product_disjoint_and_identity() {
        let a = Variable::binary();
        let b = Variable::discrete(3);

        let phi1 = Factor::new(vec![a], array![0.4, 0.6].into_dyn()).unwrap();
        let phi2 = Factor::new(vec![b], array![1., 2., 3.].into_dyn()).unwrap();

        let phi = phi1.product(&phi2).unwrap();
        assert_eq!(&[a, b], phi.scope());
        assert_abs_diff_eq!(0.6 * 3., phi.value(&assignment(&[(a, 1), (b, 2)])).unwrap());

        let same = Factor::identity().product(&phi1).unwrap();
        assert_eq!(phi1, same);
        let same = phi1.product(&Factor::identity()).unwrap();
        assert_eq!(phi1, same);
    }

    #[test]
    /// Example take from Koller & Friedman Figure 4.5
    fn restrict_and_reduce() {
        let a = Variable::discrete(3);
        let b = Variable::binary();
        let c = Variable::binary();

        let table = nd::Array::from_shape_vec(
            (3, 2, 2),
            vec![ 0.25, 0.35, 0.08, 0.16, 0.05, 0.07, 0., 0., 0.15, 0.21, 0.09, 0.18 ]
        ).unwrap().into_dyn();
        let phi = Factor::new(vec![a, b, c], table).unwrap();

        let reduced = phi.restrict(c, 0).unwrap();
        assert_eq!(&[a, b], reduced.scope());
        assert_eq!(array![[0.25, 0.08], [0.05, 0.], [0.15, 0.09]].into_dyn(), *reduced.table());

        // several variables at once, ignoring those out of scope
        let other = Variable::binary();
        let reduced = phi.reduce(&assignment(&[(c, 0), (a, 2), (other, 1)])).unwrap();
        assert_eq!(&[b], reduced.scope());
        assert_eq!(array![0.15, 0.09].into_dyn(), *reduced.table());

        // a full assignment leaves a scalar
        let reduced = phi.reduce(&assignment(&[(a, 0), (b, 0), (c, 1)])).unwrap();
        assert!(reduced.scope().is_empty());
        assert_eq!(0.35, reduced.total());
    }

    #[test]
    fn restrict_errs() {
        let a = Variable::discrete(3);
        let b = Variable::binary();
        let phi = Factor::new(vec![a], array![1., 2., 3.].into_dyn()).unwrap();

        assert!(matches!(phi.restrict(a, 3), Err(PluviaError::InvalidState { .. })));
        assert!(matches!(phi.restrict(b, 0), Err(PluviaError::InvalidScope(_))));
    }

    #[test]
    /// Example taken from Koller & Friedman Figure 9.7
    fn marginalize() {
        let a = Variable::discrete(3);
        let b = Variable::binary();
        let c = Variable::binary();

        let table = nd::Array::from_shape_vec(
            (3, 2, 2),
            vec![ 0.25, 0.35, 0.08, 0.16, 0.05, 0.07, 0., 0., 0.15, 0.21, 0.09, 0.18 ]
        ).unwrap().into_dyn();
        let phi = Factor::new(vec![a, b, c], table).unwrap();

        let marginalized = phi.marginalize(b).unwrap();
        assert_eq!(&[a, c], marginalized.scope());

        let expected = array![[0.33, 0.51], [0.05, 0.07], [0.24, 0.39]].into_dyn();
        for (x, y) in iproduct!(0..3, 0..2) {
            let assn = assignment(&[(a, x), (c, y)]);
            assert_abs_diff_eq!(expected[[x, y].as_ref()], marginalized.value(&assn).unwrap(), epsilon = 1e-12);
        }

        assert!(matches!(phi.marginalize(Variable::binary()), Err(PluviaError::InvalidScope(_))));
    }

    #[test]
    fn normalize() {
        let a = Variable::binary();
        let phi = Factor::new(vec![a], array![1., 3.].into_dyn()).unwrap();

        let p = phi.normalize().unwrap();
        assert_abs_diff_eq!(0.25, p.value(&assignment(&[(a, 0)])).unwrap());
        assert_abs_diff_eq!(1.0, p.total());

        let zero = Factor::new(vec![a], array![0., 0.].into_dyn()).unwrap();
        assert_eq!(Err(PluviaError::DegenerateDistribution), zero.normalize());
    }

    #[test]
    fn permute() {
        let a = Variable::binary();
        let b = Variable::discrete(3);
        let phi = Factor::new(vec![a, b], array![[1., 2., 3.], [4., 5., 6.]].into_dyn()).unwrap();

        let swapped = phi.permute(&[b, a]).unwrap();
        assert_eq!(&[b, a], swapped.scope());
        assert_eq!(array![[1., 4.], [2., 5.], [3., 6.]].into_dyn(), *swapped.table());

        assert!(matches!(phi.permute(&[a]), Err(PluviaError::InvalidScope(_))));
        assert!(matches!(phi.permute(&[a, a]), Err(PluviaError::InvalidScope(_))));
    }

}
