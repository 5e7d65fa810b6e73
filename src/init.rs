//! Module containing initialization routines for the parameters of a model.

use crate::factor::{Factor, Table};
use crate::util::{PluviaError, Result};
use crate::variable::Variable;

use ndarray::prelude as nd;
use ndarray_rand::rand_distr::Uniform;
use ndarray_rand::RandomExt;
use rand::rngs::StdRng;
use rand::SeedableRng;

/// Defines possible ways to initialize a `Variable`s CPD.
#[derive(Clone, Debug, PartialEq)]
pub enum Initialization<'a> {
    /// A uniform distribution over all possibilities
    Uniform,

    /// Randomly initialize the weights of the CPD.
    Random,

    /// Randomly initialize the weights of the CPD from a seeded generator, so the same seed always
    /// yields the same table.
    Seeded(u64),

    /// Initialize the CPD as a Binomial distribution with parameter ```p```, the probability of
    /// the *first* state. Note that this `Initialization` is valid only to a binary `Variable`
    /// with no parents.
    Binomial(f64),

    /// Initialize the CPD as a Multinomial distribution with parameters ```p_0, p_1...```.
    /// Note that this `Initialization` is valid only to a `Variable` with no parents.
    Multinomial(&'a [f64]),
}


impl<'a> Initialization<'a> {

    /// Construct a CPD, initialized based on ```self```
    ///
    /// # Args
    /// * `var`: the `Variable` the distribution is over
    /// * `parents`: the conditioning `Variable`s
    ///
    /// # Returns
    /// a `Factor` over ```parents ++ [var]```, initialized according to ```self```.
    ///
    /// # Errors
    /// * `PluviaError::InvalidInitialization` if ```self``` cannot describe a CPD of that shape
    pub fn build_cpd(&self, var: Variable, parents: &[Variable]) -> Result<Factor> {
        ///////////////////////////////////////////////////////////////////////////////
        // Check for errors
        match *self {
            Initialization::Binomial(_) | Initialization::Multinomial(_) if !parents.is_empty() => {
                return Err(PluviaError::InvalidInitialization(
                    String::from("binomial and multinomial CPDs cannot have parents")
                ));
            },

            // A binomial distribution on a non-binary variable
            Initialization::Binomial(_) if var.cardinality() != 2 => {
                return Err(PluviaError::InvalidInitialization(
                    format!("a binomial CPD needs 2 states, {} has {}", var, var.cardinality())
                ));
            },

            Initialization::Binomial(p) if !(0.0..=1.0).contains(&p) => {
                return Err(PluviaError::InvalidInitialization(
                    format!("{} is not a probability", p)
                ));
            },

            // A multinomial distribution with an incorrect number of parameters
            Initialization::Multinomial(ps) if ps.len() != var.cardinality() => {
                return Err(PluviaError::InvalidInitialization(
                    format!("{} needs {} parameters, got {}", var, var.cardinality(), ps.len())
                ));
            },

            _ => ()
        }

        ///////////////////////////////////////////////////////////////////////////////
        // now, build CPD
        let mut shape: Vec<usize> = parents.iter().map(|v| v.cardinality()).collect();
        shape.push(var.cardinality());

        let tbl: Table = match *self {
            Initialization::Uniform => {
                // normalizing constant is just the number of states
                let val = 1. / (var.cardinality() as f64);
                Table::from_elem(shape, val)
            },
            Initialization::Random => {
                normalize_last_axis(Table::random(shape, Uniform::new(1.0, 100.0)))
            },
            Initialization::Seeded(seed) => {
                let mut rng = StdRng::seed_from_u64(seed);
                normalize_last_axis(Table::random_using(shape, Uniform::new(1.0, 100.0), &mut rng))
            },
            Initialization::Binomial(p) => {
                nd::arr1(&[p, 1.0 - p]).into_dyn()
            },
            Initialization::Multinomial(ps) => {
                nd::Array1::from(ps.to_vec()).into_dyn()
            }
        };

        Factor::cpd(var, parents.to_vec(), tbl)
    }

}


/// Scale a table so that every lane along its last axis sums to one
fn normalize_last_axis(mut tbl: Table) -> Table {
    let ax = nd::Axis(tbl.ndim() - 1);
    for mut lane in tbl.lanes_mut(ax) {
        let z = lane.sum();
        lane.mapv_inplace(|v| v / z);
    }
    tbl
}
