//! Parameter update rule interface.

use nalgebra::DVector;

use crate::error::Result;

pub trait Optimizer<S: ?Sized> {
    /// Update the parameters of `state` in place from the energy gradient
    /// estimated in optimization cycle `cycle`.
    fn update(&mut self, state: &mut S, gradient: &DVector<f64>, cycle: usize) -> Result<()>;
}

impl<S: ?Sized, O: Optimizer<S> + ?Sized> Optimizer<S> for Box<O> {
    fn update(&mut self, state: &mut S, gradient: &DVector<f64>, cycle: usize) -> Result<()> {
        (**self).update(state, gradient, cycle)
    }
}
