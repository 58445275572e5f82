pub mod allocation;
pub mod expr;
pub mod model;
pub mod objective;
pub mod sampling;
pub mod solver;
pub mod solver_factory;
pub mod solvers;
pub mod validate;
