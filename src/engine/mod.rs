pub mod fractal;
pub mod iteration_stack;
pub mod types;
