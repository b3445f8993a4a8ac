// Text and JSON extraction over raw model output.
// Nothing here calls the model; every function is pure and fail-soft.

pub mod blueprint;
pub mod enrich;
pub mod fences;
