pub mod builtin;
pub mod descriptor;
pub mod registry;
