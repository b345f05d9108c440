pub mod citations;
pub mod filters;
pub mod json_object;
pub mod safety;
pub mod snippet;
