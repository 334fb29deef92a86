// Template language: values, scopes, the compiler and its default libraries

pub mod context;
pub mod filters;
pub mod tags;
pub mod template;
pub mod value;
