pub mod cli;
pub mod config;
pub mod domain;
pub mod error;

pub use config::EngineSettings;
pub use domain::context::{Context, Scope};
pub use domain::template::{
    Engine, Filter, FilterExpression, Node, NodeFactory, NodeList, Parser, Registry, TagLibrary,
    Template,
};
pub use domain::value::{ObjectHandle, Value};
pub use error::{ErrorKind, FilterError, Result, TemplateError};
