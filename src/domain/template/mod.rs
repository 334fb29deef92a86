// Template compiler
//
// Source text is split into tokens by the lexer, parsed into a node tree
// with tags dispatched through the registry, and rendered against a Context.

pub mod ast;
pub mod engine;
pub mod expression;
pub mod lexer;
pub mod library;
pub mod parser;
pub mod pipeline;

pub use ast::{Node, NodeList, TextNode, VariableNode};
pub use engine::{Engine, Template};
pub use expression::{FilterExpression, Operand};
pub use lexer::{tokenize, Token, TokenKind, Tokenizer};
pub use library::{NodeFactory, Registry, TagLibrary};
pub use parser::{BlockEnd, Parser};
pub use pipeline::{Filter, FilterRegistry};
