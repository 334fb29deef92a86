// Template parser using recursive descent over the token stream

use crate::domain::template::ast::{NodeList, TextNode, VariableNode};
use crate::domain::template::expression::FilterExpression;
use crate::domain::template::lexer::{Token, TokenKind};
use crate::domain::template::library::Registry;
use crate::error::{Result, TemplateError};

pub const DEFAULT_RECURSION_LIMIT: usize = 64;

/// The terminator tag that closed a block, handed back to the factory
#[derive(Debug, Clone, PartialEq)]
pub struct BlockEnd {
    pub tag: String,
    pub args: String,
    pub line: usize,
}

#[derive(Debug)]
struct OpenBlock {
    tag: String,
    line: usize,
    terminators: Vec<String>,
}

/// Builds a [`NodeList`] from tokens, dispatching block tags to the
/// registered factories.
///
/// Factories receive the parser by exclusive borrow and call
/// [`Parser::parse_until`] to collect their children.
pub struct Parser<'r> {
    tokens: Vec<Token>,
    pos: usize,
    registry: &'r Registry,
    open: Vec<OpenBlock>,
    recursion_limit: usize,
}

impl<'r> Parser<'r> {
    pub fn new(tokens: Vec<Token>, registry: &'r Registry) -> Self {
        Self {
            tokens,
            pos: 0,
            registry,
            open: Vec::new(),
            recursion_limit: DEFAULT_RECURSION_LIMIT,
        }
    }

    pub fn with_recursion_limit(mut self, limit: usize) -> Self {
        self.recursion_limit = limit;
        self
    }

    pub fn registry(&self) -> &'r Registry {
        self.registry
    }

    /// Parse the whole token stream
    pub fn parse(&mut self) -> Result<NodeList> {
        let (nodes, _) = self.parse_nodes()?;
        Ok(nodes)
    }

    /// Parse nodes until one of `terminators` closes the block opened by `tag`.
    ///
    /// The terminator token is consumed and returned. Reaching end of input
    /// fails with an unclosed-tag error naming the outermost open block.
    pub fn parse_until(&mut self, tag: &str, terminators: &[&str]) -> Result<(NodeList, BlockEnd)> {
        if self.open.len() >= self.recursion_limit {
            return Err(TemplateError::RecursionLimit {
                limit: self.recursion_limit,
            });
        }

        self.open.push(OpenBlock {
            tag: tag.to_string(),
            line: self.previous_line(),
            terminators: terminators.iter().map(|t| t.to_string()).collect(),
        });
        let outcome = match self.parse_nodes() {
            Ok((nodes, Some(end))) => Ok((nodes, end)),
            Ok((_, None)) => Err(self.unclosed_error()),
            Err(err) => Err(err),
        };
        self.open.pop();
        outcome
    }

    /// Discard tokens up to and including the `terminator` tag without
    /// parsing them.
    pub fn skip_until(&mut self, tag: &str, terminator: &str) -> Result<BlockEnd> {
        let opened_on = self.previous_line();
        while let Some(token) = self.tokens.get(self.pos) {
            self.pos += 1;
            if let TokenKind::Block { name, args } = &token.kind {
                if name == terminator {
                    return Ok(BlockEnd {
                        tag: name.clone(),
                        args: args.clone(),
                        line: token.line,
                    });
                }
            }
        }

        Err(match self.open.first() {
            Some(outermost) => TemplateError::UnclosedTag {
                tag: outermost.tag.clone(),
                line: outermost.line,
            },
            None => TemplateError::UnclosedTag {
                tag: tag.to_string(),
                line: opened_on,
            },
        })
    }

    /// Compile a filter expression against the registered filters
    pub fn compile_filter(&self, source: &str) -> Result<FilterExpression> {
        FilterExpression::parse(source, self.registry.filters()).map_err(|err| match err {
            TemplateError::Syntax { message, .. } => TemplateError::Syntax {
                message,
                line: self.previous_line(),
            },
            other => other,
        })
    }

    /// Line of the most recently consumed token
    pub fn previous_line(&self) -> usize {
        self.pos
            .checked_sub(1)
            .and_then(|index| self.tokens.get(index))
            .map_or(1, |token| token.line)
    }

    fn parse_nodes(&mut self) -> Result<(NodeList, Option<BlockEnd>)> {
        let mut nodes = NodeList::new();

        while let Some(token) = self.tokens.get(self.pos).cloned() {
            match token.kind {
                TokenKind::Text(text) => {
                    self.pos += 1;
                    nodes.push(Box::new(TextNode::new(text)));
                }
                TokenKind::Variable(source) => {
                    self.pos += 1;
                    let expression = self.compile_filter(&source)?;
                    nodes.push(Box::new(VariableNode::new(expression)));
                }
                TokenKind::Comment(_) => {
                    self.pos += 1;
                }
                TokenKind::Unterminated(delimiter) => {
                    return Err(TemplateError::Syntax {
                        message: format!(
                            "unterminated '{}', expected '{}'",
                            delimiter.opener(),
                            delimiter.closer()
                        ),
                        line: token.line,
                    });
                }
                TokenKind::Block { name, args } => {
                    if name.is_empty() {
                        return Err(TemplateError::Syntax {
                            message: "empty block tag".to_string(),
                            line: token.line,
                        });
                    }

                    if let Some(innermost) = self.open.last() {
                        if innermost.terminators.contains(&name) {
                            self.pos += 1;
                            return Ok((
                                nodes,
                                Some(BlockEnd {
                                    tag: name,
                                    args,
                                    line: token.line,
                                }),
                            ));
                        }
                        if self.open.iter().any(|block| block.terminators.contains(&name)) {
                            return Err(TemplateError::UnclosedTag {
                                tag: innermost.tag.clone(),
                                line: innermost.line,
                            });
                        }
                    }

                    let registry = self.registry;
                    let factory = registry.tag(&name).ok_or_else(|| TemplateError::UnknownTag {
                        tag: name.clone(),
                        line: token.line,
                    })?;
                    self.pos += 1;
                    let node = factory.get_node(&args, self)?;
                    nodes.push(node);
                }
            }
        }

        Ok((nodes, None))
    }

    fn unclosed_error(&self) -> TemplateError {
        match self.open.first() {
            Some(outermost) => TemplateError::UnclosedTag {
                tag: outermost.tag.clone(),
                line: outermost.line,
            },
            None => TemplateError::UnclosedTag {
                tag: String::new(),
                line: self.previous_line(),
            },
        }
    }
}
