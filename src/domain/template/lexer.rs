// Tokenizer splitting template source at `{{ }}`, `{% %}` and `{# #}`

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delimiter {
    Variable,
    Block,
    Comment,
}

impl Delimiter {
    pub fn opener(self) -> &'static str {
        match self {
            Delimiter::Variable => "{{",
            Delimiter::Block => "{%",
            Delimiter::Comment => "{#",
        }
    }

    pub fn closer(self) -> &'static str {
        match self {
            Delimiter::Variable => "}}",
            Delimiter::Block => "%}",
            Delimiter::Comment => "#}",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    Text(String),
    Variable(String),
    Block { name: String, args: String },
    Comment(String),
    /// An opening delimiter with no closer before end of input
    Unterminated(Delimiter),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub line: usize,
}

/// Splits raw source into a flat token sequence.
///
/// Never fails; an unterminated delimiter becomes a [`TokenKind::Unterminated`]
/// token that the parser reports, and scanning resumes right after its opener.
pub struct Tokenizer<'s> {
    source: &'s str,
    trim_blocks: bool,
}

impl<'s> Tokenizer<'s> {
    pub fn new(source: &'s str) -> Self {
        Self {
            source,
            trim_blocks: false,
        }
    }

    /// Drop a single newline following each block tag or comment
    pub fn trim_blocks(mut self, trim: bool) -> Self {
        self.trim_blocks = trim;
        self
    }

    pub fn tokenize(&self) -> Vec<Token> {
        let mut tokens = Vec::new();
        let mut rest = self.source;
        let mut line = 1;

        while !rest.is_empty() {
            let Some((start, delimiter)) = next_opener(rest) else {
                tokens.push(Token {
                    kind: TokenKind::Text(rest.to_string()),
                    line,
                });
                break;
            };

            if start > 0 {
                let text = &rest[..start];
                tokens.push(Token {
                    kind: TokenKind::Text(text.to_string()),
                    line,
                });
                line += count_lines(text);
            }

            let body_start = start + delimiter.opener().len();
            let Some(body_len) = rest[body_start..].find(delimiter.closer()) else {
                tokens.push(Token {
                    kind: TokenKind::Unterminated(delimiter),
                    line,
                });
                rest = &rest[body_start..];
                continue;
            };

            let body = &rest[body_start..body_start + body_len];
            tokens.push(Token {
                kind: make_token(delimiter, body),
                line,
            });
            line += count_lines(body);
            rest = &rest[body_start + body_len + delimiter.closer().len()..];

            if self.trim_blocks && delimiter != Delimiter::Variable {
                if let Some(stripped) = rest
                    .strip_prefix("\r\n")
                    .or_else(|| rest.strip_prefix('\n'))
                {
                    rest = stripped;
                    line += 1;
                }
            }
        }

        tokens
    }
}

pub fn tokenize(source: &str) -> Vec<Token> {
    Tokenizer::new(source).tokenize()
}

fn next_opener(text: &str) -> Option<(usize, Delimiter)> {
    let bytes = text.as_bytes();
    let mut from = 0;
    while let Some(offset) = text[from..].find('{') {
        let index = from + offset;
        match bytes.get(index + 1) {
            Some(b'{') => return Some((index, Delimiter::Variable)),
            Some(b'%') => return Some((index, Delimiter::Block)),
            Some(b'#') => return Some((index, Delimiter::Comment)),
            _ => from = index + 1,
        }
    }
    None
}

fn make_token(delimiter: Delimiter, body: &str) -> TokenKind {
    match delimiter {
        Delimiter::Variable => TokenKind::Variable(body.trim().to_string()),
        Delimiter::Comment => TokenKind::Comment(body.to_string()),
        Delimiter::Block => {
            let body = body.trim();
            let (name, args) = body
                .split_once(char::is_whitespace)
                .unwrap_or((body, ""));
            TokenKind::Block {
                name: name.to_string(),
                args: args.trim().to_string(),
            }
        }
    }
}

fn count_lines(text: &str) -> usize {
    text.matches('\n').count()
}
