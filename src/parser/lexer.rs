//! Lexer for the format-dictionary language using logos

use logos::Logos;

/// Byte range in source text
pub type Span = std::ops::Range<usize>;

#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\n\r]+")]
pub enum Token {
    // Item keywords
    #[token("format")]
    Format,
    #[token("map")]
    Map,
    #[token("default")]
    Default,

    // Fragment keywords
    #[token("line")]
    Line,
    #[token("indent")]
    Indent,
    #[token("scope")]
    Scope,
    #[token("series")]
    Series,
    #[token("if")]
    If,
    #[token("data")]
    Data,
    #[token("ref")]
    Ref,
    #[token("lookup")]
    Lookup,

    // Fragment options
    #[token("by")]
    By,
    #[token("separator")]
    Separator,
    #[token("unique")]
    Unique,
    #[token("filter")]
    Filter,
    #[token("as")]
    As,
    #[token("when")]
    When,
    #[token("legal")]
    Legal,

    // Delimiters
    #[token("{")]
    BraceOpen,
    #[token("}")]
    BraceClose,
    #[token(",")]
    Comma,
    #[token("=>")]
    FatArrow,
    #[token("!")]
    Bang,

    // Literals - identifiers must come after keywords
    #[regex(r"[a-zA-Z_][a-zA-Z0-9_]*", |lex| lex.slice().to_string(), priority = 1)]
    Ident(String),

    #[regex(r#""([^"\\]|\\.)*""#, |lex| {
        let s = lex.slice();
        unescape(&s[1..s.len()-1])
    })]
    String(String),

    /// Input no other token matches; left for the parser to report
    Error,

    // Comments (skip)
    #[regex(r"//[^\n]*", logos::skip)]
    LineComment,

    #[regex(r"/\*([^*]|\*[^/])*\*/", logos::skip)]
    BlockComment,
}

impl Token {
    /// Keyword spelling, for keyword tokens
    pub fn keyword(&self) -> Option<&'static str> {
        let kw = match self {
            Token::Format => "format",
            Token::Map => "map",
            Token::Default => "default",
            Token::Line => "line",
            Token::Indent => "indent",
            Token::Scope => "scope",
            Token::Series => "series",
            Token::If => "if",
            Token::Data => "data",
            Token::Ref => "ref",
            Token::Lookup => "lookup",
            Token::By => "by",
            Token::Separator => "separator",
            Token::Unique => "unique",
            Token::Filter => "filter",
            Token::As => "as",
            Token::When => "when",
            Token::Legal => "legal",
            _ => return None,
        };
        Some(kw)
    }
}

/// Resolve `\n`, `\t`, `\r`, `\\` and `\"`; other escapes are kept verbatim
/// so regex sources such as `"\.h"` survive.
fn unescape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('\\') => out.push('\\'),
            Some('"') => out.push('"'),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}

/// Lex input string into tokens with spans
pub fn lex(input: &str) -> impl Iterator<Item = (Token, Span)> + '_ {
    Token::lexer(input)
        .spanned()
        .map(|(tok, span)| (tok.unwrap_or(Token::Error), span))
}
