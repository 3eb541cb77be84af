//! Body tokenizer
//!
//! Turns the text between a function's braces into [`Token`]s. Locations are
//! counted from the body's origin in the user's source, so a token on the
//! third line of `user_main` reports the line it has in the editor.
//!
//! Comments are skipped again here because bodies are also lexed on their
//! own in tests. A `#` line inside a body is dropped like one at top level.
//! A `"` is an error: the robot runtime has no string values.

use super::ast::SourceLocation;
use std::fmt;
use thiserror::Error;

/// What a token is, without its position
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    Number(f64),
    CharLiteral(char),
    Ident(String),

    // Declaration keywords
    Int,
    Float,
    Double,
    Long,
    Short,
    Char,
    Bool,
    Unsigned,
    Const,
    Void,

    // Control keywords
    If,
    Else,
    While,
    Do,
    For,
    Break,
    Continue,
    Return,

    // Operators, spelled out in OPERATORS
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    EqEq,
    NotEq,
    Lt,
    Le,
    Gt,
    Ge,
    AndAnd,
    OrOr,
    Bang,
    Amp,
    Pipe,
    Caret,
    Tilde,
    LtLt,
    GtGt,
    Eq,
    PlusEq,
    MinusEq,
    StarEq,
    SlashEq,
    PercentEq,
    PlusPlus,
    MinusMinus,
    Question,
    Colon,
    LParen,
    RParen,
    LBrace,
    RBrace,
    LBracket,
    RBracket,
    Semicolon,
    Comma,

    Eof,
}

static KEYWORDS: [(&str, TokenKind); 18] = [
    ("int", TokenKind::Int),
    ("float", TokenKind::Float),
    ("double", TokenKind::Double),
    ("long", TokenKind::Long),
    ("short", TokenKind::Short),
    ("char", TokenKind::Char),
    ("bool", TokenKind::Bool),
    ("unsigned", TokenKind::Unsigned),
    ("const", TokenKind::Const),
    ("void", TokenKind::Void),
    ("if", TokenKind::If),
    ("else", TokenKind::Else),
    ("while", TokenKind::While),
    ("do", TokenKind::Do),
    ("for", TokenKind::For),
    ("break", TokenKind::Break),
    ("continue", TokenKind::Continue),
    ("return", TokenKind::Return),
];

// Two-character spellings come first so that `+=` wins over `+`.
static OPERATORS: [(&str, TokenKind); 38] = [
    ("++", TokenKind::PlusPlus),
    ("--", TokenKind::MinusMinus),
    ("+=", TokenKind::PlusEq),
    ("-=", TokenKind::MinusEq),
    ("*=", TokenKind::StarEq),
    ("/=", TokenKind::SlashEq),
    ("%=", TokenKind::PercentEq),
    ("==", TokenKind::EqEq),
    ("!=", TokenKind::NotEq),
    ("<=", TokenKind::Le),
    (">=", TokenKind::Ge),
    ("<<", TokenKind::LtLt),
    (">>", TokenKind::GtGt),
    ("&&", TokenKind::AndAnd),
    ("||", TokenKind::OrOr),
    ("+", TokenKind::Plus),
    ("-", TokenKind::Minus),
    ("*", TokenKind::Star),
    ("/", TokenKind::Slash),
    ("%", TokenKind::Percent),
    ("=", TokenKind::Eq),
    ("!", TokenKind::Bang),
    ("<", TokenKind::Lt),
    (">", TokenKind::Gt),
    ("&", TokenKind::Amp),
    ("|", TokenKind::Pipe),
    ("^", TokenKind::Caret),
    ("~", TokenKind::Tilde),
    ("?", TokenKind::Question),
    (":", TokenKind::Colon),
    ("(", TokenKind::LParen),
    (")", TokenKind::RParen),
    ("{", TokenKind::LBrace),
    ("}", TokenKind::RBrace),
    ("[", TokenKind::LBracket),
    ("]", TokenKind::RBracket),
    (";", TokenKind::Semicolon),
    (",", TokenKind::Comma),
];

impl TokenKind {
    /// Source text of a keyword or operator
    fn spelling(&self) -> Option<&'static str> {
        KEYWORDS
            .iter()
            .chain(OPERATORS.iter())
            .find(|entry| entry.1 == *self)
            .map(|entry| entry.0)
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::Number(n) => write!(f, "number {}", n),
            TokenKind::CharLiteral(c) if c.is_ascii_graphic() || *c == ' ' => {
                write!(f, "char literal '{}'", c)
            }
            TokenKind::CharLiteral(c) => write!(f, "char literal '\\x{:02x}'", *c as u32),
            TokenKind::Ident(name) => write!(f, "identifier '{}'", name),
            TokenKind::Eof => write!(f, "end of function body"),
            other => write!(f, "'{}'", other.spelling().unwrap_or("?")),
        }
    }
}

/// A token and where it starts
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub location: SourceLocation,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.kind, f)
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
#[error("Lexer error at line {}, column {}: {message}", location.line, location.column)]
pub struct LexError {
    pub message: String,
    pub location: SourceLocation,
}

pub struct Lexer {
    input: Vec<char>,
    position: usize,
    line: usize,
    column: usize,
}

impl Lexer {
    pub fn new(input: &str) -> Self {
        Self::with_origin(input, SourceLocation::new(1, 1))
    }

    /// Lex body text whose first character sits at `origin`.
    pub fn with_origin(input: &str, origin: SourceLocation) -> Self {
        Self {
            input: input.chars().collect(),
            position: 0,
            line: origin.line,
            column: origin.column,
        }
    }

    /// All tokens of the body, ending with [`TokenKind::Eof`]
    pub fn tokenize(&mut self) -> Result<Vec<Token>, LexError> {
        let mut tokens = Vec::new();

        loop {
            self.skip_trivia()?;
            let location = self.current_location();

            match self.peek() {
                None => {
                    tokens.push(Token {
                        kind: TokenKind::Eof,
                        location,
                    });
                    return Ok(tokens);
                }
                Some('#') => self.skip_rest_of_line(),
                Some(_) => {
                    let kind = self.lex_one(location)?;
                    tokens.push(Token { kind, location });
                }
            }
        }
    }

    fn lex_one(&mut self, loc: SourceLocation) -> Result<TokenKind, LexError> {
        let ch = self.advance().ok_or_else(|| LexError {
            message: "Unexpected end of input".to_string(),
            location: loc,
        })?;

        match ch {
            '"' => Err(LexError {
                message: "String literals are not supported".to_string(),
                location: loc,
            }),
            '\'' => self.char_literal(),
            '0'..='9' => self.number_literal(ch, loc),
            '.' if self.peek().is_some_and(|c| c.is_ascii_digit()) => {
                self.number_literal(ch, loc)
            }
            'a'..='z' | 'A'..='Z' | '_' => Ok(self.word(ch)),
            _ => self.operator(ch).ok_or_else(|| LexError {
                message: format!("Unexpected character: '{}'", ch),
                location: loc,
            }),
        }
    }

    /// Longest operator starting with `first`, consuming its second
    /// character if it has one
    fn operator(&mut self, first: char) -> Option<TokenKind> {
        let next = self.peek();
        let (spelling, kind) = OPERATORS.iter().find(|(spelling, _)| {
            let mut chars = spelling.chars();
            chars.next() == Some(first) && chars.next().map_or(true, |c| next == Some(c))
        })?;

        if spelling.len() == 2 {
            self.advance();
        }
        Some(kind.clone())
    }

    /// Character literal after its opening quote. The value is the code point.
    fn char_literal(&mut self) -> Result<TokenKind, LexError> {
        let value = match self.take_in_char_literal()? {
            '\\' => match self.take_in_char_literal()? {
                'n' => '\n',
                't' => '\t',
                'r' => '\r',
                '0' => '\0',
                c @ ('\\' | '\'') => c,
                other => {
                    return Err(LexError {
                        message: format!("Unknown escape sequence: \\{}", other),
                        location: self.current_location(),
                    });
                }
            },
            c => c,
        };

        if self.advance() != Some('\'') {
            return Err(LexError {
                message: "Expected closing quote in character literal".to_string(),
                location: self.current_location(),
            });
        }
        Ok(TokenKind::CharLiteral(value))
    }

    fn take_in_char_literal(&mut self) -> Result<char, LexError> {
        self.advance().ok_or_else(|| LexError {
            message: "Unexpected end of input in character literal".to_string(),
            location: self.current_location(),
        })
    }

    /// Decimal, fractional, exponent or `0x` hex. C suffixes (`u`, `L`, `f`)
    /// are accepted and ignored since every value is a double.
    fn number_literal(&mut self, first: char, loc: SourceLocation) -> Result<TokenKind, LexError> {
        if first == '0' && matches!(self.peek(), Some('x' | 'X')) {
            self.advance();
            let digits = self.take_while(|c| c.is_ascii_hexdigit());
            self.skip_number_suffix();
            return i64::from_str_radix(&digits, 16)
                .map(|v| TokenKind::Number(v as f64))
                .map_err(|_| LexError {
                    message: format!("Invalid hex literal: 0x{}", digits),
                    location: loc,
                });
        }

        let mut text = String::from(first);
        text.push_str(&self.take_while(|c| c.is_ascii_digit()));
        if first != '.' && self.peek() == Some('.') {
            self.advance();
            text.push('.');
            text.push_str(&self.take_while(|c| c.is_ascii_digit()));
        }
        if self.at_exponent() {
            text.extend(self.advance());
            if matches!(self.peek(), Some('+' | '-')) {
                text.extend(self.advance());
            }
            text.push_str(&self.take_while(|c| c.is_ascii_digit()));
        }
        self.skip_number_suffix();

        text.parse::<f64>()
            .map(TokenKind::Number)
            .map_err(|_| LexError {
                message: format!("Invalid number literal: {}", text),
                location: loc,
            })
    }

    /// `e`/`E` followed by digits, optionally signed
    fn at_exponent(&self) -> bool {
        let digit_at = |n| self.peek_ahead(n).is_some_and(|c: char| c.is_ascii_digit());
        matches!(self.peek(), Some('e' | 'E'))
            && (digit_at(1) || (matches!(self.peek_ahead(1), Some('+' | '-')) && digit_at(2)))
    }

    fn skip_number_suffix(&mut self) {
        while matches!(self.peek(), Some('u' | 'U' | 'l' | 'L' | 'f' | 'F')) {
            self.advance();
        }
    }

    /// Keyword, or an identifier such as `motor`, `gAD` or `CN2`
    fn word(&mut self, first: char) -> TokenKind {
        let mut word = String::from(first);
        word.push_str(&self.take_while(|c| c.is_ascii_alphanumeric() || c == '_'));

        KEYWORDS
            .iter()
            .find(|entry| entry.0 == word)
            .map_or(TokenKind::Ident(word), |entry| entry.1.clone())
    }

    fn take_while(&mut self, accept: impl Fn(char) -> bool) -> String {
        let mut taken = String::new();
        while let Some(c) = self.peek().filter(|c| accept(*c)) {
            taken.push(c);
            self.advance();
        }
        taken
    }

    /// Whitespace and both comment forms
    fn skip_trivia(&mut self) -> Result<(), LexError> {
        loop {
            match (self.peek(), self.peek_ahead(1)) {
                (Some(c), _) if c.is_ascii_whitespace() => {
                    self.advance();
                }
                (Some('/'), Some('/')) => self.skip_rest_of_line(),
                (Some('/'), Some('*')) => self.skip_block_comment()?,
                _ => return Ok(()),
            }
        }
    }

    fn skip_rest_of_line(&mut self) {
        while let Some(c) = self.advance() {
            if c == '\n' {
                break;
            }
        }
    }

    fn skip_block_comment(&mut self) -> Result<(), LexError> {
        let start = self.current_location();
        self.advance();
        self.advance();

        while !self.is_at_end() {
            if self.peek() == Some('*') && self.peek_ahead(1) == Some('/') {
                self.advance();
                self.advance();
                return Ok(());
            }
            self.advance();
        }

        Err(LexError {
            message: "Unterminated block comment".to_string(),
            location: start,
        })
    }

    fn peek(&self) -> Option<char> {
        self.peek_ahead(0)
    }

    fn peek_ahead(&self, n: usize) -> Option<char> {
        self.input.get(self.position + n).copied()
    }

    /// Consume one character, keeping line and column current
    fn advance(&mut self) -> Option<char> {
        let ch = *self.input.get(self.position)?;
        self.position += 1;

        if ch == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }

        Some(ch)
    }

    fn is_at_end(&self) -> bool {
        self.position >= self.input.len()
    }

    fn current_location(&self) -> SourceLocation {
        SourceLocation::new(self.line, self.column)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        Lexer::new(source)
            .tokenize()
            .unwrap()
            .into_iter()
            .map(|token| token.kind)
            .collect()
    }

    fn ident(name: &str) -> TokenKind {
        TokenKind::Ident(name.to_string())
    }

    #[test]
    fn test_sensor_read_statement() {
        assert_eq!(
            kinds("gV[VAR_A] = gAD[CN2];"),
            vec![
                ident("gV"),
                TokenKind::LBracket,
                ident("VAR_A"),
                TokenKind::RBracket,
                TokenKind::Eq,
                ident("gAD"),
                TokenKind::LBracket,
                ident("CN2"),
                TokenKind::RBracket,
                TokenKind::Semicolon,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_keywords_and_motor_call() {
        assert_eq!(
            kinds("while (TRUE) motor(40, -40);"),
            vec![
                TokenKind::While,
                TokenKind::LParen,
                ident("TRUE"),
                TokenKind::RParen,
                ident("motor"),
                TokenKind::LParen,
                TokenKind::Number(40.0),
                TokenKind::Comma,
                TokenKind::Minus,
                TokenKind::Number(40.0),
                TokenKind::RParen,
                TokenKind::Semicolon,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_two_character_operators_win() {
        assert_eq!(
            kinds("i++ <= err>>1"),
            vec![
                ident("i"),
                TokenKind::PlusPlus,
                TokenKind::Le,
                ident("err"),
                TokenKind::GtGt,
                TokenKind::Number(1.0),
                TokenKind::Eof,
            ]
        );
        assert_eq!(kinds("a+ +b")[1..3], [TokenKind::Plus, TokenKind::Plus]);
    }

    #[test]
    fn test_number_forms() {
        let values: Vec<f64> = kinds("0.5 .25 1e3 2.5E-1 0x1F 10u 2.5f 3.")
            .into_iter()
            .filter_map(|kind| match kind {
                TokenKind::Number(n) => Some(n),
                _ => None,
            })
            .collect();

        assert_eq!(values, vec![0.5, 0.25, 1000.0, 0.25, 31.0, 10.0, 2.5, 3.0]);
    }

    #[test]
    fn test_trivia_and_directives_are_skipped() {
        let source = "speed; // cruise\n#define FAST 1\nturn; /* left\nor right */ wait_ms";
        assert_eq!(
            kinds(source),
            vec![
                ident("speed"),
                TokenKind::Semicolon,
                ident("turn"),
                TokenKind::Semicolon,
                ident("wait_ms"),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_locations_follow_body_origin() {
        let tokens = Lexer::with_origin("\n  wait_ms(10);", SourceLocation::new(4, 10))
            .tokenize()
            .unwrap();

        assert_eq!(tokens[0].location, SourceLocation::new(5, 3));
        assert_eq!(tokens[1].location, SourceLocation::new(5, 10));
    }

    #[test]
    fn test_string_literal_rejected() {
        let err = Lexer::new(r#"x = "hello";"#).tokenize().unwrap_err();

        assert!(err.message.contains("String literals"));
        assert_eq!(err.location, SourceLocation::new(1, 5));
    }

    #[test]
    fn test_char_literals_and_display() {
        assert_eq!(
            kinds(r"'a' '\n'")[..2],
            [TokenKind::CharLiteral('a'), TokenKind::CharLiteral('\n')]
        );
        assert_eq!(TokenKind::CharLiteral('\n').to_string(), "char literal '\\x0a'");
        assert_eq!(TokenKind::PercentEq.to_string(), "'%='");
        assert_eq!(TokenKind::Unsigned.to_string(), "'unsigned'");
    }

    #[test]
    fn test_unterminated_comment_points_at_opening() {
        let err = Lexer::new("x;\n /* never closed").tokenize().unwrap_err();
        assert_eq!(err.location, SourceLocation::new(2, 2));
    }
}
