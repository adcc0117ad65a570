//! Lexical analysis: maximal-munch tokenization over a source buffer.
//!
//! The lexer hands out one token per call and never looks ahead more than
//! two characters. Two-character operators are matched before their
//! single-character prefixes. Comments produce no token.

use std::fmt::{self, Display};

use miette::Diagnostic;
use thiserror::Error;

/// Kinds of tokens recognised by the front-end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(missing_docs)]
pub enum TokenKind {
    // Keywords
    Fn,
    Int,
    Float,
    Bool,
    Str,
    If,
    Else,
    While,
    For,
    Return,
    Break,
    Continue,
    // Value-carrying
    Ident,
    IntLit,
    FloatLit,
    StrLit,
    BoolLit,
    // Operators
    Assign,
    Eq,
    Ne,
    Lt,
    Gt,
    Le,
    Ge,
    AndAnd,
    OrOr,
    Not,
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    PlusAssign,
    MinusAssign,
    StarAssign,
    SlashAssign,
    PlusPlus,
    MinusMinus,
    // Punctuation
    LParen,
    RParen,
    LBrace,
    RBrace,
    LBracket,
    RBracket,
    Comma,
    Semicolon,
    Eof,
}

impl TokenKind {
    /// Whether this keyword starts a type.
    pub fn is_type(self) -> bool {
        matches!(
            self,
            TokenKind::Int | TokenKind::Float | TokenKind::Bool | TokenKind::Str
        )
    }
}

impl Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            TokenKind::Fn => "`fn`",
            TokenKind::Int => "`int`",
            TokenKind::Float => "`float`",
            TokenKind::Bool => "`bool`",
            TokenKind::Str => "`string`",
            TokenKind::If => "`if`",
            TokenKind::Else => "`else`",
            TokenKind::While => "`while`",
            TokenKind::For => "`for`",
            TokenKind::Return => "`return`",
            TokenKind::Break => "`break`",
            TokenKind::Continue => "`continue`",
            TokenKind::Ident => "identifier",
            TokenKind::IntLit => "integer literal",
            TokenKind::FloatLit => "float literal",
            TokenKind::StrLit => "string literal",
            TokenKind::BoolLit => "bool literal",
            TokenKind::Assign => "`=`",
            TokenKind::Eq => "`==`",
            TokenKind::Ne => "`!=`",
            TokenKind::Lt => "`<`",
            TokenKind::Gt => "`>`",
            TokenKind::Le => "`<=`",
            TokenKind::Ge => "`>=`",
            TokenKind::AndAnd => "`&&`",
            TokenKind::OrOr => "`||`",
            TokenKind::Not => "`!`",
            TokenKind::Plus => "`+`",
            TokenKind::Minus => "`-`",
            TokenKind::Star => "`*`",
            TokenKind::Slash => "`/`",
            TokenKind::Percent => "`%`",
            TokenKind::PlusAssign => "`+=`",
            TokenKind::MinusAssign => "`-=`",
            TokenKind::StarAssign => "`*=`",
            TokenKind::SlashAssign => "`/=`",
            TokenKind::PlusPlus => "`++`",
            TokenKind::MinusMinus => "`--`",
            TokenKind::LParen => "`(`",
            TokenKind::RParen => "`)`",
            TokenKind::LBrace => "`{`",
            TokenKind::RBrace => "`}`",
            TokenKind::LBracket => "`[`",
            TokenKind::RBracket => "`]`",
            TokenKind::Comma => "`,`",
            TokenKind::Semicolon => "`;`",
            TokenKind::Eof => "end of file",
        };
        write!(f, "{}", text)
    }
}

/// A (kind, lexeme) pair. The lexeme of a string literal is its content
/// between the quotes, escapes kept verbatim.
#[derive(Debug, Clone)]
pub struct Token {
    /// Token kind.
    pub kind: TokenKind,
    /// Lexeme text.
    pub text: String,
}

impl Token {
    fn new(kind: TokenKind, text: impl Into<String>) -> Self {
        Token {
            kind,
            text: text.into(),
        }
    }
}

impl Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            TokenKind::Ident
            | TokenKind::IntLit
            | TokenKind::FloatLit
            | TokenKind::StrLit
            | TokenKind::BoolLit => write!(f, "{} `{}`", self.kind, self.text),
            _ => write!(f, "{}", self.kind),
        }
    }
}

/// Error type for the lexer.
#[derive(Debug, Error, Diagnostic)]
pub enum LexError {
    /// A number run flowing into letters, e.g. `3abc`.
    #[error("invalid identifier `{word}`")]
    #[diagnostic(code(tacc::lex::invalid_identifier))]
    InvalidIdentifier {
        /// The whole offending run.
        word: String,
    },
    /// A string literal whose closing quote is missing.
    #[error("unterminated string literal")]
    #[diagnostic(code(tacc::lex::unterminated_string))]
    UnterminatedString,
    /// A `/*` comment whose `*/` is missing.
    #[error("unterminated block comment")]
    #[diagnostic(code(tacc::lex::unterminated_comment))]
    UnterminatedComment,
    /// A character no token starts with.
    #[error("unknown character `{ch}`")]
    #[diagnostic(code(tacc::lex::unknown_char))]
    UnknownChar {
        /// The offending character.
        ch: char,
    },
}

/// Keyword table. Unknown words are identifiers.
fn keyword(word: &str) -> Option<Token> {
    let kind = match word {
        "fn" => TokenKind::Fn,
        "int" => TokenKind::Int,
        "float" => TokenKind::Float,
        "bool" => TokenKind::Bool,
        "string" => TokenKind::Str,
        "if" => TokenKind::If,
        "else" => TokenKind::Else,
        "while" => TokenKind::While,
        "for" => TokenKind::For,
        "return" => TokenKind::Return,
        "break" => TokenKind::Break,
        "continue" => TokenKind::Continue,
        "true" | "false" => TokenKind::BoolLit,
        _ => return None,
    };
    Some(Token::new(kind, word))
}

/// Streaming tokenizer borrowing the source buffer for its lifetime.
pub struct Lexer<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> Lexer<'a> {
    /// Create a lexer over `src` with the cursor at the start.
    pub fn new(src: &'a str) -> Self {
        Lexer { src, pos: 0 }
    }

    /// Lex the whole input into a vector terminated by an `Eof` token.
    pub fn tokenize(mut self) -> Result<Vec<Token>, LexError> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token()?;
            let done = token.kind == TokenKind::Eof;
            tokens.push(token);
            if done {
                return Ok(tokens);
            }
        }
    }

    fn peek(&self) -> Option<u8> {
        self.src.as_bytes().get(self.pos).copied()
    }

    fn peek2(&self) -> Option<u8> {
        self.src.as_bytes().get(self.pos + 1).copied()
    }

    fn bump(&mut self) {
        self.pos += 1;
    }

    /// Produce the next token, advancing the cursor. Returns `Eof`
    /// indefinitely once the input is exhausted.
    pub fn next_token(&mut self) -> Result<Token, LexError> {
        loop {
            while matches!(self.peek(), Some(c) if c.is_ascii_whitespace()) {
                self.bump();
            }
            let Some(c) = self.peek() else {
                return Ok(Token::new(TokenKind::Eof, ""));
            };

            if c.is_ascii_alphabetic() || c == b'_' {
                return Ok(self.read_ident_or_keyword());
            }
            if c.is_ascii_digit() {
                return self.read_number();
            }
            if c == b'"' {
                return self.read_string();
            }
            if c == b'/' {
                match self.peek2() {
                    Some(b'=') => {
                        self.pos += 2;
                        return Ok(Token::new(TokenKind::SlashAssign, "/="));
                    }
                    Some(b'/') => {
                        while !matches!(self.peek(), None | Some(b'\n')) {
                            self.bump();
                        }
                        continue;
                    }
                    Some(b'*') => {
                        self.read_block_comment()?;
                        continue;
                    }
                    _ => {
                        self.bump();
                        return Ok(Token::new(TokenKind::Slash, "/"));
                    }
                }
            }

            return self.read_operator(c);
        }
    }

    fn read_ident_or_keyword(&mut self) -> Token {
        let start = self.pos;
        while matches!(self.peek(), Some(c) if c.is_ascii_alphanumeric() || c == b'_') {
            self.bump();
        }
        let word = &self.src[start..self.pos];
        keyword(word).unwrap_or_else(|| Token::new(TokenKind::Ident, word))
    }

    fn read_number(&mut self) -> Result<Token, LexError> {
        let start = self.pos;
        while matches!(self.peek(), Some(c) if c.is_ascii_digit()) {
            self.bump();
        }
        let mut is_float = false;
        if self.peek() == Some(b'.') {
            is_float = true;
            self.bump();
            while matches!(self.peek(), Some(c) if c.is_ascii_digit()) {
                self.bump();
            }
        }

        // A letter glued to the number claims the whole run, e.g. `3abc`.
        if matches!(self.peek(), Some(c) if c.is_ascii_alphabetic() || c == b'_') {
            while matches!(self.peek(), Some(c) if c.is_ascii_alphanumeric() || c == b'_') {
                self.bump();
            }
            return Err(LexError::InvalidIdentifier {
                word: self.src[start..self.pos].to_string(),
            });
        }

        let kind = if is_float {
            TokenKind::FloatLit
        } else {
            TokenKind::IntLit
        };
        Ok(Token::new(kind, &self.src[start..self.pos]))
    }

    fn read_string(&mut self) -> Result<Token, LexError> {
        self.bump();
        let start = self.pos;
        loop {
            match self.peek() {
                None => return Err(LexError::UnterminatedString),
                Some(b'"') => break,
                Some(b'\\') => {
                    // A backslash escapes whatever follows it.
                    self.bump();
                    self.bump();
                }
                Some(_) => self.bump(),
            }
        }
        let token = Token::new(TokenKind::StrLit, &self.src[start..self.pos]);
        self.bump();
        Ok(token)
    }

    fn read_block_comment(&mut self) -> Result<(), LexError> {
        self.pos += 2;
        loop {
            match self.peek() {
                None => return Err(LexError::UnterminatedComment),
                Some(b'*') if self.peek2() == Some(b'/') => {
                    self.pos += 2;
                    return Ok(());
                }
                Some(_) => self.bump(),
            }
        }
    }

    fn read_operator(&mut self, c: u8) -> Result<Token, LexError> {
        // Two-character forms first.
        let two = match (c, self.peek2()) {
            (b'=', Some(b'=')) => Some((TokenKind::Eq, "==")),
            (b'!', Some(b'=')) => Some((TokenKind::Ne, "!=")),
            (b'<', Some(b'=')) => Some((TokenKind::Le, "<=")),
            (b'>', Some(b'=')) => Some((TokenKind::Ge, ">=")),
            (b'&', Some(b'&')) => Some((TokenKind::AndAnd, "&&")),
            (b'|', Some(b'|')) => Some((TokenKind::OrOr, "||")),
            (b'+', Some(b'+')) => Some((TokenKind::PlusPlus, "++")),
            (b'-', Some(b'-')) => Some((TokenKind::MinusMinus, "--")),
            (b'+', Some(b'=')) => Some((TokenKind::PlusAssign, "+=")),
            (b'-', Some(b'=')) => Some((TokenKind::MinusAssign, "-=")),
            (b'*', Some(b'=')) => Some((TokenKind::StarAssign, "*=")),
            _ => None,
        };
        if let Some((kind, text)) = two {
            self.pos += 2;
            return Ok(Token::new(kind, text));
        }

        let kind = match c {
            b'=' => TokenKind::Assign,
            b'!' => TokenKind::Not,
            b'<' => TokenKind::Lt,
            b'>' => TokenKind::Gt,
            b'+' => TokenKind::Plus,
            b'-' => TokenKind::Minus,
            b'*' => TokenKind::Star,
            b'%' => TokenKind::Percent,
            b'(' => TokenKind::LParen,
            b')' => TokenKind::RParen,
            b'{' => TokenKind::LBrace,
            b'}' => TokenKind::RBrace,
            b'[' => TokenKind::LBracket,
            b']' => TokenKind::RBracket,
            b',' => TokenKind::Comma,
            b';' => TokenKind::Semicolon,
            _ => {
                let ch = self.src[self.pos..].chars().next().unwrap_or('\0');
                return Err(LexError::UnknownChar { ch });
            }
        };
        self.bump();
        Ok(Token::new(kind, (c as char).to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(src: &str) -> Vec<TokenKind> {
        Lexer::new(src)
            .tokenize()
            .unwrap()
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn keywords_and_identifiers() {
        use TokenKind::*;
        assert_eq!(
            kinds("fn int floaty _x x1 while whiles"),
            vec![Fn, Int, Ident, Ident, Ident, While, Ident, Eof]
        );
    }

    #[test]
    fn bool_literals_keep_their_lexeme() {
        let tokens = Lexer::new("true false").tokenize().unwrap();
        assert_eq!(tokens[0].kind, TokenKind::BoolLit);
        assert_eq!(tokens[0].text, "true");
        assert_eq!(tokens[1].text, "false");
    }

    #[test]
    fn maximal_munch_operators() {
        use TokenKind::*;
        assert_eq!(
            kinds("== = <= < ++ + += && ! != %"),
            vec![Eq, Assign, Le, Lt, PlusPlus, Plus, PlusAssign, AndAnd, Not, Ne, Percent, Eof]
        );
        // `+++` munches `++` first.
        assert_eq!(kinds("a+++b"), vec![Ident, PlusPlus, Plus, Ident, Eof]);
    }

    #[test]
    fn slash_assign_wins_over_comment() {
        use TokenKind::*;
        assert_eq!(kinds("a /= b"), vec![Ident, SlashAssign, Ident, Eof]);
    }

    #[test]
    fn numbers() {
        let tokens = Lexer::new("42 3.25 1.").tokenize().unwrap();
        assert_eq!(tokens[0].kind, TokenKind::IntLit);
        assert_eq!(tokens[0].text, "42");
        assert_eq!(tokens[1].kind, TokenKind::FloatLit);
        assert_eq!(tokens[1].text, "3.25");
        assert_eq!(tokens[2].kind, TokenKind::FloatLit);
        assert_eq!(tokens[2].text, "1.");
    }

    #[test]
    fn number_flowing_into_letters_is_invalid() {
        let err = Lexer::new("int 3abc = 1;").tokenize().unwrap_err();
        assert!(matches!(err, LexError::InvalidIdentifier { word } if word == "3abc"));

        let err = Lexer::new("1.5x").tokenize().unwrap_err();
        assert!(matches!(err, LexError::InvalidIdentifier { word } if word == "1.5x"));
    }

    #[test]
    fn string_literals_keep_escapes_verbatim() {
        let tokens = Lexer::new(r#""hi \"there\"""#).tokenize().unwrap();
        assert_eq!(tokens[0].kind, TokenKind::StrLit);
        assert_eq!(tokens[0].text, r#"hi \"there\""#);
    }

    #[test]
    fn unterminated_string() {
        let err = Lexer::new("\"oops").tokenize().unwrap_err();
        assert!(matches!(err, LexError::UnterminatedString));
        // A backslash right before the end must not skip the error.
        let err = Lexer::new("\"oops\\").tokenize().unwrap_err();
        assert!(matches!(err, LexError::UnterminatedString));
    }

    #[test]
    fn comments_yield_no_token() {
        use TokenKind::*;
        assert_eq!(kinds("a // line\n b"), vec![Ident, Ident, Eof]);
        assert_eq!(kinds("a /* x\n y */ b"), vec![Ident, Ident, Eof]);
        assert_eq!(kinds("// only"), vec![Eof]);
    }

    #[test]
    fn unterminated_block_comment() {
        let err = Lexer::new("a /* oops").tokenize().unwrap_err();
        assert!(matches!(err, LexError::UnterminatedComment));
    }

    #[test]
    fn unknown_characters() {
        assert!(matches!(
            Lexer::new("a @ b").tokenize().unwrap_err(),
            LexError::UnknownChar { ch: '@' }
        ));
        // Lone `&` and `|` are not tokens.
        assert!(matches!(
            Lexer::new("a & b").tokenize().unwrap_err(),
            LexError::UnknownChar { ch: '&' }
        ));
    }

    #[test]
    fn eof_is_returned_indefinitely() {
        let mut lexer = Lexer::new("x");
        assert_eq!(lexer.next_token().unwrap().kind, TokenKind::Ident);
        assert_eq!(lexer.next_token().unwrap().kind, TokenKind::Eof);
        assert_eq!(lexer.next_token().unwrap().kind, TokenKind::Eof);
    }
}
