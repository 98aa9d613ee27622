//! Formula tokenizer.

use super::ExprError;

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// Identifiers and word operators (`and`, `or`, `not`, `true`, `false`)
    /// -- distinguished in the parser.
    Word(String),
    /// Numeric literal, kept as source text to preserve the exact
    /// decimal representation.
    Number(String),
    /// Quoted string literal, quotes stripped.
    Str(String),
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    EqEq,
    Neq,
    Lt,
    Lte,
    Gt,
    Gte,
    AndAnd,
    OrOr,
    Bang,
    LParen,
    RParen,
    Eof,
}

pub fn lex(src: &str) -> Result<Vec<Token>, ExprError> {
    let chars: Vec<char> = src.chars().collect();
    let mut tokens = Vec::new();
    let mut pos = 0usize;

    while pos < chars.len() {
        let c = chars[pos];

        if c.is_whitespace() {
            pos += 1;
            continue;
        }

        // Number literal
        if c.is_ascii_digit() {
            let start = pos;
            while pos < chars.len() && chars[pos].is_ascii_digit() {
                pos += 1;
            }
            if pos < chars.len() && chars[pos] == '.' {
                pos += 1;
                if pos >= chars.len() || !chars[pos].is_ascii_digit() {
                    return Err(ExprError::Syntax {
                        message: "expected digits after decimal point".to_string(),
                    });
                }
                while pos < chars.len() && chars[pos].is_ascii_digit() {
                    pos += 1;
                }
            }
            tokens.push(Token::Number(chars[start..pos].iter().collect()));
            continue;
        }

        // Identifier or word operator
        if c.is_alphabetic() || c == '_' {
            let start = pos;
            while pos < chars.len() && (chars[pos].is_alphanumeric() || chars[pos] == '_') {
                pos += 1;
            }
            tokens.push(Token::Word(chars[start..pos].iter().collect()));
            continue;
        }

        // String literal
        if c == '\'' || c == '"' {
            let quote = c;
            pos += 1;
            let mut s = String::new();
            loop {
                if pos >= chars.len() {
                    return Err(ExprError::Syntax {
                        message: "unterminated string literal".to_string(),
                    });
                }
                if chars[pos] == quote {
                    pos += 1;
                    break;
                }
                s.push(chars[pos]);
                pos += 1;
            }
            tokens.push(Token::Str(s));
            continue;
        }

        // Operators and punctuation
        let two: Option<Token> = if pos + 1 < chars.len() {
            match (c, chars[pos + 1]) {
                ('=', '=') => Some(Token::EqEq),
                ('!', '=') => Some(Token::Neq),
                ('<', '=') => Some(Token::Lte),
                ('>', '=') => Some(Token::Gte),
                ('&', '&') => Some(Token::AndAnd),
                ('|', '|') => Some(Token::OrOr),
                _ => None,
            }
        } else {
            None
        };
        if let Some(tok) = two {
            tokens.push(tok);
            pos += 2;
            continue;
        }

        let tok = match c {
            '+' => Token::Plus,
            '-' => Token::Minus,
            '*' => Token::Star,
            '/' => Token::Slash,
            '%' => Token::Percent,
            '<' => Token::Lt,
            '>' => Token::Gt,
            '!' => Token::Bang,
            '(' => Token::LParen,
            ')' => Token::RParen,
            other => {
                return Err(ExprError::Syntax {
                    message: format!("unexpected character '{}'", other),
                })
            }
        };
        tokens.push(tok);
        pos += 1;
    }

    tokens.push(Token::Eof);
    Ok(tokens)
}
