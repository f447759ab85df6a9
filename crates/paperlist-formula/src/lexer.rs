use crate::error::FormulaError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
    Not,
}

impl Op {
    pub fn symbol(self) -> &'static str {
        match self {
            Op::Plus => "+",
            Op::Minus => "-",
            Op::Star => "*",
            Op::Slash => "/",
            Op::Percent => "%",
            Op::Eq => "==",
            Op::Ne => "!=",
            Op::Lt => "<",
            Op::Le => "<=",
            Op::Gt => ">",
            Op::Ge => ">=",
            Op::And => "&&",
            Op::Or => "||",
            Op::Not => "!",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Number(f64),
    /// Bare word or double-quoted name.
    Ident(String),
    /// `#tag`, without the hash.
    Tag(String),
    LParen,
    RParen,
    Comma,
    Question,
    Colon,
    Op(Op),
}

impl Token {
    pub fn describe(&self) -> String {
        match self {
            Token::Number(n) => n.to_string(),
            Token::Ident(name) => name.clone(),
            Token::Tag(tag) => format!("#{tag}"),
            Token::LParen => "(".to_string(),
            Token::RParen => ")".to_string(),
            Token::Comma => ",".to_string(),
            Token::Question => "?".to_string(),
            Token::Colon => ":".to_string(),
            Token::Op(op) => op.symbol().to_string(),
        }
    }
}

fn is_tag_char(ch: char) -> bool {
    ch.is_alphanumeric() || matches!(ch, '_' | '-' | '.' | ':' | '!' | '@' | '~')
}

pub fn tokenize(source: &str) -> Result<Vec<Token>, FormulaError> {
    let mut tokens = Vec::new();
    let mut chars = source.char_indices().peekable();

    while let Some((position, ch)) = chars.next() {
        let token = match ch {
            c if c.is_whitespace() => continue,
            '(' => Token::LParen,
            ')' => Token::RParen,
            ',' => Token::Comma,
            '?' => Token::Question,
            ':' => Token::Colon,
            '+' => Token::Op(Op::Plus),
            '-' => Token::Op(Op::Minus),
            '*' => Token::Op(Op::Star),
            '/' => Token::Op(Op::Slash),
            '%' => Token::Op(Op::Percent),
            '=' if chars.next_if(|(_, c)| *c == '=').is_some() => Token::Op(Op::Eq),
            '!' if chars.next_if(|(_, c)| *c == '=').is_some() => Token::Op(Op::Ne),
            '!' => Token::Op(Op::Not),
            '<' if chars.next_if(|(_, c)| *c == '=').is_some() => Token::Op(Op::Le),
            '<' => Token::Op(Op::Lt),
            '>' if chars.next_if(|(_, c)| *c == '=').is_some() => Token::Op(Op::Ge),
            '>' => Token::Op(Op::Gt),
            '&' if chars.next_if(|(_, c)| *c == '&').is_some() => Token::Op(Op::And),
            '|' if chars.next_if(|(_, c)| *c == '|').is_some() => Token::Op(Op::Or),
            '#' => {
                let mut tag = String::new();
                while let Some((_, c)) = chars.next_if(|(_, c)| is_tag_char(*c)) {
                    tag.push(c);
                }
                if tag.is_empty() {
                    return Err(FormulaError::UnexpectedChar { ch, position });
                }
                Token::Tag(tag)
            }
            '"' => {
                let mut name = String::new();
                loop {
                    match chars.next() {
                        Some((_, '"')) => break,
                        Some((_, c)) => name.push(c),
                        None => return Err(FormulaError::UnexpectedEnd),
                    }
                }
                Token::Ident(name)
            }
            c if c.is_ascii_digit() || c == '.' => {
                let mut text = String::from(c);
                while let Some((_, c)) = chars.next_if(|(_, c)| c.is_ascii_digit() || *c == '.') {
                    text.push(c);
                }
                let value = text
                    .parse()
                    .map_err(|_| FormulaError::Syntax { near: text.clone() })?;
                Token::Number(value)
            }
            c if c.is_alphabetic() || c == '_' => {
                let mut name = String::from(c);
                while let Some((_, c)) = chars.next_if(|(_, c)| c.is_alphanumeric() || *c == '_') {
                    name.push(c);
                }
                Token::Ident(name)
            }
            _ => return Err(FormulaError::UnexpectedChar { ch, position }),
        };
        tokens.push(token);
    }

    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokenizes_operators_tags_and_quoted_names() {
        let tokens = tokenize(r#"avg("Overall merit") >= 2.5 && #accept"#).expect("tokens");
        assert_eq!(
            tokens,
            vec![
                Token::Ident("avg".to_string()),
                Token::LParen,
                Token::Ident("Overall merit".to_string()),
                Token::RParen,
                Token::Op(Op::Ge),
                Token::Number(2.5),
                Token::Op(Op::And),
                Token::Tag("accept".to_string()),
            ]
        );
    }

    #[test]
    fn rejects_stray_characters() {
        assert_eq!(
            tokenize("pid $ 2"),
            Err(FormulaError::UnexpectedChar {
                ch: '$',
                position: 4
            })
        );
        assert_eq!(tokenize("\"open"), Err(FormulaError::UnexpectedEnd));
        assert!(tokenize("1.2.3").is_err());
    }
}
