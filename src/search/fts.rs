//! Preparation of user queries for the FTS5 `MATCH` operator.
//!
//! Phrases, boolean operators, parentheses, column prefixes and trailing
//! `*` are passed through. Bare terms the FTS5 grammar would reject (for
//! example `project-alpha` or `c++`) are wrapped in double quotes.
//!
//! FTS5 has no unary `NOT`. A query opening with `NOT x` is read as "the
//! rest of the query, minus documents matching `x`" and rewritten into a
//! form SQLite can run. A `NOT` without a left operand anywhere else
//! (`(NOT x)`, `a OR NOT b`) cannot be expressed and yields no query.

const COLUMNS: [&str; 2] = ["title", "content"];

/// A prepared full-text condition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum FtsQuery {
    /// Documents matching the expression.
    Match(String),
    /// Documents *not* matching the expression.
    Exclude(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Open,
    Close,
    And,
    Or,
    Not,
    Term(String),
}

impl Token {
    fn is_operator(&self) -> bool {
        matches!(self, Token::And | Token::Or | Token::Not)
    }

    /// Ends an operand, so a following operator has a left-hand side.
    fn ends_operand(&self) -> bool {
        matches!(self, Token::Term(_) | Token::Close)
    }
}

/// Returns `None` when nothing searchable is left or the expression has
/// no FTS5 equivalent.
pub(crate) fn prepare(raw: &str) -> Option<FtsQuery> {
    let tokens = tokenize(raw);
    if !tokens.iter().any(|t| matches!(t, Token::Term(_))) {
        return None;
    }
    assemble(&tokens)
}

fn tokenize(raw: &str) -> Vec<Token> {
    let mut out: Vec<Token> = Vec::new();
    let mut chars = raw.chars().peekable();
    let mut depth = 0usize;

    while let Some(&c) = chars.peek() {
        match c {
            c if c.is_whitespace() => {
                chars.next();
            }
            '(' => {
                chars.next();
                depth += 1;
                out.push(Token::Open);
            }
            ')' => {
                chars.next();
                if depth > 0 {
                    depth -= 1;
                    close_group(&mut out);
                }
            }
            '"' => {
                chars.next();
                let mut phrase = String::new();
                while let Some(c) = chars.next() {
                    if c == '"' {
                        // `""` inside a phrase is an escaped quote
                        if chars.peek() == Some(&'"') {
                            chars.next();
                            phrase.push_str("\"\"");
                            continue;
                        }
                        break;
                    }
                    phrase.push(c);
                }
                let prefix = chars.peek() == Some(&'*');
                if prefix {
                    chars.next();
                }
                if !phrase.trim().is_empty() {
                    let star = if prefix { "*" } else { "" };
                    out.push(Token::Term(format!("\"{phrase}\"{star}")));
                }
            }
            _ => {
                let mut word = String::new();
                while let Some(&c) = chars.peek() {
                    if c.is_whitespace() || matches!(c, '(' | ')' | '"') {
                        break;
                    }
                    word.push(c);
                    chars.next();
                }
                if let Some(token) = token(&word) {
                    push(&mut out, token);
                }
            }
        }
    }

    for _ in 0..depth {
        close_group(&mut out);
    }
    pop_operators(&mut out);
    out
}

fn push(out: &mut Vec<Token>, token: Token) {
    let has_left = out.last().is_some_and(Token::ends_operand);
    match token {
        Token::And | Token::Or if !has_left => {}
        // `a AND NOT b` is FTS5's `a NOT b`
        Token::Not if out.last() == Some(&Token::And) => {
            out.pop();
            out.push(Token::Not);
        }
        token => out.push(token),
    }
}

/// A trailing operator makes the whole expression invalid.
fn pop_operators(out: &mut Vec<Token>) {
    while out.last().is_some_and(Token::is_operator) {
        out.pop();
    }
}

/// Closes the innermost group, dropping it entirely when it is empty.
fn close_group(out: &mut Vec<Token>) {
    pop_operators(out);
    if out.last() == Some(&Token::Open) {
        out.pop();
        pop_operators(out);
    } else {
        out.push(Token::Close);
    }
}

fn token(word: &str) -> Option<Token> {
    match word {
        "AND" => return Some(Token::And),
        "OR" => return Some(Token::Or),
        "NOT" => return Some(Token::Not),
        _ => {}
    }
    term(word).map(Token::Term)
}

fn term(word: &str) -> Option<String> {
    if let Some((column, rest)) = word.split_once(':') {
        if COLUMNS.contains(&column) && !rest.is_empty() {
            return term(rest).map(|t| format!("{column}:{t}"));
        }
    }

    let (body, prefix) = match word.strip_suffix('*') {
        Some(body) => (body.trim_end_matches('*'), true),
        None => (word, false),
    };

    if body.is_empty() {
        return None;
    }

    let star = if prefix { "*" } else { "" };
    if body.chars().all(is_bareword_char) && !matches!(body, "AND" | "OR" | "NOT") {
        Some(format!("{body}{star}"))
    } else {
        Some(format!("\"{}\"{star}", body.replace('"', "\"\"")))
    }
}

fn is_bareword_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || !c.is_ascii()
}

fn assemble(tokens: &[Token]) -> Option<FtsQuery> {
    let Some((Token::Not, tail)) = tokens.split_first() else {
        return plain(tokens).map(FtsQuery::Match);
    };

    let split = operand_len(tail)?;
    let (operand, rest) = tail.split_at(split);
    let excluded = plain(operand)?;

    let query = match rest.split_first() {
        None => FtsQuery::Exclude(excluded),
        // not x OR r  ==  not (x AND not r)
        Some((Token::Or, rest)) => match assemble(rest)? {
            FtsQuery::Match(r) => FtsQuery::Exclude(format!("{excluded} NOT ( {r} )")),
            FtsQuery::Exclude(r) => FtsQuery::Exclude(format!("{excluded} AND ( {r} )")),
        },
        Some((first, after)) => {
            let rest = if *first == Token::And { after } else { rest };
            match assemble(rest)? {
                FtsQuery::Match(r) => FtsQuery::Match(format!("( {r} ) NOT {excluded}")),
                // not x AND not r  ==  not (x OR r)
                FtsQuery::Exclude(r) => FtsQuery::Exclude(format!("{excluded} OR ( {r} )")),
            }
        }
    };
    Some(query)
}

/// Length of the single term or parenthesized group at the head of `tokens`.
fn operand_len(tokens: &[Token]) -> Option<usize> {
    match tokens.first()? {
        Token::Term(_) => Some(1),
        Token::Open => {
            let mut depth = 0usize;
            for (i, token) in tokens.iter().enumerate() {
                match token {
                    Token::Open => depth += 1,
                    Token::Close => {
                        depth -= 1;
                        if depth == 0 {
                            return Some(i + 1);
                        }
                    }
                    _ => {}
                }
            }
            None
        }
        _ => None,
    }
}

/// Renders tokens that need no rewriting; `None` if a `NOT` lacks a left
/// operand.
fn plain(tokens: &[Token]) -> Option<String> {
    let mut parts = Vec::with_capacity(tokens.len());
    let mut prev: Option<&Token> = None;

    for token in tokens {
        if *token == Token::Not && !prev.is_some_and(Token::ends_operand) {
            return None;
        }
        parts.push(match token {
            Token::Open => "(",
            Token::Close => ")",
            Token::And => "AND",
            Token::Or => "OR",
            Token::Not => "NOT",
            Token::Term(term) => term.as_str(),
        });
        prev = Some(token);
    }

    if parts.is_empty() {
        return None;
    }
    Some(parts.join(" "))
}
