//! Function argument tokenizer
//!
//! Splits the text between a function's parentheses into arguments:
//! `attr(href, 'it\'s, quoted', "double")` -> `href`, `it's, quoted`, `double`.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("syntax error, {quote} quote not closed")]
pub struct UnclosedQuote {
    pub quote: char,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    /// Nothing consumed for the current argument yet
    Start,
    /// Inside a bare argument
    Bare,
    /// Inside a literal opened by the given quote
    Quoted(char),
    /// A literal was closed; only a comma should follow
    Closed,
    /// A separating comma was just consumed
    Comma,
}

/// Tokenize function arguments
///
/// Commas outside quotes separate arguments, even empty ones (`a,,b` has
/// three). Whitespace around bare arguments is dropped; inside quotes it is
/// kept. A literal opens at the start of an argument or right after another
/// literal, so quotes in the middle of bare text are literal characters.
pub fn tokenize(text: &str) -> Result<Vec<String>, UnclosedQuote> {
    let mut tokens = Vec::new();
    let mut token = String::new();
    let mut state = State::Start;
    let mut chars = text.chars().peekable();

    while let Some(ch) = chars.next() {
        match state {
            State::Quoted(quote) => {
                if ch == quote {
                    tokens.push(std::mem::take(&mut token));
                    state = State::Closed;
                } else if ch == '\\' && chars.peek() == Some(&quote) {
                    token.push(quote);
                    chars.next();
                } else {
                    token.push(ch);
                }
            }
            _ if ch == ',' => {
                // A comma right after another comma closes an empty argument
                if state == State::Bare || state == State::Comma {
                    tokens.push(finish_bare(&mut token));
                }
                state = State::Comma;
            }
            State::Start | State::Comma | State::Closed if ch.is_whitespace() => {}
            State::Start | State::Comma | State::Closed if ch == '\'' || ch == '"' => {
                state = State::Quoted(ch);
            }
            _ => {
                token.push(ch);
                state = State::Bare;
            }
        }
    }

    match state {
        State::Quoted(quote) => Err(UnclosedQuote { quote }),
        State::Bare => {
            tokens.push(finish_bare(&mut token));
            Ok(tokens)
        }
        _ => Ok(tokens),
    }
}

fn finish_bare(token: &mut String) -> String {
    let value = token.trim_end().to_string();
    token.clear();
    value
}
