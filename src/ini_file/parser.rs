use std::collections::HashMap;

use super::lexer::Token;
use super::Section;

type ParseResult<T> = Result<T, ParseError>;

#[derive(Debug, Eq, PartialEq, thiserror::Error)]
#[error("token {index}: {msg}")]
pub struct ParseError {
    pub(crate) index: usize,
    pub(crate) msg: String,
}

#[derive(Debug)]
pub(crate) struct Parser {
    tokens: Vec<Token>,
    cursor: usize,
}

impl Parser {
    pub(crate) fn new(tokens: Vec<Token>) -> Self {
        Self { tokens, cursor: 0 }
    }

    #[cold]
    fn error(&self, msg: String) -> ParseError {
        ParseError {
            index: self.cursor,
            msg,
        }
    }

    /// Single O(n) pass over the token sequence. Tokens before the first
    /// `SectionOpen` are skipped, as is anything inside a section body that
    /// is not part of a `word = word` triple.
    pub(crate) fn parse(&mut self) -> ParseResult<Vec<Section>> {
        let mut sections = Vec::new();

        while self.cursor < self.tokens.len() {
            match self.tokens[self.cursor] {
                Token::SectionOpen => sections.push(self.parse_section()?),
                _ => self.cursor += 1,
            }
        }

        Ok(sections)
    }

    // Called with the cursor on a `SectionOpen` token. Returns with the
    // cursor one past the section's token span, i.e. on the next
    // `SectionOpen` or past the end.
    fn parse_section(&mut self) -> ParseResult<Section> {
        self.cursor += 1;

        // The token right after `[` names the section, whatever kind it is.
        let name = match self.tokens.get(self.cursor) {
            Some(token) => token.text().to_owned(),
            None => return Err(self.error("section header has no name".into())),
        };

        let mut keys: HashMap<String, String> = HashMap::new();

        while self.cursor < self.tokens.len() && self.tokens[self.cursor] != Token::SectionOpen {
            if self.tokens[self.cursor] == Token::Equals {
                // `cursor >= 1` always holds here: at minimum this section's
                // `[` precedes us, so the key lookback is in bounds.
                let key = self.tokens[self.cursor - 1].text().to_owned();
                // `=` as the very last token has no value. That happens for
                // input without a final newline, where the value was never
                // flushed; the incomplete pair is dropped.
                if let Some(token) = self.tokens.get(self.cursor + 1) {
                    // last write wins for repeated keys
                    keys.insert(key, token.text().to_owned());
                }
            }
            self.cursor += 1;
        }

        Ok(Section { name, keys })
    }
}
