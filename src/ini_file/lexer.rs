#[derive(Debug, PartialEq, Eq, Clone)]
pub(crate) enum Token {
    SectionOpen, // [
    Word(String),
    Equals, // =
}

impl Token {
    /// Textual rendering of a token. The parser uses this for whatever token
    /// ends up in a name, key or value position, so a stray `=` or `[` there
    /// is accepted verbatim instead of being rejected.
    pub(crate) fn text(&self) -> &str {
        match self {
            Token::SectionOpen => "[",
            Token::Word(word) => word,
            Token::Equals => "=",
        }
    }
}

#[derive(Debug, PartialEq)]
pub(crate) struct Lexer;

impl Lexer {
    /// Scans raw bytes into a flat token sequence. Never fails: any byte
    /// sequence produces some (possibly empty) sequence of tokens.
    ///
    /// `]` only flushes the pending word, it produces no token of its own.
    /// Spaces and tabs are skipped outright, so whitespace around `=` is
    /// ignored and whitespace *inside* a value disappears. A word still
    /// pending at EOF is dropped, not flushed: text on an unterminated final
    /// line does not survive tokenization.
    pub(crate) fn tokens_from(stream: &[u8]) -> Vec<Token> {
        let mut tokens = Vec::new();
        let mut word: Vec<u8> = Vec::new();

        for (i, &byte) in stream.iter().enumerate() {
            match byte {
                b'[' => {
                    tokens.push(Token::SectionOpen);
                    word.clear();
                }
                b']' => {
                    tokens.push(flush(&mut word));
                }
                b'=' => {
                    tokens.push(flush(&mut word));
                    tokens.push(Token::Equals);
                }
                b'\n' => {
                    // The lookback is into the raw byte stream, not the token
                    // list: a skipped space still counts as the previous byte.
                    // No flush right after a section header or on blank lines.
                    if i > 0 && stream[i - 1] != b']' && stream[i - 1] != b'\n' {
                        tokens.push(flush(&mut word));
                    }
                }
                b' ' | b'\t' => (),
                _ => word.push(byte),
            }
        }

        tokens
    }
}

fn flush(word: &mut Vec<u8>) -> Token {
    let text = String::from_utf8_lossy(word).into_owned();
    word.clear();
    Token::Word(text)
}
