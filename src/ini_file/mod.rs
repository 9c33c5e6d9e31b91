mod document;
mod file;
mod lexer;
mod parser;

pub(crate) use self::document::Section;
pub(crate) use self::file::{IniFile, IoError};

pub(crate) type Error = parser::ParseError;
