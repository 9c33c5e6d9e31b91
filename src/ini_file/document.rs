use std::collections::HashMap;
use std::io;

use super::lexer::Lexer;
use super::parser::Parser;

/// A named group of `key=value` entries headed by `[name]`.
///
/// Key order is not part of the model; serialization sorts keys so that
/// output is deterministic. Repeated keys in the source are last-write-wins.
#[derive(Clone, Debug, Default, PartialEq)]
pub(crate) struct Section {
    pub(crate) name: String,
    pub(crate) keys: HashMap<String, String>,
}

impl Section {
    pub(crate) fn new<S: Into<String>>(name: S) -> Self {
        Section {
            name: name.into(),
            keys: HashMap::default(),
        }
    }

    pub(crate) fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn has_key(&self, key: &str) -> bool {
        self.keys.contains_key(key)
    }

    pub(crate) fn get(&self, key: &str) -> Option<&str> {
        self.keys.get(key).map(String::as_str)
    }

    pub(crate) fn set<K, V>(&mut self, key: K, value: V)
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.keys.insert(key.into(), value.into());
    }

    fn sorted_keys(&self) -> Vec<&String> {
        let mut keys: Vec<&String> = self.keys.keys().collect();
        keys.sort_unstable();
        keys
    }

    /// Renders `[name]`, the entries in sorted key order, and a blank
    /// separator line. Keys and values are written verbatim: `=`, brackets
    /// or whitespace inside them are not escaped and will not round-trip.
    pub(crate) fn write_to<W: io::Write>(&self, writer: &mut W) -> io::Result<()> {
        writeln!(writer, "[{}]", self.name)?;
        for key in self.sorted_keys() {
            writeln!(writer, "{}={}", key, self.keys[key])?;
        }
        writeln!(writer)?;

        Ok(())
    }
}

/// All sections of one credentials file, in order of appearance.
#[derive(Clone, Debug, Default, PartialEq)]
pub(crate) struct IniDocument {
    pub(crate) sections: Vec<Section>,
}

impl IniDocument {
    pub(crate) fn new() -> Self {
        IniDocument {
            sections: Vec::default(),
        }
    }

    pub(crate) fn load_from_slice(data: &[u8]) -> Result<Self, super::Error> {
        let tokens = Lexer::tokens_from(data);
        let sections = Parser::new(tokens).parse()?;

        Ok(IniDocument { sections })
    }

    pub(crate) fn len(&self) -> usize {
        self.sections.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    pub(crate) fn has_section(&self, name: &str) -> bool {
        self.sections.iter().any(|s| s.name == name)
    }

    pub(crate) fn section(&self, name: &str) -> Option<&Section> {
        self.sections.iter().find(|s| s.name == name)
    }

    pub(crate) fn section_mut(&mut self, name: &str) -> Option<&mut Section> {
        self.sections.iter_mut().find(|s| s.name == name)
    }

    pub(crate) fn section_names(&self) -> Vec<String> {
        self.sections.iter().map(|s| s.name.clone()).collect()
    }

    pub(crate) fn add_section(&mut self, section: Section) {
        self.sections.push(section);
    }

    pub(crate) fn write_to<W: io::Write>(&self, writer: &mut W) -> io::Result<()> {
        for section in &self.sections {
            section.write_to(writer)?;
        }

        Ok(())
    }
}
