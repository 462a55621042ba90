//! File-writer sink used by code generators
//!
//! Code generators produce one file per namespace through this collaborator
//! interface. Implementations must release the open file on every exit
//! path: [`FileWriter::close_file`] is the only way content becomes
//! visible, and dropping a writer with a file still open discards the
//! pending content rather than leaking a handle.

use crate::error::{ConcertoError, Result};
use indexmap::IndexMap;

/// Sink for generated files
pub trait FileWriter {
    /// Open a file for writing; fails if one is already open
    fn open_file(&mut self, name: &str) -> Result<()>;

    /// Append an indented line to the open file
    fn write_line(&mut self, indent: usize, text: &str) -> Result<()>;

    /// Queue a line to be emitted before the file's body on close
    fn write_before_line(&mut self, text: &str) -> Result<()>;

    /// Finish the open file and release it
    fn close_file(&mut self) -> Result<()>;
}

/// Collects generated files in memory, keyed by name
#[derive(Debug, Default)]
pub struct InMemoryFileWriter {
    files: IndexMap<String, String>,
    current: Option<String>,
    body: String,
    before: Vec<String>,
}

impl InMemoryFileWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// The finished files, in open order
    pub fn files(&self) -> &IndexMap<String, String> {
        &self.files
    }

    /// The content of one finished file
    pub fn get_file(&self, name: &str) -> Option<&str> {
        self.files.get(name).map(String::as_str)
    }
}

impl FileWriter for InMemoryFileWriter {
    fn open_file(&mut self, name: &str) -> Result<()> {
        if self.current.is_some() {
            return Err(ConcertoError::Io(std::io::Error::other(format!(
                "cannot open {}: a file is already open",
                name
            ))));
        }
        self.current = Some(name.to_string());
        self.body.clear();
        self.before.clear();
        Ok(())
    }

    fn write_line(&mut self, indent: usize, text: &str) -> Result<()> {
        if self.current.is_none() {
            return Err(ConcertoError::Io(std::io::Error::other(
                "no file is open",
            )));
        }
        for _ in 0..indent {
            self.body.push_str("   ");
        }
        self.body.push_str(text);
        self.body.push('\n');
        Ok(())
    }

    fn write_before_line(&mut self, text: &str) -> Result<()> {
        if self.current.is_none() {
            return Err(ConcertoError::Io(std::io::Error::other(
                "no file is open",
            )));
        }
        self.before.push(text.to_string());
        Ok(())
    }

    fn close_file(&mut self) -> Result<()> {
        let name = self.current.take().ok_or_else(|| {
            ConcertoError::Io(std::io::Error::other("no file is open"))
        })?;
        let mut content = String::new();
        for line in self.before.drain(..) {
            content.push_str(&line);
            content.push('\n');
        }
        content.push_str(&self.body);
        self.body.clear();
        self.files.insert(name, content);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_and_close() {
        let mut writer = InMemoryFileWriter::new();
        writer.open_file("org.acme.sample.ts").unwrap();
        writer.write_line(0, "export class Thing {").unwrap();
        writer.write_line(1, "id: string;").unwrap();
        writer.write_line(0, "}").unwrap();
        writer.close_file().unwrap();

        assert_eq!(
            writer.get_file("org.acme.sample.ts"),
            Some("export class Thing {\n   id: string;\n}\n")
        );
    }

    #[test]
    fn test_before_lines_prepend_on_close() {
        let mut writer = InMemoryFileWriter::new();
        writer.open_file("out").unwrap();
        writer.write_line(0, "body").unwrap();
        writer.write_before_line("// header").unwrap();
        writer.close_file().unwrap();

        assert_eq!(writer.get_file("out"), Some("// header\nbody\n"));
    }

    #[test]
    fn test_double_open_rejected() {
        let mut writer = InMemoryFileWriter::new();
        writer.open_file("a").unwrap();
        assert!(writer.open_file("b").is_err());
    }

    #[test]
    fn test_write_without_open_rejected() {
        let mut writer = InMemoryFileWriter::new();
        assert!(writer.write_line(0, "text").is_err());
        assert!(writer.close_file().is_err());
    }
}
