//! Programs that can be executed by the machine.

use std::{fs::File, io::Read, path::Path};

use eyre::WrapErr;
use serde::{Deserialize, Serialize};

/// A program image: the ordered sequence of words loaded into memory at offset 0.
///
/// The image is immutable once loaded; a running machine mutates its own copy of the image
/// through memory writes, so one `Program` can seed any number of instances.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Program {
    /// The words of the program, in memory order.
    pub image: Vec<i64>,
}

impl Program {
    /// Create a new [`Program`] from an in-memory image.
    #[must_use]
    pub fn new(image: Vec<i64>) -> Self {
        Self { image }
    }

    /// Parse a program from its text form: comma-separated decimal integers.
    ///
    /// Lines are trimmed individually, so images split across lines or ending in a newline parse
    /// cleanly.
    pub fn from_source(source: &str) -> eyre::Result<Self> {
        let image = source
            .lines()
            .flat_map(|line| line.trim().split(','))
            .filter(|word| !word.is_empty())
            .map(|word| {
                word.trim()
                    .parse::<i64>()
                    .wrap_err_with(|| format!("invalid program word {word:?}"))
            })
            .collect::<eyre::Result<Vec<i64>>>()?;

        Ok(Self { image })
    }

    /// Parse a program from a file containing its text form.
    pub fn from_file(path: impl AsRef<Path>) -> eyre::Result<Self> {
        let path = path.as_ref();
        let mut source = String::new();
        File::open(path)
            .wrap_err_with(|| format!("failed to open program {}", path.display()))?
            .read_to_string(&mut source)?;
        Self::from_source(&source)
    }

    /// The number of words in the image.
    #[must_use]
    pub fn len(&self) -> usize {
        self.image.len()
    }

    /// Whether the image holds no words.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.image.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::Program;

    #[test]
    fn parses_comma_separated_words() {
        let program = Program::from_source("1,0,0,0,99").unwrap();
        assert_eq!(program.image, [1, 0, 0, 0, 99]);
    }

    #[test]
    fn trims_whitespace_per_line() {
        let program = Program::from_source("  109,1,\n  204,-1\n").unwrap();
        assert_eq!(program.image, [109, 1, 204, -1]);
    }

    #[test]
    fn rejects_non_numeric_words() {
        assert!(Program::from_source("1,two,3").is_err());
    }
}
