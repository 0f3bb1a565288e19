//! `avr-objdump -ht` invocation and output parsing.
//!
//! Only two row shapes carry anything we need:
//!
//! ```text
//! Idx Name          Size      VMA       LMA       File off  Algn
//!   0 .data         00000030  00800060  000003e8  00000454  2**0      <- 7 tokens
//! 00000100 l       .text  00000000 crc4tab                            <- 5 tokens (label)
//! 00800090 g     O .bss   00000010 crc4tab                            <- 6 tokens (object)
//! ```
//!
//! Section rows give the size in the third column. Symbol rows give the
//! address in the first column and the name in the last. Every other line,
//! including the section flag lines (`CONTENTS, ALLOC, LOAD, ...`), is ignored.

use std::fmt;
use std::path::Path;
use std::process::{Command, ExitStatus};

use thiserror::Error;

/// Failure to obtain an [`ImageLayout`] from the dump tool.
#[derive(Debug, Error)]
pub enum InspectError {
    /// The tool could not be started (not installed, not executable).
    #[error("failed to run `{program}`")]
    Spawn {
        /// Program that was invoked.
        program: String,
        /// Underlying OS error.
        #[source]
        source: std::io::Error,
    },
    /// The tool ran but reported failure.
    #[error("`{program}` exited with {status}: {stderr}")]
    ToolFailed {
        /// Program that was invoked.
        program: String,
        /// Its exit status.
        status: ExitStatus,
        /// Captured standard error, trimmed.
        stderr: String,
    },
    /// A recognised row carried a value that is not hexadecimal.
    #[error("line {line}: `{token}` is not a hex number")]
    BadNumber {
        /// 1-based line number in the tool output.
        line: usize,
        /// Offending token.
        token: String,
    },
    /// One or more required rows never appeared in the tool output.
    #[error("required section/symbol not found in tool output: {}", .missing.join(", "))]
    MissingFields {
        /// Names of the absent sections and symbol, in report order.
        missing: Vec<String>,
    },
}

/// Sections whose sizes count against the budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    /// Code.
    Text,
    /// Initialised data: stored in flash, copied to RAM at startup.
    Data,
    /// Zero-initialised data: RAM only.
    Bss,
}

impl Section {
    /// All tracked sections, in report order.
    pub const ALL: [Section; 3] = [Section::Text, Section::Data, Section::Bss];

    /// Section name as printed by objdump.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Section::Text => ".text",
            Section::Data => ".data",
            Section::Bss => ".bss",
        }
    }

    /// Look up a section by its objdump name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.name() == name)
    }
}

/// Sizes of the three budgeted sections, in bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SectionSizes {
    /// `.text` size.
    pub text: u64,
    /// `.data` size.
    pub data: u64,
    /// `.bss` size.
    pub bss: u64,
}

impl fmt::Display for SectionSizes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "text: {}, data: {}, bss: {}", self.text, self.data, self.bss)
    }
}

/// Everything the budget checks need from one image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageLayout {
    /// Section sizes.
    pub sizes: SectionSizes,
    /// Address of the lookup-table symbol.
    pub table_address: u64,
}

/// Fields collected while scanning the dump. `None` until the row is seen.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DumpFields {
    /// `.text` size.
    pub text: Option<u64>,
    /// `.data` size.
    pub data: Option<u64>,
    /// `.bss` size.
    pub bss: Option<u64>,
    /// Table symbol address.
    pub table_address: Option<u64>,
}

impl DumpFields {
    fn section_mut(&mut self, section: Section) -> &mut Option<u64> {
        match section {
            Section::Text => &mut self.text,
            Section::Data => &mut self.data,
            Section::Bss => &mut self.bss,
        }
    }

    /// Scan tool output, keeping the last value seen for each field.
    ///
    /// # Errors
    ///
    /// Returns [`InspectError::BadNumber`] if a recognised row has a
    /// non-hex value in its size or address column.
    pub fn scan(output: &str, symbol: &str) -> Result<Self, InspectError> {
        let mut fields = Self::default();

        for (idx, line) in output.lines().enumerate() {
            let line_no = idx.saturating_add(1);
            let tokens: Vec<&str> = line.split_whitespace().collect();

            match tokens.as_slice() {
                [_idx, name, size, _vma, _lma, _off, _algn] => {
                    let Some(section) = Section::from_name(name) else {
                        continue;
                    };
                    let value = parse_hex(size, line_no)?;
                    tracing::debug!(section = section.name(), size = value, line = line_no, "section row");
                    let slot = fields.section_mut(section);
                    if let Some(previous) = slot.replace(value) {
                        tracing::warn!(
                            section = section.name(),
                            previous,
                            value,
                            "section listed more than once, keeping the last"
                        );
                    }
                }
                [addr, _, _, _, name] | [addr, _, _, _, _, name] if *name == symbol => {
                    let value = parse_hex(addr, line_no)?;
                    tracing::debug!(symbol, address = value, line = line_no, "symbol row");
                    if let Some(previous) = fields.table_address.replace(value) {
                        tracing::warn!(symbol, previous, value, "symbol listed more than once, keeping the last");
                    }
                }
                _ => {}
            }
        }

        Ok(fields)
    }

    /// Convert to an [`ImageLayout`] if every field was found.
    ///
    /// # Errors
    ///
    /// Returns [`InspectError::MissingFields`] naming every absent field.
    pub fn into_layout(self, symbol: &str) -> Result<ImageLayout, InspectError> {
        match (self.text, self.data, self.bss, self.table_address) {
            (Some(text), Some(data), Some(bss), Some(table_address)) => Ok(ImageLayout {
                sizes: SectionSizes { text, data, bss },
                table_address,
            }),
            _ => {
                let mut missing: Vec<String> = Section::ALL
                    .into_iter()
                    .filter(|s| match s {
                        Section::Text => self.text.is_none(),
                        Section::Data => self.data.is_none(),
                        Section::Bss => self.bss.is_none(),
                    })
                    .map(|s| s.name().to_string())
                    .collect();
                if self.table_address.is_none() {
                    missing.push(symbol.to_string());
                }
                Err(InspectError::MissingFields { missing })
            }
        }
    }
}

fn parse_hex(token: &str, line: usize) -> Result<u64, InspectError> {
    let digits = token
        .strip_prefix("0x")
        .or_else(|| token.strip_prefix("0X"))
        .unwrap_or(token);
    u64::from_str_radix(digits, 16).map_err(|_| InspectError::BadNumber {
        line,
        token: token.to_string(),
    })
}

/// Parse `avr-objdump -ht` output into an [`ImageLayout`].
///
/// # Errors
///
/// [`InspectError::BadNumber`] for a malformed recognised row,
/// [`InspectError::MissingFields`] if any section or the symbol is absent.
pub fn parse_dump(output: &str, symbol: &str) -> Result<ImageLayout, InspectError> {
    DumpFields::scan(output, symbol)?.into_layout(symbol)
}

/// Run `<program> -ht <artifact>` and return its standard output.
///
/// # Errors
///
/// [`InspectError::Spawn`] if the program cannot be started,
/// [`InspectError::ToolFailed`] if it exits unsuccessfully.
pub fn run_dump_tool(program: &str, artifact: &Path) -> Result<String, InspectError> {
    tracing::debug!(program, artifact = %artifact.display(), "running dump tool");

    let output = Command::new(program)
        .arg("-ht")
        .arg(artifact)
        .output()
        .map_err(|source| InspectError::Spawn {
            program: program.to_string(),
            source,
        })?;

    if !output.status.success() {
        return Err(InspectError::ToolFailed {
            program: program.to_string(),
            status: output.status,
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }

    let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
    tracing::trace!(bytes = stdout.len(), "dump tool output captured");
    Ok(stdout)
}

/// Run the dump tool on `artifact` and parse the result.
///
/// # Errors
///
/// Any [`InspectError`] from [`run_dump_tool`] or [`parse_dump`].
pub fn inspect(program: &str, artifact: &Path, symbol: &str) -> Result<ImageLayout, InspectError> {
    let output = run_dump_tool(program, artifact)?;
    parse_dump(&output, symbol)
}
