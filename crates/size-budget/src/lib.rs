//! Flash/SRAM budget checks for AVR firmware images.
//!
//! The firmware build links a tiny image (2 KB of flash, 128 bytes of RAM on
//! the default part) and must fail loudly when it no longer fits. This crate
//! turns the output of `avr-objdump -ht` into an [`ImageLayout`] and checks it
//! against a set of [`Limits`].
//!
//! # Pipeline
//!
//! ```text
//! avr-objdump -ht main.elf
//!         ↓
//! objdump::parse_dump  (named fields: .text, .data, .bss, table symbol)
//!         ↓
//! budget::evaluate     (flash, SRAM, page boundary)
//!         ↓
//! Report               (violations + exit status)
//! ```
//!
//! # Example
//!
//! ```
//! use size_budget::{budget, objdump, Limits};
//!
//! let dump = "\
//!   0 .data         00000030  00800060  000003e8  00000454  2**0
//!   1 .text         000003e8  00000000  00000000  00000074  2**1
//!   2 .bss          00000028  00800090  00800090  00000484  2**0
//! 00000100 l       .text  00000000 crc4tab
//! ";
//! let layout = objdump::parse_dump(dump, "crc4tab").unwrap();
//! let report = budget::evaluate(&layout, &Limits::default(), "crc4tab");
//! assert!(report.passed());
//! assert_eq!(layout.sizes.to_string(), "text: 1000, data: 48, bss: 40");
//! ```

// ── Lint policy ─────────────────────────────────────────────────────────────
#![deny(clippy::unwrap_used)] // no .unwrap() in production code
#![deny(clippy::expect_used)] // no .expect() in production code
#![deny(clippy::panic)] // no panic!() in production code
#![deny(unused_must_use)]
// ────────────────────────────────────────────────────────────────────────────
#![warn(missing_docs)]
#![warn(clippy::print_stdout)] // prefer tracing over println! in lib code
#![allow(clippy::module_name_repetitions)]

pub mod budget;
pub mod config;
pub mod objdump;

pub use budget::{Report, Violation};
pub use config::Limits;
pub use objdump::{ImageLayout, InspectError, SectionSizes};
