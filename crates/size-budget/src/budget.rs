//! Flash, SRAM and table placement checks.
//!
//! Every check runs on every image; a failure in one never hides another.

use std::fmt;

use crate::config::Limits;
use crate::objdump::{ImageLayout, SectionSizes};

/// Highest offset within a 256-byte page at which the lookup table may start.
///
/// The table is 16 bytes, so starting at `0xF0` ends exactly on the page's
/// last byte. Anything later spills into the next page.
pub const TABLE_PAGE_LIMIT: u8 = 0xF0;

/// Exit status when every check passed.
pub const EXIT_PASS: u8 = 0;

/// Exit status when at least one check failed.
pub const EXIT_VIOLATION: u8 = 1;

/// One failed check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Violation {
    /// `.text + .data` does not fit in flash.
    FlashExceeded {
        /// Bytes over the limit.
        overflow: u64,
    },
    /// `.data + .bss` does not fit in RAM once the stack is reserved.
    SramExceeded {
        /// Bytes over the limit.
        overflow: u64,
    },
    /// The lookup table starts too close to the end of its page.
    PageBoundary {
        /// Symbol that was checked.
        symbol: String,
        /// Low byte of its address.
        low_byte: u8,
    },
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Violation::FlashExceeded { overflow } => {
                write!(f, "Flash size limit exceeded by {overflow} bytes.")
            }
            Violation::SramExceeded { overflow } => {
                write!(f, "SRAM size limit exceeded by {overflow} bytes.")
            }
            Violation::PageBoundary { symbol, .. } => {
                write!(f, "The table {symbol} should not cross a page boundary.")
            }
        }
    }
}

/// Outcome of checking one image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    /// Sizes the checks were run against.
    pub sizes: SectionSizes,
    /// Failed checks, in check order (flash, SRAM, page boundary).
    pub violations: Vec<Violation>,
}

impl Report {
    /// `true` if no check failed.
    #[must_use]
    pub fn passed(&self) -> bool {
        self.violations.is_empty()
    }

    /// Process exit status for this report.
    #[must_use]
    pub fn exit_status(&self) -> u8 {
        if self.passed() {
            EXIT_PASS
        } else {
            EXIT_VIOLATION
        }
    }
}

/// Bytes by which code plus initialised data overflow flash, if any.
///
/// The initial values of `.data` are stored in flash, so `.data` counts here
/// as well as against RAM.
#[must_use]
pub fn flash_overflow(sizes: &SectionSizes, limits: &Limits) -> Option<u64> {
    sizes
        .text
        .saturating_add(sizes.data)
        .checked_sub(limits.flash_capacity())
        .filter(|&overflow| overflow > 0)
}

/// Bytes by which static data overflow the RAM left after the stack reserve.
///
/// Computed as `bss + data + stack - ram` so a stack reserve larger than RAM
/// adds its excess to the overflow instead of wrapping.
#[must_use]
pub fn sram_overflow(sizes: &SectionSizes, limits: &Limits) -> Option<u64> {
    sizes
        .bss
        .saturating_add(sizes.data)
        .saturating_add(limits.stack_reserve())
        .checked_sub(limits.ram_capacity())
        .filter(|&overflow| overflow > 0)
}

/// Low byte of `address`, its offset within a 256-byte page.
#[must_use]
pub fn page_offset(address: u64) -> u8 {
    let [low, ..] = address.to_le_bytes();
    low
}

/// `true` if a table starting at `address` crosses into the next page.
#[must_use]
pub fn crosses_page(address: u64) -> bool {
    page_offset(address) > TABLE_PAGE_LIMIT
}

/// Run every check against `layout`.
pub fn evaluate(layout: &ImageLayout, limits: &Limits, symbol: &str) -> Report {
    let sizes = layout.sizes;
    let mut violations = Vec::new();

    if let Some(overflow) = flash_overflow(&sizes, limits) {
        violations.push(Violation::FlashExceeded { overflow });
    }
    if let Some(overflow) = sram_overflow(&sizes, limits) {
        violations.push(Violation::SramExceeded { overflow });
    }
    if crosses_page(layout.table_address) {
        let low_byte = page_offset(layout.table_address);
        tracing::debug!(
            symbol,
            address = layout.table_address,
            low_byte,
            limit = TABLE_PAGE_LIMIT,
            "table starts past the last safe page offset"
        );
        violations.push(Violation::PageBoundary {
            symbol: symbol.to_string(),
            low_byte,
        });
    }

    tracing::debug!(
        flash_used = sizes.text.saturating_add(sizes.data),
        flash_capacity = limits.flash_capacity(),
        ram_used = sizes.bss.saturating_add(sizes.data),
        usable_ram = limits.usable_ram(),
        table_offset = page_offset(layout.table_address),
        violations = violations.len(),
        "budget evaluated"
    );

    Report { sizes, violations }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    fn layout(text: u64, data: u64, bss: u64, table_address: u64) -> ImageLayout {
        ImageLayout {
            sizes: SectionSizes { text, data, bss },
            table_address,
        }
    }

    #[test]
    fn scenario_a_fits_defaults() {
        let report = evaluate(&layout(1000, 48, 40, 0x140), &Limits::default(), "crc4tab");
        assert!(report.passed());
        assert_eq!(report.exit_status(), 0);
        assert_eq!(report.sizes.to_string(), "text: 1000, data: 48, bss: 40");
    }

    #[test]
    fn scenario_b_flash_overflow_by_52() {
        let report = evaluate(&layout(2000, 100, 10, 0x140), &Limits::default(), "crc4tab");
        // 100 + 10 = 110 > 96 as well.
        assert_eq!(
            report.violations,
            vec![
                Violation::FlashExceeded { overflow: 52 },
                Violation::SramExceeded { overflow: 14 },
            ]
        );
        assert_eq!(
            report.violations[0].to_string(),
            "Flash size limit exceeded by 52 bytes."
        );
        assert_eq!(report.exit_status(), 1);
    }

    #[test]
    fn scenario_c_table_crosses_page() {
        let report = evaluate(&layout(100, 0, 0, 0x1F5), &Limits::default(), "crc4tab");
        assert_eq!(
            report.violations,
            vec![Violation::PageBoundary {
                symbol: "crc4tab".into(),
                low_byte: 0xF5
            }]
        );
        assert_eq!(
            report.violations[0].to_string(),
            "The table crc4tab should not cross a page boundary."
        );
        assert_eq!(report.exit_status(), 1);
    }

    #[test]
    fn exact_fit_passes() {
        let limits = Limits::default();
        assert_eq!(flash_overflow(&SectionSizes { text: 2000, data: 48, bss: 0 }, &limits), None);
        assert_eq!(sram_overflow(&SectionSizes { text: 0, data: 48, bss: 48 }, &limits), None);
    }

    #[test]
    fn one_byte_over_sram() {
        let sizes = SectionSizes { text: 0, data: 48, bss: 49 };
        assert_eq!(sram_overflow(&sizes, &Limits::default()), Some(1));
        assert_eq!(
            Violation::SramExceeded { overflow: 1 }.to_string(),
            "SRAM size limit exceeded by 1 bytes."
        );
    }

    #[test]
    fn stack_reserve_shrinks_sram_budget() {
        let sizes = SectionSizes { text: 0, data: 0, bss: 100 };
        assert_eq!(sram_overflow(&sizes, &Limits::new(0, 2048, 128)), None);
        assert_eq!(sram_overflow(&sizes, &Limits::new(64, 2048, 128)), Some(36));
    }

    #[test]
    fn stack_larger_than_ram_reports_full_shortfall() {
        // 40 + 48 - (128 - 200) = 160
        let report = evaluate(&layout(1000, 48, 40, 0x140), &Limits::new(200, 2048, 128), "crc4tab");
        assert_eq!(report.violations, vec![Violation::SramExceeded { overflow: 160 }]);
        assert_eq!(
            report.violations[0].to_string(),
            "SRAM size limit exceeded by 160 bytes."
        );
        assert_eq!(report.exit_status(), 1);
    }

    #[test]
    fn stack_larger_than_ram_with_empty_image_still_fails() {
        let sizes = SectionSizes { text: 0, data: 0, bss: 0 };
        assert_eq!(sram_overflow(&sizes, &Limits::new(129, 2048, 128)), Some(1));
    }

    #[test]
    fn page_limit_is_inclusive() {
        assert!(!crosses_page(0xF0));
        assert!(crosses_page(0xF1));
        assert!(!crosses_page(0x0080_0100));
        assert!(crosses_page(0x0080_01FF));
    }

    #[test]
    fn all_checks_run_when_all_fail() {
        let report = evaluate(&layout(3000, 200, 200, 0xFF), &Limits::default(), "crc4tab");
        assert_eq!(report.violations.len(), 3);
    }
}
