//! Memory limits of the target part.
//!
//! Defaults match the ATtiny2313 the firmware was first written for. Board
//! variants override them positionally on the command line.

/// Bytes of RAM set aside for the call stack.
pub const DEFAULT_STACK_RESERVE: u64 = 32;

/// Total program flash of the default part.
pub const DEFAULT_FLASH_CAPACITY: u64 = 2048;

/// Total SRAM of the default part.
pub const DEFAULT_RAM_CAPACITY: u64 = 128;

/// Dump tool invoked when none is given.
pub const DEFAULT_OBJDUMP: &str = "avr-objdump";

/// Lookup table whose placement is checked when none is given.
pub const DEFAULT_TABLE_SYMBOL: &str = "crc4tab";

/// Flash and RAM budget for one firmware image.
///
/// A stack reserve larger than RAM is accepted: it leaves no room for static
/// data, and the SRAM check reports the full shortfall.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    stack_reserve: u64,
    flash_capacity: u64,
    ram_capacity: u64,
}

impl Limits {
    /// Build a set of limits.
    #[must_use]
    pub const fn new(stack_reserve: u64, flash_capacity: u64, ram_capacity: u64) -> Self {
        Self {
            stack_reserve,
            flash_capacity,
            ram_capacity,
        }
    }

    /// Bytes of RAM reserved for the stack.
    #[must_use]
    pub fn stack_reserve(&self) -> u64 {
        self.stack_reserve
    }

    /// Total program flash in bytes.
    #[must_use]
    pub fn flash_capacity(&self) -> u64 {
        self.flash_capacity
    }

    /// Total SRAM in bytes.
    #[must_use]
    pub fn ram_capacity(&self) -> u64 {
        self.ram_capacity
    }

    /// RAM left for `.data` and `.bss` once the stack is reserved.
    ///
    /// Zero when the stack reserve alone exceeds RAM.
    #[must_use]
    pub fn usable_ram(&self) -> u64 {
        self.ram_capacity.saturating_sub(self.stack_reserve)
    }
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            stack_reserve: DEFAULT_STACK_RESERVE,
            flash_capacity: DEFAULT_FLASH_CAPACITY,
            ram_capacity: DEFAULT_RAM_CAPACITY,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_attiny2313() {
        let limits = Limits::default();
        assert_eq!(limits.stack_reserve(), 32);
        assert_eq!(limits.flash_capacity(), 2048);
        assert_eq!(limits.ram_capacity(), 128);
        assert_eq!(limits.usable_ram(), 96);
    }

    #[test]
    fn stack_equal_to_ram_leaves_nothing() {
        let limits = Limits::new(128, 2048, 128);
        assert_eq!(limits.usable_ram(), 0);
    }

    #[test]
    fn stack_larger_than_ram_is_accepted() {
        let limits = Limits::new(200, 2048, 128);
        assert_eq!(limits.stack_reserve(), 200);
        assert_eq!(limits.usable_ram(), 0);
    }

    #[test]
    fn new_keeps_overrides() {
        let limits = Limits::new(64, 4096, 256);
        assert_eq!(limits.flash_capacity(), 4096);
        assert_eq!(limits.usable_ram(), 192);
    }
}
