//! Board wiring and bus settings.
//!
//! Pin mapping (Pico 2):
//! - DEM 128064B data bus D0..D7: GPIO0..GPIO7
//! - CS1: GPIO8, CS2: GPIO9, RST: GPIO10, RW: GPIO11, DI: GPIO12, E: GPIO13
//! - MPU-6050 on I2C0: SDA GPIO20, SCL GPIO21
//! - Diagnostic UART0 TX: GPIO16
//!
//! Pin numbers are documented here and used directly in `main.rs`, where the
//! embassy peripheral singletons are taken.

use tilt_dodge_common::config::TICK_RATE_HZ;

/// MPU-6050 bus clock (fast mode).
pub const I2C_FREQUENCY_HZ: u32 = 400_000;

/// Diagnostic UART baud rate.
pub const UART_BAUDRATE: u32 = 115_200;

/// Scheduler tick period in microseconds.
pub const TICK_PERIOD_US: u64 = 1_000_000 / TICK_RATE_HZ as u64;

const _: () = assert!(1_000_000 % TICK_RATE_HZ == 0);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tick_period_is_one_millisecond() {
        assert_eq!(TICK_PERIOD_US, 1_000);
    }
}
