//! Tilt input.
//!
//! [`TiltSensor`] is the capability the game consumes: "give me the current
//! tilt angles". [`Mpu6050`] implements it on top of any blocking
//! `embedded-hal` I2C bus; the simulator implements it from the keyboard.
//!
//! # Units
//!
//! Angles are deci-degrees (`900` = 90 degrees). The game divides them by
//! `MAX_ANGLE_DIVISOR` to get a fixed-point position increment.

use core::fmt;

use embedded_hal::i2c::I2c;
use micromath::F32Ext;

use crate::config::{ACCEL_CLAMP_MG, ACCEL_COUNTS_PER_MG};

// =============================================================================
// Capability
// =============================================================================

/// Tilt angles in deci-degrees. `theta_x` drives rows, `theta_y` drives columns.
#[derive(Clone, Copy, PartialEq, Debug, Default)]
pub struct Angles {
    pub theta_x: f32,
    pub theta_y: f32,
}

impl Angles {
    /// No tilt.
    pub const LEVEL: Self = Self {
        theta_x: 0.0,
        theta_y: 0.0,
    };

    pub const fn new(
        theta_x: f32,
        theta_y: f32,
    ) -> Self {
        Self { theta_x, theta_y }
    }
}

/// Sensor failures. Both are recoverable; the game keeps the last angles.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum SensorError {
    /// Startup presence check failed.
    NotPresent,
    /// Bus transfer failed.
    AcquisitionError,
}

impl fmt::Display for SensorError {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        match self {
            Self::NotPresent => f.write_str("sensor not present"),
            Self::AcquisitionError => f.write_str("bus transfer failed"),
        }
    }
}

/// Source of tilt angles.
pub trait TiltSensor {
    /// Read both tilt angles in one go.
    fn read_tilt_angles(&mut self) -> Result<Angles, SensorError>;

    /// Acceleration behind the most recent successful read, in milli-g (X, Y, Z).
    ///
    /// Only used for trace output. Sensors without raw data return `None`.
    fn acceleration_mg(&self) -> Option<[f32; 3]> { None }
}

impl<S: TiltSensor + ?Sized> TiltSensor for &mut S {
    fn read_tilt_angles(&mut self) -> Result<Angles, SensorError> { (**self).read_tilt_angles() }

    fn acceleration_mg(&self) -> Option<[f32; 3]> { (**self).acceleration_mg() }
}

// =============================================================================
// Conversion
// =============================================================================

/// Convert raw accelerometer counts (+-2 g range) to milli-g.
#[inline]
pub fn counts_to_mg(counts: i16) -> f32 { f32::from(counts) / ACCEL_COUNTS_PER_MG }

/// Convert one axis of milli-g to a tilt angle in deci-degrees.
///
/// The input is clamped to +-1 g first so `asin` stays in its domain.
pub fn mg_to_deci_degrees(mg: f32) -> f32 {
    let clamped = mg.clamp(-ACCEL_CLAMP_MG, ACCEL_CLAMP_MG);
    (clamped / ACCEL_CLAMP_MG).asin().to_degrees() * 10.0
}

// =============================================================================
// MPU-6050 Driver
// =============================================================================

/// 7-bit bus address with AD0 tied low.
pub const MPU6050_ADDRESS: u8 = 0x68;

const REG_PWR_MGMT_1: u8 = 0x6B;
const REG_ACCEL_CONFIG: u8 = 0x1C;
const REG_ACCEL_XOUT_H: u8 = 0x3B;
const REG_WHO_AM_I: u8 = 0x75;
const WHO_AM_I_VALUE: u8 = 0x68;

/// Outcome of [`Mpu6050::init`].
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Presence {
    /// Configured and identity confirmed.
    Ready,
    /// A configuration write failed.
    InitFailed,
    /// Configuration went through but `WHO_AM_I` did not match.
    NotResponding,
}

/// InvenSense MPU-6050 accelerometer on a blocking I2C bus.
pub struct Mpu6050<I2C> {
    i2c: I2C,
    address: u8,
    present: bool,
    last_mg: Option<[f32; 3]>,
}

impl<I2C: I2c> Mpu6050<I2C> {
    /// Wrap the bus. Call [`init`](Self::init) before reading.
    pub const fn new(i2c: I2C) -> Self {
        Self {
            i2c,
            address: MPU6050_ADDRESS,
            present: false,
            last_mg: None,
        }
    }

    /// Wake the device, select +-2 g and verify its identity.
    pub fn init(&mut self) -> Presence {
        let configured = self.write_register(REG_PWR_MGMT_1, 0x00).is_ok()
            && self.write_register(REG_ACCEL_CONFIG, 0x00).is_ok();
        if !configured {
            self.present = false;
            return Presence::InitFailed;
        }

        let mut who = [0u8];
        self.present = self.i2c.write_read(self.address, &[REG_WHO_AM_I], &mut who).is_ok() && who[0] == WHO_AM_I_VALUE;
        if self.present { Presence::Ready } else { Presence::NotResponding }
    }

    /// Check if the last `init` succeeded.
    #[inline]
    pub const fn is_present(&self) -> bool { self.present }

    /// Burst-read the three acceleration axes as raw counts.
    pub fn read_raw(&mut self) -> Result<[i16; 3], SensorError> {
        let mut buf = [0u8; 6];
        self.i2c
            .write_read(self.address, &[REG_ACCEL_XOUT_H], &mut buf)
            .map_err(|_| SensorError::AcquisitionError)?;
        Ok([
            i16::from_be_bytes([buf[0], buf[1]]),
            i16::from_be_bytes([buf[2], buf[3]]),
            i16::from_be_bytes([buf[4], buf[5]]),
        ])
    }

    /// Give the bus back.
    pub fn release(self) -> I2C { self.i2c }

    fn write_register(
        &mut self,
        register: u8,
        value: u8,
    ) -> Result<(), I2C::Error> {
        self.i2c.write(self.address, &[register, value])
    }
}

impl<I2C: I2c> TiltSensor for Mpu6050<I2C> {
    fn read_tilt_angles(&mut self) -> Result<Angles, SensorError> {
        if !self.present {
            return Err(SensorError::NotPresent);
        }
        let raw = self.read_raw()?;
        let mg = raw.map(counts_to_mg);
        self.last_mg = Some(mg);
        Ok(Angles::new(mg_to_deci_degrees(mg[0]), mg_to_deci_degrees(mg[1])))
    }

    fn acceleration_mg(&self) -> Option<[f32; 3]> { self.last_mg }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use embedded_hal::i2c::{ErrorKind, ErrorType, Operation};

    use super::*;

    /// Register-file fake. Reads return consecutive registers from the last written address.
    struct FakeBus {
        registers: [u8; 128],
        pointer: usize,
        fail: bool,
        writes: std::vec::Vec<(u8, u8)>,
    }

    impl FakeBus {
        fn new() -> Self {
            let mut registers = [0u8; 128];
            registers[REG_WHO_AM_I as usize] = WHO_AM_I_VALUE;
            Self {
                registers,
                pointer: 0,
                fail: false,
                writes: std::vec::Vec::new(),
            }
        }

        fn set_accel(
            &mut self,
            counts: [i16; 3],
        ) {
            for (axis, value) in counts.iter().enumerate() {
                let at = REG_ACCEL_XOUT_H as usize + axis * 2;
                self.registers[at..at + 2].copy_from_slice(&value.to_be_bytes());
            }
        }
    }

    impl ErrorType for FakeBus {
        type Error = ErrorKind;
    }

    impl I2c for FakeBus {
        fn transaction(
            &mut self,
            address: u8,
            operations: &mut [Operation<'_>],
        ) -> Result<(), Self::Error> {
            if self.fail || address != MPU6050_ADDRESS {
                return Err(ErrorKind::Other);
            }
            for op in operations {
                match op {
                    Operation::Write(bytes) => {
                        self.pointer = usize::from(bytes[0]);
                        if let [register, value] = bytes[..] {
                            self.writes.push((register, value));
                        }
                    }
                    Operation::Read(buf) => {
                        for byte in buf.iter_mut() {
                            *byte = self.registers[self.pointer];
                            self.pointer += 1;
                        }
                    }
                }
            }
            Ok(())
        }
    }

    #[test]
    fn test_init_configures_and_checks_identity() {
        let mut mpu = Mpu6050::new(FakeBus::new());
        assert_eq!(mpu.init(), Presence::Ready);
        assert!(mpu.is_present());
        let bus = mpu.release();
        assert_eq!(bus.writes, [(REG_PWR_MGMT_1, 0), (REG_ACCEL_CONFIG, 0)]);
    }

    #[test]
    fn test_init_wrong_identity() {
        let mut bus = FakeBus::new();
        bus.registers[REG_WHO_AM_I as usize] = 0x70;
        let mut mpu = Mpu6050::new(bus);
        assert_eq!(mpu.init(), Presence::NotResponding);
        assert_eq!(mpu.read_tilt_angles(), Err(SensorError::NotPresent));
    }

    #[test]
    fn test_init_bus_failure() {
        let mut bus = FakeBus::new();
        bus.fail = true;
        let mut mpu = Mpu6050::new(bus);
        assert_eq!(mpu.init(), Presence::InitFailed);
        assert!(!mpu.is_present());
    }

    #[test]
    fn test_read_raw_is_big_endian_signed() {
        let mut bus = FakeBus::new();
        bus.set_accel([16384, -16384, 42]);
        let mut mpu = Mpu6050::new(bus);
        assert_eq!(mpu.read_raw(), Ok([16384, -16384, 42]));
    }

    #[test]
    fn test_read_angles_full_tilt() {
        let mut bus = FakeBus::new();
        bus.set_accel([16384, 0, 16384]);
        let mut mpu = Mpu6050::new(bus);
        mpu.init();
        let angles = mpu.read_tilt_angles().unwrap();
        assert!((angles.theta_x - 900.0).abs() < 5.0);
        assert!(angles.theta_y.abs() < 1.0);
        let mg = mpu.acceleration_mg().unwrap();
        assert!((mg[2] - 1000.0).abs() < 0.5);
    }

    #[test]
    fn test_read_failure_is_acquisition_error() {
        let mut mpu = Mpu6050::new(FakeBus::new());
        mpu.init();
        let mut bus = mpu.release();
        bus.fail = true;
        let mut mpu = Mpu6050 {
            present: true,
            ..Mpu6050::new(bus)
        };
        assert_eq!(mpu.read_tilt_angles(), Err(SensorError::AcquisitionError));
        assert_eq!(mpu.acceleration_mg(), None);
    }

    #[test]
    fn test_conversion_clamps_before_asin() {
        // Beyond 1 g reads as a full 90 degree tilt instead of NaN.
        let over = mg_to_deci_degrees(1999.0);
        assert!((over - 900.0).abs() < 5.0);
        let under = mg_to_deci_degrees(-1999.0);
        assert!((under + 900.0).abs() < 5.0);
        assert!(mg_to_deci_degrees(0.0).abs() < 0.01);
    }

    #[test]
    fn test_counts_to_mg() {
        assert!((counts_to_mg(16384) - 1000.0).abs() < 0.01);
        assert!((counts_to_mg(-8192) + 500.0).abs() < 0.01);
    }
}
