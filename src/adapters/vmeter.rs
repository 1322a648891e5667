//! Voltmeter unit adapter
//!
//! This adapter implements the VoltagePort trait for an isolated voltmeter
//! unit built around a TI ADS1115 16-bit converter behind an input divider,
//! with per-gain factory calibration stored in an I2C EEPROM.

use embedded_hal_async::delay::DelayNs;
use embedded_hal_async::i2c::I2c;

use crate::config::{
    VMETER_DIVIDER_COEFFICIENT, VMETER_EEPROM_I2C_ADDR, VMETER_I2C_ADDR, VOLTAGE_CORRECTION,
};
use crate::domain::RawSample;
use crate::ports::sensor::{SensorError, VoltagePort};

/// ADS1115 conversion result register
const REG_CONVERSION: u8 = 0x00;
/// ADS1115 configuration register
const REG_CONFIG: u8 = 0x01;

/// Start a single conversion (write) / conversion idle (read)
const CONFIG_OS: u16 = 1 << 15;
/// Differential input AIN0 - AIN1
const CONFIG_MUX_AIN0_AIN1: u16 = 0b000 << 12;
/// Comparator disabled
const CONFIG_COMP_QUE_DISABLE: u16 = 0b11;

/// Extra polls of the OS bit after the nominal conversion time
const CONVERSION_POLLS: u8 = 10;

/// Size of one calibration record in the EEPROM
const CALIBRATION_RECORD_LEN: usize = 8;

/// Programmable gain amplifier setting (full-scale range at the converter pins)
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Gain {
    /// ±6.144 V
    Pga6144,
    /// ±4.096 V
    Pga4096,
    /// ±2.048 V
    Pga2048,
    /// ±1.024 V
    Pga1024,
    /// ±0.512 V
    Pga512,
    /// ±0.256 V
    Pga256,
}

impl Gain {
    /// PGA field value
    const fn code(self) -> u8 {
        match self {
            Gain::Pga6144 => 0b000,
            Gain::Pga4096 => 0b001,
            Gain::Pga2048 => 0b010,
            Gain::Pga1024 => 0b011,
            Gain::Pga512 => 0b100,
            Gain::Pga256 => 0b101,
        }
    }

    /// Size of one converter LSB in millivolts
    pub const fn lsb_mv(self) -> f32 {
        match self {
            Gain::Pga6144 => 0.187_5,
            Gain::Pga4096 => 0.125,
            Gain::Pga2048 => 0.062_5,
            Gain::Pga1024 => 0.031_25,
            Gain::Pga512 => 0.015_625,
            Gain::Pga256 => 0.007_812_5,
        }
    }

    /// EEPROM address of this gain's factory calibration record
    pub const fn calibration_address(self) -> u8 {
        0xD0 + self.code() * CALIBRATION_RECORD_LEN as u8
    }
}

/// Conversion rate in samples per second
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DataRate {
    Sps8,
    Sps16,
    Sps32,
    Sps64,
    Sps128,
    Sps250,
    Sps475,
    Sps860,
}

impl DataRate {
    /// DR field value
    const fn code(self) -> u8 {
        match self {
            DataRate::Sps8 => 0b000,
            DataRate::Sps16 => 0b001,
            DataRate::Sps32 => 0b010,
            DataRate::Sps64 => 0b011,
            DataRate::Sps128 => 0b100,
            DataRate::Sps250 => 0b101,
            DataRate::Sps475 => 0b110,
            DataRate::Sps860 => 0b111,
        }
    }

    /// Nominal time of one single-shot conversion, rounded up, in milliseconds
    pub const fn conversion_time_ms(self) -> u32 {
        match self {
            DataRate::Sps8 => 126,
            DataRate::Sps16 => 63,
            DataRate::Sps32 => 32,
            DataRate::Sps64 => 16,
            DataRate::Sps128 => 8,
            DataRate::Sps250 => 4,
            DataRate::Sps475 => 3,
            DataRate::Sps860 => 2,
        }
    }
}

/// Voltmeter unit wiring and acquisition settings
#[derive(Clone, Copy, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct VmeterConfig {
    /// Converter I2C address
    pub address: u8,
    /// Calibration EEPROM I2C address
    pub eeprom_address: u8,
    /// PGA setting
    pub gain: Gain,
    /// Conversion rate
    pub rate: DataRate,
    /// Empirical correction applied on top of the factory calibration
    pub correction: f32,
}

impl Default for VmeterConfig {
    fn default() -> Self {
        Self {
            address: VMETER_I2C_ADDR,
            eeprom_address: VMETER_EEPROM_I2C_ADDR,
            gain: Gain::Pga2048,
            rate: DataRate::Sps8,
            correction: VOLTAGE_CORRECTION,
        }
    }
}

impl VmeterConfig {
    /// Config register value for a single-shot conversion
    ///
    /// `start` sets the OS bit, which triggers a conversion when written.
    fn config_word(&self, start: bool) -> u16 {
        let os = if start { CONFIG_OS } else { 0 };
        os | CONFIG_MUX_AIN0_AIN1
            | (self.gain.code() as u16) << 9
            | 1 << 8 // single-shot mode
            | (self.rate.code() as u16) << 5
            | CONFIG_COMP_QUE_DISABLE
    }
}

/// Multipliers derived during setup
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct VmeterCalibration {
    /// Volts at the unit's input per converter code
    pub volts_per_code: f32,
    /// Factory calibration factor read from the EEPROM (1.0 if unavailable)
    pub factory_factor: f32,
    /// Empirical correction constant
    pub correction: f32,
}

impl VmeterCalibration {
    /// Derive the multipliers for `gain`
    pub fn new(gain: Gain, factory_factor: f32, correction: f32) -> Self {
        Self {
            volts_per_code: gain.lsb_mv() / VMETER_DIVIDER_COEFFICIENT / 1000.0,
            factory_factor,
            correction,
        }
    }

    /// Convert a converter code into volts at the unit's input
    #[inline]
    pub fn code_to_volts(&self, code: i16) -> f32 {
        code as f32 * self.volts_per_code * self.factory_factor * self.correction
    }
}

/// Decode an EEPROM calibration record
///
/// Layout: `[gain, hope_hi, hope_lo, actual_hi, actual_lo, xor, _, _]` where
/// `xor` is the XOR of the first five bytes. Returns `None` for a corrupt
/// record, a record written for another gain, or a zero divisor.
fn parse_calibration_record(gain: Gain, record: &[u8; CALIBRATION_RECORD_LEN]) -> Option<f32> {
    let checksum = record[..5].iter().fold(0u8, |acc, b| acc ^ b);
    if checksum != record[5] || record[0] != gain.code() {
        return None;
    }

    let hope = i16::from_be_bytes([record[1], record[2]]);
    let actual = i16::from_be_bytes([record[3], record[4]]);
    if actual == 0 {
        return None;
    }

    Some((hope as f32 / actual as f32).abs())
}

/// Voltmeter unit adapter
///
/// Runs every acquisition as a single-shot conversion and scales the
/// result with the multipliers derived in `setup`.
pub struct VmeterAdapter<I, D> {
    /// Shared I2C bus (converter and EEPROM)
    i2c: I,
    /// Delay used while waiting for conversions
    delay: D,
    /// Acquisition settings
    config: VmeterConfig,
    /// Multipliers, available after a successful setup
    calibration: Option<VmeterCalibration>,
    /// Last raw converter code (for diagnostics)
    last_raw: Option<i16>,
}

impl<I: I2c, D: DelayNs> VmeterAdapter<I, D> {
    /// Create an adapter with the default unit settings
    ///
    /// The converter is not touched until `setup()` is called.
    pub fn new(i2c: I, delay: D) -> Self {
        Self::with_config(i2c, delay, VmeterConfig::default())
    }

    /// Create with custom settings
    pub fn with_config(i2c: I, delay: D, config: VmeterConfig) -> Self {
        Self {
            i2c,
            delay,
            config,
            calibration: None,
            last_raw: None,
        }
    }

    /// Get current settings
    pub fn config(&self) -> VmeterConfig {
        self.config
    }

    /// Multipliers derived by the last successful setup
    pub fn calibration(&self) -> Option<VmeterCalibration> {
        self.calibration
    }

    /// Release the underlying bus
    pub fn release(self) -> I {
        self.i2c
    }

    async fn write_register(&mut self, register: u8, value: u16) -> Result<(), SensorError> {
        let [hi, lo] = value.to_be_bytes();
        self.i2c
            .write(self.config.address, &[register, hi, lo])
            .await
            .map_err(|_| SensorError::BusError)
    }

    async fn read_register(&mut self, register: u8) -> Result<u16, SensorError> {
        let mut buf = [0u8; 2];
        self.i2c
            .write_read(self.config.address, &[register], &mut buf)
            .await
            .map_err(|_| SensorError::BusError)?;
        Ok(u16::from_be_bytes(buf))
    }

    /// Read the factory calibration factor for the configured gain
    async fn read_factory_factor(&mut self) -> Option<f32> {
        let gain = self.config.gain;
        let mut record = [0u8; CALIBRATION_RECORD_LEN];
        self.i2c
            .write_read(
                self.config.eeprom_address,
                &[gain.calibration_address()],
                &mut record,
            )
            .await
            .ok()?;
        parse_calibration_record(gain, &record)
    }

    /// Wait until the conversion started by the OS bit is done
    async fn wait_conversion(&mut self) -> Result<(), SensorError> {
        self.delay
            .delay_ms(self.config.rate.conversion_time_ms())
            .await;

        for _ in 0..CONVERSION_POLLS {
            if self.read_register(REG_CONFIG).await? & CONFIG_OS != 0 {
                return Ok(());
            }
            self.delay.delay_ms(1).await;
        }
        Err(SensorError::Timeout)
    }
}

impl<I: I2c, D: DelayNs> VoltagePort for VmeterAdapter<I, D> {
    async fn setup(&mut self) -> Result<(), SensorError> {
        self.last_raw = None;

        // Probe: the converter must answer on its address
        self.read_register(REG_CONFIG)
            .await
            .map_err(|_| SensorError::NotDetected)?;

        let word = self.config.config_word(false);
        self.write_register(REG_CONFIG, word).await?;

        let factory_factor = match self.read_factory_factor().await {
            Some(factor) => factor,
            None => {
                warn!("voltmeter: no valid factory calibration, using 1.0");
                1.0
            }
        };

        let calibration =
            VmeterCalibration::new(self.config.gain, factory_factor, self.config.correction);
        debug!(
            "voltmeter: {} V/code, factory factor {}",
            calibration.volts_per_code,
            calibration.factory_factor
        );
        self.calibration = Some(calibration);
        Ok(())
    }

    async fn read_voltage(&mut self) -> Result<RawSample, SensorError> {
        let calibration = self.calibration.ok_or(SensorError::NotInitialized)?;

        let word = self.config.config_word(true);
        self.write_register(REG_CONFIG, word).await?;
        self.wait_conversion().await?;

        let code = self.read_register(REG_CONVERSION).await? as i16;
        self.last_raw = Some(code);

        Ok(RawSample::new(calibration.code_to_volts(code), code))
    }

    fn last_raw_value(&self) -> Option<i16> {
        self.last_raw
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeDelay;
    use approx::assert_relative_eq;
    use embassy_futures::block_on;
    use embedded_hal::i2c::{ErrorKind, ErrorType, NoAcknowledgeSource, Operation};

    /// Minimal ADS1115 + EEPROM bus model
    struct FakeBus {
        present: bool,
        eeprom_present: bool,
        pointer: u8,
        eeprom_pointer: u8,
        config: u16,
        conversion: i16,
        /// Config reads that report "conversion in progress" after a start
        busy_reads: u8,
        converting: bool,
        eeprom: [u8; 256],
        config_writes: Vec<u16>,
    }

    impl FakeBus {
        fn new() -> Self {
            Self {
                present: true,
                eeprom_present: true,
                pointer: 0,
                eeprom_pointer: 0,
                config: 0x8583,
                conversion: 0,
                busy_reads: 0,
                converting: false,
                eeprom: [0xFF; 256],
                config_writes: Vec::new(),
            }
        }

        fn store_record(&mut self, gain: Gain, hope: i16, actual: i16) {
            let at = gain.calibration_address() as usize;
            let [h1, h2] = hope.to_be_bytes();
            let [a1, a2] = actual.to_be_bytes();
            let mut record = [gain.code(), h1, h2, a1, a2, 0, 0, 0];
            record[5] = record[..5].iter().fold(0, |acc, b| acc ^ b);
            self.eeprom[at..at + 8].copy_from_slice(&record);
        }

        fn nack() -> ErrorKind {
            ErrorKind::NoAcknowledge(NoAcknowledgeSource::Address)
        }
    }

    impl ErrorType for FakeBus {
        type Error = ErrorKind;
    }

    impl I2c for FakeBus {
        async fn transaction(
            &mut self,
            address: u8,
            operations: &mut [Operation<'_>],
        ) -> Result<(), Self::Error> {
            match address {
                VMETER_I2C_ADDR if self.present => {
                    for op in operations.iter_mut() {
                        match op {
                            Operation::Write(bytes) => {
                                self.pointer = bytes[0];
                                if bytes.len() == 3 && self.pointer == REG_CONFIG {
                                    let value = u16::from_be_bytes([bytes[1], bytes[2]]);
                                    self.config_writes.push(value);
                                    self.config = value & !CONFIG_OS;
                                    self.converting = value & CONFIG_OS != 0;
                                }
                            }
                            Operation::Read(buf) => {
                                let value = match self.pointer {
                                    REG_CONVERSION => self.conversion as u16,
                                    _ if self.converting && self.busy_reads > 0 => {
                                        self.busy_reads -= 1;
                                        self.config
                                    }
                                    _ => {
                                        self.converting = false;
                                        self.config | CONFIG_OS
                                    }
                                };
                                buf.copy_from_slice(&value.to_be_bytes());
                            }
                        }
                    }
                    Ok(())
                }
                VMETER_EEPROM_I2C_ADDR if self.eeprom_present => {
                    for op in operations.iter_mut() {
                        match op {
                            Operation::Write(bytes) => self.eeprom_pointer = bytes[0],
                            Operation::Read(buf) => {
                                let at = self.eeprom_pointer as usize;
                                buf.copy_from_slice(&self.eeprom[at..at + buf.len()]);
                            }
                        }
                    }
                    Ok(())
                }
                _ => Err(Self::nack()),
            }
        }
    }

    #[test]
    fn test_setup_fails_when_converter_missing() {
        let mut bus = FakeBus::new();
        bus.present = false;
        let mut vmeter = VmeterAdapter::new(bus, FakeDelay::default());

        assert_eq!(block_on(vmeter.setup()), Err(SensorError::NotDetected));
        assert_eq!(
            block_on(vmeter.read_voltage()),
            Err(SensorError::NotInitialized)
        );
        assert_eq!(vmeter.last_raw_value(), None);
    }

    #[test]
    fn test_setup_writes_single_shot_config() {
        let mut vmeter = VmeterAdapter::new(FakeBus::new(), FakeDelay::default());
        block_on(vmeter.setup()).unwrap();

        let bus = vmeter.release();
        // MUX 000, PGA 010 (2.048 V), single-shot, 8 SPS, comparator off
        assert_eq!(bus.config_writes, vec![0b0000_0101_0000_0011]);
    }

    #[test]
    fn test_factory_factor_from_eeprom() {
        let mut bus = FakeBus::new();
        bus.store_record(Gain::Pga2048, 1000, 800);
        let mut vmeter = VmeterAdapter::new(bus, FakeDelay::default());
        block_on(vmeter.setup()).unwrap();

        let calibration = vmeter.calibration().unwrap();
        assert_relative_eq!(calibration.factory_factor, 1.25);
        assert_relative_eq!(calibration.correction, VOLTAGE_CORRECTION);
        assert_relative_eq!(
            calibration.volts_per_code,
            0.0625 / VMETER_DIVIDER_COEFFICIENT / 1000.0
        );
    }

    #[test]
    fn test_corrupt_or_missing_eeprom_falls_back_to_unity() {
        let mut bus = FakeBus::new();
        bus.store_record(Gain::Pga2048, 1000, 800);
        let at = Gain::Pga2048.calibration_address() as usize;
        bus.eeprom[at + 5] ^= 0x01;
        let mut vmeter = VmeterAdapter::new(bus, FakeDelay::default());
        block_on(vmeter.setup()).unwrap();
        assert_eq!(vmeter.calibration().unwrap().factory_factor, 1.0);

        let mut bus = FakeBus::new();
        bus.eeprom_present = false;
        let mut vmeter = VmeterAdapter::new(bus, FakeDelay::default());
        block_on(vmeter.setup()).unwrap();
        assert_eq!(vmeter.calibration().unwrap().factory_factor, 1.0);
    }

    #[test]
    fn test_record_for_other_gain_is_ignored() {
        let mut record = [Gain::Pga4096.code(), 0x03, 0xE8, 0x03, 0x20, 0, 0, 0];
        record[5] = record[..5].iter().fold(0, |acc, b| acc ^ b);
        assert_eq!(parse_calibration_record(Gain::Pga2048, &record), None);
        assert_eq!(parse_calibration_record(Gain::Pga4096, &record), Some(1.25));
    }

    #[test]
    fn test_read_scales_raw_code() {
        let mut bus = FakeBus::new();
        bus.conversion = 2000;
        let delay = FakeDelay::default();
        let mut vmeter = VmeterAdapter::new(bus, delay.clone());
        block_on(vmeter.setup()).unwrap();
        // Nothing converted yet
        assert_eq!(vmeter.last_raw_value(), None);

        let sample = block_on(vmeter.read_voltage()).unwrap();
        let expected = 2000.0 * 0.0625 / VMETER_DIVIDER_COEFFICIENT / 1000.0 * VOLTAGE_CORRECTION;
        assert_eq!(sample.raw_code, 2000);
        assert_relative_eq!(sample.volts, expected, epsilon = 1e-4);
        assert_eq!(vmeter.last_raw_value(), Some(2000));

        // Waited the nominal 8 SPS conversion time
        assert_eq!(delay.slept_ms(), vec![DataRate::Sps8.conversion_time_ms()]);

        let bus = vmeter.release();
        assert_eq!(bus.config_writes.len(), 2);
        assert_ne!(bus.config_writes[1] & CONFIG_OS, 0);
    }

    #[test]
    fn test_negative_codes_give_negative_volts() {
        let mut bus = FakeBus::new();
        bus.conversion = -400;
        let mut vmeter = VmeterAdapter::new(bus, FakeDelay::default());
        block_on(vmeter.setup()).unwrap();
        let sample = block_on(vmeter.read_voltage()).unwrap();
        assert!(sample.volts < 0.0);
    }

    #[test]
    fn test_slow_conversion_is_polled_then_times_out() {
        let mut bus = FakeBus::new();
        bus.busy_reads = 3;
        let delay = FakeDelay::default();
        let mut vmeter = VmeterAdapter::new(bus, delay.clone());
        block_on(vmeter.setup()).unwrap();
        assert!(block_on(vmeter.read_voltage()).is_ok());
        assert_eq!(delay.slept_ms(), vec![126, 1, 1, 1]);

        let mut bus = FakeBus::new();
        bus.busy_reads = u8::MAX;
        let delay = FakeDelay::default();
        let mut vmeter = VmeterAdapter::new(bus, delay.clone());
        block_on(vmeter.setup()).unwrap();
        assert_eq!(block_on(vmeter.read_voltage()), Err(SensorError::Timeout));
        assert_eq!(
            delay.total_ns(),
            (126 + CONVERSION_POLLS as u64) * 1_000_000
        );
    }
}
