//! Frame-level behaviour of the bit-banged HT1621 driver, checked against a recorded waveform.

use ts206_gpio::lcd::ht1621::driver::{
    BiasRatio, Command, CommonLines, GpioHT1621Driver, HT1621Driver, INIT_SEQUENCE,
};
use ts206_gpio::mock::{MockDelay, MockGpioDriver, MockLog, MockOutput};
use ts206_gpio::{GpioDriver, GpioError};

const DATA: usize = 0;
const WR: usize = 1;
const CS: usize = 2;

struct Bench {
    log: MockLog,
    data: MockOutput,
    wr: MockOutput,
    cs: MockOutput,
    delay: MockDelay,
}

impl Bench {
    fn new() -> Self {
        let log = MockLog::new();
        Bench {
            data: log.output(DATA),
            wr: log.output(WR),
            cs: log.output(CS),
            delay: log.delay(),
            log,
        }
    }

    fn driver(&self) -> GpioHT1621Driver<'_> {
        GpioHT1621Driver::new(&self.data, &self.wr, &self.cs, &self.delay).unwrap()
    }

    /// Driver that has been through `init`, with the log emptied afterwards.
    fn initialized_driver(&self) -> GpioHT1621Driver<'_> {
        let mut driver = self.driver();
        driver.init().unwrap();
        self.log.clear();
        driver
    }

    fn frames(&self) -> Vec<Vec<bool>> {
        self.log.frames(DATA, WR, CS)
    }
}

fn bits(value: u8, count: u8) -> Vec<bool> {
    (0..count).map(|i| value & (0x80 >> i) != 0).collect()
}

fn to_u8(bits: &[bool]) -> u8 {
    bits.iter().fold(0, |acc, &bit| (acc << 1) | bit as u8)
}

fn command_frame(code: u8) -> Vec<bool> {
    let mut frame = bits(0b1000_0000, 4);
    frame.extend(bits(code, 8));
    frame
}

fn write_frame(address: u8, data: u8) -> Vec<bool> {
    let mut frame = bits(0b1010_0000, 3);
    frame.extend(bits(address << 3, 6));
    frame.extend(bits(data, 8));
    frame
}

#[test]
fn command_frame_is_mode_then_code() {
    let bench = Bench::new();
    let mut driver = bench.driver();

    for code in 0..=255u8 {
        bench.log.clear();
        driver.send_command_code(code).unwrap();

        let frames = bench.frames();
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].len(), 12);
        assert_eq!(to_u8(&frames[0][..4]), 0b1000);
        assert_eq!(to_u8(&frames[0][4..]), code);
    }
}

#[test]
fn write_frame_is_mode_address_data() {
    let bench = Bench::new();
    let mut driver = bench.initialized_driver();

    for address in [0u8, 1, 5, 11, 31, 32, 127] {
        for data in [0x00u8, 0x5a, 0xff] {
            bench.log.clear();
            driver.write(address, data).unwrap();

            let frames = bench.frames();
            assert_eq!(frames.len(), 1);
            let frame = &frames[0];
            assert_eq!(frame.len(), 17);
            assert_eq!(to_u8(&frame[..3]), 0b101);
            assert_eq!(to_u8(&frame[3..9]), (address << 3) >> 2);
            assert_eq!(to_u8(&frame[9..]), data);
        }
    }
}

#[test]
fn chip_select_spans_whole_frame() {
    let bench = Bench::new();
    let mut driver = bench.initialized_driver();

    driver.write(3, 0xa5).unwrap();

    let writes = bench.log.writes();
    let cs_writes: Vec<_> = writes
        .iter()
        .enumerate()
        .filter(|(_, (pin, _))| *pin == CS)
        .collect();
    assert_eq!(cs_writes.len(), 2, "exactly one assert and one release");
    let (first, (_, asserted)) = cs_writes[0];
    let (last, (_, released)) = cs_writes[1];
    assert!(!asserted);
    assert!(released);
    assert_eq!(first, 0, "CS asserted before the first clock edge");
    assert_eq!(last, writes.len() - 1, "CS released right after the last bit");
}

#[test]
fn every_operation_leaves_chip_select_released() {
    let bench = Bench::new();
    let mut driver = bench.driver();
    driver.init().unwrap();
    driver.clear(4).unwrap();
    driver.set_digit(1, 3).unwrap();
    driver.set_digit_with_dot(2, 9).unwrap();
    driver.display_on(false).unwrap();

    let cs_levels: Vec<bool> = bench
        .log
        .writes()
        .into_iter()
        .filter(|(pin, _)| *pin == CS)
        .map(|(_, high)| high)
        .collect();
    // Idle level from `new`, then strictly alternating assert/release.
    assert!(cs_levels[0]);
    for pair in cs_levels[1..].chunks(2) {
        assert_eq!(pair, [false, true]);
    }
}

#[test]
fn init_sends_fixed_configuration_in_order() {
    let bench = Bench::new();
    let mut driver = bench.driver();

    driver.init().unwrap();

    assert!(driver.is_initialized());
    assert_eq!(
        bench.frames(),
        vec![
            command_frame(0x30),
            command_frame(0x52),
            command_frame(0x02),
            command_frame(0x06),
        ]
    );
    assert_eq!(
        INIT_SEQUENCE,
        [
            Command::Rc256k,
            Command::Bias(BiasRatio::Third, CommonLines::Four),
            Command::SysEn,
            Command::LcdOn,
        ]
    );
}

#[test]
fn clear_writes_zero_to_each_place_in_order() {
    let bench = Bench::new();
    let mut driver = bench.initialized_driver();

    driver.clear(12).unwrap();

    let expected: Vec<_> = (0..12).map(|address| write_frame(address, 0)).collect();
    assert_eq!(bench.frames(), expected);
}

#[test]
fn clear_zero_places_sends_nothing() {
    let bench = Bench::new();
    let mut driver = bench.initialized_driver();

    driver.clear(0).unwrap();

    assert!(bench.log.events().is_empty());
}

#[test]
fn clear_past_ram_is_rejected_up_front() {
    let bench = Bench::new();
    let mut driver = bench.initialized_driver();

    assert_eq!(driver.clear(129), Err(GpioError::InvalidArgument));
    assert!(bench.log.events().is_empty());
}

#[test]
fn set_digit_matches_plain_write_of_pattern() {
    let bench = Bench::new();
    let mut driver = bench.initialized_driver();

    driver.set_digit(4, 0).unwrap();
    driver.write(4, 0xf5).unwrap();
    driver.set_digit_with_dot(4, 0).unwrap();
    driver.write(4, 0xfd).unwrap();

    let frames = bench.frames();
    assert_eq!(frames[0], frames[1]);
    assert_eq!(frames[2], frames[3]);
    assert_eq!(frames[0], write_frame(4, 0xf5));
    assert_eq!(frames[2], write_frame(4, 0xfd));
}

#[test]
fn invalid_digit_emits_no_transitions() {
    let bench = Bench::new();
    let mut driver = bench.initialized_driver();

    assert_eq!(driver.set_digit(1, 17), Err(GpioError::InvalidArgument));
    assert_eq!(driver.set_digit_with_dot(1, 200), Err(GpioError::InvalidArgument));
    assert!(bench.log.events().is_empty());
}

#[test]
fn invalid_address_emits_no_transitions() {
    let bench = Bench::new();
    let mut driver = bench.initialized_driver();

    assert_eq!(driver.write(128, 0xff), Err(GpioError::InvalidArgument));
    assert_eq!(driver.set_digit(200, 1), Err(GpioError::InvalidArgument));
    assert!(bench.log.events().is_empty());
}

#[test]
fn successive_write_sends_address_once() {
    let bench = Bench::new();
    let mut driver = bench.initialized_driver();

    driver.write_successive(2, &[0xf5, 0x05, 0xd3]).unwrap();

    let mut expected = bits(0b1010_0000, 3);
    expected.extend(bits(2 << 3, 6));
    for byte in [0xf5, 0x05, 0xd3] {
        expected.extend(bits(byte, 8));
    }
    assert_eq!(bench.frames(), vec![expected]);
}

#[test]
fn successive_write_of_nothing_sends_nothing() {
    let bench = Bench::new();
    let mut driver = bench.initialized_driver();

    driver.write_successive(0, &[]).unwrap();

    assert!(bench.log.events().is_empty());
}

#[test]
fn commands_are_accepted_before_init() {
    let bench = Bench::new();
    let mut driver = bench.driver();
    bench.log.clear();

    driver.send_command(Command::SysDis).unwrap();

    assert_eq!(bench.frames(), vec![command_frame(0x00)]);
}

#[test]
fn driver_runs_on_pins_from_a_gpio_driver() {
    let log = MockLog::new();
    let gpio = MockGpioDriver::new(log.clone(), 8);
    let mut pin_data = gpio.get_pin(5).unwrap();
    let mut pin_wr = gpio.get_pin(6).unwrap();
    let mut pin_cs = gpio.get_pin(7).unwrap();
    let data = pin_data.as_output().unwrap();
    let wr = pin_wr.as_output().unwrap();
    let cs = pin_cs.as_output().unwrap();
    let delay = log.delay();

    let mut driver = GpioHT1621Driver::new(&*data, &*wr, &*cs, &delay).unwrap();
    driver.init().unwrap();
    log.clear();
    driver.set_digit(0, 8).unwrap();

    assert_eq!(log.frames(5, 6, 7), vec![write_frame(0, 0xf7)]);
}

#[test]
fn rejected_pin_configuration_surfaces_as_error() {
    let gpio = MockGpioDriver::new(MockLog::new(), 8).with_rejected_pin(3);
    let mut pin = gpio.get_pin(3).unwrap();

    assert!(matches!(pin.as_output(), Err(GpioError::Io(_))));
}
