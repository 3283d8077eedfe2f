//! We use this mocking module in unit tests to emulate the native bridge driver.

use std::{
    collections::HashMap,
    sync::{
        Arc,
        atomic::{AtomicBool, AtomicUsize, Ordering},
    },
    thread,
    time::Duration,
};

use parking_lot::Mutex;

use crate::{
    display::DISPLAY_LEN,
    provider::{BusCycleProvider, BusHandle, RawIoConf, RawPulserConf, RawScalerConf},
    types::{AddressModifier, BoardType, DataWidth, RegisterValue},
};

/// One call seen by the mock, in issue order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Cycle {
    Read {
        address: u32,
        am: AddressModifier,
        width: DataWidth,
    },
    Write {
        address: u32,
        value: RegisterValue,
        am: AddressModifier,
        width: DataWidth,
    },
    /// Any of the bridge configuration calls, by name.
    Call(&'static str),
}

#[derive(Default)]
struct MockState {
    /// Bus memory, unset addresses read as zero.
    memory: HashMap<u32, RegisterValue>,
    /// Result codes to return for cycles at these addresses.
    failures: HashMap<u32, i32>,
    /// Result code for the next configuration call.
    fail_next_call: Option<i32>,
    open_code: i32,
    cycles: Vec<Cycle>,
    closes: usize,
    closed: bool,
    pulsers: [RawPulserConf; 2],
    scaler: RawScalerConf,
    outputs: [RawIoConf; 5],
    inputs: [RawIoConf; 2],
    registers: HashMap<u16, u32>,
    output_lines: u16,
    display: Option<[u8; DISPLAY_LEN]>,
    firmware: u8,
}

/// Our mock driver. Clones share the same emulated bridge.
#[derive(Clone, Default)]
pub struct MockBus {
    state: Arc<Mutex<MockState>>,
    delay: Arc<Mutex<Duration>>,
    in_flight: Arc<AtomicUsize>,
    overlap: Arc<AtomicBool>,
    after_close: Arc<AtomicBool>,
}

impl MockBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Preload a bus address.
    pub fn poke(&self, address: u32, value: RegisterValue) {
        self.state.lock().memory.insert(address, value);
    }

    /// Current contents of a bus address.
    pub fn peek(&self, address: u32) -> RegisterValue {
        self.state.lock().memory.get(&address).copied().unwrap_or(0)
    }

    /// Make every cycle at `address` fail with `code`.
    pub fn fail_at(&self, address: u32, code: i32) {
        self.state.lock().failures.insert(address, code);
    }

    /// Make the next configuration call fail with `code`.
    pub fn fail_next_call(&self, code: i32) {
        self.state.lock().fail_next_call = Some(code);
    }

    pub fn fail_open(&self, code: i32) {
        self.state.lock().open_code = code;
    }

    /// Time every cycle takes.
    pub fn set_cycle_delay(&self, delay: Duration) {
        *self.delay.lock() = delay;
    }

    pub fn set_register(&self, register: u16, value: u32) {
        self.state.lock().registers.insert(register, value);
    }

    pub fn set_raw_pulser(&self, pulser: usize, conf: RawPulserConf) {
        self.state.lock().pulsers[pulser] = conf;
    }

    pub fn set_raw_scaler(&self, conf: RawScalerConf) {
        self.state.lock().scaler = conf;
    }

    pub fn set_raw_output(&self, channel: usize, conf: RawIoConf) {
        self.state.lock().outputs[channel] = conf;
    }

    pub fn set_display(&self, raw: [u8; DISPLAY_LEN]) {
        self.state.lock().display = Some(raw);
    }

    pub fn set_firmware(&self, release: u8) {
        self.state.lock().firmware = release;
    }

    pub fn output_lines(&self) -> u16 {
        self.state.lock().output_lines
    }

    pub fn cycles(&self) -> Vec<Cycle> {
        self.state.lock().cycles.clone()
    }

    pub fn clear_cycles(&self) {
        self.state.lock().cycles.clear();
    }

    pub fn close_count(&self) -> usize {
        self.state.lock().closes
    }

    /// Whether two calls were ever in progress at the same time.
    pub fn overlap_detected(&self) -> bool {
        self.overlap.load(Ordering::SeqCst)
    }

    /// Whether any call arrived after the handle was closed.
    pub fn cycle_after_close(&self) -> bool {
        self.after_close.load(Ordering::SeqCst)
    }

    /// Mark a call as in progress for the configured delay.
    fn enter(&self) {
        if self.in_flight.fetch_add(1, Ordering::SeqCst) > 0 {
            self.overlap.store(true, Ordering::SeqCst);
        }
        if self.state.lock().closed {
            self.after_close.store(true, Ordering::SeqCst);
        }
        let delay = *self.delay.lock();
        if !delay.is_zero() {
            thread::sleep(delay);
        }
    }

    fn leave(&self) {
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
    }

    /// Log a configuration call and apply `f` unless a failure is pending.
    fn call(&self, name: &'static str, f: impl FnOnce(&mut MockState)) -> i32 {
        self.enter();
        let code = {
            let mut state = self.state.lock();
            state.cycles.push(Cycle::Call(name));
            match state.fail_next_call.take() {
                Some(code) => code,
                None => {
                    f(&mut *state);
                    0
                }
            }
        };
        self.leave();
        code
    }

    /// Like [`Self::call`] for calls returning data.
    fn query<T: Default>(&self, name: &'static str, f: impl FnOnce(&MockState) -> T) -> (T, i32) {
        let mut out = T::default();
        let code = self.call(name, |state| out = f(state));
        (out, code)
    }
}

impl BusCycleProvider for MockBus {
    fn open(&mut self, _board_type: BoardType, _link: u32, _board: u32) -> (BusHandle, i32) {
        let mut state = self.state.lock();
        state.closed = false;
        (BusHandle(1), state.open_code)
    }

    fn close(&mut self, _handle: BusHandle) {
        let mut state = self.state.lock();
        state.closes += 1;
        state.closed = true;
    }

    fn read_cycle(
        &mut self,
        _handle: BusHandle,
        address: u32,
        am: AddressModifier,
        width: DataWidth,
    ) -> (RegisterValue, i32) {
        self.enter();
        let result = {
            let mut state = self.state.lock();
            state.cycles.push(Cycle::Read { address, am, width });
            match state.failures.get(&address) {
                Some(&code) => (0, code),
                None => (state.memory.get(&address).copied().unwrap_or(0), 0),
            }
        };
        self.leave();
        result
    }

    fn write_cycle(
        &mut self,
        _handle: BusHandle,
        address: u32,
        value: RegisterValue,
        am: AddressModifier,
        width: DataWidth,
    ) -> i32 {
        self.enter();
        let code = {
            let mut state = self.state.lock();
            state.cycles.push(Cycle::Write {
                address,
                value,
                am,
                width,
            });
            match state.failures.get(&address) {
                Some(&code) => code,
                None => {
                    state.memory.insert(address, value);
                    0
                }
            }
        };
        self.leave();
        code
    }

    fn read_board_firmware(&mut self, _handle: BusHandle) -> u8 {
        self.query("read_board_firmware", |state| state.firmware).0
    }

    fn set_pulser_conf(&mut self, _handle: BusHandle, pulser: u8, conf: RawPulserConf) -> i32 {
        self.call("set_pulser_conf", |state| {
            state.pulsers[usize::from(pulser)] = conf
        })
    }

    fn get_pulser_conf(&mut self, _handle: BusHandle, pulser: u8) -> (RawPulserConf, i32) {
        self.query("get_pulser_conf", |state| state.pulsers[usize::from(pulser)])
    }

    fn set_scaler_conf(&mut self, _handle: BusHandle, conf: RawScalerConf) -> i32 {
        self.call("set_scaler_conf", |state| state.scaler = conf)
    }

    fn get_scaler_conf(&mut self, _handle: BusHandle) -> (RawScalerConf, i32) {
        self.query("get_scaler_conf", |state| state.scaler)
    }

    fn set_output_conf(&mut self, _handle: BusHandle, channel: u8, conf: RawIoConf) -> i32 {
        self.call("set_output_conf", |state| {
            state.outputs[usize::from(channel)] = conf
        })
    }

    fn get_output_conf(&mut self, _handle: BusHandle, channel: u8) -> (RawIoConf, i32) {
        self.query("get_output_conf", |state| state.outputs[usize::from(channel)])
    }

    fn set_input_conf(&mut self, _handle: BusHandle, channel: u8, conf: RawIoConf) -> i32 {
        self.call("set_input_conf", |state| {
            let input = &mut state.inputs[usize::from(channel)];
            input.polarity = conf.polarity;
            input.led_polarity = conf.led_polarity;
        })
    }

    fn get_input_conf(&mut self, _handle: BusHandle, channel: u8) -> (RawIoConf, i32) {
        self.query("get_input_conf", |state| state.inputs[usize::from(channel)])
    }

    fn read_register(&mut self, _handle: BusHandle, register: u16) -> (u32, i32) {
        self.query("read_register", |state| {
            state.registers.get(&register).copied().unwrap_or(0)
        })
    }

    fn set_output_register(&mut self, _handle: BusHandle, mask: u16) -> i32 {
        self.call("set_output_register", |state| state.output_lines |= mask)
    }

    fn clear_output_register(&mut self, _handle: BusHandle, mask: u16) -> i32 {
        self.call("clear_output_register", |state| state.output_lines &= !mask)
    }

    fn pulse_output_register(&mut self, handle: BusHandle, mask: u16) -> i32 {
        match self.set_output_register(handle, mask) {
            0 => self.clear_output_register(handle, mask),
            code => code,
        }
    }

    fn read_display(&mut self, _handle: BusHandle) -> ([u8; DISPLAY_LEN], i32) {
        let (raw, code) = self.query("read_display", |state| state.display);
        (raw.unwrap_or([0; DISPLAY_LEN]), code)
    }

    fn system_reset(&mut self, _handle: BusHandle) -> i32 {
        self.call("system_reset", |_| {})
    }

    fn reset_scaler_count(&mut self, _handle: BusHandle) -> i32 {
        self.call("reset_scaler_count", |state| {
            state.registers.insert(0x1D, 0);
        })
    }

    fn enable_scaler_gate(&mut self, _handle: BusHandle) -> i32 {
        self.call("enable_scaler_gate", |_| {})
    }

    fn disable_scaler_gate(&mut self, _handle: BusHandle) -> i32 {
        self.call("disable_scaler_gate", |_| {})
    }

    fn start_pulser(&mut self, _handle: BusHandle, _pulser: u8) -> i32 {
        self.call("start_pulser", |_| {})
    }

    fn stop_pulser(&mut self, _handle: BusHandle, _pulser: u8) -> i32 {
        self.call("stop_pulser", |_| {})
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_round_trip() {
        let mut mock = MockBus::new();
        let handle = BusHandle(1);
        let am = AddressModifier::default();
        assert_eq!(mock.write_cycle(handle, 0x10, 0xBEEF, am, DataWidth::D16), 0);
        assert_eq!(mock.read_cycle(handle, 0x10, am, DataWidth::D16), (0xBEEF, 0));
        assert_eq!(mock.peek(0x10), 0xBEEF);
    }

    #[test]
    fn test_injected_failure() {
        let mut mock = MockBus::new();
        mock.fail_at(0x20, -3);
        let (_, code) = mock.read_cycle(
            BusHandle(1),
            0x20,
            AddressModifier::default(),
            DataWidth::D16,
        );
        assert_eq!(code, -3);
        // A failed write leaves memory untouched.
        mock.write_cycle(BusHandle(1), 0x20, 5, AddressModifier::default(), DataWidth::D16);
        assert_eq!(mock.peek(0x20), 0);
    }

    #[test]
    fn test_failure_applies_to_next_call_only() {
        let mut mock = MockBus::new();
        mock.fail_next_call(-4);
        assert_eq!(mock.system_reset(BusHandle(1)), -4);
        assert_eq!(mock.system_reset(BusHandle(1)), 0);
    }

    #[test]
    fn test_pulse_sets_then_clears() {
        let mut mock = MockBus::new();
        mock.set_output_register(BusHandle(1), 0x0100);
        assert_eq!(mock.pulse_output_register(BusHandle(1), 0x0040), 0);
        assert_eq!(mock.output_lines(), 0x0100);
        assert_eq!(
            mock.cycles(),
            vec![
                Cycle::Call("set_output_register"),
                Cycle::Call("set_output_register"),
                Cycle::Call("clear_output_register"),
            ]
        );
    }

    #[test]
    fn test_clones_share_state() {
        let mock = MockBus::new();
        let other = mock.clone();
        other.poke(0x30, 9);
        assert_eq!(mock.peek(0x30), 9);
    }
}
