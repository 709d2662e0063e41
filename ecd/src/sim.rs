//! A software embedded controller.
//!
//! [`SimEc`] answers the same command/data handshake as real hardware through the [`Io`] trait,
//! so the protocol engine and everything above it can run without an EC. Every register access
//! that does not fit the handshake is recorded as a violation instead of being silently accepted.

use std::sync::Arc;

use common::io::Io;
use parking_lot::Mutex;

use crate::access::EC_SPACE_SIZE;
use crate::ec::{Command, Ec, StatusFlags};

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum Phase {
    Idle,
    Address(Command),
    Value(u8),
}

struct State {
    memory: [u8; EC_SPACE_SIZE],
    phase: Phase,
    latency: u32,
    busy: u32,
    pending: Option<u8>,
    output: Option<u8>,
    stuck: bool,
    last_command: bool,
    transactions: usize,
    violations: Vec<String>,
}

impl State {
    fn input_full(&self) -> bool {
        self.stuck || self.busy > 0
    }

    fn accept(&mut self, what: &str) {
        if self.input_full() {
            self.violations
                .push(format!("{what} written while input buffer full"));
        }
        self.busy = self.latency;
    }

    fn violation(&mut self, message: String) {
        self.violations.push(message);
        self.phase = Phase::Idle;
    }

    fn status(&mut self) -> u8 {
        if self.busy > 0 {
            self.busy -= 1;
        }
        if self.busy == 0 && self.output.is_none() {
            self.output = self.pending.take();
        }

        let mut status = StatusFlags::empty();
        status.set(StatusFlags::INPUT_FULL, self.input_full());
        status.set(StatusFlags::OUTPUT_FULL, self.output.is_some());
        status.set(StatusFlags::COMMAND, self.last_command);
        status.bits()
    }

    fn command(&mut self, value: u8) {
        self.accept("command");
        self.last_command = true;
        if self.phase != Phase::Idle {
            self.violation(format!("command {value:#04x} during {:?}", self.phase));
            return;
        }
        match Command::from_u8(value) {
            Some(command) => self.phase = Phase::Address(command),
            None => self.violation(format!("unknown command {value:#04x}")),
        }
    }

    fn data_in(&mut self, value: u8) {
        self.accept("data");
        self.last_command = false;
        match self.phase {
            Phase::Idle => self.violation(format!("data {value:#04x} without a command")),
            Phase::Address(Command::Read) => {
                self.pending = Some(self.memory[usize::from(value)]);
                self.phase = Phase::Idle;
                self.transactions += 1;
            }
            Phase::Address(Command::Write) => self.phase = Phase::Value(value),
            Phase::Value(addr) => {
                self.memory[usize::from(addr)] = value;
                self.phase = Phase::Idle;
                self.transactions += 1;
            }
        }
    }

    fn data_out(&mut self) -> u8 {
        match self.output.take() {
            Some(value) => value,
            None => {
                self.violation("data read while output buffer empty".to_owned());
                0xFF
            }
        }
    }
}

#[derive(Clone, Copy, Debug)]
enum Register {
    CommandStatus,
    Data,
}

/// One register of a [`SimEc`].
#[derive(Clone)]
pub struct SimPort {
    state: Arc<Mutex<State>>,
    register: Register,
}

impl Io for SimPort {
    type Value = u8;

    fn read(&self) -> u8 {
        let mut state = self.state.lock();
        match self.register {
            Register::CommandStatus => state.status(),
            Register::Data => state.data_out(),
        }
    }

    fn write(&mut self, value: u8) {
        let mut state = self.state.lock();
        match self.register {
            Register::CommandStatus => state.command(value),
            Register::Data => state.data_in(value),
        }
    }
}

#[derive(Clone)]
pub struct SimEc {
    state: Arc<Mutex<State>>,
}

impl SimEc {
    pub fn new() -> Self {
        Self::with_latency(0)
    }

    /// Keeps the input buffer full for `polls` status reads after every write.
    pub fn with_latency(polls: u32) -> Self {
        SimEc {
            state: Arc::new(Mutex::new(State {
                memory: [0; EC_SPACE_SIZE],
                phase: Phase::Idle,
                latency: polls,
                busy: 0,
                pending: None,
                output: None,
                stuck: false,
                last_command: false,
                transactions: 0,
                violations: Vec::new(),
            })),
        }
    }

    fn port(&self, register: Register) -> SimPort {
        SimPort {
            state: Arc::clone(&self.state),
            register,
        }
    }

    /// A protocol engine wired to this controller.
    pub fn ec(&self) -> Ec<SimPort> {
        Ec::new(
            self.port(Register::Data),
            self.port(Register::CommandStatus),
            self.port(Register::CommandStatus),
        )
    }

    /// A stuck controller never clears its input buffer flag.
    pub fn set_stuck(&self, stuck: bool) {
        self.state.lock().stuck = stuck;
    }

    pub fn peek(&self, addr: u8) -> u8 {
        self.state.lock().memory[usize::from(addr)]
    }

    pub fn poke(&self, addr: u8, value: u8) {
        self.state.lock().memory[usize::from(addr)] = value;
    }

    pub fn memory(&self) -> [u8; EC_SPACE_SIZE] {
        self.state.lock().memory
    }

    /// Number of completed byte reads and writes.
    pub fn transactions(&self) -> usize {
        self.state.lock().transactions
    }

    pub fn violations(&self) -> Vec<String> {
        self.state.lock().violations.clone()
    }
}

impl Default for SimEc {
    fn default() -> Self {
        Self::new()
    }
}
