//! Scriptable in-memory radio for tests.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use crate::link::{LinkConfig, RadioError, RadioLink};

#[derive(Debug, Default)]
struct MockState {
    sent: Vec<Vec<u8>>,
    write_calls: usize,
    script: VecDeque<bool>,
    always_fail: bool,
    fail_configure: bool,
    powered_down: bool,
    configured: Option<LinkConfig>,
}

/// In-memory [`RadioLink`] that records writes and can be scripted to
/// fail. Clones share state: a test keeps one handle for inspection while
/// the manager owns another.
#[derive(Debug, Clone, Default)]
pub struct MockRadio {
    state: Rc<RefCell<MockState>>,
}

impl MockRadio {
    pub fn new() -> Self {
        MockRadio::default()
    }

    /// Queue explicit results for upcoming writes. Once the script drains,
    /// writes succeed again.
    pub fn script_writes(&self, results: &[bool]) {
        self.state.borrow_mut().script.extend(results);
    }

    /// Make every write fail until cleared.
    pub fn set_always_fail(&self, fail: bool) {
        self.state.borrow_mut().always_fail = fail;
    }

    /// Make the next `configure` call fail.
    pub fn set_fail_configure(&self, fail: bool) {
        self.state.borrow_mut().fail_configure = fail;
    }

    /// Payloads that went out, in order.
    pub fn sent(&self) -> Vec<Vec<u8>> {
        self.state.borrow().sent.clone()
    }

    /// Total write attempts, including failed ones.
    pub fn write_calls(&self) -> usize {
        self.state.borrow().write_calls
    }

    pub fn is_powered_down(&self) -> bool {
        self.state.borrow().powered_down
    }

    /// Link parameters from the most recent `configure` call.
    pub fn configured(&self) -> Option<LinkConfig> {
        self.state.borrow().configured
    }
}

impl RadioLink for MockRadio {
    fn configure(&mut self, config: &LinkConfig) -> Result<(), RadioError> {
        let mut state = self.state.borrow_mut();
        if state.fail_configure {
            return Err(RadioError::InitFailed("mock configure failure".to_string()));
        }
        state.configured = Some(*config);
        Ok(())
    }

    fn write(&mut self, payload: &[u8]) -> bool {
        let mut state = self.state.borrow_mut();
        state.write_calls += 1;
        let ok = if state.always_fail {
            false
        } else {
            state.script.pop_front().unwrap_or(true)
        };
        if ok {
            state.sent.push(payload.to_vec());
        }
        ok
    }

    fn power_down(&mut self) {
        self.state.borrow_mut().powered_down = true;
    }

    fn power_up(&mut self) {
        self.state.borrow_mut().powered_down = false;
    }
}
