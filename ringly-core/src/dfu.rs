//! The boundary-only DFU/recovery surface. The core models the handful of states and
//! errors that matter to an app deciding whether a firmware update is in progress or a
//! peripheral needs to be recovered; it does not implement the Nordic DFU transfer protocol
//! itself, which belongs to whatever crate the adapter layer delegates to.

use crate::error::DfuError;
use crate::types::PeerId;

/// A peripheral discovered in recovery (DFU bootloader) mode via its solicited service UUID,
/// as distinct from a normal validated [`crate::peripheral::Peripheral`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RecoveryPeripheral {
    pub peer: PeerId,
}

/// Coarse DFU lifecycle state, surfaced to observers through the same machinery as any other
/// peripheral event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DfuState {
    #[default]
    Idle,
    Preparing,
    Writing,
    Completed,
    Failed,
}

/// Tracks one DFU attempt against one recovery peripheral. `prepare`/`begin_write` enforce the
/// "only once" invariants from [`DfuError::OnlyPrepareOnce`]/[`DfuError::OnlyWriteOnce`]
/// directly, since the original firmware rejects a second attempt rather than restarting it.
#[derive(Debug)]
pub struct DfuSession {
    peripheral: RecoveryPeripheral,
    state: DfuState,
    prepared: bool,
    write_started: bool,
}

impl DfuSession {
    pub fn new(peripheral: RecoveryPeripheral) -> Self {
        Self {
            peripheral,
            state: DfuState::Idle,
            prepared: false,
            write_started: false,
        }
    }

    pub fn peripheral(&self) -> RecoveryPeripheral {
        self.peripheral
    }

    pub fn state(&self) -> DfuState {
        self.state
    }

    pub fn prepare(&mut self) -> Result<(), DfuError> {
        if self.prepared {
            return Err(DfuError::OnlyPrepareOnce);
        }
        self.prepared = true;
        self.state = DfuState::Preparing;
        Ok(())
    }

    pub fn begin_write(&mut self) -> Result<(), DfuError> {
        if !self.prepared {
            return Err(DfuError::NoApplication);
        }
        if self.write_started {
            return Err(DfuError::OnlyWriteOnce);
        }
        self.write_started = true;
        self.state = DfuState::Writing;
        Ok(())
    }

    pub fn complete(&mut self) {
        self.state = DfuState::Completed;
    }

    pub fn fail(&mut self) {
        self.state = DfuState::Failed;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn peripheral() -> RecoveryPeripheral {
        RecoveryPeripheral {
            peer: PeerId::from_raw(1),
        }
    }

    #[test]
    fn prepare_may_only_be_called_once() {
        let mut session = DfuSession::new(peripheral());
        assert!(session.prepare().is_ok());
        assert_eq!(session.prepare(), Err(DfuError::OnlyPrepareOnce));
    }

    #[test]
    fn write_requires_prior_prepare() {
        let mut session = DfuSession::new(peripheral());
        assert_eq!(session.begin_write(), Err(DfuError::NoApplication));
        session.prepare().unwrap();
        assert!(session.begin_write().is_ok());
    }

    #[test]
    fn write_may_only_be_called_once() {
        let mut session = DfuSession::new(peripheral());
        session.prepare().unwrap();
        session.begin_write().unwrap();
        assert_eq!(session.begin_write(), Err(DfuError::OnlyWriteOnce));
    }

    #[test]
    fn complete_and_fail_update_state() {
        let mut session = DfuSession::new(peripheral());
        session.complete();
        assert_eq!(session.state(), DfuState::Completed);
        session.fail();
        assert_eq!(session.state(), DfuState::Failed);
    }
}
