//! The peripheral validation pipeline: the sequence of checks a freshly connected
//! peripheral must pass before the rest of the core will treat it as usable.
//!
//! ```text
//! Discovered ──discoverServices──▶ WaitingForServices
//! WaitingForServices ──all required found──▶ WaitingForCharacteristics
//! WaitingForCharacteristics ──each service reports chars──▶ WaitingForNotificationStateConfirmation
//! WaitingForNotificationStateConfirmation ──all confirmed──▶ Validated
//! any state ──error──▶ HasValidationErrors (keeps list)
//! any state ──peripheral disconnected──▶ Discovered (errors cleared)
//! ```
//!
//! [`ValidationState`] keeps exactly this diagram's nodes. The original implementation's
//! `RLYPeripheralValidationState` is more granular (it names each missing-service/characteristic
//! case individually); rather than either collapsing that detail or changing the diagram's
//! shape, the extra granularity is carried on the side in [`BlockedOn`], populated only
//! alongside [`ValidationState::WaitingForCharacteristics`].

use crate::error::PeripheralError;

/// The coarse validation state, matching the 5-node diagram plus the error-accumulation branch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ValidationState {
    #[default]
    Discovered,
    WaitingForServices,
    WaitingForCharacteristics,
    WaitingForNotificationStateConfirmation,
    Validated,
    HasValidationErrors,
}

/// Which specific characteristic discovery is still outstanding, valid only while
/// [`ValidationState::WaitingForCharacteristics`] is current.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlockedOn {
    RinglyService,
    CommandCharacteristic,
    MessageCharacteristic,
    AncsCharacteristic,
    BondCharacteristic,
    ClearBondCharacteristic,
    ConfigurationHashCharacteristic,
    DeviceInformationService,
    BatteryService,
}

/// The validation pipeline's running state for one peripheral. Errors accumulate into
/// `validation_errors` rather than replacing one another, since a peripheral can be missing more
/// than one required item at once; reconnection (`reset`) clears the list along with the state.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Validation {
    state: ValidationState,
    blocked_on: Option<BlockedOn>,
    validation_errors: Vec<PeripheralError>,
}

impl Validation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> ValidationState {
        self.state
    }

    pub fn blocked_on(&self) -> Option<BlockedOn> {
        self.blocked_on
    }

    pub fn validation_errors(&self) -> &[PeripheralError] {
        &self.validation_errors
    }

    /// Resets to `Discovered` with an empty error list, e.g. after a disconnect.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn start_discovering_services(&mut self) {
        self.state = ValidationState::WaitingForServices;
        self.blocked_on = None;
    }

    /// Advances into (or further through) `WaitingForCharacteristics`, recording which specific
    /// characteristic is still outstanding. Calling this repeatedly as each prerequisite is
    /// satisfied narrows `blocked_on` one step at a time without changing `state`.
    pub fn waiting_for(&mut self, blocked_on: BlockedOn) {
        self.state = ValidationState::WaitingForCharacteristics;
        self.blocked_on = Some(blocked_on);
    }

    pub fn start_waiting_for_notification_state_confirmation(&mut self) {
        self.state = ValidationState::WaitingForNotificationStateConfirmation;
        self.blocked_on = None;
    }

    pub fn mark_validated(&mut self) {
        self.state = ValidationState::Validated;
        self.blocked_on = None;
    }

    /// Records a validation error and transitions to `HasValidationErrors` from any state.
    pub fn record_error(&mut self, error: PeripheralError) {
        self.state = ValidationState::HasValidationErrors;
        self.blocked_on = None;
        self.validation_errors.push(error);
    }

    pub fn is_validated(&self) -> bool {
        self.state == ValidationState::Validated
    }

    pub fn has_errors(&self) -> bool {
        self.state == ValidationState::HasValidationErrors
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_validation_starts_discovered() {
        let v = Validation::new();
        assert_eq!(v.state(), ValidationState::Discovered);
        assert_eq!(v.blocked_on(), None);
        assert!(v.validation_errors().is_empty());
    }

    #[test]
    fn blocked_on_is_only_meaningful_during_waiting_for_characteristics() {
        let mut v = Validation::new();
        v.start_discovering_services();
        assert_eq!(v.state(), ValidationState::WaitingForServices);
        assert_eq!(v.blocked_on(), None);

        v.waiting_for(BlockedOn::RinglyService);
        assert_eq!(v.state(), ValidationState::WaitingForCharacteristics);
        assert_eq!(v.blocked_on(), Some(BlockedOn::RinglyService));

        v.start_waiting_for_notification_state_confirmation();
        assert_eq!(v.blocked_on(), None);
    }

    #[test]
    fn full_pipeline_reaches_validated() {
        let mut v = Validation::new();
        v.start_discovering_services();
        v.waiting_for(BlockedOn::CommandCharacteristic);
        v.waiting_for(BlockedOn::BatteryService);
        v.start_waiting_for_notification_state_confirmation();
        v.mark_validated();
        assert!(v.is_validated());
    }

    #[test]
    fn missing_command_characteristic_produces_exactly_that_error_code() {
        let mut v = Validation::new();
        v.start_discovering_services();
        v.record_error(PeripheralError::CommandCharacteristicNotFound);
        assert!(v.has_errors());
        assert_eq!(
            v.validation_errors(),
            &[PeripheralError::CommandCharacteristicNotFound]
        );
    }

    #[test]
    fn errors_accumulate_rather_than_replace() {
        let mut v = Validation::new();
        v.record_error(PeripheralError::CommandCharacteristicNotFound);
        v.record_error(PeripheralError::BatteryServiceNotFound);
        assert_eq!(v.validation_errors().len(), 2);
    }

    #[test]
    fn reset_returns_to_discovered_with_empty_errors() {
        let mut v = Validation::new();
        v.mark_validated();
        v.record_error(PeripheralError::CommandCharacteristicNotFound);
        v.reset();
        assert_eq!(v.state(), ValidationState::Discovered);
        assert!(v.validation_errors().is_empty());
    }
}
