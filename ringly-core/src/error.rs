//! Error taxonomy for the wire codecs, the peripheral model, and the central manager.
//!
//! Each originating component gets its own error enum with a hand-written [`Display`] impl: no
//! error-derive macro, so call sites can still match on a specific variant instead of only
//! formatting the top-level error.

use std::fmt;

pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by [`crate::peripheral::Peripheral`] operations, i.e. everything in
/// `RLYPeripheralErrorDomain`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PeripheralError {
    /// The peripheral disconnected while performing the task that errored.
    Disconnected,
    RinglyServiceNotFound,
    CommandCharacteristicNotFound,
    MessageCharacteristicNotFound,
    AncsNotificationCharacteristicNotFound,
    TooManyAncsNotificationCharacteristicsFound,
    BondCharacteristicNotFound,
    ClearBondCharacteristicNotFound,
    ConfigurationHashCharacteristicNotFound,
    DeviceInformationServiceNotFound,
    DeviceApplicationCharacteristicNotFound,
    DeviceHardwareCharacteristicNotFound,
    DeviceManufacturerCharacteristicNotFound,
    BatteryServiceNotFound,
    BatteryStateCharacteristicNotFound,
    BatteryChargeCharacteristicNotFound,
    ActivityControlPointCharacteristicNotFound,
    ActivityTrackingDataCharacteristicNotFound,
    LoggingServiceNotFound,
    LoggingFlashCharacteristicNotFound,
    LoggingRequestCharacteristicNotFound,
    NoServicesFound,
    IncorrectLength,
    NotSubscribedToActivityNotifications,
}

impl fmt::Display for PeripheralError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Disconnected => f.write_str("peripheral disconnected"),
            Self::RinglyServiceNotFound => f.write_str("Ringly service not found"),
            Self::CommandCharacteristicNotFound => {
                f.write_str("Ringly command characteristic not found")
            }
            Self::MessageCharacteristicNotFound => {
                f.write_str("Ringly message characteristic not found")
            }
            Self::AncsNotificationCharacteristicNotFound => {
                f.write_str("Ringly ANCS notification characteristic not found")
            }
            Self::TooManyAncsNotificationCharacteristicsFound => {
                f.write_str("too many Ringly ANCS notification characteristics found")
            }
            Self::BondCharacteristicNotFound => f.write_str("Ringly bond characteristic not found"),
            Self::ClearBondCharacteristicNotFound => {
                f.write_str("Ringly clear bond characteristic not found")
            }
            Self::ConfigurationHashCharacteristicNotFound => {
                f.write_str("Ringly configuration hash characteristic not found")
            }
            Self::DeviceInformationServiceNotFound => {
                f.write_str("device information service not found")
            }
            Self::DeviceApplicationCharacteristicNotFound => {
                f.write_str("device application characteristic not found")
            }
            Self::DeviceHardwareCharacteristicNotFound => {
                f.write_str("device hardware characteristic not found")
            }
            Self::DeviceManufacturerCharacteristicNotFound => {
                f.write_str("device manufacturer characteristic not found")
            }
            Self::BatteryServiceNotFound => f.write_str("battery service not found"),
            Self::BatteryStateCharacteristicNotFound => {
                f.write_str("battery state characteristic not found")
            }
            Self::BatteryChargeCharacteristicNotFound => {
                f.write_str("battery charge characteristic not found")
            }
            Self::ActivityControlPointCharacteristicNotFound => {
                f.write_str("activity control point characteristic not found")
            }
            Self::ActivityTrackingDataCharacteristicNotFound => {
                f.write_str("activity tracking data characteristic not found")
            }
            Self::LoggingServiceNotFound => f.write_str("logging service not found"),
            Self::LoggingFlashCharacteristicNotFound => {
                f.write_str("logging flash characteristic not found")
            }
            Self::LoggingRequestCharacteristicNotFound => {
                f.write_str("logging request characteristic not found")
            }
            Self::NoServicesFound => f.write_str("no services found"),
            Self::IncorrectLength => f.write_str("data was of an incorrect length"),
            Self::NotSubscribedToActivityNotifications => {
                f.write_str("not subscribed to activity notifications")
            }
        }
    }
}

impl std::error::Error for PeripheralError {}

/// Errors surfaced while assembling version-1 (fragmented) ANCS notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AncsV1Error {
    /// A fragment arrived with a header identifier that didn't match the in-flight assembly.
    DifferentHeader,
    /// A fragment carried no header byte.
    InvalidHeader,
}

impl fmt::Display for AncsV1Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DifferentHeader => {
                f.write_str("fragment header did not match in-flight assembly")
            }
            Self::InvalidHeader => f.write_str("fragment carried no header byte"),
        }
    }
}

impl std::error::Error for AncsV1Error {}

/// Errors surfaced while parsing version-2 (TLV) ANCS notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AncsV2Error {
    IncorrectDataSize,
    InvalidNotificationAttributesCommandIdentifier,
    InvalidApplicationAttributesCommandIdentifier,
    MissingTitle,
    MissingDate,
}

impl fmt::Display for AncsV2Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::IncorrectDataSize => {
                f.write_str("buffer length did not match the declared attribute counts")
            }
            Self::InvalidNotificationAttributesCommandIdentifier => {
                f.write_str("invalid notification attributes command identifier")
            }
            Self::InvalidApplicationAttributesCommandIdentifier => {
                f.write_str("invalid application attributes command identifier")
            }
            Self::MissingTitle => f.write_str("notification is missing a title attribute"),
            Self::MissingDate => f.write_str("notification is missing a date attribute"),
        }
    }
}

impl std::error::Error for AncsV2Error {}

/// A minute value that fell outside `[0, 2^23 - 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ActivityDateRangeError {
    pub value: u32,
}

impl fmt::Display for ActivityDateRangeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "activity date minute {} is out of range [0, 8388607]",
            self.value
        )
    }
}

impl std::error::Error for ActivityDateRangeError {}

/// Errors surfaced while decoding the activity-sample buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActivityError {
    IncorrectDataLength,
    DateError(ActivityDateRangeError),
}

impl fmt::Display for ActivityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::IncorrectDataLength => {
                f.write_str("activity buffer length was not a multiple of 5")
            }
            Self::DateError(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for ActivityError {}

/// The boundary-only DFU/recovery error surface. The core exposes this enum so that a recovery
/// transport can report failures through the same observer machinery, but does not implement
/// the Nordic DFU protocol itself.
///
/// `ActuallyError26`'s numeric position intentionally does not follow the surrounding sequence;
/// see `DESIGN.md` for why it is kept exactly where it fell rather than renumbered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DfuError {
    NoZipFile,
    FailedToCreateDirectory,
    MissingDataFile,
    NoApplication,
    NoUpdate,
    NoManager,
    OnlyPrepareOnce,
    OnlyWriteOnce,
    Nordic,
    Disconnected,
    NoRecoveryPeripheral,
    NoWriteService,
    NoWriteCharacteristic,
    ActuallyError26 = 26,
    CentralManagerPoweredOff,
    CentralManagerUnsupported,
    CentralManagerUnauthorized,
    NotValidFileType,
    CancelledByInterface,
    FailedToFindPeripheral,
    UnknownApplicationVersion,
    UnknownBootloaderVersion,
    UnknownHardwareVersion,
    RepeatingWriteTimeout,
    ScanningTimeout,
}

impl fmt::Display for DfuError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoZipFile => f.write_str("no zip file"),
            Self::FailedToCreateDirectory => f.write_str("failed to create directory"),
            Self::MissingDataFile => f.write_str("missing data file"),
            Self::NoApplication => f.write_str("no application"),
            Self::NoUpdate => f.write_str("no update"),
            Self::NoManager => f.write_str("no manager"),
            Self::OnlyPrepareOnce => f.write_str("prepare may only be called once"),
            Self::OnlyWriteOnce => f.write_str("write may only be called once"),
            Self::Nordic => f.write_str("Nordic DFU library error"),
            Self::Disconnected => f.write_str("peripheral disconnected during DFU"),
            Self::NoRecoveryPeripheral => f.write_str("no recovery peripheral"),
            Self::NoWriteService => f.write_str("no write service"),
            Self::NoWriteCharacteristic => f.write_str("no write characteristic"),
            Self::ActuallyError26 => f.write_str("DFU error 26"),
            Self::CentralManagerPoweredOff => f.write_str("central manager powered off"),
            Self::CentralManagerUnsupported => f.write_str("central manager unsupported"),
            Self::CentralManagerUnauthorized => f.write_str("central manager unauthorized"),
            Self::NotValidFileType => f.write_str("not a valid file type"),
            Self::CancelledByInterface => f.write_str("cancelled by interface"),
            Self::FailedToFindPeripheral => f.write_str("failed to find peripheral"),
            Self::UnknownApplicationVersion => f.write_str("unknown application version"),
            Self::UnknownBootloaderVersion => f.write_str("unknown bootloader version"),
            Self::UnknownHardwareVersion => f.write_str("unknown hardware version"),
            Self::RepeatingWriteTimeout => f.write_str("repeating write timed out"),
            Self::ScanningTimeout => f.write_str("scanning timed out"),
        }
    }
}

impl std::error::Error for DfuError {}

/// An error surfaced by the injected [`crate::adapter::BleAdapter`], opaque to the core.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AdapterError(pub String);

impl fmt::Display for AdapterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for AdapterError {}

/// The top-level error type unifying every component's taxonomy, for call sites that want a
/// single `Result` alias without giving up the ability to match on the originating kind.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Error {
    Peripheral(PeripheralError),
    AncsV1(AncsV1Error),
    AncsV2(AncsV2Error),
    Activity(ActivityError),
    Dfu(DfuError),
    Adapter(AdapterError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Peripheral(e) => write!(f, "{e}"),
            Self::AncsV1(e) => write!(f, "{e}"),
            Self::AncsV2(e) => write!(f, "{e}"),
            Self::Activity(e) => write!(f, "{e}"),
            Self::Dfu(e) => write!(f, "{e}"),
            Self::Adapter(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for Error {}

impl From<PeripheralError> for Error {
    fn from(e: PeripheralError) -> Self {
        Self::Peripheral(e)
    }
}

impl From<AncsV1Error> for Error {
    fn from(e: AncsV1Error) -> Self {
        Self::AncsV1(e)
    }
}

impl From<AncsV2Error> for Error {
    fn from(e: AncsV2Error) -> Self {
        Self::AncsV2(e)
    }
}

impl From<ActivityError> for Error {
    fn from(e: ActivityError) -> Self {
        Self::Activity(e)
    }
}

impl From<DfuError> for Error {
    fn from(e: DfuError) -> Self {
        Self::Dfu(e)
    }
}

impl From<AdapterError> for Error {
    fn from(e: AdapterError) -> Self {
        Self::Adapter(e)
    }
}
