use portio_core::error::{PortBuildError, PortError};

///Device setup failure: a bad descriptor, or the peripheral not answering the
///way its data sheet says it should.
pub struct DeviceConfigError {
    pub message: String,
}

impl DeviceConfigError {
    pub fn new(message: String) -> Self {
        Self { message }
    }

    pub fn from_str(message: &str) -> Self {
        Self {
            message: message.to_owned(),
        }
    }
}

impl std::fmt::Debug for DeviceConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "DeviceConfigError: {}", self.message)
    }
}

impl From<PortError> for DeviceConfigError {
    fn from(err: PortError) -> Self {
        Self {
            message: format!("{:?}", err),
        }
    }
}

impl From<DeviceConfigError> for PortBuildError {
    fn from(err: DeviceConfigError) -> Self {
        PortBuildError::from_string(err.message)
    }
}
