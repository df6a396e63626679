use shared::{domain::ChannelId, error::ApiException};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CrewError {
    #[error("chat api request failed: {0}")]
    Api(#[from] ApiException),
    #[error("crew name pool for parent {parent} is empty")]
    PoolExhausted { parent: ChannelId },
}

/// Treats a not-found API failure as success: the resource we wanted gone is gone.
pub trait AllowNotFound<T> {
    fn allow_not_found(self) -> Result<Option<T>, ApiException>;
}

impl<T> AllowNotFound<T> for Result<T, ApiException> {
    fn allow_not_found(self) -> Result<Option<T>, ApiException> {
        match self {
            Ok(value) => Ok(Some(value)),
            Err(err) if err.is_not_found() => Ok(None),
            Err(err) => Err(err),
        }
    }
}
