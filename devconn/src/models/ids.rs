//! Entity identifiers

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::ConnectivityError;

/// Common behaviour of UUID-backed identifiers
pub trait EntityId: fmt::Display {
    fn uuid(&self) -> &Uuid;

    /// The nil UUID is reserved and never names a real entity
    fn is_valid(&self) -> bool {
        !self.uuid().is_nil()
    }
}

macro_rules! entity_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub Uuid);

        impl $name {
            pub fn new(id: Uuid) -> Self {
                Self(id)
            }

            pub fn random() -> Self {
                Self(Uuid::new_v4())
            }
        }

        impl EntityId for $name {
            fn uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl std::str::FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Ok(Self(s.parse()?))
            }
        }
    };
}

entity_id!(
    /// Device identifier
    DeviceId
);
entity_id!(
    /// Tenant identifier
    TenantId
);
entity_id!(
    /// Device profile identifier
    DeviceProfileId
);

impl TenantId {
    /// Tenant that owns system-wide settings
    pub const SYS_TENANT_ID: TenantId = TenantId(Uuid::nil());
}

/// Reject invalid ids with a message built from the offending id
pub fn validate_id<T, F>(id: &T, message: F) -> Result<(), ConnectivityError>
where
    T: EntityId,
    F: FnOnce(&T) -> String,
{
    if id.is_valid() {
        Ok(())
    } else {
        Err(ConnectivityError::ValidationError(message(id)))
    }
}
