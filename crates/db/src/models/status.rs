//! Status helper enums mapping to SMALLSERIAL/SMALLINT lookup tables.
//!
//! Each enum variant's discriminant matches the seed data order (1-based)
//! in the corresponding `*_statuses` database table, and its label matches
//! the seeded `name`.

use serde::{Serialize, Serializer};

/// Status ID type matching SMALLINT/SMALLSERIAL in the database.
pub type StatusId = i16;

macro_rules! define_status_enum {
    (
        $(#[$meta:meta])*
        $name:ident {
            $( $(#[$vmeta:meta])* $variant:ident = $val:literal => $label:literal ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[repr(i16)]
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $( $(#[$vmeta])* $variant = $val ),+
        }

        impl $name {
            /// Return the database status ID.
            pub fn id(self) -> StatusId {
                self as StatusId
            }

            /// Look up a variant by database status ID.
            pub fn from_id(id: StatusId) -> Option<Self> {
                match id {
                    $( $val => Some($name::$variant), )+
                    _ => None,
                }
            }

            /// Seeded lookup-table name.
            pub fn as_str(self) -> &'static str {
                match self {
                    $( $name::$variant => $label, )+
                }
            }
        }

        impl From<$name> for StatusId {
            fn from(value: $name) -> Self {
                value as StatusId
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(self.as_str())
            }
        }
    };
}

define_status_enum! {
    /// Queue row status.
    JobStatus {
        Queued = 1 => "QUEUED",
        Running = 2 => "RUNNING",
        Succeeded = 3 => "SUCCEEDED",
        Failed = 4 => "FAILED",
    }
}

define_status_enum! {
    /// Ingestion and generation run status.
    RunStatus {
        Queued = 1 => "QUEUED",
        Running = 2 => "RUNNING",
        Succeeded = 3 => "SUCCEEDED",
        Failed = 4 => "FAILED",
    }
}

/// Serialize a raw `status_id` column as its lookup name.
pub(crate) fn serialize_run_status<S: Serializer>(
    id: &StatusId,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match RunStatus::from_id(*id) {
        Some(status) => status.serialize(serializer),
        None => serializer.serialize_i16(*id),
    }
}

/// Serialize a raw job `status_id` column as its lookup name.
pub(crate) fn serialize_job_status<S: Serializer>(
    id: &StatusId,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match JobStatus::from_id(*id) {
        Some(status) => status.serialize(serializer),
        None => serializer.serialize_i16(*id),
    }
}
