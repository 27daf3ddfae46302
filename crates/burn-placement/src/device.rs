use core::fmt;

use serde::{Deserialize, Serialize};

/// Kind of device an execution unit runs on.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum DeviceType {
    /// Host CPU.
    Cpu,
    /// Accelerator.
    Gpu,
}

impl fmt::Display for DeviceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeviceType::Cpu => f.write_str("cpu"),
            DeviceType::Gpu => f.write_str("gpu"),
        }
    }
}
