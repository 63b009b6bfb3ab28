// ── Known field codes ──

use strum::{Display, EnumIter, EnumString};

/// How a device attaches to the network (`WE` field).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, EnumIter)]
pub enum ConnectionType {
    #[strum(serialize = "W")]
    Wireless,
    #[strum(serialize = "E")]
    Wired,
}

impl ConnectionType {
    pub fn describe(self) -> &'static str {
        match self {
            Self::Wireless => "wifi",
            Self::Wired => "wired ethernet",
        }
    }
}

/// Host classification (`code` field).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, EnumIter)]
pub enum DeviceCode {
    /// Any Raspberry Pi model.
    #[strum(serialize = "RPi")]
    RaspberryPi,
    /// Intel Atom-based Atomic Pi.
    #[strum(serialize = "APi")]
    AtomicPi,
    #[strum(serialize = "OPi")]
    OrangePi,
    /// Any NVIDIA Jetson model.
    #[strum(serialize = "NVD")]
    Nvidia,
    #[strum(serialize = "APL")]
    Apple,
    #[strum(serialize = "AMZ")]
    Amazon,
    /// Intel-based PC.
    #[strum(serialize = "iPC")]
    IntelPc,
    #[strum(serialize = "OTH")]
    Other,
}

impl DeviceCode {
    pub fn describe(self) -> &'static str {
        match self {
            Self::RaspberryPi => "Raspberry Pi",
            Self::AtomicPi => "Atomic Pi",
            Self::OrangePi => "Orange Pi",
            Self::Nvidia => "NVIDIA Jetson",
            Self::Apple => "Apple product",
            Self::Amazon => "Amazon product",
            Self::IntelPc => "Intel PC",
            Self::Other => "other",
        }
    }
}
