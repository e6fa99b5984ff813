//! The Windows subsystem (if any) required to run the image, carried in the
//! optional header's `subsystem` field.

use std::fmt::{self, Display};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Subsystem {
    Unknown,
    Native,
    WindowsGui,
    WindowsCui,
    Os2Cui,
    PosixCui,
    NativeWindows,
    WindowsCeGui,
    EfiApplication,
    EfiBootServiceDriver,
    EfiRuntimeDriver,
    EfiRom,
    Xbox,
    WindowsBootApplication,
    Other(u16),
}

impl Subsystem {
    pub const IMAGE_SUBSYSTEM_UNKNOWN: u16 = 0x0000;
    pub const IMAGE_SUBSYSTEM_NATIVE: u16 = 0x0001;
    pub const IMAGE_SUBSYSTEM_WINDOWS_GUI: u16 = 0x0002;
    pub const IMAGE_SUBSYSTEM_WINDOWS_CUI: u16 = 0x0003;
    pub const IMAGE_SUBSYSTEM_OS2_CUI: u16 = 0x0005;
    pub const IMAGE_SUBSYSTEM_POSIX_CUI: u16 = 0x0007;
    pub const IMAGE_SUBSYSTEM_NATIVE_WINDOWS: u16 = 0x0008;
    pub const IMAGE_SUBSYSTEM_WINDOWS_CE_GUI: u16 = 0x0009;
    pub const IMAGE_SUBSYSTEM_EFI_APPLICATION: u16 = 0x000A;
    pub const IMAGE_SUBSYSTEM_EFI_BOOT_SERVICE_DRIVER: u16 = 0x000B;
    pub const IMAGE_SUBSYSTEM_EFI_RUNTIME_DRIVER: u16 = 0x000C;
    pub const IMAGE_SUBSYSTEM_EFI_ROM: u16 = 0x000D;
    pub const IMAGE_SUBSYSTEM_XBOX: u16 = 0x000E;
    pub const IMAGE_SUBSYSTEM_WINDOWS_BOOT_APPLICATION: u16 = 0x0010;

    pub fn to_u16(self) -> u16 {
        match self {
            Self::Unknown => Self::IMAGE_SUBSYSTEM_UNKNOWN,
            Self::Native => Self::IMAGE_SUBSYSTEM_NATIVE,
            Self::WindowsGui => Self::IMAGE_SUBSYSTEM_WINDOWS_GUI,
            Self::WindowsCui => Self::IMAGE_SUBSYSTEM_WINDOWS_CUI,
            Self::Os2Cui => Self::IMAGE_SUBSYSTEM_OS2_CUI,
            Self::PosixCui => Self::IMAGE_SUBSYSTEM_POSIX_CUI,
            Self::NativeWindows => Self::IMAGE_SUBSYSTEM_NATIVE_WINDOWS,
            Self::WindowsCeGui => Self::IMAGE_SUBSYSTEM_WINDOWS_CE_GUI,
            Self::EfiApplication => Self::IMAGE_SUBSYSTEM_EFI_APPLICATION,
            Self::EfiBootServiceDriver => Self::IMAGE_SUBSYSTEM_EFI_BOOT_SERVICE_DRIVER,
            Self::EfiRuntimeDriver => Self::IMAGE_SUBSYSTEM_EFI_RUNTIME_DRIVER,
            Self::EfiRom => Self::IMAGE_SUBSYSTEM_EFI_ROM,
            Self::Xbox => Self::IMAGE_SUBSYSTEM_XBOX,
            Self::WindowsBootApplication => Self::IMAGE_SUBSYSTEM_WINDOWS_BOOT_APPLICATION,
            Self::Other(v) => v,
        }
    }
}

impl From<u16> for Subsystem {
    fn from(value: u16) -> Self {
        match value {
            Self::IMAGE_SUBSYSTEM_UNKNOWN => Self::Unknown,
            Self::IMAGE_SUBSYSTEM_NATIVE => Self::Native,
            Self::IMAGE_SUBSYSTEM_WINDOWS_GUI => Self::WindowsGui,
            Self::IMAGE_SUBSYSTEM_WINDOWS_CUI => Self::WindowsCui,
            Self::IMAGE_SUBSYSTEM_OS2_CUI => Self::Os2Cui,
            Self::IMAGE_SUBSYSTEM_POSIX_CUI => Self::PosixCui,
            Self::IMAGE_SUBSYSTEM_NATIVE_WINDOWS => Self::NativeWindows,
            Self::IMAGE_SUBSYSTEM_WINDOWS_CE_GUI => Self::WindowsCeGui,
            Self::IMAGE_SUBSYSTEM_EFI_APPLICATION => Self::EfiApplication,
            Self::IMAGE_SUBSYSTEM_EFI_BOOT_SERVICE_DRIVER => Self::EfiBootServiceDriver,
            Self::IMAGE_SUBSYSTEM_EFI_RUNTIME_DRIVER => Self::EfiRuntimeDriver,
            Self::IMAGE_SUBSYSTEM_EFI_ROM => Self::EfiRom,
            Self::IMAGE_SUBSYSTEM_XBOX => Self::Xbox,
            Self::IMAGE_SUBSYSTEM_WINDOWS_BOOT_APPLICATION => Self::WindowsBootApplication,
            other => Self::Other(other),
        }
    }
}

impl Display for Subsystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Unknown => "unknown",
            Self::Native => "native",
            Self::WindowsGui => "Windows GUI",
            Self::WindowsCui => "Windows console",
            Self::Os2Cui => "OS/2 console",
            Self::PosixCui => "Posix console",
            Self::NativeWindows => "native Windows driver",
            Self::WindowsCeGui => "Windows CE GUI",
            Self::EfiApplication => "EFI application",
            Self::EfiBootServiceDriver => "EFI boot service driver",
            Self::EfiRuntimeDriver => "EFI runtime driver",
            Self::EfiRom => "EFI ROM",
            Self::Xbox => "Xbox",
            Self::WindowsBootApplication => "Windows boot application",
            Self::Other(v) => return write!(f, "unrecognized subsystem {v:#06x}"),
        };
        f.write_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_known_values() {
        assert_eq!(Subsystem::from(0x0002), Subsystem::WindowsGui);
        assert_eq!(Subsystem::WindowsGui.to_u16(), 0x0002);
    }

    #[test]
    fn unknown_value_is_preserved() {
        assert_eq!(Subsystem::from(0x00ff), Subsystem::Other(0x00ff));
    }
}
