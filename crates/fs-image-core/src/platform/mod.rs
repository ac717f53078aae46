/// ScanParameter key holding the root directory on Windows hosts.
pub const ROOT_KEY_WIN32: &str = "RootDirWin32";
/// ScanParameter key holding the root directory everywhere else.
pub const ROOT_KEY_LINUX: &str = "RootDirLinux";

/// The root-path key used on this platform.
#[cfg(target_os = "windows")]
pub fn root_parameter_key() -> &'static str {
    ROOT_KEY_WIN32
}

#[cfg(not(target_os = "windows"))]
pub fn root_parameter_key() -> &'static str {
    ROOT_KEY_LINUX
}
