//! Platform metadata used while archiving.
//!
//! Inode identity, device numbers and the capability extended attribute are
//! only available on some platforms. [`MetadataProvider`] hides the
//! difference: [`UnixMetadata`] reads the real values, [`PortableMetadata`]
//! reports everything as absent so archiving still works elsewhere.

use std::fs::Metadata;
use std::path::Path;

/// Extended attribute captured into archives.
pub const CAPABILITY_XATTR: &str = "security.capability";

/// Identity of a file's inode, used to detect hardlinks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LinkIdentity {
    /// Device containing the inode.
    pub device: u64,
    /// Inode number.
    pub inode: u64,
    /// Number of directory entries pointing at the inode.
    pub links: u64,
}

impl LinkIdentity {
    /// Key for the hardlink table; inode numbers are only unique per device.
    #[must_use]
    pub fn key(&self) -> (u64, u64) {
        (self.device, self.inode)
    }
}

/// Device major/minor pair of a character or block device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceNumbers {
    /// Major number.
    pub major: u32,
    /// Minor number.
    pub minor: u32,
}

impl DeviceNumbers {
    /// Splits a raw device id using the classic Linux encoding: the major
    /// number is 12 bits above an 8-bit shift, the minor number is the low
    /// byte combined with a second 12-bit field above bit 12.
    ///
    /// # Examples
    ///
    /// ```
    /// use sz_core::metadata::DeviceNumbers;
    ///
    /// // /dev/null is 1:3
    /// let numbers = DeviceNumbers::from_raw(0x0103);
    /// assert_eq!((numbers.major, numbers.minor), (1, 3));
    /// ```
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn from_raw(rdev: u64) -> Self {
        Self {
            major: ((rdev >> 8) & 0xfff) as u32,
            minor: ((rdev & 0xff) | ((rdev >> 12) & 0xf_ff00)) as u32,
        }
    }
}

/// Source of platform-specific file metadata.
pub trait MetadataProvider {
    /// Returns the inode identity of `meta`, or `None` if the platform has no
    /// inode concept.
    fn link_identity(&self, meta: &Metadata) -> Option<LinkIdentity>;

    /// Returns the device numbers of a device file, or `None` if unavailable.
    fn device_numbers(&self, meta: &Metadata) -> Option<DeviceNumbers>;

    /// Returns the raw `security.capability` attribute of `path` without
    /// following symlinks, or `None` if it is absent or cannot be read.
    fn capability(&self, path: &Path) -> Option<Vec<u8>>;
}

/// Provider that reports every piece of platform metadata as absent.
#[derive(Debug, Default, Clone, Copy)]
pub struct PortableMetadata;

impl MetadataProvider for PortableMetadata {
    fn link_identity(&self, _meta: &Metadata) -> Option<LinkIdentity> {
        None
    }

    fn device_numbers(&self, _meta: &Metadata) -> Option<DeviceNumbers> {
        None
    }

    fn capability(&self, _path: &Path) -> Option<Vec<u8>> {
        None
    }
}

/// Provider backed by `stat(2)` fields and `lgetxattr(2)`.
#[cfg(unix)]
#[derive(Debug, Default, Clone, Copy)]
pub struct UnixMetadata;

#[cfg(unix)]
impl MetadataProvider for UnixMetadata {
    fn link_identity(&self, meta: &Metadata) -> Option<LinkIdentity> {
        use std::os::unix::fs::MetadataExt;

        Some(LinkIdentity {
            device: meta.dev(),
            inode: meta.ino(),
            links: meta.nlink(),
        })
    }

    fn device_numbers(&self, meta: &Metadata) -> Option<DeviceNumbers> {
        use std::os::unix::fs::MetadataExt;

        Some(DeviceNumbers::from_raw(meta.rdev()))
    }

    fn capability(&self, path: &Path) -> Option<Vec<u8>> {
        match xattr::lget(path, CAPABILITY_XATTR) {
            Ok(value) => value,
            Err(e) => {
                tracing::debug!(path = %path.display(), error = %e, "capability xattr unreadable");
                None
            }
        }
    }
}

/// Returns the provider for the current platform.
#[must_use]
pub fn default_provider() -> &'static dyn MetadataProvider {
    #[cfg(unix)]
    {
        &UnixMetadata
    }
    #[cfg(not(unix))]
    {
        &PortableMetadata
    }
}

#[cfg(unix)]
mod xattr {
    use std::io;
    use std::path::Path;

    /// Reads an extended attribute without following symlinks.
    ///
    /// Returns `Ok(None)` when the attribute is not set or the filesystem
    /// does not support extended attributes.
    #[cfg(target_os = "linux")]
    pub(super) fn lget(path: &Path, name: &str) -> io::Result<Option<Vec<u8>>> {
        use std::ffi::CString;
        use std::os::unix::ffi::OsStrExt;

        let c_path = CString::new(path.as_os_str().as_bytes())
            .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "path contains NUL byte"))?;
        let c_name = CString::new(name)
            .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "name contains NUL byte"))?;

        let mut value = vec![0u8; 128];
        loop {
            // SAFETY: both strings are valid NUL-terminated C strings that
            // outlive the call, and `value` is writable for `value.len()`
            // bytes.
            #[allow(unsafe_code)]
            let size = unsafe {
                libc::lgetxattr(
                    c_path.as_ptr(),
                    c_name.as_ptr(),
                    value.as_mut_ptr().cast(),
                    value.len(),
                )
            };

            if let Ok(len) = usize::try_from(size) {
                value.truncate(len);
                return Ok(Some(value));
            }

            let err = io::Error::last_os_error();
            match err.raw_os_error() {
                Some(libc::ENODATA | libc::ENOTSUP) => return Ok(None),
                // Value grew between calls or is larger than the first guess.
                Some(libc::ERANGE) => {
                    let doubled = value.len().saturating_mul(2);
                    value.resize(doubled, 0);
                }
                _ => return Err(err),
            }
        }
    }

    #[cfg(not(target_os = "linux"))]
    pub(super) fn lget(_path: &Path, _name: &str) -> io::Result<Option<Vec<u8>>> {
        Ok(None)
    }
}
