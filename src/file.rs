/*
 * Thin wrappers over Win32 file handles and file mappings. Both close their
 * handles on drop; `close()` exists for callers that want the error.
 */
use crate::error::{PlatformError, Result as PlatformResult};

use std::path::{Path, PathBuf};

use windows::Win32::{
    Foundation::{CloseHandle, GENERIC_READ, GENERIC_WRITE, HANDLE},
    Storage::FileSystem::{
        CREATE_ALWAYS, CreateFileW, FILE_ATTRIBUTE_NORMAL, FILE_BEGIN, FILE_CREATION_DISPOSITION,
        FILE_SHARE_MODE, FILE_SHARE_READ, GetFileSizeEx, OPEN_ALWAYS, OPEN_EXISTING, ReadFile,
        SetEndOfFile, SetFilePointerEx, WriteFile,
    },
    System::Memory::{
        CreateFileMappingW, FILE_MAP_READ, FILE_MAP_WRITE, MEMORY_MAPPED_VIEW_ADDRESS,
        MapViewOfFile, PAGE_READONLY, PAGE_READWRITE, UnmapViewOfFile,
    },
};
use windows::core::{HSTRING, PCWSTR};

/// How a file is opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileAccess {
    /// Existing file, read only; others may read too.
    Read,
    /// Existing file, read and write.
    ReadWrite,
    /// Opens the file, creating it empty if missing.
    OpenOrCreate,
    /// Creates the file, truncating it if it exists.
    Overwrite,
}

impl FileAccess {
    fn writable(self) -> bool {
        self != FileAccess::Read
    }

    fn open_flags(self) -> (u32, FILE_SHARE_MODE, FILE_CREATION_DISPOSITION) {
        let read_write = GENERIC_READ.0 | GENERIC_WRITE.0;
        match self {
            FileAccess::Read => (GENERIC_READ.0, FILE_SHARE_READ, OPEN_EXISTING),
            FileAccess::ReadWrite => (read_write, FILE_SHARE_MODE(0), OPEN_EXISTING),
            FileAccess::OpenOrCreate => (read_write, FILE_SHARE_MODE(0), OPEN_ALWAYS),
            FileAccess::Overwrite => (read_write, FILE_SHARE_MODE(0), CREATE_ALWAYS),
        }
    }
}

fn io_error(operation: &str, path: &Path, err: windows::core::Error) -> PlatformError {
    PlatformError::Io(format!("{operation} '{}': {}", path.display(), err.message()))
}

/// Adds one `WriteFile` chunk to the running total; a zero-byte write would
/// loop forever and is an error.
fn advance_write(total: usize, written: u32, path: &Path) -> PlatformResult<usize> {
    if written == 0 {
        return Err(PlatformError::Io(format!(
            "WriteFile '{}' wrote nothing after {total} byte(s)",
            path.display()
        )));
    }
    Ok(total + written as usize)
}

#[derive(Debug)]
pub struct File {
    handle: HANDLE,
    path: PathBuf,
    access: FileAccess,
}

impl File {
    pub fn open(path: impl AsRef<Path>, access: FileAccess) -> PlatformResult<Self> {
        let path = path.as_ref();
        let (desired, share, disposition) = access.open_flags();
        let handle = unsafe {
            CreateFileW(
                &HSTRING::from(path.as_os_str()),
                desired,
                share,
                None,
                disposition,
                FILE_ATTRIBUTE_NORMAL,
                None,
            )
        }
        .map_err(|e| io_error("CreateFileW", path, e))?;
        log::debug!("File: opened '{}' ({access:?})", path.display());
        Ok(Self {
            handle,
            path: path.to_path_buf(),
            access,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn access(&self) -> FileAccess {
        self.access
    }

    fn checked_handle(&self) -> PlatformResult<HANDLE> {
        if self.handle.is_invalid() {
            return Err(PlatformError::InvalidHandle(format!(
                "file '{}' is closed",
                self.path.display()
            )));
        }
        Ok(self.handle)
    }

    pub fn size(&self) -> PlatformResult<u64> {
        let handle = self.checked_handle()?;
        let mut size = 0i64;
        unsafe { GetFileSizeEx(handle, &mut size) }
            .map_err(|e| io_error("GetFileSizeEx", &self.path, e))?;
        Ok(size as u64)
    }

    /// Moves the file pointer back to the start.
    pub fn rewind(&self) -> PlatformResult<()> {
        let handle = self.checked_handle()?;
        unsafe { SetFilePointerEx(handle, 0, None, FILE_BEGIN) }
            .map_err(|e| io_error("SetFilePointerEx", &self.path, e))
    }

    /// Reads the whole file from the start.
    pub fn read_all(&self) -> PlatformResult<Vec<u8>> {
        let size = usize::try_from(self.size()?).map_err(|_| {
            PlatformError::Io(format!("'{}' is too large to read", self.path.display()))
        })?;
        self.rewind()?;
        let mut buffer = vec![0u8; size];
        let mut filled = 0usize;
        while filled < size {
            let mut read = 0u32;
            let chunk = &mut buffer[filled..size.min(filled + u32::MAX as usize)];
            unsafe { ReadFile(self.handle, Some(chunk), Some(&mut read), None) }
                .map_err(|e| io_error("ReadFile", &self.path, e))?;
            if read == 0 {
                break;
            }
            filled += read as usize;
        }
        buffer.truncate(filled);
        Ok(buffer)
    }

    /// Writes `data` at the current file pointer.
    pub fn write(&self, data: &[u8]) -> PlatformResult<()> {
        let handle = self.checked_handle()?;
        if !self.access.writable() {
            return Err(PlatformError::Io(format!(
                "'{}' was opened read-only",
                self.path.display()
            )));
        }
        let mut written_total = 0usize;
        while written_total < data.len() {
            let end = data.len().min(written_total + u32::MAX as usize);
            let mut written = 0u32;
            unsafe { WriteFile(handle, Some(&data[written_total..end]), Some(&mut written), None) }
                .map_err(|e| io_error("WriteFile", &self.path, e))?;
            written_total = advance_write(written_total, written, &self.path)?;
        }
        Ok(())
    }

    /// Truncates or extends the file to `new_size` bytes and rewinds.
    pub fn resize(&self, new_size: u64) -> PlatformResult<()> {
        let handle = self.checked_handle()?;
        let distance = i64::try_from(new_size)
            .map_err(|_| PlatformError::Io(format!("size {new_size} out of range")))?;
        unsafe {
            SetFilePointerEx(handle, distance, None, FILE_BEGIN)
                .map_err(|e| io_error("SetFilePointerEx", &self.path, e))?;
            SetEndOfFile(handle).map_err(|e| io_error("SetEndOfFile", &self.path, e))?;
        }
        self.rewind()
    }

    pub fn close(&mut self) -> PlatformResult<()> {
        if self.handle.is_invalid() {
            return Ok(());
        }
        let handle = std::mem::take(&mut self.handle);
        unsafe { CloseHandle(handle) }.map_err(|e| io_error("CloseHandle", &self.path, e))?;
        log::debug!("File: closed '{}'", self.path.display());
        Ok(())
    }

    pub(crate) fn raw_handle(&self) -> HANDLE {
        self.handle
    }
}

impl Drop for File {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            log::warn!("File: {e}");
        }
    }
}

/*
 * A file mapped into memory in its entirety. Zero-length files cannot be
 * mapped, so an empty file simply has no view and reads as an empty slice.
 */
#[derive(Debug)]
pub struct FileMapped {
    file: File,
    mapping: HANDLE,
    view: MEMORY_MAPPED_VIEW_ADDRESS,
    len: usize,
}

impl FileMapped {
    pub fn open(path: impl AsRef<Path>, access: FileAccess) -> PlatformResult<Self> {
        let file = File::open(path, access)?;
        let mut mapped = Self {
            file,
            mapping: HANDLE::default(),
            view: MEMORY_MAPPED_VIEW_ADDRESS::default(),
            len: 0,
        };
        mapped.map()?;
        Ok(mapped)
    }

    fn map(&mut self) -> PlatformResult<()> {
        let size = self.file.size()?;
        let len = usize::try_from(size).map_err(|_| {
            PlatformError::Io(format!(
                "'{}' is too large to map",
                self.file.path().display()
            ))
        })?;
        if len == 0 {
            self.len = 0;
            return Ok(());
        }
        let writable = self.file.access().writable();
        let protect = if writable { PAGE_READWRITE } else { PAGE_READONLY };
        let mapping = unsafe {
            CreateFileMappingW(self.file.raw_handle(), None, protect, 0, 0, PCWSTR::null())
        }
        .map_err(|e| io_error("CreateFileMappingW", self.file.path(), e))?;

        let desired = if writable {
            FILE_MAP_READ | FILE_MAP_WRITE
        } else {
            FILE_MAP_READ
        };
        let view = unsafe { MapViewOfFile(mapping, desired, 0, 0, 0) };
        if view.Value.is_null() {
            unsafe {
                let _ = CloseHandle(mapping);
            }
            return Err(PlatformError::Io(format!(
                "MapViewOfFile '{}' failed",
                self.file.path().display()
            )));
        }
        self.mapping = mapping;
        self.view = view;
        self.len = len;
        log::debug!("FileMapped: mapped {len} byte(s) of '{}'", self.file.path().display());
        Ok(())
    }

    fn unmap(&mut self) -> PlatformResult<()> {
        if !self.view.Value.is_null() {
            let view = std::mem::take(&mut self.view);
            unsafe { UnmapViewOfFile(view) }
                .map_err(|e| io_error("UnmapViewOfFile", self.file.path(), e))?;
        }
        if !self.mapping.is_invalid() {
            let mapping = std::mem::take(&mut self.mapping);
            unsafe { CloseHandle(mapping) }
                .map_err(|e| io_error("CloseHandle(mapping)", self.file.path(), e))?;
        }
        self.len = 0;
        Ok(())
    }

    pub fn size(&self) -> usize {
        self.len
    }

    pub fn as_slice(&self) -> &[u8] {
        if self.view.Value.is_null() {
            return &[];
        }
        unsafe { std::slice::from_raw_parts(self.view.Value as *const u8, self.len) }
    }

    /// Fails for files opened with `FileAccess::Read`.
    pub fn as_mut_slice(&mut self) -> PlatformResult<&mut [u8]> {
        if !self.file.access().writable() {
            return Err(PlatformError::Io(format!(
                "'{}' is mapped read-only",
                self.file.path().display()
            )));
        }
        if self.view.Value.is_null() {
            return Ok(&mut []);
        }
        Ok(unsafe { std::slice::from_raw_parts_mut(self.view.Value as *mut u8, self.len) })
    }

    /// Unmaps, resizes the file and maps it again.
    pub fn resize(&mut self, new_size: u64) -> PlatformResult<()> {
        self.unmap()?;
        self.file.resize(new_size)?;
        self.map()
    }

    pub fn close(mut self) -> PlatformResult<()> {
        self.unmap()?;
        self.file.close()
    }
}

impl Drop for FileMapped {
    fn drop(&mut self) {
        if let Err(e) = self.unmap() {
            log::warn!("FileMapped: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_access_shares_reads_and_requires_existing_file() {
        let (desired, share, disposition) = FileAccess::Read.open_flags();
        assert_eq!(desired, GENERIC_READ.0);
        assert_eq!(share, FILE_SHARE_READ);
        assert_eq!(disposition, OPEN_EXISTING);
        assert!(!FileAccess::Read.writable());
    }

    #[test]
    fn overwrite_truncates_and_writes() {
        let (desired, _, disposition) = FileAccess::Overwrite.open_flags();
        assert_ne!(desired & GENERIC_WRITE.0, 0);
        assert_eq!(disposition, CREATE_ALWAYS);
    }

    #[test]
    fn zero_byte_write_is_an_error() {
        // Arrange
        let path = Path::new("out.bin");
        // Act
        let stalled = advance_write(4096, 0, path);
        let progressed = advance_write(4096, 512, path);
        // Assert
        assert!(matches!(stalled, Err(PlatformError::Io(_))));
        assert_eq!(progressed.unwrap(), 4608);
    }
}
