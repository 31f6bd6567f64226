//! Filesystem tools.
//!
//! Every path argument goes through the session allow-list before any I/O.

pub mod compare;
pub mod compress;
pub mod create_dir;
pub mod delete;
pub mod file_info;
pub mod hash;
pub mod list_allowed;
pub mod list_dir;
pub mod merge;
pub mod read_file;
pub mod rename;
pub mod search;
pub mod write_file;

pub use compare::FsCompareTool;
pub use compress::FsCompressTool;
pub use create_dir::FsCreateDirTool;
pub use delete::FsDeleteTool;
pub use file_info::FsFileInfoTool;
pub use hash::FsHashTool;
pub use list_allowed::ListAllowedDirectoriesTool;
pub use list_dir::FsListDirTool;
pub use merge::FsMergeTool;
pub use read_file::FsReadFileTool;
pub use rename::FsRenameTool;
pub use search::FsSearchTool;
pub use write_file::FsWriteFileTool;

use std::fs;
use std::path::Path;

use super::super::ToolError;

/// Kind of a filesystem entry, as reported to clients.
pub(crate) fn entry_kind(metadata: &fs::Metadata) -> &'static str {
    if metadata.is_symlink() {
        "symlink"
    } else if metadata.is_dir() {
        "directory"
    } else if metadata.is_file() {
        "file"
    } else {
        "other"
    }
}

/// Read a whole regular file, refusing anything above `max_bytes`.
pub(crate) fn read_bounded(path: &Path, max_bytes: u64) -> Result<Vec<u8>, ToolError> {
    let metadata = fs::metadata(path)?;
    if !metadata.is_file() {
        return Err(ToolError::invalid_arguments(format!(
            "Not a regular file: {}",
            path.display()
        )));
    }
    if metadata.len() > max_bytes {
        return Err(ToolError::invalid_arguments(format!(
            "File is too large: {} is {} bytes, limit is {} bytes",
            path.display(),
            metadata.len(),
            max_bytes
        )));
    }
    Ok(fs::read(path)?)
}

/// Read a bounded file as UTF-8 text.
pub(crate) fn read_text_bounded(path: &Path, max_bytes: u64) -> Result<String, ToolError> {
    let bytes = read_bounded(path, max_bytes)?;
    String::from_utf8(bytes).map_err(|_| {
        ToolError::invalid_arguments(format!("File is not valid UTF-8 text: {}", path.display()))
    })
}

/// Format file size in human-readable format.
pub(crate) fn format_size(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];

    if bytes == 0 {
        return "0 B".to_string();
    }

    let mut size = bytes as f64;
    let mut unit_index = 0;

    while size >= 1024.0 && unit_index < UNITS.len() - 1 {
        size /= 1024.0;
        unit_index += 1;
    }

    if unit_index == 0 {
        format!("{} {}", size as u64, UNITS[unit_index])
    } else {
        format!("{:.1} {}", size, UNITS[unit_index])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(0), "0 B");
        assert_eq!(format_size(500), "500 B");
        assert_eq!(format_size(1024), "1.0 KB");
        assert_eq!(format_size(1536), "1.5 KB");
        assert_eq!(format_size(1048576), "1.0 MB");
    }

    #[test]
    fn test_read_bounded_limits() {
        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join("big.txt");
        fs::write(&file, "0123456789").unwrap();

        assert_eq!(read_bounded(&file, 10).unwrap().len(), 10);
        assert!(matches!(
            read_bounded(&file, 9),
            Err(ToolError::InvalidArguments(_))
        ));
        assert!(matches!(
            read_bounded(temp_dir.path(), 100),
            Err(ToolError::InvalidArguments(_))
        ));
    }

    #[test]
    fn test_read_text_rejects_binary() {
        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join("bin");
        fs::write(&file, [0xff, 0xfe, 0x00]).unwrap();
        assert!(read_text_bounded(&file, 100).is_err());
    }
}
