//! Built-in sandboxed tools

mod list_directory;
mod read_file;
mod run_script;
mod write_file;

pub use list_directory::ListDirectoryTool;
pub use read_file::{MAX_CHARS, ReadFileTool};
pub use run_script::{NO_OUTPUT, RunScriptTool, SCRIPT_TIMEOUT};
pub use write_file::WriteFileTool;
