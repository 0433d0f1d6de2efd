// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Built-in file tools for Quill

mod append_to_file;
mod create_file;
mod file_edit;
mod file_info;
mod file_read;
mod list_files;

pub use append_to_file::AppendToFileTool;
pub use create_file::CreateFileTool;
pub use file_edit::FileEditTool;
pub use file_info::FileInfoTool;
pub use file_read::FileReadTool;
pub use list_files::ListFilesTool;
