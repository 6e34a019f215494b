//! Filesystem bridge. Every operation reports through the status channel
//! and answers with `false`, -1 or a typed null on failure.

use std::{
    fs::{self, File, OpenOptions},
    io::{self, ErrorKind, Write},
    path::Path,
};

use crate::runtime::{
    coerce::to_number_lossy,
    ext::{Extension, FileHandle},
    helpers::arg_str,
    kind::Kind,
    status::{self, Failure, StatusCode},
    value::Value,
};

fn io_failure(message: &'static str, err: &io::Error, fallback: Value) -> Failure {
    log::debug!("{}: {}", message, err);
    Failure::io(message, fallback)
}

fn path_arg<'a>(value: &'a Value, op: &str, label: &str, fallback: Value) -> Result<&'a str, Failure> {
    value
        .as_str()
        .ok_or_else(|| Failure::type_error(format!("({}) {} must be a string", op, label), fallback))
}

pub fn read_file(path: &Value) -> Value {
    status::settle(|| {
        let path = arg_str(path, "readFile", "path", Kind::String)?;
        let bytes = fs::read(path).map_err(|err| {
            io_failure(
                "(readFile) cannot open file",
                &err,
                Value::null_typed(Kind::String),
            )
        })?;
        Ok(Value::string(String::from_utf8_lossy(&bytes).into_owned()))
    })
}

fn write_text(op: &str, path: &Value, content: &Value, append: bool) -> Value {
    status::settle(|| {
        let path = path_arg(path, op, "path", Value::bool(false))?;
        let content = path_arg(content, op, "content", Value::bool(false))?;
        let opened = if append {
            OpenOptions::new().append(true).create(true).open(path)
        } else {
            File::create(path)
        };
        let message = if append {
            "(appendFile) cannot open file"
        } else {
            "(writeFile) cannot create file"
        };
        let mut file = opened.map_err(|err| io_failure(message, &err, Value::bool(false)))?;
        file.write_all(content.as_bytes())
            .map_err(|err| io_failure(message, &err, Value::bool(false)))?;
        Ok(Value::bool(true))
    })
}

pub fn write_file(path: &Value, content: &Value) -> Value {
    write_text("writeFile", path, content, false)
}

pub fn append_file(path: &Value, content: &Value) -> Value {
    write_text("appendFile", path, content, true)
}

pub fn file_exists(path: &Value) -> Value {
    let exists = path.as_str().is_some_and(|p| Path::new(p).is_file());
    status::ok(Value::bool(exists))
}

pub fn dir_exists(path: &Value) -> Value {
    let exists = path.as_str().is_some_and(|p| Path::new(p).is_dir());
    status::ok(Value::bool(exists))
}

pub fn delete_file(path: &Value) -> Value {
    status::settle(|| {
        let path = path_arg(path, "deleteFile", "path", Value::bool(false))?;
        fs::remove_file(path).map_err(|err| {
            io_failure("(deleteFile) failed to delete file", &err, Value::bool(false))
        })?;
        Ok(Value::bool(true))
    })
}

/// Size in bytes, or -1 when the path cannot be inspected.
pub fn get_file_size(path: &Value) -> Value {
    let size = path
        .as_str()
        .and_then(|p| fs::metadata(p).ok())
        .map_or(-1.0, |meta| meta.len() as f64);
    status::ok(Value::number(size))
}

pub fn read_bytes(path: &Value) -> Value {
    status::settle(|| {
        let path = arg_str(path, "readBytes", "path", Kind::Object)?;
        let bytes = fs::read(path).map_err(|err| {
            io_failure(
                "(readBytes) cannot open file",
                &err,
                Value::null_typed(Kind::Object),
            )
        })?;
        Ok(Value::buffer(bytes))
    })
}

/// Writes a Buffer, or an array of numbers taken modulo 256.
pub fn write_bytes(path: &Value, data: &Value) -> Value {
    status::settle(|| {
        let path = path_arg(path, "writeBytes", "path", Value::bool(false))?;
        let bytes = if let Some(items) = data.as_array() {
            items
                .iter()
                .map(|item| (to_number_lossy(item) as i64 & 0xff) as u8)
                .collect()
        } else if let Some(bytes) = data.buffer_bytes() {
            bytes
        } else {
            return Err(Failure::type_error(
                "(writeBytes) data must be Buffer or array",
                Value::bool(false),
            ));
        };
        fs::write(path, bytes).map_err(|err| {
            io_failure("(writeBytes) cannot create file", &err, Value::bool(false))
        })?;
        Ok(Value::bool(true))
    })
}

/// Lines without their terminators.
pub fn read_lines(path: &Value) -> Value {
    status::settle(|| {
        let path = arg_str(path, "readLines", "path", Kind::Array)?;
        let bytes = fs::read(path).map_err(|err| {
            io_failure(
                "(readLines) cannot open file",
                &err,
                Value::null_typed(Kind::Array),
            )
        })?;
        let text = String::from_utf8_lossy(&bytes);
        Ok(Value::array(text.lines().map(Value::string).collect()))
    })
}

pub fn rename_file(from: &Value, to: &Value) -> Value {
    status::settle(|| {
        let from = path_arg(from, "renameFile", "oldPath", Value::bool(false))?;
        let to = path_arg(to, "renameFile", "newPath", Value::bool(false))?;
        fs::rename(from, to).map_err(|err| {
            io_failure("(renameFile) failed to rename file", &err, Value::bool(false))
        })?;
        Ok(Value::bool(true))
    })
}

pub fn copy_file(source: &Value, destination: &Value) -> Value {
    status::settle(|| {
        let source = path_arg(source, "copyFile", "src", Value::bool(false))?;
        let destination = path_arg(destination, "copyFile", "dest", Value::bool(false))?;
        let mut reader = File::open(source).map_err(|err| {
            io_failure("(copyFile) cannot open source file", &err, Value::bool(false))
        })?;
        let mut writer = File::create(destination).map_err(|err| {
            io_failure(
                "(copyFile) cannot create destination file",
                &err,
                Value::bool(false),
            )
        })?;
        io::copy(&mut reader, &mut writer).map_err(|err| {
            io_failure(
                "(copyFile) failed to write to destination file",
                &err,
                Value::bool(false),
            )
        })?;
        Ok(Value::bool(true))
    })
}

pub fn create_dir(path: &Value) -> Value {
    status::settle(|| {
        let path = path_arg(path, "createDir", "path", Value::bool(false))?;
        fs::create_dir(path).map_err(|err| {
            let message = match err.kind() {
                ErrorKind::AlreadyExists => "(createDir) directory already exists",
                _ => "(createDir) failed to create directory",
            };
            io_failure(message, &err, Value::bool(false))
        })?;
        Ok(Value::bool(true))
    })
}

/// Removes an empty directory.
pub fn remove_dir(path: &Value) -> Value {
    status::settle(|| {
        let path = path_arg(path, "removeDir", "path", Value::bool(false))?;
        fs::remove_dir(path).map_err(|err| {
            let message = match err.kind() {
                ErrorKind::DirectoryNotEmpty => "(removeDir) directory not empty",
                ErrorKind::NotFound => "(removeDir) directory does not exist",
                _ => "(removeDir) failed to remove directory",
            };
            io_failure(message, &err, Value::bool(false))
        })?;
        Ok(Value::bool(true))
    })
}

/// Entry names, sorted.
pub fn list_dir(path: &Value) -> Value {
    status::settle(|| {
        let path = arg_str(path, "listDir", "path", Kind::Array)?;
        let cannot_open = |err: io::Error| {
            io_failure(
                "(listDir) cannot open directory",
                &err,
                Value::null_typed(Kind::Array),
            )
        };
        let mut names = Vec::new();
        for entry in fs::read_dir(path).map_err(cannot_open)? {
            let entry = entry.map_err(cannot_open)?;
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
        names.sort();
        Ok(Value::array(names.into_iter().map(Value::string).collect()))
    })
}

/// `openFile(path, mode?)`: checks the file can be opened in `mode` (`r`,
/// `w` or `a`, default `r`) and returns a FileHandle object describing it.
pub fn open_file(path: &Value, mode: &Value) -> Value {
    status::settle(|| {
        let path = arg_str(path, "openFile", "path", Kind::Object)?;
        let mode = mode.as_str().unwrap_or("r");
        let mut options = OpenOptions::new();
        match mode {
            "r" => options.read(true),
            "w" => options.write(true).create(true).truncate(true),
            "a" => options.append(true).create(true),
            _ => {
                return Err(Failure::typed(
                    StatusCode::TypeError,
                    "(openFile) mode must be \"r\", \"w\" or \"a\"",
                    Kind::Object,
                ));
            }
        };
        let file = options.open(path).map_err(|err| {
            io_failure(
                "(openFile) cannot open file",
                &err,
                Value::null_typed(Kind::Object),
            )
        })?;
        let position = if mode == "a" {
            file.metadata().map_or(0, |meta| meta.len())
        } else {
            0
        };
        Ok(Value::file_handle(FileHandle {
            path: path.to_string(),
            mode: mode.to_string(),
            position,
            is_open: true,
        }))
    })
}

/// Marks a FileHandle closed. Returns false for anything else.
pub fn close_file(handle: &Value) -> Value {
    let closed = match handle.as_ext_mut().as_deref_mut() {
        Some(Extension::FileHandle(file)) => {
            let was_open = file.is_open;
            file.is_open = false;
            was_open
        }
        _ => false,
    };
    status::ok(Value::bool(closed))
}
