//! Extension payloads carried by object values: byte buffers, file handles
//! and error objects. They have no refcount of their own and are dropped
//! with the owning cell.

use crate::runtime::{
    helpers::{arg_number_or, arg_str},
    kind::{Kind, SubKind},
    status::{self, Failure},
    value::Value,
};

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Buffer {
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FileHandle {
    pub path: String,
    pub mode: String,
    pub position: u64,
    pub is_open: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ErrorObject {
    pub message: String,
    pub code: i32,
    pub error_type: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Extension {
    Buffer(Buffer),
    FileHandle(FileHandle),
    Error(ErrorObject),
}

impl Extension {
    pub fn sub_kind(&self) -> SubKind {
        match self {
            Extension::Buffer(_) => SubKind::Buffer,
            Extension::FileHandle(_) => SubKind::FileHandle,
            Extension::Error(_) => SubKind::Error,
        }
    }

    pub fn type_name(&self) -> &'static str {
        self.sub_kind().type_name()
    }

    /// Read-only fields exposed through `getField`.
    pub fn virtual_property(&self, name: &str) -> Option<Value> {
        if name == "type" {
            return Some(Value::static_str(self.type_name()));
        }
        match self {
            Extension::Buffer(buffer) => match name {
                "size" => Some(Value::number(buffer.bytes.len() as f64)),
                "capacity" => Some(Value::number(buffer.bytes.capacity() as f64)),
                _ => None,
            },
            Extension::FileHandle(file) => match name {
                "path" => Some(Value::string(file.path.as_str())),
                "mode" => Some(Value::string(file.mode.as_str())),
                "isOpen" => Some(Value::bool(file.is_open)),
                "position" => Some(Value::number(file.position as f64)),
                _ => None,
            },
            Extension::Error(error) => match name {
                "message" => Some(Value::string(error.message.as_str())),
                "code" => Some(Value::number(f64::from(error.code))),
                "errorType" => Some(Value::string(error.error_type.as_str())),
                _ => None,
            },
        }
    }

    pub fn as_buffer(&self) -> Option<&Buffer> {
        match self {
            Extension::Buffer(buffer) => Some(buffer),
            _ => None,
        }
    }
}

impl Value {
    pub fn buffer(bytes: Vec<u8>) -> Value {
        Value::extension(Extension::Buffer(Buffer { bytes }))
    }

    pub fn file_handle(handle: FileHandle) -> Value {
        Value::extension(Extension::FileHandle(handle))
    }

    pub fn error_object(error: ErrorObject) -> Value {
        Value::extension(Extension::Error(error))
    }

    /// Bytes of a Buffer object.
    pub fn buffer_bytes(&self) -> Option<Vec<u8>> {
        self.as_ext()
            .and_then(|ext| ext.as_buffer().map(|b| b.bytes.clone()))
    }
}

/// `makeError(message, code?, errorType?)`.
pub fn make_error(message: &Value, code: &Value, error_type: &Value) -> Value {
    status::settle(|| {
        let message = arg_str(message, "makeError", "message", Kind::Object)?;
        let code = arg_number_or(code, 0.0);
        let error_type = match error_type.as_str() {
            Some(name) => name.to_string(),
            None if error_type.is_null() || error_type.is_undefined() => "Error".to_string(),
            None => {
                return Err(Failure::typed(
                    status::StatusCode::TypeError,
                    "(makeError) errorType must be a string",
                    Kind::Object,
                ));
            }
        };
        Ok(Value::error_object(ErrorObject {
            message: message.to_string(),
            code: code as i32,
            error_type,
        }))
    })
}

/// Error object describing the current status channel contents, for `catch`
/// bindings.
pub fn last_error() -> Value {
    let current = status::current();
    Value::error_object(ErrorObject {
        message: current.message.to_string(),
        code: current.code.as_i32(),
        error_type: current.code.label().to_string(),
    })
}
