use serde::Serialize;

/// Runtime discriminant of a value. The numeric tags are part of the C ABI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[repr(u8)]
pub enum Kind {
    Number = 0,
    String = 1,
    Array = 2,
    Object = 3,
    Bool = 4,
    Null = 5,
    Undefined = 6,
    Function = 7,
}

impl Kind {
    pub fn from_tag(tag: i32) -> Option<Kind> {
        Some(match tag {
            0 => Kind::Number,
            1 => Kind::String,
            2 => Kind::Array,
            3 => Kind::Object,
            4 => Kind::Bool,
            5 => Kind::Null,
            6 => Kind::Undefined,
            7 => Kind::Function,
            _ => return None,
        })
    }

    /// Language-level type name reported by `typeof`.
    pub fn type_of_name(self) -> &'static str {
        match self {
            Kind::Number => "num",
            Kind::String => "str",
            Kind::Bool => "bl",
            Kind::Null => "null",
            Kind::Array | Kind::Object => "obj",
            Kind::Function => "func",
            Kind::Undefined => "undef",
        }
    }
}

/// Payload selector for object values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[repr(u8)]
pub enum SubKind {
    Plain = 0,
    Buffer = 1,
    FileHandle = 2,
    Error = 3,
}

impl SubKind {
    pub fn type_name(self) -> &'static str {
        match self {
            SubKind::Plain => "Object",
            SubKind::Buffer => "Buffer",
            SubKind::FileHandle => "FileHandle",
            SubKind::Error => "Error",
        }
    }
}
