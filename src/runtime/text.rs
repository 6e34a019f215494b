/// String payload. Static text is borrowed for the whole program (literal
/// constants); owned text is freed with its cell.
#[derive(Debug)]
pub enum Text {
    Static(&'static str),
    Owned(Box<str>),
}

impl Text {
    pub fn as_str(&self) -> &str {
        match self {
            Text::Static(s) => s,
            Text::Owned(s) => s,
        }
    }

    /// Length in bytes; NUL bytes are ordinary content.
    pub fn byte_len(&self) -> usize {
        self.as_str().len()
    }

    pub fn char_len(&self) -> usize {
        self.as_str().chars().count()
    }

    pub fn is_static(&self) -> bool {
        matches!(self, Text::Static(_))
    }
}
