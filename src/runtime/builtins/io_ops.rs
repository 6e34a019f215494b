use std::io::{self, BufRead, Write};

use crate::runtime::{
    kind::Kind,
    status::{self, Failure, StatusCode},
    value::Value,
};

/// `input(prompt?)` from stdin.
pub fn input(prompt: &Value) -> Value {
    prompt_and_read(prompt, &mut io::stdout().lock(), &mut io::stdin().lock())
}

/// Writes a string `prompt` to `out`, then reads one line. A failed prompt
/// write is logged and does not stop the read.
pub fn prompt_and_read(prompt: &Value, out: &mut impl Write, reader: &mut impl BufRead) -> Value {
    if let Some(text) = prompt.as_str() {
        if let Err(err) = out.write_all(text.as_bytes()).and_then(|_| out.flush()) {
            log::debug!("input prompt write failed: {}", err);
        }
    }
    read_line_from(reader)
}

/// Reads one line without its `\n` / `\r\n` terminator. End of input and
/// read errors give a typed null string and the matching status.
pub fn read_line_from(reader: &mut impl BufRead) -> Value {
    status::settle(|| {
        let mut line = String::new();
        let read = reader.read_line(&mut line).map_err(|err| {
            log::debug!("input read failed: {}", err);
            Failure::typed(StatusCode::IoError, "(input) Input read error", Kind::String)
        })?;
        if read == 0 {
            return Err(Failure::typed(
                StatusCode::EndOfInput,
                "(input) End of input (EOF)",
                Kind::String,
            ));
        }
        if line.ends_with('\n') {
            line.pop();
        }
        if line.ends_with('\r') {
            line.pop();
        }
        Ok(Value::string(line))
    })
}
