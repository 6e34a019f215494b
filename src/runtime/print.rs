//! Diagnostic printing and `printf`.
//!
//! Rendering guards against cycles with a visit stack and against deep
//! graphs with `print_max_depth`. Colors follow `RuntimeConfig::color`; in
//! `Auto` mode they are on when stdout is a terminal.

use std::{cell::OnceCell, io::Write};

use crate::{
    config::{self, ColorMode},
    runtime::{
        coerce::{display_string, is_truthy, to_number_lossy},
        ext::Extension,
        number_format::{format_g, smart, truncate_fixed},
        status::{self, StatusCode},
        value::{Payload, Value, ValueCell},
    },
};

const RESET: &str = "\x1b[0m";
const NUMBER: &str = "\x1b[38;5;151m";
const STRING: &str = "\x1b[38;5;173m";
const BOOL: &str = "\x1b[34m";
const GRAY: &str = "\x1b[90m";
const GREEN: &str = "\x1b[38;5;79m";
const CYAN: &str = "\x1b[36m";
const BRACKETS: [&str; 3] = ["\x1b[38;5;220m", "\x1b[38;5;176m", "\x1b[38;5;111m"];

thread_local! {
    static STDOUT_TTY: OnceCell<bool> = const { OnceCell::new() };
}

fn stdout_is_terminal() -> bool {
    STDOUT_TTY.with(|cached| {
        *cached.get_or_init(|| {
            // SAFETY: isatty only inspects the descriptor.
            unsafe { libc::isatty(libc::STDOUT_FILENO) == 1 }
        })
    })
}

pub fn colors_enabled() -> bool {
    match config::with(|c| c.color) {
        ColorMode::Always => true,
        ColorMode::Never => false,
        ColorMode::Auto => stdout_is_terminal(),
    }
}

/// Top-level rendering: text prints raw and functions print their summary;
/// everything else renders as it would nested.
pub fn render(value: &Value, colors: bool) -> String {
    match value.payload() {
        Payload::Text(text) => text.as_str().to_string(),
        Payload::Function(closure) => {
            let summary = format!(
                "[Function: {:#x}, params={}, captured={}]",
                closure.entry().address(),
                closure.param_count(),
                closure.captured_count()
            );
            if colors {
                format!("{}{}{}", CYAN, summary, RESET)
            } else {
                summary
            }
        }
        _ => render_nested(value, colors),
    }
}

/// Rendering used for elements inside a container.
pub fn render_nested(value: &Value, colors: bool) -> String {
    let mut printer = Printer {
        out: String::new(),
        stack: Vec::new(),
        colors,
        max_depth: config::with(|c| c.print_max_depth),
    };
    printer.value(value, 0);
    printer.out
}

struct Printer {
    out: String,
    stack: Vec<*const ValueCell>,
    colors: bool,
    max_depth: usize,
}

impl Printer {
    fn paint(&mut self, color: &str, text: &str) {
        if self.colors {
            self.out.push_str(color);
            self.out.push_str(text);
            self.out.push_str(RESET);
        } else {
            self.out.push_str(text);
        }
    }

    fn bracket(&mut self, depth: usize, text: &str) {
        self.paint(BRACKETS[depth % BRACKETS.len()], text);
    }

    fn value(&mut self, value: &Value, depth: usize) {
        if depth >= self.max_depth {
            self.paint(GRAY, "[...]");
            return;
        }
        match value.payload() {
            Payload::Number(n) => self.paint(NUMBER, &smart(*n)),
            Payload::Bool(b) => self.paint(BOOL, if *b { "true" } else { "false" }),
            Payload::Null => self.paint(GRAY, "null"),
            Payload::Undefined => self.paint(GRAY, "undef"),
            Payload::Text(text) => self.paint(STRING, &format!("\"{}\"", text.as_str())),
            Payload::Function(_) => {
                if self.colors {
                    self.paint(GREEN, "[Function]");
                } else {
                    self.out.push_str("Function");
                }
            }
            Payload::Cell(inner) => {
                let inner = inner.borrow().clone();
                self.value(&inner, depth);
            }
            Payload::Ext(ext) => self.extension(&ext.borrow()),
            Payload::Array(items) => {
                let items = items.borrow();
                if items.is_empty() {
                    self.bracket(depth, "[]");
                } else if self.enter(value) {
                    self.bracket(depth, "[");
                    for (i, item) in items.iter().enumerate() {
                        if i > 0 {
                            self.out.push_str(", ");
                        }
                        self.value(item, depth + 1);
                    }
                    self.bracket(depth, "]");
                    self.stack.pop();
                }
            }
            Payload::Object(map) => {
                let map = map.borrow();
                if map.is_empty() {
                    self.bracket(depth, "{}");
                } else if self.enter(value) {
                    self.bracket(depth, "{");
                    self.out.push(' ');
                    for (i, (key, item)) in map.iter().enumerate() {
                        if i > 0 {
                            self.out.push_str(", ");
                        }
                        self.out.push_str(key);
                        self.out.push_str(": ");
                        self.value(item, depth + 1);
                    }
                    self.out.push(' ');
                    self.bracket(depth, "}");
                    self.stack.pop();
                }
            }
        }
    }

    fn enter(&mut self, value: &Value) -> bool {
        let ptr = value.as_ptr();
        if self.stack.contains(&ptr) {
            self.paint(GRAY, "[Circular]");
            return false;
        }
        self.stack.push(ptr);
        true
    }

    fn extension(&mut self, ext: &Extension) {
        self.paint(GREEN, ext.type_name());
        let fields = match ext {
            Extension::Buffer(buffer) => {
                format!(" {{ size: {}, type: \"Buffer\" }}", buffer.bytes.len())
            }
            Extension::FileHandle(file) => format!(
                " {{ path: \"{}\", mode: \"{}\", position: {}, isOpen: {} }}",
                file.path, file.mode, file.position, file.is_open
            ),
            Extension::Error(error) => format!(
                " {{ message: \"{}\", code: {}, errorType: \"{}\" }}",
                error.message, error.code, error.error_type
            ),
        };
        self.out.push_str(&fields);
    }
}

fn write_stdout(text: &str) {
    let mut stdout = std::io::stdout().lock();
    if let Err(err) = stdout.write_all(text.as_bytes()).and_then(|_| stdout.flush()) {
        log::debug!("stdout write failed: {}", err);
    }
}

pub fn print(value: &Value) {
    print_values(std::slice::from_ref(value), false);
}

pub fn println(value: &Value) {
    print_values(std::slice::from_ref(value), true);
}

/// Writes each value at top level, separated by spaces.
pub fn print_values(values: &[Value], newline: bool) {
    let colors = colors_enabled();
    let mut line = values
        .iter()
        .map(|value| render(value, colors))
        .collect::<Vec<_>>()
        .join(" ");
    if newline {
        line.push('\n');
    }
    write_stdout(&line);
}

/// One parsed `%` directive.
#[derive(Debug, Default)]
struct Directive {
    left: bool,
    width: usize,
    precision: Option<usize>,
}

impl Directive {
    fn pad(&self, body: String) -> String {
        let len = body.chars().count();
        if len >= self.width {
            return body;
        }
        let fill = " ".repeat(self.width - len);
        if self.left {
            body + &fill
        } else {
            fill + &body
        }
    }
}

/// Renders a `printf` template. Supported conversions are `%d %i %f %g %s
/// %b %v %%` with an optional `-` flag, width and `.precision`. `%f`
/// truncates. A directive with no argument left is copied through as text.
pub fn format(template: &str, args: &[Value]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut args = args.iter();
    let mut chars = template.char_indices().peekable();
    while let Some((start, ch)) = chars.next() {
        if ch != '%' {
            out.push(ch);
            continue;
        }
        let mut directive = Directive::default();
        if chars.next_if(|&(_, c)| c == '-').is_some() {
            directive.left = true;
        }
        while let Some((_, digit)) = chars.next_if(|(_, c)| c.is_ascii_digit()) {
            directive.width = directive.width * 10 + digit.to_digit(10).unwrap_or(0) as usize;
        }
        if chars.next_if(|&(_, c)| c == '.').is_some() {
            let mut precision = 0;
            while let Some((_, digit)) = chars.next_if(|(_, c)| c.is_ascii_digit()) {
                precision = precision * 10 + digit.to_digit(10).unwrap_or(0) as usize;
            }
            directive.precision = Some(precision);
        }
        let Some((end, conversion)) = chars.next() else {
            out.push_str(&template[start..]);
            break;
        };
        let spec_text = &template[start..end + conversion.len_utf8()];
        if conversion == '%' {
            out.push('%');
            continue;
        }
        if !matches!(conversion, 'd' | 'i' | 'f' | 'g' | 's' | 'b' | 'v') {
            out.push_str(spec_text);
            continue;
        }
        let Some(arg) = args.next() else {
            out.push_str(spec_text);
            continue;
        };
        let body = match conversion {
            'd' | 'i' => format!("{}", to_number_lossy(arg).trunc() as i64),
            'f' => truncate_fixed(to_number_lossy(arg), directive.precision.unwrap_or(6)),
            'g' => format_g(to_number_lossy(arg), directive.precision.unwrap_or(6)),
            'b' => is_truthy(arg).to_string(),
            'v' => render(arg, false),
            _ => {
                let text = display_string(arg);
                match directive.precision {
                    Some(limit) => text.chars().take(limit).collect(),
                    None => text,
                }
            }
        };
        out.push_str(&directive.pad(body));
    }
    out
}

/// `printf(template, ...args)` to stdout.
pub fn printf(template: &Value, args: &[Value]) -> Value {
    status::settle(|| {
        let text = template.as_str().ok_or_else(|| {
            status::Failure::new(
                StatusCode::TypeError,
                "(printf) format must be a string",
                Value::undefined(),
            )
        })?;
        write_stdout(&format(text, args));
        Ok(Value::undefined())
    })
}
