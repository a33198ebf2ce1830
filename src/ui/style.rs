//! Terminal styling helpers with NO_COLOR support.

use unicode_width::UnicodeWidthChar;

const TAB_STOP: usize = 4;

/// Check if color output is enabled (respects `NO_COLOR` env var).
pub fn color_enabled() -> bool {
    std::env::var_os("NO_COLOR").is_none()
}

/// Colors used for panel borders and titles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Color {
    Blue,
    Green,
    Cyan,
}

impl Color {
    fn code(self) -> &'static str {
        match self {
            Color::Blue => "\x1b[34m",
            Color::Green => "\x1b[32m",
            Color::Cyan => "\x1b[36m",
        }
    }
}

/// Terminal style helper that respects NO_COLOR.
#[derive(Debug, Clone, Copy)]
pub struct Style {
    enabled: bool,
}

impl Default for Style {
    fn default() -> Self {
        Self::new()
    }
}

impl Style {
    pub fn new() -> Self {
        Self {
            enabled: color_enabled(),
        }
    }

    /// Create a style with colors explicitly enabled (for tests).
    pub fn force_enabled() -> Self {
        Self { enabled: true }
    }

    /// Create a style with colors explicitly disabled.
    pub fn disabled() -> Self {
        Self { enabled: false }
    }

    fn wrap(&self, start: &str, text: &str) -> String {
        if self.enabled {
            format!("{start}{text}\x1b[0m")
        } else {
            text.to_string()
        }
    }

    pub fn dim(&self, text: &str) -> String {
        self.wrap("\x1b[2m", text)
    }

    pub fn italic_cyan(&self, text: &str) -> String {
        self.wrap("\x1b[3;36m", text)
    }

    pub fn paint(&self, color: Color, text: &str) -> String {
        self.wrap(color.code(), text)
    }

    pub fn bold(&self, color: Color, text: &str) -> String {
        if self.enabled {
            format!("\x1b[1m{}{text}\x1b[0m", color.code())
        } else {
            text.to_string()
        }
    }

    /// Draw `body` inside a box sized to its widest line, with `title` set
    /// into the top border.
    pub fn panel(&self, title: &str, body: &str, color: Color) -> String {
        let lines: Vec<String> = body.lines().map(expand_tabs).collect();
        let title_width = visible_width(title) + 2;
        let inner = lines
            .iter()
            .map(|l| visible_width(l))
            .max()
            .unwrap_or(0)
            .max(title_width)
            + 2;

        let left = (inner - title_width) / 2;
        let right = inner - title_width - left;
        let mut out = String::new();
        out.push_str(&self.paint(color, &format!("╭{}", "─".repeat(left))));
        out.push(' ');
        out.push_str(&self.bold(color, title));
        out.push(' ');
        out.push_str(&self.paint(color, &format!("{}╮", "─".repeat(right))));
        out.push('\n');
        for line in &lines {
            let pad = inner - 2 - visible_width(line);
            out.push_str(&self.paint(color, "│"));
            out.push(' ');
            out.push_str(line);
            out.push_str(&" ".repeat(pad));
            out.push(' ');
            out.push_str(&self.paint(color, "│"));
            out.push('\n');
        }
        out.push_str(&self.paint(color, &format!("╰{}╯", "─".repeat(inner))));
        out.push('\n');
        out
    }
}

/// Replace each tab with spaces up to the next tab stop.
pub fn expand_tabs(line: &str) -> String {
    if !line.contains('\t') {
        return line.to_string();
    }
    let mut out = String::with_capacity(line.len());
    let mut column = 0;
    let mut in_escape = false;
    for c in line.chars() {
        if c == '\t' {
            let fill = TAB_STOP - column % TAB_STOP;
            out.extend(std::iter::repeat_n(' ', fill));
            column += fill;
            continue;
        }
        out.push(c);
        column += char_width(c, &mut in_escape);
    }
    out
}

/// Compute visible width of a string, ignoring ANSI escape sequences.
/// Tabs advance to the next tab stop.
pub fn visible_width(s: &str) -> usize {
    let mut in_escape = false;
    s.chars().fold(0, |width, c| {
        if c == '\t' && !in_escape {
            width + TAB_STOP - width % TAB_STOP
        } else {
            width + char_width(c, &mut in_escape)
        }
    })
}

fn char_width(c: char, in_escape: &mut bool) -> usize {
    if *in_escape {
        if c.is_ascii_alphabetic() {
            *in_escape = false;
        }
        0
    } else if c == '\x1b' {
        *in_escape = true;
        0
    } else {
        c.width().unwrap_or(0)
    }
}
