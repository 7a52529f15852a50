use ropey::Rope;

/// Text of one editor view, as seen by scripts
#[derive(Debug, Default)]
pub struct Buffer {
    text: Rope,
}

impl Buffer {
    pub fn new() -> Self {
        Self {
            text: Rope::new(),
        }
    }

    pub fn from_text(s: &str) -> Self {
        Self {
            text: Rope::from_str(s),
        }
    }

    pub fn text(&self) -> String {
        self.text.to_string()
    }

    /// Replace the whole text
    pub fn set_text(&mut self, s: &str) {
        self.text = Rope::from_str(s);
    }

    pub fn append(&mut self, s: &str) {
        let end = self.text.len_chars();
        self.text.insert(end, s);
    }

    pub fn line_count(&self) -> usize {
        self.text.len_lines()
    }

    /// Line content without its trailing newline, None if out of bounds
    pub fn line(&self, idx: usize) -> Option<String> {
        if idx >= self.line_count() {
            return None;
        }
        let line = self.text.line(idx).to_string();
        Some(line.trim_end_matches(['\n', '\r']).to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_buffer_is_empty() {
        let buf = Buffer::new();
        assert_eq!(buf.line_count(), 1); // empty rope has 1 line
    }

    #[test]
    fn line_strips_newline() {
        let buf = Buffer::from_text("first\nsecond\r\nthird");
        assert_eq!(buf.line(0).as_deref(), Some("first"));
        assert_eq!(buf.line(1).as_deref(), Some("second"));
        assert_eq!(buf.line(2).as_deref(), Some("third"));
        assert_eq!(buf.line(3), None);
    }

    #[test]
    fn append_adds_line() {
        let mut buf = Buffer::from_text("hello");
        buf.append(" world\n");
        assert_eq!(buf.text(), "hello world\n");
        assert_eq!(buf.line_count(), 2); // trailing newline creates 2nd
    }
}
