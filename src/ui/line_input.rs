use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InputResult {
    Continue,
    Submit,
    Cancel,
}

/// Single-line entry for a manual time in seconds. Only digits and one
/// decimal point are accepted, so the text is always ASCII.
#[derive(Clone, Debug, Default)]
pub struct TimeInput {
    text: String,
    /// Cursor position (0 = before first char).
    cursor: usize,
}

impl TimeInput {
    pub fn new(text: &str) -> Self {
        let text: String = text
            .chars()
            .filter(|c| c.is_ascii_digit() || *c == '.')
            .collect();
        Self {
            cursor: text.len(),
            text,
        }
    }

    pub fn value(&self) -> &str {
        &self.text
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    pub fn clear(&mut self) {
        self.text.clear();
        self.cursor = 0;
    }

    /// Returns (before_cursor, cursor_char, after_cursor) for styled rendering.
    pub fn render_parts(&self) -> (&str, Option<char>, &str) {
        let (before, rest) = self.text.split_at(self.cursor);
        let mut chars = rest.chars();
        match chars.next() {
            Some(ch) => (before, Some(ch), chars.as_str()),
            None => (before, None, ""),
        }
    }

    pub fn handle(&mut self, key: KeyEvent) -> InputResult {
        match key.code {
            KeyCode::Esc => return InputResult::Cancel,
            KeyCode::Enter => return InputResult::Submit,

            KeyCode::Left => self.cursor = self.cursor.saturating_sub(1),
            KeyCode::Right => self.cursor = (self.cursor + 1).min(self.text.len()),
            KeyCode::Home => self.cursor = 0,
            KeyCode::End => self.cursor = self.text.len(),
            KeyCode::Backspace => {
                if self.cursor > 0 {
                    self.cursor -= 1;
                    self.text.remove(self.cursor);
                }
            }
            KeyCode::Delete => {
                if self.cursor < self.text.len() {
                    self.text.remove(self.cursor);
                }
            }
            KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => self.clear(),
            KeyCode::Char(ch) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
                let accepted = ch.is_ascii_digit() || (ch == '.' && !self.text.contains('.'));
                if accepted {
                    self.text.insert(self.cursor, ch);
                    self.cursor += 1;
                }
            }
            _ => {}
        }
        InputResult::Continue
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn type_str(input: &mut TimeInput, s: &str) {
        for ch in s.chars() {
            input.handle(key(KeyCode::Char(ch)));
        }
    }

    #[test]
    fn test_accepts_digits_and_one_point() {
        let mut input = TimeInput::default();
        type_str(&mut input, "12a.3.4s");
        assert_eq!(input.value(), "12.34");
    }

    #[test]
    fn test_backspace_and_cursor_moves() {
        let mut input = TimeInput::new("12.5");
        input.handle(key(KeyCode::Left));
        input.handle(key(KeyCode::Backspace));
        assert_eq!(input.value(), "125");
        input.handle(key(KeyCode::Home));
        input.handle(key(KeyCode::Delete));
        assert_eq!(input.value(), "25");
        assert_eq!(input.render_parts(), ("", Some('2'), "5"));
    }

    #[test]
    fn test_enter_and_esc() {
        let mut input = TimeInput::new("9");
        assert_eq!(input.handle(key(KeyCode::Enter)), InputResult::Submit);
        assert_eq!(input.handle(key(KeyCode::Esc)), InputResult::Cancel);
        assert_eq!(input.value(), "9");
    }

    #[test]
    fn test_ctrl_u_clears() {
        let mut input = TimeInput::new("42.1");
        input.handle(KeyEvent::new(KeyCode::Char('u'), KeyModifiers::CONTROL));
        assert!(input.is_empty());
        assert_eq!(input.render_parts(), ("", None, ""));
    }

    #[test]
    fn test_new_filters_invalid_chars() {
        assert_eq!(TimeInput::new("1x2").value(), "12");
    }
}
