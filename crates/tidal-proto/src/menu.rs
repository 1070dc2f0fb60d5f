//! Menu model and rofi script-mode rendering.
//!
//! Wire format, one row per line:
//!
//! ```text
//!   <text>\0icon\x1f<icon>\x1finfo\x1f<payload-json>
//!   \0prompt\x1f<text>
//!   \0message\x1f<text>
//! ```

use crate::payload::Payload;
use std::fmt;

const ROW_OPTION: char = '\0';
const FIELD_SEP: char = '\x1f';

pub const ICON_TRACK: &str = "audio-x-generic";
pub const ICON_ALBUM: &str = "media-optical";
pub const ICON_PAUSE: &str = "media-playback-pause";
pub const ICON_PLAY: &str = "media-playback-start";
pub const ICON_STOP: &str = "media-playback-stop";

/// Label of the row that returns to the top-level menu.
pub const BACK: &str = "Back";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuItem {
    pub text: String,
    pub icon: Option<&'static str>,
    pub payload: Option<Payload>,
}

impl MenuItem {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            icon: None,
            payload: None,
        }
    }

    /// A "!"-prefixed row reporting a failure.
    pub fn error(text: impl fmt::Display) -> Self {
        Self::new(format!("! {}", text))
    }

    pub fn with_icon(mut self, icon: &'static str) -> Self {
        self.icon = Some(icon);
        self
    }

    pub fn with_payload(mut self, payload: Payload) -> Self {
        self.payload = Some(payload);
        self
    }
}

impl fmt::Display for MenuItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&single_line(&self.text))?;
        if self.icon.is_none() && self.payload.is_none() {
            return Ok(());
        }
        write!(f, "{ROW_OPTION}")?;
        let mut first = true;
        if let Some(icon) = self.icon {
            write!(f, "icon{FIELD_SEP}{icon}")?;
            first = false;
        }
        if let Some(payload) = &self.payload {
            if !first {
                write!(f, "{FIELD_SEP}")?;
            }
            write!(f, "info{FIELD_SEP}{}", payload.encode())?;
        }
        Ok(())
    }
}

/// Everything one invocation prints.  Built once, written once, dropped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MenuDocument {
    pub prompt: Option<String>,
    pub message: Option<String>,
    pub items: Vec<MenuItem>,
    /// Emit the empty separator line after the rows.
    pub end_section: bool,
}

impl MenuDocument {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn prompt(mut self, text: impl Into<String>) -> Self {
        self.prompt = Some(text.into());
        self
    }

    pub fn message(mut self, text: impl Into<String>) -> Self {
        self.message = Some(text.into());
        self
    }

    pub fn push(&mut self, item: MenuItem) {
        self.items.push(item);
    }

    pub fn has_payload(&self, payload: &Payload) -> bool {
        self.items
            .iter()
            .any(|item| item.payload.as_ref() == Some(payload))
    }

    /// Row texts in order; handy for assertions.
    pub fn texts(&self) -> Vec<&str> {
        self.items.iter().map(|item| item.text.as_str()).collect()
    }
}

impl fmt::Display for MenuDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(prompt) = &self.prompt {
            writeln!(f, "{ROW_OPTION}prompt{FIELD_SEP}{}", single_line(prompt))?;
        }
        if let Some(message) = &self.message {
            writeln!(f, "{ROW_OPTION}message{FIELD_SEP}{}", single_line(message))?;
        }
        for item in &self.items {
            writeln!(f, "{item}")?;
        }
        if self.end_section {
            writeln!(f)?;
        }
        Ok(())
    }
}

/// rofi splits rows on newlines and options on NUL.
fn single_line(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            '\n' | '\r' | ROW_OPTION | FIELD_SEP => ' ',
            c => c,
        })
        .collect()
}

/// `m:ss` from a duration in whole seconds.
pub fn format_duration(secs: u64) -> String {
    format!("{}:{:02}", secs / 60, secs % 60)
}
