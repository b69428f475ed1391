use serde::Serialize;
use std::fmt;

/// Tone of a suggested reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OptionLabel {
    Detailed,
    Concise,
    Friendly,
    /// Unlabelled text (plain reply, `content` envelope, or degraded output)
    Single,
}

impl OptionLabel {
    /// Label for an `options[i].type` value, falling back to the position.
    pub fn from_type(kind: Option<&str>, position: usize) -> Self {
        match kind {
            Some("thoughtful") | Some("detailed") => OptionLabel::Detailed,
            Some("concise") => OptionLabel::Concise,
            Some("friendly") => OptionLabel::Friendly,
            _ => Self::positional(position),
        }
    }

    fn positional(position: usize) -> Self {
        match position {
            0 => OptionLabel::Detailed,
            1 => OptionLabel::Concise,
            _ => OptionLabel::Friendly,
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            OptionLabel::Detailed => "Detailed reply",
            OptionLabel::Concise => "Concise reply",
            OptionLabel::Friendly => "Friendly reply",
            OptionLabel::Single => "Reply suggestion",
        }
    }
}

impl fmt::Display for OptionLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReplyOption {
    pub label: OptionLabel,
    pub text: String,
}

impl ReplyOption {
    pub fn new(label: OptionLabel, text: impl Into<String>) -> Self {
        Self {
            label,
            text: text.into(),
        }
    }

    pub fn single(text: impl Into<String>) -> Self {
        Self::new(OptionLabel::Single, text)
    }
}

/// The decoder's current best projection of the reply: one to three options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReplyResult {
    pub options: Vec<ReplyOption>,
    pub finalized: bool,
}

impl ReplyResult {
    /// Whether the options came from a parsed `options` array.
    pub fn is_structured(&self) -> bool {
        self.options
            .first()
            .map(|o| o.label != OptionLabel::Single)
            .unwrap_or(false)
    }

    pub fn labels(&self) -> Vec<OptionLabel> {
        self.options.iter().map(|o| o.label).collect()
    }

    pub fn texts(&self) -> Vec<&str> {
        self.options.iter().map(|o| o.text.as_str()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_from_type() {
        assert_eq!(OptionLabel::from_type(Some("thoughtful"), 2), OptionLabel::Detailed);
        assert_eq!(OptionLabel::from_type(Some("detailed"), 1), OptionLabel::Detailed);
        assert_eq!(OptionLabel::from_type(Some("friendly"), 0), OptionLabel::Friendly);
        assert_eq!(OptionLabel::from_type(Some("sarcastic"), 1), OptionLabel::Concise);
        assert_eq!(OptionLabel::from_type(None, 2), OptionLabel::Friendly);
    }

    #[test]
    fn test_is_structured() {
        let single = ReplyResult {
            options: vec![ReplyOption::single("hi")],
            finalized: false,
        };
        let structured = ReplyResult {
            options: vec![ReplyOption::new(OptionLabel::Concise, "hi")],
            finalized: false,
        };

        assert!(!single.is_structured());
        assert!(structured.is_structured());
    }
}
