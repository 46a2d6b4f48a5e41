use serde::{Deserialize, Serialize};

/// Most options a choice prompt can show as inline buttons.
pub const MAX_BUTTONS: usize = 3;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutboundMessage {
    Text {
        body: String,
    },
    Choice {
        title: String,
        body: String,
        options: Vec<ChoiceOption>,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChoiceOption {
    pub id: String,
    pub title: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChoiceRendering {
    Buttons,
    List,
}

impl OutboundMessage {
    pub fn text(body: impl Into<String>) -> Self {
        OutboundMessage::Text { body: body.into() }
    }

    pub fn choice(title: &str, body: &str, options: &[(&str, &str)]) -> Self {
        OutboundMessage::Choice {
            title: title.to_string(),
            body: body.to_string(),
            options: options
                .iter()
                .map(|(id, title)| ChoiceOption {
                    id: id.to_string(),
                    title: title.to_string(),
                })
                .collect(),
        }
    }

    /// Rendering is picked from the option count alone.
    pub fn rendering(&self) -> Option<ChoiceRendering> {
        match self {
            OutboundMessage::Text { .. } => None,
            OutboundMessage::Choice { options, .. } if options.len() <= MAX_BUTTONS => {
                Some(ChoiceRendering::Buttons)
            }
            OutboundMessage::Choice { .. } => Some(ChoiceRendering::List),
        }
    }

    pub fn body(&self) -> &str {
        match self {
            OutboundMessage::Text { body } | OutboundMessage::Choice { body, .. } => body,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rendering_by_option_count() {
        let three = OutboundMessage::choice("t", "b", &[("a", "A"), ("b", "B"), ("c", "C")]);
        assert_eq!(three.rendering(), Some(ChoiceRendering::Buttons));

        let four = OutboundMessage::choice(
            "t",
            "b",
            &[("a", "A"), ("b", "B"), ("c", "C"), ("d", "D")],
        );
        assert_eq!(four.rendering(), Some(ChoiceRendering::List));

        assert_eq!(OutboundMessage::text("hi").rendering(), None);
    }
}
