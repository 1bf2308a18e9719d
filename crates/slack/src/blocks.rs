use serde::Serialize;

/// Slack rejects messages carrying more blocks than this.
pub const MAX_BLOCKS_PER_MESSAGE: usize = 50;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TextObject {
    Mrkdwn { text: String },
}

impl TextObject {
    pub fn mrkdwn(text: impl Into<String>) -> Self {
        Self::Mrkdwn { text: text.into() }
    }

    pub fn text(&self) -> &str {
        match self {
            Self::Mrkdwn { text } => text,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename = "image")]
pub struct ImageElement {
    pub image_url: String,
    pub alt_text: String,
}

impl ImageElement {
    pub fn new(image_url: impl Into<String>, alt_text: impl Into<String>) -> Self {
        Self { image_url: image_url.into(), alt_text: alt_text.into() }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Block {
    Section {
        text: TextObject,
        #[serde(skip_serializing_if = "Option::is_none")]
        accessory: Option<ImageElement>,
    },
    Divider,
}

/// One renderable unit produced by the responder, independent of Slack's
/// wire format.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MessageSection {
    Text(String),
    TextWithImage { text: String, image_url: String, alt_text: String },
    Divider,
}

impl MessageSection {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(text.into())
    }

    pub fn text_with_image(
        text: impl Into<String>,
        image_url: impl Into<String>,
        alt_text: impl Into<String>,
    ) -> Self {
        Self::TextWithImage {
            text: text.into(),
            image_url: image_url.into(),
            alt_text: alt_text.into(),
        }
    }

    pub fn body(&self) -> Option<&str> {
        match self {
            Self::Text(text) | Self::TextWithImage { text, .. } => Some(text),
            Self::Divider => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct MessageTemplate {
    pub fallback_text: String,
    pub blocks: Vec<Block>,
}

impl MessageTemplate {
    /// Splits into consecutive messages of at most `max_blocks` blocks each.
    /// Every page keeps the original fallback text.
    pub fn paginate(self, max_blocks: usize) -> Vec<MessageTemplate> {
        let max_blocks = max_blocks.max(1);
        if self.blocks.len() <= max_blocks {
            return vec![self];
        }

        self.blocks
            .chunks(max_blocks)
            .map(|chunk| MessageTemplate {
                fallback_text: self.fallback_text.clone(),
                blocks: chunk.to_vec(),
            })
            .collect()
    }
}

pub struct MessageBuilder {
    fallback_text: String,
    blocks: Vec<Block>,
}

impl MessageBuilder {
    pub fn new(fallback_text: impl Into<String>) -> Self {
        Self { fallback_text: fallback_text.into(), blocks: Vec::new() }
    }

    pub fn section<F>(mut self, build: F) -> Self
    where
        F: FnOnce(&mut SectionBuilder),
    {
        let mut builder = SectionBuilder::default();
        build(&mut builder);
        let (text, accessory) = builder.build();
        self.blocks.push(Block::Section { text, accessory });
        self
    }

    pub fn divider(mut self) -> Self {
        self.blocks.push(Block::Divider);
        self
    }

    pub fn build(self) -> MessageTemplate {
        MessageTemplate { fallback_text: self.fallback_text, blocks: self.blocks }
    }
}

#[derive(Default)]
pub struct SectionBuilder {
    text: Option<TextObject>,
    accessory: Option<ImageElement>,
}

impl SectionBuilder {
    pub fn mrkdwn(&mut self, text: impl Into<String>) -> &mut Self {
        self.text = Some(TextObject::mrkdwn(text));
        self
    }

    pub fn image(&mut self, image_url: impl Into<String>, alt_text: impl Into<String>) -> &mut Self {
        self.accessory = Some(ImageElement::new(image_url, alt_text));
        self
    }

    fn build(self) -> (TextObject, Option<ImageElement>) {
        (self.text.unwrap_or_else(|| TextObject::mrkdwn("")), self.accessory)
    }
}

/// Maps sections onto blocks one to one, in order. The first text section
/// doubles as the notification fallback.
pub fn render(sections: &[MessageSection]) -> MessageTemplate {
    let fallback = sections.iter().find_map(MessageSection::body).unwrap_or_default();

    sections
        .iter()
        .fold(MessageBuilder::new(fallback), |builder, section| match section {
            MessageSection::Text(text) => builder.section(|block| {
                block.mrkdwn(text.clone());
            }),
            MessageSection::TextWithImage { text, image_url, alt_text } => {
                builder.section(|block| {
                    block.mrkdwn(text.clone()).image(image_url.clone(), alt_text.clone());
                })
            }
            MessageSection::Divider => builder.divider(),
        })
        .build()
}
