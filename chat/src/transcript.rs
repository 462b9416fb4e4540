//! Display projection of a transcript snapshot.
//!
//! Renderers turn a [`crate::TranscriptSnapshot`] into cells with [`project`] and draw those. The
//! projection is pure: it never reaches back into the store.

use interio_protocol::Product;
use interio_protocol::Role;

use crate::message::Message;
use crate::message::MessageId;

/// Title shown for a product that arrived without one.
pub const PRODUCT_TITLE_FALLBACK: &str = "Recommended product";

const ASSISTANT_IMAGE_CAPTION: &str = "AI-generated interior image";
const USER_IMAGE_CAPTION: &str = "Reference image attached by user";
const MISSING_THUMBNAIL: &str = "Image unavailable";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CellBody {
    /// Placeholder for an in-flight request.
    Thinking,
    /// Message text split on newlines, blank lines dropped.
    Paragraphs(Vec<String>),
    Empty,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageFigure {
    pub src: String,
    pub caption: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductCard {
    pub title: String,
    pub thumbnail: Option<String>,
    pub price: Option<String>,
    pub link: Option<String>,
}

impl ProductCard {
    fn from_product(product: &Product) -> Self {
        Self {
            title: product
                .title
                .clone()
                .unwrap_or_else(|| PRODUCT_TITLE_FALLBACK.to_string()),
            thumbnail: product.image.clone(),
            price: product.price.clone(),
            link: product.link.clone(),
        }
    }
}

/// One message, ready to draw.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageCell {
    pub id: MessageId,
    pub role: Role,
    pub body: CellBody,
    pub figure: Option<ImageFigure>,
    pub products: Vec<ProductCard>,
}

impl MessageCell {
    pub fn from_message(message: &Message) -> Self {
        let body = if message.loading {
            CellBody::Thinking
        } else {
            let paragraphs: Vec<String> = message
                .text
                .as_deref()
                .unwrap_or_default()
                .lines()
                .map(str::trim_end)
                .filter(|line| !line.trim().is_empty())
                .map(str::to_string)
                .collect();
            if paragraphs.is_empty() {
                CellBody::Empty
            } else {
                CellBody::Paragraphs(paragraphs)
            }
        };

        let figure = message.image_url.as_ref().map(|src| ImageFigure {
            src: src.clone(),
            caption: match message.role {
                Role::Assistant => ASSISTANT_IMAGE_CAPTION,
                Role::User => USER_IMAGE_CAPTION,
            },
        });

        let products = message
            .products
            .iter()
            .flatten()
            .map(ProductCard::from_product)
            .collect();

        Self {
            id: message.id.clone(),
            role: message.role,
            body,
            figure,
            products,
        }
    }

    pub fn avatar(&self) -> &'static str {
        match self.role {
            Role::Assistant => "AI",
            Role::User => "Me",
        }
    }

    pub fn is_thinking(&self) -> bool {
        self.body == CellBody::Thinking
    }

    /// Plain-text rendering used by line-oriented frontends.
    pub fn display_lines(&self) -> Vec<String> {
        let avatar = self.avatar();
        let indent = " ".repeat(avatar.len() + 3);
        let mut lines = Vec::new();
        let prefix = |lines: &mut Vec<String>, text: String| {
            let lead = if lines.is_empty() {
                format!("{avatar} › ")
            } else {
                indent.clone()
            };
            lines.push(format!("{lead}{text}"));
        };

        match &self.body {
            CellBody::Thinking => prefix(&mut lines, crate::THINKING_TEXT.to_string()),
            CellBody::Paragraphs(paragraphs) => {
                for paragraph in paragraphs {
                    prefix(&mut lines, paragraph.clone());
                }
            }
            CellBody::Empty => {}
        }

        if let Some(figure) = &self.figure {
            prefix(&mut lines, format!("[image] {}", figure.caption));
        }

        for card in &self.products {
            let headline = match &card.price {
                Some(price) => format!("- {} ({price})", card.title),
                None => format!("- {}", card.title),
            };
            prefix(&mut lines, headline);
            if card.thumbnail.is_none() {
                prefix(&mut lines, format!("  {MISSING_THUMBNAIL}"));
            }
            if let Some(link) = &card.link {
                prefix(&mut lines, format!("  {link}"));
            }
        }

        if lines.is_empty() {
            lines.push(format!("{avatar} ›"));
        }
        lines
    }
}

/// Project a snapshot into display cells, preserving order.
pub fn project(messages: &[Message]) -> Vec<MessageCell> {
    messages.iter().map(MessageCell::from_message).collect()
}
