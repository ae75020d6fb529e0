/// Built-in starting points for new newsletters.
use crate::block::{Block, BlockContent, BlockSettings, ImageContent, TextContent};

#[derive(Debug, Clone)]
pub struct Template {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub blocks: Vec<Block>,
}

fn text_block(id: &str, text: &str, style: &[(&str, &str)]) -> Block {
    Block {
        id: id.to_string(),
        content: BlockContent::Text(TextContent::from(text)),
        settings: BlockSettings::with_style(style),
    }
}

fn image_block(id: &str, style: &[(&str, &str)]) -> Block {
    Block {
        id: id.to_string(),
        content: BlockContent::Image(ImageContent::default()),
        settings: BlockSettings::with_style(style),
    }
}

const HEADER_STYLE: &[(&str, &str)] = &[
    ("fontSize", "24px"),
    ("fontWeight", "bold"),
    ("marginBottom", "20px"),
];
const WIDE_IMAGE_STYLE: &[(&str, &str)] = &[("width", "100%"), ("marginBottom", "20px")];
const BODY_STYLE: &[(&str, &str)] = &[("lineHeight", "1.6")];

/// All built-in templates, in menu order.
pub fn builtin_templates() -> Vec<Template> {
    vec![
        Template {
            id: "game-review",
            name: "Game review",
            description: "Basic layout for reviewing a game",
            blocks: vec![
                text_block("header", "# Game review: [title]", HEADER_STYLE),
                image_block("main-image", WIDE_IMAGE_STYLE),
                text_block("review-text", "Write your review here.", BODY_STYLE),
            ],
        },
        Template {
            id: "esports-news",
            name: "Esports news",
            description: "Match results and tournament news",
            blocks: vec![
                text_block("header", "# Esports news: [event]", HEADER_STYLE),
                text_block("results", "**Results**\n\n[match results]", BODY_STYLE),
                image_block("highlight-image", WIDE_IMAGE_STYLE),
                text_block("upcoming", "**Coming up**\n\n[schedule]", BODY_STYLE),
            ],
        },
        Template {
            id: "game-update",
            name: "Update news",
            description: "Patch notes and game update announcements",
            blocks: vec![
                text_block("header", "# Update: [version]", HEADER_STYLE),
                image_block("banner", WIDE_IMAGE_STYLE),
                text_block("changes", "*What changed*\n\n[patch notes]", BODY_STYLE),
            ],
        },
    ]
}

pub fn find_template(id: &str) -> Option<Template> {
    builtin_templates().into_iter().find(|t| t.id == id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_template_ids_are_unique() {
        let templates = builtin_templates();
        let ids: HashSet<&str> = templates.iter().map(|t| t.id).collect();
        assert_eq!(ids.len(), templates.len());
    }

    #[test]
    fn test_block_ids_unique_within_template() {
        for template in builtin_templates() {
            let ids: HashSet<&str> = template.blocks.iter().map(|b| b.id.as_str()).collect();
            assert_eq!(ids.len(), template.blocks.len(), "{}", template.id);
            assert!(!template.blocks.is_empty());
        }
    }

    #[test]
    fn test_find_template() {
        let review = find_template("game-review").expect("template");
        assert_eq!(review.blocks.len(), 3);
        assert_eq!(
            review.blocks[0].settings.style.get("fontSize").map(String::as_str),
            Some("24px")
        );
        assert!(find_template("missing").is_none());
    }
}
