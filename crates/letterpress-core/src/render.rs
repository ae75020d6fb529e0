/// HTML email rendering for newsletters and confirmation messages.
use std::sync::LazyLock;

use regex::Regex;

use crate::block::{Block, BlockContent};
use crate::newsletter::Newsletter;

static HEADING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^#\s+(.+)$").expect("heading pattern is valid"));
static BOLD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*\*(.*?)\*\*").expect("bold pattern is valid"));
static ITALIC: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*(.*?)\*").expect("italic pattern is valid"));

const DOCUMENT_STYLE: &str = "body { font-family: Arial, sans-serif; line-height: 1.6; color: #333; max-width: 600px; margin: 0 auto; padding: 20px; }
      img { max-width: 100%; height: auto; }
      h1 { font-size: 24px; margin-bottom: 20px; }
      p { margin-bottom: 16px; }
      .audio-player { margin: 20px 0; padding: 15px; background-color: #f5f5f5; border-radius: 8px; }
      .audio-title { font-weight: bold; margin-bottom: 10px; }";

const BUTTON_STYLE: &str = "display: inline-block; padding: 12px 24px; background-color: #3b82f6; color: #ffffff; text-decoration: none; border-radius: 6px;";

/// Per-send rendering options.
#[derive(Debug, Clone, Default)]
pub struct RenderOptions {
    /// Link placed in the footer. The footer is omitted when `None`.
    ///
    /// This is the site's unsubscribe landing page, not a per-recipient link.
    pub unsubscribe_url: Option<String>,
}

/// Escapes text for use in HTML content and double-quoted attributes.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Converts the lightweight markup of a text block into paragraph HTML.
///
/// The first `# heading` line is dropped since the title is rendered above
/// the body. Supports `**bold**`, `*italic*`, blank-line paragraphs and line
/// breaks.
pub fn text_to_html(text: &str) -> String {
    let without_heading = HEADING.replace(text, "");
    let escaped = escape_html(without_heading.trim());
    let bolded = BOLD.replace_all(&escaped, "<strong>${1}</strong>");
    let emphasized = ITALIC.replace_all(&bolded, "<em>${1}</em>");
    emphasized.replace("\n\n", "</p><p>").replace('\n', "<br>")
}

fn render_block(block: &Block) -> Option<String> {
    match &block.content {
        BlockContent::Text(c) => {
            if c.text.trim().is_empty() {
                return None;
            }
            let css = block.settings.inline_css();
            let style = if css.is_empty() {
                String::new()
            } else {
                format!(" style=\"{}\"", escape_html(&css))
            };
            Some(format!("<p{style}>{}</p>", text_to_html(&c.text)))
        }
        BlockContent::Image(c) => {
            if c.image_url.is_empty() {
                return None;
            }
            let caption = c.caption.as_deref().unwrap_or_default();
            let caption_html = if caption.is_empty() {
                String::new()
            } else {
                format!(
                    "<div style=\"text-align: center; font-style: italic; margin-top: 8px;\">{}</div>",
                    escape_html(caption)
                )
            };
            Some(format!(
                "<div style=\"margin: 20px 0;\"><img src=\"{}\" alt=\"{}\" style=\"display: block; max-width: 100%;\">{caption_html}</div>",
                escape_html(&c.image_url),
                escape_html(caption),
            ))
        }
        BlockContent::Button(c) => {
            if c.button_text.is_empty() || c.button_url.is_empty() {
                return None;
            }
            Some(format!(
                "<p style=\"text-align: center; margin: 24px 0;\"><a href=\"{}\" style=\"{BUTTON_STYLE}\">{}</a></p>",
                escape_html(&c.button_url),
                escape_html(&c.button_text),
            ))
        }
        BlockContent::Audio(c) => {
            if c.audio_url.is_empty() {
                return None;
            }
            let title = c.title.as_deref().filter(|t| !t.is_empty()).unwrap_or("Audio");
            let url = escape_html(&c.audio_url);
            Some(format!(
                "<div class=\"audio-player\"><div class=\"audio-title\">{}</div>\
                 <audio controls><source src=\"{url}\" type=\"audio/mpeg\">Your email client does not support audio playback.</audio>\
                 <p>To listen, <a href=\"{url}\" target=\"_blank\">click here</a>.</p></div>",
                escape_html(title),
            ))
        }
    }
}

/// Renders a newsletter as a standalone HTML email.
pub fn render_newsletter_html(newsletter: &Newsletter, options: &RenderOptions) -> String {
    let title = escape_html(&newsletter.title);
    let mut html = format!(
        "<!DOCTYPE html>\n<html>\n<head>\n  <meta charset=\"utf-8\">\n  \
         <meta name=\"viewport\" content=\"width=device-width, initial-scale=1.0\">\n  \
         <title>{title}</title>\n  <style>\n      {DOCUMENT_STYLE}\n  </style>\n</head>\n<body>\n  <h1>{title}</h1>\n"
    );

    for block in &newsletter.content.blocks {
        if let Some(fragment) = render_block(block) {
            html.push_str("  ");
            html.push_str(&fragment);
            html.push('\n');
        }
    }

    if let Some(url) = &options.unsubscribe_url {
        html.push_str(&format!(
            "  <hr style=\"margin: 30px 0;\">\n  <p style=\"font-size: 12px; color: #666;\">\
             If you no longer wish to receive this newsletter, <a href=\"{}\">unsubscribe</a>.</p>\n",
            escape_html(url)
        ));
    }
    html.push_str("</body>\n</html>\n");
    html
}

/// Renders the double opt-in confirmation email.
pub fn render_confirmation_html(confirm_url: &str) -> String {
    let url = escape_html(confirm_url);
    format!(
        "<!DOCTYPE html>\n<html>\n<head><meta charset=\"utf-8\"><title>Confirm your subscription</title></head>\n\
         <body style=\"font-family: Arial, sans-serif; max-width: 600px; margin: 0 auto; padding: 20px;\">\n  \
         <h1>Confirm your subscription</h1>\n  \
         <p>Thanks for subscribing. Please confirm your email address to start receiving the newsletter.</p>\n  \
         <p style=\"text-align: center; margin: 24px 0;\"><a href=\"{url}\" style=\"{BUTTON_STYLE}\">Confirm subscription</a></p>\n  \
         <p style=\"font-size: 12px; color: #666;\">If you did not subscribe, you can ignore this email.</p>\n\
         </body>\n</html>\n"
    )
}
