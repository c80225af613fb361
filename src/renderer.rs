//! Chapter content rendering.
//!
//! Chapter text arrives without format metadata. The renderer guesses the dialect from the
//! text itself (HTML, then Markdown, then plain) and produces sanitized HTML for the page.

use pulldown_cmark::{Options, Parser, html};
use regex::Regex;
use std::sync::LazyLock;

use crate::models::{ContentFormat, RenderedContent};

/// Markdown tokens: heading, bold, italic, strikethrough, blockquote, list items, links.
static MARKDOWN_TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?m)^#{1,6}\s|\*\*.+?\*\*|\*.+?\*|~~.+?~~|^>\s|^-\s|^\d+\.\s|\[[^\]\n]*\]\([^)\n]*\)",
    )
    .expect("markdown pattern is valid")
});

/// Classifies a blob. HTML wins over Markdown, Markdown over plain text.
pub fn classify(text: &str) -> ContentFormat {
    if looks_like_html(text) {
        ContentFormat::Html
    } else if MARKDOWN_TOKEN.is_match(text) {
        ContentFormat::Markdown
    } else {
        ContentFormat::Plain
    }
}

/// True when some `<` that does not open a comment starts a tag-like `<[^>]+>` run.
/// Every `<` is tried as a start, so a comment never hides a tag nested in it or
/// following it.
fn looks_like_html(text: &str) -> bool {
    let Some(last_close) = text.rfind('>') else {
        return false;
    };
    text.match_indices('<').any(|(start, _)| {
        let rest = &text[start..];
        // `<[^>]+>` from here needs one non-`>` byte and a `>` somewhere after it.
        !rest.starts_with("<!--")
            && rest.as_bytes().get(1).is_some_and(|b| *b != b'>')
            && last_close > start + 1
    })
}

/// Allowlist sanitization: `<script>` blocks go with their content, event-handler
/// attributes and unknown tags are dropped, text is kept.
pub fn sanitize_html(input: &str) -> String {
    ammonia::clean(input)
}

/// Renders Markdown with raw HTML passed through, then sanitizes the result so embedded
/// markup still renders but cannot carry scripts.
pub fn render_markdown(markdown: &str) -> String {
    let options = Options::ENABLE_STRIKETHROUGH | Options::ENABLE_TABLES;
    let parser = Parser::new_ext(markdown, options);
    let mut html_output = String::with_capacity(markdown.len() * 3 / 2);
    html::push_html(&mut html_output, parser);
    sanitize_html(&html_output)
}

/// Splits plain text on blank-line boundaries. Single newlines stay inside their paragraph;
/// blank segments are skipped, so the empty string yields nothing.
pub fn split_paragraphs(text: &str) -> Vec<&str> {
    text.split("\n\n")
        .filter(|segment| !segment.trim().is_empty())
        .collect()
}

/// render
///
/// Classifies `text` and renders it. Never fails: unrecognised input is plain text.
pub fn render(text: &str) -> RenderedContent {
    let format = classify(text);
    match format {
        ContentFormat::Html => RenderedContent {
            format,
            html: sanitize_html(text),
            paragraphs: Vec::new(),
        },
        ContentFormat::Markdown => RenderedContent {
            format,
            html: render_markdown(text),
            paragraphs: Vec::new(),
        },
        ContentFormat::Plain => {
            let paragraphs: Vec<String> = split_paragraphs(text)
                .into_iter()
                .map(str::to_owned)
                .collect();
            let html = paragraphs
                .iter()
                .map(|p| format!("<p>{}</p>", escape_text(p)))
                .collect::<String>();
            RenderedContent {
                format,
                html,
                paragraphs,
            }
        }
    }
}

fn escape_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}
