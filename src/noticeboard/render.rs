//! # Presentation
//!
//! The manager decides *whether* a notice shows; a [`Renderer`] decides how.
//! Each eligible notice is handed over as a [`RenderContext`] carrying the
//! resolved message text.
//!
//! [`HtmlRenderer`] produces the classic admin markup:
//!
//! ```text
//! <div class="notice {custom classes} notice-{type} [is-dismissible]" id="notice-{hash}">
//!   <p>{message}</p>
//! </div>
//! ```
//!
//! Literal text is HTML-escaped. Renderable and deferred messages are
//! trusted: they produce markup on purpose.

use crate::error::Result;
use crate::model::Notice;

/// Everything a renderer needs for one notice.
#[derive(Debug, Clone, Copy)]
pub struct RenderContext<'a> {
    pub hash: &'a str,
    pub notice: &'a Notice,
    /// The resolved message text.
    pub message: &'a str,
}

pub trait Renderer {
    fn render(&mut self, ctx: &RenderContext<'_>) -> Result<()>;
}

impl<F> Renderer for F
where
    F: FnMut(&RenderContext<'_>) -> Result<()>,
{
    fn render(&mut self, ctx: &RenderContext<'_>) -> Result<()> {
        self(ctx)
    }
}

/// Collects admin notice markup into a string buffer.
#[derive(Debug, Clone, Default)]
pub struct HtmlRenderer {
    output: String,
}

impl HtmlRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn output(&self) -> &str {
        &self.output
    }

    /// Returns the markup so far and clears the buffer.
    pub fn take(&mut self) -> String {
        std::mem::take(&mut self.output)
    }

    pub fn markup(ctx: &RenderContext<'_>) -> String {
        let notice = ctx.notice;

        let type_class = format!("notice-{}", notice.notice_type());
        let mut classes: Vec<String> = notice
            .classes()
            .into_iter()
            .chain(std::iter::once(type_class.as_str()))
            .chain(notice.is_dismissible().then_some("is-dismissible"))
            .map(sanitize_class)
            .filter(|class| !class.is_empty())
            .collect();
        classes.dedup();

        let body = if notice.message().is_text() {
            escape_html(ctx.message)
        } else {
            ctx.message.to_string()
        };
        let body = if notice.is_wrapped() {
            autop(&body)
        } else {
            body
        };

        format!(
            "<div class=\"notice {}\" id=\"notice-{}\">{}</div>",
            classes.join(" "),
            sanitize_class(ctx.hash),
            body
        )
    }
}

impl Renderer for HtmlRenderer {
    fn render(&mut self, ctx: &RenderContext<'_>) -> Result<()> {
        self.output.push_str(&Self::markup(ctx));
        self.output.push('\n');
        Ok(())
    }
}

/// Keeps `A-Z a-z 0-9 _ -` and drops everything else.
pub fn sanitize_class(class: &str) -> String {
    class
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_' || *c == '-')
        .collect()
}

pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#039;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Blank lines separate paragraphs; single newlines become `<br />`.
fn autop(text: &str) -> String {
    let normalized = text.replace("\r\n", "\n");
    normalized
        .split("\n\n")
        .map(str::trim)
        .filter(|block| !block.is_empty())
        .map(|block| format!("<p>{}</p>", block.replace('\n', "<br />\n")))
        .collect::<Vec<_>>()
        .join("\n")
}
