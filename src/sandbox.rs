//! Isolated preview frame for the edited document.
//!
//! Every render throws the previous frame away and loads the new document
//! from scratch. The frame owns its own snapshot of the source and never
//! sees the host's state; what the embedded document may do when a browser
//! hosts it is bounded by [`Capabilities`].

use bitflags::bitflags;
use std::sync::Arc;

bitflags! {
    /// Sandbox permissions granted to the embedded document.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Capabilities: u8 {
        const SCRIPTS = 0b0000_0001;
        const FORMS = 0b0000_0010;
        /// Embedded resources resolve against the frame's own origin.
        const SAME_ORIGIN = 0b0000_0100;
        const TOP_NAVIGATION = 0b0000_1000;
        const POPUPS = 0b0001_0000;
        const MODALS = 0b0010_0000;
    }
}

const SANDBOX_TOKENS: [(Capabilities, &str); 6] = [
    (Capabilities::SCRIPTS, "allow-scripts"),
    (Capabilities::FORMS, "allow-forms"),
    (Capabilities::SAME_ORIGIN, "allow-same-origin"),
    (Capabilities::TOP_NAVIGATION, "allow-top-navigation"),
    (Capabilities::POPUPS, "allow-popups"),
    (Capabilities::MODALS, "allow-modals"),
];

impl Capabilities {
    /// The only set the live preview runs with.
    pub const PREVIEW: Self = Self::SCRIPTS.union(Self::FORMS).union(Self::SAME_ORIGIN);

    /// Value for an iframe `sandbox` attribute granting exactly this set.
    pub fn sandbox_attribute(self) -> String {
        SANDBOX_TOKENS
            .iter()
            .filter(|(flag, _)| self.contains(*flag))
            .map(|(_, token)| *token)
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Anything that can display the current document.
pub trait Renderer {
    /// Replaces whatever is displayed with `content`. Never fails: malformed
    /// markup is the frame's problem, not the caller's.
    fn render(&mut self, content: &str);
}

/// A fully materialized preview of one document snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderFrame {
    source: Arc<str>,
    capabilities: Capabilities,
    title: Option<String>,
    lines: Vec<String>,
}

impl RenderFrame {
    pub fn load(content: &str, capabilities: Capabilities) -> Self {
        let outline = Outline::scan(content);
        Self {
            source: Arc::from(content),
            capabilities,
            title: outline.title,
            lines: outline.lines,
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn capabilities(&self) -> Capabilities {
        self.capabilities
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    /// Visible text of the document body, one entry per block.
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Standalone page that embeds this frame in a browser sandbox.
    pub fn host_page(&self) -> String {
        format!(
            "<!DOCTYPE html>\n<html>\n<head><meta charset=\"utf-8\"><title>Live Preview</title></head>\n\
             <body style=\"margin:0\">\n<iframe title=\"Live Preview\" style=\"border:none;width:100vw;height:100vh\" \
             sandbox=\"{}\" srcdoc=\"{}\"></iframe>\n</body>\n</html>\n",
            self.capabilities.sandbox_attribute(),
            escape_attribute(&self.source)
        )
    }
}

/// Renderer backing the live preview pane.
#[derive(Debug)]
pub struct SandboxRenderer {
    capabilities: Capabilities,
    frame: Option<RenderFrame>,
    loads: u64,
}

impl Default for SandboxRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl SandboxRenderer {
    pub fn new() -> Self {
        Self::with_capabilities(Capabilities::PREVIEW)
    }

    pub fn with_capabilities(capabilities: Capabilities) -> Self {
        Self {
            capabilities,
            frame: None,
            loads: 0,
        }
    }

    pub fn frame(&self) -> Option<&RenderFrame> {
        self.frame.as_ref()
    }

    pub fn loads(&self) -> u64 {
        self.loads
    }
}

impl Renderer for SandboxRenderer {
    fn render(&mut self, content: &str) {
        self.frame = Some(RenderFrame::load(content, self.capabilities));
        self.loads += 1;
    }
}

const BLOCK_TAGS: [&str; 16] = [
    "br", "p", "div", "section", "article", "header", "footer", "main", "li", "tr", "h1", "h2",
    "h3", "h4", "h5", "h6",
];

const RAW_TEXT_TAGS: [&str; 2] = ["script", "style"];

#[derive(Default)]
struct Outline {
    title: Option<String>,
    lines: Vec<String>,
}

impl Outline {
    fn scan(source: &str) -> Self {
        let mut outline = Outline::default();
        let mut current = String::new();
        let mut title: Option<String> = None;
        let mut raw_text_until: Option<String> = None;
        let mut rest = source;

        loop {
            let Some(open) = rest.find('<') else {
                if raw_text_until.is_none() {
                    push_text(&mut current, &mut title, rest);
                }
                break;
            };

            if raw_text_until.is_none() {
                push_text(&mut current, &mut title, &rest[..open]);
            }
            let after = &rest[open + 1..];

            if let Some(comment) = after.strip_prefix("!--") {
                rest = comment.find("-->").map_or("", |end| &comment[end + 3..]);
                continue;
            }

            // An unterminated tag swallows the remainder, as a browser would.
            let Some(close) = after.find('>') else {
                break;
            };
            let (closing, name) = tag_name(&after[..close]);
            rest = &after[close + 1..];

            if let Some(raw) = &raw_text_until {
                if closing && name.eq_ignore_ascii_case(raw) {
                    raw_text_until = None;
                }
                continue;
            }

            if !closing && RAW_TEXT_TAGS.iter().any(|tag| name.eq_ignore_ascii_case(tag)) {
                raw_text_until = Some(name.to_ascii_lowercase());
            } else if name.eq_ignore_ascii_case("title") {
                if closing {
                    if let Some(text) = title.take() {
                        let text = collapse(&text);
                        if outline.title.is_none() && !text.is_empty() {
                            outline.title = Some(text);
                        }
                    }
                } else {
                    title = Some(String::new());
                }
            } else if BLOCK_TAGS.iter().any(|tag| name.eq_ignore_ascii_case(tag)) {
                outline.flush(&mut current);
            }
        }

        outline.flush(&mut current);
        outline
    }

    fn flush(&mut self, current: &mut String) {
        let line = collapse(current);
        if !line.is_empty() {
            self.lines.push(line);
        }
        current.clear();
    }
}

fn push_text(current: &mut String, title: &mut Option<String>, text: &str) {
    match title {
        Some(title) => title.push_str(text),
        None => current.push_str(text),
    }
}

fn tag_name(tag: &str) -> (bool, &str) {
    let tag = tag.trim_start();
    let (closing, tag) = match tag.strip_prefix('/') {
        Some(rest) => (true, rest.trim_start()),
        None => (false, tag),
    };
    let end = tag
        .find(|ch: char| ch.is_whitespace() || ch == '/')
        .unwrap_or(tag.len());
    (closing, &tag[..end])
}

fn collapse(text: &str) -> String {
    decode_entities(&text.split_whitespace().collect::<Vec<_>>().join(" "))
}

fn decode_entities(text: &str) -> String {
    text.replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}

fn escape_attribute(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('"', "&quot;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}
