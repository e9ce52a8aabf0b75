// src/formatting/html.rs
//! HTML emitter for normalized render trees.
//!
//! Produces a self-contained `<article>` fragment. Styling is left to the
//! site; elements only carry class names.

use super::block_renderer::{BlockShape, MediaKind};
use super::normalize::{ListGroup, RenderNode, RenderedBlock, ToggleNode};
use super::rich_text::{html_escape, render_html, StyledText};
use super::toc::TocEntry;
use crate::assets::{AssetReference, AssetState, ResolvedAsset};
use crate::constants::{CHARS_PER_BLOCK_ESTIMATE, PLACEHOLDER_URL};
use crate::error::AppError;
use crate::model::{Icon, LinkTarget, Page, TableLayout};
use crate::types::{Color, RenderedPage};
use indexmap::IndexMap;
use std::collections::HashMap;
use std::fmt::Write;

// --- Core Types ---

/// Something that knows how an asset should be displayed.
pub trait AssetLookup {
    fn resolved(&self, reference: &AssetReference) -> Option<&ResolvedAsset>;
}

impl AssetLookup for HashMap<String, ResolvedAsset> {
    fn resolved(&self, reference: &AssetReference) -> Option<&ResolvedAsset> {
        self.get(&reference.url)
    }
}

impl AssetLookup for IndexMap<String, ResolvedAsset> {
    fn resolved(&self, reference: &AssetReference) -> Option<&ResolvedAsset> {
        self.get(&reference.url)
    }
}

/// Context passed through HTML rendering.
#[derive(Clone)]
pub struct HtmlContext<'a> {
    /// Resolved display URLs, keyed by original asset URL.
    pub assets: Option<&'a dyn AssetLookup>,
    pub placeholder_url: &'a str,
    pub toc: Option<&'a [TocEntry]>,
}

impl Default for HtmlContext<'_> {
    fn default() -> Self {
        Self {
            assets: None,
            placeholder_url: PLACEHOLDER_URL,
            toc: None,
        }
    }
}

impl std::fmt::Debug for HtmlContext<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HtmlContext")
            .field("assets", &self.assets.is_some())
            .field("placeholder_url", &self.placeholder_url)
            .field("toc", &self.toc.map(|t| t.len()))
            .finish()
    }
}

impl HtmlContext<'_> {
    /// URL and state to show for `asset`. Unresolved assets are shown as-is,
    /// empty ones as the placeholder.
    fn display(&self, asset: &AssetReference) -> (String, AssetState) {
        if let Some(resolved) = self.assets.and_then(|lookup| lookup.resolved(asset)) {
            return (resolved.display_url.clone(), resolved.state);
        }
        if asset.url.trim().is_empty() {
            (self.placeholder_url.to_string(), AssetState::RefreshFailed)
        } else {
            (asset.url.clone(), AssetState::Fresh)
        }
    }
}

// --- Public API ---

/// Renders a page as an `<article>`: title, cover, optional table of
/// contents, then the body.
pub fn render_article(
    page: &Page,
    nodes: &[RenderNode],
    ctx: &HtmlContext,
) -> Result<RenderedPage, AppError> {
    let mut out = String::with_capacity(page.blocks.len() * CHARS_PER_BLOCK_ESTIMATE);

    writeln!(out, "<article>")?;
    writeln!(out, "<header>")?;
    writeln!(out, "<h1>{}</h1>", html_escape(page.title().as_str()))?;
    if let Some(cover) = &page.cover {
        let (url, state) = ctx.display(cover);
        writeln!(
            out,
            "<img class=\"cover\" src=\"{}\" alt=\"\" data-asset-state=\"{}\">",
            html_escape(&url),
            state
        )?;
    }
    writeln!(out, "</header>")?;

    if let Some(entries) = ctx.toc.filter(|entries| !entries.is_empty()) {
        write_toc(&mut out, entries)?;
    }

    write_nodes(&mut out, nodes, ctx)?;
    writeln!(out, "</article>")?;

    log::debug!(
        "Rendered article '{}' ({} nodes, {} bytes)",
        page.title(),
        nodes.len(),
        out.len()
    );
    Ok(RenderedPage::new(out))
}

/// Renders a sequence of nodes without any page chrome.
pub fn render_nodes(nodes: &[RenderNode], ctx: &HtmlContext) -> Result<String, AppError> {
    let mut out = String::with_capacity(nodes.len() * CHARS_PER_BLOCK_ESTIMATE);
    write_nodes(&mut out, nodes, ctx)?;
    Ok(out)
}

// --- Node Rendering ---

fn write_nodes(out: &mut String, nodes: &[RenderNode], ctx: &HtmlContext) -> std::fmt::Result {
    for node in nodes {
        match node {
            RenderNode::Block(block) => write_block(out, block, ctx)?,
            RenderNode::List(group) => write_list(out, group, ctx)?,
            RenderNode::Toggle(toggle) => write_toggle(out, toggle, ctx)?,
        }
    }
    Ok(())
}

fn write_list(out: &mut String, group: &ListGroup, ctx: &HtmlContext) -> std::fmt::Result {
    let tag = if group.ordered { "ol" } else { "ul" };
    writeln!(out, "<{} data-level=\"{}\">", tag, group.nesting_level)?;
    for item in &group.items {
        write!(out, "<li>{}", render_html(&item.text))?;
        if !item.children.is_empty() {
            out.push('\n');
            write_nodes(out, &item.children, ctx)?;
        }
        writeln!(out, "</li>")?;
    }
    writeln!(out, "</{}>", tag)
}

fn write_toggle(out: &mut String, toggle: &ToggleNode, ctx: &HtmlContext) -> std::fmt::Result {
    writeln!(out, "<details>")?;
    writeln!(out, "<summary>{}</summary>", render_html(&toggle.summary))?;
    write_nodes(out, &toggle.children, ctx)?;
    writeln!(out, "</details>")
}

fn write_block(out: &mut String, block: &RenderedBlock, ctx: &HtmlContext) -> std::fmt::Result {
    match &block.shape {
        BlockShape::Paragraph { text, color } => {
            writeln!(out, "<p{}>{}</p>", class_attr(*color), render_html(text))?;
        }
        BlockShape::Heading {
            level,
            text,
            anchor,
            is_toggleable,
        } => {
            let n = level.as_u8();
            let heading = format!(
                "<h{n} id=\"{}\">{}</h{n}>",
                html_escape(anchor),
                render_html(text)
            );
            if *is_toggleable {
                writeln!(out, "<details>")?;
                writeln!(out, "<summary>{}</summary>", heading)?;
                write_nodes(out, &block.children, ctx)?;
                return writeln!(out, "</details>");
            }
            writeln!(out, "{}", heading)?;
        }
        BlockShape::ToDo { text, checked } => {
            writeln!(
                out,
                "<div class=\"to-do\"><input type=\"checkbox\" disabled{}> <span{}>{}</span></div>",
                if *checked { " checked" } else { "" },
                if *checked { " class=\"checked\"" } else { "" },
                render_html(text)
            )?;
        }
        BlockShape::Quote { text } => {
            writeln!(out, "<blockquote>{}</blockquote>", render_html(text))?;
        }
        BlockShape::Callout { text, icon, color } => {
            let mut classes = String::from("callout");
            if let Some(class) = color.css_class() {
                write!(classes, " {}", class)?;
            }
            write!(out, "<div class=\"{}\">", classes)?;
            if let Some(icon) = icon {
                write_icon(out, icon)?;
            }
            writeln!(out, "<div>{}</div></div>", render_html(text))?;
        }
        BlockShape::Code {
            language,
            source,
            caption,
        } => {
            write!(
                out,
                "<pre><code class=\"language-{}\">{}</code></pre>",
                html_escape(language),
                html_escape(source)
            )?;
            write_caption(out, caption, "div")?;
            out.push('\n');
        }
        BlockShape::Equation { expression } => {
            writeln!(out, "<div class=\"equation\">{}</div>", html_escape(expression))?;
        }
        BlockShape::Divider => writeln!(out, "<hr>")?,
        BlockShape::Media {
            kind,
            asset,
            caption,
            name,
        } => write_media(out, *kind, asset, caption, name.as_deref(), ctx)?,
        BlockShape::Bookmark { url, caption } => {
            write!(out, "<div class=\"bookmark\">{}", external_link(url, url))?;
            write_caption(out, caption, "div")?;
            writeln!(out, "</div>")?;
        }
        BlockShape::Embed { url } => {
            writeln!(out, "<div class=\"embed\">{}</div>", external_link(url, url))?;
        }
        BlockShape::ChildPage { title } => {
            writeln!(out, "<div class=\"child-page\">{}</div>", html_escape(title))?;
        }
        BlockShape::ChildDatabase { title } => {
            writeln!(out, "<div class=\"child-database\">{}</div>", html_escape(title))?;
        }
        BlockShape::LinkToPage(target) => {
            let id = match target {
                LinkTarget::Page { page_id } => page_id.as_str().to_string(),
                LinkTarget::Database { database_id } => database_id.clone(),
            };
            writeln!(
                out,
                "<a class=\"link-to-page\" href=\"https://www.notion.so/{}\">{}</a>",
                html_escape(&id),
                html_escape(&id)
            )?;
        }
        BlockShape::Table { layout, rows } => write_table(out, layout, rows)?,
        BlockShape::TableRow { cells } => {
            write_table(out, &TableLayout::default(), std::slice::from_ref(cells))?
        }
        BlockShape::SyncedBlock { .. } => {
            writeln!(out, "<div class=\"synced-block\">")?;
            write_nodes(out, &block.children, ctx)?;
            return writeln!(out, "</div>");
        }
        BlockShape::Unsupported { block_type, .. } => {
            writeln!(
                out,
                "<div class=\"unsupported-block\" data-block-type=\"{0}\">Unsupported block: {0}</div>",
                html_escape(block_type)
            )?;
        }
        BlockShape::Inline { text } => {
            writeln!(out, "<div>{}</div>", render_html(text))?;
        }
    }

    if !block.children.is_empty() {
        writeln!(out, "<div class=\"children\">")?;
        write_nodes(out, &block.children, ctx)?;
        writeln!(out, "</div>")?;
    }
    Ok(())
}

fn write_media(
    out: &mut String,
    kind: MediaKind,
    asset: &AssetReference,
    caption: &StyledText,
    name: Option<&str>,
    ctx: &HtmlContext,
) -> std::fmt::Result {
    let (url, state) = ctx.display(asset);
    let src = html_escape(&url);
    write!(out, "<figure data-asset-state=\"{}\">", state)?;
    match kind {
        MediaKind::Image => write!(
            out,
            "<img src=\"{}\" alt=\"{}\" loading=\"lazy\">",
            src,
            html_escape(&caption.plain_text())
        )?,
        MediaKind::Video => write!(out, "<video controls src=\"{}\"></video>", src)?,
        MediaKind::Pdf => write!(
            out,
            "<object type=\"application/pdf\" data=\"{}\">{}</object>",
            src,
            external_link(&url, name.unwrap_or("PDF"))
        )?,
        MediaKind::File => write!(
            out,
            "<a href=\"{}\" download>{}</a>",
            src,
            html_escape(name.unwrap_or("Download file"))
        )?,
    }
    write_caption(out, caption, "figcaption")?;
    writeln!(out, "</figure>")
}

fn write_table(out: &mut String, layout: &TableLayout, rows: &[Vec<StyledText>]) -> std::fmt::Result {
    writeln!(out, "<table>")?;
    for (r, row) in rows.iter().enumerate() {
        write!(out, "<tr>")?;
        for (c, cell) in row.iter().enumerate() {
            let header = (layout.has_column_header && r == 0) || (layout.has_row_header && c == 0);
            let tag = if header { "th" } else { "td" };
            write!(out, "<{tag}>{}</{tag}>", render_html(cell))?;
        }
        writeln!(out, "</tr>")?;
    }
    writeln!(out, "</table>")
}

fn write_toc(out: &mut String, entries: &[TocEntry]) -> std::fmt::Result {
    writeln!(out, "<nav class=\"toc\">")?;
    writeln!(out, "<ul>")?;
    for entry in entries {
        writeln!(
            out,
            "<li class=\"toc-level-{}\"><a href=\"#{}\">{}</a></li>",
            entry.level,
            html_escape(&entry.anchor),
            html_escape(&entry.text)
        )?;
    }
    writeln!(out, "</ul>")?;
    writeln!(out, "</nav>")
}

fn write_icon(out: &mut String, icon: &Icon) -> std::fmt::Result {
    match icon {
        Icon::Emoji { emoji } => write!(
            out,
            "<span class=\"callout-icon\">{}</span>",
            html_escape(emoji)
        ),
        Icon::External { url } | Icon::Hosted { url } => write!(
            out,
            "<img class=\"callout-icon\" src=\"{}\" alt=\"\">",
            html_escape(url)
        ),
    }
}

fn write_caption(out: &mut String, caption: &StyledText, tag: &str) -> std::fmt::Result {
    if caption.is_empty() {
        return Ok(());
    }
    write!(out, "<{tag} class=\"caption\">{}</{tag}>", render_html(caption))
}

fn external_link(url: &str, label: &str) -> String {
    format!(
        "<a href=\"{}\" target=\"_blank\" rel=\"noopener noreferrer\">{}</a>",
        html_escape(url),
        html_escape(label)
    )
}

fn class_attr(color: Color) -> String {
    color
        .css_class()
        .map(|class| format!(" class=\"{}\"", class))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formatting::normalize::normalize;
    use crate::formatting::toc::table_of_contents;
    use crate::model::{Block, BlockKind, FileSource, HeadingLevel, TextContent};
    use crate::types::{BlockId, TextRun};

    fn id(s: &str) -> BlockId {
        BlockId::opaque(s).unwrap()
    }

    #[test]
    fn test_lists_and_toggles() {
        let blocks = vec![
            Block::bulleted(id("a"), vec![TextRun::plain("one")]),
            Block::bulleted(id("b"), vec![TextRun::plain("two")])
                .with_children(vec![Block::numbered(id("c"), vec![TextRun::plain("sub")])]),
            Block::toggle(id("t"), vec![TextRun::plain("More")])
                .with_children(vec![Block::paragraph(id("p"), vec![TextRun::plain("Hidden")])]),
        ];
        let html = render_nodes(&normalize(&blocks, 0), &HtmlContext::default()).unwrap();

        insta::assert_snapshot!(html, @r###"
        <ul data-level="0">
        <li>one</li>
        <li>two
        <ol data-level="1">
        <li>sub</li>
        </ol>
        </li>
        </ul>
        <details>
        <summary>More</summary>
        <p>Hidden</p>
        </details>
        "###);
    }

    #[test]
    fn test_unsupported_block_is_visible() {
        let blocks = vec![Block::new(
            id("x"),
            BlockKind::Unsupported {
                block_type: "column_list".into(),
                raw: serde_json::Value::Null,
            },
        )];
        let html = render_nodes(&normalize(&blocks, 0), &HtmlContext::default()).unwrap();
        assert_eq!(
            html,
            "<div class=\"unsupported-block\" data-block-type=\"column_list\">Unsupported block: column_list</div>\n"
        );
    }

    #[test]
    fn test_provider_strings_are_escaped_in_markup() {
        let blocks = vec![
            Block::heading(
                id("h\"><script>x</script>"),
                HeadingLevel::H2,
                vec![TextRun::plain("T")],
            ),
            Block::new(
                id("c"),
                BlockKind::Callout {
                    content: TextContent::new(vec![TextRun::plain("Note")]),
                    icon: Some(Icon::Emoji {
                        emoji: "<img src=x onerror=alert(1)>".into(),
                    }),
                },
            ),
        ];
        let nodes = normalize(&blocks, 0);
        let toc = table_of_contents(&nodes);

        let mut html = String::new();
        write_toc(&mut html, &toc).unwrap();
        html.push_str(&render_nodes(&nodes, &HtmlContext::default()).unwrap());

        assert!(!html.contains("<script>"));
        assert!(!html.contains("<img"));
        assert!(html.contains(
            "<h2 id=\"heading-h&quot;&gt;&lt;script&gt;x&lt;/script&gt;\">T</h2>"
        ));
        assert!(html.contains("href=\"#heading-h&quot;&gt;&lt;script&gt;x&lt;/script&gt;\""));
        assert!(html.contains(
            "<span class=\"callout-icon\">&lt;img src=x onerror=alert(1)&gt;</span>"
        ));
    }

    #[test]
    fn test_table_with_stray_child_renders_it_after_the_rows() {
        let table = Block::new(id("t"), BlockKind::Table(TableLayout::default())).with_children(
            vec![
                Block::new(
                    id("r"),
                    BlockKind::TableRow {
                        cells: vec![vec![TextRun::plain("M")]],
                    },
                ),
                Block::paragraph(id("p"), vec![TextRun::plain("Runs small")]),
            ],
        );
        let html = render_nodes(&normalize(&[table], 0), &HtmlContext::default()).unwrap();

        insta::assert_snapshot!(html, @r###"
        <table>
        <tr><td>M</td></tr>
        </table>
        <div class="children">
        <p>Runs small</p>
        </div>
        "###);
    }

    #[test]
    fn test_media_uses_resolved_url() {
        let original = "https://prod-files-secure.s3.us-west-2.amazonaws.com/a.png?X-Amz-Expires=3600";
        let blocks = vec![Block::image(
            id("img"),
            FileSource::Hosted {
                url: original.into(),
                expiry_time: None,
            },
        )];
        let nodes = normalize(&blocks, 0);

        let reference = AssetReference::new(original);
        let mut resolved = HashMap::new();
        resolved.insert(
            original.to_string(),
            ResolvedAsset {
                display_url: "/images/placeholder.svg".into(),
                state: AssetState::RefreshFailed,
                is_refreshing: false,
                reference,
            },
        );
        let ctx = HtmlContext {
            assets: Some(&resolved),
            ..Default::default()
        };

        let html = render_nodes(&nodes, &ctx).unwrap();
        assert_eq!(
            html,
            "<figure data-asset-state=\"refresh_failed\"><img src=\"/images/placeholder.svg\" alt=\"\" loading=\"lazy\"></figure>\n"
        );
    }

    #[test]
    fn test_empty_media_url_shows_placeholder() {
        let blocks = vec![Block::image(id("img"), FileSource::External { url: String::new() })];
        let html = render_nodes(&normalize(&blocks, 0), &HtmlContext::default()).unwrap();
        assert!(html.contains("src=\"/images/placeholder.svg\""));
    }
}
