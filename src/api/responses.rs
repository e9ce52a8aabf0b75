// src/api/responses.rs
//! Lenient conversion of Notion JSON into the domain model.
//!
//! Block payloads are read field by field. A missing or mistyped field
//! degrades to an empty value instead of failing the whole response, and
//! block types this site does not render become `BlockKind::Unsupported`
//! carrying the raw JSON.

use crate::assets::{AssetOwner, AssetReference};
use crate::error::AppError;
use crate::model::{
    Block, BlockCommon, BlockKind, CodeContent, FileSource, HeadingLevel, Icon, LinkTarget,
    MediaContent, Page, PageTitle, TableLayout, TextContent,
};
use crate::types::{AbsoluteUrl, Annotations, BlockId, Color, PageId, TextRun};
use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;
use serde_json::Value;

// ---------------------------------------------------------------------------
// Rich text
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawRichText {
    plain_text: String,
    href: Option<String>,
    annotations: RawAnnotations,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawAnnotations {
    bold: bool,
    italic: bool,
    strikethrough: bool,
    underline: bool,
    code: bool,
    color: Option<String>,
}

impl From<RawAnnotations> for Annotations {
    fn from(raw: RawAnnotations) -> Self {
        Annotations {
            bold: raw.bold,
            italic: raw.italic,
            strikethrough: raw.strikethrough,
            underline: raw.underline,
            code: raw.code,
            color: raw
                .color
                .as_deref()
                .map(Color::parse_lenient)
                .unwrap_or_default(),
        }
    }
}

/// Converts a rich text array. Items that are not objects are skipped;
/// anything that is not an array yields no runs.
pub fn rich_text_from_value(value: &Value) -> Vec<TextRun> {
    let Some(items) = value.as_array() else {
        return Vec::new();
    };

    items
        .iter()
        .filter_map(|item| match RawRichText::deserialize(item) {
            Ok(raw) => Some(raw),
            Err(e) => {
                log::debug!("Skipping malformed rich text item: {}", e);
                None
            }
        })
        .map(|raw| {
            // Relative hrefs (internal page mentions) have no absolute form.
            let link = raw.href.as_deref().and_then(|h| AbsoluteUrl::parse(h).ok());
            TextRun {
                content: raw.plain_text,
                link,
                annotations: raw.annotations.into(),
            }
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Files and icons
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawFile {
    #[serde(rename = "type")]
    kind: String,
    external: Option<RawUrl>,
    file: Option<RawHostedFile>,
    name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawUrl {
    url: String,
}

#[derive(Debug, Deserialize)]
struct RawHostedFile {
    #[serde(default)]
    url: String,
    #[serde(default, deserialize_with = "lenient_datetime")]
    expiry_time: Option<DateTime<Utc>>,
}

fn lenient_datetime<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.and_then(|s| DateTime::parse_from_rfc3339(&s).ok().map(|dt| dt.with_timezone(&Utc))))
}

fn raw_file(value: &Value) -> RawFile {
    RawFile::deserialize(value).unwrap_or_else(|e| {
        log::debug!("Malformed file object: {}", e);
        RawFile::default()
    })
}

/// Reads a Notion file object (`{"type": "external" | "file", ...}`).
///
/// A file object with no usable URL becomes an external source with an
/// empty URL; the asset resolver turns that into the placeholder.
pub fn file_source_from_value(value: &Value) -> FileSource {
    let raw = raw_file(value);
    source_from_raw(raw.kind.as_str(), raw.external, raw.file)
}

fn source_from_raw(
    kind: &str,
    external: Option<RawUrl>,
    file: Option<RawHostedFile>,
) -> FileSource {
    match (kind, external, file) {
        ("file", _, Some(hosted)) | ("", None, Some(hosted)) => FileSource::Hosted {
            url: hosted.url,
            expiry_time: hosted.expiry_time,
        },
        (_, Some(external), _) => FileSource::External { url: external.url },
        (_, None, Some(hosted)) => FileSource::Hosted {
            url: hosted.url,
            expiry_time: hosted.expiry_time,
        },
        (kind, None, None) => {
            log::warn!("File object of type '{}' carries no URL", kind);
            FileSource::External { url: String::new() }
        }
    }
}

fn media_from_value(payload: &Value) -> MediaContent {
    let raw = raw_file(payload);
    let name = raw.name.clone();
    MediaContent {
        source: source_from_raw(raw.kind.as_str(), raw.external, raw.file),
        caption: rich_text_from_value(&payload["caption"]),
        name,
    }
}

fn icon_from_value(value: &Value) -> Option<Icon> {
    match value.get("type").and_then(Value::as_str)? {
        "emoji" => Some(Icon::Emoji {
            emoji: str_field(value, "emoji"),
        }),
        "external" => Some(Icon::External {
            url: str_field(&value["external"], "url"),
        }),
        "file" => Some(Icon::Hosted {
            url: str_field(&value["file"], "url"),
        }),
        other => {
            log::debug!("Ignoring icon of type '{}'", other);
            None
        }
    }
}

// ---------------------------------------------------------------------------
// Blocks
// ---------------------------------------------------------------------------

fn str_field(value: &Value, key: &str) -> String {
    value
        .get(key)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

fn bool_field(value: &Value, key: &str) -> bool {
    value.get(key).and_then(Value::as_bool).unwrap_or(false)
}

fn text_content(payload: &Value) -> TextContent {
    TextContent {
        rich_text: rich_text_from_value(&payload["rich_text"]),
        color: payload
            .get("color")
            .and_then(Value::as_str)
            .map(Color::parse_lenient)
            .unwrap_or_default(),
    }
}

/// Converts one block object. Never fails: an object without an id or type
/// becomes an unsupported block so it still shows up on the page.
pub fn block_from_value(value: Value) -> Block {
    let id = value
        .get("id")
        .and_then(Value::as_str)
        .and_then(|s| BlockId::opaque(s).ok());
    let block_type = value.get("type").and_then(Value::as_str).map(str::to_string);
    let has_children = bool_field(&value, "has_children");

    let (id, block_type) = match (id, block_type) {
        (Some(id), Some(block_type)) => (id, block_type),
        (id, block_type) => {
            log::warn!("Block object without id or type; keeping it as unsupported");
            return Block::new(
                id.unwrap_or_else(BlockId::new_v4),
                BlockKind::Unsupported {
                    block_type: block_type.unwrap_or_else(|| "unknown".to_string()),
                    raw: value,
                },
            );
        }
    };

    let kind = kind_from_payload(&block_type, &value);
    let mut common = BlockCommon::new(id);
    common.has_children = has_children;
    Block { common, kind }
}

fn kind_from_payload(block_type: &str, block: &Value) -> BlockKind {
    let payload = &block[block_type];

    match block_type {
        "paragraph" => BlockKind::Paragraph(text_content(payload)),
        "heading_1" | "heading_2" | "heading_3" => BlockKind::Heading {
            level: match block_type {
                "heading_1" => HeadingLevel::H1,
                "heading_2" => HeadingLevel::H2,
                _ => HeadingLevel::H3,
            },
            content: text_content(payload),
            is_toggleable: bool_field(payload, "is_toggleable"),
        },
        "bulleted_list_item" => BlockKind::BulletedListItem(text_content(payload)),
        "numbered_list_item" => BlockKind::NumberedListItem(text_content(payload)),
        "to_do" => BlockKind::ToDo {
            content: text_content(payload),
            checked: bool_field(payload, "checked"),
        },
        "toggle" => BlockKind::Toggle(text_content(payload)),
        "quote" => BlockKind::Quote(text_content(payload)),
        "callout" => BlockKind::Callout {
            content: text_content(payload),
            icon: icon_from_value(&payload["icon"]),
        },
        "code" => BlockKind::Code(CodeContent {
            language: payload
                .get("language")
                .and_then(Value::as_str)
                .unwrap_or("plain text")
                .to_string(),
            text: text_content(payload),
            caption: rich_text_from_value(&payload["caption"]),
        }),
        "equation" => BlockKind::Equation {
            expression: str_field(payload, "expression"),
        },
        "divider" => BlockKind::Divider,
        "image" => BlockKind::Image(media_from_value(payload)),
        "video" => BlockKind::Video(media_from_value(payload)),
        "file" => BlockKind::File(media_from_value(payload)),
        "pdf" => BlockKind::Pdf(media_from_value(payload)),
        "bookmark" => BlockKind::Bookmark {
            url: str_field(payload, "url"),
            caption: rich_text_from_value(&payload["caption"]),
        },
        "embed" => BlockKind::Embed {
            url: str_field(payload, "url"),
        },
        "child_page" => BlockKind::ChildPage {
            title: str_field(payload, "title"),
        },
        "child_database" => BlockKind::ChildDatabase {
            title: str_field(payload, "title"),
        },
        "link_to_page" => match link_target(payload) {
            Some(target) => BlockKind::LinkToPage(target),
            None => unsupported(block_type, block),
        },
        "table" => BlockKind::Table(TableLayout {
            table_width: payload
                .get("table_width")
                .and_then(Value::as_u64)
                .unwrap_or(0) as usize,
            has_column_header: bool_field(payload, "has_column_header"),
            has_row_header: bool_field(payload, "has_row_header"),
        }),
        "table_row" => BlockKind::TableRow {
            cells: payload
                .get("cells")
                .and_then(Value::as_array)
                .map(|cells| cells.iter().map(rich_text_from_value).collect())
                .unwrap_or_default(),
        },
        "synced_block" => BlockKind::SyncedBlock {
            synced_from: payload
                .get("synced_from")
                .and_then(|from| from.get("block_id"))
                .and_then(Value::as_str)
                .and_then(|id| BlockId::opaque(id).ok()),
        },
        other => unsupported(other, block),
    }
}

fn unsupported(block_type: &str, block: &Value) -> BlockKind {
    log::debug!("Keeping '{}' block as unsupported", block_type);
    BlockKind::Unsupported {
        block_type: block_type.to_string(),
        raw: block.clone(),
    }
}

fn link_target(payload: &Value) -> Option<LinkTarget> {
    match payload.get("type").and_then(Value::as_str)? {
        "page_id" => {
            let raw = payload.get("page_id").and_then(Value::as_str)?;
            let page_id = PageId::parse(raw).or_else(|_| PageId::opaque(raw)).ok()?;
            Some(LinkTarget::Page { page_id })
        }
        "database_id" => Some(LinkTarget::Database {
            database_id: str_field(payload, "database_id"),
        }),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Pages
// ---------------------------------------------------------------------------

/// Properties checked, in order, when the page has no native cover.
const COVER_PROPERTIES: [&str; 2] = ["Cover Image", "Image"];

/// Converts a page object. Only the id is required; every property the
/// blog reads is optional.
pub fn page_from_value(value: &Value) -> Result<Page, AppError> {
    let raw_id = value
        .get("id")
        .and_then(Value::as_str)
        .ok_or_else(|| AppError::MalformedResponse("Page object without an id".to_string()))?;
    let id = PageId::parse(raw_id).or_else(|_| PageId::opaque(raw_id))?;

    let properties = &value["properties"];
    let title = properties
        .as_object()
        .and_then(|props| {
            props
                .values()
                .find(|prop| prop.get("type").and_then(Value::as_str) == Some("title"))
        })
        .map(property_text)
        .filter(|t| !t.trim().is_empty())
        .map(PageTitle::new)
        .unwrap_or_default();

    let cover = page_cover(value, &id);

    Ok(Page {
        title,
        url: str_field(value, "url"),
        slug: optional_text(&properties["Slug"]),
        excerpt: optional_text(&properties["Excerpt"]),
        published: property_date(&properties["Date"]),
        tags: property_tags(&properties["Tags"]),
        cover,
        blocks: Vec::new(),
        id,
    })
}

/// Plain text of a text-like property (title, rich_text, url, formula).
fn property_text(prop: &Value) -> String {
    match prop.get("type").and_then(Value::as_str) {
        Some("title") => crate::types::plain_text(&rich_text_from_value(&prop["title"])),
        Some("rich_text") => crate::types::plain_text(&rich_text_from_value(&prop["rich_text"])),
        Some("url") => str_field(prop, "url"),
        Some("formula") => str_field(&prop["formula"], "string"),
        _ => String::new(),
    }
}

fn optional_text(prop: &Value) -> Option<String> {
    let text = property_text(prop);
    if text.trim().is_empty() {
        None
    } else {
        Some(text)
    }
}

fn property_date(prop: &Value) -> Option<NaiveDate> {
    let start = prop.get("date")?.get("start")?.as_str()?;
    // Dates may carry a time component; the calendar day is all we keep.
    let day = start.get(..10)?;
    NaiveDate::parse_from_str(day, "%Y-%m-%d").ok()
}

fn property_tags(prop: &Value) -> Vec<String> {
    prop.get("multi_select")
        .and_then(Value::as_array)
        .map(|options| {
            options
                .iter()
                .filter_map(|option| option.get("name").and_then(Value::as_str))
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

fn page_cover(page: &Value, id: &PageId) -> Option<AssetReference> {
    let owner = AssetOwner::PageCover(id.clone());

    if page.get("cover").is_some_and(Value::is_object) {
        let source = file_source_from_value(&page["cover"]);
        if !source.url().is_empty() {
            return Some(AssetReference::from_source(&source, owner));
        }
    }

    COVER_PROPERTIES.iter().find_map(|name| {
        let prop = &page["properties"][*name];
        match prop.get("type").and_then(Value::as_str)? {
            "files" => {
                let first = prop.get("files")?.as_array()?.first()?;
                let source = file_source_from_value(first);
                (!source.url().is_empty())
                    .then(|| AssetReference::from_source(&source, owner.clone()))
            }
            "url" => {
                let url = prop.get("url")?.as_str()?;
                Some(AssetReference::from_source(
                    &FileSource::External {
                        url: url.to_string(),
                    },
                    owner.clone(),
                ))
            }
            _ => None,
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_rich_text_with_link_and_annotations() {
        let runs = rich_text_from_value(&json!([
            {
                "type": "text",
                "plain_text": "Shop",
                "href": "https://shop.example/",
                "annotations": { "bold": true, "italic": false, "strikethrough": false,
                                 "underline": false, "code": false, "color": "red" }
            },
            { "type": "mention", "plain_text": "Other page", "href": "/abc" }
        ]));

        assert_eq!(runs.len(), 2);
        assert!(runs[0].annotations.bold);
        assert_eq!(runs[0].annotations.color, Color::Red);
        assert_eq!(runs[0].link.as_ref().unwrap().as_str(), "https://shop.example/");
        assert_eq!(runs[1].content, "Other page");
        assert!(runs[1].link.is_none());
    }

    #[test]
    fn test_malformed_rich_text_is_empty() {
        assert!(rich_text_from_value(&json!("not an array")).is_empty());
        assert!(rich_text_from_value(&Value::Null).is_empty());
    }

    #[test]
    fn test_paragraph_without_payload_degrades_to_empty_text() {
        let block = block_from_value(json!({
            "object": "block", "id": "blk-1", "type": "paragraph", "has_children": false
        }));
        assert_eq!(block.block_type(), "paragraph");
        assert!(block.rich_text().is_empty());
    }

    #[test]
    fn test_hosted_image_keeps_provider_expiry() {
        let block = block_from_value(json!({
            "id": "img-1",
            "type": "image",
            "image": {
                "type": "file",
                "file": { "url": "https://s3.amazonaws.com/x.png", "expiry_time": "2025-01-01T01:00:00.000Z" },
                "caption": [{ "plain_text": "A cat" }]
            }
        }));

        let media = block.media().unwrap();
        match &media.source {
            FileSource::Hosted { url, expiry_time } => {
                assert_eq!(url, "https://s3.amazonaws.com/x.png");
                assert!(expiry_time.is_some());
            }
            other => panic!("expected hosted source, got {:?}", other),
        }
        assert_eq!(media.caption[0].content, "A cat");
    }

    #[test]
    fn test_image_without_url_has_empty_source() {
        let block = block_from_value(json!({ "id": "img-2", "type": "image", "image": {} }));
        assert_eq!(block.media().unwrap().source.url(), "");
    }

    #[test]
    fn test_unknown_type_is_preserved_raw() {
        let raw = json!({ "id": "c1", "type": "column_list", "column_list": {}, "has_children": true });
        let block = block_from_value(raw.clone());
        match block.kind() {
            BlockKind::Unsupported { block_type, raw: kept } => {
                assert_eq!(block_type, "column_list");
                assert_eq!(kept, &raw);
            }
            other => panic!("expected unsupported, got {:?}", other),
        }
        assert!(block.has_children());
    }

    #[test]
    fn test_block_without_id_is_not_dropped() {
        let block = block_from_value(json!({ "type": "paragraph" }));
        assert_eq!(block.block_type(), "paragraph");
        assert!(matches!(block.kind(), BlockKind::Unsupported { .. }));
    }

    #[test]
    fn test_page_metadata_and_cover_fallback() {
        let page = page_from_value(&json!({
            "object": "page",
            "id": "550e8400-e29b-41d4-a716-446655440000",
            "url": "https://www.notion.so/Spring-550e8400e29b41d4a716446655440000",
            "cover": null,
            "properties": {
                "Name": { "type": "title", "title": [{ "plain_text": "Spring Sale" }] },
                "Slug": { "type": "rich_text", "rich_text": [{ "plain_text": "spring-sale" }] },
                "Date": { "type": "date", "date": { "start": "2025-03-01T09:00:00.000+09:00" } },
                "Tags": { "type": "multi_select", "multi_select": [{ "name": "news" }, { "name": "sale" }] },
                "Cover Image": { "type": "files", "files": [
                    { "name": "c.png", "type": "external", "external": { "url": "https://cdn.example/c.png" } }
                ] }
            }
        }))
        .unwrap();

        assert_eq!(page.title.as_str(), "Spring Sale");
        assert_eq!(page.slug.as_deref(), Some("spring-sale"));
        assert_eq!(page.published, NaiveDate::from_ymd_opt(2025, 3, 1));
        assert_eq!(page.tags, vec!["news", "sale"]);
        let cover = page.cover.unwrap();
        assert_eq!(cover.url, "https://cdn.example/c.png");
        assert_eq!(cover.owner, Some(AssetOwner::PageCover(page.id.clone())));
    }

    #[test]
    fn test_page_without_id_is_an_error() {
        assert!(page_from_value(&json!({ "object": "page" })).is_err());
    }
}
