// tests/render_pipeline.rs
//! End-to-end: provider JSON → page tree → normalized, asset-resolved HTML.

use chrono::{TimeZone, Utc};
use notionpress::api::responses::{block_from_value, page_from_value};
use notionpress::assets::ManualClock;
use notionpress::error::NotionErrorCode;
use notionpress::{
    fetch_page_tree, AppError, ArticleComposer, AssetResolver, Block, BlockId, ImageMirror,
    NotionRepository, OriginRefreshClient, Page, PageComposer, PageId, RefreshCache,
    ResolverConfig,
};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

const PAGE_ID: &str = "1a2b3c4d5e6f70818293a4b5c6d7e8f9";
const OLD_IMAGE: &str = "https://prod-files-secure.s3.us-west-2.amazonaws.com/ws/img-1/old.png";
const NEW_IMAGE: &str = "https://prod-files-secure.s3.us-west-2.amazonaws.com/ws/img-1/new.png";

/// Serves pages, children listings and single blocks from inline JSON.
struct FixtureWorkspace {
    pages: HashMap<String, Value>,
    children: HashMap<String, Vec<Value>>,
    blocks: HashMap<String, Value>,
    block_requests: AtomicUsize,
}

fn not_found(what: &str) -> AppError {
    AppError::NotionService {
        code: NotionErrorCode::ObjectNotFound,
        message: format!("Could not find {}", what),
        status: reqwest::StatusCode::NOT_FOUND,
    }
}

#[async_trait::async_trait]
impl NotionRepository for FixtureWorkspace {
    async fn retrieve_page(&self, id: &PageId) -> Result<Page, AppError> {
        let value = self.pages.get(id.as_str()).ok_or_else(|| not_found(id.as_str()))?;
        page_from_value(value)
    }

    async fn retrieve_block(&self, id: &BlockId) -> Result<Block, AppError> {
        self.block_requests.fetch_add(1, Ordering::SeqCst);
        let value = self.blocks.get(id.as_str()).ok_or_else(|| not_found(id.as_str()))?;
        Ok(block_from_value(value.clone()))
    }

    async fn retrieve_children(&self, parent: &BlockId) -> Result<Vec<Block>, AppError> {
        let values = self
            .children
            .get(parent.as_str())
            .ok_or_else(|| not_found(parent.as_str()))?;
        Ok(values.iter().cloned().map(block_from_value).collect())
    }
}

fn rich_text(content: &str, bold: bool) -> Value {
    json!({
        "type": "text",
        "text": { "content": content, "link": null },
        "annotations": {
            "bold": bold, "italic": false, "strikethrough": false,
            "underline": false, "code": false, "color": "default"
        },
        "plain_text": content,
        "href": null
    })
}

fn image_block(url: &str, expiry: &str) -> Value {
    json!({
        "object": "block",
        "id": "img-1",
        "type": "image",
        "has_children": false,
        "image": {
            "caption": [],
            "type": "file",
            "file": { "url": url, "expiry_time": expiry }
        }
    })
}

fn workspace(page: Value) -> Arc<FixtureWorkspace> {
    let body = vec![
        json!({
            "object": "block", "id": "h-1", "type": "heading_2", "has_children": false,
            "heading_2": { "rich_text": [rich_text("Care guide", false)], "is_toggleable": false, "color": "default" }
        }),
        json!({
            "object": "block", "id": "p-1", "type": "paragraph", "has_children": false,
            "paragraph": { "rich_text": [rich_text("Wash", true), rich_text(" cold.", false)], "color": "default" }
        }),
        json!({
            "object": "block", "id": "l-1", "type": "bulleted_list_item", "has_children": false,
            "bulleted_list_item": { "rich_text": [rich_text("Gentle cycle", false)], "color": "default" }
        }),
        json!({
            "object": "block", "id": "l-2", "type": "bulleted_list_item", "has_children": false,
            "bulleted_list_item": { "rich_text": [rich_text("Air dry", false)], "color": "default" }
        }),
        image_block(OLD_IMAGE, "2025-01-01T00:30:00.000Z"),
        json!({
            "object": "block", "id": "col-1", "type": "column_list", "has_children": false,
            "column_list": {}
        }),
    ];

    Arc::new(FixtureWorkspace {
        pages: HashMap::from([(PAGE_ID.to_string(), page)]),
        children: HashMap::from([(PAGE_ID.to_string(), body)]),
        blocks: HashMap::from([(
            "img-1".to_string(),
            image_block(NEW_IMAGE, "2025-01-01T02:00:00.000Z"),
        )]),
        block_requests: AtomicUsize::new(0),
    })
}

fn page_json(extra_properties: Value) -> Value {
    let mut properties = json!({
        "Name": { "id": "title", "type": "title", "title": [rich_text("Linen Shirt", false)] }
    });
    if let (Some(props), Some(extra)) = (properties.as_object_mut(), extra_properties.as_object()) {
        props.extend(extra.clone());
    }
    json!({
        "object": "page",
        "id": "1a2b3c4d-5e6f-7081-8293-a4b5c6d7e8f9",
        "url": "https://www.notion.so/Linen-Shirt-1a2b3c4d5e6f70818293a4b5c6d7e8f9",
        "cover": null,
        "properties": properties
    })
}

fn composer(repo: Arc<FixtureWorkspace>) -> ArticleComposer {
    let clock = ManualClock::new(Utc.with_ymd_and_hms(2025, 1, 1, 1, 0, 0).unwrap());
    let resolver = AssetResolver::new(
        Arc::new(OriginRefreshClient::new(repo)),
        Arc::new(RefreshCache::new()),
        ResolverConfig::default(),
    )
    .with_clock(Arc::new(clock));
    ArticleComposer::new(Arc::new(resolver))
}

#[tokio::test]
async fn test_page_renders_with_refreshed_image() {
    let repo = workspace(page_json(json!({})));
    let page = fetch_page_tree(repo.as_ref(), &PageId::parse(PAGE_ID).unwrap())
        .await
        .unwrap();
    assert_eq!(page.blocks.len(), 6);

    let html = composer(repo.clone()).compose(&page).await.unwrap();

    insta::assert_snapshot!(html.as_str(), @r###"
    <article>
    <header>
    <h1>Linen Shirt</h1>
    </header>
    <nav class="toc">
    <ul>
    <li class="toc-level-2"><a href="#heading-h-1">Care guide</a></li>
    </ul>
    </nav>
    <h2 id="heading-h-1">Care guide</h2>
    <p><strong>Wash</strong> cold.</p>
    <ul data-level="0">
    <li>Gentle cycle</li>
    <li>Air dry</li>
    </ul>
    <figure data-asset-state="refreshed"><img src="https://prod-files-secure.s3.us-west-2.amazonaws.com/ws/img-1/new.png" alt="" loading="lazy"></figure>
    <div class="unsupported-block" data-block-type="column_list">Unsupported block: column_list</div>
    </article>
    "###);
    assert_eq!(repo.block_requests.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_disabled_resolution_keeps_original_urls() {
    let repo = workspace(page_json(json!({})));
    let page = fetch_page_tree(repo.as_ref(), &PageId::parse(PAGE_ID).unwrap())
        .await
        .unwrap();

    let html = composer(repo.clone())
        .with_asset_resolution(false)
        .with_toc(false)
        .compose(&page)
        .await
        .unwrap();

    assert!(html.as_str().contains(&format!(
        "<figure data-asset-state=\"expired_pending_refresh\"><img src=\"{}\"",
        OLD_IMAGE
    )));
    assert!(!html.as_str().contains("<nav class=\"toc\">"));
    assert_eq!(repo.block_requests.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_cover_property_is_rendered_in_header() {
    let repo = workspace(page_json(json!({
        "Cover Image": {
            "type": "files",
            "files": [{ "name": "cover.jpg", "type": "external", "external": { "url": "https://cdn.example/cover.jpg" } }]
        }
    })));
    let page = fetch_page_tree(repo.as_ref(), &PageId::parse(PAGE_ID).unwrap())
        .await
        .unwrap();

    let html = composer(repo).compose(&page).await.unwrap();

    assert!(html.as_str().contains(
        "<img class=\"cover\" src=\"https://cdn.example/cover.jpg\" alt=\"\" data-asset-state=\"fresh\">"
    ));
}

#[tokio::test]
async fn test_mirrored_image_is_linked_locally_without_refresh() {
    let repo = workspace(page_json(json!({})));
    let page = fetch_page_tree(repo.as_ref(), &PageId::parse(PAGE_ID).unwrap())
        .await
        .unwrap();

    let dir = std::env::temp_dir().join(format!("notionpress-pipeline-{}", uuid::Uuid::new_v4()));
    let mirror = Arc::new(ImageMirror::open(&dir, "/notion-images").unwrap());
    let local = mirror
        .store(&format!("{}?X-Amz-Signature=earlier", OLD_IMAGE), b"png")
        .await
        .unwrap();

    let clock = ManualClock::new(Utc.with_ymd_and_hms(2025, 1, 1, 1, 0, 0).unwrap());
    let resolver = AssetResolver::new(
        Arc::new(OriginRefreshClient::new(repo.clone())),
        Arc::new(RefreshCache::new()),
        ResolverConfig::default(),
    )
    .with_clock(Arc::new(clock))
    .with_mirror(mirror.clone());
    let html = ArticleComposer::new(Arc::new(resolver))
        .with_mirror(mirror, reqwest::Client::new())
        .compose(&page)
        .await
        .unwrap();

    assert!(html.as_str().contains(&format!(
        "<figure data-asset-state=\"fresh\"><img src=\"{}\"",
        local
    )));
    assert_eq!(repo.block_requests.load(Ordering::SeqCst), 0);

    let _ = std::fs::remove_dir_all(dir);
}

#[tokio::test]
async fn test_missing_page_is_an_error() {
    let repo = workspace(page_json(json!({})));
    let missing = PageId::parse("ffffffffffffffffffffffffffffffff").unwrap();

    let err = fetch_page_tree(repo.as_ref(), &missing).await.unwrap_err();
    assert!(err.notion_code().is_some_and(|code| code.is_not_found()));
}
