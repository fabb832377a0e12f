use std::borrow::Cow;
use std::ops::RangeInclusive;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use html5ever::tendril::StrTendril;
use html5ever::tokenizer::states::RawKind;
use html5ever::tokenizer::{
    BufferQueue, Tag, TagKind, Token, TokenSink, TokenSinkResult, Tokenizer, TokenizerOpts,
    TokenizerResult,
};
use rand::Rng;
use reqwest::blocking::Client;
use reqwest::header::ACCEPT;

pub const DEFAULT_ITEM_BASE: &str =
    "http://digitallibrary.usc.edu/cdm/singleitem/collection/p15799coll65/id/";
pub const DEFAULT_PHOTO_BASE: &str =
    "http://digitallibrary.usc.edu/utils/ajaxhelper/?CISOROOT=p15799coll65&CISOPTR=";
/// Rendering parameters of the library's image viewer. Reproduced verbatim.
pub const PHOTO_SUFFIX: &str = "&action=2&DMSCALE=10&DMWIDTH=800&DMHEIGHT=800";
pub const ID_RANGE: RangeInclusive<u32> = 0..=26223;

pub const DESCRIPTION_ANCHOR: &str = "metadata_descra";
pub const NO_DESCRIPTION: &str = "No description for this item ID.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LibraryConfig {
    pub item_base: String,
    pub photo_base: String,
    pub photo_suffix: String,
    pub id_range: RangeInclusive<u32>,
}

impl Default for LibraryConfig {
    fn default() -> Self {
        Self {
            item_base: DEFAULT_ITEM_BASE.to_string(),
            photo_base: DEFAULT_PHOTO_BASE.to_string(),
            photo_suffix: PHOTO_SUFFIX.to_string(),
            id_range: ID_RANGE,
        }
    }
}

impl LibraryConfig {
    pub fn item_url(&self, id: u32) -> String {
        format!("{}{id}", self.item_base)
    }

    pub fn photo_url(&self, id: u32) -> String {
        format!("{}{id}{}", self.photo_base, self.photo_suffix)
    }
}

/// Source of catalog item IDs.
pub trait IdSource {
    fn next_id(&mut self) -> u32;
}

/// Draws IDs uniformly from an inclusive range using the thread-local,
/// OS-seeded generator.
pub struct RandomIds {
    range: RangeInclusive<u32>,
}

impl RandomIds {
    pub fn new(range: RangeInclusive<u32>) -> Self {
        Self { range }
    }
}

impl IdSource for RandomIds {
    fn next_id(&mut self) -> u32 {
        rand::thread_rng().gen_range(self.range.clone())
    }
}

/// Blocking byte download. The app talks to the network only through this.
pub trait Fetch {
    fn fetch(&self, url: &str) -> Result<Vec<u8>>;
}

pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(60))
            .build()
            .context("Could not initialize HTTP client for the digital library")?;
        Ok(Self { client })
    }
}

impl Fetch for HttpFetcher {
    fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        log::debug!("GET {url}");
        let response = self
            .client
            .get(url)
            .header(ACCEPT, "*/*")
            .send()
            .with_context(|| format!("HTTP request failed for {url}"))?;
        let status = response.status();
        if !status.is_success() {
            bail!("HTTP {status} for {url}");
        }

        response
            .bytes()
            .map(|body| body.to_vec())
            .with_context(|| format!("Could not read response body from {url}"))
    }
}

/// Downloads the item page and returns its description text, or
/// [`NO_DESCRIPTION`] when the page has no description block.
pub fn fetch_description(fetcher: &impl Fetch, item_url: &str) -> Result<String> {
    let body = fetcher
        .fetch(item_url)
        .with_context(|| format!("Failed fetching item page {item_url}"))?;
    let html = String::from_utf8_lossy(&body);
    if let Cow::Owned(_) = html {
        log::debug!("Item page {item_url} is not valid UTF-8; undecodable bytes were replaced");
    }
    let description = extract_description(&html);
    log::info!(
        "Extracted {} characters of description from {item_url}",
        description.len()
    );
    Ok(description)
}

/// Returns the trimmed text of the first element whose `id` is
/// [`DESCRIPTION_ANCHOR`], or [`NO_DESCRIPTION`].
///
/// Works on the token stream rather than a built DOM, so the element is found
/// wherever it sits, including a `<td>` outside any `<table>`.
pub fn extract_description(html: &str) -> String {
    let mut tokenizer = Tokenizer::new(AnchorTextSink::default(), TokenizerOpts::default());
    let mut input = BufferQueue::default();
    input.push_back(StrTendril::from_slice(html));
    while let TokenizerResult::Script(()) = tokenizer.feed(&mut input) {}
    tokenizer.end();

    let sink = tokenizer.sink;
    if sink.found {
        sink.text.trim().to_string()
    } else {
        NO_DESCRIPTION.to_string()
    }
}

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

#[derive(Default)]
struct AnchorTextSink {
    /// Tag name of the anchor while it is open.
    anchor: Option<String>,
    depth: usize,
    text: String,
    found: bool,
    done: bool,
}

impl AnchorTextSink {
    fn process_tag(&mut self, tag: &Tag) {
        let name = &*tag.name;
        match tag.kind {
            TagKind::StartTag if self.depth == 0 => {
                if !is_anchor(tag) {
                    return;
                }
                self.found = true;
                if tag.self_closing || VOID_ELEMENTS.contains(&name) {
                    self.done = true;
                } else {
                    self.anchor = Some(name.to_string());
                    self.depth = 1;
                }
            }
            TagKind::StartTag => {
                if !tag.self_closing && self.anchor.as_deref() == Some(name) {
                    self.depth += 1;
                }
            }
            TagKind::EndTag => {
                if self.anchor.as_deref() == Some(name) {
                    self.depth -= 1;
                    if self.depth == 0 {
                        self.done = true;
                    }
                }
            }
        }
    }
}

impl TokenSink for AnchorTextSink {
    type Handle = ();

    fn process_token(&mut self, token: Token, _line_number: u64) -> TokenSinkResult<()> {
        match token {
            Token::TagToken(tag) => {
                if !self.done {
                    self.process_tag(&tag);
                }
                if matches!(tag.kind, TagKind::StartTag) && !tag.self_closing {
                    return raw_text_state(&tag.name);
                }
            }
            Token::CharacterTokens(text) if self.depth > 0 && !self.done => {
                self.text.push_str(&text);
            }
            _ => {}
        }
        TokenSinkResult::Continue
    }
}

fn is_anchor(tag: &Tag) -> bool {
    tag.attrs
        .iter()
        .any(|attr| &*attr.name.local == "id" && &*attr.value == DESCRIPTION_ANCHOR)
}

/// Without a tree builder the tokenizer has to be told which elements hold
/// raw text.
fn raw_text_state(name: &str) -> TokenSinkResult<()> {
    match name {
        "script" => TokenSinkResult::RawData(RawKind::ScriptData),
        "style" | "xmp" | "iframe" | "noembed" | "noframes" => {
            TokenSinkResult::RawData(RawKind::Rawtext)
        }
        "title" | "textarea" => TokenSinkResult::RawData(RawKind::Rcdata),
        _ => TokenSinkResult::Continue,
    }
}
