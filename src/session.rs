use anyhow::Result;

use crate::library::{fetch_description, Fetch, IdSource, LibraryConfig};
use crate::picture::{fetch_picture, Picture};

#[derive(Clone, Default)]
pub enum PanelContent {
    #[default]
    Empty,
    Picture(Picture),
    Error(String),
}

/// The image panel. It is never torn down: closing only clears `visible`,
/// and the content stays until the next fetch replaces it.
#[derive(Default)]
pub struct PicturePanel {
    visible: bool,
    title: String,
    content: PanelContent,
    revision: u64,
}

impl PicturePanel {
    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn content(&self) -> &PanelContent {
        &self.content
    }

    /// Bumped every time the content is replaced.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    fn replace(&mut self, title: String, content: PanelContent) {
        self.title = title;
        self.content = content;
        self.revision += 1;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShowOutcome {
    Reused,
    Fetched,
}

pub struct Session {
    config: LibraryConfig,
    current_id: Option<u32>,
    last_shown_id: Option<u32>,
    item_url: String,
    photo_url: String,
    description: String,
    queued_id: Option<u32>,
    panel: PicturePanel,
}

impl Session {
    pub fn new(config: LibraryConfig) -> Self {
        Self {
            config,
            current_id: None,
            last_shown_id: None,
            item_url: String::new(),
            photo_url: String::new(),
            description: String::new(),
            queued_id: None,
            panel: PicturePanel::default(),
        }
    }

    pub fn current_id(&self) -> Option<u32> {
        self.current_id
    }

    pub fn last_shown_id(&self) -> Option<u32> {
        self.last_shown_id
    }

    pub fn item_url(&self) -> &str {
        &self.item_url
    }

    pub fn photo_url(&self) -> &str {
        &self.photo_url
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn panel(&self) -> &PicturePanel {
        &self.panel
    }

    pub fn get_random_description(
        &mut self,
        ids: &mut impl IdSource,
        fetcher: &impl Fetch,
    ) -> Result<()> {
        let id = ids.next_id();
        self.load_description(id, fetcher)
    }

    /// Schedules `id` to be loaded by the next [`Session::load_queued_description`].
    pub fn queue_description(&mut self, id: u32) {
        self.queued_id = Some(id);
    }

    /// Loads the queued ID, if any. The queue is emptied whether or not the
    /// fetch succeeds.
    pub fn load_queued_description(&mut self, fetcher: &impl Fetch) -> Option<Result<()>> {
        let id = self.queued_id.take()?;
        Some(self.load_description(id, fetcher))
    }

    /// Makes `id` current and fetches its description.
    ///
    /// The ID and both URLs are updated before the request goes out, so on a
    /// network failure they still name the item that failed. The previous
    /// description is cleared in that case.
    pub fn load_description(&mut self, id: u32, fetcher: &impl Fetch) -> Result<()> {
        self.current_id = Some(id);
        self.item_url = self.config.item_url(id);
        self.photo_url = self.config.photo_url(id);
        self.description.clear();
        log::info!("Fetching description for item {id}");

        self.description = fetch_description(fetcher, &self.item_url)?;
        Ok(())
    }

    /// Reveals the image panel, fetching the image first unless it already
    /// holds the result for the current ID. A failed ID is not retried until
    /// a different ID becomes current.
    pub fn show_picture(&mut self, fetcher: &impl Fetch) -> ShowOutcome {
        if self.current_id == self.last_shown_id {
            self.panel.visible = true;
            return ShowOutcome::Reused;
        }

        self.last_shown_id = self.current_id;
        let label = self
            .current_id
            .map(|id| id.to_string())
            .unwrap_or_default();

        let content = match fetch_picture(fetcher, &self.photo_url) {
            Ok(Some(picture)) => PanelContent::Picture(picture),
            Ok(None) => PanelContent::Error(image_error_message(&label)),
            Err(err) => {
                log::warn!("Image for item {label} unavailable: {err:#}");
                PanelContent::Error(format!("{}\n{err:#}", image_error_message(&label)))
            }
        };
        self.panel.replace(format!("Item ID: {label}"), content);
        self.panel.visible = true;
        ShowOutcome::Fetched
    }

    pub fn hide_picture(&mut self) {
        self.panel.visible = false;
    }
}

fn image_error_message(label: &str) -> String {
    format!("Error: could not load ID {label} in the USC image viewer.")
}
