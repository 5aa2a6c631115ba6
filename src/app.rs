//! Central application state.
//!
//! `App` owns everything the event loop touches: the keyed query store,
//! the flattened feed snapshot, the favorite overlay, selection state, the
//! long-press tracker, per-cell thumbnail lifecycles, and the transient UI
//! overlays (alert, album modals, status line). Background tasks never
//! mutate it directly — they report through [`AppEvent`] and the loop
//! applies the result.

use crate::api::{Album, ApiError, FavoriteResponse, Feed, FeedApi};
use crate::config::Config;
use crate::feed::{FavoriteOverlay, PageData, QueryStore, SortType};
use crate::grid::GridLayout;
use crate::image::{CellTracker, ThumbnailCache, ThumbnailError};
use crate::theme::{StyleMap, ThemeVariant};
use ratatui::layout::Rect;
use ratatui::style::Style;
use std::borrow::Cow;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::time::{Duration, Instant};

/// Hold time that promotes a press into select mode.
pub const LONG_PRESS_DURATION: Duration = Duration::from_millis(800);

/// How long transient status messages stay on screen.
const STATUS_TTL: Duration = Duration::from_secs(5);

// ============================================================================
// Modes and Phases
// ============================================================================

/// Grid interaction mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    #[default]
    Default,
    Select,
}

/// Lifecycle of the paginated feed query as a whole.
///
/// A failed page load surfaces here as a full-screen error state — the
/// grid never renders partially over a failed fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedsPhase {
    Loading,
    Ready,
    Error(String),
}

/// Album overlays reachable from select mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AlbumModal {
    /// Title entry for a new album.
    Create { title: String },
    /// Picker over the cached album list; `selected` indexes into it.
    Add { selected: usize },
}

// ============================================================================
// Long-Press Tracker
// ============================================================================

/// State of one held press.
#[derive(Debug, Clone, Copy)]
pub struct PressState {
    pub started: Instant,
    /// Cell index under the press, when it began over the grid.
    pub cell: Option<usize>,
    /// The hold reached the threshold and already switched modes.
    pub fired: bool,
}

/// Scoped long-press timer state.
///
/// Every press bumps the generation; the spawned timer carries the
/// generation it was started under and its firing is ignored unless it
/// still matches. Release, leave, and teardown all bump the generation,
/// so no exit path can leak a live timer into a later press.
#[derive(Debug, Default)]
pub struct PressTracker {
    state: Option<PressState>,
    generation: u64,
}

impl PressTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Begin a press; returns the generation for the timer task.
    pub fn start(&mut self, now: Instant, cell: Option<usize>) -> u64 {
        self.generation = self.generation.wrapping_add(1);
        self.state = Some(PressState {
            started: now,
            cell,
            fired: false,
        });
        self.generation
    }

    /// The press reached the threshold. Returns the pressed cell when the
    /// generation still matches an active, unfired press.
    pub fn mark_fired(&mut self, generation: u64) -> Option<Option<usize>> {
        if generation != self.generation {
            return None;
        }
        match &mut self.state {
            Some(state) if !state.fired => {
                state.fired = true;
                Some(state.cell)
            }
            _ => None,
        }
    }

    /// End the press and invalidate any outstanding timer.
    pub fn release(&mut self) -> Option<PressState> {
        self.generation = self.generation.wrapping_add(1);
        self.state.take()
    }

    /// Abort the press (pointer left the grid, teardown).
    pub fn cancel(&mut self) {
        self.generation = self.generation.wrapping_add(1);
        self.state = None;
    }

    pub fn is_active(&self) -> bool {
        self.state.is_some()
    }
}

// ============================================================================
// Events from background tasks
// ============================================================================

pub enum AppEvent {
    /// A page response, stamped with the generation it was spawned under.
    PageLoaded {
        sort: SortType,
        generation: u64,
        page: usize,
        result: Result<PageData, ApiError>,
    },
    FavoriteToggled {
        feed_id: i64,
        result: Result<FavoriteResponse, ApiError>,
    },
    AlbumsLoaded {
        result: Result<Vec<Album>, ApiError>,
    },
    AlbumCreated {
        title: String,
        result: Result<i64, ApiError>,
    },
    PhotosAdded {
        album_id: i64,
        result: Result<(), ApiError>,
    },
    FeedsDeleted {
        count: usize,
        result: Result<(), ApiError>,
    },
    ThumbnailLoaded {
        feed_id: i64,
        result: Result<Vec<u8>, ThumbnailError>,
    },
    /// The long-press timer elapsed for the press generation given.
    LongPressFired { generation: u64 },
    /// A background task panicked.
    TaskPanicked { task: &'static str, error: String },
}

// ============================================================================
// Screen geometry for mouse mapping
// ============================================================================

/// Where the grid landed on screen last frame, for mouse → cell mapping.
#[derive(Debug, Clone, Copy)]
pub struct GridScreen {
    pub area: Rect,
    pub cell_width: u16,
    pub cell_height: u16,
    /// Grid row rendered at the top of `area`.
    pub first_row: usize,
}

impl GridScreen {
    /// Cell index under a terminal coordinate, if it falls on the grid.
    pub fn cell_at(&self, grid: &GridLayout, x: u16, y: u16) -> Option<usize> {
        if x < self.area.x
            || y < self.area.y
            || x >= self.area.x + self.area.width
            || y >= self.area.y + self.area.height
            || self.cell_width == 0
            || self.cell_height == 0
        {
            return None;
        }
        let col = usize::from((x - self.area.x) / self.cell_width);
        if col >= grid.columns {
            return None;
        }
        let row = self.first_row + usize::from((y - self.area.y) / self.cell_height);
        Some(grid.cell_index(row, col))
    }
}

// ============================================================================
// Application State
// ============================================================================

pub struct App {
    pub api: FeedApi,
    pub http_client: reqwest::Client,
    /// Origin of the local image proxy, e.g. `http://127.0.0.1:7700`.
    pub proxy_base: String,

    pub theme: StyleMap,

    // Data
    pub store: QueryStore,
    pub sort: SortType,
    pub phase: FeedsPhase,
    /// Flattened snapshot of the active collection, rebuilt after every
    /// accepted page. Arc so render and tasks share it without cloning.
    pub feeds: Arc<Vec<Feed>>,
    pub overlay: FavoriteOverlay,

    // Grid + scroll (scroll space is in grid units, not terminal rows)
    pub grid: GridLayout,
    pub scroll_offset: u64,
    /// Viewport height in grid units; updated during rendering.
    pub viewport_units: u32,
    pub cursor: usize,
    pub grid_screen: Option<GridScreen>,

    // Selection
    pub mode: Mode,
    pub selection: HashSet<i64>,
    pub press: PressTracker,
    /// Handle to the pending long-press timer, aborted on release/cancel.
    pub press_handle: Option<tokio::task::JoinHandle<()>>,

    // Thumbnails
    pub cells: CellTracker,
    pub thumbnails: ThumbnailCache,
    pub priority_cells: usize,

    // Overlays
    pub album_modal: Option<AlbumModal>,
    pub alert: Option<String>,
    pub status_message: Option<(Cow<'static, str>, Instant)>,

    pub needs_redraw: bool,
}

impl App {
    pub fn new(
        api: FeedApi,
        http_client: reqwest::Client,
        proxy_base: String,
        config: &Config,
    ) -> Self {
        let variant = ThemeVariant::from_str_name(&config.theme).unwrap_or(ThemeVariant::Dark);
        Self {
            api,
            http_client,
            proxy_base,
            theme: StyleMap::from_palette(&variant.palette()),
            store: QueryStore::new(),
            sort: SortType::default(),
            phase: FeedsPhase::Loading,
            feeds: Arc::new(Vec::new()),
            overlay: FavoriteOverlay::new(),
            grid: GridLayout::default(),
            scroll_offset: 0,
            viewport_units: 0,
            cursor: 0,
            grid_screen: None,
            mode: Mode::Default,
            selection: HashSet::new(),
            press: PressTracker::new(),
            press_handle: None,
            cells: CellTracker::new(),
            thumbnails: ThumbnailCache::new(config.thumbnail_cache_size),
            priority_cells: config.priority_cells,
            album_modal: None,
            alert: None,
            status_message: None,
            needs_redraw: true,
        }
    }

    // ------------------------------------------------------------------
    // Status and alerts
    // ------------------------------------------------------------------

    pub fn set_status(&mut self, message: impl Into<Cow<'static, str>>) {
        self.status_message = Some((message.into(), Instant::now()));
        self.needs_redraw = true;
    }

    /// Returns true when an expired status message was cleared.
    pub fn clear_expired_status(&mut self) -> bool {
        if let Some((_, shown_at)) = &self.status_message {
            if shown_at.elapsed() >= STATUS_TTL {
                self.status_message = None;
                return true;
            }
        }
        false
    }

    /// Raise the dismissible alert overlay — the surface for every
    /// mutation failure and batch-action outcome.
    pub fn open_alert(&mut self, message: impl Into<String>) {
        self.alert = Some(message.into());
        self.needs_redraw = true;
    }

    pub fn dismiss_alert(&mut self) {
        self.alert = None;
        self.needs_redraw = true;
    }

    // ------------------------------------------------------------------
    // Sort and collection snapshots
    // ------------------------------------------------------------------

    /// Switch sort modes: discard the cached collection, reset scroll and
    /// cells, and return the new generation for the page-0 request.
    pub fn set_sort(&mut self, sort: SortType) -> u64 {
        self.sort = sort;
        let generation = self.store.reset_feeds(sort);
        self.phase = FeedsPhase::Loading;
        self.feeds = Arc::new(Vec::new());
        self.overlay.clear();
        self.cells.clear();
        self.scroll_offset = 0;
        self.cursor = 0;
        self.needs_redraw = true;
        generation
    }

    /// Rebuild the flattened snapshot after the store accepted a page:
    /// reseed the overlay, drop cell state for departed feeds, and clamp
    /// the cursor.
    pub fn rebuild_feeds(&mut self) {
        let flattened = match self.store.feeds() {
            Some(query) => query.collection.flatten(),
            None => Vec::new(),
        };
        self.overlay.seed(flattened.iter());

        let ids: HashSet<i64> = flattened.iter().map(|f| f.id).collect();
        self.cells.retain(|id| ids.contains(&id));
        self.selection.retain(|id| ids.contains(id));

        self.feeds = Arc::new(flattened);
        if !self.feeds.is_empty() {
            self.cursor = self.cursor.min(self.feeds.len() - 1);
        } else {
            self.cursor = 0;
        }
        self.needs_redraw = true;
    }

    pub fn has_next_page(&self) -> bool {
        self.store.feeds().map(|q| q.has_next).unwrap_or(false)
    }

    pub fn is_fetching(&self) -> bool {
        self.store.feeds().map(|q| q.in_flight).unwrap_or(false)
    }

    /// Effective favorite flag for a feed (overlay wins over fetched data).
    pub fn is_favorite(&self, feed: &Feed) -> bool {
        self.overlay.is_favorite(feed)
    }

    // ------------------------------------------------------------------
    // Selection mode
    // ------------------------------------------------------------------

    pub fn enter_select_mode(&mut self) {
        self.mode = Mode::Select;
        self.needs_redraw = true;
    }

    /// Leave select mode. The selection is always cleared with it, which
    /// keeps "selection empty whenever mode is Default" unconditional.
    pub fn exit_select_mode(&mut self) {
        self.mode = Mode::Default;
        self.selection.clear();
        self.needs_redraw = true;
    }

    pub fn toggle_select_mode(&mut self) {
        match self.mode {
            Mode::Default => self.enter_select_mode(),
            Mode::Select => self.exit_select_mode(),
        }
    }

    pub fn toggle_selection(&mut self, feed_id: i64) {
        if !self.selection.insert(feed_id) {
            self.selection.remove(&feed_id);
        }
        self.needs_redraw = true;
    }

    /// Selected ids in ascending order, for stable request bodies.
    pub fn selection_sorted(&self) -> Vec<i64> {
        let mut ids: Vec<i64> = self.selection.iter().copied().collect();
        ids.sort_unstable();
        ids
    }

    /// Close any album modal and return to default mode, clearing the
    /// selection — the outcome shared by batch success, batch failure,
    /// and modal cancellation.
    pub fn finish_batch_action(&mut self) {
        self.album_modal = None;
        self.exit_select_mode();
    }

    // ------------------------------------------------------------------
    // Cursor and scroll
    // ------------------------------------------------------------------

    pub fn cursor_feed(&self) -> Option<&Feed> {
        self.feeds.get(self.cursor)
    }

    pub fn move_cursor_by(&mut self, delta: isize) {
        if self.feeds.is_empty() {
            return;
        }
        let last = self.feeds.len() as isize - 1;
        let next = (self.cursor as isize + delta).clamp(0, last);
        self.cursor = next as usize;
        self.ensure_cursor_visible();
        self.needs_redraw = true;
    }

    pub fn cursor_home(&mut self) {
        self.cursor = 0;
        self.ensure_cursor_visible();
        self.needs_redraw = true;
    }

    pub fn cursor_end(&mut self) {
        if !self.feeds.is_empty() {
            self.cursor = self.feeds.len() - 1;
            self.ensure_cursor_visible();
            self.needs_redraw = true;
        }
    }

    /// Scroll so the cursor's row is inside the viewport.
    pub fn ensure_cursor_visible(&mut self) {
        if self.viewport_units == 0 {
            return;
        }
        let (row, _) = self.grid.cell_position(self.cursor);
        let top = self.grid.row_offset(row);
        let bottom = top + u64::from(self.grid.cell_size);
        let view_bottom = self.scroll_offset + u64::from(self.viewport_units);

        if top < self.scroll_offset {
            self.scroll_offset = top;
        } else if bottom > view_bottom {
            self.scroll_offset = bottom.saturating_sub(u64::from(self.viewport_units));
        }
        self.scroll_offset =
            self.grid
                .clamp_scroll(self.scroll_offset, self.feeds.len(), self.viewport_units);
    }

    pub fn scroll_by(&mut self, delta: i64) {
        let proposed = if delta.is_negative() {
            self.scroll_offset.saturating_sub(delta.unsigned_abs())
        } else {
            self.scroll_offset.saturating_add(delta as u64)
        };
        self.scroll_offset = self
            .grid
            .clamp_scroll(proposed, self.feeds.len(), self.viewport_units);
        self.needs_redraw = true;
    }

    /// Whether the given cell loads eagerly, skipping the proximity gate.
    pub fn is_priority_cell(&self, index: usize) -> bool {
        index < self.priority_cells
    }

    // ------------------------------------------------------------------
    // Long press plumbing
    // ------------------------------------------------------------------

    /// Abort the pending long-press timer task, if any.
    pub fn abort_press_timer(&mut self) {
        if let Some(handle) = self.press_handle.take() {
            handle.abort();
        }
    }

    pub fn style(&self, role: &str) -> Style {
        self.theme.resolve(role)
    }
}
