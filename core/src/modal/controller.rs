use crate::index::frame_order::format_timestamp;
use crate::index::ObjectIndex;
use crate::modal::detail::DetailText;
use crate::modal::focus::{ElementId, FocusDirection, FocusScope, FocusTrap, ModalControl};
use crate::modal::preload::{
    PreloadCompletion, PreloadOutcome, PreloadRequest, RequestTracker,
};
use crate::modal::view::{DetailRow, ModalView};
use crate::prelude::ViewerConfig;
use crate::telemetry::{LogManager, MetricsRecorder, PreloadMetrics};
use std::collections::BTreeSet;
use std::sync::Arc;

/// Message shown when the selected class has no frames.
pub const NO_FRAMES_MESSAGE: &str = "no frames for this class";

const DEFAULT_ZOOM: f64 = 1.0;

#[derive(Debug, Clone, Default, PartialEq)]
pub enum ModalState {
    #[default]
    Closed,
    Open(OpenState),
}

/// Fields that exist only while the modal is open.
#[derive(Debug, Clone, PartialEq)]
pub struct OpenState {
    pub selected_class: String,
    pub ordered_frames: Vec<String>,
    pub current_index: usize,
    pub zoom_level: f64,
    pub is_loading: bool,
    pub last_error: Option<String>,
    pub displayed_frame: Option<String>,
    pub expanded_details: BTreeSet<usize>,
}

impl OpenState {
    pub fn current_frame(&self) -> Option<&str> {
        self.ordered_frames
            .get(self.current_index)
            .map(String::as_str)
    }

    fn can_prev(&self) -> bool {
        !self.ordered_frames.is_empty() && self.current_index > 0
    }

    fn can_next(&self) -> bool {
        self.current_index + 1 < self.ordered_frames.len()
    }
}

/// Keys the modal reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavKey {
    Escape,
    ArrowLeft,
    ArrowRight,
    ZoomIn,
    ZoomOut,
    Tab,
    ShiftTab,
    Activate,
}

#[derive(Debug, Clone, PartialEq)]
pub enum KeyOutcome {
    Ignored,
    Navigated(Option<PreloadRequest>),
    Zoomed(f64),
    FocusMoved(Option<ElementId>),
    DetailToggled(usize),
    /// Modal closed; carries the element to refocus.
    Closed(Option<ElementId>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreloadDisposition {
    Applied,
    /// A newer request was issued, or the modal was closed, since this one.
    Stale,
}

/// Owns the modal: which class and frame are shown, at what zoom, and which
/// element has focus. All state changes go through its methods; rendering is
/// a projection of [`ModalNavigationController::view`].
///
/// Every transition that needs a new image returns a [`PreloadRequest`]. The
/// caller runs it and reports back through
/// [`complete_preload`](Self::complete_preload); only the most recently issued
/// request is applied.
pub struct ModalNavigationController {
    index: Arc<ObjectIndex>,
    config: ViewerConfig,
    state: ModalState,
    focus: FocusTrap,
    restore_focus: Option<ElementId>,
    tracker: RequestTracker,
    metrics: MetricsRecorder,
    logger: LogManager,
}

impl ModalNavigationController {
    pub fn new(index: Arc<ObjectIndex>, config: ViewerConfig) -> Self {
        Self {
            index,
            config: config.sanitized(),
            state: ModalState::Closed,
            focus: FocusTrap::new(),
            restore_focus: None,
            tracker: RequestTracker::default(),
            metrics: MetricsRecorder::new(),
            logger: LogManager::for_target("vistacore::modal"),
        }
    }

    /// Swaps in the index of a newly received manifest. An open modal is
    /// closed first, since its frames belong to the old index.
    pub fn load_index(&mut self, index: Arc<ObjectIndex>) -> Option<ElementId> {
        let restore = self.close();
        self.index = index;
        restore
    }

    pub fn index(&self) -> &ObjectIndex {
        &self.index
    }

    pub fn config(&self) -> &ViewerConfig {
        &self.config
    }

    pub fn state(&self) -> &ModalState {
        &self.state
    }

    pub fn is_open(&self) -> bool {
        matches!(self.state, ModalState::Open(_))
    }

    pub fn focused(&self) -> Option<ElementId> {
        self.focus.focused()
    }

    pub fn metrics(&self) -> PreloadMetrics {
        self.metrics.snapshot()
    }

    /// Opens the modal on `class`, replacing any session already open.
    ///
    /// `previously_focused` is the element to refocus on close; when the modal
    /// is already open the element recorded by the first open is kept.
    pub fn open<S: FocusScope + ?Sized>(
        &mut self,
        class: &str,
        scope: &S,
        previously_focused: Option<ElementId>,
    ) -> Option<PreloadRequest> {
        if !self.is_open() {
            self.restore_focus = previously_focused;
        }
        self.tracker.invalidate();

        let ordered_frames = self.index.ordered_frames(class);
        let last_error = if ordered_frames.is_empty() {
            Some(NO_FRAMES_MESSAGE.to_string())
        } else {
            None
        };
        self.logger.record(&format!(
            "opening class {} with {} frames",
            class,
            ordered_frames.len()
        ));
        self.state = ModalState::Open(OpenState {
            selected_class: class.to_string(),
            ordered_frames,
            current_index: 0,
            zoom_level: DEFAULT_ZOOM.clamp(self.config.min_zoom, self.config.max_zoom),
            is_loading: false,
            last_error,
            displayed_frame: None,
            expanded_details: BTreeSet::new(),
        });

        let view = self.view();
        self.focus.activate(scope, &view);
        self.begin_preload()
    }

    pub fn next(&mut self) -> Option<PreloadRequest> {
        match &mut self.state {
            ModalState::Open(open) if open.can_next() => open.current_index += 1,
            _ => return None,
        }
        self.begin_preload()
    }

    pub fn prev(&mut self) -> Option<PreloadRequest> {
        match &mut self.state {
            ModalState::Open(open) if open.can_prev() => open.current_index -= 1,
            _ => return None,
        }
        self.begin_preload()
    }

    /// Adds `delta` to the zoom, clamps it and snaps it to the zoom step.
    /// Returns the new level, or `None` while closed.
    pub fn set_zoom(&mut self, delta: f64) -> Option<f64> {
        let config = &self.config;
        let ModalState::Open(open) = &mut self.state else {
            return None;
        };
        if delta.is_finite() {
            let target = (open.zoom_level + delta).clamp(config.min_zoom, config.max_zoom);
            let snapped = (target / config.zoom_step).round() * config.zoom_step;
            open.zoom_level = snapped.clamp(config.min_zoom, config.max_zoom);
        }
        Some(open.zoom_level)
    }

    /// Closes the modal and returns the element that held focus before it
    /// opened. In-flight preloads become stale.
    pub fn close(&mut self) -> Option<ElementId> {
        if !self.is_open() {
            return None;
        }
        self.state = ModalState::Closed;
        self.tracker.invalidate();
        self.logger.trace("modal closed");
        self.focus.deactivate(self.restore_focus.take())
    }

    /// Applies a finished preload if it is still the latest request.
    pub fn complete_preload(&mut self, completion: PreloadCompletion) -> PreloadDisposition {
        let open = match &mut self.state {
            ModalState::Open(open) if self.tracker.is_current(completion.ticket) => open,
            _ => {
                self.metrics.record_stale();
                self.logger.trace(&format!(
                    "discarding stale preload #{} for {}",
                    completion.ticket.value(),
                    completion.frame_name
                ));
                return PreloadDisposition::Stale;
            }
        };

        open.is_loading = false;
        match completion.outcome {
            PreloadOutcome::Ready(image) => {
                open.displayed_frame = Some(image.frame_name);
                open.last_error = None;
                self.metrics.record_applied();
            }
            PreloadOutcome::Failed(reason) => {
                self.logger.warn(&format!(
                    "frame {} failed to load: {}",
                    completion.frame_name, reason
                ));
                open.last_error = Some(format!(
                    "could not load {}: {}",
                    completion.frame_name, reason
                ));
                self.metrics.record_failed();
            }
        }
        PreloadDisposition::Applied
    }

    /// Expands or collapses a long detail row of the current frame.
    pub fn toggle_detail(&mut self, row: usize) -> bool {
        let ModalState::Open(open) = &mut self.state else {
            return false;
        };
        let row_count = open
            .current_frame()
            .map(|frame| self.index.detections(&open.selected_class, frame).len())
            .unwrap_or(0);
        if row >= row_count {
            return false;
        }
        if !open.expanded_details.remove(&row) {
            open.expanded_details.insert(row);
        }
        true
    }

    pub fn handle_key(&mut self, key: NavKey) -> KeyOutcome {
        if !self.is_open() {
            return KeyOutcome::Ignored;
        }
        match key {
            NavKey::Escape => KeyOutcome::Closed(self.close()),
            NavKey::ArrowRight => KeyOutcome::Navigated(self.next()),
            NavKey::ArrowLeft => KeyOutcome::Navigated(self.prev()),
            NavKey::ZoomIn => self.zoom_outcome(self.config.zoom_step),
            NavKey::ZoomOut => self.zoom_outcome(-self.config.zoom_step),
            NavKey::Tab => KeyOutcome::FocusMoved(self.focus.cycle(FocusDirection::Forward)),
            NavKey::ShiftTab => KeyOutcome::FocusMoved(self.focus.cycle(FocusDirection::Backward)),
            NavKey::Activate => match self.focus.focused().and_then(ModalControl::from_id) {
                Some(control) => self.activate(control),
                None => KeyOutcome::Ignored,
            },
        }
    }

    /// Runs the action behind a modal control, as a click would.
    pub fn activate(&mut self, control: ModalControl) -> KeyOutcome {
        match control {
            ModalControl::Close => KeyOutcome::Closed(self.close()),
            ModalControl::Prev => KeyOutcome::Navigated(self.prev()),
            ModalControl::Next => KeyOutcome::Navigated(self.next()),
            ModalControl::ZoomOut => self.zoom_outcome(-self.config.zoom_step),
            ModalControl::ZoomIn => self.zoom_outcome(self.config.zoom_step),
            ModalControl::ToggleDetail(row) => {
                if self.toggle_detail(row) {
                    KeyOutcome::DetailToggled(row)
                } else {
                    KeyOutcome::Ignored
                }
            }
        }
    }

    /// Projection of the current state for rendering.
    pub fn view(&self) -> ModalView {
        let ModalState::Open(open) = &self.state else {
            return ModalView::default();
        };
        let frame_name = open.current_frame().map(str::to_string);
        let total = open.ordered_frames.len();
        let counter = if total == 0 {
            "0 / 0".to_string()
        } else {
            format!("{} / {}", open.current_index + 1, total)
        };
        let details = frame_name
            .as_deref()
            .map(|frame| self.detail_rows(open, frame))
            .unwrap_or_default();

        ModalView {
            open: true,
            title: open.selected_class.clone(),
            counter,
            timestamp: frame_name
                .as_deref()
                .map(|frame| format_timestamp(frame, self.config.frame_interval_seconds)),
            frame_name,
            displayed_frame: open.displayed_frame.clone(),
            zoom_level: open.zoom_level,
            zoom_percent: (open.zoom_level * 100.0).round() as u32,
            can_prev: open.can_prev(),
            can_next: open.can_next(),
            can_zoom: total > 0,
            is_loading: open.is_loading,
            error: open.last_error.clone(),
            details,
            focused: self.focus.focused(),
        }
    }

    fn detail_rows(&self, open: &OpenState, frame: &str) -> Vec<DetailRow> {
        self.index
            .detections(&open.selected_class, frame)
            .iter()
            .enumerate()
            .map(|(index, detection)| {
                let detail = DetailText::new(detection.raw_text(), self.config.detail_char_limit);
                let expanded = open.expanded_details.contains(&index);
                DetailRow {
                    index,
                    text: detail.display(expanded),
                    truncatable: detail.is_truncatable(),
                    expanded,
                }
            })
            .collect()
    }

    fn zoom_outcome(&mut self, delta: f64) -> KeyOutcome {
        match self.set_zoom(delta) {
            Some(level) => KeyOutcome::Zoomed(level),
            None => KeyOutcome::Ignored,
        }
    }

    /// Marks the current frame as loading and issues a ticket for it.
    fn begin_preload(&mut self) -> Option<PreloadRequest> {
        let ModalState::Open(open) = &mut self.state else {
            return None;
        };
        let frame_name = open.current_frame()?.to_string();
        open.is_loading = true;
        open.last_error = None;
        open.expanded_details.clear();
        self.metrics.record_issued();
        Some(PreloadRequest {
            ticket: self.tracker.issue(),
            frame_name,
        })
    }
}
