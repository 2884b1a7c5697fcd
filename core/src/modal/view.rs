use crate::modal::focus::ElementId;

/// One raw-detection line under the frame.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DetailRow {
    pub index: usize,
    pub text: String,
    pub truncatable: bool,
    pub expanded: bool,
}

/// Everything the modal needs to draw itself, derived from the controller
/// state after each transition. `open == false` means nothing is shown.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModalView {
    pub open: bool,
    pub title: String,
    /// `current / total`, 1-based; `0 / 0` when the class has no frames.
    pub counter: String,
    pub frame_name: Option<String>,
    /// Frame whose image is on screen. Lags `frame_name` while loading.
    pub displayed_frame: Option<String>,
    pub timestamp: Option<String>,
    pub zoom_level: f64,
    pub zoom_percent: u32,
    pub can_prev: bool,
    pub can_next: bool,
    pub can_zoom: bool,
    pub is_loading: bool,
    pub error: Option<String>,
    pub details: Vec<DetailRow>,
    pub focused: Option<ElementId>,
}
