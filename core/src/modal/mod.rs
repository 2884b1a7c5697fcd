pub mod controller;
pub mod detail;
pub mod focus;
pub mod preload;
pub mod view;

pub use controller::{
    KeyOutcome, ModalNavigationController, ModalState, NavKey, OpenState, PreloadDisposition,
    NO_FRAMES_MESSAGE,
};
pub use detail::DetailText;
pub use focus::{ElementId, FocusDirection, FocusScope, FocusTrap, ModalControl, StandardScope};
pub use preload::{
    FrameImage, FramePreloader, PreloadCompletion, PreloadOutcome, PreloadRequest, PreloadTicket,
    RequestTracker,
};
pub use view::{DetailRow, ModalView};
