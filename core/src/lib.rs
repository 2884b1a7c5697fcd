//! Core of the VISTA detection browser.
//!
//! Turns a per-frame detection manifest into a class index and drives the
//! modal frame viewer: navigation, zoom, focus trapping and the image preload
//! handshake. Rendering is left to the caller, which projects the controller
//! state through [`modal::ModalView`].

pub mod index;
pub mod manifest;
pub mod modal;
pub mod prelude;
pub mod telemetry;

pub use index::{DetectionIndexBuilder, ObjectIndex, Summary};
pub use manifest::{Detection, DetectionManifest, FrameRecord};
pub use modal::{ModalNavigationController, ModalView};
pub use prelude::{ViewerConfig, ViewerError, ViewerResult};
