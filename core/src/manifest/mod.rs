pub mod api;
pub mod detection;
pub mod paths;

pub use api::{
    ConflictResponse, ErrorResponse, ProcessRequest, ProcessResponse, ResultUrls, SummaryPayload,
    VideoMetadata,
};
pub use detection::{Detection, DetectionManifest, FrameRecord, RawDetection, UNKNOWN_CLASS};
pub use paths::ResultPaths;
