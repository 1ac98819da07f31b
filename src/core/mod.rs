pub mod poller;
pub mod uploader;

pub use poller::{PollState, Poller, PollerEvent};
pub use uploader::{IMAGE_NAME, UploadError, UploadReport};
