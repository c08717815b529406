//! Media processing: WAV clips, duration reconciliation, ffmpeg-backed
//! video operations and final composition.

pub mod clip;
pub mod compose;
pub mod ffmpeg;
pub mod reconcile;
pub mod video;

pub use clip::AudioClip;
pub use compose::{ComposeInputs, MediaComposer};
pub use ffmpeg::{CommandRunner, MockCommandRunner, SystemCommandRunner};
pub use reconcile::{ReconcilePlan, plan, reconcile_clip};
pub use video::CaptionPosition;
