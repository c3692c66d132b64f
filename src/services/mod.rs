//! Outbound collaborators: recording archive, Signal gateway, Slack webhook,
//! and Unsplash image lookup

pub mod recording_resolver;
pub mod signal_client;
pub mod slack_client;
pub mod unsplash_client;

pub use recording_resolver::{recording_reference, RecordingResolver};
pub use signal_client::{SignalClient, SignalError};
pub use slack_client::{SlackClient, SlackError};
pub use unsplash_client::{UnsplashClient, UnsplashError};
