//! Download backends.
//!
//! Two strategies: the session-backed Instagram source (authenticated web
//! session, writes into the shared scratch directory) and the stateless
//! yt-dlp source (reports its own output path). The dispatcher picks one by
//! classified platform.

pub mod instagram;
pub mod ytdlp;

pub use instagram::{InstagramBackend, InstagramCredentials, InstagramSession, PostHandle, WebApiBackend};
pub use ytdlp::YtDlpSource;
