pub mod metrics;
pub mod providers;
pub mod tutor;

pub use metrics::{get_metrics, init_metrics};
pub use providers::{CompletionProvider, ProviderError};
pub use tutor::{TutorError, TutorService, PROGRESS_BOOST};
