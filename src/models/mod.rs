pub mod analytics;
pub mod upload;
pub mod user;

pub use analytics::Analytics;
pub use upload::{AnalysisResult, PresignedUpload, Sentiment, Upload, UploadStatus};
pub use user::{NewUser, User, UserChanges};
