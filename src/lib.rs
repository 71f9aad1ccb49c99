// Library root
// -----------
// This crate exposes the upload client and its types; the binary
// (`main.rs`) wraps them in a terminal front end.
//
// Module responsibilities:
// - `api`: the blocking multipart upload client and its error mapping.
// - `analysis`: the two server response shapes and boundary validation.
// - `config`: injectable client configuration (file, env, builder).
// - `error`: the normalized `ClientError` taxonomy.
// - `image`: local image references, filename and MIME inference.
// - `ui`: interactive flows, result rendering and username persistence.
pub mod analysis;
pub mod api;
pub mod config;
pub mod error;
pub mod image;
pub mod ui;

pub use analysis::{AnalysisResult, ProductInfo, ResponseShape, ScoredAnalysis, Verdict};
pub use api::UploadClient;
pub use config::ClientConfig;
pub use error::{ClientError, ClientResult};
pub use image::{ImageReference, UploadKind};
