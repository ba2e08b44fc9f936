//! Folio external service clients
//!
//! Google credentials and the Document AI layout extractor used by the
//! upload pipeline.

pub mod auth;
pub mod document_ai;

pub use auth::{
    create_token_provider, AccessTokenProvider, AuthError, MetadataServerTokenProvider,
    StaticTokenProvider,
};
pub use document_ai::{DocumentAiClient, ExtractError, LayoutExtractor};
