//! Custom request extractors.

mod form_data;

pub use form_data::{FormData, UploadedFile};
