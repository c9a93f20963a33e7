//! Admin-side editing of listings

pub mod form;
pub mod images;

pub use form::{FeatureField, FormError, PropertyForm, Step};
pub use images::{build_image_list, ImageError, ImageItem, ImageList, UploadPlan};
