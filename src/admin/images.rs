//! Image staging for the property edit form.
//!
//! Existing images are only soft-deleted so the backend can be told which
//! URLs to drop; new images are local files that have not been uploaded yet.
//! Nothing here touches the network: [`ImageList::diff`] turns the staged
//! state into an [`UploadPlan`] at submit time.

use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use url::Url;

pub const DEFAULT_MAX_FILES: usize = 10;

const ACCEPTED_EXTENSIONS: [&str; 4] = ["jpeg", "jpg", "png", "webp"];

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ImageError {
    #[error("Límite de imágenes excedido (máximo {max})")]
    LimitExceeded { max: usize },
    #[error("unsupported image file {0:?} (expected jpeg, jpg, png or webp)")]
    Unsupported(PathBuf),
    #[error("no image at position {0}")]
    OutOfRange(usize),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageItem {
    /// Remote URL for existing images, `file://` preview for new ones
    pub url: String,
    pub file: Option<PathBuf>,
    pub is_new: bool,
    pub deleted: bool,
}

impl ImageItem {
    pub fn existing(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            file: None,
            is_new: false,
            deleted: false,
        }
    }

    fn staged(path: PathBuf) -> Self {
        Self {
            url: preview_url(&path),
            file: Some(path),
            is_new: true,
            deleted: false,
        }
    }
}

/// What the submit step sends to the backend
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UploadPlan {
    /// New local files, in display order
    pub files: Vec<PathBuf>,
    /// Existing URLs the admin removed
    pub deleted_urls: Vec<String>,
    /// Existing URLs still shown, in display order
    pub kept_urls: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageList {
    items: Vec<ImageItem>,
    max_files: usize,
}

impl Default for ImageList {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_FILES)
    }
}

/// Stage a listing's current images as existing entries
pub fn build_image_list(urls: &[String]) -> ImageList {
    let mut list = ImageList::default();
    list.items = urls.iter().map(ImageItem::existing).collect();
    list
}

impl ImageList {
    pub fn new(max_files: usize) -> Self {
        Self {
            items: Vec::new(),
            max_files,
        }
    }

    pub fn with_max_files(mut self, max_files: usize) -> Self {
        self.max_files = max_files;
        self
    }

    pub fn max_files(&self) -> usize {
        self.max_files
    }

    /// Every entry, deleted ones included
    pub fn items(&self) -> &[ImageItem] {
        &self.items
    }

    pub fn visible(&self) -> impl Iterator<Item = &ImageItem> {
        self.items.iter().filter(|i| !i.deleted)
    }

    pub fn visible_count(&self) -> usize {
        self.visible().count()
    }

    /// The image shown first on the listing
    pub fn primary(&self) -> Option<&ImageItem> {
        self.visible().next()
    }

    pub fn can_add_more(&self) -> bool {
        self.visible_count() < self.max_files
    }

    /// Position in `items` of the `index`-th visible entry
    fn slot_of_visible(&self, index: usize) -> Option<usize> {
        self.items
            .iter()
            .enumerate()
            .filter(|(_, item)| !item.deleted)
            .nth(index)
            .map(|(slot, _)| slot)
    }

    /// Stage local files; the whole batch is rejected if any file is unsupported
    /// or the batch would exceed the limit
    pub fn add_files<I, P>(&mut self, paths: I) -> Result<usize, ImageError>
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        let paths: Vec<PathBuf> = paths.into_iter().map(Into::into).collect();

        if let Some(bad) = paths.iter().find(|p| !is_accepted(p)) {
            return Err(ImageError::Unsupported(bad.clone()));
        }
        if self.visible_count() + paths.len() > self.max_files {
            warn!("Image limit exceeded: {} staged, {} more", self.visible_count(), paths.len());
            return Err(ImageError::LimitExceeded {
                max: self.max_files,
            });
        }

        let added = paths.len();
        self.items.extend(paths.into_iter().map(ImageItem::staged));
        debug!("Staged {} new images", added);
        Ok(added)
    }

    /// Remove the `index`-th visible image: new ones vanish, existing ones are marked deleted
    pub fn remove(&mut self, index: usize) -> Result<(), ImageError> {
        let slot = self
            .slot_of_visible(index)
            .ok_or(ImageError::OutOfRange(index))?;

        if self.items[slot].is_new {
            self.items.remove(slot);
        } else {
            self.items[slot].deleted = true;
        }
        Ok(())
    }

    /// Move a visible image; deleted entries are regrouped at the end.
    /// Returns `false` when nothing moved.
    pub fn reorder(&mut self, from: usize, to: usize) -> bool {
        let visible = self.visible_count();
        if from == to || from >= visible || to >= visible {
            return false;
        }

        let (mut shown, deleted): (Vec<ImageItem>, Vec<ImageItem>) =
            std::mem::take(&mut self.items).into_iter().partition(|i| !i.deleted);

        let moved = shown.remove(from);
        shown.insert(to, moved);
        shown.extend(deleted);
        self.items = shown;
        true
    }

    /// Drop every new image and mark every existing one deleted
    pub fn remove_all(&mut self) {
        self.items.retain(|i| !i.is_new);
        for item in &mut self.items {
            item.deleted = true;
        }
    }

    pub fn diff(&self) -> UploadPlan {
        let mut plan = UploadPlan::default();
        for item in &self.items {
            match (item.is_new, item.deleted) {
                (true, _) => plan.files.extend(item.file.clone()),
                (false, true) => plan.deleted_urls.push(item.url.clone()),
                (false, false) => plan.kept_urls.push(item.url.clone()),
            }
        }
        plan
    }
}

fn is_accepted(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| ACCEPTED_EXTENSIONS.iter().any(|a| a.eq_ignore_ascii_case(e)))
        .unwrap_or(false)
}

fn preview_url(path: &Path) -> String {
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .map(|cwd| cwd.join(path))
            .unwrap_or_else(|_| path.to_path_buf())
    };
    Url::from_file_path(&absolute)
        .map(String::from)
        .unwrap_or_else(|_| format!("file://{}", absolute.display()))
}
