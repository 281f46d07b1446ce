use std::path::Path;

use crate::backend::common::dtos::PreviewKind;

const IMAGE_EXTS: &[&str] = &["png", "jpg", "jpeg", "gif", "webp", "svg", "bmp", "ico"];
const MARKDOWN_EXTS: &[&str] = &["md", "markdown"];
const BINARY_EXTS: &[&str] = &[
    "exe", "dll", "so", "dylib", "bin", "o", "a", "class", "jar", "zip", "tar", "gz", "7z", "rar",
    "pdf", "doc", "docx", "xls", "xlsx", "ppt", "pptx", "mp3", "mp4", "mov", "avi", "mkv", "wav",
    "ttf", "otf", "woff", "woff2", "db", "sqlite",
];

/// Pure extension classification; never touches the filesystem.
pub(crate) fn detect(path: &str) -> PreviewKind {
    let ext = Path::new(path)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());
    let Some(ext) = ext else {
        return PreviewKind::Text;
    };
    if IMAGE_EXTS.contains(&ext.as_str()) {
        PreviewKind::Image
    } else if MARKDOWN_EXTS.contains(&ext.as_str()) {
        PreviewKind::Markdown
    } else if BINARY_EXTS.contains(&ext.as_str()) {
        PreviewKind::Unsupported
    } else {
        PreviewKind::Text
    }
}
