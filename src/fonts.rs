//! Font discovery for the result image.
//!
//! Encodes where fonts usually live as named constants, then walks those
//! directories once and picks the best-ranked face present.
//!
//! Structure:
//! - Constants: preferred font files, system font directories
//! - Pure functions: ranking
//! - Effect functions: filesystem search

use std::collections::HashMap;
use std::path::PathBuf;

use walkdir::WalkDir;

// ============================================================================
// CONSTANTS
// ============================================================================

/// Font files in order of preference.
///
/// Hangul-capable faces come first since labels and prices are Korean.
/// DejaVu is the last resort: Latin text still renders, Hangul becomes boxes.
pub const PREFERRED_FONTS: &[&str] = &[
    "NanumGothic.ttf",
    "NanumBarunGothic.ttf",
    "NotoSansCJK-Regular.ttc",
    "NotoSansCJKkr-Regular.otf",
    "NotoSansKR-Regular.otf",
    "NotoSansKR-Regular.ttf",
    "AppleSDGothicNeo.ttc",
    "AppleGothic.ttf",
    "malgun.ttf",
    "DejaVuSans.ttf",
];

/// System-wide font directories, searched after the user font dir.
pub const SYSTEM_FONT_DIRS: &[&str] = &[
    "/usr/share/fonts",
    "/usr/local/share/fonts",
    "/Library/Fonts",
    "/System/Library/Fonts",
    "C:\\Windows\\Fonts",
];

/// Font trees nest vendor/family folders; this is deep enough for all of them.
const MAX_SEARCH_DEPTH: usize = 4;

// ============================================================================
// PURE FUNCTIONS
// ============================================================================

/// Rank of a font file name in [`PREFERRED_FONTS`], lower is better.
pub fn preference_rank(file_name: &str) -> Option<usize> {
    PREFERRED_FONTS
        .iter()
        .position(|f| f.eq_ignore_ascii_case(file_name))
}

/// Pick the best-ranked font among found `(rank → path)` entries.
pub fn pick_best(found: &HashMap<usize, PathBuf>) -> Option<PathBuf> {
    found
        .iter()
        .min_by_key(|(rank, _)| **rank)
        .map(|(_, path)| path.clone())
}

// ============================================================================
// EFFECT FUNCTIONS
// ============================================================================

/// Directories to search, user font dir first.
pub fn search_dirs() -> Vec<PathBuf> {
    let mut dirs_out = Vec::new();
    if let Some(user) = dirs::font_dir() {
        dirs_out.push(user);
    }
    dirs_out.extend(SYSTEM_FONT_DIRS.iter().map(PathBuf::from));
    dirs_out
}

/// Search the given directories for a preferred font.
///
/// Unreadable or missing directories are skipped.
pub fn find_font_in(dirs_to_search: &[PathBuf]) -> Option<PathBuf> {
    let mut found: HashMap<usize, PathBuf> = HashMap::new();

    for root in dirs_to_search.iter().filter(|d| d.is_dir()) {
        let entries = WalkDir::new(root)
            .max_depth(MAX_SEARCH_DEPTH)
            .follow_links(true)
            .into_iter()
            .filter_map(Result::ok)
            .filter(|e| e.file_type().is_file());

        for entry in entries {
            let Some(name) = entry.file_name().to_str() else {
                continue;
            };
            if let Some(rank) = preference_rank(name) {
                // First hit per rank wins; dirs are in priority order.
                found.entry(rank).or_insert_with(|| entry.path().to_path_buf());
            }
        }
    }

    pick_best(&found)
}

/// Locate a font on this machine.
pub fn discover_font() -> Option<PathBuf> {
    let font = find_font_in(&search_dirs());
    match &font {
        Some(path) => tracing::debug!(font = %path.display(), "font discovered"),
        None => tracing::warn!("no usable font found in system font directories"),
    }
    font
}

// ============================================================================
// TESTS
// ============================================================================
