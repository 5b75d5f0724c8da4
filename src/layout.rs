use crate::{Config, FOLDER_SUFFIX};
use lazy_static::lazy_static;
use regex::Regex;
use std::path::{Path, PathBuf};

lazy_static! {
    // Characters which are either path separators or reserved on some file system
    static ref UNSAFE_FILENAME_CHARS: Regex =
        Regex::new(r#"[/\\:*?"<>|\x00-\x1F\x7F]"#).expect("hardcoded regex, shouldn't fail");
}

/// Stem used when a title has nothing usable left after sanitizing
pub const UNTITLED: &str = "untitled";

/// Where harvested articles end up on disk
#[derive(Debug, Clone)]
pub struct OutputLayout {
    output_dir: PathBuf,
}

impl OutputLayout {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        OutputLayout {
            output_dir: output_dir.into(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.output_dir.clone())
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// The `<category>_data` folder for a category
    pub fn category_dir(&self, category: &str) -> PathBuf {
        self.output_dir.join(format!("{}{}", category, FOLDER_SUFFIX))
    }

    /// The file an article with this title is saved to
    pub fn article_path(&self, category: &str, title: &str) -> PathBuf {
        self.category_dir(category)
            .join(format!("{}.txt", sanitize_title(title)))
    }
}

/// Turns an article title into something that can be used as a file name.
///
/// Path separators, characters reserved on common file systems and control characters are
/// replaced with `_`. Surrounding whitespace and trailing dots are removed, and a title with
/// nothing left becomes [`UNTITLED`].
pub fn sanitize_title(title: &str) -> String {
    let replaced = UNSAFE_FILENAME_CHARS.replace_all(title, "_");
    let trimmed = replaced.trim().trim_end_matches('.').trim_end();

    if trimmed.is_empty() {
        String::from(UNTITLED)
    } else {
        String::from(trimmed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_titles_are_unchanged() {
        assert_eq!(sanitize_title("Fireball"), "Fireball");
        assert_eq!(sanitize_title("Tasha's Hideous Laughter"), "Tasha's Hideous Laughter");
        assert_eq!(sanitize_title("Bigby's Hand (UA)"), "Bigby's Hand (UA)");
    }

    #[test]
    fn unsafe_characters_are_replaced() {
        assert_eq!(sanitize_title("Fire/Ball: Redux?"), "Fire_Ball_ Redux_");
        assert_eq!(sanitize_title(r#"a\b*c"d<e>f|g"#), "a_b_c_d_e_f_g");
        assert_eq!(sanitize_title("tab\there"), "tab_here");
    }

    #[test]
    fn traversal_cannot_escape_the_folder() {
        assert_eq!(sanitize_title("../../etc/passwd"), ".._.._etc_passwd");
        assert_eq!(sanitize_title(".."), UNTITLED);
    }

    #[test]
    fn empty_titles_get_a_name() {
        assert_eq!(sanitize_title(""), UNTITLED);
        assert_eq!(sanitize_title("   "), UNTITLED);
        assert_eq!(sanitize_title("Wish. "), "Wish");
    }

    #[test]
    fn paths() {
        let layout = OutputLayout::new("/tmp/harvest");
        assert_eq!(
            layout.category_dir("racial-feats"),
            PathBuf::from("/tmp/harvest/racial-feats_data")
        );
        assert_eq!(
            layout.article_path("spells", "Fireball"),
            PathBuf::from("/tmp/harvest/spells_data/Fireball.txt")
        );
    }
}
