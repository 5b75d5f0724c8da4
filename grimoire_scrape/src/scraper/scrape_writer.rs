use super::{Article, ScrapeError};
use grimoire::OutputLayout;
use std::{
    fs::{self, File},
    io::Write,
    path::{Path, PathBuf},
};

/// Makes sure every category has a folder to save into. Folders that already exist are left
/// alone, so this can be run any number of times.
pub fn provision_folders(
    layout: &OutputLayout,
    categories: &[String],
) -> Result<Vec<PathBuf>, ScrapeError> {
    let mut folders = Vec::with_capacity(categories.len());

    for category in categories {
        let folder = layout.category_dir(category);
        fs::create_dir_all(&folder).map_err(|source| io_error(&folder, source))?;
        tracing::info!(folder = %folder.display(), "folder ready");
        folders.push(folder);
    }

    Ok(folders)
}

/// The text saved for an article
pub fn format_article(article: &Article) -> String {
    format!("Title: {}\n\n{}", article.title, article.body)
}

/// Saves an article into its category's folder, replacing anything saved there before under
/// the same title
pub fn write_article(
    layout: &OutputLayout,
    category: &str,
    article: &Article,
) -> Result<PathBuf, ScrapeError> {
    let path = layout.article_path(category, &article.title);

    let mut file = File::create(&path).map_err(|source| io_error(&path, source))?;
    file.write_all(format_article(article).as_bytes())
        .map_err(|source| io_error(&path, source))?;

    Ok(path)
}

fn io_error(path: &Path, source: std::io::Error) -> ScrapeError {
    ScrapeError::Io {
        path: path.to_path_buf(),
        source,
    }
}
