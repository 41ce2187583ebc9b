//! Import movies command handler

use anyhow::Context;
use std::path::Path;

use crate::api::MovieRequest;
use crate::api::validation::validate_movie;
use crate::config::Config;
use crate::db::{Store, StoreError};

#[derive(Debug, Default, PartialEq, Eq)]
struct ImportSummary {
    imported: usize,
    skipped: Vec<String>,
    invalid: Vec<(usize, String)>,
}

pub async fn cmd_import_movies(config: &Config, file: &Path) -> anyhow::Result<()> {
    let content = tokio::fs::read_to_string(file)
        .await
        .with_context(|| format!("Failed to read {}", file.display()))?;
    let entries: Vec<MovieRequest> = serde_json::from_str(&content)
        .with_context(|| format!("{} is not a JSON array of movies", file.display()))?;

    let store = Store::new(&config.general.database_path).await?;
    let summary = import(&store, &entries).await?;

    println!("Imported {} movie(s)", summary.imported);
    if !summary.skipped.is_empty() {
        println!("Skipped {} already present:", summary.skipped.len());
        for id in &summary.skipped {
            println!("  - tmdbId {id}");
        }
    }
    for (index, reason) in &summary.invalid {
        println!("  ✗ entry #{index}: {reason}");
    }

    Ok(())
}

async fn import(store: &Store, entries: &[MovieRequest]) -> anyhow::Result<ImportSummary> {
    let mut summary = ImportSummary::default();

    for (index, entry) in entries.iter().enumerate() {
        let movie = match validate_movie(entry) {
            Ok(movie) => movie,
            Err(e) => {
                summary.invalid.push((index, e.to_string()));
                continue;
            }
        };

        match store.insert_movie(&movie).await {
            Ok(_) => summary.imported += 1,
            Err(StoreError::Duplicate(_)) => summary.skipped.push(movie.tmdb_id),
            Err(e) => return Err(anyhow::anyhow!(e).context("Failed to insert movie")),
        }
    }

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_import_skips_duplicates_and_invalid_entries() {
        let store = Store::new("sqlite::memory:").await.unwrap();
        let entries: Vec<MovieRequest> = serde_json::from_str(
            r#"[
                {"tmdbId": "1", "title": "A", "description": "d", "videoUrl": "v", "posterPath": "p", "genre": ["Drama"], "type": ["movie"]},
                {"tmdbId": 1, "title": "A again", "description": "d", "videoUrl": "v", "posterPath": "p", "genre": ["Drama"], "type": ["movie"]},
                {"title": "No id"}
            ]"#,
        )
        .unwrap();

        let summary = import(&store, &entries).await.unwrap();
        assert_eq!(summary.imported, 1);
        assert_eq!(summary.skipped, vec!["1".to_string()]);
        assert_eq!(summary.invalid.len(), 1);
        assert_eq!(summary.invalid[0].0, 2);

        assert_eq!(store.get_movie("1").await.unwrap().unwrap().title, "A");
    }
}
