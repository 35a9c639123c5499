use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;

use super::parse::parse_token_feed;
use super::token::TokenFeed;

pub fn load_token_feed(path: &Path) -> Result<TokenFeed> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read token feed {}", path.display()))?;

    let records = parse_token_feed(&raw)
        .with_context(|| format!("failed to parse token feed {}", path.display()))?;

    info!(
        source = %path.display(),
        tokens = records.len(),
        "loaded token feed"
    );

    Ok(TokenFeed {
        source: path.display().to_string(),
        records,
    })
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    fn scratch_file(name: &str, contents: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!(
            "risk-bubbles-{}-{name}.json",
            std::process::id()
        ));
        fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn loads_records_from_disk() {
        let path = scratch_file(
            "feed",
            r#"{"tokens":[{"symbol":"ETH","risk":22},{"symbol":"PEPE","risk":91}]}"#,
        );

        let feed = load_token_feed(&path).unwrap();
        assert_eq!(feed.len(), 2);
        assert_eq!(feed.source, path.display().to_string());

        fs::remove_file(path).unwrap();
    }

    #[test]
    fn missing_file_reports_the_path() {
        let path = std::env::temp_dir().join("risk-bubbles-does-not-exist.json");
        let error = load_token_feed(&path).unwrap_err();
        assert!(format!("{error:#}").contains("risk-bubbles-does-not-exist.json"));
    }
}
