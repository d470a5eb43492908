use crate::article::ArticleRecord;
use crate::error::AppError;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

const CSV_HEADER: [&str; 7] = ["source", "author", "title", "description", "url", "publishedAt", "content"];

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ExportFormat {
    Json,
    Csv,
}

impl ExportFormat {
    pub fn from_path(path: &Path) -> Result<Self, AppError> {
        match path.extension().and_then(|s| s.to_str()).map(|s| s.to_lowercase()).as_deref() {
            Some("json") => Ok(ExportFormat::Json),
            Some("csv") => Ok(ExportFormat::Csv),
            _ => Err(AppError::Input(format!(
                "cannot infer export format from {}, use .json or .csv",
                path.display()
            ))),
        }
    }
}

pub fn save_articles(articles: &[ArticleRecord], path: &Path) -> Result<(), AppError> {
    let format = ExportFormat::from_path(path)?;
    let mut writer = BufWriter::new(File::create(path)?);
    write_articles(articles, format, &mut writer)?;
    writer.flush()?;
    log::info!("Saved {} articles to {:?}", articles.len(), path);
    Ok(())
}

pub fn write_articles<W: Write>(
    articles: &[ArticleRecord],
    format: ExportFormat,
    writer: W,
) -> Result<(), AppError> {
    if articles.is_empty() {
        return Err(AppError::Input("There are no articles to save.".into()));
    }
    match format {
        ExportFormat::Json => serde_json::to_writer_pretty(writer, articles)?,
        ExportFormat::Csv => {
            let mut csv_writer = csv::Writer::from_writer(writer);
            csv_writer.write_record(CSV_HEADER)?;
            for article in articles {
                let optional = |value: &Option<String>| value.clone().unwrap_or_default();
                csv_writer.write_record([
                    article.source.clone(),
                    optional(&article.author),
                    article.title.clone(),
                    optional(&article.description),
                    article.url.clone(),
                    optional(&article.published_at),
                    optional(&article.content),
                ])?;
            }
            csv_writer.flush()?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn articles() -> Vec<ArticleRecord> {
        let mut api = ArticleRecord::link("Jane, again", "https://example.com/a", "Reuters");
        api.author = Some("A. Writer".into());
        vec![api, ArticleRecord::link("Second", "https://example.com/b", "Lovin Malta")]
    }

    #[test]
    fn csv_has_fixed_header_and_empty_optionals() {
        let mut out = Vec::new();
        write_articles(&articles(), ExportFormat::Csv, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines[0], "source,author,title,description,url,publishedAt,content");
        assert_eq!(lines[1], "Reuters,A. Writer,\"Jane, again\",,https://example.com/a,,");
        assert_eq!(lines[2], "Lovin Malta,,Second,,https://example.com/b,,");
    }

    #[test]
    fn json_round_trips_records() {
        let mut out = Vec::new();
        write_articles(&articles(), ExportFormat::Json, &mut out).unwrap();
        let parsed: Vec<ArticleRecord> = serde_json::from_slice(&out).unwrap();
        assert_eq!(parsed, articles());
    }

    #[test]
    fn nothing_to_save_is_refused() {
        let result = write_articles(&[], ExportFormat::Json, Vec::new());
        assert!(matches!(result, Err(AppError::Input(_))));
    }

    #[test]
    fn format_follows_extension() {
        assert_eq!(ExportFormat::from_path(Path::new("out.JSON")).unwrap(), ExportFormat::Json);
        assert_eq!(ExportFormat::from_path(Path::new("out.csv")).unwrap(), ExportFormat::Csv);
        assert!(ExportFormat::from_path(Path::new("out.txt")).is_err());
    }

    #[test]
    fn save_writes_the_file() {
        let temp_dir = tempfile::tempdir().expect("temp dir");
        let path = temp_dir.path().join("results.csv");
        save_articles(&articles(), &path).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("source,author,title"));
    }
}
