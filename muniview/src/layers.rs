use std::path::PathBuf;

use anyhow::Result;

use crate::download;

/// Where layer GeoJSON comes from. Each layer lives at `<base>/<name>.json`,
/// whether the base is a local directory or an http(s) URL.
#[derive(Clone)]
pub enum LayerSource {
    Dir(PathBuf),
    Url(String),
}

impl LayerSource {
    pub fn new(base: &str) -> LayerSource {
        if base.starts_with("http://") || base.starts_with("https://") {
            LayerSource::Url(base.trim_end_matches('/').to_string())
        } else {
            LayerSource::Dir(PathBuf::from(base))
        }
    }

    pub fn describe(&self, name: &str) -> String {
        match self {
            LayerSource::Url(base) => format!("{}/{}.json", base, name),
            LayerSource::Dir(dir) => dir.join(format!("{}.json", name)).display().to_string(),
        }
    }

    pub async fn fetch(&self, name: &str) -> Result<Vec<u8>> {
        match self {
            LayerSource::Url(base) => {
                download::download_bytes(format!("{}/{}.json", base, name)).await
            }
            LayerSource::Dir(dir) => Ok(fs_err::read(dir.join(format!("{}.json", name)))?),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bases_classify_by_scheme() {
        assert!(matches!(LayerSource::new("res"), LayerSource::Dir(_)));
        assert!(matches!(
            LayerSource::new("/var/maps/sf"),
            LayerSource::Dir(_)
        ));
        match LayerSource::new("https://example.com/sfmaps/") {
            LayerSource::Url(base) => assert_eq!(base, "https://example.com/sfmaps"),
            LayerSource::Dir(_) => panic!("expected a URL"),
        }
    }

    #[test]
    fn urls_point_at_layer_files() {
        let source = LayerSource::new("https://example.com/sfmaps");
        assert_eq!(
            source.describe("arteries"),
            "https://example.com/sfmaps/arteries.json"
        );
    }

    #[tokio::test]
    async fn directories_read_layer_files() {
        let dir = tempfile::TempDir::new().unwrap();
        fs_err::write(dir.path().join("freeways.json"), b"{}").unwrap();

        let source = LayerSource::new(dir.path().to_str().unwrap());
        assert_eq!(source.fetch("freeways").await.unwrap(), b"{}".to_vec());
        assert!(source.fetch("arteries").await.is_err());
    }
}
