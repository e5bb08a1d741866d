use crate::error::ApiError;
use crate::source::{ImageFetcher, MatchInput, ResolvedInput};
use crate::tagger::Tagger;
use serde::Serialize;
use std::sync::Arc;
use tagmatch_core::{Catalog, Tag};
use tagmatch_similarity::{rank, RankParams, ScoredProduct};
use tracing::{debug, info};

/// Successful match response body
#[derive(Debug, Serialize)]
pub struct MatchResponse<'a> {
    pub tags: Vec<Tag>,
    pub matches: Vec<ScoredProduct<'a>>,
    pub rate_limit_remaining: Option<u64>,
}

/// Runs one match request: validate, fetch, extract tags, rank.
///
/// Any stage failing ends the request; nothing is retried.
pub struct Matcher {
    catalog: Arc<Catalog>,
    tagger: Arc<dyn Tagger>,
    fetcher: Arc<dyn ImageFetcher>,
}

impl Matcher {
    pub fn new(
        catalog: Arc<Catalog>,
        tagger: Arc<dyn Tagger>,
        fetcher: Arc<dyn ImageFetcher>,
    ) -> Self {
        Self {
            catalog,
            tagger,
            fetcher,
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub async fn run(
        &self,
        input: MatchInput,
        params: RankParams,
    ) -> Result<MatchResponse<'_>, ApiError> {
        let source = match input.resolve()? {
            ResolvedInput::Upload(source) => source,
            ResolvedInput::Url(url) => self.fetcher.fetch(&url).await?,
        };

        let extraction = self.tagger.tag(&source).await?;
        debug!("Extracted tags: {:?}", extraction.tags);

        let matches = rank(&extraction.tags, self.catalog.products(), &params);
        info!(
            "Matched {} ({} tags) against {} products: {} matches (threshold {}, limit {})",
            source.filename(),
            extraction.tags.len(),
            self.catalog.len(),
            matches.len(),
            params.threshold,
            params.limit
        );

        Ok(MatchResponse {
            tags: extraction.tags,
            matches,
            rate_limit_remaining: extraction.rate_limit_remaining,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::{FetchError, ImageSource};
    use crate::testing::{sample_catalog, RecordingFetcher, RecordingTagger};
    use bytes::Bytes;

    fn matcher(tagger: &Arc<RecordingTagger>, fetcher: &Arc<RecordingFetcher>) -> Matcher {
        Matcher::new(
            Arc::new(sample_catalog()),
            tagger.clone(),
            fetcher.clone(),
        )
    }

    fn upload() -> ImageSource {
        ImageSource::upload("cat.jpg", Some("image/jpeg"), Bytes::from_static(b"jpeg"))
    }

    #[actix_web::test]
    async fn test_upload_is_tagged_and_ranked() {
        let tagger = Arc::new(RecordingTagger::returning(vec![Tag::new("cat", 99.0)], Some(41)));
        let fetcher = Arc::new(RecordingFetcher::succeeding());
        let matcher = matcher(&tagger, &fetcher);

        let input = MatchInput {
            upload: Some(upload()),
            image_url: None,
        };
        let response = matcher.run(input, RankParams::new(0.0, 20)).await.unwrap();

        assert_eq!(response.tags, vec![Tag::new("cat", 99.0)]);
        assert_eq!(response.rate_limit_remaining, Some(41));
        assert_eq!(response.matches.len(), 2);
        assert_eq!(response.matches[0].similarity_score, 16.0);
        assert_eq!(tagger.calls(), 1);
        assert_eq!(fetcher.calls(), 0);
        assert_eq!(tagger.last_filename().as_deref(), Some("cat.jpg"));
    }

    #[actix_web::test]
    async fn test_url_is_fetched_before_tagging() {
        let tagger = Arc::new(RecordingTagger::returning(vec![Tag::new("cat", 99.0)], None));
        let fetcher = Arc::new(RecordingFetcher::succeeding());
        let matcher = matcher(&tagger, &fetcher);

        let input = MatchInput {
            upload: None,
            image_url: Some("https://example.com/photos/kitty.png".to_string()),
        };
        let response = matcher.run(input, RankParams::new(10.0, 20)).await.unwrap();

        assert_eq!(response.matches.len(), 1);
        assert_eq!(fetcher.calls(), 1);
        assert_eq!(tagger.calls(), 1);
        assert_eq!(tagger.last_filename().as_deref(), Some("kitty.png"));
    }

    #[actix_web::test]
    async fn test_invalid_input_makes_no_external_calls() {
        let tagger = Arc::new(RecordingTagger::returning(vec![], None));
        let fetcher = Arc::new(RecordingFetcher::succeeding());
        let matcher = matcher(&tagger, &fetcher);

        let both = MatchInput {
            upload: Some(upload()),
            image_url: Some("https://example.com/a.jpg".to_string()),
        };
        assert!(matches!(
            matcher.run(both, RankParams::default()).await,
            Err(ApiError::BothInputs)
        ));

        let bad_ext = MatchInput {
            upload: None,
            image_url: Some("https://example.com/a.gif".to_string()),
        };
        assert!(matches!(
            matcher.run(bad_ext, RankParams::default()).await,
            Err(ApiError::UnsupportedExtension)
        ));

        assert_eq!(tagger.calls(), 0);
        assert_eq!(fetcher.calls(), 0);
    }

    #[actix_web::test]
    async fn test_fetch_failure_skips_tagging() {
        let tagger = Arc::new(RecordingTagger::returning(vec![], None));
        let fetcher = Arc::new(RecordingFetcher::failing(404));
        let matcher = matcher(&tagger, &fetcher);

        let input = MatchInput {
            upload: None,
            image_url: Some("https://example.com/a.jpg".to_string()),
        };
        let err = matcher.run(input, RankParams::default()).await.unwrap_err();

        assert!(matches!(err, ApiError::Fetch(FetchError::Status(404))));
        assert_eq!(fetcher.calls(), 1);
        assert_eq!(tagger.calls(), 0);
    }

    #[actix_web::test]
    async fn test_tagging_failure_is_terminal() {
        let tagger = Arc::new(RecordingTagger::failing());
        let fetcher = Arc::new(RecordingFetcher::succeeding());
        let matcher = matcher(&tagger, &fetcher);

        let input = MatchInput {
            upload: Some(upload()),
            image_url: None,
        };
        let err = matcher.run(input, RankParams::default()).await.unwrap_err();

        assert!(matches!(err, ApiError::Tagging(_)));
        assert_eq!(tagger.calls(), 1);
    }
}
