use super::controller::{Ticket, ViewController, ViewState};
use crate::api::{ApiClient, ApiError, Article, ArticleCategory, ArticleSource, TodayQuery};

/// Counters shown above today's picks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TodaySummary {
    pub total: usize,
    pub high_quality: usize,
    pub arxiv: usize,
    pub llm: usize,
    pub agent: usize,
}

impl TodaySummary {
    /// Score at or above which an article counts as high quality.
    pub const HIGH_QUALITY: f64 = 80.0;

    pub fn of(articles: &[Article]) -> Self {
        articles.iter().fold(
            TodaySummary {
                total: articles.len(),
                ..TodaySummary::default()
            },
            |mut acc, a| {
                if a.quality_score >= Self::HIGH_QUALITY {
                    acc.high_quality += 1;
                }
                if a.source == ArticleSource::Arxiv {
                    acc.arxiv += 1;
                }
                match a.category {
                    ArticleCategory::Llm => acc.llm += 1,
                    ArticleCategory::Agent => acc.agent += 1,
                    _ => {}
                }
                acc
            },
        )
    }
}

/// Today's highest-scoring articles.
#[derive(Debug)]
pub struct TodayPage {
    controller: ViewController<TodayQuery, Vec<Article>>,
    query: TodayQuery,
}

impl TodayPage {
    pub fn new(limit: u32, min_score: u32) -> Self {
        Self {
            controller: ViewController::new(),
            query: TodayQuery { limit, min_score },
        }
    }

    pub fn state(&self) -> &ViewState<Vec<Article>> {
        self.controller.state()
    }

    /// Summary of the loaded picks; zeroed unless `Ready`.
    pub fn summary(&self) -> TodaySummary {
        self.state()
            .data()
            .map(|articles| TodaySummary::of(articles))
            .unwrap_or_default()
    }

    pub fn begin(&mut self) -> Ticket<TodayQuery> {
        self.controller.begin(self.query)
    }

    pub fn retry(&mut self) -> Option<Ticket<TodayQuery>> {
        self.controller.retry()
    }

    pub fn resolve(&mut self, generation: u64, result: Result<Vec<Article>, ApiError>) -> bool {
        self.controller.resolve(generation, result)
    }

    pub async fn load(&mut self, client: &ApiClient) -> &ViewState<Vec<Article>> {
        self.controller
            .load(self.query, |q| async move {
                client.articles().today(q.limit, q.min_score).await
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn article(score: f64, source: &str, category: &str) -> Article {
        serde_json::from_value(serde_json::json!({
            "id": 1,
            "title": "t",
            "url": "https://example.com",
            "source": source,
            "category": category,
            "quality_score": score,
            "crawled_at": "2026-10-18T08:00:00Z"
        }))
        .unwrap()
    }

    #[test]
    fn test_summary_counts() {
        let picks = vec![
            article(92.0, "arxiv", "llm"),
            article(80.0, "openai_blog", "agent"),
            article(79.9, "arxiv", "cv"),
            article(55.0, "techcrunch", "llm"),
        ];
        assert_eq!(
            TodaySummary::of(&picks),
            TodaySummary {
                total: 4,
                high_quality: 2,
                arxiv: 2,
                llm: 2,
                agent: 1,
            }
        );
    }

    #[test]
    fn test_summary_zero_until_ready() {
        let mut page = TodayPage::new(15, 50);
        assert_eq!(page.summary(), TodaySummary::default());
        let t = page.begin();
        assert_eq!(t.params, TodayQuery { limit: 15, min_score: 50 });
        page.resolve(t.generation, Ok(vec![article(85.0, "arxiv", "agent")]));
        assert_eq!(page.summary().agent, 1);
    }
}
