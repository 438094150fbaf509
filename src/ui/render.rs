//! Plain-text rendering of pages and projections.
//!
//! Everything writes to an `impl Write` so commands print to stdout and tests
//! render into a `Vec<u8>`. Backend text is sanitized before it is printed.

use std::io::{self, IsTerminal, Write};

use crate::api::{
    AdminStats, ApiError, Article, ArticleListResponse, CrawlAck, FilterOption, ProcessAck,
    QualityTier, User,
};
use crate::session::Filters;
use crate::util::{one_line, truncate_to_width, wrap_to_width};
use crate::view::{message_for, ArticlesPage, Pagination, TodayPage, ViewState};

/// Fallback line width when neither the terminal nor `COLUMNS` gives one.
pub const DEFAULT_WIDTH: usize = 100;
/// Narrowest layout we render.
pub const MIN_WIDTH: usize = 40;

/// Page numbers listed in the pager.
const PAGER_WIDTH: u32 = 7;
/// Column where the second line of an entry starts.
const INDENT: &str = "           ";

/// Output width: the terminal's own size when stdout is a terminal, else
/// `COLUMNS`, clamped to something usable.
pub fn terminal_width() -> usize {
    let size = if io::stdout().is_terminal() {
        crossterm::terminal::size().ok().map(|(cols, _)| cols)
    } else {
        None
    };
    pick_width(size, std::env::var("COLUMNS").ok().as_deref())
}

fn pick_width(terminal_cols: Option<u16>, columns_env: Option<&str>) -> usize {
    terminal_cols
        .filter(|&cols| cols > 0)
        .map(usize::from)
        .or_else(|| columns_env.and_then(|c| c.trim().parse::<usize>().ok()))
        .unwrap_or(DEFAULT_WIDTH)
        .max(MIN_WIDTH)
}

fn tier_mark(tier: QualityTier) -> char {
    match tier {
        QualityTier::High => '*',
        QualityTier::Medium => '+',
        QualityTier::Low => ' ',
    }
}

/// Two-line listing entry: id, score and title, then source, category and date.
pub fn article_entry(out: &mut impl Write, article: &Article, width: usize) -> io::Result<()> {
    let head = format!(
        "{:>6} {}{:>3.0} ",
        article.id,
        tier_mark(article.tier()),
        article.quality_score
    );
    let title = one_line(article.display_title());
    let budget = width.saturating_sub(head.len());
    writeln!(out, "{head}{}", truncate_to_width(&title, budget))?;

    let meta = format!(
        "{} | {} | {}",
        article.source.label(),
        article.category.label(),
        article.timestamp().format("%Y-%m-%d %H:%M")
    );
    writeln!(
        out,
        "{INDENT}{}",
        truncate_to_width(&meta, width.saturating_sub(INDENT.len()))
    )
}

/// Error line plus retry hint for a failed view.
fn failure(out: &mut impl Write, err: &ApiError) -> io::Result<()> {
    writeln!(out, "Error: {}", message_for(err))?;
    writeln!(out, "Type 'r' to retry.")
}

/// `Page 2/3  1 [2] 3`
pub fn pager(out: &mut impl Write, pagination: &Pagination) -> io::Result<()> {
    let total = pagination.total_pages();
    if total == 0 {
        return Ok(());
    }
    let pages: Vec<String> = pagination
        .window(PAGER_WIDTH)
        .map(|p| {
            if p == pagination.page {
                format!("[{p}]")
            } else {
                p.to_string()
            }
        })
        .collect();
    writeln!(
        out,
        "Page {}/{}  {}",
        pagination.page,
        total,
        pages.join(" ")
    )
}

pub fn listing(
    out: &mut impl Write,
    response: &ArticleListResponse,
    width: usize,
) -> io::Result<()> {
    writeln!(out, "{} articles", response.total)?;
    writeln!(out)?;
    for article in &response.items {
        article_entry(out, article, width)?;
    }
    Ok(())
}

/// The article listing page in whatever state it is in.
pub fn articles_page(out: &mut impl Write, page: &ArticlesPage, width: usize) -> io::Result<()> {
    match page.state() {
        ViewState::Idle => Ok(()),
        ViewState::Loading => writeln!(out, "Loading articles..."),
        ViewState::Empty => writeln!(out, "No articles match the current filters."),
        ViewState::Failed(err) => failure(out, err),
        ViewState::Ready(response) => {
            listing(out, response, width)?;
            if let Some(pagination) = page.pagination() {
                writeln!(out)?;
                pager(out, &pagination)?;
            }
            Ok(())
        }
    }
}

/// Today's picks with their summary counters.
pub fn today_page(out: &mut impl Write, page: &TodayPage, width: usize) -> io::Result<()> {
    match page.state() {
        ViewState::Idle => Ok(()),
        ViewState::Loading => writeln!(out, "Loading today's picks..."),
        ViewState::Empty => writeln!(out, "No picks yet today. Check back later."),
        ViewState::Failed(err) => failure(out, err),
        ViewState::Ready(articles) => {
            let s = page.summary();
            writeln!(out, "Today's picks: {}", s.total)?;
            writeln!(
                out,
                "High quality: {}  arXiv: {}  LLM: {}  Agent: {}",
                s.high_quality, s.arxiv, s.llm, s.agent
            )?;
            writeln!(out)?;
            for article in articles {
                article_entry(out, article, width)?;
            }
            Ok(())
        }
    }
}

/// Full article view.
pub fn article_detail(out: &mut impl Write, article: &Article, width: usize) -> io::Result<()> {
    for line in wrap_to_width(article.display_title(), width) {
        writeln!(out, "{line}")?;
    }
    if let Some(original) = article.original_title() {
        for line in wrap_to_width(original, width) {
            writeln!(out, "{line}")?;
        }
    }
    writeln!(out)?;
    writeln!(
        out,
        "{} | {} | score {:.0} | {}",
        article.source.label(),
        article.category.label(),
        article.quality_score,
        article.timestamp().format("%Y-%m-%d %H:%M UTC")
    )?;
    if !article.authors.is_empty() {
        let authors = one_line(&article.authors.join(", "));
        writeln!(out, "By {}", truncate_to_width(&authors, width.saturating_sub(3)))?;
    }
    writeln!(out, "{}", one_line(&article.url))?;

    if let Some(summary) = article.display_summary() {
        writeln!(out)?;
        for line in wrap_to_width(summary, width) {
            writeln!(out, "{line}")?;
        }
    }
    if !article.tags.is_empty() {
        writeln!(out)?;
        writeln!(out, "Tags: {}", one_line(&article.tags.join(", ")))?;
    }
    Ok(())
}

pub fn filters(out: &mut impl Write, filters: &Filters) -> io::Result<()> {
    fn or_any(s: &str) -> &str {
        if s.is_empty() {
            "any"
        } else {
            s
        }
    }
    writeln!(out, "category:  {}", or_any(&filters.category))?;
    writeln!(out, "source:    {}", or_any(&filters.source))?;
    if filters.min_score == 0 {
        writeln!(out, "min score: any")?;
    } else {
        writeln!(out, "min score: {}", filters.min_score)?;
    }
    writeln!(out, "search:    {}", or_any(&one_line(&filters.search)))
}

pub fn filter_options(
    out: &mut impl Write,
    categories: &[FilterOption],
    sources: &[FilterOption],
) -> io::Result<()> {
    writeln!(out, "Categories:")?;
    for option in categories {
        writeln!(out, "  {:<14} {}", one_line(&option.value), one_line(&option.label))?;
    }
    writeln!(out)?;
    writeln!(out, "Sources:")?;
    for option in sources {
        writeln!(out, "  {:<14} {}", one_line(&option.value), one_line(&option.label))?;
    }
    Ok(())
}

pub fn user(out: &mut impl Write, user: &User) -> io::Result<()> {
    writeln!(out, "{} (id {})", one_line(&user.email), user.id)?;
    if let Some(name) = user.username.as_deref().filter(|n| !n.is_empty()) {
        writeln!(out, "username:        {}", one_line(name))?;
    }
    let categories = if user.preferred_categories.is_empty() {
        "all".to_string()
    } else {
        one_line(&user.preferred_categories.join(", "))
    };
    writeln!(out, "categories:      {categories}")?;
    writeln!(out, "min quality:     {}", user.min_quality_score)?;
    writeln!(
        out,
        "email digest:    {}{}",
        user.email_frequency,
        if user.email_enabled { "" } else { " (disabled)" }
    )?;
    if let Some(created) = user.created_at {
        writeln!(out, "member since:    {}", created.format("%Y-%m-%d"))?;
    }
    Ok(())
}

pub fn admin_stats(out: &mut impl Write, stats: &AdminStats) -> io::Result<()> {
    writeln!(out, "total articles:     {}", stats.total_articles)?;
    writeln!(out, "processed:          {}", stats.processed_articles)?;
    writeln!(out, "pending:            {}", stats.pending_articles)?;
    writeln!(out, "average quality:    {:.1}", stats.average_quality_score)
}

pub fn crawl_ack(out: &mut impl Write, ack: &CrawlAck) -> io::Result<()> {
    writeln!(out, "{}", one_line(&ack.message))?;
    writeln!(
        out,
        "crawled: {}  new: {}  errors: {}",
        ack.stats.crawled, ack.stats.new, ack.stats.errors
    )
}

pub fn process_ack(out: &mut impl Write, ack: &ProcessAck) -> io::Result<()> {
    writeln!(out, "{}", one_line(&ack.message))?;
    writeln!(out, "processed: {}", ack.processed)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn article(id: i64, title: &str, score: f64) -> Article {
        serde_json::from_value(serde_json::json!({
            "id": id,
            "title": title,
            "url": "https://example.com/a",
            "summary": "A short summary.",
            "source": "arxiv",
            "category": "llm",
            "authors": ["Ada", "Grace"],
            "quality_score": score,
            "published_at": "2026-10-17T09:30:00Z",
            "crawled_at": "2026-10-17T10:00:00Z"
        }))
        .unwrap()
    }

    fn render<F>(f: F) -> String
    where
        F: FnOnce(&mut Vec<u8>) -> io::Result<()>,
    {
        let mut buf = Vec::new();
        f(&mut buf).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn test_width_prefers_terminal_then_columns() {
        assert_eq!(pick_width(Some(132), Some("80")), 132);
        assert_eq!(pick_width(Some(0), Some("80")), 80);
        assert_eq!(pick_width(None, Some(" 90 ")), 90);
        assert_eq!(pick_width(None, Some("wide")), DEFAULT_WIDTH);
        assert_eq!(pick_width(None, None), DEFAULT_WIDTH);
        assert_eq!(pick_width(Some(20), None), MIN_WIDTH);
    }

    #[test]
    fn test_entry_strips_escape_sequences() {
        let text = render(|out| article_entry(out, &article(1, "Evil\x1b[2Jtitle", 85.0), 80));
        assert!(!text.contains('\x1b'));
        assert!(text.contains("Eviltitle"));
        assert!(text.contains("arXiv | LLM | 2026-10-17 09:30"));
    }

    #[test]
    fn test_entry_respects_width() {
        let long = "word ".repeat(40);
        let text = render(|out| article_entry(out, &article(1, &long, 50.0), 60));
        for line in text.lines() {
            assert!(crate::util::display_width(line) <= 60, "too wide: {line:?}");
        }
    }

    #[test]
    fn test_pager_marks_current_page() {
        let p = Pagination {
            page: 2,
            page_size: 20,
            total: 45,
        };
        assert_eq!(render(|out| pager(out, &p)), "Page 2/3  1 [2] 3\n");
    }

    #[test]
    fn test_failed_page_shows_message_and_retry_hint() {
        let mut page = ArticlesPage::new(20);
        let t = page.begin_filtered(&Filters::default());
        page.resolve(t.generation, Err(ApiError::Transport("offline".into())));

        let text = render(|out| articles_page(out, &page, 80));
        assert!(text.starts_with("Error: Could not reach the server (offline)"));
        assert!(text.contains("retry"));
    }

    #[test]
    fn test_detail_includes_summary_and_authors() {
        let text = render(|out| article_detail(out, &article(9, "Title", 91.0), 80));
        assert!(text.contains("By Ada, Grace"));
        assert!(text.contains("A short summary."));
        assert!(text.contains("score 91"));
    }

    #[test]
    fn test_filters_show_any_for_unconstrained() {
        let text = render(|out| filters(out, &Filters::default()));
        assert!(text.contains("category:  any"));
        assert!(text.contains("min score: any"));
    }
}
