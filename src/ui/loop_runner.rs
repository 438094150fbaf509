//! Interactive article browser.
//!
//! Multiplexes stdin commands, filter-change notifications from the session
//! store and completions of background fetches on a single task.

use anyhow::Result;
use std::io::{self, Write};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

#[cfg(unix)]
use tokio::signal::unix::{signal, SignalKind};

use super::command::{parse_command, Command, HELP};
use super::helpers::catch_task_panic;
use super::render;
use crate::api::{ApiClient, ApiError, ArticleListResponse, ArticleQuery};
use crate::session::{FilterPatch, SessionStore};
use crate::view::{message_for, ArticleDetailPage, ArticlesPage, PageError, Ticket, ViewState};

/// Completion of a spawned listing fetch.
#[derive(Debug)]
pub enum BrowseEvent {
    Listing {
        generation: u64,
        result: Result<ArticleListResponse, ApiError>,
    },
    TaskPanicked {
        generation: u64,
        error: String,
    },
}

/// Result of handling one command.
pub enum Action {
    Continue,
    Quit,
}

/// Run the browser until `q`, end of input or a termination signal.
pub async fn run(client: ApiClient, page_size: u32) -> Result<()> {
    let session = Arc::clone(client.session());
    let width = render::terminal_width();
    let mut page = ArticlesPage::new(page_size);
    let mut filters_rx = session.subscribe_filters();
    let (event_tx, mut event_rx) = mpsc::channel::<BrowseEvent>(16);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    #[cfg(unix)]
    let mut sigterm = signal(SignalKind::terminate())?;
    #[cfg(unix)]
    let mut sigint = signal(SignalKind::interrupt())?;

    let filters = filters_rx.borrow_and_update().clone();
    spawn_fetch(&client, page.begin_filtered(&filters), &event_tx);
    println!("Type 'h' for help.");

    loop {
        #[cfg(unix)]
        let sigterm_fut = sigterm.recv();
        #[cfg(not(unix))]
        let sigterm_fut = std::future::pending::<Option<()>>();

        #[cfg(unix)]
        let sigint_fut = sigint.recv();
        #[cfg(not(unix))]
        let sigint_fut = std::future::pending::<Option<()>>();

        tokio::select! {
            biased;

            _ = sigterm_fut => {
                tracing::info!("Received SIGTERM, shutting down");
                break;
            }

            _ = sigint_fut => {
                tracing::info!("Received SIGINT, shutting down");
                break;
            }

            line = lines.next_line() => {
                let Some(line) = line? else { break };
                match handle_line(&line, &client, &session, &mut page, &event_tx, width).await {
                    Ok(Action::Quit) => break,
                    Ok(Action::Continue) => {}
                    Err(e) => eprintln!("Error: {e:#}"),
                }
                prompt()?;
            }

            changed = filters_rx.changed() => {
                if changed.is_err() {
                    break;
                }
                let filters = filters_rx.borrow_and_update().clone();
                tracing::debug!(?filters, "Filters changed, reloading from page 1");
                spawn_fetch(&client, page.begin_filtered(&filters), &event_tx);
            }

            Some(event) = event_rx.recv() => {
                if handle_event(&mut page, event) {
                    let mut out = io::stdout().lock();
                    writeln!(out)?;
                    render::articles_page(&mut out, &page, width)?;
                    drop(out);
                    prompt()?;
                }
            }
        }
    }

    Ok(())
}

fn prompt() -> io::Result<()> {
    let mut out = io::stdout().lock();
    write!(out, "> ")?;
    out.flush()
}

/// Apply a fetch completion. Returns whether the page changed.
fn handle_event(page: &mut ArticlesPage, event: BrowseEvent) -> bool {
    match event {
        BrowseEvent::Listing { generation, result } => page.resolve(generation, result),
        BrowseEvent::TaskPanicked { generation, error } => {
            tracing::error!(generation, error = %error, "Listing fetch panicked");
            page.resolve(
                generation,
                Err(ApiError::Transport(format!("request task failed: {error}"))),
            )
        }
    }
}

async fn handle_line(
    line: &str,
    client: &ApiClient,
    session: &SessionStore,
    page: &mut ArticlesPage,
    event_tx: &mpsc::Sender<BrowseEvent>,
    width: usize,
) -> Result<Action> {
    let command = match parse_command(line) {
        Ok(Some(command)) => command,
        Ok(None) => return Ok(Action::Continue),
        Err(e) => {
            println!("{e}");
            return Ok(Action::Continue);
        }
    };

    match command {
        Command::Quit => return Ok(Action::Quit),
        Command::Help => println!("{HELP}"),
        Command::Filters => render::filters(&mut io::stdout().lock(), &session.filters())?,

        // Filter edits only touch the store; the watch subscription refetches.
        Command::Category(value) => {
            session.set_filters(FilterPatch::category(value)).await?;
        }
        Command::Source(value) => {
            session.set_filters(FilterPatch::source(value)).await?;
        }
        Command::MinScore(score) => {
            session.set_filters(FilterPatch::min_score(score)).await?;
        }
        Command::Search(text) => {
            session.set_filters(FilterPatch::search(text)).await?;
        }
        Command::Clear => session.clear_filters().await?,

        Command::Next => navigate(page.next_page(), client, event_tx),
        Command::Prev => navigate(page.prev_page(), client, event_tx),
        Command::Goto(n) => navigate(page.go_to(n), client, event_tx),
        Command::Retry => match page.retry() {
            Some(ticket) => spawn_fetch(client, ticket, event_tx),
            None => println!("Nothing to retry."),
        },

        Command::Show(id) => {
            let mut detail = ArticleDetailPage::new();
            let state = detail.load(client, id).await;
            let mut out = io::stdout().lock();
            match state {
                ViewState::Ready(article) => render::article_detail(&mut out, article, width)?,
                ViewState::Failed(err) => writeln!(out, "Error: {}", message_for(err))?,
                _ => {}
            }
        }
    }
    Ok(Action::Continue)
}

fn navigate(
    ticket: Result<Ticket<ArticleQuery>, PageError>,
    client: &ApiClient,
    event_tx: &mpsc::Sender<BrowseEvent>,
) {
    match ticket {
        Ok(ticket) => spawn_fetch(client, ticket, event_tx),
        Err(e) => println!("{e}"),
    }
}

/// Fetch `ticket` on a background task and report through `event_tx`.
fn spawn_fetch(
    client: &ApiClient,
    ticket: Ticket<ArticleQuery>,
    event_tx: &mpsc::Sender<BrowseEvent>,
) {
    let client = client.clone();
    let tx = event_tx.clone();
    let generation = ticket.generation;
    tracing::debug!(generation, page = ?ticket.params.page, "Spawning listing fetch");

    tokio::spawn(async move {
        let event = match catch_task_panic(ArticlesPage::fetch(&client, &ticket)).await {
            Ok(result) => BrowseEvent::Listing { generation, result },
            Err(error) => BrowseEvent::TaskPanicked { generation, error },
        };
        if let Err(e) = tx.send(event).await {
            tracing::warn!(error = %e, "Failed to deliver listing (receiver dropped)");
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::Filters;

    #[test]
    fn test_panicked_task_fails_the_page() {
        let mut page = ArticlesPage::new(20);
        let t = page.begin_filtered(&Filters::default());

        let changed = handle_event(
            &mut page,
            BrowseEvent::TaskPanicked {
                generation: t.generation,
                error: "boom".into(),
            },
        );
        assert!(changed);
        assert!(matches!(
            page.state(),
            ViewState::Failed(ApiError::Transport(msg)) if msg.contains("boom")
        ));
    }

    #[test]
    fn test_stale_listing_is_ignored() {
        let mut page = ArticlesPage::new(20);
        let old = page.begin_filtered(&Filters::default());
        let _new = page.begin_filtered(&Filters {
            category: "llm".into(),
            ..Filters::default()
        });

        let changed = handle_event(
            &mut page,
            BrowseEvent::Listing {
                generation: old.generation,
                result: Err(ApiError::Transport("late".into())),
            },
        );
        assert!(!changed);
        assert!(page.state().is_loading());
    }
}
