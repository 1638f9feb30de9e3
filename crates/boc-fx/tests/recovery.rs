//! Pagination and recovery against the scripted site.
//!
//! Covers the normal page walk, the single-page boundary, anchor selection
//! from the rendered page links, restarts after rejected jumps and walk
//! steps, the retry bound and cancellation.

mod support;

use boc_fx::{
    CancellationToken, CurrencyRows, FailureKind, PageDriver, Paginator, RetryPolicy,
    ScrapeConfig, ScrapeError, SearchExecutor, SearchOutcome, Session, SiteLayout,
};
use chrono::NaiveDate;
use support::{Links, SimEvent, SimSite, ROWS_PER_PAGE};

// ── helpers ──

fn config() -> ScrapeConfig {
    ScrapeConfig::ending_on(NaiveDate::from_ymd_opt(2026, 10, 18).unwrap())
}

/// Open the site and search `currency`, leaving page 1 displayed.
async fn searched(site: SimSite, currency: &str, retry: RetryPolicy) -> Session<SimSite> {
    let mut session = Session::new(site, SiteLayout::default(), retry);
    session
        .driver_mut()
        .navigate("https://example.test/search")
        .await
        .unwrap();
    let outcome = SearchExecutor::new(&mut session)
        .execute(&config().query(currency))
        .await
        .unwrap();
    assert_eq!(outcome, SearchOutcome::DataAvailable);
    session
}

async fn collect_all(site: SimSite, currency: &str) -> (CurrencyRows, SimSite) {
    let mut session = searched(site, currency, RetryPolicy::immediate(20)).await;
    let rows = Paginator::new(&mut session, currency)
        .collect_all()
        .await
        .expect("pagination failed");
    (rows, session.into_driver())
}

fn assert_pages_in_order(rows: &CurrencyRows, currency: &str, total: u32) {
    assert_eq!(rows.page_count(), total as usize);
    for (i, batch) in rows.batches().iter().enumerate() {
        let page = i as u32 + 1;
        assert_eq!(batch.page, page);
        assert_eq!(batch.cells, SimSite::expected_cells(currency, page));
    }
    assert_eq!(rows.cell_count(), total as usize * ROWS_PER_PAGE * 7);
    assert_eq!(rows.cell_count() % 7, 0);
}

fn links_clicked(site: &SimSite) -> Vec<(u32, bool)> {
    site.events
        .iter()
        .filter_map(|e| match e {
            SimEvent::Link { page, accepted } => Some((*page, *accepted)),
            _ => None,
        })
        .collect()
}

// ── normal operation ──

#[tokio::test]
async fn test_collects_every_page_in_order() {
    let site = SimSite::new().currency("USD", 4);
    let (rows, site) = collect_all(site, "USD").await;

    assert_pages_in_order(&rows, "USD", 4);
    assert_eq!(site.extracted_pages("USD"), vec![1, 2, 3, 4]);
    assert!(links_clicked(&site).is_empty());
}

#[tokio::test]
async fn test_single_page_never_advances() {
    let site = SimSite::new().currency("USD", 1);
    let (rows, site) = collect_all(site, "USD").await;

    assert_pages_in_order(&rows, "USD", 1);
    assert_eq!(site.count(|e| matches!(e, SimEvent::Next { .. })), 0);
    assert_eq!(site.count(|e| matches!(e, SimEvent::Link { .. })), 0);
}

#[tokio::test]
async fn test_first_page_only() {
    let site = SimSite::new().currency("USD", 3);
    let mut session = searched(site, "USD", RetryPolicy::immediate(5)).await;
    let rows = Paginator::new(&mut session, "USD")
        .collect_first()
        .await
        .unwrap();
    let site = session.into_driver();

    assert_eq!(rows.page_count(), 1);
    assert_eq!(rows.batches()[0].cells, SimSite::expected_cells("USD", 1));
    assert_eq!(site.count(|e| matches!(e, SimEvent::Next { .. })), 0);
}

// ── recovery ──

#[tokio::test]
async fn test_two_page_scenario_recovers_from_single_rejection() {
    let site = SimSite::new()
        .currency("USD", 2)
        .links(Links::Fixed(vec![1]))
        .reject_advance(2, 1);
    let (rows, site) = collect_all(site, "USD").await;

    assert_pages_in_order(&rows, "USD", 2);
    assert_eq!(site.extracted_pages("USD"), vec![1, 2]);
    assert_eq!(links_clicked(&site), vec![(1, true)]);

    let navigation: Vec<&SimEvent> = site
        .events
        .iter()
        .filter(|e| !matches!(e, SimEvent::Rows { .. }))
        .collect();
    assert_eq!(
        navigation,
        vec![
            &SimEvent::Navigate,
            &SimEvent::Search { accepted: true },
            &SimEvent::Next {
                target: 2,
                accepted: false
            },
            &SimEvent::Search { accepted: true },
            &SimEvent::Link {
                page: 1,
                accepted: true
            },
            &SimEvent::Next {
                target: 2,
                accepted: true
            },
        ]
    );
}

#[tokio::test]
async fn test_anchor_is_largest_rendered_link_not_beyond_target() {
    // (failed target page, expected anchor) with links {1, 3, 5}
    let cases = [(2, 1), (3, 3), (4, 3), (5, 5), (6, 5)];

    for (target, anchor) in cases {
        let site = SimSite::new()
            .currency("USD", 6)
            .links(Links::Fixed(vec![1, 3, 5]))
            .reject_advance(target, 1);
        let (rows, site) = collect_all(site, "USD").await;

        assert_pages_in_order(&rows, "USD", 6);
        assert_eq!(
            site.extracted_pages("USD"),
            vec![1, 2, 3, 4, 5, 6],
            "pages re-extracted when recovering to {target}"
        );
        assert_eq!(
            links_clicked(&site),
            vec![(anchor, true)],
            "wrong anchor when recovering to {target}"
        );
    }
}

#[tokio::test]
async fn test_anchor_equal_to_target_lands_without_extra_advance() {
    let site = SimSite::new()
        .currency("USD", 6)
        .links(Links::Fixed(vec![1, 3, 5]))
        .reject_advance(3, 1);
    let (_, site) = collect_all(site, "USD").await;

    let to_three = site.count(|e| matches!(e, SimEvent::Next { target: 3, .. }));
    assert_eq!(to_three, 1, "page 3 was reached through its link");
}

#[tokio::test]
async fn test_recovery_uses_window_around_reset_page() {
    let site = SimSite::new()
        .currency("EUR", 8)
        .links(Links::Window(2))
        .resume_page(4)
        .reject_advance(3, 1)
        .reject_advance(8, 1);
    let (rows, site) = collect_all(site, "EUR").await;

    assert_pages_in_order(&rows, "EUR", 8);
    assert_eq!(site.extracted_pages("EUR"), (1..=8u32).collect::<Vec<_>>());
    assert_eq!(links_clicked(&site), vec![(3, true), (6, true)]);
}

#[tokio::test]
async fn test_links_above_target_restart_from_first_page() {
    // the reset page shows links 6..=10 only, none at or below page 4
    let site = SimSite::new()
        .currency("USD", 20)
        .links(Links::Window(2))
        .resume_page(8)
        .reject_advance(4, 1);
    let (rows, site) = collect_all(site, "USD").await;

    assert_pages_in_order(&rows, "USD", 20);
    assert_eq!(site.extracted_pages("USD"), (1..=20u32).collect::<Vec<_>>());
    assert!(links_clicked(&site).is_empty());
    // first search, resubmission clearing the rejection, search back to page 1
    assert_eq!(
        site.count(|e| matches!(e, SimEvent::Search { accepted: true })),
        3
    );
}

#[tokio::test]
async fn test_rejected_jump_restarts_recovery() {
    let site = SimSite::new()
        .currency("USD", 6)
        .links(Links::Fixed(vec![1, 3, 5]))
        .reject_advance(4, 1)
        .reject_link(3, 1);
    let (rows, site) = collect_all(site, "USD").await;

    assert_pages_in_order(&rows, "USD", 6);
    assert_eq!(site.extracted_pages("USD"), vec![1, 2, 3, 4, 5, 6]);
    assert_eq!(links_clicked(&site), vec![(3, false), (3, true)]);
}

#[tokio::test]
async fn test_rejected_walk_step_restarts_recovery() {
    let site = SimSite::new()
        .currency("USD", 5)
        .links(Links::Fixed(vec![1]))
        .reject_advance(4, 1)
        // accepted on the normal walk, rejected on the first recovery walk
        .advance_pattern(2, &[false, true]);
    let (rows, site) = collect_all(site, "USD").await;

    assert_pages_in_order(&rows, "USD", 5);
    assert_eq!(site.extracted_pages("USD"), vec![1, 2, 3, 4, 5]);
    assert_eq!(
        site.count(|e| matches!(
            e,
            SimEvent::Next {
                target: 2,
                accepted: false
            }
        )),
        1
    );
    // two resubmissions: one per recovery pass
    assert_eq!(
        site.count(|e| matches!(e, SimEvent::Search { accepted: true })),
        3
    );
}

#[tokio::test]
async fn test_rejected_resubmission_is_retried() {
    let site = SimSite::new()
        .currency("USD", 3)
        .links(Links::Fixed(vec![1]))
        .reject_advance(3, 1)
        .reject_resubmits(2);
    let (rows, site) = collect_all(site, "USD").await;

    assert_pages_in_order(&rows, "USD", 3);
    assert_eq!(
        site.count(|e| matches!(e, SimEvent::Search { accepted: false })),
        2
    );
    assert_eq!(site.extracted_pages("USD"), vec![1, 2, 3]);
}

// ── failure paths ──

#[tokio::test]
async fn test_endless_rejection_exhausts_retry_budget() {
    let site = SimSite::new()
        .currency("USD", 3)
        .links(Links::Fixed(vec![1]))
        .reject_advance(2, 1_000);
    let mut session = searched(site, "USD", RetryPolicy::immediate(5)).await;
    let err = Paginator::new(&mut session, "USD")
        .collect_all()
        .await
        .unwrap_err();

    assert_eq!(err.kind(), FailureKind::RecoveryExhausted);
    match err {
        ScrapeError::RecoveryExhausted { during, attempts } => {
            assert_eq!(attempts, 5);
            assert!(during.contains("page 2"));
            assert!(during.contains("USD"));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(session.into_driver().extracted_pages("USD"), vec![1]);
}

#[tokio::test]
async fn test_missing_page_count_is_structural_failure() {
    let site = SimSite::new().currency("USD", 3).without_page_count();
    let mut session = searched(site, "USD", RetryPolicy::immediate(5)).await;
    let err = Paginator::new(&mut session, "USD")
        .collect_all()
        .await
        .unwrap_err();

    assert!(matches!(err, ScrapeError::MissingPageCount));
    assert_eq!(err.kind(), FailureKind::Structural);
}

#[tokio::test]
async fn test_cancellation_stops_pagination() {
    let site = SimSite::new().currency("USD", 3);
    let mut session = searched(site, "USD", RetryPolicy::immediate(5)).await;
    let cancel = CancellationToken::new();
    session.set_cancellation(cancel.clone());
    cancel.cancel();

    let err = Paginator::new(&mut session, "USD")
        .collect_all()
        .await
        .unwrap_err();
    assert!(matches!(err, ScrapeError::Cancelled));
    assert_eq!(session.into_driver().extracted_pages("USD"), vec![1]);
}
