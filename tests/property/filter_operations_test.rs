//! Property-based tests for filtering, stats and URL normalization.

use chrono::{DateTime, Duration, TimeZone, Utc};
use proptest::prelude::*;

use vault::services::bookmark_view::{compute_stats, filter_bookmarks};
use vault::services::url_normalizer::normalize_url;
use vault::types::bookmark::{Bookmark, RecordId};

fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap()
}

fn arb_bookmark() -> impl Strategy<Value = Bookmark> {
    (
        "[a-zA-Z0-9]{1,10}",
        "[A-Za-z ]{1,20}",
        prop_oneof![
            "https://[a-z]{1,8}\\.(com|org|dev)(/[a-z]{0,6})?",
            "https://www\\.[a-z]{1,8}\\.com",
            "[a-z]{1,8}",
        ],
        -72i64..72,
    )
        .prop_map(|(id, title, url, hours)| Bookmark {
            id: RecordId::from(id),
            title,
            url,
            created_at: base_time() + Duration::hours(hours),
        })
}

fn arb_collection() -> impl Strategy<Value = Vec<Bookmark>> {
    proptest::collection::vec(arb_bookmark(), 0..15)
}

/// True when `sub` appears in `all` in the same relative order.
fn is_ordered_subsequence(sub: &[Bookmark], all: &[Bookmark]) -> bool {
    let mut rest = all.iter();
    sub.iter().all(|item| rest.any(|candidate| candidate == item))
}

// *For any* collection and query, the filtered result is an ordered
// subsequence of the collection and every entry matches the query.
proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn filter_keeps_order_and_only_matches(
        bookmarks in arb_collection(),
        query in "[a-zA-Z. ]{0,4}",
    ) {
        let shown = filter_bookmarks(&bookmarks, &query);
        prop_assert!(is_ordered_subsequence(&shown, &bookmarks));

        let needle = query.to_lowercase();
        for b in &shown {
            prop_assert!(
                b.title.to_lowercase().contains(&needle) || b.url.to_lowercase().contains(&needle)
            );
        }
        let hidden = bookmarks.len() - shown.len();
        let non_matching = bookmarks
            .iter()
            .filter(|b| {
                !b.title.to_lowercase().contains(&needle) && !b.url.to_lowercase().contains(&needle)
            })
            .count();
        prop_assert_eq!(hidden, non_matching);
    }

    #[test]
    fn empty_query_shows_everything(bookmarks in arb_collection()) {
        prop_assert_eq!(filter_bookmarks(&bookmarks, ""), bookmarks);
    }

    #[test]
    fn whitespace_query_is_matched_literally(
        bookmarks in arb_collection(),
        blank in "[ ]{1,3}",
    ) {
        let shown = filter_bookmarks(&bookmarks, &blank);
        let expected: Vec<Bookmark> = bookmarks
            .iter()
            .filter(|b| b.title.contains(blank.as_str()) || b.url.contains(blank.as_str()))
            .cloned()
            .collect();
        prop_assert_eq!(shown, expected);
    }

    #[test]
    fn filter_ignores_case(
        bookmarks in arb_collection(),
        query in "[a-z]{1,3}",
    ) {
        let lower = filter_bookmarks(&bookmarks, &query);
        let upper = filter_bookmarks(&bookmarks, &query.to_uppercase());
        prop_assert_eq!(lower, upper);
    }
}

// *For any* collection, stats stay within the bounds of the collection size.
proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn stats_are_bounded_by_total(bookmarks in arb_collection()) {
        let stats = compute_stats(&bookmarks, &base_time());
        prop_assert_eq!(stats.total, bookmarks.len());
        prop_assert!(stats.domain_count() <= stats.total);
        prop_assert!(stats.today <= stats.total);
        prop_assert_eq!(stats.domain_count() == 0, bookmarks.is_empty());
    }

    #[test]
    fn stats_today_counts_the_utc_day(bookmarks in arb_collection()) {
        let now = base_time();
        let stats = compute_stats(&bookmarks, &now);
        let expected = bookmarks
            .iter()
            .filter(|b| b.created_at.date_naive() == now.date_naive())
            .count();
        prop_assert_eq!(stats.today, expected);
    }
}

// *For any* non-blank input, the normalized URL carries an http(s) scheme and
// normalizing it again changes nothing.
proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn normalized_urls_are_stable(raw in "[ ]{0,2}((https?|HTTP)://)?[a-zA-Z0-9./:-]{1,30}[ ]{0,2}") {
        let once = normalize_url(&raw).unwrap();
        let lower = once.to_ascii_lowercase();
        prop_assert!(lower.starts_with("http://") || lower.starts_with("https://"));
        prop_assert_eq!(normalize_url(&once).unwrap(), once.clone());
        prop_assert_eq!(once.trim(), once.as_str());
    }
}
