//! Directory search: free-text location, category and verified-only filters,
//! always ranked verified-first then by name.

use std::sync::Arc;

use crate::error::WorkflowError;
use crate::models::{Business, NewSearchEvent, SearchQuery};
use crate::store::{from_rows, to_row, Filter, Order, RecordStore, StoreError, Table};

/// Columns a location query is matched against (any one qualifies).
pub const LOCATION_COLUMNS: &[&str] = &["city", "zip", "name"];

fn ranking() -> [Order; 2] {
    [Order::desc("verified"), Order::asc("name")]
}

pub async fn search_businesses(
    store: &Arc<dyn RecordStore>,
    query: &SearchQuery,
) -> Result<Vec<Business>, WorkflowError> {
    let location = query.location.trim();

    let mut filters = Vec::new();
    if !location.is_empty() {
        filters.push(Filter::ContainsAny(LOCATION_COLUMNS, location.to_string()));
    }
    if let Some(category) = query.category {
        filters.push(Filter::eq("category", category.as_str()));
    }
    if query.verified_only {
        filters.push(Filter::eq("verified", true));
    }

    let results = fetch(store.as_ref(), &filters).await?;

    log_search_event(
        Arc::clone(store),
        NewSearchEvent {
            location: (!location.is_empty()).then(|| location.to_string()),
            category: query.category,
            verified_only: query.verified_only,
            result_count: results.len() as i64,
        },
    );

    Ok(results)
}

/// Curated listings shown before any search runs.
pub async fn featured_businesses(
    store: &Arc<dyn RecordStore>,
) -> Result<Vec<Business>, WorkflowError> {
    fetch(store.as_ref(), &[Filter::eq("featured", true)]).await
}

async fn fetch(store: &dyn RecordStore, filters: &[Filter]) -> Result<Vec<Business>, WorkflowError> {
    store
        .query(Table::Businesses, filters, &ranking())
        .await
        .and_then(from_rows)
        .map_err(|err| {
            log::error!("Business query failed: {err}");
            WorkflowError::StoreReadFailed(err)
        })
}

/// Records the search on a detached task; the caller never waits and never sees failures.
fn log_search_event(store: Arc<dyn RecordStore>, event: NewSearchEvent) {
    tokio::spawn(async move {
        let result = match to_row(&event) {
            Ok(row) => store.insert(Table::SearchEvents, row).await.map(|_| ()),
            Err(err) => Err::<(), StoreError>(err),
        };
        if let Err(err) = result {
            log::error!("Error logging search event: {err}");
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Category;
    use crate::store::testing::FlakyStore;
    use serde_json::{json, Value};

    async fn seeded() -> Arc<FlakyStore> {
        let store = Arc::new(FlakyStore::new());
        for (name, city, zip, category, verified, featured) in [
            ("Zeta", "Orlando", "32801", "retail", false, false),
            ("Alpha", "Jacksonville", "32202", "food", true, true),
            ("Beta", "Tampa", "33602", "food", true, false),
        ] {
            store
                .seed(
                    Table::Businesses,
                    json!({
                        "name": name,
                        "category": category,
                        "address": null,
                        "city": city,
                        "state": "FL",
                        "zip": zip,
                        "description": null,
                        "phone": null,
                        "website": null,
                        "verified": verified,
                        "featured": featured,
                    }),
                )
                .await;
        }
        store
    }

    fn names(businesses: &[Business]) -> Vec<&str> {
        businesses.iter().map(|b| b.name.as_str()).collect()
    }

    async fn logged_events(store: &FlakyStore) -> Vec<serde_json::Map<String, Value>> {
        for _ in 0..50 {
            let rows = store.rows(Table::SearchEvents).await;
            if !rows.is_empty() {
                return rows;
            }
            tokio::task::yield_now().await;
        }
        Vec::new()
    }

    #[actix_rt::test]
    async fn unfiltered_search_ranks_verified_then_name() {
        let flaky = seeded().await;
        let store: Arc<dyn RecordStore> = flaky.clone();

        let results = search_businesses(&store, &SearchQuery::default())
            .await
            .expect("search succeeds");
        assert_eq!(names(&results), vec!["Alpha", "Beta", "Zeta"]);
    }

    #[actix_rt::test]
    async fn location_matches_name_city_or_zip_case_insensitively() {
        let flaky = seeded().await;
        let store: Arc<dyn RecordStore> = flaky.clone();

        let by_city = SearchQuery {
            location: "  jack ".to_string(),
            ..Default::default()
        };
        let results = search_businesses(&store, &by_city).await.expect("search succeeds");
        assert_eq!(names(&results), vec!["Alpha"]);

        let by_zip = SearchQuery {
            location: "336".to_string(),
            ..Default::default()
        };
        let results = search_businesses(&store, &by_zip).await.expect("search succeeds");
        assert_eq!(names(&results), vec!["Beta"]);

        let miss = SearchQuery {
            location: "miami".to_string(),
            ..Default::default()
        };
        let results = search_businesses(&store, &miss).await.expect("search succeeds");
        assert!(results.is_empty());
    }

    #[actix_rt::test]
    async fn category_and_verified_filters_combine() {
        let flaky = seeded().await;
        let store: Arc<dyn RecordStore> = flaky.clone();

        let food = SearchQuery {
            category: Some(Category::Food),
            ..Default::default()
        };
        let results = search_businesses(&store, &food).await.expect("search succeeds");
        assert_eq!(names(&results), vec!["Alpha", "Beta"]);

        let verified_retail = SearchQuery {
            category: Some(Category::Retail),
            verified_only: true,
            ..Default::default()
        };
        let results = search_businesses(&store, &verified_retail)
            .await
            .expect("search succeeds");
        assert!(results.is_empty());
    }

    #[actix_rt::test]
    async fn featured_listing_uses_same_ranking() {
        let flaky = seeded().await;
        let store: Arc<dyn RecordStore> = flaky.clone();

        let results = featured_businesses(&store).await.expect("query succeeds");
        assert_eq!(names(&results), vec!["Alpha"]);
    }

    #[actix_rt::test]
    async fn search_event_is_logged_with_result_count() {
        let flaky = seeded().await;
        let store: Arc<dyn RecordStore> = flaky.clone();

        let query = SearchQuery {
            location: "Jack".to_string(),
            category: Some(Category::Food),
            verified_only: true,
        };
        search_businesses(&store, &query).await.expect("search succeeds");

        let events = logged_events(&flaky).await;
        assert_eq!(events.len(), 1);
        assert_eq!(events[0]["location"], json!("Jack"));
        assert_eq!(events[0]["category"], json!("food"));
        assert_eq!(events[0]["verified_only"], json!(true));
        assert_eq!(events[0]["result_count"], json!(1));
    }

    #[actix_rt::test]
    async fn empty_filters_are_logged_as_null() {
        let flaky = seeded().await;
        let store: Arc<dyn RecordStore> = flaky.clone();

        search_businesses(&store, &SearchQuery::default())
            .await
            .expect("search succeeds");

        let events = logged_events(&flaky).await;
        assert_eq!(events[0]["location"], Value::Null);
        assert_eq!(events[0]["category"], Value::Null);
        assert_eq!(events[0]["result_count"], json!(3));
    }

    #[actix_rt::test]
    async fn log_failure_does_not_affect_results() {
        let flaky = seeded().await;
        flaky.fail_inserts_on(Table::SearchEvents);
        let store: Arc<dyn RecordStore> = flaky.clone();

        let results = search_businesses(&store, &SearchQuery::default())
            .await
            .expect("search still succeeds");
        assert_eq!(results.len(), 3);
        assert!(logged_events(&flaky).await.is_empty());
    }

    #[actix_rt::test]
    async fn read_failure_returns_no_partial_results() {
        let flaky = seeded().await;
        flaky.fail_queries_on(Table::Businesses);
        let store: Arc<dyn RecordStore> = flaky.clone();

        let err = search_businesses(&store, &SearchQuery::default())
            .await
            .expect_err("query fails");
        assert!(matches!(err, WorkflowError::StoreReadFailed(_)));
        assert!(logged_events(&flaky).await.is_empty());
    }
}
