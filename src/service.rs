//! User service: keeps each user's portfolio in step with their ticker list.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::fetcher::Fetcher;
use crate::portfolio::{self, PortfolioReport};
use crate::store::UserStore;
use crate::types::{Identifier, StockData, User, UserUpdate};

/// User operations backed by a [`UserStore`] and a [`Fetcher`]
///
/// Cheap to clone; clones share the store and the fetcher.
#[derive(Clone, Debug)]
pub struct UserService {
    store: Arc<UserStore>,
    fetcher: Fetcher,
    fetch_deadline: Option<Duration>,
}

impl UserService {
    /// Create a service over an existing store and fetcher
    pub fn new(store: Arc<UserStore>, fetcher: Fetcher) -> Self {
        Self {
            store,
            fetcher,
            fetch_deadline: None,
        }
    }

    /// Create a service with an empty store and an HTTP-backed fetcher
    pub fn from_config(config: &Config) -> Result<Self> {
        let fetcher = Fetcher::from_config(config)?;
        Ok(Self::new(Arc::new(UserStore::new()), fetcher)
            .with_fetch_deadline(config.fetch_deadline))
    }

    /// Bound every portfolio refresh by `deadline` (None = wait for every ticker)
    pub fn with_fetch_deadline(mut self, deadline: Option<Duration>) -> Self {
        self.fetch_deadline = deadline;
        self
    }

    /// Underlying record store
    pub fn store(&self) -> &Arc<UserStore> {
        &self.store
    }

    /// Validate `user`, fetch its portfolio and store it.
    ///
    /// Any portfolio supplied by the caller is replaced. Tickers that fail to
    /// fetch are left out of the portfolio.
    pub async fn create_user(&self, mut user: User) -> Result<User> {
        validate_stocks(&user.stocks)?;
        if self.store.contains(user.id).await {
            return Err(Error::Duplicate { id: user.id });
        }

        user.portfolio = self.build_portfolio(&user.stocks).await;
        self.store.insert(user.clone()).await?;

        let total_users = self.store.len().await;
        tracing::info!(
            user_id = user.id,
            stocks = user.stocks.len(),
            quotes = user.portfolio.len(),
            total_users,
            "user created"
        );
        Ok(user)
    }

    /// Replace a user's details and rebuild their portfolio.
    pub async fn edit_user(&self, id: i64, update: UserUpdate) -> Result<User> {
        validate_stocks(&update.stocks)?;
        if !self.store.contains(id).await {
            return Err(Error::UserNotFound { id });
        }

        let portfolio = self.build_portfolio(&update.stocks).await;
        let user = User {
            id,
            email: update.email,
            first_name: update.first_name,
            last_name: update.last_name,
            stocks: update.stocks,
            portfolio,
        };
        // The user may have been deleted while the portfolio was fetching.
        let stored = self.store.replace(user).await?;

        tracing::info!(user_id = id, quotes = stored.portfolio.len(), "user updated");
        Ok(stored)
    }

    /// Look up one user
    pub async fn get_user(&self, id: i64) -> Result<User> {
        self.store
            .get(id)
            .await
            .ok_or(Error::UserNotFound { id })
    }

    /// All users, ordered by id
    pub async fn list_users(&self) -> Vec<User> {
        if self.store.is_empty().await {
            tracing::debug!("no users stored");
            return Vec::new();
        }
        self.store.list().await
    }

    /// Remove a user
    pub async fn delete_user(&self, id: i64) -> Result<User> {
        let user = self.store.remove(id).await?;
        let total_users = self.store.len().await;
        tracing::info!(
            user_id = id,
            total_users,
            "user deleted"
        );
        Ok(user)
    }

    async fn build_portfolio(&self, stocks: &[Identifier]) -> Vec<StockData> {
        if stocks.is_empty() {
            return Vec::new();
        }

        let cancel = CancellationToken::new();
        let stream = self.fetcher.fetch_all(stocks.iter().cloned(), cancel.clone());
        let report: PortfolioReport = match self.fetch_deadline {
            Some(deadline) => portfolio::collect_within(stream, &cancel, deadline).await,
            None => portfolio::collect_outcomes(stream).await,
        };

        if !report.is_complete() {
            tracing::warn!(
                failed = ?report.failed_identifiers(),
                deadline_exceeded = report.deadline_exceeded,
                "portfolio built with missing quotes"
            );
        }
        report.quotes
    }
}

/// Reject blank ticker symbols before any request is made.
fn validate_stocks(stocks: &[Identifier]) -> Result<()> {
    match stocks.iter().position(|s| s.trim().is_empty()) {
        Some(index) => Err(Error::Validation(format!(
            "stock identifier at position {index} is blank"
        ))),
        None => Ok(()),
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FetchConfig;
    use crate::fetcher::test_helpers::{CallLog, MockQuoteProvider, sample_quote};

    fn service_over(provider: MockQuoteProvider) -> (UserService, Arc<CallLog>) {
        let log = provider.log();
        let fetcher = Fetcher::new(Arc::new(provider), &FetchConfig::default());
        (UserService::new(Arc::new(UserStore::new()), fetcher), log)
    }

    fn user(id: i64, stocks: &[&str]) -> User {
        User {
            id,
            email: format!("user{id}@example.com"),
            first_name: "Ada".into(),
            last_name: "Lovelace".into(),
            stocks: stocks.iter().map(|s| s.to_string()).collect(),
            portfolio: Vec::new(),
        }
    }

    #[tokio::test]
    async fn create_user_fills_portfolio_from_stocks() {
        let (service, _) = service_over(MockQuoteProvider::new().with_quote("AAA").with_quote("BBB"));

        let created = service.create_user(user(1, &["AAA", "BBB"])).await.unwrap();

        assert_eq!(created.portfolio.len(), 2);
        assert!(created.portfolio.contains(&sample_quote("AAA")));
        assert!(created.portfolio.contains(&sample_quote("BBB")));
        assert_eq!(service.get_user(1).await.unwrap(), created);
    }

    #[tokio::test]
    async fn failed_tickers_are_left_out_of_the_portfolio() {
        let (service, _) =
            service_over(MockQuoteProvider::new().with_quote("AAA").with_status("ZZZ", 500));

        let created = service.create_user(user(1, &["AAA", "ZZZ"])).await.unwrap();

        assert_eq!(created.portfolio, vec![sample_quote("AAA")]);
        assert_eq!(created.stocks, vec!["AAA".to_string(), "ZZZ".to_string()]);
    }

    #[tokio::test]
    async fn client_supplied_portfolio_is_replaced() {
        let (service, _) = service_over(MockQuoteProvider::new().with_quote("AAA"));
        let mut input = user(1, &["AAA"]);
        input.portfolio = vec![sample_quote("FAKE"), sample_quote("FAKE2")];

        let created = service.create_user(input).await.unwrap();

        assert_eq!(created.portfolio, vec![sample_quote("AAA")]);
    }

    #[tokio::test]
    async fn duplicate_id_is_rejected_before_fetching() {
        let (service, log) = service_over(MockQuoteProvider::new().with_quote("AAA"));
        service.create_user(user(1, &["AAA"])).await.unwrap();
        let calls = log.started();

        let err = service.create_user(user(1, &["AAA"])).await.unwrap_err();

        assert!(matches!(err, Error::Duplicate { id: 1 }));
        assert_eq!(log.started(), calls);
    }

    #[tokio::test]
    async fn blank_ticker_is_a_validation_error() {
        let (service, log) = service_over(MockQuoteProvider::new().with_quote("AAA"));

        let err = service.create_user(user(1, &["AAA", "  "])).await.unwrap_err();

        assert!(matches!(err, Error::Validation(_)));
        assert_eq!(log.started(), 0);
        assert!(service.list_users().await.is_empty());
    }

    #[tokio::test]
    async fn user_without_stocks_gets_an_empty_portfolio() {
        let (service, log) = service_over(MockQuoteProvider::new());

        let created = service.create_user(user(4, &[])).await.unwrap();

        assert!(created.portfolio.is_empty());
        assert_eq!(log.started(), 0);
    }

    #[tokio::test]
    async fn edit_user_rebuilds_the_portfolio() {
        let (service, _) = service_over(MockQuoteProvider::new().with_quote("AAA").with_quote("CCC"));
        service.create_user(user(2, &["AAA"])).await.unwrap();

        let updated = service
            .edit_user(
                2,
                UserUpdate {
                    email: "new@example.com".into(),
                    first_name: "Grace".into(),
                    last_name: "Hopper".into(),
                    stocks: vec!["CCC".into()],
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.id, 2);
        assert_eq!(updated.first_name, "Grace");
        assert_eq!(updated.portfolio, vec![sample_quote("CCC")]);
        assert_eq!(service.get_user(2).await.unwrap(), updated);
    }

    #[tokio::test]
    async fn editing_an_unknown_user_fetches_nothing() {
        let (service, log) = service_over(MockQuoteProvider::new().with_quote("AAA"));

        let err = service
            .edit_user(
                99,
                UserUpdate {
                    stocks: vec!["AAA".into()],
                    ..UserUpdate::default()
                },
            )
            .await
            .unwrap_err();

        assert!(matches!(err, Error::UserNotFound { id: 99 }));
        assert_eq!(log.started(), 0);
    }

    #[tokio::test]
    async fn delete_and_lookup_report_missing_users() {
        let (service, _) = service_over(MockQuoteProvider::new());
        service.create_user(user(3, &[])).await.unwrap();

        assert_eq!(service.delete_user(3).await.unwrap().id, 3);
        assert!(matches!(
            service.delete_user(3).await,
            Err(Error::UserNotFound { id: 3 })
        ));
        assert!(matches!(
            service.get_user(3).await,
            Err(Error::UserNotFound { id: 3 })
        ));
    }

    #[tokio::test]
    async fn store_size_tracks_creates_and_deletes() {
        let (service, _) = service_over(MockQuoteProvider::new());
        assert!(service.store().is_empty().await);

        service.create_user(user(1, &[])).await.unwrap();
        service.create_user(user(2, &[])).await.unwrap();
        assert_eq!(service.store().len().await, 2);
        assert_eq!(service.list_users().await.len(), 2);

        service.delete_user(1).await.unwrap();
        service.delete_user(2).await.unwrap();
        assert!(service.store().is_empty().await);
        assert!(service.list_users().await.is_empty());
    }

    #[tokio::test]
    async fn fetch_deadline_bounds_portfolio_refresh() {
        let provider = MockQuoteProvider::new()
            .with_quote("FAST")
            .with_quote("SLOW")
            .with_delay("SLOW", Duration::from_secs(30));
        let (service, log) = service_over(provider);
        let service = service.with_fetch_deadline(Some(Duration::from_millis(200)));

        let created = tokio::time::timeout(
            Duration::from_secs(5),
            service.create_user(user(1, &["FAST", "SLOW"])),
        )
        .await
        .expect("deadline bounds the request")
        .unwrap();

        assert_eq!(created.portfolio, vec![sample_quote("FAST")]);
        assert_eq!(log.in_flight(), 0);
    }

    #[test]
    fn validate_stocks_points_at_the_blank_entry() {
        let err = validate_stocks(&["AAA".into(), String::new()]).unwrap_err();
        assert!(err.to_string().contains("position 1"));
        assert!(validate_stocks(&[]).is_ok());
    }
}
