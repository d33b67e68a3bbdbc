use super::*;
use session_sync::navigator::CountingNavigator;

fn offline_stores(tokens: TokenStore) -> (ClientStores, Arc<CountingNavigator>) {
    let config = ClientConfig::default().with_api_url("http://127.0.0.1:9/api").unwrap();
    let navigator = Arc::new(CountingNavigator::default());
    let stores = ClientStores::connect(&config, tokens, navigator.clone()).unwrap();
    (stores, navigator)
}

#[tokio::test]
async fn refresh_without_refresh_token_is_not_a_session_end() {
    let (stores, navigator) = offline_stores(TokenStore::in_memory());

    let err = refresh_session(&stores).await.unwrap_err();
    assert!(matches!(err, CliError::NoRefreshToken));
    assert_eq!(navigator.redirects(), 0);
}

#[tokio::test]
async fn access_token_alone_keeps_session_when_refresh_is_requested() {
    let tokens = TokenStore::in_memory();
    tokens.set_access("A1");
    let (stores, navigator) = offline_stores(tokens.clone());

    let err = refresh_session(&stores).await.unwrap_err();
    assert!(matches!(err, CliError::NoRefreshToken));
    assert_eq!(tokens.get().as_deref(), Some("A1"));
    assert!(stores.auth.snapshot().is_authenticated);
    assert_eq!(navigator.redirects(), 0);
}

#[tokio::test]
async fn failed_refresh_reports_ended_session() {
    let tokens = TokenStore::in_memory();
    tokens.set("A1", "R1");
    let (stores, navigator) = offline_stores(tokens.clone());

    let err = refresh_session(&stores).await.unwrap_err();
    assert!(matches!(err, CliError::RefreshFailed));
    assert!(tokens.get().is_none());
    assert!(!stores.auth.snapshot().is_authenticated);
    assert_eq!(navigator.redirects(), 1);
}
