use crate::doc;
use crate::engine::errors::FetchError;
use crate::pipeline::RemoteFetchAdapter;
use crate::test_helpers::factory::Factory;

#[tokio::test]
async fn test_fetch_factory_replays_responses() {
    let fetch = Factory::fetch()
        .returning(vec![doc! {"a" => 1}])
        .failing(FetchError::NoResponse)
        .create();

    let first = fetch.fetch_tabular_data("org-1", &[doc! {"$match" => doc! {}}]).await;
    assert_eq!(first, Ok(vec![doc! {"a" => 1}]));
    let second = fetch.fetch_tabular_data("org-1", &[]).await;
    assert_eq!(second, Err(FetchError::NoResponse));
    let third = fetch.fetch_tabular_data("org-1", &[]).await;
    assert_eq!(third, Err(FetchError::NoResponse));

    let calls = fetch.calls();
    assert_eq!(calls.len(), 3);
    assert_eq!(calls[0].organization_id, "org-1");
    assert_eq!(calls[0].pipeline, vec![doc! {"$match" => doc! {}}]);
}

#[tokio::test]
async fn test_fetch_factory_defaults_to_empty() {
    let fetch = Factory::fetch().create();
    assert_eq!(fetch.fetch_tabular_data("org-1", &[]).await, Ok(vec![]));
}
