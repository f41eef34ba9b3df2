mod common;

use anyhow::Result;
use content_guard::params::{ExtraParams, ParamDeclaration, ParamSchema};
use content_guard::{ErrorSource, RequestOptions};
use serde_json::json;

use common::{ARTICLE, AUTHOR};

fn invalid_key(err: &content_guard::Error) -> Option<&str> {
    err.as_validation().and_then(|err| err.details.key.as_deref())
}

#[tokio::test]
async fn hidden_filter_key_is_rejected() -> Result<()> {
    let api = common::api();
    let err = api
        .validate
        .query(&json!({ "filters": { "internalNotes": 1, "title": 2 } }), ARTICLE, &RequestOptions::new())
        .await
        .unwrap_err();

    assert_eq!(err.to_string(), "Invalid key internalNotes");
    let details = &err.as_validation().unwrap().details;
    assert_eq!(details.source, Some(ErrorSource::Query));
    assert_eq!(details.param.as_deref(), Some("filters"));
    Ok(())
}

#[tokio::test]
async fn input_identifiers_are_rejected() -> Result<()> {
    let api = common::api();
    let err = api
        .validate
        .input(&json!({ "id": 5, "documentId": "x", "title": "n" }), ARTICLE, &RequestOptions::new())
        .await
        .unwrap_err();
    assert_eq!(invalid_key(&err), Some("id"));
    assert_eq!(err.as_validation().unwrap().details.source, Some(ErrorSource::Body));

    let err = api
        .validate
        .input(&json!({ "documentId": "x", "title": "n" }), ARTICLE, &RequestOptions::new())
        .await
        .unwrap_err();
    assert_eq!(invalid_key(&err), Some("documentId"));
    Ok(())
}

#[tokio::test]
async fn clean_payloads_pass() -> Result<()> {
    let api = common::api();
    let options = RequestOptions::new().with_strict_params(true);

    api.validate.input(&json!({ "title": "t", "seo": { "metaTitle": "m" } }), ARTICLE, &options).await?;
    api.validate
        .query(
            &json!({
                "filters": { "title": { "$eq": "t" }, "author": { "name": { "$startsWith": "A" } } },
                "sort": "views:desc",
                "fields": ["title"],
                "populate": { "author": { "fields": ["name"] }, "blocks": { "populate": "*" } },
                "pagination": { "page": 1, "pageSize": 25 },
                "status": "published"
            }),
            ARTICLE,
            &options,
        )
        .await?;
    Ok(())
}

#[tokio::test]
async fn strict_query_rejects_unknown_top_level_keys() -> Result<()> {
    let api = common::api();
    let err = api
        .validate
        .query(&json!({ "locale": "en", "debug": true }), ARTICLE, &RequestOptions::new().with_strict_params(true))
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "Invalid key debug");

    api.validate
        .query(&json!({ "locale": "en", "debug": true }), ARTICLE, &RequestOptions::new().with_strict_params(false))
        .await?;
    Ok(())
}

#[tokio::test]
async fn strict_input_rejects_unrecognized_fields() -> Result<()> {
    let api = common::api();
    let err = api
        .validate
        .input(&json!({ "title": "t", "bogus": 1 }), ARTICLE, &RequestOptions::new().with_strict_params(true))
        .await
        .unwrap_err();
    assert_eq!(invalid_key(&err), Some("bogus"));
    Ok(())
}

#[tokio::test]
async fn non_writable_and_restricted_input_is_rejected() -> Result<()> {
    let api = common::api();
    let err = api
        .validate
        .input(&json!({ "slug": "s" }), ARTICLE, &RequestOptions::new())
        .await
        .unwrap_err();
    assert_eq!(invalid_key(&err), Some("slug"));

    let options = RequestOptions::new().with_auth(common::deny(&[AUTHOR]));
    let err = api.validate.input(&json!({ "author": 1 }), ARTICLE, &options).await.unwrap_err();
    assert_eq!(invalid_key(&err), Some("author"));
    Ok(())
}

#[tokio::test]
async fn nested_populate_queries_are_validated() -> Result<()> {
    let api = common::api();

    let err = api
        .validate
        .query(&json!({ "populate": { "author": { "filters": { "accessKey": { "$eq": "x" } } } } }), ARTICLE, &RequestOptions::new())
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "Invalid key accessKey");
    assert_eq!(err.as_validation().unwrap().details.param.as_deref(), Some("populate"));

    let err = api
        .validate
        .query(&json!({ "populate": { "blocks": { "fields": ["heading"] } } }), ARTICLE, &RequestOptions::new())
        .await
        .unwrap_err();
    assert_eq!(invalid_key(&err), Some("fields"));

    let err = api
        .validate
        .query(&json!({ "populate": { "createdBy": { "fields": ["password"] } } }), ARTICLE, &RequestOptions::new())
        .await
        .unwrap_err();
    assert_eq!(invalid_key(&err), Some("password"));
    Ok(())
}

#[tokio::test]
async fn unknown_dynamic_zone_components_are_rejected() -> Result<()> {
    let api = common::api();
    let err = api
        .validate
        .query(
            &json!({ "populate": { "blocks": { "on": { "blocks.hero": { "populate": "*" }, "shared.seo": {} } } } }),
            ARTICLE,
            &RequestOptions::new(),
        )
        .await
        .unwrap_err();
    assert_eq!(invalid_key(&err), Some("shared.seo"));
    Ok(())
}

#[tokio::test]
async fn pagination_limits_are_enforced() -> Result<()> {
    let api = common::api();
    let options = RequestOptions::new();

    let err = api.validate.query(&json!({ "pageSize": "many" }), ARTICLE, &options).await.unwrap_err();
    assert_eq!(err.as_validation().unwrap().details.param.as_deref(), Some("pageSize"));

    let err = api.validate.query(&json!({ "status": "archived" }), ARTICLE, &options).await.unwrap_err();
    assert_eq!(invalid_key(&err), Some("status"));
    Ok(())
}

#[tokio::test]
async fn invalid_extra_params_name_their_source() -> Result<()> {
    let mut params = ExtraParams::new();
    params.add_query_params(vec![ParamDeclaration::new("minViews", ParamSchema::integer())])?;
    params.add_input_params(vec![ParamDeclaration::new("notify", ParamSchema::boolean())])?;
    let api = common::api_with_params(params);
    let options = RequestOptions::new().with_strict_params(true);

    let err = api.validate.query(&json!({ "minViews": "lots" }), ARTICLE, &options).await.unwrap_err();
    let details = &err.as_validation().unwrap().details;
    assert_eq!(details.source, Some(ErrorSource::Query));
    assert_eq!(details.param.as_deref(), Some("minViews"));

    let err = api.validate.input(&json!({ "title": "t", "notify": "perhaps" }), ARTICLE, &options).await.unwrap_err();
    let details = &err.as_validation().unwrap().details;
    assert_eq!(details.source, Some(ErrorSource::Body));
    assert_eq!(details.param.as_deref(), Some("notify"));

    api.validate.query(&json!({ "minViews": "10" }), ARTICLE, &options).await?;
    api.validate.input(&json!({ "title": "t", "notify": "true" }), ARTICLE, &options).await?;
    Ok(())
}

#[tokio::test]
async fn unknown_polymorphic_elements_are_rejected() -> Result<()> {
    let api = common::api();
    let options = RequestOptions::new();

    let err = api
        .validate
        .input(&json!({ "blocks": [{ "__component": "blocks.nope" }] }), ARTICLE, &options)
        .await
        .unwrap_err();
    assert_eq!(err.status_code(), 400);
    assert_eq!(err.to_string(), "Invalid key __component");
    assert_eq!(err.as_validation().unwrap().details.source, Some(ErrorSource::Body));

    let err = api
        .validate
        .input(&json!({ "related": [{ "__type": "api::ghost.ghost", "id": 1 }] }), ARTICLE, &options)
        .await
        .unwrap_err();
    assert_eq!(invalid_key(&err), Some("__type"));
    assert_eq!(err.as_validation().unwrap().details.source, Some(ErrorSource::Body));

    let err = api
        .validate
        .input(&json!({ "blocks": [{ "heading": "h" }] }), ARTICLE, &options)
        .await
        .unwrap_err();
    assert_eq!(invalid_key(&err), Some("__component"));
    Ok(())
}

#[tokio::test]
async fn sort_paths_past_scalars_are_rejected() -> Result<()> {
    let api = common::api();
    let err = api
        .validate
        .query(&json!({ "sort": "title.anything:asc" }), ARTICLE, &RequestOptions::new())
        .await
        .unwrap_err();

    assert_eq!(invalid_key(&err), Some("anything"));
    let details = &err.as_validation().unwrap().details;
    assert_eq!(details.path.as_deref(), Some("title.anything"));
    assert_eq!(details.param.as_deref(), Some("sort"));
    Ok(())
}
