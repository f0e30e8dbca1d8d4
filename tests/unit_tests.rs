use clap::Parser;
use metaobject_sync::config::{parse_delimiter, parse_duration_to_secs};
use metaobject_sync::ShopifyOpts;

fn parse(args: &[&str]) -> Result<ShopifyOpts, clap::Error> {
    ShopifyOpts::try_parse_from(std::iter::once("metaobject-sync").chain(args.iter().copied()))
}

#[test]
fn test_shopify_opts_defaults() {
    let opts = parse(&[
        "--shop-domain",
        "demo.myshopify.com",
        "--access-token",
        "shpat_test",
    ])
    .unwrap();

    assert_eq!(opts.shop_domain, "demo.myshopify.com");
    assert_eq!(opts.access_token, "shpat_test");
    assert_eq!(opts.api_version, "2025-04");
    assert_eq!(opts.cache_dir, None);
    assert_eq!(opts.cache_ttl, "1h");
}

#[test]
fn test_client_targets_shop_and_version() {
    let opts = parse(&[
        "--shop-domain",
        "https://demo.myshopify.com/",
        "--access-token",
        "shpat_test",
        "--api-version",
        "2024-10",
    ])
    .unwrap();

    let client = opts.build_client().unwrap();
    assert_eq!(
        client.endpoint(),
        "https://demo.myshopify.com/admin/api/2024-10/graphql.json"
    );
}

#[test]
fn test_cache_ttl_is_validated_when_caching() {
    let dir = tempfile::TempDir::new().unwrap();
    let opts = ShopifyOpts {
        shop_domain: "demo.myshopify.com".to_string(),
        access_token: "shpat_test".to_string(),
        api_version: "2025-04".to_string(),
        cache_dir: Some(dir.path().to_path_buf()),
        cache_ttl: "soon".to_string(),
    };
    assert!(opts.build_client().is_err());

    let opts = ShopifyOpts {
        cache_ttl: "30m".to_string(),
        ..opts
    };
    assert!(opts.build_client().is_ok());
}

#[test]
fn test_delimiter_parsing() {
    assert_eq!(parse_delimiter(",").unwrap(), b',');
    assert_eq!(parse_delimiter(";").unwrap(), b';');
    assert_eq!(parse_delimiter("\\t").unwrap(), b'\t');
    assert!(parse_delimiter("").is_err());
    assert!(parse_delimiter(";;").is_err());
    assert!(parse_delimiter("é").is_err());
}

#[test]
fn test_duration_parsing() {
    assert_eq!(parse_duration_to_secs("1h").unwrap(), 3600);
    assert_eq!(parse_duration_to_secs("300").unwrap(), 300);
}
