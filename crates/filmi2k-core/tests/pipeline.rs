//! End-to-end pipeline tests against a mock site and metadata service

use filmi2k_core::{Filmi2kScraper, RawListing, ScraperConfig};
use serde_json::json;
use wiremock::matchers::{method, path, path_regex, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Site and metadata service both served by the mock server
fn scraper_for(server: &MockServer) -> Filmi2kScraper {
    let config = ScraperConfig {
        site_url: server.uri(),
        metadata_url: server.uri(),
        ..ScraperConfig::default()
    };
    Filmi2kScraper::with_config(config).unwrap()
}

fn article(site: &str, slug: &str, title: &str) -> String {
    format!(
        r#"<article class="post"><a href="{}/{}/"><img src="p.jpg"></a><h2 class="entry-title">{}</h2></article>"#,
        site, slug, title
    )
}

async fn mount_json(server: &MockServer, route: &str, body: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

async fn mount_html(server: &MockServer, route: &str, body: String, calls: u64) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .expect(calls)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_catalog_falls_back_to_markup_when_term_is_unknown() {
    let server = MockServer::start().await;
    let site = server.uri();

    Mock::given(method("GET"))
        .and(path("/wp-json/wp/v2/categories"))
        .and(query_param("slug", "filmi-drama"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let page = format!(
        "<html><body>{}{}</body></html>",
        article(&site, "heat-1995", "Heat / Жега (1995)"),
        article(&site, "unknown-2020", "Unknown (2020)")
    );
    mount_html(&server, "/category/filmi-drama/", page, 1).await;

    mount_json(
        &server,
        "/catalog/movie/top/search=Heat.json",
        json!({"metas": [
            {"id": "tt0113277", "name": "Heat", "releaseInfo": "1995", "poster": "https://img.example/heat.jpg"}
        ]}),
    )
    .await;
    mount_json(&server, "/catalog/movie/top/search=Unknown.json", json!({"metas": []})).await;

    let scraper = scraper_for(&server);
    let entries = scraper.list_catalog("filmi2k-drama", 0).await;

    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].canonical_id, "tt0113277");
    assert_eq!(entries[0].kind, "movie");
    assert_eq!(entries[0].display_name, "Heat / Жега (1995)");
    assert_eq!(entries[0].poster_url, "https://img.example/heat.jpg");
    assert_eq!(
        scraper.state().slug_for("tt0113277").as_deref(),
        Some("heat-1995")
    );
}

#[tokio::test]
async fn test_catalog_via_structured_api_is_cached() {
    let server = MockServer::start().await;
    let site = server.uri();

    Mock::given(method("GET"))
        .and(path("/wp-json/wp/v2/tags"))
        .and(query_param("slug", "top-250-imdb-filmi"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"id": 42}])))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/wp-json/wp/v2/posts"))
        .and(query_param("tags", "42"))
        .and(query_param("page", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"link": format!("{}/heat-1995/", site), "title": {"rendered": "Heat / Жега &amp; Co (1995)"}}
        ])))
        .expect(1)
        .mount(&server)
        .await;

    // Must not be reached while the API answers
    mount_html(&server, "/tag/top-250-imdb-filmi/", String::new(), 0).await;

    mount_json(
        &server,
        "/catalog/movie/top/search=Heat.json",
        json!({"metas": [{"id": "tt0113277", "name": "Heat", "releaseInfo": "1995"}]}),
    )
    .await;

    let scraper = scraper_for(&server);
    let first = scraper.list_catalog("filmi2k-top-imdb", 0).await;
    let second = scraper.list_catalog("filmi2k-top-imdb", 5).await;

    assert_eq!(first.len(), 1);
    assert_eq!(first[0].display_name, "Heat / Жега & Co (1995)");
    assert_eq!(first[0].poster_url, "");
    assert_eq!(first, second);
}

#[tokio::test]
async fn test_newest_second_page_after_api_rejects_page() {
    let server = MockServer::start().await;
    let site = server.uri();

    Mock::given(method("GET"))
        .and(path("/wp-json/wp/v2/posts"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(400))
        .expect(1)
        .mount(&server)
        .await;

    let page = format!("<html><body>{}</body></html>", article(&site, "up-2009", "Up (2009)"));
    mount_html(&server, "/page/2/", page, 1).await;

    mount_json(
        &server,
        "/catalog/movie/top/search=Up.json",
        json!({"metas": [{"id": "tt1049413", "name": "Up", "releaseInfo": "2009"}]}),
    )
    .await;

    let scraper = scraper_for(&server);
    let entries = scraper.list_catalog("filmi2k-newest", 20).await;

    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].canonical_id, "tt1049413");
}

#[tokio::test]
async fn test_catalog_returns_at_most_one_page() {
    let server = MockServer::start().await;
    let site = server.uri();

    let articles: String = (0..25)
        .map(|n| article(&site, &format!("movie-{}-2001", n), &format!("Movie{} (2001)", n)))
        .collect();
    mount_html(
        &server,
        "/category/filmi-ekshan/",
        format!("<html><body>{}</body></html>", articles),
        1,
    )
    .await;

    Mock::given(method("GET"))
        .and(path_regex(r"^/catalog/movie/top/search=Movie\d+\.json$"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"metas": [
            {"id": "tt0000001", "name": "Movie", "releaseInfo": "2001"}
        ]})))
        .expect(20)
        .mount(&server)
        .await;

    // The term lookup is not mocked; the API strategy fails with 404.
    let scraper = scraper_for(&server);
    let entries = scraper.list_catalog("filmi2k-ekshan", 0).await;

    assert_eq!(entries.len(), 20);
    for entry in &entries {
        assert!(!entry.canonical_id.is_empty());
        assert!(!entry.display_name.is_empty());
    }
}

#[tokio::test]
async fn test_unknown_category_makes_no_requests() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let scraper = scraper_for(&server);
    assert!(scraper.list_catalog("filmi2k-opera", 0).await.is_empty());
}

#[tokio::test]
async fn test_search_via_structured_api() {
    let server = MockServer::start().await;
    let site = server.uri();

    Mock::given(method("GET"))
        .and(path("/wp-json/wp/v2/posts"))
        .and(query_param("search", "heat"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"link": format!("{}/heat-1995/", site), "title": {"rendered": "Heat (1995) BG Audio"}}
        ])))
        .expect(1)
        .mount(&server)
        .await;

    mount_json(
        &server,
        "/catalog/movie/top/search=Heat.json",
        json!({"metas": [{"id": "tt0113277", "name": "Heat", "releaseInfo": "1995"}]}),
    )
    .await;

    let scraper = scraper_for(&server);
    let entries = scraper.search("  heat ").await;
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].canonical_id, "tt0113277");

    // Served from the cache
    assert_eq!(scraper.search("heat").await, entries);
}

#[tokio::test]
async fn test_resolution_prefers_year_match() {
    let server = MockServer::start().await;
    mount_json(
        &server,
        "/catalog/movie/top/search=Foo.json",
        json!({"metas": [
            {"id": "tt0000001", "name": "Foo", "releaseInfo": "2001"},
            {"id": "tt0000002", "name": "Bar", "releaseInfo": "2005"}
        ]}),
    )
    .await;

    let scraper = scraper_for(&server);
    let listing = RawListing {
        title: "Foo / Фу (2005)".to_string(),
        year_hint: Some(2005),
        site_slug: "foo-2005".to_string(),
    };

    let meta = scraper.resolve_identifier(&listing).await.unwrap();
    assert_eq!(meta.canonical_id, "tt0000002");
    assert_eq!(meta.site_slug, "foo-2005");
    assert_eq!(
        scraper.state().slug_for("tt0000002").as_deref(),
        Some("foo-2005")
    );
}

#[tokio::test]
async fn test_resolution_failure_is_no_match() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/catalog/movie/top/search=Heat.json"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let scraper = scraper_for(&server);
    let listing = RawListing {
        title: "Heat (1995)".to_string(),
        year_hint: Some(1995),
        site_slug: "heat-1995".to_string(),
    };

    assert!(scraper.resolve_identifier(&listing).await.is_none());
    assert_eq!(scraper.state().known_slugs(), 0);
}

#[tokio::test]
async fn test_streams_are_unpacked_and_cached() {
    let server = MockServer::start().await;
    let site = server.uri();
    let embed_url = format!("{}/embed/abc", site);

    mount_html(
        &server,
        "/heat-1995/",
        format!(r#"<html><body><iframe src="{}"></iframe></body></html>"#, embed_url),
        1,
    )
    .await;

    let embed_page = r#"<html><script>eval(function(p,a,c,k,e,d){return p}('0 1={2:"3://4.5/6.m3u8",7:"8"}',36,9,'var|player|file|https|cdn|example|master|label|HD'.split('|'),0,{}))</script></html>"#;
    mount_html(&server, "/embed/abc", embed_page.to_string(), 1).await;

    let scraper = scraper_for(&server);
    scraper.state().remember_slug("tt0113277", "heat-1995");

    let first = scraper.list_streams("tt0113277").await;
    let second = scraper.list_streams("tt0113277").await;
    assert_eq!(first, second);

    assert_eq!(first.len(), 1);
    let stream = &first[0];
    assert_eq!(stream.label, "Filmi2K");
    assert!(stream.title.ends_with("HD (HLS)"));
    assert_eq!(stream.media_url(), Some("https://cdn.example/master.m3u8"));
    assert_eq!(stream.external_url(), None);

    let headers = stream.required_headers().unwrap();
    assert_eq!(headers["Referer"], embed_url);
    assert_eq!(headers["Origin"], site);
}

#[tokio::test]
async fn test_empty_embed_becomes_external_link() {
    let server = MockServer::start().await;
    let site = server.uri();
    let embed_url = format!("{}/embed/abc", site);

    mount_html(
        &server,
        "/heat-1995/",
        format!(r#"<html><body><iframe src="{}"></iframe></body></html>"#, embed_url),
        2,
    )
    .await;
    mount_html(
        &server,
        "/embed/abc",
        "<html><body>Video is processing</body></html>".to_string(),
        1,
    )
    .await;

    let scraper = scraper_for(&server);
    scraper.state().remember_slug("tt0113277", "heat-1995");

    assert_eq!(scraper.embed_candidates("tt0113277").await, vec![embed_url.clone()]);

    let streams = scraper.list_streams("tt0113277").await;
    assert_eq!(streams.len(), 1);
    assert_eq!(streams[0].external_url(), Some(embed_url.as_str()));
    assert_eq!(streams[0].media_url(), None);
    assert!(streams[0].title.ends_with(" - Плейър"));
}

#[tokio::test]
async fn test_page_without_embeds_links_to_itself() {
    let server = MockServer::start().await;
    let site = server.uri();

    mount_html(
        &server,
        "/heat-1995/",
        "<html><body><p>Coming soon</p></body></html>".to_string(),
        1,
    )
    .await;

    let scraper = scraper_for(&server);
    scraper.state().remember_slug("tt0113277", "heat-1995");

    let streams = scraper.list_streams("tt0113277").await;
    assert_eq!(streams.len(), 1);
    assert_eq!(streams[0].title, "Отвори във браузър");
    let expected = format!("{}/heat-1995/", site);
    assert_eq!(streams[0].external_url(), Some(expected.as_str()));
}

#[tokio::test]
async fn test_slug_found_by_site_search() {
    let server = MockServer::start().await;
    let site = server.uri();

    mount_json(
        &server,
        "/meta/movie/tt0113277.json",
        json!({"meta": {"id": "tt0113277", "name": "Heat", "releaseInfo": "1995"}}),
    )
    .await;

    let results = format!(
        r#"<html><body>
            <a href="{site}/heat-1986/">Heat (1986)</a>
            <a href="{site}/category/filmi-ekshan/">Heat (1995)</a>
            <a href="{site}/heat-1995/">Heat / Жега (1995)</a>
        </body></html>"#
    );
    Mock::given(method("GET"))
        .and(path("/"))
        .and(query_param("s", "Heat"))
        .respond_with(ResponseTemplate::new(200).set_body_string(results))
        .expect(1)
        .mount(&server)
        .await;

    let scraper = scraper_for(&server);
    assert_eq!(scraper.find_slug("tt0113277").await.as_deref(), Some("heat-1995"));

    // Second lookup comes from the reverse index
    assert_eq!(scraper.find_slug("tt0113277").await.as_deref(), Some("heat-1995"));
    assert_eq!(
        scraper.state().slug_for("tt0113277").as_deref(),
        Some("heat-1995")
    );
}

#[tokio::test]
async fn test_streams_without_detail_page_are_empty() {
    let server = MockServer::start().await;
    mount_json(&server, "/meta/movie/tt9999999.json", json!({"meta": null})).await;

    let scraper = scraper_for(&server);
    assert!(scraper.list_streams("tt9999999").await.is_empty());
}

#[tokio::test]
async fn test_failed_embed_does_not_affect_its_group() {
    let server = MockServer::start().await;
    let site = server.uri();

    mount_html(
        &server,
        "/heat-1995/",
        format!(
            r#"<html><body><iframe src="{0}/embed/bad"></iframe><iframe src="{0}/embed/good"></iframe></body></html>"#,
            site
        ),
        1,
    )
    .await;

    Mock::given(method("GET"))
        .and(path("/embed/bad"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let embed_page = r#"<html><script>eval(function(p,a,c,k,e,d){return p}('0 1={2:"3://4.5/6.m3u8",7:"8"}',36,9,'var|player|file|https|cdn|example|master|label|HD'.split('|'),0,{}))</script></html>"#;
    mount_html(&server, "/embed/good", embed_page.to_string(), 1).await;

    let scraper = scraper_for(&server);
    scraper.state().remember_slug("tt0113277", "heat-1995");

    let streams = scraper.list_streams("tt0113277").await;

    assert_eq!(streams.len(), 1);
    assert_eq!(streams[0].media_url(), Some("https://cdn.example/master.m3u8"));
    assert!(streams.iter().all(|s| s.external_url().is_none()));
}

#[tokio::test]
async fn test_paging_past_the_end_is_empty_and_not_cached() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/wp-json/wp/v2/posts"))
        .and(query_param("page", "3"))
        .respond_with(ResponseTemplate::new(400))
        .expect(2)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/page/3/"))
        .respond_with(ResponseTemplate::new(404))
        .expect(2)
        .mount(&server)
        .await;

    let scraper = scraper_for(&server);
    assert!(scraper.list_catalog("filmi2k-newest", 40).await.is_empty());
    // Nothing was cached, so the second call goes back to the site
    assert!(scraper.list_catalog("filmi2k-newest", 40).await.is_empty());
}
