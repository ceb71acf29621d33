//! Integration tests for the crawler
//!
//! These tests use wiremock to stand in for the catalog and test the full
//! crawl cycle end-to-end against an on-disk store and corpus directory.

use chitanka_corpus::config::{CatalogConfig, Config, CrawlerConfig, OutputConfig, RetryConfig};
use chitanka_corpus::crawler::{run_crawl, Coordinator};
use chitanka_corpus::storage::{SqliteStorage, TextStore};
use std::collections::HashSet;
use std::io::{Cursor, Write};
use std::path::Path;
use std::time::Duration;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

/// Creates a test configuration pointing at the mock catalog
fn create_test_config(server: &MockServer, root: &Path) -> Config {
    Config {
        catalog: CatalogConfig {
            base_url: server.uri(),
            download_url: format!("{}/dl", server.uri()),
            user_agent: "TestBot/1.0".to_string(),
            request_timeout_secs: 5,
        },
        crawler: CrawlerConfig {
            alphabet: "ab".to_string(),
            save_delay_ms: 0,
            key_delay_ms: 0,
            author_delay_ms: 0,
            default_quota: 10,
        },
        retry: RetryConfig {
            max_retries: 1,
            rate_limit_base_ms: 1,
            network_retry_ms: 1,
        },
        output: OutputConfig {
            database_path: root.join("corpus.db").display().to_string(),
            data_dir: root.join("data"),
            unknown_dir: "Unknown".to_string(),
        },
    }
}

fn search_xml(texts: &[(i64, &str, Option<i64>)]) -> String {
    let mut xml = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?><results><texts>");
    for (id, title, author) in texts {
        xml.push_str(&format!("<text><id>{}</id><title>{}</title>", id, title));
        if let Some(author) = author {
            xml.push_str(&format!("<author><id>{}</id></author>", author));
        }
        xml.push_str("</text>");
    }
    xml.push_str("</texts></results>");
    xml
}

fn person_xml(name: &str, country: &str) -> String {
    format!(
        "<results><persons><person><name>{}</name><real-name>{}</real-name>\
         <country>{}</country></person></persons></results>",
        name, name, country
    )
}

fn package(content: &str) -> Vec<u8> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    writer
        .start_file("text.txt", SimpleFileOptions::default())
        .unwrap();
    writer.write_all(content.as_bytes()).unwrap();
    writer.finish().unwrap().into_inner()
}

/// Mounts results for key `aaa` and empty results for every other key
async fn mount_search(server: &MockServer, texts: &[(i64, &str, Option<i64>)]) {
    Mock::given(method("GET"))
        .and(path("/texts/search.xml"))
        .and(query_param("q", "aaa"))
        .respond_with(ResponseTemplate::new(200).set_body_string(search_xml(texts)))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/texts/search.xml"))
        .respond_with(ResponseTemplate::new(200).set_body_string(search_xml(&[])))
        .mount(server)
        .await;
}

async fn mount_person(server: &MockServer, id: &str, body: String) {
    Mock::given(method("GET"))
        .and(path("/persons/search.xml"))
        .and(query_param("q", id))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(server)
        .await;
}

async fn mount_package(server: &MockServer, id: i64, content: &str, expected: u64) {
    Mock::given(method("GET"))
        .and(path(format!("/dl/text/{}.txt.zip", id)))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(package(content)))
        .expect(expected)
        .mount(server)
        .await;
}

fn text_author(storage: &SqliteStorage, text_id: i64) -> Option<i64> {
    storage
        .connection()
        .query_row(
            "SELECT author_id FROM texts WHERE text_id = ?1",
            [text_id],
            |row| row.get(0),
        )
        .unwrap()
}

#[tokio::test]
async fn test_quota_stops_crawl_immediately() {
    let server = MockServer::start().await;
    mount_search(&server, &[(1, "Под игото", Some(50)), (2, "Чичовци", Some(50))]).await;
    mount_person(&server, "50", person_xml("Иван Вазов", "BG")).await;
    mount_package(&server, 1, "Текст едно.", 1).await;
    mount_package(&server, 2, "Текст две.", 0).await;

    let dir = tempfile::tempdir().unwrap();
    let mut config = create_test_config(&server, dir.path());
    // Reaching the quota must not wait on any pacing delay
    config.crawler.save_delay_ms = 60_000;
    config.crawler.key_delay_ms = 60_000;

    let report = tokio::time::timeout(Duration::from_secs(10), run_crawl(config, 1, None))
        .await
        .expect("crawl should stop as soon as the quota is reached")
        .unwrap();

    assert_eq!(report.saved, 1);
    assert_eq!(report.keys_searched, 1);
    assert!(!report.interrupted);

    let file = dir.path().join("data").join("BG").join("1_Под_игото!.txt");
    assert_eq!(std::fs::read_to_string(file).unwrap(), "Текст едно.");

    let storage = SqliteStorage::new(&dir.path().join("corpus.db")).unwrap();
    assert_eq!(
        storage.list_known_text_ids().unwrap(),
        HashSet::from([1])
    );
    assert_eq!(text_author(&storage, 1), Some(50));

    let author = storage.get_author(50).unwrap().unwrap();
    assert_eq!(author.name, "Иван Вазов");
    assert_eq!(author.country_name.as_deref(), Some("BG"));
}

#[tokio::test]
async fn test_second_run_skips_known_texts() {
    let server = MockServer::start().await;
    mount_search(&server, &[(1, "Първи", Some(50)), (2, "Втори", Some(50))]).await;
    mount_person(&server, "50", person_xml("Автор", "BG")).await;
    mount_package(&server, 1, "Едно.", 1).await;
    mount_package(&server, 2, "Две.", 1).await;

    let dir = tempfile::tempdir().unwrap();
    let config = create_test_config(&server, dir.path());
    let db_path = dir.path().join("corpus.db");

    let storage = SqliteStorage::new(&db_path).unwrap();
    let mut coordinator = Coordinator::new(config.clone(), storage, 5).unwrap();
    let first = coordinator.run().await.unwrap();
    assert_eq!(first.saved, 2);
    assert_eq!(first.keys_searched, 8);
    drop(coordinator);

    let storage = SqliteStorage::new(&db_path).unwrap();
    let mut coordinator = Coordinator::new(config, storage, 5).unwrap();
    let second = coordinator.run().await.unwrap();

    assert_eq!(second.saved, 0);
    assert_eq!(second.skipped_known, 2);
    assert_eq!(coordinator.storage().count_texts().unwrap(), 2);
}

#[tokio::test]
async fn test_existing_file_is_not_downloaded() {
    let server = MockServer::start().await;
    mount_search(&server, &[(1, "Стар текст", Some(50))]).await;
    mount_person(&server, "50", person_xml("Автор", "BG")).await;
    mount_package(&server, 1, "Нов.", 0).await;

    let dir = tempfile::tempdir().unwrap();
    let config = create_test_config(&server, dir.path());

    // Filed under a different country by an earlier run that lost its database
    let old_dir = dir.path().join("data").join("RU");
    std::fs::create_dir_all(&old_dir).unwrap();
    std::fs::write(old_dir.join("1_Стар_текст!.txt"), "Стар.").unwrap();

    let storage = SqliteStorage::new(&dir.path().join("corpus.db")).unwrap();
    let mut coordinator = Coordinator::new(config, storage, 5).unwrap();
    let report = coordinator.run().await.unwrap();

    assert_eq!(report.saved, 0);
    assert_eq!(report.skipped_known, 1);
    assert!(!dir.path().join("data").join("BG").exists());
}

#[tokio::test]
async fn test_unresolved_author_goes_to_unknown() {
    let server = MockServer::start().await;
    mount_search(
        &server,
        &[(1, "Анонимен", None), (2, "Загадка", Some(999))],
    )
    .await;
    mount_person(&server, "999", "<results><persons/></results>".to_string()).await;
    mount_package(&server, 1, "Без автор.", 1).await;
    mount_package(&server, 2, "Непознат автор.", 1).await;

    let dir = tempfile::tempdir().unwrap();
    let config = create_test_config(&server, dir.path());

    let storage = SqliteStorage::new(&dir.path().join("corpus.db")).unwrap();
    let mut coordinator = Coordinator::new(config, storage, 2).unwrap();
    let report = coordinator.run().await.unwrap();
    assert_eq!(report.saved, 2);

    let unknown = dir.path().join("data").join("Unknown");
    assert!(unknown.join("1_Анонимен!.txt").is_file());
    assert!(unknown.join("2_Загадка!.txt").is_file());

    let storage = coordinator.storage();
    assert_eq!(text_author(storage, 1), None);
    assert_eq!(text_author(storage, 2), None);
    assert_eq!(storage.get_author(999).unwrap(), None);
}

#[tokio::test]
async fn test_failed_download_is_skipped() {
    let server = MockServer::start().await;
    mount_search(&server, &[(1, "Счупен", None), (2, "Цял", None)]).await;
    Mock::given(method("GET"))
        .and(path("/dl/text/1.txt.zip"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;
    mount_package(&server, 2, "Цял текст.", 1).await;

    let dir = tempfile::tempdir().unwrap();
    let config = create_test_config(&server, dir.path());

    let storage = SqliteStorage::new(&dir.path().join("corpus.db")).unwrap();
    let mut coordinator = Coordinator::new(config, storage, 1).unwrap();
    let report = coordinator.run().await.unwrap();

    assert_eq!(report.saved, 1);
    assert_eq!(report.failed, 1);
    assert_eq!(
        coordinator.storage().list_known_text_ids().unwrap(),
        HashSet::from([2])
    );
    assert!(!dir
        .path()
        .join("data")
        .join("Unknown")
        .join("1_Счупен!.txt")
        .exists());
}

#[tokio::test]
async fn test_author_lookup_is_cached_across_texts() {
    let server = MockServer::start().await;
    mount_search(
        &server,
        &[(1, "А", Some(7)), (2, "Б", Some(7)), (3, "В", Some(7))],
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/persons/search.xml"))
        .and(query_param("q", "7"))
        .respond_with(ResponseTemplate::new(200).set_body_string(person_xml("Един", "BG")))
        .expect(1)
        .mount(&server)
        .await;
    for id in 1..=3 {
        mount_package(&server, id, "Текст.", 1).await;
    }

    let dir = tempfile::tempdir().unwrap();
    let config = create_test_config(&server, dir.path());

    let report = run_crawl(config, 3, None).await.unwrap();
    assert_eq!(report.saved, 3);
}

#[tokio::test]
async fn test_empty_elements_keep_author_and_country() {
    let server = MockServer::start().await;
    let search = "<?xml version=\"1.0\"?><results><texts>\
                  <text><id>1</id><title>Гераците</title><subtitle/>\
                  <author><id>50</id></author><year/></text>\
                  </texts></results>";
    Mock::given(method("GET"))
        .and(path("/texts/search.xml"))
        .and(query_param("q", "aaa"))
        .respond_with(ResponseTemplate::new(200).set_body_string(search))
        .mount(&server)
        .await;
    mount_person(
        &server,
        "50",
        "<results><persons><person><name>Елин Пелин</name><real-name/>\
         <country>BG</country></person></persons></results>"
            .to_string(),
    )
    .await;
    mount_package(&server, 1, "Текст.", 1).await;

    let dir = tempfile::tempdir().unwrap();
    let config = create_test_config(&server, dir.path());

    let report = run_crawl(config, 1, None).await.unwrap();
    assert_eq!(report.saved, 1);
    assert!(dir
        .path()
        .join("data")
        .join("BG")
        .join("1_Гераците!.txt")
        .is_file());

    let storage = SqliteStorage::new(&dir.path().join("corpus.db")).unwrap();
    assert_eq!(text_author(&storage, 1), Some(50));
    let author = storage.get_author(50).unwrap().unwrap();
    assert_eq!(author.original_name, "Елин Пелин");
    assert_eq!(author.country_name.as_deref(), Some("BG"));
}
