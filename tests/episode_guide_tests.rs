// Integration tests for the episode guide client against a local HTTP server

use std::collections::HashMap;
use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::{Arc, Mutex};
use std::thread;

use tvshow_tagger::app::details_for;
use tvshow_tagger::config::Config;
use tvshow_tagger::guide::{EpisodeGuide, NO_SYNOPSIS};
use tvshow_tagger::models::ShowReference;
use tvshow_tagger::refresh::{RefreshEvent, spawn_refresh};
use tvshow_tagger::show_index::ShowIndex;
use tvshow_tagger::show_store::ShowStore;

/// Serves fixed bodies by path; anything else is a 404. `{base}` in a body is
/// replaced by the server's own address. Every requested path is recorded.
struct TestServer {
    base_url: String,
    requests: Arc<Mutex<Vec<String>>>,
}

impl TestServer {
    fn spawn(routes: Vec<(&str, Vec<u8>)>) -> Self {
        let listener = TcpListener::bind(("127.0.0.1", 0)).expect("bind test server");
        let addr = listener.local_addr().expect("local addr");
        let base_url = format!("http://{addr}");

        let routes: HashMap<String, Vec<u8>> = routes
            .into_iter()
            .map(|(path, body)| {
                let body = match String::from_utf8(body) {
                    Ok(text) => text.replace("{base}", &base_url).into_bytes(),
                    Err(e) => e.into_bytes(),
                };
                (path.to_string(), body)
            })
            .collect();
        let routes = Arc::new(routes);
        let requests = Arc::new(Mutex::new(Vec::new()));

        let requests_clone = Arc::clone(&requests);
        thread::spawn(move || {
            for stream in listener.incoming() {
                let Ok(stream) = stream else { break };
                let routes = Arc::clone(&routes);
                let requests = Arc::clone(&requests_clone);
                thread::spawn(move || serve(stream, &routes, &requests));
            }
        });

        Self { base_url, requests }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn hits(&self, path: &str) -> usize {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|requested| requested.as_str() == path)
            .count()
    }

    fn config(&self) -> Config {
        let mut config = Config::new();
        config.guide_url = self.url("/");
        config.imdb_url = self.url("/");
        config
    }
}

fn serve(mut stream: TcpStream, routes: &HashMap<String, Vec<u8>>, requests: &Mutex<Vec<String>>) {
    let mut buffer = Vec::new();
    let mut chunk = [0_u8; 1024];
    while !buffer.windows(4).any(|window| window == b"\r\n\r\n") {
        match stream.read(&mut chunk) {
            Ok(0) | Err(_) => return,
            Ok(n) => buffer.extend_from_slice(&chunk[..n]),
        }
    }

    let request = String::from_utf8_lossy(&buffer);
    let path = request
        .lines()
        .next()
        .and_then(|line| line.split_whitespace().nth(1))
        .unwrap_or("/")
        .to_string();
    requests.lock().unwrap().push(path.clone());

    let (status, body) = match routes.get(&path) {
        Some(body) => ("200 OK", body.clone()),
        None => ("404 Not Found", b"not found".to_vec()),
    };
    let head = format!(
        "HTTP/1.1 {status}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
        body.len()
    );
    let _ = stream.write_all(head.as_bytes());
    let _ = stream.write_all(&body);
    let _ = stream.flush();
}

fn index_page(items: &str) -> Vec<u8> {
    format!(r#"<html><body><div class="cont"><ul>{items}</ul></div></body></html>"#).into_bytes()
}

fn show_page(imdb_link: &str, blurb: Option<&str>) -> Vec<u8> {
    let blurb = blurb
        .map(|text| format!(r#"<div id="blurb">{text}</div>"#))
        .unwrap_or_default();
    format!(
        r##"<html><body>
        <div class="center titleblock"><h2><a href="{imdb_link}">The Show</a></h2></div>
        <div class="half column"><div class="pads">poster</div><div class="pads">left</div></div>
        <div class="half column">
            <div class="pads">top</div>
            <div class="pads">Premiered <a href="/date">Mar 2011</a><br>Network: X<br>Country: US<br>Episodes: 3<br>Run time: 45 min<br>Status: ended</div>
        </div>
        {blurb}
        <div id="eplist"><table>
            <tr><th>#</th><th>Title</th></tr>
            <tr><td colspan="2">Show details</td></tr>
            <tr><td class="bold">Season 1</td></tr>
            <tr><td>1.</td><td class="eptitle"><a href="#">pilot</a></td></tr>
            <tr><td>2.</td><td class="eptitle"><a href="#">what? who: me</a></td></tr>
            <tr><td class="bold">Season 2</td></tr>
            <tr><td>1.</td><td class="eptitle"><a href="#">the return (part 1)</a></td></tr>
        </table></div>
        </body></html>"##
    )
    .into_bytes()
}

fn imdb_title_page(plot: Option<&str>) -> Vec<u8> {
    let plot = plot
        .map(|text| format!(r#"<span data-testid="plot-xl">{text}</span>"#))
        .unwrap_or_default();
    format!(
        r#"<html><body>{plot}<a class="ipc-lockup-overlay ipc-focusable" href="/title/tt1/mediaviewer/rm1/">poster</a></body></html>"#
    )
    .into_bytes()
}

#[tokio::test]
async fn test_list_shows_skips_missing_pages_and_radio_entries() {
    let server = TestServer::spawn(vec![
        (
            "/menua",
            index_page(
                r#"<li><a href="../Arrow/">Arrow</a></li>
                   <li><a href="../AmericanLife/">American Life [radio]</a></li>
                   <li><b><a href="../Alias/">Alias</a></b> (2001)</li>"#,
            ),
        ),
        ("/menub", index_page(r#"<li><a href="../BreakingBad/">Breaking Bad</a></li>"#)),
        ("/menuc", b"<html><body>maintenance</body></html>".to_vec()),
    ]);
    let guide = EpisodeGuide::new(&server.config()).unwrap();

    let index = guide.list_shows().await.unwrap();

    assert_eq!(index.len(), 3);
    assert_eq!(index.get("Arrow").unwrap().url, server.url("/Arrow/"));
    assert_eq!(index.get("breaking bad").unwrap().url, server.url("/BreakingBad/"));
    assert!(!index.contains("American Life [radio]"));
    assert_eq!(server.hits("/menuy"), 1);
    assert_eq!(server.hits("/menuz"), 0);
}

#[tokio::test]
async fn test_refresh_index_writes_listing_file() {
    let server = TestServer::spawn(vec![(
        "/menua",
        index_page(r#"<li><a href="../Arrow/">Arrow</a></li>"#),
    )]);
    let guide = EpisodeGuide::new(&server.config()).unwrap();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("data").join("tv_shows_list.json");

    let index = guide.refresh_index(&path).await.unwrap();

    assert_eq!(ShowIndex::load(&path).unwrap(), index);
    let content = std::fs::read_to_string(&path).unwrap();
    assert!(content.contains(r#"    "Arrow": ""#));
}

#[tokio::test]
async fn test_list_episodes() {
    let server = TestServer::spawn(vec![("/Show/", show_page("/imdb", Some("x")))]);
    let guide = EpisodeGuide::new(&server.config()).unwrap();

    let listing = guide.list_episodes(&server.url("/Show/")).await.unwrap();

    assert_eq!(listing.labels().collect::<Vec<_>>(), vec!["Season 1", "Season 2"]);
    assert_eq!(
        listing.get("Season 1").unwrap(),
        ["01 - Pilot".to_string(), "02 - What Who Me".to_string()]
    );
    assert_eq!(
        listing.get("Season 2").unwrap(),
        ["01 - The Return (Part 1)".to_string()]
    );
}

#[tokio::test]
async fn test_list_episodes_fails_on_missing_page() {
    let server = TestServer::spawn(vec![]);
    let guide = EpisodeGuide::new(&server.config()).unwrap();

    assert!(guide.list_episodes(&server.url("/Gone/")).await.is_err());
}

#[tokio::test]
async fn test_fetch_details_from_guide_only() {
    let server = TestServer::spawn(vec![
        ("/Show/", show_page("/title/tt1/", Some("Two friends open a bar."))),
        ("/Show/cast.jpg", b"cast-bytes".to_vec()),
    ]);
    let guide = EpisodeGuide::new(&server.config()).unwrap();
    let show = ShowReference::new("The Show", server.url("/Show/"));

    let details = guide.fetch_details(&show).await.unwrap();

    assert_eq!(details.name, "The Show");
    assert_eq!(details.start_date, "Mar 2011");
    assert_eq!(details.run_time, "45 min");
    assert_eq!(details.synopsis, "Two friends open a bar.");
    assert_eq!(details.poster, b"cast-bytes");
    assert_eq!(details.url, server.url("/Show/"));
    assert_eq!(server.hits("/title/tt1/"), 0);
    assert_eq!(server.hits("/Show/logo.jpg"), 0);
}

#[tokio::test]
async fn test_fetch_details_falls_back_to_imdb() {
    let server = TestServer::spawn(vec![
        ("/Show/", show_page("{base}/title/tt1/", None)),
        ("/title/tt1/", imdb_title_page(Some("A plot from elsewhere."))),
        (
            "/title/tt1/mediaviewer/rm1/",
            br#"<img src="/logo.png"><img src="{base}/images/poster.jpg">"#.to_vec(),
        ),
        ("/images/poster.jpg", b"imdb-poster".to_vec()),
    ]);
    let guide = EpisodeGuide::new(&server.config()).unwrap();
    let show = ShowReference::new("The Show", server.url("/Show/"));

    let details = guide.fetch_details(&show).await.unwrap();

    assert_eq!(details.synopsis, "A plot from elsewhere.");
    assert_eq!(details.poster, b"imdb-poster");
    assert_eq!(server.hits("/Show/cast.jpg"), 1);
    assert_eq!(server.hits("/Show/logo.jpg"), 1);
    assert_eq!(server.hits("/title/tt1/"), 1);
}

#[tokio::test]
async fn test_fetch_details_without_any_synopsis() {
    let server = TestServer::spawn(vec![
        ("/Show/", show_page("{base}/title/tt1/", None)),
        ("/Show/logo.jpg", b"logo-bytes".to_vec()),
        ("/title/tt1/", imdb_title_page(None)),
    ]);
    let guide = EpisodeGuide::new(&server.config()).unwrap();
    let show = ShowReference::new("The Show", server.url("/Show/"));

    let details = guide.fetch_details(&show).await.unwrap();

    assert_eq!(details.synopsis, NO_SYNOPSIS);
    assert_eq!(details.poster, b"logo-bytes");
}

#[tokio::test]
async fn test_fetch_details_needs_imdb_link_for_fallback() {
    let server = TestServer::spawn(vec![(
        "/Show/",
        b"<html><body><p>bare page</p></body></html>".to_vec(),
    )]);
    let guide = EpisodeGuide::new(&server.config()).unwrap();
    let show = ShowReference::new("The Show", server.url("/Show/"));

    let err = guide.fetch_details(&show).await.unwrap_err();
    assert!(format!("{:#}", err).contains("IMDb title link"));
}

#[tokio::test]
async fn test_details_are_cached() {
    let server = TestServer::spawn(vec![
        ("/Show/", show_page("/title/tt1/", Some("Cached synopsis."))),
        ("/Show/cast.jpg", b"cast-bytes".to_vec()),
    ]);
    let guide = EpisodeGuide::new(&server.config()).unwrap();
    let store = ShowStore::open_in_memory().unwrap();
    let show = ShowReference::new("The Show", server.url("/Show/"));

    let first = details_for(&store, &guide, &show, false).await.unwrap();
    let second = details_for(&store, &guide, &show, false).await.unwrap();
    assert_eq!(first, second);
    assert_eq!(server.hits("/Show/"), 1);

    details_for(&store, &guide, &show, true).await.unwrap();
    assert_eq!(server.hits("/Show/"), 2);
    assert_eq!(store.select(&show).unwrap().unwrap().synopsis, "Cached synopsis.");
}

#[tokio::test]
async fn test_background_refresh_reports_finished() {
    let server = TestServer::spawn(vec![(
        "/menua",
        index_page(r#"<li><a href="../Arrow/">Arrow</a></li><li><a href="../Alias/">Alias</a></li>"#),
    )]);
    let guide = Arc::new(EpisodeGuide::new(&server.config()).unwrap());
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tv_shows_list.json");

    let (handle, events) = spawn_refresh(guide, path.clone());

    assert_eq!(events.await.unwrap(), RefreshEvent::Finished(2));
    handle.await.unwrap();
    assert_eq!(ShowIndex::load(&path).unwrap().len(), 2);
}

#[tokio::test]
async fn test_background_refresh_reports_failure() {
    // Nothing listens on a port freed right after binding it.
    let port = TcpListener::bind(("127.0.0.1", 0))
        .unwrap()
        .local_addr()
        .unwrap()
        .port();
    let mut config = Config::new();
    config.guide_url = format!("http://127.0.0.1:{port}/");
    let guide = Arc::new(EpisodeGuide::new(&config).unwrap());
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tv_shows_list.json");

    let (handle, events) = spawn_refresh(guide, path.clone());

    match events.await.unwrap() {
        RefreshEvent::Failed(message) => assert!(message.contains("menua")),
        other => panic!("expected a failure, got {:?}", other),
    }
    handle.await.unwrap();
    assert!(!path.exists());
}
