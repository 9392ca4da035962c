//! Routing, layout and scroll behaviour of the assembled app

use futures::future::BoxFuture;
use rfpages::dom::Element;
use rfpages::platform::{HeadlessPlatform, Window};
use rfpages::screens::Screen;
use rfpages::{App, AppConfig, HistoryAction, ImageFetcher, RouteEntry, RouteTable};
use std::sync::Arc;

struct NeverFetcher;

impl ImageFetcher for NeverFetcher {
    fn fetch<'a>(&'a self, _url: &'a str) -> BoxFuture<'a, rfpages::Result<rfpages::loader::FetchedImage>> {
        Box::pin(futures::future::pending())
    }
}

fn app() -> (App, Arc<HeadlessPlatform>) {
    let platform = Arc::new(HeadlessPlatform::default());
    let app = App::new(
        AppConfig::default(),
        platform.clone(),
        Arc::new(NeverFetcher),
        tokio::runtime::Handle::current(),
    )
    .expect("app");
    (app, platform)
}

fn menu_links(html_root: &rfpages::Node) -> Vec<String> {
    let nav = html_root
        .find(&|e: &Element| e.tag == "nav")
        .expect("nav present");
    nav.find_all(&|e: &Element| e.tag == "a")
        .iter()
        .filter_map(|a| a.get_attr("href").map(str::to_string))
        .collect()
}

#[test]
fn two_link_menu_for_three_entry_table() {
    let table = RouteTable::new(vec![
        RouteEntry::new("/", Screen::Home).label("Home"),
        RouteEntry::new("/about", Screen::About).label("About"),
        RouteEntry::new("*", Screen::NotFound),
    ])
    .unwrap();
    let node = rfpages::layout::layout(&table, &Default::default(), rfpages::Node::empty());
    assert_eq!(menu_links(&node), vec!["/", "/about"]);
    assert_eq!(node.find(&|e: &Element| e.tag == "nav").unwrap().text_content(), "HomeAbout");
}

#[tokio::test]
async fn every_screen_carries_the_same_menu() {
    let (mut app, _) = app();
    for path in ["/", "/about", "/messages", "/notifications", "/missing"] {
        app.navigate(path, HistoryAction::Push);
        assert_eq!(menu_links(&app.render()), vec!["/", "/about"], "menu on {}", path);
    }
}

#[tokio::test]
async fn nested_routes_render_inside_home_outlet() {
    let (mut app, _) = app();
    app.navigate("/messages", HistoryAction::Push);
    let html = app.render_html();
    assert!(html.contains("<h1>Home</h1>"));
    assert!(html.contains(
        "<aside class=\"sidebar sidebar--right sidebar-messages isActive\"><h1>Messages</h1></aside>"
    ));

    app.navigate("/", HistoryAction::Push);
    assert!(!app.render_html().contains("<aside"));
}

#[tokio::test]
async fn unknown_paths_fall_back_to_not_found() {
    let (mut app, _) = app();
    for path in ["/nope", "/about/", "/ABOUT", "/messages/1"] {
        app.navigate(path, HistoryAction::Push);
        assert!(app.render_html().contains("<h1>Not Found Error</h1>"), "{}", path);
    }
}

#[tokio::test]
async fn navigation_always_lands_at_origin() {
    let (mut app, platform) = app();
    let window = platform.headless_window();
    let paths = ["/", "/about", "/messages", "/about", "/x", "/notifications"];
    for (i, path) in paths.iter().enumerate() {
        window.scroll_to(0, 500 + i as i32);
        let action = if i % 2 == 0 { HistoryAction::Push } else { HistoryAction::Pop };
        app.navigate(path, action);
        assert_eq!(window.scroll_offset(), (0, 0), "after {}", path);
    }
    // One listener for the restoration override, one for back/forward.
    assert_eq!(window.unload_listener_count(), 2);
}

#[tokio::test]
async fn shared_state_tracks_location_and_flag() {
    let (mut app, _) = app();
    let first = app.shared_state();
    app.navigate("/", HistoryAction::Replace);
    assert!(Arc::ptr_eq(&first, &app.shared_state()));

    app.set_logged(true);
    app.navigate("/about?tab=photos", HistoryAction::Push);
    let s = app.shared_state();
    assert!(s.logged);
    assert_eq!(s.location.to_string(), "/about?tab=photos");
}

#[tokio::test]
async fn title_input_only_exists_on_about() {
    let (mut app, _) = app();
    assert!(app.set_title("x").is_err());
    app.navigate("/about", HistoryAction::Push);
    app.set_title("Holiday").unwrap();
    let html = app.render_html();
    assert!(html.contains("<h1>Component name: Holiday</h1>"));
    assert!(html.contains("<h1 style=\"font-size: 48px\">Holiday</h1>"));

    // Leaving the screen discards its local state.
    app.navigate("/", HistoryAction::Push);
    app.navigate("/about", HistoryAction::Push);
    assert!(app.render_html().contains("<h1>Component name: </h1>"));
}
