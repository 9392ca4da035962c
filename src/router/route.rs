//! The application's route table

use super::{RouteEntry, RouteTable};
use crate::screens::Screen;
use crate::Result;

/// `/` (with `/messages` and `/notifications` nested), `/about`, and the
/// not-found fallback.
pub fn app_routes() -> Result<RouteTable> {
    let entries = vec![
        RouteEntry::new("/", Screen::Home)
            .label("Home")
            .child(
                RouteEntry::new(
                    "/messages",
                    Screen::Sidebar {
                        name: "Messages".into(),
                        path: "messages".into(),
                    },
                )
                .label("Messages"),
            )
            .child(
                RouteEntry::new(
                    "/notifications",
                    Screen::Sidebar {
                        name: "Notifications".into(),
                        path: "notifications".into(),
                    },
                )
                .label("Notifications"),
            ),
        RouteEntry::new("/about", Screen::About).label("About"),
        RouteEntry::new("*", Screen::NotFound),
    ];
    RouteTable::new(entries)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn app_menu_lists_home_and_about() {
        let t = app_routes().unwrap();
        let menu: Vec<_> = t.menu().iter().map(|e| e.path.as_str()).collect();
        assert_eq!(menu, vec!["/", "/about"]);
        assert_eq!(t.entries().len(), 3);
        assert_eq!(t.entries()[0].children.len(), 2);
    }
}
