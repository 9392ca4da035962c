//! Screens reachable from the route table.
//!
//! The photo screen is the capture target of the export feature; it is a
//! single abstraction configured by [`PhotoScreenConfig`].

use crate::context::AppSharedState;
use crate::dom::{Element, Node, REF_ATTR};
use crate::layout::{layout, LayoutProps};
use crate::loader::{ImageLoader, ImageSlot};
use crate::router::{is_active, RouteTable};
use serde::{Deserialize, Serialize};

/// `data-ref` of the subtree exported by the download button.
pub const PRINT_REF: &str = "print";

/// Which screen a route renders
#[derive(Debug, Clone, PartialEq)]
pub enum Screen {
    Home,
    About,
    /// Right-hand sidebar nested under Home; `path` is the fragment that
    /// marks it active.
    Sidebar { name: String, path: String },
    NotFound,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhotoItem {
    #[serde(alias = "_id")]
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub alt: Option<String>,
}

impl PhotoItem {
    pub fn named(id: &str, name: &str) -> Self {
        PhotoItem {
            id: id.into(),
            name: Some(name.into()),
            url: None,
            alt: None,
        }
    }

    pub fn image(id: &str, url: &str, alt: &str) -> Self {
        PhotoItem {
            id: id.into(),
            name: None,
            url: Some(url.into()),
            alt: Some(alt.into()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhotoScreenConfig {
    pub title: String,
    pub data: Vec<PhotoItem>,
    pub images: Vec<PhotoItem>,
    /// Upscaling factor used when exporting
    pub scale: f32,
}

impl Default for PhotoScreenConfig {
    fn default() -> Self {
        PhotoScreenConfig {
            title: String::new(),
            data: vec![
                PhotoItem::named("sdfhdf", "Ogi"),
                PhotoItem::named("dfdfdf", "Zohara"),
            ],
            images: vec![
                PhotoItem::image("teasfdfg", "https://picsum.photos/id/238/200/300", "gdfjgj"),
                PhotoItem::image("gfdfhgfj", "https://picsum.photos/id/248/200/300", "fhjdf"),
            ],
            scale: 4.0,
        }
    }
}

/// A mounted photo screen: its configuration plus one image slot per image.
pub struct PhotoScreen {
    pub config: PhotoScreenConfig,
    slots: Vec<(PhotoItem, ImageSlot)>,
}

impl PhotoScreen {
    /// Mount the screen and start preloading every image with a URL.
    pub fn mount(config: PhotoScreenConfig, loader: &ImageLoader) -> Self {
        let slots = config
            .images
            .iter()
            .filter_map(|item| {
                let url = item.url.as_deref()?;
                let slot = loader.slot();
                slot.load(url);
                Some((item.clone(), slot))
            })
            .collect();
        PhotoScreen { config, slots }
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.config.title = title.into();
    }

    pub fn slots(&self) -> Vec<ImageSlot> {
        self.slots.iter().map(|(_, s)| s.clone()).collect()
    }

    pub fn unmount(&self) {
        for (_, slot) in &self.slots {
            slot.unmount();
        }
    }

    /// The exportable subtree, tagged with `data-ref="print"`.
    pub fn render(&self, location: &crate::router::Location) -> Node {
        let cfg = &self.config;
        let data = cfg.data.iter().map(|item| {
            Element::new("div")
                .attr("data-key", item.id.as_str())
                .text(item.name.clone().unwrap_or_default())
        });

        let canvas_column = || {
            Element::new("div")
                .child(Element::new("h1").text("Canvas"))
                .children(cfg.images.iter().map(|item| {
                    Element::new("div").attr("data-key", item.id.as_str()).child(
                        Element::new("img")
                            .attr("src", item.url.clone().unwrap_or_default())
                            .attr("alt", item.alt.clone().unwrap_or_default())
                            .class("img"),
                    )
                }))
        };

        let async_column = Element::new("div")
            .child(Element::new("h1").text("Async"))
            .children(self.slots.iter().map(|(item, slot)| {
                Element::new("div")
                    .attr("data-key", item.id.as_str())
                    .child(slot.render(item.alt.as_deref().unwrap_or_default()))
            }));

        Element::new("div")
            .attr(REF_ATTR, PRINT_REF)
            .child(Element::new("div").class("first").text("I will not be in the image."))
            .child(Element::new("h1").text(format!("Component name: {}", cfg.title)))
            .child(heading(&cfg.title))
            .child(Element::new("div").class("second").text("I will be in the image."))
            .children(data)
            .child(
                Element::new("div")
                    .style("display", "flex")
                    .child(canvas_column())
                    .child(canvas_column())
                    .child(async_column),
            )
            .child(nav_link("/", "Home", location))
            .child(nav_link("/messages", "Messages", location))
            .child(nav_link("/notifications", "Notifications", location))
            .into()
    }
}

/// Everything a screen needs to render
pub struct RenderContext<'a> {
    pub routes: &'a RouteTable,
    pub state: &'a AppSharedState,
    pub photos: Option<&'a PhotoScreen>,
    pub layout: &'a LayoutProps,
}

pub fn heading(title: &str) -> Element {
    Element::new("h1").style("font-size", "48px").text(title)
}

/// Link that gains the `active` class when the location is exactly `to`.
pub fn nav_link(to: &str, label: &str, location: &crate::router::Location) -> Element {
    let a = Element::new("a")
        .attr("href", to)
        .child(Element::new("span").text(label));
    if is_active(to, location) {
        a.class("active")
    } else {
        a
    }
}

fn page(title: &str, body: Vec<Node>) -> Element {
    Element::new("section").class("section").child(
        Element::new("div")
            .class("container")
            .child(Element::new("h1").text(title))
            .children(body),
    )
}

/// Render `screen`, placing `outlet` where nested routes go.
pub fn render_screen(screen: &Screen, ctx: &RenderContext<'_>, outlet: Node) -> Node {
    match screen {
        Screen::Home => layout(ctx.routes, ctx.layout, page("Home", vec![outlet]).into()),
        Screen::About => {
            let mut body: Vec<Node> = vec![
                Element::new("button")
                    .attr("type", "button")
                    .text("Download as Image")
                    .into(),
            ];
            let mut input = Element::new("input").attr("name", "text");
            if let Some(photos) = ctx.photos {
                input.set_attr("value", photos.config.title.as_str());
                body.push(input.into());
                body.push(photos.render(&ctx.state.location));
            } else {
                body.push(input.into());
            }
            layout(ctx.routes, ctx.layout, page("About", body).into())
        }
        Screen::Sidebar { name, path } => {
            let mut aside = Element::new("aside")
                .class("sidebar")
                .class("sidebar--right")
                .class("sidebar-messages");
            if ctx.state.location.pathname.contains(path.as_str()) {
                aside = aside.class("isActive");
            }
            aside
                .child(Element::new("h1").text(name.as_str()))
                .child(outlet)
                .into()
        }
        Screen::NotFound => layout(ctx.routes, ctx.layout, page("Not Found Error", vec![]).into()),
    }
}
