//! Page frame shared by every screen: header navigation, main region, footer.

use crate::dom::{Element, InlineStyle, Node};
use crate::router::RouteTable;

/// Optional overrides for the outer `div.app`
#[derive(Debug, Clone, Default)]
pub struct LayoutProps {
    pub class_name: Option<String>,
    pub style: Option<InlineStyle>,
}

/// Wrap `content` in the application frame.
///
/// The navigation lists the table's menu entries (wildcards excluded) in
/// table order, one link each.
pub fn layout(routes: &RouteTable, props: &LayoutProps, content: Node) -> Node {
    let class_value = props.class_name.as_deref().unwrap_or_default();
    let style_value = props.style.clone().unwrap_or_default();

    let links = routes.menu().into_iter().map(|entry| {
        Element::new("a")
            .attr("href", entry.path.as_str())
            .text(entry.display_label())
    });

    Element::new("div")
        .class("app")
        .class(class_value)
        .styles(&style_value)
        .child(
            Element::new("header").child(
                Element::new("nav")
                    .child(Element::new("ul").child(Element::new("li").children(links))),
            ),
        )
        .child(
            Element::new("main")
                .class("main")
                .child(Element::new("article").class("article").child(content)),
        )
        .child(Element::new("footer").text("Footer"))
        .into()
}
