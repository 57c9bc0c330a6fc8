//! Test utilities for wishlist harvesting
//!
//! Renders wishlist pages in the markup shape the default selectors expect,
//! so pipeline tests and the benchmark run without a browser.

use std::fmt::Write;

use crate::domain::WishlistItem;

/// Deterministic items covering missing prices, unset quantities, empty
/// comments and text that needs HTML escaping.
pub fn sample_items(count: usize) -> Vec<WishlistItem> {
    const PRIORITIES: [&str; 5] = ["highest", "high", "medium", "low", "lowest"];

    (0..count)
        .map(|i| WishlistItem {
            name: format!("Item {i} & Co"),
            image_url: format!("https://images.example.com/I/{i}.jpg"),
            price: (i % 3 != 2).then(|| (i as f64 + 1.0) * 2.5),
            priority: PRIORITIES[i % PRIORITIES.len()].to_string(),
            quantity_requested: Some(i as u32 + 1),
            quantity_fulfilled: (i % 2 == 0).then_some(0),
            comment: if i % 2 == 0 { String::new() } else { format!("for <b>{i}</b>") },
        })
        .collect()
}

/// Render a full wishlist page.
///
/// Every item gets every field node, including a price node reading
/// "Unavailable" when the price is `None`, so the page always passes the
/// length check. Label spans share the id prefix of their values.
pub fn render_wishlist_page(items: &[WishlistItem]) -> String {
    let mut html = String::from("<!DOCTYPE html><html><head><title>Wish List</title></head><body><ul id=\"g-items\">");

    for (i, item) in items.iter().enumerate() {
        let id = format!("I{i:04}");
        let price = item.price.map_or_else(|| "Unavailable".to_string(), |p| format!("${p:.2}"));
        let requested = item.quantity_requested.map_or_else(|| "n/a".to_string(), |q| q.to_string());
        let fulfilled = item.quantity_fulfilled.map_or_else(|| "n/a".to_string(), |q| q.to_string());

        // Writing to a String cannot fail
        let _ = write!(
            html,
            concat!(
                "<li data-itemid=\"{id}\">",
                "<div id=\"itemImage_{id}\"><a href=\"/dp/{id}\"><img src=\"{image}\" alt=\"\"></a></div>",
                "<h2><a id=\"itemName_{id}\" href=\"/dp/{id}\">{name}</a></h2>",
                "<span id=\"itemPrice_{id}\"><span class=\"a-offscreen\">{price}</span></span>",
                "<span id=\"itemPriorityLabel_{id}\">Priority:</span><span id=\"itemPriority_{id}\">{priority}</span>",
                "<span id=\"itemRequestedLabel_{id}\">Quantity:</span><span id=\"itemRequested_{id}\">{requested}</span>",
                "<span id=\"itemPurchasedLabel_{id}\">Has:</span><span id=\"itemPurchased_{id}\">{fulfilled}</span>",
                "<span id=\"itemComment_{id}\">{comment}</span>",
                "</li>"
            ),
            id = id,
            image = escape_html(&item.image_url),
            name = escape_html(&item.name),
            price = price,
            priority = escape_html(&item.priority),
            requested = requested,
            fulfilled = fulfilled,
            comment = escape_html(&item.comment),
        );
    }

    html.push_str("</ul></body></html>");
    html
}

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
