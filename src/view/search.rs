use crate::products::repo::Product;
use crate::view::events::DomainEvent;

use super::{Binding, Cmd, EventKind, Patch, Rendered, View};

/// Case-insensitive product filter: matches the name as a substring, or the
/// stringified calorie rating. An empty query returns the list unchanged.
pub fn product_matches(product: &Product, query: &str) -> bool {
    if query.is_empty() {
        return true;
    }
    let query_lower = query.to_lowercase();
    product.name.to_lowercase().contains(&query_lower)
        || product.calories_per_100g.to_string().contains(query)
}

pub fn filter_products(products: &[Product], query: &str) -> Vec<Product> {
    products
        .iter()
        .filter(|p| product_matches(p, query))
        .cloned()
        .collect()
}

/// Search box for the product list. The query lives here; the owning page
/// derives its filtered list from it on every keystroke.
#[derive(Debug, Default)]
pub struct SearchBox {
    query: String,
}

#[derive(Debug, Clone)]
pub enum SearchMsg {
    Input(String),
    Clear,
}

impl SearchBox {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn update(&mut self, msg: SearchMsg) -> Vec<Cmd> {
        match msg {
            SearchMsg::Input(value) => {
                if self.query == value {
                    return Vec::new();
                }
                self.query = value;
            }
            SearchMsg::Clear => self.query.clear(),
        }
        vec![Cmd::Publish(DomainEvent::ProductSearch(self.query.clone()))]
    }

    /// In-place update of the input's value. Used instead of a full re-render
    /// on keystrokes so caret position and focus survive.
    pub fn patch(&self) -> Patch {
        Patch {
            target: "product-search".into(),
            value: self.query.clone(),
        }
    }
}

impl View for SearchBox {
    fn render(&self) -> Rendered {
        let mut html = format!(
            r#"<div class="search-container"><input id="product-search" type="text" placeholder="Search products..." value="{}">"#,
            self.query
        );
        let mut bindings = vec![Binding::new("product-search", EventKind::Input)];
        if !self.query.is_empty() {
            html.push_str(r#"<button id="clear-search" type="button">x</button>"#);
            bindings.push(Binding::new("clear-search", EventKind::Click));
        }
        html.push_str("</div>");
        Rendered { html, bindings }
    }
}
