use crate::view::events::DomainEvent;

use super::{Binding, Cmd, EventKind, Rendered, View};

/// Add-product form. Field values are kept as entered; parsing happens at
/// submit time. A submit with any missing or invalid field is a silent no-op.
#[derive(Debug, Default)]
pub struct AddProductForm {
    name: String,
    calories: String,
    notice: Option<String>,
}

#[derive(Debug, Clone)]
pub enum ProductFormMsg {
    NameInput(String),
    CaloriesInput(String),
    Submit,
    Saved(Result<(), String>),
}

impl AddProductForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    fn parsed_calories(&self) -> Option<i32> {
        self.calories.trim().parse::<i32>().ok().filter(|v| *v > 0)
    }

    pub fn update(&mut self, msg: ProductFormMsg) -> Vec<Cmd> {
        match msg {
            ProductFormMsg::NameInput(v) => {
                self.name = v;
                Vec::new()
            }
            ProductFormMsg::CaloriesInput(v) => {
                self.calories = v;
                Vec::new()
            }
            ProductFormMsg::Submit => {
                let name = self.name.trim();
                let Some(calories_per_100g) = self.parsed_calories() else {
                    return Vec::new();
                };
                if name.is_empty() {
                    return Vec::new();
                }
                vec![Cmd::Publish(DomainEvent::ProductFormSubmit {
                    name: name.to_string(),
                    calories_per_100g,
                })]
            }
            ProductFormMsg::Saved(Ok(())) => {
                self.name.clear();
                self.calories.clear();
                self.notice = None;
                Vec::new()
            }
            // Write failed: keep what the user typed, surface the error.
            ProductFormMsg::Saved(Err(msg)) => {
                self.notice = Some(msg);
                Vec::new()
            }
        }
    }
}

impl View for AddProductForm {
    fn render(&self) -> Rendered {
        let mut html = String::from(r#"<form id="product-form">"#);
        if let Some(notice) = &self.notice {
            html.push_str(&format!(r#"<div class="notice error">{notice}</div>"#));
        }
        html.push_str(&format!(
            r#"<input id="product-name" type="text" placeholder="Product name" value="{}"><input id="product-calories" type="number" min="1" placeholder="kcal / 100g" value="{}"><button type="submit">Add product</button></form>"#,
            self.name, self.calories
        ));
        Rendered {
            html,
            bindings: vec![
                Binding::new("product-name", EventKind::Input),
                Binding::new("product-calories", EventKind::Input),
                Binding::new("product-form", EventKind::Submit),
            ],
        }
    }
}
