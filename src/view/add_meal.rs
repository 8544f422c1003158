use time::Date;
use uuid::Uuid;

use crate::{
    helpers,
    products::repo::Product,
    service::NewEntry,
    view::events::DomainEvent,
};

use super::{Binding, Cmd, EventKind, Rendered, View};

/// Where the add-meal modal is in its open cycle. `Closed` is the terminal
/// state of every cycle; the element is reusable across cycles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModalState {
    Closed,
    Loading,
    Ready,
}

/// Modal for logging a meal: pick a product, enter grams, see the computed
/// calories live, submit.
#[derive(Debug)]
pub struct AddMealEntry {
    state: ModalState,
    products: Vec<Product>,
    selected_product_id: Option<Uuid>,
    grams: String,
    fetch_token: u64,
    notice: Option<String>,
}

#[derive(Debug, Clone)]
pub enum AddMealMsg {
    Open,
    ProductsLoaded {
        token: u64,
        result: Result<Vec<Product>, String>,
    },
    SelectProduct(Uuid),
    GramsInput(String),
    Submit,
    Saved(Result<(), String>),
    Close,
    BackdropClick,
}

impl Default for AddMealEntry {
    fn default() -> Self {
        Self::new()
    }
}

impl AddMealEntry {
    pub fn new() -> Self {
        Self {
            state: ModalState::Closed,
            products: Vec::new(),
            selected_product_id: None,
            grams: String::new(),
            fetch_token: 0,
            notice: None,
        }
    }

    pub fn state(&self) -> ModalState {
        self.state
    }

    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    fn parsed_grams(&self) -> Option<i32> {
        self.grams.trim().parse::<i32>().ok().filter(|g| *g > 0)
    }

    fn selected_product(&self) -> Option<&Product> {
        let id = self.selected_product_id?;
        self.products.iter().find(|p| p.id == id)
    }

    /// Live calorie preview: present only while both a selection and a valid
    /// quantity exist. Recomputed on every render, hence on every edit.
    pub fn calorie_preview(&self) -> Option<i32> {
        let product = self.selected_product()?;
        let grams = self.parsed_grams()?;
        Some(helpers::compute_calories(product.calories_per_100g, grams))
    }

    fn reset(&mut self) {
        self.state = ModalState::Closed;
        self.selected_product_id = None;
        self.grams.clear();
    }

    /// `date` is the tracker's selected day, supplied by the owning page.
    pub fn update(&mut self, msg: AddMealMsg, date: Date) -> Vec<Cmd> {
        match msg {
            AddMealMsg::Open => {
                self.state = ModalState::Loading;
                self.notice = None;
                self.fetch_token += 1;
                vec![Cmd::LoadProducts {
                    token: self.fetch_token,
                }]
            }
            AddMealMsg::ProductsLoaded { token, result } => {
                if token != self.fetch_token {
                    // A newer open cycle superseded this fetch.
                    return Vec::new();
                }
                match result {
                    Ok(products) => {
                        self.products = products;
                        self.state = ModalState::Ready;
                    }
                    Err(msg) => {
                        // Could not load the catalog: stay closed, tell the user.
                        self.state = ModalState::Closed;
                        self.notice = Some(msg);
                    }
                }
                Vec::new()
            }
            AddMealMsg::SelectProduct(id) => {
                if self.state == ModalState::Ready {
                    self.selected_product_id = Some(id);
                }
                Vec::new()
            }
            AddMealMsg::GramsInput(value) => {
                if self.state == ModalState::Ready {
                    self.grams = value;
                }
                Vec::new()
            }
            AddMealMsg::Submit => {
                if self.state != ModalState::Ready {
                    return Vec::new();
                }
                let (Some(product), Some(grams)) = (self.selected_product(), self.parsed_grams())
                else {
                    return Vec::new();
                };
                vec![Cmd::CreateEntry(NewEntry {
                    product_id: product.id,
                    grams,
                    date,
                })]
            }
            AddMealMsg::Saved(Ok(())) => {
                self.reset();
                self.notice = None;
                vec![Cmd::Publish(DomainEvent::EntriesUpdated)]
            }
            AddMealMsg::Saved(Err(msg)) => {
                // Keep the draft; nothing was committed.
                self.notice = Some(msg);
                Vec::new()
            }
            AddMealMsg::Close | AddMealMsg::BackdropClick => {
                // Unconditional: in-progress edits are discarded.
                self.reset();
                Vec::new()
            }
        }
    }
}

impl View for AddMealEntry {
    fn render(&self) -> Rendered {
        let mut bindings = vec![Binding::new("open-add-meal", EventKind::Click)];
        let mut html = String::from(
            r#"<button id="open-add-meal" class="add-meal-btn">+</button>"#,
        );
        if let Some(notice) = &self.notice {
            html.push_str(&format!(r#"<div class="notice error">{notice}</div>"#));
        }

        match self.state {
            ModalState::Closed => {}
            ModalState::Loading => {
                html.push_str(
                    r#"<div id="modal-backdrop"></div><div class="modal"><button id="close-modal">x</button><div class="loading">Loading products...</div></div>"#,
                );
                bindings.push(Binding::new("modal-backdrop", EventKind::Click));
                bindings.push(Binding::new("close-modal", EventKind::Click));
            }
            ModalState::Ready => {
                html.push_str(r#"<div id="modal-backdrop"></div><div class="modal"><button id="close-modal">x</button>"#);
                bindings.push(Binding::new("modal-backdrop", EventKind::Click));
                bindings.push(Binding::new("close-modal", EventKind::Click));

                if self.products.is_empty() {
                    html.push_str(
                        r#"<div class="empty-state">No products yet. Add one in settings first.</div><button type="submit" disabled>Add</button>"#,
                    );
                } else {
                    html.push_str(r#"<form id="add-meal-form"><select id="product-select">"#);
                    for product in &self.products {
                        let selected = if self.selected_product_id == Some(product.id) {
                            " selected"
                        } else {
                            ""
                        };
                        html.push_str(&format!(
                            r#"<option value="{}"{selected}>{} ({} kcal/100g)</option>"#,
                            product.id, product.name, product.calories_per_100g
                        ));
                    }
                    html.push_str(&format!(
                        r#"</select><input id="grams-input" type="number" min="1" placeholder="100" value="{}">"#,
                        self.grams
                    ));
                    match self.calorie_preview() {
                        Some(calories) => html.push_str(&format!(
                            r#"<div id="calorie-preview">{} kcal</div>"#,
                            helpers::format_number(i64::from(calories))
                        )),
                        None => html.push_str(r#"<div id="calorie-preview" hidden></div>"#),
                    }
                    let disabled = if self.calorie_preview().is_none() {
                        " disabled"
                    } else {
                        ""
                    };
                    html.push_str(&format!(r#"<button type="submit"{disabled}>Add</button></form>"#));
                    bindings.push(Binding::new("product-select", EventKind::Change));
                    bindings.push(Binding::new("grams-input", EventKind::Input));
                    bindings.push(Binding::new("add-meal-form", EventKind::Submit));
                }
                html.push_str("</div>");
            }
        }

        Rendered { html, bindings }
    }
}
