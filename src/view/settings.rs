use uuid::Uuid;

use crate::{
    goals::repo::CalorieGoal,
    helpers,
    products::repo::Product,
    service::GoalHistory,
    view::events::DomainEvent,
};

use super::{
    product_form::{AddProductForm, ProductFormMsg},
    search::{self, SearchBox, SearchMsg},
    Binding, Cmd, EventKind, Rendered, Session, View,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingsTab {
    Products,
    Goal,
}

/// Settings page: product catalog management on one tab, the calorie goal and
/// its history on the other. Deleting a product goes through a confirmation
/// modal; nothing is removed until the user confirms.
#[derive(Debug)]
pub struct SettingsPage {
    session: Session,
    tab: SettingsTab,
    pub search: SearchBox,
    pub product_form: AddProductForm,
    products: Vec<Product>,
    goal_current: Option<i32>,
    goal_history: Vec<CalorieGoal>,
    goal_input: String,
    pending_delete: Option<Uuid>,
    loading: bool,
    fetch_token: u64,
    notice: Option<String>,
}

#[derive(Debug, Clone)]
pub enum SettingsMsg {
    SelectTab(SettingsTab),
    Search(SearchMsg),
    Form(ProductFormMsg),
    Reload,
    Loaded {
        token: u64,
        products: Vec<Product>,
        goals: GoalHistory,
    },
    RequestDelete(Uuid),
    CancelDelete,
    BackdropClick,
    ConfirmDelete,
    ProductDeleted(Result<(), String>),
    GoalInput(String),
    GoalSubmit,
    GoalSaved(Result<(), String>),
}

impl SettingsPage {
    pub fn mount(session: Session) -> (Self, Vec<Cmd>) {
        let mut page = Self {
            session,
            tab: SettingsTab::Products,
            search: SearchBox::new(),
            product_form: AddProductForm::new(),
            products: Vec::new(),
            goal_current: None,
            goal_history: Vec::new(),
            goal_input: String::new(),
            pending_delete: None,
            loading: true,
            fetch_token: 0,
            notice: None,
        };
        let cmds = page.begin_load();
        (page, cmds)
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn products(&self) -> &[Product] {
        &self.products
    }

    pub fn goal_current(&self) -> Option<i32> {
        self.goal_current
    }

    pub fn pending_delete(&self) -> Option<Uuid> {
        self.pending_delete
    }

    pub fn filtered_products(&self) -> Vec<Product> {
        search::filter_products(&self.products, self.search.query())
    }

    fn begin_load(&mut self) -> Vec<Cmd> {
        self.loading = true;
        self.fetch_token += 1;
        vec![Cmd::LoadSettings {
            token: self.fetch_token,
        }]
    }

    pub fn update(&mut self, msg: SettingsMsg) -> Vec<Cmd> {
        match msg {
            SettingsMsg::SelectTab(tab) => {
                self.tab = tab;
                Vec::new()
            }
            SettingsMsg::Search(msg) => self.search.update(msg),
            SettingsMsg::Form(msg) => {
                let saved_ok = matches!(msg, ProductFormMsg::Saved(Ok(())));
                let mut cmds: Vec<Cmd> = self
                    .product_form
                    .update(msg)
                    .into_iter()
                    .flat_map(|cmd| match cmd {
                        // A valid submit surfaces as a typed event; turn it
                        // into the actual write as well so the page owns the
                        // service call.
                        Cmd::Publish(DomainEvent::ProductFormSubmit {
                            ref name,
                            calories_per_100g,
                        }) => vec![
                            Cmd::CreateProduct(crate::service::NewProduct {
                                name: name.clone(),
                                calories_per_100g,
                            }),
                            cmd,
                        ],
                        other => vec![other],
                    })
                    .collect();
                if saved_ok {
                    cmds.push(Cmd::Publish(DomainEvent::ProductsUpdated));
                }
                cmds
            }
            SettingsMsg::Reload => self.begin_load(),
            SettingsMsg::Loaded {
                token,
                products,
                goals,
            } => {
                if token != self.fetch_token {
                    return Vec::new();
                }
                self.products = products;
                self.goal_current = goals.current;
                self.goal_history = goals.history;
                self.loading = false;
                // Fresh data supersedes any earlier failure banner.
                self.notice = None;
                Vec::new()
            }
            SettingsMsg::RequestDelete(id) => {
                self.pending_delete = Some(id);
                Vec::new()
            }
            // Dismissing the modal leaves the catalog untouched.
            SettingsMsg::CancelDelete | SettingsMsg::BackdropClick => {
                self.pending_delete = None;
                Vec::new()
            }
            SettingsMsg::ConfirmDelete => match self.pending_delete {
                Some(id) => vec![Cmd::DeleteProduct(id)],
                None => Vec::new(),
            },
            SettingsMsg::ProductDeleted(Ok(())) => {
                if let Some(id) = self.pending_delete.take() {
                    self.products.retain(|p| p.id != id);
                }
                vec![Cmd::Publish(DomainEvent::ProductsUpdated)]
            }
            SettingsMsg::ProductDeleted(Err(msg)) => {
                self.pending_delete = None;
                self.notice = Some(msg);
                Vec::new()
            }
            SettingsMsg::GoalInput(value) => {
                self.goal_input = value;
                Vec::new()
            }
            SettingsMsg::GoalSubmit => {
                match self.goal_input.trim().parse::<i32>().ok().filter(|v| *v > 0) {
                    Some(value) => vec![Cmd::SetGoal(value)],
                    None => Vec::new(),
                }
            }
            SettingsMsg::GoalSaved(Ok(())) => {
                self.goal_input.clear();
                vec![Cmd::Publish(DomainEvent::GoalsUpdated)]
            }
            SettingsMsg::GoalSaved(Err(msg)) => {
                self.notice = Some(msg);
                Vec::new()
            }
        }
    }

    fn render_products_tab(&self, html: &mut String, bindings: &mut Vec<Binding>) {
        let search = self.search.render();
        html.push_str(&search.html);
        bindings.extend(search.bindings);

        let form = self.product_form.render();
        html.push_str(&form.html);
        bindings.extend(form.bindings);

        let filtered = self.filtered_products();
        if filtered.is_empty() {
            html.push_str(r#"<div class="empty-state">No products found.</div>"#);
        } else {
            html.push_str(r#"<div class="product-list">"#);
            for product in &filtered {
                let delete_id = format!("delete-product-{}", product.id);
                html.push_str(&format!(
                    r#"<div class="product-item"><span>{}</span><span>{} kcal / 100g</span><button id="{delete_id}">x</button></div>"#,
                    helpers::truncate(&product.name, 40),
                    product.calories_per_100g
                ));
                bindings.push(Binding::new(delete_id, EventKind::Click));
            }
            html.push_str("</div>");
        }

        if let Some(id) = self.pending_delete {
            let name = self
                .products
                .iter()
                .find(|p| p.id == id)
                .map(|p| p.name.as_str())
                .unwrap_or("this product");
            html.push_str(&format!(
                r#"<div id="confirm-backdrop" class="modal-backdrop"><div class="modal"><p>Delete {name}? Logged meals keep their recorded values.</p><button id="confirm-delete">Delete</button><button id="cancel-delete">Cancel</button></div></div>"#
            ));
            bindings.push(Binding::new("confirm-backdrop", EventKind::Click));
            bindings.push(Binding::new("confirm-delete", EventKind::Click));
            bindings.push(Binding::new("cancel-delete", EventKind::Click));
        }
    }

    fn render_goal_tab(&self, html: &mut String, bindings: &mut Vec<Binding>) {
        let current = match self.goal_current {
            Some(value) => format!("{} kcal", helpers::format_number(i64::from(value))),
            None => "not set".to_string(),
        };
        html.push_str(&format!(
            r#"<div class="goal-current">Current goal: {current}</div><form id="goal-form"><input id="goal-value" type="number" min="1" placeholder="Daily goal (kcal)" value="{}"><button type="submit">Set goal</button></form>"#,
            self.goal_input
        ));
        bindings.push(Binding::new("goal-value", EventKind::Input));
        bindings.push(Binding::new("goal-form", EventKind::Submit));

        if !self.goal_history.is_empty() {
            html.push_str(r#"<div class="goal-history">"#);
            for goal in &self.goal_history {
                html.push_str(&format!(
                    r#"<div class="goal-history-item"><span>{}</span><span>from {}</span></div>"#,
                    helpers::format_number(i64::from(goal.value)),
                    helpers::format_display_date(goal.start_date.date())
                ));
            }
            html.push_str("</div>");
        }
    }
}

impl View for SettingsPage {
    fn render(&self) -> Rendered {
        let mut bindings = vec![
            Binding::new("tab-products", EventKind::Click),
            Binding::new("tab-goal", EventKind::Click),
        ];
        let mut html = String::from(
            r#"<div class="tabs"><button id="tab-products">Products</button><button id="tab-goal">Goal</button></div>"#,
        );
        if let Some(notice) = &self.notice {
            html.push_str(&format!(r#"<div class="notice error">{notice}</div>"#));
        }

        if self.loading {
            html.push_str(r#"<div class="loading">Loading...</div>"#);
            return Rendered { html, bindings };
        }

        match self.tab {
            SettingsTab::Products => self.render_products_tab(&mut html, &mut bindings),
            SettingsTab::Goal => self.render_goal_tab(&mut html, &mut bindings),
        }
        Rendered { html, bindings }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::OffsetDateTime;

    fn session() -> Session {
        Session {
            user_id: Uuid::new_v4(),
            email: "test@example.com".into(),
        }
    }

    fn product(name: &str, calories: i32) -> Product {
        Product {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            name: name.to_string(),
            calories_per_100g: calories,
            created_at: OffsetDateTime::now_utc(),
        }
    }

    fn loaded(page: &mut SettingsPage, products: Vec<Product>, goals: GoalHistory) {
        let token = page.fetch_token;
        page.update(SettingsMsg::Loaded {
            token,
            products,
            goals,
        });
    }

    fn empty_goals() -> GoalHistory {
        GoalHistory {
            current: None,
            history: Vec::new(),
        }
    }

    #[test]
    fn mounts_loading_and_fetches() {
        let (page, cmds) = SettingsPage::mount(session());
        assert!(page.is_loading());
        assert!(matches!(cmds[..], [Cmd::LoadSettings { .. }]));
    }

    #[test]
    fn stale_loads_are_discarded() {
        let (mut page, cmds) = SettingsPage::mount(session());
        let Cmd::LoadSettings { token: stale } = cmds[0] else {
            panic!()
        };
        page.update(SettingsMsg::Reload);

        page.update(SettingsMsg::Loaded {
            token: stale,
            products: vec![product("Ghost", 1)],
            goals: empty_goals(),
        });
        assert!(page.is_loading());
        assert!(page.products().is_empty());
    }

    #[test]
    fn search_filters_the_rendered_list() {
        let (mut page, _) = SettingsPage::mount(session());
        loaded(
            &mut page,
            vec![product("Oatmeal", 350), product("Apple", 52)],
            empty_goals(),
        );

        page.update(SettingsMsg::Search(SearchMsg::Input("oat".into())));
        let filtered = page.filtered_products();
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].name, "Oatmeal");

        let rendered = page.render();
        assert!(rendered.html.contains("Oatmeal"));
        assert!(!rendered.html.contains("Apple"));
    }

    #[test]
    fn form_submit_creates_the_product_and_still_publishes() {
        let (mut page, _) = SettingsPage::mount(session());
        loaded(&mut page, Vec::new(), empty_goals());

        page.update(SettingsMsg::Form(ProductFormMsg::NameInput("Oatmeal".into())));
        page.update(SettingsMsg::Form(ProductFormMsg::CaloriesInput("350".into())));
        let cmds = page.update(SettingsMsg::Form(ProductFormMsg::Submit));

        assert!(matches!(
            cmds[0],
            Cmd::CreateProduct(ref new) if new.name == "Oatmeal" && new.calories_per_100g == 350
        ));
        assert!(matches!(
            cmds[1],
            Cmd::Publish(DomainEvent::ProductFormSubmit { .. })
        ));
    }

    #[test]
    fn successful_save_publishes_a_catalog_update() {
        let (mut page, _) = SettingsPage::mount(session());
        loaded(&mut page, Vec::new(), empty_goals());

        let cmds = page.update(SettingsMsg::Form(ProductFormMsg::Saved(Ok(()))));
        assert!(matches!(
            cmds[..],
            [Cmd::Publish(DomainEvent::ProductsUpdated)]
        ));

        // A failed save surfaces on the form instead.
        let cmds = page.update(SettingsMsg::Form(ProductFormMsg::Saved(Err("boom".into()))));
        assert!(cmds.is_empty());
        assert_eq!(page.product_form.notice(), Some("boom"));
    }

    #[test]
    fn delete_requires_confirmation() {
        let (mut page, _) = SettingsPage::mount(session());
        let p = product("Oatmeal", 350);
        loaded(&mut page, vec![p.clone()], empty_goals());

        // Opening the modal deletes nothing.
        assert!(page.update(SettingsMsg::RequestDelete(p.id)).is_empty());
        assert_eq!(page.pending_delete(), Some(p.id));
        assert!(page.render().html.contains("confirm-delete"));

        // Cancel leaves the catalog unchanged.
        page.update(SettingsMsg::CancelDelete);
        assert_eq!(page.pending_delete(), None);
        assert_eq!(page.products().len(), 1);

        // Backdrop click behaves like cancel.
        page.update(SettingsMsg::RequestDelete(p.id));
        page.update(SettingsMsg::BackdropClick);
        assert_eq!(page.pending_delete(), None);
        assert_eq!(page.products().len(), 1);

        // Confirm issues the delete; success removes the row and notifies.
        page.update(SettingsMsg::RequestDelete(p.id));
        let cmds = page.update(SettingsMsg::ConfirmDelete);
        assert!(matches!(cmds[..], [Cmd::DeleteProduct(id)] if id == p.id));

        let cmds = page.update(SettingsMsg::ProductDeleted(Ok(())));
        assert!(page.products().is_empty());
        assert_eq!(page.pending_delete(), None);
        assert!(matches!(
            cmds[..],
            [Cmd::Publish(DomainEvent::ProductsUpdated)]
        ));
    }

    #[test]
    fn failed_delete_keeps_the_product() {
        let (mut page, _) = SettingsPage::mount(session());
        let p = product("Oatmeal", 350);
        loaded(&mut page, vec![p.clone()], empty_goals());

        page.update(SettingsMsg::RequestDelete(p.id));
        page.update(SettingsMsg::ConfirmDelete);
        let cmds = page.update(SettingsMsg::ProductDeleted(Err("boom".into())));

        assert!(cmds.is_empty());
        assert_eq!(page.products().len(), 1);
        assert!(page.render().html.contains("boom"));
    }

    #[test]
    fn successful_reload_clears_an_earlier_failure_banner() {
        let (mut page, _) = SettingsPage::mount(session());
        let p = product("Oatmeal", 350);
        loaded(&mut page, vec![p.clone()], empty_goals());

        page.update(SettingsMsg::RequestDelete(p.id));
        page.update(SettingsMsg::ProductDeleted(Err("delete failed".into())));
        assert!(page.render().html.contains("delete failed"));

        page.update(SettingsMsg::Reload);
        loaded(&mut page, vec![p], empty_goals());
        assert!(!page.render().html.contains("delete failed"));
    }

    #[test]
    fn goal_submit_refuses_invalid_input_silently() {
        let (mut page, _) = SettingsPage::mount(session());
        loaded(&mut page, Vec::new(), empty_goals());

        assert!(page.update(SettingsMsg::GoalSubmit).is_empty());
        page.update(SettingsMsg::GoalInput("0".into()));
        assert!(page.update(SettingsMsg::GoalSubmit).is_empty());
        page.update(SettingsMsg::GoalInput("lots".into()));
        assert!(page.update(SettingsMsg::GoalSubmit).is_empty());
    }

    #[test]
    fn goal_submit_and_save_round_trip() {
        let (mut page, _) = SettingsPage::mount(session());
        loaded(&mut page, Vec::new(), empty_goals());

        page.update(SettingsMsg::GoalInput("2000".into()));
        let cmds = page.update(SettingsMsg::GoalSubmit);
        assert!(matches!(cmds[..], [Cmd::SetGoal(2000)]));

        let cmds = page.update(SettingsMsg::GoalSaved(Ok(())));
        assert!(matches!(
            cmds[..],
            [Cmd::Publish(DomainEvent::GoalsUpdated)]
        ));
    }

    #[test]
    fn goal_tab_shows_current_value_and_history() {
        let (mut page, _) = SettingsPage::mount(session());
        let history = vec![CalorieGoal {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            value: 2000,
            start_date: OffsetDateTime::now_utc(),
            created_at: OffsetDateTime::now_utc(),
        }];
        loaded(
            &mut page,
            Vec::new(),
            GoalHistory {
                current: Some(2000),
                history,
            },
        );

        page.update(SettingsMsg::SelectTab(SettingsTab::Goal));
        let rendered = page.render();
        assert!(rendered.html.contains("2,000 kcal"));
        assert!(rendered.html.contains("goal-history"));
    }

    #[test]
    fn render_is_idempotent() {
        let (mut page, _) = SettingsPage::mount(session());
        loaded(&mut page, vec![product("Oatmeal", 350)], empty_goals());
        assert_eq!(page.render(), page.render());
    }
}
