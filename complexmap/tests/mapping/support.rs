#![allow(dead_code)]

pub(crate) use chrono::NaiveDate;
pub(crate) use complexmap::{
    Binding, BindingPlan, CompileFailure, Mappable, Mapper, MapperConfig, MappingError, TagMismatch,
    resolver::render_path,
};
pub(crate) use std::sync::Arc;

#[derive(Debug, Clone, Default, PartialEq, Mappable)]
pub(crate) struct Country {
    pub name: String,
    pub code: String,
}

#[derive(Debug, Clone, Default, PartialEq, Mappable)]
pub(crate) struct Address {
    pub street: String,
    pub city: String,
    pub country: Option<Country>,
}

#[derive(Debug, Clone, Default, PartialEq, Mappable)]
pub(crate) struct Customer {
    pub id: u64,
    pub name: String,
    pub email: String,
    pub address: Option<Address>,
    pub joined: NaiveDate,
}

#[derive(Debug, Clone, Default, PartialEq, Mappable)]
pub(crate) struct CustomerRow {
    #[complexmap(from = "id")]
    pub id: u64,
    #[complexmap(from = "name")]
    pub name: String,
    #[complexmap(from = "email", tags = "admin")]
    pub email: String,
    #[complexmap(from = "city")]
    pub city: String,
    #[complexmap(from = "name", source = Country)]
    pub country: String,
    pub note: String,
    #[complexmap(skip)]
    pub cached: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Mappable)]
pub(crate) struct Product {
    pub name: String,
    pub price: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Mappable)]
pub(crate) struct Vendor {
    pub name: String,
}

/// Qualifier-specific annotation for `Product`, tag-guarded fallback for everything else.
#[derive(Debug, Clone, Default, PartialEq, Mappable)]
pub(crate) struct Label {
    #[complexmap(from = "name", tags = "admin")]
    #[complexmap(from = "name", source = Product)]
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Mappable)]
pub(crate) struct Account {
    pub login: String,
    pub balance: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Mappable)]
pub(crate) struct AccountView {
    #[complexmap(from = "login", target_read_only)]
    pub login: String,
    #[complexmap(from = "balance", source_read_only)]
    pub balance: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Mappable)]
pub(crate) struct Node {
    pub name: String,
    pub next: Option<Box<Node>>,
    pub peer: Option<Box<Peer>>,
}

#[derive(Debug, Clone, Default, PartialEq, Mappable)]
pub(crate) struct Peer {
    pub label: String,
    pub back: Option<Box<Node>>,
}

#[derive(Debug, Clone, Default, PartialEq, Mappable)]
pub(crate) struct NodeRow {
    #[complexmap(from = "name")]
    pub name: String,
    #[complexmap(from = "label")]
    pub label: String,
    #[complexmap(from = "missing")]
    pub missing: String,
}

#[derive(Debug, Clone, Default, PartialEq, Mappable)]
pub(crate) struct ContactRow {
    #[complexmap(from = "email", tags = "admin")]
    #[complexmap(from = "city")]
    pub contact: String,
}

#[derive(Debug, Clone, Mappable)]
#[complexmap(no_default)]
pub(crate) struct Sealed {
    #[complexmap(from = "name")]
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Mappable)]
pub(crate) struct SecretRow {
    #[complexmap(from = "name")]
    pub name: String,
    #[complexmap(no_default)]
    pub token: String,
}

#[derive(Debug, Clone, Default, PartialEq, Mappable)]
pub(crate) struct ZipRow {
    #[complexmap(from = "zip", source = Address)]
    pub zip: String,
}

#[derive(Debug, Clone, Default, PartialEq, Mappable)]
pub(crate) struct MistypedRow {
    #[complexmap(from = "id")]
    pub id: String,
}

/// Hand-written `Default` that does not use the field types' defaults.
#[derive(Debug, Clone, PartialEq, Mappable)]
pub(crate) struct Greeting {
    #[complexmap(from = "name")]
    pub name: String,
    pub note: String,
}

impl Default for Greeting {
    fn default() -> Self {
        Self {
            name: String::new(),
            note: "n/a".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Mappable)]
pub(crate) enum Status {
    #[default]
    Pending,
    Shipped,
}

#[derive(Debug, Clone, Default, PartialEq, Mappable)]
pub(crate) struct Order {
    pub id: u64,
    pub status: Status,
    pub address: Option<Address>,
}

#[derive(Debug, Clone, Default, PartialEq, Mappable)]
pub(crate) struct OrderRow {
    #[complexmap(from = "id")]
    pub id: u64,
    #[complexmap(from = "status")]
    pub status: Status,
    #[complexmap(from = "city")]
    pub city: String,
}

#[derive(Debug, Clone, Default, PartialEq, Mappable)]
pub(crate) struct AuditRow {
    #[complexmap(from = "name")]
    pub name: String,
    #[complexmap(from = "email", tags = "a, b")]
    pub email: String,
}

/// Two registered types sharing the short name `Twin`.
pub(crate) mod left {
    use complexmap::Mappable;

    #[derive(Debug, Clone, Default, PartialEq, Mappable)]
    pub(crate) struct Twin {
        pub side: String,
    }
}

pub(crate) mod right {
    use complexmap::Mappable;

    #[derive(Debug, Clone, Default, PartialEq, Mappable)]
    pub(crate) struct Twin {
        pub side: String,
    }
}

pub(crate) fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub(crate) fn linz() -> Customer {
    Customer {
        id: 7,
        name: "Ada".to_string(),
        email: "ada@example.com".to_string(),
        address: Some(Address {
            street: "Hauptplatz 1".to_string(),
            city: "Linz".to_string(),
            country: Some(Country {
                name: "Austria".to_string(),
                code: "AT".to_string(),
            }),
        }),
        joined: NaiveDate::from_ymd_opt(2021, 3, 14).unwrap_or_default(),
    }
}

pub(crate) fn homeless(id: u64) -> Customer {
    Customer {
        id,
        name: format!("customer-{id}"),
        ..Customer::default()
    }
}

/// Rendered forward path of `field`, `None` when it takes its default.
pub(crate) fn forward_path(plan: &BindingPlan, field: &str) -> Option<String> {
    match &plan.forward.entry(field)?.binding {
        Binding::Path(path) => Some(render_path(path)),
        Binding::UseDefault => None,
    }
}

pub(crate) fn backward_path(plan: &BindingPlan, field: &str) -> Option<String> {
    match &plan.backward.entry(field)?.binding {
        Binding::Path(path) => Some(render_path(path)),
        Binding::UseDefault => None,
    }
}
