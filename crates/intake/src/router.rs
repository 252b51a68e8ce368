use civic_core_types::Category;

/// Fallback authority for `other` and anything unrecognized.
pub const GENERAL_ADMINISTRATION: &str = "General Administration";

/// Responsible authority for a category. Total and side-effect free.
pub fn route(category: &Category) -> &'static str {
    match category {
        Category::Infrastructure => "Municipal Public Works Department",
        Category::PublicSafety => "Police Department",
        Category::Environment => "Environmental Protection Agency",
        Category::Transportation => "Transportation Department",
        Category::PublicServices => "Municipal Services",
        Category::Corruption => "Anti-Corruption Commission",
        Category::Accessibility => "Disability Rights Office",
        Category::Other | Category::Unrecognized(_) => GENERAL_ADMINISTRATION,
    }
}

/// Routes a raw category string.
pub fn route_raw(category: &str) -> &'static str {
    route(&Category::parse(category))
}

/// The full routing table, in category order.
pub fn routing_table() -> Vec<(Category, &'static str)> {
    Category::KNOWN
        .iter()
        .map(|category| (category.clone(), route(category)))
        .collect()
}
