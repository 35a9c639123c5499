use std::sync::Arc;

/// Display-only fields carried alongside a token; the layout never reads them.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TokenMeta {
    pub name: Option<String>,
    pub icon_url: Option<String>,
    pub price: Option<f64>,
    pub warnings: Vec<String>,
    pub percent_changes: Vec<(String, f64)>,
    pub rank: Option<u32>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct TokenRecord {
    pub symbol: String,
    pub risk: Option<f64>,
    pub bubble_size: Option<f64>,
    pub meta: Arc<TokenMeta>,
}

impl TokenRecord {
    pub fn display_name(&self) -> &str {
        self.meta.name.as_deref().unwrap_or(&self.symbol)
    }
}

#[derive(Clone, Debug)]
pub struct TokenFeed {
    pub source: String,
    pub records: Vec<TokenRecord>,
}

impl TokenFeed {
    pub fn len(&self) -> usize {
        self.records.len()
    }
}
