use std::collections::HashSet;
use std::sync::Arc;

use anyhow::{Context, Result, anyhow};
use serde::Deserialize;
use serde_json::Value;
use tracing::warn;

use super::token::{TokenMeta, TokenRecord};

#[derive(Clone, Debug, Deserialize)]
pub(super) struct RawToken {
    #[serde(default)]
    pub(super) symbol: Option<String>,
    #[serde(default)]
    pub(super) name: Option<String>,
    #[serde(default)]
    pub(super) risk: Value,
    #[serde(default, rename = "bubbleSize")]
    pub(super) bubble_size: Value,
    #[serde(default)]
    pub(super) price: Value,
    #[serde(default)]
    pub(super) icon: Option<String>,
    #[serde(default)]
    pub(super) warnings: Value,
    #[serde(default, rename = "priceChange")]
    pub(super) price_change: Value,
    #[serde(default)]
    pub(super) rank: Value,
}

/// Accepts numbers and numeric strings; anything else reads as missing.
fn lenient_number(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse::<f64>().ok(),
        _ => None,
    }?;
    (!number.is_nan()).then_some(number)
}

fn lenient_warnings(value: &Value) -> Vec<String> {
    match value {
        Value::String(text) if !text.trim().is_empty() => vec![text.trim().to_owned()],
        Value::Array(entries) => entries
            .iter()
            .filter_map(|entry| match entry {
                Value::String(text) => Some(text.trim().to_owned()),
                Value::Object(object) => object
                    .get("message")
                    .or_else(|| object.get("label"))
                    .and_then(Value::as_str)
                    .map(|text| text.trim().to_owned()),
                _ => None,
            })
            .filter(|text| !text.is_empty())
            .collect(),
        _ => Vec::new(),
    }
}

fn lenient_changes(value: &Value) -> Vec<(String, f64)> {
    let Some(object) = value.as_object() else {
        return Vec::new();
    };

    object
        .iter()
        .filter_map(|(window, change)| {
            lenient_number(change)
                .filter(|change| change.is_finite())
                .map(|change| (window.clone(), change))
        })
        .collect()
}

fn into_record(raw: RawToken) -> Option<TokenRecord> {
    let symbol = raw.symbol.as_deref().map(str::trim).unwrap_or_default();
    if symbol.is_empty() {
        return None;
    }

    let rank = lenient_number(&raw.rank)
        .filter(|rank| rank.is_finite() && *rank >= 1.0)
        .map(|rank| rank.min(u32::MAX as f64) as u32);

    Some(TokenRecord {
        symbol: symbol.to_owned(),
        risk: lenient_number(&raw.risk),
        bubble_size: lenient_number(&raw.bubble_size),
        meta: Arc::new(TokenMeta {
            name: raw.name.filter(|name| !name.trim().is_empty()),
            icon_url: raw.icon.filter(|icon| !icon.trim().is_empty()),
            price: lenient_number(&raw.price).filter(|price| price.is_finite()),
            warnings: lenient_warnings(&raw.warnings),
            percent_changes: lenient_changes(&raw.price_change),
            rank,
        }),
    })
}

pub(super) fn parse_token_feed(raw: &str) -> Result<Vec<TokenRecord>> {
    let parsed: Value = serde_json::from_str(raw).context("invalid JSON in token feed")?;

    let entries = match parsed {
        Value::Array(entries) => entries,
        Value::Object(mut object) => match object.remove("tokens") {
            Some(Value::Array(entries)) => entries,
            Some(_) => return Err(anyhow!("\"tokens\" must be an array")),
            None => return Err(anyhow!("token feed object has no \"tokens\" array")),
        },
        _ => return Err(anyhow!("unexpected JSON type for token feed")),
    };

    let mut seen = HashSet::with_capacity(entries.len());
    let mut records = Vec::with_capacity(entries.len());
    for (position, entry) in entries.into_iter().enumerate() {
        let Ok(raw_token) = RawToken::deserialize(entry) else {
            warn!(position, "skipping malformed token entry");
            continue;
        };
        let Some(record) = into_record(raw_token) else {
            warn!(position, "skipping token entry without a symbol");
            continue;
        };
        if !seen.insert(record.symbol.clone()) {
            warn!(
                symbol = %record.symbol,
                name = record.display_name(),
                "skipping duplicate token symbol"
            );
            continue;
        }
        records.push(record);
    }

    records.sort_by_key(|record| record.meta.rank.unwrap_or(u32::MAX));
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_bare_arrays_and_wrapped_objects() {
        let bare = r#"[{"symbol":"BTC","risk":12,"bubbleSize":0.9}]"#;
        let wrapped = r#"{"tokens":[{"symbol":"BTC","risk":12,"bubbleSize":0.9}]}"#;

        let from_bare = parse_token_feed(bare).unwrap();
        let from_wrapped = parse_token_feed(wrapped).unwrap();
        assert_eq!(from_bare, from_wrapped);
        assert_eq!(from_bare[0].risk, Some(12.0));
        assert_eq!(from_bare[0].bubble_size, Some(0.9));
    }

    #[test]
    fn numeric_fields_are_read_leniently() {
        let raw = r#"[
            {"symbol":"A","risk":"77.5","bubbleSize":null,"price":"0.0042"},
            {"symbol":"B","risk":"high","bubbleSize":{"x":1}},
            {"symbol":"C","risk":"NaN"}
        ]"#;

        let records = parse_token_feed(raw).unwrap();
        assert_eq!(records[0].risk, Some(77.5));
        assert_eq!(records[0].bubble_size, None);
        assert_eq!(records[0].meta.price, Some(0.0042));
        assert_eq!(records[1].risk, None);
        assert_eq!(records[1].bubble_size, None);
        assert_eq!(records[2].risk, None);
    }

    #[test]
    fn skips_entries_without_symbols_and_duplicates() {
        let raw = r#"[
            {"symbol":"  "},
            {"risk":40},
            {"symbol":"SOL","risk":30},
            {"symbol":"SOL","risk":90},
            "garbage"
        ]"#;

        let records = parse_token_feed(raw).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].symbol, "SOL");
        assert_eq!(records[0].risk, Some(30.0));
    }

    #[test]
    fn orders_by_rank_and_keeps_file_order_for_unranked() {
        let raw = r#"[
            {"symbol":"X"},
            {"symbol":"B","rank":2},
            {"symbol":"A","rank":1},
            {"symbol":"Y"}
        ]"#;

        let symbols = parse_token_feed(raw)
            .unwrap()
            .into_iter()
            .map(|record| record.symbol)
            .collect::<Vec<_>>();
        assert_eq!(symbols, ["A", "B", "X", "Y"]);
    }

    #[test]
    fn collects_display_metadata() {
        let raw = r#"[{
            "symbol":"WIF",
            "name":"dogwifhat",
            "icon":"https://example.invalid/wif.png",
            "warnings":["mint authority enabled",{"message":"low liquidity"}],
            "priceChange":{"1h":"1.5","24h":-4.25,"7d":null}
        }]"#;

        let records = parse_token_feed(raw).unwrap();
        let meta = &records[0].meta;
        assert_eq!(records[0].display_name(), "dogwifhat");
        assert_eq!(meta.warnings, ["mint authority enabled", "low liquidity"]);
        assert!(meta.percent_changes.contains(&("1h".to_owned(), 1.5)));
        assert!(meta.percent_changes.contains(&("24h".to_owned(), -4.25)));
        assert_eq!(meta.percent_changes.len(), 2);
    }

    #[test]
    fn rejects_non_feed_json() {
        assert!(parse_token_feed("42").is_err());
        assert!(parse_token_feed(r#"{"items":[]}"#).is_err());
        assert!(parse_token_feed("not json").is_err());
    }
}
