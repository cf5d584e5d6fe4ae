use serde_json::Value;

/// One analyzed token pulled leniently out of the dataset. Missing fields are
/// tolerated — the analyzer output has grown columns over time.
#[derive(Debug, Clone, PartialEq)]
pub struct TokenSummary {
    pub symbol: String,
    pub risk: Option<u8>,
    pub potential: Option<u8>,
    pub overall: Option<u8>,
    pub rationale: Option<String>,
    pub price: Option<f64>,
    pub liquidity: Option<String>,
    pub change_24h: Option<f64>,
    pub age: Option<String>,
    pub href: Option<String>,
}

impl TokenSummary {
    /// Extract a summary from one dataset entry. Returns `None` when the entry
    /// has no usable symbol (strings in the array are taken as bare symbols).
    pub fn from_value(value: &Value) -> Option<Self> {
        if let Some(symbol) = value.as_str() {
            return Some(Self::bare(symbol));
        }

        let obj = value.as_object()?;
        let symbol = obj
            .get("symbol")
            .and_then(Value::as_str)?
            .trim()
            .to_string();
        if symbol.is_empty() {
            return None;
        }

        Some(Self {
            symbol,
            risk: small_int(obj.get("risk")),
            potential: small_int(obj.get("potential").or_else(|| obj.get("investmentPotential"))),
            overall: small_int(obj.get("overall")),
            rationale: text(obj.get("rationale")),
            price: obj.get("price").and_then(Value::as_f64),
            liquidity: text(obj.get("liquidity")),
            change_24h: obj.get("change24h").and_then(Value::as_f64),
            age: text(obj.get("age")),
            href: text(obj.get("href")),
        })
    }

    fn bare(symbol: &str) -> Self {
        Self {
            symbol: symbol.to_string(),
            risk: None,
            potential: None,
            overall: None,
            rationale: None,
            price: None,
            liquidity: None,
            change_24h: None,
            age: None,
            href: None,
        }
    }

    /// One-line roster entry for the agent context.
    pub fn roster_line(&self) -> String {
        let mut line = format!("- {}", self.symbol);
        if let Some(r) = self.risk {
            line.push_str(&format!(" | risk {}/10", r));
        }
        if let Some(p) = self.potential {
            line.push_str(&format!(" | potential {}/10", p));
        }
        if let Some(o) = self.overall {
            line.push_str(&format!(" | overall {}/100", o));
        }
        if let Some(p) = self.price {
            line.push_str(&format!(" | ${}", p));
        }
        if let Some(c) = self.change_24h {
            line.push_str(&format!(" | 24h {:+.1}%", c));
        }
        if let Some(l) = &self.liquidity {
            line.push_str(&format!(" | liq {}", l));
        }
        if let Some(a) = &self.age {
            line.push_str(&format!(" | age {}", a));
        }
        if let Some(href) = &self.href {
            line.push_str(&format!(" | {}", href));
        }
        line
    }
}

fn small_int(value: Option<&Value>) -> Option<u8> {
    value.and_then(Value::as_u64).and_then(|n| u8::try_from(n).ok())
}

fn text(value: Option<&Value>) -> Option<String> {
    value
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// All token summaries in a snapshot. The analyzer has written its array under
/// both `data` and `results`; try each, newest convention first.
pub fn tokens_in(snapshot: &Value) -> Vec<TokenSummary> {
    let entries = snapshot
        .get("data")
        .or_else(|| snapshot.get("results"))
        .and_then(Value::as_array);

    match entries {
        Some(items) => items.iter().filter_map(TokenSummary::from_value).collect(),
        None => Vec::new(),
    }
}

/// The analyzer's pick for the highest overall-scored token, if present.
pub fn best_token(snapshot: &Value) -> Option<TokenSummary> {
    snapshot.get("best_token").and_then(TokenSummary::from_value)
}
