//! Shareable query-string encoding of an [`InputSet`].
//!
//! The key schema is fixed so links stay valid across releases:
//!
//! | key    | field                  |
//! |--------|------------------------|
//! | `cur`  | currency label         |
//! | `P`    | price                  |
//! | `ShB`  | shares outstanding (B) |
//! | `NDB`  | net debt (B)           |
//! | `r`    | WACC (%)               |
//! | `roic` | ROIC (%)               |
//! | `NPB`  | NOPAT (B)              |

use std::io;

use url::form_urlencoded;

use super::types::{InputSet, currency_or_default, parse_number};

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum InputField {
    Currency,
    Price,
    SharesOutstandingB,
    NetDebtB,
    WaccPct,
    RoicPct,
    NopatB,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct FieldSpec {
    pub key: &'static str,
    pub field: InputField,
}

pub const SCHEMA: [FieldSpec; 7] = [
    FieldSpec {
        key: "cur",
        field: InputField::Currency,
    },
    FieldSpec {
        key: "P",
        field: InputField::Price,
    },
    FieldSpec {
        key: "ShB",
        field: InputField::SharesOutstandingB,
    },
    FieldSpec {
        key: "NDB",
        field: InputField::NetDebtB,
    },
    FieldSpec {
        key: "r",
        field: InputField::WaccPct,
    },
    FieldSpec {
        key: "roic",
        field: InputField::RoicPct,
    },
    FieldSpec {
        key: "NPB",
        field: InputField::NopatB,
    },
];

impl InputField {
    /// Text form of the field; absent numbers encode as an empty string.
    pub fn read(self, inputs: &InputSet) -> String {
        let value = match self {
            InputField::Currency => return inputs.currency_label.clone(),
            InputField::Price => inputs.price,
            InputField::SharesOutstandingB => inputs.shares_outstanding_b,
            InputField::NetDebtB => inputs.net_debt_b,
            InputField::WaccPct => inputs.wacc_pct,
            InputField::RoicPct => inputs.roic_pct,
            InputField::NopatB => inputs.nopat_b,
        };
        value.map(|v| v.to_string()).unwrap_or_default()
    }

    /// Overwrites the field from text; unparseable numbers become absent.
    pub fn write(self, inputs: &mut InputSet, raw: &str) {
        let slot = match self {
            InputField::Currency => {
                inputs.currency_label = currency_or_default(raw);
                return;
            }
            InputField::Price => &mut inputs.price,
            InputField::SharesOutstandingB => &mut inputs.shares_outstanding_b,
            InputField::NetDebtB => &mut inputs.net_debt_b,
            InputField::WaccPct => &mut inputs.wacc_pct,
            InputField::RoicPct => &mut inputs.roic_pct,
            InputField::NopatB => &mut inputs.nopat_b,
        };
        *slot = parse_number(raw);
    }
}

pub fn field_for_key(key: &str) -> Option<InputField> {
    SCHEMA
        .iter()
        .find(|spec| spec.key == key)
        .map(|spec| spec.field)
}

pub fn encode(inputs: &InputSet) -> String {
    let mut serializer = form_urlencoded::Serializer::new(String::new());
    for spec in SCHEMA {
        serializer.append_pair(spec.key, &spec.field.read(inputs));
    }
    serializer.finish()
}

/// Applies an encoded query on top of `base`. Keys missing from the query leave
/// the corresponding field untouched; unknown keys are ignored. When a key
/// repeats, the first occurrence wins.
pub fn decode_onto(base: &InputSet, query: &str) -> InputSet {
    let query = query.strip_prefix('?').unwrap_or(query);
    let mut decoded = base.clone();
    let mut seen: Vec<InputField> = Vec::with_capacity(SCHEMA.len());
    for (key, value) in form_urlencoded::parse(query.as_bytes()) {
        let Some(field) = field_for_key(&key) else {
            continue;
        };
        if seen.contains(&field) {
            continue;
        }
        seen.push(field);
        field.write(&mut decoded, &value);
    }
    decoded
}

pub fn permalink_url(base_url: &str, inputs: &InputSet) -> String {
    let base = base_url.split('?').next().unwrap_or(base_url);
    format!("{base}?{}", encode(inputs))
}

/// Destination for a shared link, e.g. a clipboard or a terminal.
pub trait LinkSink {
    fn write_link(&mut self, url: &str) -> io::Result<()>;
}

impl<W: io::Write> LinkSink for W {
    fn write_link(&mut self, url: &str) -> io::Result<()> {
        writeln!(self, "{url}")?;
        self.flush()
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ShareOutcome {
    Copied,
    Failed,
}

impl ShareOutcome {
    pub fn message(self) -> &'static str {
        match self {
            ShareOutcome::Copied => "Permalink copied to clipboard.",
            ShareOutcome::Failed => "Copy failed. Copy from the address bar.",
        }
    }
}

pub fn share_permalink<S: LinkSink + ?Sized>(sink: &mut S, url: &str) -> ShareOutcome {
    match sink.write_link(url) {
        Ok(()) => ShareOutcome::Copied,
        Err(_) => ShareOutcome::Failed,
    }
}
