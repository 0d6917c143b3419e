//! Search criteria and their translation into squid filter clauses.
//!
//! Filters are built as a typed clause list and serialized with escaping in
//! one place. User-provided strings never reach the query document without
//! going through [`FilterClause`].

use error_stack::{Result, ResultExt};

use crate::ss58::ss58_decode;

#[derive(Debug)]
pub struct FilterError;
impl error_stack::Context for FilterError {}

impl std::fmt::Display for FilterError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("failed to build squid filter")
    }
}

/// A single `key: value` clause in the squid's filter syntax.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterClause {
    key: &'static str,
    value: ClauseValue,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum ClauseValue {
    Int(u64),
    Str(String),
    Nested(Vec<FilterClause>),
}

impl FilterClause {
    pub fn int(key: &'static str, value: u64) -> Self {
        Self {
            key,
            value: ClauseValue::Int(value),
        }
    }

    pub fn str(key: &'static str, value: impl Into<String>) -> Self {
        Self {
            key,
            value: ClauseValue::Str(value.into()),
        }
    }

    pub fn nested(key: &'static str, clauses: Vec<FilterClause>) -> Self {
        Self {
            key,
            value: ClauseValue::Nested(clauses),
        }
    }

    fn render_into(&self, out: &mut String) {
        out.push_str(self.key);
        out.push_str(": ");
        match &self.value {
            ClauseValue::Int(value) => out.push_str(&value.to_string()),
            ClauseValue::Str(value) => escape_into(value, out),
            ClauseValue::Nested(clauses) => render_clauses_into(clauses, out),
        }
    }
}

/// Render a clause list as a brace-delimited filter object.
pub fn render_clauses(clauses: &[FilterClause]) -> String {
    let mut out = String::new();
    render_clauses_into(clauses, &mut out);
    out
}

fn render_clauses_into(clauses: &[FilterClause], out: &mut String) {
    out.push('{');
    for (i, clause) in clauses.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        clause.render_into(out);
    }
    out.push('}');
}

fn escape_into(value: &str, out: &mut String) {
    out.push('"');
    for c in value.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            c => out.push(c),
        }
    }
    out.push('"');
}

/// Pagination window. `page_number` is 1-indexed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub page_size: u64,
    pub page_number: u64,
}

impl Default for Page {
    fn default() -> Self {
        Self {
            page_size: 10,
            page_number: 1,
        }
    }
}

impl Page {
    pub fn offset(&self) -> u64 {
        self.page_size * self.page_number.saturating_sub(1)
    }
}

/// Criteria for an event search. Unset fields emit no clause.
#[derive(Debug, Clone, Default)]
pub struct EventCriteria {
    pub block_start: Option<u64>,
    pub block_end: Option<u64>,
    pub pallet_name: Option<String>,
    pub event_name: Option<String>,
    /// SS58 address to match against the event arguments.
    pub account_id: Option<String>,
}

impl EventCriteria {
    pub fn to_clauses(&self) -> Result<Vec<FilterClause>, FilterError> {
        check_block_range(self.block_start, self.block_end)?;

        let mut clauses = Vec::new();

        if let Some(block_start) = self.block_start {
            clauses.push(FilterClause::int("blockNumber_gte", block_start));
        }

        if let Some(block_end) = self.block_end {
            clauses.push(FilterClause::int("blockNumber_lte", block_end));
        }

        if let Some(pallet_name) = &self.pallet_name {
            clauses.push(FilterClause::str("palletName_eq", pallet_name));
        }

        if let Some(event_name) = &self.event_name {
            clauses.push(FilterClause::str("eventName_eq", event_name));
        }

        if let Some(account_id) = &self.account_id {
            let public_key = ss58_decode(account_id).change_context(FilterError)?;
            clauses.push(FilterClause::str(
                "argsStr_containsAny",
                format!("0x{public_key}"),
            ));
        }

        Ok(clauses)
    }
}

/// Criteria for an extrinsic search. Unset fields emit no clause.
#[derive(Debug, Clone, Default)]
pub struct ExtrinsicCriteria {
    pub block_start: Option<u64>,
    pub block_end: Option<u64>,
    pub pallet_name: Option<String>,
    /// Call name, scoped under `pallet_name`. Ignored when the pallet is
    /// not set.
    pub call_name: Option<String>,
    /// SS58 address of the extrinsic signer.
    pub ss58_address: Option<String>,
}

impl ExtrinsicCriteria {
    pub fn to_clauses(&self) -> Result<Vec<FilterClause>, FilterError> {
        check_block_range(self.block_start, self.block_end)?;

        let mut clauses = Vec::new();

        if let Some(block_start) = self.block_start {
            clauses.push(FilterClause::int("blockNumber_gte", block_start));
        }

        if let Some(block_end) = self.block_end {
            clauses.push(FilterClause::int("blockNumber_lte", block_end));
        }

        if let Some(pallet_name) = &self.pallet_name {
            // Pallet and call scope the extrinsic's main call as a single
            // nested clause.
            let mut main_call = vec![FilterClause::str("palletName_eq", pallet_name)];
            if let Some(call_name) = &self.call_name {
                main_call.push(FilterClause::str("callName_eq", call_name));
            }
            clauses.push(FilterClause::nested("mainCall", main_call));
        }

        if let Some(ss58_address) = &self.ss58_address {
            let public_key = ss58_decode(ss58_address).change_context(FilterError)?;
            clauses.push(FilterClause::str(
                "signerPublicKey_eq",
                format!("0x{public_key}"),
            ));
        }

        Ok(clauses)
    }
}

fn check_block_range(block_start: Option<u64>, block_end: Option<u64>) -> Result<(), FilterError> {
    if let (Some(start), Some(end)) = (block_start, block_end) {
        if end < start {
            return Err(FilterError)
                .attach_printable_lazy(|| format!("block range is inverted: {start}..{end}"));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{EventCriteria, ExtrinsicCriteria, FilterClause, Page, render_clauses};

    #[test]
    pub fn test_block_start_emits_a_single_clause() {
        let criteria = EventCriteria {
            block_start: Some(100),
            ..Default::default()
        };

        let clauses = criteria.to_clauses().unwrap();
        assert_eq!(clauses, vec![FilterClause::int("blockNumber_gte", 100)]);
        assert_eq!(render_clauses(&clauses), "{blockNumber_gte: 100}");
    }

    #[test]
    pub fn test_event_criteria_are_flat() {
        let criteria = EventCriteria {
            block_start: Some(100),
            block_end: Some(200),
            pallet_name: Some("Balances".to_string()),
            event_name: Some("Transfer".to_string()),
            ..Default::default()
        };

        let clauses = criteria.to_clauses().unwrap();
        assert_eq!(
            render_clauses(&clauses),
            r#"{blockNumber_gte: 100, blockNumber_lte: 200, palletName_eq: "Balances", eventName_eq: "Transfer"}"#
        );
    }

    #[test]
    pub fn test_pallet_and_call_nest_under_main_call() {
        let criteria = ExtrinsicCriteria {
            pallet_name: Some("Balances".to_string()),
            call_name: Some("transfer_keep_alive".to_string()),
            ..Default::default()
        };

        let clauses = criteria.to_clauses().unwrap();
        assert_eq!(clauses.len(), 1);
        assert_eq!(
            render_clauses(&clauses),
            r#"{mainCall: {palletName_eq: "Balances", callName_eq: "transfer_keep_alive"}}"#
        );
    }

    #[test]
    pub fn test_pallet_without_call() {
        let criteria = ExtrinsicCriteria {
            pallet_name: Some("Balances".to_string()),
            ..Default::default()
        };

        let clauses = criteria.to_clauses().unwrap();
        assert_eq!(
            render_clauses(&clauses),
            r#"{mainCall: {palletName_eq: "Balances"}}"#
        );
    }

    #[test]
    pub fn test_account_id_is_decoded() {
        let criteria = EventCriteria {
            account_id: Some("5GrwvaEF5zXb26Fz9rcQpDWS57CtERHpNehXCPcNoHGKutQY".to_string()),
            ..Default::default()
        };

        let clauses = criteria.to_clauses().unwrap();
        assert_eq!(
            render_clauses(&clauses),
            r#"{argsStr_containsAny: "0xd43593c715fdd31c61141abd04a99fd6822c8558854ccde39a5684e7a56da27d"}"#
        );
    }

    #[test]
    pub fn test_string_values_are_escaped() {
        let clauses = vec![FilterClause::str("palletName_eq", r#"Bal"ances\"#)];
        assert_eq!(
            render_clauses(&clauses),
            r#"{palletName_eq: "Bal\"ances\\"}"#
        );
    }

    #[test]
    pub fn test_inverted_block_range_is_rejected() {
        let criteria = EventCriteria {
            block_start: Some(200),
            block_end: Some(100),
            ..Default::default()
        };

        assert!(criteria.to_clauses().is_err());
    }

    #[test]
    pub fn test_offset() {
        let page = Page {
            page_size: 5,
            page_number: 3,
        };
        assert_eq!(page.offset(), 10);

        let page = Page {
            page_size: 5,
            page_number: 1,
        };
        assert_eq!(page.offset(), 0);

        assert_eq!(Page::default().offset(), 0);
    }
}
