//! Clash routing rule parser and ordered rule store.
//!
//! Parses Clash rule lines (`DOMAIN-SUFFIX,google.com,Proxy`,
//! `AND,((DOMAIN,x.com),(NETWORK,UDP)),DIRECT`, `MATCH,DIRECT`) or their
//! structured record form into typed [`Rule`]s, and keeps them in a
//! [`RuleStore`] whose order is Clash's first-match-wins evaluation order.
//!
//! # Architecture
//!
//! - **Model** (`rule`): `Rule` is a sum of `ConditionRule`, `LogicRule`
//!   and `MatchRule`; `Action` is a built-in disposition or a proxy group
//! - **Parsers** (`parser`): line and record parsers sharing one code path,
//!   plus batch parsing that collects failures instead of aborting
//! - **Store** (`store`): priority-ordered list whose priorities always equal
//!   positions `0..len`
//!
//! # Example
//!
//! ```
//! use clash_rules::{Action, RuleStore};
//!
//! let (mut store, failures) = RuleStore::from_inputs([
//!     "DOMAIN-SUFFIX,ads.example.com,REJECT",
//!     "NOT-A-RULE",
//!     "MATCH,Proxy",
//! ]);
//! assert_eq!(failures.len(), 1);
//!
//! let rule = "DOMAIN,example.com,DIRECT".parse().unwrap();
//! store.insert_at(rule, 1);
//! assert_eq!(
//!     store.to_text(),
//!     vec![
//!         "DOMAIN-SUFFIX,ads.example.com,REJECT",
//!         "DOMAIN,example.com,DIRECT",
//!         "MATCH,Proxy",
//!     ]
//! );
//! assert_eq!(store.get_at(2).unwrap().action(), &Action::Group("Proxy".into()));
//! ```

pub mod error;
pub mod parser;
pub mod record;
pub mod rule;
pub mod store;

pub use error::RulesError;
pub use parser::{ParseFailure, ParseOutcome, RuleInput, parse_line, parse_many, parse_record};
pub use record::{ConditionRecord, RuleRecord};
pub use rule::{Action, Condition, ConditionRule, LogicRule, LogicType, MatchRule, Rule, RuleType};
pub use store::RuleStore;
