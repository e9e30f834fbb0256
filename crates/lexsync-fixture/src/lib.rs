//! # lexsync fixture
//!
//! Expected data for a send/receive round trip, written once and checked
//! against both sides of the synchronized system.
//!
//! ## Architecture
//!
//! ```text
//! fixture text          ← JSON superset: quotes, bare names, comments
//!     │
//! Lexer                 ← tokens with line/column, comments kept
//!     │
//! Reader                ← recursive descent, `no <field>` comments
//!     │                   become absence markers
//! CanonicalNode         ← backend-agnostic expected tree
//!     │
//!     ├── lexsync-depot     (XML repository side)
//!     └── lexsync-docstore  (document database side)
//! ```
//!
//! Both verifiers report failures through [`OracleError`].

pub mod error;
pub mod lexer;
pub mod node;
pub mod reader;

pub use error::{OracleError, Side};
pub use node::{CanonicalNode, LABEL_PREFIX, attrs, collapse_for_message, names, strip_whitespace};
pub use reader::parse_fixture;
