//! Zero-copy JSON: parser, path queries and serializers.
//!
//! ```rust
//! use certsh::json::{Document, Overrides};
//!
//! let doc = Document::parse_strict(r#"{"a":[{"k":1},{"k":2}]}"#).unwrap();
//! assert_eq!(doc.get("a[1].k").as_deref(), Some("2"));
//! assert_eq!(doc.get("a[5].k"), None);
//! assert_eq!(doc.dump(&Overrides::new()), r#"{"a":[{"k":1},{"k":2}]}"#);
//! ```

pub mod node;
pub mod parse;
pub mod query;
pub mod ser;

pub use node::{unescape, Document, Mode, Node, NodeId, NodeKind, Quote, Span};
pub use ser::Overrides;
