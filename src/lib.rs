//! Front end for the ASDL schema language.
//!
//! [`parse`] turns schema text into a [`Module`]; [`load_schema`] parses and
//! then resolves the module into a caller-owned [`TypeLookup`], assigning
//! variant tags and checking every type reference.
//!
//! ```
//! use asdl_front::{load_schema_str, TypeLookup};
//!
//! let mut lookup = TypeLookup::new();
//! let module = load_schema_str("module m { t = A | B(int x) }", &mut lookup, false).unwrap();
//! assert_eq!(module.name, "m");
//! assert_eq!(lookup.get("t__B").map(|d| d.tag), Some(2));
//! ```
pub mod ast;
pub mod emit;
pub mod error;
pub mod front_end;
pub mod lexer;
pub mod lookup;
pub mod parser;
pub mod token;

pub use ast::{Constructor, Field, Module, Product, Quantifier, Sum, TypeDecl, TypeExpr};
pub use error::{AstError, Error, LexError, Position, SemanticError, SyntaxError};
pub use front_end::{load_schema, load_schema_str, resolve};
pub use lookup::{DescKind, ResolvedField, ResolvedType, TypeDesc, TypeLookup};
pub use parser::{parse, parse_str};
