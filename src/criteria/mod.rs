//! Filter criteria model and text grammar
//!
//! This module handles the criteria AST, parsing filter texts like
//! "([Age > 18] AND [Name StartsWith 'A'])", and the passes that inspect
//! or rewrite parsed trees.

mod ast;
pub mod cache;
pub mod parser;
pub mod resolver;
pub mod validator;
mod value;
mod visitor;


pub use ast::*;
pub use cache::{
    cache_size, check_filter, clear_cache, get_or_parse, set_cache_capacity, FilterCache,
    DEFAULT_CACHE_CAPACITY,
};
pub use parser::{parse, Parser};
pub use resolver::{resolve, PropertyNameTable};
pub use validator::is_valid_on;
pub use value::*;
pub use visitor::*;
