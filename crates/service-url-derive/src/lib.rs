//! Procedural macros for `service-url`.
//!
//! All macros in this crate are re-exported from the `service-url` crate. See its docs for more details
//! and the examples of usage.

// Documentation settings
#![doc(html_root_url = "https://docs.rs/service-url-derive/0.1.0")]
// General settings
#![recursion_limit = "128"]
// Linter settings
#![allow(missing_docs)] // Adding docs here would interfere with docs in the main crate

extern crate proc_macro;

use proc_macro::TokenStream;

mod describe;
mod enum_value;
mod utils;

#[proc_macro_derive(DescribeConfig, attributes(config))]
pub fn describe_config(input: TokenStream) -> TokenStream {
    describe::impl_describe_config(input)
}

#[proc_macro_derive(EnumValue, attributes(config))]
pub fn enum_value(input: TokenStream) -> TokenStream {
    enum_value::impl_enum_value(input)
}
