//! Test attribute for PostgreSQL-backed integration tests.
//!
//! `#[pg_test]` turns an `async fn` into a synchronous `#[test]` whose body runs
//! on `crate::common::test_db::run_test`, the runtime that owns the shared
//! testcontainers database. The generated test is `#[ignore]`d because it needs
//! a Docker daemon; run it with `cargo test -- --ignored`.
use proc_macro::TokenStream;
use quote::quote;
use syn::{parse_macro_input, spanned::Spanned, ItemFn, Meta};

const IGNORE_REASON: &str = "requires Docker for the PostgreSQL container";

fn reject(span: proc_macro2::Span, message: &str) -> TokenStream {
    syn::Error::new(span, message).to_compile_error().into()
}

/// Runs an async test against the shared PostgreSQL container.
#[proc_macro_attribute]
pub fn pg_test(attr: TokenStream, item: TokenStream) -> TokenStream {
    parse_macro_input!(attr as syn::parse::Nothing);

    let input_fn = parse_macro_input!(item as ItemFn);

    if input_fn.sig.asyncness.is_none() {
        return reject(input_fn.sig.span(), "pg_test requires an async fn");
    }
    if !input_fn.sig.inputs.is_empty() {
        return reject(input_fn.sig.inputs.span(), "pg_test functions take no arguments");
    }
    if !input_fn.sig.generics.params.is_empty() {
        return reject(input_fn.sig.generics.span(), "pg_test functions cannot be generic");
    }

    let ItemFn {
        attrs,
        vis,
        sig,
        block,
    } = input_fn;

    let name = sig.ident;
    let output = sig.output;

    // An explicit #[ignore] on the test replaces ours.
    let has_ignore = attrs.iter().any(|attr| attr.path().is_ident("ignore"));
    let attrs = attrs
        .into_iter()
        .filter(|attr| !matches!(attr.meta, Meta::Path(ref path) if path.is_ident("pg_test")));
    let ignore = if has_ignore {
        quote! {}
    } else {
        quote! { #[ignore = #IGNORE_REASON] }
    };

    TokenStream::from(quote! {
        #(#attrs)*
        #[test]
        #ignore
        #vis fn #name() #output {
            crate::common::test_db::run_test(async #block)
        }
    })
}
